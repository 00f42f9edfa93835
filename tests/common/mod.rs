//! Test-only encoders producing code-block segments for the decoder.

#![allow(dead_code)]

use jpip_tier1::constants::{NUM_CONTEXTS, RUN_LENGTH_CONTEXT, STRIPE_HEIGHT, UNIFORM_CONTEXT};
use jpip_tier1::jpeg2000::mq_coder::MQ_TABLE;
use jpip_tier1::{CodeBlockDescriptor, CodeBlockStyle, SubbandOrientation};

/// MQ encoder of ISO/IEC 15444-1, C.2.
pub struct MqEncoder {
    a: u32,
    c: u32,
    ct: u32,
    // out[0] is the byte preceding the codeword; it never receives a carry.
    out: Vec<u8>,
    contexts: [(u8, bool); NUM_CONTEXTS],
}

impl MqEncoder {
    pub fn new() -> Self {
        let mut encoder = Self {
            a: 0,
            c: 0,
            ct: 0,
            out: Vec::new(),
            contexts: [(0, false); NUM_CONTEXTS],
        };
        encoder.reset_contexts();
        encoder.init();
        encoder
    }

    pub fn reset_contexts(&mut self) {
        self.contexts = [(0, false); NUM_CONTEXTS];
        self.contexts[0].0 = 4;
        self.contexts[RUN_LENGTH_CONTEXT].0 = 3;
        self.contexts[UNIFORM_CONTEXT].0 = 46;
    }

    // INITENC
    pub fn init(&mut self) {
        self.a = 0x8000;
        self.c = 0;
        self.ct = 12;
        self.out.clear();
        self.out.push(0);
    }

    pub fn encode(&mut self, bit: bool, cx: usize) {
        let (state, mps) = self.contexts[cx];
        let entry = MQ_TABLE[state as usize];
        let qe = entry.qe as u32;

        self.a -= qe;
        if bit == mps {
            if self.a & 0x8000 == 0 {
                if self.a < qe {
                    self.a = qe;
                } else {
                    self.c += qe;
                }
                self.contexts[cx].0 = entry.nmps;
                self.renormalize();
            } else {
                self.c += qe;
            }
        } else {
            if self.a < qe {
                self.c += qe;
            } else {
                self.a = qe;
            }
            if entry.switch {
                self.contexts[cx].1 = !mps;
            }
            self.contexts[cx].0 = entry.nlps;
            self.renormalize();
        }
    }

    fn renormalize(&mut self) {
        loop {
            self.a <<= 1;
            self.c <<= 1;
            self.ct -= 1;
            if self.ct == 0 {
                self.byte_out();
            }
            if self.a & 0x8000 != 0 {
                break;
            }
        }
    }

    fn emit(&mut self, stuffed: bool) {
        if stuffed {
            self.out.push((self.c >> 20) as u8);
            self.c &= 0xFFFFF;
            self.ct = 7;
        } else {
            self.out.push((self.c >> 19) as u8);
            self.c &= 0x7FFFF;
            self.ct = 8;
        }
    }

    fn byte_out(&mut self) {
        let last = self.out.len() - 1;
        if self.out[last] == 0xFF {
            self.emit(true);
        } else if self.c < 0x8000000 {
            self.emit(false);
        } else {
            self.out[last] += 1;
            if self.out[last] == 0xFF {
                self.c &= 0x7FFFFFF;
                self.emit(true);
            } else {
                self.emit(false);
            }
        }
    }

    /// FLUSH, returning the terminated codeword.
    pub fn flush(&mut self) -> Vec<u8> {
        let temp = self.c + self.a;
        self.c |= 0xFFFF;
        if self.c >= temp {
            self.c -= 0x8000;
        }
        self.c <<= self.ct;
        self.byte_out();
        self.c <<= self.ct;
        self.byte_out();
        if self.out.last() == Some(&0xFF) {
            self.out.pop();
        }
        self.out[1..].to_vec()
    }
}

/// Raw bit writer for bypass passes, stuffing a zero bit after `0xFF`.
#[derive(Default)]
pub struct RawBitWriter {
    out: Vec<u8>,
    acc: u8,
    count: u8,
}

impl RawBitWriter {
    fn capacity(&self) -> u8 {
        if self.out.last() == Some(&0xFF) { 7 } else { 8 }
    }

    pub fn put(&mut self, bit: bool) {
        self.acc = self.acc << 1 | bit as u8;
        self.count += 1;
        if self.count == self.capacity() {
            self.out.push(self.acc);
            self.acc = 0;
            self.count = 0;
        }
    }

    pub fn flush(mut self) -> Vec<u8> {
        if self.count > 0 {
            let acc = self.acc << (self.capacity() - self.count);
            self.out.push(acc);
        }
        self.out
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Coder {
    Mq,
    Raw,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Pass {
    SignificancePropagation,
    MagnitudeRefinement,
    Cleanup,
}

/// Tier-1 encoder working from neighbour counts (Tables D.1 to D.4), kept
/// independent of the decoder's incremental context map.
pub struct Tier1Encoder<'a> {
    width: usize,
    height: usize,
    orientation: SubbandOrientation,
    values: &'a [i32],
    significant: Vec<bool>,
    visited: Vec<bool>,
    refined: Vec<bool>,
    refinable: Vec<bool>,
    mq: MqEncoder,
    raw: RawBitWriter,
    coder: Coder,
}

/// Most significant bit-plane needed for the values.
pub fn most_significant_bit_plane(values: &[i32]) -> i32 {
    let max = values.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0);
    if max == 0 { 0 } else { 31 - max.leading_zeros() as i32 }
}

/// Encodes all bit-planes of a code-block down to bit-plane 0.
pub fn encode_code_block(
    width: u32,
    height: u32,
    orientation: SubbandOrientation,
    values: &[i32],
    style: CodeBlockStyle,
) -> CodeBlockDescriptor {
    let msb = most_significant_bit_plane(values);
    encode_code_block_from(width, height, orientation, values, style, msb)
}

/// Same as [`encode_code_block`] with leading zero bit-planes above the values.
pub fn encode_code_block_from(
    width: u32,
    height: u32,
    orientation: SubbandOrientation,
    values: &[i32],
    style: CodeBlockStyle,
    msb: i32,
) -> CodeBlockDescriptor {
    assert_eq!(values.len(), (width * height) as usize);
    assert!(msb >= most_significant_bit_plane(values));

    let mut encoder = Tier1Encoder {
        width: width as usize,
        height: height as usize,
        orientation,
        values,
        significant: vec![false; values.len()],
        visited: vec![false; values.len()],
        refined: vec![false; values.len()],
        refinable: vec![false; values.len()],
        mq: MqEncoder::new(),
        raw: RawBitWriter::default(),
        coder: Coder::Mq,
    };

    let coding_passes = 1 + 3 * msb as u32;
    let mut descriptor =
        CodeBlockDescriptor::new(width, height, orientation, msb, coding_passes).with_style(style);

    let mut open: Option<(usize, Coder)> = None;
    for index in 0..coding_passes as usize {
        let (bit_plane, pass) = if index == 0 {
            (msb as u32, Pass::Cleanup)
        } else {
            let plane = msb as u32 - ((index as u32 - 1) / 3 + 1);
            let pass = match (index - 1) % 3 {
                0 => Pass::SignificancePropagation,
                1 => Pass::MagnitudeRefinement,
                _ => Pass::Cleanup,
            };
            (plane, pass)
        };

        let coder = if style.bypass && pass != Pass::Cleanup && index >= 10 {
            Coder::Raw
        } else {
            Coder::Mq
        };

        if style.terminate_each_pass || open.map(|(_, c)| c) != Some(coder) {
            if let Some((start, previous)) = open.take() {
                descriptor.set_segment(start, encoder.finish(previous));
            }
            encoder.begin(coder);
            open = Some((index, coder));
        }

        match pass {
            Pass::SignificancePropagation => encoder.significance_propagation(bit_plane),
            Pass::MagnitudeRefinement => encoder.magnitude_refinement(bit_plane),
            Pass::Cleanup => {
                encoder.cleanup(bit_plane);
                if style.segmentation_symbols {
                    for bit in [true, false, true, false] {
                        encoder.mq.encode(bit, UNIFORM_CONTEXT);
                    }
                }
            }
        }

        if style.reset_probabilities {
            encoder.mq.reset_contexts();
        }
    }

    if let Some((start, previous)) = open {
        descriptor.set_segment(start, encoder.finish(previous));
    }
    descriptor
}

impl Tier1Encoder<'_> {
    fn begin(&mut self, coder: Coder) {
        self.coder = coder;
        match coder {
            Coder::Mq => self.mq.init(),
            Coder::Raw => self.raw = RawBitWriter::default(),
        }
    }

    fn finish(&mut self, coder: Coder) -> Vec<u8> {
        match coder {
            Coder::Mq => self.mq.flush(),
            Coder::Raw => std::mem::take(&mut self.raw).flush(),
        }
    }

    fn put(&mut self, bit: bool, cx: usize) {
        match self.coder {
            Coder::Mq => self.mq.encode(bit, cx),
            Coder::Raw => self.raw.put(bit),
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn is_significant(&self, x: isize, y: isize) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && self.significant[self.index(x as usize, y as usize)]
    }

    fn sign_of(&self, x: isize, y: isize) -> i32 {
        if self.is_significant(x, y) {
            self.values[self.index(x as usize, y as usize)].signum()
        } else {
            0
        }
    }

    fn counts(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let (x, y) = (x as isize, y as isize);
        let s = |dx: isize, dy: isize| self.is_significant(x + dx, y + dy) as u8;
        (
            s(-1, 0) + s(1, 0),
            s(0, -1) + s(0, 1),
            s(-1, -1) + s(1, -1) + s(-1, 1) + s(1, 1),
        )
    }

    // Table D.1
    fn zero_coding_context(&self, x: usize, y: usize) -> usize {
        let (h, v, d) = self.counts(x, y);
        match self.orientation {
            SubbandOrientation::HH => match (d, h + v) {
                (d, _) if d >= 3 => 8,
                (2, hv) if hv >= 1 => 7,
                (2, _) => 6,
                (1, hv) if hv >= 2 => 5,
                (1, 1) => 4,
                (1, _) => 3,
                (_, hv) if hv >= 2 => 2,
                (_, 1) => 1,
                _ => 0,
            },
            orientation => {
                let (h, v) = if orientation == SubbandOrientation::HL { (v, h) } else { (h, v) };
                match (h, v, d) {
                    (2, _, _) => 8,
                    (1, v, _) if v >= 1 => 7,
                    (1, 0, d) if d >= 1 => 6,
                    (1, 0, 0) => 5,
                    (0, 2, _) => 4,
                    (0, 1, _) => 3,
                    (0, 0, d) if d >= 2 => 2,
                    (0, 0, 1) => 1,
                    _ => 0,
                }
            }
        }
    }

    // Table D.3, with the sign contexts numbered from 10.
    fn encode_sign(&mut self, x: usize, y: usize) {
        let negative = self.values[self.index(x, y)] < 0;
        if self.coder == Coder::Raw {
            self.raw.put(negative);
            return;
        }
        let (xi, yi) = (x as isize, y as isize);
        let h = (self.sign_of(xi - 1, yi) + self.sign_of(xi + 1, yi)).clamp(-1, 1);
        let v = (self.sign_of(xi, yi - 1) + self.sign_of(xi, yi + 1)).clamp(-1, 1);
        let (context, xor) = match (h, v) {
            (1, 1) => (13, false),
            (1, 0) => (12, false),
            (1, -1) => (11, false),
            (0, 1) => (10, false),
            (0, 0) => (9, false),
            (0, -1) => (10, true),
            (-1, 1) => (11, true),
            (-1, 0) => (12, true),
            _ => (13, true),
        };
        self.mq.encode(negative ^ xor, context + 1);
    }

    fn bit(&self, x: usize, y: usize, bit_plane: u32) -> bool {
        (self.values[self.index(x, y)].unsigned_abs() >> bit_plane) & 1 == 1
    }

    fn code_significance(&mut self, x: usize, y: usize, bit_plane: u32) {
        let bit = self.bit(x, y, bit_plane);
        let cx = self.zero_coding_context(x, y);
        self.put(bit, cx);
        if bit {
            self.encode_sign(x, y);
            let i = self.index(x, y);
            self.significant[i] = true;
        }
    }

    fn stripes(&self) -> Vec<(usize, usize)> {
        (0..self.height)
            .step_by(STRIPE_HEIGHT)
            .map(|y0| (y0, (y0 + STRIPE_HEIGHT).min(self.height)))
            .collect()
    }

    fn significance_propagation(&mut self, bit_plane: u32) {
        self.refinable.copy_from_slice(&self.significant);
        self.visited.iter_mut().for_each(|v| *v = false);
        for (y0, end) in self.stripes() {
            for x in 0..self.width {
                for y in y0..end {
                    let i = self.index(x, y);
                    if self.significant[i] || self.counts(x, y) == (0, 0, 0) {
                        continue;
                    }
                    self.code_significance(x, y, bit_plane);
                    self.visited[i] = true;
                }
            }
        }
    }

    fn magnitude_refinement(&mut self, bit_plane: u32) {
        for (y0, end) in self.stripes() {
            for x in 0..self.width {
                for y in y0..end {
                    let i = self.index(x, y);
                    if !self.refinable[i] {
                        continue;
                    }
                    // Table D.4
                    let cx = if self.refined[i] {
                        17
                    } else if self.counts(x, y) == (0, 0, 0) {
                        15
                    } else {
                        16
                    };
                    let bit = self.bit(x, y, bit_plane);
                    self.put(bit, cx);
                    self.refined[i] = true;
                }
            }
        }
    }

    fn cleanup(&mut self, bit_plane: u32) {
        for (y0, end) in self.stripes() {
            for x in 0..self.width {
                let mut start = y0;
                let run_candidate = end - y0 == STRIPE_HEIGHT
                    && (y0..end).all(|y| {
                        let i = self.index(x, y);
                        !self.significant[i] && !self.visited[i] && self.counts(x, y) == (0, 0, 0)
                    });
                if run_candidate {
                    match (y0..end).find(|&y| self.bit(x, y, bit_plane)) {
                        None => {
                            self.mq.encode(false, RUN_LENGTH_CONTEXT);
                            continue;
                        }
                        Some(y) => {
                            let row = y - y0;
                            self.mq.encode(true, RUN_LENGTH_CONTEXT);
                            self.mq.encode(row >> 1 == 1, UNIFORM_CONTEXT);
                            self.mq.encode(row & 1 == 1, UNIFORM_CONTEXT);
                            self.encode_sign(x, y);
                            let i = self.index(x, y);
                            self.significant[i] = true;
                            start = y + 1;
                        }
                    }
                }
                for y in start..end {
                    let i = self.index(x, y);
                    if !self.significant[i] && !self.visited[i] {
                        self.code_significance(x, y, bit_plane);
                    }
                }
            }
        }
        self.visited.iter_mut().for_each(|v| *v = false);
    }
}
