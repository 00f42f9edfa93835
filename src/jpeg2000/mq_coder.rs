//! MQ Arithmetic Decoder (ISO/IEC 15444-1 Annex C)

use log::{trace, warn};

use super::traits::BitDecoder;
use crate::constants::{
    NUM_CONTEXTS, RUN_LENGTH_CONTEXT, RUN_LENGTH_START_STATE, UNIFORM_CONTEXT,
    UNIFORM_START_STATE, ZERO_CODING_START_STATE,
};

/// One row of the probability estimation table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MqContextState {
    pub qe: u16,
    pub nmps: u8,
    pub nlps: u8,
    pub switch: bool,
}

const fn row(qe: u16, nmps: u8, nlps: u8, switch: bool) -> MqContextState {
    MqContextState {
        qe,
        nmps,
        nlps,
        switch,
    }
}

/// Standard Table C-2.
#[rustfmt::skip]
pub static MQ_TABLE: [MqContextState; 47] = [
    row(0x5601, 1, 1, true),
    row(0x3401, 2, 6, false),
    row(0x1801, 3, 9, false),
    row(0x0AC1, 4, 12, false),
    row(0x0521, 5, 29, false),
    row(0x0221, 38, 33, false),
    row(0x5601, 7, 6, true),
    row(0x5401, 8, 14, false),
    row(0x4801, 9, 14, false),
    row(0x3801, 10, 14, false),
    row(0x3001, 11, 17, false),
    row(0x2401, 12, 18, false),
    row(0x1C01, 13, 20, false),
    row(0x1601, 29, 21, false),
    row(0x5601, 15, 14, true),
    row(0x5401, 16, 14, false),
    row(0x5101, 17, 15, false),
    row(0x4801, 18, 16, false),
    row(0x3801, 19, 17, false),
    row(0x3401, 20, 18, false),
    row(0x3001, 21, 19, false),
    row(0x2801, 22, 19, false),
    row(0x2401, 23, 20, false),
    row(0x2201, 24, 21, false),
    row(0x1C01, 25, 22, false),
    row(0x1801, 26, 23, false),
    row(0x1601, 27, 24, false),
    row(0x1401, 28, 25, false),
    row(0x1201, 29, 26, false),
    row(0x1101, 30, 27, false),
    row(0x0AC1, 31, 28, false),
    row(0x09C1, 32, 29, false),
    row(0x08A1, 33, 30, false),
    row(0x0521, 34, 31, false),
    row(0x0441, 35, 32, false),
    row(0x02A1, 36, 33, false),
    row(0x0221, 37, 34, false),
    row(0x0141, 38, 35, false),
    row(0x0111, 39, 36, false),
    row(0x0085, 40, 37, false),
    row(0x0049, 41, 38, false),
    row(0x0025, 42, 39, false),
    row(0x0015, 43, 40, false),
    row(0x0009, 44, 41, false),
    row(0x0005, 45, 42, false),
    row(0x0001, 45, 43, false),
    row(0x5601, 46, 46, false),
];

/// Probability state of one context: an index into [`MQ_TABLE`] and the
/// current most probable symbol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MqContext {
    pub state: u8,
    pub mps: bool,
}

/// The MQ decoder. One instance is owned by each bit-plane decoder and reused
/// for every coding pass and every code-block it decodes.
#[derive(Debug, Clone)]
pub struct MqDecoder {
    // Interval register.
    a: u32,
    // Code register, Chigh in bits 16..32.
    c: u32,
    // Bits left in the low part of C before the next byte is needed.
    ct: u32,
    // Last transferred byte.
    tr: u8,
    // Position of `tr` inside `source`.
    pos: usize,
    source: Vec<u8>,
    contexts: [MqContext; NUM_CONTEXTS],
    marker_reported: bool,
}

impl Default for MqDecoder {
    fn default() -> Self {
        let mut decoder = Self {
            a: 0x8000,
            c: 0,
            ct: 0,
            tr: 0xFF,
            pos: 0,
            source: Vec::new(),
            contexts: [MqContext::default(); NUM_CONTEXTS],
            marker_reported: false,
        };
        decoder.reset();
        decoder
    }
}

impl MqDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current probability state of a context.
    pub fn context(&self, cx: usize) -> MqContext {
        self.contexts[cx]
    }

    /// Byte at `pos`, with the end of the segment padded by `0xFF`.
    fn byte_at(&self, pos: usize) -> u8 {
        self.source.get(pos).copied().unwrap_or(0xFF)
    }

    // C.3.4 BYTEIN
    fn byte_in(&mut self) {
        if self.tr == 0xFF {
            let next = self.byte_at(self.pos + 1);
            if next > 0x8F {
                if self.pos + 1 < self.source.len() && !self.marker_reported {
                    warn!(
                        "marker code 0xFF{:02X} inside code-block segment at offset {}",
                        next,
                        self.pos
                    );
                    self.marker_reported = true;
                }
                self.c += 0xFF00;
                self.ct = 8;
            } else {
                self.pos += 1;
                self.tr = next;
                self.c += (next as u32) << 9;
                self.ct = 7;
            }
        } else {
            if self.pos < self.source.len() {
                self.pos += 1;
            }
            self.tr = self.byte_at(self.pos);
            self.c += (self.tr as u32) << 8;
            self.ct = 8;
        }
    }

    // C.3.3 RENORMD
    fn renormalize_input(&mut self) {
        loop {
            if self.ct == 0 {
                self.byte_in();
            }
            self.a <<= 1;
            self.c <<= 1;
            self.ct -= 1;
            if self.a >= 0x8000 {
                break;
            }
        }
    }

    // C.3.2 DECODE, including the MPS_EXCHANGE and LPS_EXCHANGE procedures.
    fn decode(&mut self, cx: usize) -> bool {
        let context = self.contexts[cx];
        let entry = MQ_TABLE[context.state as usize];
        let qe = entry.qe as u32;

        self.a -= qe;

        let lps = |context: &mut MqContext| {
            if entry.switch {
                context.mps = !context.mps;
            }
            context.state = entry.nlps;
        };

        let symbol;
        if (self.c >> 16) < qe {
            let context = &mut self.contexts[cx];
            if self.a < qe {
                symbol = context.mps;
                context.state = entry.nmps;
            } else {
                symbol = !context.mps;
                lps(context);
            }
            self.a = qe;
            self.renormalize_input();
        } else {
            self.c -= qe << 16;
            if self.a & 0x8000 == 0 {
                let context = &mut self.contexts[cx];
                if self.a < qe {
                    symbol = !context.mps;
                    lps(context);
                } else {
                    symbol = context.mps;
                    context.state = entry.nmps;
                }
                self.renormalize_input();
            } else {
                symbol = context.mps;
            }
        }

        trace!(
            "MQ decode cx={} state={} qe={:#06x} -> {} (A={:#06x} C={:#010x})",
            cx,
            context.state,
            qe,
            symbol as u8,
            self.a,
            self.c
        );

        symbol
    }
}

impl BitDecoder for MqDecoder {
    fn decode_bit(&mut self, context: usize) -> bool {
        self.decode(context)
    }

    fn attach(&mut self, segment: &[u8]) {
        self.source.clear();
        self.source.extend_from_slice(segment);
    }

    // C.3.5 INITDEC
    fn restart(&mut self) {
        self.pos = 0;
        self.marker_reported = false;
        self.tr = self.byte_at(0);
        self.c = (self.tr as u32) << 16;
        self.byte_in();
        self.c <<= 7;
        self.ct -= 7;
        self.a = 0x8000;
    }

    /// Startup states of Table D.7.
    fn reset(&mut self) {
        self.contexts = [MqContext::default(); NUM_CONTEXTS];
        self.contexts[0].state = ZERO_CODING_START_STATE;
        self.contexts[RUN_LENGTH_CONTEXT].state = RUN_LENGTH_START_STATE;
        self.contexts[UNIFORM_CONTEXT].state = UNIFORM_START_STATE;
    }
}
