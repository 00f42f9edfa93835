//! EBCOT Tier-1 bit-plane decoding (ISO/IEC 15444-1, Annex D).
//!
//! Every coefficient owns one cell of a [`ContextMap`]:
//!
//! * `0`: insignificant, no significant neighbour.
//! * `±1..=±8`: insignificant, zero coding label of its neighbourhood. A
//!   positive label is visited by the next significance propagation pass, a
//!   negative one by the next cleanup pass.
//! * `±15`/`±16`: significant without/with a significant neighbour. Negative
//!   when found by a significance propagation pass of the current bit-plane,
//!   positive when found by a cleanup pass.
//! * `17`: refined at least once.

use log::{debug, trace, warn};

use super::bit_io::RawBitDecoder;
use super::context_tables::{
    Direction, SubbandGroup, neighbor_update, sign_context, updated_context,
};
use super::image::{CodeBlockDescriptor, CoefficientBuffer, ContextMap, Plane};
use super::mq_coder::MqDecoder;
use super::traits::BitDecoder;
use crate::Tier1Error;
use crate::constants::{
    FIRST_BYPASS_PASS, MAX_ZERO_CODING_CONTEXT, REFINED, RUN_LENGTH_CONTEXT, SEGMENTATION_SYMBOL,
    SIGNIFICANT_ISOLATED, SIGNIFICANT_WITH_NEIGHBOR, STRIPE_HEIGHT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    SignificancePropagation = 0,
    MagnitudeRefinement = 1,
    Cleanup = 2,
}

/// One coding pass of a code-block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingPass {
    pub bit_plane: u32,
    pub kind: PassKind,
    /// Position in the coded pass sequence, which is also the segment index.
    pub index: usize,
}

/// Passes touched by a code-block, from the most significant bit-plane down:
/// a lone cleanup pass, then significance propagation, magnitude refinement
/// and cleanup for every following bit-plane.
#[derive(Debug, Clone)]
pub struct PassSchedule {
    most_significant_bit_plane: i64,
    lowest_bit_plane: i64,
    next: Option<(i64, PassKind)>,
}

impl PassSchedule {
    pub fn new(most_significant_bit_plane: u32, number_of_bit_planes: u32) -> Self {
        let msb = most_significant_bit_plane as i64;
        Self {
            most_significant_bit_plane: msb,
            lowest_bit_plane: msb - number_of_bit_planes as i64 + 1,
            next: Some((msb, PassKind::Cleanup)),
        }
    }
}

impl Iterator for PassSchedule {
    type Item = CodingPass;

    fn next(&mut self) -> Option<CodingPass> {
        let (bit_plane, kind) = self.next?;
        if bit_plane < self.lowest_bit_plane || bit_plane < 0 {
            self.next = None;
            return None;
        }

        self.next = Some(match kind {
            PassKind::Cleanup => (bit_plane - 1, PassKind::SignificancePropagation),
            PassKind::SignificancePropagation => (bit_plane, PassKind::MagnitudeRefinement),
            PassKind::MagnitudeRefinement => (bit_plane, PassKind::Cleanup),
        });

        let index = (self.most_significant_bit_plane - bit_plane) * 3 + kind as i64 - 2;
        Some(CodingPass {
            bit_plane: bit_plane as u32,
            kind,
            index: index as usize,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoderKind {
    Arithmetic,
    Raw,
}

fn bit_wise_sign(value: f32) -> i32 {
    if value < 0.0 {
        -1
    } else if value > 0.0 {
        1
    } else {
        0
    }
}

/// Per code-block state the passes operate on.
#[derive(Debug, Clone)]
struct BlockState {
    group: SubbandGroup,
    contexts: ContextMap,
    coefficients: CoefficientBuffer,
    // Exact magnitudes, mirrored into `coefficients` after every change.
    magnitudes: Plane<u32>,
}

impl BlockState {
    fn reset(&mut self, width: usize, height: usize, group: SubbandGroup) {
        self.group = group;
        self.contexts.reset(width, height);
        self.coefficients.reset(width, height);
        self.magnitudes.reset(width, height);
    }

    fn width(&self) -> usize {
        self.contexts.width()
    }

    fn height(&self) -> usize {
        self.contexts.height()
    }

    fn neighbor(&self, x: usize, y: usize, direction: Direction) -> Option<(usize, usize)> {
        let (dx, dy) = direction.offset();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < self.width() && ny < self.height()).then_some((nx, ny))
    }

    // Contribution of a neighbour to the sign context.
    fn sign_contribution(&self, x: usize, y: usize, direction: Direction) -> i32 {
        match self.neighbor(x, y, direction) {
            Some((nx, ny)) if self.contexts.get(nx, ny).abs() > MAX_ZERO_CODING_CONTEXT => {
                bit_wise_sign(self.coefficients.get(nx, ny))
            }
            _ => 0,
        }
    }

    fn set_magnitude(&mut self, x: usize, y: usize, magnitude: u32, negative: bool) {
        self.magnitudes.set(x, y, magnitude);
        let value = magnitude as f32;
        self.coefficients.set(x, y, if negative { -value } else { value });
    }

    fn become_significant<D: BitDecoder>(
        &mut self,
        decoder: &mut D,
        x: usize,
        y: usize,
        bit_plane: u32,
        in_cleanup: bool,
    ) {
        let mask = 1u32 << bit_plane;
        self.set_magnitude(x, y, mask | mask >> 1, false);

        let h = self.sign_contribution(x, y, Direction::Left)
            + self.sign_contribution(x, y, Direction::Right);
        let v = self.sign_contribution(x, y, Direction::Up)
            + self.sign_contribution(x, y, Direction::Down);
        if decoder.decode_sign(sign_context(h, v)) {
            self.set_magnitude(x, y, mask | mask >> 1, true);
        }

        let has_significant_neighbor = Direction::ALL.iter().any(|&direction| {
            self.neighbor(x, y, direction)
                .is_some_and(|(nx, ny)| self.contexts.get(nx, ny).abs() >= SIGNIFICANT_ISOLATED)
        });
        let own = if has_significant_neighbor {
            SIGNIFICANT_WITH_NEIGHBOR
        } else {
            SIGNIFICANT_ISOLATED
        };
        self.contexts.set(x, y, if in_cleanup { own } else { -own });

        for direction in Direction::ALL {
            let Some((nx, ny)) = self.neighbor(x, y, direction) else {
                continue;
            };
            let old = self.contexts.get(nx, ny);
            let new = if old.abs() > MAX_ZERO_CODING_CONTEXT {
                if old.abs() == SIGNIFICANT_ISOLATED {
                    old.signum() * SIGNIFICANT_WITH_NEIGHBOR
                } else {
                    old
                }
            } else {
                let entry = neighbor_update(self.group, direction, y, old.unsigned_abs());
                updated_context(old, entry, in_cleanup)
            };
            self.contexts.set(nx, ny, new);
        }
    }

    fn significance_propagation<D: BitDecoder>(&mut self, decoder: &mut D, bit_plane: u32) {
        for y0 in (0..self.height()).step_by(STRIPE_HEIGHT) {
            let end = (y0 + STRIPE_HEIGHT).min(self.height());
            for x in 0..self.width() {
                for y in y0..end {
                    let context = self.contexts.get(x, y);
                    if (1..=MAX_ZERO_CODING_CONTEXT).contains(&context)
                        && decoder.decode_bit(context as usize)
                    {
                        self.become_significant(decoder, x, y, bit_plane, false);
                    }
                }
            }
        }
    }

    fn magnitude_refinement<D: BitDecoder>(&mut self, decoder: &mut D, bit_plane: u32) {
        let mask = 1u32 << bit_plane;
        for y0 in (0..self.height()).step_by(STRIPE_HEIGHT) {
            let end = (y0 + STRIPE_HEIGHT).min(self.height());
            for x in 0..self.width() {
                for y in y0..end {
                    let context = self.contexts.get(x, y);
                    if context >= SIGNIFICANT_ISOLATED {
                        let bit = if decoder.decode_bit(context as usize) { mask } else { 0 };
                        let magnitude = (self.magnitudes.get(x, y) & !mask) | bit | mask >> 1;
                        let negative = self.coefficients.get(x, y) < 0.0;
                        self.set_magnitude(x, y, magnitude, negative);
                        self.contexts.set(x, y, REFINED);
                    } else if context <= -SIGNIFICANT_ISOLATED {
                        self.contexts.set(x, y, -context);
                    }
                }
            }
        }
    }

    fn cleanup<D: BitDecoder>(&mut self, decoder: &mut D, bit_plane: u32) {
        for y0 in (0..self.height()).step_by(STRIPE_HEIGHT) {
            let end = (y0 + STRIPE_HEIGHT).min(self.height());
            let full_stripe = end - y0 == STRIPE_HEIGHT;
            for x in 0..self.width() {
                let mut y = y0;
                if full_stripe && (y0..end).all(|row| self.contexts.get(x, row) == 0) {
                    if !decoder.decode_bit(RUN_LENGTH_CONTEXT) {
                        continue;
                    }
                    let high = decoder.decode_uniform_bit() as usize;
                    let low = decoder.decode_uniform_bit() as usize;
                    y = y0 + (high << 1 | low);
                    self.become_significant(decoder, x, y, bit_plane, true);
                    y += 1;
                }

                for row in y..end {
                    let context = self.contexts.get(x, row);
                    if (-MAX_ZERO_CODING_CONTEXT..=0).contains(&context) {
                        let label = -context;
                        self.contexts.set(x, row, label);
                        if decoder.decode_bit(label as usize) {
                            self.become_significant(decoder, x, row, bit_plane, true);
                        }
                    }
                }
            }
        }
    }

    // Bookkeeping of a pass that is not decoded, so the visitation tags stay
    // consistent for the passes that follow.
    fn skip(&mut self, kind: PassKind) {
        let cells = self.contexts.as_mut_slice();
        match kind {
            PassKind::SignificancePropagation => {}
            PassKind::MagnitudeRefinement => {
                for context in cells.iter_mut().filter(|c| **c <= -SIGNIFICANT_ISOLATED) {
                    *context = -*context;
                }
            }
            PassKind::Cleanup => {
                for context in cells
                    .iter_mut()
                    .filter(|c| (-MAX_ZERO_CODING_CONTEXT..0).contains(&**c))
                {
                    *context = -*context;
                }
            }
        }
    }

    fn run_pass<D: BitDecoder>(&mut self, decoder: &mut D, pass: CodingPass, check_segmentation: bool) {
        match pass.kind {
            PassKind::SignificancePropagation => {
                self.significance_propagation(decoder, pass.bit_plane)
            }
            PassKind::MagnitudeRefinement => self.magnitude_refinement(decoder, pass.bit_plane),
            PassKind::Cleanup => {
                self.cleanup(decoder, pass.bit_plane);
                if check_segmentation {
                    let mut symbol = 0u8;
                    for _ in 0..4 {
                        symbol = symbol << 1 | decoder.decode_uniform_bit() as u8;
                    }
                    if symbol != SEGMENTATION_SYMBOL {
                        warn!(
                            "invalid segmentation symbol {:04b} after cleanup pass {} (bit-plane {})",
                            symbol, pass.index, pass.bit_plane
                        );
                    }
                }
            }
        }
    }
}

/// Decodes the coding passes of code-blocks into coefficients.
///
/// One instance is meant to be owned by a single worker and reused for any
/// number of code-blocks. Each call to [`decode`](Self::decode) starts from a
/// zeroed context map and coefficient buffer sized to the new block.
#[derive(Debug, Clone)]
pub struct CodeBlockBitPlaneDecoder {
    block: BlockState,
    mq: MqDecoder,
    raw: RawBitDecoder,
}

impl Default for CodeBlockBitPlaneDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeBlockBitPlaneDecoder {
    pub fn new() -> Self {
        Self {
            block: BlockState {
                group: SubbandGroup::LowLowAndLowHigh,
                contexts: ContextMap::default(),
                coefficients: CoefficientBuffer::default(),
                magnitudes: Plane::default(),
            },
            mq: MqDecoder::new(),
            raw: RawBitDecoder::new(),
        }
    }

    /// Validates the descriptor and prepares zeroed state for it.
    pub fn attach(&mut self, descriptor: &CodeBlockDescriptor) -> Result<(), Tier1Error> {
        descriptor.validate()?;
        self.block.reset(
            descriptor.width as usize,
            descriptor.height as usize,
            descriptor.orientation.into(),
        );
        self.mq.reset();
        Ok(())
    }

    /// Decodes every delivered coding pass of the code-block.
    pub fn decode(
        &mut self,
        descriptor: &CodeBlockDescriptor,
    ) -> Result<&CoefficientBuffer, Tier1Error> {
        self.attach(descriptor)?;

        let style = descriptor.style;
        let coding_passes = descriptor.coding_passes as usize;
        let mut active: Option<CoderKind> = None;

        debug!(
            "decoding {}x{} {:?} code-block: msb {}, {} passes, {} segments",
            descriptor.width,
            descriptor.height,
            descriptor.orientation,
            descriptor.most_significant_bit_plane,
            coding_passes,
            descriptor.segments.iter().flatten().count()
        );

        let schedule = PassSchedule::new(
            descriptor.most_significant_bit_plane as u32,
            descriptor.number_of_bit_planes(),
        );
        for pass in schedule {
            if pass.index >= coding_passes {
                self.block.skip(pass.kind);
                continue;
            }

            let coder = if style.bypass
                && pass.kind != PassKind::Cleanup
                && pass.index >= FIRST_BYPASS_PASS
            {
                CoderKind::Raw
            } else {
                CoderKind::Arithmetic
            };

            match descriptor.segment(pass.index) {
                Some(segment) => {
                    match coder {
                        CoderKind::Arithmetic => {
                            self.mq.attach(segment);
                            self.mq.restart();
                        }
                        CoderKind::Raw => {
                            self.raw.attach(segment);
                            self.raw.restart();
                        }
                    }
                    active = Some(coder);
                }
                None if !style.terminate_each_pass && active == Some(coder) => {}
                None => {
                    debug!("pass {} ({:?}) has no segment, skipped", pass.index, pass.kind);
                    self.block.skip(pass.kind);
                    active = None;
                    if style.reset_probabilities {
                        self.mq.reset();
                    }
                    continue;
                }
            }

            trace!(
                "pass {} {:?} on bit-plane {} ({:?})",
                pass.index,
                pass.kind,
                pass.bit_plane,
                coder
            );
            match coder {
                CoderKind::Arithmetic => {
                    self.block
                        .run_pass(&mut self.mq, pass, style.segmentation_symbols)
                }
                CoderKind::Raw => self.block.run_pass(&mut self.raw, pass, false),
            }

            if style.reset_probabilities {
                self.mq.reset();
            }
        }

        Ok(&self.block.coefficients)
    }

    /// Coefficients of the last decoded code-block.
    pub fn coefficients(&self) -> &CoefficientBuffer {
        &self.block.coefficients
    }

    /// Sign-magnitude integers of the last decoded code-block, read from the
    /// exact magnitudes rather than the `f32` buffer.
    pub fn to_integers(&self) -> Vec<i32> {
        self.block
            .magnitudes
            .as_slice()
            .iter()
            .zip(self.block.coefficients.as_slice())
            .map(|(&magnitude, &value)| {
                let magnitude = magnitude as i32;
                if value < 0.0 { -magnitude } else { magnitude }
            })
            .collect()
    }

    /// Context map of the last decoded code-block.
    pub fn contexts(&self) -> &ContextMap {
        &self.block.contexts
    }
}
