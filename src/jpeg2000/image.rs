//! Code-block descriptors and the buffers the Tier-1 decoder fills.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::Tier1Error;
use crate::constants::{MAXIMUM_BIT_PLANE, MAXIMUM_CODE_BLOCK_AREA, MAXIMUM_CODE_BLOCK_DIMENSION};

/// Orientation of a wavelet subband.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SubbandOrientation {
    /// Low-Low (base image)
    LL = 0,
    /// High-Low (horizontal details)
    HL = 1,
    /// Low-High (vertical details)
    LH = 2,
    /// High-High (diagonal details)
    HH = 3,
}

// num_enum turns a `#[default]` variant into the `TryFromPrimitive` fallback.
impl Default for SubbandOrientation {
    fn default() -> Self {
        SubbandOrientation::LL
    }
}

/// Coding options that change how the passes of a code-block are coded
/// (SPcod/SPcoc code-block style, ISO/IEC 15444-1 Table A.19).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlockStyle {
    /// Selective arithmetic coding bypass.
    pub bypass: bool,
    /// Reset context probabilities after each coding pass.
    pub reset_probabilities: bool,
    /// Every coding pass has its own terminated segment. When unset, a pass
    /// without a segment continues the stream of the previous pass.
    pub terminate_each_pass: bool,
    /// Segmentation symbol after each cleanup pass.
    pub segmentation_symbols: bool,
}

impl Default for CodeBlockStyle {
    fn default() -> Self {
        Self {
            bypass: false,
            reset_probabilities: false,
            terminate_each_pass: true,
            segmentation_symbols: false,
        }
    }
}

/// Everything the upstream packet layer knows about one code-block.
#[derive(Debug, Clone, Default)]
pub struct CodeBlockDescriptor {
    /// Width of the code-block.
    pub width: u32,
    /// Height of the code-block.
    pub height: u32,
    /// Orientation of the subband the code-block belongs to.
    pub orientation: SubbandOrientation,
    /// Index of the most significant bit-plane that may hold a one bit.
    pub most_significant_bit_plane: i32,
    /// Number of coding passes announced for the code-block.
    pub coding_passes: u32,
    /// Compressed data per coding pass. Withheld passes are `None`.
    pub segments: Vec<Option<Vec<u8>>>,
    /// Coding options.
    pub style: CodeBlockStyle,
}

impl CodeBlockDescriptor {
    pub fn new(
        width: u32,
        height: u32,
        orientation: SubbandOrientation,
        most_significant_bit_plane: i32,
        coding_passes: u32,
    ) -> Self {
        Self {
            width,
            height,
            orientation,
            most_significant_bit_plane,
            coding_passes,
            segments: Vec::new(),
            style: CodeBlockStyle::default(),
        }
    }

    pub fn with_style(mut self, style: CodeBlockStyle) -> Self {
        self.style = style;
        self
    }

    /// Supplies the segment of one coding pass.
    pub fn with_segment(mut self, pass: usize, data: impl Into<Vec<u8>>) -> Self {
        self.set_segment(pass, data);
        self
    }

    pub fn set_segment(&mut self, pass: usize, data: impl Into<Vec<u8>>) {
        if self.segments.len() <= pass {
            self.segments.resize(pass + 1, None);
        }
        self.segments[pass] = Some(data.into());
    }

    /// Segment of a coding pass, if it has been delivered.
    pub fn segment(&self, pass: usize) -> Option<&[u8]> {
        self.segments.get(pass).and_then(|s| s.as_deref())
    }

    /// Number of bit-planes touched by the announced coding passes.
    pub fn number_of_bit_planes(&self) -> u32 {
        (self.coding_passes + 2).div_ceil(3)
    }

    /// Checks the geometry before any decoding starts.
    pub fn validate(&self) -> Result<(), Tier1Error> {
        let msb = self.most_significant_bit_plane;
        if msb < 0 {
            return Err(Tier1Error::NegativeMostSignificantBitPlane(msb));
        }
        if msb > MAXIMUM_BIT_PLANE {
            return Err(Tier1Error::UnsupportedBitPlane(msb));
        }

        let number_of_bit_planes = self.number_of_bit_planes();
        if (msb as u32) + 1 < number_of_bit_planes {
            return Err(Tier1Error::InconsistentBitPlaneCount {
                most_significant_bit_plane: msb,
                number_of_bit_planes,
            });
        }

        if self.width > MAXIMUM_CODE_BLOCK_DIMENSION
            || self.height > MAXIMUM_CODE_BLOCK_DIMENSION
            || self.width * self.height > MAXIMUM_CODE_BLOCK_AREA
        {
            return Err(Tier1Error::InvalidCodeBlockSize {
                width: self.width,
                height: self.height,
            });
        }

        Ok(())
    }
}

/// Flat row-major matrix shared by the coefficient buffer and the context map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plane<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Plane<T> {
    /// Resizes to the given geometry and zeroes every cell, keeping the allocation.
    pub fn reset(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(width * height, T::default());
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.data[y * self.width + x] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.width..(y + 1) * self.width]
    }
}

/// Per-coefficient context/state values, see the bit-plane decoder for the encoding.
pub type ContextMap = Plane<i8>;

/// Reconstructed coefficients, sign carried by the float.
pub type CoefficientBuffer = Plane<f32>;
