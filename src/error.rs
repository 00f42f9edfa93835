use thiserror::Error;

use crate::jpeg2000::image::SubbandOrientation;

/// Fatal conditions detected before a code-block is decoded.
///
/// Missing segments, end-of-segment padding and marker codes inside a segment
/// are part of normal progressive delivery and never show up here.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier1Error {
    #[error("Most significant bit-plane {0} is negative")]
    NegativeMostSignificantBitPlane(i32),
    #[error(
        "Most significant bit-plane {most_significant_bit_plane} cannot hold {number_of_bit_planes} bit-planes"
    )]
    InconsistentBitPlaneCount {
        most_significant_bit_plane: i32,
        number_of_bit_planes: u32,
    },
    #[error("Bit-plane {0} is not supported (at most 31 bit-planes)")]
    UnsupportedBitPlane(i32),
    #[error("Invalid code-block size {width}x{height}")]
    InvalidCodeBlockSize { width: u32, height: u32 },
    #[error("Invalid subband orientation {0}")]
    InvalidSubbandOrientation(u8),
}

impl From<num_enum::TryFromPrimitiveError<SubbandOrientation>> for Tier1Error {
    fn from(err: num_enum::TryFromPrimitiveError<SubbandOrientation>) -> Self {
        Tier1Error::InvalidSubbandOrientation(err.number)
    }
}
