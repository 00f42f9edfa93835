//! JPEG 2000 Tier-1 entropy decoding for JPIP clients, servers and proxies.
//!
//! A [`CodeBlockBitPlaneDecoder`] turns the compressed segments of one
//! code-block into reconstructed wavelet coefficients. Segments may be
//! withheld to model partial delivery; the coefficients then hold the best
//! reconstruction of the passes that did arrive.
//!
//! ```
//! use jpip_tier1::{CodeBlockBitPlaneDecoder, CodeBlockDescriptor, SubbandOrientation};
//!
//! let block = CodeBlockDescriptor::new(1, 1, SubbandOrientation::LL, 0, 1)
//!     .with_segment(0, vec![0x03]);
//! let mut decoder = CodeBlockBitPlaneDecoder::new();
//! let coefficients = decoder.decode(&block).unwrap();
//! assert_eq!(coefficients.as_slice(), &[1.0]);
//! ```

pub mod constants;
pub mod error;
pub mod jpeg2000;

pub use error::Tier1Error;
pub use jpeg2000::bit_io::RawBitDecoder;
pub use jpeg2000::bit_plane_coder::{CodeBlockBitPlaneDecoder, CodingPass, PassKind, PassSchedule};
pub use jpeg2000::image::{
    CodeBlockDescriptor, CodeBlockStyle, CoefficientBuffer, ContextMap, SubbandOrientation,
};
pub use jpeg2000::mq_coder::MqDecoder;
pub use jpeg2000::traits::BitDecoder;
