//! JPEG 2000 Tier-1 decoding (Part 1, ISO/IEC 15444-1, Annexes C and D)
//!
//! - `mq_coder`: The MQ arithmetic decoder.
//! - `bit_io`: Raw bit reader for arithmetic coding bypass.
//! - `traits`: The `BitDecoder` interface both of them implement.
//! - `context_tables`: Zero coding and sign coding context tables.
//! - `image`: Code-block descriptors, coefficient buffers and context maps.
//! - `bit_plane_coder`: The three coding passes over a code-block.

pub mod bit_io;
pub mod bit_plane_coder;
pub mod context_tables;
pub mod image;
pub mod mq_coder;
pub mod traits;
