use crate::constants::UNIFORM_CONTEXT;

/// Source of decoded bits for the bit-plane passes.
///
/// There are exactly two implementations: the MQ arithmetic decoder
/// ([`MqDecoder`](super::mq_coder::MqDecoder)) and the raw decoder used by the
/// selective arithmetic coding bypass
/// ([`RawBitDecoder`](super::bit_io::RawBitDecoder)).
pub trait BitDecoder {
    /// Decodes one bit with the given context label.
    fn decode_bit(&mut self, context: usize) -> bool;

    /// Decodes one bit with the fixed equiprobable context.
    fn decode_uniform_bit(&mut self) -> bool {
        self.decode_bit(UNIFORM_CONTEXT)
    }

    /// Decodes a sign bit for the signed sign-coding context of Table D.3.
    ///
    /// Returns `true` when the placeholder (positive) sign must be negated.
    fn decode_sign(&mut self, sign_context: i8) -> bool {
        let bit = self.decode_bit(sign_context.unsigned_abs() as usize);
        (sign_context > 0) == bit
    }

    /// Replaces the byte source. [`restart`](Self::restart) must follow before decoding.
    fn attach(&mut self, segment: &[u8]);

    /// Reinitializes the registers for the currently attached segment.
    fn restart(&mut self);

    /// Returns all probability state to its startup values.
    fn reset(&mut self);
}
