use super::traits::BitDecoder;

/// Raw bit reader for passes coded with the selective arithmetic coding
/// bypass (ISO/IEC 15444-1, D.6).
///
/// Bits are read MSB first. A byte following `0xFF` carries only 7 bits; its
/// top bit is a stuffing bit. Past the end of the segment the reader sees
/// `0xFF` bytes.
#[derive(Debug, Clone, Default)]
pub struct RawBitDecoder {
    data: Vec<u8>,
    pos: usize,
    bit_buffer: u8,
    bits_left: u8,
    last_byte: u8,
}

impl RawBitDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_bit(&mut self) -> u8 {
        if self.bits_left == 0 {
            let b = self.data.get(self.pos).copied().unwrap_or(0xFF);
            if self.pos < self.data.len() {
                self.pos += 1;
            }

            self.bits_left = if self.last_byte == 0xFF { 7 } else { 8 };
            self.bit_buffer = b;
            self.last_byte = b;
        }

        self.bits_left -= 1;
        (self.bit_buffer >> self.bits_left) & 1
    }
}

impl BitDecoder for RawBitDecoder {
    fn decode_bit(&mut self, _context: usize) -> bool {
        self.read_bit() == 1
    }

    // Raw passes code the sign verbatim.
    fn decode_sign(&mut self, _sign_context: i8) -> bool {
        self.read_bit() == 1
    }

    fn attach(&mut self, segment: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(segment);
    }

    fn restart(&mut self) {
        self.pos = 0;
        self.bit_buffer = 0;
        self.bits_left = 0;
        self.last_byte = 0;
    }

    fn reset(&mut self) {}
}
