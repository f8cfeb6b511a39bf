//! Output ring buffer decoupling the refill loop from byte-at-a-time port reads

use bincode::{Decode, Encode};

// Size of the hardware's decompression buffer. Must be a power of two
// (offsets wrap via mask) and must leave headroom above the refill target for mode 2's
// worst case: a pass can cross the target with a 2-byte group emission plus a 16-byte
// bitplane flush, so a pass writes at most REFILL_TARGET + 17 bytes.
pub(crate) const BUFFER_LEN: usize = 64;

// A refill pass stops once at least this many bytes are buffered.
pub(crate) const REFILL_TARGET: usize = BUFFER_LEN / 2;

#[derive(Debug, Clone, Encode, Decode)]
pub(crate) struct DecompressBuffer {
    data: [u8; BUFFER_LEN],
    read_idx: usize,
    write_idx: usize,
    len: usize,
}

impl DecompressBuffer {
    pub(crate) fn new() -> Self {
        Self { data: [0; BUFFER_LEN], read_idx: 0, write_idx: 0, len: 0 }
    }

    pub(crate) fn push(&mut self, byte: u8) {
        debug_assert!(self.len < BUFFER_LEN);

        self.data[self.write_idx] = byte;
        self.write_idx = (self.write_idx + 1) & (BUFFER_LEN - 1);
        self.len += 1;
    }

    pub(crate) fn pop(&mut self) -> u8 {
        debug_assert!(self.len > 0);

        let byte = self.data[self.read_idx];
        self.read_idx = (self.read_idx + 1) & (BUFFER_LEN - 1);
        self.len -= 1;
        byte
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn clear(&mut self) {
        self.read_idx = 0;
        self.write_idx = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_fifo_order() {
        let mut buffer = DecompressBuffer::new();
        for byte in 0..10 {
            buffer.push(byte);
        }

        assert_eq!(buffer.len(), 10);
        for byte in 0..10 {
            assert_eq!(buffer.pop(), byte);
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn offsets_wrap_around_capacity() {
        let mut buffer = DecompressBuffer::new();

        // Repeatedly fill past the capacity boundary while draining
        for round in 0..5_u32 {
            for i in 0..BUFFER_LEN as u32 - 1 {
                buffer.push((round + i) as u8);
            }
            for i in 0..BUFFER_LEN as u32 - 1 {
                assert_eq!(buffer.pop(), (round + i) as u8);
            }
            assert!(buffer.is_empty());
        }
    }

    #[test]
    fn clear_empties_buffer() {
        let mut buffer = DecompressBuffer::new();
        for byte in 0..20 {
            buffer.push(byte);
        }

        buffer.clear();
        assert!(buffer.is_empty());

        buffer.push(0xAB);
        assert_eq!(buffer.pop(), 0xAB);
    }
}
