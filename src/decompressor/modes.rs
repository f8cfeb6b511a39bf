//! The three mode-specific reconstruction algorithms that drive the arithmetic bit
//! decoder and push finished bytes into the output buffer

use crate::buffer::{DecompressBuffer, REFILL_TARGET};
use crate::decompressor::{ArithmeticDecoder, ContextArray};
use crate::num::U16Ext;
use crate::rom::Rom;
use crate::tables::{MODE_2_CONTEXT_TABLE, morton_2x8, morton_4x8};
use bincode::{Decode, Encode};
use std::array;

// 5-way equality classification of the three reference pixels (a JPEG-LS style
// gradient context)
fn reference_context(a: u8, b: u8, c: u8) -> u8 {
    if a == b && b == c {
        0
    } else if a == b {
        1
    } else if b == c {
        2
    } else if a == c {
        3
    } else {
        4
    }
}

// order is always a permutation, so value is always present
fn move_to_front(order: &mut [u8], value: u8) {
    let mut i = 0;
    while order[i] != value {
        i += 1;
    }

    order.copy_within(..i, 1);
    order[0] = value;
}

/// Mode 0: generic byte data, 8 arithmetic coded bits per output byte.
#[derive(Debug, Clone, Encode, Decode)]
pub(crate) struct Mode0State {
    out: u16,
    lps: u8,
    inverts: u8,
}

impl Mode0State {
    pub(crate) fn new() -> Self {
        Self { out: 0, lps: 0, inverts: 0 }
    }

    pub(crate) fn refill(
        &mut self,
        decoder: &mut ArithmeticDecoder,
        contexts: &mut ContextArray,
        buffer: &mut DecompressBuffer,
        rom: &Rom,
    ) {
        while buffer.len() < REFILL_TARGET {
            for bit in 0..8_u8 {
                // Context from the low bits of recent LPS/invert history; bits 4-7 of
                // each byte use a second bank of contexts
                let mask = (1 << (bit & 3)) - 1;
                let mut con = mask + ((self.inverts & mask) ^ (self.lps & mask));
                if bit > 3 {
                    con += 15;
                }

                let symbol = decoder.decode(contexts, con, rom);

                // The most probable symbol is the bit decoded 16 positions ago,
                // flipped if this context is currently inverted
                let mps = ((self.out >> 15) as u8 & 0x01) ^ u8::from(symbol.invert);
                self.out = (self.out << 1) | u16::from(mps ^ u8::from(symbol.lps));

                self.lps = (self.lps << 1) | u8::from(symbol.lps);
                self.inverts = (self.inverts << 1) | u8::from(symbol.invert);
            }

            buffer.push(self.out as u8);
        }
    }
}

/// Mode 1: 2bpp tile data, two arithmetic coded bits per pixel.
#[derive(Debug, Clone, Encode, Decode)]
pub(crate) struct Mode1State {
    pixel_order: [u8; 4],
    real_order: [u8; 4],
    out: u32,
    lps: u8,
    inverts: u8,
}

impl Mode1State {
    pub(crate) fn new() -> Self {
        Self {
            pixel_order: array::from_fn(|i| i as u8),
            real_order: array::from_fn(|i| i as u8),
            out: 0,
            lps: 0,
            inverts: 0,
        }
    }

    pub(crate) fn refill(
        &mut self,
        decoder: &mut ArithmeticDecoder,
        contexts: &mut ContextArray,
        buffer: &mut DecompressBuffer,
        rom: &Rom,
    ) {
        while buffer.len() < REFILL_TARGET {
            for _ in 0..8 {
                // Reference pixels: west neighbor, 7 pixels back, 8 pixels back
                let a = ((self.out >> 2) & 0x03) as u8;
                let b = ((self.out >> 14) & 0x03) as u8;
                let c = ((self.out >> 16) & 0x03) as u8;
                let mut con = reference_context(a, b, c);

                move_to_front(&mut self.pixel_order, a);

                self.real_order = self.pixel_order;
                move_to_front(&mut self.real_order, c);
                move_to_front(&mut self.real_order, b);
                move_to_front(&mut self.real_order, a);

                // Two-level binary tree descent
                for _ in 0..2 {
                    let symbol = decoder.decode(contexts, con, rom);
                    self.lps = (self.lps << 1) | u8::from(symbol.lps);
                    self.inverts = (self.inverts << 1) | u8::from(symbol.invert);

                    con = 5 + 2 * con + ((self.lps ^ self.inverts) & 0x01);
                }

                let pixel = self.real_order[((self.lps ^ self.inverts) & 0x03) as usize];
                self.out = (self.out << 2) | u32::from(pixel);
            }

            // Emit the 8-pixel row as two bitplane bytes
            let planes = morton_2x8(self.out as u16);
            buffer.push(planes.msb());
            buffer.push(planes.lsb());
        }
    }
}

/// Mode 2: 4bpp tile data, four arithmetic coded bits per pixel. Bitplanes 0/1 are
/// emitted per row; bitplanes 2/3 are staged in a side buffer and flushed every two
/// rows to reproduce the interleaved 4bpp tile layout.
#[derive(Debug, Clone, Encode, Decode)]
pub(crate) struct Mode2State {
    pixel_order: [u8; 16],
    real_order: [u8; 16],
    bitplane_buffer: [u8; 16],
    buffer_index: u8,
    out0: u32,
    out1: u32,
    lps: u8,
    inverts: u8,
}

impl Mode2State {
    pub(crate) fn new() -> Self {
        Self {
            pixel_order: array::from_fn(|i| i as u8),
            real_order: array::from_fn(|i| i as u8),
            bitplane_buffer: [0; 16],
            buffer_index: 0,
            out0: 0,
            out1: 0,
            lps: 0,
            inverts: 0,
        }
    }

    pub(crate) fn refill(
        &mut self,
        decoder: &mut ArithmeticDecoder,
        contexts: &mut ContextArray,
        buffer: &mut DecompressBuffer,
        rom: &Rom,
    ) {
        while buffer.len() < REFILL_TARGET {
            for _ in 0..8 {
                // Reference pixels: west neighbor, 7 pixels back, 8 pixels back
                let a = (self.out0 & 0x0F) as u8;
                let b = ((self.out0 >> 28) & 0x0F) as u8;
                let c = (self.out1 & 0x0F) as u8;
                let refcon = reference_context(a, b, c);
                let mut con = 0;

                move_to_front(&mut self.pixel_order, a);

                self.real_order = self.pixel_order;
                move_to_front(&mut self.real_order, c);
                move_to_front(&mut self.real_order, b);
                move_to_front(&mut self.real_order, a);

                // Four-level tree descent through the fixed transition table; the
                // reference pixel context is grafted on at the tree's first branch
                for _ in 0..4 {
                    let symbol = decoder.decode(contexts, con, rom);
                    self.lps = (self.lps << 1) | u8::from(symbol.lps);
                    self.inverts = (self.inverts << 1) | u8::from(symbol.invert);

                    let branch = usize::from(symbol.lps != symbol.invert);
                    con = MODE_2_CONTEXT_TABLE[con as usize][branch]
                        + if con == 1 { refcon } else { 0 };
                }

                let pixel = self.real_order[((self.lps ^ self.inverts) & 0x0F) as usize];
                self.out1 = (self.out1 << 4) | (self.out0 >> 28);
                self.out0 = (self.out0 << 4) | u32::from(pixel);
            }

            // Emit bitplanes 0/1 of the 8-pixel row immediately; stage bitplanes 2/3
            let planes = morton_4x8(self.out0);
            buffer.push((planes >> 24) as u8);
            buffer.push((planes >> 16) as u8);
            self.bitplane_buffer[self.buffer_index as usize] = (planes >> 8) as u8;
            self.bitplane_buffer[self.buffer_index as usize + 1] = planes as u8;
            self.buffer_index += 2;

            if self.buffer_index == 16 {
                for byte in self.bitplane_buffer {
                    buffer.push(byte);
                }
                self.buffer_index = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_context_classification() {
        assert_eq!(reference_context(1, 1, 1), 0);
        assert_eq!(reference_context(1, 1, 2), 1);
        assert_eq!(reference_context(1, 2, 2), 2);
        assert_eq!(reference_context(2, 1, 2), 3);
        assert_eq!(reference_context(1, 2, 3), 4);
    }

    #[test]
    fn move_to_front_preserves_permutation() {
        let mut order: [u8; 16] = array::from_fn(|i| i as u8);

        for value in [5, 5, 0, 15, 7, 15, 3] {
            move_to_front(&mut order, value);
            assert_eq!(order[0], value);

            let mut sorted = order;
            sorted.sort_unstable();
            assert_eq!(sorted, array::from_fn(|i| i as u8));
        }

        // Most recently used values stay at the front
        assert_eq!(&order[..4], &[3, 15, 7, 0]);
    }
}
