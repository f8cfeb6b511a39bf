//! Cartridge image access with the SPC7110's compressed-data addressing rules

use bincode::{Decode, Encode};
use std::ops::Deref;

// All SPC7110 game images have a 1MB program ROM followed by the compressed data ROM
pub(crate) const DATA_ROM_START: usize = 0x100000;

/// A loaded SPC7110 cartridge image, program ROM included.
///
/// Not part of save state; consumers re-inject the image after loading a state.
#[derive(Debug, Clone, Default)]
pub struct Rom(pub Box<[u8]>);

impl Deref for Rom {
    type Target = Box<[u8]>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Rom {
    // Usable size of the compressed data region. Images larger than 5MB have an extra
    // 1MB of expansion ROM that the decompressor cannot address.
    pub(crate) fn data_region_len(&self) -> u32 {
        let len = if self.len() > 0x50_0000 {
            self.len() - 0x20_0000
        } else {
            self.len().saturating_sub(0x10_0000)
        };

        // Degenerate images smaller than the program ROM region read as $00
        len.max(1) as u32
    }

    pub(crate) fn read_data(&self, offset: u32) -> u8 {
        self.0.get(DATA_ROM_START + offset as usize).copied().unwrap_or(0)
    }
}

/// Monotonically advancing cursor into the compressed data region.
///
/// Out-of-range logical offsets are defined behavior: the cursor wraps around the
/// usable region size rather than erroring.
#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
pub(crate) struct DataCursor {
    offset: u32,
}

impl DataCursor {
    pub(crate) fn new(offset: u32) -> Self {
        Self { offset }
    }

    pub(crate) fn next(&mut self, rom: &Rom) -> u8 {
        self.offset %= rom.data_region_len();
        let byte = rom.read_data(self.offset);
        self.offset += 1;
        byte
    }
}
