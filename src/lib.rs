//! Decompression engine for the SPC7110, a data decompression coprocessor found in
//! a few late SNES cartridges (Tengai Makyou Zero, Momotarou Dentetsu Happy,
//! Super Power League 4)
//!
//! The chip decodes an adaptive binary arithmetic coded bitstream into raw bytes
//! (mode 0) or 2bpp/4bpp SNES tile data (modes 1 and 2). Consumers configure a
//! decode stream with [`Spc7110Decompressor::init`] and then pull decompressed
//! bytes one at a time with [`Spc7110Decompressor::read`], exactly as the actual
//! hardware exposes decompression through its data port register.
//!
//! Algorithm and tables from the byuu/neviksti reverse engineering of the chip.

mod buffer;
mod decompressor;
mod num;
mod rom;
mod tables;

pub use decompressor::Spc7110Decompressor;
pub use rom::Rom;
