//! The decompression engine: the arithmetic bit decoder, its adaptive probability
//! contexts, and the init/read/reset port facade

mod modes;

use crate::buffer::DecompressBuffer;
use crate::decompressor::modes::{Mode0State, Mode1State, Mode2State};
use crate::num::GetBit;
use crate::rom::{DataCursor, Rom};
use crate::tables::EVOLUTION_TABLE;
use bincode::{Decode, Encode};

// Mode 3 is invalid; the hardware always returns $00 from the data port in that state,
// including before the first decompression is started
const INVALID_MODE_SENTINEL: u8 = 0x00;

/// One adaptive probability context: an index into the evolution table plus a flag
/// tracking whether the most/least probable symbols are currently swapped.
#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
struct Context {
    index: u8,
    invert: bool,
}

impl Context {
    fn probability(self) -> u8 {
        EVOLUTION_TABLE[self.index as usize].probability
    }

    // LPS decodes always evolve the state and may swap which symbol is most probable;
    // MPS decodes evolve only when renormalization occurred
    fn evolve(&mut self, lps: bool, renormalized: bool) {
        let entry = EVOLUTION_TABLE[self.index as usize];
        if lps {
            if entry.toggles_invert {
                self.invert = !self.invert;
            }
            self.index = entry.next_lps;
        } else if renormalized {
            self.index = entry.next_mps;
        }
    }
}

type ContextArray = [Context; 32];

#[derive(Debug, Clone, Copy)]
pub(crate) struct DecodedSymbol {
    pub(crate) lps: bool,
    // The context's invert flag as it was when the symbol was decoded (pre-toggle)
    pub(crate) invert: bool,
}

/// Adaptive binary arithmetic decoder with an 8-bit coding interval.
#[derive(Debug, Clone, Default, Encode, Decode)]
struct ArithmeticDecoder {
    span: u8,
    val: u8,
    input: u8,
    bits_remaining: u8,
    cursor: DataCursor,
}

impl ArithmeticDecoder {
    fn begin(&mut self, offset: u32, rom: &Rom) {
        self.cursor = DataCursor::new(offset);
        self.span = 0xFF;
        self.val = self.cursor.next(rom);
        self.input = self.cursor.next(rom);
        self.bits_remaining = 8;
    }

    fn decode(&mut self, contexts: &mut ContextArray, con: u8, rom: &Rom) -> DecodedSymbol {
        let context = &mut contexts[con as usize];
        let prob = context.probability();

        // span >= 0x7F >= probability at every decode, so neither subtraction underflows
        let lps = self.val > self.span - prob;
        if lps {
            self.val -= self.span - (prob - 1);
            self.span = prob - 1;
        } else {
            self.span -= prob;
        }

        // Renormalize: widen the shrunk interval back above 0x7F, shifting fresh
        // compressed bits into the code value MSB-first
        let mut renormalized = false;
        while self.span < 0x7F {
            renormalized = true;

            self.span = (self.span << 1) | 1;
            self.val = (self.val << 1) | u8::from(self.input.bit(7));

            self.input <<= 1;
            self.bits_remaining -= 1;
            if self.bits_remaining == 0 {
                self.input = self.cursor.next(rom);
                self.bits_remaining = 8;
            }
        }

        let invert = context.invert;
        context.evolve(lps, renormalized);

        DecodedSymbol { lps, invert }
    }
}

#[derive(Debug, Clone, Encode, Decode)]
enum DecompressionMode {
    // No stream configured, or an invalid mode was selected
    Invalid,
    // Generic byte data
    Zero(Mode0State),
    // 2bpp tile data
    One(Mode1State),
    // 4bpp tile data
    Two(Mode2State),
}

/// The SPC7110 decompression port.
///
/// Configure a decode stream with [`init`](Self::init), then pull decompressed bytes
/// one at a time with [`read`](Self::read). All decode state is owned by this struct;
/// independent instances never share state.
#[derive(Debug, Clone, Encode, Decode)]
pub struct Spc7110Decompressor {
    mode: DecompressionMode,
    decoder: ArithmeticDecoder,
    contexts: ContextArray,
    buffer: DecompressBuffer,
}

impl Spc7110Decompressor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: DecompressionMode::Invalid,
            decoder: ArithmeticDecoder::default(),
            contexts: [Context::default(); 32],
            buffer: DecompressBuffer::new(),
        }
    }

    /// Configure a fresh decode stream at the given compressed data offset, then
    /// fast-forward by decoding and discarding `index` output bytes.
    ///
    /// Modes outside 0-2 select the invalid state: reads return a fixed $00 until the
    /// next `init`, matching the hardware's treatment of mode 3.
    pub fn init(&mut self, mode: u8, offset: u32, index: u32, rom: &Rom) {
        self.buffer.clear();
        self.contexts = [Context::default(); 32];

        self.mode = match mode {
            0x00 => DecompressionMode::Zero(Mode0State::new()),
            0x01 => DecompressionMode::One(Mode1State::new()),
            0x02 => DecompressionMode::Two(Mode2State::new()),
            _ => {
                log::warn!("Invalid SPC7110 decompression mode {mode:02X}; reads will return $00");
                DecompressionMode::Invalid
            }
        };

        if !matches!(self.mode, DecompressionMode::Invalid) {
            log::trace!("SPC7110 decompression init: mode {mode}, offset {offset:06X}, index {index}");
            self.decoder.begin(offset, rom);
        }

        for _ in 0..index {
            self.read(rom);
        }
    }

    /// Return the next decompressed byte.
    ///
    /// If the output buffer is empty, first runs one bounded refill pass of the active
    /// mode decoder (decoding until the buffer is at least half full).
    pub fn read(&mut self, rom: &Rom) -> u8 {
        if self.buffer.is_empty() {
            match &mut self.mode {
                DecompressionMode::Invalid => return INVALID_MODE_SENTINEL,
                DecompressionMode::Zero(state) => {
                    state.refill(&mut self.decoder, &mut self.contexts, &mut self.buffer, rom);
                }
                DecompressionMode::One(state) => {
                    state.refill(&mut self.decoder, &mut self.contexts, &mut self.buffer, rom);
                }
                DecompressionMode::Two(state) => {
                    state.refill(&mut self.decoder, &mut self.contexts, &mut self.buffer, rom);
                }
            }
        }

        self.buffer.pop()
    }

    /// Force the invalid state and empty the output buffer. Subsequent reads return
    /// $00 until the next [`init`](Self::init).
    pub fn reset(&mut self) {
        self.mode = DecompressionMode::Invalid;
        self.buffer.clear();
    }
}

impl Default for Spc7110Decompressor {
    fn default() -> Self {
        Self::new()
    }
}
