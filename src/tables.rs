//! Fixed decode tables: the adaptive probability state machine, the mode 2 context
//! transition tree, and the reverse morton bitplane lookup tables

/// One state of the adaptive probability state machine shared by all contexts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EvolutionEntry {
    pub(crate) probability: u8,
    pub(crate) next_lps: u8,
    pub(crate) next_mps: u8,
    pub(crate) toggles_invert: bool,
}

const fn evo(probability: u8, next_lps: u8, next_mps: u8, toggles_invert: bool) -> EvolutionEntry {
    EvolutionEntry { probability, next_lps, next_mps, toggles_invert }
}

#[rustfmt::skip]
pub(crate) const EVOLUTION_TABLE: [EvolutionEntry; 53] = [
    evo(0x5A,  1,  1, true),
    evo(0x25,  6,  2, false),
    evo(0x11,  8,  3, false),
    evo(0x08, 10,  4, false),
    evo(0x03, 12,  5, false),
    evo(0x01, 15,  5, false),

    evo(0x5A,  7,  7, true),
    evo(0x3F, 19,  8, false),
    evo(0x2C, 21,  9, false),
    evo(0x20, 22, 10, false),
    evo(0x17, 23, 11, false),
    evo(0x11, 25, 12, false),
    evo(0x0C, 26, 13, false),
    evo(0x09, 28, 14, false),
    evo(0x07, 29, 15, false),
    evo(0x05, 31, 16, false),
    evo(0x04, 32, 17, false),
    evo(0x03, 34, 18, false),
    evo(0x02, 35,  5, false),

    evo(0x5A, 20, 20, true),
    evo(0x48, 39, 21, false),
    evo(0x3A, 40, 22, false),
    evo(0x2E, 42, 23, false),
    evo(0x26, 44, 24, false),
    evo(0x1F, 45, 25, false),
    evo(0x19, 46, 26, false),
    evo(0x15, 25, 27, false),
    evo(0x11, 26, 28, false),
    evo(0x0E, 26, 29, false),
    evo(0x0B, 27, 30, false),
    evo(0x09, 28, 31, false),
    evo(0x08, 29, 32, false),
    evo(0x07, 30, 33, false),
    evo(0x05, 31, 34, false),
    evo(0x04, 33, 35, false),
    evo(0x04, 33, 36, false),
    evo(0x03, 34, 37, false),
    evo(0x02, 35, 38, false),
    evo(0x02, 36,  5, false),

    evo(0x58, 39, 40, true),
    evo(0x4D, 47, 41, false),
    evo(0x43, 48, 42, false),
    evo(0x3B, 49, 43, false),
    evo(0x34, 50, 44, false),
    evo(0x2E, 51, 45, false),
    evo(0x29, 44, 46, false),
    evo(0x25, 45, 24, false),

    evo(0x56, 47, 48, true),
    evo(0x4F, 47, 49, false),
    evo(0x47, 48, 50, false),
    evo(0x41, 49, 51, false),
    evo(0x3C, 50, 52, false),
    evo(0x37, 51, 43, false),
];

// Mode 2 binary decode tree: next context for each (current context, decoded bit) pair.
// The first branching point (context 1) additionally adds the 5-way reference pixel
// context to the transition target.
#[rustfmt::skip]
pub(crate) const MODE_2_CONTEXT_TABLE: [[u8; 2]; 32] = [
    [ 1,  2],

    [ 3,  8],
    [13, 14],

    [15, 16],
    [17, 18],
    [19, 20],
    [21, 22],
    [23, 24],
    [25, 26],
    [25, 26],
    [25, 26],
    [25, 26],
    [25, 26],
    [27, 28],
    [29, 30],

    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],
    [31, 31],

    [31, 31],
];

// Reverse morton lookup tables, built at compile time. Each table maps one byte of
// interleaved pixel data to its contribution to the de-interleaved bitplane word:
//
// 2x8-bit: interleaved bit p lands at output bit 8 + p/2 (p odd) or p/2 (p even)
//   15, 13, 11,  9,  7,  5,  3,  1 -> 15-8
//   14, 12, 10,  8,  6,  4,  2,  0 ->  7-0
//
// 4x8-bit: interleaved bit p lands at output bit 8*(p%4) + p/4
//   31, 27, 23, 19, 15, 11,  7,  3 -> 31-24
//   30, 26, 22, 18, 14, 10,  6,  2 -> 23-16
//   29, 25, 21, 17, 13,  9,  5,  1 -> 15-8
//   28, 24, 20, 16, 12,  8,  4,  0 ->  7-0
const fn build_morton_2x8() -> [[u16; 256]; 2] {
    let mut tables = [[0_u16; 256]; 2];

    let mut word = 0;
    while word < 2 {
        let mut byte = 0;
        while byte < 256 {
            let mut bit = 0;
            while bit < 8 {
                if byte & (1 << bit) != 0 {
                    let p = 8 * word + bit;
                    let target = if p % 2 == 1 { 8 + p / 2 } else { p / 2 };
                    tables[word][byte] |= 1 << target;
                }
                bit += 1;
            }
            byte += 1;
        }
        word += 1;
    }

    tables
}

const fn build_morton_4x8() -> [[u32; 256]; 4] {
    let mut tables = [[0_u32; 256]; 4];

    let mut word = 0;
    while word < 4 {
        let mut byte = 0;
        while byte < 256 {
            let mut bit = 0;
            while bit < 8 {
                if byte & (1 << bit) != 0 {
                    let p = 8 * word + bit;
                    tables[word][byte] |= 1 << (8 * (p % 4) + p / 4);
                }
                bit += 1;
            }
            byte += 1;
        }
        word += 1;
    }

    tables
}

static MORTON_2X8: [[u16; 256]; 2] = build_morton_2x8();
static MORTON_4X8: [[u32; 256]; 4] = build_morton_4x8();

/// De-interleave eight 2-bit pixels into two 8-bit bitplanes; each pixel's high bit
/// packs into the high byte and its low bit into the low byte.
pub(crate) fn morton_2x8(data: u16) -> u16 {
    MORTON_2X8[0][(data & 0xFF) as usize] | MORTON_2X8[1][(data >> 8) as usize]
}

/// De-interleave eight 4-bit pixels into four 8-bit bitplanes, most significant
/// bitplane in the highest byte.
pub(crate) fn morton_4x8(data: u32) -> u32 {
    MORTON_4X8[0][(data & 0xFF) as usize]
        | MORTON_4X8[1][((data >> 8) & 0xFF) as usize]
        | MORTON_4X8[2][((data >> 16) & 0xFF) as usize]
        | MORTON_4X8[3][(data >> 24) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evolution_table_is_closed() {
        for entry in EVOLUTION_TABLE {
            assert!((entry.next_lps as usize) < EVOLUTION_TABLE.len());
            assert!((entry.next_mps as usize) < EVOLUTION_TABLE.len());

            // The LPS branch subtracts (probability - 1) from the code value
            assert!(entry.probability > 0);
        }
    }

    #[test]
    fn mode_2_context_table_is_closed() {
        for [next_0, next_1] in MODE_2_CONTEXT_TABLE {
            // Context 1 transitions have the reference context (0-4) added on top
            assert!(next_0 < 32 && next_1 < 32);
        }

        let [next_0, next_1] = MODE_2_CONTEXT_TABLE[1];
        assert!(next_0 + 4 < 32 && next_1 + 4 < 32);
    }

    fn interleave_2x8(hi: u8, lo: u8) -> u16 {
        let mut word = 0;
        for bit in 0..8 {
            word |= u16::from((hi >> bit) & 1) << (2 * bit + 1);
            word |= u16::from((lo >> bit) & 1) << (2 * bit);
        }
        word
    }

    fn interleave_4x8(planes: [u8; 4]) -> u32 {
        let mut word = 0;
        for (i, plane) in planes.into_iter().enumerate() {
            for bit in 0..8 {
                word |= u32::from((plane >> bit) & 1) << (4 * bit + 3 - i);
            }
        }
        word
    }

    #[test]
    fn morton_2x8_round_trip() {
        for value in 0..=255_u8 {
            for other in [0x00, 0xFF, 0xA5, 0x3C, value] {
                assert_eq!(
                    morton_2x8(interleave_2x8(value, other)),
                    u16::from_be_bytes([value, other])
                );
                assert_eq!(
                    morton_2x8(interleave_2x8(other, value)),
                    u16::from_be_bytes([other, value])
                );
            }
        }
    }

    #[test]
    fn morton_4x8_round_trip() {
        for value in 0..=255_u8 {
            for other in [0x00, 0xFF, 0xA5, value] {
                for planes in [
                    [value, other, other, other],
                    [other, value, other, other],
                    [other, other, value, other],
                    [other, other, other, value],
                ] {
                    assert_eq!(morton_4x8(interleave_4x8(planes)), u32::from_be_bytes(planes));
                }
            }
        }
    }
}
