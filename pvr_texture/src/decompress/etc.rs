/// ETC1 / ETC2 decoder to RGBA8888
///
/// Blocks are 4x4 texels in row-major block order. RGB blocks are 64 bits read
/// big-endian; ETC2 RGBA prefixes each colour block with a 64-bit EAC alpha block.

use crate::error::Result;
use crate::texture::CompressedPixelFormat;
use crate::{pvr_bail, pvr_trace};

const SOURCE: &str = "pvr::decompress::etc";

const BLOCK_DIM: usize = 4;

/// Intensity modifiers per codeword (small positive, large positive)
const MODIFIER_TABLE: [[i32; 2]; 8] = [
    [2, 8],
    [5, 17],
    [9, 29],
    [13, 42],
    [18, 60],
    [24, 80],
    [33, 106],
    [47, 183],
];

/// T and H mode paint colour distances
const DISTANCE_TABLE: [i32; 8] = [3, 6, 11, 16, 23, 32, 41, 64];

/// EAC alpha modifiers per table index
const ALPHA_MODIFIER_TABLE: [[i32; 8]; 16] = [
    [-3, -6, -9, -15, 2, 5, 8, 14],
    [-3, -7, -10, -13, 2, 6, 9, 12],
    [-2, -5, -8, -13, 1, 4, 7, 12],
    [-2, -4, -6, -13, 1, 3, 5, 12],
    [-3, -6, -8, -12, 2, 5, 7, 11],
    [-3, -7, -9, -11, 2, 6, 8, 10],
    [-4, -7, -8, -11, 3, 6, 7, 10],
    [-3, -5, -8, -11, 2, 4, 7, 10],
    [-2, -6, -8, -10, 1, 5, 7, 9],
    [-2, -5, -8, -10, 1, 4, 7, 9],
    [-2, -4, -8, -10, 1, 3, 7, 9],
    [-2, -5, -7, -10, 1, 4, 6, 9],
    [-3, -4, -7, -10, 2, 3, 6, 9],
    [-1, -2, -3, -10, 0, 1, 2, 9],
    [-4, -6, -8, -9, 3, 5, 7, 8],
    [-3, -5, -7, -9, 2, 4, 6, 8],
];

/// Decoded 4x4 block, indexed [y][x]
type Block = [[[u8; 4]; BLOCK_DIM]; BLOCK_DIM];

// ===== BIT HELPERS =====

/// `count` bits of `block` ending at bit `high` (bit 63 is the first byte's MSB)
fn bits(block: u64, high: u32, count: u32) -> u32 {
    ((block >> (high + 1 - count)) & ((1u64 << count) - 1)) as u32
}

fn extend_4(v: u32) -> i32 {
    ((v << 4) | v) as i32
}

fn extend_5(v: u32) -> i32 {
    ((v << 3) | (v >> 2)) as i32
}

fn extend_6(v: u32) -> i32 {
    ((v << 2) | (v >> 4)) as i32
}

fn extend_7(v: u32) -> i32 {
    ((v << 1) | (v >> 6)) as i32
}

fn clamp(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

fn rgb(c: [i32; 3]) -> [u8; 4] {
    [clamp(c[0]), clamp(c[1]), clamp(c[2]), 255]
}

/// Two-bit texel index; texels are numbered down each column
fn texel_index(block: u64, x: usize, y: usize) -> usize {
    let i = (x * BLOCK_DIM + y) as u32;
    let msb = (block >> (16 + i)) & 1;
    let lsb = (block >> i) & 1;
    ((msb << 1) | lsb) as usize
}

/// 3-bit signed differential
fn signed_3(v: u32) -> i32 {
    ((v as i32) << 29) >> 29
}

// ===== COLOUR BLOCKS =====

/// Individual or differential mode, shared by ETC1 and ETC2
fn decode_base(block: u64, differential: bool) -> Block {
    let (base1, base2) = if differential {
        let r = bits(block, 63, 5);
        let g = bits(block, 55, 5);
        let b = bits(block, 47, 5);
        let r2 = (r as i32 + signed_3(bits(block, 58, 3))) as u32;
        let g2 = (g as i32 + signed_3(bits(block, 50, 3))) as u32;
        let b2 = (b as i32 + signed_3(bits(block, 42, 3))) as u32;
        (
            [extend_5(r), extend_5(g), extend_5(b)],
            [extend_5(r2 & 0x1F), extend_5(g2 & 0x1F), extend_5(b2 & 0x1F)],
        )
    } else {
        (
            [extend_4(bits(block, 63, 4)), extend_4(bits(block, 55, 4)), extend_4(bits(block, 47, 4))],
            [extend_4(bits(block, 59, 4)), extend_4(bits(block, 51, 4)), extend_4(bits(block, 43, 4))],
        )
    };
    let table1 = bits(block, 39, 3) as usize;
    let table2 = bits(block, 36, 3) as usize;
    let flipped = bits(block, 32, 1) == 1;

    let mut out = [[[0u8; 4]; BLOCK_DIM]; BLOCK_DIM];
    for (y, row) in out.iter_mut().enumerate() {
        for (x, texel) in row.iter_mut().enumerate() {
            let second = if flipped { y >= 2 } else { x >= 2 };
            let (base, table) = if second { (base2, table2) } else { (base1, table1) };
            let [small, large] = MODIFIER_TABLE[table];
            let modifier = match texel_index(block, x, y) {
                0 => small,
                1 => large,
                2 => -small,
                _ => -large,
            };
            *texel = rgb(base.map(|c| c + modifier));
        }
    }
    out
}

/// Differential mode base colour whose channel leaves [0, 31]
fn overflow(block: u64, high: u32) -> bool {
    let base = bits(block, high, 5) as i32;
    let sum = base + signed_3(bits(block, high - 5, 3));
    !(0..=31).contains(&sum)
}

fn paint(block: u64, colors: [[i32; 3]; 4]) -> Block {
    let mut out = [[[0u8; 4]; BLOCK_DIM]; BLOCK_DIM];
    for (y, row) in out.iter_mut().enumerate() {
        for (x, texel) in row.iter_mut().enumerate() {
            *texel = rgb(colors[texel_index(block, x, y)]);
        }
    }
    out
}

fn offset(c: [i32; 3], d: i32) -> [i32; 3] {
    c.map(|v| v + d)
}

fn decode_t(block: u64) -> Block {
    let r1 = (bits(block, 60, 2) << 2) | bits(block, 57, 2);
    let c1 = [extend_4(r1), extend_4(bits(block, 55, 4)), extend_4(bits(block, 51, 4))];
    let c2 = [extend_4(bits(block, 47, 4)), extend_4(bits(block, 43, 4)), extend_4(bits(block, 39, 4))];
    let d = DISTANCE_TABLE[((bits(block, 35, 2) << 1) | bits(block, 32, 1)) as usize];
    paint(block, [c1, offset(c2, d), c2, offset(c2, -d)])
}

fn decode_h(block: u64) -> Block {
    let r1 = bits(block, 62, 4);
    let g1 = (bits(block, 58, 3) << 1) | bits(block, 52, 1);
    let b1 = (bits(block, 51, 1) << 3) | bits(block, 49, 3);
    let (r2, g2, b2) = (bits(block, 46, 4), bits(block, 42, 4), bits(block, 38, 4));
    let ordering = u32::from((r1 << 8 | g1 << 4 | b1) >= (r2 << 8 | g2 << 4 | b2));
    let index = (bits(block, 34, 1) << 2) | (bits(block, 32, 1) << 1) | ordering;
    let d = DISTANCE_TABLE[index as usize];
    let c1 = [extend_4(r1), extend_4(g1), extend_4(b1)];
    let c2 = [extend_4(r2), extend_4(g2), extend_4(b2)];
    paint(block, [offset(c1, d), offset(c1, -d), offset(c2, d), offset(c2, -d)])
}

fn decode_planar(block: u64) -> Block {
    let origin = [
        extend_6(bits(block, 62, 6)),
        extend_7((bits(block, 56, 1) << 6) | bits(block, 54, 6)),
        extend_6((bits(block, 48, 1) << 5) | (bits(block, 44, 2) << 3) | bits(block, 41, 3)),
    ];
    let horizontal = [
        extend_6((bits(block, 38, 5) << 1) | bits(block, 32, 1)),
        extend_7(bits(block, 31, 7)),
        extend_6(bits(block, 24, 6)),
    ];
    let vertical = [
        extend_6(bits(block, 18, 6)),
        extend_7(bits(block, 12, 7)),
        extend_6(bits(block, 5, 6)),
    ];
    let mut out = [[[0u8; 4]; BLOCK_DIM]; BLOCK_DIM];
    for (y, row) in out.iter_mut().enumerate() {
        for (x, texel) in row.iter_mut().enumerate() {
            let (x, y) = (x as i32, y as i32);
            let channel = |c: usize| (x * (horizontal[c] - origin[c]) + y * (vertical[c] - origin[c]) + 4 * origin[c] + 2) >> 2;
            *texel = rgb([channel(0), channel(1), channel(2)]);
        }
    }
    out
}

/// ETC1 block; a differential overflow is decoded as individual mode
fn decode_etc1(block: u64) -> Block {
    let differential = bits(block, 33, 1) == 1;
    let valid = !(overflow(block, 63) || overflow(block, 55) || overflow(block, 47));
    decode_base(block, differential && valid)
}

/// ETC2 RGB block; differential overflow selects T, H or planar mode
fn decode_etc2(block: u64) -> Block {
    if bits(block, 33, 1) == 0 {
        decode_base(block, false)
    } else if overflow(block, 63) {
        decode_t(block)
    } else if overflow(block, 55) {
        decode_h(block)
    } else if overflow(block, 47) {
        decode_planar(block)
    } else {
        decode_base(block, true)
    }
}

/// Apply an EAC alpha block to a decoded colour block
fn apply_eac_alpha(block: u64, out: &mut Block) {
    let base = bits(block, 63, 8) as i32;
    let multiplier = bits(block, 55, 4) as i32;
    let table = &ALPHA_MODIFIER_TABLE[bits(block, 51, 4) as usize];
    for (y, row) in out.iter_mut().enumerate() {
        for (x, texel) in row.iter_mut().enumerate() {
            let i = (x * BLOCK_DIM + y) as u32;
            let index = bits(block, 47 - 3 * i, 3) as usize;
            texel[3] = clamp(base + table[index] * multiplier);
        }
    }
}

// ===== PUBLIC API =====

/// True for the ETC variants `decompress` handles
pub fn is_supported(format: CompressedPixelFormat) -> bool {
    matches!(
        format,
        CompressedPixelFormat::ETC1 | CompressedPixelFormat::ETC2_RGB | CompressedPixelFormat::ETC2_RGBA
    )
}

/// Decode an ETC image into `width * height` RGBA8888 texels
pub fn decompress(data: &[u8], width: u32, height: u32, format: CompressedPixelFormat) -> Result<Vec<u8>> {
    let block_size = match format {
        CompressedPixelFormat::ETC1 | CompressedPixelFormat::ETC2_RGB => 8,
        CompressedPixelFormat::ETC2_RGBA => 16,
        other => pvr_bail!(UnsupportedVariant, SOURCE, "{:?} decompression is not supported", other),
    };
    let (width, height) = (width as usize, height as usize);
    let blocks_x = width.div_ceil(BLOCK_DIM).max(1);
    let blocks_y = height.div_ceil(BLOCK_DIM).max(1);
    let required = blocks_x * blocks_y * block_size;
    if data.len() < required {
        pvr_bail!(
            DecodeFailure,
            SOURCE,
            "{:?} {}x{} needs {} bytes, got {}",
            format, width, height, required, data.len()
        );
    }

    let mut pixels = vec![0u8; width * height * 4];
    for (i, chunk) in data[..required].chunks_exact(block_size).enumerate() {
        let (bx, by) = (i % blocks_x, i / blocks_x);
        let word = |at: usize| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&chunk[at..at + 8]);
            u64::from_be_bytes(bytes)
        };
        let decoded = match format {
            CompressedPixelFormat::ETC1 => decode_etc1(word(0)),
            CompressedPixelFormat::ETC2_RGB => decode_etc2(word(0)),
            _ => {
                let mut block = decode_etc2(word(8));
                apply_eac_alpha(word(0), &mut block);
                block
            }
        };

        // Edge blocks are clipped to the image
        let visible = BLOCK_DIM.min(width - bx * BLOCK_DIM);
        for (y, row) in decoded.iter().enumerate() {
            let py = by * BLOCK_DIM + y;
            if py >= height {
                break;
            }
            let texels: &[u8] = bytemuck::cast_slice(&row[..visible]);
            let offset = (py * width + bx * BLOCK_DIM) * 4;
            pixels[offset..offset + texels.len()].copy_from_slice(texels);
        }
    }

    pvr_trace!(SOURCE, "Decoded {:?} {}x{}", format, width, height);
    Ok(pixels)
}

#[cfg(test)]
#[path = "etc_tests.rs"]
mod tests;
