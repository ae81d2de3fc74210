/// PVRTC 1 decoder (2bpp and 4bpp) to RGBA8888
///
/// Each 64-bit word covers 4x4 (4bpp) or 8x4 (2bpp) texels and stores modulation
/// data in its low u32 and two colours in its high u32. Words are laid out in
/// Morton order. A texel's colours come from bilinear interpolation of the four
/// word centres around it, so every output region spans a 2x2 word neighbourhood.
/// Edges wrap, which is exact only for tileable power-of-two textures.

use crate::error::Result;
use crate::{pvr_bail, pvr_trace};

const SOURCE: &str = "pvr::decompress::pvrtc";

const WORD_HEIGHT: usize = 4;
const WORD_SIZE: usize = 8;

/// Modulation weights (out of 8) for the 2bpp two-bit values
const REPLICATED_WEIGHTS: [i32; 4] = [0, 3, 5, 8];

/// Marks a 4bpp punch-through texel whose alpha is forced to zero
const PUNCH_THROUGH: i32 = 10;

#[derive(Debug, Clone, Copy)]
struct Word {
    modulation: u32,
    color: u32,
}

/// Colour with 5-bit RGB and 4-bit alpha, widened for interpolation
#[derive(Debug, Clone, Copy, Default)]
struct Color {
    r: i32,
    g: i32,
    b: i32,
    a: i32,
}

impl Color {
    /// Colour A: low half of the colour data (bit 15 selects opaque 554 vs translucent 3443)
    fn a(color: u32) -> Self {
        if color & 0x8000 != 0 {
            Self {
                r: ((color & 0x7C00) >> 10) as i32,
                g: ((color & 0x03E0) >> 5) as i32,
                b: ((color & 0x001E) | ((color & 0x001E) >> 4)) as i32,
                a: 0xF,
            }
        } else {
            Self {
                r: (((color & 0x0F00) >> 7) | ((color & 0x0F00) >> 11)) as i32,
                g: (((color & 0x00F0) >> 3) | ((color & 0x00F0) >> 7)) as i32,
                b: (((color & 0x000E) << 1) | ((color & 0x000E) >> 2)) as i32,
                a: ((color & 0x7000) >> 11) as i32,
            }
        }
    }

    /// Colour B: high half of the colour data (bit 31 selects opaque 555 vs translucent 3444)
    fn b(color: u32) -> Self {
        if color & 0x8000_0000 != 0 {
            Self {
                r: ((color & 0x7C00_0000) >> 26) as i32,
                g: ((color & 0x03E0_0000) >> 21) as i32,
                b: ((color & 0x001F_0000) >> 16) as i32,
                a: 0xF,
            }
        } else {
            Self {
                r: (((color & 0x0F00_0000) >> 23) | ((color & 0x0F00_0000) >> 27)) as i32,
                g: (((color & 0x00F0_0000) >> 19) | ((color & 0x00F0_0000) >> 23)) as i32,
                b: (((color & 0x000F_0000) >> 15) | ((color & 0x000F_0000) >> 19)) as i32,
                a: ((color & 0x7000_0000) >> 27) as i32,
            }
        }
    }
}

/// Word geometry for one bit rate
#[derive(Debug, Clone, Copy)]
struct Mode {
    two_bpp: bool,
    word_width: usize,
    /// log2(word_width * WORD_HEIGHT)
    scale_shift: u32,
}

impl Mode {
    fn new(two_bpp: bool) -> Self {
        if two_bpp {
            Self { two_bpp, word_width: 8, scale_shift: 5 }
        } else {
            Self { two_bpp, word_width: 4, scale_shift: 4 }
        }
    }
}

// ===== MODULATION =====

/// Modulation values and modes for a 2x2 word neighbourhood
struct ModulationGrid {
    width: usize,
    values: [[i32; 2 * WORD_HEIGHT]; 16],
    modes: [[u32; 2 * WORD_HEIGHT]; 16],
}

impl ModulationGrid {
    fn new(mode: Mode, words: [Word; 4]) -> Self {
        let mut grid = Self {
            width: 2 * mode.word_width,
            values: [[0; 2 * WORD_HEIGHT]; 16],
            modes: [[0; 2 * WORD_HEIGHT]; 16],
        };
        let offsets = [(0, 0), (mode.word_width, 0), (0, WORD_HEIGHT), (mode.word_width, WORD_HEIGHT)];
        for (word, (ox, oy)) in words.into_iter().zip(offsets) {
            if mode.two_bpp {
                grid.unpack_2bpp(word, ox, oy);
            } else {
                grid.unpack_4bpp(word, ox, oy);
            }
        }
        grid
    }

    fn unpack_4bpp(&mut self, word: Word, ox: usize, oy: usize) {
        let punch_through = word.color & 0x1 != 0;
        let mut bits = word.modulation;
        for y in 0..WORD_HEIGHT {
            for x in 0..4 {
                let value = (bits & 3) as i32;
                self.values[x + ox][y + oy] = if punch_through {
                    match value {
                        0 => 0,
                        1 => 4,
                        2 => 4 + PUNCH_THROUGH,
                        _ => 8,
                    }
                } else {
                    // 0, 3, 5, 8
                    let scaled = value * 3;
                    if scaled > 3 { scaled - 1 } else { scaled }
                };
                bits >>= 2;
            }
        }
    }

    fn unpack_2bpp(&mut self, word: Word, ox: usize, oy: usize) {
        let mut mode = word.color & 0x1;
        let mut bits = word.modulation;
        if mode == 0 {
            // one bit per texel, full weight or none
            for y in 0..WORD_HEIGHT {
                for x in 0..8 {
                    self.modes[x + ox][y + oy] = 0;
                    self.values[x + ox][y + oy] = if bits & 1 != 0 { 3 } else { 0 };
                    bits >>= 1;
                }
            }
            return;
        }

        // interpolated modes: the first value's low bit selects H/V-only, bit 20 picks which
        if bits & 0x1 != 0 {
            mode = if bits & (1 << 20) != 0 { 3 } else { 2 };
            if bits & (1 << 21) != 0 {
                bits |= 1 << 20;
            } else {
                bits &= !(1 << 20);
            }
        }
        if bits & 0x2 != 0 {
            bits |= 0x1;
        } else {
            bits &= !0x1;
        }
        for y in 0..WORD_HEIGHT {
            for x in 0..8 {
                self.modes[x + ox][y + oy] = mode;
                if (x ^ y) & 1 == 0 {
                    self.values[x + ox][y + oy] = (bits & 3) as i32;
                    bits >>= 2;
                }
            }
        }
    }

    /// Weight (out of 8) of colour B at grid position (x, y)
    fn weight(&self, two_bpp: bool, x: usize, y: usize) -> i32 {
        if !two_bpp {
            return self.values[x][y];
        }
        let at = |x: usize, y: usize| REPLICATED_WEIGHTS[self.values[x][y] as usize & 3];
        let mode = self.modes[x][y];
        if mode == 0 || (x ^ y) & 1 == 0 {
            return at(x, y);
        }
        debug_assert!(x > 0 && y > 0 && x + 1 < self.width && y + 1 < 2 * WORD_HEIGHT);
        match mode {
            1 => (at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) + 2) / 4,
            2 => (at(x - 1, y) + at(x + 1, y) + 1) / 2,
            _ => (at(x, y - 1) + at(x, y + 1) + 1) / 2,
        }
    }
}

// ===== COLOUR INTERPOLATION =====

/// Bilinear blend of the four word colours at local offset (x, y), expanded to 8 bits
fn interpolate(mode: Mode, corners: [Color; 4], x: usize, y: usize) -> [i32; 4] {
    let [p, q, r, s] = corners;
    let (w, h) = (mode.word_width as i32, WORD_HEIGHT as i32);
    let (x, y) = (x as i32, y as i32);
    let blend = |p: i32, q: i32, r: i32, s: i32| (h - y) * (w * p + x * (q - p)) + y * (w * r + x * (s - r));

    let shift = mode.scale_shift;
    // 5-bit channels scaled by w*h, replicated to 8 bits
    let expand5 = |v: i32| (v >> (shift + 2)) + (v >> (shift - 3));
    // 4-bit alpha scaled by w*h, replicated to 8 bits
    let expand4 = |v: i32| (v >> shift) + (v >> (shift - 4));
    [
        expand5(blend(p.r, q.r, r.r, s.r)),
        expand5(blend(p.g, q.g, r.g, s.g)),
        expand5(blend(p.b, q.b, r.b, s.b)),
        expand4(blend(p.a, q.a, r.a, s.a)),
    ]
}

// ===== WORD ADDRESSING =====

/// Morton index of word (x, y) in a power-of-two grid; the longer axis keeps its high bits linear
fn twiddle(width: usize, height: usize, x: usize, y: usize) -> usize {
    let min_dimension = width.min(height);
    let mut twiddled = 0;
    let mut bit = 1;
    let mut shift = 0;
    while bit < min_dimension {
        if y & bit != 0 {
            twiddled |= 1 << (2 * shift);
        }
        if x & bit != 0 {
            twiddled |= 1 << (2 * shift + 1);
        }
        bit <<= 1;
        shift += 1;
    }
    let remaining = if height < width { x } else { y };
    twiddled | ((remaining >> shift) << (2 * shift))
}

fn read_word(data: &[u8], index: usize) -> Word {
    let at = |offset: usize| {
        u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
    };
    Word {
        modulation: at(index * WORD_SIZE),
        color: at(index * WORD_SIZE + 4),
    }
}

// ===== PUBLIC API =====

/// Number of bytes a `width` x `height` PVRTC image occupies
///
/// The minimum is one word (8 bytes). Some PVR writers pad every PVRTC mip to
/// 8x8 (4bpp) or 16x8 (2bpp), i.e. four words, so their mip chains are longer
/// than the one computed here for levels below that size. `decompress` accepts
/// such padded levels and ignores the trailing words.
pub fn compressed_size(width: u32, height: u32, two_bpp: bool) -> usize {
    let mode = Mode::new(two_bpp);
    let words_x = (width as usize).div_ceil(mode.word_width).max(1);
    let words_y = (height as usize).div_ceil(WORD_HEIGHT).max(1);
    words_x * words_y * WORD_SIZE
}

/// Decode a PVRTC 1 image into `width * height` RGBA8888 texels
pub fn decompress(data: &[u8], width: u32, height: u32, two_bpp: bool) -> Result<Vec<u8>> {
    let mode = Mode::new(two_bpp);
    let words_x = (width as usize).div_ceil(mode.word_width).max(1);
    let words_y = (height as usize).div_ceil(WORD_HEIGHT).max(1);
    if !words_x.is_power_of_two() || !words_y.is_power_of_two() {
        pvr_bail!(
            UnsupportedVariant,
            SOURCE,
            "PVRTC word grid {}x{} is not a power of two",
            words_x, words_y
        );
    }
    let required = words_x * words_y * WORD_SIZE;
    if data.len() < required {
        pvr_bail!(
            DecodeFailure,
            SOURCE,
            "PVRTC {}x{} needs {} bytes, got {}",
            width, height, required, data.len()
        );
    }

    let full_width = words_x * mode.word_width;
    let full_height = words_y * WORD_HEIGHT;
    let mut pixels = vec![0u8; full_width * full_height * 4];
    let (half_w, half_h) = (mode.word_width / 2, WORD_HEIGHT / 2);

    for wy in 0..words_y {
        for wx in 0..words_x {
            // (wx, wy) is the top-left word; the region starts at its centre
            let (x1, y1) = ((wx + 1) % words_x, (wy + 1) % words_y);
            let words = [(wx, wy), (x1, wy), (wx, y1), (x1, y1)]
                .map(|(x, y)| read_word(data, twiddle(words_x, words_y, x, y)));
            let grid = ModulationGrid::new(mode, words);
            let colors_a = words.map(|w| Color::a(w.color));
            let colors_b = words.map(|w| Color::b(w.color));

            for ly in 0..WORD_HEIGHT {
                for lx in 0..mode.word_width {
                    let a = interpolate(mode, colors_a, lx, ly);
                    let b = interpolate(mode, colors_b, lx, ly);
                    let mut weight = grid.weight(mode.two_bpp, lx + half_w, ly + half_h);
                    let punch_through = weight > PUNCH_THROUGH;
                    if punch_through {
                        weight -= PUNCH_THROUGH;
                    }
                    let mix = |c: usize| ((a[c] * (8 - weight) + b[c] * weight) / 8) as u8;
                    let alpha = if punch_through { 0 } else { mix(3) };

                    let px = (wx * mode.word_width + half_w + lx) % full_width;
                    let py = (wy * WORD_HEIGHT + half_h + ly) % full_height;
                    let offset = (py * full_width + px) * 4;
                    pixels[offset..offset + 4].copy_from_slice(&[mix(0), mix(1), mix(2), alpha]);
                }
            }
        }
    }

    pvr_trace!(SOURCE, "Decoded PVRTC {}bpp {}x{}", if two_bpp { 2 } else { 4 }, width, height);
    Ok(crop(pixels, full_width, width as usize, height as usize))
}

/// Keep the top-left `width` x `height` texels of an RGBA8888 image `stride` texels wide
pub(crate) fn crop(pixels: Vec<u8>, stride: usize, width: usize, height: usize) -> Vec<u8> {
    if stride == width && pixels.len() == width * height * 4 {
        return pixels;
    }
    let mut out = Vec::with_capacity(width * height * 4);
    for row in pixels.chunks_exact(stride * 4).take(height) {
        out.extend_from_slice(&row[..width * 4]);
    }
    out
}

#[cfg(test)]
#[path = "pvrtc_tests.rs"]
mod tests;
