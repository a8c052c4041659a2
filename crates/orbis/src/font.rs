//! # Font — BFF2 Bitmap Glyph Atlases
//!
//! Overlay labels are drawn from a pre-rendered bitmap font in the BFF2
//! format: a fixed grid of equally sized cells, one per character, plus a
//! table of per-character advance widths. No rasterization happens at
//! runtime. Text layout is a lookup into the grid.
//!
//! ## File Layout
//!
//! All integers are little-endian.
//!
//! ```text
//! offset  size          field
//! 0       2             signature 0xBF 0xF2
//! 2       4             atlas width (px)
//! 6       4             atlas height (px)
//! 10      4             cell width (px, > 0, <= atlas width)
//! 14      4             cell height (px, > 0, <= atlas height)
//! 18      1             bits per pixel: 8, 24 or 32
//! 19      1             first character code in the grid
//! 20      256           advance width of every character code 0..=255
//! 276     w * h * bpp/8 bitmap, top scanline first
//! ```
//!
//! The bitmap is stored top row first. Decoding reverses the scanlines so row
//! 0 of [`GlyphAtlas::pixels`] is the bottom of the image. That matches
//! bottom-up texture coordinates: cell row `r` (counting from the top, 1-based)
//! starts at `atlas_height - r * cell_height`.
//!
//! ## Layout
//!
//! [`GlyphAtlas::layout`] turns a string into one [`GlyphQuad`] per drawable
//! character. The cursor starts at `(x, y)` in bottom-up window pixels and
//! advances by `scale.x × width`. Characters below the first grid character,
//! or outside 0..=255, are skipped without advancing.
//!
//! ## Comparison
//!
//! - **fontdue / glyph_brush**: rasterize TrueType outlines into a dynamic
//!   atlas with kerning. Far more capable, but needs the font file at runtime.
//! - **Codehead's Bitmap Font Generator**: the tool that writes BFF2 files.

use std::io::Read;

use crate::math::{Color, Vec2, Vec3};

pub use crate::error::FontError;

/// The two magic bytes at the start of every BFF2 file.
pub const SIGNATURE: [u8; 2] = [0xBF, 0xF2];

/// Number of entries in the width table.
pub const WIDTH_TABLE_LEN: usize = 256;

const HEADER_LEN: usize = 20;

/// Handle to a glyph atlas registered with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontHandle(pub(crate) usize);

impl FontHandle {
    /// Position of the atlas in the engine's font list.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Pixel format of the atlas bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8 bits per pixel, coverage only.
    Alpha,
    /// 24 bits per pixel.
    Rgb,
    /// 32 bits per pixel.
    Rgba,
}

impl PixelFormat {
    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            8 => Some(Self::Alpha),
            24 => Some(Self::Rgb),
            32 => Some(Self::Rgba),
            _ => None,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Alpha => 1,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// How a piece of text is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Multiplier on glyph widths (x) and cell height (y).
    pub scale: Vec2,
    pub color: Color,
}

impl TextStyle {
    pub fn new(scale: Vec2, color: Color) -> Self {
        Self { scale, color }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            scale: Vec2::ONE,
            color: Color::WHITE,
        }
    }
}

/// A sub-rectangle of the atlas in texels, origin bottom-left.
///
/// `y` can be negative for grid rows past the bottom of the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One character ready to draw: where it goes and which texels it shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    pub ch: char,
    /// Bottom-left corner in window pixels, plus the draw depth.
    pub origin: Vec3,
    /// Width and height in window pixels.
    pub size: Vec2,
    pub crop: CropRect,
    /// Texture coordinates of the quad's bottom-left corner.
    pub uv_min: Vec2,
    /// Texture coordinates of the quad's top-right corner.
    pub uv_max: Vec2,
}

/// A decoded BFF2 font: the bitmap plus its character metrics.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    width: u32,
    height: u32,
    cell_width: u32,
    cell_height: u32,
    format: PixelFormat,
    first_char: u8,
    columns: u32,
    widths: [u8; WIDTH_TABLE_LEN],
    pixels: Vec<u8>,
}

impl GlyphAtlas {
    /// Decode a BFF2 blob held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontError> {
        Self::from_reader(bytes)
    }

    /// Decode a BFF2 stream.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, FontError> {
        let mut header = [0u8; HEADER_LEN];
        read_section(&mut reader, &mut header, "header")?;

        if header[..2] != SIGNATURE {
            return Err(FontError::BadSignature(header[0], header[1]));
        }

        let width = le_i32(&header, 2);
        let height = le_i32(&header, 6);
        let cell_width = le_i32(&header, 10);
        let cell_height = le_i32(&header, 14);
        let bits = header[18];
        let first_char = header[19];

        if cell_width <= 0 || cell_height <= 0 {
            return Err(FontError::InvalidCellSize {
                width: cell_width,
                height: cell_height,
            });
        }
        if width < 0 || height < 0 {
            return Err(FontError::InvalidAtlasSize { width, height });
        }
        if width > 0 && height > 0 && (cell_width > width || cell_height > height) {
            return Err(FontError::InvalidCellSize {
                width: cell_width,
                height: cell_height,
            });
        }
        let format = PixelFormat::from_bits(bits).ok_or(FontError::UnsupportedDepth(bits))?;

        let mut widths = [0u8; WIDTH_TABLE_LEN];
        read_section(&mut reader, &mut widths, "widths")?;

        let line_len = (width as usize)
            .checked_mul(format.bytes_per_pixel())
            .ok_or(FontError::InvalidAtlasSize { width, height })?;
        let bitmap_len = line_len
            .checked_mul(height as usize)
            .ok_or(FontError::InvalidAtlasSize { width, height })?;

        // Grow with the bytes actually present, not the declared size.
        let mut stored = Vec::new();
        reader
            .by_ref()
            .take(bitmap_len as u64)
            .read_to_end(&mut stored)?;
        if stored.len() < bitmap_len {
            return Err(FontError::ShortRead {
                section: "bitmap",
                expected: bitmap_len,
                actual: stored.len(),
            });
        }

        let mut pixels = Vec::with_capacity(bitmap_len);
        if line_len > 0 {
            for line in stored.chunks_exact(line_len).rev() {
                pixels.extend_from_slice(line);
            }
        }

        let (width, height) = (width as u32, height as u32);
        let (cell_width, cell_height) = (cell_width as u32, cell_height as u32);

        log::debug!(
            "decoded {width}x{height} glyph atlas ({format:?}, {cell_width}x{cell_height} cells)"
        );

        Ok(Self {
            width,
            height,
            cell_width,
            cell_height,
            format,
            first_char,
            columns: width / cell_width,
            widths,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_width(&self) -> u32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> u32 {
        self.cell_height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Character code of the first cell in the grid.
    pub fn first_char(&self) -> u8 {
        self.first_char
    }

    /// Number of cells per grid row.
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Decoded bitmap, bottom scanline first.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Advance width of `ch` in unscaled pixels; 0 outside the width table.
    pub fn char_width(&self, ch: char) -> u8 {
        usize::try_from(u32::from(ch))
            .ok()
            .and_then(|code| self.widths.get(code))
            .copied()
            .unwrap_or(0)
    }

    /// Height of one line of text.
    pub fn line_height(&self, style: &TextStyle) -> f32 {
        self.cell_height as f32 * style.scale.y
    }

    /// Total scaled advance of `text`.
    pub fn measure(&self, text: &str, style: &TextStyle) -> f32 {
        text.chars()
            .map(|ch| style.scale.x * self.char_width(ch) as f32)
            .sum()
    }

    /// [`measure`](Self::measure) truncated to whole pixels.
    pub fn measure_px(&self, text: &str, style: &TextStyle) -> i32 {
        self.measure(text, style) as i32
    }

    /// Lay `text` out starting at `(x, y)`, one quad per drawable character.
    pub fn layout(&self, text: &str, x: f32, y: f32, z: f32, style: &TextStyle) -> Vec<GlyphQuad> {
        let mut quads = Vec::with_capacity(text.len());
        let mut cursor = x;

        for ch in text.chars() {
            let Some(glyph) = self.glyph_index(ch) else {
                continue;
            };
            let char_width = self.char_width(ch) as u32;
            let Some(crop) = self.crop(glyph, char_width) else {
                log::debug!("glyph {ch:?} falls outside the atlas grid");
                continue;
            };

            quads.push(GlyphQuad {
                ch,
                origin: Vec3::new(cursor, y, z),
                size: Vec2::new(
                    style.scale.x * char_width as f32,
                    style.scale.y * self.cell_height as f32,
                ),
                crop,
                uv_min: self.texel_to_uv(crop.x as f32, crop.y as f32),
                uv_max: self.texel_to_uv(
                    (crop.x + crop.width as i32) as f32,
                    (crop.y + crop.height as i32) as f32,
                ),
            });

            cursor += style.scale.x * char_width as f32;
        }

        quads
    }

    /// Expand the bitmap to RGBA8. Alpha atlases become white with coverage
    /// in the alpha channel.
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Rgba => self.pixels.clone(),
            PixelFormat::Rgb => self
                .pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            PixelFormat::Alpha => self.pixels.iter().flat_map(|&a| [255, 255, 255, a]).collect(),
        }
    }

    /// Texel rectangle of grid cell `glyph`, or `None` if it is not
    /// addressable in `i32` texels.
    fn crop(&self, glyph: u32, char_width: u32) -> Option<CropRect> {
        let columns = self.columns.max(1);
        let col = i64::from(glyph % columns);
        let row = i64::from(glyph / columns) + 1;
        let x = col * i64::from(self.cell_width);
        let y = i64::from(self.height) - row * i64::from(self.cell_height);
        Some(CropRect {
            x: i32::try_from(x).ok()?,
            y: i32::try_from(y).ok()?,
            width: char_width,
            height: self.cell_height,
        })
    }

    fn glyph_index(&self, ch: char) -> Option<u32> {
        let code = u32::from(ch);
        if code >= WIDTH_TABLE_LEN as u32 {
            return None;
        }
        code.checked_sub(u32::from(self.first_char))
    }

    fn texel_to_uv(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x / self.width.max(1) as f32, y / self.height.max(1) as f32)
    }
}

fn le_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Fill `buf` completely, reporting how far a truncated stream got.
fn read_section<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    section: &'static str,
) -> Result<(), FontError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(FontError::ShortRead {
                    section,
                    expected: buf.len(),
                    actual: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a BFF2 blob. Every pixel byte of stored scanline `r` equals `r`.
    pub(crate) fn bff2(
        width: i32,
        height: i32,
        cell: (i32, i32),
        bpp: u8,
        first_char: u8,
        widths: &[(u8, u8)],
    ) -> Vec<u8> {
        let mut out = vec![0xBF, 0xF2];
        for v in [width, height, cell.0, cell.1] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.push(bpp);
        out.push(first_char);
        let mut table = [0u8; 256];
        for &(code, w) in widths {
            table[code as usize] = w;
        }
        out.extend_from_slice(&table);
        let line = width as usize * (bpp as usize / 8);
        for row in 0..height as usize {
            out.extend(std::iter::repeat_n(row as u8, line));
        }
        out
    }

    fn sample_atlas() -> GlyphAtlas {
        // 64x64 atlas of 16x16 cells: 4 columns, grid starts at ' '.
        let blob = bff2(64, 64, (16, 16), 8, b' ', &[(b'A', 10), (b'B', 12), (b' ', 5)]);
        GlyphAtlas::from_bytes(&blob).unwrap()
    }

    #[test]
    fn decodes_header_fields() {
        let atlas = sample_atlas();
        assert_eq!(atlas.width(), 64);
        assert_eq!(atlas.height(), 64);
        assert_eq!(atlas.cell_width(), 16);
        assert_eq!(atlas.cell_height(), 16);
        assert_eq!(atlas.columns(), 4);
        assert_eq!(atlas.first_char(), b' ');
        assert_eq!(atlas.format(), PixelFormat::Alpha);
        assert_eq!(atlas.pixels().len(), 64 * 64);
    }

    #[test]
    fn scanlines_are_reversed() {
        let blob = bff2(2, 3, (1, 1), 24, 0, &[]);
        let atlas = GlyphAtlas::from_bytes(&blob).unwrap();
        let px = atlas.pixels();
        assert_eq!(px.len(), 2 * 3 * 3);
        assert!(px[0..6].iter().all(|&b| b == 2), "last stored row comes first");
        assert!(px[6..12].iter().all(|&b| b == 1));
        assert!(px[12..18].iter().all(|&b| b == 0), "first stored row comes last");
    }

    #[test]
    fn rejects_bad_signature() {
        let mut blob = bff2(4, 4, (2, 2), 8, 0, &[]);
        blob[0] = b'B';
        blob[1] = b'M';
        assert!(matches!(
            GlyphAtlas::from_bytes(&blob),
            Err(FontError::BadSignature(b'B', b'M'))
        ));
    }

    #[test]
    fn rejects_truncated_sections() {
        let blob = bff2(4, 4, (2, 2), 8, 0, &[]);

        let err = GlyphAtlas::from_bytes(&blob[..10]).unwrap_err();
        assert!(matches!(
            err,
            FontError::ShortRead { section: "header", expected: 20, actual: 10 }
        ));

        let err = GlyphAtlas::from_bytes(&blob[..100]).unwrap_err();
        assert!(matches!(err, FontError::ShortRead { section: "widths", .. }));

        let err = GlyphAtlas::from_bytes(&blob[..blob.len() - 1]).unwrap_err();
        assert!(matches!(
            err,
            FontError::ShortRead { section: "bitmap", expected: 16, actual: 15 }
        ));
    }

    #[test]
    fn rejects_invalid_dimensions_and_depth() {
        let blob = bff2(4, 4, (0, 2), 8, 0, &[]);
        assert!(matches!(
            GlyphAtlas::from_bytes(&blob),
            Err(FontError::InvalidCellSize { width: 0, height: 2 })
        ));

        let mut blob = bff2(4, 4, (2, 2), 8, 0, &[]);
        blob[18] = 16;
        assert!(matches!(
            GlyphAtlas::from_bytes(&blob),
            Err(FontError::UnsupportedDepth(16))
        ));

        let mut blob = bff2(4, 4, (2, 2), 8, 0, &[]);
        blob[2..6].copy_from_slice(&(-4i32).to_le_bytes());
        assert!(matches!(
            GlyphAtlas::from_bytes(&blob),
            Err(FontError::InvalidAtlasSize { width: -4, height: 4 })
        ));
    }

    #[test]
    fn oversized_header_without_bitmap_is_a_short_read() {
        let mut blob = SIGNATURE.to_vec();
        for v in [i32::MAX, i32::MAX, 8, 8] {
            blob.extend_from_slice(&v.to_le_bytes());
        }
        blob.extend_from_slice(&[32, 0]);
        blob.extend_from_slice(&[0u8; WIDTH_TABLE_LEN]);

        assert!(matches!(
            GlyphAtlas::from_bytes(&blob),
            Err(FontError::ShortRead { section: "bitmap", actual: 0, .. })
        ));
    }

    #[test]
    fn rejects_cells_larger_than_the_atlas() {
        let blob = bff2(4, 4, (8, 2), 8, 0, &[]);
        assert!(matches!(
            GlyphAtlas::from_bytes(&blob),
            Err(FontError::InvalidCellSize { width: 8, height: 2 })
        ));
    }

    #[test]
    fn huge_cells_on_an_empty_atlas_lay_out_nothing() {
        let blob = bff2(0, 0, (i32::MAX, i32::MAX), 8, 0, &[(b'A', 6)]);
        let atlas = GlyphAtlas::from_bytes(&blob).unwrap();
        assert_eq!(atlas.columns(), 0);
        assert!(atlas.layout("A", 0.0, 0.0, 0.0, &TextStyle::default()).is_empty());
        assert_eq!(atlas.measure("A", &TextStyle::default()), 6.0);
    }

    #[test]
    fn measure_sums_scaled_widths() {
        let atlas = sample_atlas();
        let style = TextStyle::new(Vec2::new(1.5, 2.0), Color::WHITE);
        assert_eq!(atlas.measure("AB", &style), 33.0);
        assert_eq!(atlas.measure("", &style), 0.0);
        assert_eq!(atlas.measure_px("A", &TextStyle::new(Vec2::splat(0.55), Color::WHITE)), 5);
        assert_eq!(atlas.line_height(&style), 32.0);
    }

    #[test]
    fn measure_grows_with_each_visible_character() {
        let atlas = sample_atlas();
        let style = TextStyle::default();
        let mut previous = 0.0;
        for len in 1..6 {
            let w = atlas.measure(&"A".repeat(len), &style);
            assert!(w > previous);
            previous = w;
        }
    }

    #[test]
    fn layout_computes_crops_from_grid() {
        let atlas = sample_atlas();
        let quads = atlas.layout("AB", 100.0, 50.0, -10.0, &TextStyle::default());
        assert_eq!(quads.len(), 2);

        // 'A' is glyph 33: column 1, row 9 (1-based from the top).
        let a = quads[0];
        assert_eq!(a.crop, CropRect { x: 16, y: 64 - 9 * 16, width: 10, height: 16 });
        assert_eq!(a.origin, Vec3::new(100.0, 50.0, -10.0));
        assert_eq!(a.size, Vec2::new(10.0, 16.0));

        // 'B' follows at the scaled advance of 'A'.
        let b = quads[1];
        assert_eq!(b.crop.x, 32);
        assert_eq!(b.origin.x, 110.0);
    }

    #[test]
    fn layout_maps_crops_to_uvs() {
        let blob = bff2(64, 64, (16, 16), 8, 0, &[(1, 8)]);
        let atlas = GlyphAtlas::from_bytes(&blob).unwrap();
        let quad = atlas.layout("\u{1}", 0.0, 0.0, 0.0, &TextStyle::default())[0];
        assert_eq!(quad.crop, CropRect { x: 16, y: 48, width: 8, height: 16 });
        assert_eq!(quad.uv_min, Vec2::new(0.25, 0.75));
        assert_eq!(quad.uv_max, Vec2::new(0.375, 1.0));
    }

    #[test]
    fn layout_skips_characters_outside_the_grid() {
        let atlas = sample_atlas();
        let quads = atlas.layout("\tA\u{263A}B", 0.0, 0.0, 0.0, &TextStyle::default());
        let chars: Vec<char> = quads.iter().map(|q| q.ch).collect();
        assert_eq!(chars, vec!['A', 'B']);
        assert_eq!(quads[1].origin.x, 10.0);
    }

    #[test]
    fn to_rgba8_expands_alpha_as_white() {
        let blob = bff2(2, 1, (1, 1), 8, 0, &[]);
        let atlas = GlyphAtlas::from_bytes(&blob).unwrap();
        assert_eq!(atlas.to_rgba8(), vec![255, 255, 255, 0, 255, 255, 255, 0]);

        let blob = bff2(1, 2, (1, 1), 24, 0, &[]);
        let atlas = GlyphAtlas::from_bytes(&blob).unwrap();
        assert_eq!(atlas.to_rgba8(), vec![1, 1, 1, 255, 0, 0, 0, 255]);
    }
}
