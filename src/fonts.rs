//! Fonts used to measure and rasterize field text.
//!
//! An outline font (TTF/OTF loaded with ab_glyph) is used when the operator
//! supplies one. Otherwise raster output scales the bundled Spleen 12x24
//! bitmap face, and PDF output embeds a bundled DejaVu face, so rendering
//! never depends on a system font.

use crate::error::{PrintError, Result};
use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use spleen_font::{PSF2Font, FONT_12X24};
use std::path::Path;
use std::sync::Arc;

/// Spleen cell geometry.
const BITMAP_CELL_W: usize = 12;
const BITMAP_CELL_H: usize = 24;

/// Bitmap baseline sits at row 19 of 24.
const BITMAP_ASCENT: f32 = 19.0 / 24.0;

/// Line advance as a multiple of the em size for the bitmap face.
const BITMAP_LINE_HEIGHT: f32 = 1.2;

/// Outline faces compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundledFace {
    Serif,
    Sans,
    Mono,
}

impl BundledFace {
    /// Face closest to a family name. Anything unrecognized is serif.
    pub fn for_family(family: &str) -> Self {
        let family = family.to_ascii_lowercase();
        if family.contains("mono") || family.contains("courier") {
            BundledFace::Mono
        } else if family.contains("sans") || family.contains("helvetica") || family.contains("arial") {
            BundledFace::Sans
        } else {
            BundledFace::Serif
        }
    }

    fn bytes(self) -> &'static [u8] {
        match self {
            BundledFace::Serif => include_bytes!("fonts/DejaVuSerif.ttf"),
            BundledFace::Sans => include_bytes!("fonts/DejaVuSans.ttf"),
            BundledFace::Mono => include_bytes!("fonts/DejaVuSansMono.ttf"),
        }
    }
}

#[derive(Clone)]
pub enum PageFont {
    Outline {
        font: FontArc,
        /// Raw file bytes, embedded as-is by the PDF device.
        data: Arc<Vec<u8>>,
    },
    Bitmap,
}

impl std::fmt::Debug for PageFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageFont::Outline { data, .. } => write!(f, "PageFont::Outline({} bytes)", data.len()),
            PageFont::Bitmap => write!(f, "PageFont::Bitmap"),
        }
    }
}

impl Default for PageFont {
    fn default() -> Self {
        PageFont::Bitmap
    }
}

impl PageFont {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PrintError::NotFound(format!("font file {}", path.display())));
        }
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = FontArc::try_from_vec(data.clone())
            .map_err(|e| PrintError::Font(e.to_string()))?;
        Ok(PageFont::Outline {
            font,
            data: Arc::new(data),
        })
    }

    pub fn bundled(face: BundledFace) -> Result<Self> {
        Self::from_bytes(face.bytes().to_vec())
    }

    /// Load `path` when given, the bitmap face otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(PageFont::Bitmap),
        }
    }

    pub fn ttf_bytes(&self) -> Option<&[u8]> {
        match self {
            PageFont::Outline { data, .. } => Some(data.as_slice()),
            PageFont::Bitmap => None,
        }
    }

    /// ab_glyph scales by ascent-to-descent height; convert an em size.
    fn outline_scale(font: &FontArc, em_px: f32) -> PxScale {
        let scale = match font.units_per_em() {
            Some(upem) if upem > 0.0 => em_px * font.height_unscaled() / upem,
            _ => em_px,
        };
        PxScale::from(scale)
    }

    /// Advance width of `text` at an em size of `em_px` pixels.
    pub fn text_width(&self, text: &str, em_px: f32) -> f32 {
        match self {
            PageFont::Outline { font, .. } => {
                let scaled = font.as_scaled(Self::outline_scale(font, em_px));
                let mut width = 0.0;
                let mut previous = None;
                for ch in text.chars() {
                    let id = scaled.glyph_id(ch);
                    if let Some(prev) = previous {
                        width += scaled.kern(prev, id);
                    }
                    width += scaled.h_advance(id);
                    previous = Some(id);
                }
                width
            }
            PageFont::Bitmap => {
                let advance = em_px * BITMAP_CELL_W as f32 / BITMAP_CELL_H as f32;
                text.chars().count() as f32 * advance
            }
        }
    }

    /// Distance from the top of a line to its baseline.
    pub fn ascent(&self, em_px: f32) -> f32 {
        match self {
            PageFont::Outline { font, .. } => {
                font.as_scaled(Self::outline_scale(font, em_px)).ascent()
            }
            PageFont::Bitmap => em_px * BITMAP_ASCENT,
        }
    }

    /// Baseline-to-baseline distance.
    pub fn line_height(&self, em_px: f32) -> f32 {
        match self {
            PageFont::Outline { font, .. } => {
                let scaled = font.as_scaled(Self::outline_scale(font, em_px));
                scaled.ascent() - scaled.descent() + scaled.line_gap()
            }
            PageFont::Bitmap => em_px * BITMAP_LINE_HEIGHT,
        }
    }

    /// Rasterize one line of text with its baseline starting at
    /// `(x, baseline)`. `plot` receives pixel coordinates and a coverage in
    /// `0.0..=1.0`; it may be called with coordinates outside the target.
    pub fn rasterize<F>(&self, text: &str, x: f32, baseline: f32, em_px: f32, mut plot: F) -> Result<()>
    where
        F: FnMut(i32, i32, f32),
    {
        match self {
            PageFont::Outline { font, .. } => {
                let scale = Self::outline_scale(font, em_px);
                let scaled = font.as_scaled(scale);
                let mut caret = x;
                let mut previous = None;
                for ch in text.chars() {
                    let id = scaled.glyph_id(ch);
                    if let Some(prev) = previous {
                        caret += scaled.kern(prev, id);
                    }
                    let glyph = id.with_scale_and_position(scale, ab_glyph::point(caret, baseline));
                    caret += scaled.h_advance(id);
                    previous = Some(id);

                    if let Some(outlined) = font.outline_glyph(glyph) {
                        let bounds = outlined.px_bounds();
                        outlined.draw(|gx, gy, coverage| {
                            plot(
                                gx as i32 + bounds.min.x as i32,
                                gy as i32 + bounds.min.y as i32,
                                coverage,
                            );
                        });
                    }
                }
                Ok(())
            }
            PageFont::Bitmap => rasterize_bitmap(text, x, baseline, em_px, plot),
        }
    }
}

fn rasterize_bitmap<F>(text: &str, x: f32, baseline: f32, em_px: f32, mut plot: F) -> Result<()>
where
    F: FnMut(i32, i32, f32),
{
    let mut spleen = PSF2Font::new(FONT_12X24)
        .map_err(|_| PrintError::Font("bundled bitmap font failed to load".to_string()))?;

    let cell_w = (em_px * BITMAP_CELL_W as f32 / BITMAP_CELL_H as f32).round().max(1.0) as usize;
    let cell_h = em_px.round().max(1.0) as usize;
    let top = (baseline - em_px * BITMAP_ASCENT).round() as i32;

    for (index, ch) in text.chars().enumerate() {
        let mut source = [false; BITMAP_CELL_W * BITMAP_CELL_H];
        let utf8 = ch.to_string();
        match spleen.glyph_for_utf8(utf8.as_bytes()) {
            Some(glyph) => {
                for (row_y, row) in glyph.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if row_y < BITMAP_CELL_H && col_x < BITMAP_CELL_W {
                            source[row_y * BITMAP_CELL_W + col_x] = on;
                        }
                    }
                }
            }
            None if ch.is_whitespace() => {}
            None => {
                // Unknown glyph: hollow box
                for col in 1..BITMAP_CELL_W - 1 {
                    source[3 * BITMAP_CELL_W + col] = true;
                    source[(BITMAP_CELL_H - 4) * BITMAP_CELL_W + col] = true;
                }
                for row in 3..BITMAP_CELL_H - 3 {
                    source[row * BITMAP_CELL_W + 1] = true;
                    source[row * BITMAP_CELL_W + BITMAP_CELL_W - 2] = true;
                }
            }
        }

        let left = (x + index as f32 * cell_w as f32).round() as i32;
        // Nearest-neighbor scale from the 12x24 cell
        for dy in 0..cell_h {
            for dx in 0..cell_w {
                let sx = dx * BITMAP_CELL_W / cell_w;
                let sy = dy * BITMAP_CELL_H / cell_h;
                if source[sy * BITMAP_CELL_W + sx] {
                    plot(left + dx as i32, top + dy as i32, 1.0);
                }
            }
        }
    }
    Ok(())
}
