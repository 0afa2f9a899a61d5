//! Pixel/millimeter conversion and page dimensions.

use crate::error::{PrintError, Result};
use serde::{Deserialize, Serialize};

pub const MM_PER_INCH: f32 = 25.4;

/// Resolutions accepted for raster output and the editor canvas.
pub const MIN_DPI: u32 = 72;
pub const MAX_DPI: u32 = 600;

/// Points per inch, used to turn a font's point size into device pixels.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Pixels to millimeters at the given resolution.
pub fn to_mm(pixels: f32, dpi: f32) -> f32 {
    pixels / dpi * MM_PER_INCH
}

/// Millimeters to pixels at the given resolution.
pub fn to_px(mm: f32, dpi: f32) -> f32 {
    mm * dpi / MM_PER_INCH
}

/// Font point size to pixels at the given resolution.
pub fn pt_to_px(pt: f32, dpi: f32) -> f32 {
    pt * dpi / POINTS_PER_INCH
}

/// Reject resolutions outside `MIN_DPI..=MAX_DPI`.
pub fn check_dpi(dpi: f32) -> Result<f32> {
    if (MIN_DPI as f32..=MAX_DPI as f32).contains(&dpi) {
        Ok(dpi)
    } else {
        Err(PrintError::Configuration(format!(
            "dpi must be between {} and {}, got {}",
            MIN_DPI, MAX_DPI, dpi
        )))
    }
}

/// Physical page dimensions in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width_mm: 210.0,
        height_mm: 297.0,
    };

    /// Page dimensions in whole device pixels.
    pub fn pixels(&self, dpi: f32) -> (u32, u32) {
        (
            to_px(self.width_mm, dpi).round().max(1.0) as u32,
            to_px(self.height_mm, dpi).round().max(1.0) as u32,
        )
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

impl From<[f32; 2]> for PageSize {
    fn from([width_mm, height_mm]: [f32; 2]) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }
}
