//! Template image loading and watermark preparation.
//!
//! The template is never modified; it is read from disk (or fetched over
//! HTTP) and composited into new buffers.

use crate::error::{PrintError, Result};
use ::image::{imageops, imageops::FilterType, DynamicImage, Rgb, RgbImage, Rgba};
use log::debug;
use std::io::Read;
use std::path::Path;

/// Opacity of the template when drawn under printed text.
pub const WATERMARK_OPACITY: f32 = 0.18;

/// Load a template from a file path or an `http(s)://` URL.
pub fn load_template(location: &str) -> Result<DynamicImage> {
    let image_bytes = if location.starts_with("http://") || location.starts_with("https://") {
        let response = ureq::get(location)
            .call()
            .map_err(|e| PrintError::NotFound(format!("template {}: {}", location, e)))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| PrintError::Image(format!("Failed to read response: {}", e)))?;
        bytes
    } else {
        let path = Path::new(location);
        if !path.exists() {
            return Err(PrintError::NotFound(format!("template image {}", location)));
        }
        std::fs::read(path)?
    };

    let img = ::image::load_from_memory(&image_bytes)
        .map_err(|e| PrintError::Image(format!("Failed to decode {}: {}", location, e)))?;
    debug!("Loaded template {} ({}x{})", location, img.width(), img.height());
    Ok(img)
}

/// Stretch the template over a `width` x `height` page and fade it toward
/// white. Transparent template pixels count as white paper.
pub fn watermark(template: &DynamicImage, width: u32, height: u32, opacity: f32) -> RgbImage {
    let opacity = opacity.clamp(0.0, 1.0);
    let resized = imageops::resize(&template.to_rgba8(), width, height, FilterType::Triangle);

    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0 * opacity;
        let bg = 255.0;
        let blend = |c: u8| (c as f32 * alpha + bg * (1.0 - alpha)).round() as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}
