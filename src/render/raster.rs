//! Raster page output (PNG).

use super::PageDevice;
use crate::error::{PrintError, Result};
use crate::fonts::PageFont;
use crate::template;
use crate::units::{pt_to_px, PageSize};
use ::image::{imageops, DynamicImage, Rgb, RgbImage};
use log::debug;
use std::path::Path;

pub const INK: Rgb<u8> = Rgb([0, 0, 0]);
pub const GRID_COLOR: Rgb<u8> = Rgb([200, 200, 200]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// RGB drawing surface with a known resolution.
pub struct RasterCanvas {
    pub image: RgbImage,
    pub dpi: f32,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32, dpi: f32) -> Self {
        Self {
            image: RgbImage::from_pixel(width.max(1), height.max(1), WHITE),
            dpi,
        }
    }

    pub fn fill(&mut self, color: Rgb<u8>) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }

    /// Replace the canvas content with `image`, stretched to fit.
    pub fn paste_stretched(&mut self, image: &RgbImage) {
        let (w, h) = self.image.dimensions();
        if image.dimensions() == (w, h) {
            self.image.copy_from_slice(image.as_raw());
        } else {
            self.image = imageops::resize(image, w, h, imageops::FilterType::Triangle);
        }
    }

    /// Blend `color` into one pixel with the given coverage.
    fn blend(&mut self, x: i32, y: i32, color: Rgb<u8>, coverage: f32) {
        if x < 0 || y < 0 || x >= self.image.width() as i32 || y >= self.image.height() as i32 {
            return;
        }
        let coverage = coverage.clamp(0.0, 1.0);
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        for (dst, src) in pixel.0.iter_mut().zip(color.0) {
            *dst = (*dst as f32 * (1.0 - coverage) + src as f32 * coverage).round() as u8;
        }
    }

    /// Axis-aligned dotted line; diagonal input is drawn as its bounding
    /// horizontal or vertical run.
    pub fn dotted_line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb<u8>) {
        let (x0, y0) = (from.0.round() as i32, from.1.round() as i32);
        let (x1, y1) = (to.0.round() as i32, to.1.round() as i32);
        if (x1 - x0).abs() >= (y1 - y0).abs() {
            for x in x0.min(x1)..=x0.max(x1) {
                if x % 4 < 2 {
                    self.blend(x, y0, color, 1.0);
                }
            }
        } else {
            for y in y0.min(y1)..=y0.max(y1) {
                if y % 4 < 2 {
                    self.blend(x0, y, color, 1.0);
                }
            }
        }
    }

    /// Outline of a rectangle given in pixels.
    pub fn rect_outline(&mut self, left: f32, top: f32, width: f32, height: f32, color: Rgb<u8>) {
        let (l, t) = (left.round() as i32, top.round() as i32);
        let (r, b) = ((left + width).round() as i32, (top + height).round() as i32);
        for x in l..=r {
            self.blend(x, t, color, 1.0);
            self.blend(x, b, color, 1.0);
        }
        for y in t..=b {
            self.blend(l, y, color, 1.0);
            self.blend(r, y, color, 1.0);
        }
    }

    pub fn text(
        &mut self,
        font: &PageFont,
        text: &str,
        x: f32,
        baseline: f32,
        em_px: f32,
        color: Rgb<u8>,
    ) -> Result<()> {
        font.rasterize(text, x, baseline, em_px, |px, py, coverage| {
            self.blend(px, py, color, coverage)
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.image
            .save(path)
            .map_err(|e| PrintError::Image(format!("{}: {}", path.display(), e)))
    }
}

/// Renders a page into memory at a chosen resolution.
pub struct RasterDevice {
    dpi: f32,
    font: PageFont,
    canvas: Option<RasterCanvas>,
}

impl RasterDevice {
    pub fn new(dpi: f32, font: PageFont) -> Self {
        Self {
            dpi,
            font,
            canvas: None,
        }
    }

    fn canvas(&mut self) -> Result<&mut RasterCanvas> {
        self.canvas
            .as_mut()
            .ok_or_else(|| PrintError::Image("page not started".to_string()))
    }

    /// The rendered page, once a page has been started.
    pub fn image(&self) -> Option<&RgbImage> {
        self.canvas.as_ref().map(|c| &c.image)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        match &self.canvas {
            Some(canvas) => canvas.save(path),
            None => Err(PrintError::Image("nothing rendered".to_string())),
        }
    }
}

impl PageDevice for RasterDevice {
    fn dpi(&self) -> f32 {
        self.dpi
    }

    fn font(&self) -> &PageFont {
        &self.font
    }

    fn begin_page(&mut self, page: PageSize, font_family: &str) -> Result<()> {
        let (w, h) = page.pixels(self.dpi);
        debug!(
            "Raster page {}x{}px at {} dpi (family {:?} rendered with {:?})",
            w, h, self.dpi, font_family, self.font
        );
        self.canvas = Some(RasterCanvas::new(w, h, self.dpi));
        Ok(())
    }

    fn fill_white(&mut self) -> Result<()> {
        self.canvas()?.fill(WHITE);
        Ok(())
    }

    fn draw_template(&mut self, image: &DynamicImage, opacity: f32) -> Result<()> {
        let canvas = self.canvas()?;
        let (w, h) = canvas.image.dimensions();
        let faded = template::watermark(image, w, h, opacity);
        canvas.paste_stretched(&faded);
        Ok(())
    }

    fn draw_grid_line(&mut self, from: (f32, f32), to: (f32, f32)) -> Result<()> {
        self.canvas()?.dotted_line(from, to, GRID_COLOR);
        Ok(())
    }

    fn draw_text_line(&mut self, text: &str, x: f32, baseline: f32, size_pt: f32) -> Result<()> {
        let em_px = pt_to_px(size_pt, self.dpi);
        let font = self.font.clone();
        self.canvas()?.text(&font, text, x, baseline, em_px, INK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::PrintRecord;
    use crate::render::{render_certificate, RenderOptions};
    use crate::store::{CoordinateStore, FieldLayout};
    use crate::units::to_px;

    fn dark_pixels_in(image: &RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) -> usize {
        let mut count = 0;
        for y in y0..y1.min(image.height()) {
            for x in x0..x1.min(image.width()) {
                if image.get_pixel(x, y).0[0] < 100 {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_page_matches_device_resolution() {
        let mut device = RasterDevice::new(100.0, PageFont::Bitmap);
        device.begin_page(PageSize::A4, "Times New Roman").unwrap();
        let (w, h) = device.image().unwrap().dimensions();
        assert_eq!((w, h), PageSize::A4.pixels(100.0));
    }

    #[test]
    fn test_text_is_inked_near_anchor() {
        let mut store = CoordinateStore::default();
        store.fields.insert("groom_name".into(), FieldLayout::at(35.0, 78.0));
        let record: PrintRecord = [("groom_name".to_string(), "Ahmed Ali".to_string())]
            .into_iter()
            .collect();

        let mut device = RasterDevice::new(100.0, PageFont::Bitmap);
        render_certificate(&mut device, &record, &store, &RenderOptions::default()).unwrap();
        let image = device.image().unwrap();

        let x = to_px(35.0, 100.0) as u32;
        let y = to_px(78.0, 100.0) as u32;
        // Ink sits just above the baseline, right of the anchor
        assert!(dark_pixels_in(image, x, y - 15, x + 80, y + 3) > 0);
        // Nothing on the left half of the page
        assert_eq!(dark_pixels_in(image, 0, 0, x - 1, image.height()), 0);
    }

    #[test]
    fn test_grid_is_light() {
        let mut device = RasterDevice::new(50.0, PageFont::Bitmap);
        let options = RenderOptions {
            show_grid: true,
            ..RenderOptions::default()
        };
        render_certificate(&mut device, &Default::default(), &CoordinateStore::default(), &options).unwrap();
        let image = device.image().unwrap();
        assert_eq!(dark_pixels_in(image, 0, 0, image.width(), image.height()), 0);
        assert_eq!(*image.get_pixel(0, 0), GRID_COLOR);
    }

    #[test]
    fn test_drawing_before_page_fails() {
        let mut device = RasterDevice::new(50.0, PageFont::Bitmap);
        assert!(device.fill_white().is_err());
        assert!(device.save(Path::new("unused.png")).is_err());
    }

    #[test]
    fn test_blend_ignores_out_of_bounds() {
        let mut canvas = RasterCanvas::new(4, 4, 72.0);
        canvas.dotted_line((-10.0, 2.0), (20.0, 2.0), INK);
        assert_eq!(*canvas.image.get_pixel(0, 2), INK);
    }
}
