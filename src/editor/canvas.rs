//! Editor preview: the template at full strength with every element drawn
//! over it, written as a PNG the user can inspect.

use super::LayoutEditor;
use crate::error::Result;
use crate::render::raster::GRID_COLOR;
use crate::render::{RasterCanvas, GRID_STEP_MM};
use crate::units::to_px;
use ::image::{Rgb, RgbImage};
use log::info;
use std::path::Path;

const ELEMENT_COLOR: Rgb<u8> = Rgb([200, 0, 0]);
const SELECTED_COLOR: Rgb<u8> = Rgb([0, 150, 0]);
const WRAP_BOX_COLOR: Rgb<u8> = Rgb([128, 128, 128]);

impl LayoutEditor {
    /// Render the current scene. The canvas is the template's own pixel
    /// grid; element positions follow the editor DPI.
    pub fn snapshot(&self) -> Result<RgbImage> {
        let template = self.require_template()?;
        let dpi = self.dpi() as f32;
        let background = template.image.to_rgb8();
        let (width, height) = background.dimensions();
        let mut canvas = RasterCanvas::new(width, height, dpi);
        canvas.paste_stretched(&background);

        if self.show_grid() {
            let step = to_px(GRID_STEP_MM, dpi);
            let mut x = 0.0;
            while x <= width as f32 {
                canvas.dotted_line((x, 0.0), (x, height as f32), GRID_COLOR);
                x += step;
            }
            let mut y = 0.0;
            while y <= height as f32 {
                canvas.dotted_line((0.0, y), (width as f32, y), GRID_COLOR);
                y += step;
            }
        }

        let font = self.font();
        for node in self.fields() {
            let color = if self.selected_id() == Some(node.id.as_str()) {
                SELECTED_COLOR
            } else {
                ELEMENT_COLOR
            };
            let em = node.em_px(dpi);
            let (x, y) = node.anchor_px(dpi);
            let line_height = font.line_height(em);
            for (i, line) in node.lines(dpi, font).iter().enumerate() {
                canvas.text(font, line, x, y + i as f32 * line_height, em, color)?;
            }
            if node.wrap_px(dpi).is_some() {
                let b = node.bounds_px(dpi, font);
                canvas.rect_outline(b.left, b.top, b.width, b.height, WRAP_BOX_COLOR);
            }
        }
        Ok(canvas.image)
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let image = self.snapshot()?;
        RasterCanvas {
            image,
            dpi: self.dpi() as f32,
        }
        .save(path)?;
        info!("Snapshot written to {}", path.display());
        Ok(())
    }
}
