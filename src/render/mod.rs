//! Print Renderer: draws a Print Record onto a page at calibrated positions.
//!
//! Draw order is fixed: background (white, or the faded template), then the
//! optional 10 mm grid, then field text on top.

pub mod pdf;
pub mod raster;

use crate::error::{PrintError, Result};
use crate::fonts::PageFont;
use crate::mapper::PrintRecord;
use crate::store::CoordinateStore;
use crate::template::{self, WATERMARK_OPACITY};
use crate::text;
use crate::units::{check_dpi, pt_to_px, to_px, PageSize};
use ::image::DynamicImage;
use log::{debug, info, warn};
use std::path::Path;

pub use pdf::PdfDevice;
pub use raster::{RasterCanvas, RasterDevice};

/// Spacing of the calibration grid.
pub const GRID_STEP_MM: f32 = 10.0;

pub const DEFAULT_FONT_FAMILY: &str = "Times New Roman";
pub const DEFAULT_POINT_SIZE: f32 = 11.0;

/// A page-sized output target. Coordinates are device pixels with the
/// origin at the top-left corner of the page.
pub trait PageDevice {
    /// The device's own resolution, used for every mm -> pixel conversion.
    fn dpi(&self) -> f32;

    /// Font used both to measure and to draw text.
    fn font(&self) -> &PageFont;

    /// Configure the device for one page.
    fn begin_page(&mut self, page: PageSize, font_family: &str) -> Result<()>;

    fn fill_white(&mut self) -> Result<()>;

    /// Draw the template stretched over the whole page at `opacity`.
    fn draw_template(&mut self, template: &DynamicImage, opacity: f32) -> Result<()>;

    /// A faint calibration line.
    fn draw_grid_line(&mut self, from: (f32, f32), to: (f32, f32)) -> Result<()>;

    /// One line of text with its baseline starting at `(x, baseline)`.
    fn draw_text_line(&mut self, text: &str, x: f32, baseline: f32, size_pt: f32) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Overrides the store's page size.
    pub page_size: Option<PageSize>,
    pub font_family: String,
    /// Used for fields whose layout has no font size.
    pub default_pt: f32,
    pub show_template: bool,
    pub template_path: Option<String>,
    pub offset_x_mm: f32,
    pub offset_y_mm: f32,
    pub show_grid: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_size: None,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            default_pt: DEFAULT_POINT_SIZE,
            show_template: false,
            template_path: None,
            offset_x_mm: 0.0,
            offset_y_mm: 0.0,
            show_grid: false,
        }
    }
}

/// One field as it landed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedField {
    pub field_id: String,
    pub lines: Vec<String>,
    /// Anchor (first baseline start) in device pixels.
    pub x_px: f32,
    pub y_px: f32,
    pub size_pt: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub page: PageSize,
    pub dpi: f32,
    pub template_drawn: bool,
    pub grid_drawn: bool,
    pub placed: Vec<PlacedField>,
    /// Calibrated fields with no printable value.
    pub skipped: Vec<String>,
}

impl RenderReport {
    pub fn field(&self, id: &str) -> Option<&PlacedField> {
        self.placed.iter().find(|p| p.field_id == id)
    }
}

/// Render one certificate page onto `device`.
pub fn render_certificate<D: PageDevice>(
    device: &mut D,
    record: &PrintRecord,
    store: &CoordinateStore,
    options: &RenderOptions,
) -> Result<RenderReport> {
    let page = options.page_size.unwrap_or_else(|| store.page_size());
    device.begin_page(page, &options.font_family)?;
    let dpi = device.dpi();

    let mut report = RenderReport {
        page,
        dpi,
        ..RenderReport::default()
    };

    // Background
    if options.show_template {
        report.template_drawn = draw_watermark(device, options.template_path.as_deref())?;
    }
    if !report.template_drawn {
        device.fill_white()?;
    }

    if options.show_grid {
        draw_grid(device, page)?;
        report.grid_drawn = true;
    }

    for (field_id, layout) in &store.fields {
        let value = record.get(field_id).map(|v| text::normalize(v)).unwrap_or_default();
        if text::is_blank(&value) {
            debug!("Skipping {}: no value", field_id);
            report.skipped.push(field_id.clone());
            continue;
        }

        let size_pt = layout
            .font_size
            .map(|s| s as f32)
            .unwrap_or(options.default_pt);
        let em_px = pt_to_px(size_pt, dpi);
        let x = to_px(layout.x_mm + options.offset_x_mm, dpi);
        let y = to_px(layout.y_mm + options.offset_y_mm, dpi);
        let wrap_px = layout.text_width.as_mm().map(|w| to_px(w, dpi));

        let lines = {
            let font = device.font();
            text::layout_lines(&value, wrap_px, |s| font.text_width(s, em_px))
        };
        let line_height = device.font().line_height(em_px);
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            device.draw_text_line(line, x, y + i as f32 * line_height, size_pt)?;
        }

        report.placed.push(PlacedField {
            field_id: field_id.clone(),
            lines,
            x_px: x,
            y_px: y,
            size_pt,
        });
    }

    Ok(report)
}

/// Returns whether the template made it onto the page. A missing or
/// unreadable template only costs the watermark.
fn draw_watermark<D: PageDevice>(device: &mut D, template_path: Option<&str>) -> Result<bool> {
    let Some(path) = template_path.filter(|p| !p.trim().is_empty()) else {
        warn!("Template overlay requested but no template path set");
        return Ok(false);
    };
    match template::load_template(path) {
        Ok(img) => {
            device.draw_template(&img, WATERMARK_OPACITY)?;
            Ok(true)
        }
        Err(e @ (PrintError::NotFound(_) | PrintError::Image(_))) => {
            warn!("Skipping template watermark: {}", e);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn draw_grid<D: PageDevice>(device: &mut D, page: PageSize) -> Result<()> {
    let dpi = device.dpi();
    let (width, height) = (to_px(page.width_mm, dpi), to_px(page.height_mm, dpi));

    let mut x_mm = 0.0;
    while x_mm <= page.width_mm {
        let x = to_px(x_mm, dpi);
        device.draw_grid_line((x, 0.0), (x, height))?;
        x_mm += GRID_STEP_MM;
    }
    let mut y_mm = 0.0;
    while y_mm <= page.height_mm {
        let y = to_px(y_mm, dpi);
        device.draw_grid_line((0.0, y), (width, y))?;
        y_mm += GRID_STEP_MM;
    }
    Ok(())
}

/// Where a print job goes and how raster output is sampled.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub path: std::path::PathBuf,
    /// Resolution for raster outputs.
    pub raster_dpi: f32,
    pub font: PageFont,
}

/// Render to a PDF or PNG file, chosen by the output path's extension.
pub fn print_to_target(
    target: &OutputTarget,
    record: &PrintRecord,
    store: &CoordinateStore,
    options: &RenderOptions,
) -> Result<RenderReport> {
    let report = match output_kind(&target.path)? {
        OutputKind::Pdf => {
            let mut device = PdfDevice::new("Nikahnama", target.font.clone());
            let report = render_certificate(&mut device, record, store, options)?;
            device.save(&target.path)?;
            report
        }
        OutputKind::Png => {
            let dpi = check_dpi(target.raster_dpi)?;
            let mut device = RasterDevice::new(dpi, target.font.clone());
            let report = render_certificate(&mut device, record, store, options)?;
            device.save(&target.path)?;
            report
        }
    };
    info!(
        "Printed {} field(s) to {} ({} skipped)",
        report.placed.len(),
        target.path.display(),
        report.skipped.len()
    );
    Ok(report)
}

/// Load the calibrated layout and print. Fails with a configuration error
/// when the layout was never saved.
pub fn print_from_coordinates(
    coords_path: &Path,
    target: &OutputTarget,
    record: &PrintRecord,
    options: &RenderOptions,
) -> Result<RenderReport> {
    let store = CoordinateStore::load_for_print(coords_path)?;
    print_to_target(target, record, &store, options)
}

enum OutputKind {
    Pdf,
    Png,
}

fn output_kind(path: &Path) -> Result<OutputKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => Ok(OutputKind::Pdf),
        Some("png") => Ok(OutputKind::Png),
        _ => Err(PrintError::Configuration(format!(
            "unsupported output {}: use a .pdf or .png file",
            path.display()
        ))),
    }
}
