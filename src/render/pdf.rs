//! PDF page output.
//!
//! Device pixels are PDF points (72 per inch). printpdf measures from the
//! bottom-left corner, so y is flipped on the way out.
//!
//! Text is always drawn with an embedded outline font: the operator's, or
//! the bundled face closest to the requested family. Wrap points are
//! measured with that same font.

use super::PageDevice;
use crate::error::{PrintError, Result};
use crate::fonts::{BundledFace, PageFont};
use crate::template;
use crate::units::{to_mm, to_px, PageSize, POINTS_PER_INCH};
use ::image::DynamicImage;
use log::debug;
use printpdf::{
    Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Px,
    Rgb,
};
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

/// Resolution the template watermark is resampled to before embedding.
const TEMPLATE_DPI: f32 = 150.0;

const GRID_GRAY: f32 = 200.0 / 255.0;
const GRID_THICKNESS: f32 = 0.3;

struct PdfPage {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    size: PageSize,
}

pub struct PdfDevice {
    title: String,
    font: PageFont,
    page: Option<PdfPage>,
}

impl PdfDevice {
    pub fn new(title: &str, font: PageFont) -> Self {
        Self {
            title: title.to_string(),
            font,
            page: None,
        }
    }

    fn page(&self) -> Result<&PdfPage> {
        self.page
            .as_ref()
            .ok_or_else(|| PrintError::Pdf("page not started".to_string()))
    }

    fn point(page: &PdfPage, x: f32, y: f32) -> (Mm, Mm) {
        (
            Mm(to_mm(x, POINTS_PER_INCH)),
            Mm(page.size.height_mm - to_mm(y, POINTS_PER_INCH)),
        )
    }

    pub fn save(self, path: &Path) -> Result<()> {
        let page = self
            .page
            .ok_or_else(|| PrintError::Pdf("nothing rendered".to_string()))?;
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        page.doc
            .save(&mut writer)
            .map_err(|e| PrintError::Pdf(e.to_string()))?;
        Ok(())
    }
}

impl PageDevice for PdfDevice {
    fn dpi(&self) -> f32 {
        POINTS_PER_INCH
    }

    fn font(&self) -> &PageFont {
        &self.font
    }

    fn begin_page(&mut self, size: PageSize, font_family: &str) -> Result<()> {
        let (doc, page1, layer1) = PdfDocument::new(
            &self.title,
            Mm(size.width_mm),
            Mm(size.height_mm),
            "Layer 1",
        );
        let layer = doc.get_page(page1).get_layer(layer1);

        if self.font.ttf_bytes().is_none() {
            self.font = PageFont::bundled(BundledFace::for_family(font_family))?;
        }
        let bytes = self.font.ttf_bytes().map(<[u8]>::to_vec).unwrap_or_default();
        let font = doc
            .add_external_font(Cursor::new(bytes))
            .map_err(|e| PrintError::Pdf(e.to_string()))?;
        debug!("PDF page {}x{}mm, family {:?}", size.width_mm, size.height_mm, font_family);

        self.page = Some(PdfPage {
            doc,
            layer,
            font,
            size,
        });
        Ok(())
    }

    fn fill_white(&mut self) -> Result<()> {
        // PDF pages start out white
        self.page().map(|_| ())
    }

    fn draw_template(&mut self, template_image: &DynamicImage, opacity: f32) -> Result<()> {
        let page = self.page()?;
        let width_px = to_px(page.size.width_mm, TEMPLATE_DPI).round().max(1.0) as u32;
        let height_px = to_px(page.size.height_mm, TEMPLATE_DPI).round().max(1.0) as u32;
        let faded = template::watermark(template_image, width_px, height_px, opacity);

        let image = Image::from(ImageXObject {
            width: Px(width_px as usize),
            height: Px(height_px as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: faded.into_raw(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // DPI chosen so the image spans the full page width
        let dpi = width_px as f32 / (page.size.width_mm / 25.4);
        image.add_to_layer(
            page.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(0.0)),
                translate_y: Some(Mm(0.0)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn draw_grid_line(&mut self, from: (f32, f32), to: (f32, f32)) -> Result<()> {
        let page = self.page()?;
        let (x1, y1) = Self::point(page, from.0, from.1);
        let (x2, y2) = Self::point(page, to.0, to.1);

        page.layer
            .set_outline_color(Color::Rgb(Rgb::new(GRID_GRAY, GRID_GRAY, GRID_GRAY, None)));
        page.layer.set_outline_thickness(GRID_THICKNESS);
        page.layer.add_line(Line {
            points: vec![(Point::new(x1, y1), false), (Point::new(x2, y2), false)],
            is_closed: false,
        });
        Ok(())
    }

    fn draw_text_line(&mut self, text: &str, x: f32, baseline: f32, size_pt: f32) -> Result<()> {
        let page = self.page()?;
        let (x, y) = Self::point(page, x, baseline);
        page.layer
            .set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        page.layer.use_text(text, size_pt, x, y, &page.font);
        Ok(())
    }
}
