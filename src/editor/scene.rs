//! Movable text elements on the editor canvas.
//!
//! Positions are kept in millimeters. Pixel geometry is derived on demand
//! at the editor's current DPI.

use crate::fonts::PageFont;
use crate::store::{FieldLayout, TextWidth};
use crate::text;
use crate::units::{pt_to_px, to_mm, to_px};

/// Smallest clickable width for an element with no visible text.
const MIN_HIT_WIDTH_EM: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.left + self.width && y >= self.top && y <= self.top + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub id: String,
    /// Preview text; the printed value always comes from the record.
    pub text: String,
    pub x_mm: f32,
    pub y_mm: f32,
    pub font_size: u32,
    pub text_width: TextWidth,
}

impl TextNode {
    pub fn from_layout(id: &str, layout: &FieldLayout, text: String, default_size: u32) -> Self {
        Self {
            id: id.to_string(),
            text,
            x_mm: layout.x_mm,
            y_mm: layout.y_mm,
            font_size: layout.font_size.unwrap_or(default_size),
            text_width: layout.text_width,
        }
    }

    pub fn to_layout(&self) -> FieldLayout {
        FieldLayout {
            text: self.text.clone(),
            font_size: Some(self.font_size),
            text_width: self.text_width,
            ..FieldLayout::at(self.x_mm, self.y_mm)
        }
    }

    /// First-line baseline start in canvas pixels.
    pub fn anchor_px(&self, dpi: f32) -> (f32, f32) {
        (to_px(self.x_mm, dpi), to_px(self.y_mm, dpi))
    }

    pub fn em_px(&self, dpi: f32) -> f32 {
        pt_to_px(self.font_size as f32, dpi)
    }

    pub fn wrap_px(&self, dpi: f32) -> Option<f32> {
        self.text_width.as_mm().map(|w| to_px(w, dpi))
    }

    pub fn lines(&self, dpi: f32, font: &PageFont) -> Vec<String> {
        let em = self.em_px(dpi);
        text::layout_lines(&text::normalize(&self.text), self.wrap_px(dpi), |s| {
            font.text_width(s, em)
        })
    }

    pub fn bounds_px(&self, dpi: f32, font: &PageFont) -> Rect {
        let em = self.em_px(dpi);
        let (x, y) = self.anchor_px(dpi);
        let lines = self.lines(dpi, font);
        let natural = lines
            .iter()
            .map(|l| font.text_width(l, em))
            .fold(0.0f32, f32::max);
        let width = self
            .wrap_px(dpi)
            .unwrap_or(natural)
            .max(em * MIN_HIT_WIDTH_EM);
        let line_height = font.line_height(em);
        Rect {
            left: x,
            top: y - font.ascent(em),
            width,
            height: line_height * lines.len().max(1) as f32,
        }
    }

    /// Shift by a pixel delta measured at `dpi`.
    pub fn translate_px(&mut self, dx: f32, dy: f32, dpi: f32) {
        self.x_mm += to_mm(dx, dpi);
        self.y_mm += to_mm(dy, dpi);
    }
}

/// Property-panel view of the selected element.
#[derive(Debug, Clone, PartialEq)]
pub struct Inspector {
    pub id: String,
    pub text: String,
    pub font_size: u32,
    /// Wrap width in canvas pixels; `None` is auto.
    pub width_px: Option<f32>,
    pub x_mm: f32,
    pub y_mm: f32,
}

impl Inspector {
    pub fn of(node: &TextNode, dpi: f32) -> Self {
        Self {
            id: node.id.clone(),
            text: node.text.clone(),
            font_size: node.font_size,
            width_px: node.wrap_px(dpi),
            x_mm: node.x_mm,
            y_mm: node.y_mm,
        }
    }
}

/// An in-progress pointer drag.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DragState {
    pub id: String,
    pub last: (f32, f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(text: &str) -> TextNode {
        TextNode {
            id: "groom_name".into(),
            text: text.into(),
            x_mm: 25.4,
            y_mm: 25.4,
            font_size: 12,
            text_width: TextWidth::Auto,
        }
    }

    #[test]
    fn test_bounds_sit_above_baseline() {
        let n = node("Ahmed");
        let bounds = n.bounds_px(96.0, &PageFont::Bitmap);
        assert_eq!(bounds.left, 96.0);
        assert!(bounds.top < 96.0);
        assert!(bounds.contains(100.0, 95.0));
        assert!(!bounds.contains(90.0, 95.0));
    }

    #[test]
    fn test_empty_text_stays_clickable() {
        let bounds = node("").bounds_px(96.0, &PageFont::Bitmap);
        assert!(bounds.width > 0.0 && bounds.height > 0.0);
    }

    #[test]
    fn test_wrap_width_sets_box_width() {
        let mut n = node("a b c d e f g h");
        n.text_width = TextWidth::Mm(25.4);
        let bounds = n.bounds_px(96.0, &PageFont::Bitmap);
        assert!((bounds.width - 96.0).abs() < 1e-3);
        assert!(n.lines(96.0, &PageFont::Bitmap).len() > 1);
    }

    #[test]
    fn test_translate_converts_at_dpi() {
        let mut n = node("x");
        n.translate_px(300.0, -150.0, 300.0);
        assert!((n.x_mm - 50.8).abs() < 1e-3);
        assert!((n.y_mm - 12.7).abs() < 1e-3);
    }

    #[test]
    fn test_layout_round_trip() {
        let mut n = node("Ahmed");
        n.text_width = TextWidth::Mm(40.0);
        let layout = n.to_layout();
        assert_eq!(layout.font_size, Some(12));
        let back = TextNode::from_layout("groom_name", &layout, "Ahmed".into(), 11);
        assert_eq!(back, n);
    }
}
