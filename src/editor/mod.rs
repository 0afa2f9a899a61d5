//! Layout Editor: calibrate field positions against a template image.
//!
//! The editor holds a scene of movable text nodes over the template. The
//! template's pixel grid is the canvas; the DPI setting says how many of
//! those pixels make an inch. Millimeter positions are authoritative, so a
//! DPI change moves elements on screen but never rescales the layout.
//!
//! Nothing is persisted until [`LayoutEditor::save`].

pub mod canvas;
pub mod scene;
pub mod shell;

use crate::error::{EditorError, PrintError, Result};
use crate::fonts::PageFont;
use crate::mapper::PrintRecord;
use crate::render::{print_to_target, OutputTarget, RenderOptions, RenderReport, DEFAULT_POINT_SIZE};
use crate::store::{CoordinateStore, FieldLayout, StoreOrigin, TextWidth};
use crate::template;
use crate::units::{to_mm, MAX_DPI, MIN_DPI};
use ::image::DynamicImage;
use log::{debug, info, warn};
use std::ops::RangeInclusive;
use std::path::PathBuf;

pub use scene::{Inspector, Rect, TextNode};
use scene::DragState;

pub const DPI_RANGE: RangeInclusive<u32> = MIN_DPI..=MAX_DPI;
pub const FONT_SIZE_RANGE: RangeInclusive<u32> = 6..=72;

/// Where a newly added field appears, in canvas pixels.
pub const NEW_FIELD_POS_PX: (f32, f32) = (50.0, 50.0);

/// Vertical spacing for record fields that have no saved position yet.
pub const STACK_STEP_PX: f32 = 35.0;

pub struct EditorConfig {
    pub template_path: Option<String>,
    pub coords_path: PathBuf,
    /// Values shown as preview text.
    pub record: PrintRecord,
    pub font: PageFont,
}

pub struct LoadedTemplate {
    pub path: String,
    pub image: DynamicImage,
}

type PrintObserver = Box<dyn FnMut(&RenderReport)>;

pub struct LayoutEditor {
    template: Option<LoadedTemplate>,
    coords_path: PathBuf,
    record: PrintRecord,
    font: PageFont,
    dpi: u32,
    page_size_mm: Option<[f32; 2]>,
    nodes: Vec<TextNode>,
    selected: Option<String>,
    drag: Option<DragState>,
    show_grid: bool,
    origin: StoreOrigin,
    print_observers: Vec<PrintObserver>,
}

fn clamp_dpi(dpi: u32) -> u32 {
    dpi.clamp(*DPI_RANGE.start(), *DPI_RANGE.end())
}

impl LayoutEditor {
    /// Open the editor on a coordinates file. A template that cannot be
    /// loaded leaves the editor read-only until one is loaded.
    pub fn open(config: EditorConfig) -> Result<Self> {
        let (store, origin) = CoordinateStore::load_or_default(&config.coords_path)?;
        let dpi = clamp_dpi(store.dpi);
        let default_size = DEFAULT_POINT_SIZE as u32;

        let mut nodes: Vec<TextNode> = store
            .fields
            .iter()
            .map(|(id, layout)| {
                let text = match config.record.get(id) {
                    Some(v) if !v.trim().is_empty() => v.clone(),
                    _ if !layout.text.is_empty() => layout.text.clone(),
                    _ => id.clone(),
                };
                TextNode::from_layout(id, layout, text, default_size)
            })
            .collect();

        // Record values without a saved position get stacked in a column
        let mut y_px = NEW_FIELD_POS_PX.1;
        for (id, value) in &config.record {
            if store.fields.contains_key(id) || value.trim().is_empty() {
                continue;
            }
            let layout = FieldLayout::at(
                to_mm(NEW_FIELD_POS_PX.0, dpi as f32),
                to_mm(y_px, dpi as f32),
            );
            nodes.push(TextNode::from_layout(id, &layout, value.clone(), default_size));
            y_px += STACK_STEP_PX;
        }

        let mut editor = Self {
            template: None,
            coords_path: config.coords_path,
            record: config.record,
            font: config.font,
            dpi,
            page_size_mm: store.page_size_mm,
            nodes,
            selected: None,
            drag: None,
            show_grid: false,
            origin,
            print_observers: Vec::new(),
        };

        match config.template_path.or(store.image_path) {
            Some(path) => {
                if let Err(e) = editor.load_template(&path) {
                    warn!("{}. Load a template before editing", e);
                }
            }
            None => warn!("No template image set. Load a template before editing"),
        }
        info!(
            "Layout editor opened with {} field(s) at {} dpi ({:?})",
            editor.nodes.len(),
            editor.dpi,
            editor.origin
        );
        Ok(editor)
    }

    /// Replace the template image. On failure the current template stays.
    pub fn load_template(&mut self, path: &str) -> Result<()> {
        let image = template::load_template(path)?;
        info!("Template {} loaded: {}x{}px", path, image.width(), image.height());
        self.template = Some(LoadedTemplate {
            path: path.to_string(),
            image,
        });
        Ok(())
    }

    pub fn template(&self) -> Option<&LoadedTemplate> {
        self.template.as_ref()
    }

    fn require_template(&self) -> Result<&LoadedTemplate> {
        self.template
            .as_ref()
            .ok_or(PrintError::Editor(EditorError::NoTemplate))
    }

    pub fn origin(&self) -> StoreOrigin {
        self.origin
    }

    pub fn coords_path(&self) -> &std::path::Path {
        &self.coords_path
    }

    pub fn record(&self) -> &PrintRecord {
        &self.record
    }

    pub fn font(&self) -> &PageFont {
        &self.font
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Change the display resolution. Stored millimeters are untouched;
    /// only the derived pixel positions move. Returns the applied value.
    pub fn set_dpi(&mut self, dpi: u32) -> u32 {
        self.dpi = clamp_dpi(dpi);
        debug!("DPI set to {}", self.dpi);
        self.dpi
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn set_grid(&mut self, on: bool) {
        self.show_grid = on;
    }

    pub fn fields(&self) -> &[TextNode] {
        &self.nodes
    }

    pub fn field(&self, id: &str) -> Option<&TextNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn field_mut(&mut self, id: &str) -> Result<&mut TextNode> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| PrintError::Editor(EditorError::UnknownField(id.to_string())))
    }

    /// Canvas-pixel position of a field's anchor at the current DPI.
    pub fn field_position_px(&self, id: &str) -> Option<(f32, f32)> {
        self.field(id).map(|n| n.anchor_px(self.dpi as f32))
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn select(&mut self, id: &str) -> Result<()> {
        if self.field(id).is_none() {
            return Err(EditorError::UnknownField(id.to_string()).into());
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Snapshot of the selected element for the property panel.
    pub fn inspector(&self) -> Option<Inspector> {
        let id = self.selected.as_deref()?;
        self.field(id).map(|n| Inspector::of(n, self.dpi as f32))
    }

    fn selected_mut(&mut self) -> Result<&mut TextNode> {
        self.require_template()?;
        let id = self
            .selected
            .clone()
            .ok_or(PrintError::Editor(EditorError::NothingSelected))?;
        self.field_mut(&id)
    }

    /// Topmost element under a canvas point. Later elements draw on top.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&TextNode> {
        let dpi = self.dpi as f32;
        self.nodes
            .iter()
            .rev()
            .find(|n| n.bounds_px(dpi, &self.font).contains(x, y))
    }

    // ------------------------------------------------------------------
    // Direct manipulation
    // ------------------------------------------------------------------

    /// Press at a canvas point: select the element under it and start
    /// dragging. Pressing empty canvas clears the selection.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Result<Option<String>> {
        self.require_template()?;
        let hit = self.hit_test(x, y).map(|n| n.id.clone());
        match &hit {
            Some(id) => {
                self.selected = Some(id.clone());
                self.drag = Some(DragState {
                    id: id.clone(),
                    last: (x, y),
                });
            }
            None => {
                self.selected = None;
                self.drag = None;
            }
        }
        Ok(hit)
    }

    /// Move the dragged element with the pointer. Only that element moves.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Result<()> {
        let Some(drag) = self.drag.clone() else {
            return Ok(());
        };
        let dpi = self.dpi as f32;
        let node = self.field_mut(&drag.id)?;
        node.translate_px(x - drag.last.0, y - drag.last.1, dpi);
        self.drag = Some(DragState {
            id: drag.id,
            last: (x, y),
        });
        Ok(())
    }

    pub fn pointer_up(&mut self) {
        if let Some(drag) = self.drag.take() {
            if let Some(node) = self.field(&drag.id) {
                debug!("Moved {} to ({:.2}, {:.2}) mm", node.id, node.x_mm, node.y_mm);
            }
        }
    }

    /// Drag a field by a pixel delta, as a press/move/release on its anchor.
    pub fn drag_field(&mut self, id: &str, dx: f32, dy: f32) -> Result<()> {
        self.require_template()?;
        let (x, y) = self
            .field_position_px(id)
            .ok_or_else(|| PrintError::Editor(EditorError::UnknownField(id.to_string())))?;
        self.selected = Some(id.to_string());
        self.drag = Some(DragState {
            id: id.to_string(),
            last: (x, y),
        });
        self.pointer_move(x + dx, y + dy)?;
        self.pointer_up();
        Ok(())
    }

    /// Move the selected field by a millimeter delta.
    pub fn nudge_selected(&mut self, dx_mm: f32, dy_mm: f32) -> Result<()> {
        let node = self.selected_mut()?;
        node.x_mm += dx_mm;
        node.y_mm += dy_mm;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Property edits on the selection
    // ------------------------------------------------------------------

    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.selected_mut()?.text = text.to_string();
        Ok(())
    }

    /// Returns the applied size after clamping.
    pub fn set_font_size(&mut self, size: u32) -> Result<u32> {
        let size = size.clamp(*FONT_SIZE_RANGE.start(), *FONT_SIZE_RANGE.end());
        self.selected_mut()?.font_size = size;
        Ok(size)
    }

    /// Set the wrap width in canvas pixels; `None` or a non-positive width
    /// means auto.
    pub fn set_text_width_px(&mut self, width: Option<f32>) -> Result<()> {
        let dpi = self.dpi as f32;
        let node = self.selected_mut()?;
        node.text_width = match width {
            Some(px) if px > 0.0 => TextWidth::Mm(to_mm(px, dpi)),
            _ => TextWidth::Auto,
        };
        Ok(())
    }

    // ------------------------------------------------------------------
    // Field set
    // ------------------------------------------------------------------

    /// Add a field at the fixed new-field position and select it.
    pub fn add_field(&mut self, id: &str, sample_text: &str) -> Result<()> {
        self.require_template()?;
        let id = id.trim();
        if id.is_empty() {
            return Err(EditorError::EmptyFieldId.into());
        }
        if self.field(id).is_some() {
            return Err(EditorError::DuplicateField(id.to_string()).into());
        }
        let dpi = self.dpi as f32;
        let layout = FieldLayout::at(to_mm(NEW_FIELD_POS_PX.0, dpi), to_mm(NEW_FIELD_POS_PX.1, dpi));
        let text = if sample_text.is_empty() { id } else { sample_text };
        self.nodes.push(TextNode::from_layout(
            id,
            &layout,
            text.to_string(),
            DEFAULT_POINT_SIZE as u32,
        ));
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn remove_field(&mut self, id: &str) -> Result<()> {
        self.require_template()?;
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| PrintError::Editor(EditorError::UnknownField(id.to_string())))?;
        self.nodes.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.drag.as_ref().is_some_and(|d| d.id == id) {
            self.drag = None;
        }
        Ok(())
    }

    pub fn remove_selected(&mut self) -> Result<String> {
        let id = self
            .selected
            .clone()
            .ok_or(PrintError::Editor(EditorError::NothingSelected))?;
        self.remove_field(&id)?;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Persistence and printing
    // ------------------------------------------------------------------

    /// The layout as it would be saved now.
    pub fn to_store(&self) -> CoordinateStore {
        CoordinateStore {
            image_path: self.template.as_ref().map(|t| t.path.clone()),
            dpi: self.dpi,
            page_size_mm: self.page_size_mm,
            fields: self
                .nodes
                .iter()
                .map(|n| (n.id.clone(), n.to_layout()))
                .collect(),
            ..CoordinateStore::default()
        }
    }

    /// Write the layout. On failure the editor state is unchanged and the
    /// save can be retried.
    pub fn save(&mut self) -> Result<CoordinateStore> {
        self.require_template()?;
        if self.nodes.is_empty() {
            warn!("Saving a layout with no fields");
        }
        let store = self.to_store();
        store.save(&self.coords_path)?;
        self.origin = StoreOrigin::Loaded;
        info!(
            "Coordinates saved to {} ({} fields)",
            self.coords_path.display(),
            store.fields.len()
        );
        Ok(store)
    }

    /// Save, then print the live record (not the preview text) with the
    /// saved layout. Observers are told once the page is written.
    pub fn save_and_print(
        &mut self,
        target: &OutputTarget,
        options: &RenderOptions,
    ) -> Result<RenderReport> {
        let store = self.save()?;
        let report = print_to_target(target, &self.record, &store, options)?;
        for observer in self.print_observers.iter_mut() {
            observer(&report);
        }
        Ok(report)
    }

    /// Register a callback fired after every successful save-and-print.
    pub fn on_print_completed<F>(&mut self, observer: F)
    where
        F: FnMut(&RenderReport) + 'static,
    {
        self.print_observers.push(Box::new(observer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UNIT_MILLIMETERS;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        template: String,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let template = dir.path().join("template.png");
            ::image::RgbImage::from_pixel(794, 1123, ::image::Rgb([250, 250, 240]))
                .save(&template)
                .unwrap();
            Self {
                template: template.to_string_lossy().into_owned(),
                dir,
            }
        }

        fn coords(&self) -> PathBuf {
            self.dir.path().join("coordinates.json")
        }

        fn write_coords(&self, json: &str) {
            std::fs::write(self.coords(), json).unwrap();
        }

        fn open(&self, record: &[(&str, &str)]) -> LayoutEditor {
            LayoutEditor::open(EditorConfig {
                template_path: Some(self.template.clone()),
                coords_path: self.coords(),
                record: record.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                font: PageFont::Bitmap,
            })
            .unwrap()
        }
    }

    const GROOM_AT_300: &str = r#"{
        "dpi": 300,
        "fields": {
            "groom_name": {"x_mm": 35.0, "y_mm": 78.0, "font_size": 12, "text": "sample", "text_width": -1}
        }
    }"#;

    #[test]
    fn test_fresh_editor_seeds_defaults() {
        let fx = Fixture::new();
        let editor = fx.open(&[]);
        assert_eq!(editor.origin(), StoreOrigin::Defaults);
        assert!(editor.field("Bridegroom").is_some());
        assert!(editor.template().is_some());
    }

    #[test]
    fn test_loaded_fields_show_record_values() {
        let fx = Fixture::new();
        fx.write_coords(GROOM_AT_300);
        let editor = fx.open(&[("groom_name", "Ahmed Ali"), ("qazi_name", "Qazi X")]);
        assert_eq!(editor.origin(), StoreOrigin::Loaded);
        assert_eq!(editor.dpi(), 300);
        assert_eq!(editor.field("groom_name").unwrap().text, "Ahmed Ali");

        // Unpositioned record values are stacked at the default column
        let (x, y) = editor.field_position_px("qazi_name").unwrap();
        assert!((x - NEW_FIELD_POS_PX.0).abs() < 1e-3);
        assert!((y - NEW_FIELD_POS_PX.1).abs() < 1e-3);
    }

    #[test]
    fn test_preview_text_used_without_record_value() {
        let fx = Fixture::new();
        fx.write_coords(GROOM_AT_300);
        let editor = fx.open(&[]);
        assert_eq!(editor.field("groom_name").unwrap().text, "sample");
    }

    #[test]
    fn test_dpi_change_keeps_millimeters() {
        let fx = Fixture::new();
        fx.write_coords(GROOM_AT_300);
        let mut editor = fx.open(&[]);
        let before = editor.field_position_px("groom_name").unwrap();

        assert_eq!(editor.set_dpi(150), 150);
        let after = editor.field_position_px("groom_name").unwrap();
        assert!((after.0 - before.0 / 2.0).abs() < 1e-3);
        let node = editor.field("groom_name").unwrap();
        assert_eq!((node.x_mm, node.y_mm), (35.0, 78.0));

        assert_eq!(editor.set_dpi(10_000), 600);
        assert_eq!(editor.set_dpi(1), 72);
    }

    #[test]
    fn test_drag_moves_only_the_grabbed_field() {
        let fx = Fixture::new();
        let mut editor = fx.open(&[]);
        editor.set_dpi(254);
        let before: Vec<_> = editor.fields().to_vec();

        let (x, y) = editor.field_position_px("RegNo").unwrap();
        let hit = editor.pointer_down(x + 2.0, y - 2.0).unwrap();
        assert_eq!(hit.as_deref(), Some("RegNo"));
        editor.pointer_move(x + 12.0, y + 8.0).unwrap();
        editor.pointer_move(x + 22.0, y + 18.0).unwrap();
        editor.pointer_up();

        let moved = editor.field("RegNo").unwrap().clone();
        let original = before.iter().find(|n| n.id == "RegNo").unwrap();
        // 20px at 254 dpi is 2mm
        assert!((moved.x_mm - (original.x_mm + 2.0)).abs() < 1e-3);
        assert!((moved.y_mm - (original.y_mm + 2.0)).abs() < 1e-3);
        for node in editor.fields().iter().filter(|n| n.id != "RegNo") {
            assert_eq!(Some(node), before.iter().find(|n| n.id == node.id));
        }

        // Moving after release does nothing
        editor.pointer_move(0.0, 0.0).unwrap();
        assert_eq!(editor.field("RegNo").unwrap(), &moved);
    }

    #[test]
    fn test_click_on_empty_canvas_clears_selection() {
        let fx = Fixture::new();
        let mut editor = fx.open(&[]);
        editor.select("SrNo").unwrap();
        assert_eq!(editor.pointer_down(790.0, 1120.0).unwrap(), None);
        assert_eq!(editor.selected_id(), None);
    }

    #[test]
    fn test_inspector_edits_apply_to_selection() {
        let fx = Fixture::new();
        let mut editor = fx.open(&[]);
        editor.select("MasjidName").unwrap();
        editor.set_text("Masjid Ahle Hadees").unwrap();
        assert_eq!(editor.set_font_size(100).unwrap(), 72);
        editor.set_text_width_px(Some(96.0)).unwrap();

        let inspector = editor.inspector().unwrap();
        assert_eq!(inspector.id, "MasjidName");
        assert_eq!(inspector.text, "Masjid Ahle Hadees");
        assert_eq!(inspector.font_size, 72);
        assert!((inspector.width_px.unwrap() - 96.0).abs() < 1e-3);

        editor.set_text_width_px(None).unwrap();
        assert_eq!(editor.field("MasjidName").unwrap().text_width, TextWidth::Auto);
    }

    #[test]
    fn test_edits_without_selection_are_refused() {
        let fx = Fixture::new();
        let mut editor = fx.open(&[]);
        let err = editor.set_text("x").unwrap_err();
        assert!(matches!(err, PrintError::Editor(EditorError::NothingSelected)));
    }

    #[test]
    fn test_add_field_rejects_duplicates() {
        let fx = Fixture::new();
        let mut editor = fx.open(&[]);
        editor.add_field("qazi_name", "Qazi X").unwrap();
        assert_eq!(editor.selected_id(), Some("qazi_name"));
        let (x, y) = editor.field_position_px("qazi_name").unwrap();
        assert!((x - 50.0).abs() < 1e-3 && (y - 50.0).abs() < 1e-3);

        let err = editor.add_field("qazi_name", "again").unwrap_err();
        assert!(matches!(err, PrintError::Editor(EditorError::DuplicateField(_))));
        let err = editor.add_field("  ", "x").unwrap_err();
        assert!(matches!(err, PrintError::Editor(EditorError::EmptyFieldId)));
    }

    #[test]
    fn test_remove_selected_field() {
        let fx = Fixture::new();
        let mut editor = fx.open(&[]);
        editor.select("SrNo").unwrap();
        assert_eq!(editor.remove_selected().unwrap(), "SrNo");
        assert!(editor.field("SrNo").is_none());
        assert_eq!(editor.selected_id(), None);
        assert!(!editor.to_store().fields.contains_key("SrNo"));
    }

    #[test]
    fn test_no_template_blocks_editing() {
        let fx = Fixture::new();
        let mut editor = LayoutEditor::open(EditorConfig {
            template_path: Some(fx.dir.path().join("missing.png").to_string_lossy().into_owned()),
            coords_path: fx.coords(),
            record: PrintRecord::new(),
            font: PageFont::Bitmap,
        })
        .unwrap();
        assert!(editor.template().is_none());
        for err in [
            editor.add_field("x", "y").unwrap_err(),
            editor.save().unwrap_err(),
            editor.pointer_down(1.0, 1.0).unwrap_err(),
        ] {
            assert!(matches!(err, PrintError::Editor(EditorError::NoTemplate)));
        }
        assert!(!fx.coords().exists());

        editor.load_template(&fx.template).unwrap();
        editor.save().unwrap();
        assert!(fx.coords().exists());
    }

    #[test]
    fn test_save_writes_millimeters_at_current_dpi() {
        let fx = Fixture::new();
        let mut editor = fx.open(&[]);
        editor.set_dpi(300);
        editor.add_field("qazi_name", "Qazi X").unwrap();
        editor.drag_field("qazi_name", 300.0, 600.0).unwrap();
        editor.save().unwrap();

        let saved = CoordinateStore::load(&fx.coords()).unwrap();
        assert_eq!(saved.dpi, 300);
        assert_eq!(saved.unit, UNIT_MILLIMETERS);
        assert_eq!(saved.image_path.as_deref(), Some(fx.template.as_str()));
        let qazi = &saved.fields["qazi_name"];
        assert!((qazi.x_mm - to_mm(350.0, 300.0)).abs() < 1e-3);
        assert!((qazi.y_mm - to_mm(650.0, 300.0)).abs() < 1e-3);
        assert_eq!(qazi.text, "Qazi X");
        assert_eq!(qazi.font_size, Some(DEFAULT_POINT_SIZE as u32));
    }

    #[test]
    fn test_failed_save_keeps_state() {
        let fx = Fixture::new();
        let mut editor = LayoutEditor::open(EditorConfig {
            template_path: Some(fx.template.clone()),
            coords_path: fx.dir.path().join("missing-dir").join("coordinates.json"),
            record: PrintRecord::new(),
            font: PageFont::Bitmap,
        })
        .unwrap();
        editor.add_field("qazi_name", "Qazi X").unwrap();
        let before = editor.to_store();
        assert!(matches!(editor.save().unwrap_err(), PrintError::Io(_)));
        assert_eq!(editor.to_store(), before);
        assert_eq!(editor.origin(), StoreOrigin::Defaults);
    }

    #[test]
    fn test_save_and_print_uses_record_and_notifies() {
        let fx = Fixture::new();
        fx.write_coords(GROOM_AT_300);
        let mut editor = fx.open(&[("groom_name", "Ahmed Ali")]);
        editor.select("groom_name").unwrap();
        editor.set_text("PREVIEW ONLY").unwrap();

        let completed = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&completed);
        editor.on_print_completed(move |_| *counter.borrow_mut() += 1);

        let target = OutputTarget {
            path: fx.dir.path().join("certificate.png"),
            raster_dpi: 50.0,
            font: PageFont::Bitmap,
        };
        let report = editor.save_and_print(&target, &RenderOptions::default()).unwrap();

        assert_eq!(report.field("groom_name").unwrap().lines, vec!["Ahmed Ali".to_string()]);
        assert!(target.path.exists());
        assert_eq!(*completed.borrow(), 1);
        let saved = CoordinateStore::load(&fx.coords()).unwrap();
        assert_eq!(saved.fields["groom_name"].text, "PREVIEW ONLY");
    }
}
