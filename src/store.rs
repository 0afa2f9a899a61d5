//! Coordinate Store: the persisted calibration of field positions.
//!
//! Millimeters are authoritative. The pixel values written alongside them
//! are a cache recomputed from millimeters at the store's DPI on every save
//! and never read back as a source of truth.

use crate::error::{PrintError, Result};
use crate::units::{to_px, PageSize};
use log::{debug, warn};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Index;
use std::path::Path;

pub const UNIT_MILLIMETERS: &str = "millimeters";

/// Resolution assumed when a store does not say which one it was captured at.
pub const DEFAULT_DPI: u32 = 96;

/// Seed positions (mm) offered when no store file exists yet.
const DEFAULT_FIELDS: &[(&str, f32, f32, Option<f32>)] = &[
    ("SrNo", 32.0, 30.0, None),
    ("RegNo", 150.0, 30.0, None),
    ("MasjidName", 25.0, 38.0, Some(160.0)),
    ("Bridegroom", 35.0, 78.0, None),
    ("GroomAddress", 35.0, 86.0, Some(165.0)),
];

/// Word-wrap constraint for a field, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TextWidth {
    /// Natural width; only explicit line breaks split the text.
    #[default]
    Auto,
    Mm(f32),
}

impl TextWidth {
    /// Any non-positive width means "auto".
    pub fn from_mm(value: f32) -> Self {
        if value > 0.0 {
            TextWidth::Mm(value)
        } else {
            TextWidth::Auto
        }
    }

    pub fn as_mm(&self) -> Option<f32> {
        match self {
            TextWidth::Auto => None,
            TextWidth::Mm(mm) => Some(*mm),
        }
    }
}

impl Serialize for TextWidth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f32(self.as_mm().unwrap_or(-1.0))
    }
}

impl<'de> Deserialize<'de> for TextWidth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f32),
            Word(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(TextWidth::from_mm(n)),
            Raw::Word(w) if w.eq_ignore_ascii_case("auto") => Ok(TextWidth::Auto),
            Raw::Word(w) => Err(serde::de::Error::custom(format!(
                "text_width must be a number or \"auto\", got {:?}",
                w
            ))),
        }
    }
}

/// Position and styling of one printable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub x_mm: f32,
    pub y_mm: f32,
    #[serde(default)]
    pub x_pixels: f32,
    #[serde(default)]
    pub y_pixels: f32,
    /// Preview text shown in the editor. Never printed.
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub text_width: TextWidth,
}

impl FieldLayout {
    pub fn at(x_mm: f32, y_mm: f32) -> Self {
        Self {
            x_mm,
            y_mm,
            x_pixels: 0.0,
            y_pixels: 0.0,
            text: String::new(),
            font_size: None,
            text_width: TextWidth::Auto,
        }
    }

    fn refresh_pixel_cache(&mut self, dpi: f32) {
        self.x_pixels = to_px(self.x_mm, dpi);
        self.y_pixels = to_px(self.y_mm, dpi);
    }
}

/// Field layouts keyed by field id, kept in insertion (file) order. The
/// order is also the editor's stacking order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<Entry>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key == id)
    }

    /// Replaces an existing entry in place; new ids go last.
    pub fn insert(&mut self, id: String, layout: FieldLayout) -> Option<FieldLayout> {
        match self.position(&id) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, layout)),
            None => {
                self.entries.push((id, layout));
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&FieldLayout> {
        self.position(id).map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut FieldLayout> {
        self.position(id).map(move |i| &mut self.entries[i].1)
    }

    pub fn remove(&mut self, id: &str) -> Option<FieldLayout> {
        self.position(id).map(|i| self.entries.remove(i).1)
    }

    pub fn contains_key(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldLayout)> {
        self.entries.iter().map(split_entry)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|(id, _)| id)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut FieldLayout> {
        self.entries.iter_mut().map(|(_, layout)| layout)
    }
}

impl Index<&str> for FieldMap {
    type Output = FieldLayout;

    fn index(&self, id: &str) -> &FieldLayout {
        match self.get(id) {
            Some(layout) => layout,
            None => panic!("no field {:?} in layout", id),
        }
    }
}

type Entry = (String, FieldLayout);

fn split_entry(entry: &Entry) -> (&String, &FieldLayout) {
    (&entry.0, &entry.1)
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = (&'a String, &'a FieldLayout);
    type IntoIter =
        std::iter::Map<std::slice::Iter<'a, Entry>, fn(&'a Entry) -> (&'a String, &'a FieldLayout)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .iter()
            .map(split_entry as fn(&'a Entry) -> (&'a String, &'a FieldLayout))
    }
}

impl FromIterator<(String, FieldLayout)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, FieldLayout)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (id, layout) in iter {
            map.insert(id, layout);
        }
        map
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of field layouts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<FieldMap, A::Error> {
                let mut map = FieldMap::new();
                while let Some((id, layout)) = access.next_entry::<String, FieldLayout>()? {
                    map.insert(id, layout);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateStore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size_mm: Option<[f32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    #[serde(default)]
    pub fields: FieldMap,
}

fn default_dpi() -> u32 {
    DEFAULT_DPI
}

fn default_unit() -> String {
    UNIT_MILLIMETERS.to_string()
}

impl Default for CoordinateStore {
    fn default() -> Self {
        Self {
            image_path: None,
            dpi: DEFAULT_DPI,
            unit: default_unit(),
            page_size_mm: None,
            saved_at: None,
            fields: FieldMap::new(),
        }
    }
}

/// Where the editor's starting layout came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOrigin {
    Loaded,
    /// No file yet; built-in seed fields.
    Defaults,
    /// A file existed but was unusable or empty; built-in seed fields.
    Recovered,
}

impl CoordinateStore {
    /// Small built-in seed layout so a fresh editor has something to drag.
    pub fn with_defaults() -> Self {
        let fields = DEFAULT_FIELDS
            .iter()
            .map(|&(id, x, y, width)| {
                let mut layout = FieldLayout::at(x, y);
                layout.text = id.to_string();
                layout.text_width = width.map(TextWidth::Mm).unwrap_or_default();
                (id.to_string(), layout)
            })
            .collect();
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PrintError::NotFound(format!(
                "coordinates file {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let store: CoordinateStore = serde_json::from_str(&content)
            .map_err(|e| PrintError::Malformed(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded {} field(s) from {}", store.fields.len(), path.display());
        Ok(store)
    }

    /// Load the store a print job depends on. A missing file means the
    /// layout was never calibrated, which blocks printing.
    pub fn load_for_print(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(PrintError::NotFound(_)) => Err(PrintError::Configuration(format!(
                "layout not configured, coordinates file {} not found. Please calibrate the layout first",
                path.display()
            ))),
            other => other,
        }
    }

    /// Load the store the editor starts from, falling back to the seed
    /// layout when the file is missing, unparsable or has no fields.
    pub fn load_or_default(path: &Path) -> Result<(Self, StoreOrigin)> {
        match Self::load(path) {
            Ok(store) if store.fields.is_empty() => {
                warn!("{} has no fields; starting from defaults", path.display());
                Ok((
                    Self {
                        dpi: store.dpi,
                        image_path: store.image_path,
                        page_size_mm: store.page_size_mm,
                        ..Self::with_defaults()
                    },
                    StoreOrigin::Recovered,
                ))
            }
            Ok(store) => Ok((store, StoreOrigin::Loaded)),
            Err(PrintError::NotFound(_)) => Ok((Self::with_defaults(), StoreOrigin::Defaults)),
            Err(PrintError::Malformed(reason)) => {
                warn!("Could not load coordinates ({}); starting from defaults", reason);
                Ok((Self::with_defaults(), StoreOrigin::Recovered))
            }
            Err(e) => Err(e),
        }
    }

    /// Write the full store, overwriting any existing file. The in-memory
    /// store is untouched; the written copy carries a fresh pixel cache and
    /// timestamp.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut persisted = self.clone();
        let dpi = persisted.dpi as f32;
        for layout in persisted.fields.values_mut() {
            layout.refresh_pixel_cache(dpi);
        }
        persisted.unit = default_unit();
        persisted.saved_at = Some(chrono::Local::now().to_rfc3339());

        let json = serde_json::to_string_pretty(&persisted)
            .map_err(|e| PrintError::Malformed(e.to_string()))?;
        std::fs::write(path, json)?;
        debug!("Saved {} field(s) to {}", persisted.fields.len(), path.display());
        Ok(())
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size_mm.map(PageSize::from).unwrap_or_default()
    }
}
