//! Remembered print options, persisted between runs.

use crate::error::{PrintError, Result};
use crate::render::{RenderOptions, DEFAULT_FONT_FAMILY, DEFAULT_POINT_SIZE};
use crate::units::check_dpi;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SETTINGS_FILE: &str = "print-settings.json";
pub const DEFAULT_RASTER_DPI: f32 = 150.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintSettings {
    pub template_path: Option<String>,
    pub show_template: bool,
    pub show_grid: bool,
    pub offset_x_mm: f32,
    pub offset_y_mm: f32,
    /// Resolution of PNG output.
    pub dpi: f32,
    pub font_family: String,
    pub default_pt: f32,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            template_path: None,
            show_template: false,
            show_grid: false,
            offset_x_mm: 0.0,
            offset_y_mm: 0.0,
            dpi: DEFAULT_RASTER_DPI,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            default_pt: DEFAULT_POINT_SIZE,
        }
    }
}

impl PrintSettings {
    /// Missing file gives defaults; an unreadable one gives defaults and a
    /// warning. A readable file with an out-of-range DPI is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<PrintSettings>(&content) {
            Ok(settings) => {
                settings.validate().map_err(|e| match e {
                    PrintError::Configuration(reason) => {
                        PrintError::Configuration(format!("{}: {}", path.display(), reason))
                    }
                    other => other,
                })?;
                Ok(settings)
            }
            Err(e) => {
                warn!("Ignoring malformed settings {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_dpi(self.dpi)?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| PrintError::Malformed(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            page_size: None,
            font_family: self.font_family.clone(),
            default_pt: self.default_pt,
            show_template: self.show_template,
            template_path: self.template_path.clone(),
            offset_x_mm: self.offset_x_mm,
            offset_y_mm: self.offset_y_mm,
            show_grid: self.show_grid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = PrintSettings::load_or_default(&dir.path().join("none.json")).unwrap();
        assert_eq!(settings, PrintSettings::default());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        let settings = PrintSettings {
            show_template: true,
            offset_x_mm: -1.5,
            offset_y_mm: 2.0,
            template_path: Some("data/nn_preprint_blank.png".into()),
            ..PrintSettings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(PrintSettings::load_or_default(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        std::fs::write(&path, r#"{"show_grid": true}"#).unwrap();
        let settings = PrintSettings::load_or_default(&path).unwrap();
        assert!(settings.show_grid);
        assert_eq!(settings.dpi, DEFAULT_RASTER_DPI);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        std::fs::write(&path, "show_grid = true").unwrap();
        assert_eq!(PrintSettings::load_or_default(&path).unwrap(), PrintSettings::default());
    }

    #[test]
    fn test_out_of_range_dpi_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        for dpi in ["1000000", "-150", "71"] {
            std::fs::write(&path, format!(r#"{{"dpi": {}}}"#, dpi)).unwrap();
            let err = PrintSettings::load_or_default(&path).unwrap_err();
            assert!(matches!(err, PrintError::Configuration(_)), "{}: {:?}", dpi, err);
        }
        std::fs::write(&path, r#"{"dpi": 600}"#).unwrap();
        assert_eq!(PrintSettings::load_or_default(&path).unwrap().dpi, 600.0);
    }

    #[test]
    fn test_render_options_carry_offsets() {
        let settings = PrintSettings {
            offset_x_mm: 3.0,
            show_grid: true,
            ..PrintSettings::default()
        };
        let options = settings.render_options();
        assert_eq!(options.offset_x_mm, 3.0);
        assert!(options.show_grid);
        assert_eq!(options.page_size, None);
    }
}
