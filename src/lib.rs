// nikahnama-print: calibrate and print Nikahnama certificate fields onto a
// preprinted template

pub mod editor;
pub mod error;
pub mod fonts;
pub mod mapper;
pub mod render;
pub mod settings;
pub mod store;
pub mod template;
pub mod text;
pub mod units;

pub use editor::{EditorConfig, LayoutEditor};
pub use error::{EditorError, PrintError, Result};
pub use fonts::PageFont;
pub use mapper::{map_form_to_print, map_print_to_form, PrintRecord, Record};
pub use render::{
    print_from_coordinates, print_to_target, render_certificate, OutputTarget, PageDevice,
    RenderOptions, RenderReport,
};
pub use settings::PrintSettings;
pub use store::{CoordinateStore, FieldLayout, FieldMap, StoreOrigin, TextWidth};
pub use units::{to_mm, to_px, PageSize};
