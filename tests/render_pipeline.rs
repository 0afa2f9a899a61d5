use nikahnama_print::mapper::{map_form_to_print, parse_record};
use nikahnama_print::{
    print_from_coordinates, render_certificate, CoordinateStore, FieldLayout, OutputTarget,
    PageFont, RenderOptions, TextWidth,
};
use nikahnama_print::render::RasterDevice;
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn form_record() -> nikahnama_print::Record {
    parse_record(
        r#"{
            "serial_no": 163,
            "masjid_name": "Masjid Ahle Hadees,   Kurla",
            "groom_name": "Ahmed Ali",
            "groom_father": "Ishaque",
            "groom_age": "27",
            "groom_address": "Room 4, Building 12\nLBS Marg, Kurla West",
            "bride_name": "Ayesha",
            "bride_father": "Khan",
            "qazi_name": "Qazi X"
        }"#,
    )
    .unwrap()
}

fn calibrated_store() -> CoordinateStore {
    let mut store = CoordinateStore::with_defaults();
    let mut bride = FieldLayout::at(35.0, 120.0);
    bride.font_size = Some(12);
    store.fields.insert("bride_name_only".into(), bride);
    store
}

#[test]
fn test_form_record_prints_at_calibrated_positions() {
    init_logging();
    let print = map_form_to_print(&form_record());
    let store = calibrated_store();

    let mut device = RasterDevice::new(150.0, PageFont::Bitmap);
    let report = render_certificate(&mut device, &print, &store, &RenderOptions::default()).unwrap();

    assert_eq!(report.field("SrNo").unwrap().lines, vec!["163".to_string()]);
    assert_eq!(
        report.field("bride_name_only").unwrap().lines,
        vec!["Ayesha d/o Khan".to_string()]
    );
    assert_eq!(
        report.field("MasjidName").unwrap().lines,
        vec!["Masjid Ahle Hadees, Kurla".to_string()]
    );
    // Two explicit lines, neither one wider than the 165 mm box
    assert_eq!(
        report.field("GroomAddress").unwrap().lines,
        vec!["Room 4, Building 12".to_string(), "LBS Marg, Kurla West".to_string()]
    );
    // The store never placed the qazi, so it is neither drawn nor skipped
    assert!(report.field("QaziNameSeal").is_none());
    assert!(!report.skipped.contains(&"QaziNameSeal".to_string()));
    assert_eq!(report.skipped, vec!["RegNo".to_string()]);
}

#[test]
fn test_narrow_box_wraps_composite() {
    init_logging();
    let print = map_form_to_print(&form_record());
    let mut store = CoordinateStore::default();
    let mut groom = FieldLayout::at(35.0, 78.0);
    groom.text_width = TextWidth::Mm(40.0);
    store.fields.insert("Bridegroom".into(), groom);

    let mut device = RasterDevice::new(150.0, PageFont::Bitmap);
    let report = render_certificate(&mut device, &print, &store, &RenderOptions::default()).unwrap();
    let lines = &report.field("Bridegroom").unwrap().lines;
    assert!(lines.len() > 1, "{:?}", lines);
    assert_eq!(lines.join(" ").replace('\n', " "), print["Bridegroom"].replace('\n', " "));
}

#[test]
fn test_saved_layout_prints_to_pdf_and_png() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let coords = dir.path().join("coordinates.json");
    calibrated_store().save(&coords).unwrap();
    let print = map_form_to_print(&form_record());

    for name in ["certificate.pdf", "certificate.png"] {
        let target = OutputTarget {
            path: dir.path().join(name),
            raster_dpi: 72.0,
            font: PageFont::Bitmap,
        };
        let report = print_from_coordinates(&coords, &target, &print, &RenderOptions::default()).unwrap();
        assert!(target.path.exists(), "{} missing", name);
        assert_eq!(report.placed.len(), 5);
    }
}
