// nikahnama-print: calibrate and print Nikahnama certificate fields onto a
// preprinted template

use chrono::Local;
use clap::{Args as ClapArgs, Parser, Subcommand};
use log::{info, warn};
use nikahnama_print::editor::shell::{self, ShellPrint};
use nikahnama_print::mapper::{self, PrintRecord, Record};
use nikahnama_print::settings::{PrintSettings, DEFAULT_SETTINGS_FILE};
use nikahnama_print::{
    print_to_target, CoordinateStore, EditorConfig, LayoutEditor, OutputTarget, PageFont,
    PrintError,
};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_COORDS_FILE: &str = "coordinates.json";
const DEFAULT_SNAPSHOT_FILE: &str = "layout-preview.png";

/// Record key used to name the output file.
const SERIAL_KEY: &str = "serial_no";

// ============================================================================
// Data Structures
// ============================================================================

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Calibrate and print Nikahnama certificates on a preprinted template")]
struct Args {
    /// Coordinates file holding the calibrated layout
    #[arg(short, long, global = true, default_value = DEFAULT_COORDS_FILE)]
    coords: PathBuf,

    /// Remembered print options
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Log debug detail (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a record onto the calibrated layout (PDF or PNG)
    Print(PrintArgs),
    /// Calibrate field positions against the template
    Edit(EditArgs),
    /// Show the print record built from a form record
    Map {
        /// Record file (JSON object)
        record: PathBuf,

        /// Treat the input as print fields and map back to form keys
        #[arg(long)]
        reverse: bool,
    },
    /// Write a starter coordinates file from the built-in defaults
    Init {
        /// Template image (file path or URL) to remember in the layout
        #[arg(long)]
        template: Option<String>,

        /// Resolution the layout is edited at
        #[arg(long)]
        dpi: Option<u32>,

        /// Overwrite an existing coordinates file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct RecordArgs {
    /// Input already uses print field ids; skip the field mapping
    #[arg(long)]
    print_fields: bool,

    /// TrueType font used for text (defaults to the bundled faces)
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct PrintArgs {
    /// Record file (JSON object)
    record: PathBuf,

    /// Output file, .pdf or .png (defaults to certificate-{serial}-{date}.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    input: RecordArgs,

    /// Template image (file path or URL) for the watermark
    #[arg(long)]
    template: Option<String>,

    /// Draw the faded template behind the text
    #[arg(long, conflicts_with = "hide_template")]
    show_template: bool,

    /// Plain white background
    #[arg(long)]
    hide_template: bool,

    /// Draw the 10 mm calibration grid
    #[arg(long, conflicts_with = "no_grid")]
    grid: bool,

    /// No calibration grid
    #[arg(long)]
    no_grid: bool,

    /// Shift every field right by this many millimeters
    #[arg(long, allow_hyphen_values = true)]
    offset_x: Option<f32>,

    /// Shift every field down by this many millimeters
    #[arg(long, allow_hyphen_values = true)]
    offset_y: Option<f32>,

    /// Resolution of PNG output
    #[arg(long)]
    dpi: Option<f32>,

    /// Font family for PDF built-in faces
    #[arg(long)]
    font_family: Option<String>,

    /// Point size for fields without one
    #[arg(long)]
    font_size: Option<f32>,

    /// Save these options as the new defaults
    #[arg(long)]
    remember: bool,
}

#[derive(ClapArgs, Debug)]
struct EditArgs {
    /// Template image (file path or URL)
    #[arg(long)]
    template: Option<String>,

    /// Record whose values are shown as preview text and printed
    #[arg(long)]
    record: Option<PathBuf>,

    #[command(flatten)]
    input: RecordArgs,

    /// Read editor commands from a file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Default path for the snapshot command
    #[arg(long, default_value = DEFAULT_SNAPSHOT_FILE)]
    snapshot: PathBuf,

    /// Default output for the print command
    #[arg(short, long)]
    output: Option<PathBuf>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), PrintError> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Print(print) => run_print(&args.coords, &args.settings, print),
        Command::Edit(edit) => run_edit(&args.coords, &args.settings, edit),
        Command::Map { record, reverse } => run_map(&record, reverse),
        Command::Init {
            template,
            dpi,
            force,
        } => run_init(&args.coords, template, dpi, force),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_print(coords: &Path, settings_path: &Path, args: PrintArgs) -> Result<(), PrintError> {
    let settings = effective_settings(settings_path, &args)?;
    let (raw, record) = load_print_record(&args.record, args.input.print_fields)?;
    let store = CoordinateStore::load_for_print(coords)?;

    let mut options = settings.render_options();
    if options.template_path.is_none() {
        options.template_path = store.image_path.clone();
    }

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(default_output_name(&record_serial(&raw, &record))));
    let target = OutputTarget {
        path: output,
        raster_dpi: settings.dpi,
        font: PageFont::load(args.input.font.as_deref())?,
    };

    let report = print_to_target(&target, &record, &store, &options)?;
    if args.remember {
        settings.save(settings_path)?;
        info!("Print options saved to {}", settings_path.display());
    }

    println!("✓ Generated: {}", target.path.display());
    println!("  Fields printed: {}", report.placed.len());
    if !report.skipped.is_empty() {
        println!("  Skipped (no value): {}", report.skipped.join(", "));
    }
    if options.show_template && !report.template_drawn {
        println!("  Template watermark unavailable; printed on white");
    }

    Ok(())
}

fn run_edit(coords: &Path, settings_path: &Path, args: EditArgs) -> Result<(), PrintError> {
    let settings = PrintSettings::load_or_default(settings_path)?;
    let record = match &args.record {
        Some(path) => load_print_record(path, args.input.print_fields)?.1,
        None => PrintRecord::new(),
    };
    let font = PageFont::load(args.input.font.as_deref())?;

    let mut editor = LayoutEditor::open(EditorConfig {
        template_path: args.template.or_else(|| settings.template_path.clone()),
        coords_path: coords.to_path_buf(),
        record,
        font: font.clone(),
    })?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(default_output_name(&serial_of(editor.record()))));
    let mut options = settings.render_options();
    if options.template_path.is_none() {
        options.template_path = editor.template().map(|t| t.path.clone());
    }
    let session = ShellPrint {
        target: OutputTarget {
            path: output,
            raster_dpi: settings.dpi,
            font,
        },
        options,
        snapshot_path: args.snapshot,
    };

    editor.on_print_completed(|report| {
        info!(
            "Print completed: {} field(s), {} skipped",
            report.placed.len(),
            report.skipped.len()
        );
    });

    match &args.script {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| PrintError::NotFound(format!("script {}: {}", path.display(), e)))?;
            shell::run(&mut editor, BufReader::new(file), &mut io::stdout().lock(), &session)
        }
        None => {
            println!(
                "Layout editor: {} field(s) at {} dpi. Type 'help' for commands.",
                editor.fields().len(),
                editor.dpi()
            );
            shell::run(&mut editor, io::stdin().lock(), &mut io::stdout().lock(), &session)
        }
    }
}

fn run_map(path: &Path, reverse: bool) -> Result<(), PrintError> {
    let input = mapper::load_record(path)?;
    let output: Record = if reverse {
        mapper::map_print_to_form(&input)
    } else {
        mapper::map_form_to_print(&input)
    };
    let json =
        serde_json::to_string_pretty(&output).map_err(|e| PrintError::Malformed(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn run_init(
    coords: &Path,
    template: Option<String>,
    dpi: Option<u32>,
    force: bool,
) -> Result<(), PrintError> {
    if coords.exists() && !force {
        return Err(PrintError::Configuration(format!(
            "{} already exists (use --force to overwrite)",
            coords.display()
        )));
    }
    let mut store = CoordinateStore::with_defaults();
    store.image_path = template;
    if let Some(dpi) = dpi {
        store.dpi = dpi;
    }
    store.save(coords)?;

    println!("✓ Generated: {}", coords.display());
    println!("  Fields: {}", store.fields.keys().cloned().collect::<Vec<_>>().join(", "));
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Remembered settings with this run's flags applied on top.
fn effective_settings(path: &Path, args: &PrintArgs) -> Result<PrintSettings, PrintError> {
    let mut settings = PrintSettings::load_or_default(path)?;
    if let Some(template) = &args.template {
        settings.template_path = Some(template.clone());
    }
    if args.show_template {
        settings.show_template = true;
    }
    if args.hide_template {
        settings.show_template = false;
    }
    if args.grid {
        settings.show_grid = true;
    }
    if args.no_grid {
        settings.show_grid = false;
    }
    if let Some(x) = args.offset_x {
        settings.offset_x_mm = x;
    }
    if let Some(y) = args.offset_y {
        settings.offset_y_mm = y;
    }
    if let Some(dpi) = args.dpi {
        settings.dpi = dpi;
    }
    if let Some(family) = &args.font_family {
        settings.font_family = family.clone();
    }
    if let Some(size) = args.font_size {
        settings.default_pt = size;
    }
    settings.validate()?;
    Ok(settings)
}

/// The record as read, and the print record built from it.
fn load_print_record(path: &Path, print_fields: bool) -> Result<(Record, PrintRecord), PrintError> {
    let record = mapper::load_record(path)?;
    if print_fields {
        return Ok((record.clone(), record));
    }
    let mapped = mapper::map_form_to_print(&record);
    if mapped.is_empty() && !record.is_empty() {
        warn!(
            "No known form fields in {}; pass --print-fields if it already uses print ids",
            path.display()
        );
    }
    Ok((record, mapped))
}

/// Serial number for the output name, from the raw record when available.
fn record_serial(raw: &Record, print: &PrintRecord) -> String {
    raw.get(SERIAL_KEY)
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| serial_of(print))
}

fn serial_of(print: &PrintRecord) -> String {
    print
        .get("SrNo")
        .or_else(|| print.get(SERIAL_KEY))
        .cloned()
        .unwrap_or_default()
}

fn default_output_name(serial: &str) -> String {
    let sanitized = serial
        .trim()
        .replace(['/', ' '], "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect::<String>();
    let serial = if sanitized.is_empty() { "0000".to_string() } else { sanitized };
    format!("certificate-{}-{}.pdf", serial, Local::now().format("%Y-%m-%d"))
}
