//! Line-oriented command loop driving a [`LayoutEditor`].
//!
//! Each input line is one command. A command that fails prints a warning and
//! the loop carries on, so a typo never throws away unsaved work.

use super::LayoutEditor;
use crate::error::Result;
use crate::render::{OutputTarget, RenderOptions};
use log::debug;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

const HELP: &str = "\
Commands:
  list                     show every field
  select <id>              select a field
  deselect                 clear the selection
  click <x> <y>            select whatever is under a canvas pixel
  press <x> <y>            start dragging the field under a canvas pixel
  move <x> <y>             drag to a canvas pixel
  release                  end the drag
  drag <id> <dx> <dy>      move a field by a pixel delta
  nudge <dx_mm> <dy_mm>    move the selection by millimeters
  text <text>              set preview text (\\n for a line break)
  font <pt>                set font size (6-72)
  width <px|auto>          set wrap width in canvas pixels
  dpi <value>              set display resolution (72-600)
  add <id> [sample]        add a field at the default position
  remove [id]              remove a field (default: the selection)
  grid <on|off>            toggle the 10 mm grid in snapshots
  template <path|url>      load a template image
  snapshot [file.png]      write a preview of the canvas
  save                     write the coordinates file
  print [file]             save, then print the record
  help                     show this text
  quit                     leave without saving";

#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    Help,
    List,
    Select(String),
    Deselect,
    Click(f32, f32),
    Press(f32, f32),
    Move(f32, f32),
    Release,
    Drag(String, f32, f32),
    Nudge(f32, f32),
    Text(String),
    Font(u32),
    Width(Option<f32>),
    Dpi(u32),
    Add(String, String),
    Remove(Option<String>),
    Grid(bool),
    Template(String),
    Snapshot(Option<PathBuf>),
    Save,
    Print(Option<PathBuf>),
    Quit,
}

fn number<T: FromStr>(arg: Option<&str>, what: &str) -> std::result::Result<T, String> {
    let raw = arg.ok_or_else(|| format!("missing {}", what))?;
    raw.parse()
        .map_err(|_| format!("invalid {}: {:?}", what, raw))
}

fn word(arg: Option<&str>, what: &str) -> std::result::Result<String, String> {
    arg.map(str::to_string)
        .ok_or_else(|| format!("missing {}", what))
}

impl FromStr for EditorCommand {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let mut args = rest.split_whitespace();

        let command = match name.to_ascii_lowercase().as_str() {
            "help" | "?" => EditorCommand::Help,
            "list" | "ls" => EditorCommand::List,
            "select" => EditorCommand::Select(word(args.next(), "field id")?),
            "deselect" => EditorCommand::Deselect,
            "click" => EditorCommand::Click(number(args.next(), "x")?, number(args.next(), "y")?),
            "press" => EditorCommand::Press(number(args.next(), "x")?, number(args.next(), "y")?),
            "move" => EditorCommand::Move(number(args.next(), "x")?, number(args.next(), "y")?),
            "release" => EditorCommand::Release,
            "drag" => EditorCommand::Drag(
                word(args.next(), "field id")?,
                number(args.next(), "dx")?,
                number(args.next(), "dy")?,
            ),
            "nudge" => EditorCommand::Nudge(number(args.next(), "dx")?, number(args.next(), "dy")?),
            "text" => EditorCommand::Text(rest.replace("\\n", "\n")),
            "font" => EditorCommand::Font(number(args.next(), "font size")?),
            "width" => match args.next() {
                Some(w) if w.eq_ignore_ascii_case("auto") => EditorCommand::Width(None),
                w => EditorCommand::Width(Some(number(w, "width")?)),
            },
            "dpi" => EditorCommand::Dpi(number(args.next(), "dpi")?),
            "add" => {
                let id = word(args.next(), "field id")?;
                let sample = rest[id.len()..].trim().replace("\\n", "\n");
                EditorCommand::Add(id, sample)
            }
            "remove" | "rm" => EditorCommand::Remove(args.next().map(str::to_string)),
            "grid" => match args.next() {
                Some("on") => EditorCommand::Grid(true),
                Some("off") => EditorCommand::Grid(false),
                other => return Err(format!("grid takes on or off, got {:?}", other.unwrap_or(""))),
            },
            "template" => EditorCommand::Template(word(args.next(), "template path")?),
            "snapshot" => EditorCommand::Snapshot(args.next().map(PathBuf::from)),
            "save" => EditorCommand::Save,
            "print" => EditorCommand::Print(args.next().map(PathBuf::from)),
            "quit" | "exit" | "q" => EditorCommand::Quit,
            other => return Err(format!("unknown command {:?} (try help)", other)),
        };
        Ok(command)
    }
}

/// Print job used by the `print` command.
pub struct ShellPrint {
    pub target: OutputTarget,
    pub options: RenderOptions,
    /// Where `snapshot` writes without an explicit path.
    pub snapshot_path: PathBuf,
}

/// Apply one command. Returns `false` when the session should end.
pub fn apply<W: Write>(
    editor: &mut LayoutEditor,
    command: EditorCommand,
    print: &ShellPrint,
    out: &mut W,
) -> Result<bool> {
    match command {
        EditorCommand::Help => writeln!(out, "{}", HELP)?,
        EditorCommand::List => {
            let dpi = editor.dpi() as f32;
            for node in editor.fields() {
                let (x, y) = node.anchor_px(dpi);
                let marker = if editor.selected_id() == Some(node.id.as_str()) { "*" } else { " " };
                writeln!(
                    out,
                    "{} {:<20} {:>7.2}mm {:>7.2}mm  ({:.0}, {:.0})px  {}pt  {:?}",
                    marker,
                    node.id,
                    node.x_mm,
                    node.y_mm,
                    x,
                    y,
                    node.font_size,
                    node.text
                )?;
            }
        }
        EditorCommand::Select(id) => {
            editor.select(&id)?;
            describe_selection(editor, out)?;
        }
        EditorCommand::Deselect => editor.clear_selection(),
        EditorCommand::Click(x, y) => {
            let hit = editor.pointer_down(x, y)?;
            editor.pointer_up();
            match hit {
                Some(_) => describe_selection(editor, out)?,
                None => writeln!(out, "nothing at ({}, {})", x, y)?,
            }
        }
        EditorCommand::Press(x, y) => {
            if editor.pointer_down(x, y)?.is_none() {
                writeln!(out, "nothing at ({}, {})", x, y)?;
            }
        }
        EditorCommand::Move(x, y) => editor.pointer_move(x, y)?,
        EditorCommand::Release => {
            editor.pointer_up();
            describe_selection(editor, out)?;
        }
        EditorCommand::Drag(id, dx, dy) => {
            editor.drag_field(&id, dx, dy)?;
            describe_selection(editor, out)?;
        }
        EditorCommand::Nudge(dx, dy) => {
            editor.nudge_selected(dx, dy)?;
            describe_selection(editor, out)?;
        }
        EditorCommand::Text(text) => editor.set_text(&text)?,
        EditorCommand::Font(size) => {
            let applied = editor.set_font_size(size)?;
            writeln!(out, "font size {}pt", applied)?;
        }
        EditorCommand::Width(width) => editor.set_text_width_px(width)?,
        EditorCommand::Dpi(dpi) => {
            let applied = editor.set_dpi(dpi);
            writeln!(out, "dpi {}", applied)?;
        }
        EditorCommand::Add(id, sample) => {
            editor.add_field(&id, &sample)?;
            describe_selection(editor, out)?;
        }
        EditorCommand::Remove(id) => {
            let removed = match id {
                Some(id) => {
                    editor.remove_field(&id)?;
                    id
                }
                None => editor.remove_selected()?,
            };
            writeln!(out, "removed {}", removed)?;
        }
        EditorCommand::Grid(on) => editor.set_grid(on),
        EditorCommand::Template(path) => editor.load_template(&path)?,
        EditorCommand::Snapshot(path) => {
            let path = path.unwrap_or_else(|| print.snapshot_path.clone());
            editor.save_snapshot(&path)?;
            writeln!(out, "snapshot written to {}", path.display())?;
        }
        EditorCommand::Save => {
            let store = editor.save()?;
            writeln!(
                out,
                "saved {} field(s) to {}",
                store.fields.len(),
                editor.coords_path().display()
            )?;
        }
        EditorCommand::Print(path) => {
            let mut target = print.target.clone();
            if let Some(path) = path {
                target.path = path;
            }
            let report = editor.save_and_print(&target, &print.options)?;
            writeln!(
                out,
                "printed {} field(s) to {}",
                report.placed.len(),
                target.path.display()
            )?;
        }
        EditorCommand::Quit => return Ok(false),
    }
    Ok(true)
}

fn describe_selection<W: Write>(editor: &LayoutEditor, out: &mut W) -> Result<()> {
    if let Some(inspector) = editor.inspector() {
        let width = inspector
            .width_px
            .map(|w| format!("{:.0}px", w))
            .unwrap_or_else(|| "auto".to_string());
        writeln!(
            out,
            "{} at ({:.2}, {:.2})mm, {}pt, width {}",
            inspector.id, inspector.x_mm, inspector.y_mm, inspector.font_size, width
        )?;
    }
    Ok(())
}

/// Read commands until `quit` or end of input.
pub fn run<R: BufRead, W: Write>(
    editor: &mut LayoutEditor,
    input: R,
    out: &mut W,
    print: &ShellPrint,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        debug!("editor> {}", line);
        let command = match line.parse::<EditorCommand>() {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "warning: {}", message)?;
                continue;
            }
        };
        match apply(editor, command, print, out) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => writeln!(out, "warning: {}", e)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorConfig;
    use crate::fonts::PageFont;
    use crate::mapper::PrintRecord;
    use crate::store::CoordinateStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_commands() {
        assert_eq!("select groom_name".parse::<EditorCommand>(), Ok(EditorCommand::Select("groom_name".into())));
        assert_eq!("  drag SrNo 10 -5 ".parse::<EditorCommand>(), Ok(EditorCommand::Drag("SrNo".into(), 10.0, -5.0)));
        assert_eq!("width auto".parse::<EditorCommand>(), Ok(EditorCommand::Width(None)));
        assert_eq!("width 120".parse::<EditorCommand>(), Ok(EditorCommand::Width(Some(120.0))));
        assert_eq!("grid on".parse::<EditorCommand>(), Ok(EditorCommand::Grid(true)));
        assert_eq!("remove".parse::<EditorCommand>(), Ok(EditorCommand::Remove(None)));
        assert_eq!("deselect".parse::<EditorCommand>(), Ok(EditorCommand::Deselect));
        assert_eq!("QUIT".parse::<EditorCommand>(), Ok(EditorCommand::Quit));
    }

    #[test]
    fn test_text_keeps_spaces_and_line_breaks() {
        assert_eq!(
            "text 12 Main St\\nKurla  West".parse::<EditorCommand>(),
            Ok(EditorCommand::Text("12 Main St\nKurla  West".into()))
        );
        assert_eq!(
            "add qazi_name Qazi Abdul Rahman".parse::<EditorCommand>(),
            Ok(EditorCommand::Add("qazi_name".into(), "Qazi Abdul Rahman".into()))
        );
        assert_eq!("add qazi_name".parse::<EditorCommand>(), Ok(EditorCommand::Add("qazi_name".into(), String::new())));
    }

    #[test]
    fn test_parse_errors() {
        assert!("frobnicate".parse::<EditorCommand>().is_err());
        assert!("font big".parse::<EditorCommand>().is_err());
        assert!("click 10".parse::<EditorCommand>().is_err());
        assert!("grid maybe".parse::<EditorCommand>().is_err());
    }

    #[test]
    fn test_script_edits_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.png");
        ::image::RgbImage::from_pixel(300, 400, ::image::Rgb([255, 255, 255]))
            .save(&template)
            .unwrap();
        let coords = dir.path().join("coordinates.json");

        let mut editor = LayoutEditor::open(EditorConfig {
            template_path: Some(template.to_string_lossy().into_owned()),
            coords_path: coords.clone(),
            record: PrintRecord::new(),
            font: PageFont::Bitmap,
        })
        .unwrap();
        let print = ShellPrint {
            target: OutputTarget {
                path: dir.path().join("certificate.png"),
                raster_dpi: 50.0,
                font: PageFont::Bitmap,
            },
            options: RenderOptions::default(),
            snapshot_path: dir.path().join("preview.png"),
        };

        let script = "\
dpi 254
add qazi_name Qazi X
nudge 5 -2
bogus
remove nothing_here
font 14
save
quit
add never_reached
";
        let mut out = Vec::new();
        run(&mut editor, script.as_bytes(), &mut out, &print).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("warning: unknown command"), "{}", out);
        assert!(out.contains("warning: Unknown field: nothing_here"), "{}", out);
        assert!(out.contains("saved "), "{}", out);
        assert!(editor.field("never_reached").is_none());

        let saved = CoordinateStore::load(&coords).unwrap();
        let qazi = &saved.fields["qazi_name"];
        // 50px at 254 dpi is 5mm
        assert!((qazi.x_mm - 10.0).abs() < 1e-3);
        assert!((qazi.y_mm - 3.0).abs() < 1e-3);
        assert_eq!(qazi.font_size, Some(14));
        assert_eq!(qazi.text, "Qazi X");
    }
}
