//! Text normalization and line layout for printed fields.

/// Collapse runs of spaces and tabs inside each line to a single space.
///
/// Explicit line breaks survive, so a multi-line address keeps its lines.
/// `\r\n` is treated as a single break.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// True when normalization leaves nothing printable.
pub fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// Split normalized text into the lines to draw.
///
/// Explicit breaks always start a new line. With a wrap width, words are
/// packed greedily; a word wider than the box stays whole on its own line.
/// `measure` returns the advance width of a string in the same unit as
/// `wrap_width`.
pub fn layout_lines<F>(text: &str, wrap_width: Option<f32>, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        match wrap_width {
            None => lines.push(paragraph.to_string()),
            Some(width) => wrap_paragraph(paragraph, width, &measure, &mut lines),
        }
    }
    lines
}

fn wrap_paragraph<F>(paragraph: &str, width: f32, measure: &F, out: &mut Vec<String>)
where
    F: Fn(&str) -> f32,
{
    let mut current = String::new();
    for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if measure(&candidate) <= width {
            current = candidate;
        } else {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    // Blank lines are kept so explicit vertical spacing is preserved
    out.push(current);
}
