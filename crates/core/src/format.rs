//! Line formatting for the extraction report.
//!
//! Every line of the report is produced here so the exact output format lives
//! in one place. Unset font attributes render as [`DEFAULT`].

use crate::types::{Font, FontColor, TableRow};
use std::fmt::Write;
use std::path::Path;

/// Placeholder for font attributes that are not set on the run.
pub const DEFAULT: &str = "Default";

/// First line of every report.
pub const START_BANNER: &str = "Starting PowerPoint Extraction...";

/// Last line of every report.
pub const COMPLETE_BANNER: &str = "Extraction Complete!";

/// Report sections, in the order the passes run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    TextAndFonts,
    Tables,
    Images,
    Layouts,
}

impl Section {
    /// Category label used in the section banner.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TextAndFonts => "Text and Font Properties",
            Self::Tables => "Tables",
            Self::Images => "Images",
            Self::Layouts => "Slide Layouts",
        }
    }

    /// Banner line, e.g. `--- Extracting Tables ---`.
    pub fn banner(&self) -> String {
        format!("--- Extracting {} ---", self.label())
    }
}

/// `Slide 3:`
pub fn slide_header(number: usize) -> String {
    format!("Slide {}:", number)
}

/// `  Paragraph: <text>`
pub fn paragraph_line(text: &str) -> String {
    format!("  Paragraph: {}", text)
}

/// The three per-run font lines: size, color, bold.
pub fn font_lines(font: &Font) -> [String; 3] {
    [
        format!("    Font Size: {}", font_size(font.size)),
        format!("    Font Color: {}", font_color(font.color.as_ref())),
        format!("    Bold: {}", bold(font.bold)),
    ]
}

/// Point size with a fractional part always present (`18.0`, `10.5`).
pub fn font_size(size: Option<f64>) -> String {
    match size {
        Some(pt) => format!("{:?}", pt),
        None => DEFAULT.to_string(),
    }
}

/// Uppercase `RRGGBB` for explicit RGB colours; anything else is [`DEFAULT`].
pub fn font_color(color: Option<&FontColor>) -> String {
    match color.and_then(FontColor::rgb) {
        Some([r, g, b]) => format!("{:02X}{:02X}{:02X}", r, g, b),
        None => DEFAULT.to_string(),
    }
}

pub fn bold(bold: Option<bool>) -> String {
    match bold {
        Some(b) => b.to_string(),
        None => DEFAULT.to_string(),
    }
}

/// `  Row 1: ['A', 'B']`
pub fn row_line(number: usize, row: &TableRow) -> String {
    let cells: Vec<String> = row.texts().into_iter().map(quote_cell).collect();
    format!("  Row {}: [{}]", number, cells.join(", "))
}

/// Single-quote a cell text, escaping backslashes, quotes and control
/// characters.
pub fn quote_cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// `Extracted image 0 from slide 1 to out/images/image_0.png`
pub fn image_line(index: usize, slide: usize, path: &Path) -> String {
    format!(
        "Extracted image {} from slide {} to {}",
        index,
        slide,
        path.display()
    )
}

/// `Layout 1: Title Slide`
pub fn layout_line(number: usize, name: &str) -> String {
    format!("Layout {}: {}", number, name)
}
