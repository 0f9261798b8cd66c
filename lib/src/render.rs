use std::str::FromStr;

use crate::error::InvalidOption;
use crate::grid::{Cell, CharacterGrid};
use crate::palette::Color;

/// SGR sequence restoring default terminal colors.
pub const SGR_RESET: &str = "\x1b[0m";

/// The supported output encodings.
///
/// A closed set: rendering dispatches on the variant once per call, and every
/// variant consumes the same immutable [`CharacterGrid`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Glyphs only, newline-joined rows, all color data ignored.
    Plain,
    /// Glyphs wrapped in SGR color sequences, coalesced per same-color run.
    #[default]
    Ansi,
    /// Pre-escaped `<pre>` markup with one styled `<span>` per colored run.
    Html,
}

impl OutputFormat {
    /// Renders `grid` into a single string. The grid is not mutated; calling
    /// this repeatedly with any format yields identical strings each time.
    pub fn render(self, grid: &CharacterGrid) -> String {
        match self {
            OutputFormat::Plain => render_plain(grid),
            OutputFormat::Ansi => render_ansi(grid),
            OutputFormat::Html => render_html(grid),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Ansi => "ansi",
            OutputFormat::Html => "html",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = InvalidOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "plain" | "ascii" => Ok(OutputFormat::Plain),
            "ansi" => Ok(OutputFormat::Ansi),
            "html" => Ok(OutputFormat::Html),
            other => Err(InvalidOption::UnknownFormat(other.to_string())),
        }
    }
}

fn render_plain(grid: &CharacterGrid) -> String {
    let mut out = String::new();
    for (index, row) in grid.rows().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.extend(row.iter().map(|cell| cell.glyph));
    }
    out
}

/// Emits one SGR sequence per run of same-colored cells. A run without color
/// resets the terminal only when an earlier run in the row set any; rows that
/// used color terminate with a reset, and a monochrome grid renders with no
/// escape sequences at all.
fn render_ansi(grid: &CharacterGrid) -> String {
    let mut out = String::new();
    for (index, row) in grid.rows().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let mut active = false;
        for run in row.chunk_by(|a, b| (a.fg, a.bg) == (b.fg, b.bg)) {
            let lead = run[0];
            if lead.fg.is_some() || lead.bg.is_some() {
                out.push_str(&sgr_sequence(lead.fg, lead.bg, active));
                active = true;
            } else if active {
                out.push_str(SGR_RESET);
                active = false;
            }
            out.extend(run.iter().map(|cell| cell.glyph));
        }
        if active {
            out.push_str(SGR_RESET);
        }
    }
    out
}

/// Builds one CSI sequence carrying every parameter the run needs. A run
/// following a colored run leads with a `0` so no earlier foreground or
/// background survives into it.
fn sgr_sequence(fg: Option<Color>, bg: Option<Color>, reset_first: bool) -> String {
    let mut params = Vec::new();
    if reset_first {
        params.push("0".to_string());
    }
    if let Some(color) = fg {
        params.push(color.sgr_foreground());
    }
    if let Some(color) = bg {
        params.push(color.sgr_background());
    }
    format!("\x1b[{}m", params.join(";"))
}

fn render_html(grid: &CharacterGrid) -> String {
    let mut out = String::from("<pre>");
    for (index, row) in grid.rows().enumerate() {
        if index > 0 {
            out.push_str("<br>");
        }
        for run in row.chunk_by(|a, b| (a.fg, a.bg) == (b.fg, b.bg)) {
            match style_attr(&run[0]) {
                Some(style) => {
                    out.push_str("<span style=\"");
                    out.push_str(&style);
                    out.push_str("\">");
                    for cell in run {
                        push_escaped(&mut out, cell.glyph);
                    }
                    out.push_str("</span>");
                }
                None => {
                    for cell in run {
                        push_escaped(&mut out, cell.glyph);
                    }
                }
            }
        }
    }
    out.push_str("</pre>");
    out
}

fn style_attr(cell: &Cell) -> Option<String> {
    if cell.fg.is_none() && cell.bg.is_none() {
        return None;
    }
    let mut parts = Vec::new();
    if let Some(color) = cell.fg {
        parts.push(format!("color:{}", color.css()));
    }
    if let Some(color) = cell.bg {
        parts.push(format!("background-color:{}", color.css()));
    }
    Some(parts.join(";"))
}

fn push_escaped(out: &mut String, glyph: char) {
    match glyph {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        other => out.push(other),
    }
}
