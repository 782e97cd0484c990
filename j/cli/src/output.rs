//! Terminal output for the non-TUI commands.
//!
//! Every user-facing line goes through one of the semantic calls here so the
//! look stays consistent across commands. Colour is dropped when `NO_COLOR`
//! is set or stdout is not a terminal.

use std::io::IsTerminal;
use std::sync::LazyLock;

use j_lib::catalog::Reporter;
use owo_colors::{OwoColorize, Style};

pub const INDENT: &str = "  ";
pub const ICON_CHECK: &str = "✓";
pub const ICON_CROSS: &str = "✗";
pub const ICON_PENDING: &str = "○";

static COLOR: LazyLock<bool> =
    LazyLock::new(|| std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal());

pub fn colors_enabled() -> bool {
    *COLOR
}

/// Applies `style` when colour is enabled.
pub fn paint(text: &str, style: Style) -> String {
    if colors_enabled() {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

pub fn badge(ok: bool) -> String {
    if ok {
        paint(ICON_CHECK, Style::new().green())
    } else {
        paint(ICON_CROSS, Style::new().red())
    }
}

// ============================================================================
// Messages
// ============================================================================

pub fn line(text: &str) {
    println!("{text}");
}

pub fn empty() {
    println!();
}

/// An action about to run, e.g. `"📦 Installing selected packages..."`.
pub fn action(emoji: &str, message: &str) {
    println!("{}", paint(&format!("{emoji} {message}"), Style::new().cyan()));
}

pub fn info(message: &str) {
    println!("{}", paint(message, Style::new().cyan()));
}

pub fn success(message: &str) {
    println!("{} {message}", paint(ICON_CHECK, Style::new().green()));
}

pub fn done(message: &str) {
    println!("{}", paint(&format!("✅ {message}"), Style::new().green()));
}

pub fn warning(message: &str) {
    println!("{} {message}", paint("Warning:", Style::new().yellow()));
}

pub fn error(message: &str) {
    eprintln!("{} {message}", paint("Error:", Style::new().red()));
}

pub fn dim(message: &str) {
    println!("{}", paint(message, Style::new().bright_black()));
}

pub fn section(title: &str) {
    println!("{}", paint(title, Style::new().bold()));
}

pub fn category(name: &str) {
    dim(name);
}

pub fn usage(lines: &[&str]) {
    for l in lines {
        dim(l);
    }
}

/// `✓ label  detail` with the label padded for alignment.
pub fn row(ok: bool, label: &str, detail: &str) {
    println!("{}", format_row(&badge(ok), label, &paint(detail, Style::new().bright_black())));
}

/// Row text with an already-styled icon and detail.
pub fn format_row(icon: &str, label: &str, detail: &str) -> String {
    if detail.is_empty() {
        format!("{INDENT}{icon} {label}")
    } else {
        format!("{INDENT}{icon} {label:<14} {detail}")
    }
}

// ============================================================================
// Tables
// ============================================================================

/// Left-aligned columns sized to their widest cell; nothing when `rows` is
/// empty.
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    if rows.is_empty() {
        return Vec::new();
    }
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }
    let render = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{c:<width$}", width = widths[i]))
            .collect();
        format!("{INDENT}{}", padded.join("  ").trim_end())
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render(headers.to_vec()));
    for row in rows {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines
}

pub fn table(headers: &[&str], rows: &[Vec<String>]) {
    let mut lines = format_table(headers, rows).into_iter();
    if let Some(head) = lines.next() {
        println!("{}", paint(&head, Style::new().bright_black()));
    }
    for l in lines {
        println!("{l}");
    }
}

// ============================================================================
// Reporter
// ============================================================================

/// Forwards library progress to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct Printer;

impl Reporter for Printer {
    fn step(&self, message: &str) {
        println!("{INDENT}📥 {message}...");
    }

    fn done(&self, message: &str) {
        println!("{INDENT}{} {message}", paint(ICON_CHECK, Style::new().green()));
    }

    fn note(&self, message: &str) {
        println!("{INDENT}{}", paint(message, Style::new().bright_black()));
    }

    fn line(&self, message: &str) {
        println!("{message}");
    }

    fn error(&self, message: &str) {
        error(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_pad_labels_only_with_detail() {
        assert_eq!(format_row("✓", "git", ""), "  ✓ git");
        assert_eq!(format_row("✓", "git", "brew"), "  ✓ git            brew");
    }

    #[test]
    fn empty_tables_render_nothing() {
        assert!(format_table(&["NAME", "SIZE"], &[]).is_empty());
    }

    #[test]
    fn tables_align_to_widest_cell() {
        let rows = vec![
            vec!["brew".to_string(), "1.2 GB".to_string()],
            vec!["multipass".to_string(), "-".to_string()],
        ];
        let lines = format_table(&["NAME", "SIZE"], &rows);
        assert_eq!(
            lines,
            ["  NAME       SIZE", "  brew       1.2 GB", "  multipass  -"]
        );
    }
}
