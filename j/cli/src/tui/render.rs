//! Rendering for the status view.
//!
//! Layout, top to bottom: a title bar with spinner and progress, the
//! scrollable item list, the top-process panel and a footer of key hints.

use j_lib::catalog::{ProcessInfo, Style as Tone};
use j_lib::status::Item;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
};

use super::app::App;
use crate::commands::status::{Mark, describe};
use crate::output;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const PROCESS_PANEL_HEIGHT: u16 = 8;

pub fn render(app: &mut App, frame: &mut Frame) {
    let color = output::colors_enabled();
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(PROCESS_PANEL_HEIGHT),
        Constraint::Length(1),
    ])
    .split(frame.area());

    render_title(app, frame, chunks[0], color);
    render_content(app, frame, chunks[1], color);
    render_processes(app, frame, chunks[2], color);
    render_footer(frame, chunks[3], color);
}

pub(super) fn spinner(tick: usize) -> &'static str {
    SPINNER[tick % SPINNER.len()]
}

pub(super) fn progress_label(loaded: usize, total: usize) -> String {
    format!("{loaded}/{total}")
}

fn paint(style: Style, color: bool) -> Style {
    if color { style } else { Style::default() }
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Success => Color::Green,
        Tone::Warning => Color::Yellow,
        Tone::Muted => Color::DarkGray,
        Tone::Special => Color::Cyan,
    }
}

fn mark_color(mark: Mark) -> Color {
    match mark {
        Mark::Good => Color::Green,
        Mark::Bad => Color::Red,
        Mark::Off | Mark::Loading => Color::DarkGray,
        Mark::Info => Color::Cyan,
    }
}

fn render_title(app: &App, frame: &mut Frame, area: Rect, color: bool) {
    let progress = progress_label(app.engine.loaded(), app.engine.total());
    let state = if app.is_loading() {
        Span::styled(
            format!("{} Loading {progress}", spinner(app.tick)),
            paint(Style::default().fg(Color::Yellow), color),
        )
    } else {
        Span::styled(
            format!("✓ {progress} loaded"),
            paint(Style::default().fg(Color::Green), color),
        )
    };
    let title = Line::from(vec![
        Span::styled(
            " j status ",
            paint(Style::default().add_modifier(Modifier::BOLD), color),
        ),
        Span::raw(" "),
        state,
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

/// Every item as a display line, with section and sub-section headings.
pub(super) fn content_lines(items: &[Item], color: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut section = "";
    for item in items {
        if item.section != section {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            lines.push(Line::styled(
                item.section.to_uppercase(),
                paint(
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                    color,
                ),
            ));
            section = item.section;
        }
        if item.is_header() {
            lines.push(Line::styled(
                format!(" {}", item.name),
                paint(Style::default().add_modifier(Modifier::BOLD), color),
            ));
            continue;
        }

        let row = describe(item);
        lines.push(Line::from(vec![
            Span::raw("   "),
            Span::styled(
                row.mark.icon(),
                paint(Style::default().fg(mark_color(row.mark)), color),
            ),
            Span::raw(format!(" {:<24} ", row.name)),
            Span::styled(
                format!("{:<20}", row.value),
                paint(Style::default().fg(tone_color(row.tone)), color),
            ),
            Span::styled(
                format!(" {}", row.meta),
                paint(Style::default().fg(Color::DarkGray), color),
            ),
        ]));
    }
    lines
}

fn render_content(app: &mut App, frame: &mut Frame, area: Rect, color: bool) {
    let lines = content_lines(app.engine.items(), color);
    app.content_height = lines.len();
    app.viewport = usize::from(area.height);
    app.clamp_scroll();

    let scroll = u16::try_from(app.scroll).unwrap_or(u16::MAX);
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), area);
}

fn process_table<'a>(title: &'a str, processes: &'a [ProcessInfo], color: bool) -> Table<'a> {
    let rows = processes.iter().map(|p| {
        Row::new(vec![
            Span::styled(
                p.pid.as_str(),
                paint(Style::default().fg(Color::DarkGray), color),
            ),
            Span::raw(p.name.as_str()),
            Span::styled(
                p.value.as_str(),
                paint(Style::default().fg(Color::Cyan), color),
            ),
        ])
    });
    Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Min(10),
            Constraint::Length(8),
        ],
    )
    .block(Block::default().borders(Borders::ALL).title(title))
}

fn render_processes(app: &App, frame: &mut Frame, area: Rect, color: bool) {
    let halves = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    frame.render_widget(
        process_table(" Top CPU ", &app.processes.cpu, color),
        halves[0],
    );
    frame.render_widget(
        process_table(" Top Memory ", &app.processes.memory, color),
        halves[1],
    );
}

fn render_footer(frame: &mut Frame, area: Rect, color: bool) {
    let keys = [("q", "Quit"), ("↑↓/jk", "Scroll"), ("g/G", "Top/Bottom"), ("PgUp/PgDn", "Page")];
    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(
                    format!(" {key} "),
                    paint(
                        Style::default()
                            .fg(Color::Black)
                            .bg(Color::White)
                            .add_modifier(Modifier::BOLD),
                        color,
                    ),
                ),
                Span::raw(format!(" {desc} ")),
            ]
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use j_lib::StatusEngine;
    use j_lib::status::{ItemKind, SECTION_TOOLS};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn sample_items() -> Vec<Item> {
        vec![
            Item::header("header-tools-Git".into(), SECTION_TOOLS, "Git"),
            Item {
                loaded: true,
                installed: true,
                version: "2.45.1".into(),
                method: "brew",
                ..Item::new("tool-git".into(), ItemKind::Tool, SECTION_TOOLS, "Git", "git")
            },
            Item::new("tool-gh".into(), ItemKind::Tool, SECTION_TOOLS, "Git", "gh"),
        ]
    }

    #[test]
    fn spinner_cycles() {
        assert_eq!(spinner(0), "⠋");
        assert_eq!(spinner(9), "⠏");
        assert_eq!(spinner(10), "⠋");
    }

    #[test]
    fn progress_label_shows_loaded_over_total() {
        assert_eq!(progress_label(12, 40), "12/40");
    }

    #[test]
    fn content_lines_include_headings() {
        let lines = content_lines(&sample_items(), false);
        assert_eq!(line_text(&lines[0]), "TOOLS");
        assert_eq!(line_text(&lines[1]), " Git");
        assert!(line_text(&lines[2]).contains("✓ git"));
        assert!(line_text(&lines[2]).contains("2.45.1"));
        assert!(line_text(&lines[3]).contains("… gh"));
    }

    #[test]
    fn render_shows_items_and_process_panel() {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut app = App::new(StatusEngine::from_parts(sample_items(), Vec::new()));

        terminal
            .draw(|frame| render(&mut app, frame))
            .expect("render should not fail");

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("j status"));
        assert!(content.contains("Loading 1/2"));
        assert!(content.contains("Top CPU"));
        assert!(content.contains("Top Memory"));
        assert!(content.contains("Quit"));
        assert_eq!(app.content_height, 4);
    }
}
