//! Event handling and main loop.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;

use super::app::App;
use super::render;

/// Frame interval; also the spinner speed.
const FRAME: Duration = Duration::from_millis(80);

/// Runs the TUI main loop.
///
/// ## Errors
///
/// Returns an I/O error if terminal operations fail.
pub fn run_app(terminal: &mut DefaultTerminal, app: &mut App) -> io::Result<()> {
    loop {
        app.on_tick();
        terminal.draw(|frame| render::render(app, frame))?;

        if event::poll(FRAME)?
            && let Event::Key(key) = event::read()?
        {
            // Only handle Press events (Windows compatibility)
            if key.kind != KeyEventKind::Press {
                continue;
            }
            handle_input(app, key.code, key.modifiers);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

pub(super) fn handle_input(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
    match key {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => app.should_quit = true,
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('g') | KeyCode::Home => app.scroll_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_bottom(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(1),
        KeyCode::PageUp => app.page_up(),
        KeyCode::PageDown | KeyCode::Char(' ') => app.page_down(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use j_lib::StatusEngine;

    fn app() -> App {
        let mut app = App::new(StatusEngine::from_parts(Vec::new(), Vec::new()));
        app.content_height = 40;
        app.viewport = 10;
        app
    }

    #[test]
    fn quit_keys() {
        for (key, modifiers) in [
            (KeyCode::Char('q'), KeyModifiers::NONE),
            (KeyCode::Esc, KeyModifiers::NONE),
            (KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            let mut app = app();
            handle_input(&mut app, key, modifiers);
            assert!(app.should_quit, "{key:?} should quit");
        }
    }

    #[test]
    fn plain_c_does_not_quit() {
        let mut app = app();
        handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::NONE);
        assert!(!app.should_quit);
    }

    #[test]
    fn vim_keys_scroll() {
        let mut app = app();
        handle_input(&mut app, KeyCode::Char('j'), KeyModifiers::NONE);
        handle_input(&mut app, KeyCode::Down, KeyModifiers::NONE);
        assert_eq!(app.scroll, 2);
        handle_input(&mut app, KeyCode::Char('k'), KeyModifiers::NONE);
        assert_eq!(app.scroll, 1);
        handle_input(&mut app, KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(app.scroll, 30);
        handle_input(&mut app, KeyCode::Char('g'), KeyModifiers::NONE);
        assert_eq!(app.scroll, 0);
        handle_input(&mut app, KeyCode::PageDown, KeyModifiers::NONE);
        assert_eq!(app.scroll, 10);
    }
}
