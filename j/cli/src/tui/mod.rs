//! Live status view.
//!
//! Probe results stream in from the [`StatusEngine`] while the user scrolls.
//! A background task refreshes the top CPU and memory processes every second.

mod app;
mod event;
mod render;

use j_lib::StatusEngine;

use crate::error::{CliError, Result};

pub use app::App;
pub use event::run_app;

/// Runs the status TUI until the user quits.
///
/// Must be called inside a tokio runtime context.
///
/// ## Errors
///
/// Returns [`CliError::Tui`] if the terminal cannot be drawn to.
pub fn run(mut engine: StatusEngine) -> Result<()> {
    engine.start();
    let mut app = App::new(engine).with_process_refresh();

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        default_hook(info);
    }));

    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, &mut app);
    ratatui::restore();
    result.map_err(CliError::Tui)
}
