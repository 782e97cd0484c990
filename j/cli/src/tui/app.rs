//! Application state for the status view.

use std::time::Duration;

use j_lib::StatusEngine;
use j_lib::catalog::{self, ProcessInfo};
use tokio::sync::mpsc;
use tracing::debug;

const PROCESS_REFRESH: Duration = Duration::from_secs(1);

/// Latest top-process snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Processes {
    pub cpu: Vec<ProcessInfo>,
    pub memory: Vec<ProcessInfo>,
}

/// TUI application state.
pub struct App {
    pub engine: StatusEngine,
    /// First visible content line.
    pub scroll: usize,
    /// Height of the content area from the last draw.
    pub viewport: usize,
    /// Number of content lines from the last draw.
    pub content_height: usize,
    /// Frame counter driving the spinner.
    pub tick: usize,
    pub should_quit: bool,
    pub processes: Processes,
    pub process_rx: Option<mpsc::Receiver<Processes>>,
}

impl App {
    pub fn new(engine: StatusEngine) -> Self {
        Self {
            engine,
            scroll: 0,
            viewport: 0,
            content_height: 0,
            tick: 0,
            should_quit: false,
            processes: Processes::default(),
            process_rx: None,
        }
    }

    /// Spawns the once-a-second process sampler.
    ///
    /// Must be called inside a tokio runtime context. The task ends when the
    /// app is dropped.
    pub fn with_process_refresh(mut self) -> Self {
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PROCESS_REFRESH);
            loop {
                interval.tick().await;
                let sample = tokio::task::spawn_blocking(|| Processes {
                    cpu: catalog::top_cpu(),
                    memory: catalog::top_memory(),
                })
                .await;
                let Ok(sample) = sample else {
                    debug!("process sampler task failed");
                    continue;
                };
                if tx.send(sample).await.is_err() {
                    return;
                }
            }
        });
        self.process_rx = Some(rx);
        self
    }

    /// Applies queued probe results and the newest process sample.
    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        self.engine.poll();
        if let Some(rx) = self.process_rx.as_mut() {
            while let Ok(sample) = rx.try_recv() {
                self.processes = sample;
            }
        }
    }

    /// Whether probes are still outstanding.
    pub fn is_loading(&self) -> bool {
        !self.engine.is_all_loaded() && self.engine.pending() > 0
    }

    // ------------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------------

    fn max_scroll(&self) -> usize {
        self.content_height.saturating_sub(self.viewport)
    }

    /// Keeps `scroll` valid after the content or viewport changed.
    pub fn clamp_scroll(&mut self) {
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = (self.scroll + lines).min(self.max_scroll());
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport.max(1));
    }

    pub fn scroll_top(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(content: usize, viewport: usize) -> App {
        let mut app = App::new(StatusEngine::from_parts(Vec::new(), Vec::new()));
        app.content_height = content;
        app.viewport = viewport;
        app
    }

    #[test]
    fn scroll_stops_at_last_page() {
        let mut app = app(50, 20);
        app.scroll_down(100);
        assert_eq!(app.scroll, 30);
        app.scroll_up(5);
        assert_eq!(app.scroll, 25);
        app.scroll_top();
        assert_eq!(app.scroll, 0);
        app.scroll_up(1);
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn paging_moves_by_viewport() {
        let mut app = app(100, 10);
        app.page_down();
        app.page_down();
        assert_eq!(app.scroll, 20);
        app.page_up();
        assert_eq!(app.scroll, 10);
        app.scroll_bottom();
        assert_eq!(app.scroll, 90);
    }

    #[test]
    fn short_content_never_scrolls() {
        let mut app = app(5, 20);
        app.scroll_down(3);
        assert_eq!(app.scroll, 0);
        app.scroll = 7;
        app.clamp_scroll();
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn tick_without_receiver_only_advances_spinner() {
        let mut app = app(0, 0);
        app.on_tick();
        app.on_tick();
        assert_eq!(app.tick, 2);
        assert_eq!(app.processes, Processes::default());
    }

    #[test]
    fn empty_engine_is_not_loading() {
        let app = app(0, 0);
        assert!(!app.is_loading());
    }
}
