//! `j status [--plain]`
//!
//! Probes run on a tokio multi-thread runtime. With a terminal on stdout the
//! results stream into the TUI as they arrive; otherwise the command waits
//! for every probe and prints plain rows.

use std::io::IsTerminal;

use j_lib::StatusEngine;
use tokio::runtime::Runtime;
use j_lib::catalog::Style as Tone;
use j_lib::status::{Item, ItemKind};

use crate::error::{CliError, Result};
use crate::output::{self, INDENT};
use crate::tui;

pub fn run(plain: bool) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let mut engine = StatusEngine::new();

    if plain || !std::io::stdout().is_terminal() {
        runtime.block_on(async {
            engine.start();
            engine.wait_all().await;
        });
        for l in plain_lines(engine.items()) {
            output::line(&l);
        }
        return Ok(());
    }

    detached(runtime, || tui::run(engine))
}

/// Runs `f` inside the runtime, then drops it without joining blocking
/// probes that are still in flight, so quitting the view is immediate.
fn detached<T>(runtime: Runtime, f: impl FnOnce() -> T) -> T {
    let result = {
        let _guard = runtime.enter();
        f()
    };
    runtime.shutdown_background();
    result
}

// ============================================================================
// Row view
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mark {
    Good,
    Bad,
    Off,
    Loading,
    Info,
}

impl Mark {
    pub(crate) fn icon(self) -> &'static str {
        match self {
            Self::Good => output::ICON_CHECK,
            Self::Bad => output::ICON_CROSS,
            Self::Off => output::ICON_PENDING,
            Self::Loading => "…",
            Self::Info => "•",
        }
    }
}

/// What one item looks like, independent of the surface drawing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RowView {
    pub mark: Mark,
    pub name: String,
    pub value: String,
    pub tone: Tone,
    /// Secondary text: install method, check description.
    pub meta: String,
}

pub(crate) fn describe(item: &Item) -> RowView {
    let mut row = RowView {
        mark: Mark::Loading,
        name: item.name.clone(),
        value: String::new(),
        tone: Tone::Muted,
        meta: String::new(),
    };
    if !item.loaded {
        return row;
    }

    match item.kind {
        ItemKind::Header => row.mark = Mark::Info,
        ItemKind::SystemInfo => {
            row.mark = Mark::Info;
            row.value = item.detail.clone();
            row.tone = Tone::Special;
        }
        ItemKind::Setup => {
            if item.installed {
                row.mark = Mark::Good;
                row.tone = Tone::Success;
                row.value = non_empty(&item.detail, "configured");
            } else {
                row.mark = Mark::Off;
                row.value = "not configured".into();
            }
            row.meta = item.description.clone();
        }
        ItemKind::Security | ItemKind::Identity => {
            if item.is_healthy() {
                row.mark = Mark::Good;
                row.tone = Tone::Success;
            } else {
                row.mark = Mark::Bad;
                row.tone = Tone::Warning;
            }
            row.value = item.detail.clone();
            row.meta = item.description.clone();
        }
        ItemKind::Tool => {
            if item.installed {
                row.mark = Mark::Good;
                row.tone = Tone::Success;
                row.value = non_empty(&item.version, &item.detail);
                row.meta = [item.status.as_str(), item.method]
                    .into_iter()
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" · ");
            } else {
                row.mark = Mark::Off;
                row.value = "not installed".into();
                row.meta = item.method.to_string();
            }
        }
        ItemKind::Network | ItemKind::Disk | ItemKind::Cache => {
            if item.available {
                row.mark = Mark::Info;
                row.value = item.value.clone();
                row.tone = item.style;
            } else {
                row.mark = Mark::Off;
                row.value = "-".into();
            }
        }
    }
    row
}

fn non_empty(value: &str, fallback: &str) -> String {
    if value.is_empty() { fallback } else { value }.to_string()
}

/// Uncoloured rows grouped by section, as printed by `--plain`.
pub(crate) fn plain_lines(items: &[Item]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut section = "";
    for item in items {
        if item.section != section {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(item.section.to_uppercase());
            section = item.section;
        }
        if item.is_header() {
            lines.push(format!("{INDENT}{}", item.name));
            continue;
        }
        let row = describe(item);
        let text = format!(
            "{INDENT}{INDENT}{} {:<24} {:<20} {}",
            row.mark.icon(),
            row.name,
            row.value,
            row.meta
        );
        lines.push(text.trim_end().to_string());
    }
    lines
}
