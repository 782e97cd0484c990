//! Parallel status probe engine.
//!
//! [`StatusEngine`] builds a fixed list of [`Item`]s from the catalog, runs
//! every probe on tokio's blocking pool, and streams one
//! [`StatusEvent::Update`] per probe followed by a single
//! [`StatusEvent::AllLoaded`]. The engine keeps its own copy of the item list
//! and replaces entries by id as events are applied, so a UI only needs to
//! render [`StatusEngine::items`].
//!
//! ## Examples
//!
//! ```no_run
//! use j_lib::status::StatusEngine;
//!
//! # async fn demo() {
//! let mut engine = StatusEngine::new();
//! engine.start();
//! engine.wait_all().await;
//! assert_eq!(engine.pending(), 0);
//! # }
//! ```

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use strum::{Display, IntoEnumIterator, IntoStaticStr};
use sysinfo::System;
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::catalog::{
    self, DiskCheck, HealthCheck, NetworkCheck, ResourceResult, Script, Style, Tool,
    ToolCategory,
};

/// Slack added to the channel on top of one slot per probe.
const CHANNEL_SLACK: usize = 16;

pub const SECTION_SYSTEM: &str = "System";
pub const SECTION_TOOLS: &str = "Tools";
pub const SECTION_RESOURCES: &str = "Resources";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ItemKind {
    Header,
    SystemInfo,
    Setup,
    Security,
    Identity,
    Tool,
    Network,
    Disk,
    Cache,
}

/// One row of the status view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Stable join key, e.g. `tool-git` or `header-network`.
    pub id: String,
    pub kind: ItemKind,
    pub section: &'static str,
    pub sub_section: String,
    pub name: String,
    pub description: String,
    pub loaded: bool,

    // check results
    pub installed: bool,
    pub version: String,
    pub status: String,
    pub detail: String,
    pub good_when: bool,
    /// Install method label for tools.
    pub method: &'static str,

    // resource results
    pub value: String,
    pub style: Style,
    pub available: bool,
}

impl Item {
    /// A pending item with empty results.
    pub fn new(id: String, kind: ItemKind, section: &'static str, sub_section: &str, name: &str) -> Self {
        Self {
            id,
            kind,
            section,
            sub_section: sub_section.to_string(),
            name: name.to_string(),
            description: String::new(),
            loaded: false,
            installed: false,
            version: String::new(),
            status: String::new(),
            detail: String::new(),
            good_when: false,
            method: "",
            value: String::new(),
            style: Style::Muted,
            available: false,
        }
    }

    pub fn header(id: String, section: &'static str, sub_section: &str) -> Self {
        Self {
            loaded: true,
            ..Self::new(id, ItemKind::Header, section, sub_section, sub_section)
        }
    }

    pub fn is_header(&self) -> bool {
        self.kind == ItemKind::Header
    }

    /// Whether a health check reports the desired state.
    pub fn is_healthy(&self) -> bool {
        self.installed == self.good_when
    }

    fn apply_resource(mut self, result: ResourceResult) -> Self {
        self.value = result.value;
        self.style = result.style;
        self.available = result.available;
        self
    }
}

/// Message streamed from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Update { id: String, item: Item },
    AllLoaded,
}

/// Fills in a pending item.
pub type Job = Box<dyn FnOnce(Item) -> Item + Send + 'static>;

/// Builds items and probes, then streams results.
pub struct StatusEngine {
    items: Vec<Item>,
    index: HashMap<String, usize>,
    jobs: Option<Vec<(String, Job)>>,
    events: Option<Receiver<StatusEvent>>,
    all_loaded: bool,
}

impl std::fmt::Debug for StatusEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusEngine")
            .field("items", &self.items.len())
            .field("started", &self.jobs.is_none())
            .field("all_loaded", &self.all_loaded)
            .finish()
    }
}

impl Default for StatusEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusEngine {
    /// Engine over the built-in catalog.
    pub fn new() -> Self {
        let (items, jobs) = build_items();
        Self::from_parts(items, jobs)
    }

    /// Engine over explicit items and probes. Each job's id must name an item.
    pub fn from_parts(items: Vec<Item>, jobs: Vec<(String, Job)>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id.clone(), i))
            .collect();
        Self {
            items,
            index,
            jobs: Some(jobs),
            events: None,
            all_loaded: false,
        }
    }

    /// Spawns every probe. Calls after the first do nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        let Some(jobs) = self.jobs.take() else {
            return;
        };
        let (tx, rx) = mpsc::channel(jobs.len() + CHANNEL_SLACK);
        self.events = Some(rx);
        debug!(probes = jobs.len(), "starting status probes");

        let mut set = JoinSet::new();
        for (id, job) in jobs {
            let Some(pending) = self.item(&id).cloned() else {
                warn!(%id, "probe has no matching item");
                continue;
            };
            set.spawn_blocking(move || run_job(id, pending, job));
        }

        tokio::spawn(async move {
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((id, item)) => {
                        if tx.send(StatusEvent::Update { id, item }).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!(error = %e, "status probe task failed"),
                }
            }
            let _ = tx.send(StatusEvent::AllLoaded).await;
        });
    }

    /// Applies every event already queued. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut drained = Vec::new();
        if let Some(rx) = self.events.as_mut() {
            while let Ok(event) = rx.try_recv() {
                drained.push(event);
            }
        }
        let count = drained.len();
        for event in drained {
            self.apply(event);
        }
        count
    }

    /// Waits for and applies the next event; `None` once the stream is closed.
    pub async fn next(&mut self) -> Option<StatusEvent> {
        let event = self.events.as_mut()?.recv().await?;
        self.apply(event.clone());
        Some(event)
    }

    /// Applies events until [`StatusEvent::AllLoaded`] arrives.
    pub async fn wait_all(&mut self) {
        while !self.all_loaded {
            if self.next().await.is_none() {
                break;
            }
        }
    }

    /// Replaces an item by id, or records completion.
    pub fn apply(&mut self, event: StatusEvent) {
        match event {
            StatusEvent::Update { id, item } => {
                if let Some(&i) = self.index.get(&id) {
                    self.items[i] = item;
                }
            }
            StatusEvent::AllLoaded => self.all_loaded = true,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    /// Number of non-header items.
    pub fn total(&self) -> usize {
        self.items.iter().filter(|i| !i.is_header()).count()
    }

    /// Non-header items still waiting on their probe.
    pub fn pending(&self) -> usize {
        self.items
            .iter()
            .filter(|i| !i.is_header() && !i.loaded)
            .count()
    }

    pub fn loaded(&self) -> usize {
        self.total() - self.pending()
    }

    pub fn is_all_loaded(&self) -> bool {
        self.all_loaded
    }
}

/// Runs one probe; a panicking probe still yields a loaded, empty item.
fn run_job(id: String, pending: Item, job: Job) -> (String, Item) {
    let fallback = pending.clone();
    let mut item = match catch_unwind(AssertUnwindSafe(move || job(pending))) {
        Ok(item) => item,
        Err(_) => {
            warn!(%id, "status probe panicked");
            fallback
        }
    };
    item.loaded = true;
    (id, item)
}

// ============================================================================
// Item list
// ============================================================================

#[derive(Default)]
struct Builder {
    items: Vec<Item>,
    jobs: Vec<(String, Job)>,
}

impl Builder {
    fn header(&mut self, id: String, section: &'static str, sub_section: &str) {
        self.items.push(Item::header(id, section, sub_section));
    }

    fn probe(&mut self, item: Item, job: impl FnOnce(Item) -> Item + Send + 'static) {
        self.jobs.push((item.id.clone(), Box::new(job)));
        self.items.push(item);
    }
}

/// The full, deterministic item list and one probe per non-header item.
pub fn build_items() -> (Vec<Item>, Vec<(String, Job)>) {
    let mut b = Builder::default();

    b.probe(
        Item::new(
            "sysinfo".into(),
            ItemKind::SystemInfo,
            SECTION_SYSTEM,
            "",
            "System Info",
        ),
        |mut item| {
            item.detail = system_info_line();
            item
        },
    );

    b.header("header-setup".into(), SECTION_SYSTEM, "Setup");
    for script in catalog::configurable_scripts() {
        b.probe(setup_item(script), move |mut item| {
            let result = script.check();
            item.installed = result.installed;
            item.detail = result.detail;
            item
        });
    }

    b.header("header-security".into(), SECTION_SYSTEM, "MacOS Security");
    for check in catalog::security_checks() {
        b.probe(health_item("security", ItemKind::Security, "MacOS Security", check), health_job(check));
    }

    b.header("header-identity".into(), SECTION_SYSTEM, "Identity");
    for check in catalog::identity_checks() {
        b.probe(health_item("identity", ItemKind::Identity, "Identity", check), health_job(check));
    }

    for category in ToolCategory::iter() {
        let tools = catalog::tools_by_category(category);
        if tools.is_empty() {
            continue;
        }
        let title = category.to_string();
        b.header(format!("header-tools-{title}"), SECTION_TOOLS, &title);
        for tool in tools {
            b.probe(tool_item(tool, &title), move |mut item| {
                let result = tool.check();
                item.installed = result.installed;
                item.version = result.version;
                item.status = result.status;
                item.detail = result.detail;
                item
            });
        }
    }

    b.header("header-network".into(), SECTION_RESOURCES, "Network");
    for check in catalog::network_checks() {
        b.probe(network_item(check), move |item| item.apply_resource((check.check)()));
    }

    b.header("header-disk".into(), SECTION_RESOURCES, "Disk Usage");
    for check in catalog::disk_checks() {
        b.probe(disk_item("disk", ItemKind::Disk, "Disk Usage", check), move |item| {
            item.apply_resource(check.run())
        });
    }

    b.header("header-cache".into(), SECTION_RESOURCES, "Caches & Cleanable");
    for check in catalog::cache_checks() {
        b.probe(disk_item("cache", ItemKind::Cache, "Caches & Cleanable", check), move |item| {
            item.apply_resource(check.run())
        });
    }

    (b.items, b.jobs)
}

fn setup_item(script: &Script) -> Item {
    Item {
        description: script.description.to_string(),
        ..Item::new(
            format!("setup-{}", script.name),
            ItemKind::Setup,
            SECTION_SYSTEM,
            "Setup",
            script.name,
        )
    }
}

fn health_item(prefix: &str, kind: ItemKind, sub: &str, check: &HealthCheck) -> Item {
    Item {
        description: check.description.to_string(),
        good_when: check.good_when,
        ..Item::new(
            format!("{prefix}-{}", check.name),
            kind,
            SECTION_SYSTEM,
            sub,
            check.name,
        )
    }
}

fn health_job(check: &'static HealthCheck) -> impl FnOnce(Item) -> Item + Send + 'static {
    move |mut item| {
        let result = check.run();
        item.installed = result.installed;
        item.detail = result.detail;
        item
    }
}

fn tool_item(tool: &Tool, sub: &str) -> Item {
    Item {
        description: tool.description.to_string(),
        method: tool.method.label(),
        ..Item::new(
            format!("tool-{}", tool.name),
            ItemKind::Tool,
            SECTION_TOOLS,
            sub,
            tool.name,
        )
    }
}

fn network_item(check: &NetworkCheck) -> Item {
    Item::new(
        format!("network-{}", check.name),
        ItemKind::Network,
        SECTION_RESOURCES,
        "Network",
        check.name,
    )
}

fn disk_item(prefix: &str, kind: ItemKind, sub: &str, check: &DiskCheck) -> Item {
    Item::new(
        format!("{prefix}-{}", check.name),
        kind,
        SECTION_RESOURCES,
        sub,
        check.name,
    )
}

// ============================================================================
// System info
// ============================================================================

fn system_info_line() -> String {
    let os = [System::name(), System::kernel_version()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    let user = std::env::var("USER").unwrap_or_default();
    let shell = std::env::var("SHELL").unwrap_or_default();
    format_system_info(
        &os,
        &System::cpu_arch(),
        &System::host_name().unwrap_or_default(),
        &user,
        &shell,
    )
}

/// `"<os> <arch> • <host> • <user> • <shell>"` with the host cut at its
/// first `.` and to 20 characters, and the shell reduced to its file name.
pub fn format_system_info(os: &str, arch: &str, host: &str, user: &str, shell: &str) -> String {
    let host: String = host
        .split('.')
        .next()
        .unwrap_or_default()
        .chars()
        .take(20)
        .collect();
    let shell = Path::new(shell)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{os} {arch} • {host} • {user} • {shell}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pending(id: &str) -> Item {
        Item::new(id.to_string(), ItemKind::Tool, SECTION_TOOLS, "Test", id)
    }

    fn job(f: impl FnOnce(Item) -> Item + Send + 'static) -> Job {
        Box::new(f)
    }

    // ========================================================================
    // build_items
    // ========================================================================

    #[test]
    fn ids_are_unique_and_jobs_cover_non_headers() {
        let (items, jobs) = build_items();
        let ids: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), items.len());

        let job_ids: HashSet<&str> = jobs.iter().map(|(id, _)| id.as_str()).collect();
        for item in &items {
            assert_eq!(item.is_header(), !job_ids.contains(item.id.as_str()), "{}", item.id);
            assert_eq!(item.is_header(), item.loaded, "{}", item.id);
        }
    }

    #[test]
    fn item_order_follows_sections() {
        let (items, _) = build_items();
        assert_eq!(items[0].id, "sysinfo");
        assert_eq!(items[1].id, "header-setup");

        let position = |id: &str| items.iter().position(|i| i.id == id).unwrap();
        assert!(position("header-security") < position("header-identity"));
        assert!(position("header-identity") < position("header-tools-Package Managers"));
        assert!(position("header-tools-Mac App Store") < position("header-network"));
        assert!(position("header-network") < position("header-disk"));
        assert!(position("header-disk") < position("header-cache"));
        assert!(position("header-tools-Runtimes") < position("tool-go"));
        assert_eq!(items.last().unwrap().id, "cache-trash");
    }

    #[test]
    fn tool_items_carry_method_label() {
        let (items, _) = build_items();
        let claude = items.iter().find(|i| i.id == "tool-claude").unwrap();
        assert_eq!(claude.method, "brew");
        assert_eq!(claude.sub_section, "AI");
        let security = items.iter().find(|i| i.id == "security-filevault").unwrap();
        assert!(security.good_when);
        assert_eq!(security.sub_section, "MacOS Security");
    }

    #[test]
    fn system_info_line_format() {
        assert_eq!(
            format_system_info(
                "Darwin 24.1.0",
                "arm64",
                "my-very-long-macbook-name.local",
                "jb",
                "/bin/zsh"
            ),
            "Darwin 24.1.0 arm64 • my-very-long-macbo • jb • zsh"
        );
        assert_eq!(
            format_system_info("Darwin", "x86_64", "", "", ""),
            "Darwin x86_64 •  •  • "
        );
    }

    // ========================================================================
    // Engine
    // ========================================================================

    #[tokio::test]
    async fn emits_one_update_per_probe_then_all_loaded() {
        let items = vec![
            Item::header("header-x".into(), SECTION_TOOLS, "X"),
            pending("a"),
            pending("b"),
            pending("c"),
        ];
        let jobs: Vec<(String, Job)> = ["a", "b", "c"]
            .into_iter()
            .map(|id| {
                (
                    id.to_string(),
                    job(|mut item| {
                        item.installed = true;
                        item
                    }),
                )
            })
            .collect();
        let mut engine = StatusEngine::from_parts(items, jobs);
        assert_eq!(engine.pending(), 3);

        engine.start();
        let mut updates = Vec::new();
        let mut terminators = 0;
        while let Some(event) = engine.next().await {
            match event {
                StatusEvent::Update { id, .. } => {
                    assert_eq!(terminators, 0, "update after all_loaded");
                    updates.push(id);
                }
                StatusEvent::AllLoaded => terminators += 1,
            }
        }
        updates.sort();
        assert_eq!(updates, ["a", "b", "c"]);
        assert_eq!(terminators, 1);
        assert_eq!(engine.pending(), 0);
        assert_eq!(engine.loaded(), 3);
        assert!(engine.items().iter().all(|i| i.loaded));
        assert!(engine.item("b").unwrap().installed);
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let jobs: Vec<(String, Job)> = vec![("a".into(), job(|item| item))];
        let mut engine = StatusEngine::from_parts(vec![pending("a")], jobs);
        engine.start();
        engine.start();
        engine.wait_all().await;
        assert!(engine.is_all_loaded());
        assert_eq!(engine.pending(), 0);
        assert!(engine.next().await.is_none());
    }

    #[tokio::test]
    async fn panicking_probe_still_loads() {
        let jobs: Vec<(String, Job)> = vec![
            ("a".into(), job(|_| panic!("probe exploded"))),
            ("b".into(), job(|item| item)),
        ];
        let mut engine = StatusEngine::from_parts(vec![pending("a"), pending("b")], jobs);
        engine.start();
        engine.wait_all().await;

        let a = engine.item("a").unwrap();
        assert!(a.loaded);
        assert!(!a.installed);
        assert_eq!(engine.pending(), 0);
    }

    #[test]
    fn unstarted_engine_polls_nothing() {
        let mut engine = StatusEngine::from_parts(vec![pending("a")], Vec::new());
        assert_eq!(engine.poll(), 0);
        assert_eq!(engine.pending(), 1);
    }
}
