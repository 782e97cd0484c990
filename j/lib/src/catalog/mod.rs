//! The static registry of everything `j` can inspect or act on.
//!
//! Each entry carries its own detection, install, upgrade and clean behaviour
//! as plain function pointers, so adding a tool means adding one record to
//! one table. Collections are immutable for the life of the process.
//!
//! ## Examples
//!
//! ```
//! use j_lib::catalog::{self, ToolCategory};
//!
//! let git = catalog::tool_by_name("git").unwrap();
//! assert_eq!(git.category, ToolCategory::TerminalGit);
//! assert!(catalog::installable_tools().iter().all(|t| t.is_installable()));
//! ```

pub mod checks;
pub mod cleanables;
pub mod package_managers;
pub mod resources;
pub mod scripts;
pub mod skills;
pub mod tools;

use std::path::Path;

use strum::{Display, EnumIter, IntoStaticStr};

use crate::error::Result;
use crate::probe;

pub use checks::{HealthCheck, identity_checks, security_checks};
pub use cleanables::{Cleanable, available_cleanables, cleanable_by_name, cleanables};
pub use package_managers::{PackageManager, package_manager_by_flag, package_managers};
pub use resources::{
    DiskCheck, NetworkCheck, ProcessInfo, cache_checks, disk_checks, network_checks, top_cpu,
    top_memory,
};
pub use scripts::{
    Script, ScriptCategory, configurable_scripts, script_by_name, scripts, scripts_for_tool,
    standalone_scripts,
};
pub use skills::{
    Skill, SkillRepo, favorite_skills, is_favorite_skill, skill_repo_by_name, skill_repos,
};
pub use tools::{
    InstallMethod, Tool, ToolCategory, VersionSource, all_tools, installable_tools,
    tool_by_name, tools_by_category,
};

/// Outcome of a detection probe.
///
/// `status` carries runtime state (`"running"`) or counts
/// (`"199 formulae, 6 casks"`); `detail` carries paths or account names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckResult {
    pub installed: bool,
    pub version: String,
    pub status: String,
    pub detail: String,
}

impl CheckResult {
    pub fn not_installed() -> Self {
        Self::default()
    }

    pub fn installed() -> Self {
        Self {
            installed: true,
            ..Self::default()
        }
    }

    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            installed: true,
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self {
            installed: true,
            detail: detail.into(),
            ..Self::default()
        }
    }

    /// Healthy/unhealthy result carrying a detail either way.
    pub fn flag(installed: bool, detail: impl Into<String>) -> Self {
        Self {
            installed,
            detail: detail.into(),
            ..Self::default()
        }
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}

/// Semantic colour token; the UI decides what it looks like.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Style {
    Success,
    Warning,
    #[default]
    Muted,
    Special,
}

/// Outcome of a network, disk or cache probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceResult {
    pub value: String,
    pub style: Style,
    pub available: bool,
}

impl ResourceResult {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn new(value: impl Into<String>, style: Style) -> Self {
        Self {
            value: value.into(),
            style,
            available: true,
        }
    }

    /// Formatted size of `path`, or unavailable when it is empty or missing.
    pub fn from_size(path: &Path, style: Style) -> Self {
        match probe::directory_size(path) {
            0 => Self::unavailable(),
            size => Self::new(probe::format_bytes(size), style),
        }
    }
}

/// Receives the progress lines scripts and custom actions emit.
///
/// The library never decides how these look; the CLI maps each call onto its
/// output module and tests can record them.
pub trait Reporter {
    /// A step is starting.
    fn step(&self, message: &str);
    /// A step finished successfully.
    fn done(&self, message: &str);
    /// Secondary information.
    fn note(&self, message: &str);
    /// Unstyled output such as a public key.
    fn line(&self, message: &str);
    /// A non-fatal failure.
    fn error(&self, message: &str);
}

/// Reporter that forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn step(&self, message: &str) {
        tracing::info!(target: "j::script", "{message}");
    }
    fn done(&self, message: &str) {
        tracing::info!(target: "j::script", "{message}");
    }
    fn note(&self, message: &str) {
        tracing::debug!(target: "j::script", "{message}");
    }
    fn line(&self, message: &str) {
        tracing::info!(target: "j::script", "{message}");
    }
    fn error(&self, message: &str) {
        tracing::warn!(target: "j::script", "{message}");
    }
}

/// Signature of a script body.
pub type ScriptFn = fn(&dyn Reporter) -> Result<()>;

/// Signature of a custom install, upgrade or clean action.
pub type ActionFn = fn() -> Result<()>;
