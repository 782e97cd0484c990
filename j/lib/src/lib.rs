//! Core library for the `j` workstation assistant.
//!
//! Everything `j` knows about the machine lives here; the CLI crate only parses
//! arguments and renders.
//!
//! ## Catalog and probes
//!
//! - [`catalog`] - Static registry of tools, scripts, cleanables, checks and
//!   package managers, each carrying its own detection and actions
//! - [`probe`] - Command lookup, output capture, ANSI stripping, sizing
//! - [`version`] - Per-tool version-string parsers
//!
//! ## Operations
//!
//! - [`resolver`] - Dependency-ordered install plans
//! - [`actions`] - Install, upgrade, clean and run-script executors
//! - [`status`] - [`StatusEngine`], the parallel probe fan-out behind `j status`
//! - [`remote`] - [`RemoteManager`], userspace VPN daemon and keep-awake lifecycle
//! - [`skills`] - Wrapper over the external `skills` CLI
//! - [`shortcuts`] - `j run` git and docker shortcuts
//! - [`sync`] - Template synchronisation through `copier`
//!
//! ## Configuration
//!
//! - [`ConfigPaths`] - Every persisted path, rootable at any home directory

pub mod actions;
pub mod catalog;
pub mod config;
pub mod error;
pub mod probe;
pub mod remote;
pub mod resolver;
pub mod shortcuts;
pub mod skills;
pub mod status;
pub mod sync;
pub mod version;

pub use config::ConfigPaths;
pub use error::{ActionError, ConfigError, ProbeError, RemoteError, SkillError};
pub use remote::{RemoteManager, RemoteSettings, RemoteStatus};
pub use status::{Item, StatusEngine, StatusEvent};
