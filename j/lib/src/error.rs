//! Error types for the workstation library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while spawning or reading an external command.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The binary does not resolve on `PATH`.
    #[error("{0} not found")]
    NotFound(String),

    /// The process could not be started.
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a non-zero status.
    #[error("{message}")]
    Failed { command: String, message: String },

    /// The process was killed after exceeding its time budget.
    #[error("{command} timed out after {secs}s")]
    Timeout { command: String, secs: u64 },
}

/// Errors raised by the install, upgrade, clean and run-script executors.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown script: {0}")]
    UnknownScript(String),

    #[error("Unknown cleanable: {0}")]
    UnknownCleanable(String),

    #[error("unknown package: {0}")]
    UnknownPackage(String),

    #[error("Unknown run group: {0}")]
    UnknownGroup(String),

    #[error("Unknown command: {group} {name}")]
    UnknownShortcut { group: String, name: String },

    #[error("usage: j run {usage}")]
    MissingArguments { usage: String },

    /// A declared dependency is not present on the machine.
    #[error("{dependency} required for {tool}. Run: j install {dependency}")]
    MissingDependency { tool: String, dependency: String },

    /// The install method has no automatic path (nvm, xcode, manual, mas).
    #[error("cannot auto-install {name} (method: {method})")]
    CannotAutoInstall { name: String, method: String },

    #[error("cannot auto-upgrade {name} (method: {method})")]
    CannotAutoUpgrade { name: String, method: String },

    /// A required command is missing for a custom action.
    #[error("{0} not installed")]
    MissingCommand(String),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading or writing `jrc.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHome,

    #[error("failed to read jrc.json: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to parse jrc.json: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to encode jrc.json: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid remote mode: {0}")]
    InvalidMode(String),

    #[error("invalid auth_method: {0}")]
    InvalidAuthMethod(String),

    #[error("secret is required when auth_method is authkey")]
    MissingSecret,
}

/// Errors raised by the remote-access lifecycle.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0} is required for userspace mode")]
    MissingDaemon(String),

    #[error("tailscale CLI not found")]
    MissingClient,

    #[error("userspace tailscaled did not become ready (check {})", log.display())]
    DaemonNotReady { log: PathBuf },

    /// The VPN client rejected the command; carries its `Error:` line.
    #[error("{0}")]
    Tailscale(String),

    #[error("failed to parse tailscale status output: {0}")]
    StatusParse(#[source] serde_json::Error),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl RemoteError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Errors raised while driving the external `skills` CLI.
#[derive(Debug, Error)]
pub enum SkillError {
    #[error("skills CLI not installed. Run: j install skills")]
    MissingCli,

    #[error("invalid skill name: {0}")]
    InvalidName(String),

    #[error("{0}")]
    Command(String),
}

/// Convenience alias for executor results.
pub type Result<T> = std::result::Result<T, ActionError>;
