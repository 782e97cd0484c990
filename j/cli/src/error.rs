use j_lib::{ActionError, ConfigError, RemoteError, SkillError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Skill(#[from] SkillError),

    #[error("prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error("TUI error: {0}")]
    Tui(std::io::Error),

    #[error("debug log error: {0}")]
    DebugLog(std::io::Error),

    #[error("failed to start async runtime: {0}")]
    Runtime(std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Some items of a list operation failed; each was already reported.
    #[error("{failed} of {total} {what} failed")]
    Partial {
        failed: usize,
        total: usize,
        what: &'static str,
    },

    #[error("{0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Turns a failure count from a tolerant loop into the command result.
pub fn partial(failed: usize, total: usize, what: &'static str) -> Result<()> {
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::Partial {
            failed,
            total,
            what,
        })
    }
}
