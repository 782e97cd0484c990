//! Filesystem layout and user identity.
//!
//! Every path the tool writes lives under `~/.config/jterrazz`. [`ConfigPaths`]
//! can be rooted at any directory so tests never touch the real home.

use std::path::{Path, PathBuf};

use crate::probe;

/// Email used for git commits, GPG and SSH keys.
pub const USER_EMAIL: &str = "admin@jterrazz.com";

/// Name used for GPG key generation.
pub const USER_NAME: &str = "Jean-Baptiste Music";

/// Checkout locations searched for bundled configuration files.
const REPO_ROOTS: [&str; 2] = ["~/Developer/jterrazz-cli", "/usr/local/share/jterrazz-cli"];

/// Resolved locations of persisted config and runtime state.
///
/// ## Examples
///
/// ```
/// use j_lib::config::ConfigPaths;
/// use std::path::Path;
///
/// let paths = ConfigPaths::with_home("/Users/me");
/// assert_eq!(paths.jrc(), Path::new("/Users/me/.config/jterrazz/jrc.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    home: PathBuf,
}

impl ConfigPaths {
    /// Paths under the current user's home directory.
    pub fn new() -> Self {
        Self::with_home(probe::home_dir())
    }

    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `~/.config/jterrazz`
    pub fn config_dir(&self) -> PathBuf {
        self.home.join(".config").join("jterrazz")
    }

    pub fn jrc(&self) -> PathBuf {
        self.config_dir().join("jrc.json")
    }

    pub fn debug_log(&self) -> PathBuf {
        self.config_dir().join("j-debug.log")
    }

    /// Directory holding the userspace daemon's socket, state, log and PIDs.
    pub fn userspace_dir(&self) -> PathBuf {
        self.config_dir().join("tailscale")
    }

    pub fn socket(&self) -> PathBuf {
        self.userspace_dir().join("tailscaled.sock")
    }

    pub fn state(&self) -> PathBuf {
        self.userspace_dir().join("tailscaled.state")
    }

    pub fn daemon_log(&self) -> PathBuf {
        self.userspace_dir().join("tailscaled.log")
    }

    pub fn daemon_pid(&self) -> PathBuf {
        self.userspace_dir().join("tailscaled.pid")
    }

    pub fn keep_awake_pid(&self) -> PathBuf {
        self.userspace_dir().join("caffeinate.pid")
    }

    /// First existing `<root>/<relative>` across the known checkouts.
    pub fn repo_file(&self, relative: &str) -> Option<PathBuf> {
        REPO_ROOTS
            .iter()
            .map(|root| probe::expand_home_in(root, &self.home).join(relative))
            .find(|path| path.exists())
    }
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn runtime_files_live_under_userspace_dir() {
        let paths = ConfigPaths::with_home("/h");
        let dir = PathBuf::from("/h/.config/jterrazz/tailscale");
        assert_eq!(paths.socket(), dir.join("tailscaled.sock"));
        assert_eq!(paths.state(), dir.join("tailscaled.state"));
        assert_eq!(paths.daemon_log(), dir.join("tailscaled.log"));
        assert_eq!(paths.daemon_pid(), dir.join("tailscaled.pid"));
        assert_eq!(paths.keep_awake_pid(), dir.join("caffeinate.pid"));
    }

    #[test]
    fn repo_file_finds_developer_checkout() {
        let home = TempDir::new().unwrap();
        let target = home
            .path()
            .join("Developer/jterrazz-cli/configuration/applications/zed");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("settings.json"), "{}").unwrap();

        let paths = ConfigPaths::with_home(home.path());
        assert_eq!(
            paths.repo_file("configuration/applications/zed/settings.json"),
            Some(target.join("settings.json"))
        );
        assert_eq!(paths.repo_file("configuration/missing"), None);
    }
}
