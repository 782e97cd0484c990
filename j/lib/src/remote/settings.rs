//! Persisted remote-access settings in `jrc.json`.
//!
//! Legacy values written by older releases (`mode: "system"`,
//! `auth_method: "none"`) and empty strings are migrated as they are parsed,
//! so a loaded [`RemoteSettings`] always holds a current mode and method.
//! Writes go to `jrc.json.tmp` first and are renamed into place.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, info};

use crate::config::ConfigPaths;
use crate::error::ConfigError;

/// How the VPN client runs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RemoteMode {
    /// Reserved for a system daemon; currently behaves like userspace.
    Auto,
    #[default]
    Userspace,
}

impl RemoteMode {
    /// The mode actually driven. `auto` has no system daemon path yet.
    pub fn effective(self) -> Self {
        match self {
            Self::Auto | Self::Userspace => Self::Userspace,
        }
    }
}

impl FromStr for RemoteMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "system" | "userspace" => Ok(Self::Userspace),
            "auto" => Ok(Self::Auto),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for RemoteMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How `tailscale up` authenticates the node.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AuthMethod {
    /// Interactive browser login.
    #[default]
    Oauth,
    /// Pre-generated auth key stored as the secret.
    Authkey,
}

impl FromStr for AuthMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" | "oauth" => Ok(Self::Oauth),
            "authkey" => Ok(Self::Authkey),
            other => Err(ConfigError::InvalidAuthMethod(other.to_string())),
        }
    }
}

impl TryFrom<String> for AuthMethod {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The `remote` object of `jrc.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default)]
    pub mode: RemoteMode,
    #[serde(default)]
    pub auth_method: AuthMethod,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
}

impl RemoteSettings {
    /// ## Errors
    ///
    /// [`ConfigError::MissingSecret`] when `authkey` has a blank secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth_method == AuthMethod::Authkey && self.secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(())
    }
}

/// Whole-file view of `jrc.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JrcConfig {
    #[serde(default)]
    pub remote: RemoteSettings,
}

/// Loads `jrc.json`; a missing or blank file yields defaults.
///
/// ## Errors
///
/// [`ConfigError::Read`] on I/O failure and [`ConfigError::Parse`] for
/// malformed JSON or unknown mode/method values.
pub fn load_config(paths: &ConfigPaths) -> Result<JrcConfig, ConfigError> {
    let path = paths.jrc();
    let data = match fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no jrc.json, using defaults");
            return Ok(JrcConfig::default());
        }
        Err(e) => return Err(ConfigError::Read(e)),
    };
    if data.trim().is_empty() {
        return Ok(JrcConfig::default());
    }
    serde_json::from_str(&data).map_err(ConfigError::Parse)
}

/// Validates and atomically writes `jrc.json` at `0600` in a `0700` directory.
pub fn save_config(paths: &ConfigPaths, config: &JrcConfig) -> Result<(), ConfigError> {
    config.remote.validate()?;

    let path = paths.jrc();
    let dir = paths.config_dir();
    ensure_private_dir(&dir).map_err(|source| ConfigError::Write {
        path: dir.clone(),
        source,
    })?;

    let mut out = serde_json::to_string_pretty(config).map_err(ConfigError::Encode)?;
    out.push('\n');

    let tmp = path.with_extension("json.tmp");
    write_private(&tmp, out.as_bytes()).map_err(|source| ConfigError::Write {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, &path).map_err(|source| ConfigError::Write {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "saved jrc.json");
    Ok(())
}

pub fn load_settings(paths: &ConfigPaths) -> Result<RemoteSettings, ConfigError> {
    Ok(load_config(paths)?.remote)
}

/// Replaces the `remote` object, keeping the rest of the file.
pub fn save_settings(paths: &ConfigPaths, settings: &RemoteSettings) -> Result<(), ConfigError> {
    let mut config = load_config(paths)?;
    config.remote = settings.clone();
    save_config(paths, &config)
}

/// True when `jrc.json` exists and holds valid settings.
pub fn has_settings(paths: &ConfigPaths) -> bool {
    paths.jrc().exists() && load_settings(paths).is_ok_and(|s| s.validate().is_ok())
}

// ============================================================================
// Private files
// ============================================================================

/// Creates `dir` (and parents) and restricts it to the owner.
pub(crate) fn ensure_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

/// Writes `data` to a fresh owner-only file.
pub(crate) fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let _ = fs::remove_file(path);
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}
