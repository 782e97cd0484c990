//! Remote access lifecycle over a userspace `tailscaled`.
//!
//! [`RemoteManager`] owns every file under `~/.config/jterrazz/tailscale`:
//! the daemon socket, state, log and PID, plus the PID of the `caffeinate`
//! helper that keeps the machine awake while connected. Both helpers run in
//! their own session so they survive `j` exiting.
//!
//! ## Examples
//!
//! ```no_run
//! use j_lib::remote::RemoteManager;
//!
//! let manager = RemoteManager::new();
//! let settings = manager.load_settings()?;
//! let report = manager.up(&settings)?;
//! println!("connected in {} mode", report.mode);
//! # Ok::<(), j_lib::error::RemoteError>(())
//! ```
//!
//! ## Errors
//!
//! Lifecycle calls return [`RemoteError`]. The one recoverable client failure,
//! the "mention all non-default flags" refusal, is retried once with merged
//! flags before anything is surfaced.

pub mod flags;
pub mod process;
pub mod settings;
pub mod tailscale;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::ConfigPaths;
use crate::error::{ConfigError, RemoteError};
use crate::probe::command_exists;

pub use flags::{
    Flag, format_command_error, merge_up_args, needs_flag_retry, parse_cli_flags,
    parse_suggested_up_flags,
};
pub use settings::{AuthMethod, JrcConfig, RemoteMode, RemoteSettings};
pub use tailscale::ClientStatus;

const READY_TIMEOUT: Duration = Duration::from_secs(4);
const READY_POLL: Duration = Duration::from_millis(250);
const KEEP_AWAKE: &str = "caffeinate";

/// Snapshot of the connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteStatus {
    pub mode: RemoteMode,
    pub backend_state: String,
    pub hostname: String,
    pub ip: String,
    pub connected: bool,
    pub keep_awake: bool,
}

impl RemoteStatus {
    fn from_client(mode: RemoteMode, client: &ClientStatus, keep_awake: bool) -> Self {
        Self {
            mode,
            backend_state: client.backend_state.clone(),
            hostname: client.hostname(),
            ip: client.ip(),
            connected: client.connected(),
            keep_awake,
        }
    }
}

/// Result of a successful bring-up.
#[derive(Debug)]
pub struct UpReport {
    /// Mode actually used.
    pub mode: RemoteMode,
    /// Set when the keep-awake helper could not be started.
    pub keep_awake_error: Option<RemoteError>,
}

/// `up --ssh [--hostname H] [--auth-key K]`
pub fn build_up_args(settings: &RemoteSettings) -> Vec<String> {
    let mut args = vec!["up".to_string(), "--ssh".to_string()];
    if !settings.hostname.is_empty() {
        args.push("--hostname".to_string());
        args.push(settings.hostname.clone());
    }
    if settings.auth_method == AuthMethod::Authkey {
        args.push("--auth-key".to_string());
        args.push(settings.secret.clone());
    }
    args
}

/// Drives the VPN daemon, client and keep-awake helper.
#[derive(Debug, Clone, Default)]
pub struct RemoteManager {
    paths: ConfigPaths,
}

impl RemoteManager {
    pub fn new() -> Self {
        Self::with_paths(ConfigPaths::new())
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn load_settings(&self) -> Result<RemoteSettings, ConfigError> {
        settings::load_settings(&self.paths)
    }

    pub fn save_settings(&self, settings: &RemoteSettings) -> Result<(), ConfigError> {
        settings::save_settings(&self.paths, settings)
    }

    pub fn has_settings(&self) -> bool {
        settings::has_settings(&self.paths)
    }

    fn socket_for(&self, mode: RemoteMode) -> Option<PathBuf> {
        (mode.effective() == RemoteMode::Userspace).then(|| self.paths.socket())
    }

    // ========================================================================
    // Userspace daemon
    // ========================================================================

    fn daemon_ready(&self) -> bool {
        tailscale::query_status(Some(&self.paths.socket())).is_ok()
    }

    /// Starts `tailscaled` in userspace-networking mode unless it already
    /// answers on its socket, then waits up to four seconds for readiness.
    pub fn ensure_userspace_daemon(&self) -> Result<(), RemoteError> {
        if self.daemon_ready() {
            debug!("userspace daemon already running");
            return Ok(());
        }
        if !command_exists(tailscale::DAEMON) {
            return Err(RemoteError::MissingDaemon(tailscale::DAEMON.to_string()));
        }

        let dir = self.paths.userspace_dir();
        settings::ensure_private_dir(&dir)
            .map_err(|e| RemoteError::io("failed to create userspace directory", e))?;

        let log_path = self.paths.daemon_log();
        let log = open_log(&log_path)
            .map_err(|e| RemoteError::io("failed to open tailscaled log file", e))?;
        let log_err = log
            .try_clone()
            .map_err(|e| RemoteError::io("failed to open tailscaled log file", e))?;

        let args = vec![
            "--tun=userspace-networking".to_string(),
            format!("--state={}", self.paths.state().display()),
            format!("--socket={}", self.paths.socket().display()),
        ];
        let child = process::spawn_detached(tailscale::DAEMON, &args, log.into(), log_err.into())
            .map_err(|e| RemoteError::io("failed to start userspace tailscaled", e))?;
        info!(pid = child.id(), "started userspace tailscaled");
        if let Err(e) = process::write_pid(&self.paths.daemon_pid(), child.id()) {
            warn!(error = %e, "failed to record tailscaled pid");
        }
        drop(child);

        let deadline = Instant::now() + READY_TIMEOUT;
        while Instant::now() < deadline {
            if self.daemon_ready() {
                return Ok(());
            }
            thread::sleep(READY_POLL);
        }
        Err(RemoteError::DaemonNotReady { log: log_path })
    }

    /// Terminates the recorded daemon. A missing or invalid PID is ignored.
    pub fn stop_daemon(&self) {
        let path = self.paths.daemon_pid();
        if let Some(pid) = process::pid_from_file(&path) {
            info!(pid, "stopping userspace tailscaled");
            process::terminate(pid);
            let _ = fs::remove_file(&path);
        }
    }

    // ========================================================================
    // Keep-awake
    // ========================================================================

    pub fn is_keep_awake_running(&self) -> bool {
        process::pid_file_alive(&self.paths.keep_awake_pid())
    }

    /// Starts `caffeinate -i` when available and not already running.
    pub fn ensure_keep_awake(&self) -> Result<(), RemoteError> {
        if !command_exists(KEEP_AWAKE) || self.is_keep_awake_running() {
            return Ok(());
        }
        settings::ensure_private_dir(&self.paths.userspace_dir())
            .map_err(|e| RemoteError::io("failed to create userspace directory", e))?;

        let args = vec!["-i".to_string()];
        let child = process::spawn_detached(KEEP_AWAKE, &args, Stdio::null(), Stdio::null())
            .map_err(|e| RemoteError::io("failed to start caffeinate", e))?;

        if let Err(e) = process::write_pid(&self.paths.keep_awake_pid(), child.id()) {
            process::terminate(child.id() as i32);
            return Err(RemoteError::io("failed to persist caffeinate pid", e));
        }
        info!(pid = child.id(), "started keep-awake");
        drop(child);
        Ok(())
    }

    pub fn stop_keep_awake(&self) {
        debug!("stopping keep-awake");
        process::stop_pid_file(&self.paths.keep_awake_pid());
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Brings the node up and returns the mode used.
    ///
    /// ## Errors
    ///
    /// - [`RemoteError::Config`] when the settings do not validate.
    /// - [`RemoteError::MissingClient`] without the `tailscale` CLI.
    /// - [`RemoteError::Tailscale`] with the client's `Error:` line.
    pub fn up(&self, settings: &RemoteSettings) -> Result<UpReport, RemoteError> {
        settings.validate()?;
        if !command_exists(tailscale::CLIENT) {
            return Err(RemoteError::MissingClient);
        }

        let mode = settings.mode.effective();
        if mode == RemoteMode::Userspace {
            self.ensure_userspace_daemon()?;
        }

        let socket = self.socket_for(mode);
        let up_args = build_up_args(settings);
        let first = tailscale::run_tee(&tailscale::client_args(socket.as_deref(), &up_args))?;
        if first.success {
            return Ok(self.finish_up(mode));
        }

        if needs_flag_retry(&first.output) {
            let suggested = parse_suggested_up_flags(&first.output);
            if !suggested.is_empty() {
                let merged = merge_up_args(&up_args, &suggested);
                info!(?suggested, "retrying tailscale up with current non-default flags");
                let retry = tailscale::run_tee(&tailscale::client_args(socket.as_deref(), &merged))?;
                if retry.success {
                    return Ok(self.finish_up(mode));
                }
                return Err(RemoteError::Tailscale(format_command_error(
                    &retry.output,
                    &retry.failure,
                )));
            }
            debug!("refusal carried no suggested command, not retrying");
        }

        Err(RemoteError::Tailscale(format_command_error(
            &first.output,
            &first.failure,
        )))
    }

    fn finish_up(&self, mode: RemoteMode) -> UpReport {
        let keep_awake_error = if mode == RemoteMode::Userspace {
            self.ensure_keep_awake().err()
        } else {
            None
        };
        if let Some(e) = &keep_awake_error {
            warn!(error = %e, "keep-awake did not start");
        }
        UpReport {
            mode,
            keep_awake_error,
        }
    }

    /// Takes the node down, then stops keep-awake and the daemon.
    ///
    /// The helpers are stopped even when `down` fails; that failure is
    /// returned afterwards.
    pub fn down(&self, settings: &RemoteSettings) -> Result<RemoteMode, RemoteError> {
        let mode = settings.mode.effective();
        let socket = self.socket_for(mode);
        let result = tailscale::run_tee(&tailscale::client_args(socket.as_deref(), &["down"]));
        self.stop_keep_awake();
        self.stop_daemon();

        let out = result?;
        if out.success {
            Ok(mode)
        } else {
            Err(RemoteError::Tailscale(format_command_error(
                &out.output,
                &out.failure,
            )))
        }
    }

    /// Queries the client for the current connection state.
    pub fn status(&self, settings: &RemoteSettings) -> Result<RemoteStatus, RemoteError> {
        let mode = settings.mode.effective();
        let socket = self.socket_for(mode);
        let client = tailscale::query_status(socket.as_deref())?;
        Ok(RemoteStatus::from_client(
            mode,
            &client,
            self.is_keep_awake_running(),
        ))
    }
}

fn open_log(path: &Path) -> std::io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::ffi::OsString;
    use tempfile::TempDir;

    fn manager() -> (TempDir, RemoteManager) {
        let dir = TempDir::new().unwrap();
        let manager = RemoteManager::with_paths(ConfigPaths::with_home(dir.path()));
        (dir, manager)
    }

    #[test]
    fn up_args_follow_settings() {
        assert_eq!(build_up_args(&RemoteSettings::default()), ["up", "--ssh"]);
        let settings = RemoteSettings {
            mode: RemoteMode::Auto,
            auth_method: AuthMethod::Authkey,
            secret: "tskey-abc".into(),
            hostname: "worker".into(),
        };
        assert_eq!(
            build_up_args(&settings),
            ["up", "--ssh", "--hostname", "worker", "--auth-key", "tskey-abc"]
        );
    }

    #[test]
    fn up_rejects_invalid_settings_before_touching_anything() {
        let (_dir, manager) = manager();
        let invalid = RemoteSettings {
            auth_method: AuthMethod::Authkey,
            ..RemoteSettings::default()
        };
        let err = manager.up(&invalid).unwrap_err();
        assert!(matches!(err, RemoteError::Config(ConfigError::MissingSecret)));
        assert!(!manager.paths().userspace_dir().exists());
    }

    #[test]
    fn stale_keep_awake_pid_is_cleared() {
        let (_dir, manager) = manager();
        let pid_path = manager.paths().keep_awake_pid();
        fs::create_dir_all(pid_path.parent().unwrap()).unwrap();
        fs::write(&pid_path, "99999999").unwrap();

        assert!(!manager.is_keep_awake_running());
        assert!(!pid_path.exists());
    }

    #[test]
    fn stopping_helpers_without_pid_files_is_silent() {
        let (_dir, manager) = manager();
        manager.stop_keep_awake();
        manager.stop_daemon();
        assert!(!manager.paths().keep_awake_pid().exists());
    }

    #[test]
    fn settings_round_trip_through_manager() {
        let (_dir, manager) = manager();
        assert!(!manager.has_settings());
        let settings = RemoteSettings {
            hostname: "worker".into(),
            ..RemoteSettings::default()
        };
        manager.save_settings(&settings).unwrap();
        assert!(manager.has_settings());
        assert_eq!(manager.load_settings().unwrap(), settings);
    }

    #[test]
    fn status_maps_client_fields() {
        let client = ClientStatus::parse(
            r#"{"BackendState":"Running","Self":{"HostName":"","DNSName":"w.ts.net.","TailscaleIPs":["100.1.2.3"]}}"#,
        )
        .unwrap();
        let status = RemoteStatus::from_client(RemoteMode::Userspace, &client, true);
        assert_eq!(
            status,
            RemoteStatus {
                mode: RemoteMode::Userspace,
                backend_state: "Running".into(),
                hostname: "w.ts.net.".into(),
                ip: "100.1.2.3".into(),
                connected: true,
                keep_awake: true,
            }
        );
    }

    // ========================================================================
    // Flag retry against a stand-in client
    // ========================================================================

    /// Prepends a directory to `PATH` until dropped.
    struct PathPrefix {
        original: Option<OsString>,
    }

    impl PathPrefix {
        fn new(dir: &Path) -> Self {
            let original = std::env::var_os("PATH");
            let mut paths = vec![dir.to_path_buf()];
            if let Some(current) = &original {
                paths.extend(std::env::split_paths(current));
            }
            let joined = std::env::join_paths(paths).unwrap();
            unsafe { std::env::set_var("PATH", joined) };
            Self { original }
        }
    }

    impl Drop for PathPrefix {
        fn drop(&mut self) {
            match &self.original {
                Some(value) => unsafe { std::env::set_var("PATH", value) },
                None => unsafe { std::env::remove_var("PATH") },
            }
        }
    }

    /// Answers `status` as a running daemon, refuses the first `up` with the
    /// non-default flags message and fails every later `up`.
    const FAKE_CLIENT: &str = r#"#!/bin/sh
dir="$(dirname "$0")"
for arg in "$@"; do
  if [ "$arg" = status ]; then
    echo '{"BackendState":"Stopped"}'
    exit 0
  fi
done
echo "$*" >> "$dir/calls"
if [ ! -f "$dir/refused" ]; then
  touch "$dir/refused"
  echo "Error: changing settings via 'tailscale up' requires mentioning all" >&2
  echo "non-default flags. To proceed, either re-run your command with --reset or" >&2
  echo "use the command below to explicitly mention the current value of" >&2
  echo "all non-default settings:" >&2
  echo "" >&2
  echo "	tailscale up --ssh --hostname=old --accept-routes" >&2
  exit 1
fi
echo "Error: login server unreachable" >&2
echo "Error: try again later" >&2
exit 1
"#;

    #[cfg(unix)]
    fn install_fake_client(bin: &Path) {
        use std::os::unix::fs::PermissionsExt;

        fs::create_dir_all(bin).unwrap();
        let script = bin.join(tailscale::CLIENT);
        fs::write(&script, FAKE_CLIENT).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn refused_up_is_retried_once_with_merged_flags() {
        let (dir, manager) = manager();
        let bin = dir.path().join("bin");
        install_fake_client(&bin);
        let _path = PathPrefix::new(&bin);

        let settings = RemoteSettings::default();
        let err = manager.up(&settings).unwrap_err();
        match err {
            RemoteError::Tailscale(message) => assert_eq!(message, "login server unreachable"),
            other => panic!("unexpected {other:?}"),
        }

        let calls = fs::read_to_string(bin.join("calls")).unwrap();
        let calls: Vec<&str> = calls.lines().collect();
        let socket = manager.paths().socket();
        let desired = build_up_args(&settings);
        let suggested: Vec<String> = ["--ssh", "--hostname=old", "--accept-routes"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let merged = merge_up_args(&desired, &suggested);
        assert_eq!(
            merged,
            ["up", "--ssh", "--hostname=old", "--accept-routes"]
        );
        assert_eq!(
            calls,
            [
                tailscale::client_args(Some(socket.as_path()), &desired).join(" "),
                tailscale::client_args(Some(socket.as_path()), &merged).join(" "),
            ]
        );
    }
}
