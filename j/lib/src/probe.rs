//! Probe primitives: command lookup, output capture, directory sizing.
//!
//! Every catalog entry is built from these helpers. Captures keep stdout and
//! stderr apart but expose a merged, escape-free view since several tools
//! (`java -version`, `brew --version`) print their version on stderr.
//!
//! ## Examples
//!
//! ```
//! use j_lib::probe::{format_bytes, strip_ansi};
//!
//! assert_eq!(strip_ansi("\x1b[32mok\x1b[0m"), "ok");
//! assert_eq!(format_bytes(1024), "1.0 KB");
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ProbeError;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("valid ANSI pattern"));

/// Output of a finished external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    /// Whether the process exited with status zero.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    /// Stdout followed by stderr, with terminal escapes removed.
    pub fn text(&self) -> String {
        let mut merged = String::with_capacity(self.stdout.len() + self.stderr.len());
        merged.push_str(&self.stdout);
        merged.push_str(&self.stderr);
        strip_ansi(&merged)
    }

    /// Trimmed, escape-free stdout.
    pub fn stdout_trimmed(&self) -> String {
        strip_ansi(self.stdout.trim())
    }
}

/// Returns true when `name` resolves on `PATH`.
pub fn command_exists(name: &str) -> bool {
    !name.is_empty() && which::which(name).is_ok()
}

/// Removes `ESC [ <params> <final>` sequences.
pub fn strip_ansi(s: &str) -> String {
    ANSI_ESCAPE.replace_all(s, "").into_owned()
}

/// Runs a command to completion and captures both streams.
///
/// ## Errors
///
/// Returns [`ProbeError::Spawn`] when the process cannot be started. A
/// non-zero exit is reported through [`Captured::success`], not as an error.
pub fn capture(cmd: &str, args: &[&str]) -> Result<Captured, ProbeError> {
    debug!(command = cmd, ?args, "capture");
    let output = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ProbeError::Spawn {
            command: cmd.to_string(),
            source,
        })?;

    Ok(Captured {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Like [`capture`], but kills the process once `timeout` has elapsed.
///
/// ## Errors
///
/// Returns [`ProbeError::Timeout`] when the deadline passes first.
pub fn capture_with_timeout(
    cmd: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<Captured, ProbeError> {
    debug!(command = cmd, ?args, ?timeout, "capture with timeout");
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProbeError::Spawn {
            command: cmd.to_string(),
            source,
        })?;

    // Pipes are drained while polling; a full pipe would stall the child.
    let stdout = child.stdout.take().map(|pipe| thread::spawn(move || drain(pipe)));
    let stderr = child.stderr.take().map(|pipe| thread::spawn(move || drain(pipe)));

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ProbeError::Timeout {
                        command: cmd.to_string(),
                        secs: timeout.as_secs(),
                    });
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(source) => {
                let _ = child.kill();
                return Err(ProbeError::Spawn {
                    command: cmd.to_string(),
                    source,
                });
            }
        }
    };

    let collect = |handle: Option<thread::JoinHandle<Vec<u8>>>| {
        handle
            .and_then(|h| h.join().ok())
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    };
    Ok(Captured {
        success: status.success(),
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn drain(mut pipe: impl Read) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf);
    buf
}

/// Trimmed stdout of a successful run, or an empty string.
pub fn read_command_output_line(cmd: &str, args: &[&str]) -> String {
    match capture(cmd, args) {
        Ok(out) if out.success => out.stdout_trimmed(),
        _ => String::new(),
    }
}

/// Runs a command attached to the terminal.
///
/// ## Errors
///
/// Returns [`ProbeError::Failed`] on a non-zero exit.
pub fn run(cmd: &str, args: &[&str]) -> Result<(), ProbeError> {
    debug!(command = cmd, ?args, "run");
    wait_attached(Command::new(cmd), cmd, args)
}

/// Like [`run`], with `dir` as the working directory.
pub fn run_in(dir: &Path, cmd: &str, args: &[&str]) -> Result<(), ProbeError> {
    debug!(command = cmd, ?args, dir = %dir.display(), "run");
    let mut command = Command::new(cmd);
    command.current_dir(dir);
    wait_attached(command, cmd, args)
}

fn wait_attached(mut command: Command, cmd: &str, args: &[&str]) -> Result<(), ProbeError> {
    let status = command
        .args(args)
        .status()
        .map_err(|source| ProbeError::Spawn {
            command: cmd.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        let code = status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        Err(ProbeError::Failed {
            command: cmd.to_string(),
            message: format!("{cmd} {} exited with status {code}", args.join(" ")),
        })
    }
}

/// Runs a script through `/bin/bash -c`, attached to the terminal.
pub fn run_shell(script: &str) -> Result<(), ProbeError> {
    run("/bin/bash", &["-c", script])
}

/// First line starting with `Error:`, with the prefix removed.
pub fn first_error_line(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("Error:"))
        .map(|rest| rest.trim().to_string())
}

/// The current user's home directory, falling back to `$HOME`.
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    expand_home_in(path, &home_dir())
}

pub(crate) fn expand_home_in(path: &str, home: &Path) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None if path == "~" => home.to_path_buf(),
        None => PathBuf::from(path),
    }
}

/// Recursive sum of regular-file sizes. Unreadable entries are skipped and a
/// missing path yields 0.
pub fn directory_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

/// Formats a byte count with binary units: `"512 B"`, `"1.5 KB"`, `"2.0 GB"`.
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const SUFFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < SUFFIXES.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.1} {}B", bytes as f64 / div as f64, SUFFIXES[exp])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // ========================================================================
    // strip_ansi
    // ========================================================================

    #[test]
    fn strip_ansi_leaves_plain_text() {
        assert_eq!(strip_ansi("plain text"), "plain text");
    }

    #[test]
    fn strip_ansi_removes_color_codes() {
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(strip_ansi("\x1b[1;32mbold green\x1b[0m"), "bold green");
        assert_eq!(strip_ansi("no\x1b[33mcolor\x1b[0mhere"), "nocolorhere");
    }

    // ========================================================================
    // format_bytes
    // ========================================================================

    #[test]
    fn format_bytes_boundaries() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_048_576), "1.0 MB");
        assert_eq!(format_bytes(1_073_741_824), "1.0 GB");
        assert_eq!(format_bytes(1_099_511_627_776), "1.0 TB");
    }

    // ========================================================================
    // Paths and sizes
    // ========================================================================

    #[test]
    fn expand_home_replaces_tilde_prefix() {
        let home = Path::new("/Users/test");
        assert_eq!(
            expand_home_in("~/.config/zed", home),
            PathBuf::from("/Users/test/.config/zed")
        );
        assert_eq!(expand_home_in("/var/log", home), PathBuf::from("/var/log"));
        assert_eq!(expand_home_in("~other", home), PathBuf::from("~other"));
    }

    #[test]
    fn directory_size_of_missing_path_is_zero() {
        let dir = TempDir::new().unwrap();
        assert_eq!(directory_size(&dir.path().join("nope")), 0);
    }

    #[test]
    fn directory_size_sums_nested_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.bin"), vec![0u8; 100]).unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        fs::write(dir.path().join("nested/b.bin"), vec![0u8; 50]).unwrap();
        fs::write(dir.path().join("nested/deeper/c.bin"), vec![0u8; 25]).unwrap();

        assert_eq!(directory_size(dir.path()), 175);
    }

    // ========================================================================
    // Process helpers
    // ========================================================================

    #[test]
    fn first_error_line_extracts_message() {
        let output = "some noise\n  Error: changing settings requires mentioning all\nmore";
        assert_eq!(
            first_error_line(output).as_deref(),
            Some("changing settings requires mentioning all")
        );
        assert_eq!(first_error_line("all good"), None);
    }

    #[test]
    fn command_exists_rejects_empty_and_unknown_names() {
        assert!(!command_exists(""));
        assert!(!command_exists("definitely-not-a-real-binary-4c1d"));
    }

    #[test]
    fn capture_reports_spawn_failure() {
        let err = capture("definitely-not-a-real-binary-4c1d", &[]).unwrap_err();
        assert!(matches!(err, ProbeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn capture_merges_stdout_and_stderr() {
        let out = capture("sh", &["-c", "echo out; echo err 1>&2"]).unwrap();
        assert!(out.success);
        assert_eq!(out.text(), "out\nerr\n");
    }

    #[cfg(unix)]
    #[test]
    fn capture_with_timeout_reads_output_larger_than_a_pipe_buffer() {
        let out = capture_with_timeout(
            "sh",
            &["-c", "head -c 200000 /dev/zero | tr '\\0' a; echo done >&2"],
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.len(), 200_000);
        assert_eq!(out.stderr.trim(), "done");
    }

    #[cfg(unix)]
    #[test]
    fn capture_with_timeout_kills_slow_process() {
        let err = capture_with_timeout("sleep", &["5"], Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn read_command_output_line_trims_and_ignores_failures() {
        assert_eq!(read_command_output_line("echo", &["  hi  "]), "hi");
        assert_eq!(read_command_output_line("false", &[]), "");
    }
}
