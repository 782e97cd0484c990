//! Detached helper processes tracked through PID files.
//!
//! Helpers are started in their own session so they outlive `j`, and their
//! liveness is re-checked with signal 0 on every access.

use std::fs;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use tracing::debug;

use super::settings::write_private;

/// Reads a positive PID from `path`.
pub fn pid_from_file(path: &Path) -> Option<i32> {
    fs::read_to_string(path)
        .ok()?
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|pid| *pid > 0)
}

/// Writes `pid` to an owner-only file.
pub fn write_pid(path: &Path, pid: u32) -> std::io::Result<()> {
    write_private(path, pid.to_string().as_bytes())
}

/// Signal-0 liveness test. A permission error still means the process exists.
#[cfg(unix)]
pub fn process_running(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    // SAFETY: kill with signal 0 performs only the existence and permission check.
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub fn process_running(_pid: i32) -> bool {
    false
}

/// Sends SIGTERM; failures are ignored.
#[cfg(unix)]
pub fn terminate(pid: i32) {
    if pid <= 0 {
        return;
    }
    debug!(pid, "sending SIGTERM");
    // SAFETY: plain signal delivery to a PID we recorded.
    unsafe {
        libc::kill(pid, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
pub fn terminate(_pid: i32) {}

/// Whether the PID recorded in `path` is alive. A stale file is removed.
pub fn pid_file_alive(path: &Path) -> bool {
    match pid_from_file(path) {
        Some(pid) if process_running(pid) => true,
        Some(pid) => {
            debug!(pid, path = %path.display(), "removing stale pid file");
            let _ = fs::remove_file(path);
            false
        }
        None => false,
    }
}

/// Terminates the process recorded in `path` and removes the file.
pub fn stop_pid_file(path: &Path) {
    if let Some(pid) = pid_from_file(path) {
        terminate(pid);
    }
    let _ = fs::remove_file(path);
}

/// Spawns `cmd` in a new session with the given stdio and stdin detached.
pub fn spawn_detached(
    cmd: &str,
    args: &[String],
    stdout: Stdio,
    stderr: Stdio,
) -> std::io::Result<Child> {
    let mut command = Command::new(cmd);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // SAFETY: setsid is async-signal-safe and touches no parent state.
        unsafe {
            command.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }

    debug!(command = cmd, ?args, "spawning detached");
    command.spawn()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn pid_file_parsing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.pid");
        assert_eq!(pid_from_file(&path), None);

        fs::write(&path, " 4242\n").unwrap();
        assert_eq!(pid_from_file(&path), Some(4242));

        fs::write(&path, "0").unwrap();
        assert_eq!(pid_from_file(&path), None);
        fs::write(&path, "garbage").unwrap();
        assert_eq!(pid_from_file(&path), None);
    }

    #[cfg(unix)]
    #[test]
    fn own_process_is_running() {
        assert!(process_running(std::process::id() as i32));
        assert!(!process_running(99_999_999));
        assert!(!process_running(0));
    }

    #[test]
    fn stale_pid_file_is_removed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("caffeinate.pid");
        fs::write(&path, "99999999").unwrap();
        assert!(!pid_file_alive(&path));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn written_pid_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.pid");
        write_pid(&path, 123).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "123");
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn stopping_missing_pid_is_silent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("none.pid");
        stop_pid_file(&path);
        fs::write(&path, "not a pid").unwrap();
        stop_pid_file(&path);
        assert!(!path.exists());
    }
}
