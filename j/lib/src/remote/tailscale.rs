//! Invoking the `tailscale` client.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use serde::Deserialize;
use tracing::debug;

use crate::error::RemoteError;
use crate::probe;

pub const CLIENT: &str = "tailscale";
pub const DAEMON: &str = "tailscaled";

/// Subset of `tailscale status --json` the manager reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientStatus {
    #[serde(rename = "BackendState", default)]
    pub backend_state: String,
    #[serde(rename = "Self", default)]
    pub self_node: Option<SelfNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SelfNode {
    #[serde(rename = "HostName", default)]
    pub host_name: String,
    #[serde(rename = "DNSName", default)]
    pub dns_name: String,
    #[serde(rename = "TailscaleIPs", default)]
    pub tailscale_ips: Vec<String>,
}

impl ClientStatus {
    pub fn parse(json: &str) -> Result<Self, RemoteError> {
        serde_json::from_str(json).map_err(RemoteError::StatusParse)
    }

    pub fn connected(&self) -> bool {
        self.backend_state == "Running"
    }

    /// `HostName`, falling back to `DNSName`.
    pub fn hostname(&self) -> String {
        self.self_node
            .as_ref()
            .map(|node| {
                if node.host_name.is_empty() {
                    node.dns_name.clone()
                } else {
                    node.host_name.clone()
                }
            })
            .unwrap_or_default()
    }

    pub fn ip(&self) -> String {
        self.self_node
            .as_ref()
            .and_then(|node| node.tailscale_ips.first().cloned())
            .unwrap_or_default()
    }
}

/// Prefixes `--socket <path>` when talking to a userspace daemon.
pub fn client_args<S: AsRef<str>>(socket: Option<&Path>, args: &[S]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len() + 2);
    if let Some(socket) = socket {
        out.push("--socket".to_string());
        out.push(socket.display().to_string());
    }
    out.extend(args.iter().map(|a| a.as_ref().to_string()));
    out
}

/// Output of a client run that was shown live on the terminal.
#[derive(Debug, Clone, Default)]
pub struct TeeOutput {
    pub success: bool,
    /// Stdout then stderr, as printed.
    pub output: String,
    /// Exit description when the run failed.
    pub failure: String,
}

/// Runs the client with stdin inherited, copying its output to the terminal
/// while keeping a copy for error parsing.
pub fn run_tee(args: &[String]) -> Result<TeeOutput, RemoteError> {
    debug!(?args, "running tailscale");
    let mut child = Command::new(CLIENT)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| RemoteError::io("failed to run tailscale", e))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_handle = thread::spawn(move || tee(stdout, std::io::stdout()));
    let err_handle = thread::spawn(move || tee(stderr, std::io::stderr()));

    let status = child
        .wait()
        .map_err(|e| RemoteError::io("failed to wait for tailscale", e))?;
    let mut output = out_handle.join().unwrap_or_default();
    output.push_str(&err_handle.join().unwrap_or_default());

    let failure = if status.success() {
        String::new()
    } else {
        match status.code() {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    };
    Ok(TeeOutput {
        success: status.success(),
        output,
        failure,
    })
}

fn tee<R: Read, W: Write>(source: Option<R>, mut sink: W) -> String {
    let Some(mut source) = source else {
        return String::new();
    };
    let mut captured = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match source.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let _ = sink.write_all(&buf[..n]);
                let _ = sink.flush();
                captured.extend_from_slice(&buf[..n]);
            }
        }
    }
    String::from_utf8_lossy(&captured).into_owned()
}

/// `tailscale status --json` against `socket`, stdout only.
pub fn query_status(socket: Option<&Path>) -> Result<ClientStatus, RemoteError> {
    let args = client_args(socket, &["status", "--json"]);
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let out = probe::capture(CLIENT, &refs).map_err(|e| RemoteError::Tailscale(e.to_string()))?;
    if !out.success {
        let text = out.text();
        let message = probe::first_error_line(&text)
            .unwrap_or_else(|| format!("tailscale status failed: {}", text.trim()));
        return Err(RemoteError::Tailscale(message));
    }
    ClientStatus::parse(&out.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn socket_prefix() {
        let socket = PathBuf::from("/tmp/ts.sock");
        assert_eq!(
            client_args(Some(socket.as_path()), &["down"]),
            ["--socket", "/tmp/ts.sock", "down"]
        );
        assert_eq!(client_args::<&str>(None, &["up", "--ssh"]), ["up", "--ssh"]);
    }

    #[test]
    fn status_json_fields() {
        let status = ClientStatus::parse(
            r#"{
                "Version": "1.76.1",
                "BackendState": "Running",
                "Self": {
                    "HostName": "worker",
                    "DNSName": "worker.tail1234.ts.net.",
                    "TailscaleIPs": ["100.64.0.7", "fd7a:115c:a1e0::7"]
                }
            }"#,
        )
        .unwrap();
        assert!(status.connected());
        assert_eq!(status.hostname(), "worker");
        assert_eq!(status.ip(), "100.64.0.7");
    }

    #[test]
    fn status_falls_back_to_dns_name_and_tolerates_missing_self() {
        let status = ClientStatus::parse(
            r#"{"BackendState":"NeedsLogin","Self":{"HostName":"","DNSName":"box.ts.net."}}"#,
        )
        .unwrap();
        assert!(!status.connected());
        assert_eq!(status.hostname(), "box.ts.net.");
        assert_eq!(status.ip(), "");

        let bare = ClientStatus::parse(r#"{"BackendState":"Stopped"}"#).unwrap();
        assert_eq!(bare.hostname(), "");
    }

    #[test]
    fn malformed_status_is_a_parse_error() {
        let err = ClientStatus::parse("not json").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse tailscale status output"));
    }
}
