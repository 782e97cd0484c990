//! Network, disk, cache and process probes.
//!
//! The parsing half of every probe is a pure function over command output so
//! it can be tested without the macOS binaries.

use std::time::Duration;

use super::{ResourceResult, Style};
use crate::probe::{capture, capture_with_timeout, command_exists, expand_home};

#[derive(Debug, Clone, Copy)]
pub struct NetworkCheck {
    pub name: &'static str,
    pub check: fn() -> ResourceResult,
}

/// Size of a directory, or a custom probe.
#[derive(Debug, Clone, Copy)]
pub struct DiskCheck {
    pub name: &'static str,
    /// Supports a leading `~/`.
    pub path: &'static str,
    pub style: Style,
    pub check: Option<fn() -> ResourceResult>,
}

impl DiskCheck {
    const fn path(name: &'static str, path: &'static str, style: Style) -> Self {
        Self {
            name,
            path,
            style,
            check: None,
        }
    }

    const fn custom(name: &'static str, check: fn() -> ResourceResult) -> Self {
        Self {
            name,
            path: "",
            style: Style::Muted,
            check: Some(check),
        }
    }

    pub fn run(&self) -> ResourceResult {
        match self.check {
            Some(check) => check(),
            None => ResourceResult::from_size(&expand_home(self.path), self.style),
        }
    }
}

/// One row of a top-processes listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: String,
    pub name: String,
    /// `"12.3%"` for CPU, `"512M"`/`"1.2G"` for memory.
    pub value: String,
}

static NETWORK_CHECKS: &[NetworkCheck] = &[
    NetworkCheck {
        name: "local ip",
        check: check_local_ip,
    },
    NetworkCheck {
        name: "public ip",
        check: check_public_ip,
    },
    NetworkCheck {
        name: "tailscale",
        check: check_tailscale,
    },
    NetworkCheck {
        name: "vpn",
        check: check_vpn,
    },
    NetworkCheck {
        name: "dns",
        check: check_dns,
    },
    NetworkCheck {
        name: "listening",
        check: check_listening,
    },
];

static DISK_CHECKS: &[DiskCheck] = &[
    DiskCheck::path("~/Developer", "~/Developer", Style::Special),
    DiskCheck::path("/Applications", "/Applications", Style::Muted),
    DiskCheck::path("~/Documents", "~/Documents", Style::Muted),
    DiskCheck::path("~/Downloads", "~/Downloads", Style::Warning),
];

static CACHE_CHECKS: &[DiskCheck] = &[
    DiskCheck::custom("docker", check_docker_cache),
    DiskCheck::path("xcode derived", "~/Library/Developer/Xcode/DerivedData", Style::Muted),
    DiskCheck::path("xcode archives", "~/Library/Developer/Xcode/Archives", Style::Muted),
    DiskCheck::path(
        "ios device support",
        "~/Library/Developer/Xcode/iOS DeviceSupport",
        Style::Muted,
    ),
    DiskCheck::path("cocoapods cache", "~/Library/Caches/CocoaPods", Style::Muted),
    DiskCheck::path("homebrew cache", "~/Library/Caches/Homebrew", Style::Muted),
    DiskCheck::custom("multipass", check_multipass_cache),
    DiskCheck::path("npm cache", "~/.npm", Style::Muted),
    DiskCheck::path("pnpm cache", "~/Library/pnpm", Style::Muted),
    DiskCheck::path("yarn cache", "~/Library/Caches/Yarn", Style::Muted),
    DiskCheck::path("go modules", "~/go/pkg/mod", Style::Muted),
    DiskCheck::path("gradle cache", "~/.gradle/caches", Style::Muted),
    DiskCheck::path("system logs", "/var/log", Style::Muted),
    DiskCheck::path("user logs", "~/Library/Logs", Style::Muted),
    DiskCheck::path("trash", "~/.Trash", Style::Muted),
];

pub fn network_checks() -> &'static [NetworkCheck] {
    NETWORK_CHECKS
}

pub fn disk_checks() -> &'static [DiskCheck] {
    DISK_CHECKS
}

pub fn cache_checks() -> &'static [DiskCheck] {
    CACHE_CHECKS
}

// ============================================================================
// Network
// ============================================================================

fn trimmed_stdout(cmd: &str, args: &[&str]) -> String {
    match capture(cmd, args) {
        Ok(out) if out.success => out.stdout.trim().to_string(),
        _ => String::new(),
    }
}

fn muted_or_unavailable(value: String) -> ResourceResult {
    if value.is_empty() {
        ResourceResult::unavailable()
    } else {
        ResourceResult::new(value, Style::Muted)
    }
}

fn check_local_ip() -> ResourceResult {
    muted_or_unavailable(trimmed_stdout("ipconfig", &["getifaddr", "en0"]))
}

fn check_public_ip() -> ResourceResult {
    let ip = capture_with_timeout(
        "curl",
        &["-s", "--max-time", "2", "-4", "ifconfig.me"],
        Duration::from_secs(2),
    )
    .ok()
    .filter(|out| out.success)
    .map(|out| out.stdout.trim().to_string())
    .unwrap_or_default();
    muted_or_unavailable(ip)
}

fn check_tailscale() -> ResourceResult {
    let status = match capture("tailscale", &["status", "--json"]) {
        Ok(out) if out.success => out.stdout,
        _ => return ResourceResult::unavailable(),
    };
    if !status.contains(r#""BackendState":"Running""#)
        && !status.contains(r#""BackendState": "Running""#)
    {
        return ResourceResult::new("disconnected", Style::Muted);
    }
    match trimmed_stdout("tailscale", &["ip", "-4"]) {
        ip if ip.is_empty() => ResourceResult::new("connected", Style::Success),
        ip => ResourceResult::new(ip, Style::Success),
    }
}

/// Name of the first connected service in `scutil --nc list` output.
pub(crate) fn parse_vpn(list: &str) -> ResourceResult {
    let Some(line) = list.lines().find(|l| l.contains("(Connected)")) else {
        return ResourceResult::unavailable();
    };
    let name = line.rfind('"').and_then(|end| {
        let start = line[..end].rfind('"')?;
        Some(&line[start + 1..end])
    });
    ResourceResult::new(name.unwrap_or("connected"), Style::Success)
}

fn check_vpn() -> ResourceResult {
    parse_vpn(&trimmed_stdout("scutil", &["--nc", "list"]))
}

/// Up to three distinct non-loopback nameservers from `scutil --dns`.
pub(crate) fn parse_dns(output: &str) -> ResourceResult {
    let mut servers: Vec<&str> = Vec::new();
    for line in output.lines().filter(|l| l.contains("nameserver[")) {
        let Some(idx) = line.find("] : ") else {
            continue;
        };
        let server = line[idx + 4..].trim();
        if server.is_empty() || server == "127.0.0.1" || server == "::1" {
            continue;
        }
        if !servers.contains(&server) && servers.len() < 3 {
            servers.push(server);
        }
    }
    muted_or_unavailable(servers.join(", "))
}

fn check_dns() -> ResourceResult {
    parse_dns(&trimmed_stdout("scutil", &["--dns"]))
}

fn port_label(port: &str) -> Option<&'static str> {
    Some(match port {
        "22" => "ssh",
        "80" => "http",
        "443" => "https",
        "3000" => "dev",
        "5432" => "postgres",
        "3306" => "mysql",
        "6379" => "redis",
        "27017" => "mongo",
        "8080" => "http-alt",
        "9000" => "php-fpm",
        "5000" => "flask",
        _ => return None,
    })
}

/// Listening TCP ports from `lsof -iTCP -sTCP:LISTEN -P -n`, as
/// `label:port` for the first four and `+N` for the rest.
pub(crate) fn parse_listening(output: &str) -> ResourceResult {
    let mut ports: Vec<(&str, &str)> = Vec::new();
    for line in output.trim().lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 9 {
            continue;
        }
        let Some(idx) = fields[8].rfind(':') else {
            continue;
        };
        let port = &fields[8][idx + 1..];
        if !ports.iter().any(|(p, _)| *p == port) {
            ports.push((port, fields[0]));
        }
    }

    if ports.is_empty() {
        return ResourceResult::new("none", Style::Muted);
    }

    let shown: Vec<String> = ports
        .iter()
        .take(4)
        .map(|(port, cmd)| format!("{}:{port}", port_label(port).unwrap_or(*cmd)))
        .collect();
    let mut value = shown.join(", ");
    if ports.len() > shown.len() {
        value.push_str(&format!(" +{}", ports.len() - shown.len()));
    }
    ResourceResult::new(value, Style::Muted)
}

fn check_listening() -> ResourceResult {
    match capture("lsof", &["-iTCP", "-sTCP:LISTEN", "-P", "-n"]) {
        Ok(out) => parse_listening(&out.stdout),
        Err(_) => ResourceResult::new("none", Style::Muted),
    }
}

// ============================================================================
// Caches
// ============================================================================

fn check_docker_cache() -> ResourceResult {
    if !command_exists("docker") {
        return ResourceResult::unavailable();
    }
    let sizes = trimmed_stdout("docker", &["system", "df", "--format", "{{.Size}}"]);
    let lines: Vec<&str> = sizes.lines().collect();
    match lines.first() {
        Some(first) if !first.is_empty() => ResourceResult::new(lines.join(" + "), Style::Muted),
        _ => ResourceResult::unavailable(),
    }
}

fn check_multipass_cache() -> ResourceResult {
    if !command_exists("multipass") {
        return ResourceResult::unavailable();
    }
    ResourceResult::from_size(
        &expand_home("~/Library/Application Support/multipassd"),
        Style::Muted,
    )
}

// ============================================================================
// Processes
// ============================================================================

const TOP_N: usize = 5;

fn parse_ps(output: &str, format_value: impl Fn(&str) -> String) -> Vec<ProcessInfo> {
    output
        .trim()
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            (fields.len() >= 3).then(|| ProcessInfo {
                pid: fields[0].to_string(),
                value: format_value(fields[1]),
                name: fields[2..].join(" "),
            })
        })
        .take(TOP_N)
        .collect()
}

pub(crate) fn parse_cpu(output: &str) -> Vec<ProcessInfo> {
    parse_ps(output, |cpu| format!("{cpu}%"))
}

/// RSS is reported in KB.
pub(crate) fn format_rss(kb: &str) -> String {
    match kb.parse::<u64>() {
        Ok(kb) => {
            let mb = kb / 1024;
            if mb >= 1024 {
                format!("{:.1}G", mb as f64 / 1024.0)
            } else {
                format!("{mb}M")
            }
        }
        Err(_) => format!("{kb}K"),
    }
}

pub(crate) fn parse_memory(output: &str) -> Vec<ProcessInfo> {
    parse_ps(output, format_rss)
}

/// Top five processes by CPU.
pub fn top_cpu() -> Vec<ProcessInfo> {
    match capture("ps", &["-arcwwwxo", "pid,%cpu,comm"]) {
        Ok(out) if out.success => parse_cpu(&out.stdout),
        _ => Vec::new(),
    }
}

/// Top five processes by resident memory.
pub fn top_memory() -> Vec<ProcessInfo> {
    match capture("ps", &["-amcwwwxo", "pid,rss,comm"]) {
        Ok(out) if out.success => parse_memory(&out.stdout),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ========================================================================
    // Network parsers
    // ========================================================================

    #[test]
    fn vpn_name_from_connected_line() {
        let list = "Available network connection services in the current set (*=enabled):\n\
                    * (Disconnected)   AAAA IPSec \"Office\"\n\
                    * (Connected)      BBBB IPSec \"Home VPN\"\n";
        assert_eq!(parse_vpn(list), ResourceResult::new("Home VPN", Style::Success));
    }

    #[test]
    fn vpn_without_quotes_or_connection() {
        assert_eq!(
            parse_vpn("* (Connected) BBBB PPP"),
            ResourceResult::new("connected", Style::Success)
        );
        assert_eq!(parse_vpn("* (Disconnected) x"), ResourceResult::unavailable());
    }

    #[test]
    fn dns_dedupes_skips_loopback_and_caps_at_three() {
        let output = "resolver #1\n  nameserver[0] : 1.1.1.1\n  nameserver[1] : 127.0.0.1\n\
                      resolver #2\n  nameserver[0] : 1.1.1.1\n  nameserver[1] : 8.8.8.8\n\
                      nameserver[2] : ::1\n  nameserver[3] : 9.9.9.9\n  nameserver[4] : 8.8.4.4\n";
        assert_eq!(
            parse_dns(output),
            ResourceResult::new("1.1.1.1, 8.8.8.8, 9.9.9.9", Style::Muted)
        );
        assert_eq!(parse_dns(""), ResourceResult::unavailable());
    }

    #[test]
    fn listening_labels_known_ports() {
        let output = "COMMAND   PID USER   FD   TYPE DEVICE SIZE/OFF NODE NAME\n\
                      postgres  101 me    7u  IPv4 0x1      0t0  TCP 127.0.0.1:5432 (LISTEN)\n\
                      node      202 me    9u  IPv6 0x2      0t0  TCP *:3000 (LISTEN)\n\
                      node      202 me   10u  IPv4 0x3      0t0  TCP *:3000 (LISTEN)\n\
                      rapportd  303 me    4u  IPv4 0x4      0t0  TCP *:49152 (LISTEN)\n";
        assert_eq!(
            parse_listening(output),
            ResourceResult::new("postgres:5432, dev:3000, rapportd:49152", Style::Muted)
        );
    }

    #[test]
    fn listening_caps_at_four_with_remainder() {
        let mut output = String::from("COMMAND PID USER FD TYPE DEVICE SIZE NODE NAME\n");
        for port in [1001, 1002, 1003, 1004, 1005, 1006] {
            output.push_str(&format!("svc 1 me 3u IPv4 0x0 0t0 TCP *:{port} (LISTEN)\n"));
        }
        let result = parse_listening(&output);
        assert!(result.value.ends_with(" +2"), "{}", result.value);
        assert_eq!(result.value.matches("svc:").count(), 4);
    }

    #[test]
    fn listening_with_header_only_is_none() {
        assert_eq!(
            parse_listening("COMMAND PID USER FD TYPE DEVICE SIZE NODE NAME\n"),
            ResourceResult::new("none", Style::Muted)
        );
    }

    // ========================================================================
    // Disk
    // ========================================================================

    #[test]
    fn disk_checks_styles() {
        let styles: Vec<(&str, Style)> = disk_checks().iter().map(|d| (d.name, d.style)).collect();
        assert_eq!(
            styles,
            [
                ("~/Developer", Style::Special),
                ("/Applications", Style::Muted),
                ("~/Documents", Style::Muted),
                ("~/Downloads", Style::Warning)
            ]
        );
        assert_eq!(cache_checks().len(), 15);
    }

    #[test]
    fn path_check_reports_size() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f"), vec![1u8; 1536]).unwrap();
        let path: &'static str = Box::leak(dir.path().to_string_lossy().into_owned().into_boxed_str());
        let check = DiskCheck::path("tmp", path, Style::Warning);
        assert_eq!(check.run(), ResourceResult::new("1.5 KB", Style::Warning));
    }

    // ========================================================================
    // Processes
    // ========================================================================

    #[test]
    fn cpu_listing_takes_top_five() {
        let mut output = String::from("  PID  %CPU COMM\n");
        for i in 0..7 {
            output.push_str(&format!("{} {}.0 Some App {i}\n", 100 + i, 50 - i));
        }
        let top = parse_cpu(&output);
        assert_eq!(top.len(), 5);
        assert_eq!(
            top[0],
            ProcessInfo {
                pid: "100".into(),
                name: "Some App 0".into(),
                value: "50.0%".into()
            }
        );
    }

    #[test]
    fn rss_formatting() {
        assert_eq!(format_rss("524288"), "512M");
        assert_eq!(format_rss("1258291"), "1.2G");
        assert_eq!(format_rss("abc"), "abcK");
    }

    #[test]
    fn memory_listing_formats_rss() {
        let output = "  PID    RSS COMM\n  1 2097152 WindowServer\n  2 1024 launchd\n";
        let top = parse_memory(output);
        assert_eq!(top[0].value, "2.0G");
        assert_eq!(top[1].value, "1M");
    }
}
