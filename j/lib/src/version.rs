//! Per-tool version parsers.
//!
//! Each parser takes the raw output of a tool's version command and returns
//! a canonical version string, or an empty string when nothing matches.
//! Escapes are stripped first so coloured output parses the same as plain.
//!
//! ## Examples
//!
//! ```
//! use j_lib::version;
//!
//! assert_eq!(version::go("go version go1.21.0 darwin/arm64"), "1.21.0");
//! assert_eq!(version::git("git version 2.39.0 (Apple Git-145)"), "2.39.0");
//! ```

use crate::probe::strip_ansi;

/// Signature shared by all parsers.
pub type Parser = fn(&str) -> String;

fn first_line(s: &str) -> String {
    strip_ansi(s.trim())
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

fn first_line_field(s: &str, index: usize, strip_v: bool) -> String {
    let line = first_line(s);
    let field = line.split_whitespace().nth(index).unwrap_or_default();
    if strip_v {
        field.trim_start_matches('v').to_string()
    } else {
        field.to_string()
    }
}

/// Strips whitespace and a leading `v`.
pub fn trim(s: &str) -> String {
    strip_ansi(s.trim()).trim().trim_start_matches('v').to_string()
}

/// `"Homebrew 4.2.0\n..."` → `"4.2.0"`.
pub fn brew(s: &str) -> String {
    first_line_field(s, 1, false)
}

/// `"git version 2.39.0 (Apple Git-145)"` → `"2.39.0"`.
pub fn git(s: &str) -> String {
    let clean = strip_ansi(s.trim());
    let rest = clean.trim().trim_start_matches("git version ");
    match rest.find(" (") {
        Some(idx) => rest[..idx].trim().to_string(),
        None => rest.trim().to_string(),
    }
}

/// `"go version go1.21.0 darwin/arm64"` → `"1.21.0"`.
pub fn go(s: &str) -> String {
    let clean = strip_ansi(s);
    clean
        .split_whitespace()
        .nth(2)
        .map(|field| field.trim_start_matches("go").to_string())
        .unwrap_or_default()
}

/// Text between the first and last `"` on a line mentioning `version`.
pub fn java(s: &str) -> String {
    let clean = strip_ansi(s);
    clean
        .lines()
        .filter(|line| line.contains("version"))
        .find_map(|line| {
            let start = line.find('"')?;
            let end = line.rfind('"')?;
            (end > start).then(|| line[start + 1..end].to_string())
        })
        .unwrap_or_default()
}

/// `"Python 3.12.0"` → `"3.12.0"`.
pub fn python(s: &str) -> String {
    let clean = strip_ansi(s.trim());
    clean.trim().trim_start_matches("Python ").trim().to_string()
}

/// `"rustc 1.84.0 (9fc6b4312 2025-01-07)"` → `"1.84.0"`.
pub fn rust(s: &str) -> String {
    first_line_field(s, 1, false)
}

/// `"Terraform v1.5.7\non darwin_arm64"` → `"1.5.7"`.
pub fn terraform(s: &str) -> String {
    first_line_field(s, 1, true)
}

/// `"ansible [core 2.15.0]"` → `"2.15.0"`, else field 1 of the first line.
pub fn ansible(s: &str) -> String {
    let line = first_line(s);
    if let Some(start) = line.find("[core ") {
        let rest = &line[start + "[core ".len()..];
        if let Some(end) = rest.find(']') {
            return rest[..end].trim().to_string();
        }
    }
    first_line_field(&line, 1, false)
}

/// `"multipass 1.12.0+mac\n..."` → `"1.12.0+mac"`.
pub fn multipass(s: &str) -> String {
    first_line_field(s, 1, false)
}

/// `"codex 0.1.0"` → `"0.1.0"`; a bare version passes through.
pub fn codex(s: &str) -> String {
    let clean = strip_ansi(s.trim());
    let fields: Vec<&str> = clean.split_whitespace().collect();
    if fields.len() >= 2 {
        fields[1].to_string()
    } else {
        clean.trim().to_string()
    }
}

/// Field 2 of the line starting with `"Mole version"`.
pub fn mole(s: &str) -> String {
    strip_ansi(s)
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("Mole version"))
        .and_then(|line| line.split_whitespace().nth(2).map(str::to_string))
        .unwrap_or_default()
}

/// `"2.0.76 (Claude Code)"` → `"2.0.76"`.
pub fn claude(s: &str) -> String {
    strip_ansi(s.trim())
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// First non-empty line.
pub fn tailscale(s: &str) -> String {
    strip_ansi(s)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// `"tmux 3.6a"` → `"3.6a"`.
pub fn tmux(s: &str) -> String {
    first_line_field(s, 1, false)
}

/// `"gh version 2.40.0 (2023-12-13)\nhttps://..."` → `"2.40.0"`.
pub fn gh(s: &str) -> String {
    let line = first_line(s);
    line.strip_prefix("gh version ")
        .and_then(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .unwrap_or_else(|| first_line_field(&line, 2, false))
}

/// Strips the `"happy version:"` prefix of the first line.
pub fn happy_coder(s: &str) -> String {
    let line = first_line(s);
    line.trim_start_matches("happy version:").trim().to_string()
}

/// `"v3.100.0"` → `"3.100.0"`.
pub fn pulumi(s: &str) -> String {
    trim(s)
}

/// Field 1 of the first line.
pub fn eas(s: &str) -> String {
    first_line_field(s, 1, false)
}

/// `"ansible-lint 6.22.1 using ansible-core:2.16.1"` → `"6.22.1"`.
pub fn ansible_lint(s: &str) -> String {
    first_line_field(s, 1, false)
}

/// First non-empty line of `kubectl version --client -o yaml` style output
/// carrying `gitVersion`, with the leading `v` removed.
pub fn kubectl(s: &str) -> String {
    let clean = strip_ansi(s);
    clean
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("gitVersion:"))
        .map(|v| v.trim().trim_matches('"').trim_start_matches('v').to_string())
        .unwrap_or_else(|| {
            clean
                .lines()
                .find_map(|line| line.strip_prefix("Client Version:"))
                .map(|v| v.trim().trim_start_matches('v').to_string())
                .unwrap_or_default()
        })
}
