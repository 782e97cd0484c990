//! `tailscale up` flag handling for the "mention all non-default flags" retry.
//!
//! When `tailscale up` is re-run with a partial set of flags, the client
//! refuses and prints the full command it would accept. These helpers detect
//! that refusal, pull the suggested flags out of the message and merge them
//! with the flags the user asked for, the user's values winning.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static NON_DEFAULT_FLAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"requires mentioning all\s+non-default flags").expect("valid retry pattern")
});

/// One flag and the tokens that spell it (`["--hostname", "x"]`, `["--ssh"]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub key: String,
    pub tokens: Vec<String>,
}

/// Whether the output is the client's "non-default flags" refusal.
pub fn needs_flag_retry(output: &str) -> bool {
    NON_DEFAULT_FLAGS.is_match(&output.to_lowercase())
}

/// Flags from the `tailscale up …` line the client suggests, if any.
pub fn parse_suggested_up_flags(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("tailscale up "))
        .find_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            (fields.len() > 2).then(|| fields[2..].iter().map(|f| f.to_string()).collect())
        })
        .unwrap_or_default()
}

/// Groups `--key value`, `--key=value` and bare `--key` tokens.
///
/// A token that does not start with `--` and does not follow a flag is
/// skipped.
pub fn parse_cli_flags<S: AsRef<str>>(tokens: &[S]) -> Vec<Flag> {
    let mut flags = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_ref();
        i += 1;
        if !token.starts_with("--") {
            continue;
        }
        if let Some((key, _)) = token.split_once('=') {
            flags.push(Flag {
                key: key.to_string(),
                tokens: vec![token.to_string()],
            });
            continue;
        }
        let mut group = vec![token.to_string()];
        if let Some(next) = tokens.get(i).map(AsRef::as_ref)
            && !next.starts_with("--")
        {
            group.push(next.to_string());
            i += 1;
        }
        flags.push(Flag {
            key: token.to_string(),
            tokens: group,
        });
    }
    flags
}

/// Merges the user's `up` arguments with the client's suggested flags.
///
/// Suggested order is kept; a flag present in both takes the desired tokens;
/// desired flags the client did not mention are appended. The result always
/// starts with `up`.
pub fn merge_up_args(desired: &[String], suggested: &[String]) -> Vec<String> {
    let desired = match desired.first() {
        Some(first) if first == "up" => &desired[1..],
        _ => desired,
    };
    let desired_flags = parse_cli_flags(desired);
    let suggested_flags = parse_cli_flags(suggested);

    let mut merged = vec!["up".to_string()];
    let mut used = HashSet::new();
    for flag in &suggested_flags {
        match desired_flags.iter().find(|d| d.key == flag.key) {
            Some(wanted) => {
                merged.extend(wanted.tokens.iter().cloned());
                used.insert(wanted.key.as_str());
            }
            None => merged.extend(flag.tokens.iter().cloned()),
        }
    }

    let suggested_keys: HashSet<&str> = suggested_flags.iter().map(|f| f.key.as_str()).collect();
    for flag in &desired_flags {
        if !used.contains(flag.key.as_str()) && !suggested_keys.contains(flag.key.as_str()) {
            merged.extend(flag.tokens.iter().cloned());
        }
    }
    merged
}

/// The client's first `Error:` line, else the fallback message.
pub fn format_command_error(output: &str, fallback: &str) -> String {
    crate::probe::first_error_line(output).unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const REFUSAL: &str = "Warning: ...
Error: changing settings via 'tailscale up' requires mentioning all
non-default flags. To proceed, either re-run your command with --reset or
use the command below to explicitly mention the current value of
all non-default settings:

        tailscale up --ssh --accept-routes --hostname old-host
";

    #[test]
    fn detects_wrapped_refusal() {
        assert!(needs_flag_retry(REFUSAL));
        assert!(needs_flag_retry(
            "Error: changing settings via 'tailscale up' REQUIRES mentioning all\nnon-default flags."
        ));
        assert!(!needs_flag_retry("Error: bad auth key"));
    }

    #[test]
    fn parses_suggested_flags() {
        assert_eq!(
            parse_suggested_up_flags(REFUSAL),
            strings(&["--ssh", "--accept-routes", "--hostname", "old-host"])
        );
        assert!(parse_suggested_up_flags("tailscale up").is_empty());
        assert!(parse_suggested_up_flags("no suggestion here").is_empty());
    }

    #[test]
    fn groups_flag_shapes() {
        let flags = parse_cli_flags(&["stray", "--a=1", "--b", "2", "--c", "--d"]);
        let keys: Vec<&str> = flags.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["--a", "--b", "--c", "--d"]);
        assert_eq!(flags[0].tokens, ["--a=1"]);
        assert_eq!(flags[1].tokens, ["--b", "2"]);
        assert_eq!(flags[2].tokens, ["--c"]);
    }

    #[test]
    fn desired_values_win_and_extras_append() {
        let desired = strings(&["up", "--ssh", "--hostname", "worker-new", "--auth-key", "tskey-abc"]);
        let suggested = strings(&["--ssh", "--accept-routes", "--hostname", "worker-old"]);
        assert_eq!(
            merge_up_args(&desired, &suggested),
            strings(&[
                "up",
                "--ssh",
                "--accept-routes",
                "--hostname",
                "worker-new",
                "--auth-key",
                "tskey-abc"
            ])
        );
    }

    #[test]
    fn equals_form_matches_spaced_form() {
        let desired = strings(&["--hostname", "new"]);
        let suggested = strings(&["--hostname=old", "--ssh"]);
        assert_eq!(
            merge_up_args(&desired, &suggested),
            strings(&["up", "--hostname", "new", "--ssh"])
        );
    }

    #[test]
    fn error_line_is_preferred() {
        assert_eq!(
            format_command_error("noise\n  Error: backend error: invalid key  \n", "exit 1"),
            "backend error: invalid key"
        );
        assert_eq!(format_command_error("no marker", "exit status 1"), "exit status 1");
    }
}
