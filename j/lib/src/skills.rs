//! Wrapper over the external `skills` CLI.
//!
//! Installs and removes are global (`-g`) and non-interactive (`-y`). Output
//! parsing is split into pure functions so it can be exercised without the
//! CLI.
//!
//! ## Examples
//!
//! ```
//! use j_lib::skills::{is_valid_name, parse_repo_listing};
//!
//! assert!(is_valid_name("frontend-design"));
//! let output = "◇  Available Skills\n│\n│    qmd\n└  Use --skill <name>\n";
//! assert_eq!(parse_repo_listing(output), ["qmd"]);
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::SkillError;
use crate::probe::{self, Captured};

const CLI: &str = "skills";

/// Deepest indent a skill name may have in a repo listing; descriptions sit
/// deeper.
const MAX_NAME_INDENT: usize = 5;

static BOX_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[│├└┌◇]").expect("valid box-drawing pattern"));

static SKILL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("valid skill name pattern"));

/// Lines of `skills list -g` that are banners rather than skill names.
const BANNER_PHRASES: [&str; 3] = ["No global skills", "Global", "Skills"];

pub fn is_valid_name(name: &str) -> bool {
    SKILL_NAME.is_match(name)
}

pub fn is_cli_installed() -> bool {
    probe::command_exists(CLI)
}

/// Skill names from `skills add <repo> --list` output.
pub fn parse_repo_listing(output: &str) -> Vec<String> {
    let clean = probe::strip_ansi(output);
    clean
        .lines()
        .skip_while(|line| !line.contains("Available Skills"))
        .skip(1)
        .take_while(|line| !line.contains("Use --skill"))
        .filter_map(|line| {
            let cleaned = BOX_CHARS.replace_all(line, "");
            let indent = cleaned.len() - cleaned.trim_start_matches(' ').len();
            let trimmed = cleaned.trim();
            (indent <= MAX_NAME_INDENT
                && !trimmed.contains(char::is_whitespace)
                && is_valid_name(trimmed))
            .then(|| trimmed.to_string())
        })
        .collect()
}

/// Installed skill names from `skills list -g` output.
pub fn parse_installed_listing(output: &str) -> Vec<String> {
    probe::strip_ansi(output)
        .lines()
        .filter(|line| !line.starts_with([' ', '\t']))
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with("Try ")
                && !BANNER_PHRASES.iter().any(|p| line.contains(p))
        })
        .filter_map(|line| line.split_whitespace().next())
        .filter(|name| !name.starts_with(['/', '~']) && !name.contains(':'))
        .map(str::to_string)
        .collect()
}

fn run(args: &[&str]) -> Result<Captured, SkillError> {
    if !is_cli_installed() {
        return Err(SkillError::MissingCli);
    }
    debug!(?args, "running skills");
    probe::capture(CLI, args).map_err(|e| SkillError::Command(e.to_string()))
}

fn run_checked(args: &[&str]) -> Result<(), SkillError> {
    let out = run(args)?;
    if out.success {
        Ok(())
    } else {
        Err(SkillError::Command(out.text().trim().to_string()))
    }
}

/// Globally installed skills; empty when the CLI is missing or fails.
pub fn list_installed() -> Vec<String> {
    match run(&["list", "-g"]) {
        Ok(out) if out.success => parse_installed_listing(&out.stdout),
        _ => Vec::new(),
    }
}

/// Skills published by `repo`.
pub fn list_from_repo(repo: &str) -> Result<Vec<String>, SkillError> {
    let out = run(&["add", repo, "--list"])?;
    if !out.success {
        return Err(SkillError::Command(out.text().trim().to_string()));
    }
    Ok(parse_repo_listing(&out.text()))
}

pub fn install(repo: &str, skill: &str) -> Result<(), SkillError> {
    if !is_valid_name(skill) {
        return Err(SkillError::InvalidName(skill.to_string()));
    }
    info!(repo, skill, "installing skill");
    run_checked(&["add", repo, "-g", "-y", "--skill", skill])
}

pub fn install_all(repo: &str) -> Result<(), SkillError> {
    info!(repo, "installing every skill");
    run_checked(&["add", repo, "-g", "-y", "--all"])
}

pub fn remove(skill: &str) -> Result<(), SkillError> {
    if !is_valid_name(skill) {
        return Err(SkillError::InvalidName(skill.to_string()));
    }
    info!(skill, "removing skill");
    run_checked(&["remove", "-g", "-y", skill])
}

pub fn remove_all() -> Result<(), SkillError> {
    info!("removing every skill");
    run_checked(&["remove", "-g", "-y", "--all"])
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Names
    // ========================================================================

    #[test]
    fn valid_names() {
        for name in ["frontend-design", "valid_skill", "skill123"] {
            assert!(is_valid_name(name), "{name}");
        }
        for name in ["Invalid", "Has.Dot", "has space", "", "has/slash"] {
            assert!(!is_valid_name(name), "{name:?}");
        }
    }

    // ========================================================================
    // Repo listing
    // ========================================================================

    #[test]
    fn repo_listing_keeps_names_only() {
        let output = "
◇  Available Skills
│
│    building-native-ui
│
│      Complete guide for building beautiful apps
│
│    expo-api-routes
│
│      Guidelines for creating API routes
│
│    expo-dev-client
│
│      Build and distribute development clients
│
└  Use --skill <name> to install specific skills
";
        assert_eq!(
            parse_repo_listing(output),
            ["building-native-ui", "expo-api-routes", "expo-dev-client"]
        );
    }

    #[test]
    fn repo_listing_ignores_text_outside_section() {
        let output = "\x1b[1mcloning\x1b[0m\nnot-a-skill\n◇  Available Skills\n│\n└  Use --skill <name>\nafter\n";
        assert!(parse_repo_listing(output).is_empty());
        assert!(parse_repo_listing("").is_empty());
    }

    #[test]
    fn repo_listing_strips_escapes() {
        let output = "◇  Available Skills\n│    \x1b[36mqmd\x1b[0m\n└  Use --skill\n";
        assert_eq!(parse_repo_listing(output), ["qmd"]);
    }

    // ========================================================================
    // Installed listing
    // ========================================================================

    #[test]
    fn installed_listing_skips_banners_and_paths() {
        let output = "\
Global Skills
frontend-design  ~/.agents/skills/frontend-design
  indented detail
qmd
/Users/me/.agents/skills
~/.claude/skills
agent: claude
Try skills add <repo>
";
        assert_eq!(parse_installed_listing(output), ["frontend-design", "qmd"]);
        assert!(parse_installed_listing("No global skills installed\n").is_empty());
    }
}
