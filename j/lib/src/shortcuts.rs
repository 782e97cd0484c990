//! `j run` shortcut groups for git and docker.
//!
//! Each shortcut is a short sequence of external commands run attached to the
//! terminal. Groups and shortcuts are static tables, like the catalog.

use tracing::debug;

use crate::catalog::Reporter;
use crate::error::{ActionError, Result};
use crate::probe::{self, capture};

pub type ShortcutFn = fn(&[String], &dyn Reporter) -> Result<()>;

#[derive(Debug, Clone, Copy)]
pub struct Shortcut {
    pub name: &'static str,
    pub description: &'static str,
    /// Positional arguments required.
    pub min_args: usize,
    pub run: ShortcutFn,
}

#[derive(Debug, Clone, Copy)]
pub struct ShortcutGroup {
    pub name: &'static str,
    pub description: &'static str,
    pub shortcuts: &'static [Shortcut],
}

impl ShortcutGroup {
    pub fn shortcut(&self, name: &str) -> Option<&'static Shortcut> {
        self.shortcuts.iter().find(|s| s.name == name)
    }
}

static GROUPS: &[ShortcutGroup] = &[
    ShortcutGroup {
        name: "git",
        description: "Git workflow shortcuts",
        shortcuts: &[
            Shortcut {
                name: "feat",
                description: "Add all and commit with 'feat:' prefix",
                min_args: 1,
                run: git_feat,
            },
            Shortcut {
                name: "fix",
                description: "Add all and commit with 'fix:' prefix",
                min_args: 1,
                run: git_fix,
            },
            Shortcut {
                name: "chore",
                description: "Add all and commit with 'chore:' prefix",
                min_args: 1,
                run: git_chore,
            },
            Shortcut {
                name: "push",
                description: "Push current branch to origin",
                min_args: 0,
                run: git_push,
            },
            Shortcut {
                name: "sync",
                description: "Fetch and pull from remote",
                min_args: 0,
                run: git_sync,
            },
            Shortcut {
                name: "wip",
                description: "Add all and commit as 'WIP'",
                min_args: 0,
                run: git_wip,
            },
            Shortcut {
                name: "unwip",
                description: "Undo last commit and unstage",
                min_args: 0,
                run: git_unwip,
            },
            Shortcut {
                name: "status",
                description: "Show git status",
                min_args: 0,
                run: git_status,
            },
            Shortcut {
                name: "log",
                description: "Show recent commits",
                min_args: 0,
                run: git_log,
            },
            Shortcut {
                name: "branches",
                description: "List local branches",
                min_args: 0,
                run: git_branches,
            },
        ],
    },
    ShortcutGroup {
        name: "docker",
        description: "Docker container and image management",
        shortcuts: &[
            Shortcut {
                name: "rm",
                description: "Remove all containers",
                min_args: 0,
                run: docker_rm,
            },
            Shortcut {
                name: "rmi",
                description: "Remove all images",
                min_args: 0,
                run: docker_rmi,
            },
            Shortcut {
                name: "clean",
                description: "Clean up Docker system (prune)",
                min_args: 0,
                run: docker_clean,
            },
            Shortcut {
                name: "reset",
                description: "Remove all containers and images",
                min_args: 0,
                run: docker_reset,
            },
            Shortcut {
                name: "ps",
                description: "List all containers",
                min_args: 0,
                run: docker_ps,
            },
            Shortcut {
                name: "images",
                description: "List all images",
                min_args: 0,
                run: docker_images,
            },
        ],
    },
];

pub fn groups() -> &'static [ShortcutGroup] {
    GROUPS
}

pub fn group_by_name(name: &str) -> Option<&'static ShortcutGroup> {
    GROUPS.iter().find(|g| g.name == name)
}

/// Resolves and runs `j run <group> <name> [args]`.
///
/// ## Errors
///
/// Unknown group or shortcut, too few arguments, or a failed command.
pub fn run(group: &str, name: &str, args: &[String], reporter: &dyn Reporter) -> Result<()> {
    let g = group_by_name(group).ok_or_else(|| ActionError::UnknownGroup(group.to_string()))?;
    let shortcut = g.shortcut(name).ok_or_else(|| ActionError::UnknownShortcut {
        group: group.to_string(),
        name: name.to_string(),
    })?;
    if args.len() < shortcut.min_args {
        return Err(ActionError::MissingArguments {
            usage: format!("{group} {name} <message>"),
        });
    }
    debug!(group, name, ?args, "running shortcut");
    (shortcut.run)(args, reporter)
}

/// `"<prefix>: <args joined by spaces>"`
pub fn commit_message(prefix: &str, args: &[String]) -> String {
    format!("{prefix}: {}", args.join(" "))
}

// ============================================================================
// git
// ============================================================================

fn git(args: &[&str]) -> Result<()> {
    probe::run("git", args)?;
    Ok(())
}

fn git_commit(prefix: &str, args: &[String]) -> Result<()> {
    git(&["add", "."])?;
    git(&["commit", "-m", &commit_message(prefix, args)])
}

fn git_feat(args: &[String], _: &dyn Reporter) -> Result<()> {
    git_commit("feat", args)
}

fn git_fix(args: &[String], _: &dyn Reporter) -> Result<()> {
    git_commit("fix", args)
}

fn git_chore(args: &[String], _: &dyn Reporter) -> Result<()> {
    git_commit("chore", args)
}

fn git_push(_: &[String], _: &dyn Reporter) -> Result<()> {
    git(&["push", "-u", "origin", "HEAD"])
}

fn git_sync(_: &[String], reporter: &dyn Reporter) -> Result<()> {
    reporter.step("Syncing with remote...");
    if let Err(e) = git(&["fetch", "-p"]) {
        reporter.error(&e.to_string());
    }
    git(&["pull"])
}

fn git_wip(_: &[String], _: &dyn Reporter) -> Result<()> {
    git(&["add", "--all"])?;
    git(&["commit", "-m", "WIP"])
}

fn git_unwip(_: &[String], _: &dyn Reporter) -> Result<()> {
    git(&["reset", "--soft", "HEAD~1"])?;
    git(&["reset", "HEAD"])
}

fn git_status(_: &[String], _: &dyn Reporter) -> Result<()> {
    git(&["status"])
}

fn git_log(_: &[String], _: &dyn Reporter) -> Result<()> {
    git(&["log", "--oneline", "-10"])
}

fn git_branches(_: &[String], reporter: &dyn Reporter) -> Result<()> {
    reporter.step("Local branches:");
    git(&["branch"])
}

// ============================================================================
// docker
// ============================================================================

fn docker_ids(args: &[&str]) -> Vec<String> {
    match capture("docker", args) {
        Ok(out) if out.success => out.stdout.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn docker_remove(list: &[&str], remove: &[&str], what: &str, reporter: &dyn Reporter) -> Result<()> {
    reporter.step(&format!("Removing all Docker {what}..."));
    let ids = docker_ids(list);
    if ids.is_empty() {
        reporter.note(&format!("No {what} to remove"));
        return Ok(());
    }
    let mut args: Vec<&str> = remove.to_vec();
    args.extend(ids.iter().map(String::as_str));
    probe::run("docker", &args)?;
    Ok(())
}

fn docker_rm(_: &[String], reporter: &dyn Reporter) -> Result<()> {
    docker_remove(&["ps", "-aq"], &["rm", "-vf"], "containers", reporter)
}

fn docker_rmi(_: &[String], reporter: &dyn Reporter) -> Result<()> {
    docker_remove(&["images", "-aq"], &["rmi", "-f"], "images", reporter)
}

fn docker_clean(_: &[String], reporter: &dyn Reporter) -> Result<()> {
    reporter.step("Cleaning up Docker system...");
    probe::run("docker", &["system", "prune", "-af"])?;
    Ok(())
}

fn docker_reset(args: &[String], reporter: &dyn Reporter) -> Result<()> {
    reporter.step("Resetting Docker (removing containers and images)...");
    if let Err(e) = docker_rm(args, reporter) {
        reporter.error(&e.to_string());
    }
    if let Err(e) = docker_rmi(args, reporter) {
        reporter.error(&e.to_string());
    }
    Ok(())
}

fn docker_ps(_: &[String], _: &dyn Reporter) -> Result<()> {
    probe::run("docker", &["ps", "-a"])?;
    Ok(())
}

fn docker_images(_: &[String], _: &dyn Reporter) -> Result<()> {
    probe::run("docker", &["images"])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LogReporter;

    #[test]
    fn groups_and_shortcuts_resolve() {
        let git = group_by_name("git").unwrap();
        assert_eq!(git.description, "Git workflow shortcuts");
        assert_eq!(git.shortcut("feat").unwrap().min_args, 1);
        assert!(git.shortcut("push").is_some());
        assert!(group_by_name("docker").unwrap().shortcut("reset").is_some());
        assert!(group_by_name("svn").is_none());
    }

    #[test]
    fn commit_messages_join_args() {
        let args = vec!["add".to_string(), "login".to_string(), "page".to_string()];
        assert_eq!(commit_message("feat", &args), "feat: add login page");
    }

    #[test]
    fn unknown_targets_and_missing_message_fail_before_running() {
        let err = run("svn", "log", &[], &LogReporter).unwrap_err();
        assert_eq!(err.to_string(), "Unknown run group: svn");

        let err = run("git", "rebase", &[], &LogReporter).unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: git rebase");

        let err = run("git", "feat", &[], &LogReporter).unwrap_err();
        assert_eq!(err.to_string(), "usage: j run git feat <message>");
    }

    #[test]
    fn shortcut_names_are_unique_per_group() {
        for group in groups() {
            let mut names: Vec<&str> = group.shortcuts.iter().map(|s| s.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), group.shortcuts.len(), "{}", group.name);
        }
    }
}
