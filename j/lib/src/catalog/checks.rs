//! macOS security posture and developer identity checks.

use super::CheckResult;
use crate::config::USER_EMAIL;
use crate::probe::{capture, command_exists, home_dir, read_command_output_line};

/// A yes/no check; `good_when` names which answer is healthy.
#[derive(Debug, Clone, Copy)]
pub struct HealthCheck {
    pub name: &'static str,
    pub description: &'static str,
    pub check: fn() -> CheckResult,
    pub good_when: bool,
}

impl HealthCheck {
    pub fn run(&self) -> CheckResult {
        (self.check)()
    }

    pub fn is_healthy(&self, result: &CheckResult) -> bool {
        result.installed == self.good_when
    }
}

static SECURITY_CHECKS: &[HealthCheck] = &[
    HealthCheck {
        name: "filevault",
        description: "Full disk encryption",
        check: check_filevault,
        good_when: true,
    },
    HealthCheck {
        name: "firewall",
        description: "Block incoming connections",
        check: check_firewall,
        good_when: true,
    },
    HealthCheck {
        name: "sip",
        description: "System Integrity Protection",
        check: check_sip,
        good_when: true,
    },
    HealthCheck {
        name: "gatekeeper",
        description: "App signature verification",
        check: check_gatekeeper,
        good_when: true,
    },
    HealthCheck {
        name: "remote-login",
        description: "SSH server disabled",
        check: check_remote_login,
        good_when: true,
    },
];

static IDENTITY_CHECKS: &[HealthCheck] = &[
    HealthCheck {
        name: "git-email",
        description: "Git commit email",
        check: check_git_email,
        good_when: true,
    },
    HealthCheck {
        name: "git-name",
        description: "Git commit author name",
        check: check_git_name,
        good_when: true,
    },
    HealthCheck {
        name: "git-signing",
        description: "Git commit signature",
        check: check_git_signing,
        good_when: true,
    },
    HealthCheck {
        name: "gpg-key",
        description: "GPG key for signing",
        check: check_gpg_key,
        good_when: true,
    },
    HealthCheck {
        name: "github",
        description: "GitHub CLI authentication",
        check: check_github,
        good_when: true,
    },
    HealthCheck {
        name: "ssh-key",
        description: "SSH key for authentication",
        check: check_ssh_key,
        good_when: true,
    },
];

pub fn security_checks() -> &'static [HealthCheck] {
    SECURITY_CHECKS
}

pub fn identity_checks() -> &'static [HealthCheck] {
    IDENTITY_CHECKS
}

/// Whether stdout of `cmd args` contains `needle`.
fn stdout_contains(cmd: &str, args: &[&str], needle: &str) -> bool {
    capture(cmd, args).is_ok_and(|out| out.stdout.contains(needle))
}

// ============================================================================
// Security
// ============================================================================

fn check_filevault() -> CheckResult {
    CheckResult::flag(stdout_contains("fdesetup", &["status"], "FileVault is On"), "")
}

fn check_firewall() -> CheckResult {
    CheckResult::flag(
        stdout_contains(
            "/usr/libexec/ApplicationFirewall/socketfilterfw",
            &["--getglobalstate"],
            "enabled",
        ),
        "",
    )
}

fn check_sip() -> CheckResult {
    CheckResult::flag(stdout_contains("csrutil", &["status"], "enabled"), "")
}

fn check_gatekeeper() -> CheckResult {
    // spctl reports on stderr on some releases
    let enabled = capture("spctl", &["--status"]).is_ok_and(|out| out.text().contains("enabled"));
    CheckResult::flag(enabled, "")
}

/// Healthy (reported installed) when the sshd launch daemon is absent.
fn check_remote_login() -> CheckResult {
    let sshd = stdout_contains("launchctl", &["list"], "com.openssh.sshd");
    CheckResult::flag(!sshd, "")
}

// ============================================================================
// Identity
// ============================================================================

fn git_global(key: &str) -> String {
    read_command_output_line("git", &["config", "--global", key])
}

fn check_git_email() -> CheckResult {
    let email = git_global("user.email");
    CheckResult::flag(email == USER_EMAIL, email)
}

fn check_git_name() -> CheckResult {
    let name = git_global("user.name");
    CheckResult::flag(!name.is_empty(), name)
}

fn check_git_signing() -> CheckResult {
    CheckResult::flag(git_global("commit.gpgsign") == "true", "")
}

fn check_gpg_key() -> CheckResult {
    match capture("gpg", &["--list-secret-keys", "--keyid-format", "long"]) {
        Ok(out) if out.success && !out.stdout.trim().is_empty() => {
            CheckResult::with_detail("~/.gnupg")
        }
        _ => CheckResult::not_installed(),
    }
}

/// Account from `gh auth status` ("Logged in to github.com account NAME (...)").
pub(crate) fn parse_gh_account(status: &str) -> Option<String> {
    let idx = status.find("account ")?;
    let rest = &status[idx + "account ".len()..];
    let end = rest.find(' ')?;
    (end > 0).then(|| rest[..end].to_string())
}

fn check_github() -> CheckResult {
    if !command_exists("gh") {
        return CheckResult::not_installed();
    }
    match capture("gh", &["auth", "status"]) {
        Ok(out) if out.success => match parse_gh_account(&out.text()) {
            Some(account) => CheckResult::with_detail(account),
            None => CheckResult::installed(),
        },
        _ => CheckResult::not_installed(),
    }
}

fn check_ssh_key() -> CheckResult {
    if home_dir().join(".ssh/id_ed25519").exists() {
        CheckResult::with_detail("~/.ssh/id_ed25519")
    } else {
        CheckResult::not_installed()
    }
}
