//! Setup scripts: one-shot configuration of the shell, editors, keys and Dock.
//!
//! Scripts with a probe report whether they have already been applied; the
//! rest (`dock-reset`, `dock-spacer`) are always offered as runnable.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use strum::{Display, EnumIter, IntoStaticStr};
use tracing::debug;

use super::{CheckResult, Reporter, ScriptFn, tools};
use crate::config::{ConfigPaths, USER_EMAIL, USER_NAME};
use crate::error::{ActionError, Result};
use crate::probe::{self, capture, command_exists, home_dir};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum ScriptCategory {
    Terminal,
    Security,
    Editor,
    System,
}

/// A setup or configuration task.
#[derive(Debug, Clone, Copy)]
pub struct Script {
    pub name: &'static str,
    pub description: &'static str,
    pub category: ScriptCategory,
    /// Idempotency probe; `None` means run-once without state.
    pub check: Option<fn() -> CheckResult>,
    pub run: ScriptFn,
    /// Tool that must be installed before running.
    pub required_tool: Option<&'static str>,
}

impl Script {
    /// Probe result, or "not configured" for stateless scripts.
    pub fn check(&self) -> CheckResult {
        self.check.map_or_else(CheckResult::not_installed, |check| check())
    }
}

static SCRIPTS: &[Script] = &[
    // ========================================================================
    // Terminal
    // ========================================================================
    Script {
        name: "hushlogin",
        description: "Silence terminal login message",
        category: ScriptCategory::Terminal,
        check: Some(check_hushlogin),
        run: run_hushlogin,
        required_tool: None,
    },
    Script {
        name: "ghostty-config",
        description: "Install Ghostty terminal config",
        category: ScriptCategory::Terminal,
        check: Some(check_ghostty_config),
        run: run_ghostty_config,
        required_tool: Some("ghostty"),
    },
    // ========================================================================
    // Security
    // ========================================================================
    Script {
        name: "gpg-setup",
        description: "Configure GPG for commit signing",
        category: ScriptCategory::Security,
        check: Some(check_gpg_setup),
        run: run_gpg_setup,
        required_tool: Some("gpg"),
    },
    Script {
        name: "ssh",
        description: "Generate SSH key with Keychain integration",
        category: ScriptCategory::Security,
        check: Some(check_ssh),
        run: run_ssh,
        required_tool: None,
    },
    // ========================================================================
    // Editor
    // ========================================================================
    Script {
        name: "zed-config",
        description: "Install Zed editor config",
        category: ScriptCategory::Editor,
        check: Some(check_zed_config),
        run: run_zed_config,
        required_tool: Some("zed"),
    },
    // ========================================================================
    // System
    // ========================================================================
    Script {
        name: "java-symlink",
        description: "Configure Java runtime symlink for macOS",
        category: ScriptCategory::System,
        check: Some(check_java_symlink),
        run: run_java_symlink,
        required_tool: Some("openjdk"),
    },
    Script {
        name: "dock-reset",
        description: "Reset dock to system defaults",
        category: ScriptCategory::System,
        check: None,
        run: run_dock_reset,
        required_tool: None,
    },
    Script {
        name: "dock-spacer",
        description: "Add a small spacer tile to the dock",
        category: ScriptCategory::System,
        check: None,
        run: run_dock_spacer,
        required_tool: None,
    },
];

// ============================================================================
// Accessors
// ============================================================================

pub fn scripts() -> &'static [Script] {
    SCRIPTS
}

pub fn script_by_name(name: &str) -> Option<&'static Script> {
    SCRIPTS.iter().find(|s| s.name == name)
}

/// Post-install scripts declared by a tool, in declaration order.
pub fn scripts_for_tool(tool: &str) -> Vec<&'static Script> {
    tools::tool_by_name(tool)
        .map(|t| t.scripts.iter().filter_map(|s| script_by_name(s)).collect())
        .unwrap_or_default()
}

/// Scripts no tool claims as a post-install step.
pub fn standalone_scripts() -> Vec<&'static Script> {
    SCRIPTS
        .iter()
        .filter(|s| !tools::all_tools().iter().any(|t| t.scripts.contains(&s.name)))
        .collect()
}

/// Scripts that can report whether they have been applied.
pub fn configurable_scripts() -> Vec<&'static Script> {
    SCRIPTS.iter().filter(|s| s.check.is_some()).collect()
}

// ============================================================================
// Probes
// ============================================================================

fn exists_with_detail(path: &Path, detail: &str) -> CheckResult {
    if path.exists() {
        CheckResult::with_detail(detail)
    } else {
        CheckResult::not_installed()
    }
}

fn check_hushlogin() -> CheckResult {
    exists_with_detail(&home_dir().join(".hushlogin"), "~/.hushlogin")
}

fn check_ghostty_config() -> CheckResult {
    exists_with_detail(
        &home_dir().join(".config/ghostty/config"),
        "~/.config/ghostty/config",
    )
}

fn check_zed_config() -> CheckResult {
    exists_with_detail(
        &home_dir().join(".config/zed/settings.json"),
        "~/.config/zed/settings.json",
    )
}

fn check_gpg_setup() -> CheckResult {
    let signing = probe::read_command_output_line("git", &["config", "--global", "commit.gpgsign"]);
    if signing == "true" {
        CheckResult::with_detail("commit.gpgsign=true")
    } else {
        CheckResult::not_installed()
    }
}

fn check_ssh() -> CheckResult {
    exists_with_detail(&home_dir().join(".ssh/id_ed25519"), "~/.ssh/id_ed25519")
}

const JAVA_SYMLINK: &str = "/Library/Java/JavaVirtualMachines/openjdk.jdk";

fn check_java_symlink() -> CheckResult {
    match fs::symlink_metadata(JAVA_SYMLINK) {
        Ok(_) => CheckResult::with_detail(JAVA_SYMLINK),
        Err(_) => CheckResult::not_installed(),
    }
}

// ============================================================================
// Runners
// ============================================================================

fn run_hushlogin(out: &dyn Reporter) -> Result<()> {
    out.step("Setting up hushlogin...");
    let path = home_dir().join(".hushlogin");
    if path.exists() {
        out.done(".hushlogin already exists");
        return Ok(());
    }
    fs::File::create(&path)?;
    out.done("Terminal login message silenced");
    Ok(())
}

/// Copies a bundled config file from the repository checkout to `dest`.
pub(crate) fn install_repo_config(paths: &ConfigPaths, relative: &str, dest: &Path) -> Result<()> {
    let source = paths
        .repo_file(relative)
        .ok_or_else(|| ActionError::Failed(format!("config file not found: {relative}")))?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = fs::read(&source)?;
    fs::write(dest, content)?;
    debug!(from = %source.display(), to = %dest.display(), "installed config");
    Ok(())
}

fn run_ghostty_config(out: &dyn Reporter) -> Result<()> {
    out.step("Setting up Ghostty config...");
    let paths = ConfigPaths::new();
    let dest = paths.home().join(".config/ghostty/config");
    install_repo_config(&paths, "configuration/applications/ghostty/config", &dest)?;
    out.done("Ghostty config installed");
    Ok(())
}

fn run_zed_config(out: &dyn Reporter) -> Result<()> {
    out.step("Setting up Zed config...");
    let paths = ConfigPaths::new();
    let dest = paths.home().join(".config/zed/settings.json");
    install_repo_config(&paths, "configuration/applications/zed/settings.json", &dest)?;
    out.done("Zed config installed");
    Ok(())
}

fn gpg_batch_config(name: &str, email: &str) -> String {
    format!(
        "%no-protection\nKey-Type: eddsa\nKey-Curve: ed25519\nName-Real: {name}\nName-Email: {email}\nExpire-Date: 0\n%commit\n"
    )
}

/// Long key id from `gpg --list-secret-keys --keyid-format long` output.
pub(crate) fn parse_gpg_key_id(listing: &str) -> Option<String> {
    listing
        .lines()
        .filter(|line| line.contains("ed25519/") || line.contains("rsa"))
        .find_map(|line| {
            let after = line.split('/').nth(1)?;
            after.split_whitespace().next().map(str::to_string)
        })
}

fn run_gpg_setup(out: &dyn Reporter) -> Result<()> {
    out.step("Setting up GPG for commit signing...");
    if !command_exists("gpg") {
        return Err(ActionError::Failed(
            "GPG not installed. Run: j install gpg".to_string(),
        ));
    }

    let existing = capture(
        "gpg",
        &["--list-secret-keys", "--keyid-format", "long", USER_EMAIL],
    )?;
    if existing.success && !existing.stdout.trim().is_empty() {
        out.done(&format!("GPG key already exists for {USER_EMAIL}"));
    } else {
        out.line("Generating GPG key...");
        out.note("Using ed25519 algorithm");
        let mut child = Command::new("gpg")
            .args(["--batch", "--generate-key"])
            .stdin(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(gpg_batch_config(USER_NAME, USER_EMAIL).as_bytes())?;
        }
        if !child.wait()?.success() {
            return Err(ActionError::Failed("failed to generate GPG key".to_string()));
        }
        out.done("GPG key generated");
    }

    configure_git_gpg(out)
}

fn configure_git_gpg(out: &dyn Reporter) -> Result<()> {
    let listing = capture(
        "gpg",
        &["--list-secret-keys", "--keyid-format", "long", USER_EMAIL],
    )?;
    let Some(key_id) = parse_gpg_key_id(&listing.stdout) else {
        out.error("Could not find GPG key ID");
        return Ok(());
    };

    out.line("Configuring Git to use GPG key...");
    probe::run("git", &["config", "--global", "user.signingkey", &key_id])?;
    probe::run("git", &["config", "--global", "commit.gpgsign", "true"])?;
    probe::run("git", &["config", "--global", "gpg.program", "gpg"])?;
    out.done("Git configured for commit signing");

    let exported = capture("gpg", &["--armor", "--export", USER_EMAIL])?;
    out.line("");
    out.line("Your GPG public key (add to GitHub):");
    out.line("----------------------------------------");
    out.line(exported.stdout.trim_end());
    out.line("----------------------------------------");
    out.line("Add at: https://github.com/settings/gpg/new");
    out.done("GPG setup completed");
    out.note("All future commits will be signed automatically");
    Ok(())
}

const SSH_CONFIG_BLOCK: &str =
    "\nHost *\n  AddKeysToAgent yes\n  UseKeychain yes\n  IdentityFile ~/.ssh/id_ed25519\n";

/// Appends the Keychain block unless the config already enables it.
/// Returns whether the file changed.
pub(crate) fn ensure_ssh_config(config: &Path) -> Result<bool> {
    let existing = fs::read_to_string(config).unwrap_or_default();
    if existing.contains("AddKeysToAgent yes") {
        return Ok(false);
    }
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(config)?.write_all(SSH_CONFIG_BLOCK.as_bytes())?;
    Ok(true)
}

fn run_ssh(out: &dyn Reporter) -> Result<()> {
    out.step("Setting up SSH...");
    let ssh_dir = home_dir().join(".ssh");
    let key = ssh_dir.join("id_ed25519");
    let key_str = key.to_string_lossy().into_owned();

    fs::create_dir_all(&ssh_dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&ssh_dir, fs::Permissions::from_mode(0o700))?;
    }

    if key.exists() {
        out.done(&format!("SSH key already exists at {key_str}"));
    } else {
        out.line("Generating SSH key with macOS Keychain integration...");
        out.note("You'll be prompted to create a passphrase");
        probe::run("ssh-keygen", &["-t", "ed25519", "-C", USER_EMAIL, "-f", &key_str])?;
        out.done("SSH key generated");
    }

    out.line("Configuring SSH...");
    if ensure_ssh_config(&ssh_dir.join("config"))? {
        out.done("SSH config updated");
    } else {
        out.done("SSH config already configured");
    }

    out.line("Adding key to SSH agent with Keychain...");
    out.note("Passphrase will be stored in macOS Keychain");
    probe::run("ssh-add", &["--apple-use-keychain", &key_str])?;

    let public = fs::read_to_string(ssh_dir.join("id_ed25519.pub")).unwrap_or_default();
    out.line("");
    out.line("Your public key (add to GitHub):");
    out.line("----------------------------------------");
    out.line(public.trim_end());
    out.line("----------------------------------------");
    out.line("Add at: https://github.com/settings/ssh/new");
    out.done("SSH setup completed");
    Ok(())
}

fn run_java_symlink(out: &dyn Reporter) -> Result<()> {
    const BREW_JDK: &str = "/opt/homebrew/opt/openjdk/libexec/openjdk.jdk";

    out.step("Setting up Java runtime...");
    if !Path::new(BREW_JDK).exists() {
        return Err(ActionError::Failed(
            "OpenJDK not installed. Run: j install openjdk".to_string(),
        ));
    }
    if fs::symlink_metadata(JAVA_SYMLINK).is_ok() {
        out.done("Java symlink already exists");
        return Ok(());
    }
    out.line("Creating symlink for macOS Java recognition...");
    probe::run("sudo", &["ln", "-sfn", BREW_JDK, JAVA_SYMLINK])?;
    out.done("Java configured for macOS");
    Ok(())
}

fn run_dock_reset(out: &dyn Reporter) -> Result<()> {
    out.step("Resetting macOS Dock...");
    // the domain may already be at defaults, in which case delete fails
    let _ = probe::run("defaults", &["delete", "com.apple.dock"]);
    probe::run("killall", &["Dock"])?;
    out.done("Dock reset to defaults");
    Ok(())
}

fn run_dock_spacer(out: &dyn Reporter) -> Result<()> {
    out.step("Adding spacer to Dock...");
    probe::run(
        "defaults",
        &[
            "write",
            "com.apple.dock",
            "persistent-apps",
            "-array-add",
            r#"{"tile-type"="small-spacer-tile";}"#,
        ],
    )?;
    probe::run("killall", &["Dock"])?;
    out.done("Dock spacer added");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stateless_scripts_are_not_configurable() {
        let names: Vec<&str> = configurable_scripts().iter().map(|s| s.name).collect();
        assert!(!names.contains(&"dock-reset"));
        assert!(!names.contains(&"dock-spacer"));
        assert!(names.contains(&"hushlogin"));
        assert!(!script_by_name("dock-reset").unwrap().check().installed);
    }

    #[test]
    fn tool_scripts_and_standalone_partition() {
        let for_gpg: Vec<&str> = scripts_for_tool("gpg").iter().map(|s| s.name).collect();
        assert_eq!(for_gpg, ["gpg-setup"]);
        assert!(scripts_for_tool("git").is_empty());
        assert!(scripts_for_tool("nope").is_empty());

        let standalone: Vec<&str> = standalone_scripts().iter().map(|s| s.name).collect();
        assert!(standalone.contains(&"ssh"));
        assert!(!standalone.contains(&"zed-config"));
        assert_eq!(
            standalone.len() + ["java-symlink", "gpg-setup", "ghostty-config", "zed-config"].len(),
            scripts().len()
        );
    }

    #[test]
    fn gpg_key_id_from_listing() {
        let listing = "sec   ed25519/ABCDEF0123456789 2024-01-01 [SC]\n      FINGERPRINT\nuid   [ultimate] Someone <a@b.c>\n";
        assert_eq!(parse_gpg_key_id(listing).as_deref(), Some("ABCDEF0123456789"));

        let rsa = "sec   rsa4096/0011223344556677 2020-02-02 [SC]\n";
        assert_eq!(parse_gpg_key_id(rsa).as_deref(), Some("0011223344556677"));
        assert_eq!(parse_gpg_key_id("no keys"), None);
    }

    #[test]
    fn gpg_batch_uses_ed25519_without_passphrase() {
        let batch = gpg_batch_config("Name", "n@example.com");
        assert!(batch.starts_with("%no-protection\n"));
        assert!(batch.contains("Key-Curve: ed25519\n"));
        assert!(batch.contains("Name-Email: n@example.com\n"));
        assert!(batch.ends_with("%commit\n"));
    }

    #[test]
    fn ssh_config_block_appended_once() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config");
        fs::write(&config, "Host github.com\n  User git\n").unwrap();

        assert!(ensure_ssh_config(&config).unwrap());
        assert!(!ensure_ssh_config(&config).unwrap());

        let content = fs::read_to_string(&config).unwrap();
        assert!(content.starts_with("Host github.com"));
        assert_eq!(content.matches("AddKeysToAgent yes").count(), 1);
    }

    #[test]
    fn install_repo_config_copies_bundled_file() {
        let home = TempDir::new().unwrap();
        let repo = home.path().join("Developer/jterrazz-cli/configuration/applications/ghostty");
        fs::create_dir_all(&repo).unwrap();
        fs::write(repo.join("config"), "theme = dark\n").unwrap();

        let paths = ConfigPaths::with_home(home.path());
        let dest = home.path().join(".config/ghostty/config");
        install_repo_config(&paths, "configuration/applications/ghostty/config", &dest).unwrap();
        assert_eq!(fs::read_to_string(dest).unwrap(), "theme = dark\n");
    }

    #[test]
    fn install_repo_config_reports_missing_source() {
        let home = TempDir::new().unwrap();
        let paths = ConfigPaths::with_home(home.path());
        let err = install_repo_config(&paths, "nope/file", &home.path().join("x")).unwrap_err();
        assert!(err.to_string().contains("config file not found: nope/file"));
    }
}
