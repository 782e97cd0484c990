//! Installable and detectable developer tools.

use std::fs;
use std::path::Path;
use std::time::Duration;

use strum::{Display, EnumIter, IntoStaticStr};

use super::{ActionFn, CheckResult};
use crate::error::{ActionError, Result};
use crate::probe::{self, capture, command_exists, home_dir};
use crate::version::{self, Parser};

/// Tool grouping, in status display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum ToolCategory {
    #[strum(to_string = "Package Managers")]
    PackageManagers,
    #[strum(to_string = "Runtimes")]
    Runtimes,
    #[strum(to_string = "DevOps")]
    DevOps,
    #[strum(to_string = "AI")]
    Ai,
    #[strum(to_string = "Terminal & Git")]
    TerminalGit,
    #[strum(to_string = "GUI Apps")]
    GuiApps,
    #[strum(to_string = "Mac App Store")]
    MacAppStore,
}

/// How a tool gets onto the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum InstallMethod {
    BrewFormula,
    BrewCask,
    Npm,
    Bun,
    Nvm,
    Xcode,
    Manual,
    Mas,
}

impl InstallMethod {
    /// Short label for the method column.
    pub fn label(self) -> &'static str {
        match self {
            Self::BrewFormula | Self::BrewCask => "brew",
            Self::Npm => "npm",
            Self::Bun => "bun",
            Self::Nvm => "nvm",
            Self::Xcode => "xcode",
            Self::Manual => "sh",
            Self::Mas => "mas",
        }
    }

    /// Whether `j install` can drive this method without a custom action.
    pub fn is_automatic(self) -> bool {
        matches!(
            self,
            Self::BrewFormula | Self::BrewCask | Self::Npm | Self::Bun
        )
    }
}

/// Where a tool's version string comes from.
#[derive(Debug, Clone, Copy)]
pub enum VersionSource {
    None,
    /// Run the tool's own command with these args and parse the output.
    Command(&'static [&'static str], Parser),
    /// `brew list --versions <formula>`
    BrewFormula(&'static str),
    /// `brew list --cask --versions <cask>`
    BrewCask(&'static str),
    /// `CFBundleShortVersionString` of `/Applications/<name>.app`.
    AppBundle(&'static str),
}

impl VersionSource {
    pub fn read(&self, command: &str) -> String {
        match *self {
            Self::None => String::new(),
            Self::Command(args, parse) => version_from_command(command, args, parse),
            Self::BrewFormula(formula) => version_from_brew_formula(formula),
            Self::BrewCask(cask) => version_from_brew_cask(cask),
            Self::AppBundle(app) => version_from_app_plist(app),
        }
    }
}

/// A catalog tool.
#[derive(Debug, Clone, Copy)]
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    pub category: ToolCategory,
    /// Binary probed on `PATH`; empty when detection is custom.
    pub command: &'static str,
    pub version: VersionSource,
    /// Custom detection, overriding the command probe.
    pub check: Option<fn() -> CheckResult>,
    pub method: InstallMethod,
    /// Brew formula, cask or npm/bun package name.
    pub formula: &'static str,
    /// Custom install, overriding the method dispatch.
    pub install: Option<ActionFn>,
    /// Custom upgrade, overriding the method dispatch.
    pub upgrade: Option<ActionFn>,
    pub dependencies: &'static [&'static str],
    /// Scripts run after a successful install.
    pub scripts: &'static [&'static str],
}

impl Tool {
    /// Template for struct-update syntax in the tables below.
    pub const BLANK: Tool = Tool {
        name: "",
        description: "",
        category: ToolCategory::PackageManagers,
        command: "",
        version: VersionSource::None,
        check: None,
        method: InstallMethod::Manual,
        formula: "",
        install: None,
        upgrade: None,
        dependencies: &[],
        scripts: &[],
    };

    /// Detects the tool: custom check first, then the command probe.
    pub fn check(&self) -> CheckResult {
        if let Some(check) = self.check {
            return check();
        }
        if self.command.is_empty() || !command_exists(self.command) {
            return CheckResult::not_installed();
        }
        CheckResult::with_version(self.version.read(self.command))
    }

    pub fn is_installable(&self) -> bool {
        self.method.is_automatic() || self.install.is_some()
    }
}

const HOMEBREW: &[&str] = &["homebrew"];

static TOOLS: &[Tool] = &[
    // ========================================================================
    // Package Managers
    // ========================================================================
    Tool {
        name: "homebrew",
        description: "macOS package manager",
        command: "brew",
        check: Some(check_homebrew),
        install: Some(install_homebrew),
        ..Tool::BLANK
    },
    Tool {
        name: "bun",
        description: "JavaScript runtime and package manager",
        command: "bun",
        version: VersionSource::Command(&["--version"], version::trim),
        method: InstallMethod::BrewFormula,
        formula: "oven-sh/bun/bun",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "cocoapods",
        description: "Dependency manager for Xcode projects",
        command: "pod",
        version: VersionSource::Command(&["--version"], version::trim),
        method: InstallMethod::BrewFormula,
        formula: "cocoapods",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "mas",
        description: "Mac App Store command line",
        command: "mas",
        version: VersionSource::Command(&["version"], version::trim),
        method: InstallMethod::BrewFormula,
        formula: "mas",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "npm",
        description: "Node package manager",
        command: "npm",
        check: Some(check_npm),
        method: InstallMethod::Nvm,
        dependencies: &["node"],
        ..Tool::BLANK
    },
    Tool {
        name: "nvm",
        description: "Node version manager",
        check: Some(check_nvm),
        method: InstallMethod::BrewFormula,
        formula: "nvm",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "pnpm",
        description: "Disk-efficient node package manager",
        command: "pnpm",
        version: VersionSource::Command(&["--version"], version::trim),
        method: InstallMethod::BrewFormula,
        formula: "pnpm",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    // ========================================================================
    // Runtimes
    // ========================================================================
    Tool {
        name: "go",
        description: "Go toolchain",
        category: ToolCategory::Runtimes,
        command: "go",
        version: VersionSource::Command(&["version"], version::go),
        method: InstallMethod::BrewFormula,
        formula: "go",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "node",
        description: "Node.js runtime",
        category: ToolCategory::Runtimes,
        command: "node",
        version: VersionSource::Command(&["--version"], version::trim),
        method: InstallMethod::Nvm,
        dependencies: &["nvm"],
        ..Tool::BLANK
    },
    Tool {
        name: "openjdk",
        description: "Java development kit",
        category: ToolCategory::Runtimes,
        command: "java",
        check: Some(check_openjdk),
        method: InstallMethod::BrewFormula,
        formula: "openjdk",
        dependencies: HOMEBREW,
        scripts: &["java-symlink"],
        ..Tool::BLANK
    },
    Tool {
        name: "python",
        description: "Python 3 interpreter",
        category: ToolCategory::Runtimes,
        command: "python3",
        version: VersionSource::Command(&["--version"], version::python),
        method: InstallMethod::BrewFormula,
        formula: "python",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "rust",
        description: "Rust toolchain via rustup",
        category: ToolCategory::Runtimes,
        command: "rustc",
        version: VersionSource::Command(&["--version"], version::rust),
        install: Some(install_rust),
        upgrade: Some(upgrade_rust),
        ..Tool::BLANK
    },
    // ========================================================================
    // DevOps
    // ========================================================================
    Tool {
        name: "ansible",
        description: "Configuration management",
        category: ToolCategory::DevOps,
        command: "ansible",
        version: VersionSource::Command(&["--version"], version::ansible),
        method: InstallMethod::BrewFormula,
        formula: "ansible",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "ansible-lint",
        description: "Linter for Ansible playbooks",
        category: ToolCategory::DevOps,
        command: "ansible-lint",
        version: VersionSource::Command(&["--version"], version::ansible_lint),
        method: InstallMethod::BrewFormula,
        formula: "ansible-lint",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "kubectl",
        description: "Kubernetes command line",
        category: ToolCategory::DevOps,
        command: "kubectl",
        version: VersionSource::Command(&["version", "--client", "-o", "yaml"], version::kubectl),
        method: InstallMethod::BrewFormula,
        formula: "kubernetes-cli",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "multipass",
        description: "Ubuntu virtual machines",
        category: ToolCategory::DevOps,
        command: "multipass",
        version: VersionSource::Command(&["--version"], version::multipass),
        method: InstallMethod::BrewCask,
        formula: "multipass",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "pulumi",
        description: "Infrastructure as code",
        category: ToolCategory::DevOps,
        command: "pulumi",
        version: VersionSource::Command(&["version"], version::pulumi),
        method: InstallMethod::BrewFormula,
        formula: "pulumi/tap/pulumi",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "tailscale",
        description: "Mesh VPN client and daemon",
        category: ToolCategory::DevOps,
        command: "tailscale",
        version: VersionSource::Command(&["version"], version::tailscale),
        method: InstallMethod::BrewFormula,
        formula: "tailscale",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "terraform",
        description: "Infrastructure provisioning",
        category: ToolCategory::DevOps,
        command: "terraform",
        version: VersionSource::Command(&["--version"], version::terraform),
        method: InstallMethod::BrewFormula,
        formula: "hashicorp/tap/terraform",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    // ========================================================================
    // AI
    // ========================================================================
    Tool {
        name: "claude",
        description: "Anthropic coding agent",
        category: ToolCategory::Ai,
        command: "claude",
        version: VersionSource::Command(&["--version"], version::claude),
        method: InstallMethod::BrewCask,
        formula: "claude-code",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "codex",
        description: "OpenAI coding agent",
        category: ToolCategory::Ai,
        command: "codex",
        version: VersionSource::Command(&["--version"], version::codex),
        method: InstallMethod::BrewCask,
        formula: "codex",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "gemini",
        description: "Google coding agent",
        category: ToolCategory::Ai,
        command: "gemini",
        version: VersionSource::Command(&["--version"], version::trim),
        method: InstallMethod::BrewFormula,
        formula: "gemini-cli",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "happy-coder",
        description: "Mobile client for coding agents",
        category: ToolCategory::Ai,
        command: "happy",
        version: VersionSource::Command(&["--version"], version::happy_coder),
        method: InstallMethod::Npm,
        formula: "happy-coder",
        dependencies: &["npm"],
        ..Tool::BLANK
    },
    Tool {
        name: "ollama",
        description: "Local model runner",
        category: ToolCategory::Ai,
        command: "ollama",
        check: Some(check_ollama),
        method: InstallMethod::BrewCask,
        formula: "ollama-app",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "opencode",
        description: "Terminal coding agent",
        category: ToolCategory::Ai,
        command: "opencode",
        version: VersionSource::Command(&["--version"], version::trim),
        method: InstallMethod::BrewFormula,
        formula: "opencode",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "qmd",
        description: "Local search over markdown notes",
        category: ToolCategory::Ai,
        command: "qmd",
        version: VersionSource::Command(&["--version"], version::trim),
        install: Some(install_qmd),
        dependencies: &["bun"],
        ..Tool::BLANK
    },
    Tool {
        name: "skills",
        description: "Agent skills manager",
        category: ToolCategory::Ai,
        command: "skills",
        version: VersionSource::Command(&["--version"], version::trim),
        method: InstallMethod::Npm,
        formula: "skills",
        dependencies: &["npm"],
        ..Tool::BLANK
    },
    // ========================================================================
    // Terminal & Git
    // ========================================================================
    Tool {
        name: "eas",
        description: "Expo application services",
        category: ToolCategory::TerminalGit,
        command: "eas",
        version: VersionSource::Command(&["--version"], version::eas),
        method: InstallMethod::Npm,
        formula: "eas-cli",
        dependencies: &["npm"],
        ..Tool::BLANK
    },
    Tool {
        name: "gh",
        description: "GitHub command line",
        category: ToolCategory::TerminalGit,
        command: "gh",
        version: VersionSource::Command(&["--version"], version::gh),
        method: InstallMethod::BrewFormula,
        formula: "gh",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "git",
        description: "Version control",
        category: ToolCategory::TerminalGit,
        command: "git",
        version: VersionSource::Command(&["--version"], version::git),
        method: InstallMethod::Xcode,
        ..Tool::BLANK
    },
    Tool {
        name: "gpg",
        description: "GNU Privacy Guard for encryption and signing",
        category: ToolCategory::TerminalGit,
        command: "gpg",
        version: VersionSource::BrewFormula("gnupg"),
        method: InstallMethod::BrewFormula,
        formula: "gnupg",
        dependencies: HOMEBREW,
        scripts: &["gpg-setup"],
        ..Tool::BLANK
    },
    Tool {
        name: "mole",
        description: "Mac cleanup and optimisation",
        category: ToolCategory::TerminalGit,
        command: "mo",
        version: VersionSource::Command(&["--version"], version::mole),
        method: InstallMethod::BrewFormula,
        formula: "tw93/tap/mole",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "ohmyzsh",
        description: "Oh My Zsh shell framework",
        category: ToolCategory::TerminalGit,
        check: Some(check_ohmyzsh),
        install: Some(install_ohmyzsh),
        upgrade: Some(upgrade_ohmyzsh),
        ..Tool::BLANK
    },
    Tool {
        name: "tmux",
        description: "Terminal multiplexer",
        category: ToolCategory::TerminalGit,
        command: "tmux",
        version: VersionSource::Command(&["-V"], version::tmux),
        method: InstallMethod::BrewFormula,
        formula: "tmux",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    // ========================================================================
    // GUI Apps
    // ========================================================================
    Tool {
        name: "docker",
        description: "Container runtime",
        category: ToolCategory::GuiApps,
        command: "docker",
        check: Some(check_docker),
        method: InstallMethod::BrewCask,
        formula: "docker",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "ghostty",
        description: "GPU terminal emulator",
        category: ToolCategory::GuiApps,
        check: Some(check_ghostty),
        method: InstallMethod::BrewCask,
        formula: "ghostty",
        dependencies: HOMEBREW,
        scripts: &["ghostty-config"],
        ..Tool::BLANK
    },
    Tool {
        name: "neohtop",
        description: "System monitor",
        category: ToolCategory::GuiApps,
        check: Some(check_neohtop),
        method: InstallMethod::BrewCask,
        formula: "neohtop",
        dependencies: HOMEBREW,
        ..Tool::BLANK
    },
    Tool {
        name: "zed",
        description: "Zed code editor",
        category: ToolCategory::GuiApps,
        check: Some(check_zed),
        method: InstallMethod::BrewCask,
        formula: "zed",
        dependencies: HOMEBREW,
        scripts: &["zed-config"],
        ..Tool::BLANK
    },
    // ========================================================================
    // Mac App Store
    // ========================================================================
    Tool {
        name: "xcode",
        description: "Apple IDE",
        category: ToolCategory::MacAppStore,
        check: Some(check_xcode),
        method: InstallMethod::Mas,
        formula: "497799835",
        dependencies: &["mas"],
        ..Tool::BLANK
    },
    Tool {
        name: "testflight",
        description: "Beta builds for Apple platforms",
        category: ToolCategory::MacAppStore,
        check: Some(check_testflight),
        method: InstallMethod::Mas,
        formula: "899247664",
        dependencies: &["mas"],
        ..Tool::BLANK
    },
];

// ============================================================================
// Accessors
// ============================================================================

pub fn all_tools() -> &'static [Tool] {
    TOOLS
}

pub fn tools_by_category(category: ToolCategory) -> Vec<&'static Tool> {
    TOOLS.iter().filter(|t| t.category == category).collect()
}

/// Case-exact lookup; aliases are resolved by the install entry point.
pub fn tool_by_name(name: &str) -> Option<&'static Tool> {
    TOOLS.iter().find(|t| t.name == name)
}

pub fn installable_tools() -> Vec<&'static Tool> {
    TOOLS.iter().filter(|t| t.is_installable()).collect()
}

// ============================================================================
// Version helpers
// ============================================================================

/// Parses merged stdout/stderr of `cmd args`; empty on failure.
pub fn version_from_command(cmd: &str, args: &[&str], parse: Parser) -> String {
    match capture(cmd, args) {
        Ok(out) if out.success => parse(&out.text()),
        _ => String::new(),
    }
}

fn second_field(output: &str) -> String {
    output
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string()
}

pub fn version_from_brew_formula(formula: &str) -> String {
    match capture("brew", &["list", "--versions", formula]) {
        Ok(out) if out.success => second_field(&out.stdout),
        _ => String::new(),
    }
}

pub fn version_from_brew_cask(cask: &str) -> String {
    match capture("brew", &["list", "--cask", "--versions", cask]) {
        Ok(out) if out.success => second_field(&out.stdout),
        _ => String::new(),
    }
}

/// Reads `CFBundleShortVersionString` from an app bundle in `/Applications`.
pub fn version_from_app_plist(app: &str) -> String {
    let plist = format!("/Applications/{app}.app/Contents/Info.plist");
    probe::read_command_output_line("defaults", &["read", &plist, "CFBundleShortVersionString"])
}

fn app_installed(app: &str) -> bool {
    Path::new(&format!("/Applications/{app}.app")).exists()
}

fn non_empty_lines(s: &str) -> usize {
    s.lines().filter(|l| !l.trim().is_empty()).count()
}

// ============================================================================
// Custom checks
// ============================================================================

fn check_homebrew() -> CheckResult {
    if !command_exists("brew") {
        return CheckResult::not_installed();
    }
    let version = version_from_command("brew", &["--version"], version::brew);
    let formulae = capture("brew", &["list", "--formula", "-1"])
        .map(|out| non_empty_lines(&out.stdout))
        .unwrap_or(0);
    let casks = capture("brew", &["list", "--cask", "-1"])
        .map(|out| non_empty_lines(&out.stdout))
        .unwrap_or(0);
    CheckResult::with_version(version).status(format!("{formulae} formulae, {casks} casks"))
}

fn check_npm() -> CheckResult {
    if !command_exists("npm") {
        return CheckResult::not_installed();
    }
    let version = version_from_command("npm", &["--version"], version::trim);
    // parseable output lists the global prefix first, then one line per package
    let globals = capture("npm", &["list", "-g", "--depth=0", "--parseable"])
        .map(|out| non_empty_lines(&out.stdout).saturating_sub(1))
        .unwrap_or(0);
    CheckResult::with_version(version).status(format!("{globals} global"))
}

/// Number of `v*` directories under `<nvm>/versions/node`.
pub(crate) fn count_node_versions(nvm_dir: &Path) -> usize {
    fs::read_dir(nvm_dir.join("versions").join("node"))
        .map(|entries| {
            entries
                .filter_map(std::result::Result::ok)
                .filter(|e| e.path().is_dir() && e.file_name().to_string_lossy().starts_with('v'))
                .count()
        })
        .unwrap_or(0)
}

fn check_nvm() -> CheckResult {
    let nvm_dir = home_dir().join(".nvm");
    if !nvm_dir.exists() {
        return CheckResult::not_installed();
    }
    let status = match count_node_versions(&nvm_dir) {
        0 => String::new(),
        n => format!("{n} versions"),
    };
    CheckResult::with_version(version_from_brew_formula("nvm")).status(status)
}

fn check_openjdk() -> CheckResult {
    const BREW_JAVA: &str = "/opt/homebrew/opt/openjdk/bin/java";
    if Path::new(BREW_JAVA).exists() {
        return CheckResult::with_version(version_from_command(
            BREW_JAVA,
            &["-version"],
            version::java,
        ));
    }
    match capture("/usr/libexec/java_home", &[]) {
        Ok(out) if out.success => {
            CheckResult::with_version(version_from_command("java", &["-version"], version::java))
        }
        _ => CheckResult::not_installed(),
    }
}

fn running_status(running: bool) -> &'static str {
    if running { "running" } else { "stopped" }
}

fn check_ollama() -> CheckResult {
    if !app_installed("Ollama") {
        return CheckResult::not_installed();
    }
    let running = capture("pgrep", &["-x", "ollama"]).is_ok_and(|out| out.success);
    CheckResult::with_version(version_from_brew_cask("ollama-app")).status(running_status(running))
}

fn check_docker() -> CheckResult {
    if !app_installed("Docker") {
        return CheckResult::not_installed();
    }
    let running = probe::capture_with_timeout("docker", &["info"], Duration::from_secs(5))
        .is_ok_and(|out| out.success);
    CheckResult::with_version(version_from_brew_cask("docker")).status(running_status(running))
}

fn check_ghostty() -> CheckResult {
    if !app_installed("Ghostty") {
        return CheckResult::not_installed();
    }
    CheckResult::with_version(version_from_brew_cask("ghostty"))
}

fn check_neohtop() -> CheckResult {
    if !app_installed("NeoHtop") {
        return CheckResult::not_installed();
    }
    CheckResult::with_version(version_from_app_plist("NeoHtop"))
}

fn check_zed() -> CheckResult {
    if !app_installed("Zed") {
        return CheckResult::not_installed();
    }
    CheckResult::with_version(version_from_app_plist("Zed"))
}

fn check_ohmyzsh() -> CheckResult {
    let omz = home_dir().join(".oh-my-zsh");
    if !omz.exists() {
        return CheckResult::not_installed();
    }
    let omz = omz.to_string_lossy();
    CheckResult::with_version(probe::read_command_output_line(
        "git",
        &["-C", &omz, "rev-parse", "--short", "HEAD"],
    ))
}

/// Version of app `id` in `mas list` output (`"497799835  Xcode  (15.2)"`).
pub(crate) fn parse_mas_version(list: &str, id: &str) -> Option<String> {
    list.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        if fields.next()? != id {
            return None;
        }
        let open = line.rfind('(')?;
        let close = line.rfind(')')?;
        Some(if close > open {
            line[open + 1..close].trim().to_string()
        } else {
            String::new()
        })
    })
}

fn check_mas_app(id: &str, app: &str) -> CheckResult {
    if command_exists("mas") {
        if let Ok(out) = capture("mas", &["list"]) {
            if let Some(version) = parse_mas_version(&out.stdout, id) {
                return CheckResult::with_version(version);
            }
        }
    }
    if app_installed(app) {
        return CheckResult::with_version(version_from_app_plist(app));
    }
    CheckResult::not_installed()
}

fn check_xcode() -> CheckResult {
    check_mas_app("497799835", "Xcode")
}

fn check_testflight() -> CheckResult {
    check_mas_app("899247664", "TestFlight")
}

// ============================================================================
// Custom actions
// ============================================================================

fn install_homebrew() -> Result<()> {
    probe::run_shell(
        r#"/bin/bash -c "$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)""#,
    )?;
    Ok(())
}

fn install_rust() -> Result<()> {
    probe::run_shell("curl --proto '=https' --tlsv1.2 -sSf https://sh.rustup.rs | sh")?;
    Ok(())
}

fn upgrade_rust() -> Result<()> {
    if !command_exists("rustup") {
        return Err(ActionError::MissingCommand("rustup".to_string()));
    }
    probe::run("rustup", &["update"])?;
    Ok(())
}

fn install_qmd() -> Result<()> {
    if !command_exists("bun") {
        return Err(ActionError::MissingCommand("bun".to_string()));
    }
    probe::run("bun", &["install", "-g", "https://github.com/tobi/qmd"])?;
    Ok(())
}

fn install_ohmyzsh() -> Result<()> {
    probe::run_shell(
        r#"sh -c "$(curl -fsSL https://raw.githubusercontent.com/ohmyzsh/ohmyzsh/master/tools/install.sh)""#,
    )?;
    Ok(())
}

fn upgrade_ohmyzsh() -> Result<()> {
    let script = home_dir().join(".oh-my-zsh/tools/upgrade.sh");
    if !script.exists() {
        return Err(ActionError::MissingCommand("ohmyzsh".to_string()));
    }
    probe::run("sh", &[&script.to_string_lossy()])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;
    use tempfile::TempDir;

    #[test]
    fn categories_display_titles_in_order() {
        let titles: Vec<String> = ToolCategory::iter().map(|c| c.to_string()).collect();
        assert_eq!(
            titles,
            [
                "Package Managers",
                "Runtimes",
                "DevOps",
                "AI",
                "Terminal & Git",
                "GUI Apps",
                "Mac App Store"
            ]
        );
    }

    #[test]
    fn method_labels() {
        assert_eq!(InstallMethod::BrewCask.label(), "brew");
        assert_eq!(InstallMethod::Manual.label(), "sh");
        assert_eq!(InstallMethod::BrewCask.to_string(), "brew-cask");
        assert!(!InstallMethod::Nvm.is_automatic());
        assert!(InstallMethod::Bun.is_automatic());
    }

    #[test]
    fn installable_covers_methods_and_custom_actions() {
        let names: Vec<&str> = installable_tools().iter().map(|t| t.name).collect();
        assert!(names.contains(&"homebrew"), "custom install");
        assert!(names.contains(&"claude"), "brew cask");
        assert!(names.contains(&"skills"), "npm");
        assert!(!names.contains(&"git"), "xcode");
        assert!(!names.contains(&"node"), "nvm");
        assert!(!names.contains(&"xcode"), "mas");
    }

    #[test]
    fn lookup_is_case_exact_without_aliases() {
        assert!(tool_by_name("homebrew").is_some());
        assert!(tool_by_name("brew").is_none());
        assert!(tool_by_name("Homebrew").is_none());
    }

    #[test]
    fn claude_depends_on_homebrew() {
        let claude = tool_by_name("claude").unwrap();
        assert_eq!(claude.dependencies, ["homebrew"]);
        assert_eq!(claude.formula, "claude-code");
    }

    #[test]
    fn empty_command_without_check_is_not_installed() {
        let tool = Tool {
            name: "phantom",
            ..Tool::BLANK
        };
        assert_eq!(tool.check(), CheckResult::not_installed());
    }

    #[test]
    fn missing_command_is_not_installed() {
        let tool = Tool {
            name: "phantom",
            command: "definitely-not-a-real-binary-4c1d",
            ..Tool::BLANK
        };
        assert!(!tool.check().installed);
    }

    #[test]
    fn custom_check_overrides_command() {
        fn always() -> CheckResult {
            CheckResult::with_version("9.9")
        }
        let tool = Tool {
            name: "phantom",
            command: "definitely-not-a-real-binary-4c1d",
            check: Some(always),
            ..Tool::BLANK
        };
        assert_eq!(tool.check().version, "9.9");
    }

    #[test]
    fn check_is_idempotent() {
        for tool in all_tools().iter().filter(|t| t.name == "git" || t.name == "nvm") {
            assert_eq!(tool.check(), tool.check(), "{}", tool.name);
        }
    }

    #[test]
    fn counts_node_versions() {
        let nvm = TempDir::new().unwrap();
        let node = nvm.path().join("versions/node");
        fs::create_dir_all(node.join("v20.11.0")).unwrap();
        fs::create_dir_all(node.join("v22.1.0")).unwrap();
        fs::create_dir_all(node.join("system")).unwrap();
        fs::write(node.join("vfile"), "").unwrap();
        assert_eq!(count_node_versions(nvm.path()), 2);
        assert_eq!(count_node_versions(&nvm.path().join("missing")), 0);
    }

    #[test]
    fn parses_mas_list() {
        let list = "497799835  Xcode       (15.2)\n899247664  TestFlight  (3.5.1)\n";
        assert_eq!(parse_mas_version(list, "497799835").as_deref(), Some("15.2"));
        assert_eq!(parse_mas_version(list, "899247664").as_deref(), Some("3.5.1"));
        assert_eq!(parse_mas_version(list, "1"), None);
    }
}
