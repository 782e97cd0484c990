//! Install, upgrade, clean and run-script executors.
//!
//! Every executor works on a single target and returns a typed outcome; list
//! variants run their targets strictly one after another and collect each
//! result, so one failure never stops the rest.
//!
//! ## Examples
//!
//! ```
//! use j_lib::actions::{canonical_name, install_command};
//! use j_lib::catalog;
//!
//! assert_eq!(canonical_name("brew"), "homebrew");
//!
//! let gh = catalog::tool_by_name("gh").unwrap();
//! assert_eq!(install_command(gh), Some(("brew", vec!["install", "gh"])));
//! ```
//!
//! ## Errors
//!
//! Executors return [`ActionError`]: unknown names, missing prerequisites,
//! install methods without an automatic path and failed external commands.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::catalog::{
    self, CheckResult, Cleanable, InstallMethod, PackageManager, Reporter, Script, Tool,
};
use crate::error::{ActionError, Result};
use crate::probe::{self, command_exists};

/// Result of installing one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Nothing to do; carries the detected version.
    AlreadyInstalled { version: String },
    /// Installed, followed by these post-install scripts.
    Installed { scripts: Vec<&'static str> },
}

/// Result of an upgrade or clean that may be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The required command is not present on this machine.
    Skipped,
}

/// Applies the `brew` → `homebrew` alias accepted on the command line.
pub fn canonical_name(name: &str) -> &str {
    if name == "brew" { "homebrew" } else { name }
}

// ============================================================================
// Install
// ============================================================================

/// The package-manager invocation for an automatic install method.
pub fn install_command(tool: &Tool) -> Option<(&'static str, Vec<&'static str>)> {
    match tool.method {
        InstallMethod::BrewFormula => Some(("brew", vec!["install", tool.formula])),
        InstallMethod::BrewCask => Some(("brew", vec!["install", "--cask", tool.formula])),
        InstallMethod::Npm => Some(("npm", vec!["install", "-g", tool.formula])),
        InstallMethod::Bun => Some(("bun", vec!["install", "-g", tool.formula])),
        InstallMethod::Nvm | InstallMethod::Xcode | InstallMethod::Manual | InstallMethod::Mas => {
            None
        }
    }
}

/// Installs `name` from the built-in catalog.
pub fn install(name: &str, reporter: &dyn Reporter) -> Result<InstallOutcome> {
    install_in(catalog::all_tools(), name, reporter)
}

/// Installs `name` resolved against `catalog`.
///
/// ## Errors
///
/// - [`ActionError::UnknownTool`] when the name is not in the catalog.
/// - [`ActionError::MissingDependency`] when a declared dependency's check
///   reports it absent.
/// - [`ActionError::CannotAutoInstall`] for nvm, xcode, manual and mas
///   tools without a custom install.
pub fn install_in(catalog: &[Tool], name: &str, reporter: &dyn Reporter) -> Result<InstallOutcome> {
    let name = canonical_name(name);
    let tool = catalog
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| ActionError::UnknownTool(name.to_string()))?;

    let current = tool.check();
    if current.installed {
        debug!(tool = tool.name, version = %current.version, "already installed");
        return Ok(InstallOutcome::AlreadyInstalled {
            version: current.version,
        });
    }

    for dep in tool.dependencies {
        let present = catalog
            .iter()
            .find(|t| t.name == *dep)
            .is_some_and(|t| t.check().installed);
        if !present {
            return Err(ActionError::MissingDependency {
                tool: tool.name.to_string(),
                dependency: (*dep).to_string(),
            });
        }
    }

    reporter.step(&format!("Installing {}", tool.name));
    if let Some(action) = tool.install {
        action()?;
    } else if let Some((cmd, args)) = install_command(tool) {
        info!(tool = tool.name, command = cmd, ?args, "installing");
        probe::run(cmd, &args)?;
    } else {
        return Err(ActionError::CannotAutoInstall {
            name: tool.name.to_string(),
            method: tool.method.to_string(),
        });
    }
    reporter.done(&format!("{} installed", tool.name));

    let mut ran = Vec::with_capacity(tool.scripts.len());
    for script_name in tool.scripts {
        let script = catalog::script_by_name(script_name)
            .ok_or_else(|| ActionError::UnknownScript((*script_name).to_string()))?;
        reporter.step(&format!("Running {}", script.name));
        (script.run)(reporter)?;
        ran.push(script.name);
    }

    Ok(InstallOutcome::Installed { scripts: ran })
}

/// Installs each name in order, continuing past failures.
pub fn install_many<'a>(
    names: &[&'a str],
    reporter: &dyn Reporter,
) -> Vec<(&'a str, Result<InstallOutcome>)> {
    names
        .iter()
        .map(|name| (*name, install(name, reporter)))
        .collect()
}

// ============================================================================
// Upgrade
// ============================================================================

/// The package-manager invocation for an automatic upgrade.
pub fn upgrade_command(tool: &Tool) -> Option<(&'static str, Vec<&'static str>)> {
    match tool.method {
        InstallMethod::BrewFormula => Some(("brew", vec!["upgrade", tool.formula])),
        InstallMethod::BrewCask => Some(("brew", vec!["upgrade", "--cask", tool.formula])),
        InstallMethod::Npm => Some(("npm", vec!["update", "-g", tool.formula])),
        InstallMethod::Bun => Some(("bun", vec!["update", "-g", tool.formula])),
        InstallMethod::Nvm | InstallMethod::Xcode | InstallMethod::Manual | InstallMethod::Mas => {
            None
        }
    }
}

pub fn is_upgradable(tool: &Tool) -> bool {
    tool.upgrade.is_some() || upgrade_command(tool).is_some()
}

/// Upgrades one tool. Names outside the catalog go to `brew upgrade <name>`.
///
/// ## Errors
///
/// [`ActionError::UnknownPackage`] when the name is unknown and brew is
/// absent; [`ActionError::CannotAutoUpgrade`] for methods without an
/// automatic path.
pub fn upgrade(name: &str) -> Result<()> {
    let name = canonical_name(name);
    let Some(tool) = catalog::tool_by_name(name) else {
        if !command_exists("brew") {
            return Err(ActionError::UnknownPackage(name.to_string()));
        }
        info!(package = name, "upgrading through brew fallback");
        probe::run("brew", &["upgrade", name])?;
        return Ok(());
    };

    if let Some(action) = tool.upgrade {
        return action();
    }
    let (cmd, args) = upgrade_command(tool).ok_or_else(|| ActionError::CannotAutoUpgrade {
        name: tool.name.to_string(),
        method: tool.method.to_string(),
    })?;
    info!(tool = tool.name, command = cmd, ?args, "upgrading");
    probe::run(cmd, &args)?;
    Ok(())
}

/// Runs a package manager's upgrade, skipping it when its command is absent.
pub fn upgrade_package_manager(pm: &PackageManager) -> Result<Outcome> {
    if !command_exists(pm.requires_command) {
        warn!(manager = pm.name, "skipping upgrade, command missing");
        return Ok(Outcome::Skipped);
    }
    (pm.upgrade)()?;
    Ok(Outcome::Done)
}

/// Upgrades every registered package manager in order.
pub fn upgrade_all_package_managers() -> Vec<(&'static str, Result<Outcome>)> {
    catalog::package_managers()
        .iter()
        .map(|pm| (pm.name, upgrade_package_manager(pm)))
        .collect()
}

// ============================================================================
// Clean
// ============================================================================

pub fn clean_item(item: &Cleanable) -> Result<Outcome> {
    if !item.is_available() {
        debug!(cleanable = item.name, "skipping, command missing");
        return Ok(Outcome::Skipped);
    }
    info!(cleanable = item.name, "cleaning");
    (item.clean)()?;
    Ok(Outcome::Done)
}

/// Cleans one named item.
pub fn clean(name: &str) -> Result<Outcome> {
    let item = catalog::cleanable_by_name(name)
        .ok_or_else(|| ActionError::UnknownCleanable(name.to_string()))?;
    clean_item(item)
}

/// Cleans every registered item in order, continuing past failures.
pub fn clean_all() -> Vec<(&'static str, Result<Outcome>)> {
    catalog::cleanables()
        .iter()
        .map(|item| (item.name, clean_item(item)))
        .collect()
}

/// Reclaimable bytes per item, probed in parallel. `None` when the item has
/// no size probe.
pub fn cleanable_sizes<'a>(items: &[&'a Cleanable]) -> Vec<(&'a Cleanable, Option<u64>)> {
    items
        .par_iter()
        .map(|item| (*item, item.size.map(|size| size())))
        .collect()
}

// ============================================================================
// Scripts and bulk checks
// ============================================================================

/// Runs a script after verifying its required tool.
///
/// ## Errors
///
/// [`ActionError::UnknownScript`] or [`ActionError::MissingDependency`].
pub fn run_script(name: &str, reporter: &dyn Reporter) -> Result<()> {
    let script = catalog::script_by_name(name)
        .ok_or_else(|| ActionError::UnknownScript(name.to_string()))?;
    run_script_checked(script, reporter)
}

fn run_script_checked(script: &Script, reporter: &dyn Reporter) -> Result<()> {
    if let Some(required) = script.required_tool {
        let present = catalog::tool_by_name(required).is_some_and(|t| t.check().installed);
        if !present {
            return Err(ActionError::MissingDependency {
                tool: script.name.to_string(),
                dependency: required.to_string(),
            });
        }
    }
    info!(script = script.name, "running script");
    (script.run)(reporter)
}

/// Runs every tool's check in parallel, preserving input order.
pub fn check_all<'a>(tools: &[&'a Tool]) -> Vec<(&'a Tool, CheckResult)> {
    tools.par_iter().map(|tool| (*tool, tool.check())).collect()
}
