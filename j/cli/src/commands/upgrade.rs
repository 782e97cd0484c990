//! `j upgrade`

use j_lib::actions::{self, Outcome};
use j_lib::catalog::{self, PackageManager};
use j_lib::probe::command_exists;

use crate::error::{self, Result};
use crate::output;

pub fn run(packages: &[String], all: bool, managers: &[&'static PackageManager]) -> Result<()> {
    if all {
        output::action("🔄", "Upgrading all packages...");
        let results = actions::upgrade_all_package_managers();
        let total = results.len();
        let failed = results
            .into_iter()
            .filter(|(name, result)| !report_manager(name, result))
            .count();
        output::done("All upgrades completed");
        return error::partial(failed, total, "upgrades");
    }

    if !managers.is_empty() {
        let failed = managers
            .iter()
            .filter(|pm| {
                output::action("🔄", &format!("Upgrading {}...", pm.name));
                !report_manager(pm.name, &actions::upgrade_package_manager(pm))
            })
            .count();
        output::done("Upgrades completed");
        return error::partial(failed, managers.len(), "upgrades");
    }

    if !packages.is_empty() {
        output::action("🔄", "Upgrading selected packages...");
        let failed = packages
            .iter()
            .filter(|name| match actions::upgrade(name) {
                Ok(()) => {
                    output::success(&format!("{name} upgraded"));
                    false
                }
                Err(e) => {
                    output::error(&e.to_string());
                    true
                }
            })
            .count();
        output::done("Upgrades completed");
        return error::partial(failed, packages.len(), "upgrades");
    }

    list();
    Ok(())
}

/// Prints a package manager's result; `false` on failure.
fn report_manager(name: &str, result: &j_lib::error::Result<Outcome>) -> bool {
    match result {
        Ok(Outcome::Done) => {
            output::success(&format!("{name} upgraded"));
            true
        }
        Ok(Outcome::Skipped) => {
            output::dim(&format!("{}{name} not installed, skipping", output::INDENT));
            true
        }
        Err(e) => {
            output::error(&format!("{name}: {e}"));
            false
        }
    }
}

fn list() {
    output::info("Available upgrade targets:");
    output::empty();

    for pm in catalog::package_managers() {
        output::row(command_exists(pm.requires_command), pm.name, &format!("--{}", pm.flag));
    }

    let upgradable: Vec<_> = catalog::all_tools()
        .iter()
        .filter(|t| actions::is_upgradable(t))
        .collect();
    let installed: Vec<_> = actions::check_all(&upgradable)
        .into_iter()
        .filter(|(_, result)| result.installed)
        .collect();
    if !installed.is_empty() {
        output::empty();
        output::category("Installed tools");
        for (tool, result) in installed {
            output::row(true, tool.name, &result.version);
        }
    }

    output::empty();
    output::usage(&[
        "Usage: j upgrade <package> [package...]",
        "       j upgrade --brew --npm",
        "       j upgrade --all",
    ]);
}
