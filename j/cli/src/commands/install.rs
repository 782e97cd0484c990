//! `j install`

use j_lib::ActionError;
use j_lib::actions::{self, InstallOutcome};
use j_lib::catalog::{self, InstallMethod};
use j_lib::resolver;

use crate::error::{self, Result};
use crate::output::{self, Printer};

/// How one install attempt should be reported and counted.
#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Ok,
    /// Not attempted; a warning was printed.
    Skipped,
    Failed,
}

pub fn run(tools: &[String], all: bool) -> Result<()> {
    if all {
        return install_everything();
    }
    if tools.is_empty() {
        list();
        return Ok(());
    }

    output::action("📦", "Installing selected packages...");
    let (known, unknown): (Vec<&str>, Vec<&str>) = tools
        .iter()
        .map(|name| actions::canonical_name(name))
        .partition(|name| catalog::tool_by_name(name).is_some());

    let mut failed = unknown
        .iter()
        .filter(|name| report(name, actions::install(name, &Printer), false) == Verdict::Failed)
        .count();
    let order = resolver::plan(&known);
    for tool in &order {
        let result = actions::install(tool.name, &Printer);
        if !known.contains(&tool.name)
            && matches!(result, Ok(InstallOutcome::AlreadyInstalled { .. }))
        {
            continue;
        }
        if report(tool.name, result, false) == Verdict::Failed {
            failed += 1;
        }
    }
    if failed == 0 {
        output::done("Done");
    }
    error::partial(failed, unknown.len() + order.len(), "installs")
}

fn install_everything() -> Result<()> {
    output::action("🚀", "Installing all development tools...");
    let mut failed = 0;
    let mut total = 1;
    if report("homebrew", actions::install("homebrew", &Printer), true) == Verdict::Failed {
        failed += 1;
    }
    for tool in resolver::install_order() {
        if tool.name == "homebrew" {
            continue;
        }
        total += 1;
        if report(tool.name, actions::install(tool.name, &Printer), true) == Verdict::Failed {
            failed += 1;
        }
    }
    if failed == 0 {
        output::done("All packages installed");
    }
    error::partial(failed, total, "installs")
}

/// Prints the outcome of one install. In bulk mode a missing dependency is a
/// skip rather than a failure.
fn report(name: &str, result: j_lib::error::Result<InstallOutcome>, bulk: bool) -> Verdict {
    match result {
        Ok(InstallOutcome::AlreadyInstalled { version }) if version.is_empty() => {
            output::row(true, name, "already installed");
            Verdict::Ok
        }
        Ok(InstallOutcome::AlreadyInstalled { version }) => {
            output::row(true, name, &format!("already installed ({version})"));
            Verdict::Ok
        }
        Ok(InstallOutcome::Installed { scripts }) => {
            if !scripts.is_empty() {
                output::dim(&format!("{}ran {}", output::INDENT, scripts.join(", ")));
            }
            Verdict::Ok
        }
        Err(ActionError::CannotAutoInstall { name, method })
            if method == InstallMethod::Nvm.to_string() =>
        {
            output::warning(&format!("Run 'nvm install stable' to install {name}"));
            Verdict::Skipped
        }
        Err(ActionError::MissingDependency { tool, dependency }) if bulk => {
            output::warning(&format!("Skipping {tool} ({dependency} not installed)"));
            Verdict::Skipped
        }
        Err(e @ (ActionError::UnknownTool(_) | ActionError::MissingDependency { .. })) => {
            output::error(&e.to_string());
            Verdict::Failed
        }
        Err(e) => {
            output::error(&format!("Failed to install {name}: {e}"));
            Verdict::Failed
        }
    }
}

fn list() {
    output::info("Available packages:");
    output::empty();

    let tools = catalog::installable_tools();
    let mut current = None;
    for (tool, result) in actions::check_all(&tools) {
        if current != Some(tool.category) {
            current = Some(tool.category);
            output::category(&tool.category.to_string());
        }
        output::row(result.installed, tool.name, tool.method.label());
    }

    output::empty();
    output::usage(&[
        "Usage: j install <package> [package...]",
        "       j install --all",
    ]);
}
