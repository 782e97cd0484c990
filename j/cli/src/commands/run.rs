//! `j run <group> <command> [args]`

use j_lib::ActionError;
use j_lib::shortcuts::{self, ShortcutGroup};

use crate::error::Result;
use crate::output::{self, Printer};

pub fn run(group: Option<&str>, name: Option<&str>, args: &[String]) -> Result<()> {
    let Some(group) = group else {
        list_groups();
        return Ok(());
    };
    let Some(name) = name else {
        let g = shortcuts::group_by_name(group)
            .ok_or_else(|| ActionError::UnknownGroup(group.to_string()))?;
        list_shortcuts(g);
        return Ok(());
    };
    shortcuts::run(group, name, args, &Printer)?;
    Ok(())
}

fn list_groups() {
    output::info("Available run groups:");
    output::empty();
    for g in shortcuts::groups() {
        output::line(&output::format_row("•", g.name, g.description));
    }
    output::empty();
    output::usage(&["Usage: j run <group> <command> [args...]"]);
}

/// `<name> <message>` for shortcuts that need an argument.
fn shortcut_usage(name: &str, min_args: usize) -> String {
    if min_args > 0 {
        format!("{name} <message>")
    } else {
        name.to_string()
    }
}

fn list_shortcuts(group: &ShortcutGroup) {
    output::info(&format!("{}:", group.description));
    output::empty();
    for s in group.shortcuts {
        output::line(&output::format_row(
            "•",
            &shortcut_usage(s.name, s.min_args),
            s.description,
        ));
    }
    output::empty();
    output::usage(&[&format!("Usage: j run {} <command> [args...]", group.name)]);
}
