//! `j clean`

use j_lib::actions::{self, Outcome};
use j_lib::catalog;
use j_lib::probe::format_bytes;

use crate::error::{self, Result};
use crate::output;

pub fn run(items: &[String], all: bool) -> Result<()> {
    if all {
        output::action("🧹", "Cleaning everything...");
        let results = actions::clean_all();
        let total = results.len();
        let failed = results
            .into_iter()
            .filter(|(name, result)| !report(name, result))
            .count();
        output::done("System cleanup completed");
        return error::partial(failed, total, "clean items");
    }

    if items.is_empty() {
        list();
        return Ok(());
    }

    output::action("🧹", "Cleaning selected items...");
    let failed = items
        .iter()
        .filter(|name| !report(name, &actions::clean(name)))
        .count();
    output::done("Cleanup completed");
    error::partial(failed, items.len(), "clean items")
}

/// Prints one item's result; `false` on failure.
fn report(name: &str, result: &j_lib::error::Result<Outcome>) -> bool {
    match result {
        Ok(Outcome::Done) => {
            output::success(&format!("{name} cleaned"));
            true
        }
        Ok(Outcome::Skipped) => {
            let missing = catalog::cleanable_by_name(name)
                .and_then(|c| c.requires_command)
                .unwrap_or(name);
            output::warning(&format!("Skipping {name} ({missing} not installed)"));
            true
        }
        Err(e) => {
            output::error(&e.to_string());
            false
        }
    }
}

/// Table rows of name, size and description.
fn size_rows(sizes: &[(&catalog::Cleanable, Option<u64>)]) -> Vec<Vec<String>> {
    sizes
        .iter()
        .map(|(item, size)| {
            vec![
                item.name.to_string(),
                size.map_or_else(|| "-".to_string(), format_bytes),
                item.description.to_string(),
            ]
        })
        .collect()
}

fn list() {
    output::info("Available clean items:");
    output::empty();
    let items = catalog::available_cleanables();
    let sizes = actions::cleanable_sizes(&items);
    output::table(&["NAME", "SIZE", "DESCRIPTION"], &size_rows(&sizes));
    output::empty();
    output::usage(&["Usage: j clean <item> [item...]", "       j clean --all"]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_show_dash_without_size_probe() {
        let trash = catalog::cleanable_by_name("trash").unwrap();
        let docker = catalog::cleanable_by_name("docker").unwrap();
        let rows = size_rows(&[(trash, Some(2048)), (docker, None)]);
        assert_eq!(rows[0][0], "trash");
        assert_eq!(rows[0][1], "2.0 KB");
        assert_eq!(rows[1][1], "-");
    }
}
