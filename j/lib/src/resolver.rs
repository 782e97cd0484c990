//! Install ordering over declared tool dependencies.
//!
//! A depth-first walk visits each tool at most once, emitting dependencies
//! before dependents. Only installable tools are emitted; a prerequisite such
//! as `node` (installed through nvm) stays in the graph but is left to the
//! install executor to verify.
//!
//! ## Examples
//!
//! ```
//! use j_lib::resolver;
//!
//! let order = resolver::resolve(&["claude"]);
//! assert_eq!(order.last().map(|t| t.name), Some("claude"));
//! ```

use std::collections::HashSet;

use tracing::trace;

use crate::catalog::{self, Tool};

/// Install order for `names` against an arbitrary catalog.
///
/// Unknown names are ignored. A cycle is cut at the second visit of a node.
pub fn resolve_in<'a>(catalog: &'a [Tool], names: &[&str]) -> Vec<&'a Tool> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    for name in names {
        visit(catalog, name, &mut visited, &mut order);
    }
    order
}

fn visit<'a>(
    catalog: &'a [Tool],
    name: &str,
    visited: &mut HashSet<&'a str>,
    order: &mut Vec<&'a Tool>,
) {
    let Some(tool) = catalog.iter().find(|t| t.name == name) else {
        trace!(name, "skipping unknown dependency");
        return;
    };
    if !visited.insert(tool.name) {
        return;
    }
    for dep in tool.dependencies {
        visit(catalog, dep, visited, order);
    }
    if tool.is_installable() {
        order.push(tool);
    }
}

/// Like [`resolve_in`], but every requested tool is kept even when it cannot
/// be installed automatically, so the executor can explain why.
pub fn plan_in<'a>(catalog: &'a [Tool], names: &[&str]) -> Vec<&'a Tool> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    for name in names {
        let Some(tool) = catalog.iter().find(|t| t.name == *name) else {
            continue;
        };
        visit(catalog, name, &mut visited, &mut order);
        if !order.iter().any(|t| t.name == tool.name) {
            order.push(tool);
        }
    }
    order
}

/// Install order for `names` against the built-in catalog.
pub fn resolve(names: &[&str]) -> Vec<&'static Tool> {
    resolve_in(catalog::all_tools(), names)
}

/// Explicitly requested tools against the built-in catalog, dependencies
/// first.
pub fn plan(names: &[&str]) -> Vec<&'static Tool> {
    plan_in(catalog::all_tools(), names)
}

/// Every installable tool, dependencies first.
pub fn install_order() -> Vec<&'static Tool> {
    let names: Vec<&str> = catalog::installable_tools().iter().map(|t| t.name).collect();
    resolve(&names)
}
