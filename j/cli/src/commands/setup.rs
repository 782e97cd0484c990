//! `j setup`: interactive menu over setup scripts, skills and remote access.

use std::fmt;

use inquire::{InquireError, Select};
use j_lib::RemoteManager;
use j_lib::actions;
use j_lib::catalog::{self, Script};
use rayon::prelude::*;

use super::{remote, skills};
use crate::error::Result;
use crate::output::{self, ICON_CHECK, ICON_PENDING, Printer};

#[derive(Debug, Clone, PartialEq, Eq)]
enum MenuEntry {
    /// A script and whether its probe reports it applied. `None` when the
    /// script has no probe.
    Script {
        name: &'static str,
        description: &'static str,
        configured: Option<bool>,
    },
    Skills,
    Remote,
    Quit,
}

impl fmt::Display for MenuEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script {
                name,
                description,
                configured,
            } => {
                let icon = match configured {
                    Some(true) => ICON_CHECK,
                    Some(false) => ICON_PENDING,
                    None => "▸",
                };
                write!(f, "{icon} {name:<18} {description}")
            }
            Self::Skills => write!(f, "★ {:<18} Browse and install agent skills", "skills"),
            Self::Remote => write!(f, "⇄ {:<18} Configure remote access", "remote"),
            Self::Quit => write!(f, "  quit"),
        }
    }
}

/// Probes every script in parallel, keeping catalog order.
fn menu_entries(scripts: &[&'static Script]) -> Vec<MenuEntry> {
    let mut entries: Vec<MenuEntry> = scripts
        .par_iter()
        .map(|script| MenuEntry::Script {
            name: script.name,
            description: script.description,
            configured: script.check.map(|_| script.check().installed),
        })
        .collect();
    entries.extend([MenuEntry::Skills, MenuEntry::Remote, MenuEntry::Quit]);
    entries
}

pub fn run() -> Result<()> {
    let scripts = catalog::standalone_scripts();
    loop {
        let choice = match Select::new("Setup", menu_entries(&scripts))
            .with_page_size(24)
            .prompt()
        {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        match choice {
            MenuEntry::Script { name, .. } => {
                output::action("⚙️", &format!("Running {name}..."));
                match actions::run_script(name, &Printer) {
                    Ok(()) => output::success(&format!("{name} done")),
                    Err(e) => output::error(&e.to_string()),
                }
                output::empty();
            }
            MenuEntry::Skills => {
                if let Err(e) = skills::browse() {
                    output::error(&e.to_string());
                }
            }
            MenuEntry::Remote => remote::setup(&RemoteManager::new())?,
            MenuEntry::Quit => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stateless_scripts_have_no_state() {
        let reset = catalog::script_by_name("dock-reset").unwrap();
        let entries = menu_entries(&[reset]);
        assert_eq!(
            entries[0],
            MenuEntry::Script {
                name: "dock-reset",
                description: reset.description,
                configured: None,
            }
        );
        assert!(entries[0].to_string().starts_with("▸ dock-reset"));
    }

    #[test]
    fn menu_ends_with_skills_remote_quit() {
        let entries = menu_entries(&[]);
        assert_eq!(
            entries,
            [MenuEntry::Skills, MenuEntry::Remote, MenuEntry::Quit]
        );
    }
}
