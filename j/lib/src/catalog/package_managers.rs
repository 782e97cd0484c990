//! Package managers that `j upgrade` can refresh wholesale.

use super::ActionFn;
use crate::error::Result;
use crate::probe;

#[derive(Debug, Clone, Copy)]
pub struct PackageManager {
    pub name: &'static str,
    /// Long flag name on `j upgrade` (`brew` → `--brew`).
    pub flag: &'static str,
    pub requires_command: &'static str,
    pub upgrade: ActionFn,
}

static PACKAGE_MANAGERS: &[PackageManager] = &[
    PackageManager {
        name: "homebrew",
        flag: "brew",
        requires_command: "brew",
        upgrade: upgrade_brew,
    },
    PackageManager {
        name: "npm",
        flag: "npm",
        requires_command: "npm",
        upgrade: upgrade_npm,
    },
    PackageManager {
        name: "bun",
        flag: "bun",
        requires_command: "bun",
        upgrade: upgrade_bun,
    },
];

pub fn package_managers() -> &'static [PackageManager] {
    PACKAGE_MANAGERS
}

pub fn package_manager_by_flag(flag: &str) -> Option<&'static PackageManager> {
    PACKAGE_MANAGERS.iter().find(|pm| pm.flag == flag)
}

fn upgrade_brew() -> Result<()> {
    probe::run("brew", &["update"])?;
    probe::run("brew", &["upgrade"])?;
    Ok(())
}

fn upgrade_npm() -> Result<()> {
    probe::run("npm", &["update", "-g"])?;
    Ok(())
}

fn upgrade_bun() -> Result<()> {
    probe::run("bun", &["update", "-g"])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_flag() {
        assert_eq!(package_manager_by_flag("brew").unwrap().name, "homebrew");
        assert_eq!(package_manager_by_flag("bun").unwrap().requires_command, "bun");
        assert!(package_manager_by_flag("homebrew").is_none());
    }

    #[test]
    fn flags_are_unique() {
        let mut flags: Vec<&str> = package_managers().iter().map(|pm| pm.flag).collect();
        flags.sort_unstable();
        flags.dedup();
        assert_eq!(flags.len(), package_managers().len());
    }
}
