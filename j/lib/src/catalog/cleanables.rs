//! Reclaimable storage: caches, VMs, container layers and the Trash.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use super::ActionFn;
use crate::error::Result;
use crate::probe::{self, command_exists, directory_size, home_dir};

#[derive(Debug, Clone, Copy)]
pub struct Cleanable {
    pub name: &'static str,
    pub description: &'static str,
    /// Hidden and skipped when this command is absent.
    pub requires_command: Option<&'static str>,
    /// Bytes that cleaning would reclaim.
    pub size: Option<fn() -> u64>,
    pub clean: ActionFn,
}

impl Cleanable {
    pub fn is_available(&self) -> bool {
        self.requires_command.is_none_or(command_exists)
    }
}

static CLEANABLES: &[Cleanable] = &[
    Cleanable {
        name: "brew",
        description: "Clean Homebrew cache",
        requires_command: Some("brew"),
        size: Some(brew_cache_size),
        clean: clean_brew,
    },
    Cleanable {
        name: "docker",
        description: "Clean Docker containers, images, volumes",
        requires_command: Some("docker"),
        size: None,
        clean: clean_docker,
    },
    Cleanable {
        name: "multipass",
        description: "Remove all Multipass instances",
        requires_command: Some("multipass"),
        size: Some(multipass_size),
        clean: clean_multipass,
    },
    Cleanable {
        name: "trash",
        description: "Empty system trash",
        requires_command: None,
        size: Some(trash_size),
        clean: clean_trash,
    },
];

pub fn cleanables() -> &'static [Cleanable] {
    CLEANABLES
}

pub fn cleanable_by_name(name: &str) -> Option<&'static Cleanable> {
    CLEANABLES.iter().find(|c| c.name == name)
}

/// Cleanables whose required command is present.
pub fn available_cleanables() -> Vec<&'static Cleanable> {
    CLEANABLES.iter().filter(|c| c.is_available()).collect()
}

fn brew_cache_size() -> u64 {
    directory_size(&home_dir().join("Library/Caches/Homebrew"))
}

fn multipass_size() -> u64 {
    directory_size(&home_dir().join("Library/Application Support/multipassd"))
}

fn trash_size() -> u64 {
    directory_size(&home_dir().join(".Trash"))
}

fn clean_brew() -> Result<()> {
    probe::run("brew", &["cleanup"])?;
    Ok(())
}

fn clean_docker() -> Result<()> {
    for target in ["container", "image", "volume", "network", "builder"] {
        // each prune is independent; one failing must not stop the rest
        if let Err(err) = probe::run("docker", &[target, "prune", "-f"]) {
            tracing::warn!(target, %err, "docker prune failed");
        }
    }
    Ok(())
}

fn clean_multipass() -> Result<()> {
    let _ = probe::run("multipass", &["delete", "--all"]);
    probe::run("multipass", &["purge"])?;
    Ok(())
}

fn clean_trash() -> Result<()> {
    let trash = home_dir().join(".Trash");
    empty_dir(&trash)
}

/// Removes a directory's contents and leaves it in place.
///
/// Entries that cannot be removed are logged and skipped.
pub(crate) fn empty_dir(dir: &Path) -> Result<()> {
    empty_dir_with(dir, remove_entry)
}

fn remove_entry(path: &Path) -> io::Result<()> {
    if path.symlink_metadata()?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn empty_dir_with(dir: &Path, remove: impl Fn(&Path) -> io::Result<()>) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Err(e) = remove(&path) {
            debug!(path = %path.display(), error = %e, "skipping entry that could not be removed");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn trash_is_always_available() {
        let trash = cleanable_by_name("trash").unwrap();
        assert!(trash.requires_command.is_none());
        assert!(trash.is_available());
        assert!(available_cleanables().iter().any(|c| c.name == "trash"));
    }

    #[test]
    fn missing_command_hides_cleanable() {
        let ghost = Cleanable {
            name: "ghost",
            description: "",
            requires_command: Some("definitely-not-a-real-binary-4c1d"),
            size: None,
            clean: || Ok(()),
        };
        assert!(!ghost.is_available());
    }

    #[test]
    fn empty_dir_keeps_directory() {
        let root = TempDir::new().unwrap();
        let trash = root.path().join(".Trash");
        fs::create_dir_all(trash.join("old")).unwrap();
        fs::write(trash.join("old/file"), "x").unwrap();

        empty_dir(&trash).unwrap();
        assert!(trash.is_dir());
        assert_eq!(fs::read_dir(&trash).unwrap().count(), 0);
    }

    #[test]
    fn empty_dir_creates_missing_directory() {
        let root = TempDir::new().unwrap();
        let trash = root.path().join(".Trash");
        empty_dir(&trash).unwrap();
        assert!(trash.is_dir());
    }

    #[test]
    fn undeletable_entries_are_skipped() {
        let root = TempDir::new().unwrap();
        let trash = root.path().join(".Trash");
        fs::create_dir_all(trash.join("locked")).unwrap();
        fs::create_dir_all(trash.join("old")).unwrap();
        fs::write(trash.join("note.txt"), "x").unwrap();

        empty_dir_with(&trash, |path| {
            if path.ends_with("locked") {
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            } else {
                remove_entry(path)
            }
        })
        .unwrap();

        let left: Vec<String> = fs::read_dir(&trash)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(left, ["locked"]);
    }
}
