//! Project template synchronisation through `copier`.
//!
//! A project is linked to the shared template when it carries a
//! `.copier-answers.yml`. The template itself lives in the `dotfiles/templates`
//! directory of the CLI's repository checkout.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::ConfigPaths;
use crate::error::{ActionError, Result};
use crate::probe::{self, command_exists};

pub const ANSWERS_FILE: &str = ".copier-answers.yml";
pub const TEMPLATE_DIR: &str = "dotfiles/templates";
const COPIER: &str = "copier";

/// Marker files checked in order; the first present decides the language.
const LANGUAGE_MARKERS: [(&str, &str); 4] = [
    ("go.mod", "go"),
    ("package.json", "typescript"),
    ("pyproject.toml", "python"),
    ("setup.py", "python"),
];

pub fn is_linked(dir: &Path) -> bool {
    dir.join(ANSWERS_FILE).is_file()
}

pub fn template_path(paths: &ConfigPaths) -> Option<PathBuf> {
    paths.repo_file(TEMPLATE_DIR)
}

pub fn detect_language(dir: &Path) -> Option<&'static str> {
    LANGUAGE_MARKERS
        .iter()
        .find(|(marker, _)| dir.join(marker).exists())
        .map(|(_, lang)| *lang)
}

/// One `key: value` line of the answers file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub key: String,
    pub value: String,
}

impl Answer {
    /// Keys copier manages itself start with `_`.
    pub fn is_internal(&self) -> bool {
        self.key.starts_with('_')
    }
}

/// Flat `key: value` pairs, skipping blanks and comments.
pub fn parse_answers(text: &str) -> Vec<Answer> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| Answer {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        })
        .collect()
}

pub fn read_answers(dir: &Path) -> Result<Vec<Answer>> {
    Ok(parse_answers(&fs::read_to_string(dir.join(ANSWERS_FILE))?))
}

/// Directories directly under `root` that are linked to a template, sorted.
pub fn linked_projects(root: &Path) -> Result<Vec<PathBuf>> {
    let mut projects: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && is_linked(path))
        .collect();
    projects.sort();
    Ok(projects)
}

/// Arguments for `copier copy` of `template` into the current directory.
pub fn init_args(template: &Path, language: Option<&str>) -> Vec<String> {
    let mut args = vec!["copy".to_string(), "--trust".to_string()];
    if let Some(lang) = language {
        args.push("--data".to_string());
        args.push(format!("language={lang}"));
    }
    args.push(template.display().to_string());
    args.push(".".to_string());
    args
}

fn require_copier() -> Result<()> {
    if command_exists(COPIER) {
        Ok(())
    } else {
        Err(ActionError::Failed("copier not installed. Run: j install copier".into()))
    }
}

fn require_linked(dir: &Path) -> Result<()> {
    if is_linked(dir) {
        Ok(())
    } else {
        Err(ActionError::Failed(format!("No {ANSWERS_FILE} found in {}", dir.display())))
    }
}

/// `copier update --trust` in `dir`.
pub fn update(dir: &Path) -> Result<()> {
    require_linked(dir)?;
    require_copier()?;
    info!(dir = %dir.display(), "updating from template");
    probe::run_in(dir, COPIER, &["update", "--trust"])?;
    Ok(())
}

/// `copier update --pretend --diff --trust` in `dir`.
pub fn diff(dir: &Path) -> Result<()> {
    require_linked(dir)?;
    require_copier()?;
    probe::run_in(dir, COPIER, &["update", "--pretend", "--diff", "--trust"])?;
    Ok(())
}

/// `copier copy` of the template into `dir`, which must not be linked yet.
pub fn init(dir: &Path, template: &Path, language: Option<&str>) -> Result<()> {
    require_copier()?;
    if is_linked(dir) {
        return Err(ActionError::Failed(format!(
            "Project already linked to a template ({ANSWERS_FILE} exists)"
        )));
    }
    let args = init_args(template, language);
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    info!(dir = %dir.display(), template = %template.display(), "initializing from template");
    probe::run_in(dir, COPIER, &refs)?;
    Ok(())
}
