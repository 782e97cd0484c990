//! `j sync [init|status|diff] [--all]`

use std::path::{Path, PathBuf};

use clap::Subcommand;
use j_lib::ConfigPaths;
use j_lib::sync::{self, ANSWERS_FILE, Answer};

use crate::error::{self, CliError, Result};
use crate::output;

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum SyncAction {
    /// Link the current project to the template
    Init,
    /// Show template links and answers
    Status,
    /// Preview template changes without applying them
    Diff,
}

pub fn run(action: Option<SyncAction>, all: bool) -> Result<()> {
    let paths = ConfigPaths::new();
    let cwd = std::env::current_dir()?;
    match (action, all) {
        (None, false) => {
            output::action("🔄", "Updating from template...");
            sync::update(&cwd)?;
            output::done("Project synced");
            Ok(())
        }
        (None, true) => update_all(&developer_dir(&paths)),
        (Some(SyncAction::Init), _) => init(&paths, &cwd),
        (Some(SyncAction::Status), false) => {
            status(&cwd)?;
            Ok(())
        }
        (Some(SyncAction::Status), true) => status_all(&developer_dir(&paths)),
        (Some(SyncAction::Diff), _) => {
            sync::diff(&cwd)?;
            Ok(())
        }
    }
}

fn developer_dir(paths: &ConfigPaths) -> PathBuf {
    paths.home().join("Developer")
}

fn init(paths: &ConfigPaths, dir: &Path) -> Result<()> {
    let template = sync::template_path(paths).ok_or_else(|| {
        CliError::Usage(format!(
            "template directory {} not found in the jterrazz-cli checkout",
            sync::TEMPLATE_DIR
        ))
    })?;
    let language = sync::detect_language(dir);
    match language {
        Some(lang) => output::action("🧬", &format!("Initializing {lang} project from template...")),
        None => output::action("🧬", "Initializing project from template..."),
    }
    sync::init(dir, &template, language)?;
    output::done("Project linked to template");
    Ok(())
}

fn update_all(root: &Path) -> Result<()> {
    let projects = sync::linked_projects(root)?;
    if projects.is_empty() {
        output::dim(&format!("No projects with {ANSWERS_FILE} in {}", root.display()));
        return Ok(());
    }
    let mut failed = 0;
    for project in &projects {
        output::action("🔄", &format!("Updating {}...", project_name(project)));
        if let Err(e) = sync::update(project) {
            output::error(&e.to_string());
            failed += 1;
        }
    }
    output::done("Sync completed");
    error::partial(failed, projects.len(), "projects")
}

fn project_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Template revision recorded by copier, if any.
fn template_version(answers: &[Answer]) -> Option<&str> {
    answers
        .iter()
        .find(|a| a.key == "_commit")
        .map(|a| a.value.as_str())
}

fn status(dir: &Path) -> Result<()> {
    if !sync::is_linked(dir) {
        output::warning(&format!("Not linked to a template (no {ANSWERS_FILE})"));
        output::usage(&["Run: j sync init"]);
        return Ok(());
    }
    let answers = sync::read_answers(dir)?;
    output::success(&format!(
        "Linked to template {}",
        template_version(&answers).unwrap_or("(unknown revision)")
    ));
    for answer in answers.iter().filter(|a| !a.is_internal()) {
        output::line(&output::format_row("•", &answer.key, &answer.value));
    }
    Ok(())
}

fn status_all(root: &Path) -> Result<()> {
    let projects = sync::linked_projects(root)?;
    output::info(&format!("Linked projects in {}:", root.display()));
    output::empty();
    let rows: Vec<Vec<String>> = projects
        .iter()
        .map(|p| {
            let answers = sync::read_answers(p).unwrap_or_default();
            vec![
                project_name(p),
                template_version(&answers).unwrap_or("-").to_string(),
            ]
        })
        .collect();
    if rows.is_empty() {
        output::dim("No linked projects");
    }
    output::table(&["PROJECT", "REVISION"], &rows);
    Ok(())
}
