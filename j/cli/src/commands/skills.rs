//! `j skills` and the skills browser opened from `j setup`.

use std::collections::HashMap;
use std::fmt;

use clap::Subcommand;
use clap_complete::engine::ArgValueCandidates;
use inquire::{InquireError, Select};
use j_lib::SkillError;
use j_lib::catalog::{self, SkillRepo};
use j_lib::skills;

use crate::complete;
use crate::error::Result;
use crate::output::{self, ICON_CHECK, ICON_PENDING};

#[derive(Debug, Clone, Subcommand)]
pub enum SkillsAction {
    /// List installed and favourite skills, or the skills a repository publishes
    List {
        /// Repository as owner/name
        #[arg(add = ArgValueCandidates::new(complete::skill_repos))]
        repo: Option<String>,
    },
    /// Install favourites, a whole repository, or one skill from it
    Install {
        /// Repository as owner/name (installs favourites when empty)
        #[arg(add = ArgValueCandidates::new(complete::skill_repos))]
        repo: Option<String>,
        /// Skill name within the repository
        skill: Option<String>,
    },
    /// Remove one skill, or all of them
    Remove {
        skill: Option<String>,
        #[arg(long, conflicts_with = "skill")]
        all: bool,
    },
}

fn require_cli() -> Result<()> {
    if skills::is_cli_installed() {
        Ok(())
    } else {
        Err(SkillError::MissingCli.into())
    }
}

pub fn run(action: Option<SkillsAction>) -> Result<()> {
    require_cli()?;
    match action.unwrap_or(SkillsAction::List { repo: None }) {
        SkillsAction::List { repo: None } => {
            list_installed();
            Ok(())
        }
        SkillsAction::List { repo: Some(repo) } => {
            let installed = skills::list_installed();
            let available = skills::list_from_repo(&repo)?;
            output::info(&format!("Skills in {repo}:"));
            for name in &available {
                output::row(installed.contains(name), name, "");
            }
            Ok(())
        }
        SkillsAction::Install { repo: None, .. } => {
            install_favorites();
            Ok(())
        }
        SkillsAction::Install {
            repo: Some(repo),
            skill: None,
        } => {
            skills::install_all(&repo)?;
            output::success(&format!("Installed all from {repo}"));
            Ok(())
        }
        SkillsAction::Install {
            repo: Some(repo),
            skill: Some(skill),
        } => {
            skills::install(&repo, &skill)?;
            output::success(&format!("Installed {skill}"));
            Ok(())
        }
        SkillsAction::Remove { all: true, .. } => {
            skills::remove_all()?;
            output::success("Removed all skills");
            Ok(())
        }
        SkillsAction::Remove {
            skill: Some(skill), ..
        } => {
            skills::remove(&skill)?;
            output::success(&format!("Removed {skill}"));
            Ok(())
        }
        SkillsAction::Remove { skill: None, .. } => Err(crate::error::CliError::Usage(
            "usage: j skills remove <skill> | --all".into(),
        )),
    }
}

fn list_installed() {
    let installed = skills::list_installed();
    output::section("Favorites");
    for fav in catalog::favorite_skills() {
        output::row(installed.iter().any(|s| s == fav.name), fav.name, fav.repo);
    }
    let others: Vec<&String> = installed
        .iter()
        .filter(|s| !catalog::favorite_skills().iter().any(|f| f.name == s.as_str()))
        .collect();
    if !others.is_empty() {
        output::empty();
        output::section("Installed");
        for name in others {
            output::row(true, name, "");
        }
    }
    output::empty();
    output::section("Repositories");
    for repo in catalog::skill_repos() {
        output::line(&output::format_row("•", repo.repo, repo.description));
    }
}

fn install_favorites() {
    let favorites = catalog::favorite_skills();
    for fav in favorites {
        match skills::install(fav.repo, fav.name) {
            Ok(()) => output::success(&format!("Installed {}", fav.name)),
            Err(e) => output::error(&format!("{}: {e}", fav.name)),
        }
    }
    output::done(&format!("Installed {} favorites", favorites.len()));
}

// ============================================================================
// Browser
// ============================================================================

/// One selectable line of the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    InstallFavorites,
    RemoveAll,
    Skill {
        repo: String,
        name: String,
        installed: bool,
    },
    Repo {
        repo: &'static SkillRepo,
        label: String,
    },
    InstallRepo(String),
    Back,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstallFavorites => write!(f, "Install favorites"),
            Self::RemoveAll => write!(f, "Remove all skills"),
            Self::Skill {
                repo,
                name,
                installed,
            } => {
                let icon = if *installed { ICON_CHECK } else { ICON_PENDING };
                if repo.is_empty() {
                    write!(f, "{icon} {name}")
                } else {
                    write!(f, "{icon} {name:<28} {repo}")
                }
            }
            Self::Repo { repo, label } => write!(f, "▸ {:<36} {label}", repo.repo),
            Self::InstallRepo(repo) => write!(f, "Install all from {repo}"),
            Self::Back => write!(f, "← Back"),
        }
    }
}

/// Browser state: installed skills plus per-repo listings fetched on demand.
#[derive(Debug, Default)]
struct Browser {
    installed: Vec<String>,
    repo_skills: HashMap<&'static str, Vec<String>>,
}

impl Browser {
    fn is_installed(&self, skill: &str) -> bool {
        self.installed.iter().any(|s| s == skill)
    }

    fn repo_for(&self, skill: &str) -> String {
        self.repo_skills
            .iter()
            .find(|(_, names)| names.iter().any(|n| n == skill))
            .map(|(repo, _)| (*repo).to_string())
            .or_else(|| {
                catalog::favorite_skills()
                    .iter()
                    .find(|f| f.name == skill)
                    .map(|f| f.repo.to_string())
            })
            .unwrap_or_default()
    }

    /// Description shown next to a repo: its blurb until loaded, then counts.
    fn repo_label(&self, repo: &SkillRepo) -> String {
        match self.repo_skills.get(repo.repo) {
            Some(names) if !names.is_empty() => {
                let installed = names.iter().filter(|n| self.is_installed(n)).count();
                if installed > 0 {
                    format!("{installed}/{} installed", names.len())
                } else {
                    format!("{} skills", names.len())
                }
            }
            _ => repo.description.to_string(),
        }
    }

    fn top_entries(&self) -> Vec<Entry> {
        let mut entries = vec![Entry::InstallFavorites, Entry::RemoveAll];
        for fav in catalog::favorite_skills() {
            entries.push(Entry::Skill {
                repo: String::new(),
                name: fav.name.to_string(),
                installed: self.is_installed(fav.name),
            });
        }
        for name in &self.installed {
            if catalog::favorite_skills().iter().any(|f| f.name == name.as_str()) {
                continue;
            }
            entries.push(Entry::Skill {
                repo: self.repo_for(name),
                name: name.clone(),
                installed: true,
            });
        }
        for repo in catalog::skill_repos() {
            entries.push(Entry::Repo {
                repo,
                label: self.repo_label(repo),
            });
        }
        entries.push(Entry::Back);
        entries
    }

    fn repo_entries(&self, repo: &str) -> Vec<Entry> {
        let mut entries = vec![Entry::InstallRepo(repo.to_string())];
        if let Some(names) = self.repo_skills.get(repo) {
            entries.extend(names.iter().map(|name| Entry::Skill {
                repo: String::new(),
                name: name.clone(),
                installed: self.is_installed(name),
            }));
        }
        entries.push(Entry::Back);
        entries
    }

    fn refresh(&mut self) {
        self.installed = skills::list_installed();
    }

    /// Fetches a repo's listing once; failures cache an empty list.
    fn load(&mut self, repo: &'static str) {
        if self.repo_skills.contains_key(repo) {
            return;
        }
        output::dim(&format!("Loading skills from {repo}..."));
        let names = skills::list_from_repo(repo).unwrap_or_else(|e| {
            output::error(&format!("Failed to fetch skills for {repo}: {e}"));
            Vec::new()
        });
        self.repo_skills.insert(repo, names);
    }

    /// Installs or removes, then refreshes the installed list.
    fn toggle(&mut self, repo: &str, name: &str, installed: bool) {
        let result = if installed {
            skills::remove(name).map(|()| format!("Removed {name}"))
        } else {
            let repo = if repo.is_empty() {
                self.repo_for(name)
            } else {
                repo.to_string()
            };
            skills::install(&repo, name).map(|()| format!("Installed {name}"))
        };
        report(result);
        self.refresh();
    }
}

fn report(result: std::result::Result<String, SkillError>) {
    match result {
        Ok(message) => output::success(&message),
        Err(e) => output::error(&e.to_string()),
    }
}

fn cancelled(e: &InquireError) -> bool {
    matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// Interactive skills browser.
pub fn browse() -> Result<()> {
    require_cli()?;
    let mut browser = Browser::default();
    browser.refresh();

    loop {
        let choice = match Select::new("Skills", browser.top_entries())
            .with_page_size(20)
            .prompt()
        {
            Ok(choice) => choice,
            Err(e) if cancelled(&e) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        match choice {
            Entry::InstallFavorites => {
                install_favorites();
                browser.refresh();
            }
            Entry::RemoveAll => {
                report(skills::remove_all().map(|()| "Removed all skills".to_string()));
                browser.refresh();
            }
            Entry::Skill {
                repo,
                name,
                installed,
            } => browser.toggle(&repo, &name, installed),
            Entry::Repo { repo, .. } => {
                browser.load(repo.repo);
                browse_repo(&mut browser, repo.repo)?;
            }
            Entry::InstallRepo(_) => {}
            Entry::Back => return Ok(()),
        }
    }
}

fn browse_repo(browser: &mut Browser, repo: &'static str) -> Result<()> {
    loop {
        let choice = match Select::new(repo, browser.repo_entries(repo))
            .with_page_size(20)
            .prompt()
        {
            Ok(choice) => choice,
            Err(e) if cancelled(&e) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        match choice {
            Entry::InstallRepo(repo) => {
                report(skills::install_all(&repo).map(|()| format!("Installed all from {repo}")));
                browser.refresh();
            }
            Entry::Skill {
                name, installed, ..
            } => browser.toggle(repo, &name, installed),
            _ => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn browser(installed: &[&str]) -> Browser {
        Browser {
            installed: installed.iter().map(|s| s.to_string()).collect(),
            repo_skills: HashMap::new(),
        }
    }

    #[test]
    fn repos_show_description_until_loaded() {
        let mut b = browser(&["expo-dev-client"]);
        let expo = catalog::skill_repo_by_name("expo/skills").unwrap();
        assert_eq!(b.repo_label(expo), expo.description);

        b.repo_skills.insert(
            "expo/skills",
            vec!["building-native-ui".into(), "expo-dev-client".into()],
        );
        assert_eq!(b.repo_label(expo), "1/2 installed");

        b.installed.clear();
        assert_eq!(b.repo_label(expo), "2 skills");
    }

    #[test]
    fn top_entries_list_favorites_then_other_installed() {
        let b = browser(&["frontend-design", "custom-skill"]);
        let entries = b.top_entries();
        assert_eq!(entries[0], Entry::InstallFavorites);
        assert_eq!(entries[1], Entry::RemoveAll);
        assert_eq!(
            entries[2],
            Entry::Skill {
                repo: String::new(),
                name: "frontend-design".into(),
                installed: true,
            }
        );
        let extra = 2 + catalog::favorite_skills().len();
        assert_eq!(
            entries[extra],
            Entry::Skill {
                repo: String::new(),
                name: "custom-skill".into(),
                installed: true,
            }
        );
        assert_eq!(entries.last(), Some(&Entry::Back));
    }

    #[test]
    fn favorites_resolve_their_repo() {
        let b = browser(&[]);
        assert_eq!(b.repo_for("qmd"), "tobi/qmd");
        assert_eq!(b.repo_for("unknown"), "");
    }

    #[test]
    fn repo_entries_mark_installed_skills() {
        let mut b = browser(&["expo-api-routes"]);
        b.repo_skills.insert(
            "expo/skills",
            vec!["building-native-ui".into(), "expo-api-routes".into()],
        );
        let entries = b.repo_entries("expo/skills");
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].to_string(), "Install all from expo/skills");
        assert_eq!(entries[1].to_string(), "○ building-native-ui");
        assert_eq!(entries[2].to_string(), "✓ expo-api-routes");
    }
}
