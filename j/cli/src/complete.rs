//! Dynamic shell completion.
//!
//! The shell re-invokes `j` with `COMPLETE=<shell>` and the words typed so
//! far after a `--` separator. Candidate lists skip names already present on
//! the line so `j install git <TAB>` does not offer `git` again.

use clap_complete::Shell;
use clap_complete::engine::CompletionCandidate;
use j_lib::actions;
use j_lib::catalog;
use j_lib::shortcuts;

/// Words already typed, excluding the program name and the word under the
/// cursor.
fn given_words() -> Vec<String> {
    let args: Vec<String> = std::env::args().collect();
    let Some(sep) = args.iter().position(|a| a == "--") else {
        return Vec::new();
    };
    let mut words: Vec<String> = args.into_iter().skip(sep + 2).collect();
    words.pop();
    words
}

/// Candidates for `names` minus any already in `given`.
pub(crate) fn unused<'a>(
    names: impl IntoIterator<Item = (&'a str, &'static str)>,
    given: &[String],
) -> Vec<CompletionCandidate> {
    names
        .into_iter()
        .filter(|(name, _)| !given.iter().any(|g| g == name))
        .map(|(name, help)| CompletionCandidate::new(name.to_string()).help(Some(help.into())))
        .collect()
}

pub fn installable_tools() -> Vec<CompletionCandidate> {
    unused(
        catalog::installable_tools().iter().map(|t| (t.name, t.description)),
        &given_words(),
    )
}

pub fn upgradable_tools() -> Vec<CompletionCandidate> {
    unused(
        catalog::all_tools()
            .iter()
            .filter(|t| actions::is_upgradable(t))
            .map(|t| (t.name, t.description)),
        &given_words(),
    )
}

pub fn cleanables() -> Vec<CompletionCandidate> {
    unused(
        catalog::cleanables().iter().map(|c| (c.name, c.description)),
        &given_words(),
    )
}

pub fn run_groups() -> Vec<CompletionCandidate> {
    unused(
        shortcuts::groups().iter().map(|g| (g.name, g.description)),
        &[],
    )
}

pub fn skill_repos() -> Vec<CompletionCandidate> {
    unused(
        catalog::skill_repos().iter().map(|r| (r.repo, r.description)),
        &[],
    )
}

/// The line to add to a shell's rc file to enable completion.
pub fn setup_line(shell: Shell) -> String {
    match shell {
        Shell::Fish => "COMPLETE=fish j | source".to_string(),
        Shell::Elvish => "eval (E:COMPLETE=elvish j | slurp)".to_string(),
        Shell::PowerShell => {
            r#"$env:COMPLETE = "powershell"; j | Out-String | Invoke-Expression; Remove-Item Env:\COMPLETE"#
                .to_string()
        }
        other => format!("source <(COMPLETE={other} j)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_skips_given_names() {
        let names = [("git", "Version control"), ("go", "Go language"), ("gh", "GitHub CLI")];
        let given = vec!["git".to_string()];
        let values: Vec<String> = unused(names, &given)
            .iter()
            .map(|c| c.get_value().to_string_lossy().into_owned())
            .collect();
        assert_eq!(values, ["go", "gh"]);
    }

    #[test]
    fn setup_lines_per_shell() {
        assert_eq!(setup_line(Shell::Zsh), "source <(COMPLETE=zsh j)");
        assert_eq!(setup_line(Shell::Bash), "source <(COMPLETE=bash j)");
        assert_eq!(setup_line(Shell::Fish), "COMPLETE=fish j | source");
    }

    #[test]
    fn install_candidates_cover_installable_catalog() {
        let all = unused(
            catalog::installable_tools().iter().map(|t| (t.name, t.description)),
            &[],
        );
        assert_eq!(all.len(), catalog::installable_tools().len());
    }
}
