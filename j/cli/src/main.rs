mod commands;
mod complete;
mod error;
mod output;
mod tui;

use std::ffi::OsString;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use clap_complete::engine::ArgValueCandidates;
use clap_complete::{CompleteEnv, Shell};
use j_lib::ConfigPaths;
use j_lib::catalog::{self, PackageManager};

use crate::commands::{remote::RemoteAction, skills::SkillsAction, sync::SyncAction};
use crate::error::{CliError, Result};

/// Personal workstation assistant.
///
/// Inspects the machine, installs and upgrades developer tools, cleans caches
/// and manages remote access.
#[derive(Debug, Parser)]
#[command(name = "j")]
#[command(version)]
#[command(about = "Personal workstation assistant for macOS")]
#[command(after_help = "\
SHELL COMPLETIONS:
  Run 'j --completions <SHELL>' to print the setup line for your shell.

  Zsh (add to ~/.zshrc):
    source <(COMPLETE=zsh j)
")]
struct Cli {
    /// Write debug logs to ~/.config/jterrazz/j-debug.log.
    #[arg(long, global = true)]
    debug: bool,

    /// Print the completion setup line for a shell.
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show workstation status
    Status {
        /// Print text rows once everything is loaded instead of the TUI
        #[arg(long)]
        plain: bool,
    },

    /// Install development tools
    Install {
        /// Tools to install (lists available tools when empty)
        #[arg(value_name = "TOOL", add = ArgValueCandidates::new(complete::installable_tools))]
        tools: Vec<String>,

        /// Install every installable tool in dependency order
        #[arg(short, long)]
        all: bool,
    },

    /// Upgrade package managers and tools
    Upgrade {
        /// Tools or brew packages to upgrade
        #[arg(value_name = "PACKAGE", add = ArgValueCandidates::new(complete::upgradable_tools))]
        packages: Vec<String>,

        /// Upgrade every package manager
        #[arg(short, long)]
        all: bool,
    },

    /// Clean caches, containers and trash
    Clean {
        /// Items to clean (lists cleanable items when empty)
        #[arg(value_name = "ITEM", add = ArgValueCandidates::new(complete::cleanables))]
        items: Vec<String>,

        /// Clean everything
        #[arg(short, long)]
        all: bool,
    },

    /// Interactive setup menu
    Setup,

    /// Git and docker shortcuts
    Run {
        /// Shortcut group (lists groups when empty)
        #[arg(add = ArgValueCandidates::new(complete::run_groups))]
        group: Option<String>,

        /// Shortcut within the group
        name: Option<String>,

        /// Arguments passed to the shortcut
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Synchronise projects with the shared template
    Sync {
        #[command(subcommand)]
        action: Option<SyncAction>,

        /// Apply to every linked project under ~/Developer
        #[arg(long, global = true)]
        all: bool,
    },

    /// Manage remote access
    Remote {
        #[command(subcommand)]
        action: Option<RemoteAction>,
    },

    /// Manage AI agent skills
    Skills {
        #[command(subcommand)]
        action: Option<SkillsAction>,
    },
}

/// The clap command with one `j upgrade --<flag>` per package manager.
fn command() -> clap::Command {
    Cli::command().mut_subcommand("upgrade", |upgrade| {
        catalog::package_managers().iter().fold(upgrade, |cmd, pm| {
            cmd.arg(
                Arg::new(pm.flag)
                    .long(pm.flag)
                    .action(ArgAction::SetTrue)
                    .help(format!("Upgrade {} packages", pm.name)),
            )
        })
    })
}

fn parse_args<I, T>(args: I) -> std::result::Result<(Cli, ArgMatches), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;
    Ok((cli, matches))
}

/// Package managers selected by flag on `j upgrade`.
fn selected_managers(matches: &ArgMatches) -> Vec<&'static PackageManager> {
    let Some(upgrade) = matches.subcommand_matches("upgrade") else {
        return Vec::new();
    };
    catalog::package_managers()
        .iter()
        .filter(|pm| upgrade.get_flag(pm.flag))
        .collect()
}

fn main() -> ExitCode {
    CompleteEnv::with_factory(command).complete();

    let (cli, matches) = match parse_args(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) => e.exit(),
    };

    if let Err(e) = init_logging(cli.debug) {
        output::error(&e.to_string());
        return ExitCode::FAILURE;
    }

    match run(cli, &matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, matches: &ArgMatches) -> Result<()> {
    if let Some(shell) = cli.completions {
        output::line(&complete::setup_line(shell));
        return Ok(());
    }

    let Some(subcommand) = cli.command else {
        command().print_help()?;
        return Ok(());
    };

    match subcommand {
        Commands::Status { plain } => commands::status::run(plain),
        Commands::Install { tools, all } => commands::install::run(&tools, all),
        Commands::Upgrade { packages, all } => {
            commands::upgrade::run(&packages, all, &selected_managers(matches))
        }
        Commands::Clean { items, all } => commands::clean::run(&items, all),
        Commands::Setup => commands::setup::run(),
        Commands::Run { group, name, args } => {
            commands::run::run(group.as_deref(), name.as_deref(), &args)
        }
        Commands::Sync { action, all } => commands::sync::run(action, all),
        Commands::Remote { action } => commands::remote::run(action),
        Commands::Skills { action } => commands::skills::run(action),
    }
}

/// File logging with `--debug`, stderr logging with `RUST_LOG`, otherwise
/// nothing so TUI frames stay clean.
fn init_logging(debug: bool) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use tracing_subscriber::EnvFilter;

    if debug {
        let paths = ConfigPaths::new();
        fs::create_dir_all(paths.config_dir()).map_err(CliError::DebugLog)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths.debug_log())
            .map_err(CliError::DebugLog)?;

        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
