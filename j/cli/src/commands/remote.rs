//! `j remote [setup|up|down|status]`

use clap::Subcommand;
use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text};
use j_lib::remote::{AuthMethod, RemoteMode};
use j_lib::{RemoteManager, RemoteSettings, RemoteStatus};

use crate::error::Result;
use crate::output;

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum RemoteAction {
    /// Configure mode, authentication and hostname
    Setup,
    /// Connect remote access
    Up,
    /// Disconnect remote access
    Down,
    /// Show remote access status
    Status,
}

pub fn run(action: Option<RemoteAction>) -> Result<()> {
    let manager = RemoteManager::new();
    match action.unwrap_or(RemoteAction::Status) {
        RemoteAction::Setup => setup(&manager),
        RemoteAction::Up => up(&manager),
        RemoteAction::Down => down(&manager),
        RemoteAction::Status => status(&manager),
    }
}

fn up(manager: &RemoteManager) -> Result<()> {
    let settings = manager.load_settings()?;
    let report = manager.up(&settings)?;
    output::success(&format!("Remote access connected ({} mode)", report.mode));
    if let Some(e) = report.keep_awake_error {
        output::warning(&format!("Connected, but keep-awake is not active: {e}"));
    }
    Ok(())
}

fn down(manager: &RemoteManager) -> Result<()> {
    let settings = manager.load_settings()?;
    let mode = manager.down(&settings)?;
    output::success(&format!("Remote access disconnected ({mode} mode)"));
    Ok(())
}

fn status(manager: &RemoteManager) -> Result<()> {
    let settings = manager.load_settings()?;
    match manager.status(&settings) {
        Ok(status) => {
            for l in status_lines(&status) {
                output::line(&l);
            }
        }
        Err(e) => {
            output::warning("Unable to query remote runtime status");
            output::dim(&e.to_string());
            for l in settings_lines(&settings) {
                output::line(&l);
            }
        }
    }
    Ok(())
}

fn status_lines(status: &RemoteStatus) -> Vec<String> {
    let mut lines = vec![
        format!("Mode: {}", status.mode),
        format!("State: {}", status.backend_state),
    ];
    if !status.hostname.is_empty() {
        lines.push(format!("Host: {}", status.hostname));
    }
    if !status.ip.is_empty() {
        lines.push(format!("IP: {}", status.ip));
    }
    lines.push(format!("Connected: {}", status.connected));
    if status.mode == RemoteMode::Userspace {
        lines.push(format!("Keep awake: {}", status.keep_awake));
    }
    lines
}

fn settings_lines(settings: &RemoteSettings) -> Vec<String> {
    let mut lines = vec![
        format!("Configured mode: {}", settings.mode),
        format!("Auth method: {}", settings.auth_method),
    ];
    if !settings.hostname.is_empty() {
        lines.push(format!("Hostname: {}", settings.hostname));
    }
    lines
}

// ============================================================================
// Setup
// ============================================================================

/// Prompts for every setting and saves. Cancelling leaves the file untouched.
pub fn setup(manager: &RemoteManager) -> Result<()> {
    let current = manager.load_settings()?;
    match prompt_settings(&current) {
        Ok(settings) => {
            manager.save_settings(&settings)?;
            output::success(&format!(
                "Remote settings saved to {}",
                manager.paths().jrc().display()
            ));
            Ok(())
        }
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            output::dim("Remote setup cancelled");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn prompt_settings(current: &RemoteSettings) -> std::result::Result<RemoteSettings, InquireError> {
    let modes = vec![RemoteMode::Userspace, RemoteMode::Auto];
    let mode_cursor = modes.iter().position(|m| *m == current.mode).unwrap_or(0);
    let mode = Select::new("Mode", modes)
        .with_starting_cursor(mode_cursor)
        .with_help_message("userspace runs tailscaled under your user")
        .prompt()?;

    let methods = vec![AuthMethod::Oauth, AuthMethod::Authkey];
    let method_cursor = methods
        .iter()
        .position(|m| *m == current.auth_method)
        .unwrap_or(0);
    let auth_method = Select::new("Authentication", methods)
        .with_starting_cursor(method_cursor)
        .prompt()?;

    let secret = if auth_method == AuthMethod::Authkey {
        let entered = Password::new("Auth key")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .with_help_message("leave empty to keep the saved key")
            .prompt()?;
        if entered.trim().is_empty() {
            current.secret.clone()
        } else {
            entered.trim().to_string()
        }
    } else {
        String::new()
    };

    let hostname = Text::new("Hostname")
        .with_default(&current.hostname)
        .with_help_message("leave empty to keep the machine name")
        .prompt()?;

    Ok(RemoteSettings {
        mode,
        auth_method,
        secret,
        hostname: hostname.trim().to_string(),
    })
}
