//! Utilities for user interaction

use std::io::{self, IsTerminal as _};

use crate::SyncError;
use crate::config::REPO_VAR;

/// Report a step that succeeded
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {{
        println!(
            "  {}{}",
            colored::Colorize::bold(colored::Colorize::bright_green("✓ ")),
            format!($($arg)*)
        )
    }};
}

/// Report progress that is neither a success nor a failure
#[macro_export]
macro_rules! note {
    ($($arg:tt)*) => {{
        println!(
            "  {}{}",
            colored::Colorize::bright_black("» "),
            format!($($arg)*)
        )
    }};
}

/// Report a failure
#[macro_export]
macro_rules! fail {
    ($($arg:tt)*) => {{
        eprintln!(
            "  {}{}",
            colored::Colorize::bold(colored::Colorize::bright_red("✗ ")),
            format!($($arg)*)
        )
    }};
}

/// Ask for the `owner/repo` to upload to.
///
/// Fails instead of blocking when nobody is there to answer.
pub fn prompt_repo() -> Result<String, SyncError> {
    if !io::stdin().is_terminal() {
        return Err(SyncError::InvalidConfig(format!(
            "{REPO_VAR} is not set and stdin is not a terminal"
        )));
    }

    dialoguer::Input::<String>::new()
        .with_prompt("Repo (owner/repo)")
        .interact_text()
        .map_err(|err| SyncError::InvalidConfig(format!("could not read {REPO_VAR}: {err}")))
}
