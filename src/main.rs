use std::process::ExitCode;

use branch_sync::cli::{self, Cli, HelpOrVersion};
use branch_sync::config::Config;
use branch_sync::discover::discover_files;
use branch_sync::github::GitHubClient;
use branch_sync::uploader::{BranchState, BranchSyncUploader};
use branch_sync::{SyncError, fail, success};
use colored::Colorize as _;

async fn main_impl() -> anyhow::Result<String> {
    let args = Cli::parse()?;

    match args.help_or_version {
        HelpOrVersion::Help => return Ok(cli::help()),
        HelpOrVersion::Version => return Ok(format!("{}\n", env!("CARGO_PKG_VERSION"))),
        HelpOrVersion::None => {},
    }

    let filter = if args.verbose {
        "warn,branch_sync=trace"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let config = Config::from_env()?;
    log::debug!("{config:?}");

    let client =
        GitHubClient::new(&config.api_url, config.token.clone()).map_err(SyncError::Client)?;
    let uploader = BranchSyncUploader::new(client, config.target.clone(), &config.commit_prefix);

    let report = uploader.run(&discover_files(&config.source_dir)).await?;

    let created = match report.branch {
        BranchState::Created => " (new branch)",
        BranchState::AlreadyExists => "",
    };
    success!(
        "Success! Uploaded {} files to {}{created}",
        report.uploads.len(),
        config.target.branch.to_string().bright_cyan()
    );

    Ok(String::new())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match main_impl().await {
        Ok(ok) => {
            print!("{ok}");
            ExitCode::SUCCESS
        },
        Err(err) => {
            fail!("{err}");
            ExitCode::from(
                err.downcast_ref::<SyncError>()
                    .map_or(1, SyncError::exit_code),
            )
        },
    }
}
