//! Errors that abort a sync run

use std::path::PathBuf;

use thiserror::Error;

use crate::remote::RemoteError;

/// Every way a sync run can fail. All of them are fatal.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("GITHUB_TOKEN environment variable is required")]
    MissingCredential,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to fetch base branch `{branch}`: {source}")]
    BaseBranchUnresolved {
        branch: String,
        #[source]
        source: RemoteError,
    },

    #[error("failed to create branch `{branch}`: {source}")]
    BranchCreationFailed {
        branch: String,
        #[source]
        source: RemoteError,
    },

    #[error("failed to upload {path} (status {})\n{body}", display_status(.status))]
    UploadRejected {
        path: String,
        /// `None` when the request never got a response
        status: Option<u16>,
        body: String,
    },

    #[error(transparent)]
    Discovery(#[from] DiscoverError),

    #[error("failed to build the GitHub client: {0}")]
    Client(#[source] reqwest::Error),
}

impl SyncError {
    /// Process exit status for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::MissingCredential => 2,
            Self::BaseBranchUnresolved { .. } => 3,
            Self::BranchCreationFailed { .. } => 4,
            Self::UploadRejected { .. } => 5,
            Self::InvalidConfig(_) | Self::Discovery(_) | Self::Client(_) => 1,
        }
    }
}

#[expect(clippy::ref_option, reason = "thiserror passes fields by reference")]
fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_owned(), |status| status.to_string())
}

/// Failure while walking the source directory
#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("source directory {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
