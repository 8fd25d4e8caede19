//! The remote side of a sync: branch refs and file contents of one repository

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{BranchName, RepoSlug};

/// Opaque revision token, the SHA of a branch head or of a file blob
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(sha: impl Into<String>) -> Self {
        Self(sha.into())
    }
}

impl AsRef<str> for Revision {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of a create-or-update of a single file
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    /// Commit message
    pub message: String,
    /// Base64 of the file's bytes
    pub content: String,
    /// Branch the commit lands on
    pub branch: BranchName,
    /// Blob SHA of the version being replaced. Must be present when updating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<Revision>,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("not found")]
    NotFound,

    #[error("request failed with status {status}\nResponse: {body}")]
    Status { status: u16, body: String },

    #[error("error sending request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// HTTP status of the response, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound => Some(404),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            Self::Decode(_) => None,
        }
    }

    /// Whatever the remote said, or a description of why it said nothing
    pub fn body(&self) -> String {
        match self {
            Self::Status { body, .. } => body.clone(),
            Self::NotFound | Self::Transport(_) | Self::Decode(_) => self.to_string(),
        }
    }
}

/// Operations a sync needs from the store holding the repository.
///
/// Lookups return `Ok(None)` when the remote confirms the item does not exist.
#[expect(async_fn_in_trait, reason = "stores are used as generics, never boxed")]
pub trait RemoteStore {
    /// Head revision of `branch`
    async fn branch_revision(
        &self,
        repo: &RepoSlug,
        branch: &BranchName,
    ) -> Result<Option<Revision>, RemoteError>;

    /// Create `branch` pointing at `revision`
    async fn create_branch(
        &self,
        repo: &RepoSlug,
        branch: &BranchName,
        revision: &Revision,
    ) -> Result<(), RemoteError>;

    /// Blob revision of the file at `path` on `branch`
    async fn file_revision(
        &self,
        repo: &RepoSlug,
        branch: &BranchName,
        path: &str,
    ) -> Result<Option<Revision>, RemoteError>;

    /// Create or update the file at `path`
    async fn put_file(
        &self,
        repo: &RepoSlug,
        path: &str,
        write: &FileWrite,
    ) -> Result<(), RemoteError>;
}
