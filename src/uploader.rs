//! Sync a local directory onto a branch: make sure the branch exists, then
//! create or update every file on it, one at a time

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use colored::Colorize as _;

use crate::config::UploadTarget;
use crate::discover::{Discovery, FileRecord};
use crate::remote::{FileWrite, RemoteError, RemoteStore};
use crate::{SyncError, note, success};

/// What [`BranchSyncUploader::ensure_branch`] found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    /// The branch was there already and was left alone
    AlreadyExists,
    /// The branch was created from the base branch
    Created,
}

/// Whether a write replaced an earlier version of the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResult {
    Stored { path: String, mode: WriteMode },
}

/// Outcome of a whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub branch: BranchState,
    /// In upload order
    pub uploads: Vec<UploadResult>,
}

pub struct BranchSyncUploader<S> {
    store: S,
    target: UploadTarget,
    commit_prefix: String,
}

impl<S: RemoteStore> BranchSyncUploader<S> {
    pub fn new(store: S, target: UploadTarget, commit_prefix: impl Into<String>) -> Self {
        Self {
            store,
            target,
            commit_prefix: commit_prefix.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn target(&self) -> &UploadTarget {
        &self.target
    }

    /// Create the target branch from the base branch unless it already
    /// exists.
    ///
    /// The base branch is resolved first even when the target exists, so a
    /// missing base is always reported.
    pub async fn ensure_branch(&self) -> Result<BranchState, SyncError> {
        let UploadTarget {
            repo,
            branch,
            base_branch,
        } = &self.target;

        note!(
            "Ensuring branch {} exists (base: {})...",
            branch.to_string().bright_cyan(),
            base_branch.to_string().bright_cyan()
        );

        let base_revision = self
            .store
            .branch_revision(repo, base_branch)
            .await
            .and_then(|revision| revision.ok_or(RemoteError::NotFound))
            .map_err(|source| SyncError::BaseBranchUnresolved {
                branch: base_branch.to_string(),
                source,
            })?;

        log::debug!("base branch {base_branch} is at {base_revision}");

        match self.store.branch_revision(repo, branch).await {
            Ok(Some(revision)) => {
                log::debug!("branch {branch} is at {revision}");
                success!("Branch already exists.");
                return Ok(BranchState::AlreadyExists);
            },
            Ok(None) => {},
            Err(err) => {
                log::warn!("could not check whether branch {branch} exists, assuming it does not: {err}");
            },
        }

        self.store
            .create_branch(repo, branch, &base_revision)
            .await
            .map_err(|source| SyncError::BranchCreationFailed {
                branch: branch.to_string(),
                source,
            })?;

        success!("Branch created.");

        Ok(BranchState::Created)
    }

    /// Create the file on the target branch, or update it if a previous
    /// version is there. Always writes, even if nothing changed.
    pub async fn upload_file(&self, record: &FileRecord) -> Result<UploadResult, SyncError> {
        let path = &record.remote_path;
        let content = BASE64.encode(record.content()?);

        let previous = match self
            .store
            .file_revision(&self.target.repo, &self.target.branch, path)
            .await
        {
            Ok(previous) => previous,
            Err(err) => {
                log::warn!("could not check for an existing {path}, uploading it as new: {err}");
                None
            },
        };

        let mode = if previous.is_some() {
            WriteMode::Updated
        } else {
            WriteMode::Created
        };

        let write = FileWrite {
            message: format!("{} add {path}", self.commit_prefix),
            content,
            branch: self.target.branch.clone(),
            sha: previous,
        };

        self.store
            .put_file(&self.target.repo, path, &write)
            .await
            .map_err(|err| SyncError::UploadRejected {
                path: path.clone(),
                status: err.status(),
                body: err.body(),
            })?;

        success!("Uploaded {path}");

        Ok(UploadResult::Stored {
            path: path.clone(),
            mode,
        })
    }

    /// Ensure the branch, then upload every discovered file in order.
    /// Stops at the first failure.
    ///
    /// A missing source directory fails before anything is sent.
    pub async fn run(&self, discovery: &Discovery) -> Result<RunReport, SyncError> {
        discovery.check_root()?;

        let branch = self.ensure_branch().await?;

        let records = discovery.iter().collect::<Result<Vec<_>, _>>()?;

        note!(
            "Uploading {} files from {}",
            records.len(),
            discovery.root().display()
        );

        let mut uploads = Vec::with_capacity(records.len());
        for record in &records {
            uploads.push(self.upload_file(record).await?);
        }

        Ok(RunReport { branch, uploads })
    }
}
