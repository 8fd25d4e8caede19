//! Upload a local directory tree onto a GitHub branch.
//!
//! The branch is created from a base branch when it does not exist yet, then
//! every file is created or updated through GitHub's Contents API, one commit
//! per file.

pub mod cli;
pub mod config;
pub mod discover;
pub mod error;
pub mod github;
pub mod interact;
pub mod remote;
pub mod uploader;

pub use error::SyncError;

pub const APP_NAME: &str = "branch-sync";
