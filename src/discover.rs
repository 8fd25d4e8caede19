//! Find the files to upload

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::DiscoverError;

/// Version control metadata. Pruned with everything below it
pub const VCS_DIR: &str = ".git";

/// Packaged output of the source directory, never uploaded
pub const ARCHIVE_EXTENSION: &str = ".zip";

/// A file found under the source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Where the file is on disk
    pub local_path: PathBuf,
    /// Where the file goes in the repository, always `/`-separated
    pub remote_path: String,
}

impl FileRecord {
    /// Raw bytes of the file, read from disk on each call
    pub fn content(&self) -> Result<Vec<u8>, DiscoverError> {
        fs::read(&self.local_path).map_err(|source| DiscoverError::Read {
            path: self.local_path.clone(),
            source,
        })
    }
}

/// Every regular file under a root directory.
///
/// Nothing is read until iterated, and it can be iterated again to walk the
/// directory afresh.
#[derive(Debug, Clone)]
pub struct Discovery {
    root: PathBuf,
}

/// Files under `root` that should be uploaded
pub fn discover_files(root: impl Into<PathBuf>) -> Discovery {
    Discovery { root: root.into() }
}

impl Discovery {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fails unless the root is an existing directory
    pub fn check_root(&self) -> Result<(), DiscoverError> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(DiscoverError::NotADirectory(self.root.clone())),
            Err(source) => Err(DiscoverError::Read {
                path: self.root.clone(),
                source,
            }),
        }
    }

    /// Walk the directory.
    ///
    /// Symlinks to files are yielded. Symlinked directories are not entered.
    pub fn iter(&self) -> impl Iterator<Item = Result<FileRecord, DiscoverError>> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_vcs_metadata(entry))
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => return Some(Err(err.into())),
                };

                match is_file(&entry) {
                    Ok(false) => None,
                    Ok(true) if is_archive(entry.file_name()) => {
                        log::trace!("skipping archive {}", entry.path().display());
                        None
                    },
                    Ok(true) => Some(Ok(self.record(entry.path()))),
                    Err(err) => Some(Err(err)),
                }
            })
    }

    fn record(&self, path: &Path) -> FileRecord {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        FileRecord {
            local_path: path.to_path_buf(),
            remote_path: to_remote_path(relative),
        }
    }
}

/// Regular file, or a symlink whose target is one
fn is_file(entry: &DirEntry) -> Result<bool, DiscoverError> {
    if !entry.path_is_symlink() {
        return Ok(entry.file_type().is_file());
    }

    fs::metadata(entry.path())
        .map(|meta| meta.is_file())
        .map_err(|source| DiscoverError::Read {
            path: entry.path().to_path_buf(),
            source,
        })
}

fn is_vcs_metadata(entry: &DirEntry) -> bool {
    entry.file_name() == VCS_DIR
}

fn is_archive(name: &OsStr) -> bool {
    name.to_string_lossy().ends_with(ARCHIVE_EXTENSION)
}

/// Join the components of `relative` with `/`, also replacing any `\` that
/// the host left inside a component
pub fn to_remote_path(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
        .replace('\\', "/")
}
