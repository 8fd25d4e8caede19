//! Run configuration, read once from the environment

use core::fmt;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use nutype::nutype;

use crate::SyncError;

/// Environment variable holding the GitHub token
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
/// Environment variable holding the `owner/name` of the repository
pub const REPO_VAR: &str = "REPO";
pub const BRANCH_VAR: &str = "BRANCH";
pub const BASE_BRANCH_VAR: &str = "BASE_BRANCH";
pub const SOURCE_DIR_VAR: &str = "SOURCE_DIR";
pub const COMMIT_PREFIX_VAR: &str = "COMMIT_PREFIX";
pub const API_URL_VAR: &str = "GITHUB_API_URL";

/// Defaults for everything except the token and the repository
pub mod defaults {
    pub const BRANCH: &str = "feature/branch-sync";
    pub const BASE_BRANCH: &str = "main";
    pub const SOURCE_DIR: &str = ".";
    pub const COMMIT_PREFIX: &str = "chore(sync):";
    pub const API_URL: &str = "https://api.github.com";
}

/// Name of a git branch, e.g. `feature/branch-sync`
#[nutype(
    sanitize(trim),
    validate(not_empty, predicate = is_valid_branch_name),
    derive(Debug, Clone, PartialEq, Eq, Hash, AsRef, Display, Serialize)
)]
pub struct BranchName(String);

/// Characters `git check-ref-format` refuses anywhere in a ref
const FORBIDDEN_REF_CHARS: [char; 7] = ['~', '^', ':', '?', '*', '[', '\\'];

/// Rejects names git would refuse for a branch, following
/// `git check-ref-format --branch`. Does not check that the branch exists.
pub fn is_valid_branch_name(name: &str) -> bool {
    !name
        .chars()
        .any(|ch| ch.is_whitespace() || ch.is_control() || FORBIDDEN_REF_CHARS.contains(&ch))
        && name != "@"
        && !name.contains("..")
        && !name.contains("@{")
        && !name.starts_with(['-', '/'])
        && !name.ends_with(['/', '.'])
        && name.split('/').all(|component| {
            !component.is_empty() && !component.starts_with('.') && !component.ends_with(".lock")
        })
}

impl FromStr for BranchName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_new(s).map_err(|err| match err {
            BranchNameError::NotEmptyViolated => "branch name cannot be empty".to_owned(),
            BranchNameError::PredicateViolated => format!("invalid branch name: {s}"),
        })
    }
}

/// Credential sent as a bearer token with every request
#[nutype(sanitize(trim), validate(not_empty), derive(Clone, AsRef))]
pub struct Token(String);

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Represents e.g. `octo-org/site`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    /// e.g. `octo-org`
    pub owner: String,
    /// e.g. `site`
    pub name: String,
}

impl FromStr for RepoSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_owned(),
                    name: name.to_owned(),
                })
            },
            _ => Err(format!(
                "invalid repository: {s}. Expected format: owner/repo"
            )),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Where the files go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub repo: RepoSlug,
    /// Branch receiving the files, created when missing
    pub branch: BranchName,
    /// Branch the target is created from
    pub base_branch: BranchName,
}

/// Everything a run needs, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub token: Token,
    pub target: UploadTarget,
    /// Directory whose files are uploaded
    pub source_dir: PathBuf,
    /// Put in front of every commit message
    pub commit_prefix: String,
    /// Root of the GitHub REST API
    pub api_url: String,
}

impl Config {
    /// Read the configuration from the process environment, prompting for the
    /// repository if it is not set
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|key| env::var(key).ok(), crate::interact::prompt_repo)
    }

    /// Build the configuration from `lookup`. Empty values count as unset.
    ///
    /// `prompt_repo` is only called when the repository is not set.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        prompt_repo: impl FnOnce() -> Result<String, SyncError>,
    ) -> Result<Self, SyncError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        // checked first: without a token nothing else is worth doing
        let token = var(TOKEN_VAR)
            .and_then(|token| Token::try_new(token).ok())
            .ok_or(SyncError::MissingCredential)?;

        let repo = match var(REPO_VAR) {
            Some(repo) => repo,
            None => prompt_repo()?,
        }
        .parse::<RepoSlug>()
        .map_err(SyncError::InvalidConfig)?;

        let branch = var(BRANCH_VAR)
            .as_deref()
            .unwrap_or(defaults::BRANCH)
            .parse::<BranchName>()
            .map_err(|err| SyncError::InvalidConfig(format!("{BRANCH_VAR}: {err}")))?;

        let base_branch = var(BASE_BRANCH_VAR)
            .as_deref()
            .unwrap_or(defaults::BASE_BRANCH)
            .parse::<BranchName>()
            .map_err(|err| SyncError::InvalidConfig(format!("{BASE_BRANCH_VAR}: {err}")))?;

        Ok(Self {
            token,
            target: UploadTarget {
                repo,
                branch,
                base_branch,
            },
            source_dir: var(SOURCE_DIR_VAR)
                .unwrap_or_else(|| defaults::SOURCE_DIR.to_owned())
                .into(),
            commit_prefix: var(COMMIT_PREFIX_VAR)
                .unwrap_or_else(|| defaults::COMMIT_PREFIX.to_owned()),
            api_url: var(API_URL_VAR).unwrap_or_else(|| defaults::API_URL.to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    fn no_prompt() -> Result<String, SyncError> {
        Err(SyncError::InvalidConfig("REPO is not set".to_owned()))
    }

    #[test]
    fn parse_repo_slug() {
        assert_eq!(
            "octo-org/site".parse::<RepoSlug>(),
            Ok(RepoSlug {
                owner: "octo-org".to_owned(),
                name: "site".to_owned(),
            })
        );

        for invalid in ["site", "/site", "octo-org/", "a/b/c", ""] {
            assert!(
                invalid.parse::<RepoSlug>().is_err(),
                "{invalid:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_branch_name() {
        assert_eq!(
            "feature/x".parse::<BranchName>().map(|b| b.to_string()),
            Ok("feature/x".to_owned())
        );
        assert_eq!(
            "".parse::<BranchName>(),
            Err("branch name cannot be empty".to_owned())
        );
        assert_eq!(
            "   ".parse::<BranchName>(),
            Err("branch name cannot be empty".to_owned())
        );

        for valid in ["feat#1", "release/v1.2", "user@host", "a.b/c-d_e"] {
            assert!(valid.parse::<BranchName>().is_ok(), "{valid:?} should be accepted");
        }

        for invalid in [
            "has space",
            "a..b",
            "-flag",
            "/abs",
            "trailing/",
            "x.lock",
            "x.lock/y",
            "a//b",
            "a/.hidden",
            "ends.",
            "@",
            "a@{1}",
            "a~1",
            "a^2",
            "a:b",
            "a?b",
            "a*b",
            "a[b",
            "a\\b",
        ] {
            assert!(
                invalid.parse::<BranchName>().is_err(),
                "{invalid:?} should be rejected"
            );
        }
    }

    #[test]
    fn defaults_apply_when_unset_or_empty() {
        let config = Config::from_lookup(
            lookup(&[
                ("GITHUB_TOKEN", "ghp_secret"),
                ("REPO", "owner/repo"),
                ("BRANCH", ""),
            ]),
            no_prompt,
        )
        .unwrap();

        assert_eq!(config.target.branch.to_string(), defaults::BRANCH);
        assert_eq!(config.target.base_branch.to_string(), "main");
        assert_eq!(config.source_dir, PathBuf::from("."));
        assert_eq!(config.commit_prefix, defaults::COMMIT_PREFIX);
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(AsRef::<str>::as_ref(&config.token), "ghp_secret");
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(
            lookup(&[
                ("GITHUB_TOKEN", "t"),
                ("REPO", "octo/site"),
                ("BRANCH", "docs/update"),
                ("BASE_BRANCH", "develop"),
                ("SOURCE_DIR", "out"),
                ("COMMIT_PREFIX", "docs:"),
                ("GITHUB_API_URL", "http://localhost:8080"),
            ]),
            no_prompt,
        )
        .unwrap();

        assert_eq!(
            config.target,
            UploadTarget {
                repo: "octo/site".parse().unwrap(),
                branch: "docs/update".parse().unwrap(),
                base_branch: "develop".parse().unwrap(),
            }
        );
        assert_eq!(config.source_dir, PathBuf::from("out"));
        assert_eq!(config.commit_prefix, "docs:");
        assert_eq!(config.api_url, "http://localhost:8080");
    }

    #[test]
    fn missing_token_is_checked_before_anything_else() {
        let err = Config::from_lookup(lookup(&[("BRANCH", "bad branch")]), || {
            panic!("must not prompt without a token")
        })
        .unwrap_err();
        assert!(matches!(err, SyncError::MissingCredential), "{err}");

        let err =
            Config::from_lookup(lookup(&[("GITHUB_TOKEN", "   ")]), no_prompt).unwrap_err();
        assert!(matches!(err, SyncError::MissingCredential), "{err}");
    }

    #[test]
    fn prompts_for_repo_only_when_unset() {
        let config = Config::from_lookup(lookup(&[("GITHUB_TOKEN", "t")]), || {
            Ok("prompted/repo".to_owned())
        })
        .unwrap();
        assert_eq!(config.target.repo.to_string(), "prompted/repo");

        let err = Config::from_lookup(lookup(&[("GITHUB_TOKEN", "t")]), no_prompt).unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn invalid_branch_is_a_config_error() {
        let err = Config::from_lookup(
            lookup(&[
                ("GITHUB_TOKEN", "t"),
                ("REPO", "o/r"),
                ("BASE_BRANCH", "a..b"),
            ]),
            no_prompt,
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid configuration: BASE_BRANCH: invalid branch name: a..b"
        );
    }

    #[test]
    fn token_is_not_leaked_by_debug() {
        let token = Token::try_new("ghp_secret").unwrap();
        assert_eq!(format!("{token:?}"), "Token(***)");
    }
}
