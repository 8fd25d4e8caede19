//! Logic for parsing command line arguments
//!
//! Everything about the upload itself comes from the environment, so the only
//! arguments are global flags.
use core::{error, fmt};
use std::env;

use colored::Colorize as _;

use crate::APP_NAME;
use crate::config::{
    API_URL_VAR, BASE_BRANCH_VAR, BRANCH_VAR, COMMIT_PREFIX_VAR, REPO_VAR, SOURCE_DIR_VAR,
    TOKEN_VAR, defaults,
};

pub struct CliFlag<'a> {
    pub short: &'a str,
    pub long: &'a str,
    pub description: &'a str,
}

impl CliFlag<'_> {
    fn is(&self, s: &str) -> bool {
        self.short == s || self.long == s
    }
}

impl fmt::Display for CliFlag<'_> {
    /// Formats a flag into a colored format with a description, printable to
    /// the terminal
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}\n    {} {}",
            self.short.bright_magenta(),
            ", ".bright_black(),
            self.long.bright_magenta(),
            "»".bright_black(),
            self.description
        )
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum CliParseError {
    UnknownFlag(String),
    UnknownArgument(String),
    DuplicateFlag(&'static str),
    MutuallyExclusiveFlags,
}

impl fmt::Display for CliParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFlag(flag) => write!(f, "Unknown flag: {flag}"),
            Self::UnknownArgument(arg) => write!(f, "Unknown argument: {arg}"),
            Self::DuplicateFlag(flag) => write!(f, "Cannot use {flag} more than once"),
            Self::MutuallyExclusiveFlags => write!(
                f,
                "Flags {} and {} are mutually exclusive, so they cannot be used together.",
                Cli::HELP_FLAG.long,
                Cli::VERSION_FLAG.long
            ),
        }
    }
}

impl error::Error for CliParseError {}

#[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
pub enum HelpOrVersion {
    Help,
    Version,
    #[default]
    None,
}

impl HelpOrVersion {
    /// Make sure a new flag doesn't conflict with the one already given
    fn validate(&mut self, new_flag: Self) -> Result<(), CliParseError> {
        match (*self, new_flag) {
            (Self::None, flag) | (_, flag @ Self::None) => {
                if flag != Self::None {
                    *self = flag;
                }
                Ok(())
            },
            (Self::Help, Self::Help) => Err(CliParseError::DuplicateFlag(Cli::HELP_FLAG.long)),
            (Self::Version, Self::Version) => {
                Err(CliParseError::DuplicateFlag(Cli::VERSION_FLAG.long))
            },
            (Self::Help, Self::Version) | (Self::Version, Self::Help) => {
                Err(CliParseError::MutuallyExclusiveFlags)
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq, Default)]
pub struct Cli {
    pub help_or_version: HelpOrVersion,
    /// Log everything
    pub verbose: bool,
}

impl Cli {
    pub const HELP_FLAG: CliFlag<'static> = CliFlag {
        short: "-h",
        long: "--help",
        description: "Print this message",
    };

    pub const VERBOSE_FLAG: CliFlag<'static> = CliFlag {
        short: "-V",
        long: "--verbose",
        description: "Increased logging information",
    };

    pub const VERSION_FLAG: CliFlag<'static> = CliFlag {
        short: "-v",
        long: "--version",
        description: "Print the version",
    };

    /// Parse the command line arguments of this process
    pub fn parse() -> Result<Self, CliParseError> {
        Self::parse_from(env::args())
    }

    /// Parse `args`, the first of which is the name used to invoke us
    pub fn parse_from<Args: Iterator<Item = String>>(args: Args) -> Result<Self, CliParseError> {
        let mut cli = Self::default();

        for arg in args.skip(1) {
            if Self::HELP_FLAG.is(&arg) {
                cli.help_or_version.validate(HelpOrVersion::Help)?;
            } else if Self::VERSION_FLAG.is(&arg) {
                cli.help_or_version.validate(HelpOrVersion::Version)?;
            } else if Self::VERBOSE_FLAG.is(&arg) {
                if cli.verbose {
                    return Err(CliParseError::DuplicateFlag(Self::VERBOSE_FLAG.long));
                }
                cli.verbose = true;
            } else if arg.starts_with('-') {
                return Err(CliParseError::UnknownFlag(arg));
            } else {
                return Err(CliParseError::UnknownArgument(arg));
            }
        }

        Ok(cli)
    }
}

/// The help menu
pub fn help() -> String {
    let app_name = APP_NAME.bright_blue();
    let version = env!("CARGO_PKG_VERSION");
    let flags_label = "[<flags>]".bright_magenta();

    let var = |name: &str, description: &str| {
        format!(
            "    {}\n    {} {description}",
            name.bright_yellow(),
            "»".bright_black()
        )
    };

    let vars = [
        var(TOKEN_VAR, "GitHub token (required)"),
        var(REPO_VAR, "Repository as owner/repo, asked for if not set"),
        var(BRANCH_VAR, &format!("Branch to upload to, default: {}", defaults::BRANCH)),
        var(
            BASE_BRANCH_VAR,
            &format!("Branch to create it from, default: {}", defaults::BASE_BRANCH),
        ),
        var(
            SOURCE_DIR_VAR,
            &format!("Directory to upload, default: {}", defaults::SOURCE_DIR),
        ),
        var(
            COMMIT_PREFIX_VAR,
            &format!("Commit message prefix, default: {}", defaults::COMMIT_PREFIX),
        ),
        var(API_URL_VAR, &format!("API root, default: {}", defaults::API_URL)),
    ]
    .join("\n\n");

    format!(
        "
  {app_name} {version}

  Upload a directory onto a GitHub branch, creating the branch if needed.

  Usage:

    {app_name} {flags_label}

  Flags:

    {}

    {}

    {}

  Environment:

{vars}
",
        Cli::HELP_FLAG,
        Cli::VERSION_FLAG,
        Cli::VERBOSE_FLAG,
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Calls the CLI with the given command line arguments
    #[track_caller]
    fn branch_sync(args: &[&str]) -> Result<Cli, CliParseError> {
        Cli::parse_from(
            // when we actually invoke the CLI command, the name used to invoke the process is also
            // passed
            std::iter::once(APP_NAME.to_owned()).chain(args.iter().map(ToString::to_string)),
        )
    }

    #[test]
    fn no_arguments() {
        assert_eq!(branch_sync(&[]), Ok(Cli::default()));
    }

    #[test]
    fn global_flags() {
        for (args, expected) in [
            (&["--help"][..], HelpOrVersion::Help),
            (&["-h"], HelpOrVersion::Help),
            (&["--version"], HelpOrVersion::Version),
            (&["-v"], HelpOrVersion::Version),
        ] {
            assert_eq!(
                branch_sync(args),
                Ok(Cli {
                    help_or_version: expected,
                    verbose: false,
                }),
                "args: {args:?}"
            );
        }

        assert_eq!(
            branch_sync(&["-V", "--help"]),
            Ok(Cli {
                help_or_version: HelpOrVersion::Help,
                verbose: true,
            })
        );
    }

    #[test]
    fn mutually_exclusive_flags() {
        assert_eq!(
            branch_sync(&["--help", "--version"]),
            Err(CliParseError::MutuallyExclusiveFlags)
        );
        assert_eq!(
            branch_sync(&["-v", "-h"]),
            Err(CliParseError::MutuallyExclusiveFlags)
        );
    }

    #[test]
    fn duplicate_flags() {
        assert_eq!(
            branch_sync(&["-h", "--help"]),
            Err(CliParseError::DuplicateFlag("--help"))
        );
        assert_eq!(
            branch_sync(&["--verbose", "-V"]),
            Err(CliParseError::DuplicateFlag("--verbose"))
        );
    }

    #[test]
    fn unknown_arguments() {
        assert_eq!(
            branch_sync(&["--unknown-flag"]),
            Err(CliParseError::UnknownFlag("--unknown-flag".to_owned()))
        );
        assert_eq!(
            branch_sync(&["upload"]),
            Err(CliParseError::UnknownArgument("upload".to_owned()))
        );
    }

    #[test]
    fn help_lists_every_variable() {
        let help = help();
        for var in [
            TOKEN_VAR,
            REPO_VAR,
            BRANCH_VAR,
            BASE_BRANCH_VAR,
            SOURCE_DIR_VAR,
            COMMIT_PREFIX_VAR,
            API_URL_VAR,
        ] {
            assert!(help.contains(var), "help should mention {var}");
        }
    }
}
