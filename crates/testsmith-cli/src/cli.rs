//! Command-line interface definition using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// testsmith - keeps unit tests in step with the code they cover
#[derive(Parser, Debug)]
#[command(name = "testsmith")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the settings file
    #[arg(short, long, env = "TESTSMITH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch a local project and update tests as files are saved
    Watch {
        /// Path to the project directory
        #[arg(required = true)]
        project: PathBuf,
    },

    /// Poll the configured remote repository and open test update PRs
    Poll,

    /// Generate tests for one file, with a preview and approval prompt
    Generate {
        /// Source file (prompts for files until `exit` when omitted)
        file: Option<PathBuf>,

        /// Project directory (default: current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,
    },
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_watch() {
        let cli = Cli::parse_from(["testsmith", "watch", "/work/app"]);
        match cli.command {
            Commands::Watch { project } => assert_eq!(project, PathBuf::from("/work/app")),
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn test_cli_parse_generate() {
        let cli = Cli::parse_from(["testsmith", "generate", "src/Foo.cs", "--project", "/work/app"]);
        match cli.command {
            Commands::Generate { file, project } => {
                assert_eq!(file, Some(PathBuf::from("src/Foo.cs")));
                assert_eq!(project, Some(PathBuf::from("/work/app")));
            }
            _ => panic!("Expected Generate command"),
        }

        let cli = Cli::parse_from(["testsmith", "generate"]);
        assert!(matches!(cli.command, Commands::Generate { file: None, project: None }));
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from(["testsmith", "poll", "-vv", "--config", "/etc/testsmith.toml"]);
        assert!(matches!(cli.command, Commands::Poll));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_level(), tracing::Level::TRACE);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/testsmith.toml")));
    }

    #[test]
    fn test_cli_default_log_level() {
        let cli = Cli::parse_from(["testsmith", "poll"]);
        assert_eq!(cli.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_cli_help() {
        Cli::command().debug_assert();
    }
}
