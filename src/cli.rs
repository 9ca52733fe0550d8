//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands.

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};

use crate::manifest::DEFAULT_MANIFEST;
use crate::project::Platform;

/// Descriptor path written by `configure` when none is given.
pub const DEFAULT_OUTPUT: &str = "fbuild.bff";

/// Generate FASTBuild descriptors from a declarative target graph.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the project manifest.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MANIFEST)]
    pub file: Utf8PathBuf,

    /// Change to this directory before doing anything.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<Utf8PathBuf>,

    /// Enable verbose logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Optional subcommand to execute; defaults to `configure` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Parse command-line arguments, providing `configure` as the default
    /// command.
    #[must_use]
    pub fn parse_with_default() -> Self {
        Self::parse().with_default_command()
    }

    /// Parse the provided arguments, applying the default command when needed.
    ///
    /// # Errors
    ///
    /// Returns the clap error when the arguments are invalid.
    pub fn try_parse_from_with_default<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args).map(Self::with_default_command)
    }

    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Configure(ConfigureArgs::default()));
        }
        self
    }

    /// Resolve `path` against the working directory given with `-C`.
    #[must_use]
    pub fn in_directory(&self, path: &Utf8Path) -> Utf8PathBuf {
        match &self.directory {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Arguments accepted by the `configure` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct ConfigureArgs {
    /// Descriptor path; `-` writes to standard output.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    pub output: Utf8PathBuf,

    /// Override the platform declared in the manifest.
    #[arg(long, value_name = "PLATFORM")]
    pub platform: Option<Platform>,
}

impl Default for ConfigureArgs {
    fn default() -> Self {
        Self {
            output: Utf8PathBuf::from(DEFAULT_OUTPUT),
            platform: None,
        }
    }
}

impl ConfigureArgs {
    /// Whether the descriptor goes to standard output.
    #[must_use]
    pub fn writes_stdout(&self) -> bool {
        self.output.as_str() == "-"
    }
}

/// Available top-level commands for bffgen.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Generate the FASTBuild descriptor (default).
    Configure(ConfigureArgs),

    /// Build a target with FBuild and refresh its compilation database.
    Build {
        /// Descriptor target to build, for example `all-x64-Debug`.
        #[arg(value_name = "TARGET")]
        target: String,
    },

    /// Print the resolved build order with each target's dependency closure.
    Graph,
}
