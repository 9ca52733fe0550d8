//! Descriptor persistence and FBuild process management.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result as AnyResult};
use camino::Utf8Path;
use tempfile::NamedTempFile;
use tracing::info;

use crate::cli::Cli;

/// Environment variable overriding the FBuild executable.
pub const FBUILD_ENV: &str = "BFFGEN_FBUILD";

/// FBuild executable used when [`FBUILD_ENV`] is unset.
pub const FBUILD_PROGRAM: &str = "FBuild";

/// Atomically replace `path` with `content`.
///
/// The descriptor is written to a temporary file beside `path` and renamed
/// over it, so readers never observe a partial descriptor.
///
/// # Errors
///
/// Returns an error if the parent directory, the temporary file, or the final
/// rename fails.
pub(super) fn write_descriptor(path: &Utf8Path, content: &str) -> AnyResult<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create parent directory {parent}"))?;
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {parent}"))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.flush())
        .with_context(|| format!("failed to write descriptor for {path}"))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to persist descriptor to {path}"))?;
    info!(path = %path, bytes = content.len(), "generated FASTBuild descriptor");
    Ok(())
}

/// Determine which FBuild executable to invoke.
#[must_use]
pub fn resolve_fbuild_program() -> PathBuf {
    env::var_os(FBUILD_ENV).map_or_else(|| PathBuf::from(FBUILD_PROGRAM), PathBuf::from)
}

/// Invoke FBuild with `args` in the directory selected by `-C`.
///
/// Standard output and error are inherited so FBuild's progress reaches the
/// user directly.
///
/// # Errors
///
/// Returns an [`io::Error`] if the process fails to spawn or exits with a
/// non-zero status.
pub fn run_fbuild(program: &Path, cli: &Cli, args: &[&str]) -> io::Result<()> {
    let mut cmd = Command::new(program);
    if let Some(dir) = &cli.directory {
        cmd.current_dir(fs::canonicalize(dir)?);
    }
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    info!("Running command: {} {}", program.display(), args.join(" "));
    let status = cmd.status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "{} exited with {status}",
            program.display()
        )))
    }
}
