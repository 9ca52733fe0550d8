//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! handles command execution. `configure` generates the descriptor in memory
//! and persists it atomically; `build` delegates to the FBuild subprocess.

mod process;

use std::io::{self, Write};

use anyhow::{Context, Result};
use itertools::Itertools;
use tracing::debug;

use crate::cli::{Cli, Commands, ConfigureArgs};
use crate::graph::Resolution;
use crate::manifest;
use crate::project::{Platform, Project};

pub use process::{FBUILD_ENV, FBUILD_PROGRAM, resolve_fbuild_program, run_fbuild};

/// Execute the parsed [`Cli`] commands.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, generation fails, the
/// descriptor cannot be written, or FBuild reports a failure.
pub fn run(cli: &Cli) -> Result<()> {
    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| Commands::Configure(ConfigureArgs::default()));
    match command {
        Commands::Configure(args) => configure(cli, &args),
        Commands::Build { target } => build(cli, &target),
        Commands::Graph => graph(cli),
    }
}

fn load_project(cli: &Cli, platform: Option<Platform>) -> Result<Project> {
    let path = cli.in_directory(&cli.file);
    manifest::load_project(&path, platform)
        .with_context(|| format!("loading manifest at {path}"))
}

fn configure(cli: &Cli, args: &ConfigureArgs) -> Result<()> {
    let project = load_project(cli, args.platform)?;
    let descriptor = project
        .generate()
        .with_context(|| format!("generating descriptor for project {}", project.name()))?;
    debug!(bytes = descriptor.len(), "generated descriptor in memory");

    if args.writes_stdout() {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(descriptor.as_bytes())
            .and_then(|()| stdout.flush())
            .context("writing descriptor to stdout")?;
        return Ok(());
    }
    process::write_descriptor(&cli.in_directory(&args.output), &descriptor)
}

fn build(cli: &Cli, target: &str) -> Result<()> {
    let program = resolve_fbuild_program();
    run_fbuild(&program, cli, &[target])
        .with_context(|| format!("building target {target}"))?;
    run_fbuild(&program, cli, &["-compdb", target])
        .with_context(|| format!("exporting compilation database for {target}"))
}

fn graph(cli: &Cli) -> Result<()> {
    let project = load_project(cli, None)?;
    let resolution = project.resolve().context("resolving dependency graph")?;
    let mut stdout = io::stdout().lock();
    write_graph(&mut stdout, &project, &resolution).context("writing dependency graph")
}

/// Write one line per target in build order with its dependency closure.
fn write_graph(out: &mut impl Write, project: &Project, resolution: &Resolution) -> io::Result<()> {
    for name in resolution.order() {
        let kind = project.target(name).map_or("?", |t| t.kind().keyword());
        let all = resolution.all_deps(name);
        if all.is_empty() {
            writeln!(out, "{name} ({kind})")?;
        } else {
            writeln!(out, "{name} ({kind}): {}", all.iter().join(", "))?;
        }
    }
    out.flush()
}
