//! Project registry.
//!
//! A [`Project`] owns every target and compiler taking part in one
//! generation. It is populated through the `add_*` operations and then
//! consumed by [`Project::generate`].
//!
//! # Examples
//!
//! ```
//! use bffgen::project::{Platform, Project};
//! use bffgen::target::{CompileSettings, Executable, ObjectList, Sources, Subsystem, Target};
//!
//! let mut project = Project::new("demo", Platform::Windows);
//! project
//!     .add_targets([
//!         Target::header_only_library(
//!             "liba",
//!             CompileSettings::new("liba").with_pub_defines(["FOO"]),
//!         ),
//!         Target::object_list(
//!             "objlist",
//!             ObjectList {
//!                 compile: CompileSettings::new("src"),
//!                 sources: Sources { files: vec!["main.cpp".into()], ..Sources::default() },
//!                 ..ObjectList::default()
//!             },
//!         )
//!         .with_deps(["liba"]),
//!     ])
//!     .expect("register");
//! let bff = project.generate().expect("generate");
//! assert!(bff.starts_with("#include \"FastBuildSDK/Prelude.bff\""));
//! ```

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use indexmap::map::Entry;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bff_gen;
use crate::compiler::Compiler;
use crate::graph::{self, GraphError, Resolution};
use crate::target::{Target, TargetKind};

/// Preamble included at the top of every descriptor unless overridden.
pub const DEFAULT_PRELUDE: &str = "FastBuildSDK/Prelude.bff";
/// Root of per-configuration intermediate outputs.
pub const OUTPUT_PATH: &str = "_out/$BuildConfigName$";
/// Root of outputs shared by every configuration.
pub const SHARED_OUTPUT_PATH: &str = "_out";
/// Root of per-configuration linked binaries.
pub const BINARY_PATH: &str = "_bin/$BuildConfigName$";

/// Destination used for an executable that does not name one.
#[must_use]
pub fn default_executable_dest(platform: Platform, name: &str) -> String {
    match platform {
        Platform::Windows => format!("{BINARY_PATH}/{name}.exe"),
        Platform::Linux | Platform::Macos => format!("{BINARY_PATH}/{name}"),
    }
}

/// Errors raised while registering targets or generating the descriptor.
#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    /// A target with the same name is already registered.
    #[error("target `{name}` already exists in the project")]
    #[diagnostic(code(bffgen::project::duplicate_target))]
    DuplicateTarget {
        /// Conflicting name.
        name: String,
    },

    /// A compiler with the same name is already registered.
    #[error("compiler `{name}` already exists in the project")]
    #[diagnostic(code(bffgen::project::duplicate_compiler))]
    DuplicateCompiler {
        /// Conflicting name.
        name: String,
    },

    /// The target does not have a shape the generator can emit.
    #[error("{kind} target `{name}` is invalid: {reason}")]
    #[diagnostic(code(bffgen::project::invalid_target))]
    InvalidTarget {
        /// Target name, possibly empty.
        name: String,
        /// Variant keyword.
        kind: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The compiler does not have a shape the generator can emit.
    #[error("compiler `{name}` is invalid: {reason}")]
    #[diagnostic(code(bffgen::project::invalid_compiler))]
    InvalidCompiler {
        /// Compiler name, possibly empty.
        name: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Generation was requested before any target was registered.
    #[error("there are no targets in project `{project}`")]
    #[diagnostic(
        code(bffgen::project::empty),
        help("declare at least one target before generating")
    )]
    EmptyProject {
        /// Project name.
        project: String,
    },

    /// An object list selects a compiler that was never registered.
    #[error("target `{target}` uses unknown compiler `{compiler}`")]
    #[diagnostic(code(bffgen::project::unknown_compiler))]
    UnknownCompiler {
        /// Target selecting the compiler.
        target: String,
        /// Missing compiler name.
        compiler: String,
    },

    /// Dependency resolution failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    /// Writing into the in-memory descriptor failed.
    #[error("failed to format the descriptor")]
    #[diagnostic(code(bffgen::project::format))]
    Format(#[from] fmt::Error),
}

/// Platform tag of the generated project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Microsoft Windows with the MSVC toolchain.
    #[default]
    Windows,
    /// Linux.
    Linux,
    /// macOS.
    Macos,
}

impl Platform {
    /// Lowercase tag as written in manifests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Macos => "macos",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown platform tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform `{0}` (expected windows, linux or macos)")]
pub struct ParsePlatformError(String);

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::Macos),
            _ => Err(ParsePlatformError(s.to_owned())),
        }
    }
}

/// Registry of targets and compilers for one descriptor.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    platform: Platform,
    prelude: String,
    configs: Vec<String>,
    targets: IndexMap<String, Target>,
    compilers: IndexMap<String, Compiler>,
}

impl Project {
    /// Create an empty project.
    #[must_use]
    pub fn new(name: impl Into<String>, platform: Platform) -> Self {
        Self {
            name: name.into(),
            platform,
            prelude: DEFAULT_PRELUDE.to_owned(),
            configs: Vec::new(),
            targets: IndexMap::new(),
            compilers: IndexMap::new(),
        }
    }

    /// Replace the file included at the top of the descriptor.
    #[must_use]
    pub fn with_prelude(mut self, prelude: impl Into<String>) -> Self {
        self.prelude = prelude.into();
        self
    }

    /// Declare build configurations in the descriptor itself.
    ///
    /// Without declared configurations the prelude must define
    /// `.BuildConfigs`.
    #[must_use]
    pub fn with_configs<I, S>(mut self, configs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.configs = configs.into_iter().map(Into::into).collect();
        self
    }

    /// Project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Platform tag.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Override the platform tag.
    pub const fn set_platform(&mut self, platform: Platform) {
        self.platform = platform;
    }

    /// File included by the preamble.
    #[must_use]
    pub fn prelude(&self) -> &str {
        &self.prelude
    }

    /// Declared build configuration names.
    #[must_use]
    pub fn configs(&self) -> &[String] {
        &self.configs
    }

    /// Registered targets in registration order.
    #[must_use]
    pub const fn targets(&self) -> &IndexMap<String, Target> {
        &self.targets
    }

    /// Look up a target by name.
    #[must_use]
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    /// Registered compilers in registration order.
    #[must_use]
    pub const fn compilers(&self) -> &IndexMap<String, Compiler> {
        &self.compilers
    }

    /// Register a target.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::InvalidTarget`] for a malformed target and
    /// [`ProjectError::DuplicateTarget`] when the name is taken. The registry
    /// is unchanged on error.
    pub fn add_target(&mut self, target: Target) -> Result<(), ProjectError> {
        validate_target(&target)?;
        match self.targets.entry(target.name().to_owned()) {
            Entry::Occupied(entry) => Err(ProjectError::DuplicateTarget {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(target);
                Ok(())
            }
        }
    }

    /// Register several targets, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Project::add_target`]; targets
    /// registered before it stay registered.
    pub fn add_targets<I>(&mut self, targets: I) -> Result<(), ProjectError>
    where
        I: IntoIterator<Item = Target>,
    {
        targets.into_iter().try_for_each(|target| self.add_target(target))
    }

    /// Register a compiler.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::InvalidCompiler`] for a malformed compiler and
    /// [`ProjectError::DuplicateCompiler`] when the name is taken.
    pub fn add_compiler(&mut self, compiler: Compiler) -> Result<(), ProjectError> {
        validate_compiler(&compiler)?;
        match self.compilers.entry(compiler.name.clone()) {
            Entry::Occupied(entry) => Err(ProjectError::DuplicateCompiler {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(compiler);
                Ok(())
            }
        }
    }

    /// Resolve dependency order and closures.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Graph`] for unknown dependencies or cycles.
    pub fn resolve(&self) -> Result<Resolution, ProjectError> {
        Ok(graph::resolve(&self.targets)?)
    }

    /// Generate the complete descriptor text.
    ///
    /// The descriptor is built in memory; nothing is written on failure.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::EmptyProject`] when no target is registered,
    /// [`ProjectError::UnknownCompiler`] for a dangling compiler reference,
    /// and any resolution error.
    pub fn generate(&self) -> Result<String, ProjectError> {
        if self.targets.is_empty() {
            return Err(ProjectError::EmptyProject {
                project: self.name.clone(),
            });
        }
        self.check_compilers()?;
        let resolution = self.resolve()?;
        bff_gen::generate(self, &resolution)
    }

    fn check_compilers(&self) -> Result<(), ProjectError> {
        for target in self.targets.values() {
            if let TargetKind::ObjectList(list) = target.kind() {
                if let Some(compiler) = list
                    .compiler
                    .as_ref()
                    .filter(|name| !self.compilers.contains_key(*name))
                {
                    return Err(ProjectError::UnknownCompiler {
                        target: target.name().to_owned(),
                        compiler: compiler.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn validate_target(target: &Target) -> Result<(), ProjectError> {
    let invalid = |reason| ProjectError::InvalidTarget {
        name: target.name().to_owned(),
        kind: target.kind().keyword(),
        reason,
    };
    if target.name().trim().is_empty() {
        return Err(invalid("the name is empty"));
    }
    let reason = match target.kind() {
        TargetKind::ExternalLibrary(lib) if lib.compile.base_path.is_empty() => {
            Some("the base path is empty")
        }
        TargetKind::HeaderOnlyLibrary(compile) if compile.base_path.is_empty() => {
            Some("the base path is empty")
        }
        TargetKind::ObjectList(list) if list.sources.is_empty() => {
            Some("it has neither source files nor a source path")
        }
        TargetKind::ObjectList(list)
            if list.compiler.is_none() && !target.is_config_dependent() =>
        {
            Some("it uses the configuration's compiler and must be configuration-dependent")
        }
        TargetKind::Executable(exe) if exe.dest.is_empty() => Some("the destination is empty"),
        TargetKind::Executable(_) if !target.is_config_dependent() => {
            Some("executables are always configuration-dependent")
        }
        TargetKind::Copy(copy) if copy.source.is_empty() || copy.dest.is_empty() => {
            Some("the source and destination must both be set")
        }
        TargetKind::Alias if target.deps().is_empty() => Some("it groups no targets"),
        _ => None,
    };
    reason.map_or(Ok(()), |reason| Err(invalid(reason)))
}

fn validate_compiler(compiler: &Compiler) -> Result<(), ProjectError> {
    let reason = if compiler.name.trim().is_empty() {
        Some("the name is empty")
    } else if compiler.executable.is_empty() {
        Some("the executable is empty")
    } else {
        None
    };
    reason.map_or(Ok(()), |reason| {
        Err(ProjectError::InvalidCompiler {
            name: compiler.name.clone(),
            reason,
        })
    })
}
