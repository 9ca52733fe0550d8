//! Build target model.
//!
//! A [`Target`] pairs the identity every node shares (name, direct
//! dependencies, configuration dependence) with a [`TargetKind`] carrying the
//! variant-specific data. Targets are immutable once registered; the
//! resolver keeps traversal state and closures in its own maps.
//!
//! ```
//! use bffgen::target::{CompileSettings, Target};
//!
//! let lib = Target::header_only_library(
//!     "doctest",
//!     CompileSettings::new("deps/doctest").with_pub_defines(["DOCTEST_CONFIG_NO_EXCEPTIONS"]),
//! );
//! assert_eq!(lib.emission_name(), "doctest");
//! assert!(lib.compile_settings().is_some());
//! ```

use serde::{Deserialize, Serialize};

/// Suffix appended to the names of configuration-dependent targets.
pub const CONFIG_SUFFIX: &str = "-$Platform$-$BuildConfigName$";

/// Compile flags and base path carried by compile-capable targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileSettings {
    /// Root directory for the target's sources and include paths.
    pub base_path: String,
    /// Defines propagated to dependents.
    pub pub_defines: Vec<String>,
    /// Include directories, relative to the base path, propagated to dependents.
    pub pub_includes: Vec<String>,
    /// Defines used only when compiling this target.
    pub priv_defines: Vec<String>,
    /// Include directories used only when compiling this target.
    pub priv_includes: Vec<String>,
}

fn to_strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl CompileSettings {
    /// Settings rooted at `base_path` with no flags.
    #[must_use]
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Replace the public defines.
    #[must_use]
    pub fn with_pub_defines<I, S>(mut self, defines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pub_defines = to_strings(defines);
        self
    }

    /// Replace the public include directories.
    #[must_use]
    pub fn with_pub_includes<I, S>(mut self, includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pub_includes = to_strings(includes);
        self
    }

    /// Replace the private defines.
    #[must_use]
    pub fn with_priv_defines<I, S>(mut self, defines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priv_defines = to_strings(defines);
        self
    }

    /// Replace the private include directories.
    #[must_use]
    pub fn with_priv_includes<I, S>(mut self, includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priv_includes = to_strings(includes);
        self
    }
}

/// A prebuilt library linked from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLibrary {
    /// Base path and propagated flags.
    pub compile: CompileSettings,
    /// Library files relative to the base path.
    pub libs: Vec<String>,
}

/// Where an object list finds its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    /// Individual files relative to the base path.
    pub files: Vec<String>,
    /// Directories scanned by the build engine.
    pub paths: Vec<String>,
    /// Patterns applied while scanning `paths`.
    pub patterns: Vec<String>,
    /// Whether directory scanning descends into subdirectories.
    pub recurse: bool,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            paths: Vec::new(),
            patterns: Vec::new(),
            recurse: true,
        }
    }
}

impl Sources {
    /// Whether neither files nor search paths were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.paths.is_empty()
    }
}

/// Output placement for compiled objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectOutput {
    /// Output directory; defaults to `_out/$BuildConfigName$/<name>`.
    pub path: Option<String>,
    /// Replacement object extension.
    pub extension: Option<String>,
    /// Keep the source extension in front of the object extension.
    pub keep_base_extension: bool,
}

/// A set of sources compiled into objects, optionally archived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectList {
    /// Base path and flags.
    pub compile: CompileSettings,
    /// Inputs.
    pub sources: Sources,
    /// Name of a registered [`crate::compiler::Compiler`] to use instead of
    /// the default one.
    pub compiler: Option<String>,
    /// Prefix options with `$CompilerOptionsC$`.
    pub compile_as_c: bool,
    /// Extra options appended verbatim.
    pub compiler_options: Option<String>,
    /// Output placement.
    pub output: ObjectOutput,
    /// Emit a `Library` that archives the objects instead of a bare
    /// `ObjectList`.
    pub archive: bool,
}

/// Linker subsystem of an executable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    /// Console application.
    #[default]
    Console,
    /// GUI application entered through `WinMainCRTStartup`.
    Windows,
    /// No subsystem options.
    None,
}

/// A linked binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    /// Destination path of the binary.
    pub dest: String,
    /// Linker subsystem.
    pub subsystem: Subsystem,
    /// Extra system libraries appended to the linker options.
    pub extra_libs: Vec<String>,
}

/// A single file copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFile {
    /// File to copy.
    pub source: String,
    /// Destination file.
    pub dest: String,
}

/// The closed set of target variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    /// Prebuilt library files plus propagated flags.
    ExternalLibrary(ExternalLibrary),
    /// Flags only; nothing is compiled.
    HeaderOnlyLibrary(CompileSettings),
    /// Compiled sources.
    ObjectList(ObjectList),
    /// Linked binary.
    Executable(Executable),
    /// File copy.
    Copy(CopyFile),
    /// Named group of other targets.
    Alias,
}

impl TargetKind {
    /// Keyword used in diagnostics and in the descriptor.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::ExternalLibrary(_) => "ExternalLibrary",
            Self::HeaderOnlyLibrary(_) => "HeaderOnlyLibrary",
            Self::ObjectList(list) if list.archive => "Library",
            Self::ObjectList(_) => "ObjectList",
            Self::Executable(_) => "Executable",
            Self::Copy(_) => "Copy",
            Self::Alias => "Alias",
        }
    }

    const fn default_config_dependent(&self) -> bool {
        match self {
            Self::ExternalLibrary(_) | Self::HeaderOnlyLibrary(_) => false,
            Self::ObjectList(list) => list.compiler.is_none(),
            Self::Executable(_) | Self::Copy(_) | Self::Alias => true,
        }
    }
}

/// A named node in the build graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    deps: Vec<String>,
    config_dependent: bool,
    kind: TargetKind,
}

impl Target {
    /// Create a target with no dependencies.
    ///
    /// Libraries that only carry flags and object lists built by a custom
    /// compiler default to configuration-agnostic; everything else defaults
    /// to configuration-dependent.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            deps: Vec::new(),
            config_dependent: kind.default_config_dependent(),
            kind,
        }
    }

    /// Shorthand for an [`ExternalLibrary`].
    #[must_use]
    pub fn external_library<I, S>(name: impl Into<String>, compile: CompileSettings, libs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            TargetKind::ExternalLibrary(ExternalLibrary {
                compile,
                libs: to_strings(libs),
            }),
        )
    }

    /// Shorthand for a header-only library.
    #[must_use]
    pub fn header_only_library(name: impl Into<String>, compile: CompileSettings) -> Self {
        Self::new(name, TargetKind::HeaderOnlyLibrary(compile))
    }

    /// Shorthand for an [`ObjectList`].
    #[must_use]
    pub fn object_list(name: impl Into<String>, list: ObjectList) -> Self {
        Self::new(name, TargetKind::ObjectList(list))
    }

    /// Shorthand for an [`Executable`].
    #[must_use]
    pub fn executable(name: impl Into<String>, exe: Executable) -> Self {
        Self::new(name, TargetKind::Executable(exe))
    }

    /// Shorthand for a [`CopyFile`].
    #[must_use]
    pub fn copy(name: impl Into<String>, source: impl Into<String>, dest: impl Into<String>) -> Self {
        Self::new(
            name,
            TargetKind::Copy(CopyFile {
                source: source.into(),
                dest: dest.into(),
            }),
        )
    }

    /// Shorthand for an alias grouping `members`.
    #[must_use]
    pub fn alias<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, TargetKind::Alias).with_deps(members)
    }

    /// Replace the direct dependencies, keeping their order.
    #[must_use]
    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = to_strings(deps);
        self
    }

    /// Override whether the target is instantiated per build configuration.
    #[must_use]
    pub fn with_config_dependent(mut self, config_dependent: bool) -> Self {
        self.config_dependent = config_dependent;
        self
    }

    /// Raw target name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct dependency names in declaration order.
    #[must_use]
    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    /// Whether the target is emitted once per build configuration.
    #[must_use]
    pub const fn is_config_dependent(&self) -> bool {
        self.config_dependent
    }

    /// Variant data.
    #[must_use]
    pub const fn kind(&self) -> &TargetKind {
        &self.kind
    }

    /// Name used in the descriptor.
    ///
    /// Configuration-dependent targets are qualified with
    /// [`CONFIG_SUFFIX`]; everything else keeps its raw name.
    #[must_use]
    pub fn emission_name(&self) -> String {
        if self.config_dependent {
            format!("{}{CONFIG_SUFFIX}", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Compile settings when the target is compile-capable.
    #[must_use]
    pub const fn compile_settings(&self) -> Option<&CompileSettings> {
        match &self.kind {
            TargetKind::ExternalLibrary(lib) => Some(&lib.compile),
            TargetKind::HeaderOnlyLibrary(compile) => Some(compile),
            TargetKind::ObjectList(list) => Some(&list.compile),
            TargetKind::Executable(_) | TargetKind::Copy(_) | TargetKind::Alias => None,
        }
    }

    /// Whether the target produces a function block in the descriptor.
    #[must_use]
    pub const fn emits_function(&self) -> bool {
        !matches!(
            self.kind,
            TargetKind::ExternalLibrary(_) | TargetKind::HeaderOnlyLibrary(_)
        )
    }

    /// Whether executables depending on this target link against it.
    ///
    /// Object lists built by a custom compiler produce non-object artefacts
    /// and are never linked.
    #[must_use]
    pub const fn is_linkable(&self) -> bool {
        match &self.kind {
            TargetKind::ObjectList(list) => list.compiler.is_none(),
            TargetKind::ExternalLibrary(_) => true,
            _ => false,
        }
    }

    /// Variable holding the target's base path.
    #[must_use]
    pub fn base_path_var(&self) -> String {
        format!("{}_BasePath", self.name)
    }

    /// Variable holding own plus inherited define flags.
    #[must_use]
    pub fn define_flag_var(&self) -> String {
        format!("{}_DefineFlag", self.name)
    }

    /// Variable holding own plus inherited include flags.
    #[must_use]
    pub fn include_flag_var(&self) -> String {
        format!("{}_IncludePathFlag", self.name)
    }

    /// Variable holding the define flags exported to dependents.
    #[must_use]
    pub fn public_define_flag_var(&self) -> String {
        format!("{}_PublicDefineFlag", self.name)
    }

    /// Variable holding the include flags exported to dependents.
    #[must_use]
    pub fn public_include_flag_var(&self) -> String {
        format!("{}_PublicIncludePathFlag", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn shader_list() -> ObjectList {
        ObjectList {
            compiler: Some("glslc".into()),
            sources: Sources {
                paths: vec![".".into()],
                ..Sources::default()
            },
            ..ObjectList::default()
        }
    }

    #[rstest]
    #[case(Target::header_only_library("h", CompileSettings::new("h")), "h")]
    #[case(Target::external_library("e", CompileSettings::new("e"), ["e.lib"]), "e")]
    #[case(Target::copy("c", "a", "b"), "c-$Platform$-$BuildConfigName$")]
    #[case(Target::copy("c", "a", "b").with_config_dependent(false), "c")]
    #[case(Target::alias("all", ["c"]), "all-$Platform$-$BuildConfigName$")]
    #[case(Target::object_list("shaders", shader_list()), "shaders")]
    #[case(
        Target::object_list("shaders", shader_list()).with_config_dependent(true),
        "shaders-$Platform$-$BuildConfigName$"
    )]
    fn emission_names(#[case] target: Target, #[case] expected: &str) {
        assert_eq!(target.emission_name(), expected);
    }

    #[rstest]
    fn capabilities_follow_kind() {
        let header = Target::header_only_library("h", CompileSettings::new("h"));
        assert!(!header.emits_function());
        assert!(!header.is_linkable());
        assert!(!header.is_config_dependent());

        let list = Target::object_list("o", ObjectList::default());
        assert!(list.emits_function());
        assert!(list.is_linkable());
        assert!(list.compile_settings().is_some());

        let shaders = Target::object_list("shaders", shader_list());
        assert!(shaders.emits_function());
        assert!(!shaders.is_config_dependent());
        assert!(!shaders.is_linkable());

        let alias = Target::alias("a", ["o"]);
        assert!(alias.compile_settings().is_none());
        assert_eq!(alias.deps(), ["o".to_owned()]);
    }

    #[rstest]
    fn archived_object_list_uses_library_keyword() {
        let list = ObjectList {
            archive: true,
            ..ObjectList::default()
        };
        assert_eq!(TargetKind::ObjectList(list).keyword(), "Library");
    }
}
