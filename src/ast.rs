//! Project manifest schema.
//!
//! This module defines the data structures a `bffgen.yml` manifest
//! deserialises into. They mirror the YAML one to one; conversion into a
//! [`crate::project::Project`] lives in [`crate::manifest`].
//!
//! ```rust
//! use bffgen::ast::TargetDef;
//!
//! let yaml = "bffgen_version: \"1.0.0\"\nname: demo\ntargets:\n  - kind: alias\n    name: all\n    deps: [app]\n";
//! let manifest = bffgen::manifest::from_str(yaml).expect("parse");
//! assert_eq!(manifest.name, "demo");
//! assert!(matches!(manifest.targets[0], TargetDef::Alias(_)));
//! ```

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::compiler::Compiler;
use crate::project::Platform;
use crate::target::Subsystem;

/// Top-level manifest structure parsed from `bffgen.yml`.
///
/// ```yaml
/// bffgen_version: "1.0.0"
/// name: flock3d
/// configs: [Debug, Release]
/// targets:
///   - kind: header_only_library
///     name: doctest
///     base_path: deps/doctest
///     includes: .
/// ```
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    /// Semantic version of the manifest format.
    pub bffgen_version: Version,

    /// Project name, used in diagnostics.
    pub name: String,

    /// Platform the descriptor targets.
    #[serde(default)]
    pub platform: Platform,

    /// Replacement for the default prelude include.
    #[serde(default)]
    pub prelude: Option<String>,

    /// Declared build configurations.
    #[serde(default)]
    pub configs: StringOrList,

    /// Custom compilers available to object lists.
    #[serde(default)]
    pub compilers: Vec<Compiler>,

    /// Build targets in registration order.
    #[serde(default)]
    pub targets: Vec<TargetDef>,
}

/// One manifest target, discriminated by its `kind` key.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetDef {
    /// Flags-only library.
    HeaderOnlyLibrary(HeaderOnlyLibraryDef),
    /// Prebuilt library on disk.
    ExternalLibrary(ExternalLibraryDef),
    /// Compiled sources.
    ObjectList(ObjectListDef),
    /// Linked binary.
    Executable(ExecutableDef),
    /// File copy.
    Copy(CopyDef),
    /// Named group of targets.
    Alias(AliasDef),
}

impl TargetDef {
    /// Name declared by the target.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::HeaderOnlyLibrary(def) => &def.name,
            Self::ExternalLibrary(def) => &def.name,
            Self::ObjectList(def) => &def.name,
            Self::Executable(def) => &def.name,
            Self::Copy(def) => &def.name,
            Self::Alias(def) => &def.name,
        }
    }
}

/// A header-only library.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderOnlyLibraryDef {
    /// Target name.
    pub name: String,
    /// Direct dependencies.
    #[serde(default)]
    pub deps: StringOrList,
    /// Root for include paths.
    pub base_path: String,
    /// Defines exported to dependents.
    #[serde(default, alias = "defines")]
    pub pub_defines: StringOrList,
    /// Include directories exported to dependents.
    #[serde(default, alias = "includes")]
    pub pub_includes: StringOrList,
    /// Defines kept to this target.
    #[serde(default)]
    pub priv_defines: StringOrList,
    /// Include directories kept to this target.
    #[serde(default)]
    pub priv_includes: StringOrList,
}

/// A prebuilt library.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalLibraryDef {
    /// Target name.
    pub name: String,
    /// Direct dependencies.
    #[serde(default)]
    pub deps: StringOrList,
    /// Root for include paths and library files.
    pub base_path: String,
    /// Library files relative to `base_path`.
    #[serde(default)]
    pub libs: StringOrList,
    /// Defines exported to dependents.
    #[serde(default, alias = "defines")]
    pub pub_defines: StringOrList,
    /// Include directories exported to dependents.
    #[serde(default, alias = "includes")]
    pub pub_includes: StringOrList,
    /// Defines kept to this target.
    #[serde(default)]
    pub priv_defines: StringOrList,
    /// Include directories kept to this target.
    #[serde(default)]
    pub priv_includes: StringOrList,
}

const fn default_true() -> bool {
    true
}

/// A set of sources compiled into objects.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectListDef {
    /// Target name.
    pub name: String,
    /// Direct dependencies.
    #[serde(default)]
    pub deps: StringOrList,
    /// Root for sources and include paths.
    pub base_path: String,
    /// Defines exported to dependents.
    #[serde(default, alias = "defines")]
    pub pub_defines: StringOrList,
    /// Include directories exported to dependents.
    #[serde(default, alias = "includes")]
    pub pub_includes: StringOrList,
    /// Defines kept to this target.
    #[serde(default)]
    pub priv_defines: StringOrList,
    /// Include directories kept to this target.
    #[serde(default)]
    pub priv_includes: StringOrList,
    /// Individual sources relative to `base_path`.
    #[serde(default)]
    pub source_files: StringOrList,
    /// Directories scanned for sources, relative to `base_path`.
    #[serde(default)]
    pub source_path: StringOrList,
    /// Patterns applied while scanning `source_path`.
    #[serde(default)]
    pub source_patterns: StringOrList,
    /// Whether scanning descends into subdirectories.
    #[serde(default = "default_true")]
    pub source_path_recurse: bool,
    /// Object output directory.
    #[serde(default)]
    pub dest_path: Option<String>,
    /// Object file extension.
    #[serde(default)]
    pub dest_extension: Option<String>,
    /// Keep the source extension in object names.
    #[serde(default)]
    pub dest_keep_base_extension: bool,
    /// Compile sources as C.
    #[serde(default)]
    pub compile_as_c: bool,
    /// Custom compiler name.
    #[serde(default)]
    pub compiler: Option<String>,
    /// Extra compiler options.
    #[serde(default)]
    pub compiler_options: Option<String>,
    /// Archive the objects into a static library.
    #[serde(default)]
    pub use_archive: bool,
    /// Override configuration dependence.
    #[serde(default)]
    pub config_dependent: Option<bool>,
}

/// A linked binary.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutableDef {
    /// Target name.
    pub name: String,
    /// Direct dependencies.
    #[serde(default)]
    pub deps: StringOrList,
    /// Binary destination; defaults under `_bin/$BuildConfigName$`.
    #[serde(default)]
    pub dest: Option<String>,
    /// Linker subsystem.
    #[serde(default)]
    pub subsystem: Subsystem,
    /// Extra system libraries.
    #[serde(default)]
    pub extra_libs: StringOrList,
}

/// A file copy.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CopyDef {
    /// Target name.
    pub name: String,
    /// Direct dependencies.
    #[serde(default)]
    pub deps: StringOrList,
    /// File to copy.
    pub source: String,
    /// Destination file.
    pub dest: String,
    /// Override configuration dependence.
    #[serde(default)]
    pub config_dependent: Option<bool>,
}

/// A named group of targets.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AliasDef {
    /// Target name.
    pub name: String,
    /// Grouped targets.
    #[serde(default, alias = "targets")]
    pub deps: StringOrList,
    /// Override configuration dependence.
    #[serde(default)]
    pub config_dependent: Option<bool>,
}

/// A helper for fields that accept either a single string or a list of
/// strings.
///
/// ```yaml
/// # Scalar
/// includes: include
/// # Sequence
/// includes:
///   - include
///   - src
/// ```
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum StringOrList {
    /// No value provided.
    #[default]
    Empty,
    /// A single string item.
    String(String),
    /// A list of string items.
    List(Vec<String>),
}

impl StringOrList {
    /// Flatten into a list, keeping declaration order.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Empty => Vec::new(),
            Self::String(item) => vec![item],
            Self::List(items) => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StringOrList::Empty, &[])]
    #[case(StringOrList::String("a".into()), &["a"])]
    #[case(StringOrList::List(vec!["a".into(), "b".into()]), &["a", "b"])]
    fn flattens_string_or_list(#[case] value: StringOrList, #[case] expected: &[&str]) {
        assert_eq!(value.into_vec(), expected);
    }
}
