//! Manifest loading helpers.
//!
//! A manifest is parsed in two steps. The YAML is first read into a generic
//! JSON value so syntax errors keep their source location, then that value is
//! deserialised into [`ProjectManifest`], which rejects unknown fields and
//! unknown target kinds. [`to_project`] registers compilers and then targets
//! on a fresh [`Project`], so registration errors surface unchanged.

mod diagnostics;

use camino::Utf8Path;
use semver::Version;
use std::fs;
use tracing::debug;

use crate::ast::{ProjectManifest, TargetDef};
use crate::project::{Platform, Project, default_executable_dest};
use crate::target::{
    CompileSettings, Executable, ObjectList, ObjectOutput, Sources, Target,
};

pub use diagnostics::{ManifestError, map_data_error, map_yaml_error};

/// Manifest file looked up when none is named.
pub const DEFAULT_MANIFEST: &str = "bffgen.yml";

/// Major manifest format version understood by this build.
pub const SUPPORTED_MAJOR: u64 = 1;

fn from_str_named(yaml: &str, name: &str) -> Result<ProjectManifest, ManifestError> {
    let doc: serde_json::Value = serde_saphyr::from_str(yaml).map_err(|e| ManifestError::Parse {
        source: map_yaml_error(e, yaml, name),
    })?;
    let manifest: ProjectManifest =
        serde_json::from_value(doc).map_err(|e| ManifestError::Parse {
            source: map_data_error(e, name),
        })?;
    check_version(&manifest.bffgen_version)?;
    Ok(manifest)
}

fn check_version(version: &Version) -> Result<(), ManifestError> {
    if version.major == SUPPORTED_MAJOR {
        Ok(())
    } else {
        Err(ManifestError::UnsupportedVersion {
            version: version.clone(),
        })
    }
}

/// Parse a manifest from a YAML string.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] for malformed YAML or schema mismatches
/// and [`ManifestError::UnsupportedVersion`] for a foreign format version.
pub fn from_str(yaml: &str) -> Result<ProjectManifest, ManifestError> {
    from_str_named(yaml, DEFAULT_MANIFEST)
}

/// Load a [`ProjectManifest`] from the given file path.
///
/// # Errors
///
/// Returns [`ManifestError::Read`] if the file cannot be read, otherwise as
/// [`from_str`].
pub fn from_path(path: impl AsRef<Utf8Path>) -> Result<ProjectManifest, ManifestError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_str_named(&data, path.as_str())
}

/// Build a [`Project`] from a parsed manifest.
///
/// `platform` overrides the platform declared in the manifest.
///
/// # Errors
///
/// Returns [`ManifestError::Project`] when a compiler or target is rejected
/// by the registry.
pub fn to_project(
    manifest: ProjectManifest,
    platform: Option<Platform>,
) -> Result<Project, ManifestError> {
    let platform = platform.unwrap_or(manifest.platform);
    let mut project =
        Project::new(manifest.name, platform).with_configs(manifest.configs.into_vec());
    if let Some(prelude) = manifest.prelude {
        project = project.with_prelude(prelude);
    }
    for compiler in manifest.compilers {
        project.add_compiler(compiler)?;
    }
    for def in manifest.targets {
        project.add_target(target_from_def(def, platform))?;
    }
    debug!(
        project = %project.name(),
        platform = %platform,
        targets = project.targets().len(),
        compilers = project.compilers().len(),
        "loaded manifest"
    );
    Ok(project)
}

/// Read the manifest at `path` and build its [`Project`].
///
/// # Errors
///
/// Returns any error from [`from_path`] or [`to_project`].
pub fn load_project(
    path: impl AsRef<Utf8Path>,
    platform: Option<Platform>,
) -> Result<Project, ManifestError> {
    to_project(from_path(path)?, platform)
}

fn override_config(target: Target, config_dependent: Option<bool>) -> Target {
    let default = target.is_config_dependent();
    target.with_config_dependent(config_dependent.unwrap_or(default))
}

fn target_from_def(def: TargetDef, platform: Platform) -> Target {
    match def {
        TargetDef::HeaderOnlyLibrary(def) => Target::header_only_library(
            def.name,
            CompileSettings::new(def.base_path)
                .with_pub_defines(def.pub_defines.into_vec())
                .with_pub_includes(def.pub_includes.into_vec())
                .with_priv_defines(def.priv_defines.into_vec())
                .with_priv_includes(def.priv_includes.into_vec()),
        )
        .with_deps(def.deps.into_vec()),
        TargetDef::ExternalLibrary(def) => Target::external_library(
            def.name,
            CompileSettings::new(def.base_path)
                .with_pub_defines(def.pub_defines.into_vec())
                .with_pub_includes(def.pub_includes.into_vec())
                .with_priv_defines(def.priv_defines.into_vec())
                .with_priv_includes(def.priv_includes.into_vec()),
            def.libs.into_vec(),
        )
        .with_deps(def.deps.into_vec()),
        TargetDef::ObjectList(def) => {
            let list = ObjectList {
                compile: CompileSettings::new(def.base_path)
                    .with_pub_defines(def.pub_defines.into_vec())
                    .with_pub_includes(def.pub_includes.into_vec())
                    .with_priv_defines(def.priv_defines.into_vec())
                    .with_priv_includes(def.priv_includes.into_vec()),
                sources: Sources {
                    files: def.source_files.into_vec(),
                    paths: def.source_path.into_vec(),
                    patterns: def.source_patterns.into_vec(),
                    recurse: def.source_path_recurse,
                },
                compiler: def.compiler,
                compile_as_c: def.compile_as_c,
                compiler_options: def.compiler_options,
                output: ObjectOutput {
                    path: def.dest_path,
                    extension: def.dest_extension,
                    keep_base_extension: def.dest_keep_base_extension,
                },
                archive: def.use_archive,
            };
            override_config(
                Target::object_list(def.name, list).with_deps(def.deps.into_vec()),
                def.config_dependent,
            )
        }
        TargetDef::Executable(def) => {
            let dest = def
                .dest
                .unwrap_or_else(|| default_executable_dest(platform, &def.name));
            let exe = Executable {
                dest,
                subsystem: def.subsystem,
                extra_libs: def.extra_libs.into_vec(),
            };
            Target::executable(def.name, exe).with_deps(def.deps.into_vec())
        }
        TargetDef::Copy(def) => override_config(
            Target::copy(def.name, def.source, def.dest).with_deps(def.deps.into_vec()),
            def.config_dependent,
        ),
        TargetDef::Alias(def) => override_config(
            Target::alias(def.name, def.deps.into_vec()),
            def.config_dependent,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetKind;
    use rstest::rstest;

    const HEADER: &str = "bffgen_version: \"1.0.0\"\nname: demo\n";

    #[rstest]
    #[case("2.0.0")]
    #[case("0.9.0")]
    fn rejects_foreign_major_versions(#[case] version: &str) {
        let yaml = format!("bffgen_version: \"{version}\"\nname: demo\n");
        let err = from_str(&yaml).expect_err("version");
        assert!(matches!(err, ManifestError::UnsupportedVersion { .. }), "{err}");
    }

    #[rstest]
    fn executable_destination_defaults_per_platform() {
        let yaml = format!("{HEADER}targets:\n  - kind: executable\n    name: app\n");
        let manifest = from_str(&yaml).expect("parse");
        let project = to_project(manifest, Some(Platform::Linux)).expect("project");
        let Some(TargetKind::Executable(exe)) = project.target("app").map(Target::kind) else {
            panic!("app should be an executable");
        };
        assert_eq!(exe.dest, "_bin/$BuildConfigName$/app");
    }

    #[rstest]
    fn config_dependence_can_be_overridden() {
        let yaml = format!(
            "{HEADER}targets:\n  - kind: copy\n    name: dll\n    source: a.dll\n    dest: b.dll\n    config_dependent: false\n"
        );
        let project = to_project(from_str(&yaml).expect("parse"), None).expect("project");
        let dll = project.target("dll").expect("dll");
        assert!(!dll.is_config_dependent());
        assert_eq!(dll.emission_name(), "dll");
    }
}
