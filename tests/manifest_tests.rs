//! Tests for loading YAML manifests into projects.

use bffgen::ast::{StringOrList, TargetDef};
use bffgen::graph::GraphError;
use bffgen::manifest::{self, ManifestError};
use bffgen::project::{Platform, ProjectError};
use bffgen::target::{Subsystem, TargetKind};
use camino::Utf8PathBuf;
use rstest::rstest;

fn fixture(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures")).join(name)
}

#[rstest]
fn parses_flock3d_manifest() {
    let manifest = manifest::from_path(fixture("flock3d.yml")).expect("parse");
    assert_eq!(manifest.name, "flock3d");
    assert_eq!(manifest.platform, Platform::Windows);
    assert_eq!(
        manifest.configs,
        StringOrList::List(vec!["Debug".into(), "Release".into()])
    );
    assert_eq!(manifest.compilers.len(), 1);
    assert!(
        manifest
            .targets
            .iter()
            .any(|t| matches!(t, TargetDef::Alias(alias) if alias.name == "tests"))
    );
}

#[rstest]
fn flock3d_project_registers_every_target() {
    let project = manifest::load_project(fixture("flock3d.yml"), None).expect("load");
    assert_eq!(project.configs(), ["Debug", "Release"]);
    assert_eq!(project.targets().len(), 16);

    let Some(TargetKind::Executable(exe)) = project.target("test_ecs_exe").map(|t| t.kind())
    else {
        panic!("test_ecs_exe should be an executable");
    };
    assert_eq!(exe.dest, "_bin/$BuildConfigName$/test_ecs_exe.exe");
    assert_eq!(exe.subsystem, Subsystem::Console);
    assert_eq!(exe.extra_libs, ["kernel32.lib"]);

    let shaders = project.target("glsl_shaders").expect("shaders");
    assert!(!shaders.is_config_dependent());
    assert_eq!(
        project.target("tests").map(|t| t.deps().to_vec()),
        Some(vec!["test_ecs_exe".to_owned()])
    );
}

#[rstest]
fn flock3d_descriptor_links_and_propagates() {
    let project = manifest::load_project(fixture("flock3d.yml"), None).expect("load");
    let bff = project.generate().expect("generate");

    assert!(bff.contains(".engine_DefineFlag = ' $fmt_PublicDefineFlag$ $nanothread_PublicDefineFlag$ $physfs_PublicDefineFlag$ $sdl_PublicDefineFlag$ $volk_PublicDefineFlag$ $vulkan_PublicDefineFlag$'\n"), "{bff}");
    assert!(bff.contains(".nanothread_PublicIncludePathFlag = ' \"-I$nanothread_BasePath$/include\"'\n"));
    assert!(bff.contains(
        "\t\t.Targets = {'flock3d_exe-$Platform$-$BuildConfigName$', 'copy_sdl2_dll-$Platform$-$BuildConfigName$', 'glsl_shaders'}\n"
    ));
    assert!(bff.contains("\t\t.LinkerOptions + ' /subsystem:console $CRTLibs_Static$ $CppRTLibs_Static$ kernel32.lib'\n"));
}

#[rstest]
fn platform_override_wins_over_manifest() {
    let project =
        manifest::load_project(fixture("minimal.yml"), Some(Platform::Macos)).expect("load");
    assert_eq!(project.platform(), Platform::Macos);
    assert_eq!(project.configs(), ["Debug"]);
}

#[rstest]
fn unknown_target_kind_fails_to_parse() {
    let err = manifest::from_path(fixture("unknown_kind.yml")).expect_err("unknown kind");
    assert!(matches!(err, ManifestError::Parse { .. }), "{err}");
}

#[rstest]
#[case("name: x\n")]
#[case("bffgen_version: \"1.0.0\"\nname: x\ntargets:\n  - kind: alias\n    name: a\n    deps: b\n    colour: red\n")]
#[case("bffgen_version: \"1.0.0\"\nname: x\nflavour: spicy\n")]
fn schema_violations_are_parse_errors(#[case] yaml: &str) {
    let err = manifest::from_str(yaml).expect_err("schema");
    assert!(matches!(err, ManifestError::Parse { .. }), "{err}");
}

#[rstest]
fn yaml_syntax_errors_are_parse_errors() {
    let err = manifest::from_str("bffgen_version: [1.0.0\n").expect_err("syntax");
    assert!(matches!(err, ManifestError::Parse { .. }), "{err}");
}

#[rstest]
fn missing_file_is_a_read_error() {
    let err = manifest::from_path(fixture("does_not_exist.yml")).expect_err("missing");
    assert!(matches!(err, ManifestError::Read { .. }), "{err}");
}

#[rstest]
fn cycle_surfaces_at_generation() {
    let project = manifest::load_project(fixture("cycle.yml"), None).expect("load");
    let err = project.generate().expect_err("cycle");
    assert!(
        matches!(
            err,
            ProjectError::Graph(GraphError::CyclicDependency { ref cycle }) if cycle == &["a", "b", "a"]
        ),
        "{err}"
    );
}

#[rstest]
fn registration_errors_pass_through_unchanged() {
    let yaml = concat!(
        "bffgen_version: \"1.0.0\"\n",
        "name: dup\n",
        "targets:\n",
        "  - { kind: copy, name: c, source: a, dest: b }\n",
        "  - { kind: copy, name: c, source: x, dest: y }\n",
    );
    let parsed = manifest::from_str(yaml).expect("parse");
    let err = manifest::to_project(parsed, None).expect_err("duplicate");
    assert!(
        matches!(err, ManifestError::Project(ProjectError::DuplicateTarget { ref name }) if name == "c"),
        "{err}"
    );
}

#[rstest]
fn config_agnostic_default_compiler_list_is_rejected() {
    let yaml = concat!(
        "bffgen_version: \"1.0.0\"\n",
        "name: p\n",
        "targets:\n",
        "  - { kind: object_list, name: o, base_path: src, source_files: main.cpp, config_dependent: false }\n",
    );
    let parsed = manifest::from_str(yaml).expect("parse");
    let err = manifest::to_project(parsed, None).expect_err("agnostic object list");
    assert!(
        matches!(err, ManifestError::Project(ProjectError::InvalidTarget { ref name, .. }) if name == "o"),
        "{err}"
    );
}

#[rstest]
fn config_dependent_custom_compiler_list_is_suffixed() {
    let yaml = concat!(
        "bffgen_version: \"1.0.0\"\n",
        "name: p\n",
        "compilers:\n",
        "  - { name: glslc, executable: glslc.exe, family: custom }\n",
        "targets:\n",
        "  - kind: object_list\n",
        "    name: shaders\n",
        "    base_path: src/shaders\n",
        "    compiler: glslc\n",
        "    source_path: .\n",
        "    config_dependent: true\n",
    );
    let project = manifest::to_project(manifest::from_str(yaml).expect("parse"), None)
        .expect("project");
    let shaders = project.target("shaders").expect("shaders");
    assert!(shaders.is_config_dependent());
    assert_eq!(shaders.emission_name(), "shaders-$Platform$-$BuildConfigName$");
}
