//! Tests for dependency resolution over registered targets.

use bffgen::flags::FlagPropagator;
use bffgen::graph::{GraphError, resolve};
use bffgen::project::{Platform, Project, ProjectError};
use bffgen::target::{CompileSettings, Executable, ObjectList, Sources, Subsystem, Target};
use indexmap::IndexMap;
use rstest::rstest;

fn registry(targets: Vec<Target>) -> IndexMap<String, Target> {
    targets
        .into_iter()
        .map(|t| (t.name().to_owned(), t))
        .collect()
}

fn header(name: &str) -> Target {
    Target::header_only_library(name, CompileSettings::new(name))
}

fn position(order: &[String], name: &str) -> usize {
    order
        .iter()
        .position(|n| n == name)
        .unwrap_or_else(|| panic!("{name} missing from {order:?}"))
}

#[rstest]
fn every_target_follows_its_dependencies() {
    let targets = registry(vec![
        Target::alias("all", ["app", "tests"]),
        header("app").with_deps(["engine", "fmt"]),
        header("tests").with_deps(["fmt", "doctest"]),
        header("engine").with_deps(["fmt"]),
        header("fmt"),
        header("doctest"),
    ]);
    let resolution = resolve(&targets).expect("resolve");
    let order = resolution.order();

    assert_eq!(order.len(), targets.len());
    for target in targets.values() {
        for dep in target.deps() {
            assert!(
                position(order, dep) < position(order, target.name()),
                "{dep} must precede {}",
                target.name()
            );
        }
    }
}

#[rstest]
fn closures_are_transitive_and_exclude_self() {
    let targets = registry(vec![
        header("c"),
        header("b").with_deps(["c"]),
        header("a").with_deps(["b"]),
    ]);
    let resolution = resolve(&targets).expect("resolve");

    let all: Vec<&str> = resolution.all_deps("a").iter().map(String::as_str).collect();
    assert_eq!(all, ["b", "c"]);
    assert!(!resolution.all_deps("a").contains("a"));
    assert!(resolution.all_deps("c").is_empty());
}

#[rstest]
fn diamond_closure_lists_shared_dependency_once() {
    let targets = registry(vec![
        header("base"),
        header("left").with_deps(["base"]),
        header("right").with_deps(["base"]),
        header("top").with_deps(["right", "left"]),
    ]);
    let resolution = resolve(&targets).expect("resolve");
    let all: Vec<&str> = resolution
        .all_deps("top")
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(all, ["base", "left", "right"]);
}

#[rstest]
fn resolution_is_deterministic() {
    let build = || {
        registry(vec![
            Target::alias("all", ["x", "y"]),
            header("x").with_deps(["z"]),
            header("y").with_deps(["z"]),
            header("z"),
        ])
    };
    let first = resolve(&build()).expect("first");
    let second = resolve(&build()).expect("second");
    assert_eq!(first, second);
}

#[rstest]
#[case(vec![Target::alias("a", ["b"]), Target::alias("b", ["a"])], vec!["a", "b", "a"])]
#[case(vec![Target::alias("x", ["x"])], vec!["x", "x"])]
#[case(
    vec![
        Target::alias("c", ["a"]),
        Target::alias("a", ["b"]),
        Target::alias("b", ["c"]),
    ],
    vec!["a", "b", "c", "a"]
)]
fn cycles_are_reported_canonically(#[case] targets: Vec<Target>, #[case] expected: Vec<&str>) {
    let err = resolve(&registry(targets)).expect_err("cycle");
    assert_eq!(
        err,
        GraphError::CyclicDependency {
            cycle: expected.into_iter().map(str::to_owned).collect(),
        }
    );
}

#[rstest]
fn cycle_message_lists_the_chain() {
    let err = resolve(&registry(vec![
        Target::alias("a", ["b"]),
        Target::alias("b", ["a"]),
    ]))
    .expect_err("cycle");
    assert_eq!(err.to_string(), "circular dependency detected: a -> b -> a");
}

#[rstest]
fn unknown_dependency_is_reported() {
    let err = resolve(&registry(vec![Target::alias("all", ["missing"])])).expect_err("unknown");
    assert_eq!(
        err,
        GraphError::UnknownDependency {
            target: "all".into(),
            dependency: "missing".into(),
        }
    );
}

#[rstest]
fn project_surfaces_graph_errors() {
    let mut project = Project::new("p", Platform::Windows);
    project
        .add_targets([Target::alias("a", ["b"]), Target::alias("b", ["a"])])
        .expect("register");
    let err = project.generate().expect_err("cycle");
    assert!(
        matches!(err, ProjectError::Graph(GraphError::CyclicDependency { .. })),
        "{err}"
    );
}

#[rstest]
fn header_library_object_list_and_executable_resolve_end_to_end() {
    let targets = registry(vec![
        Target::header_only_library("liba", CompileSettings::new("liba").with_pub_defines(["FOO"])),
        Target::object_list(
            "objlist",
            ObjectList {
                compile: CompileSettings::new("src"),
                sources: Sources {
                    files: vec!["main.cpp".into()],
                    ..Sources::default()
                },
                ..ObjectList::default()
            },
        )
        .with_deps(["liba"]),
        Target::executable(
            "exe",
            Executable {
                dest: "_bin/exe".into(),
                subsystem: Subsystem::Console,
                extra_libs: Vec::new(),
            },
        )
        .with_deps(["objlist"]),
    ]);
    let resolution = resolve(&targets).expect("resolve");

    assert_eq!(resolution.order(), ["liba", "objlist", "exe"]);
    let objlist: Vec<&str> = resolution
        .all_deps("objlist")
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(objlist, ["liba"]);
    let exe: Vec<&str> = resolution.all_deps("exe").iter().map(String::as_str).collect();
    assert_eq!(exe, ["liba", "objlist"]);

    let flags = FlagPropagator::new(&targets, &resolution);
    assert!(flags.resolved_defines("objlist").contains(&"-DFOO".to_owned()));
}
