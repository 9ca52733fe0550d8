//! Tests for compile flag propagation across dependency edges.

use bffgen::flags::FlagPropagator;
use bffgen::graph::resolve;
use bffgen::target::{CompileSettings, ObjectList, Sources, Target};
use indexmap::IndexMap;
use rstest::{fixture, rstest};

fn objects(name: &str, compile: CompileSettings) -> Target {
    Target::object_list(
        name,
        ObjectList {
            compile,
            sources: Sources {
                files: vec![format!("{name}.cpp")],
                ..Sources::default()
            },
            ..ObjectList::default()
        },
    )
}

/// `a -> b -> c`, where `c` declares a public `Y` and a private `Z`.
#[fixture]
fn chain() -> IndexMap<String, Target> {
    [
        objects(
            "c",
            CompileSettings::new("c")
                .with_pub_defines(["Y"])
                .with_priv_defines(["Z"])
                .with_pub_includes(["include"])
                .with_priv_includes(["src"]),
        ),
        objects("b", CompileSettings::new("b").with_pub_defines(["X"])).with_deps(["c"]),
        objects("a", CompileSettings::new("a")).with_deps(["b"]),
    ]
    .into_iter()
    .map(|t| (t.name().to_owned(), t))
    .collect()
}

#[rstest]
fn public_defines_propagate_transitively(chain: IndexMap<String, Target>) {
    let resolution = resolve(&chain).expect("resolve");
    let flags = FlagPropagator::new(&chain, &resolution);
    assert_eq!(flags.resolved_defines("a"), ["-DX", "-DY"]);
}

#[rstest]
fn private_flags_stay_with_their_target(chain: IndexMap<String, Target>) {
    let resolution = resolve(&chain).expect("resolve");
    let flags = FlagPropagator::new(&chain, &resolution);

    assert_eq!(flags.resolved_defines("c"), ["-DZ", "-DY"]);
    assert!(!flags.resolved_defines("b").contains(&"-DZ".to_owned()));
    assert!(!flags.resolved_defines("a").contains(&"-DZ".to_owned()));
    assert_eq!(flags.resolved_includes("a"), ["-Ic/include"]);
}

#[rstest]
fn descriptor_flags_reference_public_variables(chain: IndexMap<String, Target>) {
    let resolution = resolve(&chain).expect("resolve");
    let propagator = FlagPropagator::new(&chain, &resolution);
    let a = chain.get("a").expect("a");
    let flags = propagator.flags(a).expect("compile target");

    assert_eq!(flags.defines, " $b_PublicDefineFlag$ $c_PublicDefineFlag$");
    assert_eq!(
        flags.includes,
        " $b_PublicIncludePathFlag$ $c_PublicIncludePathFlag$"
    );

    let c = chain.get("c").expect("c");
    let c_flags = propagator.flags(c).expect("compile target");
    assert_eq!(c_flags.public_defines, " \"-DY\"");
    assert_eq!(c_flags.defines, " \"-DZ\" \"-DY\"");
    assert_eq!(c_flags.public_includes, " \"-I$c_BasePath$/include\"");
    assert_eq!(
        c_flags.includes,
        " \"-I$c_BasePath$/src\" \"-I$c_BasePath$/include\""
    );
}

#[rstest]
fn inherited_flags_skip_targets_without_compile_settings() {
    let targets: IndexMap<String, Target> = [
        Target::header_only_library("lib", CompileSettings::new("lib").with_pub_defines(["LIB"])),
        Target::copy("data", "data.bin", "out/data.bin").with_deps(["lib"]),
        objects("app", CompileSettings::new("app")).with_deps(["data"]),
    ]
    .into_iter()
    .map(|t| (t.name().to_owned(), t))
    .collect();
    let resolution = resolve(&targets).expect("resolve");
    let flags = FlagPropagator::new(&targets, &resolution);
    assert_eq!(flags.resolved_defines("app"), ["-DLIB"]);
}
