//! Compiler flag propagation along dependency edges.
//!
//! Each compile-capable target renders its own defines and includes once and
//! exports the public subset in dedicated variables. Dependents reference
//! those variables instead of re-expanding them, so the descriptor grows with
//! the number of closure entries rather than the number of paths through a
//! diamond.
//!
//! Private flags never leave the target that declares them.

use indexmap::IndexMap;

use crate::graph::Resolution;
use crate::target::{CompileSettings, Target};

/// Descriptor-ready flag strings for one compile-capable target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFlags {
    /// Value of the base-path variable.
    pub base_path: String,
    /// Public define flags exported to dependents.
    pub public_defines: String,
    /// Public include flags exported to dependents.
    pub public_includes: String,
    /// Own define flags followed by references to inherited public ones.
    pub defines: String,
    /// Own include flags followed by references to inherited public ones.
    pub includes: String,
}

/// Computes flags for targets of a resolved graph.
pub struct FlagPropagator<'a> {
    targets: &'a IndexMap<String, Target>,
    resolution: &'a Resolution,
}

fn define_token(define: &str) -> String {
    format!(" \"-D{define}\"")
}

fn include_token(target: &Target, dir: &str) -> String {
    format!(" \"-I${}$/{dir}\"", target.base_path_var())
}

fn own<'s>(public: &'s [String], private: &'s [String]) -> impl Iterator<Item = &'s String> {
    private.iter().chain(public)
}

impl<'a> FlagPropagator<'a> {
    /// Bind the propagator to a registry and its resolution.
    #[must_use]
    pub const fn new(targets: &'a IndexMap<String, Target>, resolution: &'a Resolution) -> Self {
        Self {
            targets,
            resolution,
        }
    }

    /// Compile-capable members of `name`'s closure, in name order.
    fn compile_deps(&self, name: &str) -> impl Iterator<Item = (&'a Target, &'a CompileSettings)> {
        let targets = self.targets;
        self.resolution
            .all_deps(name)
            .iter()
            .filter_map(move |dep| targets.get(dep))
            .filter_map(|dep| dep.compile_settings().map(|settings| (dep, settings)))
    }

    /// Flag strings for `target`, or `None` when it does not compile.
    #[must_use]
    pub fn flags(&self, target: &Target) -> Option<CompileFlags> {
        let settings = target.compile_settings()?;

        let public_defines: String = settings.pub_defines.iter().map(|d| define_token(d)).collect();
        let public_includes: String = settings
            .pub_includes
            .iter()
            .map(|dir| include_token(target, dir))
            .collect();

        let mut defines: String = own(&settings.pub_defines, &settings.priv_defines)
            .map(|d| define_token(d))
            .collect();
        let mut includes: String = own(&settings.pub_includes, &settings.priv_includes)
            .map(|dir| include_token(target, dir))
            .collect();
        for (dep, _) in self.compile_deps(target.name()) {
            defines.push_str(&format!(" ${}$", dep.public_define_flag_var()));
            includes.push_str(&format!(" ${}$", dep.public_include_flag_var()));
        }

        Some(CompileFlags {
            base_path: settings.base_path.clone(),
            public_defines,
            public_includes,
            defines,
            includes,
        })
    }

    /// Fully expanded define flags seen when compiling `name`.
    ///
    /// Own defines come first (private, then public), followed by the public
    /// defines of each compile-capable dependency in name order.
    #[must_use]
    pub fn resolved_defines(&self, name: &str) -> Vec<String> {
        let Some(settings) = self.targets.get(name).and_then(Target::compile_settings) else {
            return Vec::new();
        };
        own(&settings.pub_defines, &settings.priv_defines)
            .cloned()
            .chain(
                self.compile_deps(name)
                    .flat_map(|(_, dep)| dep.pub_defines.iter().cloned()),
            )
            .map(|d| format!("-D{d}"))
            .collect()
    }

    /// Fully expanded include flags seen when compiling `name`.
    ///
    /// Paths are joined onto the declaring target's base path.
    #[must_use]
    pub fn resolved_includes(&self, name: &str) -> Vec<String> {
        let Some(settings) = self.targets.get(name).and_then(Target::compile_settings) else {
            return Vec::new();
        };
        let expand = |base: &str, dir: &str| format!("-I{base}/{dir}");
        own(&settings.pub_includes, &settings.priv_includes)
            .map(|dir| expand(&settings.base_path, dir))
            .chain(self.compile_deps(name).flat_map(|(_, dep)| {
                dep.pub_includes
                    .iter()
                    .map(move |dir| expand(&dep.base_path, dir))
            }))
            .collect()
    }
}
