//! Dependency resolution over the target registry.
//!
//! [`resolve`] is a pure function from the registered targets to a
//! [`Resolution`]: a leaves-first order and, for every target, the
//! transitive closure of its dependencies. Closures are kept in name order so
//! anything serialised from them is reproducible.
//!
//! # Examples
//!
//! ```
//! use bffgen::graph::resolve;
//! use bffgen::target::{CompileSettings, ObjectList, Target};
//! use indexmap::IndexMap;
//!
//! let mut targets = IndexMap::new();
//! for target in [
//!     Target::alias("all", ["objs"]),
//!     Target::object_list("objs", ObjectList::default()).with_deps(["headers"]),
//!     Target::header_only_library("headers", CompileSettings::new("include")),
//! ] {
//!     targets.insert(target.name().to_owned(), target);
//! }
//! let resolution = resolve(&targets).expect("acyclic");
//! assert_eq!(resolution.order(), ["headers", "objs", "all"]);
//! assert!(resolution.all_deps("all").contains("headers"));
//! ```

mod order;

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::target::Target;

/// Errors raised while resolving the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum GraphError {
    /// A dependency names a target that was never registered.
    #[error("target `{target}` depends on unknown target `{dependency}`")]
    #[diagnostic(
        code(bffgen::graph::unknown_dependency),
        help("register the missing target or remove it from the dependency list")
    )]
    UnknownDependency {
        /// Target declaring the dependency.
        target: String,
        /// Missing dependency name.
        dependency: String,
    },

    /// The dependency edges contain a cycle.
    #[error("circular dependency detected: {}", .cycle.join(" -> "))]
    #[diagnostic(
        code(bffgen::graph::cyclic_dependency),
        help("break the chain by removing one of the listed dependency edges")
    )]
    CyclicDependency {
        /// The cycle, starting and ending with the same target.
        cycle: Vec<String>,
    },
}

/// Outcome of dependency resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    order: Vec<String>,
    closures: HashMap<String, BTreeSet<String>>,
}

static EMPTY: BTreeSet<String> = BTreeSet::new();

impl Resolution {
    /// Target names ordered so every target follows all of its dependencies.
    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Transitive dependencies of `name`, excluding `name` itself.
    ///
    /// Unknown names yield an empty set.
    #[must_use]
    pub fn all_deps(&self, name: &str) -> &BTreeSet<String> {
        self.closures.get(name).unwrap_or(&EMPTY)
    }
}

/// Order `targets` and compute every dependency closure.
///
/// Traversal starts from each target in registration order, so ties in the
/// resulting order follow the order targets were added.
///
/// # Errors
///
/// Returns [`GraphError::UnknownDependency`] for a dangling dependency name
/// and [`GraphError::CyclicDependency`] when the graph is not a DAG.
pub fn resolve(targets: &IndexMap<String, Target>) -> Result<Resolution, GraphError> {
    check_dependencies(targets)?;
    let order = order::topological_order(targets)
        .map_err(|cycle| GraphError::CyclicDependency { cycle })?;

    let mut closures: HashMap<String, BTreeSet<String>> = HashMap::with_capacity(order.len());
    for name in &order {
        let mut all = BTreeSet::new();
        if let Some(target) = targets.get(name) {
            for dep in target.deps() {
                all.insert(dep.clone());
                if let Some(inherited) = closures.get(dep) {
                    all.extend(inherited.iter().cloned());
                }
            }
            debug!(
                name = %name,
                deps = ?sorted(target.deps()),
                all_deps = ?all,
                "resolved target"
            );
        }
        closures.insert(name.clone(), all);
    }

    Ok(Resolution { order, closures })
}

fn check_dependencies(targets: &IndexMap<String, Target>) -> Result<(), GraphError> {
    for target in targets.values() {
        if let Some(missing) = target.deps().iter().find(|dep| !targets.contains_key(*dep)) {
            return Err(GraphError::UnknownDependency {
                target: target.name().to_owned(),
                dependency: missing.clone(),
            });
        }
    }
    Ok(())
}

fn sorted(names: &[String]) -> Vec<&str> {
    let mut names: Vec<&str> = names.iter().map(String::as_str).collect();
    names.sort_unstable();
    names
}
