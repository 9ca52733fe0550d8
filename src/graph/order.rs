//! Depth-first topological ordering with explicit cycle detection.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::target::Target;

/// Tracks the visitation state of a node during traversal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Order `targets` leaves first, starting from each target in registration
/// order.
///
/// Returns the offending chain, canonicalised, when a cycle is found. Every
/// dependency must already be known to exist in `targets`.
pub(super) fn topological_order(
    targets: &IndexMap<String, Target>,
) -> Result<Vec<String>, Vec<String>> {
    let mut traversal = Traversal::new(targets);
    for name in targets.keys() {
        if let Some(cycle) = traversal.visit(name) {
            return Err(cycle);
        }
    }
    Ok(traversal.order.into_iter().map(str::to_owned).collect())
}

/// What stepping onto a node requires of the traversal.
enum Step {
    Skip,
    Descend,
    Cycle(Vec<String>),
}

struct Traversal<'a> {
    targets: &'a IndexMap<String, Target>,
    stack: Vec<&'a str>,
    states: HashMap<&'a str, VisitState>,
    order: Vec<&'a str>,
}

impl<'a> Traversal<'a> {
    fn new(targets: &'a IndexMap<String, Target>) -> Self {
        Self {
            targets,
            stack: Vec::new(),
            states: HashMap::with_capacity(targets.len()),
            order: Vec::with_capacity(targets.len()),
        }
    }

    /// Walk everything reachable from `root` with an explicit stack.
    fn visit(&mut self, root: &'a str) -> Option<Vec<String>> {
        let mut cursors: Vec<usize> = Vec::new();
        match self.enter(root) {
            Step::Skip => return None,
            Step::Cycle(cycle) => return Some(cycle),
            Step::Descend => cursors.push(0),
        }

        let targets = self.targets;
        while let (Some(&node), Some(cursor)) = (self.stack.last(), cursors.last_mut()) {
            let deps = targets.get(node).map_or(&[][..], Target::deps);
            if let Some(dep) = deps.get(*cursor) {
                *cursor += 1;
                match self.enter(dep) {
                    Step::Skip => {}
                    Step::Cycle(cycle) => return Some(cycle),
                    Step::Descend => cursors.push(0),
                }
            } else {
                cursors.pop();
                self.stack.pop();
                self.states.insert(node, VisitState::Visited);
                self.order.push(node);
            }
        }
        None
    }

    fn enter(&mut self, node: &'a str) -> Step {
        match self.states.get(node) {
            Some(VisitState::Visited) => Step::Skip,
            Some(VisitState::Visiting) => Step::Cycle(self.cycle_through(node)),
            None => {
                self.states.insert(node, VisitState::Visiting);
                self.stack.push(node);
                Step::Descend
            }
        }
    }

    fn cycle_through(&self, node: &str) -> Vec<String> {
        let idx = self
            .stack
            .iter()
            .position(|n| *n == node)
            .unwrap_or_else(|| {
                debug_assert!(false, "visiting node must be on the stack");
                0
            });
        let mut cycle: Vec<String> = self
            .stack
            .iter()
            .skip(idx)
            .map(|n| (*n).to_owned())
            .collect();
        cycle.push(node.to_owned());
        canonicalize_cycle(cycle)
    }
}

/// Rotate a closed cycle so it starts at its smallest name.
fn canonicalize_cycle(mut cycle: Vec<String>) -> Vec<String> {
    if cycle.len() < 2 {
        return cycle;
    }
    let len = cycle.len() - 1;
    let start = cycle
        .iter()
        .take(len)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(idx, _)| idx);
    let (prefix, suffix) = cycle.split_at_mut(len);
    prefix.rotate_left(start);
    if let (Some(first), Some(slot)) = (prefix.first().cloned(), suffix.first_mut()) {
        slot.clone_from(&first);
    }
    cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;

    fn graph(edges: &[(&str, &[&str])]) -> IndexMap<String, Target> {
        edges
            .iter()
            .map(|(name, deps)| {
                let target = Target::alias(*name, deps.iter().copied());
                ((*name).to_owned(), target)
            })
            .collect()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn orders_leaves_first_in_registration_order() {
        let targets = graph(&[("exe", &["lib", "util"]), ("util", &[]), ("lib", &["util"])]);
        let order = topological_order(&targets).expect("order");
        assert_eq!(order, names(&["util", "lib", "exe"]));
    }

    #[test]
    fn detects_self_edge_cycle() {
        let targets = graph(&[("a", &["a"])]);
        let cycle = topological_order(&targets).expect_err("cycle");
        assert_eq!(cycle, names(&["a", "a"]));
    }

    #[test]
    fn detects_two_node_cycle() {
        let targets = graph(&[("b", &["a"]), ("a", &["b"])]);
        let cycle = topological_order(&targets).expect_err("cycle");
        assert_eq!(cycle, names(&["a", "b", "a"]));
    }

    #[test]
    fn traversal_leaves_stack_empty() {
        let targets = graph(&[("a", &["b"]), ("b", &[])]);
        let mut traversal = Traversal::new(&targets);
        assert!(traversal.visit("a").is_none());
        assert!(traversal.stack.is_empty());
        assert_eq!(traversal.states.get("b"), Some(&VisitState::Visited));
    }

    #[test]
    fn long_chains_do_not_exhaust_the_stack() {
        let depth = 100_000;
        let targets: IndexMap<String, Target> = (0..depth)
            .map(|i| {
                let name = format!("t{i}");
                let deps: Vec<String> = if i + 1 < depth {
                    vec![format!("t{}", i + 1)]
                } else {
                    Vec::new()
                };
                (name.clone(), Target::alias(name, deps))
            })
            .collect();
        let order = topological_order(&targets).expect("order");
        assert_eq!(order.len(), depth);
        assert_eq!(order.first().map(String::as_str), Some("t99999"));
        assert_eq!(order.last().map(String::as_str), Some("t0"));
    }

    #[test]
    fn cycle_reached_late_in_a_walk_is_canonical() {
        let targets = graph(&[("top", &["x"]), ("x", &["z"]), ("z", &["y"]), ("y", &["x"])]);
        let cycle = topological_order(&targets).expect_err("cycle");
        assert_eq!(cycle, names(&["x", "z", "y", "x"]));
    }

    #[test]
    fn canonicalize_cycle_rotates_smallest_node() {
        let canonical = canonicalize_cycle(names(&["c", "a", "b", "c"]));
        assert_eq!(canonical, names(&["a", "b", "c", "a"]));
    }

    #[test]
    fn canonicalize_cycle_handles_reverse_direction() {
        let canonical = canonicalize_cycle(names(&["c", "b", "a", "c"]));
        assert_eq!(canonical, names(&["a", "c", "b", "a"]));
    }
}
