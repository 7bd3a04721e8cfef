// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Level assignment over the REQUIRES closure, per spec §4.1 step 4:
//! `level(f) = 1` if `requires(f)` is empty, else `1 + max(level(g) for g in
//! requires(f))`, memoized. Cycle detection uses the same three-color DFS
//! the teacher's `config::validation` applies to processor graphs
//! (unvisited/visiting/visited), generalized to return the actual cycle
//! path rather than a boolean, per §9's Tarjan/coloring requirement.

use std::collections::{HashMap, HashSet};

/// `function_name -> [required function names]`, the natural shape
/// returned by `KnowledgeGraphClient::required_functions`.
pub type RequiresMap = HashMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle(pub Vec<String>);

/// Detect a cycle in `requires`, returning the cycle path `F1 -> F2 -> ... -> F1`
/// if one exists.
pub fn detect_cycle(requires: &RequiresMap) -> Option<Cycle> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum State {
        Unvisited,
        Visiting,
        Visited,
    }

    let mut state: HashMap<&str, State> = requires.keys().map(|k| (k.as_str(), State::Unvisited)).collect();
    let mut path: Vec<String> = Vec::new();

    fn visit<'a>(
        node: &'a str,
        requires: &'a RequiresMap,
        state: &mut HashMap<&'a str, State>,
        path: &mut Vec<String>,
    ) -> Option<Cycle> {
        match state.get(node).copied().unwrap_or(State::Unvisited) {
            State::Visiting => {
                let start = path.iter().position(|v| v == node).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].to_vec();
                cycle.push(node.to_string());
                return Some(Cycle(cycle));
            }
            State::Visited => return None,
            State::Unvisited => {}
        }

        state.insert(node, State::Visiting);
        path.push(node.to_string());

        if let Some(deps) = requires.get(node) {
            for dep in deps {
                if let Some(cycle) = visit(dep.as_str(), requires, state, path) {
                    return Some(cycle);
                }
            }
        }

        path.pop();
        state.insert(node, State::Visited);
        None
    }

    for node in requires.keys() {
        if state.get(node.as_str()).copied() == Some(State::Unvisited) {
            if let Some(cycle) = visit(node.as_str(), requires, &mut state, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

/// Compute `level(f)` for every function reachable in `requires`, assuming
/// the graph is already known acyclic (call [`detect_cycle`] first).
/// Memoized recursive descent, mirroring
/// `original_source/workflow_generator.py`'s `topological_sort_util` but
/// computing levels directly instead of a stack order.
pub fn assign_levels(requires: &RequiresMap) -> HashMap<String, u32> {
    let mut levels: HashMap<String, u32> = HashMap::new();
    let mut in_progress: HashSet<String> = HashSet::new();

    fn level_of(
        node: &str,
        requires: &RequiresMap,
        levels: &mut HashMap<String, u32>,
        in_progress: &mut HashSet<String>,
    ) -> u32 {
        if let Some(&l) = levels.get(node) {
            return l;
        }
        // Callers that already ran `detect_cycle` over this same map never
        // hit this guard; it only protects a derived graph (e.g. the
        // tool-granularity graph collapsed from an acyclic function graph)
        // that could in principle reintroduce a cycle at the coarser
        // granularity.
        if in_progress.contains(node) {
            return 1;
        }
        in_progress.insert(node.to_string());
        let deps = requires.get(node).cloned().unwrap_or_default();
        let level = if deps.is_empty() {
            1
        } else {
            1 + deps
                .iter()
                .map(|dep| level_of(dep, requires, levels, in_progress))
                .max()
                .unwrap_or(0)
        };
        levels.insert(node.to_string(), level);
        in_progress.remove(node);
        level
    }

    for node in requires.keys() {
        level_of(node, requires, &mut levels, &mut in_progress);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_functions_are_level_one() {
        let mut requires = RequiresMap::new();
        requires.insert("Propagation".into(), vec![]);
        let levels = assign_levels(&requires);
        assert_eq!(levels["Propagation"], 1);
    }

    #[test]
    fn level_is_one_plus_max_of_required() {
        let mut requires = RequiresMap::new();
        requires.insert("Propagation".into(), vec![]);
        requires.insert("Access".into(), vec!["Propagation".into()]);
        requires.insert("InstrumentModel".into(), vec!["Access".into()]);
        let levels = assign_levels(&requires);
        assert_eq!(levels["Propagation"], 1);
        assert_eq!(levels["Access"], 2);
        assert_eq!(levels["InstrumentModel"], 3);
    }

    #[test]
    fn detects_a_three_node_cycle() {
        let mut requires = RequiresMap::new();
        requires.insert("A".into(), vec!["B".into()]);
        requires.insert("B".into(), vec!["C".into()]);
        requires.insert("C".into(), vec!["A".into()]);
        let cycle = detect_cycle(&requires).unwrap();
        assert!(cycle.0.contains(&"A".to_string()));
        assert!(cycle.0.contains(&"B".to_string()));
        assert!(cycle.0.contains(&"C".to_string()));
    }

    #[test]
    fn acyclic_graph_has_no_cycle() {
        let mut requires = RequiresMap::new();
        requires.insert("A".into(), vec!["B".into()]);
        requires.insert("B".into(), vec![]);
        assert!(detect_cycle(&requires).is_none());
    }
}
