//! Dependency cycle detection
//!
//! Relative quantities form edges `usage identity → target identity`. A cycle
//! among them (`a` is 10% of `b`, `b` is 50% of `a`) is reported but never
//! corrected: masses stay as the linear pass computed them.

use indexmap::{IndexMap, IndexSet};
use std::collections::{BTreeSet, HashMap};

use crate::model::{ItemUsage, Section, Usage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    OnPath,
    Done,
}

/// Identities that take part in a dependency cycle
pub fn detect_cycles(sections: &[Section]) -> BTreeSet<String> {
    let mut graph: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    for section in sections {
        for usage in &section.ingredients {
            add_edges(&mut graph, usage);
        }
    }

    let mut state: HashMap<&str, NodeState> = HashMap::new();
    let mut cycles = BTreeSet::new();

    for &start in graph.keys() {
        if state.contains_key(start) {
            continue;
        }

        // Explicit DFS stack of (node, index of next dependency to visit)
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        state.insert(start, NodeState::OnPath);

        while let Some(&(node, next)) = stack.last() {
            let dependency = graph.get(node).and_then(|deps| deps.get_index(next)).copied();

            let Some(dependency) = dependency else {
                state.insert(node, NodeState::Done);
                stack.pop();
                continue;
            };

            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            match state.get(dependency) {
                None => {
                    state.insert(dependency, NodeState::OnPath);
                    stack.push((dependency, 0));
                }
                Some(NodeState::OnPath) => {
                    // Only the two ends of the back edge are flagged
                    cycles.insert(node.to_string());
                    cycles.insert(dependency.to_string());
                }
                Some(NodeState::Done) => {}
            }
        }
    }

    if !cycles.is_empty() {
        tracing::debug!("Dependency cycle among {:?}", cycles);
    }
    cycles
}

fn add_edges<'a>(graph: &mut IndexMap<&'a str, IndexSet<&'a str>>, usage: &'a Usage) {
    match usage {
        Usage::Ingredient(item) => add_item_edges(graph, item),
        Usage::Alternative(alt) => {
            for option in &alt.options {
                add_edges(graph, option);
            }
        }
        _ => {}
    }
}

fn add_item_edges<'a>(graph: &mut IndexMap<&'a str, IndexSet<&'a str>>, item: &'a ItemUsage) {
    if item.dependencies.is_empty() {
        return;
    }
    let edges = graph.entry(item.id.as_str()).or_default();
    for dependency in &item.dependencies {
        edges.insert(dependency.as_str());
    }
}
