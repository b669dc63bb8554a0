// Attribute cycle detector - finds theme attributes that refer back to themselves
//
// A cycle typically shows up when an application overrides a framework
// attribute with a `?android:attr/...` reference to the same attribute.
// Resolution still terminates (path check plus depth ceiling); this only
// makes the cycles visible in the log.

use super::reference::Reference;
use super::store::{AttributeStore, Scope};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::{debug, warn};

/// One strongly connected group of attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeCycle {
    /// Attribute keys in the cycle, sorted
    pub members: Vec<String>,
}

/// Detector for attribute indirection cycles
pub struct AttributeCycleDetector;

impl AttributeCycleDetector {
    pub fn new() -> Self {
        Self
    }

    /// Find every cycle of `?`-indirections in the store
    pub fn find_cycles(&self, attributes: &AttributeStore, scope: &Scope) -> Vec<AttributeCycle> {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut nodes: HashMap<String, NodeIndex> = HashMap::new();

        let mut node_for = |graph: &mut DiGraph<String, ()>, key: &str| -> NodeIndex {
            *nodes
                .entry(key.to_string())
                .or_insert_with(|| graph.add_node(key.to_string()))
        };

        for (name, values) in attributes.iter() {
            let from = node_for(&mut graph, name);
            for value in values {
                if let Some(Reference::Attribute { package, name: target }) = Reference::parse(value) {
                    let to = node_for(&mut graph, &scope.key(package, target));
                    graph.update_edge(from, to, ());
                }
            }
        }

        let mut cycles: Vec<AttributeCycle> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut members: Vec<String> = scc.iter().map(|&idx| graph[idx].clone()).collect();
                members.sort();
                AttributeCycle { members }
            })
            .collect();

        cycles.sort_by(|a, b| a.members.cmp(&b.members));
        debug!("Found {} attribute cycles", cycles.len());
        cycles
    }

    /// Log every cycle as a warning and return how many were found
    pub fn report(&self, attributes: &AttributeStore, scope: &Scope) -> usize {
        let cycles = self.find_cycles(attributes, scope);
        for cycle in &cycles {
            warn!(
                "Attribute cycle: {} (resolves to unknown)",
                cycle.members.join(" -> ")
            );
        }
        cycles.len()
    }
}

impl Default for AttributeCycleDetector {
    fn default() -> Self {
        Self::new()
    }
}
