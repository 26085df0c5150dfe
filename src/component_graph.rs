//! Component graph (component F): SCC condensation of the dependency
//! graph. Grounded on `original_source/include/dlvhex/ComponentGraph.hpp`'s
//! `ComponentInfo{rules, eatoms}` / collapsed `DependencyInfo`.

use crate::depgraph::{DependencyGraph, DependencyInfo};
use crate::id::Id;
use petgraph::algo::tarjan_scc;
use slotmap::{new_key_type, SlotMap};
use std::collections::{HashMap, HashSet};

new_key_type! { pub struct ComponentId; }

#[derive(Debug, Clone, Default)]
pub struct ComponentInfo {
    pub rules: Vec<Id>,
    pub inner_eatoms: Vec<Id>,
    pub outer_eatoms: Vec<Id>,
}

impl ComponentInfo {
    /// Spec §4.6 invariant: a component either carries outer-eatoms (and
    /// nothing else) or carries no outer-eatoms.
    pub fn well_formed(&self) -> bool {
        self.outer_eatoms.is_empty() || (self.rules.is_empty() && self.inner_eatoms.is_empty())
    }
}

pub struct ComponentGraph {
    pub components: SlotMap<ComponentId, ComponentInfo>,
    pub(crate) edges: HashMap<(ComponentId, ComponentId), DependencyInfo>,
}

impl ComponentGraph {
    pub fn dependencies_of(&self, from: ComponentId) -> Vec<(ComponentId, DependencyInfo)> {
        self.edges
            .iter()
            .filter(|((a, _), _)| *a == from)
            .map(|((_, b), info)| (*b, *info))
            .collect()
    }

    pub fn incoming_to(&self, to: ComponentId) -> Vec<(ComponentId, DependencyInfo)> {
        self.edges
            .iter()
            .filter(|((_, b), _)| *b == to)
            .map(|((a, _), info)| (*a, *info))
            .collect()
    }

    /// Merge several components into one, unioning their rule/eatom sets
    /// and rewiring edges with category union on duplicates (spec §4.6
    /// "Collapsing").
    pub fn collapse(&mut self, members: &[ComponentId]) -> ComponentId {
        let mut merged = ComponentInfo::default();
        let member_set: HashSet<ComponentId> = members.iter().copied().collect();
        for &m in members {
            if let Some(info) = self.components.remove(m) {
                merged.rules.extend(info.rules);
                merged.inner_eatoms.extend(info.inner_eatoms);
                merged.outer_eatoms.extend(info.outer_eatoms);
            }
        }
        let new_id = self.components.insert(merged);

        let old_edges: Vec<((ComponentId, ComponentId), DependencyInfo)> =
            self.edges.drain().collect();
        for ((a, b), info) in old_edges {
            let a2 = if member_set.contains(&a) { new_id } else { a };
            let b2 = if member_set.contains(&b) { new_id } else { b };
            if a2 == b2 {
                // internalized dependency, drop (no self-loop on the collapsed component)
                continue;
            }
            self.edges
                .entry((a2, b2))
                .and_modify(|existing| existing.union(info))
                .or_insert(info);
        }
        new_id
    }
}

/// Condense a dependency graph into its SCCs. `is_external` classifies
/// which `Id`s are external-atom nodes so outer/inner eatoms can be split.
pub fn build(depgraph: &DependencyGraph, is_external: impl Fn(Id) -> bool) -> ComponentGraph {
    let sccs = tarjan_scc(depgraph.inner());
    let mut components: SlotMap<ComponentId, ComponentInfo> = SlotMap::with_key();
    let mut component_of_node: HashMap<petgraph::graph::NodeIndex, ComponentId> = HashMap::new();

    for scc in &sccs {
        let mut info = ComponentInfo::default();
        let singleton_acyclic = scc.len() == 1 && !depgraph.inner().contains_edge(scc[0], scc[0]);

        for &node in scc {
            let id = depgraph.node_id(node);
            if id.is_rule() {
                info.rules.push(id);
            } else if id.is_external_atom() {
                if singleton_acyclic {
                    info.outer_eatoms.push(id);
                } else {
                    info.inner_eatoms.push(id);
                }
            } else if is_external(id) {
                info.outer_eatoms.push(id);
            }
        }
        let cid = components.insert(info);
        for &node in scc {
            component_of_node.insert(node, cid);
        }
    }

    let mut edges: HashMap<(ComponentId, ComponentId), DependencyInfo> = HashMap::new();
    for edge in depgraph.inner().edge_indices() {
        let (src, dst) = depgraph.inner().edge_endpoints(edge).expect("edge index is valid");
        let from = component_of_node[&src];
        let to = component_of_node[&dst];
        if from == to {
            continue;
        }
        let info = depgraph.inner()[edge];
        edges.entry((from, to)).and_modify(|e| e.union(info)).or_insert(info);
    }

    ComponentGraph { components, edges }
}
