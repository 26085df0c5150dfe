//! Dependency graph (component E): one node per rule or IDB atom, edges
//! recording why the source depends on the target. Grounded on
//! `original_source/include/dlvhex/DependencyGraph.hpp`'s
//! `NodeInfo{id}` / `DependencyInfo{positive,negative,disjunctive,
//! external,positive_constraint,negative_constraint,unifying}` pair,
//! reimplemented over [`petgraph`] instead of `boost::adjacency_list`.

use crate::id::{self, Id};
use crate::registry::Registry;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Which dependency categories hold between two nodes. Multiple flags can
/// be set on one edge, matching the original's bitset-like `DependencyInfo`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DependencyInfo {
    pub positive: bool,
    pub negative: bool,
    pub disjunctive: bool,
    pub external: bool,
    pub positive_constraint: bool,
    pub negative_constraint: bool,
    pub unifying: bool,
    pub external_predicate_input: bool,
    pub external_constant_input: bool,
}

impl DependencyInfo {
    pub fn union(&mut self, other: DependencyInfo) {
        self.positive |= other.positive;
        self.negative |= other.negative;
        self.disjunctive |= other.disjunctive;
        self.external |= other.external;
        self.positive_constraint |= other.positive_constraint;
        self.negative_constraint |= other.negative_constraint;
        self.unifying |= other.unifying;
        self.external_predicate_input |= other.external_predicate_input;
        self.external_constant_input |= other.external_constant_input;
    }
}

/// Rules introduced to compute the predicate-input extension of an
/// external atom, returned as an out-parameter of graph construction
/// (spec §4.5: "`aux_input_rules` is an out-parameter").
#[derive(Debug, Default)]
pub struct AuxInputRules {
    pub rules: Vec<Id>,
}

pub struct DependencyGraph {
    graph: DiGraph<Id, DependencyInfo>,
    node_of: HashMap<Id, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        DependencyGraph { graph: DiGraph::new(), node_of: HashMap::new() }
    }

    pub fn node_for(&mut self, id: Id) -> NodeIndex {
        *self.node_of.entry(id).or_insert_with(|| self.graph.add_node(id))
    }

    /// Add or strengthen a dependency edge `from -> to`, unioning edge
    /// categories on a duplicate edge rather than creating a parallel one.
    pub fn add_dependency(&mut self, from: Id, to: Id, info: DependencyInfo) {
        let a = self.node_for(from);
        let b = self.node_for(to);
        if let Some(edge) = self.graph.find_edge(a, b) {
            self.graph[edge].union(info);
        } else {
            self.graph.add_edge(a, b, info);
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn dependencies_of(&self, id: Id) -> Vec<(Id, DependencyInfo)> {
        let Some(&idx) = self.node_of.get(&id) else { return Vec::new() };
        self.graph
            .edges(idx)
            .map(|e| (self.graph[e.target()], *e.weight()))
            .collect()
    }

    pub fn inner(&self) -> &DiGraph<Id, DependencyInfo> {
        &self.graph
    }

    pub fn node_id(&self, idx: NodeIndex) -> Id {
        self.graph[idx]
    }

    pub fn node_index(&self, id: Id) -> Option<NodeIndex> {
        self.node_of.get(&id).copied()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh aux rule `__input_<atom> <- <containing rule's body, minus the
/// external literal itself>`: the synthetic rule that computes an external
/// atom's predicate-input extension, matching `original_source`'s
/// `DependencyGraph::createAuxInputRuleHead` together with `PROPERTY_RULE_AUX`.
fn fresh_input_rule(registry: &mut Registry, ext_atom: Id, containing_body: &[Id]) -> Id {
    let text = format!("__input_{:x}_{}", ext_atom.kind, ext_atom.address);
    let pred = registry.store_constant(text.clone());
    let head_atom = registry.store_ordinary_atom(text, vec![pred]).with_property(id::PROPERTY_ATOM_AUX);
    let body: Vec<Id> = containing_body.iter().copied().filter(|&lit| Id::atom_from_literal(lit) != ext_atom).collect();
    let handle = registry.rules.store_regular(vec![Id::pos_literal_from_atom(head_atom)], body);
    registry.rules.mark_aux(handle).expect("just-stored rule handle is valid")
}

/// Build the dependency graph over the IDB's rules, per spec §4.5's edge
/// taxonomy. `registry` supplies rule bodies/heads and atom kinds;
/// synthetic rules needed to compute an external atom's predicate input
/// are appended to `aux_input_rules`.
pub fn build(registry: &mut Registry, idb: &[Id], aux_input_rules: &mut AuxInputRules) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for &rule_handle in idb {
        let Ok(rule) = registry.rules.get(rule_handle) else { continue };
        graph.node_for(rule_handle);
        // Clone head/body up front so `rule`'s borrow of `registry` doesn't
        // outlive the loop body — `fresh_input_rule` below needs `&mut registry`.
        let head = rule.head.clone();
        let body = rule.body.clone();

        if head.is_empty() {
            for &body_lit in &body {
                let atom = Id::atom_from_literal(body_lit);
                let mut info = DependencyInfo::default();
                if body_lit.is_naf() {
                    info.negative_constraint = true;
                } else {
                    info.positive_constraint = true;
                }
                if atom.is_external_atom() {
                    info.external = true;
                }
                graph.add_dependency(rule_handle, atom, info);
            }
            continue;
        }

        if head.len() > 1 {
            for &head_lit in &head {
                let atom = Id::atom_from_literal(head_lit);
                let info = DependencyInfo { disjunctive: true, ..Default::default() };
                graph.add_dependency(rule_handle, atom, info);
            }
        }

        for &body_lit in &body {
            let atom = Id::atom_from_literal(body_lit);
            let mut info = DependencyInfo::default();
            if body_lit.is_naf() {
                info.negative = true;
            } else {
                info.positive = true;
            }
            if atom.is_external_atom() {
                info.external = true;
                let has_input_tuple = registry
                    .external_atoms
                    .get(atom)
                    .map(|ext| !ext.input_tuple.is_empty())
                    .unwrap_or(false);
                if has_input_tuple {
                    aux_input_rules.rules.push(fresh_input_rule(registry, atom, &body));
                }
            }
            graph.add_dependency(rule_handle, atom, info);
        }
    }

    for &a in idb {
        if !a.is_ordinary_atom() {
            continue;
        }
        for &b in idb {
            if a == b || !b.is_ordinary_atom() {
                continue;
            }
            if let (Ok(atom_a), Ok(atom_b)) = (registry.get_ordinary_atom(a), registry.get_ordinary_atom(b)) {
                if crate::registry::atoms::unifies(atom_a, atom_b) {
                    graph.add_dependency(a, b, DependencyInfo { unifying: true, ..Default::default() });
                }
            }
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{self, Id};
    use crate::registry::rules::Rule;

    #[test]
    fn constraint_body_gets_constraint_flags() {
        let mut reg = Registry::new();
        let p = reg.store_constant("p");
        let a = reg.store_ordinary_atom("p".into(), vec![p]);
        let body_lit = Id::naf_literal_from_atom(a);
        let constraint = reg.store_rule(Rule {
            kind: id::MAINKIND_RULE | id::SUBKIND_RULE_CONSTRAINT,
            head: vec![],
            body: vec![body_lit],
            weight: None,
            level: None,
        });
        let mut aux = AuxInputRules::default();
        let graph = build(&mut reg, &[constraint], &mut aux);
        let deps = graph.dependencies_of(constraint);
        assert_eq!(deps.len(), 1);
        assert!(deps[0].1.negative_constraint);
    }

    #[test]
    fn disjunctive_head_edges_are_marked() {
        let mut reg = Registry::new();
        let p = reg.store_constant("p");
        let q = reg.store_constant("q");
        let a = reg.store_ordinary_atom("p".into(), vec![p]);
        let b = reg.store_ordinary_atom("q".into(), vec![q]);
        let rule = reg.store_rule(Rule {
            kind: id::MAINKIND_RULE,
            head: vec![Id::pos_literal_from_atom(a), Id::pos_literal_from_atom(b)],
            body: vec![],
            weight: None,
            level: None,
        });
        let mut aux = AuxInputRules::default();
        let graph = build(&mut reg, &[rule], &mut aux);
        let deps = graph.dependencies_of(rule);
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().all(|(_, info)| info.disjunctive));
    }

    #[test]
    fn external_atom_with_input_tuple_gets_a_synthesized_aux_rule() {
        let mut reg = Registry::new();
        let x = reg.store_variable("X", false);
        let p = reg.store_ordinary_atom("p".into(), vec![x]);
        let ext = reg.store_external_atom("ext".into(), vec![x], vec![]);
        let rule = reg.store_rule(Rule {
            kind: id::MAINKIND_RULE,
            head: vec![Id::pos_literal_from_atom(p)],
            body: vec![Id::pos_literal_from_atom(ext)],
            weight: None,
            level: None,
        });
        let mut aux = AuxInputRules::default();
        build(&mut reg, &[rule], &mut aux);
        assert_eq!(aux.rules.len(), 1);
        assert!(aux.rules[0].has_property(id::PROPERTY_RULE_AUX));
        assert!(aux.rules[0] != rule, "aux_input_rules must hold the synthesized rule, not the containing one");
        let synthesized = reg.rules.get(aux.rules[0]).unwrap();
        assert_eq!(synthesized.head.len(), 1);
        assert!(synthesized.body.is_empty(), "the external literal itself is excluded from the synthesized body");
    }
}
