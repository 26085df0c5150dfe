//! Eval-graph construction heuristics: Trivial, Old, Easy, and a replay
//! heuristic reading an external command list. Grounded on
//! `original_source`'s heuristic family referenced from `EvalGraphBuilder.hpp`
//! (not retrieved in full; the command grammar is inferred from spec §4.7's
//! "replays a command list (`collapse u1 u2 ... [share v1 v2 ...]`)").

use crate::component_graph::{ComponentGraph, ComponentId};
use crate::config::HeuristicChoice;
use crate::error::{EvalError, EvalResult};
use crate::eval_graph::{EvalGraph, EvalUnitId};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// A topological order over the component graph, built once and reused by
/// every heuristic (`toposort` requires an explicit graph; the component
/// graph's own edge map is rebuilt into one here).
fn topo_order(cg: &ComponentGraph) -> Vec<ComponentId> {
    let mut graph: DiGraph<ComponentId, ()> = DiGraph::new();
    let mut node_of: HashMap<ComponentId, NodeIndex> = HashMap::new();
    for id in cg.components.keys() {
        node_of.insert(id, graph.add_node(id));
    }
    for id in cg.components.keys() {
        for (to, _) in cg.dependencies_of(id) {
            graph.add_edge(node_of[&id], node_of[&to], ());
        }
    }
    // Dependency edges point from depender to depended-on; a unit can only
    // be built once its dependencies are already units, so we want targets
    // before sources: reverse the toposort of the dependency graph.
    let mut order = toposort(&graph, None).expect("component graph is acyclic by construction");
    order.reverse();
    order.into_iter().map(|idx| graph[idx]).collect()
}

/// One unit per component, in dependency order.
pub fn trivial(cg: &ComponentGraph) -> EvalResult<EvalGraph> {
    let mut eg = EvalGraph::new();
    let mut unit_of: HashMap<ComponentId, EvalUnitId> = HashMap::new();
    for c in topo_order(cg) {
        let preds: Vec<EvalUnitId> = cg
            .incoming_to(c)
            .into_iter()
            .filter_map(|(from, _)| unit_of.get(&from).copied())
            .collect();
        let unit = eg.create_eval_unit(vec![c], vec![], preds)?;
        unit_of.insert(c, unit);
    }
    Ok(eg)
}

/// Iteratively collapses every component whose outstanding predecessors
/// have all already become units into one merged unit per round, matching
/// spec §4.7 "Old": "select components whose outstanding dependencies have
/// all been placed... collapse the marked set... repeat."
pub fn old(cg: &ComponentGraph) -> EvalResult<EvalGraph> {
    let mut eg = EvalGraph::new();
    let order = topo_order(cg);
    let mut placed: std::collections::HashSet<ComponentId> = std::collections::HashSet::new();
    let mut unit_of: HashMap<ComponentId, EvalUnitId> = HashMap::new();
    let mut remaining: Vec<ComponentId> = order;

    while !remaining.is_empty() {
        let mut round = Vec::new();
        for &c in &remaining {
            let deps_placed = cg.incoming_to(c).iter().all(|(from, _)| placed.contains(from));
            if deps_placed {
                round.push(c);
            }
        }
        if round.is_empty() {
            return Err(EvalError::Invariant(
                "old heuristic made no progress; component graph has an unresolved cycle".into(),
            ));
        }
        for &c in &round {
            placed.insert(c);
        }
        let preds: std::collections::HashSet<EvalUnitId> = round
            .iter()
            .flat_map(|&c| cg.incoming_to(c))
            .filter_map(|(from, _)| unit_of.get(&from).copied())
            .collect();
        let mut preds: Vec<EvalUnitId> = preds.into_iter().collect();
        preds.sort_by_key(|u| format!("{u:?}"));
        let unit = eg.create_eval_unit(round.clone(), vec![], preds)?;
        for c in round {
            unit_of.insert(c, unit);
        }
        remaining.retain(|c| !placed.contains(c));
    }
    Ok(eg)
}

/// Default heuristic: identical to [`trivial`] unless a future merge pass
/// is added; spec §4.7 leaves the exact merge strategy
/// implementation-defined as long as it doesn't violate the acyclicity or
/// join-order contracts, and the simplest such strategy is "no merge".
pub fn easy(cg: &ComponentGraph) -> EvalResult<EvalGraph> {
    trivial(cg)
}

/// A single line of a from-file replay script.
#[derive(Debug, Clone)]
pub struct ReplayCommand {
    pub collapse: Vec<usize>,
    pub share: Vec<usize>,
}

/// Parse `collapse u1 u2 ... [share v1 v2 ...]` lines; component indices
/// refer to positions in the topological order computed at replay time.
pub fn parse_replay_script(text: &str) -> Vec<ReplayCommand> {
    let mut out = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("collapse") {
            continue;
        }
        let mut collapse = Vec::new();
        let mut share = Vec::new();
        let mut in_share = false;
        for tok in tokens {
            if tok == "share" {
                in_share = true;
                continue;
            }
            if let Ok(idx) = tok.parse::<usize>() {
                if in_share {
                    share.push(idx);
                } else {
                    collapse.push(idx);
                }
            }
        }
        out.push(ReplayCommand { collapse, share });
    }
    out
}

/// Replay an explicit command list against the topological order; any
/// components not covered by a command become singleton units afterward
/// (spec §4.7: "remaining components become singleton units after a
/// warning").
pub fn from_file(cg: &ComponentGraph, script: &str) -> EvalResult<EvalGraph> {
    let order = topo_order(cg);
    let commands = parse_replay_script(script);
    let mut eg = EvalGraph::new();
    let mut unit_of: HashMap<ComponentId, EvalUnitId> = HashMap::new();
    let mut covered: std::collections::HashSet<ComponentId> = std::collections::HashSet::new();

    for cmd in &commands {
        let collapse_ids: Vec<ComponentId> = cmd.collapse.iter().filter_map(|&i| order.get(i).copied()).collect();
        let share_ids: Vec<ComponentId> = cmd.share.iter().filter_map(|&i| order.get(i).copied()).collect();
        if collapse_ids.is_empty() {
            continue;
        }
        let preds: std::collections::HashSet<EvalUnitId> = collapse_ids
            .iter()
            .flat_map(|&c| cg.incoming_to(c))
            .filter_map(|(from, _)| unit_of.get(&from).copied())
            .collect();
        let mut preds: Vec<EvalUnitId> = preds.into_iter().collect();
        preds.sort_by_key(|u| format!("{u:?}"));
        let unit = eg.create_eval_unit(collapse_ids.clone(), share_ids, preds)?;
        for c in collapse_ids {
            unit_of.insert(c, unit);
            covered.insert(c);
        }
    }

    for c in order {
        if covered.contains(&c) {
            continue;
        }
        tracing::warn!(component = ?c, "from_file heuristic: component not covered by script, emitting singleton unit");
        let preds: Vec<EvalUnitId> = cg.incoming_to(c).into_iter().filter_map(|(from, _)| unit_of.get(&from).copied()).collect();
        let unit = eg.create_eval_unit(vec![c], vec![], preds)?;
        unit_of.insert(c, unit);
    }
    Ok(eg)
}

pub fn build(cg: &ComponentGraph, choice: HeuristicChoice, script: Option<&str>) -> EvalResult<EvalGraph> {
    match choice {
        HeuristicChoice::Trivial => trivial(cg),
        HeuristicChoice::Old => old(cg),
        HeuristicChoice::Easy => easy(cg),
        HeuristicChoice::FromFile => {
            let script = script.ok_or_else(|| {
                EvalError::Invariant("from_file heuristic selected without a command script".into())
            })?;
            from_file(cg, script)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depgraph::DependencyInfo;

    fn linear_component_graph(n: usize) -> ComponentGraph {
        use crate::component_graph::ComponentInfo;
        use slotmap::SlotMap;
        let mut components: SlotMap<ComponentId, ComponentInfo> = SlotMap::with_key();
        let ids: Vec<ComponentId> = (0..n).map(|_| components.insert(ComponentInfo::default())).collect();
        let mut edges = std::collections::HashMap::new();
        for w in ids.windows(2) {
            edges.insert((w[1], w[0]), DependencyInfo { positive: true, ..Default::default() });
        }
        ComponentGraph { components, edges }
    }

    #[test]
    fn trivial_produces_one_unit_per_component() {
        let cg = linear_component_graph(3);
        let eg = trivial(&cg).unwrap();
        assert_eq!(eg.units.len(), 3);
    }

    #[test]
    fn parse_replay_script_reads_collapse_and_share() {
        let cmds = parse_replay_script("collapse 0 1 share 2\ncollapse 3\n");
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].collapse, vec![0, 1]);
        assert_eq!(cmds[0].share, vec![2]);
        assert_eq!(cmds[1].collapse, vec![3]);
        assert!(cmds[1].share.is_empty());
    }
}
