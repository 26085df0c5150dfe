//! Eval graph builder (component G): carves the component graph into
//! evaluation units connected by join-ordered edges. Grounded on
//! `original_source/include/dlvhex/EvalGraph.hpp`'s
//! `EvalUnitDepPropertyBundle{joinOrder}` and its debug-mode assertion
//! that join orders on a unit's out-edges are dense and non-repeating.

use crate::component_graph::ComponentId;
use crate::error::{EvalError, EvalResult};
use slotmap::{new_key_type, SlotMap};
use std::collections::HashSet;

new_key_type! { pub struct EvalUnitId; }

#[derive(Debug, Clone, Default)]
pub struct EvalUnitInfo {
    pub consumed: Vec<ComponentId>,
    pub shared: Vec<ComponentId>,
    pub iproject: bool,
    pub oproject: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct EvalUnitDep {
    pub join_order: u32,
}

pub struct EvalGraph {
    pub units: SlotMap<EvalUnitId, EvalUnitInfo>,
    /// `from -> Vec<(to, join_order)>`; join orders on `from`'s out-edges
    /// are required to be dense `{0,1,...,fan_in-1}`.
    out_edges: std::collections::HashMap<EvalUnitId, Vec<(EvalUnitId, EvalUnitDep)>>,
    consumed_components: HashSet<ComponentId>,
}

impl EvalGraph {
    pub fn new() -> Self {
        EvalGraph {
            units: SlotMap::with_key(),
            out_edges: std::collections::HashMap::new(),
            consumed_components: HashSet::new(),
        }
    }

    pub fn out_edges_of(&self, unit: EvalUnitId) -> &[(EvalUnitId, EvalUnitDep)] {
        self.out_edges.get(&unit).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fan_in(&self, unit: EvalUnitId) -> usize {
        self.out_edges_of(unit).len()
    }

    /// Create a new evaluation unit from `consumed` components (plus
    /// `shared` components cloned for repeated constraint propagation),
    /// wiring dependency edges to `predecessors` in the order given — the
    /// join order assigned to each is its position in that list, matching
    /// spec §4.7: "join-order = (current fan-in count of new unit)".
    pub fn create_eval_unit(
        &mut self,
        consumed: Vec<ComponentId>,
        shared: Vec<ComponentId>,
        predecessors: Vec<EvalUnitId>,
    ) -> EvalResult<EvalUnitId> {
        for &c in &consumed {
            if self.consumed_components.contains(&c) {
                return Err(EvalError::Invariant(format!(
                    "component {c:?} already consumed by another eval unit"
                )));
            }
        }
        for &c in &consumed {
            self.consumed_components.insert(c);
        }
        let info = EvalUnitInfo { consumed, shared, iproject: false, oproject: false };
        let unit = self.units.insert(info);

        let mut seen_orders = HashSet::new();
        for (join_order, pred) in predecessors.into_iter().enumerate() {
            let join_order = join_order as u32;
            debug_assert!(seen_orders.insert(join_order), "join order must not repeat");
            self.out_edges.entry(pred).or_default().push((unit, EvalUnitDep { join_order }));
        }
        Ok(unit)
    }

    pub fn set_projection(&mut self, unit: EvalUnitId, iproject: bool, oproject: bool) {
        if let Some(info) = self.units.get_mut(unit) {
            info.iproject = iproject;
            info.oproject = oproject;
        }
    }

    /// Spec §8 invariant: the multiset of join orders assigned to `unit`'s
    /// own predecessors (the edges with `to == unit`, not `unit`'s own
    /// out-edges) equals `{0,...,n-1}` with no repetitions.
    pub fn join_orders_are_dense(&self, unit: EvalUnitId) -> bool {
        let mut orders: Vec<u32> = self
            .out_edges
            .values()
            .flat_map(|tos| tos.iter().filter(|(to, _)| *to == unit).map(|(_, d)| d.join_order))
            .collect();
        orders.sort_unstable();
        orders.iter().enumerate().all(|(i, &o)| i as u32 == o)
    }

    /// Predecessor units of `unit`, ordered by ascending join order — the
    /// order the model builder joins OUT-models in (spec §4.8).
    pub fn predecessors_of(&self, unit: EvalUnitId) -> Vec<EvalUnitId> {
        let mut preds: Vec<(u32, EvalUnitId)> = self
            .out_edges
            .iter()
            .flat_map(|(&from, tos)| tos.iter().filter(move |(to, _)| *to == unit).map(move |(_, d)| (d.join_order, from)))
            .collect();
        preds.sort_by_key(|(order, _)| *order);
        preds.into_iter().map(|(_, u)| u).collect()
    }
}

impl Default for EvalGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_orders_dense_for_single_predecessor() {
        let mut g = EvalGraph::new();
        let u1 = g.create_eval_unit(vec![], vec![], vec![]).unwrap();
        let u2 = g.create_eval_unit(vec![], vec![], vec![u1]).unwrap();
        assert!(g.join_orders_are_dense(u2));
        assert_eq!(g.fan_in(u1), 1);
    }

    #[test]
    fn four_predecessors_get_dense_join_orders() {
        let mut g = EvalGraph::new();
        let preds: Vec<_> = (0..4).map(|_| g.create_eval_unit(vec![], vec![], vec![]).unwrap()).collect();
        let join = g.create_eval_unit(vec![], vec![], preds.clone()).unwrap();
        assert!(g.join_orders_are_dense(join));
        for (i, &p) in preds.iter().enumerate() {
            assert_eq!(g.out_edges_of(p)[0].1.join_order, i as u32);
        }
    }

    #[test]
    fn reconsuming_a_component_is_rejected() {
        let mut component_ids: SlotMap<ComponentId, ()> = SlotMap::with_key();
        let c1 = component_ids.insert(());
        let mut g = EvalGraph::new();
        g.create_eval_unit(vec![c1], vec![], vec![]).unwrap();
        assert!(g.create_eval_unit(vec![c1], vec![], vec![]).is_err());
    }
}
