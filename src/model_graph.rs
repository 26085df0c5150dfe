//! Model graph (component H): the persistent DAG of IN/INPROJ/OUT/OUTPROJ
//! models the online builder grows during enumeration. Grounded on
//! `original_source/include/dlvhex/ModelGraph.hpp`'s `ModelType` enum and
//! `ModelPropertyBundle{location,type,successors}`, reimplemented with a
//! [`slotmap`] arena instead of raw Boost graph descriptors (spec §9:
//! "Raw pointer cycles... → arena-with-indices").

use crate::error::{EvalError, EvalResult};
use crate::eval_graph::EvalUnitId;
use crate::interpretation::Interpretation;
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;

new_key_type! { pub struct ModelId; }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelType {
    In = 0,
    InProj = 1,
    Out = 2,
    OutProj = 3,
}

#[derive(Debug, Clone)]
pub struct Model {
    pub location: EvalUnitId,
    pub model_type: ModelType,
    /// Absent for the synthetic dummy IN-model of a predecessor-less unit.
    pub interpretation: Option<Interpretation>,
    pub child_models_generated: bool,
    /// Predecessors in model-graph order (join-order index for IN-models).
    pub predecessors: Vec<ModelId>,
    /// Per-target-unit set of already-materialized successors, kept
    /// sorted by `ModelId` for the pairwise successor-intersection search.
    successors: HashMap<EvalUnitId, Vec<ModelId>>,
}

impl Model {
    fn successors_at(&self, unit: EvalUnitId) -> &[ModelId] {
        self.successors.get(&unit).map(Vec::as_slice).unwrap_or(&[])
    }

    fn record_successor(&mut self, unit: EvalUnitId, model: ModelId) {
        let list = self.successors.entry(unit).or_default();
        if let Err(pos) = list.binary_search(&model) {
            list.insert(pos, model);
        }
    }
}

pub struct ModelGraph {
    models: SlotMap<ModelId, Model>,
}

impl ModelGraph {
    pub fn new() -> Self {
        ModelGraph { models: SlotMap::with_key() }
    }

    pub fn get(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id)
    }

    pub fn get_mut(&mut self, id: ModelId) -> Option<&mut Model> {
        self.models.get_mut(id)
    }

    pub fn mark_child_models_generated(&mut self, id: ModelId) {
        if let Some(m) = self.models.get_mut(id) {
            m.child_models_generated = true;
        }
    }

    /// Already-materialized successors of `id` at `unit`. When `unit` is
    /// `id`'s own location this is its child models (INPROJ of an IN, OUT of
    /// an IN/INPROJ, OUTPROJ of an OUT); when `unit` is a later unit this is
    /// the set of IN-models at `unit` that joined `id` in as a predecessor.
    pub fn successors_of(&self, id: ModelId, unit: EvalUnitId) -> &[ModelId] {
        self.models.get(id).map(|m| m.successors_at(unit)).unwrap_or(&[])
    }

    fn type_matches_projection(model_type: ModelType, projected: bool) -> bool {
        match model_type {
            ModelType::Out => !projected,
            ModelType::OutProj => projected,
            _ => true,
        }
    }

    /// Add an IN-model at `unit`, predecessors given in ascending join
    /// order; each predecessor must be an OUT (or OUTPROJ, if that
    /// predecessor unit projects) model (spec §4.8 construction table).
    pub fn add_in_model(
        &mut self,
        unit: EvalUnitId,
        predecessors: Vec<(ModelId, bool)>,
        interpretation: Option<Interpretation>,
    ) -> EvalResult<ModelId> {
        let mut pred_ids = Vec::with_capacity(predecessors.len());
        for (pred_id, pred_oproject) in &predecessors {
            let pred = self
                .models
                .get(*pred_id)
                .ok_or_else(|| EvalError::Invariant("IN-model predecessor does not exist".into()))?;
            if !Self::type_matches_projection(pred.model_type, *pred_oproject) {
                return Err(EvalError::Invariant(
                    "IN-model predecessor type does not match predecessor's oproject flag".into(),
                ));
            }
            pred_ids.push(*pred_id);
        }
        let model = Model {
            location: unit,
            model_type: ModelType::In,
            interpretation,
            child_models_generated: false,
            predecessors: pred_ids.clone(),
            successors: HashMap::new(),
        };
        let new_id = self.models.insert(model);
        for pred_id in pred_ids {
            if let Some(pred) = self.models.get_mut(pred_id) {
                pred.record_successor(unit, new_id);
            }
        }
        Ok(new_id)
    }

    /// Add an INPROJ-model, depending on exactly one IN at the same unit.
    pub fn add_inproj_model(&mut self, unit: EvalUnitId, in_model: ModelId, interpretation: Option<Interpretation>) -> EvalResult<ModelId> {
        let in_row = self
            .models
            .get(in_model)
            .ok_or_else(|| EvalError::Invariant("INPROJ predecessor does not exist".into()))?;
        if in_row.location != unit || in_row.model_type != ModelType::In {
            return Err(EvalError::Invariant("INPROJ must depend on an IN-model at the same unit".into()));
        }
        let new_id = self.models.insert(Model {
            location: unit,
            model_type: ModelType::InProj,
            interpretation,
            child_models_generated: false,
            predecessors: vec![in_model],
            successors: HashMap::new(),
        });
        if let Some(m) = self.models.get_mut(in_model) {
            m.record_successor(unit, new_id);
        }
        Ok(new_id)
    }

    /// Add an OUT-model, depending on an IN (or INPROJ, if `iproject`) at
    /// the same unit, or nothing if the unit has no predecessors.
    pub fn add_out_model(
        &mut self,
        unit: EvalUnitId,
        input: Option<ModelId>,
        iproject: bool,
        interpretation: Option<Interpretation>,
    ) -> EvalResult<ModelId> {
        let predecessors = if let Some(input_id) = input {
            let row = self
                .models
                .get(input_id)
                .ok_or_else(|| EvalError::Invariant("OUT predecessor does not exist".into()))?;
            let expected = if iproject { ModelType::InProj } else { ModelType::In };
            if row.location != unit || row.model_type != expected {
                return Err(EvalError::Invariant("OUT-model input does not match unit's iproject flag".into()));
            }
            vec![input_id]
        } else {
            Vec::new()
        };
        let new_id = self.models.insert(Model {
            location: unit,
            model_type: ModelType::Out,
            interpretation,
            child_models_generated: false,
            predecessors: predecessors.clone(),
            successors: HashMap::new(),
        });
        if let Some(&input_id) = predecessors.first() {
            if let Some(m) = self.models.get_mut(input_id) {
                m.record_successor(unit, new_id);
            }
        }
        Ok(new_id)
    }

    /// Add an OUTPROJ-model, depending on exactly one OUT at the same unit.
    pub fn add_outproj_model(&mut self, unit: EvalUnitId, out_model: ModelId, interpretation: Option<Interpretation>) -> EvalResult<ModelId> {
        let out_row = self
            .models
            .get(out_model)
            .ok_or_else(|| EvalError::Invariant("OUTPROJ predecessor does not exist".into()))?;
        if out_row.location != unit || out_row.model_type != ModelType::Out {
            return Err(EvalError::Invariant("OUTPROJ must depend on an OUT-model at the same unit".into()));
        }
        let new_id = self.models.insert(Model {
            location: unit,
            model_type: ModelType::OutProj,
            interpretation,
            child_models_generated: false,
            predecessors: vec![out_model],
            successors: HashMap::new(),
        });
        if let Some(m) = self.models.get_mut(out_model) {
            m.record_successor(unit, new_id);
        }
        Ok(new_id)
    }

    /// Search the predecessors' successor sets at `target_unit` for a
    /// common existing IN-model, so a given combination of predecessor
    /// OUT-models is never joined twice (spec §4.8 "Successor
    /// intersection"). Predecessors are given in join order.
    pub fn find_existing_join(&self, predecessors: &[ModelId], target_unit: EvalUnitId) -> Option<ModelId> {
        let (first, rest) = predecessors.split_first()?;
        let mut candidates: Vec<ModelId> = self.models.get(*first)?.successors_at(target_unit).to_vec();
        for &pred in rest {
            let succ = self.models.get(pred)?.successors_at(target_unit);
            candidates.retain(|c| succ.binary_search(c).is_ok());
            if candidates.is_empty() {
                return None;
            }
        }
        candidates.into_iter().find(|&cand| {
            self.models.get(cand).map(|m| m.predecessors == predecessors).unwrap_or(false)
        })
    }
}

impl Default for ModelGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn fresh_unit() -> (SlotMap<EvalUnitId, ()>, EvalUnitId) {
        let mut units: SlotMap<EvalUnitId, ()> = SlotMap::with_key();
        let u = units.insert(());
        (units, u)
    }

    #[test]
    fn dummy_in_model_has_no_predecessors() {
        let (_units, u) = fresh_unit();
        let mut mg = ModelGraph::new();
        let dummy = mg.add_in_model(u, vec![], None).unwrap();
        assert!(mg.get(dummy).unwrap().predecessors.is_empty());
    }

    #[test]
    fn out_model_requires_matching_in_type() {
        let (_units, u) = fresh_unit();
        let mut mg = ModelGraph::new();
        let in_model = mg.add_in_model(u, vec![], Some(Interpretation::new())).unwrap();
        let out = mg.add_out_model(u, Some(in_model), false, Some(Interpretation::new()));
        assert!(out.is_ok());

        let (_units2, u2) = fresh_unit();
        let bad = mg.add_out_model(u2, Some(in_model), true, None);
        assert!(bad.is_err());
    }

    #[test]
    fn successor_intersection_reuses_existing_join() {
        let (_units, target) = fresh_unit();
        let mut mg = ModelGraph::new();
        let (_units_p, pred_unit) = fresh_unit();
        let out_a = mg.add_out_model(pred_unit, None, false, Some(Interpretation::new())).unwrap();

        let join1 = mg.add_in_model(target, vec![(out_a, false)], Some(Interpretation::new())).unwrap();
        assert!(mg.find_existing_join(&[out_a], target).is_none());
        // simulate successor registration done by add_in_model: confirm reuse via direct lookup
        let found = mg.find_existing_join(&[out_a], target);
        assert_eq!(found, Some(join1));
    }
}
