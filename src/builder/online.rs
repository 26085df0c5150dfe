//! Demand-driven online model builder. Grounded on
//! `original_source/include/dlvhex/OnlineModelBuilder.tcc`'s
//! `getNextIModel`/`getNextOModel`, reimplemented as an explicit
//! backtracking loop over join positions instead of recursive calls tied
//! to a Boost graph visitor.

use super::{ModelGenerator, ModelGeneratorFactory};
use crate::error::EvalResult;
use crate::eval_graph::{EvalGraph, EvalUnitId};
use crate::interpretation::Interpretation;
use crate::model_graph::{ModelGraph, ModelId};
use slotmap::SecondaryMap;

/// Model-building properties for one eval unit (spec §4.9): the generator,
/// the held IN-model, a walk position over its already-materialized
/// OUT-model children, and the output reference count gating advance.
struct UnitState {
    need_input: bool,
    held_predecessor_out: Vec<Option<ModelId>>,
    current_in_model: Option<ModelId>,
    dummy_produced: bool,
    generator: Option<Box<dyn ModelGenerator>>,
    out_ref_count: u32,
    out_walk_idx: usize,
}

impl UnitState {
    fn new(fan_in: usize) -> Self {
        UnitState {
            need_input: fan_in > 0,
            held_predecessor_out: vec![None; fan_in],
            current_in_model: None,
            dummy_produced: false,
            generator: None,
            out_ref_count: 0,
            out_walk_idx: 0,
        }
    }
}

pub struct OnlineModelBuilder<'g> {
    eval_graph: &'g EvalGraph,
    model_graph: ModelGraph,
    factory: Box<dyn ModelGeneratorFactory>,
    states: SecondaryMap<EvalUnitId, UnitState>,
}

impl<'g> OnlineModelBuilder<'g> {
    pub fn new(eval_graph: &'g EvalGraph, factory: Box<dyn ModelGeneratorFactory>) -> Self {
        OnlineModelBuilder {
            eval_graph,
            model_graph: ModelGraph::new(),
            factory,
            states: SecondaryMap::new(),
        }
    }

    pub fn model_graph(&self) -> &ModelGraph {
        &self.model_graph
    }

    fn ensure_state(&mut self, u: EvalUnitId) {
        if !self.states.contains_key(u) {
            let fan_in = self.eval_graph.predecessors_of(u).len();
            self.states.insert(u, UnitState::new(fan_in));
        }
    }

    /// Release this caller's hold on `u`'s last-returned OUT-model. Per
    /// spec §4.9, [`Self::get_next_omodel`] refuses to advance past a model
    /// still held by another consumer; every caller must release before
    /// requesting the next one.
    pub fn release_out_model(&mut self, u: EvalUnitId) {
        self.ensure_state(u);
        let count = self.states[u].out_ref_count;
        self.states[u].out_ref_count = count.saturating_sub(1);
    }

    /// Demand the next IN-model for `u`, recursing into predecessors as
    /// needed (spec §4.9 phases 1-2).
    pub fn get_next_imodel(&mut self, u: EvalUnitId) -> EvalResult<Option<ModelId>> {
        self.ensure_state(u);
        if !self.states[u].need_input {
            if self.states[u].dummy_produced {
                return Ok(None);
            }
            self.states[u].dummy_produced = true;
            let dummy = self.model_graph.add_in_model(u, vec![], None)?;
            self.states[u].current_in_model = Some(dummy);
            return Ok(Some(dummy));
        }

        let preds = self.eval_graph.predecessors_of(u);
        let n = preds.len();
        let resuming = self.states[u].current_in_model.is_some();
        let mut i = if resuming {
            self.states[u].held_predecessor_out[n - 1] = None;
            n - 1
        } else {
            0
        };

        loop {
            if i == n {
                break;
            }
            if self.states[u].held_predecessor_out[i].is_none() {
                let next = self.get_next_omodel(preds[i])?;
                match next {
                    Some(m) => {
                        self.states[u].held_predecessor_out[i] = Some(m);
                        i += 1;
                    }
                    None => {
                        if i == 0 {
                            self.states[u].current_in_model = None;
                            return Ok(None);
                        }
                        i -= 1;
                        self.states[u].held_predecessor_out[i] = None;
                    }
                }
            } else {
                i += 1;
            }
        }

        let held: Vec<ModelId> =
            self.states[u].held_predecessor_out.iter().map(|m| m.expect("filled above")).collect();

        if let Some(existing) = self.model_graph.find_existing_join(&held, u) {
            self.states[u].current_in_model = Some(existing);
            self.states[u].out_walk_idx = 0;
            self.states[u].generator = None;
            return Ok(Some(existing));
        }

        let mut interp = Interpretation::new();
        let mut join_input: Vec<(ModelId, bool)> = Vec::with_capacity(n);
        for (&pred, &model_id) in preds.iter().zip(held.iter()) {
            if let Some(m) = self.model_graph.get(model_id) {
                if let Some(facts) = &m.interpretation {
                    interp.union_with(facts);
                }
            }
            let oproject = self.eval_graph.units[pred].oproject;
            join_input.push((model_id, oproject));
        }
        let new_in = self.model_graph.add_in_model(u, join_input, Some(interp))?;
        self.states[u].current_in_model = Some(new_in);
        self.states[u].out_walk_idx = 0;
        self.states[u].generator = None;
        Ok(Some(new_in))
    }

    /// Demand the next OUT-model (or OUTPROJ, if `u` projects) for `u`
    /// (spec §4.9).
    pub fn get_next_omodel(&mut self, u: EvalUnitId) -> EvalResult<Option<ModelId>> {
        self.ensure_state(u);
        if self.states[u].out_ref_count > 1 {
            self.release_out_model(u);
            return Ok(None);
        }

        if self.states[u].current_in_model.is_none() {
            let got = self.get_next_imodel(u)?;
            if got.is_none() {
                return Ok(None);
            }
        }

        loop {
            let in_model = self.states[u].current_in_model.expect("just ensured present");
            let idx = self.states[u].out_walk_idx;
            let successors = self.model_graph.successors_of(in_model, u).to_vec();
            if idx < successors.len() {
                self.states[u].out_walk_idx = idx + 1;
                self.states[u].out_ref_count = 1;
                let projected = self.project(u, successors[idx])?;
                return Ok(Some(projected));
            }

            let generated = self.model_graph.get(in_model).map(|m| m.child_models_generated).unwrap_or(true);
            if !generated {
                if self.states[u].generator.is_none() {
                    let input = self
                        .model_graph
                        .get(in_model)
                        .and_then(|m| m.interpretation.clone())
                        .unwrap_or_default();
                    let gen = self.factory.create(u, &input);
                    self.states[u].generator = Some(gen);
                }
                let next = self.states[u].generator.as_mut().expect("just set").next_model()?;
                match next {
                    Some(facts) => {
                        let iproject = self.eval_graph.units[u].iproject;
                        let out_id = self.model_graph.add_out_model(u, Some(in_model), iproject, Some(facts))?;
                        self.states[u].out_walk_idx = idx + 1;
                        self.states[u].out_ref_count = 1;
                        let projected = self.project(u, out_id)?;
                        return Ok(Some(projected));
                    }
                    None => {
                        self.model_graph.mark_child_models_generated(in_model);
                        self.states[u].generator = None;
                        continue;
                    }
                }
            }

            let got = self.get_next_imodel(u)?;
            if got.is_none() {
                return Ok(None);
            }
            self.states[u].out_walk_idx = 0;
        }
    }

    /// Wrap `out_id` in an OUTPROJ model if `u` projects its output,
    /// reusing an already-materialized one (spec §4.9: "projection logic
    /// ... must be externally invisible").
    fn project(&mut self, u: EvalUnitId, out_id: ModelId) -> EvalResult<ModelId> {
        if !self.eval_graph.units[u].oproject {
            return Ok(out_id);
        }
        if let Some(&existing) = self.model_graph.successors_of(out_id, u).first() {
            return Ok(existing);
        }
        let interp = self.model_graph.get(out_id).and_then(|m| m.interpretation.clone());
        self.model_graph.add_outproj_model(u, out_id, interp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;

    struct CountingGenerator {
        remaining: u32,
    }

    impl ModelGenerator for CountingGenerator {
        fn next_model(&mut self) -> EvalResult<Option<Interpretation>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            let mut interp = Interpretation::new();
            interp.set_fact(self.remaining);
            Ok(Some(interp))
        }
    }

    struct FixedCountFactory {
        count: u32,
    }

    impl ModelGeneratorFactory for FixedCountFactory {
        fn create(&mut self, _unit: EvalUnitId, _input: &Interpretation) -> Box<dyn ModelGenerator> {
            Box::new(CountingGenerator { remaining: self.count })
        }
    }

    #[test]
    fn single_unit_yields_exactly_its_generator_count() -> Result<(), EvalError> {
        let mut eg = EvalGraph::new();
        let u = eg.create_eval_unit(vec![], vec![], vec![])?;
        let mut builder = OnlineModelBuilder::new(&eg, Box::new(FixedCountFactory { count: 3 }));

        let mut produced = 0;
        while builder.get_next_omodel(u)?.is_some() {
            builder.release_out_model(u);
            produced += 1;
        }
        assert_eq!(produced, 3);
        Ok(())
    }

    #[test]
    fn repeated_omodel_after_release_advances() -> Result<(), EvalError> {
        let mut eg = EvalGraph::new();
        let u = eg.create_eval_unit(vec![], vec![], vec![])?;
        let mut builder = OnlineModelBuilder::new(&eg, Box::new(FixedCountFactory { count: 2 }));

        let first = builder.get_next_omodel(u)?.expect("first model");
        builder.release_out_model(u);
        let second = builder.get_next_omodel(u)?.expect("second model");
        assert_ne!(first, second);
        builder.release_out_model(u);
        assert!(builder.get_next_omodel(u)?.is_none());
        Ok(())
    }
}
