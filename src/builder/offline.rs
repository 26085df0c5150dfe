//! Offline (exhaustive) model builder: a thin driver over
//! [`OnlineModelBuilder`] that runs a unit's OUT-model generation to
//! exhaustion rather than returning one model per call, materializing
//! every model the join recursion touches along the way (spec §4.9).

use super::ModelGeneratorFactory;
use crate::error::EvalResult;
use crate::eval_graph::{EvalGraph, EvalUnitId};
use crate::model_graph::{ModelGraph, ModelId};

use super::online::OnlineModelBuilder;

pub struct OfflineModelBuilder<'g> {
    online: OnlineModelBuilder<'g>,
}

impl<'g> OfflineModelBuilder<'g> {
    pub fn new(eval_graph: &'g EvalGraph, factory: Box<dyn ModelGeneratorFactory>) -> Self {
        OfflineModelBuilder { online: OnlineModelBuilder::new(eval_graph, factory) }
    }

    pub fn model_graph(&self) -> &ModelGraph {
        self.online.model_graph()
    }

    /// Every OUT-model (or OUTPROJ, if `unit` projects) of `unit`; driving
    /// this to exhaustion also materializes every predecessor IN/OUT-model
    /// the join recursion needed along the way.
    pub fn materialize_all(&mut self, unit: EvalUnitId) -> EvalResult<Vec<ModelId>> {
        let mut out = Vec::new();
        while let Some(m) = self.online.get_next_omodel(unit)? {
            out.push(m);
            self.online.release_out_model(unit);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::interpretation::Interpretation;
    use crate::builder::ModelGenerator;

    struct CountingGenerator {
        remaining: u32,
    }

    impl ModelGenerator for CountingGenerator {
        fn next_model(&mut self) -> EvalResult<Option<Interpretation>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(Interpretation::new()))
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
    fn materializes_every_model_a_chained_unit_produces() -> Result<(), EvalError> {
        let mut eg = EvalGraph::new();
        let root = eg.create_eval_unit(vec![], vec![], vec![])?;
        let leaf = eg.create_eval_unit(vec![], vec![], vec![root])?;

        let mut builder = OfflineModelBuilder::new(&eg, Box::new(FixedCountFactory { count: 2 }));
        let models = builder.materialize_all(leaf)?;
        // each of root's 2 OUT-models joins with leaf's own 2 OUT-models.
        assert_eq!(models.len(), 4);
        Ok(())
    }
}
