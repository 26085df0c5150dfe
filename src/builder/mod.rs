//! Online/offline model builder (component I): demand-driven join over the
//! eval graph's OUT-models, producing IN-models per unit and invoking a
//! per-unit model generator to grow OUT-models from them. Grounded on
//! `original_source/include/dlvhex/OnlineModelBuilder.tcc`'s
//! `getNextIModel`/`getNextOModel` state machine and `BaseModelGenerator`
//! hierarchy.

pub mod offline;
pub mod online;

use crate::error::EvalResult;
use crate::eval_graph::EvalUnitId;
use crate::interpretation::Interpretation;

/// One step of answer-set generation for a single eval unit, given the
/// facts contributed by its held IN-model. Matches the original's
/// `ModelGeneratorBase` interface, subclassed per backend (internal CDNL,
/// external ASP solver process, or a pass-through for units carrying only
/// external atoms).
pub trait ModelGenerator {
    /// Produce the next OUT-model for this input, or `None` once exhausted.
    fn next_model(&mut self) -> EvalResult<Option<Interpretation>>;
}

/// Builds a unit's [`ModelGenerator`] lazily from its held IN-model's
/// facts, matching "lazily construct (or reuse) the unit's model generator
/// with the held IN-model as input" (spec §4.9).
pub trait ModelGeneratorFactory {
    fn create(&mut self, unit: EvalUnitId, input: &Interpretation) -> Box<dyn ModelGenerator>;
}
