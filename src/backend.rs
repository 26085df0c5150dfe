//! ASP backend contract (spec §6): a process or library consuming a
//! ground program over registry handles and yielding a duplicate-free
//! stream of answer sets, `None`-terminated. Grounded on
//! `original_source/include/dlvhex/ASPSolver.hpp`'s `ASPSolverManager`
//! abstraction over external solver processes; `builder::ModelGenerator`
//! is the consumer-facing adapter over this trait for eval units that
//! delegate to an external backend instead of the internal grounder.

use crate::error::EvalResult;
use crate::grounder::GroundProgram;
use crate::interpretation::Interpretation;

/// A backend capable of enumerating answer sets of a ground program.
/// Matches spec §6: "must not produce duplicate models... termination is
/// indicated by a `None` on the next request."
pub trait AspBackend {
    /// Begin a fresh enumeration of `program`'s answer sets.
    fn start(&mut self, program: &GroundProgram) -> EvalResult<()>;

    /// The next answer set, or `None` once the stream is exhausted.
    /// Errors here (spec §7 kind 3: broken pipe, subprocess death, oracle
    /// exception) are not fatal on their own — callers map them to the
    /// current alternative's exhaustion and backtrack, matching
    /// `error::BackendError`'s doc note.
    fn next_answer_set(&mut self) -> EvalResult<Option<Interpretation>>;
}

/// Adapts any [`AspBackend`] to the [`crate::builder::ModelGenerator`]
/// contract the online/offline builder drives units through.
pub struct BackendModelGenerator<B: AspBackend> {
    backend: B,
    started: bool,
    program: GroundProgram,
}

impl<B: AspBackend> BackendModelGenerator<B> {
    pub fn new(backend: B, program: GroundProgram) -> Self {
        BackendModelGenerator { backend, started: false, program }
    }
}

impl<B: AspBackend> crate::builder::ModelGenerator for BackendModelGenerator<B> {
    fn next_model(&mut self) -> EvalResult<Option<Interpretation>> {
        if !self.started {
            self.backend.start(&self.program)?;
            self.started = true;
        }
        self.backend.next_answer_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModelGenerator;

    struct FixedBackend {
        models: Vec<Interpretation>,
    }

    impl AspBackend for FixedBackend {
        fn start(&mut self, _program: &GroundProgram) -> EvalResult<()> {
            Ok(())
        }
        fn next_answer_set(&mut self) -> EvalResult<Option<Interpretation>> {
            Ok(self.models.pop())
        }
    }

    #[test]
    fn generator_starts_lazily_then_drains_backend() {
        let mut interp = Interpretation::new();
        interp.set_fact(0);
        let backend = FixedBackend { models: vec![interp] };
        let program = GroundProgram { rules: vec![], facts: vec![] };
        let mut gen = BackendModelGenerator::new(backend, program);
        assert!(gen.next_model().unwrap().is_some());
        assert!(gen.next_model().unwrap().is_none());
    }
}
