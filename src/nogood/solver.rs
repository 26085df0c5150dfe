//! Conflict-driven nogood learning solver. Grounded on
//! `original_source/include/dlvhex/CDNLSolver.hpp`'s field layout and
//! method set (`setFact`/`clearFact`/`unitPropagation`/`analysis`/
//! `resolve`/`backtrack`/`getGuess`/`getNextModel`). The original's
//! two-watched-literal bookkeeping is an efficiency device over the same
//! propagation semantics; this implementation rescans all live nogoods to
//! fixpoint each round instead of maintaining incremental watch lists.

use crate::error::{BackendError, EvalError, EvalResult};
use crate::id::Id;
use crate::interpretation::Interpretation;
use crate::nogood::{resolve, Nogood, NogoodSet, SolverStatistics};
use std::collections::{HashMap, VecDeque};

/// `cause.get(&addr) == Some(None)` means the fact at that address was a
/// decision literal, matching `isDecisionLiteral`.
type Cause = Option<usize>;

pub struct CdnlSolver {
    nogoods: NogoodSet,
    all_facts: Vec<u32>,
    interpretation: Interpretation,
    fact_was_set: Interpretation,

    decision_level: HashMap<u32, i32>,
    cause: HashMap<u32, Cause>,
    current_dl: i32,
    assignment_order: Vec<u32>,
    facts_on_decision_level: Vec<Vec<u32>>,
    decision_literal_of_decision_level: HashMap<i32, Id>,

    conflicts_since_rescale: u32,
    conflict_counter_cap: u32,
    var_counter_pos: HashMap<u32, u32>,
    var_counter_neg: HashMap<u32, u32>,
    recent_conflicts: VecDeque<usize>,
    recent_conflicts_window: usize,

    stats: SolverStatistics,

    model_returned: bool,
}

impl CdnlSolver {
    pub fn new(
        all_facts: Vec<u32>,
        initial_nogoods: NogoodSet,
        conflict_counter_cap: u32,
        recent_conflicts_window: usize,
    ) -> Self {
        let mut solver = CdnlSolver {
            nogoods: NogoodSet::new(),
            all_facts,
            interpretation: Interpretation::new(),
            fact_was_set: Interpretation::new(),
            decision_level: HashMap::new(),
            cause: HashMap::new(),
            current_dl: 0,
            assignment_order: Vec::new(),
            facts_on_decision_level: vec![Vec::new()],
            decision_literal_of_decision_level: HashMap::new(),
            conflicts_since_rescale: 0,
            conflict_counter_cap,
            var_counter_pos: HashMap::new(),
            var_counter_neg: HashMap::new(),
            recent_conflicts: VecDeque::new(),
            recent_conflicts_window,
            stats: SolverStatistics::default(),
            model_returned: false,
        };
        for (_, ng) in initial_nogoods.iter() {
            solver.add_nogood(ng.clone());
        }
        solver
    }

    pub fn statistics(&self) -> SolverStatistics {
        self.stats
    }

    /// The assignment as built so far (may be partial mid-search).
    pub(crate) fn current_interpretation(&self) -> &Interpretation {
        &self.interpretation
    }

    pub(crate) fn current_fact_was_set(&self) -> &Interpretation {
        &self.fact_was_set
    }

    #[inline]
    pub fn create_literal(address: u32, truth_value: bool) -> Id {
        use crate::id::{MAINKIND_LITERAL, SUBKIND_ATOM_ORDINARYG};
        let kind = MAINKIND_LITERAL | SUBKIND_ATOM_ORDINARYG;
        let lit = Id::new(kind, address);
        if truth_value {
            lit
        } else {
            lit.negated()
        }
    }

    fn assigned(&self, address: u32) -> bool {
        self.fact_was_set.get_fact(address)
    }

    fn satisfied(&self, lit: Id) -> bool {
        self.assigned(lit.address) && self.interpretation.get_fact(lit.address) == !lit.is_naf()
    }

    fn falsified(&self, lit: Id) -> bool {
        self.assigned(lit.address) && self.interpretation.get_fact(lit.address) != !lit.is_naf()
    }

    fn complete(&self) -> bool {
        self.all_facts.iter().all(|&a| self.assigned(a))
    }

    /// Register a nogood and bump the activity of its literals, matching
    /// `touchVarsInNogood` + `addNogood`.
    pub fn add_nogood(&mut self, ng: Nogood) -> usize {
        for &lit in &ng.literals {
            if lit.is_naf() {
                *self.var_counter_neg.entry(lit.address).or_insert(0) += 1;
            } else {
                *self.var_counter_pos.entry(lit.address).or_insert(0) += 1;
            }
        }
        self.nogoods.add(ng)
    }

    pub fn remove_nogood(&mut self, idx: usize) {
        self.nogoods.remove(idx);
    }

    pub fn nogood_count(&self) -> usize {
        self.nogoods.count()
    }

    fn set_fact(&mut self, lit: Id, dl: i32, cause: Cause) {
        let addr = lit.address;
        let value = !lit.is_naf();
        if value {
            self.interpretation.set_fact(addr);
        } else {
            self.interpretation.clear_fact(addr);
        }
        self.fact_was_set.set_fact(addr);
        self.decision_level.insert(addr, dl);
        self.cause.insert(addr, cause);
        self.assignment_order.push(addr);
        while self.facts_on_decision_level.len() <= dl as usize {
            self.facts_on_decision_level.push(Vec::new());
        }
        self.facts_on_decision_level[dl as usize].push(addr);
        self.stats.assignments += 1;
    }

    fn clear_fact(&mut self, address: u32) {
        self.fact_was_set.clear_fact(address);
        self.decision_level.remove(&address);
        self.cause.remove(&address);
    }

    /// Rescan every live nogood to fixpoint. Returns the index of a
    /// violated nogood on conflict, matching `unitPropagation`.
    fn unit_propagation(&mut self) -> Option<usize> {
        loop {
            let indices: Vec<usize> = self.nogoods.iter().map(|(i, _)| i).collect();
            let mut progressed = false;
            for idx in indices {
                let Some(literals) = self.nogoods.get(idx).map(|ng| ng.literals.clone()) else {
                    continue;
                };
                let mut unassigned: Option<Id> = None;
                let mut unassigned_count = 0usize;
                let mut any_falsified = false;
                for &l in &literals {
                    if self.falsified(l) {
                        any_falsified = true;
                        break;
                    }
                    if !self.satisfied(l) {
                        unassigned_count += 1;
                        unassigned = Some(l);
                    }
                }
                if any_falsified {
                    continue;
                }
                if unassigned_count == 0 {
                    return Some(idx);
                }
                if unassigned_count == 1 {
                    let forced = unassigned.expect("unassigned_count == 1");
                    if !self.assigned(forced.address) {
                        self.set_fact(forced.negated(), self.current_dl, Some(idx));
                        progressed = true;
                    }
                }
            }
            if !progressed {
                return None;
            }
        }
    }

    /// 1-UIP conflict analysis: resolve the violated nogood against the
    /// causes of its current-decision-level literals until exactly one
    /// literal at the current level remains. Matches `analysis`.
    fn analyze(&mut self, violated_idx: usize) -> (Nogood, i32) {
        let mut current = self.nogoods.get(violated_idx).expect("violated nogood exists").clone();
        loop {
            let at_current_dl: Vec<Id> = current
                .literals
                .iter()
                .copied()
                .filter(|l| self.decision_level.get(&l.address) == Some(&self.current_dl))
                .collect();
            if at_current_dl.len() <= 1 {
                break;
            }
            let pick = self.assignment_order.iter().rev().find_map(|&addr| {
                if at_current_dl.iter().any(|l| l.address == addr)
                    && matches!(self.cause.get(&addr), Some(Some(_)))
                {
                    Some(addr)
                } else {
                    None
                }
            });
            let Some(addr) = pick else { break };
            let cause_idx = self.cause[&addr].expect("picked only addresses with a cause");
            let Some(cause_ng) = self.nogoods.get(cause_idx).cloned() else { break };
            current = resolve(&current, &cause_ng, addr);
            self.stats.resolution_steps += 1;
        }
        let backtrack_dl = current
            .literals
            .iter()
            .filter_map(|l| self.decision_level.get(&l.address).copied())
            .filter(|&dl| dl != self.current_dl)
            .max()
            .unwrap_or(0);
        (current, backtrack_dl)
    }

    fn backtrack(&mut self, dl: i32) {
        while self.facts_on_decision_level.len() as i32 > dl + 1 {
            let level_facts = self.facts_on_decision_level.pop().expect("level exists");
            for addr in level_facts {
                self.clear_fact(addr);
            }
        }
        self.decision_literal_of_decision_level.retain(|&level, _| level <= dl);
        self.current_dl = dl;
        self.stats.backtracks += 1;
    }

    /// Halve every activity counter once `conflict_counter_cap` conflicts
    /// have accumulated since the last rescale.
    fn maybe_rescale_counters(&mut self) {
        self.conflicts_since_rescale += 1;
        if self.conflicts_since_rescale >= self.conflict_counter_cap {
            for v in self.var_counter_pos.values_mut() {
                *v /= 2;
            }
            for v in self.var_counter_neg.values_mut() {
                *v /= 2;
            }
            self.conflicts_since_rescale = 0;
        }
    }

    fn record_conflict(&mut self, idx: usize) {
        self.stats.detected_conflicts += 1;
        self.recent_conflicts.push_back(idx);
        while self.recent_conflicts.len() > self.recent_conflicts_window {
            self.recent_conflicts.pop_front();
        }
        self.maybe_rescale_counters();
    }

    /// Pick the next unassigned atom by activity, most-active-polarity
    /// first. Matches `getGuess`/`varCounterPos`/`varCounterNeg`.
    fn get_guess(&self) -> Option<Id> {
        let mut best: Option<(u32, u32, bool)> = None;
        for &addr in &self.all_facts {
            if self.assigned(addr) {
                continue;
            }
            let pos = self.var_counter_pos.get(&addr).copied().unwrap_or(0);
            let neg = self.var_counter_neg.get(&addr).copied().unwrap_or(0);
            let score = pos + neg;
            let better = match best {
                None => true,
                Some((_, best_score, _)) => score > best_score,
            };
            if better {
                best = Some((addr, score, pos >= neg));
            }
        }
        best.map(|(addr, _, truth)| Self::create_literal(addr, truth))
    }

    /// Flip the most recent decision literal in place, without growing the
    /// decision level, so the other branch under it is explored next.
    /// Matches `flipDecisionLiteral`.
    fn flip_decision_literal(&mut self) -> bool {
        let Some(&lit) = self.decision_literal_of_decision_level.get(&self.current_dl) else {
            return false;
        };
        let dl = self.current_dl;
        self.backtrack(dl - 1);
        self.current_dl = dl;
        let flipped = lit.negated();
        self.set_fact(flipped, dl, None);
        self.decision_literal_of_decision_level.remove(&dl);
        true
    }

    /// Advance past the model just returned, matching `handlePreviousModel`:
    /// try flipping the innermost decision; if every decision level has
    /// already been flipped, the search space is exhausted.
    fn handle_previous_model(&mut self) -> bool {
        loop {
            if self.current_dl == 0 {
                return false;
            }
            if self.decision_literal_of_decision_level.contains_key(&self.current_dl) {
                return self.flip_decision_literal();
            }
            let dl = self.current_dl;
            self.backtrack(dl - 1);
        }
    }

    /// Enumerate the next answer set, or `None` once the search space is
    /// exhausted. Matches `getNextModel`.
    pub fn get_next_model(&mut self) -> EvalResult<Option<Interpretation>> {
        if self.model_returned && !self.handle_previous_model() {
            return Ok(None);
        }
        self.drive()
    }

    /// Treat `ng` as a freshly detected conflict against the just-completed
    /// assignment and resume search, instead of accepting that assignment as
    /// a model. Used by callers layered on top of the core CDNL loop (the
    /// grounder's unfounded-set check and external learning hook) that need
    /// to reject a syntactically complete, nogood-consistent assignment for
    /// reasons the core nogood set doesn't capture yet. Matches
    /// `InternalGroundASPSolver::getNextModel`'s pattern of calling
    /// `addNogood` on a loop nogood and re-entering the search instead of
    /// returning the candidate directly.
    pub(crate) fn inject_conflict(&mut self, ng: Nogood) -> EvalResult<Option<Interpretation>> {
        let idx = self.add_nogood(ng);
        self.record_conflict(idx);
        if self.current_dl == 0 {
            return Ok(None);
        }
        let (learned, backtrack_dl) = self.analyze(idx);
        if learned.is_empty() {
            return Err(EvalError::BackendExhausted(BackendError::OracleException {
                name: "cdnl".into(),
                message: "learned the empty nogood; program is unconditionally inconsistent".into(),
            }));
        }
        self.add_nogood(learned);
        self.backtrack(backtrack_dl);
        self.model_returned = false;
        self.drive()
    }

    fn drive(&mut self) -> EvalResult<Option<Interpretation>> {
        loop {
            match self.unit_propagation() {
                Some(conflict_idx) => {
                    self.record_conflict(conflict_idx);
                    if self.current_dl == 0 {
                        return Ok(None);
                    }
                    let (learned, backtrack_dl) = self.analyze(conflict_idx);
                    if learned.is_empty() {
                        return Err(EvalError::BackendExhausted(BackendError::OracleException {
                            name: "cdnl".into(),
                            message: "learned the empty nogood; program is unconditionally inconsistent".into(),
                        }));
                    }
                    self.add_nogood(learned);
                    self.backtrack(backtrack_dl);
                }
                None => {
                    if self.complete() {
                        self.model_returned = true;
                        return Ok(Some(self.interpretation.clone()));
                    }
                    let Some(guess) = self.get_guess() else {
                        self.model_returned = true;
                        return Ok(Some(self.interpretation.clone()));
                    };
                    self.current_dl += 1;
                    self.stats.guesses += 1;
                    self.decision_literal_of_decision_level.insert(self.current_dl, guess);
                    self.set_fact(guess, self.current_dl, None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{self, Id};

    fn atom(addr: u32) -> Id {
        Id::new(id::MAINKIND_ATOM | id::SUBKIND_ATOM_ORDINARYG, addr)
    }

    #[test]
    fn single_unit_nogood_forces_fact_true() {
        let mut ns = NogoodSet::new();
        // {not a} is a nogood: a must be true.
        ns.add(Nogood::new(vec![CdnlSolver::create_literal(0, false)]));
        let mut solver = CdnlSolver::new(vec![0], ns, 255, 16);
        let model = solver.get_next_model().unwrap().expect("one model exists");
        assert!(model.get_fact(0));
        assert!(solver.get_next_model().unwrap().is_none());
    }

    #[test]
    fn two_independent_atoms_yield_four_models() {
        let ns = NogoodSet::new();
        let mut solver = CdnlSolver::new(vec![0, 1], ns, 255, 16);
        let mut count = 0;
        while solver.get_next_model().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 4);
    }

    #[test]
    fn conflicting_unit_nogoods_yield_no_model() {
        let mut ns = NogoodSet::new();
        ns.add(Nogood::new(vec![CdnlSolver::create_literal(0, false)]));
        ns.add(Nogood::new(vec![CdnlSolver::create_literal(0, true)]));
        let mut solver = CdnlSolver::new(vec![0], ns, 255, 16);
        assert!(solver.get_next_model().unwrap().is_none());
    }

    #[test]
    fn exactly_one_of_two_atoms_true() {
        // nogood {a, b}: not both true. nogood {not a, not b}: not both false.
        let mut ns = NogoodSet::new();
        let a = atom(0);
        let b = atom(1);
        ns.add(Nogood::new(vec![Id::pos_literal_from_atom(a), Id::pos_literal_from_atom(b)]));
        ns.add(Nogood::new(vec![
            Id::naf_literal_from_atom(a),
            Id::naf_literal_from_atom(b),
        ]));
        let mut solver = CdnlSolver::new(vec![0, 1], ns, 255, 16);
        let mut models = Vec::new();
        while let Some(m) = solver.get_next_model().unwrap() {
            models.push((m.get_fact(0), m.get_fact(1)));
        }
        assert_eq!(models.len(), 2);
        assert!(models.contains(&(true, false)));
        assert!(models.contains(&(false, true)));
    }
}
