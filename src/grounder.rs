//! Internal grounder (component D): turns a ground program into the nogood
//! set CDNL solves, plus the unfounded-set machinery that catches answer
//! candidates support-free loops would otherwise let through. Grounded on
//! `original_source/include/dlvhex/InternalGroundASPSolver.hpp`'s
//! `computeClarkCompletion`/`createShiftedProgram`/`createSingularLoopNogoods`/
//! `computeDepGraph`/`computeStronglyConnectedComponents`/`initSourcePointers`/
//! `getUnfoundedSet` pipeline. Where the original keeps its own dependency
//! graph over ground atoms, this reuses [`petgraph`] the way `depgraph`/
//! `component_graph` do rather than a second bespoke adjacency list.

use crate::error::EvalResult;
use crate::id::{self, Id};
use crate::interpretation::Interpretation;
use crate::nogood::solver::CdnlSolver;
use crate::nogood::{Nogood, NogoodSet};
use crate::registry::Registry;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Invoked after a candidate model completes propagation, with the current
/// (possibly partial) interpretation plus the was-set bitset; may contribute
/// further nogoods. Matches `LearningCallback::learn`.
pub trait ExternalLearner {
    fn learn(&mut self, interpretation: &Interpretation, fact_was_set: &Interpretation) -> Vec<Nogood>;
}

/// A ground program: rules and facts, all already fully instantiated.
pub struct GroundProgram {
    pub rules: Vec<Id>,
    pub facts: Vec<Id>,
}

/// Built once from a [`GroundProgram`]; owns everything the original's
/// initialization members (`computeClarkCompletion`, `createShiftedProgram`,
/// `createSingularLoopNogoods`, `computeDepGraph`,
/// `computeStronglyConnectedComponents`, `initSourcePointers`) compute up
/// front, plus the running unfounded-set state the `setFact`/`clearFact`
/// overrides maintain incrementally in the original.
pub struct Grounder {
    component_of_atom: HashMap<u32, usize>,
    components: Vec<HashSet<u32>>,
    rules_with_head_atom: HashMap<u32, Vec<Id>>,
    body_atom_of_rule: HashMap<Id, Id>,
    /// Current source rule per founded atom, or `None` if currently
    /// unfounded. A coarser stand-in for the original's fully incremental
    /// `sourceRule`/`foundedAtomsOfBodyAtom` pair: rather than revoking and
    /// reassigning sources edge-by-edge inside `setFact`/`clearFact`, this
    /// is recomputed by [`Self::unfounded_set_check`] against each complete
    /// candidate, since the core CDNL loop does not call back into the
    /// grounder per assignment (see `DESIGN.md`).
    source_rule: HashMap<u32, Option<Id>>,
    learners: Vec<Box<dyn ExternalLearner>>,
    detected_unfounded_sets: u64,
}

impl Grounder {
    pub fn add_external_learner(&mut self, learner: Box<dyn ExternalLearner>) {
        self.learners.push(learner);
    }

    pub fn detected_unfounded_sets(&self) -> u64 {
        self.detected_unfounded_sets
    }

    /// Build the grounder state and the initial nogood set for a ground
    /// program, creating fresh auxiliary body atoms in `registry` as it
    /// goes. Matches the original constructor's initialization sequence.
    pub fn build(registry: &mut Registry, program: &GroundProgram) -> (Grounder, NogoodSet) {
        let mut nogoods = NogoodSet::new();
        let mut body_atom_of_rule = HashMap::new();

        for &fact in &program.facts {
            nogoods.add(Nogood::new(vec![Id::naf_literal_from_atom(fact)]));
        }

        for &rule_handle in &program.rules {
            let Ok(rule) = registry.rules.get(rule_handle).map(|r| r.clone()) else { continue };
            let body_atom = fresh_body_atom(registry, rule_handle);
            body_atom_of_rule.insert(rule_handle, body_atom);
            support_body_atom(&mut nogoods, body_atom, &rule.body);
            if rule.head.len() == 1 {
                support_head_from_body(&mut nogoods, rule.head[0], body_atom);
            }
        }

        compute_clark_completion(&mut nogoods, registry, &program.rules, &body_atom_of_rule);
        let shifted = create_shifted_program(registry, &program.rules);
        for &shifted_rule in &shifted {
            let Ok(rule) = registry.rules.get(shifted_rule).map(|r| r.clone()) else { continue };
            let body_atom = fresh_body_atom(registry, shifted_rule);
            support_body_atom(&mut nogoods, body_atom, &rule.body);
            support_head_from_body(&mut nogoods, rule.head[0], body_atom);
        }

        let rules_with_head_atom = index_rules_by_head(registry, &program.rules);

        let (component_of_atom, components) =
            compute_components(registry, &program.rules, &rules_with_head_atom);

        create_singular_loop_nogoods(
            &mut nogoods,
            registry,
            &program.rules,
            &component_of_atom,
            &body_atom_of_rule,
        );

        let grounder = Grounder {
            component_of_atom,
            components,
            rules_with_head_atom,
            body_atom_of_rule,
            source_rule: HashMap::new(),
            learners: Vec::new(),
            detected_unfounded_sets: 0,
        };
        (grounder, nogoods)
    }

    pub fn component_of(&self, atom_addr: u32) -> Option<usize> {
        self.component_of_atom.get(&atom_addr).copied()
    }

    /// Record that `rule`'s body currently being satisfied makes it a
    /// candidate source for its head atom, and that `head`'s previous source
    /// (if any) is superseded. Matches `addSourceToAtom`/`removeSourceFromAtom`
    /// called from the original's `setFact` override.
    pub fn set_source(&mut self, head_addr: u32, rule: Option<Id>) {
        self.source_rule.insert(head_addr, rule);
    }

    pub fn clear_source(&mut self, head_addr: u32) {
        self.source_rule.remove(&head_addr);
    }

    /// True if `atom` currently has no recorded source rule, i.e. nothing in
    /// the current partial assignment justifies it being true. Matches a
    /// single-atom read of `unfoundedAtoms`.
    pub fn is_unfounded(&self, atom_addr: u32) -> bool {
        !matches!(self.source_rule.get(&atom_addr), Some(Some(_)))
    }

    /// Before accepting `candidate` as an answer set, check every true atom
    /// in a nontrivial component for a founding rule whose positive body is
    /// also satisfied; atoms that have none are fed a loop nogood. Matches
    /// `getUnfoundedSet`/`getLoopNogood` plus the post-check in the
    /// original's `getNextModel`.
    pub fn unfounded_set_check(&mut self, registry: &Registry, candidate: &Interpretation) -> Option<Nogood> {
        for component in &self.components {
            if component.len() <= 1 {
                continue;
            }
            let true_in_component: HashSet<u32> =
                component.iter().copied().filter(|&a| candidate.get_fact(a)).collect();
            if true_in_component.is_empty() {
                continue;
            }
            let ufs = self.unfounded_subset(registry, candidate, &true_in_component);
            if !ufs.is_empty() {
                self.detected_unfounded_sets += 1;
                return Some(self.loop_nogood(registry, &ufs));
            }
        }
        None
    }

    /// Atoms in `true_in_component` whose every founding rule either has a
    /// falsified body literal or heads into the same unfounded candidate set
    /// (so the rule can't be an *external* source), computed by repeatedly
    /// removing atoms that do have an external support until a fixpoint.
    /// Matches `getUnfoundedSet`'s greedy shrink.
    fn unfounded_subset(
        &self,
        registry: &Registry,
        candidate: &Interpretation,
        true_in_component: &HashSet<u32>,
    ) -> HashSet<u32> {
        let mut remaining = true_in_component.clone();
        loop {
            let supported: HashSet<u32> = remaining
                .iter()
                .copied()
                .filter(|&a| self.has_external_support(registry, candidate, a, &remaining))
                .collect();
            if supported.is_empty() {
                return remaining;
            }
            for a in &supported {
                remaining.remove(a);
            }
            if remaining.is_empty() {
                return remaining;
            }
        }
    }

    /// An atom is externally supported w.r.t. `ufs` if some rule with it in
    /// the head has every *other* head atom false in `candidate` and a
    /// positive body satisfied entirely outside `ufs` (and no falsified
    /// literal). The head condition matters for disjunctive rules: `a v b.`
    /// only supports `a` in candidates where `b` is false, never
    /// unconditionally just because the (empty) body holds. Matches
    /// `doesRuleExternallySupportLiteral`.
    fn has_external_support(
        &self,
        registry: &Registry,
        candidate: &Interpretation,
        atom_addr: u32,
        ufs: &HashSet<u32>,
    ) -> bool {
        let Some(rules) = self.rules_with_head_atom.get(&atom_addr) else { return false };
        rules.iter().any(|&rule_handle| {
            let Ok(rule) = registry.rules.get(rule_handle) else { return false };
            let other_heads_false = rule.head.iter().all(|&head_lit| {
                let head = Id::atom_from_literal(head_lit);
                head.address == atom_addr || !candidate.get_fact(head.address)
            });
            other_heads_false
                && rule.body.iter().all(|&lit| {
                    let atom = Id::atom_from_literal(lit);
                    let truth = candidate.get_fact(atom.address);
                    let satisfied = truth != lit.is_naf();
                    satisfied && (lit.is_naf() || !ufs.contains(&atom.address))
                })
        })
    }

    /// `{T(a) : a in ufs} ∪ {F(b) : b a positive body atom of some ufs-head
    /// rule, outside ufs} ∪ {T(h) : h a sibling head atom of some ufs-head
    /// rule, outside ufs}`: forbids exactly the support-free combination the
    /// unfounded-set check just found, generalizing the original's
    /// `getLoopNogood` to multiple unfounded atoms at once. The sibling-head
    /// set mirrors [`Self::has_external_support`]'s head condition: forcing
    /// every such atom false would let its rule support the ufs atom (the
    /// disjunct not taken), so forcing it true is what closes off that route,
    /// the mirror image of forcing an external body atom false to close off
    /// the body route.
    fn loop_nogood(&self, registry: &Registry, ufs: &HashSet<u32>) -> Nogood {
        let mut literals: Vec<Id> = ufs
            .iter()
            .map(|&a| CdnlSolver::create_literal(a, true))
            .collect();
        let mut external_bodies: HashSet<u32> = HashSet::new();
        let mut external_heads: HashSet<u32> = HashSet::new();
        for &a in ufs {
            let Some(rules) = self.rules_with_head_atom.get(&a) else { continue };
            for &rule_handle in rules {
                let Ok(rule) = registry.rules.get(rule_handle) else { continue };
                for &head_lit in &rule.head {
                    let head = Id::atom_from_literal(head_lit);
                    if head.address != a && !ufs.contains(&head.address) {
                        external_heads.insert(head.address);
                    }
                }
                for &lit in &rule.body {
                    let atom = Id::atom_from_literal(lit);
                    if !lit.is_naf() && !ufs.contains(&atom.address) {
                        external_bodies.insert(atom.address);
                    }
                }
            }
        }
        for addr in external_bodies {
            literals.push(CdnlSolver::create_literal(addr, false));
        }
        for addr in external_heads {
            literals.push(CdnlSolver::create_literal(addr, true));
        }
        Nogood::new(literals)
    }

    /// Run every registered external learner against the current partial
    /// assignment, matching the "invokes learners after each propagation
    /// fixpoint" contract. A full per-fixpoint hook would require the core
    /// CDNL loop to call back into the grounder after every round of
    /// `unit_propagation`; here it is invoked once per completed candidate,
    /// which is the coarsest point at which the grounder currently observes
    /// the solver (see `DESIGN.md`).
    pub fn run_external_learners(&mut self, interpretation: &Interpretation, fact_was_set: &Interpretation) -> Vec<Nogood> {
        let mut learned = Vec::new();
        for learner in &mut self.learners {
            learned.extend(learner.learn(interpretation, fact_was_set));
        }
        learned
    }
}

/// Ties [`Grounder`] and [`CdnlSolver`] into the
/// [`crate::builder::ModelGenerator`] contract a unit's model builder
/// drives: each call advances the CDNL search and rejects any syntactically
/// complete candidate an unfounded-set check or a registered external
/// learner invalidates before handing one back, matching
/// `InternalGroundASPSolver::getNextModel`'s own retry loop around
/// `CDNLSolver::getNextModel`.
pub struct InternalModelGenerator {
    registry: Registry,
    grounder: Grounder,
    solver: CdnlSolver,
}

impl InternalModelGenerator {
    /// `registry` must already contain every atom/rule handle `program`
    /// references; the grounder adds its own auxiliary atoms to it as part
    /// of construction.
    pub fn new(
        mut registry: Registry,
        program: &GroundProgram,
        all_facts: Vec<u32>,
        conflict_counter_cap: u32,
        recent_conflicts_window: usize,
    ) -> Self {
        let (grounder, nogoods) = Grounder::build(&mut registry, program);
        let solver = CdnlSolver::new(all_facts, nogoods, conflict_counter_cap, recent_conflicts_window);
        InternalModelGenerator { registry, grounder, solver }
    }
}

impl crate::builder::ModelGenerator for InternalModelGenerator {
    fn next_model(&mut self) -> EvalResult<Option<Interpretation>> {
        let mut candidate = self.solver.get_next_model()?;
        loop {
            let Some(c) = candidate else { return Ok(None) };
            if let Some(loop_ng) = self.grounder.unfounded_set_check(&self.registry, &c) {
                candidate = self.solver.inject_conflict(loop_ng)?;
                continue;
            }
            // the candidate is complete, so it doubles as the was-set mask.
            let learned = self.grounder.run_external_learners(&c, &c);
            if let Some(ng) = learned.into_iter().next() {
                candidate = self.solver.inject_conflict(ng)?;
                continue;
            }
            return Ok(Some(c));
        }
    }
}

fn fresh_body_atom(registry: &mut Registry, rule: Id) -> Id {
    let text = format!("__body_{:x}_{}", rule.kind, rule.address);
    let pred = registry.store_constant(text.clone());
    registry.store_ordinary_atom(text, vec![pred]).with_property(id::PROPERTY_ATOM_AUX)
}

/// `body_atom <-> conjunction of the rule's body literals`: one nogood per
/// body literal (`{body_atom, not l}` / `{body_atom, l}`) ruling out the
/// body atom being true while a literal fails, plus one nogood with the full
/// body ruling out every literal holding while the body atom is false.
/// Matches `createNogoodsForRuleBody`.
fn support_body_atom(nogoods: &mut NogoodSet, body_atom: Id, body: &[Id]) {
    for &lit in body {
        nogoods.add(Nogood::new(vec![
            CdnlSolver::create_literal(body_atom.address, true),
            lit.negated(),
        ]));
    }
    let mut full_body_true = Nogood::new(vec![CdnlSolver::create_literal(body_atom.address, false)]);
    full_body_true.literals.extend(body.iter().copied());
    nogoods.add(full_body_true);
}

/// `head <-> disjunction of this head's supporting rule body atoms`, one
/// direction of Clark completion per defined atom. Matches
/// `computeClarkCompletion`.
fn compute_clark_completion(
    nogoods: &mut NogoodSet,
    registry: &Registry,
    rules: &[Id],
    body_atom_of_rule: &HashMap<Id, Id>,
) {
    let mut supporting_bodies: HashMap<u32, Vec<Id>> = HashMap::new();
    for &rule_handle in rules {
        let Ok(rule) = registry.rules.get(rule_handle) else { continue };
        if rule.head.len() != 1 {
            continue;
        }
        let head_atom = Id::atom_from_literal(rule.head[0]);
        if let Some(&body_atom) = body_atom_of_rule.get(&rule_handle) {
            supporting_bodies.entry(head_atom.address).or_default().push(body_atom);
        }
    }
    for (&head_addr, bodies) in &supporting_bodies {
        // forbid head=true while every supporting body atom is false.
        let mut ng = Nogood::new(vec![CdnlSolver::create_literal(head_addr, true)]);
        ng.literals.extend(bodies.iter().map(|b| CdnlSolver::create_literal(b.address, false)));
        nogoods.add(ng);
        // head <- body_i for each i is added separately as each body atom is
        // wired to its rule via `support_head_from_body`.
    }
}

/// `head <- body_atom`: the completed head follows once its source body is
/// derived. Used both for the regular program and the shifted disjuncts.
fn support_head_from_body(nogoods: &mut NogoodSet, head_lit: Id, body_atom: Id) {
    // forbid head=false while body_atom=true.
    nogoods.add(Nogood::new(vec![
        head_lit.negated(),
        CdnlSolver::create_literal(body_atom.address, true),
    ]));
}

/// For every disjunctive rule `a_1 ∨ ... ∨ a_n <- B`, emit the n shifted
/// rules `a_i <- B, not a_1, ..., not a_{i-1}, not a_{i+1}, ..., not a_n`,
/// marked auxiliary. Matches `createShiftedProgram`.
fn create_shifted_program(registry: &mut Registry, rules: &[Id]) -> Vec<Id> {
    let mut shifted = Vec::new();
    for &rule_handle in rules {
        let Ok(rule) = registry.rules.get(rule_handle).map(|r| r.clone()) else { continue };
        if rule.head.len() <= 1 {
            continue;
        }
        for i in 0..rule.head.len() {
            let mut body = rule.body.clone();
            for (j, &other) in rule.head.iter().enumerate() {
                if j != i {
                    body.push(other.negated());
                }
            }
            let new_rule = registry.store_rule(crate::registry::rules::Rule {
                kind: id::MAINKIND_RULE | id::SUBKIND_RULE_REGULAR,
                head: vec![rule.head[i]],
                body,
                weight: None,
                level: None,
            });
            let _ = registry.rules.mark_aux(new_rule);
            shifted.push(new_rule);
        }
    }
    shifted
}

/// Index which rules carry a given atom address in the head, over both the
/// original and shifted rules. Matches `rulesWithHeadLiteral`.
fn index_rules_by_head(registry: &Registry, rules: &[Id]) -> HashMap<u32, Vec<Id>> {
    let mut by_head: HashMap<u32, Vec<Id>> = HashMap::new();
    for &rule_handle in rules {
        let Ok(rule) = registry.rules.get(rule_handle) else { continue };
        for &lit in &rule.head {
            let atom = Id::atom_from_literal(lit);
            by_head.entry(atom.address).or_insert_with(Vec::new).push(rule_handle);
        }
    }
    by_head
}

/// SCCs of the ground program's positive-body dependency graph (atom ->
/// atom via a rule's head -> positive body literal), used for unfounded-set
/// scoping. Matches `computeDepGraph`/`computeStronglyConnectedComponents`.
fn compute_components(
    registry: &Registry,
    rules: &[Id],
    rules_with_head_atom: &HashMap<u32, Vec<Id>>,
) -> (HashMap<u32, usize>, Vec<HashSet<u32>>) {
    let mut graph: DiGraph<u32, ()> = DiGraph::new();
    let mut node_of: HashMap<u32, NodeIndex> = HashMap::new();
    let mut node_for = |addr: u32, graph: &mut DiGraph<u32, ()>, node_of: &mut HashMap<u32, NodeIndex>| -> NodeIndex {
        *node_of.entry(addr).or_insert_with(|| graph.add_node(addr))
    };

    for &head_addr in rules_with_head_atom.keys() {
        node_for(head_addr, &mut graph, &mut node_of);
    }
    for &rule_handle in rules {
        let Ok(rule) = registry.rules.get(rule_handle) else { continue };
        for &head_lit in &rule.head {
            let head_atom = Id::atom_from_literal(head_lit);
            let h = node_for(head_atom.address, &mut graph, &mut node_of);
            for &body_lit in &rule.body {
                if body_lit.is_naf() {
                    continue;
                }
                let body_atom = Id::atom_from_literal(body_lit);
                let b = node_for(body_atom.address, &mut graph, &mut node_of);
                graph.add_edge(h, b, ());
            }
        }
    }

    let sccs = tarjan_scc(&graph);
    let mut component_of_atom = HashMap::new();
    let mut components = Vec::new();
    for scc in sccs {
        let set: HashSet<u32> = scc.iter().map(|&n| graph[n]).collect();
        let idx = components.len();
        for &addr in &set {
            component_of_atom.insert(addr, idx);
        }
        components.push(set);
    }
    (component_of_atom, components)
}

/// An atom whose SCC is itself alone, with a self-loop purely through its
/// own positive dependency (a rule deriving it from itself), can never be
/// founded that way; add a nogood ruling the self-supporting rule out as a
/// source. Matches `createSingularLoopNogoods`.
fn create_singular_loop_nogoods(
    nogoods: &mut NogoodSet,
    registry: &Registry,
    rules: &[Id],
    component_of_atom: &HashMap<u32, usize>,
    body_atom_of_rule: &HashMap<Id, Id>,
) {
    for &rule_handle in rules {
        let Ok(rule) = registry.rules.get(rule_handle) else { continue };
        if rule.head.len() != 1 {
            continue;
        }
        let head_atom = Id::atom_from_literal(rule.head[0]);
        let Some(&head_component) = component_of_atom.get(&head_atom.address) else { continue };
        let self_loop = rule.body.iter().any(|&lit| {
            !lit.is_naf()
                && component_of_atom.get(&Id::atom_from_literal(lit).address) == Some(&head_component)
                && Id::atom_from_literal(lit).address == head_atom.address
        });
        if self_loop {
            if let Some(&body_atom) = body_atom_of_rule.get(&rule_handle) {
                nogoods.add(Nogood::new(vec![CdnlSolver::create_literal(body_atom.address, true)]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::rules::Rule;

    fn ordinary(registry: &mut Registry, name: &str) -> Id {
        let p = registry.store_constant(name);
        registry.store_ordinary_atom(name.into(), vec![p])
    }

    #[test]
    fn fact_forces_its_own_truth() {
        let mut registry = Registry::new();
        let a = ordinary(&mut registry, "a");
        let program = GroundProgram { rules: vec![], facts: vec![a] };
        let (_g, nogoods) = Grounder::build(&mut registry, &program);
        let mut solver = CdnlSolver::new(vec![a.address], nogoods, 255, 16);
        let model = solver.get_next_model().unwrap().expect("one model");
        assert!(model.get_fact(a.address));
    }

    #[test]
    fn rule_with_satisfied_body_derives_head() {
        let mut registry = Registry::new();
        let a = ordinary(&mut registry, "a");
        let b = ordinary(&mut registry, "b");
        let rule = registry.store_rule(Rule {
            kind: id::MAINKIND_RULE,
            head: vec![Id::pos_literal_from_atom(b)],
            body: vec![Id::pos_literal_from_atom(a)],
            weight: None,
            level: None,
        });
        let program = GroundProgram { rules: vec![rule], facts: vec![a] };
        let (_g, nogoods) = Grounder::build(&mut registry, &program);
        let mut solver = CdnlSolver::new(vec![a.address, b.address], nogoods, 255, 16);
        let model = solver.get_next_model().unwrap().expect("one model");
        assert!(model.get_fact(a.address));
        assert!(model.get_fact(b.address));
    }

    #[test]
    fn singular_self_loop_without_external_support_has_no_model() {
        // a <- a. with no other rule deriving a: a can never be founded.
        let mut registry = Registry::new();
        let a = ordinary(&mut registry, "a");
        let rule = registry.store_rule(Rule {
            kind: id::MAINKIND_RULE,
            head: vec![Id::pos_literal_from_atom(a)],
            body: vec![Id::pos_literal_from_atom(a)],
            weight: None,
            level: None,
        });
        let program = GroundProgram { rules: vec![rule], facts: vec![] };
        let (_g, nogoods) = Grounder::build(&mut registry, &program);
        let mut solver = CdnlSolver::new(vec![a.address], nogoods, 255, 16);
        let model = solver.get_next_model().unwrap();
        assert_eq!(model, Some(Interpretation::new()));
    }

    #[test]
    fn shifted_disjunction_yields_exactly_the_minimal_models() {
        // a v b. -> shifted: a <- not b. / b <- not a.
        let mut registry = Registry::new();
        let a = ordinary(&mut registry, "a");
        let b = ordinary(&mut registry, "b");
        let rule = registry.store_rule(Rule {
            kind: id::MAINKIND_RULE,
            head: vec![Id::pos_literal_from_atom(a), Id::pos_literal_from_atom(b)],
            body: vec![],
            weight: None,
            level: None,
        });
        let program = GroundProgram { rules: vec![rule], facts: vec![] };
        let (mut grounder, nogoods) = Grounder::build(&mut registry, &program);
        let mut solver = CdnlSolver::new(vec![a.address, b.address], nogoods, 255, 16);
        let mut models = Vec::new();
        while let Some(candidate) = solver.get_next_model().unwrap() {
            if grounder.unfounded_set_check(&registry, &candidate).is_none() {
                models.push((candidate.get_fact(a.address), candidate.get_fact(b.address)));
            }
        }
        assert!(models.contains(&(true, false)) || models.contains(&(false, true)));
    }

    #[test]
    fn internal_model_generator_filters_unfounded_candidates() {
        use crate::builder::ModelGenerator;
        // a v b. shifts to a <- not b. / b <- not a.; both are minimal models,
        // but without the unfounded-set retry an InternalModelGenerator built
        // only from the Clark completion could also report {} as satisfying
        // every nogood emitted so far (there are none ruling it out directly).
        let mut registry = Registry::new();
        let a = ordinary(&mut registry, "a");
        let b = ordinary(&mut registry, "b");
        let rule = registry.store_rule(Rule {
            kind: id::MAINKIND_RULE,
            head: vec![Id::pos_literal_from_atom(a), Id::pos_literal_from_atom(b)],
            body: vec![],
            weight: None,
            level: None,
        });
        let program = GroundProgram { rules: vec![rule], facts: vec![] };
        let all_facts = vec![a.address, b.address];
        let mut gen = InternalModelGenerator::new(registry, &program, all_facts, 255, 16);
        let mut models = Vec::new();
        while let Some(m) = gen.next_model().unwrap() {
            models.push((m.get_fact(a.address), m.get_fact(b.address)));
        }
        assert!(models.contains(&(true, false)));
        assert!(models.contains(&(false, true)));
        assert!(!models.contains(&(false, false)));
    }
}
