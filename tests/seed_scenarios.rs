//! Integration tests for the "seed scenarios" named in spec §8 that exercise
//! already-complete components end to end: the internal grounder/CDNL
//! solver pipeline (component D) and the model graph (component H).
//! Scenarios needing a concrete external-atom oracle or ASP backend
//! (plan/use, the cardinality module chain) are out of scope here since
//! this crate only defines those as trait boundaries (`plugin::PluginAtom`,
//! `backend::AspBackend`); see `src/mlp.rs`'s unit tests for module
//! instantiation coverage instead.

use asp_eval_core::builder::ModelGenerator;
use asp_eval_core::eval_graph::EvalGraph;
use asp_eval_core::grounder::{GroundProgram, Grounder, InternalModelGenerator};
use asp_eval_core::id::{self, Id};
use asp_eval_core::interpretation::Interpretation;
use asp_eval_core::model_graph::ModelGraph;
use asp_eval_core::nogood::solver::CdnlSolver;
use asp_eval_core::registry::rules::Rule;
use asp_eval_core::registry::Registry;

fn ordinary(registry: &mut Registry, name: &str) -> Id {
    let p = registry.store_constant(name);
    registry.store_ordinary_atom(name.into(), vec![p])
}

/// Scenario 2: a module whose program is internally inconsistent
/// (`p(a). :- p(a).`) must produce zero answer sets.
#[test]
fn inconsistent_program_has_no_answer_sets() {
    let mut registry = Registry::new();
    let pa = ordinary(&mut registry, "p_a");
    let constraint = registry.store_rule(Rule {
        kind: id::MAINKIND_RULE | id::SUBKIND_RULE_CONSTRAINT,
        head: vec![],
        body: vec![Id::pos_literal_from_atom(pa)],
        weight: None,
        level: None,
    });
    let program = GroundProgram { rules: vec![constraint], facts: vec![pa] };
    let (_grounder, nogoods) = Grounder::build(&mut registry, &program);
    let mut solver = CdnlSolver::new(vec![pa.address], nogoods, 255, 16);
    assert_eq!(solver.get_next_model().unwrap(), None);
}

/// Scenario 4: `a v b. a <- b. b <- a.` must yield exactly the two minimal
/// models `{a}` and `{b}`; the unfounded-set check has to exclude `{a,b}`,
/// which the shifted Clark completion alone would otherwise accept (each of
/// `a`,`b` supports the other circularly with no external justification).
#[test]
fn disjunctive_loop_excludes_the_mutually_supporting_model() {
    let mut registry = Registry::new();
    let a = ordinary(&mut registry, "a");
    let b = ordinary(&mut registry, "b");
    let disjunction = registry.store_rule(Rule {
        kind: id::MAINKIND_RULE,
        head: vec![Id::pos_literal_from_atom(a), Id::pos_literal_from_atom(b)],
        body: vec![],
        weight: None,
        level: None,
    });
    let a_from_b = registry.store_rule(Rule {
        kind: id::MAINKIND_RULE,
        head: vec![Id::pos_literal_from_atom(a)],
        body: vec![Id::pos_literal_from_atom(b)],
        weight: None,
        level: None,
    });
    let b_from_a = registry.store_rule(Rule {
        kind: id::MAINKIND_RULE,
        head: vec![Id::pos_literal_from_atom(b)],
        body: vec![Id::pos_literal_from_atom(a)],
        weight: None,
        level: None,
    });
    let program = GroundProgram { rules: vec![disjunction, a_from_b, b_from_a], facts: vec![] };
    let all_facts = vec![a.address, b.address];
    let mut gen = InternalModelGenerator::new(registry, &program, all_facts, 255, 16);

    let mut models = Vec::new();
    while let Some(m) = gen.next_model().unwrap() {
        models.push((m.get_fact(a.address), m.get_fact(b.address)));
    }
    models.sort();
    assert_eq!(models, vec![(false, true), (true, false)]);
}

/// Scenario 5: an eval unit with four predecessors, each offering two
/// alternative OUT-models, produces exactly 16 IN-models (one per
/// combination), and re-requesting an already-joined combination reuses
/// the same IN-model handle instead of creating a new one.
#[test]
fn four_predecessor_join_yields_sixteen_reusable_in_models() {
    let mut eval_graph = EvalGraph::new();
    let predecessors: Vec<_> =
        (0..4).map(|_| eval_graph.create_eval_unit(vec![], vec![], vec![]).unwrap()).collect();
    let target = eval_graph.create_eval_unit(vec![], vec![], predecessors.clone()).unwrap();
    assert!(eval_graph.join_orders_are_dense(target));

    let mut model_graph = ModelGraph::new();
    let mut alternatives_per_predecessor = Vec::new();
    for &unit in &predecessors {
        let mut m_model = Interpretation::new();
        m_model.set_fact(0);
        let mut n_model = Interpretation::new();
        n_model.set_fact(1);
        let out_m = model_graph.add_out_model(unit, None, false, Some(m_model)).unwrap();
        let out_n = model_graph.add_out_model(unit, None, false, Some(n_model)).unwrap();
        alternatives_per_predecessor.push([out_m, out_n]);
    }

    let mut created = Vec::new();
    for i0 in 0..2 {
        for i1 in 0..2 {
            for i2 in 0..2 {
                for i3 in 0..2 {
                    let combo = vec![
                        alternatives_per_predecessor[0][i0],
                        alternatives_per_predecessor[1][i1],
                        alternatives_per_predecessor[2][i2],
                        alternatives_per_predecessor[3][i3],
                    ];
                    let combo_with_projection: Vec<(_, bool)> = combo.iter().map(|&m| (m, false)).collect();
                    created.push(model_graph.add_in_model(target, combo_with_projection, None).unwrap());
                }
            }
        }
    }
    assert_eq!(created.len(), 16);
    let unique: std::collections::HashSet<_> = created.iter().copied().collect();
    assert_eq!(unique.len(), 16, "every combination must be a distinct IN-model");

    let first_combo = vec![
        alternatives_per_predecessor[0][0],
        alternatives_per_predecessor[1][0],
        alternatives_per_predecessor[2][0],
        alternatives_per_predecessor[3][0],
    ];
    let reused = model_graph.find_existing_join(&first_combo, target);
    assert_eq!(reused, Some(created[0]), "the same predecessor combination must reuse its IN-model");
}

/// Scenario 6: once the model generator is exhausted, calling it again
/// keeps returning `None` rather than restarting the search.
#[test]
fn exhausted_model_generator_stays_exhausted() {
    let mut registry = Registry::new();
    let a = ordinary(&mut registry, "a");
    let program = GroundProgram { rules: vec![], facts: vec![a] };
    let all_facts = vec![a.address];
    let mut gen = InternalModelGenerator::new(registry, &program, all_facts, 255, 16);

    let first = gen.next_model().unwrap();
    assert!(first.is_some());
    assert_eq!(gen.next_model().unwrap(), None);
    assert_eq!(gen.next_model().unwrap(), None);
}
