//! MLP driver (component J): instantiates modules on demand, given a
//! "value call" `P[S]` — a module paired with an interpretation over its
//! formal input predicates — and drives a worklist of such calls down to a
//! final set of combined answer sets. Grounded on
//! `original_source/include/dlvhex/MLPSolver.hpp`'s `sTable`/
//! `moduleInstTable`/`A`/`path`/`comp` machinery, re-expressed as ordinary
//! recursive calls over the module-atom resolution order instead of the
//! original's explicit continuation stack — Rust's own call stack already
//! plays that role, and the two are semantically equivalent for the
//! acyclic (non-mutually-recursive) value-call graphs this module supports;
//! see `DESIGN.md` for the scope this narrows versus the original's general
//! i-stratified case.

use crate::backend::AspBackend;
use crate::error::{EvalError, EvalResult, SafetyError};
use crate::grounder::GroundProgram;
use crate::id::{self, Id, IdTuple};
use crate::interpretation::Interpretation;
use crate::registry::modules::Module;
use crate::registry::Registry;
use std::collections::{HashMap, HashSet};

/// One formal input predicate's extension: the distinct, sorted argument
/// tuples an actual call supplies for it. The module-atom "interpretation
/// over formal input predicates" spec §4.10 names, made directly
/// value-comparable across call sites instead of a global-address bitset
/// (two calls from different instances never share an address space, but
/// they can share argument tuples, which is all instantiation cares about).
type PredicateExtension = Vec<IdTuple>;

/// `S`: one actual input, position-indexed by the callee's formal input
/// predicate list.
type ActualInput = Vec<PredicateExtension>;

fn normalize(mut actual: ActualInput) -> ActualInput {
    for ext in &mut actual {
        ext.sort();
        ext.dedup();
    }
    actual
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ModuleInstance {
    module: Id,
    s: usize,
}

/// Per module-instance: the module atoms its rewrite still has to resolve,
/// or the `Fin` sentinel once every alternative has been computed and
/// cached. Matches spec §4.10's A-container.
#[derive(Debug, Clone)]
enum AStatus {
    Awaiting(HashSet<Id>),
    Fin,
}

/// Drives module instantiation to completion over an [`AspBackend`], which
/// plays the role of `ASPSolverManager` in the original: module rules are
/// generally non-ground (a module's own rule bodies reference its formal
/// input predicates abstractly), so grounding plus solving the final
/// rewritten program is delegated to the backend rather than routed through
/// the internal CDNL solver (component D), which only ever sees
/// already-ground programs.
pub struct MlpDriver<B: AspBackend> {
    backend: B,
    s_table: Vec<ActualInput>,
    instances: Vec<ModuleInstance>,
    instance_lookup: HashMap<ModuleInstance, usize>,
    a_container: Vec<AStatus>,
    fin_cache: HashMap<usize, Vec<Interpretation>>,
}

impl<B: AspBackend> MlpDriver<B> {
    pub fn new(backend: B) -> Self {
        MlpDriver {
            backend,
            s_table: Vec::new(),
            instances: Vec::new(),
            instance_lookup: HashMap::new(),
            a_container: Vec::new(),
            fin_cache: HashMap::new(),
        }
    }

    /// Instantiate every main module (empty formal input list) and return
    /// one combined [`Interpretation`] per combination of their alternative
    /// instance models, matching "the driver surfaces the final answer
    /// sets, one per combination of instance models" (spec §4.10).
    pub fn run(&mut self, registry: &mut Registry) -> EvalResult<Vec<Interpretation>> {
        let main_modules: Vec<Id> = (0..registry.modules.len() as u32)
            .map(|addr| Id::new(id::MAINKIND_MODULE, addr))
            .filter(|&m| registry.modules.get(m).map(|row| row.input_predicates.is_empty()).unwrap_or(false))
            .collect();

        let mut combined = vec![Interpretation::new()];
        for module in main_modules {
            let mut path = Vec::new();
            let alts = self.instantiate(registry, module, Vec::new(), &mut path)?;
            if alts.is_empty() {
                return Ok(Vec::new());
            }
            let mut next = Vec::with_capacity(combined.len() * alts.len());
            for base in &combined {
                for alt in &alts {
                    let mut merged = base.clone();
                    merged.union_with(alt);
                    next.push(merged);
                }
            }
            combined = next;
        }
        Ok(combined)
    }

    /// Resolve the value call `module[actual]`, returning every alternative
    /// final model for that instance. Revisiting an already-finished
    /// instance is a pure cache lookup (spec §4.10: "revisiting an instance
    /// is allowed only if it is a pure lookup"); revisiting one still
    /// in-progress on the current path is a value-call loop this module
    /// does not support resolving (see the module doc comment).
    fn instantiate(
        &mut self,
        registry: &mut Registry,
        module: Id,
        actual: ActualInput,
        path: &mut Vec<usize>,
    ) -> EvalResult<Vec<Interpretation>> {
        let actual = normalize(actual);
        let s = self.intern_s(actual);
        let instance = self.intern_instance(module, s);

        if let Some(cached) = self.fin_cache.get(&instance) {
            return Ok(cached.clone());
        }
        if path.contains(&instance) {
            return Err(EvalError::Invariant(format!(
                "module-atom value call at instance {instance} revisits itself before finishing; \
                 mutually recursive module instantiation is not supported"
            )));
        }

        path.push(instance);
        let result = self.instantiate_uncached(registry, module, instance, s, path);
        path.pop();
        let result = result?;
        self.fin_cache.insert(instance, result.clone());
        if let Some(slot) = self.a_container.get_mut(instance) {
            *slot = AStatus::Fin;
        }
        Ok(result)
    }

    fn instantiate_uncached(
        &mut self,
        registry: &mut Registry,
        module_id: Id,
        instance: usize,
        s: usize,
        path: &mut Vec<usize>,
    ) -> EvalResult<Vec<Interpretation>> {
        let module: Module = registry.modules.get(module_id)?.clone();

        let mut edb: Vec<Id> =
            module.edb.iter().map(|&f| self.rename_atom(registry, f, instance)).collect();
        self.rename_formal_input(registry, &module, s, instance, &mut edb);

        let mut module_atoms: Vec<Id> = Vec::new();
        for &rule_handle in &module.idb {
            let rule = registry.rules.get(rule_handle)?.clone();
            for &lit in rule.body.iter().chain(rule.head.iter()) {
                let atom = Id::atom_from_literal(lit);
                if atom.is_module_atom() && !module_atoms.contains(&atom) {
                    module_atoms.push(atom);
                }
            }
        }
        self.set_awaiting(instance, module_atoms.iter().copied().collect());

        // Resolve each distinct module atom against the facts derived so
        // far (edb plus earlier-resolved module atoms), branching the
        // accumulator across every alternative the callee reports.
        let mut accumulators: Vec<Vec<Id>> = vec![edb];
        for &ma in &module_atoms {
            let ma_row = registry.module_atoms.get(ma)?.clone();
            let callee_module = registry
                .modules
                .find_by_name(&ma_row.module_name)
                .ok_or_else(|| SafetyError::UnknownModule { atom: ma, module_name: ma_row.module_name.clone() })?;

            let mut next_accumulators = Vec::new();
            for facts in accumulators {
                let callee_actual = self.extract_actual_input(registry, &ma_row.input_tuple, instance, &facts);
                let callee_s = self.intern_s(normalize(callee_actual.clone()));
                let callee_instance = self.intern_instance(callee_module, callee_s);
                let alts = self.instantiate(registry, callee_module, callee_actual, path)?;
                for alt in &alts {
                    let mut branched = facts.clone();
                    self.inline_output_facts(registry, &ma_row.output_atom, callee_instance, alt, instance, &mut branched);
                    next_accumulators.push(branched);
                }
            }
            accumulators = next_accumulators;
            if accumulators.is_empty() {
                return Ok(Vec::new());
            }
        }

        let rules = self.rename_rules(registry, &module.idb, instance, &module_atoms)?;

        let mut results = Vec::new();
        for facts in accumulators {
            let program = GroundProgram { rules: rules.clone(), facts };
            let alts = self.solve_flat(&program)?;
            results.extend(alts);
        }
        Ok(results)
    }

    /// Every rule of the module, with ordinary atoms renamed into this
    /// instance's scope and module-atom literals dropped: once resolved,
    /// a module atom's truth is already baked into the accumulated facts
    /// (see [`Self::inline_output_facts`]), so the literal referencing it
    /// carries no further information for the solver.
    fn rename_rules(
        &mut self,
        registry: &mut Registry,
        idb: &IdTuple,
        instance: usize,
        module_atoms: &[Id],
    ) -> EvalResult<Vec<Id>> {
        let mut out = Vec::with_capacity(idb.len());
        for &rule_handle in idb {
            let rule = registry.rules.get(rule_handle)?.clone();
            let head: IdTuple =
                rule.head.iter().map(|&lit| self.rename_ordinary_literal(registry, lit, instance)).collect();
            let mut body = Vec::with_capacity(rule.body.len());
            for &lit in &rule.body {
                let atom = Id::atom_from_literal(lit);
                if module_atoms.contains(&atom) {
                    continue;
                }
                body.push(self.rename_ordinary_literal(registry, lit, instance));
            }
            out.push(registry.store_rule(crate::registry::rules::Rule {
                kind: rule.kind & !(id::PROPERTY_RULE_EXTATOMS),
                head,
                body,
                weight: rule.weight,
                level: rule.level,
            }));
        }
        Ok(out)
    }

    fn rename_ordinary_literal(&mut self, registry: &mut Registry, lit: Id, instance: usize) -> Id {
        let atom = Id::atom_from_literal(lit);
        let renamed = self.rename_atom(registry, atom, instance);
        Id::literal_from_atom(renamed, lit.is_naf())
    }

    /// Copy `atom` into `instance`'s namespace by suffixing its predicate
    /// symbol, matching `rewritePredicate`/`rewriteOrdinaryAtom`. Arguments
    /// (constants or rule-local variables) are shared as-is; only the
    /// predicate needs namespacing to keep two instances of the same
    /// module from colliding.
    fn rename_atom(&mut self, registry: &mut Registry, atom: Id, instance: usize) -> Id {
        let (text, tuple) = {
            let row = registry
                .get_ordinary_atom(atom)
                .expect("module edb/idb reference only ordinary atoms");
            (row.text.clone(), row.tuple.clone())
        };
        let mut scoped_tuple = tuple;
        let pred_text = registry.display_term(scoped_tuple[0]);
        let scoped_pred_text = format!("{pred_text}#{instance}");
        scoped_tuple[0] = registry.store_constant(scoped_pred_text);
        registry.store_ordinary_atom(format!("{text}#{instance}"), scoped_tuple)
    }

    /// Bring a formal input predicate's actual extension (argument tuples
    /// only, already scoped to the caller) into this instance's own
    /// namespace as facts, matching `createMiS`.
    fn rename_formal_input(
        &mut self,
        registry: &mut Registry,
        module: &Module,
        s: usize,
        instance: usize,
        edb: &mut Vec<Id>,
    ) {
        let actual = self.s_table[s].clone();
        for (k, &formal_pred) in module.input_predicates.iter().enumerate() {
            let Some(extension) = actual.get(k) else { continue };
            let pred_text = registry.display_term(formal_pred);
            let scoped_pred_text = format!("{pred_text}#{instance}");
            let scoped_pred = registry.store_constant(scoped_pred_text.clone());
            for args in extension {
                let mut tuple = vec![scoped_pred];
                tuple.extend(args.iter().copied());
                let text = format!("{scoped_pred_text}({})", display_args(registry, args));
                edb.push(registry.store_ordinary_atom(text, tuple));
            }
        }
    }

    /// Read off a module atom's actual input by matching its (unrenamed)
    /// input predicates against `facts`, once they are renamed into the
    /// caller instance's namespace. A simplification versus the original's
    /// `collectBottom`: this only ever sees facts already accumulated
    /// (module EDB plus earlier-resolved module atoms in the same rewrite),
    /// never facts an ordinary rule of this same instance would still have
    /// to derive — see `DESIGN.md`.
    fn extract_actual_input(
        &self,
        registry: &Registry,
        input_tuple: &IdTuple,
        caller_instance: usize,
        facts: &[Id],
    ) -> ActualInput {
        input_tuple
            .iter()
            .map(|&actual_pred| {
                let scoped_text = format!("{}#{caller_instance}", registry.display_term(actual_pred));
                let mut tuples: Vec<IdTuple> = facts
                    .iter()
                    .filter_map(|&f| registry.get_ordinary_atom(f).ok())
                    .filter(|row| registry.display_term(row.tuple[0]) == scoped_text)
                    .map(|row| row.tuple[1..].to_vec())
                    .collect();
                tuples.sort();
                tuples.dedup();
                tuples
            })
            .collect()
    }

    /// Copy the callee's output predicate's extension, from `callee_alt`'s
    /// own scope, into `caller_instance`'s namespace under the module
    /// atom's call-site pattern, matching `restrictionAndRenaming` +
    /// `replacedModuleAtoms`.
    fn inline_output_facts(
        &mut self,
        registry: &mut Registry,
        output_atom: &Id,
        callee_instance: usize,
        callee_alt: &Interpretation,
        caller_instance: usize,
        into: &mut Vec<Id>,
    ) {
        let Ok(output_row) = registry.get_ordinary_atom(*output_atom) else { return };
        let output_text = registry.display_term(output_row.tuple[0]);
        let scoped_output_text = format!("{output_text}#{callee_instance}");
        let caller_pred_text = format!("{output_text}#{caller_instance}");
        let caller_pred = registry.store_constant(caller_pred_text.clone());

        for addr in callee_alt.iter_set() {
            let candidate = Id::new(id::MAINKIND_ATOM | id::SUBKIND_ATOM_ORDINARYG, addr);
            let Ok(row) = registry.get_ordinary_atom(candidate) else { continue };
            if registry.display_term(row.tuple[0]) != scoped_output_text {
                continue;
            }
            let mut tuple = vec![caller_pred];
            tuple.extend(row.tuple[1..].iter().copied());
            let text = format!("{caller_pred_text}({})", display_args(registry, &row.tuple[1..]));
            into.push(registry.store_ordinary_atom(text, tuple));
        }
    }

    fn set_awaiting(&mut self, instance: usize, atoms: HashSet<Id>) {
        if self.a_container.len() <= instance {
            self.a_container.resize(instance + 1, AStatus::Fin);
        }
        self.a_container[instance] = AStatus::Awaiting(atoms);
    }

    fn intern_s(&mut self, actual: ActualInput) -> usize {
        if let Some(idx) = self.s_table.iter().position(|row| row == &actual) {
            return idx;
        }
        self.s_table.push(actual);
        self.s_table.len() - 1
    }

    fn intern_instance(&mut self, module: Id, s: usize) -> usize {
        let key = ModuleInstance { module, s };
        if let Some(&idx) = self.instance_lookup.get(&key) {
            return idx;
        }
        let idx = self.instances.len();
        self.instances.push(key);
        self.instance_lookup.insert(key, idx);
        idx
    }

    fn solve_flat(&mut self, program: &GroundProgram) -> EvalResult<Vec<Interpretation>> {
        self.backend.start(program)?;
        let mut out = Vec::new();
        while let Some(model) = self.backend.next_answer_set()? {
            out.push(model);
        }
        Ok(out)
    }
}

fn display_args(registry: &Registry, args: &[Id]) -> String {
    args.iter().map(|&a| registry.display_term(a)).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::modules::Module;
    use crate::registry::rules::Rule;

    /// A stub backend that always returns one fixed model (or none),
    /// independent of the program it is given — enough to exercise the
    /// rewrite/worklist logic without a real grounder-backed solver.
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
    fn main_module_with_no_module_atoms_instantiates_once() {
        let mut registry = Registry::new();
        let p = registry.store_constant("p");
        let a = registry.store_constant("a");
        let fact = registry.store_ordinary_atom("p(a)".into(), vec![p, a]);
        let module = registry.store_module(Module {
            name: "base".into(),
            input_predicates: vec![],
            edb: vec![fact],
            idb: vec![],
        });

        let mut interp = Interpretation::new();
        interp.set_fact(fact.address);
        let backend = FixedBackend { models: vec![interp] };
        let mut driver = MlpDriver::new(backend);
        let mut path = Vec::new();
        let alts = driver.instantiate(&mut registry, module, Vec::new(), &mut path).unwrap();
        assert_eq!(alts.len(), 1);
    }

    #[test]
    fn unresolvable_callee_module_surfaces_as_unknown_module() {
        let mut registry = Registry::new();
        let q = registry.store_constant("q");
        let x = registry.store_variable("X", false);
        let qx = registry.store_ordinary_atom("q(X)".into(), vec![q, x]);
        let ma = registry.store_module_atom(vec![], qx, "missing".into());
        let rule = registry.store_rule(Rule {
            kind: id::MAINKIND_RULE,
            head: vec![Id::pos_literal_from_atom(qx)],
            body: vec![Id::pos_literal_from_atom(ma)],
            weight: None,
            level: None,
        });
        let module = registry.store_module(Module {
            name: "caller".into(),
            input_predicates: vec![],
            edb: vec![],
            idb: vec![rule],
        });

        let backend = FixedBackend { models: vec![] };
        let mut driver = MlpDriver::new(backend);
        let mut path = Vec::new();
        let result = driver.instantiate(&mut registry, module, Vec::new(), &mut path);
        assert!(matches!(result, Err(EvalError::Safety(SafetyError::UnknownModule { .. }))));
    }

    /// A backend that records the facts it was asked to solve, so the test
    /// can inspect the rewrite's output without a real grounder behind it.
    struct RecordingBackend {
        captured: std::rc::Rc<std::cell::RefCell<Vec<Id>>>,
        model: Option<Interpretation>,
    }

    impl AspBackend for RecordingBackend {
        fn start(&mut self, program: &GroundProgram) -> EvalResult<()> {
            *self.captured.borrow_mut() = program.facts.clone();
            Ok(())
        }
        fn next_answer_set(&mut self) -> EvalResult<Option<Interpretation>> {
            Ok(self.model.take())
        }
    }

    #[test]
    fn module_atom_inlines_callee_output_facts_into_caller_scope() {
        let mut registry = Registry::new();
        let q = registry.store_constant("q");
        let one = Registry::integer(1);
        let two = Registry::integer(2);
        let q1 = registry.store_ordinary_atom("q(1)".into(), vec![q, one]);
        let q2 = registry.store_ordinary_atom("q(2)".into(), vec![q, two]);
        registry.store_module(Module { name: "base".into(), input_predicates: vec![], edb: vec![q1, q2], idb: vec![] });

        let x = registry.store_variable("X", false);
        let q_pattern = registry.store_ordinary_atom("q(X)".into(), vec![q, x]);
        let ma = registry.store_module_atom(vec![], q_pattern, "base".into());

        let r = registry.store_constant("r");
        let rx = registry.store_ordinary_atom("r(X)".into(), vec![r, x]);
        let rule = registry.store_rule(Rule {
            kind: id::MAINKIND_RULE,
            head: vec![Id::pos_literal_from_atom(rx)],
            body: vec![Id::pos_literal_from_atom(ma)],
            weight: None,
            level: None,
        });
        let wrap = registry.store_module(Module { name: "wrap".into(), input_predicates: vec![], edb: vec![], idb: vec![rule] });

        let captured = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let backend = RecordingBackend { captured: captured.clone(), model: Some(Interpretation::new()) };
        let mut driver = MlpDriver::new(backend);
        let mut path = Vec::new();
        let alts = driver.instantiate(&mut registry, wrap, Vec::new(), &mut path).unwrap();
        assert_eq!(alts.len(), 1);

        let facts = captured.borrow();
        let renamed_q_facts = facts
            .iter()
            .filter(|&&f| {
                registry
                    .get_ordinary_atom(f)
                    .map(|row| registry.display_term(row.tuple[0]).starts_with("q#"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(renamed_q_facts, 2, "both of base's q facts must be inlined under the caller's scope");
    }
}
