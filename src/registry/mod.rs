//! The registry: every table the evaluation core indexes by [`Id`] handle,
//! grounded on `original_source/include/dlvhex/Registry.hpp`'s role as the
//! single owner of all `*Table` instances.

pub mod atoms;
pub mod modules;
pub mod rules;
pub mod term_table;

use crate::error::RegistryError;
use crate::id::{self, BuiltinTerm, Id, IdTuple};
use atoms::{
    AggregateAtom, BuiltinAtom, ExternalAtom, ModuleAtom, OrdinaryAtom, OrdinaryAtomTable,
    TypedAtomTable,
};
use modules::{Module, ModuleTable};
use rules::{Rule, RuleTable};
use term_table::{Term, TermTable};

/// Owns every table keyed by [`Id`]. Each `store_*` method is
/// insert-if-absent where the original has a secondary index (ordinary
/// atoms and terms), and plain append otherwise (spec §4.1: "Insertion is
/// insert-if-absent by a type-specific key where one exists, else plain
/// append").
/// Cloneable so the MLP driver (component J) can snapshot the registry per
/// value-call branch, matching `MLPSolver::comp`'s `RegistryPtr R2(new
/// Registry(*registrySolver))` before recursing into a callee instance.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub terms: TermTable,
    pub ordinary_ground_atoms: OrdinaryAtomTable,
    pub ordinary_nonground_atoms: OrdinaryAtomTable,
    pub builtin_atoms: TypedAtomTable<BuiltinAtom>,
    pub aggregate_atoms: TypedAtomTable<AggregateAtom>,
    pub external_atoms: TypedAtomTable<ExternalAtom>,
    pub module_atoms: TypedAtomTable<ModuleAtom>,
    pub rules: RuleTable,
    pub modules: ModuleTable,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            terms: TermTable::new(),
            ordinary_ground_atoms: OrdinaryAtomTable::new(true),
            ordinary_nonground_atoms: OrdinaryAtomTable::new(false),
            builtin_atoms: TypedAtomTable::new(),
            aggregate_atoms: TypedAtomTable::new(),
            external_atoms: TypedAtomTable::new(),
            module_atoms: TypedAtomTable::new(),
            rules: RuleTable::new(),
            modules: ModuleTable::new(),
        }
    }

    /// Store an ordinary atom, routing it to the ground or nonground table
    /// by scanning its tuple for any variable term (spec §3.2).
    pub fn store_ordinary_atom(&mut self, text: String, tuple: IdTuple) -> Id {
        let ground = tuple.iter().all(|t| !t.is_variable_term());
        if ground {
            self.ordinary_ground_atoms.store(text, tuple)
        } else {
            self.ordinary_nonground_atoms.store(text, tuple)
        }
    }

    pub fn get_ordinary_atom(&self, handle: Id) -> Result<&OrdinaryAtom, RegistryError> {
        if handle.is_ordinary_ground_atom() {
            self.ordinary_ground_atoms.get(handle)
        } else {
            self.ordinary_nonground_atoms.get(handle)
        }
    }

    pub fn store_builtin_atom(&mut self, operator: Id, arguments: IdTuple) -> Id {
        let kind = id::MAINKIND_ATOM | id::SUBKIND_ATOM_BUILTIN;
        self.builtin_atoms.store(BuiltinAtom { operator, arguments }, kind)
    }

    pub fn store_aggregate_atom(&mut self, function: Id, result_var: Id, body: IdTuple) -> Id {
        let kind = id::MAINKIND_ATOM | id::SUBKIND_ATOM_AGGREGATE;
        self.aggregate_atoms.store(AggregateAtom { function, result_var, body }, kind)
    }

    pub fn store_external_atom(
        &mut self,
        predicate_name: String,
        input_tuple: IdTuple,
        output_tuple: IdTuple,
    ) -> Id {
        let kind = id::MAINKIND_ATOM | id::SUBKIND_ATOM_EXTERNAL;
        self.external_atoms.store(
            ExternalAtom { predicate_name, input_tuple, output_tuple, oracle: None },
            kind,
        )
    }

    /// Bind the oracle handle for a previously-stored external atom (spec
    /// §3.2: "resolved lazily").
    pub fn bind_oracle(&mut self, handle: Id, oracle_name: std::sync::Arc<str>) -> Result<(), RegistryError> {
        let mut row = self.external_atoms.get(handle)?.clone();
        row.oracle = Some(oracle_name);
        self.external_atoms.update(handle, row)
    }

    pub fn store_module_atom(&mut self, input_tuple: IdTuple, output_atom: Id, module_name: String) -> Id {
        let kind = id::MAINKIND_ATOM | id::SUBKIND_ATOM_MODULE;
        self.module_atoms.store(ModuleAtom { input_tuple, output_atom, module_name }, kind)
    }

    pub fn store_constant(&mut self, symbol: impl Into<String>) -> Id {
        self.terms.store_constant(symbol)
    }

    pub fn store_variable(&mut self, symbol: impl Into<String>, anonymous: bool) -> Id {
        self.terms.store_variable(symbol, anonymous)
    }

    pub fn integer(value: i32) -> Id {
        TermTable::integer(value)
    }

    pub fn builtin_term(op: BuiltinTerm) -> Id {
        TermTable::builtin(op)
    }

    pub fn get_term(&self, handle: Id) -> Result<&Term, RegistryError> {
        self.terms.get(handle)
    }

    pub fn store_rule(&mut self, rule: Rule) -> Id {
        match rule.kind & 0x0F00_0000 {
            id::SUBKIND_RULE_CONSTRAINT => self.rules.store_constraint(rule.body),
            id::SUBKIND_RULE_WEAKCONSTRAINT => self.rules.store_weak_constraint(
                rule.body,
                rule.weight.unwrap_or_default(),
                rule.level.unwrap_or_default(),
            ),
            _ => self.rules.store_regular(rule.head, rule.body),
        }
    }

    pub fn store_module(&mut self, module: Module) -> Id {
        self.modules.store(module)
    }

    /// Canonical textual form of a term, for printed answer sets (spec §6).
    pub fn display_term(&self, handle: Id) -> String {
        term_table::display_term(&self.terms, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_atom_routes_by_groundness() {
        let mut reg = Registry::new();
        let p = reg.store_constant("edge");
        let a = reg.store_constant("a");
        let x = reg.store_variable("X", false);

        let ground = reg.store_ordinary_atom("edge(a)".into(), vec![p, a]);
        assert!(ground.is_ordinary_ground_atom());

        let nonground = reg.store_ordinary_atom("edge(X)".into(), vec![p, x]);
        assert!(nonground.is_ordinary_nonground_atom());
    }

    #[test]
    fn external_atom_oracle_starts_unbound_then_binds() {
        let mut reg = Registry::new();
        let h = reg.store_external_atom("cost".into(), vec![], vec![]);
        assert!(reg.external_atoms.get(h).unwrap().oracle.is_none());
        reg.bind_oracle(h, std::sync::Arc::from("cost_plugin")).unwrap();
        assert_eq!(
            reg.external_atoms.get(h).unwrap().oracle.as_deref(),
            Some("cost_plugin")
        );
    }

    #[test]
    fn module_lookup_round_trips() {
        let mut reg = Registry::new();
        let h = reg.store_module(Module {
            name: "plan".into(),
            input_predicates: vec![],
            edb: vec![],
            idb: vec![],
        });
        assert_eq!(reg.modules.find_by_name("plan"), Some(h));
    }
}
