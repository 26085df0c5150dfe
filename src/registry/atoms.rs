//! Atom tables: ordinary (ground/nonground), builtin, aggregate, external,
//! and module atoms. Grounded on `original_source/include/dlvhex/
//! OrdinaryAtomTable.hpp` (random-access address index + hashed text/tuple/
//! predicate indices) and `Atoms.hpp`'s typed atom rows.

use crate::error::RegistryError;
use crate::id::{self, Id, IdAddress, IdTuple};
use std::collections::HashMap;

/// One ground or nonground ordinary atom. `tuple[0]` is always the
/// predicate term; `tuple[1..]` are the arguments, matching the
/// original's convention (`Atom::front()` returns the predicate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdinaryAtom {
    pub kind: id::IdKind,
    pub text: String,
    pub tuple: IdTuple,
}

impl OrdinaryAtom {
    pub fn predicate(&self) -> Id {
        self.tuple[0]
    }

    pub fn arity(&self) -> usize {
        self.tuple.len() - 1
    }
}

/// Ground or nonground ordinary-atom table, selected by the `ground`
/// constructor flag. Two instances of this type live in the registry
/// (spec §3.2: "two tables").
#[derive(Debug, Clone, Default)]
pub struct OrdinaryAtomTable {
    ground: bool,
    rows: Vec<OrdinaryAtom>,
    by_text: HashMap<String, IdAddress>,
    by_tuple: HashMap<IdTuple, IdAddress>,
    by_predicate: HashMap<Id, Vec<IdAddress>>,
}

impl OrdinaryAtomTable {
    pub fn new(ground: bool) -> Self {
        OrdinaryAtomTable {
            ground,
            ..Default::default()
        }
    }

    fn expected_subkind(&self) -> id::IdKind {
        if self.ground {
            id::SUBKIND_ATOM_ORDINARYG
        } else {
            id::SUBKIND_ATOM_ORDINARYN
        }
    }

    /// Insert-if-absent by textual form, matching `storeAndGetID`/`getIDByString`.
    pub fn store(&mut self, text: String, tuple: IdTuple) -> Id {
        debug_assert!(!tuple.is_empty(), "atom tuple must contain at least a predicate term");
        if let Some(&addr) = self.by_text.get(&text) {
            return Id::new(self.rows[addr as usize].kind, addr);
        }
        let kind = id::MAINKIND_ATOM | self.expected_subkind();
        let addr = self.rows.len() as IdAddress;
        self.by_text.insert(text.clone(), addr);
        self.by_tuple.insert(tuple.clone(), addr);
        self.by_predicate.entry(tuple[0]).or_default().push(addr);
        self.rows.push(OrdinaryAtom { kind, text, tuple });
        Id::new(kind, addr)
    }

    pub fn get(&self, handle: Id) -> Result<&OrdinaryAtom, RegistryError> {
        if !handle.is_ordinary_atom() {
            return Err(RegistryError::KindMismatch(handle));
        }
        self.rows
            .get(handle.address as usize)
            .ok_or(RegistryError::UnknownHandle {
                kind: handle.kind,
                address: handle.address,
            })
    }

    pub fn find_by_text(&self, text: &str) -> Id {
        match self.by_text.get(text) {
            Some(&addr) => Id::new(self.rows[addr as usize].kind, addr),
            None => id::ID_FAIL,
        }
    }

    pub fn find_by_tuple(&self, tuple: &IdTuple) -> Id {
        match self.by_tuple.get(tuple) {
            Some(&addr) => Id::new(self.rows[addr as usize].kind, addr),
            None => id::ID_FAIL,
        }
    }

    /// All atoms sharing a predicate term, in insertion order.
    pub fn by_predicate(&self, predicate: Id) -> impl Iterator<Item = Id> + '_ {
        self.by_predicate
            .get(&predicate)
            .into_iter()
            .flatten()
            .map(move |&addr| Id::new(self.rows[addr as usize].kind, addr))
    }

    pub fn iter(&self) -> impl Iterator<Item = Id> + '_ {
        let kind = id::MAINKIND_ATOM | self.expected_subkind();
        (0..self.rows.len()).map(move |addr| Id::new(kind, addr as IdAddress))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Two ordinary atoms unify iff they have the same arity and a
/// left-to-right walk that substitutes variable-for-variable or
/// variable-for-constant (propagating each substitution to all later
/// occurrences of that variable in *both* tuples) reaches the end without
/// a constant-vs-different-constant clash (spec §4.1 invariant).
pub fn unifies(a: &OrdinaryAtom, b: &OrdinaryAtom) -> bool {
    if a.tuple.len() != b.tuple.len() {
        return false;
    }
    let mut subst: HashMap<Id, Id> = HashMap::new();
    for (&ta, &tb) in a.tuple.iter().zip(b.tuple.iter()) {
        if !unify_step(ta, tb, &mut subst) {
            return false;
        }
    }
    true
}

fn unify_step(ta: Id, tb: Id, subst: &mut HashMap<Id, Id>) -> bool {
    let ta_resolved = resolve(ta, subst);
    let tb_resolved = resolve(tb, subst);
    match (ta_resolved.is_variable_term(), tb_resolved.is_variable_term()) {
        (true, true) | (true, false) => {
            subst.insert(ta_resolved, tb_resolved);
            true
        }
        (false, true) => {
            subst.insert(tb_resolved, ta_resolved);
            true
        }
        (false, false) => ta_resolved == tb_resolved,
    }
}

fn resolve(mut t: Id, subst: &HashMap<Id, Id>) -> Id {
    while t.is_variable_term() {
        match subst.get(&t) {
            Some(&next) if next != t => t = next,
            _ => break,
        }
    }
    t
}

/// An external atom's input argument type (spec §6 `PluginAtom`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputArgType {
    Predicate,
    Constant,
    TupleVarargs,
}

/// A typed row shared by builtin/aggregate/external/module atoms; each
/// table below wraps a `Vec<T>` keyed purely by dense address, since none
/// of these kinds need a secondary text/tuple index the way ordinary
/// atoms do.
#[derive(Debug, Clone, Default)]
pub struct TypedAtomTable<T: Clone> {
    rows: Vec<T>,
}

impl<T> TypedAtomTable<T> {
    pub fn new() -> Self {
        TypedAtomTable { rows: Vec::new() }
    }

    pub fn store(&mut self, row: T, kind: id::IdKind) -> Id {
        let addr = self.rows.len() as IdAddress;
        self.rows.push(row);
        Id::new(kind, addr)
    }

    pub fn get(&self, handle: Id) -> Result<&T, RegistryError> {
        self.rows
            .get(handle.address as usize)
            .ok_or(RegistryError::UnknownHandle {
                kind: handle.kind,
                address: handle.address,
            })
    }

    pub fn update(&mut self, handle: Id, row: T) -> Result<(), RegistryError> {
        let slot = self
            .rows
            .get_mut(handle.address as usize)
            .ok_or(RegistryError::UnknownHandle {
                kind: handle.kind,
                address: handle.address,
            })?;
        *slot = row;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// `a op b` where `op` is one of the infix/prefix builtin operators.
#[derive(Debug, Clone)]
pub struct BuiltinAtom {
    pub operator: Id,
    pub arguments: IdTuple,
}

/// Aggregate shape: `left_bound op1 FUNC{vars : body} op2 right_bound`,
/// simplified here to the pieces the evaluation core actually touches
/// (the aggregate's own grounding is a non-goal; this row only needs to
/// be inspectable by the grounder's Clark-completion step).
#[derive(Debug, Clone)]
pub struct AggregateAtom {
    pub function: Id,
    pub result_var: Id,
    pub body: IdTuple,
}

/// A weak handle to the oracle implementing an external atom. Resolved
/// lazily (spec §3.2 "Weak handles exist only for external-atom → oracle
/// binding and are resolved lazily"); `None` until the oracle registry
/// binds it.
pub type OracleHandle = Option<std::sync::Arc<str>>;

#[derive(Debug, Clone)]
pub struct ExternalAtom {
    pub predicate_name: String,
    pub input_tuple: IdTuple,
    pub output_tuple: IdTuple,
    pub oracle: OracleHandle,
}

#[derive(Debug, Clone)]
pub struct ModuleAtom {
    pub input_tuple: IdTuple,
    pub output_atom: Id,
    pub module_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::term_table::TermTable;

    #[test]
    fn identical_ground_atoms_unify() {
        let mut terms = TermTable::new();
        let p = terms.store_constant("edge");
        let a = terms.store_constant("a");
        let b = terms.store_constant("b");
        let atom1 = OrdinaryAtom {
            kind: id::MAINKIND_ATOM,
            text: "edge(a,b)".into(),
            tuple: vec![p, a, b],
        };
        let atom2 = atom1.clone();
        assert!(unifies(&atom1, &atom2));
    }

    #[test]
    fn variable_unifies_with_constant_and_propagates() {
        let mut terms = TermTable::new();
        let p = terms.store_constant("edge");
        let x = terms.store_variable("X", false);
        let a = terms.store_constant("a");
        let pattern = OrdinaryAtom {
            kind: id::MAINKIND_ATOM,
            text: "edge(X,X)".into(),
            tuple: vec![p, x, x],
        };
        let ground_ok = OrdinaryAtom {
            kind: id::MAINKIND_ATOM,
            text: "edge(a,a)".into(),
            tuple: vec![p, a, a],
        };
        let ground_bad = OrdinaryAtom {
            kind: id::MAINKIND_ATOM,
            text: "edge(a,b)".into(),
            tuple: vec![p, a, terms.store_constant("b")],
        };
        assert!(unifies(&pattern, &ground_ok));
        assert!(!unifies(&pattern, &ground_bad));
    }

    #[test]
    fn unification_is_symmetric() {
        let mut terms = TermTable::new();
        let p = terms.store_constant("p");
        let x = terms.store_variable("X", false);
        let a = terms.store_constant("a");
        let lhs = OrdinaryAtom { kind: id::MAINKIND_ATOM, text: "p(X)".into(), tuple: vec![p, x] };
        let rhs = OrdinaryAtom { kind: id::MAINKIND_ATOM, text: "p(a)".into(), tuple: vec![p, a] };
        assert_eq!(unifies(&lhs, &rhs), unifies(&rhs, &lhs));
    }

    #[test]
    fn different_arity_never_unifies() {
        let mut terms = TermTable::new();
        let p = terms.store_constant("p");
        let a = terms.store_constant("a");
        let lhs = OrdinaryAtom { kind: id::MAINKIND_ATOM, text: "p(a)".into(), tuple: vec![p, a] };
        let rhs = OrdinaryAtom { kind: id::MAINKIND_ATOM, text: "p(a,a)".into(), tuple: vec![p, a, a] };
        assert!(!unifies(&lhs, &rhs));
    }
}
