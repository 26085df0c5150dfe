//! Term table: constants, integers, variables, and builtin operators.
//! Grounded on `original_source/include/dlvhex/ID.hpp`'s term sub-kinds and
//! on the `OrdinaryAtomTable` multi-index pattern for the secondary "by
//! text" lookup (`getIDByString`).

use crate::error::RegistryError;
use crate::id::{self, BuiltinTerm, Id, IdAddress};
use std::collections::HashMap;

/// One row of the term table. `text` holds the symbol for constants and
/// variables, and the decimal rendering for integers; builtins are looked
/// up by [`BuiltinTerm`] operator instead of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub kind: id::IdKind,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct TermTable {
    rows: Vec<Term>,
    by_text: HashMap<String, IdAddress>,
}

impl TermTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, kind: id::IdKind, text: String) -> Id {
        if let Some(&addr) = self.by_text.get(&text) {
            let row = &self.rows[addr as usize];
            if row.kind == kind {
                return Id::new(kind, addr);
            }
        }
        let addr = self.rows.len() as IdAddress;
        self.by_text.insert(text.clone(), addr);
        self.rows.push(Term { kind, text });
        Id::new(kind, addr)
    }

    /// Insert-if-absent a constant symbol, returning its handle.
    pub fn store_constant(&mut self, symbol: impl Into<String>) -> Id {
        self.intern(id::MAINKIND_TERM | id::SUBKIND_TERM_CONSTANT, symbol.into())
    }

    /// Insert-if-absent a variable symbol. `anonymous` sets the
    /// `PROPERTY_VAR_ANONYMOUS` flag (spec §3.1 property flags).
    pub fn store_variable(&mut self, symbol: impl Into<String>, anonymous: bool) -> Id {
        let mut kind = id::MAINKIND_TERM | id::SUBKIND_TERM_VARIABLE;
        if anonymous {
            kind |= id::PROPERTY_VAR_ANONYMOUS;
        }
        self.intern(kind, symbol.into())
    }

    /// Integers are addressed directly by value (`ID::termFromInteger`);
    /// no table row is allocated, matching the original's comment that
    /// integer terms need no table at all.
    pub fn integer(value: i32) -> Id {
        Id::term_from_integer(value as u32)
    }

    pub fn builtin(op: BuiltinTerm) -> Id {
        Id::term_from_builtin(op)
    }

    pub fn get(&self, handle: Id) -> Result<&Term, RegistryError> {
        if !handle.is_term() || !handle.is_constant_term() && !handle.is_variable_term() {
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

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Render a term for the canonical serialization of answer sets (spec §6):
/// integers print in base 10, constants/variables print as their symbol.
pub fn display_term(table: &TermTable, handle: Id) -> String {
    if handle.is_integer_term() {
        return handle.address.to_string();
    }
    if handle.is_builtin_term() {
        // Linear scan is fine: the builtin set is small and fixed.
        for op in [
            BuiltinTerm::Eq,
            BuiltinTerm::Ne,
            BuiltinTerm::Lt,
            BuiltinTerm::Le,
            BuiltinTerm::Gt,
            BuiltinTerm::Ge,
            BuiltinTerm::Mul,
            BuiltinTerm::Add,
            BuiltinTerm::AggCount,
            BuiltinTerm::AggMin,
            BuiltinTerm::AggMax,
            BuiltinTerm::AggSum,
            BuiltinTerm::AggTimes,
            BuiltinTerm::AggAvg,
            BuiltinTerm::AggAny,
        ] {
            if op as u32 == handle.address {
                return op.as_str().to_string();
            }
        }
        return "?builtin?".to_string();
    }
    table
        .get(handle)
        .map(|t| t.text.clone())
        .unwrap_or_else(|_| "?".to_string())
}
