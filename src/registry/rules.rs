//! Rule table. Grounded on `original_source/include/dlvhex/Rule.hpp` (head/body
//! tuple + weak-constraint weight/level) and the `PROPERTY_RULE_EXTATOMS`/
//! `PROPERTY_RULE_AUX` flags from `ID.hpp`.

use crate::error::RegistryError;
use crate::id::{self, Id, IdAddress, IdTuple};

/// A regular, constraint, or weak-constraint rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub kind: id::IdKind,
    pub head: IdTuple,
    pub body: IdTuple,
    /// Only meaningful for weak constraints (spec §3.1 "Supplemented": weight/level).
    pub weight: Option<Id>,
    pub level: Option<Id>,
}

impl Rule {
    pub fn is_disjunctive(&self) -> bool {
        self.head.len() > 1
    }

    pub fn is_constraint(&self) -> bool {
        self.head.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rows: Vec<Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&mut self, mut kind: id::IdKind, rule: Rule) -> Id {
        if rule.body.iter().any(|lit| Id::atom_from_literal(*lit).is_external_atom()) {
            kind |= id::PROPERTY_RULE_EXTATOMS;
        }
        let addr = self.rows.len() as IdAddress;
        self.rows.push(Rule { kind, ..rule });
        Id::new(kind, addr)
    }

    pub fn store_regular(&mut self, head: IdTuple, body: IdTuple) -> Id {
        let kind = id::MAINKIND_RULE | id::SUBKIND_RULE_REGULAR;
        self.store(kind, Rule { kind, head, body, weight: None, level: None })
    }

    pub fn store_constraint(&mut self, body: IdTuple) -> Id {
        let kind = id::MAINKIND_RULE | id::SUBKIND_RULE_CONSTRAINT;
        self.store(kind, Rule { kind, head: Vec::new(), body, weight: None, level: None })
    }

    pub fn store_weak_constraint(&mut self, body: IdTuple, weight: Id, level: Id) -> Id {
        let kind = id::MAINKIND_RULE | id::SUBKIND_RULE_WEAKCONSTRAINT;
        self.store(
            kind,
            Rule { kind, head: Vec::new(), body, weight: Some(weight), level: Some(level) },
        )
    }

    /// Mark a rule as pipeline-synthesized (shifted disjunctive rules, Clark
    /// completion bodies, ...), matching `PROPERTY_RULE_AUX`.
    pub fn mark_aux(&mut self, handle: Id) -> Result<Id, RegistryError> {
        let row = self
            .rows
            .get_mut(handle.address as usize)
            .ok_or(RegistryError::UnknownHandle { kind: handle.kind, address: handle.address })?;
        row.kind |= id::PROPERTY_RULE_AUX;
        Ok(Id::new(row.kind, handle.address))
    }

    pub fn get(&self, handle: Id) -> Result<&Rule, RegistryError> {
        if !handle.is_rule() {
            return Err(RegistryError::KindMismatch(handle));
        }
        self.rows
            .get(handle.address as usize)
            .ok_or(RegistryError::UnknownHandle { kind: handle.kind, address: handle.address })
    }

    pub fn iter(&self) -> impl Iterator<Item = Id> + '_ {
        self.rows.iter().enumerate().map(|(addr, r)| Id::new(r.kind, addr as IdAddress))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_has_empty_head() {
        let mut rules = RuleTable::new();
        let h = rules.store_constraint(vec![]);
        assert!(rules.get(h).unwrap().is_constraint());
    }

    #[test]
    fn disjunctive_head_detected() {
        let mut rules = RuleTable::new();
        let a = Id::new(id::MAINKIND_ATOM, 0);
        let b = Id::new(id::MAINKIND_ATOM, 1);
        let lit_a = Id::pos_literal_from_atom(a);
        let lit_b = Id::pos_literal_from_atom(b);
        let h = rules.store_regular(vec![lit_a, lit_b], vec![]);
        assert!(rules.get(h).unwrap().is_disjunctive());
    }

    #[test]
    fn aux_flag_survives_mutation() {
        let mut rules = RuleTable::new();
        let h = rules.store_regular(vec![], vec![]);
        let h2 = rules.mark_aux(h).unwrap();
        assert!(h2.has_property(id::PROPERTY_RULE_AUX));
        assert!(rules.get(h2).unwrap().kind & id::PROPERTY_RULE_AUX != 0);
    }
}
