//! Module table: named modules with a formal input-predicate list and a
//! partition of their rules into an EDB-facing and an IDB part. Grounded
//! on `original_source/include/dlvhex/Module.hpp`/`ModuleTable.hpp`'s
//! `(moduleName, predicateInputs, edb, idb)` row shape, simplified to what
//! the MLP driver (component J) needs to instantiate a module atom.

use crate::error::RegistryError;
use crate::id::{Id, IdAddress, IdTuple};

#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    /// Formal input predicate terms, in declaration order; a module atom's
    /// actual input tuple is matched against this list positionally.
    pub input_predicates: IdTuple,
    pub edb: IdTuple,
    pub idb: IdTuple,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleTable {
    rows: Vec<Module>,
    by_name: std::collections::HashMap<String, IdAddress>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, module: Module) -> Id {
        let addr = self.rows.len() as IdAddress;
        self.by_name.insert(module.name.clone(), addr);
        self.rows.push(module);
        Id::new(crate::id::MAINKIND_MODULE, addr)
    }

    pub fn get(&self, handle: Id) -> Result<&Module, RegistryError> {
        if !handle.is_module() {
            return Err(RegistryError::KindMismatch(handle));
        }
        self.rows
            .get(handle.address as usize)
            .ok_or(RegistryError::UnknownHandle { kind: handle.kind, address: handle.address })
    }

    pub fn find_by_name(&self, name: &str) -> Option<Id> {
        self.by_name.get(name).map(|&addr| Id::new(crate::id::MAINKIND_MODULE, addr))
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
    fn lookup_by_name_after_store() {
        let mut modules = ModuleTable::new();
        let h = modules.store(Module {
            name: "plan".into(),
            input_predicates: vec![],
            edb: vec![],
            idb: vec![],
        });
        assert_eq!(modules.find_by_name("plan"), Some(h));
        assert_eq!(modules.get(h).unwrap().name, "plan");
    }

    #[test]
    fn unknown_name_misses() {
        let modules = ModuleTable::new();
        assert_eq!(modules.find_by_name("nope"), None);
    }
}
