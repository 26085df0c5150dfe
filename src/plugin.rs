//! External-atom oracle contract (spec §6 `PluginAtom`). Grounded on
//! `original_source/include/dlvhex/PluginInterface.hpp`'s `PluginAtom`
//! (`Query`/`Answer`/`InputType`/`retrieve`). This module only states the
//! contract a collaborator must satisfy plus the caching layer the core
//! drives it through; concrete oracle implementations are a non-goal.

use crate::id::IdTuple;
use std::collections::HashMap;

pub use crate::registry::atoms::InputArgType;

/// One retrieval request to an oracle (spec §6: `query = (interpretation,
/// input_tuple, output_pattern)`). `predicate_input` is the interpretation
/// restricted to the atom's predicate-typed input arguments, as the
/// sorted addresses of its true atoms — the portion of the full
/// interpretation the oracle's answer may actually depend on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub predicate_input: Vec<u32>,
    pub input_tuple: IdTuple,
    pub output_pattern: IdTuple,
}

/// Output tuples an oracle asserts for a [`Query`], each matching the
/// query's output pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    pub tuples: Vec<IdTuple>,
}

/// An external-atom oracle. Implementations must be deterministic: the
/// same [`Query`] must always produce the same [`Answer`] (spec §6); the
/// core relies on this to cache freely.
pub trait PluginAtom {
    fn predicate_name(&self) -> &str;
    fn input_arity(&self) -> &[InputArgType];
    fn output_arity(&self) -> usize;
    fn retrieve(&self, query: &Query) -> Answer;
}

/// Wraps a [`PluginAtom`] with a cache keyed exactly on the triple spec §6
/// names: interpretation-over-predicate-inputs, input tuple, output
/// pattern. Matches `PluginAtom::retrieveCached`'s query-hash cache.
pub struct CachingOracle<'a> {
    oracle: &'a dyn PluginAtom,
    cache: HashMap<Query, Answer>,
}

impl<'a> CachingOracle<'a> {
    pub fn new(oracle: &'a dyn PluginAtom) -> Self {
        CachingOracle { oracle, cache: HashMap::new() }
    }

    pub fn retrieve(&mut self, query: Query) -> &Answer {
        let oracle = self.oracle;
        self.cache.entry(query.clone()).or_insert_with(|| oracle.retrieve(&query))
    }

    pub fn cached_query_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingOracle {
        calls: Cell<u32>,
    }

    impl PluginAtom for CountingOracle {
        fn predicate_name(&self) -> &str {
            "count"
        }
        fn input_arity(&self) -> &[InputArgType] {
            &[InputArgType::Predicate]
        }
        fn output_arity(&self) -> usize {
            1
        }
        fn retrieve(&self, _query: &Query) -> Answer {
            self.calls.set(self.calls.get() + 1);
            Answer { tuples: vec![] }
        }
    }

    #[test]
    fn identical_queries_hit_the_cache() {
        let oracle = CountingOracle { calls: Cell::new(0) };
        let mut caching = CachingOracle::new(&oracle);
        let q = Query { predicate_input: vec![1, 2], input_tuple: vec![], output_pattern: vec![] };
        caching.retrieve(q.clone());
        caching.retrieve(q);
        assert_eq!(oracle.calls.get(), 1);
        assert_eq!(caching.cached_query_count(), 1);
    }

    #[test]
    fn differing_predicate_input_misses_the_cache() {
        let oracle = CountingOracle { calls: Cell::new(0) };
        let mut caching = CachingOracle::new(&oracle);
        caching.retrieve(Query { predicate_input: vec![1], input_tuple: vec![], output_pattern: vec![] });
        caching.retrieve(Query { predicate_input: vec![2], input_tuple: vec![], output_pattern: vec![] });
        assert_eq!(oracle.calls.get(), 2);
    }
}
