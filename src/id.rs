//! Bit-packed handle word (`ID`) addressing every row the [`crate::registry::Registry`]
//! owns, grounded on `original_source/include/dlvhex/ID.hpp`.
//!
//! An `ID` packs a `kind` word (main kind, sub kind, NAF flag, property
//! flags) and a dense zero-based `address` into a single `u64`-sized pair
//! of `u32`s, so that handles are `Copy`, hashable, and cheap to pass
//! around by value the way the original `struct ID` was designed to "fit
//! into an uint64_t and have no vtable".

use std::fmt;

/// The kind word: main kind + sub kind + NAF flag + property flags.
pub type IdKind = u32;
/// Dense, zero-based row index into the table selected by `(main kind, sub kind)`.
pub type IdAddress = u32;

const ALL_ONES: u32 = 0xFFFF_FFFF;

const NAF_MASK: IdKind = 0x8000_0000;
const MAINKIND_MASK: IdKind = 0x7000_0000;
const MAINKIND_SHIFT: u32 = 28;
const SUBKIND_MASK: IdKind = 0x0F00_0000;
const SUBKIND_SHIFT: u32 = 24;
const PROPERTY_MASK: IdKind = 0x00FF_0000;

pub const MAINKIND_ATOM: IdKind = 0x0000_0000;
pub const MAINKIND_TERM: IdKind = 0x1000_0000;
pub const MAINKIND_LITERAL: IdKind = 0x2000_0000;
pub const MAINKIND_RULE: IdKind = 0x3000_0000;
pub const MAINKIND_MODULE: IdKind = 0x4000_0000;

pub const SUBKIND_TERM_CONSTANT: IdKind = 0x0000_0000;
pub const SUBKIND_TERM_INTEGER: IdKind = 0x0100_0000;
pub const SUBKIND_TERM_VARIABLE: IdKind = 0x0200_0000;
pub const SUBKIND_TERM_BUILTIN: IdKind = 0x0300_0000;

pub const SUBKIND_ATOM_ORDINARYG: IdKind = 0x0000_0000;
pub const SUBKIND_ATOM_ORDINARYN: IdKind = 0x0100_0000;
pub const SUBKIND_ATOM_BUILTIN: IdKind = 0x0200_0000;
pub const SUBKIND_ATOM_AGGREGATE: IdKind = 0x0300_0000;
pub const SUBKIND_ATOM_EXTERNAL: IdKind = 0x0400_0000;
pub const SUBKIND_ATOM_MODULE: IdKind = 0x0500_0000;

pub const SUBKIND_RULE_REGULAR: IdKind = 0x0000_0000;
pub const SUBKIND_RULE_CONSTRAINT: IdKind = 0x0100_0000;
pub const SUBKIND_RULE_WEAKCONSTRAINT: IdKind = 0x0200_0000;

/// A variable term that never appears elsewhere in the rule (`_` / `X0`-style anonymous vars).
pub const PROPERTY_VAR_ANONYMOUS: IdKind = 0x0001_0000;
/// Term was synthesized by the pipeline rather than the input program.
pub const PROPERTY_TERM_AUX: IdKind = 0x0002_0000;
/// Atom was synthesized by the pipeline (Clark completion body atoms, shifted heads, ...).
pub const PROPERTY_ATOM_AUX: IdKind = 0x0002_0000;
/// Rule was synthesized by the pipeline (shifted disjunctive rules, input rules, ...).
pub const PROPERTY_RULE_AUX: IdKind = 0x0020_0000;
/// Set on a rule iff its body contains at least one external atom.
pub const PROPERTY_RULE_EXTATOMS: IdKind = 0x0008_0000;

/// Fixed builtin-term operators, addressed without a table (see `original_source`'s
/// `TermBuiltinAddress` enum). Order matches the "infix builtins then prefix builtins"
/// split the original comments describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BuiltinTerm {
    Eq = 0,
    Ne = 1,
    Lt = 2,
    Le = 3,
    Gt = 4,
    Ge = 5,
    Mul = 6,
    Add = 7,
    AggCount = 8,
    AggMin = 9,
    AggMax = 10,
    AggSum = 11,
    AggTimes = 12,
    AggAvg = 13,
    AggAny = 14,
}

impl BuiltinTerm {
    pub fn is_infix(self) -> bool {
        (self as u32) <= (BuiltinTerm::Add as u32)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinTerm::Eq => "=",
            BuiltinTerm::Ne => "<>",
            BuiltinTerm::Lt => "<",
            BuiltinTerm::Le => "<=",
            BuiltinTerm::Gt => ">",
            BuiltinTerm::Ge => ">=",
            BuiltinTerm::Mul => "*",
            BuiltinTerm::Add => "+",
            BuiltinTerm::AggCount => "#count",
            BuiltinTerm::AggMin => "#min",
            BuiltinTerm::AggMax => "#max",
            BuiltinTerm::AggSum => "#sum",
            BuiltinTerm::AggTimes => "#times",
            BuiltinTerm::AggAvg => "#avg",
            BuiltinTerm::AggAny => "#any",
        }
    }
}

/// A 64-bit-equivalent handle: `(kind, address)`. See module docs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id {
    pub kind: IdKind,
    pub address: IdAddress,
}

/// Sentinel value for "no such id" / lookup miss.
pub const ID_FAIL: Id = Id {
    kind: ALL_ONES,
    address: ALL_ONES,
};

/// An ordered list of handles: predicate-then-arguments for an atom's tuple,
/// a rule's head/body list, and so on.
pub type IdTuple = Vec<Id>;

impl Default for Id {
    fn default() -> Self {
        ID_FAIL
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == ID_FAIL {
            return write!(f, "ID_FAIL");
        }
        write!(f, "ID(kind={:#010x}, addr={})", self.kind, self.address)
    }
}

impl Id {
    #[inline]
    pub const fn new(kind: IdKind, address: IdAddress) -> Self {
        Id { kind, address }
    }

    #[inline]
    pub fn main_kind(self) -> IdKind {
        self.kind & MAINKIND_MASK
    }

    #[inline]
    pub fn sub_kind(self) -> IdKind {
        self.kind & SUBKIND_MASK
    }

    #[inline]
    pub fn properties(self) -> IdKind {
        self.kind & PROPERTY_MASK
    }

    #[inline]
    pub fn has_property(self, flag: IdKind) -> bool {
        self.kind & flag == flag
    }

    #[inline]
    pub fn with_property(self, flag: IdKind) -> Self {
        Id::new(self.kind | flag, self.address)
    }

    #[inline]
    pub fn is_term(self) -> bool {
        self.main_kind() == MAINKIND_TERM
    }

    #[inline]
    pub fn is_constant_term(self) -> bool {
        debug_assert!(self.is_term());
        self.sub_kind() == SUBKIND_TERM_CONSTANT
    }

    #[inline]
    pub fn is_integer_term(self) -> bool {
        debug_assert!(self.is_term());
        self.sub_kind() == SUBKIND_TERM_INTEGER
    }

    #[inline]
    pub fn is_variable_term(self) -> bool {
        debug_assert!(self.is_term());
        self.sub_kind() == SUBKIND_TERM_VARIABLE
    }

    #[inline]
    pub fn is_builtin_term(self) -> bool {
        debug_assert!(self.is_term());
        self.sub_kind() == SUBKIND_TERM_BUILTIN
    }

    #[inline]
    pub fn is_atom(self) -> bool {
        self.main_kind() == MAINKIND_ATOM
    }

    #[inline]
    pub fn is_literal(self) -> bool {
        self.main_kind() == MAINKIND_LITERAL
    }

    #[inline]
    pub fn is_rule(self) -> bool {
        self.main_kind() == MAINKIND_RULE
    }

    #[inline]
    pub fn is_module(self) -> bool {
        self.main_kind() == MAINKIND_MODULE
    }

    /// True for ground or nonground ordinary atoms (a "special bit trick": every
    /// ordinary-atom sub-kind is strictly below [`SUBKIND_ATOM_BUILTIN`]).
    #[inline]
    pub fn is_ordinary_atom(self) -> bool {
        debug_assert!(self.is_atom() || self.is_literal());
        let sk = self.sub_kind();
        sk == SUBKIND_ATOM_ORDINARYG || sk == SUBKIND_ATOM_ORDINARYN
    }

    #[inline]
    pub fn is_ordinary_ground_atom(self) -> bool {
        debug_assert!(self.is_atom() || self.is_literal());
        self.sub_kind() == SUBKIND_ATOM_ORDINARYG
    }

    #[inline]
    pub fn is_ordinary_nonground_atom(self) -> bool {
        debug_assert!(self.is_atom() || self.is_literal());
        self.sub_kind() == SUBKIND_ATOM_ORDINARYN
    }

    #[inline]
    pub fn is_builtin_atom(self) -> bool {
        debug_assert!(self.is_atom() || self.is_literal());
        self.sub_kind() == SUBKIND_ATOM_BUILTIN
    }

    #[inline]
    pub fn is_aggregate_atom(self) -> bool {
        debug_assert!(self.is_atom() || self.is_literal());
        self.sub_kind() == SUBKIND_ATOM_AGGREGATE
    }

    #[inline]
    pub fn is_external_atom(self) -> bool {
        debug_assert!(self.is_atom() || self.is_literal());
        self.sub_kind() == SUBKIND_ATOM_EXTERNAL
    }

    #[inline]
    pub fn is_module_atom(self) -> bool {
        debug_assert!(self.is_atom() || self.is_literal());
        self.sub_kind() == SUBKIND_ATOM_MODULE
    }

    #[inline]
    pub fn is_naf(self) -> bool {
        self.kind & NAF_MASK == NAF_MASK
    }

    #[inline]
    pub fn is_regular_rule(self) -> bool {
        debug_assert!(self.is_rule());
        self.sub_kind() == SUBKIND_RULE_REGULAR
    }

    #[inline]
    pub fn is_constraint(self) -> bool {
        debug_assert!(self.is_rule());
        self.sub_kind() == SUBKIND_RULE_CONSTRAINT
    }

    #[inline]
    pub fn is_weak_constraint(self) -> bool {
        debug_assert!(self.is_rule());
        self.sub_kind() == SUBKIND_RULE_WEAKCONSTRAINT
    }

    #[inline]
    pub fn rule_contains_eatoms(self) -> bool {
        debug_assert!(self.is_rule());
        self.has_property(PROPERTY_RULE_EXTATOMS)
    }

    /// Build the positive literal for an atom handle.
    #[inline]
    pub fn pos_literal_from_atom(atom: Id) -> Id {
        debug_assert!(atom.is_atom());
        Id::new(atom.kind | MAINKIND_LITERAL, atom.address)
    }

    /// Build the NAF (negation-as-failure) literal for an atom handle.
    #[inline]
    pub fn naf_literal_from_atom(atom: Id) -> Id {
        debug_assert!(atom.is_atom());
        Id::new(atom.kind | MAINKIND_LITERAL | NAF_MASK, atom.address)
    }

    #[inline]
    pub fn literal_from_atom(atom: Id, naf: bool) -> Id {
        if naf {
            Id::naf_literal_from_atom(atom)
        } else {
            Id::pos_literal_from_atom(atom)
        }
    }

    /// Strip the literal/NAF bits and recover the underlying atom handle.
    /// "toggling [NAF] yields the complement literal" (spec §3.1 invariant) is
    /// realized by [`Id::negated`], not here.
    #[inline]
    pub fn atom_from_literal(literal: Id) -> Id {
        debug_assert!(literal.is_literal());
        Id::new(
            (literal.kind & !(NAF_MASK | MAINKIND_MASK)) | MAINKIND_ATOM,
            literal.address,
        )
    }

    /// The complement literal: same atom, opposite polarity.
    #[inline]
    pub fn negated(self) -> Id {
        debug_assert!(self.is_literal());
        Id::new(self.kind ^ NAF_MASK, self.address)
    }

    #[inline]
    pub fn term_from_integer(i: u32) -> Id {
        Id::new(MAINKIND_TERM | SUBKIND_TERM_INTEGER, i)
    }

    #[inline]
    pub fn term_from_builtin(b: BuiltinTerm) -> Id {
        Id::new(MAINKIND_TERM | SUBKIND_TERM_BUILTIN, b as u32)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
