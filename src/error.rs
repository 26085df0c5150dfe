//! The four error kinds of spec §7, grounded on the teacher's per-concern
//! `thiserror` enums (`storage::error::StorageError`,
//! `execution::limits::ResourceError`).
//!
//! Kind 4 ("internal invariant violation") is modelled as a Rust `panic!`
//! guarded by `debug_assert!`, matching spec §7's "enabled only in debug
//! builds as assertions" — it is not a variant here because it is never
//! meant to be caught and handled, only to fire loudly during development.

use crate::id::Id;
use thiserror::Error;

/// Kind 1: ill-formed input referenced during construction of registry rows.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no row of kind {kind:#010x} at address {address}")]
    UnknownHandle { kind: u32, address: u32 },
    #[error("handle {0:?} does not match the expected kind for this table")]
    KindMismatch(Id),
    #[error("duplicate insertion under secondary key {0:?} would relocate an existing handle")]
    WouldRelocate(Id),
}

/// Kind 2: strong-safety / input-safety violations, unprepared module calls,
/// unknown module atoms.
#[derive(Debug, Error)]
pub enum SafetyError {
    #[error("rule {rule:?} fails strong safety: variable is unbound in the positive body")]
    StrongSafetyViolation { rule: Id },
    #[error("external atom {atom:?} fails input safety: input term is not ground")]
    InputSafetyViolation { atom: Id },
    #[error("module atom {atom:?} references unknown module {module_name:?}")]
    UnknownModule { atom: Id, module_name: String },
    #[error("module instance for {atom:?} was never prepared before being queried")]
    UnpreparedModuleCall { atom: Id },
}

/// Kind 3: backend / oracle I/O failure. This never aborts the enumeration
/// directly — per spec §7 it is "propagated as a model-stream termination
/// for the current unit", i.e. callers map it to `None` and backtrack; only
/// [`EvalError::Fatal`]'s `BackendExhausted` variant represents the case
/// where every alternative has also failed.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend pipe broken: {0}")]
    BrokenPipe(String),
    #[error("backend subprocess exited unexpectedly: {0}")]
    SubprocessDied(String),
    #[error("oracle {name:?} raised an exception: {message}")]
    OracleException { name: String, message: String },
}

/// Top-level error type threaded through the evaluation core.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("safety violation: {0}")]
    Safety(#[from] SafetyError),

    /// Repeated backend/oracle failure across *all* alternatives at some eval
    /// unit, with no further input models to retry against (spec §7 kind 3,
    /// "surface as a fatal evaluation error").
    #[error("evaluation aborted: backend/oracle failed on every alternative: {0}")]
    BackendExhausted(BackendError),

    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

pub type EvalResult<T> = Result<T, EvalError>;
