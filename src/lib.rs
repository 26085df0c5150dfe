//! # ASP Eval Core
//!
//! The evaluation core of a modular, higher-order answer-set programming
//! engine with external atoms: everything from a ground program and an
//! evaluation-unit graph down to the enumerated answer sets, minus parsing
//! and a concrete external-atom library.
//!
//! ## Pipeline
//!
//! ```text
//! Registry (terms, atoms, rules)
//!     ↓
//! [Dependency graph (E)]        → positive/negative/disjunctive/external edges
//!     ↓
//! [Component graph (F)]         → SCCs, stratification
//!     ↓
//! [Eval graph (G)]              → evaluation units, heuristically merged
//!     ↓
//! [Grounder (D) / CDNL solver]  → per-unit answer sets, nogood-driven
//!     ↓
//! [Model graph (H)]             → IN/INPROJ/OUT/OUTPROJ models, join reuse
//!     ↓
//! [Online/offline builder (I)]  → demand-driven model enumeration
//!     ↓
//! [MLP driver (J)]               → module instantiation across the whole graph
//! ```
//!
//! External atoms are a trait boundary ([`plugin::PluginAtom`]) rather than
//! a bundled library, and an external backend is likewise a trait boundary
//! ([`backend::AspBackend`]) rather than a bundled solver process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use asp_eval_core::config::Config;
//! use asp_eval_core::registry::Registry;
//!
//! let config = Config::load()?;
//! let mut registry = Registry::new();
//! // ... store rules and atoms, build the graphs, drive a builder ...
//! ```

pub mod backend;
pub mod builder;
pub mod component_graph;
pub mod config;
pub mod depgraph;
pub mod error;
pub mod eval_graph;
pub mod grounder;
pub mod heuristics;
pub mod id;
pub mod interpretation;
pub mod mlp;
pub mod model_graph;
pub mod nogood;
pub mod observer;
pub mod plugin;
pub mod registry;

pub use error::{EvalError, EvalResult};
pub use id::Id;
pub use interpretation::Interpretation;
