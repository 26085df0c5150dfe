//! Structured logging/statistics observer.
//!
//! Replaces `original_source`'s `Logger.hpp` singleton-with-indentation
//! (design note §9: "Global logger with indentation → structured event
//! records passed to an observer; indentation is a presentation concern
//! of the observer, not the core"). The core never formats or indents;
//! it emits [`tracing`] events under a small set of targets that mirror
//! the original bitmask levels, and a host process attaches whatever
//! subscriber it likes (`tracing_subscriber::fmt`, JSON, etc.).

/// Targets mirroring the original `Logger::PLUGIN/ANALYZE/MODELB/STATS` levels.
pub mod targets {
    pub const PLUGIN: &str = "asp_eval_core::plugin";
    pub const ANALYZE: &str = "asp_eval_core::analyze";
    pub const MODELB: &str = "asp_eval_core::modelb";
    pub const STATS: &str = "asp_eval_core::stats";
}

/// Install a reasonable default subscriber for hosts that don't configure
/// their own. Idempotent: a second call is a harmless no-op if a global
/// subscriber is already set.
pub fn init_default_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
