//! Structured error handling for the simulation engine.
//!
//! Construction-time failures (`AppConfig::validate`, `World::new`) are
//! surfaced to the caller as [`SimError`]. Per-tick recoverable conditions
//! (`internal_inconsistency`, `arithmetic_edge`) are never returned through
//! the tick boundary; they are counted on [`crate::world::World`] and logged
//! once via `tracing::warn!`.

use thiserror::Error;

/// The four error kinds named by the specification, plus a catch-all for
/// wrapped I/O failures at the embedding boundary.
#[derive(Error, Debug)]
pub enum SimError {
    /// Nonpositive dimensions, negative weights, or unknown enum names at
    /// construction time.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Registry load/save failure. Logged and recovered from; the caller
    /// only sees this when asking a construction path to read/write
    /// directly (e.g. `SpeciesRegistry::load`).
    #[error("io error: {0}")]
    Io(String),

    /// A spatial-bucket lookup disagreed with the organism's authoritative
    /// position. Corrected by the next periodic rebuild.
    #[error("internal inconsistency at tick {tick}: {detail}")]
    InternalInconsistency { tick: u64, detail: String },

    /// A denominator would have been zero, or a random draw fell outside
    /// its legal range before clamping.
    #[error("arithmetic edge case: {0}")]
    ArithmeticEdge(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    #[must_use]
    pub fn config_invalid(msg: impl Into<String>) -> Self {
        Self::ConfigInvalid(msg.into())
    }

    #[must_use]
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    #[must_use]
    pub fn internal_inconsistency(tick: u64, detail: impl Into<String>) -> Self {
        Self::InternalInconsistency {
            tick,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn arithmetic_edge(msg: impl Into<String>) -> Self {
        Self::ArithmeticEdge(msg.into())
    }
}

/// Guards a denominator against zero, per the §7 `arithmetic_edge` policy:
/// division by zero is avoided by flooring the denominator at a small
/// epsilon rather than branching at every call site.
#[inline]
#[must_use]
pub fn safe_denom(x: f32) -> f32 {
    x.max(f32::EPSILON)
}

#[inline]
#[must_use]
pub fn safe_denom_f64(x: f64) -> f64 {
    x.max(f64::EPSILON)
}
