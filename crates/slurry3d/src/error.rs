//! Fatal initialization errors.
//!
//! Everything here is surfaced before the first tick; the per-tick hot path
//! has no recoverable error type. Numerical degeneracies (zero distance, zero
//! density) are epsilon-guarded locally, and neighbor-cap overflow truncates
//! — neither is an error by contract.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// A solver with no particles has nothing to do and is almost always a
    /// caller bug upstream in the spawn feed.
    #[error("spawn feed produced an empty population")]
    EmptyPopulation,

    /// A configuration field is out of range or non-finite.
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },
}
