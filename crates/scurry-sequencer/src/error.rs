//! Crate-level error type for `scurry-sequencer`.

use thiserror::Error;

/// Errors surfaced while ordering and chunking migration statements.
#[derive(Debug, Error)]
pub enum SequencerError {
    /// A dependency cycle was found while ordering nodes (§4.5 step 3).
    /// Carries the cycle rendered as the ordered list of node labels that
    /// compose it.
    #[error("circular dependency: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),
}

/// Result type alias for `scurry-sequencer` operations.
pub type Result<T> = std::result::Result<T, SequencerError>;
