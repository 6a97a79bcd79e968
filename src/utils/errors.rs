//! Error types for the sliding-window pass.
//!
//! Only malformed input trees produce errors. Non-applicability of the
//! optimization (no monotonic direction, scatter along the axis, no overlap,
//! dimension ambiguity) is not an error: the pass returns the subtree
//! unchanged and moves on.

use thiserror::Error;

/// Invariant violations raised while sliding.
///
/// Each of these indicates a tree that an earlier lowering pass should not
/// have produced; compilation cannot continue locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlideError {
    /// A required-region bound name was expected in scope but is missing.
    #[error("missing required-region bound `{bound}` while sliding stage `{stage}`")]
    MissingBound {
        /// The symbolic bound name that was not in scope.
        bound: String,
        /// The stage whose region was being inspected.
        stage: String,
    },

    /// A bound replacement recorded during the slide never matched a binding.
    #[error("bound replacement for `{0}` was never applied; the tree shape does not match the region bindings")]
    UnconsumedReplacement(String),

    /// A slid loop's minimum was not the lowered `<loop>.loop_min` variable.
    #[error("loop `{0}` was slid but its minimum is not a lowered loop-min variable")]
    MalformedLoopMin(String),

    /// Catch-all for internal inconsistencies.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias for the pass.
pub type SlideResult<T> = Result<T, SlideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SlideError::MissingBound {
            bound: "blur.s0.y.min".to_string(),
            stage: "blur".to_string(),
        };
        let s = format!("{}", err);
        assert!(s.contains("blur.s0.y.min"));
        assert!(s.contains("blur"));
    }
}
