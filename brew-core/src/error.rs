//! Error types for the brewing core.
//!
//! The recipe engine and the timer have no failure modes of their own; the
//! only fallible operation is turning user-supplied text into a typed input.

/// A roast, grind or method label that matches no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: `{value}`")]
pub struct ParseLabelError {
    kind: &'static str,
    value: String,
}

impl ParseLabelError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
