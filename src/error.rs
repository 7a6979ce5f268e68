// Error types for tree context construction and querying

/// Errors surfaced by [`crate::tree_context::TreeContext`].
///
/// Neither variant is fatal for a batch: the file driver skips the file that
/// produced it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum TreeContextError {
    /// No syntax tree is available for this input (unknown language, no
    /// grammar, or the parser gave up).
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// The search pattern is not a valid regular expression.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl TreeContextError {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedInput(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, TreeContextError>;
