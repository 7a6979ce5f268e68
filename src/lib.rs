//! grep-ast searches source files with a regular expression and shows each match
//! inside the code structure around it: the headers of enclosing functions and
//! classes, nearby statements and a sample of large bodies.
//!
//! This crate provides a library interface to the grep-ast functionality, enabling
//! integration with other tools and testing.

pub mod config;
pub mod error;
pub mod grep;
pub mod language;
pub mod tree_context;

// Re-export commonly used types for convenience
pub use error::TreeContextError;
pub use tree_context::{ContextOptions, ContextTuning, TreeContext};
