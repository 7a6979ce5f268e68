// Language module - maps file names to tree-sitter grammars and pools the
// configured parsers.

pub mod factory;
pub mod grammars;
pub mod language_trait;
pub mod parser_pool;

pub use factory::{filename_to_language, get_language_impl, language_key_for_path};
pub use parser_pool::{get_pool_stats, get_pooled_parser, return_pooled_parser};
