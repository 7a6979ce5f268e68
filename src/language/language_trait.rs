use tree_sitter::Language as TSLanguage;

/// Trait that defines the interface for all language implementations.
pub trait LanguageImpl: Send + Sync {
    /// Get the tree-sitter language for parsing
    fn get_tree_sitter_language(&self) -> TSLanguage;

    /// Grammar name as listed by `--languages`
    fn name(&self) -> &'static str;
}
