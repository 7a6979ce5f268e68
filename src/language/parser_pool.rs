use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use tree_sitter::Parser;

use crate::language::factory;

const DEFAULT_MAX_PARSERS_PER_LANGUAGE: usize = 4;

fn get_max_parsers_per_language() -> usize {
    std::env::var("GREP_AST_PARSER_POOL_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::cmp::max(
                rayon::current_num_threads(),
                DEFAULT_MAX_PARSERS_PER_LANGUAGE,
            )
        })
}

lazy_static::lazy_static! {
    /// Ready-to-use tree-sitter parsers keyed by file extension ("rs", "py", ...).
    ///
    /// Setting a grammar on a fresh parser is comparatively expensive, so files
    /// searched in parallel borrow a configured parser and hand it back afterwards.
    static ref PARSER_POOL: Mutex<HashMap<String, Vec<Parser>>> = Mutex::new(HashMap::new());
}

/// Gets a parser from the pool for the specified language extension.
///
/// A pooled parser is returned when one is available; otherwise a new parser is
/// created and configured with the extension's grammar.
///
/// # Errors
///
/// Fails when the extension has no bundled grammar or the grammar's ABI is
/// rejected by the tree-sitter runtime.
pub fn get_pooled_parser(extension: &str) -> Result<Parser> {
    {
        let mut pool = PARSER_POOL
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parsers) = pool.get_mut(extension) {
            if let Some(parser) = parsers.pop() {
                debug!(
                    "Parser pool: reusing parser for '{extension}' ({} left)",
                    parsers.len()
                );
                return Ok(parser);
            }
        }
    }

    debug!("Parser pool: creating parser for '{extension}'");

    let language_impl = factory::get_language_impl(extension)
        .ok_or_else(|| anyhow::anyhow!("Unsupported language extension: {}", extension))?;

    let mut parser = Parser::new();
    parser
        .set_language(&language_impl.get_tree_sitter_language())
        .map_err(|e| anyhow::anyhow!("Failed to set parser language: {}", e))?;

    Ok(parser)
}

/// Returns a parser to the pool for reuse.
///
/// Parsers beyond the per-language capacity are dropped.
pub fn return_pooled_parser(extension: &str, mut parser: Parser) {
    parser.reset();

    let mut pool = PARSER_POOL
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let parsers = pool.entry(extension.to_string()).or_default();

    if parsers.len() < get_max_parsers_per_language() {
        parsers.push(parser);
    } else {
        debug!(
            "Parser pool: discarding parser for '{extension}' (pool at capacity: {})",
            parsers.len()
        );
    }
}

/// Number of idle parsers per extension.
pub fn get_pool_stats() -> HashMap<String, usize> {
    let pool = PARSER_POOL
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    pool.iter()
        .map(|(ext, parsers)| (ext.clone(), parsers.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only one test may inspect the shared pool at a time
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    // Extensions nothing else in the unit tests parses, so counts stay stable
    const RUBY: &str = "rb";
    const GO: &str = "go";

    #[test]
    fn test_parser_pool_reuses_returned_parser() {
        let _lock = TEST_MUTEX.lock().unwrap_or_else(|p| p.into_inner());

        let parser = get_pooled_parser(RUBY).expect("Should create Ruby parser");
        return_pooled_parser(RUBY, parser);
        let before = get_pool_stats().get(RUBY).copied().unwrap_or(0);
        assert!(before >= 1);

        let mut parser = get_pooled_parser(RUBY).expect("Should get pooled Ruby parser");
        let after = get_pool_stats().get(RUBY).copied().unwrap_or(0);
        assert_eq!(after, before - 1);

        let tree = parser.parse("def hello\n  1\nend\n", None).unwrap();
        assert_eq!(tree.root_node().kind(), "program");
        return_pooled_parser(RUBY, parser);
    }

    #[test]
    fn test_parser_pool_capacity_limit() {
        let _lock = TEST_MUTEX.lock().unwrap_or_else(|p| p.into_inner());

        let parsers: Vec<_> = (0..get_max_parsers_per_language() + 3)
            .map(|_| get_pooled_parser(GO).expect("Should create Go parser"))
            .collect();
        for parser in parsers {
            return_pooled_parser(GO, parser);
        }

        let stats = get_pool_stats();
        assert!(stats[GO] <= get_max_parsers_per_language());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = get_pooled_parser("unsupported");
        assert!(result.is_err());
        assert!(format!("{:?}", result.err().unwrap()).contains("Unsupported language extension"));
    }
}
