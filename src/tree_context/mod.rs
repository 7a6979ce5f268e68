//! Syntax-aware context for grep matches.
//!
//! A [`TreeContext`] owns one file: its lines, a flattened syntax tree and the
//! per-line [`LineIndex`] built from it. Lines of interest (usually regex
//! matches) are expanded into a small show set containing the enclosing
//! scope headers, neighbouring statements and a sample of large bodies, and
//! then rendered with `⋮...` markers standing in for the hidden lines.
//!
//! ```no_run
//! use grep_ast::tree_context::{ContextOptions, TreeContext};
//! use regex::Regex;
//! use std::path::Path;
//!
//! let source = std::fs::read_to_string("app.py").unwrap();
//! let mut context =
//!     TreeContext::from_source(Path::new("app.py"), &source, ContextOptions::default()).unwrap();
//! let matches = context.grep(&Regex::new("TODO").unwrap());
//! context.add_lines_of_interest(matches);
//! context.add_context();
//! if let Some(excerpt) = context.render() {
//!     print!("{excerpt}");
//! }
//! ```

mod index;
mod render;
mod select;
mod syntax_tree;

pub use index::LineIndex;
pub use syntax_tree::{NodeId, Preorder, SyntaxNode, SyntaxTree};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, TreeContextError};
use crate::language::{get_pooled_parser, language_key_for_path, return_pooled_parser};

/// Thresholds steering how much context is revealed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextTuning {
    /// Longest header shown for a scope, in lines.
    pub header_max_lines: usize,
    /// Scopes spanning fewer lines than this are shown whole.
    pub whole_scope_lines: usize,
    /// Share of a large scope's size that may be revealed by sampling.
    pub sample_fraction: f64,
    pub sample_min: usize,
    pub sample_max: usize,
    /// Lines always shown at the top of the file.
    pub top_margin: usize,
}

impl Default for ContextTuning {
    fn default() -> Self {
        Self {
            header_max_lines: 10,
            whole_scope_lines: 5,
            sample_fraction: 0.10,
            sample_min: 5,
            sample_max: 25,
            top_margin: 3,
        }
    }
}

impl ContextTuning {
    /// How many lines sampling may add for a scope spanning `scope_size` lines.
    pub fn sample_budget(&self, scope_size: usize) -> f64 {
        (scope_size as f64 * self.sample_fraction)
            .min(self.sample_max as f64)
            .max(self.sample_min as f64)
    }
}

#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// Colour the match markers and the matched text.
    pub color: bool,
    /// Prefix every shown line with its 1-based number.
    pub line_number: bool,
    /// Show the headers of scopes enclosing each line of interest.
    pub parent_context: bool,
    /// Sample the body of scopes starting on a line of interest.
    pub child_context: bool,
    /// Log the per-line scope table and the node tree at debug level.
    pub verbose: bool,
    pub tuning: ContextTuning,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            color: false,
            line_number: false,
            parent_context: true,
            child_context: true,
            verbose: false,
            tuning: ContextTuning::default(),
        }
    }
}

pub struct TreeContext {
    lines: Vec<String>,
    tree: SyntaxTree,
    index: LineIndex,
    options: ContextOptions,
    lines_of_interest: BTreeSet<usize>,
    show_lines: BTreeSet<usize>,
    match_spans: BTreeMap<usize, Vec<Range<usize>>>,
}

impl TreeContext {
    /// Indexes `source` using an already parsed tree.
    ///
    /// # Errors
    ///
    /// [`TreeContextError::UnsupportedInput`] when `tree` is `None`.
    pub fn new(source: &str, tree: Option<SyntaxTree>, options: ContextOptions) -> Result<Self> {
        let tree = tree.ok_or_else(|| TreeContextError::unsupported("no syntax tree available"))?;
        let lines: Vec<String> = source.lines().map(str::to_string).collect();
        let index = LineIndex::build(&tree, lines.len(), options.tuning.header_max_lines);

        let context = Self {
            lines,
            tree,
            index,
            options,
            lines_of_interest: BTreeSet::new(),
            show_lines: BTreeSet::new(),
            match_spans: BTreeMap::new(),
        };

        if context.options.verbose {
            debug!("Scopes per line:\n{}", context.dump_scopes());
            debug!("Syntax tree:\n{}", context.dump_tree());
        }

        Ok(context)
    }

    /// Picks the grammar from `path`, parses `source` with a pooled parser and
    /// indexes the result.
    ///
    /// # Errors
    ///
    /// [`TreeContextError::UnsupportedInput`] when no grammar matches the path
    /// or the parser produces no tree.
    pub fn from_source(path: &Path, source: &str, options: ContextOptions) -> Result<Self> {
        let key = language_key_for_path(path).ok_or_else(|| {
            TreeContextError::unsupported(format!("Unknown language for {}", path.display()))
        })?;

        let mut parser =
            get_pooled_parser(key).map_err(|e| TreeContextError::unsupported(e.to_string()))?;
        let parsed = parser.parse(source, None);
        return_pooled_parser(key, parser);

        Self::new(
            source,
            parsed.as_ref().map(SyntaxTree::from_tree_sitter),
            options,
        )
    }

    /// Returns the lines matching `pattern` and remembers where the matches
    /// are so they can be highlighted. Does not mark them as interesting.
    pub fn grep(&mut self, pattern: &Regex) -> BTreeSet<usize> {
        let mut found = BTreeSet::new();
        for (i, line) in self.lines.iter().enumerate() {
            let spans: Vec<Range<usize>> = pattern.find_iter(line).map(|m| m.range()).collect();
            if !spans.is_empty() {
                found.insert(i);
                self.match_spans.insert(i, spans);
            }
        }
        found
    }

    /// Marks lines as interesting. Lines outside the file are ignored.
    pub fn add_lines_of_interest<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = usize>,
    {
        let line_count = self.lines.len();
        self.lines_of_interest
            .extend(lines.into_iter().filter(|&line| line < line_count));
    }

    /// Recomputes the show set from the current lines of interest.
    pub fn add_context(&mut self) {
        self.show_lines = select::expand_context(
            &self.tree,
            &self.index,
            &self.lines,
            &self.lines_of_interest,
            &self.options,
        );
    }

    /// The excerpt, or `None` when there is nothing to show.
    pub fn render(&self) -> Option<String> {
        render::render(
            &self.lines,
            &self.show_lines,
            &self.lines_of_interest,
            &self.match_spans,
            &self.options,
        )
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn lines_of_interest(&self) -> &BTreeSet<usize> {
        &self.lines_of_interest
    }

    pub fn show_lines(&self) -> &BTreeSet<usize> {
        &self.show_lines
    }

    pub fn index(&self) -> &LineIndex {
        &self.index
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// One row per source line: its scope starts, its number and its text.
    pub fn dump_scopes(&self) -> String {
        let scopes: Vec<String> = (0..self.lines.len())
            .map(|line| format!("{:?}", self.index.scopes(line)))
            .collect();
        let width = scopes.iter().map(String::len).max().unwrap_or(0);

        let mut dump = String::new();
        for (line, (scopes, text)) in scopes.iter().zip(&self.lines).enumerate() {
            let _ = writeln!(dump, "{scopes:<width$} {line} {text}");
        }
        dump
    }

    /// Indented outline of the named nodes with their line ranges.
    pub fn dump_tree(&self) -> String {
        let mut dump = String::new();
        for (id, depth) in self.tree.preorder() {
            let node = self.tree.node(id);
            if !node.named {
                continue;
            }
            let text = self
                .lines
                .get(node.start_line)
                .map(String::as_str)
                .unwrap_or("");
            let _ = writeln!(
                dump,
                "{}{} {}-{}={} {}",
                "   ".repeat(depth),
                node.kind,
                node.start_line,
                node.end_line,
                node.span() + 1,
                text.trim()
            );
        }
        dump
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn python_context(source: &str) -> TreeContext {
        TreeContext::from_source(&PathBuf::from("test.py"), source, ContextOptions::default())
            .expect("python is supported")
    }

    #[test]
    fn test_sample_budget_is_clamped() {
        let tuning = ContextTuning::default();
        let close = |size: usize, expected: f64| {
            let budget = tuning.sample_budget(size);
            assert!((budget - expected).abs() < 1e-9, "size {size}: {budget}");
        };

        close(0, 5.0);
        close(49, 5.0);
        close(50, 5.0);
        close(51, 5.1);
        close(120, 12.0);
        close(250, 25.0);
        close(251, 25.0);
        close(10_000, 25.0);
    }

    #[test]
    fn test_scenario_function_body_match() {
        let mut context = python_context("def f():\n    return 1\n\n");
        context.add_lines_of_interest([1]);
        context.add_context();

        assert!(context.show_lines().contains(&0));
        assert!(context.show_lines().contains(&1));

        let output = context.render().unwrap();
        assert!(output.starts_with("│def f():\n█    return 1\n"));
        assert!(!output.contains('⋮'));
    }

    #[test]
    fn test_scenario_deep_match_in_long_function() {
        let mut source = String::from("def handler(request):\n");
        for i in 1..148 {
            source.push_str(&format!("    step_{i} = request.get({i})\n"));
        }
        source.push_str("    if request.ready:\n");
        source.push_str("        if request.valid:\n");
        source.push_str("            target = request.payload\n");
        source.push_str("        request.finish()\n");
        for i in 152..200 {
            source.push_str(&format!("    step_{i} = request.get({i})\n"));
        }
        assert_eq!(source.lines().count(), 200);

        let mut context = python_context(&source);
        let matches = context.grep(&Regex::new("target").unwrap());
        assert_eq!(matches, BTreeSet::from([150]));
        context.add_lines_of_interest(matches);
        context.add_context();

        let show = context.show_lines();
        assert!(show.contains(&0));
        assert!(show.contains(&150));
        let budget = context.options.tuning.sample_max;
        assert!(show.len() <= 1 + budget + 3 + 10 + 10);

        let output = context.render().unwrap();
        assert!(output.contains("⋮..."));
        assert!(output.contains("█            target = request.payload\n"));
        assert!(output.starts_with("│def handler(request):\n"));
    }

    #[test]
    fn test_scenario_empty_interest() {
        let mut context = python_context("x = 1\ny = 2\n");
        context.add_context();

        assert!(context.show_lines().is_empty());
        assert_eq!(context.render(), None);
    }

    #[test]
    fn test_missing_tree_is_unsupported() {
        let result = TreeContext::new("x = 1\n", None, ContextOptions::default());
        assert!(matches!(result, Err(TreeContextError::UnsupportedInput(_))));
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let result =
            TreeContext::from_source(&PathBuf::from("notes.txt"), "hello", ContextOptions::default());
        assert!(matches!(result, Err(TreeContextError::UnsupportedInput(_))));
    }

    #[test]
    fn test_add_context_is_idempotent() {
        let mut context = python_context(
            "import sys\n\nclass App:\n    def run(self):\n        print(sys.argv)\n        return 0\n\nApp().run()\n",
        );
        context.add_lines_of_interest([4]);
        context.add_context();
        let first = context.show_lines().clone();
        context.add_context();

        assert_eq!(&first, context.show_lines());
        assert!(first.is_superset(context.lines_of_interest()));
    }

    #[test]
    fn test_interest_outside_file_is_ignored() {
        let mut context = python_context("a = 1\n");
        context.add_lines_of_interest([0, 1, 42]);
        assert_eq!(context.lines_of_interest(), &BTreeSet::from([0]));
    }

    #[test]
    fn test_zero_line_file() {
        let mut context = python_context("");
        context.add_lines_of_interest([0]);
        context.add_context();
        assert_eq!(context.render(), None);
    }

    #[test]
    fn test_grep_with_line_numbers() {
        let source = "import os\n\ndef main():\n    path = os.getcwd()\n    print(path)\n\nmain()\n";
        let mut context = TreeContext::from_source(
            &PathBuf::from("main.py"),
            source,
            ContextOptions {
                line_number: true,
                ..ContextOptions::default()
            },
        )
        .unwrap();
        let matches = context.grep(&Regex::new("getcwd").unwrap());
        context.add_lines_of_interest(matches);
        context.add_context();

        let output = context.render().unwrap();
        assert!(output.contains("  4█    path = os.getcwd()\n"));
        assert!(output.contains("  3│def main():\n"));
    }

    #[test]
    fn test_dumps() {
        let context = python_context("def f():\n    return 1\n");
        let scopes = context.dump_scopes();
        assert!(scopes.contains("[0, 1] 1     return 1"));

        let tree = context.dump_tree();
        assert!(tree.starts_with("module 0-"));
        assert!(tree.contains("   function_definition 0-1=2 def f():"));
    }
}
