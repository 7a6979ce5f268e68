//! Expands the lines of interest into the set of lines worth showing.

use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::ops::Range;

use super::index::LineIndex;
use super::syntax_tree::SyntaxTree;
use super::{ContextOptions, ContextTuning};

/// Computes the show set for `interest`. Returns an empty set when there is
/// nothing of interest.
pub(crate) fn expand_context(
    tree: &SyntaxTree,
    index: &LineIndex,
    lines: &[String],
    interest: &BTreeSet<usize>,
    options: &ContextOptions,
) -> BTreeSet<usize> {
    if interest.is_empty() || lines.is_empty() {
        return BTreeSet::new();
    }

    let mut expansion = Expansion::new(tree, index, &options.tuning);
    expansion.seed(interest);
    expansion.link_neighbors(interest);

    let bottom_line = lines.len() - 1;
    expansion.show(bottom_line);
    expansion.add_parent_scopes(bottom_line);

    if options.parent_context {
        for &line in interest {
            expansion.add_parent_scopes(line);
        }
    }

    if options.child_context {
        for &line in interest {
            expansion.add_child_context(line);
        }
    }

    expansion.show_range(0..options.tuning.top_margin.min(lines.len()));
    expansion.close_small_gaps(lines);
    expansion.into_lines()
}

/// State of one expansion: the growing show set plus the lines whose
/// ancestor scopes were already added.
struct Expansion<'a> {
    tree: &'a SyntaxTree,
    index: &'a LineIndex,
    tuning: &'a ContextTuning,
    show: BTreeSet<usize>,
    visited: Vec<bool>,
}

impl<'a> Expansion<'a> {
    fn new(tree: &'a SyntaxTree, index: &'a LineIndex, tuning: &'a ContextTuning) -> Self {
        Self {
            tree,
            index,
            tuning,
            show: BTreeSet::new(),
            visited: vec![false; index.num_lines()],
        }
    }

    /// Adds a real source line; the sentinel slot and anything past it are ignored.
    fn show(&mut self, line: usize) {
        if line + 1 < self.index.num_lines() {
            self.show.insert(line);
        }
    }

    fn show_range(&mut self, range: Range<usize>) {
        for line in range {
            self.show(line);
        }
    }

    fn seed(&mut self, interest: &BTreeSet<usize>) {
        for &line in interest {
            self.show(line);
        }
    }

    /// Pulls in the line above and below each line of interest when they
    /// share an enclosing scope.
    fn link_neighbors(&mut self, interest: &BTreeSet<usize>) {
        let index = self.index;
        for &line in interest {
            let neighbors = [line.checked_sub(1), Some(line + 1)];
            for neighbor in neighbors.into_iter().flatten() {
                if neighbor < index.num_lines() && index.shares_scope(line, neighbor) {
                    self.show(neighbor);
                }
            }
        }
    }

    /// Shows the header of every scope enclosing `line`, then repeats for the
    /// closing line of each of those scopes.
    fn add_parent_scopes(&mut self, line: usize) {
        let index = self.index;
        let mut pending = vec![line];

        while let Some(line) = pending.pop() {
            if std::mem::replace(&mut self.visited[line], true) {
                continue;
            }
            for &scope in index.scopes(line) {
                self.show_range(index.header(scope));
                if let Some(last_line) = index.last_line(scope) {
                    pending.push(last_line);
                }
            }
        }
    }

    /// Reveals the body of a scope starting on `line`: small ones entirely,
    /// large ones through the headers of their biggest descendants until the
    /// sampling budget is spent.
    fn add_child_context(&mut self, line: usize) {
        let (tree, index) = (self.tree, self.index);
        let Some(last_line) = index.last_line(line) else {
            return;
        };

        let size = last_line - line;
        if size < self.tuning.whole_scope_lines {
            self.show_range(line..last_line + 1);
            return;
        }

        let mut children = Vec::new();
        for &node in index.nodes(line) {
            tree.collect_subtree(node, &mut children);
        }
        children.sort_by_key(|&id| Reverse(tree.node(id).span()));

        let currently_showing = self.show.len();
        let max_to_show = self.tuning.sample_budget(size);
        let sentinel = index.num_lines() - 1;

        for child in children {
            if (self.show.len() - currently_showing) as f64 > max_to_show {
                break;
            }
            self.add_parent_scopes(tree.node(child).start_line.min(sentinel));
        }
    }

    /// Fills one-line holes and keeps the blank line that follows a shown
    /// line. Holes are filled again afterwards so a kept blank never leaves
    /// a new one-line hole behind.
    fn close_small_gaps(&mut self, lines: &[String]) {
        self.fill_single_line_holes();

        for i in 0..lines.len().saturating_sub(1) {
            if self.show.contains(&i)
                && !lines[i].trim().is_empty()
                && lines[i + 1].trim().is_empty()
            {
                self.show.insert(i + 1);
            }
        }

        self.fill_single_line_holes();
    }

    fn fill_single_line_holes(&mut self) {
        let holes: Vec<usize> = self
            .show
            .iter()
            .zip(self.show.iter().skip(1))
            .filter(|(a, b)| **b - **a == 2)
            .map(|(a, _)| a + 1)
            .collect();
        self.show.extend(holes);
    }

    fn into_lines(self) -> BTreeSet<usize> {
        self.show
    }
}
