//! Per-line indices derived once from the syntax tree.

use std::ops::Range;

use super::syntax_tree::{NodeId, SyntaxTree};

/// Scope membership, node starts and scope headers for every line of a file.
///
/// All tables have `num_lines = line_count + 1` slots; the last slot stands for
/// the position just past the final line. Node positions are clamped into that
/// range, so a root node ending after a trailing newline owns the sentinel slot.
#[derive(Debug, Clone)]
pub struct LineIndex {
    num_lines: usize,
    /// Start lines of every node spanning the line, ascending.
    scopes: Vec<Vec<usize>>,
    /// Nodes starting on the line, in pre-order.
    nodes: Vec<Vec<NodeId>>,
    headers: Vec<Range<usize>>,
    /// Greatest end line among the nodes starting on the line.
    last_lines: Vec<Option<usize>>,
}

impl LineIndex {
    pub fn build(tree: &SyntaxTree, line_count: usize, header_max_lines: usize) -> Self {
        let num_lines = line_count + 1;
        let sentinel = line_count;

        let mut scopes: Vec<Vec<usize>> = vec![Vec::new(); num_lines];
        let mut nodes: Vec<Vec<NodeId>> = vec![Vec::new(); num_lines];
        let mut last_lines: Vec<Option<usize>> = vec![None; num_lines];
        // (size, start, end) of each multi-line node, keyed by its start line
        let mut candidates: Vec<Vec<(usize, usize, usize)>> = vec![Vec::new(); num_lines];

        for (id, _) in tree.preorder() {
            let node = tree.node(id);
            let start = node.start_line.min(sentinel);
            let end = node.end_line.clamp(start, sentinel);

            nodes[start].push(id);
            last_lines[start] = Some(last_lines[start].map_or(end, |last| last.max(end)));

            if end > start {
                candidates[start].push((end - start, start, end));
            }

            for scope in &mut scopes[start..=end] {
                insert_sorted(scope, start);
            }
        }

        let headers = candidates
            .into_iter()
            .enumerate()
            .map(|(line, mut candidates)| {
                // A lone multi-line node is the scope itself; only a second,
                // tighter construct on the same line (a wrapped parameter
                // list, a nested definition) widens the header.
                if candidates.len() > 1 {
                    candidates.sort_unstable();
                    let (size, head_start, head_end) = candidates[0];
                    if size > header_max_lines {
                        head_start..head_start + header_max_lines
                    } else {
                        head_start..head_end
                    }
                } else {
                    line..line + 1
                }
            })
            .collect();

        Self {
            num_lines,
            scopes,
            nodes,
            headers,
            last_lines,
        }
    }

    /// Number of slots, i.e. the number of source lines plus the sentinel.
    pub fn num_lines(&self) -> usize {
        self.num_lines
    }

    pub fn scopes(&self, line: usize) -> &[usize] {
        &self.scopes[line]
    }

    pub fn nodes(&self, line: usize) -> &[NodeId] {
        &self.nodes[line]
    }

    pub fn header(&self, line: usize) -> Range<usize> {
        self.headers[line].clone()
    }

    /// Last line of the longest node starting on `line`, if any starts there.
    pub fn last_line(&self, line: usize) -> Option<usize> {
        self.last_lines[line]
    }

    /// True when `a` and `b` have at least one enclosing scope in common.
    pub fn shares_scope(&self, a: usize, b: usize) -> bool {
        let (left, right) = (&self.scopes[a], &self.scopes[b]);
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            match left[i].cmp(&right[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => return true,
            }
        }
        false
    }
}

// Pre-order visits start lines in non-decreasing order, so this is almost
// always a push.
fn insert_sorted(set: &mut Vec<usize>, value: usize) {
    match set.last() {
        None => set.push(value),
        Some(&last) if last < value => set.push(value),
        Some(&last) if last == value => {}
        Some(_) => {
            if let Err(pos) = set.binary_search(&value) {
                set.insert(pos, value);
            }
        }
    }
}
