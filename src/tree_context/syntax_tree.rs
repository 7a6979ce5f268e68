//! Owned, line-oriented copy of a concrete syntax tree.
//!
//! Context selection only needs each node's first and last line plus its
//! children, so the tree-sitter tree is flattened once into an arena. Nodes
//! are stored in pre-order; the root is always node `0`.

use tree_sitter::Tree;

/// Index of a node inside a [`SyntaxTree`].
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: &'static str,
    pub named: bool,
    /// First line of the node (0-based).
    pub start_line: usize,
    /// Last line of the node (0-based, inclusive).
    pub end_line: usize,
    pub children: Vec<NodeId>,
}

impl SyntaxNode {
    /// Number of line breaks the node spans; `0` for single-line nodes.
    pub fn span(&self) -> usize {
        self.end_line.saturating_sub(self.start_line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    /// A tree consisting of a single root node.
    pub fn with_root(kind: &'static str, start_line: usize, end_line: usize) -> Self {
        Self {
            nodes: vec![SyntaxNode {
                kind,
                named: true,
                start_line,
                end_line,
                children: Vec::new(),
            }],
        }
    }

    /// Appends a named child to `parent` and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a node of this tree.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        kind: &'static str,
        start_line: usize,
        end_line: usize,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SyntaxNode {
            kind,
            named: true,
            start_line,
            end_line,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Flattens a tree-sitter tree, visiting every node (named or not) with a
    /// cursor rather than recursion.
    pub fn from_tree_sitter(tree: &Tree) -> Self {
        let mut nodes = Vec::new();
        let mut parents: Vec<NodeId> = Vec::new();
        let mut cursor = tree.walk();

        loop {
            let node = cursor.node();
            let id = nodes.len();
            nodes.push(SyntaxNode {
                kind: node.kind(),
                named: node.is_named(),
                start_line: node.start_position().row,
                end_line: node.end_position().row,
                children: Vec::new(),
            });
            if let Some(&parent) = parents.last() {
                nodes[parent].children.push(id);
            }

            if cursor.goto_first_child() {
                parents.push(id);
                continue;
            }

            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return Self { nodes };
                }
                parents.pop();
            }
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order walk yielding `(id, depth)` pairs.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![(self.root(), 0)],
        }
    }

    /// Appends `id` and all of its descendants to `out`, in pre-order.
    pub fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev());
        }
    }
}

pub struct Preorder<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<(NodeId, usize)>,
}

impl Iterator for Preorder<'_> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        self.stack.extend(
            self.tree.nodes[id]
                .children
                .iter()
                .rev()
                .map(|&child| (child, depth + 1)),
        );
        Some((id, depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse_python(source: &str) -> Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn test_from_tree_sitter_keeps_every_node() {
        let tree = parse_python("def f(a):\n    return a\n");
        let flat = SyntaxTree::from_tree_sitter(&tree);

        assert_eq!(flat.node(flat.root()).kind, "module");
        assert_eq!(flat.len(), tree.root_node().descendant_count());

        let function = flat.node(flat.root()).children[0];
        assert_eq!(flat.node(function).kind, "function_definition");
        assert_eq!(flat.node(function).start_line, 0);
        assert_eq!(flat.node(function).end_line, 1);
    }

    #[test]
    fn test_preorder_matches_collect_subtree() {
        let tree = SyntaxTree::from_tree_sitter(&parse_python(
            "class A:\n    def m(self):\n        pass\n\nx = 1\n",
        ));
        let walked: Vec<NodeId> = tree.preorder().map(|(id, _)| id).collect();
        let mut collected = Vec::new();
        tree.collect_subtree(tree.root(), &mut collected);
        assert_eq!(walked, collected);
        // Arena order is pre-order as well.
        assert_eq!(walked, (0..tree.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_handmade_tree() {
        let mut tree = SyntaxTree::with_root("program", 0, 4);
        let block = tree.add_child(tree.root(), "block", 1, 3);
        let leaf = tree.add_child(block, "statement", 2, 2);

        assert_eq!(tree.node(block).span(), 2);
        assert_eq!(tree.node(leaf).span(), 0);
        let depths: Vec<usize> = tree.preorder().map(|(_, depth)| depth).collect();
        assert_eq!(depths, vec![0, 1, 2]);
    }
}
