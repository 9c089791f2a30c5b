//! Abstract and concrete tree views over the production stream.
//!
//! Neither view re-parses anything. The abstract tree replays the
//! production stream: a positive entry opens a child of the current node, a
//! negative entry closes it. The concrete tree then walks the abstract one
//! and inserts token leaves for every token a node covers but none of its
//! children do — before the first child, between children, after the last.
//! Concatenating the concrete leaves in pre-order reproduces the source
//! byte for byte.

use std::fmt::Write;

use crate::node::NodeId;
use crate::result::ParseResult;
use crate::tokens::TokenKind;

#[derive(Clone, Copy, Default)]
struct AstEntry {
    parent: u32,
    first_child: u32,
    last_child: u32,
    next_sibling: u32,
    depth: u32,
}

#[derive(Clone, Copy)]
enum CstItem {
    Node(u32),
    Token(u32),
}

#[derive(Clone, Copy)]
struct CstEntry {
    item: CstItem,
    first_child: u32,
    last_child: u32,
    next_sibling: u32,
    depth: u32,
}

pub struct SyntaxTree<'a> {
    result: &'a ParseResult<'a>,
    ast: Vec<AstEntry>,
    cst: Vec<CstEntry>,
    cst_of_node: Vec<u32>,
}

impl<'a> SyntaxTree<'a> {
    /// Builds both views. An invalid parse has an empty production stream
    /// and yields an empty tree.
    pub fn build(result: &'a ParseResult<'a>) -> SyntaxTree<'a> {
        let mut tree = SyntaxTree {
            result,
            ast: vec![AstEntry::default(); result.nodes.len()],
            cst: Vec::new(),
            cst_of_node: vec![0; result.nodes.len()],
        };
        if !result.production.is_empty() {
            tree.build_ast();
            tree.build_cst();
        }
        tree
    }

    pub fn is_empty(&self) -> bool {
        self.cst.is_empty()
    }

    fn build_ast(&mut self) {
        let production = self.result.production;

        // Entry 0 opens the root; the trailing -1 closes it.
        let mut stack: Vec<u32> = vec![1];
        let mut current = 1u32;

        for position in 1..production.len() {
            let entry = *production.get(position);
            if entry < 0 {
                debug_assert_eq!(
                    (-entry) as u32,
                    current,
                    "production stream closes a node that is not open"
                );
                current = stack.pop().expect("unbalanced production stream");
                continue;
            }

            let id = entry as u32;
            self.ast[id as usize].parent = current;
            self.ast[id as usize].depth = stack.len() as u32;
            self.add_ast_child(current, id);
            stack.push(current);
            current = id;
        }

        debug_assert!(stack.is_empty(), "unbalanced production stream");
        debug_assert_eq!(current, 1);
    }

    fn add_ast_child(&mut self, parent: u32, child: u32) {
        if self.ast[parent as usize].first_child == 0 {
            self.ast[parent as usize].first_child = child;
        } else {
            let last = self.ast[parent as usize].last_child;
            self.ast[last as usize].next_sibling = child;
        }
        self.ast[parent as usize].last_child = child;
    }

    fn build_cst(&mut self) {
        // Slot 0 is the invalid sentinel.
        self.cst.push(CstEntry {
            item: CstItem::Node(0),
            first_child: 0,
            last_child: 0,
            next_sibling: 0,
            depth: 0,
        });
        self.cst.push(CstEntry {
            item: CstItem::Node(1),
            first_child: 0,
            last_child: 0,
            next_sibling: 0,
            depth: 0,
        });
        self.cst_of_node[1] = 1;

        let mut stack: Vec<u32> = vec![1];

        while let Some(node_id) = stack.pop() {
            let cst_index = self.cst_of_node[node_id as usize];
            let node = self.result.node(NodeId(node_id));
            let depth = self.ast[node_id as usize].depth;

            let mut last_token_write = node.token_start;
            let mut child = self.ast[node_id as usize].first_child;

            while child != 0 {
                let child_node = self.result.node(NodeId(child));

                // Leaves between the previous write point and this child.
                for token in last_token_write..child_node.token_start {
                    let leaf = self.push_cst(CstItem::Token(token), depth + 1);
                    self.add_cst_child(cst_index, leaf);
                }

                let child_cst = self.push_cst(CstItem::Node(child), depth + 1);
                self.add_cst_child(cst_index, child_cst);
                self.cst_of_node[child as usize] = child_cst;

                last_token_write = child_node.token_end;
                stack.push(child);
                child = self.ast[child as usize].next_sibling;
            }

            // Trailing leaves after the last child.
            for token in last_token_write..node.token_end {
                let leaf = self.push_cst(CstItem::Token(token), depth + 1);
                self.add_cst_child(cst_index, leaf);
            }
        }
    }

    fn push_cst(&mut self, item: CstItem, depth: u32) -> u32 {
        let index = self.cst.len() as u32;
        self.cst.push(CstEntry {
            item,
            first_child: 0,
            last_child: 0,
            next_sibling: 0,
            depth,
        });
        index
    }

    fn add_cst_child(&mut self, parent: u32, child: u32) {
        if self.cst[parent as usize].first_child == 0 {
            self.cst[parent as usize].first_child = child;
        } else {
            let last = self.cst[parent as usize].last_child;
            self.cst[last as usize].next_sibling = child;
        }
        self.cst[parent as usize].last_child = child;
    }

    // ----- queries -----

    pub fn parent_of(&self, id: NodeId) -> NodeId {
        NodeId(self.ast[id.index()].parent)
    }

    pub fn depth_of(&self, id: NodeId) -> u32 {
        self.ast[id.index()].depth
    }

    pub fn first_child_of(&self, id: NodeId) -> NodeId {
        NodeId(self.ast[id.index()].first_child)
    }

    pub fn next_sibling_of(&self, id: NodeId) -> NodeId {
        NodeId(self.ast[id.index()].next_sibling)
    }

    /// Direct children in source order.
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = Vec::new();
        let mut child = self.ast[id.index()].first_child;
        while child != 0 {
            children.push(NodeId(child));
            child = self.ast[child as usize].next_sibling;
        }
        children
    }

    // ----- dumps -----

    /// `Kind(tokenStart, tokenEnd)` per node, two-space indent per level.
    pub fn write_ast(&self, out: &mut impl Write) -> std::fmt::Result {
        if self.is_empty() {
            return Ok(());
        }

        let mut stack: Vec<u32> = vec![1];
        while let Some(id) = stack.pop() {
            let node = self.result.node(NodeId(id));
            let entry = self.ast[id as usize];
            writeln!(
                out,
                "{:indent$}{}({}, {})",
                "",
                node.kind_name(),
                node.token_start,
                node.token_end,
                indent = entry.depth as usize * 2
            )?;

            let mut children = self.children_of(NodeId(id));
            children.reverse();
            for child in children {
                stack.push(child.0);
            }
        }
        Ok(())
    }

    pub fn ast_to_string(&self) -> String {
        let mut out = String::new();
        self.write_ast(&mut out).expect("String write never fails");
        out
    }

    /// Concrete dump: nodes as `Kind(start, end)`, token leaves as
    /// `TokenKind("text")` (trivia text omitted to keep dumps readable).
    pub fn write_cst(
        &self,
        out: &mut impl Write,
        skip_whitespace: bool,
        skip_comments: bool,
    ) -> std::fmt::Result {
        if self.is_empty() {
            return Ok(());
        }

        let mut stack: Vec<u32> = vec![1];
        while let Some(index) = stack.pop() {
            let entry = self.cst[index as usize];
            match entry.item {
                CstItem::Node(id) => {
                    let node = self.result.node(NodeId(id));
                    writeln!(
                        out,
                        "{:indent$}{}({}, {})",
                        "",
                        node.kind_name(),
                        node.token_start,
                        node.token_end,
                        indent = entry.depth as usize * 2
                    )?;
                }
                CstItem::Token(token_index) => {
                    let token = self.result.tokens.get(token_index as usize);
                    if skip_whitespace && token.kind == TokenKind::Whitespace {
                        continue;
                    }
                    if skip_comments && token.kind == TokenKind::Comment {
                        continue;
                    }
                    let text = if token.is_trivia() || token.kind == TokenKind::EndOfInput {
                        ""
                    } else {
                        self.result.token_text(token_index as usize)
                    };
                    writeln!(
                        out,
                        "{:indent$}{}({:?})",
                        "",
                        token.kind.name(),
                        text,
                        indent = entry.depth as usize * 2
                    )?;
                }
            }

            // Pre-order: push children in reverse so the first child pops
            // first.
            let mut child = entry.first_child;
            let mut children = Vec::new();
            while child != 0 {
                children.push(child);
                child = self.cst[child as usize].next_sibling;
            }
            for &child in children.iter().rev() {
                stack.push(child);
            }
        }
        Ok(())
    }

    pub fn cst_to_string(&self) -> String {
        let mut out = String::new();
        self.write_cst(&mut out, false, false)
            .expect("String write never fails");
        out
    }

    /// Concatenates every concrete leaf's bytes in pre-order. For a
    /// well-formed tree this is byte-identical to the original source.
    pub fn reconstruct_source(&self) -> String {
        let mut out = String::new();
        if self.is_empty() {
            return out;
        }

        let mut stack: Vec<u32> = vec![1];
        while let Some(index) = stack.pop() {
            let entry = self.cst[index as usize];
            if let CstItem::Token(token_index) = entry.item {
                out.push_str(self.result.token_text(token_index as usize));
            }

            let mut child = entry.first_child;
            let mut children = Vec::new();
            while child != 0 {
                children.push(child);
                child = self.cst[child as usize].next_sibling;
            }
            for &child in children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Count of concrete leaves covering non-trivial tokens; invariant
    /// checks compare this against the projection size.
    pub fn non_trivial_leaf_count(&self) -> usize {
        self.cst
            .iter()
            .skip(1)
            .filter(|entry| match entry.item {
                CstItem::Token(index) => {
                    let token = self.result.tokens.get(index as usize);
                    !token.is_trivia() && token.kind != TokenKind::EndOfInput
                }
                CstItem::Node(_) => false,
            })
            .count()
    }
}
