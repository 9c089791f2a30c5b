//! The public parse result.
//!
//! Everything in a [`ParseResult`] lives in the caller-supplied output
//! arena: source copy, tokens, production stream, nodes and errors. The
//! result is therefore a plain bundle of non-owning views, valid for the
//! arena's lifetime.

use kiln_core::CheckedArray;

use crate::lexer::token_text;
use crate::node::{Node, NodeId};
use crate::tokens::Token;

/// One reported error with its token and byte ranges.
#[derive(Clone, Copy, Debug)]
pub struct ParseError<'a> {
    pub message: &'a str,
    /// Error node index, or invalid for errors recorded before parsing
    /// (unmatched delimiters, bad characters, token overflow).
    pub node: NodeId,
    pub token_start: u32,
    pub token_end: u32,
    pub source_start: u32,
    pub source_end: u32,
}

/// 1-based line/column position.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LineColumn {
    pub line: u32,
    pub column: u32,
}

pub struct ParseResult<'a> {
    pub src: &'a str,
    pub tokens: CheckedArray<'a, Token>,
    pub production: CheckedArray<'a, i32>,
    pub nodes: CheckedArray<'a, Node>,
    pub errors: CheckedArray<'a, ParseError<'a>>,
    pub has_too_many_tokens: bool,
    pub has_bad_characters: bool,
    pub has_unmatched_delimiters: bool,
    pub has_non_trivial_content: bool,
}

impl<'a> ParseResult<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        src: &'a str,
        tokens: &'a [Token],
        production: &'a [i32],
        nodes: &'a [Node],
        errors: &'a [ParseError<'a>],
        has_too_many_tokens: bool,
        has_bad_characters: bool,
        has_unmatched_delimiters: bool,
        has_non_trivial_content: bool,
    ) -> ParseResult<'a> {
        ParseResult {
            src,
            tokens: CheckedArray::new(tokens),
            production: CheckedArray::new(production),
            nodes: CheckedArray::new(nodes),
            errors: CheckedArray::new(errors),
            has_too_many_tokens,
            has_bad_characters,
            has_unmatched_delimiters,
            has_non_trivial_content,
        }
    }

    pub fn src_len(&self) -> usize {
        self.src.len()
    }

    /// True when the parse produced no errors at all.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// The file root node (always slot 1).
    pub fn root(&self) -> &'a Node {
        self.nodes.get(NodeId::ROOT.index())
    }

    pub fn node(&self, id: NodeId) -> &'a Node {
        self.nodes.get(id.index())
    }

    /// Text of the token at `index`.
    pub fn token_text(&self, index: usize) -> &'a str {
        token_text(self.src, self.tokens.as_slice(), index)
    }

    /// Source text covered by a node's token range.
    pub fn node_text(&self, id: NodeId) -> &'a str {
        let node = self.node(id);
        let start = self.tokens.get(node.token_start as usize).position as usize;
        let end = if (node.token_end as usize) < self.tokens.len() {
            self.tokens.get(node.token_end as usize).position as usize
        } else {
            self.src.len()
        };
        &self.src[start..end]
    }

    /// Line/column of a byte offset, counting `\n` and `\r\n` terminators.
    pub fn line_column(&self, byte_offset: usize) -> LineColumn {
        let offset = byte_offset.min(self.src.len());
        let mut line = 1u32;
        let mut line_start = 0usize;
        for (index, byte) in self.src.as_bytes()[..offset].iter().enumerate() {
            if *byte == b'\n' {
                line += 1;
                line_start = index + 1;
            }
        }
        LineColumn {
            line,
            column: (offset - line_start) as u32 + 1,
        }
    }

    pub fn line_column_of_token(&self, index: usize) -> LineColumn {
        self.line_column(self.tokens.get(index).position as usize)
    }

    pub fn line_column_of_node(&self, id: NodeId) -> LineColumn {
        self.line_column_of_token(self.node(id).token_start as usize)
    }

    /// Writes every error as `<message> (<line>:<column>)`.
    pub fn write_errors(&self, out: &mut impl std::fmt::Write) -> std::fmt::Result {
        for error in self.errors.iter() {
            let position = self.line_column(error.source_start as usize);
            writeln!(out, "{} ({}:{})", error.message, position.line, position.column)?;
        }
        Ok(())
    }

    pub fn errors_to_string(&self) -> String {
        let mut out = String::new();
        self.write_errors(&mut out).expect("String write never fails");
        out
    }
}
