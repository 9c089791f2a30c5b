//! Kiln syntax: tokenizer, parser and syntax trees.
//!
//! The pipeline for one file:
//! - [`lexer`] turns UTF-8 source into a flat token stream, trivia
//!   included, driven by a bounded string/interpolation state stack
//! - [`builder`] projects away trivia, pre-matches delimiter pairs and
//!   records the parse as a production stream over indexed nodes
//! - [`parser`] drives the builder with a resilient recursive-descent
//!   grammar; syntax errors become in-band error nodes, never `Err`
//! - [`tree`] reconstructs abstract and lossless concrete views from the
//!   production stream
//!
//! Everything a parse produces lives in a caller-supplied output arena;
//! see [`parse`].

pub mod builder;
pub mod diagnostics;
pub mod keywords;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod result;
pub mod tokens;
pub mod tree;

#[cfg(test)]
mod builder_tests;
#[cfg(test)]
mod keywords_tests;
#[cfg(test)]
mod lexer_tests;
#[cfg(test)]
pub(crate) mod test_utils;

use kiln_core::LinearArena;

pub use builder::{Marker, PsiBuilder, SubStream, MAX_TOKENS};
pub use keywords::Keyword;
pub use node::{Node, NodeData, NodeId};
pub use parser::Parser;
pub use result::{LineColumn, ParseError, ParseResult};
pub use tokens::{Token, TokenFlags, TokenKind};
pub use tree::SyntaxTree;

/// Fatal, non-syntax failures. Syntax problems never surface here; they
/// are error nodes inside the [`ParseResult`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The caller-supplied output arena ran out of reservation while the
    /// parse outputs were being copied out.
    #[error("parse output arena exhausted")]
    OutputArenaExhausted,
}

/// Parses `src`, allocating every output (tokens, production, nodes,
/// errors, source copy) from `output`.
pub fn parse<'out>(src: &str, output: &'out LinearArena) -> Result<ParseResult<'out>, Error> {
    Parser::new(src).parse_file(output)
}
