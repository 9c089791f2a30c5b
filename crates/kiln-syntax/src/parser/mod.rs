//! Recursive-descent parser.
//!
//! Every production follows the same contract: `None` means nothing was
//! consumed and no node was emitted; `Some(node)` with `*recover == false`
//! means a well-formed subtree; `Some(node)` with `*recover == true` means
//! a partial subtree containing at least one error node, with the cursor at
//! an indeterminate position. Callers either recover locally by advancing
//! to an anchor token, or propagate.
//!
//! Delimiter-bounded constructs always parse inside a sub-stream acquired
//! from the pre-matched pair, so a production can never run past its
//! closing delimiter.

mod declarations;
mod expressions;
mod statements;
#[cfg(test)]
mod tests;
mod types;

use kiln_core::LinearArena;

use crate::builder::PsiBuilder;
use crate::keywords::Keyword;
use crate::node::{NodeData, NodeId};
use crate::result::ParseResult;
use crate::tokens::{Token, TokenKind};
use crate::Error;

pub struct Parser<'s> {
    pub(crate) b: PsiBuilder<'s>,
}

impl<'s> Parser<'s> {
    pub fn new(src: &'s str) -> Parser<'s> {
        Parser {
            b: PsiBuilder::new(src),
        }
    }

    /// Parses the whole file and finalizes into `output`.
    pub fn parse_file<'out>(mut self, output: &'out LinearArena) -> Result<ParseResult<'out>, Error> {
        if !self.b.is_valid() || !self.b.has_non_trivial_content() {
            return self.b.finalize(output);
        }

        let mut tail = NodeId::INVALID;

        while !self.b.end_of_input() {
            let token_index = self.b.token_index();

            if self.b.token_kind() == TokenKind::EndOfInput {
                self.b.advance();
                break;
            }

            if self.b.token_kind() == TokenKind::SemiColon {
                self.b.advance();
                continue;
            }

            let mut recover = false;
            let declaration = if let Some(using) = self.try_parse_using_declaration(&mut recover) {
                Some(using)
            } else if let Some(ns) = self.try_parse_namespace_declaration(&mut recover) {
                Some(ns)
            } else {
                self.try_parse_type_declaration(&mut recover)
            };

            let Some(declaration) = declaration else {
                if token_index == self.b.token_index() {
                    // Nothing matched and nothing moved. Force progress:
                    // swallow the run of unparseable tokens up to the next
                    // plausible declaration start under one error node.
                    let error = self.b.mark();
                    self.b.advance();
                    while !self.b.end_of_input()
                        && self.b.token_kind() != TokenKind::EndOfInput
                        && !is_top_level_recovery_token(self.b.token())
                    {
                        self.b.advance();
                    }
                    self.b.error(error, "parser stuck");
                }
                continue;
            };

            if self.b.file_first_declaration().is_valid() {
                self.b.set_next(tail, declaration);
            } else {
                self.b.set_file_first_declaration(declaration);
            }
            tail = declaration;

            if recover {
                // The failed production may have left sub-streams open;
                // reset to the full file window and skip to something that
                // can start a top-level declaration.
                self.b.clear_streams();
                while !self.b.end_of_input() && !is_top_level_recovery_token(self.b.token()) {
                    self.b.advance();
                }
            }
        }

        self.b.finalize(output)
    }

    // ----- shared helpers -----

    pub(crate) fn expect_semicolon(&mut self) -> bool {
        if self.b.token_kind() == TokenKind::SemiColon {
            self.b.advance();
            true
        } else {
            self.b.inline_error("Expected ';'");
            false
        }
    }

    pub(crate) fn at_keyword(&self, keyword: Keyword) -> bool {
        self.b.keyword() == Some(keyword)
    }

    /// Skips to the next comma or the end of the current sub-stream,
    /// wrapping the skipped region in an error node.
    pub(crate) fn recover_to_comma_or_end(&mut self, message: &str) -> bool {
        let marker = self.b.mark();
        while !self.b.end_of_input() {
            if self.b.token_kind() == TokenKind::Comma {
                self.b.error(marker, message);
                return true;
            }
            self.b.advance();
        }
        self.b.error(marker, message);
        false
    }

    pub(crate) fn recover_to_colon_comma_or_end(&mut self, message: &str) -> bool {
        let marker = self.b.mark();
        while !self.b.end_of_input() {
            let kind = self.b.token_kind();
            if kind == TokenKind::Colon || kind == TokenKind::Comma {
                self.b.error(marker, message);
                return true;
            }
            self.b.advance();
        }
        self.b.error(marker, message);
        false
    }

    /// Skips forward to a `{`, restoring the cursor when none exists.
    pub(crate) fn advance_to_curly_open(&mut self) -> bool {
        let start = self.b.token_index();
        while !self.b.end_of_input() {
            if self.b.token_kind() == TokenKind::CurlyBraceOpen {
                return true;
            }
            self.b.advance();
        }
        self.b.set_token_index(start);
        false
    }

    pub(crate) fn advance_to_comma_or_curly_open(&mut self) {
        while !self.b.end_of_input() {
            let kind = self.b.token_kind();
            if kind == TokenKind::Comma || kind == TokenKind::CurlyBraceOpen {
                break;
            }
            self.b.advance();
        }
    }

    /// Parses a comma-separated list inside the current sub-stream and
    /// returns the head of the sibling chain. Skipped prefixes and failed
    /// elements recover to the next comma.
    pub(crate) fn parse_comma_separated(
        &mut self,
        allow_trailing_comma: bool,
        mut element: impl FnMut(&mut Self) -> Option<NodeId>,
    ) -> NodeId {
        let mut first = NodeId::INVALID;

        while !self.b.end_of_input() {
            let before = self.b.token_index();
            if let Some(node) = element(self) {
                first = node;
                break;
            }
            if self.b.token_index() == before {
                let marker = self.b.mark();
                self.b.advance();
                self.b.error(marker, "unexpected token");
            }
        }

        let mut tail = first;
        while !self.b.end_of_input() {
            if self.b.token_kind() == TokenKind::Comma {
                self.b.advance();

                if self.b.end_of_input() {
                    if !allow_trailing_comma {
                        self.b.inline_error("Trailing comma is not allowed here");
                    }
                    break;
                }

                if let Some(next) = element(self) {
                    if tail.is_valid() {
                        self.b.set_next(tail, next);
                    } else {
                        first = next;
                    }
                    tail = next;
                    continue;
                }

                self.recover_to_comma_or_end("unexpected token");
            } else {
                self.recover_to_comma_or_end("expected a comma");
            }
        }

        first
    }

    /// Chain-link helper for hand-rolled list loops.
    pub(crate) fn link(&mut self, first: &mut NodeId, tail: &mut NodeId, next: NodeId) {
        if tail.is_valid() {
            self.b.set_next(*tail, next);
        } else {
            *first = next;
        }
        *tail = next;
    }
}

pub(crate) fn is_top_level_recovery_token(token: Token) -> bool {
    match token.kind {
        TokenKind::SemiColon => true,
        TokenKind::KeywordOrIdentifier => matches!(
            token.keyword,
            Some(
                Keyword::Static
                    | Keyword::Public
                    | Keyword::Export
                    | Keyword::Protected
                    | Keyword::Virtual
                    | Keyword::Abstract
                    | Keyword::Sealed
                    | Keyword::Internal
                    | Keyword::Interface
                    | Keyword::Enum
                    | Keyword::Using
                    | Keyword::Class
                    | Keyword::Struct
                    | Keyword::Delegate
                    | Keyword::Const
                    | Keyword::Extern
                    | Keyword::Namespace
            )
        ),
        _ => false,
    }
}

pub(crate) fn is_embedded_statement_keyword(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::While
            | Keyword::Do
            | Keyword::For
            | Keyword::Foreach
            | Keyword::Switch
            | Keyword::Try
            | Keyword::Break
            | Keyword::Continue
            | Keyword::Return
            | Keyword::Throw
            | Keyword::With
            | Keyword::Using
            | Keyword::If
    )
}

/// Shorthand used by declaration dispatch when the collected tokens cannot
/// form a declaration: an error node at the cursor wrapped in an
/// error-declaration completing `marker`.
impl Parser<'_> {
    pub(crate) fn error_declaration(&mut self, marker: crate::builder::Marker, message: &str) -> NodeId {
        self.b.inline_error(message);
        self.b.done(marker, NodeData::ErrorDeclaration)
    }
}
