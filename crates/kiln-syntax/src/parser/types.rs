//! Identifiers, type paths, generic argument/parameter lists, array ranks
//! and namespace paths.

use crate::node::{NodeData, NodeId};
use crate::parser::Parser;
use crate::tokens::{Token, TokenKind};

impl Parser<'_> {
    /// `identifier` — a `KeywordOrIdentifier` token. Reserved keywords are
    /// accepted with an error when `warn_about_keywords` is set.
    pub(crate) fn try_parse_identifier(&mut self, warn_about_keywords: bool) -> Option<NodeId> {
        if self.b.token_kind() != TokenKind::KeywordOrIdentifier {
            return None;
        }
        let marker = self.b.mark();
        let keyword = self.b.keyword();
        self.b.advance();

        if warn_about_keywords && let Some(keyword) = keyword {
            let message =
                format!("reserved keyword `{keyword}` cannot be used as an identifier");
            self.b.inline_error(&message);
        }

        Some(self.b.done(
            marker,
            NodeData::Identifier {
                type_arguments: NodeId::INVALID,
            },
        ))
    }

    /// Like `try_parse_identifier`, but built-in type keywords are fine.
    pub(crate) fn try_parse_identifier_or_builtin(&mut self) -> Option<NodeId> {
        if self.b.token_kind() != TokenKind::KeywordOrIdentifier {
            return None;
        }
        let marker = self.b.mark();
        let keyword = self.b.keyword();
        self.b.advance();

        if let Some(keyword) = keyword
            && !keyword.is_builtin_type()
        {
            let message =
                format!("reserved keyword `{keyword}` cannot be used as an identifier");
            self.b.inline_error(&message);
        }

        Some(self.b.done(
            marker,
            NodeData::Identifier {
                type_arguments: NodeId::INVALID,
            },
        ))
    }

    /// `identifier type_argument_list?`
    pub(crate) fn try_parse_identifier_with_type_args(
        &mut self,
        recover: &mut bool,
        type_args_required: bool,
    ) -> Option<NodeId> {
        if self.b.token_kind() != TokenKind::KeywordOrIdentifier {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let type_arguments = self
            .try_parse_type_argument_list(recover, type_args_required)
            .unwrap_or(NodeId::INVALID);

        Some(self.b.done(marker, NodeData::Identifier { type_arguments }))
    }

    /// `type_path ::= identifier ('::' identifier)* type_argument_list? '?'? array_rank?`
    pub(crate) fn try_parse_type_path(&mut self, recover: &mut bool) -> Option<NodeId> {
        if self.b.token_kind() != TokenKind::KeywordOrIdentifier {
            return None;
        }

        let marker = self.b.mark();

        let builtin = self.b.keyword().filter(|keyword| keyword.is_builtin_type());

        let Some(first_identifier) = self.try_parse_identifier_or_builtin() else {
            self.b.rollback(marker);
            return None;
        };

        let mut tail = first_identifier;
        while self.b.token_kind() == TokenKind::DoubleColon {
            self.b.advance();

            let Some(next) = self.try_parse_identifier(true) else {
                self.b.inline_error("expected an identifier after ::");
                *recover = true;
                break;
            };
            self.b.set_next(tail, next);
            tail = next;

            if *recover {
                break;
            }
        }

        let type_arguments = self
            .try_parse_type_argument_list(recover, true)
            .unwrap_or(NodeId::INVALID);

        let mut nullable = false;
        if self.b.token_kind() == TokenKind::QuestionMark {
            nullable = true;
            self.b.advance();
        }

        let array_rank = self.try_parse_array_rank().unwrap_or(NodeId::INVALID);

        Some(self.b.done(
            marker,
            NodeData::TypePath {
                first_identifier,
                builtin,
                type_arguments,
                array_rank,
                nullable,
            },
        ))
    }

    /// `array_rank ::= '[' ']' '?'?` — rank content is rejected, there are
    /// no multi-dimensional arrays.
    pub(crate) fn try_parse_array_rank(&mut self) -> Option<NodeId> {
        let stream = self.b.try_sub_stream(TokenKind::SquareBraceOpen)?;
        let marker = self.b.mark();
        self.b.push_stream(stream);

        if !self.b.end_of_input() {
            let error = self.b.mark();
            self.b.advance_to_stream_end();
            self.b.error(
                error,
                "array rank must be empty, multi-dimensional arrays are not supported",
            );
        }

        self.b.pop_stream();

        let mut nullable = false;
        if self.b.token_kind() == TokenKind::QuestionMark {
            nullable = true;
            self.b.advance();
        }

        Some(self.b.done(marker, NodeData::ArrayRank { nullable }))
    }

    /// `type_parameter_list ::= '<' identifier (',' identifier)* '>'`
    pub(crate) fn try_parse_type_parameter_list(&mut self) -> Option<NodeId> {
        if self.b.token_kind() != TokenKind::AngleBracketOpen {
            return None;
        }

        let marker = self.b.mark();

        let Some(stream) =
            self.b
                .try_scan_sub_stream(TokenKind::AngleBracketOpen, TokenKind::AngleBracketClose)
        else {
            // The `<` is never closed; eat what looks like parameters so
            // the caller can continue behind the list.
            self.b.advance();
            let first_parameter = self.try_parse_identifier(true).unwrap_or(NodeId::INVALID);

            let error = self.b.mark();
            while !self.b.end_of_input() {
                let kind = self.b.token_kind();
                let plain_identifier =
                    kind == TokenKind::KeywordOrIdentifier && self.b.keyword().is_none();
                if kind != TokenKind::Comma && !plain_identifier {
                    break;
                }
                self.b.advance();
            }
            self.b.error(error, "opening < isn't matched by >");

            return Some(
                self.b
                    .done(marker, NodeData::TypeParameterList { first_parameter }),
            );
        };

        self.b.push_stream(stream);

        let Some(first_parameter) = self.try_parse_identifier(true) else {
            self.b.pop_stream();
            return Some(self.b.done(
                marker,
                NodeData::TypeParameterList {
                    first_parameter: NodeId::INVALID,
                },
            ));
        };

        let mut tail = first_parameter;
        while !self.b.end_of_input() {
            if self.b.token_kind() != TokenKind::Comma {
                let error = self.b.mark();
                self.b.advance_to_stream_end();
                self.b.error(error, "expected a comma or > after type parameter");
                break;
            }
            self.b.advance();

            if let Some(next) = self.try_parse_identifier(true) {
                self.b.set_next(tail, next);
                tail = next;
            } else {
                let error = self.b.mark();
                self.b.advance_to_stream_end();
                self.b.error(error, "expected an identifier following comma");
                break;
            }
        }

        self.b.pop_stream();

        Some(
            self.b
                .done(marker, NodeData::TypeParameterList { first_parameter }),
        )
    }

    /// `type_argument_list ::= '<' type_path (',' type_path)* '>'`
    ///
    /// Without a matching `>` the construct is either reported (when
    /// `must_be_valid`, e.g. inside a type path) or rolled back so the `<`
    /// can be re-read as a comparison.
    pub(crate) fn try_parse_type_argument_list(
        &mut self,
        recover: &mut bool,
        must_be_valid: bool,
    ) -> Option<NodeId> {
        if self.b.token_kind() != TokenKind::AngleBracketOpen {
            return None;
        }

        let marker = self.b.mark();

        let Some(stream) =
            self.b
                .try_scan_sub_stream(TokenKind::AngleBracketOpen, TokenKind::AngleBracketClose)
        else {
            if !must_be_valid {
                self.b.rollback(marker);
                return None;
            }

            self.b.advance();
            let error = self.b.mark();

            // Consume what still looks like a type path so the parse can
            // continue past the malformed list.
            while !self.b.end_of_input() {
                self.b.advance();
                if !is_type_path_token(self.b.token()) || self.b.end_of_input() {
                    break;
                }
            }
            self.b.error(error, "opening < isn't matched by >");
            *recover = true;

            return Some(self.b.done(
                marker,
                NodeData::TypeArgumentList {
                    first_argument: NodeId::INVALID,
                },
            ));
        };

        self.b.push_stream(stream);

        let first_argument = match self.try_parse_type_path(recover) {
            Some(first) if !*recover => first,
            Some(first) => {
                self.b.pop_stream();
                return Some(
                    self.b
                        .done(marker, NodeData::TypeArgumentList { first_argument: first }),
                );
            }
            None => {
                self.b.inline_error("expected a type path inside < >");
                self.b.advance_to_stream_end();
                self.b.pop_stream();
                return Some(self.b.done(
                    marker,
                    NodeData::TypeArgumentList {
                        first_argument: NodeId::INVALID,
                    },
                ));
            }
        };

        let mut tail = first_argument;
        while !self.b.end_of_input() {
            if self.b.token_kind() == TokenKind::Comma {
                self.b.advance();
            } else {
                let error = self.b.mark();
                self.b.advance_to_stream_end();
                self.b.error(error, "expected a comma or > after type argument");
                break;
            }

            match self.try_parse_type_path(recover) {
                Some(next) => {
                    self.b.set_next(tail, next);
                    tail = next;
                    if *recover {
                        break;
                    }
                }
                None => {
                    let error = self.b.mark();
                    self.b.advance_to_stream_end();
                    self.b.error(error, "expected a type path to follow comma");
                    break;
                }
            }
        }

        self.b.pop_stream();

        Some(
            self.b
                .done(marker, NodeData::TypeArgumentList { first_argument }),
        )
    }

    /// `namespace_path ::= identifier ('::' identifier)*` with no trivia
    /// allowed around the `::`.
    pub(crate) fn try_parse_namespace_path(&mut self, recover: &mut bool) -> Option<NodeId> {
        if self.b.token_kind() != TokenKind::KeywordOrIdentifier {
            return None;
        }

        let marker = self.b.mark();

        let first_identifier = self.try_parse_identifier(true)?;
        let mut tail = first_identifier;

        while self.b.token_kind() == TokenKind::DoubleColon {
            if self
                .b
                .token()
                .flags
                .contains(crate::tokens::TokenFlags::FOLLOWED_BY_TRIVIA)
            {
                break;
            }
            self.b.advance();

            if let Some(next) = self.try_parse_identifier(true) {
                self.b.set_next(tail, next);
                tail = next;
            } else {
                self.b.inline_error("expected an identifier after ::");
                *recover = true;
                break;
            }
        }

        Some(self.b.done(marker, NodeData::NamespacePath { first_identifier }))
    }
}

pub(crate) fn is_type_path_token(token: Token) -> bool {
    match token.kind {
        TokenKind::AngleBracketOpen
        | TokenKind::AngleBracketClose
        | TokenKind::Comma
        | TokenKind::DoubleColon => true,
        TokenKind::KeywordOrIdentifier => match token.keyword {
            Some(keyword) => keyword.is_builtin_type(),
            None => true,
        },
        _ => false,
    }
}
