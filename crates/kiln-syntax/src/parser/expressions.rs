//! Expressions: the precedence ladder, primaries and literals.
//!
//! Binary levels are left-associative loops that wrap the accumulated left
//! side via `precede`, so `a + b + c` nests as `((a + b) + c)` without any
//! lookahead. Shift operators do not exist in the token stream; they are
//! recognized here as two adjacent angle brackets with no trivia between
//! them, which keeps `List<List<int>>` unambiguous.

use crate::keywords::Keyword;
use crate::node::{
    AllocatorKind, AssignOp, BinaryOp, LiteralKind, MemberAccessKind, NodeData, NodeId, PassBy,
    StorageClass, StringPartKind, UnaryOp,
};
use crate::parser::Parser;
use crate::tokens::{TokenFlags, TokenKind};

struct RhsRule {
    token: TokenKind,
    op: BinaryOp,
    failure: &'static str,
}

type LevelFn = fn(&mut Parser<'_>, &mut bool) -> Option<NodeId>;

impl Parser<'_> {
    /// `expression ::= 'ref'? non_assignment_expression assignment_tail?`
    pub(crate) fn try_parse_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        if self.at_keyword(Keyword::Ref) {
            let marker = self.b.mark();
            self.b.advance();

            let expression = match self.try_parse_non_assignment_expression(recover) {
                Some(expression) => expression,
                None => {
                    self.b.inline_error("expected an expression after 'ref'");
                    *recover = true;
                    NodeId::INVALID
                }
            };

            return Some(self.b.done(marker, NodeData::RefExpression { expression }));
        }

        let lhs = self.try_parse_non_assignment_expression(recover)?;

        if let Some(assignment) = self.try_parse_assignment_expression(lhs, recover) {
            return Some(assignment);
        }

        Some(lhs)
    }

    /// `'throw' expression | expression` — throw is allowed where ternary
    /// branches, lambda bodies and switch arms expect a value.
    pub(crate) fn try_parse_throwable_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Throw) {
            return self.try_parse_expression(recover);
        }

        let marker = self.b.mark();
        self.b.advance();

        let expression = match self.try_parse_non_assignment_expression(recover) {
            Some(expression) => expression,
            None => {
                self.b.inline_error("expected an expression after throw");
                *recover = true;
                NodeId::INVALID
            }
        };

        Some(self.b.done(marker, NodeData::ThrowExpression { expression }))
    }

    pub(crate) fn try_parse_non_assignment_expression(
        &mut self,
        recover: &mut bool,
    ) -> Option<NodeId> {
        if let Some(lambda) = self.try_parse_lambda_expression(recover) {
            return Some(lambda);
        }
        self.try_parse_ternary_expression(recover)
    }

    fn assignment_op(&self) -> Option<AssignOp> {
        let op = match self.b.token_kind() {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::AddAssign => AssignOp::Add,
            TokenKind::SubtractAssign => AssignOp::Subtract,
            TokenKind::MultiplyAssign => AssignOp::Multiply,
            TokenKind::DivideAssign => AssignOp::Divide,
            TokenKind::ModAssign => AssignOp::Modulus,
            TokenKind::AndAssign => AssignOp::And,
            TokenKind::OrAssign => AssignOp::Or,
            TokenKind::XorAssign => AssignOp::Xor,
            TokenKind::LeftShiftAssign => AssignOp::ShiftLeft,
            TokenKind::RightShiftAssign => AssignOp::ShiftRight,
            TokenKind::CoalesceAssign => AssignOp::Coalesce,
            _ => return None,
        };
        Some(op)
    }

    /// Wraps an already-parsed left side into an assignment when an
    /// assignment operator follows.
    fn try_parse_assignment_expression(
        &mut self,
        lhs: NodeId,
        recover: &mut bool,
    ) -> Option<NodeId> {
        let op = self.assignment_op()?;
        self.b.advance();

        let marker = self.b.precede(lhs);

        let rhs = if op == AssignOp::Coalesce {
            self.try_parse_throwable_expression(recover)
        } else {
            self.try_parse_expression(recover)
        };

        let rhs = match rhs {
            Some(rhs) => rhs,
            None => {
                self.b.inline_error("expected an expression after assignment operator");
                *recover = true;
                NodeId::INVALID
            }
        };

        Some(self.b.done(marker, NodeData::AssignmentExpression { op, lhs, rhs }))
    }

    /// `ternary ::= null_coalescing ('?' throwable ':' throwable)?`
    fn try_parse_ternary_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let condition = self.try_parse_null_coalescing_expression(recover)?;

        if self.b.token_kind() != TokenKind::QuestionMark {
            return Some(condition);
        }

        let marker = self.b.precede(condition);
        self.b.advance();

        let Some(true_value) = self.try_parse_throwable_expression(recover) else {
            *recover = true;
            self.b.inline_error("expected an expression after '?' in a ternary expression");
            return Some(self.b.done(
                marker,
                NodeData::TernaryExpression {
                    condition,
                    true_value: NodeId::INVALID,
                    false_value: NodeId::INVALID,
                },
            ));
        };

        if *recover || self.b.token_kind() != TokenKind::Colon {
            if !*recover {
                self.b.inline_error("expected a ':' as part of a ternary expression");
                *recover = true;
            }
            return Some(self.b.done(
                marker,
                NodeData::TernaryExpression {
                    condition,
                    true_value,
                    false_value: NodeId::INVALID,
                },
            ));
        }

        self.b.advance();

        let false_value = match self.try_parse_throwable_expression(recover) {
            Some(value) if !*recover => value,
            Some(_) | None => {
                if !*recover {
                    self.b
                        .inline_error("expected an expression after ':' in a ternary expression");
                    *recover = true;
                }
                NodeId::INVALID
            }
        };

        Some(self.b.done(
            marker,
            NodeData::TernaryExpression {
                condition,
                true_value,
                false_value,
            },
        ))
    }

    /// Shared left-associative loop: `lhs (op next_level)*` wrapping via
    /// precede after each right side.
    fn parse_binary_rhs(
        &mut self,
        lhs: &mut NodeId,
        recover: &mut bool,
        rules: &[RhsRule],
        next_level: LevelFn,
    ) {
        loop {
            let kind = self.b.token_kind();
            let Some(rule) = rules.iter().find(|rule| rule.token == kind) else {
                return;
            };

            self.b.advance();

            match next_level(self, recover) {
                None => {
                    *recover = true;
                    self.b.inline_error(rule.failure);
                    let marker = self.b.precede(*lhs);
                    *lhs = self.b.done(
                        marker,
                        NodeData::BinaryExpression {
                            op: rule.op,
                            lhs: *lhs,
                            rhs: NodeId::INVALID,
                        },
                    );
                    return;
                }
                Some(rhs) => {
                    let marker = self.b.precede(*lhs);
                    *lhs = self.b.done(
                        marker,
                        NodeData::BinaryExpression {
                            op: rule.op,
                            lhs: *lhs,
                            rhs,
                        },
                    );
                    if *recover {
                        return;
                    }
                }
            }
        }
    }

    fn try_parse_null_coalescing_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let mut lhs = self.try_parse_conditional_or_expression(recover)?;
        self.parse_binary_rhs(
            &mut lhs,
            recover,
            &[RhsRule {
                token: TokenKind::Coalesce,
                op: BinaryOp::Coalesce,
                failure: "expected an expression following ?? operator",
            }],
            // `a ?? throw x` is the fallback-or-fail idiom.
            |parser, recover| {
                if parser.at_keyword(Keyword::Throw) {
                    parser.try_parse_throwable_expression(recover)
                } else {
                    parser.try_parse_conditional_or_expression(recover)
                }
            },
        );
        Some(lhs)
    }

    fn try_parse_conditional_or_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let mut lhs = self.try_parse_conditional_and_expression(recover)?;
        self.parse_binary_rhs(
            &mut lhs,
            recover,
            &[RhsRule {
                token: TokenKind::ConditionalOr,
                op: BinaryOp::ConditionalOr,
                failure: "expected an expression following || operator",
            }],
            |parser, recover| parser.try_parse_conditional_and_expression(recover),
        );
        Some(lhs)
    }

    fn try_parse_conditional_and_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let mut lhs = self.try_parse_bitwise_or_expression(recover)?;
        self.parse_binary_rhs(
            &mut lhs,
            recover,
            &[RhsRule {
                token: TokenKind::ConditionalAnd,
                op: BinaryOp::ConditionalAnd,
                failure: "expected an expression following && operator",
            }],
            |parser, recover| parser.try_parse_bitwise_or_expression(recover),
        );
        Some(lhs)
    }

    fn try_parse_bitwise_or_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let mut lhs = self.try_parse_bitwise_xor_expression(recover)?;
        self.parse_binary_rhs(
            &mut lhs,
            recover,
            &[RhsRule {
                token: TokenKind::BinaryOr,
                op: BinaryOp::BitwiseOr,
                failure: "expected an expression following | operator",
            }],
            |parser, recover| parser.try_parse_bitwise_xor_expression(recover),
        );
        Some(lhs)
    }

    fn try_parse_bitwise_xor_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let mut lhs = self.try_parse_bitwise_and_expression(recover)?;
        self.parse_binary_rhs(
            &mut lhs,
            recover,
            &[RhsRule {
                token: TokenKind::BinaryXor,
                op: BinaryOp::BitwiseXor,
                failure: "expected an expression following ^ operator",
            }],
            |parser, recover| parser.try_parse_bitwise_and_expression(recover),
        );
        Some(lhs)
    }

    fn try_parse_bitwise_and_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let mut lhs = self.try_parse_equality_expression(recover)?;
        self.parse_binary_rhs(
            &mut lhs,
            recover,
            &[RhsRule {
                token: TokenKind::BinaryAnd,
                op: BinaryOp::BitwiseAnd,
                failure: "expected an expression following & operator",
            }],
            |parser, recover| parser.try_parse_equality_expression(recover),
        );
        Some(lhs)
    }

    fn try_parse_equality_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let mut lhs = self.try_parse_relational_expression(recover)?;
        self.parse_binary_rhs(
            &mut lhs,
            recover,
            &[
                RhsRule {
                    token: TokenKind::ConditionalEquals,
                    op: BinaryOp::Equal,
                    failure: "expected an expression following == operator",
                },
                RhsRule {
                    token: TokenKind::ConditionalNotEquals,
                    op: BinaryOp::NotEqual,
                    failure: "expected an expression following != operator",
                },
            ],
            |parser, recover| parser.try_parse_relational_expression(recover),
        );
        Some(lhs)
    }

    /// `relational ::= shift (('<' | '>' | '<=' | '>=') shift
    ///               | 'is' type_path identifier? | 'as' '!'? type_path)*`
    fn try_parse_relational_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let mut lhs = self.try_parse_shift_expression(recover)?;

        loop {
            if *recover {
                return Some(lhs);
            }

            match self.b.keyword() {
                Some(Keyword::Is) => {
                    let marker = self.b.precede(lhs);
                    self.b.advance();

                    let type_path = match self.try_parse_type_path(recover) {
                        Some(path) => path,
                        None => {
                            self.b
                                .inline_error("expected a type path as part of an `is` expression");
                            NodeId::INVALID
                        }
                    };

                    let mut identifier = NodeId::INVALID;
                    if !*recover && self.b.token_kind() == TokenKind::KeywordOrIdentifier {
                        identifier = self.try_parse_identifier(true).unwrap_or(NodeId::INVALID);
                    }

                    lhs = self.b.done(
                        marker,
                        NodeData::IsExpression {
                            type_path,
                            identifier,
                        },
                    );
                    continue;
                }
                Some(Keyword::As) => {
                    let marker = self.b.precede(lhs);
                    self.b.advance();

                    let mut panic_on_failure = false;
                    if self.b.token_kind() == TokenKind::Not {
                        self.b.advance();
                        panic_on_failure = true;
                    }

                    let type_path = match self.try_parse_type_path(recover) {
                        Some(path) => path,
                        None => {
                            self.b.inline_error("`as` expression requires a type to cast to");
                            NodeId::INVALID
                        }
                    };

                    lhs = self.b.done(
                        marker,
                        NodeData::AsExpression {
                            panic_on_failure,
                            type_path,
                        },
                    );
                    continue;
                }
                _ => {}
            }

            let (op, failure) = match self.b.token_kind() {
                // A lone `<` or `>` is relational only when it is not the
                // first half of a shift pair.
                TokenKind::AngleBracketOpen if !self.at_shift_pair(TokenKind::AngleBracketOpen) => {
                    (BinaryOp::LessThan, "expected an expression following < operator")
                }
                TokenKind::AngleBracketClose
                    if !self.at_shift_pair(TokenKind::AngleBracketClose) =>
                {
                    (BinaryOp::GreaterThan, "expected an expression following > operator")
                }
                TokenKind::LessThanEqualTo => {
                    (BinaryOp::LessThanEqual, "expected an expression following <= operator")
                }
                TokenKind::GreaterThanEqualTo => (
                    BinaryOp::GreaterThanEqual,
                    "expected an expression following >= operator",
                ),
                _ => return Some(lhs),
            };

            self.b.advance();

            match self.try_parse_shift_expression(recover) {
                None => {
                    *recover = true;
                    self.b.inline_error(failure);
                    let marker = self.b.precede(lhs);
                    lhs = self.b.done(
                        marker,
                        NodeData::BinaryExpression {
                            op,
                            lhs,
                            rhs: NodeId::INVALID,
                        },
                    );
                    return Some(lhs);
                }
                Some(rhs) => {
                    let marker = self.b.precede(lhs);
                    lhs = self.b.done(marker, NodeData::BinaryExpression { op, lhs, rhs });
                }
            }
        }
    }

    fn at_shift_pair(&self, bracket: TokenKind) -> bool {
        self.b.token_kind() == bracket
            && !self.b.token().flags.contains(TokenFlags::FOLLOWED_BY_TRIVIA)
            && self.b.peek(1).kind == bracket
    }

    /// `shift ::= additive (('<' '<' | '>' '>') additive)*` with the pair
    /// required to be trivia-free and adjacent.
    fn try_parse_shift_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let mut lhs = self.try_parse_additive_expression(recover)?;

        loop {
            let op = if self.at_shift_pair(TokenKind::AngleBracketOpen) {
                BinaryOp::ShiftLeft
            } else if self.at_shift_pair(TokenKind::AngleBracketClose) {
                BinaryOp::ShiftRight
            } else {
                return Some(lhs);
            };

            self.b.advance();
            self.b.advance();

            match self.try_parse_additive_expression(recover) {
                None => {
                    *recover = true;
                    self.b.inline_error("expected an expression following shift operator");
                    let marker = self.b.precede(lhs);
                    lhs = self.b.done(
                        marker,
                        NodeData::BinaryExpression {
                            op,
                            lhs,
                            rhs: NodeId::INVALID,
                        },
                    );
                    return Some(lhs);
                }
                Some(rhs) => {
                    let marker = self.b.precede(lhs);
                    lhs = self.b.done(marker, NodeData::BinaryExpression { op, lhs, rhs });
                    if *recover {
                        return Some(lhs);
                    }
                }
            }
        }
    }

    fn try_parse_additive_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let mut lhs = self.try_parse_multiplicative_expression(recover)?;
        self.parse_binary_rhs(
            &mut lhs,
            recover,
            &[
                RhsRule {
                    token: TokenKind::Plus,
                    op: BinaryOp::Add,
                    failure: "expected an expression following + operator",
                },
                RhsRule {
                    token: TokenKind::Minus,
                    op: BinaryOp::Subtract,
                    failure: "expected an expression following - operator",
                },
            ],
            |parser, recover| parser.try_parse_multiplicative_expression(recover),
        );
        Some(lhs)
    }

    fn try_parse_multiplicative_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let mut lhs = self.try_parse_switch_expression(recover)?;
        self.parse_binary_rhs(
            &mut lhs,
            recover,
            &[
                RhsRule {
                    token: TokenKind::Multiply,
                    op: BinaryOp::Multiply,
                    failure: "expected an expression following * operator",
                },
                RhsRule {
                    token: TokenKind::Divide,
                    op: BinaryOp::Divide,
                    failure: "expected an expression following / operator",
                },
                RhsRule {
                    token: TokenKind::Modulus,
                    op: BinaryOp::Modulus,
                    failure: "expected an expression following % operator",
                },
            ],
            |parser, recover| parser.try_parse_switch_expression(recover),
        );
        Some(lhs)
    }

    /// `switch_expression ::= unary ('switch' '{' arms ','? '}')?`
    fn try_parse_switch_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let value = self.try_parse_unary_expression(recover)?;

        if *recover || !self.at_keyword(Keyword::Switch) {
            return Some(value);
        }

        let marker = self.b.precede(value);
        self.b.advance();

        let mut first_arm = NodeId::INVALID;

        match self.b.try_sub_stream(TokenKind::CurlyBraceOpen) {
            Some(stream) => {
                self.b.push_stream(stream);
                if !self.b.end_of_input() {
                    first_arm = self.parse_comma_separated(true, |parser| {
                        let mut arm_recover = false;
                        parser.try_parse_switch_expression_arm(&mut arm_recover)
                    });
                }
                self.b.pop_stream();
            }
            None => {
                self.b
                    .inline_error("expected an opening curly brace after `switch` expression");
                *recover = true;
            }
        }

        Some(self.b.done(marker, NodeData::SwitchExpression { value, first_arm }))
    }

    /// `arm ::= non_assignment_expression ('when' expression)? '=>' throwable`
    fn try_parse_switch_expression_arm(&mut self, recover: &mut bool) -> Option<NodeId> {
        let marker = self.b.mark();

        let mut guard = NodeId::INVALID;
        let mut action = NodeId::INVALID;

        let Some(condition) = self.try_parse_non_assignment_expression(recover) else {
            self.b.rollback(marker);
            return None;
        };

        if !*recover {
            if self.at_keyword(Keyword::When) {
                self.b.advance();
                match self.try_parse_expression(recover) {
                    Some(expression) => guard = expression,
                    None => {
                        self.b.inline_error(
                            "expected an expression following 'when' in a switch expression arm",
                        );
                        *recover = self.b.token_kind() != TokenKind::FatArrow;
                    }
                }
            }

            if !*recover {
                if self.b.token_kind() == TokenKind::FatArrow {
                    self.b.advance();
                    match self.try_parse_throwable_expression(recover) {
                        Some(expression) => action = expression,
                        None => {
                            self.b.inline_error("expected an expression following `=>` in a switch arm");
                        }
                    }
                } else {
                    self.b.inline_error("expected a `=>` following the switch arm pattern");
                }
            }
        }

        Some(self.b.done(
            marker,
            NodeData::SwitchExpressionArm {
                condition,
                guard,
                action,
            },
        ))
    }

    /// `unary ::= cast | primary | ('+'|'-'|'!'|'~'|'++'|'--') unary`
    fn try_parse_unary_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        if let Some(cast) = self.try_parse_cast_expression(recover) {
            return Some(cast);
        }
        if let Some(primary) = self.try_parse_primary_expression(recover) {
            return Some(primary);
        }

        let op = match self.b.token_kind() {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Minus,
            TokenKind::Not => UnaryOp::Not,
            TokenKind::BinaryNot => UnaryOp::BitwiseNot,
            TokenKind::Increment => UnaryOp::PreIncrement,
            TokenKind::Decrement => UnaryOp::PreDecrement,
            _ => return None,
        };

        let marker = self.b.mark();
        self.b.advance();

        let operand = match self.try_parse_unary_expression(recover) {
            Some(operand) => operand,
            None => {
                *recover = true;
                self.b.inline_error("expected an expression after unary operator");
                NodeId::INVALID
            }
        };

        Some(self.b.done(marker, NodeData::UnaryExpression { op, operand }))
    }

    /// `(type) unary` — committed only when the parenthesized content is a
    /// complete type path and the next token can begin a cast operand.
    fn try_parse_cast_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        if self.b.token_kind() != TokenKind::OpenParen {
            return None;
        }

        let marker = self.b.mark();
        let Some(stream) = self.b.try_sub_stream(TokenKind::OpenParen) else {
            self.b.drop_marker(marker);
            return None;
        };

        self.b.push_stream(stream);

        let mut probe = false;
        let type_path = self.try_parse_type_path(&mut probe);
        let is_type = type_path.is_some() && !probe && self.b.end_of_input();

        if !is_type {
            self.b.advance_to_stream_end();
            self.b.pop_stream();
            self.b.rollback(marker);
            return None;
        }

        self.b.pop_stream();

        if !self.at_cast_operand() {
            self.b.rollback(marker);
            return None;
        }

        let type_path = type_path.unwrap_or(NodeId::INVALID);

        let expression = match self.try_parse_unary_expression(recover) {
            Some(expression) => expression,
            None => {
                self.b.inline_error("expected an expression after cast");
                *recover = true;
                NodeId::INVALID
            }
        };

        Some(self.b.done(
            marker,
            NodeData::CastExpression {
                type_path,
                expression,
            },
        ))
    }

    fn at_cast_operand(&self) -> bool {
        match self.b.token_kind() {
            TokenKind::KeywordOrIdentifier => match self.b.keyword() {
                None => true,
                Some(keyword) => keyword.is_builtin_type() || keyword.starts_expression(),
            },
            TokenKind::Int32Literal
            | TokenKind::Int64Literal
            | TokenKind::UInt32Literal
            | TokenKind::UInt64Literal
            | TokenKind::FloatLiteral
            | TokenKind::DoubleLiteral
            | TokenKind::HexLiteral
            | TokenKind::BinaryNumberLiteral
            | TokenKind::StringStart
            | TokenKind::MultiLineStringStart
            | TokenKind::OpenCharacter
            | TokenKind::OpenStyle
            | TokenKind::OpenParen
            | TokenKind::Not
            | TokenKind::BinaryNot => true,
            _ => false,
        }
    }

    /// `lambda ::= '(' parameters? ')' '=>' (block | throwable)
    ///           | identifier '=>' throwable`
    fn try_parse_lambda_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        if self.b.token_kind() == TokenKind::OpenParen {
            let marker = self.b.mark();
            let Some(stream) = self.b.try_sub_stream(TokenKind::OpenParen) else {
                self.b.drop_marker(marker);
                return None;
            };

            self.b.push_stream(stream);

            let mut first_parameter = NodeId::INVALID;
            let mut tail = NodeId::INVALID;

            if !stream.is_empty() {
                while !self.b.end_of_input() {
                    let before = self.b.token_index();
                    if let Some(parameter) = self.try_parse_lambda_parameter() {
                        self.link(&mut first_parameter, &mut tail, parameter);
                        break;
                    }
                    if self.b.token_index() == before {
                        self.b.advance();
                    }
                }

                while !self.b.end_of_input() {
                    if self.b.token_kind() == TokenKind::Comma {
                        self.b.advance();
                        if self.b.end_of_input() {
                            self.b
                                .inline_error("trailing comma in lambda parameter list is not allowed");
                            break;
                        }
                        if let Some(parameter) = self.try_parse_lambda_parameter() {
                            self.link(&mut first_parameter, &mut tail, parameter);
                        }
                    } else {
                        self.recover_to_comma_or_end(
                            "expected a lambda parameter definition, you might be missing a comma",
                        );
                    }
                }
            }

            self.b.pop_stream();

            if self.b.token_kind() != TokenKind::FatArrow {
                // Not a lambda after all: rewind and let cast/paren
                // expression reinterpret the tokens.
                self.b.rollback(marker);
                return None;
            }
            self.b.advance();

            let mut block = NodeId::INVALID;
            let mut expression = NodeId::INVALID;
            if let Some(body) = self.try_parse_block() {
                block = body;
            } else if let Some(value) = self.try_parse_throwable_expression(recover) {
                expression = value;
            } else {
                self.b.inline_error("expected a lambda body after =>");
                *recover = true;
            }

            return Some(self.b.done(
                marker,
                NodeData::LambdaExpression {
                    first_parameter,
                    block,
                    expression,
                },
            ));
        }

        // `x => expr` — a single untyped parameter.
        if self.b.token_kind() == TokenKind::KeywordOrIdentifier
            && self.b.keyword().is_none()
            && self.b.peek(1).kind == TokenKind::FatArrow
        {
            let marker = self.b.mark();
            let parameter_marker = self.b.mark();

            let identifier = self.try_parse_identifier(true).unwrap_or(NodeId::INVALID);
            let parameter = self.b.done(
                parameter_marker,
                NodeData::LambdaParameter {
                    storage: StorageClass::Default,
                    pass_by: PassBy::Value,
                    type_path: NodeId::INVALID,
                    identifier,
                },
            );

            self.b.advance(); // =>

            let mut expression = NodeId::INVALID;
            match self.try_parse_throwable_expression(recover) {
                Some(value) => expression = value,
                None => {
                    self.b.inline_error("expected an expression after =>");
                    *recover = true;
                }
            }

            return Some(self.b.done(
                marker,
                NodeData::LambdaExpression {
                    first_parameter: parameter,
                    block: NodeId::INVALID,
                    expression,
                },
            ));
        }

        None
    }

    /// `lambda_parameter ::= ('temp' | 'scoped')? ('ref' | 'out')?
    ///     (type_path identifier | identifier)`
    fn try_parse_lambda_parameter(&mut self) -> Option<NodeId> {
        let marker = self.b.mark();

        let mut storage = StorageClass::Default;
        let mut pass_by = PassBy::Value;
        let start = self.b.token_index();

        match self.b.keyword() {
            Some(Keyword::Temp) => {
                storage = StorageClass::Temp;
                self.b.advance();
            }
            Some(Keyword::Scoped) => {
                storage = StorageClass::Scoped;
                self.b.advance();
            }
            _ => {}
        }

        match self.b.keyword() {
            Some(Keyword::Ref) => {
                pass_by = PassBy::Ref;
                self.b.advance();
            }
            Some(Keyword::Out) => {
                pass_by = PassBy::Out;
                self.b.advance();
            }
            _ => {}
        }

        if self.b.token_kind() != TokenKind::KeywordOrIdentifier {
            if start == self.b.token_index() {
                self.b.rollback(marker);
                return None;
            }
            self.recover_to_comma_or_end("expected a lambda parameter");
            return Some(self.b.done(
                marker,
                NodeData::LambdaParameter {
                    storage,
                    pass_by,
                    type_path: NodeId::INVALID,
                    identifier: NodeId::INVALID,
                },
            ));
        }

        // `float x` and `List<T> x` carry a type; a bare name does not.
        let typed = matches!(
            self.b.peek(1).kind,
            TokenKind::KeywordOrIdentifier
                | TokenKind::QuestionMark
                | TokenKind::SquareBraceOpen
                | TokenKind::DoubleColon
                | TokenKind::AngleBracketOpen
        );

        let mut type_path = NodeId::INVALID;
        let mut identifier = NodeId::INVALID;

        if typed {
            let mut type_recover = false;
            match self.try_parse_type_path(&mut type_recover) {
                Some(path) => type_path = path,
                None => {}
            }
            if type_recover {
                self.recover_to_comma_or_end("expected a lambda parameter");
            }
            match self.try_parse_identifier(true) {
                Some(name) => identifier = name,
                None => {
                    self.b.inline_error("expected a lambda parameter name");
                }
            }
        } else {
            identifier = self.try_parse_identifier(true).unwrap_or(NodeId::INVALID);
        }

        Some(self.b.done(
            marker,
            NodeData::LambdaParameter {
                storage,
                pass_by,
                type_path,
                identifier,
            },
        ))
    }

    // ----- primaries -----

    fn try_parse_primary_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        let start = self.try_parse_primary_start(recover)?;
        if *recover {
            return Some(start);
        }

        let mut result = start;

        if self.at_primary_tail() {
            let marker = self.b.precede(start);
            let mut first_tail = NodeId::INVALID;
            let mut tail = NodeId::INVALID;

            while !*recover && self.at_primary_tail() {
                let Some(next) = self.try_parse_primary_tail(recover) else {
                    break;
                };
                self.link(&mut first_tail, &mut tail, next);
            }

            result = self.b.done(
                marker,
                NodeData::PrimaryExpression {
                    start,
                    first_tail,
                },
            );
        }

        // Postfix increment/decrement binds tighter than any binary level.
        while matches!(self.b.token_kind(), TokenKind::Increment | TokenKind::Decrement) {
            let increment = self.b.token_kind() == TokenKind::Increment;
            let marker = self.b.precede(result);
            self.b.advance();
            result = self.b.done(
                marker,
                NodeData::PostfixExpression {
                    increment,
                    operand: result,
                },
            );
        }

        Some(result)
    }

    fn at_primary_tail(&self) -> bool {
        matches!(
            self.b.token_kind(),
            TokenKind::Dot
                | TokenKind::ConditionalAccess
                | TokenKind::DoubleColon
                | TokenKind::OpenParen
                | TokenKind::SquareBraceOpen
        )
    }

    fn try_parse_primary_tail(&mut self, recover: &mut bool) -> Option<NodeId> {
        let marker = self.b.mark();

        let part = match self.b.token_kind() {
            TokenKind::Dot | TokenKind::ConditionalAccess | TokenKind::DoubleColon => {
                let access = match self.b.token_kind() {
                    TokenKind::Dot => MemberAccessKind::Plain,
                    TokenKind::ConditionalAccess => MemberAccessKind::Conditional,
                    _ => MemberAccessKind::Scope,
                };
                let member_marker = self.b.mark();
                self.b.advance();

                let part = match self.try_parse_invocation_or_identifier(recover) {
                    Some(part) => part,
                    None => {
                        self.b.inline_error("expected a member name");
                        *recover = true;
                        NodeId::INVALID
                    }
                };
                self.b.done(member_marker, NodeData::MemberAccess { access, part })
            }
            TokenKind::OpenParen => match self.try_parse_argument_list() {
                Some(arguments) => arguments,
                None => {
                    self.b.drop_marker(marker);
                    return None;
                }
            },
            TokenKind::SquareBraceOpen => match self.try_parse_bracket_expression() {
                Some(bracket) => bracket,
                None => {
                    self.b.drop_marker(marker);
                    return None;
                }
            },
            _ => {
                self.b.drop_marker(marker);
                return None;
            }
        };

        Some(self.b.done(marker, NodeData::PrimaryExpressionTail { part }))
    }

    /// `'[' expression (',' expression)* ']'`
    fn try_parse_bracket_expression(&mut self) -> Option<NodeId> {
        let stream = self.b.try_sub_stream(TokenKind::SquareBraceOpen)?;
        let marker = self.b.mark();
        self.b.push_stream(stream);

        let first_expression = if stream.is_empty() {
            self.b.inline_error("expected an index expression");
            NodeId::INVALID
        } else {
            self.parse_comma_separated(false, |parser| {
                let mut element_recover = false;
                parser.try_parse_expression(&mut element_recover)
            })
        };

        self.b.pop_stream();
        Some(self.b.done(marker, NodeData::BracketExpression { first_expression }))
    }

    /// `'(' (argument (',' argument)*)? ')'`
    pub(crate) fn try_parse_argument_list(&mut self) -> Option<NodeId> {
        let stream = self.b.try_sub_stream(TokenKind::OpenParen)?;
        let marker = self.b.mark();
        self.b.push_stream(stream);

        let first_argument = if stream.is_empty() {
            NodeId::INVALID
        } else {
            self.parse_comma_separated(false, |parser| parser.try_parse_argument())
        };

        self.b.pop_stream();
        Some(self.b.done(marker, NodeData::ArgumentList { first_argument }))
    }

    /// `argument ::= ('ref' | 'out')? (('var' identifier) | (type_path identifier) | expression)`
    ///
    /// The two declaration forms are mutually exclusive: `out var x`
    /// declares with an inferred type, `out T x` declares with an explicit
    /// one, and anything else after the modifier is a plain expression.
    fn try_parse_argument(&mut self) -> Option<NodeId> {
        let marker = self.b.mark();

        let pass_by = match self.b.keyword() {
            Some(Keyword::Ref) => {
                self.b.advance();
                PassBy::Ref
            }
            Some(Keyword::Out) => {
                self.b.advance();
                PassBy::Out
            }
            _ => PassBy::Value,
        };

        if pass_by != PassBy::Value {
            if self.at_keyword(Keyword::Var) {
                self.b.advance();
                let identifier = match self.try_parse_identifier(true) {
                    Some(name) => name,
                    None => {
                        self.b.inline_error("expected a name for the declared argument");
                        NodeId::INVALID
                    }
                };
                return Some(self.b.done(
                    marker,
                    NodeData::Argument {
                        pass_by,
                        is_declaration: true,
                        is_var: true,
                        type_path: NodeId::INVALID,
                        identifier,
                        expression: NodeId::INVALID,
                    },
                ));
            }

            // Probe for `out T name`; when the probe fails the tokens are
            // re-read as an ordinary expression argument.
            let probe = self.b.mark();
            let mut probe_recover = false;
            if let Some(type_path) = self.try_parse_type_path(&mut probe_recover)
                && !probe_recover
                && self.b.token_kind() == TokenKind::KeywordOrIdentifier
            {
                let identifier = self.try_parse_identifier(true).unwrap_or(NodeId::INVALID);
                self.b.drop_marker(probe);
                return Some(self.b.done(
                    marker,
                    NodeData::Argument {
                        pass_by,
                        is_declaration: true,
                        is_var: false,
                        type_path,
                        identifier,
                        expression: NodeId::INVALID,
                    },
                ));
            }
            self.b.rollback(probe);
        }

        let mut recover = false;
        let Some(expression) = self.try_parse_expression(&mut recover) else {
            if pass_by != PassBy::Value {
                self.b.inline_error("expected an argument expression");
                return Some(self.b.done(
                    marker,
                    NodeData::Argument {
                        pass_by,
                        is_declaration: false,
                        is_var: false,
                        type_path: NodeId::INVALID,
                        identifier: NodeId::INVALID,
                        expression: NodeId::INVALID,
                    },
                ));
            }
            self.b.rollback(marker);
            return None;
        };

        Some(self.b.done(
            marker,
            NodeData::Argument {
                pass_by,
                is_declaration: false,
                is_var: false,
                type_path: NodeId::INVALID,
                identifier: NodeId::INVALID,
                expression,
            },
        ))
    }

    /// `identifier type_argument_list? argument_list?`
    fn try_parse_invocation_or_identifier(&mut self, recover: &mut bool) -> Option<NodeId> {
        if self.b.token_kind() != TokenKind::KeywordOrIdentifier {
            return None;
        }
        match self.b.keyword() {
            Some(keyword) if !keyword.is_builtin_type() => return None,
            _ => {}
        }

        let identifier = self.try_parse_identifier_with_type_args(recover, false)?;

        if self.b.token_kind() == TokenKind::OpenParen {
            let marker = self.b.precede(identifier);
            let arguments = self.try_parse_argument_list().unwrap_or(NodeId::INVALID);
            return Some(self.b.done(
                marker,
                NodeData::MethodInvocation {
                    identifier,
                    arguments,
                },
            ));
        }

        Some(identifier)
    }

    fn try_parse_primary_start(&mut self, recover: &mut bool) -> Option<NodeId> {
        match self.b.token_kind() {
            TokenKind::OpenParen => {
                let stream = self.b.try_sub_stream(TokenKind::OpenParen)?;
                let marker = self.b.mark();
                self.b.push_stream(stream);

                let expression = match self.try_parse_expression(recover) {
                    Some(expression) => expression,
                    None => {
                        self.b.inline_error("expected an expression inside parentheses");
                        self.b.advance_to_stream_end();
                        NodeId::INVALID
                    }
                };

                self.b.pop_stream();
                Some(self.b.done(marker, NodeData::ParenExpression { expression }))
            }
            TokenKind::Int32Literal
            | TokenKind::Int64Literal
            | TokenKind::UInt32Literal
            | TokenKind::UInt64Literal
            | TokenKind::FloatLiteral
            | TokenKind::DoubleLiteral
            | TokenKind::HexLiteral
            | TokenKind::BinaryNumberLiteral => self.try_parse_numeric_literal(),
            TokenKind::StringStart | TokenKind::MultiLineStringStart => {
                self.try_parse_string_literal(recover)
            }
            TokenKind::OpenCharacter => {
                Some(self.parse_delimited_literal(TokenKind::CloseCharacter, LiteralKind::Character))
            }
            TokenKind::OpenStyle => {
                Some(self.parse_delimited_literal(TokenKind::CloseStyle, LiteralKind::Style))
            }
            TokenKind::KeywordOrIdentifier => match self.b.keyword() {
                None => self.try_parse_invocation_or_identifier(recover),
                Some(Keyword::New) => self.try_parse_new_expression(recover),
                Some(Keyword::True) => Some(self.parse_keyword_literal(LiteralKind::True)),
                Some(Keyword::False) => Some(self.parse_keyword_literal(LiteralKind::False)),
                Some(Keyword::Null) => Some(self.parse_keyword_literal(LiteralKind::Null)),
                Some(Keyword::This) => Some(self.parse_keyword_literal(LiteralKind::This)),
                Some(Keyword::Base) => Some(self.parse_keyword_literal(LiteralKind::Base)),
                Some(Keyword::Default) => Some(self.parse_default_expression(recover)),
                Some(Keyword::Typeof) => {
                    Some(self.parse_type_query(recover, /* sizeof */ false))
                }
                Some(Keyword::Sizeof) => {
                    Some(self.parse_type_query(recover, /* sizeof */ true))
                }
                Some(Keyword::Nameof) => Some(self.parse_nameof_expression(recover)),
                Some(keyword) if keyword.is_builtin_type() => {
                    // Built-in types appear in expressions as member access
                    // heads, e.g. `int.Parse(...)`.
                    self.try_parse_invocation_or_identifier(recover)
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_keyword_literal(&mut self, literal: LiteralKind) -> NodeId {
        let marker = self.b.mark();
        self.b.advance();
        self.b.done(marker, NodeData::LiteralExpression { literal })
    }

    /// Character and style literals arrive as open/part/close token
    /// triples; the parser validates the shape and keeps the kind.
    fn parse_delimited_literal(&mut self, close: TokenKind, literal: LiteralKind) -> NodeId {
        let marker = self.b.mark();
        self.b.advance();

        while !self.b.end_of_input() && self.b.token_kind() != close {
            self.b.advance();
        }
        if self.b.token_kind() == close {
            self.b.advance();
        } else {
            self.b.inline_error("unterminated literal");
        }

        self.b.done(marker, NodeData::LiteralExpression { literal })
    }

    fn try_parse_numeric_literal(&mut self) -> Option<NodeId> {
        let literal = match self.b.token_kind() {
            TokenKind::Int32Literal => LiteralKind::Int32,
            TokenKind::Int64Literal => LiteralKind::Int64,
            TokenKind::UInt32Literal => LiteralKind::UInt32,
            TokenKind::UInt64Literal => LiteralKind::UInt64,
            TokenKind::FloatLiteral => LiteralKind::Float,
            TokenKind::DoubleLiteral => LiteralKind::Double,
            TokenKind::HexLiteral => LiteralKind::Hex,
            TokenKind::BinaryNumberLiteral => LiteralKind::Binary,
            _ => return None,
        };

        let text = self.b.token_source();
        let marker = self.b.mark();
        self.b.advance();

        if let Some(message) = validate_numeric_literal(literal, text) {
            self.b.inline_error(message);
        }

        Some(self.b.done(marker, NodeData::LiteralExpression { literal }))
    }

    /// `string_literal ::= string_start (part | short_interpolation |
    ///     long_interpolation)* string_end`
    fn try_parse_string_literal(&mut self, recover: &mut bool) -> Option<NodeId> {
        let end_kind = match self.b.token_kind() {
            TokenKind::StringStart => TokenKind::StringEnd,
            TokenKind::MultiLineStringStart => TokenKind::MultiLineStringEnd,
            _ => return None,
        };

        let marker = self.b.mark();
        self.b.advance();

        let mut first_part = NodeId::INVALID;
        let mut tail = NodeId::INVALID;

        loop {
            match self.b.token_kind() {
                TokenKind::RegularStringPart => {
                    let part_marker = self.b.mark();
                    self.b.advance();
                    let part = self.b.done(
                        part_marker,
                        NodeData::StringPart {
                            part: StringPartKind::Regular,
                            expression: NodeId::INVALID,
                        },
                    );
                    self.link(&mut first_part, &mut tail, part);
                }
                TokenKind::ShortStringInterpolation => {
                    let part_marker = self.b.mark();
                    self.b.advance();
                    let part = self.b.done(
                        part_marker,
                        NodeData::StringPart {
                            part: StringPartKind::ShortInterpolation,
                            expression: NodeId::INVALID,
                        },
                    );
                    self.link(&mut first_part, &mut tail, part);
                }
                TokenKind::LongStringInterpolationStart => {
                    let part_marker = self.b.mark();
                    self.b.advance();

                    let expression = match self.try_parse_expression(recover) {
                        Some(expression) => expression,
                        None => {
                            self.b.inline_error("expected an interpolation expression");
                            NodeId::INVALID
                        }
                    };

                    if self.b.token_kind() == TokenKind::LongStringInterpolationEnd {
                        self.b.advance();
                    } else {
                        self.b.inline_error("expected a closing } after interpolation");
                        *recover = true;
                    }

                    let part = self.b.done(
                        part_marker,
                        NodeData::StringPart {
                            part: StringPartKind::LongInterpolation,
                            expression,
                        },
                    );
                    self.link(&mut first_part, &mut tail, part);

                    if *recover {
                        break;
                    }
                }
                kind if kind == end_kind => {
                    self.b.advance();
                    break;
                }
                _ => {
                    self.b.inline_error("unterminated string literal");
                    *recover = true;
                    break;
                }
            }
        }

        Some(self.b.done(marker, NodeData::StringLiteralExpression { first_part }))
    }

    /// `'default' ('(' type_path ')')?`
    fn parse_default_expression(&mut self, recover: &mut bool) -> NodeId {
        let marker = self.b.mark();
        self.b.advance();

        if let Some(stream) = self.b.try_sub_stream(TokenKind::OpenParen) {
            self.b.push_stream(stream);
            let type_path = match self.try_parse_type_path(recover) {
                Some(path) => path,
                None => {
                    self.b.inline_error("expected a type inside default(...)");
                    self.b.advance_to_stream_end();
                    NodeId::INVALID
                }
            };
            self.b.pop_stream();
            return self.b.done(marker, NodeData::DefaultExpression { type_path });
        }

        self.b.done(
            marker,
            NodeData::LiteralExpression {
                literal: LiteralKind::Default,
            },
        )
    }

    /// `('typeof' | 'sizeof') '(' type_path ')'`
    fn parse_type_query(&mut self, recover: &mut bool, is_sizeof: bool) -> NodeId {
        let marker = self.b.mark();
        self.b.advance();

        let mut type_path = NodeId::INVALID;
        match self.b.try_sub_stream(TokenKind::OpenParen) {
            Some(stream) => {
                self.b.push_stream(stream);
                match self.try_parse_type_path(recover) {
                    Some(path) => type_path = path,
                    None => {
                        self.b.inline_error("expected a type");
                        self.b.advance_to_stream_end();
                    }
                }
                self.b.pop_stream();
            }
            None => {
                self.b.inline_error("expected a parenthesized type");
                *recover = true;
            }
        }

        if is_sizeof {
            self.b.done(marker, NodeData::SizeOfExpression { type_path })
        } else {
            self.b.done(marker, NodeData::TypeOfExpression { type_path })
        }
    }

    /// `'nameof' '(' expression ')'`
    fn parse_nameof_expression(&mut self, recover: &mut bool) -> NodeId {
        let marker = self.b.mark();
        self.b.advance();

        let mut expression = NodeId::INVALID;
        match self.b.try_sub_stream(TokenKind::OpenParen) {
            Some(stream) => {
                self.b.push_stream(stream);
                match self.try_parse_expression(recover) {
                    Some(value) => expression = value,
                    None => {
                        self.b.inline_error("expected an expression inside nameof(...)");
                        self.b.advance_to_stream_end();
                    }
                }
                self.b.pop_stream();
            }
            None => {
                self.b.inline_error("expected a parenthesized expression after nameof");
                *recover = true;
            }
        }

        self.b.done(marker, NodeData::NameOfExpression { expression })
    }

    /// `new_expression ::= 'new' allocator_keyword?
    ///     ('dynamic' dynamic_literal | type_path argument_list? initializer?)`
    fn try_parse_new_expression(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::New) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let allocator = match self.b.keyword() {
            Some(Keyword::Tempalloc) => {
                self.b.advance();
                AllocatorKind::Temp
            }
            Some(Keyword::Scopealloc) => {
                self.b.advance();
                AllocatorKind::Scope
            }
            Some(Keyword::Stackalloc) => {
                self.b.advance();
                AllocatorKind::Stack
            }
            _ => AllocatorKind::Heap,
        };

        if self.at_keyword(Keyword::Dynamic) {
            let next = self.b.peek(1).kind;
            if next == TokenKind::CurlyBraceOpen {
                self.b.advance();
                return Some(self.parse_dynamic_object(marker, recover));
            }
            if next == TokenKind::SquareBraceOpen {
                self.b.advance();
                return Some(self.parse_dynamic_array(marker, recover));
            }
        }

        let type_path = match self.try_parse_type_path(recover) {
            Some(path) => path,
            None => {
                self.b.inline_error("expected a type after new");
                *recover = true;
                NodeId::INVALID
            }
        };

        let arguments = if self.b.token_kind() == TokenKind::OpenParen {
            self.try_parse_argument_list().unwrap_or(NodeId::INVALID)
        } else {
            NodeId::INVALID
        };

        let initializer = if self.b.token_kind() == TokenKind::CurlyBraceOpen {
            self.try_parse_initializer_list(recover).unwrap_or(NodeId::INVALID)
        } else {
            NodeId::INVALID
        };

        Some(self.b.done(
            marker,
            NodeData::NewExpression {
                allocator,
                type_path,
                arguments,
                initializer,
            },
        ))
    }

    /// `'{' (dynamic_key ':' expression),* '}'` after `new dynamic`.
    fn parse_dynamic_object(&mut self, marker: crate::builder::Marker, recover: &mut bool) -> NodeId {
        let Some(stream) = self.b.try_sub_stream(TokenKind::CurlyBraceOpen) else {
            self.b.inline_error("expected a dynamic object body");
            *recover = true;
            return self.b.done(
                marker,
                NodeData::DynamicObjectExpression {
                    first_entry: NodeId::INVALID,
                },
            );
        };

        self.b.push_stream(stream);
        let first_entry = if self.b.end_of_input() {
            NodeId::INVALID
        } else {
            self.parse_comma_separated(true, |parser| parser.try_parse_dynamic_key_value())
        };
        self.b.pop_stream();

        self.b
            .done(marker, NodeData::DynamicObjectExpression { first_entry })
    }

    /// `dynamic_key_value ::= (identifier | string_literal) ':' expression`
    fn try_parse_dynamic_key_value(&mut self) -> Option<NodeId> {
        let marker = self.b.mark();

        let key = match self.b.token_kind() {
            TokenKind::KeywordOrIdentifier => {
                self.try_parse_identifier(true).unwrap_or(NodeId::INVALID)
            }
            TokenKind::StringStart => {
                let mut key_recover = false;
                self.try_parse_string_literal(&mut key_recover)
                    .unwrap_or(NodeId::INVALID)
            }
            _ => {
                self.b.rollback(marker);
                return None;
            }
        };

        if self.b.token_kind() == TokenKind::Colon {
            self.b.advance();
        } else {
            self.recover_to_colon_comma_or_end("expected a ':' after dynamic key");
            if self.b.token_kind() == TokenKind::Colon {
                self.b.advance();
            }
        }

        let mut value_recover = false;
        let value = match self.try_parse_expression(&mut value_recover) {
            Some(value) => value,
            None => {
                self.b.inline_error("expected a value expression");
                NodeId::INVALID
            }
        };

        Some(self.b.done(marker, NodeData::DynamicKeyValue { key, value }))
    }

    /// `'[' (expression),* ']'` after `new dynamic`.
    fn parse_dynamic_array(&mut self, marker: crate::builder::Marker, recover: &mut bool) -> NodeId {
        let Some(stream) = self.b.try_sub_stream(TokenKind::SquareBraceOpen) else {
            self.b.inline_error("expected a dynamic array body");
            *recover = true;
            return self.b.done(
                marker,
                NodeData::DynamicArrayExpression {
                    first_element: NodeId::INVALID,
                },
            );
        };

        self.b.push_stream(stream);
        let first_element = if self.b.end_of_input() {
            NodeId::INVALID
        } else {
            self.parse_comma_separated(true, |parser| {
                let mut element_recover = false;
                parser.try_parse_expression(&mut element_recover)
            })
        };
        self.b.pop_stream();

        self.b
            .done(marker, NodeData::DynamicArrayExpression { first_element })
    }

    /// `initializer_list ::= '{' (initializer),* ','? '}'`
    fn try_parse_initializer_list(&mut self, _recover: &mut bool) -> Option<NodeId> {
        let stream = self.b.try_sub_stream(TokenKind::CurlyBraceOpen)?;
        let marker = self.b.mark();
        self.b.push_stream(stream);

        let first_initializer = if self.b.end_of_input() {
            NodeId::INVALID
        } else {
            self.parse_comma_separated(true, |parser| parser.try_parse_initializer())
        };

        self.b.pop_stream();
        Some(self.b.done(marker, NodeData::InitializerList { first_initializer }))
    }

    /// `initializer ::= identifier '=' expression
    ///                | '[' expression ']' '=' expression
    ///                | expression`
    fn try_parse_initializer(&mut self) -> Option<NodeId> {
        // Indexed: `[key] = value`
        if self.b.token_kind() == TokenKind::SquareBraceOpen {
            let marker = self.b.mark();
            let index = self.try_parse_bracket_expression().unwrap_or(NodeId::INVALID);

            if self.b.token_kind() == TokenKind::Assign {
                self.b.advance();
            } else {
                self.b.inline_error("expected '=' after indexed initializer key");
            }

            let mut recover = false;
            let value = match self.try_parse_expression(&mut recover) {
                Some(value) => value,
                None => {
                    self.b.inline_error("expected an initializer value");
                    NodeId::INVALID
                }
            };

            return Some(self.b.done(marker, NodeData::IndexedInitializer { index, value }));
        }

        // Member: `name = value`
        if self.b.token_kind() == TokenKind::KeywordOrIdentifier
            && self.b.peek(1).kind == TokenKind::Assign
        {
            let marker = self.b.mark();
            let identifier = self.try_parse_identifier(true).unwrap_or(NodeId::INVALID);
            self.b.advance(); // =

            let mut recover = false;
            let value = match self.try_parse_expression(&mut recover) {
                Some(value) => value,
                None => {
                    self.b.inline_error("expected an initializer value");
                    NodeId::INVALID
                }
            };

            return Some(self.b.done(marker, NodeData::MemberInitializer { identifier, value }));
        }

        // Collection element.
        let marker = self.b.mark();
        let mut recover = false;
        let Some(value) = self.try_parse_expression(&mut recover) else {
            self.b.drop_marker(marker);
            return None;
        };
        Some(self.b.done(marker, NodeData::ListInitializer { value }))
    }
}

/// Validates a numeric literal's spelling against its storage class.
/// Returns an error message for overflow, missing digits, or unparseable
/// values.
fn validate_numeric_literal(kind: LiteralKind, text: &str) -> Option<&'static str> {
    fn digits(text: &str) -> String {
        text.trim_end_matches(['u', 'U', 'l', 'L', 'f', 'F', 'd', 'D'])
            .replace('_', "")
    }

    match kind {
        LiteralKind::Int32 => match digits(text).parse::<u64>() {
            Ok(value) if value > i32::MAX as u64 => Some("integer literal overflows int32"),
            Ok(_) => None,
            Err(_) => Some("integer literal overflows int32"),
        },
        LiteralKind::Int64 => match digits(text).parse::<u64>() {
            Ok(value) if value > i64::MAX as u64 => Some("integer literal overflows int64"),
            Ok(_) => None,
            Err(_) => Some("integer literal overflows int64"),
        },
        LiteralKind::UInt32 => match digits(text).parse::<u64>() {
            Ok(value) if value > u32::MAX as u64 => Some("integer literal overflows uint32"),
            Ok(_) => None,
            Err(_) => Some("integer literal overflows uint32"),
        },
        LiteralKind::UInt64 => match digits(text).parse::<u64>() {
            Ok(_) => None,
            Err(_) => Some("integer literal overflows uint64"),
        },
        LiteralKind::Hex => {
            // No suffixes on hex literals; stripping would eat hex digits.
            let body = text.replace('_', "");
            let body = body.trim_start_matches("0x").trim_start_matches("0X");
            if body.is_empty() {
                return Some("hex literal requires at least one digit");
            }
            match u64::from_str_radix(body, 16) {
                Ok(_) => None,
                Err(_) => Some("hex literal overflows uint64"),
            }
        }
        LiteralKind::Binary => {
            let body = text.replace('_', "");
            let body = body.trim_start_matches("0b").trim_start_matches("0B");
            if body.is_empty() {
                return Some("binary literal requires at least one digit");
            }
            match u64::from_str_radix(body, 2) {
                Ok(_) => None,
                Err(_) => Some("binary literal overflows uint64"),
            }
        }
        LiteralKind::Float => match digits(text).parse::<f32>() {
            Ok(value) if value.is_finite() => None,
            Ok(_) => Some("floating point literal is out of range"),
            Err(_) => Some("invalid floating point literal"),
        },
        LiteralKind::Double => match digits(text).parse::<f64>() {
            Ok(value) if value.is_finite() => None,
            Ok(_) => Some("floating point literal is out of range"),
            Err(_) => Some("invalid floating point literal"),
        },
        _ => None,
    }
}
