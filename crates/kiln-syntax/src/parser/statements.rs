//! Statements.

use crate::keywords::Keyword;
use crate::node::{NodeData, NodeId, StorageClass};
use crate::parser::{is_embedded_statement_keyword, Parser};
use crate::tokens::TokenKind;

impl Parser<'_> {
    /// `block ::= '{' statement* '}'`
    pub(crate) fn try_parse_block(&mut self) -> Option<NodeId> {
        let stream = self.b.try_sub_stream(TokenKind::CurlyBraceOpen)?;
        let marker = self.b.mark();
        self.b.push_stream(stream);

        let mut first_statement = NodeId::INVALID;
        let mut tail = NodeId::INVALID;

        while !self.b.end_of_input() {
            let before = self.b.token_index();

            if self.b.token_kind() == TokenKind::SemiColon {
                self.b.advance();
                continue;
            }

            let mut recover = false;
            match self.try_parse_statement(&mut recover) {
                Some(statement) => self.link(&mut first_statement, &mut tail, statement),
                None => recover = true,
            }

            if recover {
                // Statement anchors: semicolon, a block, or a keyword that
                // can begin a statement.
                let error = self.b.mark();
                while !self.b.end_of_input() {
                    let kind = self.b.token_kind();
                    if kind == TokenKind::SemiColon || kind == TokenKind::CurlyBraceOpen {
                        break;
                    }
                    if let Some(keyword) = self.b.keyword()
                        && is_embedded_statement_keyword(keyword)
                    {
                        break;
                    }
                    self.b.advance();
                }
                self.b.error(error, "expected a statement");
                if self.b.token_kind() == TokenKind::SemiColon {
                    self.b.advance();
                }
            }

            if self.b.token_index() == before && !self.b.end_of_input() {
                // Zero progress; force one token so the block always
                // terminates.
                let error = self.b.mark();
                self.b.advance();
                self.b.error(error, "parser stuck");
            }
        }

        self.b.pop_stream();
        Some(self.b.done(marker, NodeData::Block { first_statement }))
    }

    /// `statement ::= local_constant | local_variable | embedded_statement`
    pub(crate) fn try_parse_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if let Some(statement) = self.try_parse_local_constant_declaration(recover) {
            return Some(statement);
        }
        if let Some(statement) = self.try_parse_local_variable_declaration(recover) {
            return Some(statement);
        }
        self.try_parse_embedded_statement(recover)
    }

    pub(crate) fn try_parse_embedded_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if let Some(block) = self.try_parse_block() {
            return Some(block);
        }
        self.try_parse_simple_embedded_statement(recover)
    }

    fn try_parse_simple_embedded_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        match self.b.keyword() {
            Some(Keyword::If) => self.try_parse_if_statement(recover),
            Some(Keyword::While) => self.try_parse_while_statement(recover),
            Some(Keyword::Do) => self.try_parse_do_while_statement(recover),
            Some(Keyword::For) => self.try_parse_for_statement(recover),
            Some(Keyword::Foreach) => self.try_parse_foreach_statement(recover),
            Some(Keyword::Switch) => self.try_parse_switch_statement(recover),
            Some(Keyword::Try) => self.try_parse_try_statement(recover),
            Some(Keyword::Return) => self.try_parse_return_statement(recover),
            Some(Keyword::Throw) => self.try_parse_throw_statement(recover),
            Some(Keyword::Break) => {
                let marker = self.b.mark();
                self.b.advance();
                *recover = !self.expect_semicolon();
                Some(self.b.done(marker, NodeData::BreakStatement))
            }
            Some(Keyword::Continue) => {
                let marker = self.b.mark();
                self.b.advance();
                *recover = !self.expect_semicolon();
                Some(self.b.done(marker, NodeData::ContinueStatement))
            }
            Some(Keyword::Using) => self.try_parse_using_statement(recover),
            Some(Keyword::With) => self.try_parse_with_statement(recover),
            _ => self.try_parse_expression_statement(recover),
        }
    }

    /// `( expression )` — the parenthesized head of if/while/switch/with.
    fn parse_condition_parens(&mut self, recover: &mut bool, what: &str) -> NodeId {
        let Some(stream) = self.b.try_sub_stream(TokenKind::OpenParen) else {
            let message = format!("expected a parenthesized condition for {what}");
            self.b.inline_error(&message);
            *recover = true;
            return NodeId::INVALID;
        };

        self.b.push_stream(stream);
        let condition = match self.try_parse_expression(recover) {
            Some(expression) => expression,
            None => {
                let message = format!("expected a condition expression for {what}");
                self.b.inline_error(&message);
                self.b.advance_to_stream_end();
                NodeId::INVALID
            }
        };
        self.b.pop_stream();
        condition
    }

    /// `if_statement ::= 'if' '(' expression ')' embedded ('else' embedded)?`
    fn try_parse_if_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::If) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let condition = self.parse_condition_parens(recover, "an if statement");

        let then_body = match self.try_parse_embedded_statement(recover) {
            Some(statement) => statement,
            None => {
                self.b.inline_error("expected a statement after if condition");
                *recover = true;
                NodeId::INVALID
            }
        };

        let mut else_body = NodeId::INVALID;
        if self.at_keyword(Keyword::Else) {
            self.b.advance();
            match self.try_parse_embedded_statement(recover) {
                Some(statement) => else_body = statement,
                None => {
                    self.b.inline_error("expected a statement after else");
                    *recover = true;
                }
            }
        }

        Some(self.b.done(
            marker,
            NodeData::IfStatement {
                condition,
                then_body,
                else_body,
            },
        ))
    }

    fn try_parse_while_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::While) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let condition = self.parse_condition_parens(recover, "a while statement");

        let body = match self.try_parse_embedded_statement(recover) {
            Some(statement) => statement,
            None => {
                self.b.inline_error("expected a loop body");
                *recover = true;
                NodeId::INVALID
            }
        };

        Some(self.b.done(marker, NodeData::WhileStatement { condition, body }))
    }

    /// `do_while ::= 'do' embedded 'while' '(' expression ')' ';'`
    fn try_parse_do_while_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Do) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let body = match self.try_parse_embedded_statement(recover) {
            Some(statement) => statement,
            None => {
                self.b.inline_error("expected a loop body after do");
                *recover = true;
                NodeId::INVALID
            }
        };

        let mut condition = NodeId::INVALID;
        if self.at_keyword(Keyword::While) {
            self.b.advance();
            condition = self.parse_condition_parens(recover, "a do-while statement");
            *recover = *recover || !self.expect_semicolon();
        } else {
            self.b.inline_error("expected `while` after do body");
            *recover = true;
        }

        Some(self.b.done(marker, NodeData::DoWhileStatement { body, condition }))
    }

    /// `for ::= 'for' '(' initializers? ';' condition? ';' incrementors? ')' embedded`
    fn try_parse_for_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::For) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let mut first_initializer = NodeId::INVALID;
        let mut condition = NodeId::INVALID;
        let mut first_incrementor = NodeId::INVALID;

        match self.b.try_sub_stream(TokenKind::OpenParen) {
            Some(stream) => {
                self.b.push_stream(stream);

                first_initializer = self.parse_for_initializers(recover);

                if self.b.token_kind() == TokenKind::SemiColon {
                    self.b.advance();
                } else {
                    self.b.inline_error("expected ';' after for initializer");
                }

                if self.b.token_kind() != TokenKind::SemiColon {
                    if let Some(expression) = self.try_parse_expression(recover) {
                        condition = expression;
                    }
                }

                if self.b.token_kind() == TokenKind::SemiColon {
                    self.b.advance();
                } else {
                    self.b.inline_error("expected ';' after for condition");
                }

                first_incrementor = self.parse_for_incrementors(recover);

                self.b.pop_stream();
            }
            None => {
                self.b.inline_error("expected a parenthesized for clause");
                *recover = true;
            }
        }

        let body = match self.try_parse_embedded_statement(recover) {
            Some(statement) => statement,
            None => {
                self.b.inline_error("expected a loop body");
                *recover = true;
                NodeId::INVALID
            }
        };

        Some(self.b.done(
            marker,
            NodeData::ForStatement {
                first_initializer,
                condition,
                first_incrementor,
                body,
            },
        ))
    }

    /// `for_initializer ::= local_variable_declaration | expression (',' expression)*`
    fn parse_for_initializers(&mut self, recover: &mut bool) -> NodeId {
        if self.b.token_kind() == TokenKind::SemiColon {
            return NodeId::INVALID;
        }

        if let Some(declaration) = self.try_parse_local_variable_header(recover) {
            return declaration;
        }

        let mut first = NodeId::INVALID;
        let mut tail = NodeId::INVALID;
        loop {
            match self.try_parse_expression(recover) {
                Some(expression) => self.link(&mut first, &mut tail, expression),
                None => break,
            }
            if self.b.token_kind() == TokenKind::Comma {
                self.b.advance();
                continue;
            }
            break;
        }
        first
    }

    fn parse_for_incrementors(&mut self, recover: &mut bool) -> NodeId {
        let mut first = NodeId::INVALID;
        let mut tail = NodeId::INVALID;
        while !self.b.end_of_input() {
            match self.try_parse_expression(recover) {
                Some(expression) => self.link(&mut first, &mut tail, expression),
                None => {
                    let error = self.b.mark();
                    self.b.advance_to_stream_end();
                    self.b.error(error, "expected an incrementor expression");
                    break;
                }
            }
            if self.b.token_kind() == TokenKind::Comma {
                self.b.advance();
                continue;
            }
            break;
        }
        first
    }

    /// `foreach ::= 'foreach' '(' ('var' | type_path) identifier 'in' expression ')' embedded`
    fn try_parse_foreach_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Foreach) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let mut variable_type = NodeId::INVALID;
        let mut identifier = NodeId::INVALID;
        let mut collection = NodeId::INVALID;

        match self.b.try_sub_stream(TokenKind::OpenParen) {
            Some(stream) => {
                self.b.push_stream(stream);

                if self.at_keyword(Keyword::Var) {
                    self.b.advance();
                } else if let Some(path) = self.try_parse_type_path(recover) {
                    variable_type = path;
                } else {
                    self.b.inline_error("expected a loop variable type or `var`");
                }

                match self.try_parse_identifier(true) {
                    Some(name) => identifier = name,
                    None => {
                        self.b.inline_error("expected a loop variable name");
                    }
                }

                if self.at_keyword(Keyword::In) {
                    self.b.advance();
                } else {
                    self.b.inline_error("expected `in` in foreach");
                }

                match self.try_parse_expression(recover) {
                    Some(expression) => collection = expression,
                    None => {
                        self.b.inline_error("expected a collection expression");
                        self.b.advance_to_stream_end();
                    }
                }

                self.b.pop_stream();
            }
            None => {
                self.b.inline_error("expected a parenthesized foreach clause");
                *recover = true;
            }
        }

        let body = match self.try_parse_embedded_statement(recover) {
            Some(statement) => statement,
            None => {
                self.b.inline_error("expected a loop body");
                *recover = true;
                NodeId::INVALID
            }
        };

        Some(self.b.done(
            marker,
            NodeData::ForeachStatement {
                variable_type,
                identifier,
                collection,
                body,
            },
        ))
    }

    /// `switch ::= 'switch' '(' expression ')' '{' section* '}'`
    fn try_parse_switch_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Switch) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let value = self.parse_condition_parens(recover, "a switch statement");

        let mut first_section = NodeId::INVALID;
        match self.b.try_sub_stream(TokenKind::CurlyBraceOpen) {
            Some(stream) => {
                self.b.push_stream(stream);

                let mut tail = NodeId::INVALID;
                while !self.b.end_of_input() {
                    let before = self.b.token_index();
                    match self.try_parse_switch_section() {
                        Some(section) => self.link(&mut first_section, &mut tail, section),
                        None => {
                            let error = self.b.mark();
                            self.b.advance();
                            self.b.error(error, "expected a switch section");
                        }
                    }
                    if self.b.token_index() == before && !self.b.end_of_input() {
                        self.b.advance();
                    }
                }

                self.b.pop_stream();
            }
            None => {
                self.b.inline_error("expected a switch body");
                *recover = true;
            }
        }

        Some(self.b.done(
            marker,
            NodeData::SwitchStatement {
                value,
                first_section,
            },
        ))
    }

    /// `section ::= label+ statement*` where adjacent labels share the
    /// section's statements.
    fn try_parse_switch_section(&mut self) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Case) && !self.at_keyword(Keyword::Default) {
            return None;
        }

        let marker = self.b.mark();

        let mut first_label = NodeId::INVALID;
        let mut label_tail = NodeId::INVALID;
        while let Some(label) = self.try_parse_switch_section_label() {
            self.link(&mut first_label, &mut label_tail, label);
        }

        let mut first_statement = NodeId::INVALID;
        let mut statement_tail = NodeId::INVALID;
        while !self.b.end_of_input() {
            if self.at_keyword(Keyword::Case) || self.at_keyword(Keyword::Default) {
                break;
            }
            if self.b.token_kind() == TokenKind::SemiColon {
                self.b.advance();
                continue;
            }

            let before = self.b.token_index();
            let mut recover = false;
            match self.try_parse_statement(&mut recover) {
                Some(statement) => self.link(&mut first_statement, &mut statement_tail, statement),
                None => {
                    let error = self.b.mark();
                    self.b.advance();
                    self.b.error(error, "expected a statement in switch section");
                }
            }
            if self.b.token_index() == before && !self.b.end_of_input() {
                self.b.advance();
            }
        }

        Some(self.b.done(
            marker,
            NodeData::SwitchSection {
                first_label,
                first_statement,
            },
        ))
    }

    /// `label ::= 'case' expression ('when' expression)? ':' | 'default' ':'`
    fn try_parse_switch_section_label(&mut self) -> Option<NodeId> {
        let is_default = match self.b.keyword() {
            Some(Keyword::Case) => false,
            Some(Keyword::Default) => true,
            _ => return None,
        };

        let marker = self.b.mark();
        self.b.advance();

        let mut expression = NodeId::INVALID;
        let mut guard = NodeId::INVALID;
        let mut recover = false;

        if !is_default {
            match self.try_parse_non_assignment_expression(&mut recover) {
                Some(value) => expression = value,
                None => {
                    self.b.inline_error("expected a case pattern expression");
                }
            }

            if self.at_keyword(Keyword::When) {
                self.b.advance();
                match self.try_parse_expression(&mut recover) {
                    Some(value) => guard = value,
                    None => {
                        self.b.inline_error("expected an expression after `when`");
                    }
                }
            }
        }

        if self.b.token_kind() == TokenKind::Colon {
            self.b.advance();
        } else {
            self.b.inline_error("expected ':' after switch label");
        }

        Some(self.b.done(
            marker,
            NodeData::SwitchSectionLabel {
                is_default,
                expression,
                guard,
            },
        ))
    }

    /// `try ::= 'try' block catch_clause* ('finally' block)?`
    fn try_parse_try_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Try) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let body = match self.try_parse_block() {
            Some(block) => block,
            None => {
                self.b.inline_error("expected a block after try");
                *recover = true;
                NodeId::INVALID
            }
        };

        let mut first_catch = NodeId::INVALID;
        let mut tail = NodeId::INVALID;
        while let Some(clause) = self.try_parse_catch_clause(recover) {
            self.link(&mut first_catch, &mut tail, clause);
        }

        let mut finally_body = NodeId::INVALID;
        if self.at_keyword(Keyword::Finally) {
            self.b.advance();
            match self.try_parse_block() {
                Some(block) => finally_body = block,
                None => {
                    self.b.inline_error("expected a block after finally");
                    *recover = true;
                }
            }
        }

        if !first_catch.is_valid() && !finally_body.is_valid() && !*recover {
            self.b.inline_error("try requires at least one catch or finally clause");
        }

        Some(self.b.done(
            marker,
            NodeData::TryStatement {
                body,
                first_catch,
                finally_body,
            },
        ))
    }

    /// `catch_clause ::= 'catch' ('(' type_path identifier? ')')? block`
    fn try_parse_catch_clause(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Catch) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let mut type_path = NodeId::INVALID;
        let mut identifier = NodeId::INVALID;

        if let Some(stream) = self.b.try_sub_stream(TokenKind::OpenParen) {
            self.b.push_stream(stream);

            match self.try_parse_type_path(recover) {
                Some(path) => type_path = path,
                None => {
                    self.b.inline_error("expected an exception type");
                }
            }
            if self.b.token_kind() == TokenKind::KeywordOrIdentifier {
                identifier = self.try_parse_identifier(true).unwrap_or(NodeId::INVALID);
            }

            self.b.pop_stream();
        }

        let body = match self.try_parse_block() {
            Some(block) => block,
            None => {
                self.b.inline_error("expected a block after catch");
                *recover = true;
                NodeId::INVALID
            }
        };

        Some(self.b.done(
            marker,
            NodeData::CatchClause {
                type_path,
                identifier,
                body,
            },
        ))
    }

    fn try_parse_return_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Return) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let mut expression = NodeId::INVALID;
        if self.b.token_kind() != TokenKind::SemiColon {
            match self.try_parse_expression(recover) {
                Some(value) => expression = value,
                None => {
                    self.b.inline_error("expected an expression or ';' after return");
                    *recover = true;
                }
            }
        }

        if !*recover {
            *recover = !self.expect_semicolon();
        }

        Some(self.b.done(marker, NodeData::ReturnStatement { expression }))
    }

    fn try_parse_throw_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Throw) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let mut expression = NodeId::INVALID;
        if self.b.token_kind() != TokenKind::SemiColon {
            match self.try_parse_expression(recover) {
                Some(value) => expression = value,
                None => {
                    self.b.inline_error("expected an expression after throw");
                    *recover = true;
                }
            }
        }

        if !*recover {
            *recover = !self.expect_semicolon();
        }

        Some(self.b.done(marker, NodeData::ThrowStatement { expression }))
    }

    /// `using_statement ::= 'using' '(' acquisition ')' embedded
    ///                    | 'using' local_variable_declaration ';'`
    fn try_parse_using_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Using) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        if let Some(stream) = self.b.try_sub_stream(TokenKind::OpenParen) {
            self.b.push_stream(stream);

            let acquisition = match self.parse_using_acquisition(recover) {
                Some(node) => node,
                None => {
                    self.b.inline_error("expected a resource acquisition");
                    self.b.advance_to_stream_end();
                    NodeId::INVALID
                }
            };

            self.b.pop_stream();

            let body = match self.try_parse_embedded_statement(recover) {
                Some(statement) => statement,
                None => {
                    self.b.inline_error("expected a statement after using clause");
                    *recover = true;
                    NodeId::INVALID
                }
            };

            return Some(self.b.done(marker, NodeData::UsingStatement { acquisition, body }));
        }

        // Scoped form: the acquisition lives until the end of the
        // enclosing block.
        let acquisition = match self.parse_using_acquisition(recover) {
            Some(node) => node,
            None => {
                self.b.inline_error("expected a resource acquisition after using");
                *recover = true;
                NodeId::INVALID
            }
        };
        *recover = *recover || !self.expect_semicolon();

        Some(self.b.done(
            marker,
            NodeData::UsingStatement {
                acquisition,
                body: NodeId::INVALID,
            },
        ))
    }

    fn parse_using_acquisition(&mut self, recover: &mut bool) -> Option<NodeId> {
        if let Some(declaration) = self.try_parse_local_variable_header(recover) {
            return Some(declaration);
        }
        self.try_parse_expression(recover)
    }

    /// `with ::= 'with' '(' expression ')' embedded`
    fn try_parse_with_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::With) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let expression = self.parse_condition_parens(recover, "a with statement");

        let body = match self.try_parse_embedded_statement(recover) {
            Some(statement) => statement,
            None => {
                self.b.inline_error("expected a statement after with clause");
                *recover = true;
                NodeId::INVALID
            }
        };

        Some(self.b.done(marker, NodeData::WithStatement { expression, body }))
    }

    /// `local_constant ::= 'const' type_path identifier '=' expression ';'`
    fn try_parse_local_constant_declaration(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Const) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let type_path = match self.try_parse_type_path(recover) {
            Some(path) => path,
            None => {
                self.b.inline_error("expected a constant type");
                NodeId::INVALID
            }
        };

        let identifier = match self.try_parse_identifier(true) {
            Some(name) => name,
            None => {
                self.b.inline_error("expected a constant name");
                NodeId::INVALID
            }
        };

        let mut value = NodeId::INVALID;
        if self.b.token_kind() == TokenKind::Assign {
            self.b.advance();
            match self.try_parse_expression(recover) {
                Some(expression) => value = expression,
                None => {
                    self.b.inline_error("expected a constant value");
                    *recover = true;
                }
            }
        } else {
            self.b.inline_error("local constants require an initializer");
        }

        *recover = *recover || !self.expect_semicolon();

        Some(self.b.done(
            marker,
            NodeData::LocalConstantDeclaration {
                type_path,
                identifier,
                value,
            },
        ))
    }

    /// `local_variable ::= local_variable_header ';'`
    fn try_parse_local_variable_declaration(&mut self, recover: &mut bool) -> Option<NodeId> {
        let declaration = self.try_parse_local_variable_header(recover)?;
        *recover = *recover || !self.expect_semicolon();
        Some(declaration)
    }

    /// `local_variable_header ::= ('temp' | 'scoped')? ('var' | type_path)
    ///     declarator (',' declarator)*`
    ///
    /// Rolls back entirely when the shape does not fit, so expressions like
    /// `a < b` re-parse cleanly as comparisons.
    pub(crate) fn try_parse_local_variable_header(&mut self, recover: &mut bool) -> Option<NodeId> {
        if self.b.token_kind() != TokenKind::KeywordOrIdentifier {
            return None;
        }

        let marker = self.b.mark();

        let storage = match self.b.keyword() {
            Some(Keyword::Temp) => {
                self.b.advance();
                StorageClass::Temp
            }
            Some(Keyword::Scoped) => {
                self.b.advance();
                StorageClass::Scoped
            }
            _ => StorageClass::Default,
        };

        let mut is_var = false;
        let mut type_path = NodeId::INVALID;

        if self.at_keyword(Keyword::Var) {
            is_var = true;
            self.b.advance();
        } else {
            let mut probe_recover = false;
            match self.try_parse_type_path(&mut probe_recover) {
                Some(path) if !probe_recover => type_path = path,
                _ => {
                    self.b.rollback(marker);
                    return None;
                }
            }
        }

        // Without a declarator name this was an expression after all.
        if self.b.token_kind() != TokenKind::KeywordOrIdentifier {
            self.b.rollback(marker);
            return None;
        }

        let mut first_declarator = NodeId::INVALID;
        let mut tail = NodeId::INVALID;
        loop {
            match self.try_parse_local_variable_declarator(recover) {
                Some(declarator) => self.link(&mut first_declarator, &mut tail, declarator),
                None => {
                    self.b.inline_error("expected a variable name");
                    break;
                }
            }
            if self.b.token_kind() == TokenKind::Comma {
                self.b.advance();
                continue;
            }
            break;
        }

        Some(self.b.done(
            marker,
            NodeData::LocalVariableDeclaration {
                storage,
                is_var,
                type_path,
                first_declarator,
            },
        ))
    }

    /// `declarator ::= identifier ('=' expression)?`
    fn try_parse_local_variable_declarator(&mut self, recover: &mut bool) -> Option<NodeId> {
        if self.b.token_kind() != TokenKind::KeywordOrIdentifier {
            return None;
        }
        let marker = self.b.mark();
        let identifier = self.try_parse_identifier(true).unwrap_or(NodeId::INVALID);

        let mut initializer = NodeId::INVALID;
        if self.b.token_kind() == TokenKind::Assign {
            self.b.advance();
            match self.try_parse_expression(recover) {
                Some(expression) => initializer = expression,
                None => {
                    self.b.inline_error("expected an initializer expression");
                    *recover = true;
                }
            }
        }

        Some(self.b.done(
            marker,
            NodeData::LocalVariableDeclarator {
                identifier,
                initializer,
            },
        ))
    }

    fn try_parse_expression_statement(&mut self, recover: &mut bool) -> Option<NodeId> {
        let marker = self.b.mark();
        let Some(expression) = self.try_parse_expression(recover) else {
            self.b.drop_marker(marker);
            return None;
        };

        if !*recover {
            *recover = !self.expect_semicolon();
        }

        Some(self.b.done(marker, NodeData::ExpressionStatement { expression }))
    }
}
