//! File-level and type-member declarations.

use crate::builder::Marker;
use crate::keywords::Keyword;
use crate::node::{Modifiers, NodeData, NodeId, PassBy, StorageClass, Visibility};
use crate::parser::Parser;
use crate::tokens::TokenKind;

impl Parser<'_> {
    /// `using_directive ::= 'using' 'static' type_path ';'
    ///                    | 'using' identifier '=' type_path ';'
    ///                    | 'using' namespace_path ';'`
    pub(crate) fn try_parse_using_declaration(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Using) {
            return None;
        }

        // `using (...)` and `using x = expr;` inside blocks are statements;
        // at the top level `using` always introduces a directive.
        let marker = self.b.mark();
        self.b.advance();

        if self.at_keyword(Keyword::Static) {
            self.b.advance();
            let type_path = match self.try_parse_type_path(recover) {
                Some(path) => path,
                None => {
                    self.b.inline_error("expected a type path following 'using static'");
                    *recover = true;
                    NodeId::INVALID
                }
            };
            *recover = *recover || !self.expect_semicolon();
            return Some(self.b.done(marker, NodeData::UsingStatic { type_path }));
        }

        if self.b.token_kind() == TokenKind::KeywordOrIdentifier
            && self.b.peek(1).kind == TokenKind::Assign
        {
            let identifier = self.try_parse_identifier(true).unwrap_or(NodeId::INVALID);
            self.b.advance(); // =
            let type_path = match self.try_parse_type_path(recover) {
                Some(path) => path,
                None => {
                    self.b
                        .inline_error("expected a type path following using alias declaration");
                    *recover = true;
                    NodeId::INVALID
                }
            };
            *recover = *recover || !self.expect_semicolon();
            return Some(self.b.done(
                marker,
                NodeData::UsingAlias {
                    identifier,
                    type_path,
                },
            ));
        }

        let path = match self.try_parse_namespace_path(recover) {
            Some(path) => path,
            None => {
                self.b
                    .inline_error("expected a namespace path following using declaration");
                *recover = true;
                NodeId::INVALID
            }
        };
        *recover = *recover || !self.expect_semicolon();
        Some(self.b.done(marker, NodeData::UsingNamespace { path }))
    }

    /// `namespace_declaration ::= 'namespace' namespace_path '{' type_declaration* '}'`
    pub(crate) fn try_parse_namespace_declaration(&mut self, recover: &mut bool) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Namespace) {
            return None;
        }

        let marker = self.b.mark();
        self.b.advance();

        let path = match self.try_parse_namespace_path(recover) {
            Some(path) => path,
            None => {
                self.b.inline_error("expected a namespace name");
                *recover = true;
                NodeId::INVALID
            }
        };

        let Some(stream) = self.b.try_sub_stream(TokenKind::CurlyBraceOpen) else {
            self.b.inline_error("expected a namespace body");
            *recover = true;
            return Some(self.b.done(
                marker,
                NodeData::NamespaceDeclaration {
                    path,
                    first_declaration: NodeId::INVALID,
                },
            ));
        };

        self.b.push_stream(stream);

        let mut first_declaration = NodeId::INVALID;
        let mut tail = NodeId::INVALID;
        while !self.b.end_of_input() {
            let before = self.b.token_index();

            if self.b.token_kind() == TokenKind::SemiColon {
                self.b.advance();
                continue;
            }

            let mut inner_recover = false;
            let declaration = if let Some(using) = self.try_parse_using_declaration(&mut inner_recover)
            {
                Some(using)
            } else {
                self.try_parse_type_declaration(&mut inner_recover)
            };

            match declaration {
                Some(declaration) => self.link(&mut first_declaration, &mut tail, declaration),
                None => {
                    if self.b.token_index() == before {
                        let error = self.b.mark();
                        self.b.advance();
                        self.b.error(error, "expected a declaration");
                    }
                }
            }

            if inner_recover {
                while !self.b.end_of_input()
                    && !crate::parser::is_top_level_recovery_token(self.b.token())
                {
                    self.b.advance();
                }
            }
        }

        self.b.pop_stream();

        Some(self.b.done(
            marker,
            NodeData::NamespaceDeclaration {
                path,
                first_declaration,
            },
        ))
    }

    /// `type_declaration ::= modifier_list? (class | struct | enum | interface | delegate)`
    pub(crate) fn try_parse_type_declaration(&mut self, recover: &mut bool) -> Option<NodeId> {
        let marker = self.b.mark();

        let modifiers = self.try_parse_modifier_list().unwrap_or(NodeId::INVALID);

        if let Some(node) = self.try_parse_class_declaration(marker, modifiers, recover) {
            return Some(node);
        }
        if let Some(node) = self.try_parse_struct_declaration(marker, modifiers, recover) {
            return Some(node);
        }
        if let Some(node) = self.try_parse_enum_declaration(marker, modifiers, recover) {
            return Some(node);
        }
        if let Some(node) = self.try_parse_interface_declaration(marker, modifiers, recover) {
            return Some(node);
        }
        if let Some(node) = self.try_parse_delegate_declaration(marker, modifiers, recover) {
            return Some(node);
        }

        if modifiers.is_valid() {
            *recover = true;
            return Some(self.error_declaration(marker, "expected a declaration"));
        }

        self.b.rollback(marker);
        None
    }

    fn add_modifier(&mut self, modifiers: &mut Modifiers, add: Modifiers, exclusive: Modifiers) {
        if modifiers.contains(add) {
            self.b.inline_error("duplicate modifier");
        }
        if modifiers.intersects(exclusive.without(add)) {
            self.b.inline_error("modifier conflicts with a previous modifier");
        }
        modifiers.insert(add);
        self.b.advance();
    }

    pub(crate) fn try_parse_modifier_list(&mut self) -> Option<NodeId> {
        let mut modifiers = Modifiers::NONE;
        let marker = self.b.mark();

        while self.b.token_kind() == TokenKind::KeywordOrIdentifier {
            match self.b.keyword() {
                Some(Keyword::Static) => {
                    self.add_modifier(&mut modifiers, Modifiers::STATIC, Modifiers::NONE);
                }
                Some(Keyword::Ref) => {
                    self.add_modifier(&mut modifiers, Modifiers::REF, Modifiers::NONE);
                }
                Some(Keyword::Readonly) => {
                    self.add_modifier(&mut modifiers, Modifiers::READONLY, Modifiers::NONE);
                }
                Some(Keyword::Sealed) => {
                    self.add_modifier(
                        &mut modifiers,
                        Modifiers::SEALED,
                        Modifiers::VIRTUAL | Modifiers::ABSTRACT,
                    );
                }
                Some(Keyword::Abstract) => {
                    self.add_modifier(
                        &mut modifiers,
                        Modifiers::ABSTRACT,
                        Modifiers::METHOD_KIND | Modifiers::SEALED,
                    );
                }
                Some(Keyword::Virtual) => {
                    self.add_modifier(
                        &mut modifiers,
                        Modifiers::VIRTUAL,
                        Modifiers::METHOD_KIND | Modifiers::SEALED,
                    );
                }
                Some(Keyword::Override) => {
                    self.add_modifier(&mut modifiers, Modifiers::OVERRIDE, Modifiers::METHOD_KIND);
                }
                Some(Keyword::Public) => {
                    self.add_modifier(&mut modifiers, Modifiers::PUBLIC, Modifiers::VISIBILITY);
                }
                Some(Keyword::Export) => {
                    self.add_modifier(&mut modifiers, Modifiers::EXPORT, Modifiers::VISIBILITY);
                }
                Some(Keyword::Private) => {
                    self.add_modifier(&mut modifiers, Modifiers::PRIVATE, Modifiers::VISIBILITY);
                }
                Some(Keyword::Protected) => {
                    self.add_modifier(&mut modifiers, Modifiers::PROTECTED, Modifiers::VISIBILITY);
                }
                Some(Keyword::Internal) => {
                    self.add_modifier(&mut modifiers, Modifiers::INTERNAL, Modifiers::VISIBILITY);
                }
                _ => break,
            }
        }

        if modifiers.is_empty() {
            self.b.drop_marker(marker);
            return None;
        }
        Some(self.b.done(marker, NodeData::ModifierList { modifiers }))
    }

    pub(crate) fn try_parse_visibility(&mut self) -> Visibility {
        let visibility = match self.b.keyword() {
            Some(Keyword::Export) => Visibility::Export,
            Some(Keyword::Public) => Visibility::Public,
            Some(Keyword::Private) => Visibility::Private,
            Some(Keyword::Internal) => Visibility::Internal,
            Some(Keyword::Protected) => Visibility::Protected,
            _ => return Visibility::Unspecified,
        };
        self.b.advance();
        visibility
    }

    /// `base_list ::= ':' type_path (',' type_path)*`
    pub(crate) fn try_parse_base_list(&mut self, recover: &mut bool) -> Option<NodeId> {
        if self.b.token_kind() != TokenKind::Colon {
            return None;
        }

        let marker = self.b.mark();
        self.b.advance();

        let mut first_type = NodeId::INVALID;
        match self.try_parse_type_path(recover) {
            Some(first) if !*recover => {
                first_type = first;
                let mut tail = first;
                while self.b.token_kind() == TokenKind::Comma {
                    self.b.advance();

                    match self.try_parse_type_path(recover) {
                        Some(next) => {
                            self.b.set_next(tail, next);
                            tail = next;
                        }
                        None => {
                            self.b.inline_error("expected a type after , in base list");
                            *recover = true;
                        }
                    }

                    if *recover {
                        self.advance_to_comma_or_curly_open();
                        if self.b.token_kind() == TokenKind::Comma {
                            *recover = false;
                            continue;
                        }
                        break;
                    }
                }
            }
            Some(first) => first_type = first,
            None => {
                if !*recover {
                    self.b.inline_error("expected a type path after :");
                }
            }
        }

        Some(self.b.done(marker, NodeData::TypeList { first_type }))
    }

    fn parse_type_header(&mut self) -> (NodeId, NodeId, NodeId) {
        let identifier = match self.try_parse_identifier(true) {
            Some(identifier) => identifier,
            None => {
                self.b.inline_error("expected an identifier");
                if self.b.token_kind() != TokenKind::Colon
                    && self.b.token_kind() != TokenKind::AngleBracketOpen
                {
                    self.advance_to_curly_open();
                }
                NodeId::INVALID
            }
        };

        let type_parameters = self.try_parse_type_parameter_list().unwrap_or(NodeId::INVALID);

        let mut base_recover = false;
        let base_list = self
            .try_parse_base_list(&mut base_recover)
            .unwrap_or(NodeId::INVALID);
        if base_recover {
            self.advance_to_curly_open();
        }

        (identifier, type_parameters, base_list)
    }

    pub(crate) fn try_parse_class_declaration(
        &mut self,
        marker: Marker,
        modifiers: NodeId,
        recover: &mut bool,
    ) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Class) {
            return None;
        }
        self.b.advance();

        let (identifier, type_parameters, base_list) = self.parse_type_header();

        let body = match self.try_parse_class_body() {
            Some(body) => body,
            None => {
                self.b.inline_error("expected a type body");
                *recover = true;
                NodeId::INVALID
            }
        };

        Some(self.b.done(
            marker,
            NodeData::ClassDeclaration {
                modifiers,
                identifier,
                type_parameters,
                base_list,
                body,
            },
        ))
    }

    pub(crate) fn try_parse_struct_declaration(
        &mut self,
        marker: Marker,
        modifiers: NodeId,
        recover: &mut bool,
    ) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Struct) {
            return None;
        }
        self.b.advance();

        let (identifier, type_parameters, base_list) = self.parse_type_header();

        let body = match self.try_parse_class_body() {
            Some(body) => body,
            None => {
                self.b.inline_error("expected a type body");
                *recover = true;
                NodeId::INVALID
            }
        };

        Some(self.b.done(
            marker,
            NodeData::StructDeclaration {
                modifiers,
                identifier,
                type_parameters,
                base_list,
                body,
            },
        ))
    }

    /// Interface declarations are recognized but not supported; the whole
    /// header becomes an error and the caller recovers past the body.
    pub(crate) fn try_parse_interface_declaration(
        &mut self,
        marker: Marker,
        modifiers: NodeId,
        recover: &mut bool,
    ) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Interface) {
            return None;
        }
        self.b.advance();

        let identifier = self.try_parse_identifier(true).unwrap_or(NodeId::INVALID);
        self.b.inline_error("interface declarations are not supported");
        *recover = true;

        Some(self.b.done(
            marker,
            NodeData::InterfaceDeclaration {
                modifiers,
                identifier,
            },
        ))
    }

    /// `enum_declaration ::= 'enum' identifier (':' type_path)? '{' members '}'`
    pub(crate) fn try_parse_enum_declaration(
        &mut self,
        marker: Marker,
        modifiers: NodeId,
        recover: &mut bool,
    ) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Enum) {
            return None;
        }
        self.b.advance();

        let mut base_type = NodeId::INVALID;
        let mut first_member = NodeId::INVALID;

        let identifier = match self.try_parse_identifier(true) {
            Some(identifier) => identifier,
            None => {
                self.b.inline_error("expected an enum name");
                if self.b.token_kind() != TokenKind::Colon
                    && self.b.token_kind() != TokenKind::CurlyBraceOpen
                {
                    *recover = true;
                    return Some(self.b.done(
                        marker,
                        NodeData::EnumDeclaration {
                            modifiers,
                            identifier: NodeId::INVALID,
                            base_type,
                            first_member,
                        },
                    ));
                }
                NodeId::INVALID
            }
        };

        if self.b.token_kind() == TokenKind::Colon {
            self.b.advance();
            match self.try_parse_type_path(recover) {
                Some(path) => base_type = path,
                None => {
                    self.b.inline_error("expected a backing type");
                    if self.b.token_kind() != TokenKind::CurlyBraceOpen {
                        *recover = true;
                        return Some(self.b.done(
                            marker,
                            NodeData::EnumDeclaration {
                                modifiers,
                                identifier,
                                base_type,
                                first_member,
                            },
                        ));
                    }
                }
            }
        }

        match self.b.try_sub_stream(TokenKind::CurlyBraceOpen) {
            Some(stream) => {
                self.b.push_stream(stream);
                first_member =
                    self.parse_comma_separated(true, |parser| parser.try_parse_enum_member());
                self.b.pop_stream();
            }
            None => {
                self.b.inline_error("expected an enum body");
                *recover = true;
            }
        }

        Some(self.b.done(
            marker,
            NodeData::EnumDeclaration {
                modifiers,
                identifier,
                base_type,
                first_member,
            },
        ))
    }

    /// `enum_member ::= identifier ('=' expression)?`
    fn try_parse_enum_member(&mut self) -> Option<NodeId> {
        let marker = self.b.mark();

        let Some(identifier) = self.try_parse_identifier(true) else {
            self.b.rollback(marker);
            return None;
        };

        let mut value = NodeId::INVALID;
        if self.b.token_kind() == TokenKind::Assign {
            self.b.advance();
            let mut recover = false;
            match self.try_parse_expression(&mut recover) {
                Some(expression) => value = expression,
                None => {
                    self.b.inline_error("expected an expression");
                }
            }
        }

        Some(self.b.done(marker, NodeData::EnumMember { identifier, value }))
    }

    /// `delegate_declaration ::= 'delegate' type_path identifier
    ///     type_parameter_list? formal_parameter_list ';'`
    pub(crate) fn try_parse_delegate_declaration(
        &mut self,
        marker: Marker,
        modifiers: NodeId,
        recover: &mut bool,
    ) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Delegate) {
            return None;
        }
        self.b.advance();

        let return_type = match self.try_parse_type_path(recover) {
            Some(path) => path,
            None => {
                self.b.inline_error("expected a delegate return type");
                *recover = true;
                NodeId::INVALID
            }
        };

        let identifier = match self.try_parse_identifier(true) {
            Some(identifier) => identifier,
            None => {
                self.b.inline_error("expected a delegate name");
                *recover = true;
                NodeId::INVALID
            }
        };

        let type_parameters = self.try_parse_type_parameter_list().unwrap_or(NodeId::INVALID);

        let parameters = match self.try_parse_formal_parameter_list(true) {
            Some(parameters) => parameters,
            None => {
                self.b.inline_error("expected a delegate parameter list");
                *recover = true;
                NodeId::INVALID
            }
        };

        *recover = *recover || !self.expect_semicolon();

        Some(self.b.done(
            marker,
            NodeData::DelegateDeclaration {
                modifiers,
                return_type,
                identifier,
                type_parameters,
                parameters,
            },
        ))
    }

    /// `class_body ::= '{' member_declaration* '}'`
    pub(crate) fn try_parse_class_body(&mut self) -> Option<NodeId> {
        let stream = self.b.try_sub_stream(TokenKind::CurlyBraceOpen)?;
        let marker = self.b.mark();
        self.b.push_stream(stream);

        let mut first_declaration = NodeId::INVALID;
        let mut tail = NodeId::INVALID;

        while !self.b.end_of_input() {
            if self.b.token_kind() == TokenKind::SemiColon {
                self.b.advance();
                continue;
            }

            // A stray brace-delimited region cannot be a member; wrap it so
            // the tree stays lossless and move on.
            if self.b.token_kind() == TokenKind::CurlyBraceOpen {
                let invalid = self.b.mark();
                let block = self.try_parse_block().unwrap_or(NodeId::INVALID);
                let declaration = self.b.done(invalid, NodeData::InvalidDeclaration { block });
                self.link(&mut first_declaration, &mut tail, declaration);
                continue;
            }

            let mut recover = false;
            match self.try_parse_member_declaration(&mut recover) {
                Some(declaration) => self.link(&mut first_declaration, &mut tail, declaration),
                None => recover = true,
            }

            if recover {
                let error = self.b.mark();
                'skip: while !self.b.end_of_input() {
                    let kind = self.b.token_kind();
                    if kind == TokenKind::CurlyBraceOpen || kind == TokenKind::SemiColon {
                        break;
                    }
                    match self.b.keyword() {
                        Some(
                            Keyword::Public
                            | Keyword::Export
                            | Keyword::Private
                            | Keyword::Internal
                            | Keyword::Protected
                            | Keyword::Class
                            | Keyword::Struct
                            | Keyword::Enum
                            | Keyword::Interface
                            | Keyword::Virtual
                            | Keyword::Void
                            | Keyword::Sealed
                            | Keyword::Abstract
                            | Keyword::Override,
                        ) => break 'skip,
                        _ => self.b.advance(),
                    }
                }
                self.b.error(error, "expected a member declaration");
            }
        }

        self.b.pop_stream();

        Some(self.b.done(marker, NodeData::Block { first_statement: first_declaration }))
    }

    /// Member dispatch: the keyword decides for `const`, `constructor`,
    /// `delegate` and nested types; everything else starts with a type
    /// path and is disambiguated by what follows the identifier.
    pub(crate) fn try_parse_member_declaration(&mut self, recover: &mut bool) -> Option<NodeId> {
        let marker = self.b.mark();

        let modifiers = self.try_parse_modifier_list().unwrap_or(NodeId::INVALID);

        match self.b.keyword() {
            Some(Keyword::Const) => {
                return self.try_parse_constant_declaration(marker, modifiers, recover);
            }
            Some(Keyword::Constructor) => {
                return self.try_parse_constructor_declaration(marker, modifiers, recover);
            }
            Some(Keyword::Delegate) => {
                return self.try_parse_delegate_declaration(marker, modifiers, recover);
            }
            Some(Keyword::Class) => {
                return self.try_parse_class_declaration(marker, modifiers, recover);
            }
            Some(Keyword::Struct) => {
                return self.try_parse_struct_declaration(marker, modifiers, recover);
            }
            Some(Keyword::Interface) => {
                return self.try_parse_interface_declaration(marker, modifiers, recover);
            }
            Some(Keyword::Enum) => {
                return self.try_parse_enum_declaration(marker, modifiers, recover);
            }
            _ => {}
        }

        let Some(type_path) = self.try_parse_type_path(recover) else {
            if modifiers.is_valid() {
                *recover = true;
                return Some(self.error_declaration(marker, "unexpected token"));
            }
            *recover = false;
            self.b.rollback(marker);
            return None;
        };

        if self.at_keyword(Keyword::This) {
            return match self.try_parse_indexer_declaration(marker, modifiers, type_path, recover)
            {
                Some(indexer) => Some(indexer),
                None => Some(self.error_declaration(marker, "expected an indexer declaration")),
            };
        }

        let Some(identifier) = self.try_parse_identifier(true) else {
            *recover = true;
            return Some(
                self.error_declaration(marker, "expected an identifier as part of a member declaration"),
            );
        };

        if let Some(method) =
            self.try_parse_method_member(marker, modifiers, type_path, identifier, recover)
        {
            return Some(method);
        }

        if let Some(property) =
            self.try_parse_property_declaration(marker, modifiers, type_path, identifier, recover)
        {
            return Some(property);
        }

        // Field parsing accepts a missing terminator, so it is total here.
        self.try_parse_field_declaration(marker, modifiers, type_path, identifier, recover)
    }

    /// `constant_declaration ::= 'const' type_path identifier '=' expression ';'`
    pub(crate) fn try_parse_constant_declaration(
        &mut self,
        marker: Marker,
        modifiers: NodeId,
        recover: &mut bool,
    ) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Const) {
            return None;
        }
        self.b.advance();

        let type_path = match self.try_parse_type_path(recover) {
            Some(path) => path,
            None => {
                self.b.inline_error("expected a constant type");
                *recover = true;
                NodeId::INVALID
            }
        };

        let identifier = match self.try_parse_identifier(true) {
            Some(identifier) => identifier,
            None => {
                self.b.inline_error("expected a constant name");
                *recover = true;
                NodeId::INVALID
            }
        };

        let mut value = NodeId::INVALID;
        if self.b.token_kind() == TokenKind::Assign {
            self.b.advance();
            match self.try_parse_expression(recover) {
                Some(expression) => value = expression,
                None => {
                    self.b.inline_error("expected a constant value expression");
                    *recover = true;
                }
            }
        } else {
            self.b.inline_error("constants require an initializer");
        }

        *recover = *recover || !self.expect_semicolon();

        Some(self.b.done(
            marker,
            NodeData::ConstantDeclaration {
                modifiers,
                type_path,
                identifier,
                value,
            },
        ))
    }

    /// `constructor_declaration ::= 'constructor' formal_parameter_list block`
    pub(crate) fn try_parse_constructor_declaration(
        &mut self,
        marker: Marker,
        modifiers: NodeId,
        recover: &mut bool,
    ) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Constructor) {
            return None;
        }
        self.b.advance();

        let parameters = match self.try_parse_formal_parameter_list(true) {
            Some(parameters) => parameters,
            None => {
                self.b.inline_error("expected a constructor parameter list");
                *recover = true;
                NodeId::INVALID
            }
        };

        let body = match self.try_parse_block() {
            Some(body) => body,
            None => {
                self.b.inline_error("expected a constructor body");
                *recover = true;
                NodeId::INVALID
            }
        };

        Some(self.b.done(
            marker,
            NodeData::ConstructorDeclaration {
                modifiers,
                parameters,
                body,
            },
        ))
    }

    /// `indexer_declaration ::= type_path 'this' '[' formal_parameter
    ///     (',' formal_parameter)* ']' property_body`
    pub(crate) fn try_parse_indexer_declaration(
        &mut self,
        marker: Marker,
        modifiers: NodeId,
        type_path: NodeId,
        recover: &mut bool,
    ) -> Option<NodeId> {
        if !self.at_keyword(Keyword::This) {
            return None;
        }
        self.b.advance();

        let mut first_parameter = NodeId::INVALID;
        match self.b.try_sub_stream(TokenKind::SquareBraceOpen) {
            Some(stream) => {
                self.b.push_stream(stream);
                first_parameter = self.parse_comma_separated(false, |parser| {
                    parser.try_parse_formal_parameter(false)
                });
                self.b.pop_stream();
            }
            None => {
                self.b.inline_error("expected an indexer parameter list");
                *recover = true;
            }
        }

        let mut getter = NodeId::INVALID;
        let mut setter = NodeId::INVALID;
        if !self.parse_accessor_body(&mut getter, &mut setter, recover) {
            self.b.inline_error("expected an indexer body");
            *recover = true;
        }

        Some(self.b.done(
            marker,
            NodeData::IndexerDeclaration {
                modifiers,
                type_path,
                first_parameter,
                getter,
                setter,
            },
        ))
    }

    /// `method_member ::= type_path identifier type_parameter_list?
    ///     formal_parameter_list (block | '=>' expression ';' | ';')`
    pub(crate) fn try_parse_method_member(
        &mut self,
        marker: Marker,
        modifiers: NodeId,
        return_type: NodeId,
        identifier: NodeId,
        recover: &mut bool,
    ) -> Option<NodeId> {
        let type_parameters = if self.b.token_kind() == TokenKind::AngleBracketOpen {
            self.try_parse_type_parameter_list().unwrap_or(NodeId::INVALID)
        } else {
            NodeId::INVALID
        };

        if self.b.token_kind() != TokenKind::OpenParen {
            if type_parameters.is_valid() {
                // `T name<...>` without a parameter list cannot be a field
                // or property; treat it as a broken method.
                self.b.inline_error("expected a method parameter list");
                *recover = true;
                return Some(self.b.done(
                    marker,
                    NodeData::MethodDeclaration {
                        modifiers,
                        return_type,
                        identifier,
                        type_parameters,
                        parameters: NodeId::INVALID,
                        body: NodeId::INVALID,
                        arrow_body: NodeId::INVALID,
                    },
                ));
            }
            return None;
        }

        let parameters = self
            .try_parse_formal_parameter_list(true)
            .unwrap_or(NodeId::INVALID);

        let mut body = NodeId::INVALID;
        let mut arrow_body = NodeId::INVALID;

        match self.b.token_kind() {
            TokenKind::FatArrow => {
                self.b.advance();
                match self.try_parse_throwable_expression(recover) {
                    Some(expression) => arrow_body = expression,
                    None => {
                        self.b.inline_error("expected an expression after =>");
                        *recover = true;
                    }
                }
                *recover = *recover || !self.expect_semicolon();
            }
            TokenKind::SemiColon => {
                // Abstract/extern methods have no body.
                self.b.advance();
            }
            _ => match self.try_parse_block() {
                Some(block) => body = block,
                None => {
                    self.b.inline_error("expected a method body");
                    *recover = true;
                }
            },
        }

        Some(self.b.done(
            marker,
            NodeData::MethodDeclaration {
                modifiers,
                return_type,
                identifier,
                type_parameters,
                parameters,
                body,
                arrow_body,
            },
        ))
    }

    /// `property_declaration ::= type_path identifier
    ///     ('=>' expression ';' | '{' accessors '}')`
    pub(crate) fn try_parse_property_declaration(
        &mut self,
        marker: Marker,
        modifiers: NodeId,
        type_path: NodeId,
        identifier: NodeId,
        recover: &mut bool,
    ) -> Option<NodeId> {
        let mut getter = NodeId::INVALID;
        let mut setter = NodeId::INVALID;

        if !self.parse_accessor_body(&mut getter, &mut setter, recover) {
            return None;
        }

        Some(self.b.done(
            marker,
            NodeData::PropertyDeclaration {
                modifiers,
                type_path,
                identifier,
                getter,
                setter,
            },
        ))
    }

    /// Shared accessor body for properties and indexers: either an inline
    /// `=> expression ;` getter or a braced accessor list. Returns false
    /// without consuming anything if neither form is present.
    fn parse_accessor_body(
        &mut self,
        getter: &mut NodeId,
        setter: &mut NodeId,
        recover: &mut bool,
    ) -> bool {
        if self.b.token_kind() == TokenKind::FatArrow {
            let accessor = self.b.mark();
            self.b.advance();
            let mut expression = NodeId::INVALID;
            match self.try_parse_expression(recover) {
                Some(value) => expression = value,
                None => {
                    self.b.inline_error("expected a property getter expression");
                    *recover = true;
                }
            }
            *recover = *recover || !self.expect_semicolon();
            *getter = self.b.done(
                accessor,
                NodeData::PropertyGetter {
                    visibility: Visibility::Unspecified,
                    expression,
                    block: NodeId::INVALID,
                },
            );
            return true;
        }

        let Some(stream) = self.b.try_sub_stream(TokenKind::CurlyBraceOpen) else {
            return false;
        };

        self.b.push_stream(stream);

        if self.b.end_of_input() {
            self.b.inline_error("expected at least one getter or setter");
        }

        let mut found_getter = false;
        let mut found_setter = false;

        while !self.b.end_of_input() {
            let visibility = self.try_parse_visibility();

            match self.b.keyword() {
                Some(Keyword::Get) => {
                    if found_getter {
                        self.b.inline_error("duplicate getter");
                    }
                    found_getter = true;

                    if self.b.peek(1).kind == TokenKind::SemiColon {
                        let accessor = self.b.mark();
                        self.b.advance();
                        self.b.advance();
                        *getter = self.b.done(
                            accessor,
                            NodeData::PropertyGetter {
                                visibility,
                                expression: NodeId::INVALID,
                                block: NodeId::INVALID,
                            },
                        );
                        continue;
                    }

                    let mut accessor_recover = false;
                    if let Some(node) = self.try_parse_property_getter(visibility, &mut accessor_recover)
                    {
                        *getter = node;
                    }
                    if accessor_recover {
                        self.skip_to_accessor_start();
                    }
                }
                Some(Keyword::Set) => {
                    if found_setter {
                        self.b.inline_error("duplicate setter");
                    }
                    found_setter = true;

                    if self.b.peek(1).kind == TokenKind::SemiColon {
                        let accessor = self.b.mark();
                        self.b.advance();
                        self.b.advance();
                        *setter = self.b.done(
                            accessor,
                            NodeData::PropertySetter {
                                visibility,
                                value_identifier: NodeId::INVALID,
                                expression: NodeId::INVALID,
                                block: NodeId::INVALID,
                            },
                        );
                        continue;
                    }

                    let mut accessor_recover = false;
                    if let Some(node) = self.try_parse_property_setter(visibility, &mut accessor_recover)
                    {
                        *setter = node;
                    }
                    if accessor_recover {
                        self.skip_to_accessor_start();
                    }
                }
                _ => {
                    self.b.inline_error("expected a getter or setter declaration");
                    self.skip_to_accessor_start();
                }
            }
        }

        self.b.pop_stream();
        true
    }

    fn skip_to_accessor_start(&mut self) {
        while !self.b.end_of_input() {
            match self.b.keyword() {
                Some(
                    Keyword::Public
                    | Keyword::Export
                    | Keyword::Private
                    | Keyword::Protected
                    | Keyword::Internal
                    | Keyword::Get
                    | Keyword::Set,
                ) => break,
                _ => self.b.advance(),
            }
        }
    }

    /// `property_getter ::= 'get' (';' | '=>' expression ';' | block)`
    fn try_parse_property_getter(
        &mut self,
        visibility: Visibility,
        recover: &mut bool,
    ) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Get) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let mut expression = NodeId::INVALID;
        let mut block = NodeId::INVALID;

        if self.b.token_kind() == TokenKind::FatArrow {
            self.b.advance();
            match self.try_parse_expression(recover) {
                Some(value) => expression = value,
                None => {
                    self.b.inline_error("expected a property getter expression");
                    *recover = true;
                }
            }
            if self.b.token_kind() == TokenKind::SemiColon {
                self.b.advance();
            } else {
                self.b.inline_error("Expected ';'");
                *recover = true;
            }
        } else if let Some(body) = self.try_parse_block() {
            block = body;
        } else {
            *recover = true;
        }

        Some(self.b.done(
            marker,
            NodeData::PropertyGetter {
                visibility,
                expression,
                block,
            },
        ))
    }

    /// `property_setter ::= 'set' ('|' identifier '|')?
    ///     (';' | '=>' expression ';' | block)`
    fn try_parse_property_setter(
        &mut self,
        visibility: Visibility,
        recover: &mut bool,
    ) -> Option<NodeId> {
        if !self.at_keyword(Keyword::Set) {
            return None;
        }
        let marker = self.b.mark();
        self.b.advance();

        let mut value_identifier = NodeId::INVALID;
        let mut expression = NodeId::INVALID;
        let mut block = NodeId::INVALID;

        // `set |named| { ... }` renames the implicit value parameter.
        if self.b.token_kind() == TokenKind::BinaryOr {
            self.b.advance();

            match self.try_parse_identifier(true) {
                Some(identifier) => value_identifier = identifier,
                None => {
                    self.b.inline_error("expected a setter value identifier");
                }
            }

            if self.b.token_kind() == TokenKind::BinaryOr {
                self.b.advance();
            } else {
                self.b.inline_error("expected a closing | after setter value identifier");
                if self.b.token_kind() != TokenKind::FatArrow
                    && self.b.token_kind() != TokenKind::CurlyBraceOpen
                {
                    *recover = true;
                    return Some(self.b.done(
                        marker,
                        NodeData::PropertySetter {
                            visibility,
                            value_identifier,
                            expression,
                            block,
                        },
                    ));
                }
            }
        }

        if self.b.token_kind() == TokenKind::FatArrow {
            self.b.advance();
            match self.try_parse_expression(recover) {
                Some(value) => expression = value,
                None => {
                    self.b.inline_error("expected a property setter expression");
                    *recover = true;
                }
            }
            if self.b.token_kind() == TokenKind::SemiColon {
                self.b.advance();
            } else {
                self.b.inline_error("Expected ';'");
                *recover = true;
            }
        } else if let Some(body) = self.try_parse_block() {
            block = body;
        } else {
            *recover = true;
        }

        Some(self.b.done(
            marker,
            NodeData::PropertySetter {
                visibility,
                value_identifier,
                expression,
                block,
            },
        ))
    }

    /// `field_declaration ::= type_path identifier ('=' expression)? ';'`
    pub(crate) fn try_parse_field_declaration(
        &mut self,
        marker: Marker,
        modifiers: NodeId,
        type_path: NodeId,
        identifier: NodeId,
        recover: &mut bool,
    ) -> Option<NodeId> {
        let mut initializer = NodeId::INVALID;

        match self.b.token_kind() {
            TokenKind::Assign => {
                self.b.advance();

                match self.try_parse_expression(recover) {
                    Some(expression) => initializer = expression,
                    None => {
                        self.b.inline_error("expected an expression after field assignment");
                    }
                }

                // Recovery, if needed, is the class body's job.
                if !*recover {
                    self.expect_semicolon();
                }
            }
            TokenKind::SemiColon => {
                self.b.advance();
            }
            _ => {
                // `int x int y;` — the field is complete apart from its
                // terminator; report it and let the next member parse
                // cleanly from the current token.
                self.b.inline_error("Expected ';'");
            }
        }

        Some(self.b.done(
            marker,
            NodeData::FieldDeclaration {
                modifiers,
                type_path,
                identifier,
                initializer,
            },
        ))
    }

    /// `formal_parameter_list ::= '(' (formal_parameter (',' formal_parameter)*)? ')'`
    pub(crate) fn try_parse_formal_parameter_list(
        &mut self,
        allow_default_values: bool,
    ) -> Option<NodeId> {
        let stream = self.b.try_sub_stream(TokenKind::OpenParen)?;
        let marker = self.b.mark();
        self.b.push_stream(stream);

        let first_parameter = if stream.is_empty() {
            NodeId::INVALID
        } else {
            self.parse_comma_separated(false, |parser| {
                parser.try_parse_formal_parameter(allow_default_values)
            })
        };

        self.b.pop_stream();
        Some(self.b.done(marker, NodeData::FormalParameterList { first_parameter }))
    }

    /// `formal_parameter ::= ('temp' | 'scoped')? ('ref' | 'out')?
    ///     type_path identifier ('=' expression)?`
    ///
    /// Always recovers to the next comma or the stream end on failure.
    pub(crate) fn try_parse_formal_parameter(&mut self, allow_default_value: bool) -> Option<NodeId> {
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

        let mut local_recover = false;
        let Some(type_path) = self.try_parse_type_path(&mut local_recover) else {
            if start != self.b.token_index() {
                let marker = self.b.mark_from_token(start);
                self.recover_to_comma_or_end("expected a parameter type");
                return Some(self.b.done(
                    marker,
                    NodeData::FormalParameter {
                        storage,
                        pass_by,
                        type_path: NodeId::INVALID,
                        identifier: NodeId::INVALID,
                        default_value: NodeId::INVALID,
                    },
                ));
            }
            return None;
        };

        let marker = self.b.mark_from_token(start);

        let Some(identifier) = self.try_parse_identifier(true) else {
            self.recover_to_comma_or_end("expected parameter to have a name");
            return Some(self.b.done(
                marker,
                NodeData::FormalParameter {
                    storage,
                    pass_by,
                    type_path,
                    identifier: NodeId::INVALID,
                    default_value: NodeId::INVALID,
                },
            ));
        };

        let mut default_value = NodeId::INVALID;
        if self.b.token_kind() == TokenKind::Assign {
            if !allow_default_value {
                self.b.inline_error("default values are not allowed here");
            }
            self.b.advance();

            let mut expression_recover = false;
            match self.try_parse_expression(&mut expression_recover) {
                Some(expression) => default_value = expression,
                None => {
                    self.recover_to_comma_or_end(
                        "expected a default value expression after `=` when defining a parameter",
                    );
                }
            }
        }

        Some(self.b.done(
            marker,
            NodeData::FormalParameter {
                storage,
                pass_by,
                type_path,
                identifier,
                default_value,
            },
        ))
    }
}
