//! Top-level declaration parsing: parsers, controls, externs, packages,
//! actions, tables, and instantiations.

use p4c_lex::Token;

use crate::ast::{NodeId, NodeKind, ParamDirection};
use crate::parser::{Parser, SpanExt};

impl<'a> Parser<'a> {
    pub(crate) fn parse_top_level_declaration(&mut self) -> Option<NodeId> {
        match self.current().clone() {
            Token::Parser => self.parse_parser_decl_or_type(),
            Token::Control => self.parse_control_decl_or_type(),
            Token::Extern => self.parse_extern_decl(),
            Token::Package => self.parse_package_type_decl(),
            Token::Header => self.parse_struct_like_decl(Token::Header),
            Token::HeaderUnion => self.parse_struct_like_decl(Token::HeaderUnion),
            Token::Struct => self.parse_struct_like_decl(Token::Struct),
            Token::Enum => self.parse_enum_decl(),
            Token::Typedef => self.parse_typedef_decl(),
            Token::Error => self.parse_error_decl(),
            Token::MatchKind => self.parse_match_kind_decl(),
            Token::Const => self.parse_variable_declaration(true),
            Token::Action => self.parse_action_decl(),
            Token::Table => self.parse_table_decl(),
            _ => self.parse_instantiation(),
        }
    }

    // ---- parameter lists ----

    pub(crate) fn parse_parameter_list(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                params.push(self.parse_parameter()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::ParameterList { params: params.clone() }, span, &params))
    }

    fn parse_parameter(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let direction = match self.current() {
            Token::In => {
                self.advance();
                ParamDirection::In
            }
            Token::Out => {
                self.advance();
                ParamDirection::Out
            }
            Token::InOut => {
                self.advance();
                ParamDirection::InOut
            }
            _ => ParamDirection::None,
        };
        let ty = self.parse_type_ref()?;
        let name = self.expect_name()?;
        let init_expr = if self.eat(&Token::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let span = start.merge(self.current_span());
        let mut children = vec![ty, name];
        if let Some(e) = init_expr {
            children.push(e);
        }
        Some(self.ast.alloc(NodeKind::Parameter { direction, name, ty, init_expr }, span, &children))
    }

    fn empty_parameter_list(&mut self) -> NodeId {
        let span = self.current_span();
        self.ast.alloc(NodeKind::ParameterList { params: vec![] }, span, &[])
    }

    /// Most bodies accept an optional second, parenthesized parameter list
    /// (constructor parameters) between the signature and the opening brace.
    fn parse_optional_ctor_params(&mut self) -> Option<NodeId> {
        if self.check(&Token::LParen) {
            self.parse_parameter_list()
        } else {
            Some(self.empty_parameter_list())
        }
    }

    // ---- package ----

    fn parse_package_type_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `package`
        let name = self.expect_name()?;
        let params = self.parse_parameter_list()?;
        self.expect(Token::Semicolon)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::PackageTypeDecl { name, params }, span, &[name, params]))
    }

    // ---- instantiation ----

    /// `typeRef '(' argumentList ')' name ';'`
    fn parse_instantiation(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let ty = self.parse_type_ref()?;
        let args = self.parse_argument_list()?;
        let name = self.expect_name()?;
        self.expect(Token::Semicolon)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::Instantiation { name, ty, args }, span, &[name, ty, args]))
    }

    /// Shared by parser/control local elements: either a constant/variable
    /// declaration or an instantiation, disambiguated by whether `(` follows
    /// the type reference.
    fn parse_decl_or_instantiation(&mut self) -> Option<NodeId> {
        if self.check(&Token::Const) {
            return self.parse_variable_declaration(true);
        }
        let start = self.current_span();
        let ty = self.parse_type_ref()?;
        if self.check(&Token::LParen) {
            let args = self.parse_argument_list()?;
            let name = self.expect_name()?;
            self.expect(Token::Semicolon)?;
            let span = start.merge(self.current_span());
            Some(self.ast.alloc(NodeKind::Instantiation { name, ty, args }, span, &[name, ty, args]))
        } else {
            let name = self.expect_name()?;
            let init_expr = if self.eat(&Token::Eq) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            self.expect(Token::Semicolon)?;
            let span = start.merge(self.current_span());
            let mut children = vec![ty, name];
            if let Some(e) = init_expr {
                children.push(e);
            }
            Some(self.ast.alloc(
                NodeKind::VariableDeclaration { ty, name, init_expr, is_const: false },
                span,
                &children,
            ))
        }
    }

    // ---- extern ----

    fn parse_extern_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `extern`
        let is_object = matches!(self.current(), Token::Ident(_))
            && matches!(self.tokens_ahead(1), Some(Token::LBrace));
        let decl = if is_object {
            self.parse_extern_type_decl()?
        } else {
            self.parse_function_prototype()?
        };
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::ExternDecl { decl }, span, &[decl]))
    }

    fn parse_extern_type_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let name = self.expect_name()?;
        self.expect(Token::LBrace)?;
        let mut protos = Vec::new();
        while !self.check(&Token::RBrace) && !self.at_eof() {
            protos.push(self.parse_function_prototype()?);
        }
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());
        let method_protos = self.ast.alloc(NodeKind::MethodPrototypes { protos: protos.clone() }, span, &protos);
        Some(self.ast.alloc(
            NodeKind::ExternTypeDecl { name, method_protos },
            span,
            &[name, method_protos],
        ))
    }

    /// A method prototype: `[abstract] [typeRef|void] name '(' params ')' ';'`,
    /// or, when its name matches the enclosing extern's and no return type is
    /// written, a constructor prototype (`return_type: None`).
    fn parse_function_prototype(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.eat(&Token::Abstract);
        let is_constructor =
            matches!(self.current(), Token::Ident(_)) && matches!(self.tokens_ahead(1), Some(Token::LParen));
        let return_type = if is_constructor {
            None
        } else if self.check(&Token::Void) {
            let vstart = self.current_span();
            self.advance();
            Some(self.ast.alloc(NodeKind::BaseTypeVoid, vstart, &[]))
        } else {
            Some(self.parse_type_ref()?)
        };
        let name = self.expect_name()?;
        let params = self.parse_parameter_list()?;
        self.expect(Token::Semicolon)?;
        let span = start.merge(self.current_span());
        let mut children = vec![name, params];
        if let Some(rt) = return_type {
            children.push(rt);
        }
        Some(self.ast.alloc(
            NodeKind::FunctionPrototype { return_type, name, params },
            span,
            &children,
        ))
    }

    // ---- parser ----

    fn parse_parser_type_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `parser`
        let name = self.expect_name()?;
        let params = self.parse_parameter_list()?;
        let span = start.merge(self.current_span());
        let method_protos = self.ast.alloc(NodeKind::MethodPrototypes { protos: vec![] }, span, &[]);
        Some(self.ast.alloc(
            NodeKind::ParserTypeDecl { name, params, method_protos },
            span,
            &[name, params, method_protos],
        ))
    }

    fn parse_parser_decl_or_type(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let proto = self.parse_parser_type_decl()?;
        if self.eat(&Token::Semicolon) {
            return Some(proto);
        }
        let ctor_params = self.parse_optional_ctor_params()?;
        self.expect(Token::LBrace)?;
        let local_elements = self.parse_parser_local_elements()?;
        let states = self.parse_parser_states()?;
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(
            NodeKind::ParserDecl { proto, ctor_params, local_elements, states },
            span,
            &[proto, ctor_params, local_elements, states],
        ))
    }

    fn parse_parser_local_elements(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let mut elements = Vec::new();
        while !self.check(&Token::State) && !self.at_eof() {
            elements.push(self.parse_decl_or_instantiation()?);
        }
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(
            NodeKind::ParserLocalElements { elements: elements.clone() },
            span,
            &elements,
        ))
    }

    fn parse_parser_states(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let mut states = Vec::new();
        while self.check(&Token::State) {
            states.push(self.parse_parser_state()?);
        }
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::ParserStates { states: states.clone() }, span, &states))
    }

    fn parse_parser_state(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `state`
        let name = self.expect_name()?;
        self.expect(Token::LBrace)?;
        let list_start = self.current_span();
        let mut stmts = Vec::new();
        while !self.check(&Token::Transition) && !self.check(&Token::RBrace) && !self.at_eof() {
            stmts.push(self.parse_parser_statement()?);
        }
        let list_span = list_start.merge(self.current_span());
        let stmt_list = self.ast.alloc(NodeKind::ParserStatements { stmts: stmts.clone() }, list_span, &stmts);
        let transition_stmt = if self.check(&Token::Transition) {
            Some(self.parse_transition_statement()?)
        } else {
            None
        };
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());
        let mut children = vec![name, stmt_list];
        if let Some(t) = transition_stmt {
            children.push(t);
        }
        Some(self.ast.alloc(
            NodeKind::ParserState { name, stmt_list, transition_stmt },
            span,
            &children,
        ))
    }

    /// A statement inside a parser state: like an ordinary statement, but a
    /// nested `{ }` is a [`NodeKind::ParserBlockStatement`] rather than a
    /// general [`NodeKind::BlockStatement`].
    fn parse_parser_statement(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        if self.check(&Token::LBrace) {
            self.advance();
            let mut items = Vec::new();
            while !self.check(&Token::RBrace) && !self.at_eof() {
                items.push(self.parse_parser_statement()?);
            }
            self.expect(Token::RBrace)?;
            let span = start.merge(self.current_span());
            let stmt_list = self.ast.alloc(NodeKind::ParserStatements { stmts: items.clone() }, span, &items);
            Some(self.ast.alloc(NodeKind::ParserBlockStatement { stmt_list }, span, &[stmt_list]))
        } else {
            self.parse_statement()
        }
    }

    // ---- control ----

    fn parse_control_type_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `control`
        let name = self.expect_name()?;
        let params = self.parse_parameter_list()?;
        let span = start.merge(self.current_span());
        let method_protos = self.ast.alloc(NodeKind::MethodPrototypes { protos: vec![] }, span, &[]);
        Some(self.ast.alloc(
            NodeKind::ControlTypeDecl { name, params, method_protos },
            span,
            &[name, params, method_protos],
        ))
    }

    fn parse_control_decl_or_type(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let proto = self.parse_control_type_decl()?;
        if self.eat(&Token::Semicolon) {
            return Some(proto);
        }
        let ctor_params = self.parse_optional_ctor_params()?;
        self.expect(Token::LBrace)?;
        let decls_start = self.current_span();
        let mut decls = Vec::new();
        while !self.check(&Token::Apply) && !self.at_eof() {
            decls.push(self.parse_control_local_declaration()?);
        }
        let decls_span = decls_start.merge(self.current_span());
        let local_decls = self.ast.alloc(
            NodeKind::ControlLocalDeclarations { decls: decls.clone() },
            decls_span,
            &decls,
        );
        self.expect(Token::Apply)?;
        let apply_stmt = self.parse_block_statement()?;
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(
            NodeKind::ControlDecl { proto, ctor_params, local_decls, apply_stmt },
            span,
            &[proto, ctor_params, local_decls, apply_stmt],
        ))
    }

    fn parse_control_local_declaration(&mut self) -> Option<NodeId> {
        match self.current() {
            Token::Action => self.parse_action_decl(),
            Token::Table => self.parse_table_decl(),
            _ => self.parse_decl_or_instantiation(),
        }
    }

    // ---- action / table ----

    fn parse_action_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `action`
        let name = self.expect_name()?;
        let params = self.parse_parameter_list()?;
        let stmt = self.parse_block_statement()?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::ActionDecl { name, params, stmt }, span, &[name, params, stmt]))
    }

    fn parse_table_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `table`
        let name = self.expect_name()?;
        self.expect(Token::LBrace)?;
        let mut props = Vec::new();
        while !self.check(&Token::RBrace) && !self.at_eof() {
            match self.parse_table_property() {
                Some(id) => props.push(id),
                None => self.synchronize(&[Token::RBrace]),
            }
        }
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());
        let prop_list = self.ast.alloc(NodeKind::TablePropertyList { props: props.clone() }, span, &props);
        Some(self.ast.alloc(NodeKind::TableDecl { name, prop_list }, span, &[name, prop_list]))
    }

    /// Only `key` and `actions` are recognized; both are contextual
    /// identifiers rather than reserved tokens, matched by spelling like
    /// `tuple` in `types.rs`.
    fn parse_table_property(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        match self.current().clone() {
            Token::Ident(sym) if sym.as_str() == "key" => self.parse_key_property(),
            Token::Ident(sym) if sym.as_str() == "actions" => self.parse_actions_property(),
            other => {
                self.error_at(start, format!("expected table property `key` or `actions`, found {:?}", other));
                None
            }
        }
    }

    fn parse_key_property(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `key`
        self.expect(Token::Eq)?;
        self.expect(Token::LBrace)?;
        let mut elems = Vec::new();
        while !self.check(&Token::RBrace) && !self.at_eof() {
            elems.push(self.parse_key_element()?);
        }
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());
        let keyelem_list = self.ast.alloc(NodeKind::KeyElementList { elems: elems.clone() }, span, &elems);
        Some(self.ast.alloc(NodeKind::KeyProperty { keyelem_list }, span, &[keyelem_list]))
    }

    fn parse_key_element(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let expr = self.parse_expr()?;
        self.expect(Token::Colon)?;
        let match_kind = self.expect_name()?;
        self.expect(Token::Semicolon)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::KeyElement { expr, match_kind }, span, &[expr, match_kind]))
    }

    fn parse_actions_property(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `actions`
        self.expect(Token::Eq)?;
        self.expect(Token::LBrace)?;
        let mut actions = Vec::new();
        while !self.check(&Token::RBrace) && !self.at_eof() {
            actions.push(self.parse_action_ref()?);
        }
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());
        let action_list = self.ast.alloc(NodeKind::ActionList { actions: actions.clone() }, span, &actions);
        Some(self.ast.alloc(NodeKind::ActionsProperty { action_list }, span, &[action_list]))
    }

    fn parse_action_ref(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let name = self.expect_name()?;
        let args = if self.check(&Token::LParen) {
            Some(self.parse_argument_list()?)
        } else {
            None
        };
        self.expect(Token::Semicolon)?;
        let span = start.merge(self.current_span());
        let mut children = vec![name];
        if let Some(a) = args {
            children.push(a);
        }
        Some(self.ast.alloc(NodeKind::ActionRef { name, args }, span, &children))
    }
}
