//! Statement parsing: blocks, assignment, control flow, direct application.

use p4c_lex::Token;

use crate::ast::{NodeId, NodeKind};
use crate::parser::{Parser, SpanExt};

impl<'a> Parser<'a> {
    pub(crate) fn parse_block_statement(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.expect(Token::LBrace)?;
        let stmt_list = self.parse_statement_or_decl_list()?;
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::BlockStatement { stmt_list }, span, &[stmt_list]))
    }

    fn parse_statement_or_decl_list(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let mut items = Vec::new();
        while !self.check(&Token::RBrace) && !self.at_eof() {
            match self.parse_statement() {
                Some(id) => items.push(id),
                None => self.synchronize(&[Token::RBrace, Token::Semicolon]),
            }
        }
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::StatementOrDeclList { items: items.clone() }, span, &items))
    }

    pub(crate) fn parse_statement(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        match self.current().clone() {
            Token::Semicolon => {
                self.advance();
                Some(self.ast.alloc(NodeKind::EmptyStatement, start, &[]))
            }
            Token::LBrace => self.parse_block_statement(),
            Token::If => self.parse_conditional_statement(),
            Token::Switch => self.parse_switch_statement(),
            Token::Return => self.parse_return_statement(),
            Token::Const => self.parse_variable_declaration(true),
            Token::Bool | Token::Int | Token::Bit | Token::Varbit | Token::StringType => {
                self.parse_variable_declaration(false)
            }
            Token::Ident(sym) if sym.as_str() == "exit" => {
                self.advance();
                self.expect(Token::Semicolon)?;
                let span = start.merge(self.current_span());
                Some(self.ast.alloc(NodeKind::ExitStatement, span, &[]))
            }
            Token::Ident(_) if self.peek_is_tuple_type_lookahead() => {
                self.parse_variable_declaration(false)
            }
            Token::Ident(_) if self.looks_like_direct_application() => {
                self.parse_direct_application()
            }
            Token::Ident(_) if matches!(self.tokens_ahead(1), Some(Token::Ident(_))) => {
                self.parse_variable_declaration(false)
            }
            _ => self.parse_expr_or_assignment_statement(),
        }
    }

    /// `tuple` is an ordinary identifier token, so a tuple-typed local
    /// declaration (`tuple<bit<8>,bit<8>> t;`) needs the same spelling check
    /// `types.rs` uses for tuple type references.
    fn peek_is_tuple_type_lookahead(&self) -> bool {
        matches!(self.current(), Token::Ident(sym) if sym.as_str() == "tuple")
    }

    /// `name '.' apply '(' ... ')' ';'` — applying an instantiated control or
    /// table directly, without binding its result to anything.
    fn looks_like_direct_application(&self) -> bool {
        matches!(self.tokens_ahead(1), Some(Token::Dot)) && matches!(self.tokens_ahead(2), Some(Token::Apply))
    }

    fn parse_direct_application(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let name = self.expect_name()?;
        self.expect(Token::Dot)?;
        self.expect(Token::Apply)?;
        let args = self.parse_argument_list()?;
        self.expect(Token::Semicolon)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::DirectApplication { name, args }, span, &[name, args]))
    }

    fn parse_conditional_statement(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `if`
        self.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(Token::RParen)?;
        let stmt = self.parse_statement()?;
        let else_stmt = if self.eat(&Token::Else) {
            Some(self.parse_statement()?)
        } else {
            None
        };
        let span = start.merge(self.current_span());
        let mut children = vec![cond, stmt];
        if let Some(e) = else_stmt {
            children.push(e);
        }
        Some(self.ast.alloc(NodeKind::ConditionalStatement { cond, stmt, else_stmt }, span, &children))
    }

    fn parse_switch_statement(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `switch`
        self.expect(Token::LParen)?;
        let expr = self.parse_expr()?;
        self.expect(Token::RParen)?;
        self.expect(Token::LBrace)?;
        let mut cases = Vec::new();
        while !self.check(&Token::RBrace) && !self.at_eof() {
            cases.push(self.parse_switch_case()?);
        }
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());
        let case_list = self.ast.alloc(NodeKind::SwitchCases { cases: cases.clone() }, span, &cases);
        Some(self.ast.alloc(NodeKind::SwitchStatement { expr, cases: case_list }, span, &[expr, case_list]))
    }

    fn parse_switch_case(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let label_node = if self.check(&Token::Default) {
            self.advance();
            self.ast.alloc(NodeKind::Default, start, &[])
        } else {
            self.expect_name()?
        };
        let label = self.ast.alloc(NodeKind::SwitchLabel { label: label_node }, start, &[label_node]);
        self.expect(Token::Colon)?;
        let stmt = if self.check(&Token::LBrace) {
            Some(self.parse_block_statement()?)
        } else {
            None
        };
        let span = start.merge(self.current_span());
        let mut children = vec![label];
        if let Some(s) = stmt {
            children.push(s);
        }
        Some(self.ast.alloc(NodeKind::SwitchCase { label, stmt }, span, &children))
    }

    fn parse_return_statement(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `return`
        let expr = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(Token::Semicolon)?;
        let span = start.merge(self.current_span());
        let children: Vec<NodeId> = expr.into_iter().collect();
        Some(self.ast.alloc(NodeKind::ReturnStatement { expr }, span, &children))
    }

    /// `[const] <typeRef> <name> [= expr];`
    pub(crate) fn parse_variable_declaration(&mut self, forced_const: bool) -> Option<NodeId> {
        let start = self.current_span();
        let is_const = if forced_const {
            self.advance(); // `const`
            true
        } else {
            false
        };
        let ty = self.parse_type_ref()?;
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
            NodeKind::VariableDeclaration { ty, name, init_expr, is_const },
            span,
            &children,
        ))
    }

    fn parse_expr_or_assignment_statement(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let lhs = self.parse_expr()?;
        if self.eat(&Token::Eq) {
            let rhs = self.parse_expr()?;
            self.expect(Token::Semicolon)?;
            let span = start.merge(self.current_span());
            Some(self.ast.alloc(NodeKind::AssignmentStatement { lhs, rhs }, span, &[lhs, rhs]))
        } else {
            self.expect(Token::Semicolon)?;
            Some(lhs)
        }
    }
}
