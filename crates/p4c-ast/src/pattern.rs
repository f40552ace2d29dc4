//! Parser-state transition and `select` keyset parsing.

use p4c_lex::Token;

use crate::ast::{NodeId, NodeKind};
use crate::parser::{Parser, SpanExt};

impl<'a> Parser<'a> {
    /// `transition` stateExpression
    pub(crate) fn parse_transition_statement(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `transition`
        let stmt = self.parse_state_expression()?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::TransitionStatement { stmt }, span, &[stmt]))
    }

    /// Either a bare next-state name (`accept;`, `myState;`) or a `select`
    /// expression (no trailing `;` of its own — its closing `}` ends it).
    fn parse_state_expression(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let expr = if self.check(&Token::Select) {
            self.parse_select_expression()?
        } else {
            let name = self.expect_name()?;
            self.expect(Token::Semicolon)?;
            name
        };
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::StateExpression { expr }, span, &[expr]))
    }

    fn parse_select_expression(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `select`
        self.expect(Token::LParen)?;
        let list_start = self.current_span();
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen)?;
        let list_span = list_start.merge(self.current_span());
        let expr_list = self
            .ast
            .alloc(NodeKind::ExpressionList { exprs: exprs.clone() }, list_span, &exprs);

        self.expect(Token::LBrace)?;
        let mut cases = Vec::new();
        while !self.check(&Token::RBrace) && !self.at_eof() {
            cases.push(self.parse_select_case()?);
        }
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());
        let case_list = self
            .ast
            .alloc(NodeKind::SelectCaseList { cases: cases.clone() }, span, &cases);
        Some(self.ast.alloc(
            NodeKind::SelectExpression { expr_list, case_list },
            span,
            &[expr_list, case_list],
        ))
    }

    fn parse_select_case(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let keyset_expr = self.parse_keyset_expression()?;
        self.expect(Token::Colon)?;
        let name = self.expect_name()?;
        self.expect(Token::Semicolon)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::SelectCase { keyset_expr, name }, span, &[keyset_expr, name]))
    }

    fn parse_keyset_expression(&mut self) -> Option<NodeId> {
        if self.check(&Token::LParen) {
            self.parse_tuple_keyset_expression()
        } else {
            self.parse_simple_keyset_expression()
        }
    }

    fn parse_tuple_keyset_expression(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.expect(Token::LParen)?;
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_simple_keyset_expression()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen)?;
        let span = start.merge(self.current_span());
        let expr_list = self
            .ast
            .alloc(NodeKind::SimpleExpressionList { exprs: exprs.clone() }, span, &exprs);
        Some(self.ast.alloc(NodeKind::TupleKeysetExpression { expr_list }, span, &[expr_list]))
    }

    /// A plain expression; `default` and `_` are already handled as atoms by
    /// `expr.rs`, so no separate mask/range syntax is needed here.
    fn parse_simple_keyset_expression(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let expr = self.parse_expr()?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::SimpleKeysetExpression { expr }, span, &[expr]))
    }
}
