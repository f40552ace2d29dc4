//! Expression parsing using Pratt parsing (top-down operator precedence).
//!
//! Binding powers follow the P4 operator table: `||` binds loosest, then
//! `&&`, equality, relational, `|`, `^`, `&`, shifts, additive,
//! multiplicative; unary `!`/`-`/`~` and postfix (call, member, subscript,
//! cast) bind tightest.

use p4c_lex::Token;

use crate::ast::{BinaryOp, NodeId, NodeKind, UnaryOp};
use crate::parser::{Parser, SpanExt};

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> Option<NodeId> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Option<NodeId> {
        let start = self.current_span();
        let mut lhs = self.parse_prefix_expr()?;

        loop {
            let Some((op, lbp, rbp)) = self.infix_binding_power() else {
                break;
            };
            if lbp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr_bp(rbp)?;
            let span = start.merge(self.current_span());
            lhs = self
                .ast
                .alloc(NodeKind::BinaryExpression { op, left: lhs, right: rhs }, span, &[lhs, rhs]);
        }

        Some(lhs)
    }

    fn infix_binding_power(&self) -> Option<(BinaryOp, u8, u8)> {
        Some(match self.current() {
            Token::OrOr => (BinaryOp::Or, 1, 2),
            Token::AndAnd => (BinaryOp::And, 3, 4),
            Token::EqEq => (BinaryOp::Eq, 5, 6),
            Token::NotEq => (BinaryOp::Neq, 5, 6),
            Token::Lt => (BinaryOp::Less, 7, 8),
            Token::Gt => (BinaryOp::Greater, 7, 8),
            Token::LtEq => (BinaryOp::LessEq, 7, 8),
            Token::GtEq => (BinaryOp::GreaterEq, 7, 8),
            Token::Pipe => (BinaryOp::BitwOr, 9, 10),
            Token::Caret => (BinaryOp::BitwXor, 11, 12),
            Token::Ampersand => (BinaryOp::BitwAnd, 13, 14),
            Token::Shl => (BinaryOp::Shl, 15, 16),
            Token::Shr => (BinaryOp::Shr, 15, 16),
            Token::Plus => (BinaryOp::Add, 17, 18),
            Token::Minus => (BinaryOp::Sub, 17, 18),
            Token::Star => (BinaryOp::Mul, 19, 20),
            Token::Slash => (BinaryOp::Div, 19, 20),
            Token::Percent => (BinaryOp::Mod, 19, 20),
            _ => return None,
        })
    }

    fn parse_prefix_expr(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        match self.current().clone() {
            Token::Minus => {
                self.advance();
                let operand = self.parse_prefix_expr()?;
                let span = start.merge(self.current_span());
                Some(self.ast.alloc(
                    NodeKind::UnaryExpression { op: UnaryOp::Neg, operand },
                    span,
                    &[operand],
                ))
            }
            Token::Bang => {
                self.advance();
                let operand = self.parse_prefix_expr()?;
                let span = start.merge(self.current_span());
                Some(self.ast.alloc(
                    NodeKind::UnaryExpression { op: UnaryOp::Not, operand },
                    span,
                    &[operand],
                ))
            }
            Token::Tilde => {
                self.advance();
                let operand = self.parse_prefix_expr()?;
                let span = start.merge(self.current_span());
                Some(self.ast.alloc(
                    NodeKind::UnaryExpression { op: UnaryOp::BitwNot, operand },
                    span,
                    &[operand],
                ))
            }
            Token::LParen if self.looks_like_cast() => self.parse_cast_expr(),
            _ => self.parse_postfix_expr(),
        }
    }

    /// `(typeRef)expr` — distinguished from a parenthesized expression by
    /// whether the token after `)` can start an expression and the content
    /// between the parens is itself a valid type (base type or a plain
    /// identifier followed immediately by `)`).
    fn looks_like_cast(&self) -> bool {
        matches!(
            self.peek_after_lparen(),
            Some(Token::Bool)
                | Some(Token::Int)
                | Some(Token::Bit)
                | Some(Token::Varbit)
                | Some(Token::StringType)
        )
    }

    fn peek_after_lparen(&self) -> Option<Token> {
        self.peek_nth(1)
    }

    fn peek_nth(&self, n: usize) -> Option<Token> {
        self.tokens_ahead(n)
    }

    fn parse_cast_expr(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.expect(Token::LParen)?;
        let ty = self.parse_type_ref()?;
        self.expect(Token::RParen)?;
        let expr = self.parse_prefix_expr()?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::CastExpression { ty, expr }, span, &[ty, expr]))
    }

    fn parse_postfix_expr(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let mut lhs = self.parse_atom_expr()?;

        loop {
            match self.current().clone() {
                Token::Dot => {
                    self.advance();
                    let name = self.expect_name()?;
                    let span = start.merge(self.current_span());
                    lhs = self
                        .ast
                        .alloc(NodeKind::MemberSelector { lhs, name }, span, &[lhs, name]);
                }
                Token::LParen => {
                    let args = self.parse_argument_list()?;
                    let span = start.merge(self.current_span());
                    lhs = self.ast.alloc(NodeKind::FunctionCall { lhs, args }, span, &[lhs, args]);
                }
                Token::LBracket => {
                    self.advance();
                    let idx_start = self.current_span();
                    let first = self.parse_expr()?;
                    let index = if self.eat(&Token::Colon) {
                        let second = self.parse_expr()?;
                        let span = idx_start.merge(self.current_span());
                        self.ast.alloc(
                            NodeKind::IndexExpression { start_index: first, end_index: Some(second) },
                            span,
                            &[first, second],
                        )
                    } else {
                        first
                    };
                    self.expect(Token::RBracket)?;
                    let span = start.merge(self.current_span());
                    lhs = self
                        .ast
                        .alloc(NodeKind::ArraySubscript { lhs, index }, span, &[lhs, index]);
                }
                _ => break,
            }
        }

        Some(lhs)
    }

    pub(crate) fn parse_argument_list(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let arg_start = self.current_span();
                let arg_expr = self.parse_expr()?;
                let span = arg_start.merge(self.current_span());
                args.push(self.ast.alloc(NodeKind::Argument { arg: arg_expr }, span, &[arg_expr]));
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::ArgumentList { args: args.clone() }, span, &args))
    }

    fn parse_atom_expr(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        match self.current().clone() {
            Token::Number { value, width, signed } => {
                self.advance();
                Some(self.ast.alloc(
                    NodeKind::IntegerLiteral { value, width, is_signed: signed },
                    start,
                    &[],
                ))
            }
            Token::True => {
                self.advance();
                Some(self.ast.alloc(NodeKind::BooleanLiteral { value: true }, start, &[]))
            }
            Token::False => {
                self.advance();
                Some(self.ast.alloc(NodeKind::BooleanLiteral { value: false }, start, &[]))
            }
            Token::Str(sym) => {
                self.advance();
                Some(self.ast.alloc(NodeKind::StringLiteral { value: sym }, start, &[]))
            }
            Token::Default => {
                self.advance();
                Some(self.ast.alloc(NodeKind::Default, start, &[]))
            }
            Token::Underscore => {
                self.advance();
                Some(self.ast.alloc(NodeKind::Dontcare, start, &[]))
            }
            Token::This => {
                self.advance();
                Some(self.ast.alloc(NodeKind::Name { strname: p4c_util::Symbol::intern("this") }, start, &[]))
            }
            Token::Ident(_) | Token::Accept | Token::Reject => self.parse_name_atom(),
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Some(inner)
            }
            other => {
                self.error_at(start, format!("expected expression, found {:?}", other));
                None
            }
        }
    }

    fn parse_name_atom(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let sym = match self.current().clone() {
            Token::Ident(sym) => sym,
            Token::Accept => p4c_util::Symbol::intern("accept"),
            Token::Reject => p4c_util::Symbol::intern("reject"),
            _ => unreachable!("caller only dispatches on Ident/Accept/Reject"),
        };
        self.advance();
        Some(self.ast.alloc(NodeKind::Name { strname: sym }, start, &[]))
    }
}
