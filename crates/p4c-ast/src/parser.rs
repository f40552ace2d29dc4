//! Recursive-descent parser: token stream in, [`Ast`] out.
//!
//! The grammar is split across this module (the driving loop and shared
//! token helpers) and `items.rs`/`types.rs`/`stmt.rs`/`expr.rs`/`pattern.rs`,
//! each an `impl Parser` block for one syntactic region, mirroring how the
//! lexer's own submodules each carry one `impl Lexer` block.

use p4c_lex::{tokenize_with_spans, Token};
use p4c_util::{DiagnosticBuilder, Handler, Span};

use crate::ast::{Ast, NodeId, NodeKind};

/// Tokens the parser resynchronizes on after a malformed declaration or
/// statement: the start of the next top-level declaration, or a statement
/// terminator/closing brace.
const DECL_SYNC: &[Token] = &[
    Token::Parser,
    Token::Control,
    Token::Extern,
    Token::Package,
    Token::Header,
    Token::HeaderUnion,
    Token::Struct,
    Token::Enum,
    Token::Typedef,
    Token::Error,
    Token::MatchKind,
    Token::Const,
    Token::Action,
    Token::Table,
];

pub struct Parser<'a> {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    pub(crate) handler: &'a mut Handler,
    pub(crate) ast: Ast,
}

impl<'a> Parser<'a> {
    pub fn new(source: &str, handler: &'a mut Handler) -> Self {
        let tokens = tokenize_with_spans(source, handler);
        Self {
            tokens,
            pos: 0,
            handler,
            ast: Ast::new(),
        }
    }

    /// Parses a full `p4program` and returns the populated arena.
    pub fn parse_program(mut self) -> Ast {
        let start = self.current_span();
        let mut decls = Vec::new();
        while !self.at_eof() {
            match self.parse_top_level_declaration() {
                Some(id) => decls.push(id),
                None => self.synchronize(DECL_SYNC),
            }
        }
        let span = start.merge(self.current_span());
        let decl_list = self.ast.alloc(NodeKind::DeclarationList { decls: decls.clone() }, span, &decls);
        let root = self.ast.alloc(NodeKind::Program { decls: decl_list }, span, &[decl_list]);
        self.ast.root = Some(root);
        self.ast
    }

    // ---- token access ----

    pub(crate) fn current(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map(|(t, _)| t)
            .unwrap_or(&Token::Eof)
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| *s)
            .or_else(|| self.tokens.last().map(|(_, s)| *s))
            .unwrap_or(Span::DUMMY)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(crate) fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        tok
    }

    /// Looks `n` tokens past the current one without consuming anything
    /// (`n = 0` is equivalent to `current()`).
    pub(crate) fn tokens_ahead(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).map(|(t, _)| t.clone())
    }

    pub(crate) fn check(&self, tok: &Token) -> bool {
        self.current() == tok
    }

    pub(crate) fn eat(&mut self, tok: &Token) -> bool {
        if self.check(tok) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes `tok` or reports a located error and returns `None`.
    pub(crate) fn expect(&mut self, tok: Token) -> Option<()> {
        if self.check(&tok) {
            self.advance();
            Some(())
        } else {
            let span = self.current_span();
            let found = self.current().clone();
            self.error_at(span, format!("expected {:?}, found {:?}", tok, found));
            None
        }
    }

    /// Consumes an identifier token and allocates the `Name` node for it.
    pub(crate) fn expect_name(&mut self) -> Option<NodeId> {
        let span = self.current_span();
        match self.current().clone() {
            Token::Ident(sym) => {
                self.advance();
                Some(self.ast.alloc(NodeKind::Name { strname: sym }, span, &[]))
            }
            other => {
                self.error_at(span, format!("expected identifier, found {:?}", other));
                None
            }
        }
    }

    pub(crate) fn error_at(&mut self, span: Span, message: String) {
        DiagnosticBuilder::error(message).span(span).emit(self.handler);
    }

    /// Skips tokens until one in `sync` (or EOF) is next, without consuming
    /// it — the caller's loop re-reads it as the start of the next unit.
    pub(crate) fn synchronize(&mut self, sync: &[Token]) {
        while !self.at_eof() {
            if sync.iter().any(|t| self.check(t)) {
                return;
            }
            if self.check(&Token::Semicolon) {
                self.advance();
                return;
            }
            self.advance();
        }
    }
}

/// Extends `Span` with a merge helper; parser nodes span from their first
/// to their last consumed token.
pub(crate) trait SpanExt {
    fn merge(self, other: Span) -> Span;
}

impl SpanExt for Span {
    fn merge(self, other: Span) -> Span {
        if self == Span::DUMMY {
            return other;
        }
        Span::with_file(
            self.start,
            other.end.max(self.end),
            self.file_id,
            self.line,
            self.column,
        )
    }
}
