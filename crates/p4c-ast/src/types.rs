//! Type reference and type-declaration parsing.

use p4c_lex::Token;

use crate::ast::{NodeId, NodeKind};
use crate::parser::{Parser, SpanExt};

impl<'a> Parser<'a> {
    /// `typeRef`: a base type, a named type, a `tuple<...>`, or any of the
    /// above immediately followed by a `[size]` header-stack suffix.
    pub(crate) fn parse_type_ref(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let base = self.parse_type_ref_base()?;

        if self.check(&Token::LBracket) {
            self.advance();
            let size_expr = self.parse_expr()?;
            self.expect(Token::RBracket)?;
            let span = start.merge(self.current_span());
            let stack = self.ast.alloc(
                NodeKind::HeaderStackType { ty: base, stack_expr: size_expr },
                span,
                &[base, size_expr],
            );
            return Some(self.ast.alloc(NodeKind::TypeRef { ty: stack }, span, &[stack]));
        }

        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::TypeRef { ty: base }, span, &[base]))
    }

    fn parse_type_ref_base(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        match self.current().clone() {
            Token::Bool => {
                self.advance();
                Some(self.ast.alloc(NodeKind::BaseTypeBoolean, start, &[]))
            }
            Token::Void => {
                self.advance();
                Some(self.ast.alloc(NodeKind::BaseTypeVoid, start, &[]))
            }
            Token::StringType => {
                self.advance();
                Some(self.ast.alloc(NodeKind::BaseTypeString, start, &[]))
            }
            Token::Error => {
                self.advance();
                Some(self.ast.alloc(NodeKind::BaseTypeError, start, &[]))
            }
            Token::MatchKind => {
                self.advance();
                Some(self.ast.alloc(NodeKind::BaseTypeMatchKind, start, &[]))
            }
            Token::Int => {
                self.advance();
                let size = self.parse_optional_type_size()?;
                let span = start.merge(self.current_span());
                let children: Vec<NodeId> = size.into_iter().collect();
                Some(self.ast.alloc(NodeKind::BaseTypeInteger { size }, span, &children))
            }
            Token::Bit => {
                self.advance();
                let size = self.parse_optional_type_size()?;
                let span = start.merge(self.current_span());
                let children: Vec<NodeId> = size.into_iter().collect();
                Some(self.ast.alloc(NodeKind::BaseTypeBit { size }, span, &children))
            }
            Token::Varbit => {
                self.advance();
                let size = self.parse_optional_type_size()?;
                let span = start.merge(self.current_span());
                let children: Vec<NodeId> = size.into_iter().collect();
                Some(self.ast.alloc(NodeKind::BaseTypeVarbit { size }, span, &children))
            }
            Token::Ident(_) if self.peek_is_tuple_keyword() => self.parse_tuple_type(),
            Token::Ident(_) => self.expect_name(),
            other => {
                self.error_at(start, format!("expected type, found {:?}", other));
                None
            }
        }
    }

    /// `tuple` is not reserved in the token set (it is an ordinary
    /// identifier spelled `tuple`), so it is recognized by spelling here
    /// rather than as a keyword token.
    fn peek_is_tuple_keyword(&self) -> bool {
        matches!(self.current(), Token::Ident(sym) if sym.as_str() == "tuple")
    }

    fn parse_tuple_type(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `tuple`
        self.expect(Token::Lt)?;
        let mut args = Vec::new();
        if !self.check(&Token::Gt) {
            loop {
                args.push(self.parse_type_ref()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::Gt)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::TupleType { type_args: args.clone() }, span, &args))
    }

    /// `<N>` width suffix on `int`/`bit`/`varbit`; absent for unsized `int`.
    fn parse_optional_type_size(&mut self) -> Option<Option<NodeId>> {
        if !self.eat(&Token::Lt) {
            return Some(None);
        }
        let start = self.current_span();
        let size_expr = self.parse_expr()?;
        let span = start.merge(self.current_span());
        let size = self
            .ast
            .alloc(NodeKind::IntegerTypeSize { size: size_expr }, span, &[size_expr]);
        self.expect(Token::Gt)?;
        Some(Some(size))
    }

    /// `typedef <typeRef> <name>;`
    pub(crate) fn parse_typedef_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `typedef`
        let type_ref = self.parse_type_ref()?;
        let name = self.expect_name()?;
        self.expect(Token::Semicolon)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(
            NodeKind::TypedefDecl { type_ref, name },
            span,
            &[type_ref, name],
        ))
    }

    /// `header`/`struct`/`header_union` <name> `{` field* `}`
    pub(crate) fn parse_struct_like_decl(&mut self, keyword: Token) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // keyword
        let name = self.expect_name()?;
        self.expect(Token::LBrace)?;
        let mut fields = Vec::new();
        while !self.check(&Token::RBrace) && !self.at_eof() {
            fields.push(self.parse_struct_field()?);
        }
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());
        let field_list = self
            .ast
            .alloc(NodeKind::StructFieldList { fields: fields.clone() }, span, &fields);

        let kind = match keyword {
            Token::Header => NodeKind::HeaderTypeDecl { name, fields: field_list },
            Token::HeaderUnion => NodeKind::HeaderUnionDecl { name, fields: field_list },
            Token::Struct => NodeKind::StructTypeDecl { name, fields: field_list },
            _ => unreachable!("caller only passes struct-like keywords"),
        };
        Some(self.ast.alloc(kind, span, &[name, field_list]))
    }

    fn parse_struct_field(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let ty = self.parse_type_ref()?;
        let name = self.expect_name()?;
        self.expect(Token::Semicolon)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::StructField { ty, name }, span, &[ty, name]))
    }

    /// `enum` [`bit<N>`] <name> `{` ident-list `}` — the underlying type, if
    /// present, is always `bit<N>` (a plain `enum` has no explicit
    /// representation and its members carry no values).
    pub(crate) fn parse_enum_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `enum`

        let type_size = if self.check(&Token::Bit) {
            let sz_start = self.current_span();
            let ty = self.parse_type_ref_base()?;
            let span = sz_start.merge(self.current_span());
            Some(self.ast.alloc(NodeKind::TypeRef { ty }, span, &[ty]))
        } else {
            None
        };

        let name = self.expect_name()?;
        self.expect(Token::LBrace)?;

        let mut idents = Vec::new();
        let mut specified = Vec::new();
        let mut is_specified = false;
        if !self.check(&Token::RBrace) {
            loop {
                let id_start = self.current_span();
                let ident = self.expect_name()?;
                if self.eat(&Token::Eq) {
                    is_specified = true;
                    let init_expr = self.parse_expr()?;
                    let span = id_start.merge(self.current_span());
                    specified.push(self.ast.alloc(
                        NodeKind::SpecifiedIdentifier { name: ident, init_expr: Some(init_expr) },
                        span,
                        &[ident, init_expr],
                    ));
                } else {
                    idents.push(ident);
                }
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());

        let fields = if is_specified {
            self.ast.alloc(
                NodeKind::SpecifiedIdentifierList { idents: specified.clone() },
                span,
                &specified,
            )
        } else {
            self.ast
                .alloc(NodeKind::IdentifierList { idents: idents.clone() }, span, &idents)
        };

        let mut children = vec![name, fields];
        if let Some(ts) = type_size {
            children.push(ts);
        }
        Some(self.ast.alloc(
            NodeKind::EnumDecl { type_size, name, fields },
            span,
            &children,
        ))
    }

    /// `error { ident-list }` — merges into the single program-wide `error`
    /// enum at name-binding time; this just records one declaration site.
    pub(crate) fn parse_error_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `error`
        let fields = self.parse_braced_identifier_list()?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::ErrorDecl { fields }, span, &[fields]))
    }

    /// `match_kind { ident-list }`
    pub(crate) fn parse_match_kind_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // `match_kind`
        let fields = self.parse_braced_identifier_list()?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::MatchKindDecl { fields }, span, &[fields]))
    }

    fn parse_braced_identifier_list(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.expect(Token::LBrace)?;
        let mut idents = Vec::new();
        if !self.check(&Token::RBrace) {
            loop {
                idents.push(self.expect_name()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RBrace)?;
        let span = start.merge(self.current_span());
        Some(self.ast.alloc(NodeKind::IdentifierList { idents: idents.clone() }, span, &idents))
    }
}
