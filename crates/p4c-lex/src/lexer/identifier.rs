//! Identifier and keyword lexing.
//!
//! This module handles lexing of identifiers and keywords.

use crate::token::{keyword_from_ident, Token};
use crate::unicode::is_ascii_ident_continue;
use crate::Lexer;
use p4c_util::Symbol;

impl<'a> Lexer<'a> {
    /// Lexes an identifier or keyword.
    ///
    /// Identifiers start with a letter or underscore, followed by
    /// alphanumeric characters or underscores. After reading the identifier,
    /// checks if it matches a reserved keyword.
    ///
    /// # Returns
    ///
    /// Either a keyword token (e.g., `Token::Parser`) or `Token::Ident(symbol)`
    pub fn lex_identifier(&mut self) -> Token {
        while is_ascii_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(self.token_start);

        keyword_from_ident(text).unwrap_or_else(|| Token::Ident(Symbol::intern(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;
    use p4c_util::Handler;

    fn lex_ident(source: &str) -> Token {
        let mut handler = Handler::new();
        let mut lexer = crate::Lexer::new(source, &mut handler);
        lexer.lex_identifier()
    }

    #[test]
    fn test_simple_identifier() {
        let token = lex_ident("foo");
        assert_eq!(token, Token::Ident(Symbol::intern("foo")));
    }

    #[test]
    fn test_identifier_with_underscore() {
        let token = lex_ident("foo_bar_123");
        assert_eq!(token, Token::Ident(Symbol::intern("foo_bar_123")));
    }

    #[test]
    fn test_keyword_parser() {
        let token = lex_ident("parser");
        assert_eq!(token, Token::Parser);
    }

    #[test]
    fn test_keyword_control() {
        let token = lex_ident("control");
        assert_eq!(token, Token::Control);
    }

    #[test]
    fn test_keyword_if() {
        let token = lex_ident("if");
        assert_eq!(token, Token::If);
    }

    #[test]
    fn test_keyword_else() {
        let token = lex_ident("else");
        assert_eq!(token, Token::Else);
    }

    #[test]
    fn test_keyword_switch() {
        let token = lex_ident("switch");
        assert_eq!(token, Token::Switch);
    }

    #[test]
    fn test_keyword_struct() {
        let token = lex_ident("struct");
        assert_eq!(token, Token::Struct);
    }

    #[test]
    fn test_keyword_enum() {
        let token = lex_ident("enum");
        assert_eq!(token, Token::Enum);
    }

    #[test]
    fn test_keyword_extern() {
        let token = lex_ident("extern");
        assert_eq!(token, Token::Extern);
    }

    #[test]
    fn test_keyword_true() {
        let token = lex_ident("true");
        assert_eq!(token, Token::True);
    }

    #[test]
    fn test_keyword_false() {
        let token = lex_ident("false");
        assert_eq!(token, Token::False);
    }

    #[test]
    fn test_keyword_return() {
        let token = lex_ident("return");
        assert_eq!(token, Token::Return);
    }

    #[test]
    fn test_keyword_action() {
        let token = lex_ident("action");
        assert_eq!(token, Token::Action);
    }

    #[test]
    fn test_keyword_table() {
        let token = lex_ident("table");
        assert_eq!(token, Token::Table);
    }

    #[test]
    fn test_keyword_header_union() {
        let token = lex_ident("header_union");
        assert_eq!(token, Token::HeaderUnion);
    }

    #[test]
    fn test_keyword_typedef() {
        let token = lex_ident("typedef");
        assert_eq!(token, Token::Typedef);
    }

    #[test]
    fn test_keyword_package() {
        let token = lex_ident("package");
        assert_eq!(token, Token::Package);
    }

    #[test]
    fn test_keyword_state_and_transition() {
        assert_eq!(lex_ident("state"), Token::State);
        assert_eq!(lex_ident("transition"), Token::Transition);
    }

    #[test]
    fn test_keyword_apply_and_select() {
        assert_eq!(lex_ident("apply"), Token::Apply);
        assert_eq!(lex_ident("select"), Token::Select);
    }

    #[test]
    fn test_directions() {
        assert_eq!(lex_ident("in"), Token::In);
        assert_eq!(lex_ident("out"), Token::Out);
        assert_eq!(lex_ident("inout"), Token::InOut);
    }

    #[test]
    fn test_keyword_match_kind_and_error() {
        assert_eq!(lex_ident("match_kind"), Token::MatchKind);
        assert_eq!(lex_ident("error"), Token::Error);
    }

    #[test]
    fn test_keyword_const() {
        let token = lex_ident("const");
        assert_eq!(token, Token::Const);
    }

    #[test]
    fn test_builtin_states() {
        assert_eq!(lex_ident("accept"), Token::Accept);
        assert_eq!(lex_ident("reject"), Token::Reject);
    }

    #[test]
    fn test_builtin_types() {
        assert_eq!(lex_ident("void"), Token::Void);
        assert_eq!(lex_ident("bool"), Token::Bool);
        assert_eq!(lex_ident("int"), Token::Int);
        assert_eq!(lex_ident("bit"), Token::Bit);
        assert_eq!(lex_ident("varbit"), Token::Varbit);
        assert_eq!(lex_ident("string"), Token::StringType);
    }
}
