//! p4c-lex — Lexical Analyzer for P4 source text.
//!
//! Transforms a P4 source file into an ordered sequence of [`Token`]s.
//! Whitespace and comments (`//`, nestable `/* */`) are filtered. The token
//! set matches §6 of the core specification: identifiers, integer literals
//! (with the optional `Nw`/`Ns` width-and-signedness suffix, `0x`/`0o`/`0b`
//! base prefixes, and `_` digit separators), string literals, the boolean
//! literals, every P4 keyword, and punctuation. Lexical errors are reported
//! through the shared [`p4c_util::Handler`] with file:line:column location;
//! the lexer itself never aborts — it emits `Token::Invalid` and keeps
//! scanning so the parser can resynchronize.

pub mod cursor;
pub mod edge_cases;
pub mod lexer;
pub mod token;
pub mod unicode;

pub use lexer::Lexer;
pub use token::Token;

use p4c_util::{Handler, Span};

/// Runs the lexer to completion, returning every token up to (but not
/// including) the terminal `Eof`.
///
/// This is the entry point the parser and driver use; `Lexer` itself stays
/// a pull-based `Iterator` for callers that want to interleave lexing with
/// other work.
pub fn tokenize(source: &str, handler: &mut Handler) -> Vec<Token> {
    let mut lexer = Lexer::new(source, handler);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        if token == Token::Eof {
            break;
        }
        tokens.push(token);
    }
    tokens
}

/// Like [`tokenize`], but pairs every token with its source [`Span`]. The
/// parser consumes this form so every AST node it builds can carry a
/// concrete `file:line:column` location.
pub fn tokenize_with_spans(source: &str, handler: &mut Handler) -> Vec<(Token, Span)> {
    let mut lexer = Lexer::new(source, handler);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        if token == Token::Eof {
            break;
        }
        let span = lexer.token_span();
        tokens.push((token, span));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use p4c_util::Symbol;

    #[test]
    fn tokenize_minimal_header() {
        let mut handler = Handler::new();
        let tokens = tokenize("header H { bit<8> x; }", &mut handler);
        assert!(!handler.has_errors());
        assert_eq!(tokens[0], Token::Header);
        assert_eq!(tokens[1], Token::Ident(Symbol::intern("H")));
        assert_eq!(tokens[2], Token::LBrace);
        assert_eq!(tokens[3], Token::Bit);
        assert_eq!(tokens[4], Token::Lt);
        assert_eq!(tokens[5], Token::Number { value: 8, width: None, signed: false });
        assert_eq!(tokens[6], Token::Gt);
    }

    #[test]
    fn tokenize_stops_before_eof() {
        let mut handler = Handler::new();
        let tokens = tokenize("", &mut handler);
        assert!(tokens.is_empty());
    }
}
