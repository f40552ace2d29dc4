//! The P4 token set.
//!
//! Mirrors the precompiled keyword/built-in `Symbol` constants in
//! `p4c_util::symbol` one-for-one: every keyword token below corresponds to
//! exactly one `KW_*`/`TY_*`/`ID_*` constant interned at a fixed index, so
//! the parser can match on `Token` without re-hashing identifier text. The
//! punctuation/operator set is the lexer's generic, language-agnostic part
//! and is left as-is; only the identifier/keyword and literal token classes
//! are P4-specific.

use p4c_util::Symbol;

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Conceptual start-of-input marker (spec token class, not emitted
    /// mid-stream by `Lexer::next_token`).
    StartOfInput,
    Eof,

    Ident(Symbol),
    /// An integer literal, with its optional `Nw`/`Ns` width-and-signedness
    /// suffix. `width = None` means an arbitrary-precision literal with no
    /// declared width (P4's unsized `int` constants).
    Number {
        value: u64,
        width: Option<u32>,
        signed: bool,
    },
    Str(Symbol),
    True,
    False,

    // Declaration keywords
    Parser,
    Control,
    Action,
    Table,
    Header,
    HeaderUnion,
    Typedef,
    Extern,
    Package,
    State,
    Transition,
    Apply,
    Select,
    Default,
    Error,
    MatchKind,
    Struct,
    Enum,
    Const,
    In,
    Out,
    InOut,
    Return,
    If,
    Else,
    Switch,
    Verify,
    This,
    Abstract,

    // Built-in type keywords
    Void,
    Bool,
    Int,
    Bit,
    Varbit,
    StringType,

    // Reserved identifiers
    Accept,
    Reject,
    Underscore,

    // Punctuation (language-agnostic; unchanged from the lexer's generic set)
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    ColonColon,
    Dot,
    DotDot,
    DotDotEq,
    DotDotDot,
    Arrow,
    FatArrow,
    At,

    // Operators
    Plus,
    PlusEq,
    Minus,
    MinusEq,
    Star,
    StarEq,
    Slash,
    SlashEq,
    Percent,
    PercentEq,
    Eq,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Shl,
    ShlEq,
    Shr,
    ShrEq,
    AndAnd,
    AmpersandEq,
    OrOr,
    PipeEq,
    CaretEq,
    Bang,
    Ampersand,
    Pipe,
    Caret,
    Tilde,

    /// Lexically invalid text, reported as a diagnostic and carried as a
    /// placeholder token so the parser can keep resynchronizing.
    Invalid(String),
}

/// Maps an already-scanned identifier to a keyword token, or `None` if the
/// text is an ordinary identifier.
///
/// This is the token-level counterpart of `p4c_util::symbol::intern_keyword`/
/// `intern_type`: both walk the same fixed keyword list, one producing a
/// `Symbol`, the other a `Token`.
pub fn keyword_from_ident(text: &str) -> Option<Token> {
    Some(match text {
        "parser" => Token::Parser,
        "control" => Token::Control,
        "action" => Token::Action,
        "table" => Token::Table,
        "header" => Token::Header,
        "header_union" => Token::HeaderUnion,
        "typedef" => Token::Typedef,
        "extern" => Token::Extern,
        "package" => Token::Package,
        "state" => Token::State,
        "transition" => Token::Transition,
        "apply" => Token::Apply,
        "select" => Token::Select,
        "default" => Token::Default,
        "error" => Token::Error,
        "match_kind" => Token::MatchKind,
        "struct" => Token::Struct,
        "enum" => Token::Enum,
        "const" => Token::Const,
        "in" => Token::In,
        "out" => Token::Out,
        "inout" => Token::InOut,
        "return" => Token::Return,
        "if" => Token::If,
        "else" => Token::Else,
        "switch" => Token::Switch,
        "verify" => Token::Verify,
        "this" => Token::This,
        "abstract" => Token::Abstract,
        "void" => Token::Void,
        "bool" => Token::Bool,
        "int" => Token::Int,
        "bit" => Token::Bit,
        "varbit" => Token::Varbit,
        "string" => Token::StringType,
        "true" => Token::True,
        "false" => Token::False,
        "accept" => Token::Accept,
        "reject" => Token::Reject,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_covers_declaration_keywords() {
        assert_eq!(keyword_from_ident("parser"), Some(Token::Parser));
        assert_eq!(keyword_from_ident("control"), Some(Token::Control));
        assert_eq!(keyword_from_ident("header_union"), Some(Token::HeaderUnion));
        assert_eq!(keyword_from_ident("match_kind"), Some(Token::MatchKind));
    }

    #[test]
    fn keyword_lookup_covers_builtin_types() {
        assert_eq!(keyword_from_ident("bit"), Some(Token::Bit));
        assert_eq!(keyword_from_ident("varbit"), Some(Token::Varbit));
        assert_eq!(keyword_from_ident("void"), Some(Token::Void));
    }

    #[test]
    fn plain_identifier_is_not_a_keyword() {
        assert_eq!(keyword_from_ident("myHeader"), None);
        assert_eq!(keyword_from_ident("port"), None);
    }
}
