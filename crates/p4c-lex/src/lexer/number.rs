//! Integer literal lexing.
//!
//! P4 has a single numeric literal form: an optional width-and-signedness
//! suffix (`8w10`, `16s3`) on top of a decimal, hex (`0x`), octal (`0o`), or
//! binary (`0b`) digit run, with `_` permitted as a digit separator. There
//! are no floating-point literals.

use crate::token::Token;
use crate::unicode::is_digit_in_base;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes an integer literal, including its optional `Nw`/`Ns` suffix.
    ///
    /// # Formats
    ///
    /// - Decimal: `42`, `1_000`
    /// - Hexadecimal: `0xFF`, `0xAB_CD`
    /// - Binary: `0b1010_1111`
    /// - Octal: `0o777`
    /// - Width/signedness suffix: `8w10` (8-bit unsigned 10), `16s3`
    ///   (16-bit signed 3) — a decimal width, then the `w`/`s` marker, then
    ///   the literal's own digit run (which may itself be based).
    pub fn lex_number(&mut self) -> Token {
        let lit_start = self.cursor.position();

        if self.cursor.current_char() == '0' {
            let save = self.cursor.snapshot();
            self.cursor.advance();
            match self.cursor.current_char() {
                'x' | 'X' => {
                    self.cursor.advance();
                    return self.finish_based_literal(16, None, false);
                },
                'b' | 'B' => {
                    self.cursor.advance();
                    return self.finish_based_literal(2, None, false);
                },
                'o' | 'O' => {
                    self.cursor.advance();
                    return self.finish_based_literal(8, None, false);
                },
                _ => self.cursor.restore(save),
            }
        }

        while is_digit_in_base(self.cursor.current_char(), 10)
            || self.cursor.current_char() == '_'
        {
            self.cursor.advance();
        }

        let first_run = self.cursor.slice_from(lit_start).replace('_', "");

        match self.cursor.current_char() {
            'w' | 'W' => {
                self.cursor.advance();
                let width = self.parse_width(&first_run);
                self.lex_suffixed_value(width, false)
            },
            's' | 'S' => {
                self.cursor.advance();
                let width = self.parse_width(&first_run);
                self.lex_suffixed_value(width, true)
            },
            _ => {
                let value = self.parse_decimal(&first_run);
                Token::Number { value, width: None, signed: false }
            },
        }
    }

    fn parse_width(&mut self, text: &str) -> u32 {
        match text.parse::<u32>() {
            Ok(w) => w,
            Err(e) => {
                self.report_error(format!("invalid literal width '{}': {}", text, e));
                0
            },
        }
    }

    fn parse_decimal(&mut self, text: &str) -> u64 {
        match text.parse::<u64>() {
            Ok(v) => v,
            Err(e) => {
                self.report_error(format!("integer literal overflow: {}", e));
                0
            },
        }
    }

    /// Lexes the value digits that follow a `w`/`s` width marker; the value
    /// itself may be decimal, or `0x`/`0o`/`0b` based.
    fn lex_suffixed_value(&mut self, width: u32, signed: bool) -> Token {
        if self.cursor.current_char() == '0' {
            let save = self.cursor.snapshot();
            self.cursor.advance();
            match self.cursor.current_char() {
                'x' | 'X' => {
                    self.cursor.advance();
                    return self.finish_based_literal(16, Some(width), signed);
                },
                'b' | 'B' => {
                    self.cursor.advance();
                    return self.finish_based_literal(2, Some(width), signed);
                },
                'o' | 'O' => {
                    self.cursor.advance();
                    return self.finish_based_literal(8, Some(width), signed);
                },
                _ => self.cursor.restore(save),
            }
        }

        let start = self.cursor.position();
        while is_digit_in_base(self.cursor.current_char(), 10)
            || self.cursor.current_char() == '_'
        {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start).replace('_', "");
        if text.is_empty() {
            self.report_error("no digits after width/signedness suffix".to_string());
            return Token::Number { value: 0, width: Some(width), signed };
        }
        let value = self.parse_decimal(&text);
        Token::Number { value, width: Some(width), signed }
    }

    /// Lexes the digit run of a based (`0x`/`0o`/`0b`) literal, starting
    /// right after the base-prefix letter has been consumed.
    fn finish_based_literal(&mut self, base: u32, width: Option<u32>, signed: bool) -> Token {
        let digit_start = self.cursor.position();
        loop {
            let c = self.cursor.current_char();
            if c == '_' || is_digit_in_base(c, base) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        if digit_start == self.cursor.position() {
            self.report_error(format!("no digits after base-{} prefix", base));
            return Token::Number { value: 0, width, signed };
        }

        let digits_text = self.cursor.slice_from(digit_start).replace('_', "");
        let value = match u64::from_str_radix(&digits_text, base) {
            Ok(v) => v,
            Err(e) => {
                self.report_error(format!("integer literal overflow: {}", e));
                0
            },
        };

        Token::Number { value, width, signed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p4c_util::Handler;

    fn lex_num(source: &str) -> Token {
        let mut handler = Handler::new();
        let mut lexer = crate::Lexer::new(source, &mut handler);
        lexer.lex_number()
    }

    #[test]
    fn test_decimal_integer() {
        assert_eq!(lex_num("42"), Token::Number { value: 42, width: None, signed: false });
        assert_eq!(lex_num("0"), Token::Number { value: 0, width: None, signed: false });
        assert_eq!(lex_num("1_000"), Token::Number { value: 1000, width: None, signed: false });
    }

    #[test]
    fn test_hex_integer() {
        assert_eq!(lex_num("0xFF"), Token::Number { value: 0xFF, width: None, signed: false });
        assert_eq!(lex_num("0xAB_CD"), Token::Number { value: 0xABCD, width: None, signed: false });
    }

    #[test]
    fn test_binary_integer() {
        assert_eq!(lex_num("0b1010"), Token::Number { value: 0b1010, width: None, signed: false });
    }

    #[test]
    fn test_octal_integer() {
        assert_eq!(lex_num("0o777"), Token::Number { value: 0o777, width: None, signed: false });
    }

    #[test]
    fn test_unsigned_width_suffix() {
        assert_eq!(lex_num("8w10"), Token::Number { value: 10, width: Some(8), signed: false });
        assert_eq!(lex_num("16w0xFF"), Token::Number { value: 0xFF, width: Some(16), signed: false });
    }

    #[test]
    fn test_signed_width_suffix() {
        assert_eq!(lex_num("16s3"), Token::Number { value: 3, width: Some(16), signed: true });
    }
}
