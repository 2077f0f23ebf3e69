//! Byte-level tokenizer.
//!
//! Converts a source buffer into a lazy sequence of [`Token`]s. No errors
//! are raised here: unrecognized bytes become single-character `Operator`
//! tokens and the diagnosis (if any) happens downstream, per `spec.md`
//! §4.1's failure semantics.

use crate::token::{is_keyword, Token, TokenKind, MAX_TOKEN_LEN};

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.pos += 1;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    self.pos += 2;
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.pos += 2;
                    while self.peek().is_some() {
                        if self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/') {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    /// Produce exactly one token. Returns `EndOfInput` repeatedly once
    /// the source is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let Some(first) = self.peek() else {
            return Token::end_of_input();
        };

        let token = match first {
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.read_word(),
            b'0'..=b'9' => self.read_number(),
            b'"' => self.read_string(),
            b'{' | b'}' | b'[' | b']' | b'(' | b')' | b';' | b',' => {
                self.pos += 1;
                Token::new(TokenKind::Punctuator, (first as char).to_string())
            }
            _ => self.read_operator(),
        };
        truncate_to_max(token)
    }

    fn read_word(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }
        let lexeme = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        let kind = if is_keyword(&lexeme) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, lexeme)
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        let lexeme = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        Token::new(TokenKind::Number, lexeme)
    }

    fn read_string(&mut self) -> Token {
        let start = self.pos;
        self.pos += 1; // opening quote
        while let Some(b) = self.peek() {
            if b == b'\\' {
                // A trailing backslash with nothing after it (source
                // ends mid-escape) only skips the backslash itself;
                // there's no second byte to consume.
                self.pos += if self.peek_at(1).is_some() { 2 } else { 1 };
                continue;
            }
            self.pos += 1;
            if b == b'"' {
                break;
            }
        }
        let lexeme = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        Token::new(TokenKind::String, lexeme)
    }

    fn read_operator(&mut self) -> Token {
        let first = self.bump().expect("checked by caller");
        let second = self.peek();

        let lexeme = match (first, second) {
            (b'=', Some(b'=')) | (b'!', Some(b'=')) | (b'<', Some(b'=')) | (b'>', Some(b'=')) => {
                self.pos += 1;
                format!("{}{}", first as char, '=')
            }
            (b'+', Some(b'+')) | (b'-', Some(b'-')) | (b'&', Some(b'&')) | (b'|', Some(b'|')) => {
                self.pos += 1;
                format!("{}{}", first as char, first as char)
            }
            _ => (first as char).to_string(),
        };
        Token::new(TokenKind::Operator, lexeme)
    }
}

fn truncate_to_max(mut token: Token) -> Token {
    if token.lexeme.len() > MAX_TOKEN_LEN {
        let mut n = MAX_TOKEN_LEN;
        while !token.lexeme.is_char_boundary(n) {
            n -= 1;
        }
        token.lexeme.truncate(n);
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind::*;

    fn all_tokens(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.kind == TokenKind::EndOfInput;
            out.push(tok);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn totality_on_empty_and_garbage_input() {
        // P1: every byte sequence ends in a finite run of EndOfInput.
        for src in ["", "   \n\t", "@@@", "int x;", "/* unterminated"] {
            let toks = all_tokens(src);
            assert_eq!(toks.last().unwrap().kind, TokenKind::EndOfInput);
        }
    }

    #[test]
    fn keyword_identifier_dichotomy() {
        // P2
        let toks = all_tokens("int foobar struct myStruct");
        let kinds: Vec<_> = toks
            .iter()
            .filter(|t| t.kind != TokenKind::EndOfInput)
            .collect();
        assert_eq!(kinds[0].kind, Keyword);
        assert_eq!(kinds[1].kind, Identifier);
        assert_eq!(kinds[2].kind, Keyword);
        assert_eq!(kinds[3].kind, Identifier);
    }

    #[test]
    fn maximal_munch_on_two_byte_operators() {
        // P3
        for (src, expect) in [
            ("==", "=="),
            ("!=", "!="),
            ("<=", "<="),
            (">=", ">="),
            ("&&", "&&"),
            ("||", "||"),
        ] {
            let toks = all_tokens(src);
            assert_eq!(toks[0].kind, Operator);
            assert_eq!(toks[0].lexeme, expect);
            assert_eq!(toks.len(), 2, "expected a single operator then EOF for {src}");
        }
    }

    #[test]
    fn single_equals_is_not_swallowed_by_double() {
        let toks = all_tokens("a = b");
        assert_eq!(toks[1].lexeme, "=");
        assert_eq!(toks[1].kind, Operator);
    }

    #[test]
    fn line_and_block_comments_are_skipped() {
        let toks = all_tokens("int x; // trailing\n/* block */ int y;");
        let lexemes: Vec<_> = toks.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(
            lexemes,
            vec!["int", "x", ";", "int", "y", ";", ""]
        );
    }

    #[test]
    fn string_literal_preserves_escape_pairs() {
        let toks = all_tokens(r#""hi\n""#);
        assert_eq!(toks[0].kind, String);
        assert_eq!(toks[0].lexeme, "\"hi\\n\"");
    }

    #[test]
    fn unrecognized_byte_becomes_single_char_operator() {
        let toks = all_tokens("@");
        assert_eq!(toks[0].kind, Operator);
        assert_eq!(toks[0].lexeme, "@");
    }

    #[test]
    fn unterminated_string_with_trailing_backslash_does_not_panic() {
        // P1: a dangling escape at EOF must not run `pos` past `src.len()`.
        for src in [r#"""#, r#""\"#, r#""abc\"#] {
            let toks = all_tokens(src);
            assert_eq!(toks[0].kind, String);
            assert_eq!(toks.last().unwrap().kind, TokenKind::EndOfInput);
        }
    }

    #[test]
    fn truncation_lands_on_a_char_boundary() {
        // P1: a string literal long enough to truncate, with a
        // multi-byte UTF-8 character straddling MAX_TOKEN_LEN, must not
        // panic and must stay valid UTF-8.
        let filler = "a".repeat(MAX_TOKEN_LEN - 1);
        let src = format!("\"{filler}\u{20AC}\u{20AC}\"");
        let toks = all_tokens(&src);
        assert_eq!(toks[0].kind, String);
        assert!(toks[0].lexeme.len() <= MAX_TOKEN_LEN);
    }
}
