//! Hand-written lexer for the target dialect.
//!
//! Breaks raw fragment source into tokens, each carrying its 1-based source
//! line so evaluation failures can point back at the offending line.

use std::iter::Peekable;
use std::str::Chars;

use super::parser::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    Keyword(Keyword),
    Punct(Punct),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Var,
    Function,
    If,
    Else,
    While,
    For,
    Return,
    Break,
    Continue,
    Typeof,
    True,
    False,
    Null,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    Dot,
    Question,
    Assign,
    AddAssign,
    SubAssign,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Gt,
    Le,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    AndAnd,
    OrOr,
    Not,
    PlusPlus,
    MinusMinus,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) line: u32,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: u32,
}

/// Tokenizes fragment source, appending a final `Eof` token.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
    };
    let mut tokens = Vec::new();

    loop {
        lexer.skip_trivia()?;
        let line = lexer.line;
        let Some(ch) = lexer.next_char() else {
            tokens.push(Token {
                kind: TokenKind::Eof,
                line,
            });
            return Ok(tokens);
        };

        let kind = match ch {
            '(' => TokenKind::Punct(Punct::LParen),
            ')' => TokenKind::Punct(Punct::RParen),
            '{' => TokenKind::Punct(Punct::LBrace),
            '}' => TokenKind::Punct(Punct::RBrace),
            '[' => TokenKind::Punct(Punct::LBracket),
            ']' => TokenKind::Punct(Punct::RBracket),
            ',' => TokenKind::Punct(Punct::Comma),
            ';' => TokenKind::Punct(Punct::Semi),
            ':' => TokenKind::Punct(Punct::Colon),
            '.' => TokenKind::Punct(Punct::Dot),
            '?' => TokenKind::Punct(Punct::Question),
            '%' => TokenKind::Punct(Punct::Percent),
            '*' => TokenKind::Punct(Punct::Star),
            '/' => TokenKind::Punct(Punct::Slash),
            '+' => match lexer.peek_char() {
                Some('+') => {
                    lexer.next_char();
                    TokenKind::Punct(Punct::PlusPlus)
                }
                Some('=') => {
                    lexer.next_char();
                    TokenKind::Punct(Punct::AddAssign)
                }
                _ => TokenKind::Punct(Punct::Plus),
            },
            '-' => match lexer.peek_char() {
                Some('-') => {
                    lexer.next_char();
                    TokenKind::Punct(Punct::MinusMinus)
                }
                Some('=') => {
                    lexer.next_char();
                    TokenKind::Punct(Punct::SubAssign)
                }
                _ => TokenKind::Punct(Punct::Minus),
            },
            '=' => {
                if lexer.eat('=') {
                    if lexer.eat('=') {
                        TokenKind::Punct(Punct::EqEqEq)
                    } else {
                        TokenKind::Punct(Punct::EqEq)
                    }
                } else {
                    TokenKind::Punct(Punct::Assign)
                }
            }
            '!' => {
                if lexer.eat('=') {
                    if lexer.eat('=') {
                        TokenKind::Punct(Punct::NotEqEq)
                    } else {
                        TokenKind::Punct(Punct::NotEq)
                    }
                } else {
                    TokenKind::Punct(Punct::Not)
                }
            }
            '<' => {
                if lexer.eat('=') {
                    TokenKind::Punct(Punct::Le)
                } else {
                    TokenKind::Punct(Punct::Lt)
                }
            }
            '>' => {
                if lexer.eat('=') {
                    TokenKind::Punct(Punct::Ge)
                } else {
                    TokenKind::Punct(Punct::Gt)
                }
            }
            '&' => {
                if lexer.eat('&') {
                    TokenKind::Punct(Punct::AndAnd)
                } else {
                    return Err(ParseError::new("unexpected character '&'", line));
                }
            }
            '|' => {
                if lexer.eat('|') {
                    TokenKind::Punct(Punct::OrOr)
                } else {
                    return Err(ParseError::new("unexpected character '|'", line));
                }
            }
            '\'' | '"' => TokenKind::Str(lexer.read_string(ch, line)?),
            c if c.is_ascii_digit() => TokenKind::Number(lexer.read_number(c, line)?),
            c if is_ident_start(c) => {
                let word = lexer.read_ident(c);
                match keyword(&word) {
                    Some(kw) => TokenKind::Keyword(kw),
                    None => TokenKind::Ident(word),
                }
            }
            other => {
                return Err(ParseError::new(
                    format!("unexpected character '{other}'"),
                    line,
                ))
            }
        };

        tokens.push(Token { kind, line });
    }
}

impl Lexer<'_> {
    fn next_char(&mut self) -> Option<char> {
        let ch = self.chars.next();
        if ch == Some('\n') {
            self.line += 1;
        }
        ch
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.next_char();
            true
        } else {
            false
        }
    }

    /// Skips whitespace and both comment forms.
    ///
    /// A lone `/` is left in place for the tokenizer; the dialect has no
    /// regex literals, so `/` outside a comment is always division.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.next_char();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some('/') => {
                            while let Some(c) = self.next_char() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            let start = self.line;
                            self.next_char();
                            self.next_char();
                            loop {
                                match self.next_char() {
                                    Some('*') if self.peek_char() == Some('/') => {
                                        self.next_char();
                                        break;
                                    }
                                    Some(_) => {}
                                    None => {
                                        return Err(ParseError::new(
                                            "unterminated block comment",
                                            start,
                                        ))
                                    }
                                }
                            }
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_string(&mut self, quote: char, start: u32) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.next_char() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.next_char() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('\\') => out.push('\\'),
                    Some('\'') => out.push('\''),
                    Some('"') => out.push('"'),
                    Some('0') => out.push('\0'),
                    Some(other) => out.push(other),
                    None => return Err(ParseError::new("unterminated string literal", start)),
                },
                Some('\n') | None => {
                    return Err(ParseError::new("unterminated string literal", start))
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn read_number(&mut self, first: char, start: u32) -> Result<f64, ParseError> {
        let mut text = String::new();
        text.push(first);
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                text.push(c);
                self.next_char();
            } else {
                break;
            }
        }
        if self.peek_char() == Some('.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(char::is_ascii_digit) {
                text.push('.');
                self.next_char();
                while let Some(c) = self.peek_char() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.next_char();
                    } else {
                        break;
                    }
                }
            }
        }
        text.parse::<f64>()
            .map_err(|_| ParseError::new(format!("invalid number literal '{text}'"), start))
    }

    fn read_ident(&mut self, first: char) -> String {
        let mut word = String::new();
        word.push(first);
        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                word.push(c);
                self.next_char();
            } else {
                break;
            }
        }
        word
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn keyword(word: &str) -> Option<Keyword> {
    let kw = match word {
        "var" => Keyword::Var,
        "function" => Keyword::Function,
        "if" => Keyword::If,
        "else" => Keyword::Else,
        "while" => Keyword::While,
        "for" => Keyword::For,
        "return" => Keyword::Return,
        "break" => Keyword::Break,
        "continue" => Keyword::Continue,
        "typeof" => Keyword::Typeof,
        "true" => Keyword::True,
        "false" => Keyword::False,
        "null" => Keyword::Null,
        "undefined" => Keyword::Undefined,
        _ => return None,
    };
    Some(kw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_a_var_declaration() {
        assert_eq!(
            kinds("var x = 1;"),
            vec![
                TokenKind::Keyword(Keyword::Var),
                TokenKind::Ident("x".to_string()),
                TokenKind::Punct(Punct::Assign),
                TokenKind::Number(1.0),
                TokenKind::Punct(Punct::Semi),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn distinguishes_equality_operators() {
        assert_eq!(
            kinds("a == b === c != d !== e = f"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Punct(Punct::EqEq),
                TokenKind::Ident("b".to_string()),
                TokenKind::Punct(Punct::EqEqEq),
                TokenKind::Ident("c".to_string()),
                TokenKind::Punct(Punct::NotEq),
                TokenKind::Ident("d".to_string()),
                TokenKind::Punct(Punct::NotEqEq),
                TokenKind::Ident("e".to_string()),
                TokenKind::Punct(Punct::Assign),
                TokenKind::Ident("f".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#"'a\'b' "c\nd""#),
            vec![
                TokenKind::Str("a'b".to_string()),
                TokenKind::Str("c\nd".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_reports_its_line() {
        let err = tokenize("var ok = 1;\nvar bad = 'oops").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn comments_are_skipped_but_lines_still_count() {
        let tokens = tokenize("// first\n/* second\nthird */\nvar x;").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Var));
        assert_eq!(tokens[0].line, 4);
    }

    #[test]
    fn numbers_with_fractions_and_member_dots() {
        assert_eq!(
            kinds("1.5 a.b 2"),
            vec![
                TokenKind::Number(1.5),
                TokenKind::Ident("a".to_string()),
                TokenKind::Punct(Punct::Dot),
                TokenKind::Ident("b".to_string()),
                TokenKind::Number(2.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn increment_and_compound_assignment() {
        assert_eq!(
            kinds("i++ i-- i += 1 i -= 1"),
            vec![
                TokenKind::Ident("i".to_string()),
                TokenKind::Punct(Punct::PlusPlus),
                TokenKind::Ident("i".to_string()),
                TokenKind::Punct(Punct::MinusMinus),
                TokenKind::Ident("i".to_string()),
                TokenKind::Punct(Punct::AddAssign),
                TokenKind::Number(1.0),
                TokenKind::Ident("i".to_string()),
                TokenKind::Punct(Punct::SubAssign),
                TokenKind::Number(1.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn dollar_and_underscore_are_identifier_characters() {
        assert_eq!(
            kinds("var $tmp = _x;"),
            vec![
                TokenKind::Keyword(Keyword::Var),
                TokenKind::Ident("$tmp".to_string()),
                TokenKind::Punct(Punct::Assign),
                TokenKind::Ident("_x".to_string()),
                TokenKind::Punct(Punct::Semi),
                TokenKind::Eof,
            ]
        );
    }
}
