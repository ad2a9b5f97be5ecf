// ABOUTME: Hand-written scanner turning source text into a located token stream.

use crate::error::LispError;
use crate::location::SourceLoc;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LeftParen,
    RightParen,
    Quote,
    Quasiquote,
    Unquote,
    Dot,
    Boolean(bool),
    Number(f64),
    String(String),
    Symbol(String),
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: SourceLoc,
}

struct Scanner<'a> {
    chars: Vec<char>,
    pos: usize,
    row: usize,
    col: usize,
    file: Rc<str>,
    _src: &'a str,
}

fn is_token_end(c: char) -> bool {
    matches!(c, '(' | ')' | '\'' | '`' | ',' | '"')
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "+-!$%&*./:<>=?@~_".contains(c)
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str, file: &str) -> Self {
        Scanner {
            chars: src.chars().collect(),
            pos: 0,
            row: 1,
            col: 1,
            file: Rc::from(file),
            _src: src,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.row += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn here(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn loc_at(&self, row: usize, col: usize, len: usize) -> SourceLoc {
        SourceLoc::new(self.file.clone(), row, col, len)
    }

    fn next_token(&mut self) -> Result<Option<Token>, LispError> {
        loop {
            match self.peek() {
                None => return Ok(None),
                Some(';') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('(') => {
                    let (row, col) = self.here();
                    self.advance();
                    return Ok(Some(Token {
                        kind: TokenKind::LeftParen,
                        loc: self.loc_at(row, col, 1),
                    }));
                }
                Some(')') => {
                    let (row, col) = self.here();
                    self.advance();
                    return Ok(Some(Token {
                        kind: TokenKind::RightParen,
                        loc: self.loc_at(row, col, 1),
                    }));
                }
                Some('\'') => {
                    let (row, col) = self.here();
                    self.advance();
                    return Ok(Some(Token {
                        kind: TokenKind::Quote,
                        loc: self.loc_at(row, col, 1),
                    }));
                }
                Some('`') => {
                    let (row, col) = self.here();
                    self.advance();
                    return Ok(Some(Token {
                        kind: TokenKind::Quasiquote,
                        loc: self.loc_at(row, col, 1),
                    }));
                }
                Some(',') => {
                    let (row, col) = self.here();
                    self.advance();
                    return Ok(Some(Token {
                        kind: TokenKind::Unquote,
                        loc: self.loc_at(row, col, 1),
                    }));
                }
                Some('#') => return self.boolean_literal(),
                Some('"') => return self.string_literal(),
                Some(_) => return self.number_or_symbol(),
            }
        }
    }

    fn boolean_literal(&mut self) -> Result<Option<Token>, LispError> {
        let (row, col) = self.here();
        self.advance(); // '#'
        match self.peek() {
            Some('t') => {
                self.advance();
                Ok(Some(Token {
                    kind: TokenKind::Boolean(true),
                    loc: self.loc_at(row, col, 2),
                }))
            }
            Some('f') => {
                self.advance();
                Ok(Some(Token {
                    kind: TokenKind::Boolean(false),
                    loc: self.loc_at(row, col, 2),
                }))
            }
            _ => Err(LispError::syntax(
                "Unexpected character after #",
                Some(self.loc_at(row, col, 1)),
            )),
        }
    }

    fn string_literal(&mut self) -> Result<Option<Token>, LispError> {
        let (row, col) = self.here();
        self.advance(); // opening quote
        let mut value = String::new();
        let mut len = 2; // the two quote characters
        loop {
            match self.peek() {
                None => {
                    return Err(LispError::syntax(
                        "Unexpected end of string literal",
                        Some(self.loc_at(row, col, len)),
                    ))
                }
                Some('"') => {
                    self.advance();
                    return Ok(Some(Token {
                        kind: TokenKind::String(value),
                        loc: self.loc_at(row, col, len),
                    }));
                }
                Some('\\') => {
                    self.advance();
                    len += 1;
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some(other) => value.push(other),
                        None => {
                            return Err(LispError::syntax(
                                "Unexpected end of string literal",
                                Some(self.loc_at(row, col, len)),
                            ))
                        }
                    }
                    len += 1;
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                    len += 1;
                }
            }
        }
    }

    fn number_or_symbol(&mut self) -> Result<Option<Token>, LispError> {
        let (row, col) = self.here();
        let start = self.pos;
        loop {
            match self.peek() {
                Some(c) if !c.is_whitespace() && !is_token_end(c) => {
                    self.advance();
                }
                _ => break,
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let len = text.chars().count();

        if text == "." {
            return Ok(Some(Token {
                kind: TokenKind::Dot,
                loc: self.loc_at(row, col, len),
            }));
        }

        let first = text.chars().next().unwrap();
        if first.is_ascii_digit() || first == '+' || first == '-' || first == '.' {
            if let Ok(n) = text.parse::<f64>() {
                return Ok(Some(Token {
                    kind: TokenKind::Number(n),
                    loc: self.loc_at(row, col, len),
                }));
            }
        }

        if !text.chars().all(is_symbol_char) {
            return Err(LispError::syntax(
                format!("Invalid symbol: {text}"),
                Some(self.loc_at(row, col, len)),
            ));
        }

        Ok(Some(Token {
            kind: TokenKind::Symbol(text),
            loc: self.loc_at(row, col, len),
        }))
    }
}

/// Tokenize an entire source string, starting at row 1, column 1.
pub fn tokenize(src: &str, file: &str) -> Result<Vec<Token>, LispError> {
    let mut scanner = Scanner::new(src, file);
    let mut tokens = Vec::new();
    while let Some(tok) = scanner.next_token()? {
        tokens.push(tok);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_atoms() {
        let tokens = tokenize("42 -3.5 #t #f \"hi\\n\" sym", "t").unwrap();
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[0].kind, TokenKind::Number(42.0));
        assert_eq!(tokens[1].kind, TokenKind::Number(-3.5));
        assert_eq!(tokens[2].kind, TokenKind::Boolean(true));
        assert_eq!(tokens[3].kind, TokenKind::Boolean(false));
        assert_eq!(tokens[4].kind, TokenKind::String("hi\n".into()));
        assert_eq!(tokens[5].kind, TokenKind::Symbol("sym".into()));
    }

    #[test]
    fn tokenizes_parens_and_quote_shorthands() {
        let tokens = tokenize("('a `b ,c)", "t").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LeftParen,
                TokenKind::Quote,
                TokenKind::Symbol("a".into()),
                TokenKind::Quasiquote,
                TokenKind::Symbol("b".into()),
                TokenKind::Unquote,
                TokenKind::Symbol("c".into()),
                TokenKind::RightParen,
            ]
        );
    }

    #[test]
    fn skips_comments() {
        let tokens = tokenize("1 ; a comment\n2", "t").unwrap();
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn tracks_row_and_column() {
        let tokens = tokenize("1\n  2", "t").unwrap();
        assert_eq!(tokens[0].loc.row, 1);
        assert_eq!(tokens[0].loc.col, 1);
        assert_eq!(tokens[1].loc.row, 2);
        assert_eq!(tokens[1].loc.col, 3);
    }

    #[test]
    fn unterminated_string_is_a_syntax_error() {
        let err = tokenize("\"abc", "t").unwrap_err();
        assert!(err.message.contains("Unexpected end of string literal"));
    }
}
