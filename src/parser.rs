// ABOUTME: Recursive-descent parser — consumes the token stream and allocates
// directly into the pool.

use crate::error::LispError;
use crate::location::SourceLoc;
use crate::pool::Pool;
use crate::tokenizer::{tokenize, Token, TokenKind};
use crate::value::ValueHandle;

struct Parser<'p, 'r> {
    pool: &'p mut Pool,
    tokens: &'r [Token],
    pos: usize,
}

impl<'p, 'r> Parser<'p, 'r> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_value(&mut self) -> Result<ValueHandle, LispError> {
        let tok = self
            .advance()
            .ok_or_else(|| LispError::syntax("Unexpected end of input", None))?
            .clone();
        match tok.kind {
            TokenKind::LeftParen => self.parse_list(tok.loc),
            TokenKind::RightParen => Err(LispError::syntax("Unexpected )", Some(tok.loc))),
            TokenKind::Dot => Err(LispError::syntax("Unexpected .", Some(tok.loc))),
            TokenKind::Quote => self.parse_shorthand("quote", tok.loc),
            TokenKind::Quasiquote => self.parse_shorthand("quasiquote", tok.loc),
            TokenKind::Unquote => self.parse_shorthand("unquote", tok.loc),
            TokenKind::Boolean(b) => Ok(self.pool.make_value_at(crate::value::Value::Boolean(b), Some(tok.loc))),
            TokenKind::Number(n) => Ok(self.pool.make_value_at(crate::value::Value::Number(n), Some(tok.loc))),
            TokenKind::String(s) => Ok(self.pool.make_value_at(crate::value::Value::String(s), Some(tok.loc))),
            TokenKind::Symbol(s) => Ok(self.pool.make_value_at(crate::value::Value::Symbol(s), Some(tok.loc))),
        }
    }

    /// `'x` / `` `x `` / `,x` desugar to `(quote x)` / `(quasiquote x)` / `(unquote x)`.
    fn parse_shorthand(&mut self, form: &str, prefix_loc: SourceLoc) -> Result<ValueHandle, LispError> {
        let inner = self.parse_value()?;
        let inner_loc = self.pool.loc(inner);
        let loc = SourceLoc::from_range([&Some(prefix_loc), &inner_loc]);
        let sym = self.pool.symbol(form);
        let nil = self.pool.nil();
        let tail = self.pool.cons(inner, nil);
        Ok(self.pool.make_value_at(
            crate::value::Value::Pair { car: sym, cdr: tail },
            loc,
        ))
    }

    fn parse_list(&mut self, open_loc: SourceLoc) -> Result<ValueHandle, LispError> {
        let mut items = Vec::new();
        let mut tail = self.pool.nil();
        loop {
            match self.peek() {
                None => return Err(LispError::syntax("Unexpected end of input, expected )", Some(open_loc))),
                Some(Token { kind: TokenKind::RightParen, loc }) => {
                    let close_loc = loc.clone();
                    self.advance();
                    let whole_loc = SourceLoc::from_range([&Some(open_loc), &Some(close_loc)]);
                    return Ok(self.build_list(items, tail, whole_loc));
                }
                Some(Token { kind: TokenKind::Dot, .. }) => {
                    self.advance();
                    tail = self.parse_value()?;
                    match self.advance() {
                        Some(Token { kind: TokenKind::RightParen, loc }) => {
                            let whole_loc = SourceLoc::from_range([&Some(open_loc), &Some(loc.clone())]);
                            return Ok(self.build_list(items, tail, whole_loc));
                        }
                        _ => return Err(LispError::syntax("Expected ) after dotted tail", Some(open_loc))),
                    }
                }
                Some(_) => items.push(self.parse_value()?),
            }
        }
    }

    fn build_list(&mut self, items: Vec<ValueHandle>, tail: ValueHandle, loc: Option<SourceLoc>) -> ValueHandle {
        let mut cur = tail;
        for item in items.into_iter().rev() {
            cur = self.pool.cons(item, cur);
        }
        if let Some(loc) = loc {
            // Re-tag the outermost pair with the whole span; inner conses keep
            // their own (absent) location since they were synthesized here.
            // `nil` is a shared singleton, so an empty list `()` must not rewrite it.
            if cur != self.pool.nil() {
                self.pool.node_mut(cur).loc = Some(loc);
            }
        }
        cur
    }
}

/// Parse every top-level form in `src`, returning them in order.
pub fn parse_all(pool: &mut Pool, src: &str, file: &str) -> Result<Vec<ValueHandle>, LispError> {
    let tokens = tokenize(src, file)?;
    let mut parser = Parser { pool, tokens: &tokens, pos: 0 };
    let mut forms = Vec::new();
    while parser.peek().is_some() {
        forms.push(parser.parse_value()?);
    }
    Ok(forms)
}

/// Parse exactly one top-level form, failing if input has more than one.
pub fn parse_one(pool: &mut Pool, src: &str, file: &str) -> Result<ValueHandle, LispError> {
    let tokens = tokenize(src, file)?;
    let mut parser = Parser { pool, tokens: &tokens, pos: 0 };
    let value = parser.parse_value()?;
    if parser.peek().is_some() {
        return Err(LispError::syntax("Trailing input after expression", None));
    }
    Ok(value)
}

/// True while `src` has unbalanced opening parens/brackets — used by the REPL to
/// decide whether to show the continuation prompt instead of evaluating.
pub fn parens_are_balanced(src: &str) -> bool {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escape = false;
    let mut chars = src.chars().peekable();
    while let Some(c) = chars.next() {
        if in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            ';' => {
                for c2 in chars.by_ref() {
                    if c2 == '\n' {
                        break;
                    }
                }
            }
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_atoms() {
        let mut pool = Pool::new();
        let v = parse_one(&mut pool, "42", "t").unwrap();
        assert_eq!(pool.display(v), "42");
    }

    #[test]
    fn parses_nested_lists() {
        let mut pool = Pool::new();
        let v = parse_one(&mut pool, "(1 (2 3) 4)", "t").unwrap();
        assert_eq!(pool.display(v), "(1 (2 3) 4)");
    }

    #[test]
    fn parses_dotted_pairs() {
        let mut pool = Pool::new();
        let v = parse_one(&mut pool, "(1 . 2)", "t").unwrap();
        assert_eq!(pool.display(v), "(1 . 2)");
    }

    #[test]
    fn desugars_quote_shorthands() {
        let mut pool = Pool::new();
        let v = parse_one(&mut pool, "'a", "t").unwrap();
        assert_eq!(pool.display(v), "(quote a)");
        match pool.get(v) {
            crate::value::Value::Pair { car, .. } => {
                assert_eq!(pool.display(*car), "quote");
            }
            _ => panic!("expected pair"),
        }
    }

    #[test]
    fn parses_multiple_top_level_forms() {
        let mut pool = Pool::new();
        let forms = parse_all(&mut pool, "1 2 3", "t").unwrap();
        assert_eq!(forms.len(), 3);
    }

    #[test]
    fn unbalanced_parens_detected() {
        assert!(!parens_are_balanced("(1 (2 3)"));
        assert!(parens_are_balanced("(1 (2 3))"));
        assert!(parens_are_balanced("(+ 1 \"(\" 2)"));
    }

    #[test]
    fn unclosed_list_is_a_syntax_error() {
        let mut pool = Pool::new();
        let err = parse_one(&mut pool, "(1 2", "t").unwrap_err();
        assert!(err.message.contains("Unexpected end of input"));
    }
}
