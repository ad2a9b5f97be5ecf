// ABOUTME: Error types for the tokenizer, parser, and evaluator

use crate::location::SourceLoc;
use thiserror::Error;

/// The closed set of error kinds from the language's error handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SyntaxError,
    ValueError,
    TypeError,
    UnimplementedError,
    InternalError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::UnimplementedError => "UnimplementedError",
            ErrorKind::InternalError => "InternalError",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind}:\n {message}{}", self.loc_suffix())]
pub struct LispError {
    pub kind: ErrorKind,
    pub message: String,
    pub loc: Option<SourceLoc>,
}

impl LispError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        LispError {
            kind,
            message: message.into(),
            loc: None,
        }
    }

    pub fn with_loc(kind: ErrorKind, message: impl Into<String>, loc: Option<SourceLoc>) -> Self {
        LispError {
            kind,
            message: message.into(),
            loc,
        }
    }

    pub fn syntax(message: impl Into<String>, loc: Option<SourceLoc>) -> Self {
        Self::with_loc(ErrorKind::SyntaxError, message, loc)
    }

    pub fn value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueError, message)
    }

    pub fn value_at(message: impl Into<String>, loc: Option<SourceLoc>) -> Self {
        Self::with_loc(ErrorKind::ValueError, message, loc)
    }

    pub fn type_err(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn type_err_at(message: impl Into<String>, loc: Option<SourceLoc>) -> Self {
        Self::with_loc(ErrorKind::TypeError, message, loc)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnimplementedError, message)
    }

    fn loc_suffix(&self) -> String {
        match &self.loc {
            Some(loc) => format!("\n  {}", loc),
            None => String::new(),
        }
    }
}
