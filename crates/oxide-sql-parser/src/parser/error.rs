//! Parser error types.

use core::fmt;

use crate::arena::ArenaError;
use crate::lexer::{Location, Span, Token, TokenKind};
use crate::validator::ValidationError;

/// Broad classification of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input does not match the grammar.
    Syntax,
    /// Nesting went past the configured recursion limit.
    DepthExceeded,
    /// The statement parsed but broke a structural rule.
    Validation,
    /// The arena could not grow.
    OutOfMemory,
}

impl ErrorKind {
    /// Returns the kind's display name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax error",
            Self::DepthExceeded => "nesting too deep",
            Self::Validation => "validation error",
            Self::OutOfMemory => "out of memory",
        }
    }
}

/// A parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong, broadly.
    pub kind: ErrorKind,
    /// The error message.
    pub message: String,
    /// Line, column and byte offset of the offending input.
    pub location: Location,
    /// The location of the error.
    pub span: Span,
    /// The source line containing the error, when known.
    pub context: Option<String>,
    /// Expected tokens (if applicable).
    pub expected: Option<String>,
    /// The text of the token found instead.
    pub found: Option<String>,
}

impl ParseError {
    /// Creates a new error of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: Location, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
            span,
            context: None,
            expected: None,
            found: None,
        }
    }

    /// Creates a syntax error.
    #[must_use]
    pub fn syntax(message: impl Into<String>, location: Location, span: Span) -> Self {
        Self::new(ErrorKind::Syntax, message, location, span)
    }

    /// Creates an "unexpected token" error.
    ///
    /// Lexer error tokens report their own diagnosis instead of the
    /// generic message.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: &Token<'_>) -> Self {
        let expected: String = expected.into();
        let message = match found.kind {
            TokenKind::Error(reason) => format!("{reason}: '{}'", found.text),
            _ => format!("Unexpected token: expected {expected}, found '{}'", found.text),
        };
        Self {
            expected: Some(expected),
            found: Some(found.text.to_owned()),
            ..Self::syntax(message, found.location(), found.span)
        }
    }

    /// Creates an "unexpected end of input" error.
    #[must_use]
    pub fn unexpected_eof(expected: impl Into<String>, location: Location) -> Self {
        let expected: String = expected.into();
        Self {
            expected: Some(expected.clone()),
            found: Some(String::from("end of input")),
            ..Self::syntax(
                format!("Unexpected end of input: expected {expected}"),
                location,
                Span::new(location.offset, location.offset),
            )
        }
    }

    /// Creates a recursion-limit error.
    #[must_use]
    pub fn depth_exceeded(limit: usize, location: Location, span: Span) -> Self {
        Self::new(
            ErrorKind::DepthExceeded,
            format!("Maximum nesting depth of {limit} exceeded"),
            location,
            span,
        )
    }

    /// Nesting rejected because the parse used up its stack budget.
    #[must_use]
    pub fn stack_exhausted(budget: usize, depth: usize, location: Location, span: Span) -> Self {
        Self::new(
            ErrorKind::DepthExceeded,
            format!("Nesting depth {depth} exceeds the stack budget of {budget} bytes"),
            location,
            span,
        )
    }

    /// Fills [`context`](Self::context) with the source line the error
    /// points at.
    #[must_use]
    pub fn with_source(mut self, source: &str) -> Self {
        if self.context.is_none() && self.kind != ErrorKind::OutOfMemory {
            let offset = self.location.offset.min(source.len());
            let start = source[..offset].rfind('\n').map_or(0, |pos| pos + 1);
            let end = source[offset..]
                .find('\n')
                .map_or(source.len(), |pos| offset + pos);
            let line = source[start..end].trim_end();
            if !line.is_empty() {
                self.context = Some(line.to_owned());
            }
        }
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at line {}, column {}",
            self.kind.as_str(),
            self.message,
            self.location.line,
            self.location.column
        )?;
        if let Some(context) = &self.context {
            let caret = usize::try_from(self.location.column.saturating_sub(1)).unwrap_or(0);
            write!(f, "\n  {context}\n  {:caret$}^", "")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<ArenaError> for ParseError {
    fn from(err: ArenaError) -> Self {
        Self::new(
            ErrorKind::OutOfMemory,
            err.to_string(),
            Location::default(),
            Span::default(),
        )
    }
}

impl From<ValidationError> for ParseError {
    fn from(err: ValidationError) -> Self {
        Self {
            expected: Some(err.rule.as_str().to_owned()),
            ..Self::new(ErrorKind::Validation, err.message, err.location, err.span)
        }
    }
}
