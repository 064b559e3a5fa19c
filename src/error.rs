use thiserror::Error;

use crate::lexer::LexError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed token: bad escape, unterminated literal, invalid number.
    Lexical,
    /// Grammar violation: unexpected or missing token.
    Syntax,
    /// Parseable but forbidden: duplicate bindings, invalid targets,
    /// strict-mode violations, reserved words, bad label references.
    Early,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Lexical => "LexicalError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Early => "EarlyError",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}: {} ({}:{})", .kind.name(), .message, .line, .column)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub(crate) fn at(
        kind: ErrorKind,
        message: impl Into<String>,
        source: &str,
        start: usize,
        end: usize,
    ) -> Self {
        let (line, column) = locate(source, start);
        ParseError {
            kind,
            message: message.into(),
            start,
            end: end.max(start),
            line,
            column,
        }
    }

    pub fn is_early(&self) -> bool {
        self.kind == ErrorKind::Early
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError {
            kind: ErrorKind::Lexical,
            message: e.message,
            start: e.offset,
            end: e.offset,
            line: e.line,
            column: e.column,
        }
    }
}

/// Line (1-based) and column (0-based, in chars) of a byte offset.
pub(crate) fn locate(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1;
    let mut column = 0;
    let mut chars = source.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if i >= offset {
            break;
        }
        match ch {
            '\r' => {
                if chars.peek().is_some_and(|&(j, c)| c == '\n' && j < offset) {
                    chars.next();
                }
                line += 1;
                column = 0;
            }
            '\n' | '\u{2028}' | '\u{2029}' => {
                line += 1;
                column = 0;
            }
            _ => column += 1,
        }
    }
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_counts_lines_and_chars() {
        assert_eq!(locate("abc", 0), (1, 0));
        assert_eq!(locate("abc", 2), (1, 2));
        assert_eq!(locate("a\nbc", 3), (2, 1));
        assert_eq!(locate("a\r\nb", 3), (2, 0));
        assert_eq!(locate("é x", 3), (1, 2));
    }

    #[test]
    fn display_includes_kind_and_position() {
        let err = ParseError::at(ErrorKind::Early, "Duplicate", "a\nbc", 3, 4);
        assert_eq!(err.to_string(), "EarlyError: Duplicate (2:1)");
    }
}
