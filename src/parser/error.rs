//! Ошибки парсера.

use thiserror::Error;

/// Ошибка парсинга.
///
/// Парсер не делает семантических проверок, поэтому ошибок всего две:
/// вход кончился посреди выражения или упало чтение источника.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Неожиданный конец ввода.
    #[error("Unexpected end of input at offset {offset}: expected {expected}")]
    UnexpectedEof { offset: usize, expected: String },

    /// Ошибка чтения источника.
    #[error("Read error: {0}")]
    Io(String),
}

impl ParseError {
    /// Создать ошибку "неожиданный конец".
    pub fn unexpected_eof(offset: usize, expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            offset,
            expected: expected.into(),
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_eof_message() {
        let err = ParseError::unexpected_eof(5, "expression");
        assert_eq!(
            err,
            ParseError::UnexpectedEof {
                offset: 5,
                expected: "expression".to_string()
            }
        );
        assert_eq!(
            err.to_string(),
            "Unexpected end of input at offset 5: expected expression"
        );
    }
}
