//! Модуль парсера Waterkoker.
//!
//! Язык префиксный, каждая лексема — один символ, пробелы игнорируются.
//!
//! # Синтаксис
//!
//! ```text
//! 7          ; константа (только одна цифра)
//! a3         ; параметр a3 текущей функции
//! +12        ; сложение 1 + 2
//! -a0a1      ; вычитание
//! f0 1i2.    ; вызов f0(1, 2), '.' — поглощаемый терминатор
//! d +a0a1.   ; определение функции (индексы 0, 1, 2, ... по порядку)
//! d 1;2;3.   ; тело из нескольких выражений, возвращается последнее
//! ```
//!
//! Голое выражение на верхнем уровне становится телом точки входа `main`.
//!
//! # Пример
//!
//! ```rust,ignore
//! use waterkoker::parser::parse;
//!
//! let constructs = parse("d+a0a1. f0 1i2.").unwrap();
//! ```

pub mod error;
pub mod parser;
pub mod stream;

pub use error::ParseError;
pub use parser::Parser;
pub use stream::CharStream;

use crate::ast::Node;

/// Разбирает весь исходный текст в список конструкций верхнего уровня.
pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
    Parser::new(source.as_bytes()).collect()
}

/// Разбирает одно выражение (без обёртки в точку входа).
pub fn parse_expr(source: &str) -> Result<Node, ParseError> {
    Parser::new(source.as_bytes()).parse_expression()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOperator;

    #[test]
    fn test_parse_program() {
        let constructs = parse("d+a0a1. f0 1i2.").unwrap();
        assert_eq!(constructs.len(), 2);
        assert!(constructs.iter().all(Node::is_definition));
    }

    #[test]
    fn test_parse_expr() {
        let node = parse_expr("-9a1").unwrap();
        assert_eq!(
            node,
            Node::binary(BinaryOperator::Subtract, Node::constant(9), Node::variable(1))
        );
    }

    #[test]
    fn test_parse_error_propagates() {
        assert!(parse("1 +2").is_err());
    }
}
