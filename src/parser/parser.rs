//! Рекурсивный спуск с просмотром на один символ.
//!
//! ```text
//! construct  := EOF | 'd' definition | expression
//! definition := expression (';' expression)* <терминатор>
//! expression := 'a' name
//!             | 'f' name arguments
//!             | digit
//!             | op expression expression
//! arguments  := expression ('i' expression)* <терминатор>
//! ```
//!
//! Терминатор списка аргументов и тела функции (первый символ, не равный
//! `'i'` / `';'`) поглощается и отбрасывается, в поток он не возвращается.
//! Возврат символа происходит только для голого выражения верхнего уровня.

use std::io::Read;

use log::debug;

use super::error::ParseError;
use super::stream::CharStream;
use crate::ast::{BinaryOperator, Node};
use crate::backend::ENTRY_POINT_INDEX;

/// Парсер верхнеуровневых конструкций.
pub struct Parser<R: Read> {
    stream: CharStream<R>,
    /// Индекс, который получит следующее `d`-определение.
    next_function_index: i32,
}

/// Числовое значение символа-имени: `'0'` → 0 … `'9'` → 9. Для остальных
/// символов получается смещение от `'0'` (например, `';'` → 11).
fn name_index(c: char) -> i32 {
    c as i32 - '0' as i32
}

impl<R: Read> Parser<R> {
    /// Создать парсер; нумерация функций начинается с 0.
    pub fn new(reader: R) -> Self {
        Self::with_next_index(reader, 0)
    }

    /// Создать парсер, продолжающий нумерацию функций с `next_function_index`.
    pub fn with_next_index(reader: R, next_function_index: i32) -> Self {
        Self {
            stream: CharStream::new(reader),
            next_function_index,
        }
    }

    /// Индекс, который получит следующее определение функции.
    pub fn next_function_index(&self) -> i32 {
        self.next_function_index
    }

    /// Разобрать следующую конструкцию верхнего уровня.
    ///
    /// Возвращает `None` в конце ввода. Голое выражение оборачивается в
    /// определение точки входа (индекс 11).
    pub fn next_construct(&mut self) -> Result<Option<Node>, ParseError> {
        debug!("parse_instruction");
        match self.stream.next_char()? {
            None => {
                debug!("end of input");
                Ok(None)
            }
            Some('d') => self.parse_function_definition().map(Some),
            Some(c) => {
                debug!("top level expression");
                self.stream.pushback(c);
                let expr = self.parse_expression()?;
                Ok(Some(Node::function(ENTRY_POINT_INDEX, vec![expr])))
            }
        }
    }

    /// Разобрать одно выражение.
    /// Использует stacker, так как вложенность выражений не ограничена.
    pub fn parse_expression(&mut self) -> Result<Node, ParseError> {
        // 256KB red zone, 8MB stack growth
        stacker::maybe_grow(256 * 1024, 8 * 1024 * 1024, || self.parse_expression_inner())
    }

    fn parse_expression_inner(&mut self) -> Result<Node, ParseError> {
        debug!("parse_expression");
        match self.expect_char("expression")? {
            'a' => {
                let name = self.expect_char("variable name")?;
                Ok(Node::variable(name_index(name)))
            }
            'f' => {
                let name = self.expect_char("function name")?;
                let arguments = self.parse_arguments()?;
                Ok(Node::call(name_index(name), arguments))
            }
            c if c.is_ascii_digit() => Ok(Node::constant(name_index(c) as i16)),
            op => self.parse_binary_op(op),
        }
    }

    fn parse_binary_op(&mut self, code: char) -> Result<Node, ParseError> {
        debug!("parse_binop {:?}", code);
        let left = self.parse_expression()?;
        let right = self.parse_expression()?;
        Ok(Node::binary(BinaryOperator::decode(code), left, right))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Node>, ParseError> {
        debug!("parse_args");
        let mut arguments = Vec::new();
        loop {
            arguments.push(self.parse_expression()?);
            match self.stream.next_char()? {
                Some('i') => continue,
                terminator => {
                    debug!("argument list terminated by {:?}", terminator);
                    return Ok(arguments);
                }
            }
        }
    }

    fn parse_function_definition(&mut self) -> Result<Node, ParseError> {
        debug!("parse_funcdef");
        let mut body = Vec::new();
        loop {
            body.push(self.parse_expression()?);
            match self.stream.next_char()? {
                Some(';') => continue,
                terminator => {
                    debug!("function body terminated by {:?}", terminator);
                    break;
                }
            }
        }

        let index = self.next_function_index;
        self.next_function_index += 1;
        Ok(Node::function(index, body))
    }

    fn expect_char(&mut self, expected: &str) -> Result<char, ParseError> {
        self.stream
            .next_char()?
            .ok_or_else(|| ParseError::unexpected_eof(self.stream.offset(), expected))
    }
}

impl<R: Read> Iterator for Parser<R> {
    type Item = Result<Node, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_construct().transpose()
    }
}
