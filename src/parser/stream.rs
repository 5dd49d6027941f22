//! Поток символов для парсера.
//!
//! Читает источник побайтно, пропускает пробельные символы и позволяет
//! вернуть ровно один прочитанный символ обратно.

use std::io::{BufReader, Bytes, Read};

use super::error::ParseError;

/// Поток символов без пробелов с возвратом одного символа.
pub struct CharStream<R: Read> {
    bytes: Bytes<BufReader<R>>,
    pushed_back: Option<char>,
    offset: usize,
}

/// Пробел в смысле C `isspace`: включает `\v`, которого нет в
/// [`u8::is_ascii_whitespace`].
fn is_space(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == 0x0B
}

impl<R: Read> CharStream<R> {
    /// Создать поток поверх источника.
    pub fn new(reader: R) -> Self {
        Self {
            bytes: BufReader::new(reader).bytes(),
            pushed_back: None,
            offset: 0,
        }
    }

    /// Следующий непробельный символ или `None` в конце ввода.
    pub fn next_char(&mut self) -> Result<Option<char>, ParseError> {
        if let Some(c) = self.pushed_back.take() {
            return Ok(Some(c));
        }

        loop {
            match self.bytes.next() {
                Some(Ok(byte)) => {
                    self.offset += 1;
                    if !is_space(byte) {
                        return Ok(Some(char::from(byte)));
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(None),
            }
        }
    }

    /// Вернуть символ в поток. Грамматике нужен максимум один.
    pub fn pushback(&mut self, c: char) {
        debug_assert!(
            self.pushed_back.is_none(),
            "only one character of pushback is supported"
        );
        self.pushed_back = Some(c);
    }

    /// Количество прочитанных из источника байт.
    pub fn offset(&self) -> usize {
        self.offset
    }
}
