//! Определения ошибок для Waterkoker.
//!
//! Любая ошибка фатальна для всей единицы компиляции: ничего не
//! повторяется и ничего не выводится частично.

use thiserror::Error;

use crate::parser::ParseError;

/// Основной тип `Result` для библиотеки.
pub type CompileResult<T> = Result<T, CompileError>;

/// Перечисление всех возможных ошибок.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Undefined variable a{0}")]
    UndefinedVariable(i32),

    #[error("Undefined function {0}")]
    UndefinedFunction(String),

    #[error("Unknown operator {0:?}")]
    UnknownOperator(char),

    #[error("Function {0} has an empty body")]
    EmptyFunctionBody(i32),

    #[error("Function definition {0} used as an expression")]
    NestedDefinition(i32),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Call depth exceeded ({0} nested calls)")]
    CallDepthExceeded(usize),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CompileError {
    fn from(err: std::io::Error) -> Self {
        CompileError::Io(err.to_string())
    }
}
