//! # Waterkoker
//!
//! Минимальный фронтенд префиксного игрушечного языка: поток символов →
//! AST → понижение в типизированный IR через интерфейс бэкенда.
//!
//! ## Основные модули
//!
//! - [`parser`] - посимвольный парсер с возвратом одного символа
//! - [`ast`] - узлы синтаксического дерева
//! - [`lower`] - понижение AST в вызовы [`backend::Backend`]
//! - [`ir`] - текстовый IR (бэкенд по умолчанию)
//! - [`interpreter`] - целочисленный интерпретатор IR
//! - [`compiler`] - драйвер единицы компиляции
//! - `llvm_backend` - компиляция в LLVM IR (требует feature `llvm_backend`)
//!
//! ## Features
//!
//! - `llvm_backend` - Включает генерацию LLVM IR через inkwell
//!
//! ## Пример использования
//!
//! ```rust,ignore
//! use waterkoker::compiler::run_str;
//!
//! // f0(a0, a1) = a0 + a1; main = f0(1, 2)
//! let values = run_str("d+a0a1. f0 1i2.").unwrap();
//! assert_eq!(values, vec![3]);
//! ```

// === Основные модули ===
pub mod ast;
pub mod error;
pub mod lower;
pub mod parser;

// === Бэкенды ===
pub mod backend;
pub mod compiler;
pub mod interpreter;
pub mod ir;

#[cfg(feature = "llvm_backend")]
pub mod llvm_backend;

// === Re-exports для удобства ===
pub use ast::{BinaryOperator, FunctionDef, Node};
pub use backend::Backend;
pub use compiler::{compile, compile_str, compile_to_file, run_str, CompileOptions};
pub use error::{CompileError, CompileResult};
pub use interpreter::Interpreter;
pub use ir::{IrBackend, IrModule};
pub use lower::Lowerer;
pub use parser::{parse, parse_expr, ParseError, Parser};
