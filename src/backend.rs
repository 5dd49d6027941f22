//! Модуль `backend`
//!
//! Интерфейс генератора кода, в который понижается AST. Реализации:
//! - [`crate::ir::IrBackend`] — текстовый IR внутри крейта (по умолчанию);
//! - `llvm_backend::LlvmBackend` — LLVM через inkwell (feature `llvm_backend`).
//!
//! Единственный тип значений — 16-битное знаковое целое.

use crate::error::CompileResult;

/// Индекс функции-точки входа.
pub const ENTRY_POINT_INDEX: i32 = 11;

/// Имя точки входа в модуле.
pub const ENTRY_POINT_NAME: &str = "main";

/// Число параметров у любой обычной функции.
pub const PARAM_COUNT: u32 = 10;

/// Ширина целочисленного типа в битах.
pub const INT_BITS: u32 = 16;

/// Имя функции в модуле по её индексу.
pub fn function_name(index: i32) -> String {
    if index == ENTRY_POINT_INDEX {
        ENTRY_POINT_NAME.to_string()
    } else {
        format!("f{}", index)
    }
}

/// Число параметров функции по её индексу.
pub fn param_count(index: i32) -> u32 {
    if index == ENTRY_POINT_INDEX {
        0
    } else {
        PARAM_COUNT
    }
}

/// Генератор кода.
///
/// Все инструкции добавляются в тело, открытое последним вызовом
/// [`Backend::start_body`].
pub trait Backend {
    /// Ссылка на вычисленное значение.
    type Value: Copy;
    /// Ссылка на объявленную функцию.
    type Function: Copy;
    /// Результат финализации единицы компиляции.
    type Output;

    /// Объявить функцию `name` с `param_count` целочисленными параметрами.
    /// Повторное имя уникализируется реализацией.
    fn declare_function(&mut self, name: &str, param_count: u32)
        -> CompileResult<Self::Function>;

    /// Открыть тело функции.
    fn start_body(&mut self, function: Self::Function) -> CompileResult<()>;

    /// Значение параметра с номером `position`.
    fn param(&mut self, function: Self::Function, position: u32) -> CompileResult<Self::Value>;

    fn const_int(&mut self, value: i16) -> Self::Value;

    fn build_add(&mut self, lhs: Self::Value, rhs: Self::Value) -> CompileResult<Self::Value>;

    fn build_sub(&mut self, lhs: Self::Value, rhs: Self::Value) -> CompileResult<Self::Value>;

    fn build_call(
        &mut self,
        function: Self::Function,
        args: &[Self::Value],
    ) -> CompileResult<Self::Value>;

    fn build_return(&mut self, value: Self::Value) -> CompileResult<()>;

    /// Завершить единицу компиляции.
    fn finish(self) -> CompileResult<Self::Output>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_names() {
        assert_eq!(function_name(0), "f0");
        assert_eq!(function_name(9), "f9");
        assert_eq!(function_name(42), "f42");
        assert_eq!(function_name(ENTRY_POINT_INDEX), "main");
    }

    #[test]
    fn test_param_count() {
        assert_eq!(param_count(ENTRY_POINT_INDEX), 0);
        assert_eq!(param_count(0), PARAM_COUNT);
        assert_eq!(param_count(-3), PARAM_COUNT);
    }
}
