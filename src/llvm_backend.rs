//! Модуль `llvm_backend`
//!
//! Реализация [`Backend`] поверх LLVM через inkwell.
//!
//! Включается feature-флагом `llvm_backend`.

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::{BasicMetadataTypeEnum, IntType};
use inkwell::values::{BasicMetadataValueEnum, FunctionValue, IntValue};

use crate::backend::Backend;
use crate::error::{CompileError, CompileResult};

/// LLVM Backend для компиляции Waterkoker.
pub struct LlvmBackend<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
}

impl<'ctx> LlvmBackend<'ctx> {
    /// Создать новый LLVM backend.
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        Self {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
        }
    }

    /// Получить LLVM IR как строку.
    pub fn get_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    fn int_type(&self) -> IntType<'ctx> {
        self.context.i16_type()
    }
}

fn backend_error(e: impl std::fmt::Display) -> CompileError {
    CompileError::Backend(e.to_string())
}

impl<'ctx> Backend for LlvmBackend<'ctx> {
    type Value = IntValue<'ctx>;
    type Function = FunctionValue<'ctx>;
    type Output = String;

    fn declare_function(
        &mut self,
        name: &str,
        param_count: u32,
    ) -> CompileResult<FunctionValue<'ctx>> {
        let int_type = self.int_type();
        let params: Vec<BasicMetadataTypeEnum<'ctx>> = vec![int_type.into(); param_count as usize];
        let fn_type = int_type.fn_type(&params, false);
        // LLVM сам уникализирует повторное имя: main, main.1, ...
        let function = self
            .module
            .add_function(name, fn_type, Some(Linkage::External));

        for (i, param) in function.get_param_iter().enumerate() {
            param.into_int_value().set_name(&format!("a{}", i));
        }
        Ok(function)
    }

    fn start_body(&mut self, function: FunctionValue<'ctx>) -> CompileResult<()> {
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);
        Ok(())
    }

    fn param(&mut self, function: FunctionValue<'ctx>, position: u32) -> CompileResult<IntValue<'ctx>> {
        function
            .get_nth_param(position)
            .map(|p| p.into_int_value())
            .ok_or_else(|| {
                CompileError::Backend(format!(
                    "function {:?} has no parameter {}",
                    function.get_name(),
                    position
                ))
            })
    }

    fn const_int(&mut self, value: i16) -> IntValue<'ctx> {
        self.int_type().const_int(value as u64, true)
    }

    fn build_add(&mut self, lhs: IntValue<'ctx>, rhs: IntValue<'ctx>) -> CompileResult<IntValue<'ctx>> {
        self.builder
            .build_int_add(lhs, rhs, "addtemp")
            .map_err(backend_error)
    }

    fn build_sub(&mut self, lhs: IntValue<'ctx>, rhs: IntValue<'ctx>) -> CompileResult<IntValue<'ctx>> {
        self.builder
            .build_int_sub(lhs, rhs, "mintemp")
            .map_err(backend_error)
    }

    fn build_call(
        &mut self,
        function: FunctionValue<'ctx>,
        args: &[IntValue<'ctx>],
    ) -> CompileResult<IntValue<'ctx>> {
        if function.count_params() as usize != args.len() {
            return Err(CompileError::Backend(format!(
                "call to {:?} with {} arguments, expected {}",
                function.get_name(),
                args.len(),
                function.count_params()
            )));
        }

        let args: Vec<BasicMetadataValueEnum<'ctx>> = args.iter().map(|a| (*a).into()).collect();
        let call = self
            .builder
            .build_call(function, &args, "calltemp")
            .map_err(backend_error)?;

        call.try_as_basic_value()
            .left()
            .map(|v| v.into_int_value())
            .ok_or(CompileError::Backend("Call returned void".to_string()))
    }

    fn build_return(&mut self, value: IntValue<'ctx>) -> CompileResult<()> {
        self.builder
            .build_return(Some(&value))
            .map_err(backend_error)?;
        Ok(())
    }

    fn finish(self) -> CompileResult<String> {
        self.module.verify().map_err(backend_error)?;
        Ok(self.get_ir())
    }
}

// === Тесты ===

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;

    #[test]
    fn test_compile_function() {
        let context = Context::create();
        let backend = LlvmBackend::new(&context, "Waterkoker");
        let ir = compile("d+a0a1. f0 1i2.".as_bytes(), backend).unwrap();

        assert!(ir.contains("; ModuleID = 'Waterkoker'"));
        assert!(ir.contains("define i16 @f0(i16 %a0"));
        assert!(ir.contains("add i16 %a0, %a1"));
        assert!(ir.contains("call i16 @f0("));
        assert!(ir.contains("define i16 @main()"));
    }

    #[test]
    fn test_subtraction() {
        let context = Context::create();
        let backend = LlvmBackend::new(&context, "test");
        let ir = compile("d-a1a0.".as_bytes(), backend).unwrap();
        assert!(ir.contains("sub i16 %a1, %a0"));
    }

    #[test]
    fn test_colliding_entry_points() {
        let context = Context::create();
        let backend = LlvmBackend::new(&context, "test");
        let ir = compile("1 2".as_bytes(), backend).unwrap();
        assert!(ir.contains("@main()"));
        assert!(ir.contains("@main.1()"));
    }

    #[test]
    fn test_undefined_function() {
        let context = Context::create();
        let backend = LlvmBackend::new(&context, "test");
        assert_eq!(
            compile("f01.".as_bytes(), backend),
            Err(CompileError::UndefinedFunction("f0".to_string()))
        );
    }

    #[test]
    fn test_negative_constant() {
        let context = Context::create();
        let mut backend = LlvmBackend::new(&context, "test");
        let value = backend.const_int(-5);
        assert_eq!(value.get_sign_extended_constant(), Some(-5));
    }
}
