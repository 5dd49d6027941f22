//! Простой рекурсивный интерпретатор IR.
//!
//! Выполняет [`IrModule`] как обычный целочисленный вычислитель:
//! сложение и вычитание по модулю 2^16, вызовы по значению.

use log::debug;

use crate::backend::INT_BITS;
use crate::error::{CompileError, CompileResult};
use crate::ir::{BinaryKind, FunctionId, Instruction, IrModule, Operand};

/// Максимальная глубина вложенных вызовов.
pub const MAX_CALL_DEPTH: usize = 10_000;

/// Интерпретатор модуля.
pub struct Interpreter<'m> {
    module: &'m IrModule,
    depth: usize,
    max_depth: usize,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m IrModule) -> Self {
        Self {
            module,
            depth: 0,
            max_depth: MAX_CALL_DEPTH,
        }
    }

    /// Ограничить глубину вызовов.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Вызвать функцию по имени.
    pub fn call(&mut self, name: &str, args: &[i16]) -> CompileResult<i16> {
        let id = self
            .module
            .get_function(name)
            .ok_or_else(|| CompileError::UndefinedFunction(name.to_string()))?;
        self.call_function(id, args)
    }

    /// Выполнить все точки входа в порядке определения.
    pub fn run_entry_points(&mut self) -> CompileResult<Vec<i16>> {
        let module = self.module;
        module
            .entry_points()
            .iter()
            .map(|&id| self.call_function(id, &[]))
            .collect()
    }

    /// Выполнить функцию.
    /// Использует stacker для автоматического расширения стека при глубокой рекурсии.
    pub fn call_function(&mut self, id: FunctionId, args: &[i16]) -> CompileResult<i16> {
        if self.depth >= self.max_depth {
            return Err(CompileError::CallDepthExceeded(self.depth));
        }

        self.depth += 1;
        // 256KB red zone, 8MB stack growth
        let result = stacker::maybe_grow(256 * 1024, 8 * 1024 * 1024, || {
            self.eval_function(id, args)
        });
        self.depth -= 1;
        result
    }

    fn eval_function(&mut self, id: FunctionId, args: &[i16]) -> CompileResult<i16> {
        let module = self.module;
        let function = module
            .function(id)
            .ok_or_else(|| CompileError::Backend(format!("unknown function id {}", id.0)))?;
        if args.len() != function.param_count as usize {
            return Err(CompileError::Backend(format!(
                "@{} expects {} arguments, got {}",
                function.name,
                function.param_count,
                args.len()
            )));
        }
        debug!("eval @{}{:?}", function.name, args);

        let mut temps = vec![0i16; function.temp_count()];
        for inst in &function.body {
            match inst {
                Instruction::Binary {
                    dest,
                    kind,
                    lhs,
                    rhs,
                } => {
                    let a = read(&temps, args, *lhs)?;
                    let b = read(&temps, args, *rhs)?;
                    temps[*dest as usize] = match kind {
                        BinaryKind::Add => a.wrapping_add(b),
                        BinaryKind::Sub => a.wrapping_sub(b),
                    };
                }
                Instruction::Call { dest, callee, args: call_args } => {
                    let values = call_args
                        .iter()
                        .map(|a| read(&temps, args, *a))
                        .collect::<CompileResult<Vec<i16>>>()?;
                    temps[*dest as usize] = self.call_function(*callee, &values)?;
                }
                Instruction::Return(value) => return read(&temps, args, *value),
            }
        }

        Err(CompileError::Backend(format!(
            "@{} has no {}-bit return",
            function.name, INT_BITS
        )))
    }
}

fn read(temps: &[i16], params: &[i16], operand: Operand) -> CompileResult<i16> {
    match operand {
        Operand::Const(v) => Ok(v),
        Operand::Param(i) => params
            .get(i as usize)
            .copied()
            .ok_or_else(|| CompileError::Backend(format!("no parameter {}", i))),
        Operand::Temp(t) => temps
            .get(t as usize)
            .copied()
            .ok_or_else(|| CompileError::Backend(format!("no temporary {}", t))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::ir::IrBackend;

    fn add_module() -> IrModule {
        let mut backend = IrBackend::new("test");
        let f = backend.declare_function("f0", 2).unwrap();
        backend.start_body(f).unwrap();
        let a0 = backend.param(f, 0).unwrap();
        let a1 = backend.param(f, 1).unwrap();
        let sum = backend.build_add(a0, a1).unwrap();
        backend.build_return(sum).unwrap();

        let main = backend.declare_function("main", 0).unwrap();
        backend.start_body(main).unwrap();
        let two = backend.const_int(2);
        let three = backend.const_int(3);
        let call = backend.build_call(f, &[two, three]).unwrap();
        backend.build_return(call).unwrap();
        backend.finish().unwrap()
    }

    #[test]
    fn test_call_by_name() {
        let module = add_module();
        let mut interpreter = Interpreter::new(&module);
        assert_eq!(interpreter.call("f0", &[40, 2]).unwrap(), 42);
        assert_eq!(interpreter.call("main", &[]).unwrap(), 5);
    }

    #[test]
    fn test_wrapping_arithmetic() {
        let module = add_module();
        let mut interpreter = Interpreter::new(&module);
        assert_eq!(interpreter.call("f0", &[i16::MAX, 1]).unwrap(), i16::MIN);
    }

    #[test]
    fn test_unknown_function() {
        let module = add_module();
        let mut interpreter = Interpreter::new(&module);
        assert_eq!(
            interpreter.call("f9", &[]),
            Err(CompileError::UndefinedFunction("f9".to_string()))
        );
    }

    #[test]
    fn test_wrong_argument_count() {
        let module = add_module();
        let mut interpreter = Interpreter::new(&module);
        assert!(matches!(
            interpreter.call("f0", &[1]),
            Err(CompileError::Backend(_))
        ));
    }

    #[test]
    fn test_run_entry_points() {
        let module = add_module();
        let mut interpreter = Interpreter::new(&module);
        assert_eq!(interpreter.run_entry_points().unwrap(), vec![5]);
    }

    #[test]
    fn test_unbounded_recursion_is_stopped() {
        let mut backend = IrBackend::new("test");
        let f = backend.declare_function("f0", 0).unwrap();
        backend.start_body(f).unwrap();
        let call = backend.build_call(f, &[]).unwrap();
        backend.build_return(call).unwrap();
        let module = backend.finish().unwrap();

        let mut interpreter = Interpreter::new(&module).with_max_depth(64);
        assert_eq!(
            interpreter.call("f0", &[]),
            Err(CompileError::CallDepthExceeded(64))
        );
    }
}
