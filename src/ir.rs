//! Модуль `ir`
//!
//! Текстовый IR внутри крейта: бэкенд по умолчанию, не требующий LLVM.
//! Модуль — список функций, функция — линейный список инструкций над
//! операндами (константа, параметр, временное значение). `Display`
//! печатает модуль в синтаксисе, близком к LLVM IR.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::backend::{Backend, ENTRY_POINT_NAME, INT_BITS};
use crate::error::{CompileError, CompileResult};

/// Идентификатор функции внутри [`IrModule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub usize);

/// Операнд инструкции.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// Целочисленная константа.
    Const(i16),
    /// Параметр функции по позиции.
    Param(u32),
    /// Результат инструкции текущей функции.
    Temp(u32),
}

/// Вид бинарной инструкции.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    Add,
    Sub,
}

impl BinaryKind {
    fn mnemonic(self) -> &'static str {
        match self {
            BinaryKind::Add => "add",
            BinaryKind::Sub => "sub",
        }
    }

    fn hint(self) -> &'static str {
        match self {
            BinaryKind::Add => "addtemp",
            BinaryKind::Sub => "mintemp",
        }
    }
}

/// Инструкция IR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Binary {
        dest: u32,
        kind: BinaryKind,
        lhs: Operand,
        rhs: Operand,
    },
    Call {
        dest: u32,
        callee: FunctionId,
        args: Vec<Operand>,
    },
    Return(Operand),
}

/// Функция IR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrFunction {
    /// Уникальное имя в модуле.
    pub name: String,
    pub param_count: u32,
    pub body: Vec<Instruction>,
    /// Префиксы имён временных значений, по номеру.
    temp_hints: Vec<&'static str>,
}

impl IrFunction {
    fn new(name: String, param_count: u32) -> Self {
        Self {
            name,
            param_count,
            body: Vec::new(),
            temp_hints: Vec::new(),
        }
    }

    /// Количество временных значений.
    pub fn temp_count(&self) -> usize {
        self.temp_hints.len()
    }

    /// Есть ли у функции тело.
    pub fn is_defined(&self) -> bool {
        !self.body.is_empty()
    }

    fn new_temp(&mut self, hint: &'static str) -> u32 {
        self.temp_hints.push(hint);
        (self.temp_hints.len() - 1) as u32
    }

    fn render_operand(&self, operand: Operand) -> String {
        match operand {
            Operand::Const(v) => v.to_string(),
            Operand::Param(i) => format!("%a{}", i),
            Operand::Temp(t) => {
                let hint = self.temp_hints.get(t as usize).copied().unwrap_or("tmp");
                format!("%{}{}", hint, t)
            }
        }
    }
}

/// Единица компиляции.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrModule {
    pub name: String,
    functions: Vec<IrFunction>,
    by_name: HashMap<String, FunctionId>,
    entry_points: Vec<FunctionId>,
}

impl IrModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            by_name: HashMap::new(),
            entry_points: Vec::new(),
        }
    }

    /// Функции в порядке объявления.
    pub fn functions(&self) -> &[IrFunction] {
        &self.functions
    }

    pub fn function(&self, id: FunctionId) -> Option<&IrFunction> {
        self.functions.get(id.0)
    }

    /// Найти функцию по уникальному имени.
    pub fn get_function(&self, name: &str) -> Option<FunctionId> {
        self.by_name.get(name).copied()
    }

    /// Точки входа в порядке определения.
    pub fn entry_points(&self) -> &[FunctionId] {
        &self.entry_points
    }

    /// Добавить функцию. Занятое имя получает суффикс `.1`, `.2`, ...
    fn add_function(&mut self, name: &str, param_count: u32) -> FunctionId {
        let mut unique = name.to_string();
        let mut suffix = 1;
        while self.by_name.contains_key(&unique) {
            unique = format!("{}.{}", name, suffix);
            suffix += 1;
        }

        let id = FunctionId(self.functions.len());
        self.functions.push(IrFunction::new(unique.clone(), param_count));
        self.by_name.insert(unique, id);
        if name == ENTRY_POINT_NAME {
            self.entry_points.push(id);
        }
        id
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        let int = format!("i{}", INT_BITS);

        for function in &self.functions {
            writeln!(f)?;
            if !function.is_defined() {
                let params = vec![int.as_str(); function.param_count as usize];
                writeln!(f, "declare {} @{}({})", int, function.name, params.join(", "))?;
                continue;
            }

            let params: Vec<String> = (0..function.param_count)
                .map(|i| format!("{} %a{}", int, i))
                .collect();
            writeln!(f, "define {} @{}({}) {{", int, function.name, params.join(", "))?;
            writeln!(f, "entry:")?;

            for inst in &function.body {
                match inst {
                    Instruction::Binary {
                        dest,
                        kind,
                        lhs,
                        rhs,
                    } => writeln!(
                        f,
                        "  {} = {} {} {}, {}",
                        function.render_operand(Operand::Temp(*dest)),
                        kind.mnemonic(),
                        int,
                        function.render_operand(*lhs),
                        function.render_operand(*rhs)
                    )?,
                    Instruction::Call { dest, callee, args } => {
                        let callee_name = self
                            .function(*callee)
                            .map(|c| c.name.as_str())
                            .unwrap_or("<unknown>");
                        let args: Vec<String> = args
                            .iter()
                            .map(|a| format!("{} {}", int, function.render_operand(*a)))
                            .collect();
                        writeln!(
                            f,
                            "  {} = call {} @{}({})",
                            function.render_operand(Operand::Temp(*dest)),
                            int,
                            callee_name,
                            args.join(", ")
                        )?
                    }
                    Instruction::Return(value) => {
                        writeln!(f, "  ret {} {}", int, function.render_operand(*value))?
                    }
                }
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

/// Бэкенд, собирающий [`IrModule`].
#[derive(Debug, Clone)]
pub struct IrBackend {
    module: IrModule,
    /// Функция, тело которой сейчас открыто.
    current: Option<FunctionId>,
}

impl IrBackend {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module: IrModule::new(module_name),
            current: None,
        }
    }

    /// Текущее состояние модуля.
    pub fn module(&self) -> &IrModule {
        &self.module
    }

    fn current_function(&mut self) -> CompileResult<&mut IrFunction> {
        let id = self
            .current
            .ok_or_else(|| CompileError::Backend("no function body is open".to_string()))?;
        Ok(&mut self.module.functions[id.0])
    }

    fn build_binary(&mut self, kind: BinaryKind, lhs: Operand, rhs: Operand) -> CompileResult<Operand> {
        let function = self.current_function()?;
        let dest = function.new_temp(kind.hint());
        function.body.push(Instruction::Binary {
            dest,
            kind,
            lhs,
            rhs,
        });
        Ok(Operand::Temp(dest))
    }
}

impl Backend for IrBackend {
    type Value = Operand;
    type Function = FunctionId;
    type Output = IrModule;

    fn declare_function(&mut self, name: &str, param_count: u32) -> CompileResult<FunctionId> {
        let id = self.module.add_function(name, param_count);
        debug!("declared {} as @{}", name, self.module.functions[id.0].name);
        Ok(id)
    }

    fn start_body(&mut self, function: FunctionId) -> CompileResult<()> {
        let target = self
            .module
            .function(function)
            .ok_or_else(|| CompileError::Backend(format!("unknown function id {}", function.0)))?;
        if target.is_defined() {
            return Err(CompileError::Backend(format!(
                "function @{} already has a body",
                target.name
            )));
        }
        self.current = Some(function);
        Ok(())
    }

    fn param(&mut self, function: FunctionId, position: u32) -> CompileResult<Operand> {
        let target = self
            .module
            .function(function)
            .ok_or_else(|| CompileError::Backend(format!("unknown function id {}", function.0)))?;
        if position >= target.param_count {
            return Err(CompileError::Backend(format!(
                "function @{} has no parameter {}",
                target.name, position
            )));
        }
        Ok(Operand::Param(position))
    }

    fn const_int(&mut self, value: i16) -> Operand {
        Operand::Const(value)
    }

    fn build_add(&mut self, lhs: Operand, rhs: Operand) -> CompileResult<Operand> {
        self.build_binary(BinaryKind::Add, lhs, rhs)
    }

    fn build_sub(&mut self, lhs: Operand, rhs: Operand) -> CompileResult<Operand> {
        self.build_binary(BinaryKind::Sub, lhs, rhs)
    }

    fn build_call(&mut self, callee: FunctionId, args: &[Operand]) -> CompileResult<Operand> {
        let target = self
            .module
            .function(callee)
            .ok_or_else(|| CompileError::Backend(format!("unknown function id {}", callee.0)))?;
        if args.len() != target.param_count as usize {
            return Err(CompileError::Backend(format!(
                "call to @{} with {} arguments, expected {}",
                target.name,
                args.len(),
                target.param_count
            )));
        }

        let function = self.current_function()?;
        let dest = function.new_temp("calltemp");
        function.body.push(Instruction::Call {
            dest,
            callee,
            args: args.to_vec(),
        });
        Ok(Operand::Temp(dest))
    }

    fn build_return(&mut self, value: Operand) -> CompileResult<()> {
        self.current_function()?.body.push(Instruction::Return(value));
        self.current = None;
        Ok(())
    }

    fn finish(self) -> CompileResult<IrModule> {
        if let Some(id) = self.current {
            return Err(CompileError::Backend(format!(
                "function @{} has no terminator",
                self.module.functions[id.0].name
            )));
        }
        Ok(self.module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_are_uniquified() {
        let mut backend = IrBackend::new("test");
        let a = backend.declare_function("main", 0).unwrap();
        let b = backend.declare_function("main", 0).unwrap();
        let c = backend.declare_function("main", 0).unwrap();

        let module = backend.module();
        assert_eq!(module.function(a).unwrap().name, "main");
        assert_eq!(module.function(b).unwrap().name, "main.1");
        assert_eq!(module.function(c).unwrap().name, "main.2");
        assert_eq!(module.entry_points(), &[a, b, c]);
    }

    #[test]
    fn test_render_function() {
        let mut backend = IrBackend::new("Waterkoker");
        let f = backend.declare_function("f0", 2).unwrap();
        backend.start_body(f).unwrap();
        let a0 = backend.param(f, 0).unwrap();
        let one = backend.const_int(1);
        let sum = backend.build_add(a0, one).unwrap();
        let diff = backend.build_sub(sum, a0).unwrap();
        backend.build_return(diff).unwrap();

        let text = backend.finish().unwrap().to_string();
        assert!(text.starts_with("; ModuleID = 'Waterkoker'"));
        assert!(text.contains("define i16 @f0(i16 %a0, i16 %a1) {"));
        assert!(text.contains("  %addtemp0 = add i16 %a0, 1"));
        assert!(text.contains("  %mintemp1 = sub i16 %addtemp0, %a0"));
        assert!(text.contains("  ret i16 %mintemp1"));
    }

    #[test]
    fn test_call_arity_is_checked() {
        let mut backend = IrBackend::new("test");
        let main = backend.declare_function("main", 0).unwrap();
        backend.start_body(main).unwrap();
        let zero = backend.const_int(0);
        let err = backend.build_call(main, &[zero]).unwrap_err();
        assert!(matches!(err, CompileError::Backend(_)));

        let call = backend.build_call(main, &[]).unwrap();
        backend.build_return(call).unwrap();
        let text = backend.finish().unwrap().to_string();
        assert!(text.contains("%calltemp0 = call i16 @main()"));
    }

    #[test]
    fn test_emit_without_body_fails() {
        let mut backend = IrBackend::new("test");
        let one = backend.const_int(1);
        assert!(backend.build_add(one, one).is_err());
        assert!(backend.build_return(one).is_err());
    }

    #[test]
    fn test_param_out_of_range() {
        let mut backend = IrBackend::new("test");
        let main = backend.declare_function("main", 0).unwrap();
        assert!(backend.param(main, 0).is_err());
    }

    #[test]
    fn test_unterminated_function() {
        let mut backend = IrBackend::new("test");
        let f = backend.declare_function("f1", 10).unwrap();
        backend.start_body(f).unwrap();
        assert!(backend.finish().is_err());
    }

    #[test]
    fn test_declared_only_function_renders_declare() {
        let mut backend = IrBackend::new("test");
        backend.declare_function("f3", 2).unwrap();
        let text = backend.finish().unwrap().to_string();
        assert!(text.contains("declare i16 @f3(i16, i16)"));
    }
}
