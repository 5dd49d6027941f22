//! Модуль `lower`
//!
//! Понижение AST в вызовы [`Backend`]. Хранит таблицу функций всей
//! единицы компиляции и область видимости параметров текущей функции.
//!
//! Соглашение о вызовах: у каждой обычной функции ровно 10 параметров
//! `a0`..`a9`; недостающие аргументы вызова заменяются нулём, аргументы
//! после десятого не вычисляются.

use std::collections::HashMap;

use log::{debug, warn};

use crate::ast::{BinaryOperator, FunctionDef, Node};
use crate::backend::{function_name, param_count, Backend, ENTRY_POINT_INDEX, PARAM_COUNT};
use crate::error::{CompileError, CompileResult};

/// Параметры функции, тело которой сейчас понижается.
#[derive(Debug, Clone)]
pub struct Scope<V> {
    bindings: HashMap<i32, V>,
}

impl<V: Copy> Scope<V> {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn get(&self, index: i32) -> Option<V> {
        self.bindings.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<V: Copy> Default for Scope<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Движок понижения.
pub struct Lowerer<B: Backend> {
    backend: B,
    scope: Scope<B::Value>,
    /// Таблица функций: индекс -> последняя объявленная функция.
    functions: HashMap<i32, B::Function>,
}

impl<B: Backend> Lowerer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            scope: Scope::new(),
            functions: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Область видимости последней понижённой функции.
    pub fn scope(&self) -> &Scope<B::Value> {
        &self.scope
    }

    /// Понизить конструкцию верхнего уровня. Голое выражение
    /// оборачивается в определение точки входа.
    pub fn lower(&mut self, node: Node) -> CompileResult<B::Function> {
        match node {
            Node::FunctionDef(def) => self.lower_function(def),
            expr => self.lower_function(FunctionDef {
                index: ENTRY_POINT_INDEX,
                body: vec![expr],
            }),
        }
    }

    /// Понизить определение функции.
    ///
    /// Функция попадает в таблицу до понижения тела, так что тело может
    /// вызывать само себя. Точка входа в таблицу не попадает и вызвана
    /// быть не может.
    pub fn lower_function(&mut self, def: FunctionDef) -> CompileResult<B::Function> {
        debug!("lower function {}", def.index);
        let FunctionDef { index, mut body } = def;
        let last = body.pop().ok_or(CompileError::EmptyFunctionBody(index))?;

        let name = function_name(index);
        let params = param_count(index);
        let function = self.backend.declare_function(&name, params)?;
        if index != ENTRY_POINT_INDEX {
            self.functions.insert(index, function);
        }
        self.backend.start_body(function)?;

        let mut scope = Scope::new();
        for position in 0..params {
            let value = self.backend.param(function, position)?;
            scope.bindings.insert(position as i32, value);
        }
        self.scope = scope;

        for expr in body {
            self.lower_expr(expr)?;
        }
        let result = self.lower_expr(last)?;
        self.backend.build_return(result)?;

        Ok(function)
    }

    /// Понизить выражение в значение.
    /// Глубина рекурсии равна вложенности выражения, поэтому стек растёт через stacker.
    pub fn lower_expr(&mut self, node: Node) -> CompileResult<B::Value> {
        // 256KB red zone, 8MB stack growth
        stacker::maybe_grow(256 * 1024, 8 * 1024 * 1024, || self.lower_node(node))
    }

    fn lower_node(&mut self, node: Node) -> CompileResult<B::Value> {
        match node {
            Node::Constant { value } => {
                debug!("lower constant {}", value);
                Ok(self.backend.const_int(value))
            }

            Node::Variable { index } => {
                debug!("lower variable a{}", index);
                self.scope
                    .get(index)
                    .ok_or(CompileError::UndefinedVariable(index))
            }

            Node::BinaryOp {
                operator,
                left,
                right,
            } => {
                debug!("lower binop '{}'", operator.code());
                let lhs = self.lower_expr(*left)?;
                let rhs = self.lower_expr(*right)?;
                match operator {
                    BinaryOperator::Add => self.backend.build_add(lhs, rhs),
                    BinaryOperator::Subtract => self.backend.build_sub(lhs, rhs),
                    BinaryOperator::Unknown(code) => Err(CompileError::UnknownOperator(code)),
                }
            }

            Node::Call {
                callee_index,
                arguments,
            } => self.lower_call(callee_index, arguments),

            Node::FunctionDef(def) => Err(CompileError::NestedDefinition(def.index)),
        }
    }

    fn lower_call(&mut self, callee_index: i32, arguments: Vec<Node>) -> CompileResult<B::Value> {
        debug!("lower call f{}", callee_index);
        let callee = *self
            .functions
            .get(&callee_index)
            .ok_or_else(|| CompileError::UndefinedFunction(function_name(callee_index)))?;

        if arguments.len() > PARAM_COUNT as usize {
            warn!(
                "call to {} supplies {} arguments, only the first {} are used",
                function_name(callee_index),
                arguments.len(),
                PARAM_COUNT
            );
        }

        let mut supplied = arguments.into_iter();
        let mut args = Vec::with_capacity(PARAM_COUNT as usize);
        for _ in 0..PARAM_COUNT {
            let value = match supplied.next() {
                Some(arg) => self.lower_expr(arg)?,
                None => self.backend.const_int(0),
            };
            args.push(value);
        }

        self.backend.build_call(callee, &args)
    }

    /// Завершить единицу компиляции.
    pub fn finish(self) -> CompileResult<B::Output> {
        self.backend.finish()
    }
}
