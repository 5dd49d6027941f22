//! Модуль `ast`
//!
//! Узлы абстрактного синтаксического дерева. Это чистые данные: каждый
//! составной узел владеет своими детьми, дерево строится парсером один раз
//! и целиком передаётся (move) в [`crate::lower::Lowerer`].

use serde::{Deserialize, Serialize};

/// Бинарный оператор.
///
/// Парсер принимает любой символ в позиции оператора; неизвестные коды
/// сохраняются в `Unknown` и отклоняются только при понижении в IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Unknown(char),
}

impl BinaryOperator {
    /// Декодировать символ оператора.
    pub fn decode(code: char) -> Self {
        match code {
            '+' => BinaryOperator::Add,
            '-' => BinaryOperator::Subtract,
            other => BinaryOperator::Unknown(other),
        }
    }

    pub fn code(self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Unknown(c) => c,
        }
    }
}

/// Определение функции: индекс и непустое тело.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Индекс функции (11 — точка входа).
    pub index: i32,
    /// Выражения тела; значение последнего возвращается.
    pub body: Vec<Node>,
}

/// Узел AST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// Целочисленная константа.
    Constant { value: i16 },
    /// Ссылка на параметр `a0`..`a9`.
    Variable { index: i32 },
    /// Бинарная операция, левый операнд вычисляется первым.
    BinaryOp {
        operator: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Вызов функции по индексу.
    Call { callee_index: i32, arguments: Vec<Node> },
    /// Определение функции (только на верхнем уровне).
    FunctionDef(FunctionDef),
}

impl Node {
    pub fn constant(value: i16) -> Self {
        Node::Constant { value }
    }

    pub fn variable(index: i32) -> Self {
        Node::Variable { index }
    }

    pub fn binary(operator: BinaryOperator, left: Node, right: Node) -> Self {
        Node::BinaryOp {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(callee_index: i32, arguments: Vec<Node>) -> Self {
        Node::Call {
            callee_index,
            arguments,
        }
    }

    pub fn function(index: i32, body: Vec<Node>) -> Self {
        Node::FunctionDef(FunctionDef { index, body })
    }

    /// Является ли узел определением функции.
    #[cfg(test)]
    pub fn is_definition(&self) -> bool {
        matches!(self, Node::FunctionDef(_))
    }
}
