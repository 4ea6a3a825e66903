/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Syntax tree for fragment code.
//!
//! Every node carries the 0-based line, relative to the start of its
//! fragment, at which it begins. Runtime errors use it to point at the line
//! of a multi-line fragment where evaluation failed.

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: usize,
}

impl Expr {
    pub fn new(kind: ExprKind, line: usize) -> Self {
        Expr { kind, line }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Value),
    Name(String),
    /// List display, also used for tuples
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Chained comparison: `a < b <= c`
    Compare {
        left: Box<Expr>,
        rest: Vec<(CompareOp, Expr)>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    /// `then if cond else otherwise`
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    Index {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        value: Box<Expr>,
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtE => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtE => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
            CompareOp::Is => "is",
            CompareOp::IsNot => "is not",
        }
    }
}

/// Something that can be assigned to.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Name(String),
    /// `name[i][j] = ...`
    Subscript { name: String, indices: Vec<Expr> },
    /// `a, b = ...`
    Unpack(Vec<Target>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    /// `a = b = value`
    Assign {
        targets: Vec<Target>,
        value: Expr,
    },
    AugAssign {
        target: Target,
        op: BinaryOp,
        value: Expr,
    },
    Pass,
    Break,
    Continue,
}

/// The block header that ends a block-opening fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    For { targets: Vec<String>, iter: Expr },
    While(Expr),
    If(Expr),
    Elif(Expr),
    Else,
}

impl Header {
    pub fn keyword(&self) -> &'static str {
        match self {
            Header::For { .. } => "for",
            Header::While(_) => "while",
            Header::If(_) => "if",
            Header::Elif(_) => "elif",
            Header::Else => "else",
        }
    }
}

/// A parsed fragment: simple statements, optionally followed by a block
/// header on the last logical line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub body: Vec<Stmt>,
    pub header: Option<(Header, usize)>,
}

impl Fragment {
    /// Whether any statement is a `break` or `continue`.
    pub fn has_loop_control(&self) -> bool {
        self.body
            .iter()
            .any(|s| matches!(s.kind, StmtKind::Break | StmtKind::Continue))
    }
}
