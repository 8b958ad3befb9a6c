//! Statement nodes consumed by the statement/control emitter (§4.10).

use crate::semantic_types::SemanticType;
use crate::token::Span;

use super::expr::{Expr, WhenArm};

#[derive(Debug, Clone)]
pub enum StmtKind {
    /// An expression evaluated for its side effects; the result is
    /// discarded (but, unlike [`StmtKind::Discard`], no acknowledgment of
    /// that is required upstream).
    Expr(Expr),
    Let { is_mutable: bool, name: String, ty: SemanticType, init: Expr },
    /// `return` without a value is `None`.
    Return(Option<Expr>),
    /// `let _ = expr` — acknowledges an intentionally ignored result.
    Discard(Expr),
    If { condition: Expr, then_branch: Vec<Stmt>, else_branch: Option<Vec<Stmt>> },
    While { condition: Expr, body: Vec<Stmt> },
    Loop { body: Vec<Stmt> },
    For { binding: String, iterable: Expr, body: Vec<Stmt> },
    /// Statement-position pattern match (as opposed to [`super::expr::ExprKind::When`]
    /// used when the match result is consumed as a value).
    When { scrutinee: Expr, arms: Vec<WhenArm> },
    Break,
    Continue,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }

    pub fn for_testing(kind: StmtKind) -> Self {
        Stmt::new(kind, Span::synthetic())
    }
}
