//! Expression nodes consumed by the expression emitter (§4.9).

use crate::semantic_types::SemanticType;
use crate::token::Span;

use super::stmt::Stmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

/// One piece of an interpolated string literal.
#[derive(Debug, Clone)]
pub enum InterpolationPart {
    Literal(String),
    Expr(Expr),
}

/// A pattern in a `when` arm.
#[derive(Debug, Clone)]
pub enum Pattern {
    Wildcard,
    Literal(Expr),
    /// `EnumName::Variant(bindings...)`. `bindings` names the payload slots
    /// in declaration order; a bare `Variant` pattern has an empty list.
    Variant { enum_name: String, variant: String, bindings: Vec<String> },
    Binding(String),
    Or(Vec<Pattern>),
}

#[derive(Debug, Clone)]
pub struct WhenArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ClosureParam {
    pub name: String,
    pub ty: SemanticType,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    UnitLiteral,
    BoolLiteral(bool),
    IntLiteral(i64),
    FloatLiteral(f64),
    /// Unescaped string content; the emitter interns this into the prelude
    /// as a `private constant` array (§4.9).
    StringLiteral(String),
    Identifier(String),
    BinaryOp { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    UnaryOp { op: UnOp, operand: Box<Expr> },
    /// A free-function or intrinsic call. `type_args` carries explicit
    /// generic arguments (`id[I32](5)`); empty for non-generic callees.
    Call { callee: String, type_args: Vec<SemanticType>, args: Vec<Expr> },
    MethodCall { receiver: Box<Expr>, method: String, type_args: Vec<SemanticType>, args: Vec<Expr> },
    FieldAccess { base: Box<Expr>, field: String },
    StructLiteral { name: String, type_args: Vec<SemanticType>, fields: Vec<(String, Expr)> },
    ArrayLiteral(Vec<Expr>),
    TupleLiteral(Vec<Expr>),
    Index { base: Box<Expr>, index: Box<Expr> },
    If { condition: Box<Expr>, then_branch: Box<Expr>, else_branch: Option<Box<Expr>> },
    Block(Vec<Stmt>),
    When { scrutinee: Box<Expr>, arms: Vec<WhenArm> },
    Closure { params: Vec<ClosureParam>, captures: Vec<String>, body: Box<Expr>, return_type: SemanticType },
    Cast { expr: Box<Expr>, target: SemanticType },
    Interpolated(Vec<InterpolationPart>),
    /// `expr!` — extracts `Ok`, early-returns on `Err` (§4.9).
    Try(Box<Expr>),
    Await(Box<Expr>),
}

/// An expression with source location and resolved semantic type.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: SemanticType,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: SemanticType, span: Span) -> Self {
        Expr { kind, ty, span }
    }

    /// The `infer_expr_type` hook from §6's input contract: every node's
    /// semantic type is retrievable on demand. Since this tree is produced
    /// fully type-checked, the type is simply the field attached at
    /// construction time.
    pub fn infer_expr_type(&self) -> &SemanticType {
        &self.ty
    }

    pub fn for_testing(kind: ExprKind, ty: SemanticType) -> Self {
        Expr::new(kind, ty, Span::synthetic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_expr_type_returns_attached_type() {
        let e = Expr::for_testing(ExprKind::IntLiteral(5), SemanticType::I32);
        assert_eq!(e.infer_expr_type(), &SemanticType::I32);
    }
}
