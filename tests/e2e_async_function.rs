//! §8 scenario 5: an `async func` returns a `Poll[T]` wrapper, storing the
//! ready payload through an alloca before loading it back for the `ret`.

mod common;

use tmlc::ast::{BinOp, Decl, Expr, ExprKind, FunctionDecl, Module, Param, Stmt, StmtKind};
use tmlc::semantic_types::SemanticType;
use tmlc::token::Span;

#[test]
fn async_function_wraps_return_in_poll_ready() {
    let body = vec![Stmt::for_testing(StmtKind::Return(Some(Expr::for_testing(
        ExprKind::BinaryOp {
            op: BinOp::Mul,
            lhs: Box::new(Expr::for_testing(ExprKind::Identifier("x".to_string()), SemanticType::I32)),
            rhs: Box::new(Expr::for_testing(ExprKind::IntLiteral(2), SemanticType::I32)),
        },
        SemanticType::I32,
    ))))];
    let mut decl = FunctionDecl::for_testing(
        "double",
        vec![Param { name: "x".to_string(), ty: SemanticType::I32, span: Span::synthetic() }],
        SemanticType::I32,
        body,
    );
    decl.is_async = true;

    let module = Module::for_testing(vec![Decl::Function(decl)]);

    let ir = common::compile(&module);

    assert!(ir.contains("%struct.Poll__I32 = type { i32, [1 x i64] }"), "{ir}");
    assert!(ir.contains("@tml_double(i32 %x)"), "{ir}");
    assert!(ir.contains("store i32 0, ptr"), "{ir}");
    assert!(ir.contains("ret %struct.Poll__I32"), "{ir}");
}
