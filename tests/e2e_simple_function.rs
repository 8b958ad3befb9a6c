//! §8 scenario 1: a plain, non-generic function.

mod common;

use tmlc::ast::{BinOp, Decl, Expr, ExprKind, FunctionDecl, Module, Param, Stmt, StmtKind};
use tmlc::semantic_types::SemanticType;
use tmlc::token::Span;

#[test]
fn add_function_emits_public_definition_and_add_instruction() {
    let body = vec![Stmt::for_testing(StmtKind::Return(Some(Expr::for_testing(
        ExprKind::BinaryOp {
            op: BinOp::Add,
            lhs: Box::new(Expr::for_testing(ExprKind::Identifier("a".to_string()), SemanticType::I32)),
            rhs: Box::new(Expr::for_testing(ExprKind::Identifier("b".to_string()), SemanticType::I32)),
        },
        SemanticType::I32,
    ))))];
    let decl = FunctionDecl::for_testing(
        "add",
        vec![
            Param { name: "a".to_string(), ty: SemanticType::I32, span: Span::synthetic() },
            Param { name: "b".to_string(), ty: SemanticType::I32, span: Span::synthetic() },
        ],
        SemanticType::I32,
        body,
    );
    let module = Module::for_testing(vec![Decl::Function(decl)]);

    let ir = common::compile(&module);

    assert!(ir.contains("i32 @tml_add(i32 %a, i32 %b)"), "{ir}");
    assert!(ir.contains("add i32"), "{ir}");
}
