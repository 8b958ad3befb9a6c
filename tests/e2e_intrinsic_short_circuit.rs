//! §8 scenario 6: `atomic_add` dispatches straight to an `atomicrmw`
//! instruction rather than a named runtime call.

mod common;

use tmlc::ast::{Decl, Expr, ExprKind, FunctionDecl, Module, Param, Stmt, StmtKind};
use tmlc::semantic_types::SemanticType;
use tmlc::token::Span;

#[test]
fn atomic_add_lowers_to_atomicrmw_not_a_call() {
    let call = Expr::for_testing(
        ExprKind::Call {
            callee: "atomic_add".to_string(),
            type_args: vec![],
            args: vec![
                Expr::for_testing(ExprKind::Identifier("p".to_string()), SemanticType::Pointer(Box::new(SemanticType::I32))),
                Expr::for_testing(ExprKind::IntLiteral(1), SemanticType::I32),
            ],
        },
        SemanticType::I32,
    );
    let decl = FunctionDecl::for_testing(
        "bump",
        vec![Param { name: "p".to_string(), ty: SemanticType::Pointer(Box::new(SemanticType::I32)), span: Span::synthetic() }],
        SemanticType::I32,
        vec![Stmt::for_testing(StmtKind::Return(Some(call)))],
    );
    let module = Module::for_testing(vec![Decl::Function(decl)]);

    let ir = common::compile(&module);

    assert!(ir.contains("atomicrmw add ptr"), "{ir}");
    assert!(ir.contains("i32 1 seq_cst, align 4"), "{ir}");
    assert!(!ir.contains("@atomic_add("), "{ir}");
}
