//! §8 scenario 2: one generic function instantiated at two call sites
//! produces two distinct mangled definitions.

mod common;

use tmlc::ast::{Decl, Expr, ExprKind, FunctionDecl, Module, Param, Stmt, StmtKind};
use tmlc::semantic_types::SemanticType;
use tmlc::token::Span;

#[test]
fn id_instantiated_at_i32_and_bool_emits_two_mangled_definitions() {
    let mut id_decl = FunctionDecl::for_testing(
        "id",
        vec![Param { name: "x".to_string(), ty: SemanticType::Generic("T".to_string()), span: Span::synthetic() }],
        SemanticType::Generic("T".to_string()),
        vec![Stmt::for_testing(StmtKind::Return(Some(Expr::for_testing(
            ExprKind::Identifier("x".to_string()),
            SemanticType::Generic("T".to_string()),
        ))))],
    );
    id_decl.generic_params = vec!["T".to_string()];

    let call_i32 = Stmt::for_testing(StmtKind::Expr(Expr::for_testing(
        ExprKind::Call {
            callee: "id".to_string(),
            type_args: vec![SemanticType::I32],
            args: vec![Expr::for_testing(ExprKind::IntLiteral(5), SemanticType::I32)],
        },
        SemanticType::I32,
    )));
    let call_bool = Stmt::for_testing(StmtKind::Expr(Expr::for_testing(
        ExprKind::Call {
            callee: "id".to_string(),
            type_args: vec![SemanticType::Bool],
            args: vec![Expr::for_testing(ExprKind::BoolLiteral(true), SemanticType::Bool)],
        },
        SemanticType::Bool,
    )));
    let caller = FunctionDecl::for_testing("caller", vec![], SemanticType::Unit, vec![call_i32, call_bool]);

    let module = Module::for_testing(vec![Decl::Function(id_decl), Decl::Function(caller)]);

    let ir = common::compile(&module);

    assert!(ir.contains("@tml_id__I32"), "{ir}");
    assert!(ir.contains("@tml_id__Bool"), "{ir}");
    assert!(ir.contains("call i32 @tml_id__I32"), "{ir}");
    assert!(ir.contains("call i1 @tml_id__Bool"), "{ir}");
}
