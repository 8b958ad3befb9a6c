//! A derived method (`@derive(PartialEq)`'s `eq`) called through ordinary
//! `.method()` syntax must receive pointer arguments, not loaded values.

mod common;

use tmlc::ast::{Attribute, Decl, DeriveKind, Expr, ExprKind, Field, FunctionDecl, Module, Param, Stmt, StmtKind, StructDecl, Visibility};
use tmlc::semantic_types::SemanticType;
use tmlc::token::Span;

#[test]
fn calling_derived_eq_passes_both_receivers_by_address() {
    let p_ty = SemanticType::Named { name: "P".to_string(), type_args: vec![] };
    let struct_decl = StructDecl {
        name: "P".to_string(),
        visibility: Visibility::Public,
        generic_params: vec![],
        fields: vec![
            Field { name: "x".to_string(), ty: SemanticType::I32, span: Span::synthetic() },
            Field { name: "y".to_string(), ty: SemanticType::I32, span: Span::synthetic() },
        ],
        attributes: vec![Attribute::Derive(vec![DeriveKind::PartialEq])],
        span: Span::synthetic(),
    };

    let call = Expr::for_testing(
        ExprKind::MethodCall {
            receiver: Box::new(Expr::for_testing(ExprKind::Identifier("p".to_string()), p_ty.clone())),
            method: "eq".to_string(),
            type_args: vec![],
            args: vec![Expr::for_testing(ExprKind::Identifier("q".to_string()), p_ty.clone())],
        },
        SemanticType::Bool,
    );
    let same = FunctionDecl::for_testing(
        "same",
        vec![
            Param { name: "p".to_string(), ty: p_ty.clone(), span: Span::synthetic() },
            Param { name: "q".to_string(), ty: p_ty, span: Span::synthetic() },
        ],
        SemanticType::Bool,
        vec![Stmt::for_testing(StmtKind::Return(Some(call)))],
    );

    let module = Module::for_testing(vec![Decl::Struct(struct_decl), Decl::Function(same)]);

    let ir = common::compile(&module);

    assert!(ir.contains("i1 @tml_P_eq(ptr %this, ptr %other)"), "{ir}");
    assert!(ir.contains("call i1 @tml_P_eq(ptr"), "{ir}");
    assert!(!ir.contains("call i1 @tml_P_eq(%struct.P"), "{ir}");
}
