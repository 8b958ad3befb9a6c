//! §8 scenario 3: matching on an instantiated generic enum.

mod common;

use tmlc::ast::{Decl, EnumDecl, Expr, ExprKind, FunctionDecl, Param, Pattern, Stmt, StmtKind, Variant, Visibility, WhenArm};
use tmlc::ast::Module;
use tmlc::semantic_types::SemanticType;
use tmlc::token::Span;

#[test]
fn matching_maybe_i32_emits_struct_type_and_tag_comparison() {
    let maybe_decl = EnumDecl {
        name: "Maybe".to_string(),
        visibility: Visibility::Public,
        generic_params: vec!["T".to_string()],
        variants: vec![
            Variant { name: "Just".to_string(), payload: vec![SemanticType::Generic("T".to_string())], span: Span::synthetic() },
            Variant { name: "Nothing".to_string(), payload: vec![], span: Span::synthetic() },
        ],
        attributes: vec![],
        span: Span::synthetic(),
    };

    let maybe_i32 = SemanticType::Named { name: "Maybe".to_string(), type_args: vec![SemanticType::I32] };
    let scrutinee = Expr::for_testing(ExprKind::Identifier("m".to_string()), maybe_i32.clone());
    let when_expr = Expr::for_testing(
        ExprKind::When {
            scrutinee: Box::new(scrutinee),
            arms: vec![
                WhenArm {
                    pattern: Pattern::Variant { enum_name: "Maybe".to_string(), variant: "Just".to_string(), bindings: vec!["v".to_string()] },
                    guard: None,
                    body: Expr::for_testing(ExprKind::Identifier("v".to_string()), SemanticType::I32),
                    span: Span::synthetic(),
                },
                WhenArm {
                    pattern: Pattern::Variant { enum_name: "Maybe".to_string(), variant: "Nothing".to_string(), bindings: vec![] },
                    guard: None,
                    body: Expr::for_testing(ExprKind::IntLiteral(0), SemanticType::I32),
                    span: Span::synthetic(),
                },
            ],
        },
        SemanticType::I32,
    );

    let use_maybe = FunctionDecl::for_testing(
        "use_maybe",
        vec![Param { name: "m".to_string(), ty: maybe_i32, span: Span::synthetic() }],
        SemanticType::I32,
        vec![Stmt::for_testing(StmtKind::Return(Some(when_expr)))],
    );

    let module = Module::for_testing(vec![Decl::Enum(maybe_decl), Decl::Function(use_maybe)]);

    let ir = common::compile(&module);

    assert!(ir.contains("%struct.Maybe__I32 = type { i32, [1 x i64] }"), "{ir}");
    assert!(ir.contains("icmp eq i32"), "{ir}");
    assert!(ir.contains("getelementptr inbounds %struct.Maybe__I32"), "{ir}");
}
