//! Unit tests for AST node construction.

use super::*;
use crate::semantic_types::SemanticType;
use crate::token::Span;

fn dummy_span() -> Span {
    Span::new(0, 0, 1, 1)
}

#[test]
fn test_expr_string_literal() {
    let expr = Expr::new(ExprKind::StringLiteral("hello".to_string()), SemanticType::Str, dummy_span());
    assert!(matches!(expr.kind, ExprKind::StringLiteral(ref s) if s == "hello"));
}

#[test]
fn test_expr_call_with_type_args() {
    let expr = Expr::new(
        ExprKind::Call {
            callee: "id".to_string(),
            type_args: vec![SemanticType::I32],
            args: vec![Expr::new(ExprKind::IntLiteral(5), SemanticType::I32, dummy_span())],
        },
        SemanticType::I32,
        dummy_span(),
    );
    match expr.kind {
        ExprKind::Call { callee, type_args, args } => {
            assert_eq!(callee, "id");
            assert_eq!(type_args, vec![SemanticType::I32]);
            assert_eq!(args.len(), 1);
        }
        _ => panic!("expected Call"),
    }
}

#[test]
fn test_function_decl_for_testing_has_no_generics() {
    let f = FunctionDecl::for_testing("add", Vec::new(), SemanticType::I32, Vec::new());
    assert!(!f.is_generic());
    assert_eq!(f.return_type, SemanticType::I32);
}

#[test]
fn test_struct_decl_is_generic() {
    let decl = StructDecl {
        name: "Box".to_string(),
        visibility: Visibility::Public,
        generic_params: vec!["T".to_string()],
        fields: vec![Field { name: "value".to_string(), ty: SemanticType::Generic("T".to_string()), span: dummy_span() }],
        attributes: Vec::new(),
        span: dummy_span(),
    };
    assert!(decl.is_generic());
}

#[test]
fn test_enum_decl_simple_vs_data() {
    let simple = EnumDecl {
        name: "Ordering".to_string(),
        visibility: Visibility::Public,
        generic_params: Vec::new(),
        variants: vec![
            Variant { name: "Less".to_string(), payload: Vec::new(), span: dummy_span() },
            Variant { name: "Equal".to_string(), payload: Vec::new(), span: dummy_span() },
        ],
        attributes: Vec::new(),
        span: dummy_span(),
    };
    assert!(simple.is_simple());

    let data = EnumDecl {
        name: "Maybe".to_string(),
        visibility: Visibility::Public,
        generic_params: vec!["T".to_string()],
        variants: vec![
            Variant { name: "Just".to_string(), payload: vec![SemanticType::Generic("T".to_string())], span: dummy_span() },
            Variant { name: "Nothing".to_string(), payload: Vec::new(), span: dummy_span() },
        ],
        attributes: Vec::new(),
        span: dummy_span(),
    };
    assert!(!data.is_simple());
}

#[test]
fn test_derive_attribute_round_trips_kinds() {
    let attrs = vec![Attribute::Derive(vec![DeriveKind::PartialEq, DeriveKind::Debug])];
    assert_eq!(derives(&attrs), vec![DeriveKind::PartialEq, DeriveKind::Debug]);
}

#[test]
fn test_module_for_testing_is_empty_path() {
    let module = Module::for_testing(Vec::new());
    assert!(module.path_components.is_empty());
    assert!(module.decls.is_empty());
}
