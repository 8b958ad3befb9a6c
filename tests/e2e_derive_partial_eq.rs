//! §8 scenario 4: `@derive(PartialEq)` on a plain struct.

mod common;

use tmlc::ast::{Attribute, Decl, DeriveKind, Field, Module, StructDecl, Visibility};
use tmlc::semantic_types::SemanticType;
use tmlc::token::Span;

#[test]
fn derived_eq_compares_every_field_with_short_circuit_branches() {
    let decl = StructDecl {
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
    let module = Module::for_testing(vec![Decl::Struct(decl)]);

    let ir = common::compile(&module);

    assert!(ir.contains("i1 @tml_P_eq(ptr %this, ptr %other)"), "{ir}");
    assert_eq!(ir.matches("getelementptr inbounds %struct.P,").count(), 4, "{ir}");
    assert_eq!(ir.matches("icmp eq i32").count(), 2, "{ir}");
    assert!(ir.contains("ret i1 1"), "{ir}");
    assert!(ir.contains("ret i1 0"), "{ir}");
}
