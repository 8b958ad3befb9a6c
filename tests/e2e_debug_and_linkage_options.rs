//! §6 driver-facing options: `dll_export`, `emit_debug_info`/`debug_level`,
//! and the always-on `#0` attribute group on every `define`.

mod common;

use tmlc::ast::{Decl, FunctionDecl, Module, Param, Stmt, StmtKind, Visibility};
use tmlc::codegen::{CodegenContext, Options};
use tmlc::semantic_types::SemanticType;
use tmlc::token::Span;

fn identity_module() -> Module {
    let mut decl = FunctionDecl::for_testing(
        "identity",
        vec![Param { name: "x".to_string(), ty: SemanticType::I32, span: Span::synthetic() }],
        SemanticType::I32,
        vec![Stmt::for_testing(StmtKind::Return(Some(tmlc::ast::Expr::for_testing(
            tmlc::ast::ExprKind::Identifier("x".to_string()),
            SemanticType::I32,
        ))))],
    );
    decl.visibility = Visibility::Public;
    Module::for_testing(vec![Decl::Function(decl)])
}

#[test]
fn every_define_references_the_nounwind_attribute_group() {
    let ir = common::compile(&identity_module());
    assert!(ir.contains(") #0 {"), "{ir}");
    assert!(ir.contains("attributes #0 = { nounwind mustprogress willreturn }"), "{ir}");
}

#[test]
fn dll_export_annotates_public_functions() {
    let mut ctx = CodegenContext::new(Options { dll_export: true, ..Options::default() });
    let ir = ctx.compile(&identity_module(), "test.tml").expect("codegen should succeed");
    assert!(ir.contains("define dllexport i32 @tml_identity"), "{ir}");
}

#[test]
fn dll_export_is_suppressed_under_force_internal_linkage() {
    let mut ctx = CodegenContext::new(Options { dll_export: true, force_internal_linkage: true, ..Options::default() });
    let ir = ctx.compile(&identity_module(), "test.tml").expect("codegen should succeed");
    assert!(!ir.contains("dllexport"), "{ir}");
    assert!(ir.contains("define internal i32 @tml_identity"), "{ir}");
}

#[test]
fn debug_info_emits_compile_unit_and_subprogram() {
    let mut ctx = CodegenContext::new(Options { emit_debug_info: true, debug_level: 1, ..Options::default() });
    let ir = ctx.compile(&identity_module(), "test.tml").expect("codegen should succeed");
    assert!(ir.contains("!llvm.dbg.cu = !{"), "{ir}");
    assert!(ir.contains("distinct !DICompileUnit("), "{ir}");
    assert!(ir.contains("distinct !DISubprogram(name: \"identity\""), "{ir}");
    assert!(ir.contains("!dbg !"), "{ir}");
    // Debug level 1 ("functions and statements") does not reach parameters.
    assert!(!ir.contains("call void @llvm.dbg.declare"), "{ir}");
}

#[test]
fn debug_level_two_declares_parameters() {
    let mut ctx = CodegenContext::new(Options { emit_debug_info: true, debug_level: 2, ..Options::default() });
    let ir = ctx.compile(&identity_module(), "test.tml").expect("codegen should succeed");
    assert!(ir.contains("call void @llvm.dbg.declare(metadata ptr"), "{ir}");
    assert!(ir.contains("!DILocalVariable(name: \"x\", arg: 1"), "{ir}");
}

#[test]
fn debug_info_off_by_default() {
    let ir = common::compile(&identity_module());
    assert!(!ir.contains("DISubprogram"), "{ir}");
    assert!(!ir.contains("call void @llvm.dbg.declare"), "{ir}");
}
