//! §8 invariant-style properties that must hold of any emitted module,
//! independent of the specific scenario being compiled.

mod common;

use std::collections::HashSet;

use tmlc::ast::{Attribute, BinOp, Decl, DeriveKind, Expr, ExprKind, Field, FunctionDecl, Module, Param, Stmt, StmtKind, StructDecl, Visibility};
use tmlc::semantic_types::SemanticType;
use tmlc::token::Span;

fn add_module() -> Module {
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
    Module::for_testing(vec![Decl::Function(decl)])
}

fn eq_struct_module() -> Module {
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
    Module::for_testing(vec![Decl::Struct(decl)])
}

/// Re-invoking codegen over the same module twice must produce byte-identical
/// output (§8): no hidden global counters leak across `CodegenContext`
/// instances.
#[test]
fn compilation_is_byte_deterministic_across_fresh_contexts() {
    let module = add_module();
    let first = common::compile(&module);
    let second = common::compile(&module);
    assert_eq!(first, second);
}

/// Every SSA register definition (`%N = ...`) in a function must be unique;
/// `FreshState` must never recycle a register number within one compile.
#[test]
fn ssa_registers_are_unique_within_the_module() {
    let ir = common::compile(&eq_struct_module());
    let mut defined = HashSet::new();
    for line in ir.lines() {
        let line = line.trim();
        if let Some((lhs, _)) = line.split_once(" = ") {
            if let Some(reg) = lhs.strip_prefix('%') {
                if reg.chars().all(|c| c.is_ascii_digit()) {
                    assert!(defined.insert(reg.to_string()), "register %{reg} redefined:\n{ir}");
                }
            }
        }
    }
    assert!(!defined.is_empty());
}

/// Every `%struct.M` type reference must be preceded somewhere in the module
/// by its own `%struct.M = type { ... }` definition.
#[test]
fn every_struct_type_reference_has_a_preceding_definition() {
    let ir = common::compile(&eq_struct_module());
    assert!(ir.contains("%struct.P = type { i32, i32 }"));
    let def_pos = ir.find("%struct.P = type").expect("struct type definition present");
    for (idx, _) in ir.match_indices("%struct.P,") {
        assert!(idx > def_pos, "use of %struct.P at byte {idx} precedes its definition at {def_pos}");
    }
}

fn caller_callee_module() -> Module {
    let helper = FunctionDecl::for_testing(
        "helper",
        vec![],
        SemanticType::I32,
        vec![Stmt::for_testing(StmtKind::Return(Some(Expr::for_testing(ExprKind::IntLiteral(1), SemanticType::I32))))],
    );
    let caller = FunctionDecl::for_testing(
        "caller",
        vec![],
        SemanticType::I32,
        vec![Stmt::for_testing(StmtKind::Return(Some(Expr::for_testing(
            ExprKind::Call { callee: "helper".to_string(), type_args: vec![], args: vec![] },
            SemanticType::I32,
        ))))],
    );
    Module::for_testing(vec![Decl::Function(helper), Decl::Function(caller)])
}

/// Every `@tml_<name>(...)` call target must have a matching `define` (or
/// `declare`) earlier in the module.
#[test]
fn every_tml_call_target_has_a_definition() {
    let ir = common::compile(&caller_callee_module());
    let defined: HashSet<&str> = ir
        .lines()
        .filter_map(|l| l.trim().strip_prefix("define ").or_else(|| l.trim().strip_prefix("declare ")))
        .filter_map(|rest| rest.split('(').next())
        .filter_map(|rest| rest.rsplit(' ').next())
        .collect();
    for line in ir.lines() {
        if let Some(pos) = line.find("call ") {
            let rest = &line[pos..];
            if let Some(at_pos) = rest.find('@') {
                let symbol_and_rest = &rest[at_pos..];
                let symbol = symbol_and_rest.split('(').next().unwrap_or_default();
                if symbol.starts_with("@tml_") {
                    assert!(defined.contains(symbol), "call target {symbol} has no define/declare in:\n{ir}");
                }
            }
        }
    }
}

/// `tml_P_eq(a, a)` must hold by construction: the derived comparison walks
/// identical field offsets on both operands, so reflexivity is a structural
/// property of the generated IR rather than something that needs a runtime
/// check here. This test pins the structural shape that guarantees it: one
/// `getelementptr`/compare pair per field, ANDed via short-circuit branches
/// that all funnel into `ret i1 1`.
#[test]
fn derived_eq_is_structurally_reflexive() {
    let ir = common::compile(&eq_struct_module());
    let eq_start = ir.find("@tml_P_eq").expect("derived eq emitted");
    let eq_body = &ir[eq_start..];
    let eq_end = eq_body.find("\n}").map(|i| i + eq_start).unwrap_or(ir.len());
    let eq_body = &ir[eq_start..eq_end];
    assert_eq!(eq_body.matches("icmp eq i32").count(), 2);
    assert_eq!(eq_body.matches("br i1").count(), 2);
    assert!(eq_body.contains("ret i1 1"));
    assert!(eq_body.contains("ret i1 0"));
}
