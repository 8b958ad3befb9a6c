//! Atomics / fences (§4.6): `seq_cst` `atomicrmw`/`cmpxchg`/`fence` inlined
//! directly; typed `atomic_*_i32/i64` variants call into named runtime
//! helpers instead.

use crate::ast::Expr;
use crate::codegen::error::CodegenError;
use crate::codegen::expr::Value;
use crate::semantic_types::SemanticType;
use crate::token::Span;

use super::super::CodegenContext;

const RMW_OPS: &[&str] = &["add", "sub", "and", "or"];

pub(super) fn dispatch(ctx: &mut CodegenContext, callee: &str, args: &[Expr], span: Span) -> Result<Option<Value>, CodegenError> {
    match callee {
        "atomic_load" => {
            let (ptr, ptr_ty) = ctx.gen_expr(&args[0])?;
            let elem_ty = match &ptr_ty {
                SemanticType::Pointer(inner) => (**inner).clone(),
                other => return Err(CodegenError::internal(format!("atomic_load on non-pointer type {other}"), span)),
            };
            let llvm_ty = ctx.lower_type(&elem_ty, span)?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = load atomic {llvm_ty}, ptr {ptr} seq_cst, align 4"));
            Ok(Some((reg, elem_ty)))
        }
        "atomic_store" => {
            let (ptr, ptr_ty) = ctx.gen_expr(&args[0])?;
            let elem_ty = match &ptr_ty {
                SemanticType::Pointer(inner) => (**inner).clone(),
                other => return Err(CodegenError::internal(format!("atomic_store on non-pointer type {other}"), span)),
            };
            let llvm_ty = ctx.lower_type(&elem_ty, span)?;
            let (val, _) = ctx.gen_expr(&args[1])?;
            ctx.buffers.body.instr(format!("store atomic {llvm_ty} {val}, ptr {ptr} seq_cst, align 4"));
            Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
        }
        "atomic_exchange" => emit_rmw(ctx, "xchg", &args[0], &args[1], span),
        name if name.starts_with("atomic_") && RMW_OPS.contains(&name.trim_start_matches("atomic_")) => {
            emit_rmw(ctx, name.trim_start_matches("atomic_"), &args[0], &args[1], span)
        }
        "atomic_cas" => {
            let (ptr, ptr_ty) = ctx.gen_expr(&args[0])?;
            let elem_ty = match &ptr_ty {
                SemanticType::Pointer(inner) => (**inner).clone(),
                other => return Err(CodegenError::internal(format!("atomic_cas on non-pointer type {other}"), span)),
            };
            let llvm_ty = ctx.lower_type(&elem_ty, span)?;
            let (expected, _) = ctx.gen_expr(&args[1])?;
            let (new, _) = ctx.gen_expr(&args[2])?;
            let pair = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!(
                "{pair} = cmpxchg ptr {ptr}, {llvm_ty} {expected}, {llvm_ty} {new} seq_cst seq_cst"
            ));
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = extractvalue {{ {llvm_ty}, i1 }} {pair}, 1"));
            Ok(Some((reg, SemanticType::Bool)))
        }
        "fence" | "fence_acquire" | "fence_release" => {
            let ordering = match callee {
                "fence_acquire" => "acquire",
                "fence_release" => "release",
                _ => "seq_cst",
            };
            ctx.buffers.body.instr(format!("fence {ordering}"));
            Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
        }
        "atomic_i32_add" => emit_runtime_atomic(ctx, "atomic_i32_add", &args[0], &args[1], SemanticType::I32, "i32", span),
        "atomic_i64_add" => emit_runtime_atomic(ctx, "atomic_i64_add", &args[0], &args[1], SemanticType::I64, "i64", span),
        _ => Ok(None),
    }
}

fn emit_rmw(ctx: &mut CodegenContext, op: &str, ptr_expr: &Expr, val_expr: &Expr, span: Span) -> Result<Option<Value>, CodegenError> {
    let (ptr, ptr_ty) = ctx.gen_expr(ptr_expr)?;
    let elem_ty = match &ptr_ty {
        SemanticType::Pointer(inner) => (**inner).clone(),
        other => return Err(CodegenError::internal(format!("atomic_{op} on non-pointer type {other}"), span)),
    };
    let llvm_ty = ctx.lower_type(&elem_ty, span)?;
    let (val, _) = ctx.gen_expr(val_expr)?;
    let reg = ctx.fresh.fresh_reg();
    ctx.buffers.body.instr(format!("{reg} = atomicrmw {op} ptr {ptr}, {llvm_ty} {val} seq_cst, align 4"));
    Ok(Some((reg, elem_ty)))
}

fn emit_runtime_atomic(ctx: &mut CodegenContext, runtime_fn: &str, ptr_expr: &Expr, val_expr: &Expr, ty: SemanticType, llvm_ty: &str, span: Span) -> Result<Option<Value>, CodegenError> {
    let (ptr, _) = ctx.gen_expr(ptr_expr)?;
    let (val, _) = ctx.gen_expr(val_expr)?;
    let reg = ctx.fresh.fresh_reg();
    ctx.buffers.body.instr(format!("{reg} = call {llvm_ty} @{runtime_fn}(ptr {ptr}, {llvm_ty} {val})"));
    let _ = span;
    Ok(Some((reg, ty)))
}
