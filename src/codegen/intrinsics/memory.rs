//! Pointer/memory and type-query intrinsics (§4.6).

use crate::ast::Expr;
use crate::codegen::error::CodegenError;
use crate::codegen::expr::Value;
use crate::semantic_types::SemanticType;
use crate::token::Span;

use super::super::CodegenContext;

pub(super) fn dispatch(ctx: &mut CodegenContext, callee: &str, type_args: &[SemanticType], args: &[Expr], span: Span) -> Result<Option<Value>, CodegenError> {
    match callee {
        "ptr_read" | "array_get" | "slice_get" => {
            let (ptr, ptr_ty) = ctx.gen_expr(&args[0])?;
            let elem_ty = inner_of(&ptr_ty, span)?;
            let elem_llvm = ctx.lower_type(&elem_ty, span)?;
            let addr = if args.len() > 1 {
                let (idx, _) = ctx.gen_expr(&args[1])?;
                let reg = ctx.fresh.fresh_reg();
                ctx.buffers.body.instr(format!("{reg} = getelementptr inbounds {elem_llvm}, ptr {ptr}, i64 {idx}"));
                reg
            } else {
                ptr
            };
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = load {elem_llvm}, ptr {addr}"));
            Ok(Some((reg, elem_ty)))
        }
        "ptr_write" | "array_set" | "slice_set" | "store_byte" => {
            let (ptr, ptr_ty) = ctx.gen_expr(&args[0])?;
            let elem_ty = inner_of(&ptr_ty, span)?;
            let elem_llvm = ctx.lower_type(&elem_ty, span)?;
            let (idx_or_val, addr) = if args.len() > 2 {
                let (idx, _) = ctx.gen_expr(&args[1])?;
                let reg = ctx.fresh.fresh_reg();
                ctx.buffers.body.instr(format!("{reg} = getelementptr inbounds {elem_llvm}, ptr {ptr}, i64 {idx}"));
                (2, reg)
            } else {
                (1, ptr)
            };
            let (val, _) = ctx.gen_expr(&args[idx_or_val])?;
            ctx.buffers.body.instr(format!("store {elem_llvm} {val}, ptr {addr}"));
            Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
        }
        "ptr_offset" | "array_offset_ptr" | "slice_offset" => {
            let (ptr, ptr_ty) = ctx.gen_expr(&args[0])?;
            let elem_ty = inner_of(&ptr_ty, span)?;
            let elem_llvm = ctx.lower_type(&elem_ty, span)?;
            let (offset, _) = ctx.gen_expr(&args[1])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = getelementptr inbounds {elem_llvm}, ptr {ptr}, i64 {offset}"));
            Ok(Some((reg, ptr_ty)))
        }
        "slice_swap" => {
            let (ptr, ptr_ty) = ctx.gen_expr(&args[0])?;
            let elem_ty = inner_of(&ptr_ty, span)?;
            let elem_llvm = ctx.lower_type(&elem_ty, span)?;
            let (i, _) = ctx.gen_expr(&args[1])?;
            let (j, _) = ctx.gen_expr(&args[2])?;
            let pi = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{pi} = getelementptr inbounds {elem_llvm}, ptr {ptr}, i64 {i}"));
            let pj = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{pj} = getelementptr inbounds {elem_llvm}, ptr {ptr}, i64 {j}"));
            let vi = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{vi} = load {elem_llvm}, ptr {pi}"));
            let vj = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{vj} = load {elem_llvm}, ptr {pj}"));
            ctx.buffers.body.instr(format!("store {elem_llvm} {vj}, ptr {pi}"));
            ctx.buffers.body.instr(format!("store {elem_llvm} {vi}, ptr {pj}"));
            Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
        }
        "array_as_ptr" => Ok(Some(ctx.gen_expr(&args[0])?)),
        "size_of" => {
            let ty = type_args.first().cloned().unwrap_or(SemanticType::Unit);
            Ok(Some(size_or_align_of(ctx, &ty, span, true)?))
        }
        "align_of" => {
            let ty = type_args.first().cloned().unwrap_or(SemanticType::Unit);
            Ok(Some(size_or_align_of(ctx, &ty, span, false)?))
        }
        "type_id" => {
            let ty = type_args.first().cloned().unwrap_or(SemanticType::Unit);
            let mangled = crate::codegen::mangle::mangle_type(&ty, span)?;
            Ok(Some((fnv1a(&mangled).to_string(), SemanticType::I64)))
        }
        _ => Ok(None),
    }
}

fn inner_of(ty: &SemanticType, span: Span) -> Result<SemanticType, CodegenError> {
    match ty {
        SemanticType::Pointer(inner) | SemanticType::Reference { inner, .. } => Ok((**inner).clone()),
        other => Err(CodegenError::internal(format!("expected a pointer/reference type, found {other}"), span)),
    }
}

/// `size_of[T]`/`align_of[T]` (§4.6): constant-folded for primitives and
/// pointer-likes; for structs, the classic "GEP null + ptrtoint" trick so
/// LLVM itself computes the number at assembly time rather than this
/// engine duplicating target-layout rules.
fn size_or_align_of(ctx: &mut CodegenContext, ty: &SemanticType, span: Span, size: bool) -> Result<Value, CodegenError> {
    let llvm_ty = ctx.lower_type(ty, span)?;
    if llvm_ty.starts_with("%struct.") {
        let gep = ctx.fresh.fresh_reg();
        if size {
            ctx.buffers.body.instr(format!("{gep} = getelementptr {llvm_ty}, ptr null, i32 1"));
        } else {
            ctx.buffers.body.instr(format!("{gep} = getelementptr {{ i1, {llvm_ty} }}, ptr null, i32 0, i32 1"));
        }
        let reg = ctx.fresh.fresh_reg();
        ctx.buffers.body.instr(format!("{reg} = ptrtoint ptr {gep} to i64"));
        return Ok((reg, SemanticType::I64));
    }
    let n = if size {
        crate::codegen::types::size_of_llvm_type(&llvm_ty, &ctx.symbols)
    } else {
        crate::codegen::types::align_of_llvm_type(&llvm_ty, &ctx.symbols)
    };
    Ok((n.to_string(), SemanticType::I64))
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
