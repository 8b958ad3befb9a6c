//! Arithmetic/comparison/bitwise LLVM wrappers (§4.6): `llvm_add`,
//! `llvm_eq`, `llvm_shl`, … — direct named access to the same instruction
//! selection [`super::super::expr`]'s binary-op lowering uses, picking the
//! integer or float form from the first argument's type.

use crate::ast::{BinOp, Expr};
use crate::codegen::error::CodegenError;
use crate::codegen::expr::{arithmetic_mnemonic, comparison_predicate, Value};
use crate::semantic_types::SemanticType;
use crate::token::Span;

use super::super::CodegenContext;

fn binop_for(callee: &str) -> Option<BinOp> {
    Some(match callee.strip_prefix("llvm_")? {
        "add" => BinOp::Add,
        "sub" => BinOp::Sub,
        "mul" => BinOp::Mul,
        "div" => BinOp::Div,
        "mod" => BinOp::Mod,
        "eq" => BinOp::Eq,
        "ne" => BinOp::Ne,
        "lt" => BinOp::Lt,
        "le" => BinOp::Le,
        "gt" => BinOp::Gt,
        "ge" => BinOp::Ge,
        "and" => BinOp::BitAnd,
        "or" => BinOp::BitOr,
        "xor" => BinOp::BitXor,
        "shl" => BinOp::Shl,
        "shr" => BinOp::Shr,
        _ => return None,
    })
}

pub(super) fn dispatch(ctx: &mut CodegenContext, callee: &str, args: &[Expr], span: Span) -> Result<Option<Value>, CodegenError> {
    let Some(op) = binop_for(callee) else { return Ok(None) };

    let (lhs, lty) = ctx.gen_expr(&args[0])?;
    let (rhs, _) = ctx.gen_expr(&args[1])?;
    let is_float = lty.is_float();
    let is_signed = lty.is_signed();
    let llvm_ty = ctx.lower_type(&lty, span)?;

    if matches!(op, BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge) {
        let predicate = comparison_predicate(op, is_float, is_signed)
            .ok_or_else(|| CodegenError::unsupported(format!("'{callee}' has no comparison form for type {lty}"), span))?;
        let instr = if is_float { "fcmp" } else { "icmp" };
        let reg = ctx.fresh.fresh_reg();
        ctx.buffers.body.instr(format!("{reg} = {instr} {predicate} {llvm_ty} {lhs}, {rhs}"));
        return Ok(Some((reg, SemanticType::Bool)));
    }

    let mnemonic = arithmetic_mnemonic(op, is_float, is_signed)
        .ok_or_else(|| CodegenError::unsupported(format!("'{callee}' has no arithmetic form for type {lty}"), span))?;
    let reg = ctx.fresh.fresh_reg();
    ctx.buffers.body.instr(format!("{reg} = {mnemonic} {llvm_ty} {lhs}, {rhs}"));
    Ok(Some((reg, lty)))
}
