//! Bit-manipulation / math intrinsics and assume/likely/unlikely/unreachable
//! (§4.6): LLVM named intrinsics with the argument's LLVM type as the
//! mangled suffix.

use crate::ast::Expr;
use crate::codegen::error::CodegenError;
use crate::codegen::expr::Value;
use crate::semantic_types::SemanticType;
use crate::token::Span;

use super::super::CodegenContext;

const FLOAT_UNARY: &[(&str, &str)] = &[("sqrt", "sqrt"), ("sin", "sin"), ("cos", "cos"), ("fabs", "fabs"), ("abs", "fabs")];

pub(super) fn dispatch(ctx: &mut CodegenContext, callee: &str, args: &[Expr], span: Span) -> Result<Option<Value>, CodegenError> {
    if let Some((_, llvm_name)) = FLOAT_UNARY.iter().find(|(name, _)| *name == callee) {
        let (val, ty) = ctx.gen_expr(&args[0])?;
        let reg = ctx.fresh.fresh_reg();
        ctx.buffers.body.instr(format!("{reg} = call double @llvm.{llvm_name}.f64(double {val})"));
        return Ok(Some((reg, ty)));
    }

    match callee {
        "pow" => {
            let (base, ty) = ctx.gen_expr(&args[0])?;
            let (exp, _) = ctx.gen_expr(&args[1])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call double @llvm.pow.f64(double {base}, double {exp})"));
            Ok(Some((reg, ty)))
        }
        "fma" => {
            let (a, ty) = ctx.gen_expr(&args[0])?;
            let (b, _) = ctx.gen_expr(&args[1])?;
            let (c, _) = ctx.gen_expr(&args[2])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call double @llvm.fma.f64(double {a}, double {b}, double {c})"));
            Ok(Some((reg, ty)))
        }
        "ctlz" => emit_i64_intrinsic(ctx, "ctlz.i64(i64 %ARG, i1 false)", args),
        "ctpop" => emit_i64_intrinsic(ctx, "ctpop.i64(i64 %ARG)", args),
        "bswap" => emit_i64_intrinsic(ctx, "bswap.i64(i64 %ARG)", args),
        "assume" => {
            let (cond, _) = ctx.gen_expr(&args[0])?;
            ctx.buffers.body.instr(format!("call void @llvm.assume(i1 {cond})"));
            Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
        }
        "likely" | "unlikely" => {
            let (cond, ty) = ctx.gen_expr(&args[0])?;
            let expected = if callee == "likely" { "1" } else { "0" };
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i1 @llvm.expect.i1(i1 {cond}, i1 {expected})"));
            Ok(Some((reg, ty)))
        }
        "unreachable" => {
            ctx.buffers.body.instr("unreachable");
            ctx.function.block_terminated = true;
            Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
        }
        _ => Ok(None),
    }
}

fn emit_i64_intrinsic(ctx: &mut CodegenContext, pattern: &str, args: &[Expr]) -> Result<Option<Value>, CodegenError> {
    let (val, ty) = ctx.gen_expr(&args[0])?;
    let call = format!("@llvm.{}", pattern.replace("%ARG", &val));
    let reg = ctx.fresh.fresh_reg();
    ctx.buffers.body.instr(format!("{reg} = call i64 {call}"));
    Ok(Some((reg, ty)))
}
