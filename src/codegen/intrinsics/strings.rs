//! Print/IO, string/char/number-to-string/StringBuilder, and time
//! intrinsics (§4.6): each name maps to a runtime symbol with explicit
//! argument-widening rules (smaller integers zext/sext to `i64`, `float`
//! `fpext` to `double`).

use crate::ast::Expr;
use crate::codegen::error::CodegenError;
use crate::codegen::expr::Value;
use crate::semantic_types::SemanticType;
use crate::token::Span;

use super::super::CodegenContext;

const ZERO_ARG_TIME: &[&str] = &["time_ms", "time_us", "time_ns"];

/// `ptr -> ptr` string transforms that allocate a fresh buffer (§4.6's
/// string/char category).
const STR_UNARY_TO_STR: &[&str] = &["str_to_upper", "str_to_lower", "str_trim"];
/// `(ptr, ptr) -> i1` string predicates.
const STR_BINARY_PREDICATE: &[&str] = &["str_contains", "str_starts_with", "str_ends_with"];
/// `i32 -> i1` character classification predicates (`char_is_*`).
const CHAR_PREDICATE: &[&str] =
    &["char_is_alpha", "char_is_digit", "char_is_alphanumeric", "char_is_whitespace", "char_is_upper", "char_is_lower", "char_is_punctuation"];
/// `i32 -> i32` character case/digit conversions (`char_to_*`).
const CHAR_CONVERSION: &[&str] = &["char_to_upper", "char_to_lower", "char_to_digit"];

pub(super) fn dispatch(ctx: &mut CodegenContext, callee: &str, args: &[Expr], span: Span) -> Result<Option<Value>, CodegenError> {
    match callee {
        "print" | "println" => dispatch_print(ctx, callee, args, span),
        name if ZERO_ARG_TIME.contains(&name) => {
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i64 @{name}()"));
            Ok(Some((reg, SemanticType::I64)))
        }
        "sleep_ms" | "sleep_us" => {
            let (val, _) = ctx.gen_expr(&args[0])?;
            let widened = widen_to_i64(ctx, val, &args[0].ty, span)?;
            ctx.buffers.body.instr(format!("call void @{callee}(i64 {widened})"));
            Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
        }
        "str_hash" => {
            let (val, _) = ctx.gen_expr(&args[0])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i64 @str_hash(ptr {val})"));
            Ok(Some((reg, SemanticType::I64)))
        }
        "str_eq" => {
            let (lhs, _) = ctx.gen_expr(&args[0])?;
            let (rhs, _) = ctx.gen_expr(&args[1])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i1 @str_eq(ptr {lhs}, ptr {rhs})"));
            Ok(Some((reg, SemanticType::Bool)))
        }
        "str_cmp" => {
            let (lhs, _) = ctx.gen_expr(&args[0])?;
            let (rhs, _) = ctx.gen_expr(&args[1])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i32 @str_cmp(ptr {lhs}, ptr {rhs})"));
            Ok(Some((reg, SemanticType::I32)))
        }
        "str_len" => {
            let (val, _) = ctx.gen_expr(&args[0])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i64 @str_len(ptr {val})"));
            Ok(Some((reg, SemanticType::I64)))
        }
        "str_char_at" => {
            let (s, _) = ctx.gen_expr(&args[0])?;
            let (idx, _) = ctx.gen_expr(&args[1])?;
            let idx = widen_to_i64(ctx, idx, &args[1].ty, span)?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i32 @str_char_at(ptr {s}, i64 {idx})"));
            Ok(Some((reg, SemanticType::I32)))
        }
        "str_concat" | "str_slice" | "str_substring" => {
            let reg = match callee {
                "str_concat" => {
                    let (a, _) = ctx.gen_expr(&args[0])?;
                    let (b, _) = ctx.gen_expr(&args[1])?;
                    let reg = ctx.fresh.fresh_reg();
                    ctx.buffers.body.instr(format!("{reg} = call ptr @str_concat(ptr {a}, ptr {b})"));
                    reg
                }
                _ => {
                    let (s, _) = ctx.gen_expr(&args[0])?;
                    let (start, _) = ctx.gen_expr(&args[1])?;
                    let start = widen_to_i64(ctx, start, &args[1].ty, span)?;
                    let (end, _) = ctx.gen_expr(&args[2])?;
                    let end = widen_to_i64(ctx, end, &args[2].ty, span)?;
                    let reg = ctx.fresh.fresh_reg();
                    ctx.buffers.body.instr(format!("{reg} = call ptr @{callee}(ptr {s}, i64 {start}, i64 {end})"));
                    reg
                }
            };
            ctx.track_string_temp(&reg);
            Ok(Some((reg, SemanticType::Str)))
        }
        name if STR_UNARY_TO_STR.contains(&name) => {
            let (val, _) = ctx.gen_expr(&args[0])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call ptr @{name}(ptr {val})"));
            ctx.track_string_temp(&reg);
            Ok(Some((reg, SemanticType::Str)))
        }
        name if STR_BINARY_PREDICATE.contains(&name) => {
            let (a, _) = ctx.gen_expr(&args[0])?;
            let (b, _) = ctx.gen_expr(&args[1])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i1 @{name}(ptr {a}, ptr {b})"));
            Ok(Some((reg, SemanticType::Bool)))
        }
        name if CHAR_PREDICATE.contains(&name) => {
            let (c, _) = ctx.gen_expr(&args[0])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i1 @{name}(i32 {c})"));
            Ok(Some((reg, SemanticType::Bool)))
        }
        name if CHAR_CONVERSION.contains(&name) => {
            let (c, _) = ctx.gen_expr(&args[0])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i32 @{name}(i32 {c})"));
            Ok(Some((reg, SemanticType::I32)))
        }
        "strbuilder_new" => {
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call ptr @strbuilder_new()"));
            Ok(Some((reg, SemanticType::Str)))
        }
        "strbuilder_append" => {
            let (builder, _) = ctx.gen_expr(&args[0])?;
            let (s, _) = ctx.gen_expr(&args[1])?;
            ctx.buffers.body.instr(format!("call void @strbuilder_append(ptr {builder}, ptr {s})"));
            Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
        }
        "strbuilder_len" => {
            let (builder, _) = ctx.gen_expr(&args[0])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i64 @strbuilder_len(ptr {builder})"));
            Ok(Some((reg, SemanticType::I64)))
        }
        "strbuilder_finish" => {
            let (builder, _) = ctx.gen_expr(&args[0])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call ptr @strbuilder_finish(ptr {builder})"));
            ctx.track_string_temp(&reg);
            Ok(Some((reg, SemanticType::Str)))
        }
        "Instant::now" => {
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call ptr @instant_now()"));
            Ok(Some((reg, SemanticType::Str)))
        }
        "Instant::elapsed" => {
            let (handle, _) = ctx.gen_expr(&args[0])?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i64 @instant_elapsed(ptr {handle})"));
            Ok(Some((reg, SemanticType::I64)))
        }
        "Instant::free" => {
            let (handle, _) = ctx.gen_expr(&args[0])?;
            ctx.buffers.body.instr(format!("call void @instant_free(ptr {handle})"));
            Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
        }
        "Duration::from_millis" | "Duration::from_secs" | "Duration::as_millis" | "Duration::as_secs" => {
            let runtime_fn = format!("duration_{}", callee.trim_start_matches("Duration::"));
            let (val, _) = ctx.gen_expr(&args[0])?;
            let widened = widen_to_i64(ctx, val, &args[0].ty, span)?;
            let reg = ctx.fresh.fresh_reg();
            ctx.buffers.body.instr(format!("{reg} = call i64 @{runtime_fn}(i64 {widened})"));
            Ok(Some((reg, SemanticType::I64)))
        }
        "to_string" => {
            let (val, ty) = ctx.gen_expr(&args[0])?;
            let reg = convert_to_str(ctx, val, &ty, span)?;
            ctx.track_string_temp(&reg);
            Ok(Some((reg, SemanticType::Str)))
        }
        _ => Ok(None),
    }
}

fn dispatch_print(ctx: &mut CodegenContext, callee: &str, args: &[Expr], span: Span) -> Result<Option<Value>, CodegenError> {
    let (val, ty) = ctx.gen_expr(&args[0])?;
    let runtime_fn = match (&ty, callee) {
        (SemanticType::Bool, _) => "print_bool",
        (SemanticType::I32, _) => "print_i32",
        (t, _) if t.is_integer() => "print_i64",
        (t, _) if t.is_float() => "print_f64",
        (SemanticType::Str, "println") => "println",
        (SemanticType::Str, _) => "print",
        _ => return Err(CodegenError::unsupported(format!("cannot print a value of type {ty}"), span)),
    };
    let arg_text = match &ty {
        SemanticType::Bool => format!("i1 {val}"),
        SemanticType::I32 => format!("i32 {val}"),
        t if t.is_integer() => format!("i64 {}", widen_to_i64(ctx, val, t, span)?),
        t if t.is_float() => format!("double {val}"),
        _ => format!("ptr {val}"),
    };
    ctx.buffers.body.instr(format!("call void @{runtime_fn}({arg_text})"));
    Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
}

/// Sign/zero-extends a narrower integer to `i64`, per §4.6's widening rule.
fn widen_to_i64(ctx: &mut CodegenContext, val: String, ty: &SemanticType, span: Span) -> Result<String, CodegenError> {
    let llvm_ty = ctx.lower_type(ty, span)?;
    if llvm_ty == "i64" {
        return Ok(val);
    }
    let reg = ctx.fresh.fresh_reg();
    let op = if ty.is_signed() { "sext" } else { "zext" };
    ctx.buffers.body.instr(format!("{reg} = {op} {llvm_ty} {val} to i64"));
    Ok(reg)
}

fn convert_to_str(ctx: &mut CodegenContext, val: String, ty: &SemanticType, span: Span) -> Result<String, CodegenError> {
    if matches!(ty, SemanticType::Str) {
        return Ok(val);
    }
    let reg = ctx.fresh.fresh_reg();
    match ty {
        SemanticType::Bool => ctx.buffers.body.instr(format!("{reg} = call ptr @bool_to_str(i1 {val})")),
        t if t.is_float() => {
            let llvm_ty = ctx.lower_type(t, span)?;
            let widened = if llvm_ty == "double" {
                val
            } else {
                let w = ctx.fresh.fresh_reg();
                ctx.buffers.body.instr(format!("{w} = fpext {llvm_ty} {val} to double"));
                w
            };
            ctx.buffers.body.instr(format!("{reg} = call ptr @f64_to_str(double {widened})"));
        }
        t if t.is_integer() => {
            let widened = widen_to_i64(ctx, val, t, span)?;
            ctx.buffers.body.instr(format!("{reg} = call ptr @i64_to_str(i64 {widened})"));
        }
        other => return Err(CodegenError::unsupported(format!("no string conversion for type {other}"), span)),
    }
    Ok(reg)
}
