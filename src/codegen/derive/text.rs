//! `Debug`/`Display` derive expansion (§4.7): a sequence of runtime
//! `str_concat_opt` calls accumulating a human-readable string.

use crate::ast::EnumDecl;
use crate::codegen::error::CodegenError;
use crate::codegen::symbols::StructField;
use crate::semantic_types::SemanticType;

use super::super::CodegenContext;

fn literal(ctx: &mut CodegenContext, s: &str) -> String {
    let global = ctx.intern_string_literal(s);
    let len = s.len() + 1;
    let reg = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{reg} = getelementptr inbounds [{len} x i8], ptr {global}, i64 0, i64 0"));
    reg
}

fn concat(ctx: &mut CodegenContext, a: String, b: String) -> String {
    let reg = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{reg} = call ptr @str_concat_opt(ptr {a}, ptr {b})"));
    reg
}

/// Converts a loaded scalar value to `Str`, or recurses into a nested
/// aggregate's own text method when the field is itself derived.
fn field_to_text(ctx: &mut CodegenContext, field_ptr: &str, llvm_ty: &str, method: &str) -> String {
    if llvm_ty.starts_with("%struct.") {
        let nested = llvm_ty.trim_start_matches("%struct.");
        let reg = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{reg} = call ptr @tml_{nested}_{method}(ptr {field_ptr})"));
        return reg;
    }
    let val = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{val} = load {llvm_ty}, ptr {field_ptr}"));
    let reg = ctx.derived_fresh_reg();
    match llvm_ty {
        "ptr" => return val,
        "i1" => ctx.derived_instr(format!("{reg} = call ptr @bool_to_str(i1 {val})")),
        "double" => ctx.derived_instr(format!("{reg} = call ptr @f64_to_str(double {val})")),
        "float" => {
            let widened = ctx.derived_fresh_reg();
            ctx.derived_instr(format!("{widened} = fpext float {val} to double"));
            ctx.derived_instr(format!("{reg} = call ptr @f64_to_str(double {widened})"));
        }
        "i64" => ctx.derived_instr(format!("{reg} = call ptr @i64_to_str(i64 {val})")),
        other => {
            let widened = ctx.derived_fresh_reg();
            ctx.derived_instr(format!("{widened} = sext {other} {val} to i64"));
            ctx.derived_instr(format!("{reg} = call ptr @i64_to_str(i64 {widened})"));
        }
    }
    reg
}

pub(super) fn derive_struct_text(
    ctx: &mut CodegenContext,
    owner: &str,
    llvm_name: &str,
    fields: &[StructField],
    method: &str,
    is_debug: bool,
) -> Result<(), CodegenError> {
    ctx.begin_derived_method(owner, method, &[("ptr", "this")], "ptr", SemanticType::Str);

    let opening = if is_debug { format!("{owner} {{ ") } else { String::new() };
    let mut acc = literal(ctx, &opening);

    for (i, (name, index, llvm_ty)) in fields.iter().enumerate() {
        let separator = if is_debug {
            if i > 0 { format!(", {name}: ") } else { format!("{name}: ") }
        } else if i > 0 {
            ", ".to_string()
        } else {
            String::new()
        };
        if !separator.is_empty() {
            let lit = literal(ctx, &separator);
            acc = concat(ctx, acc, lit);
        }
        let field_ptr = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{field_ptr} = getelementptr inbounds {llvm_name}, ptr %this, i32 0, i32 {index}"));
        let field_text = field_to_text(ctx, &field_ptr, llvm_ty, if is_debug { "debug_string" } else { "to_string" });
        acc = concat(ctx, acc, field_text);
    }

    if is_debug {
        let closing = literal(ctx, " }");
        acc = concat(ctx, acc, closing);
    }

    ctx.derived_instr(format!("ret ptr {acc}"));
    ctx.end_derived_method();
    Ok(())
}

pub(super) fn derive_enum_text(ctx: &mut CodegenContext, owner: &str, decl: &EnumDecl, method: &str, is_debug: bool) -> Result<(), CodegenError> {
    ctx.begin_derived_method(owner, method, &[("ptr", "this")], "ptr", SemanticType::Str);
    let tag_ptr = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag_ptr} = getelementptr inbounds %struct.{owner}, ptr %this, i32 0, i32 0"));
    let tag = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag} = load i32, ptr {tag_ptr}"));

    let end_label = ctx.derived_fresh_label("text_end");
    let mut incoming = Vec::with_capacity(decl.variants.len());
    for (tag_value, variant) in decl.variants.iter().enumerate() {
        let body_label = ctx.derived_fresh_label("text_variant");
        let next_check = ctx.derived_fresh_label("text_check");
        let cmp = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{cmp} = icmp eq i32 {tag}, {tag_value}"));
        ctx.derived_instr(format!("br i1 {cmp}, label %{body_label}, label %{next_check}"));
        ctx.buffers.prelude.line(format!("{body_label}:"));
        let text = if is_debug { format!("{owner}::{}", variant.name) } else { variant.name.clone() };
        let lit = literal(ctx, &text);
        ctx.derived_instr(format!("br label %{end_label}"));
        incoming.push((lit, body_label));
        ctx.buffers.prelude.line(format!("{next_check}:"));
    }
    ctx.derived_instr("unreachable");

    ctx.buffers.prelude.line(format!("{end_label}:"));
    let phi = incoming.iter().map(|(v, l)| format!("[ {v}, %{l} ]")).collect::<Vec<_>>().join(", ");
    let reg = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{reg} = phi ptr {phi}"));
    ctx.derived_instr(format!("ret ptr {reg}"));
    ctx.end_derived_method();
    Ok(())
}
