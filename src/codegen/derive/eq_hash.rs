//! `PartialEq`/`Eq` and `Hash` derive expansion (§4.7).

use crate::ast::EnumDecl;
use crate::codegen::error::CodegenError;
use crate::codegen::symbols::StructField;
use crate::semantic_types::SemanticType;

use super::super::CodegenContext;

pub(super) fn derive_struct_eq(ctx: &mut CodegenContext, owner: &str, llvm_name: &str, fields: &[StructField]) -> Result<(), CodegenError> {
    ctx.begin_derived_method(owner, "eq", &[("ptr", "this"), ("ptr", "other")], "i1", SemanticType::Bool);
    let false_label = ctx.derived_fresh_label("eq_false");

    for (_, index, llvm_ty) in fields {
        let this_ptr = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{this_ptr} = getelementptr inbounds {llvm_name}, ptr %this, i32 0, i32 {index}"));
        let other_ptr = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{other_ptr} = getelementptr inbounds {llvm_name}, ptr %other, i32 0, i32 {index}"));

        let cmp = if llvm_ty.starts_with("%struct.") {
            let nested = llvm_ty.trim_start_matches("%struct.");
            let reg = ctx.derived_fresh_reg();
            ctx.derived_instr(format!("{reg} = call i1 @tml_{nested}_eq(ptr {this_ptr}, ptr {other_ptr})"));
            reg
        } else {
            let a = ctx.derived_fresh_reg();
            ctx.derived_instr(format!("{a} = load {llvm_ty}, ptr {this_ptr}"));
            let b = ctx.derived_fresh_reg();
            ctx.derived_instr(format!("{b} = load {llvm_ty}, ptr {other_ptr}"));
            let reg = ctx.derived_fresh_reg();
            match llvm_ty.as_str() {
                "double" | "float" => ctx.derived_instr(format!("{reg} = fcmp oeq {llvm_ty} {a}, {b}")),
                "ptr" => ctx.derived_instr(format!("{reg} = call i1 @str_eq(ptr {a}, ptr {b})")),
                _ => ctx.derived_instr(format!("{reg} = icmp eq {llvm_ty} {a}, {b}")),
            }
            reg
        };

        let next_label = ctx.derived_fresh_label("eq_next");
        ctx.derived_instr(format!("br i1 {cmp}, label %{next_label}, label %{false_label}"));
        ctx.buffers.prelude.line(format!("{next_label}:"));
    }

    ctx.derived_instr("ret i1 1");
    ctx.buffers.prelude.line(format!("{false_label}:"));
    ctx.derived_instr("ret i1 0");
    ctx.end_derived_method();
    Ok(())
}

/// Enums compare tags only (§9 Open Question: payload comparison for
/// data-carrying variants is skipped since the payload's LLVM layout is a
/// raw `[N x i64]` blob with no recoverable per-field type information at
/// this point — documented limitation per §4.7).
pub(super) fn derive_enum_eq(ctx: &mut CodegenContext, owner: &str, llvm_name: &str, decl: &EnumDecl) -> Result<(), CodegenError> {
    let _ = decl;
    ctx.begin_derived_method(owner, "eq", &[("ptr", "this"), ("ptr", "other")], "i1", SemanticType::Bool);
    let t1 = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{t1} = getelementptr inbounds {llvm_name}, ptr %this, i32 0, i32 0"));
    let t2 = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{t2} = getelementptr inbounds {llvm_name}, ptr %other, i32 0, i32 0"));
    let tag1 = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag1} = load i32, ptr {t1}"));
    let tag2 = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag2} = load i32, ptr {t2}"));
    let cmp = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{cmp} = icmp eq i32 {tag1}, {tag2}"));
    ctx.derived_instr(format!("ret i1 {cmp}"));
    ctx.end_derived_method();
    Ok(())
}

/// Polynomial hash combine (§4.7): `acc = acc * prime ^ field_hash`, with
/// string fields delegating to the runtime `str_hash`.
const HASH_PRIME: i64 = 1000003;

pub(super) fn derive_struct_hash(ctx: &mut CodegenContext, owner: &str, llvm_name: &str, fields: &[StructField]) -> Result<(), CodegenError> {
    ctx.begin_derived_method(owner, "hash", &[("ptr", "this")], "i64", SemanticType::I64);
    let mut acc = "0".to_string();
    for (_, index, llvm_ty) in fields {
        let field_ptr = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{field_ptr} = getelementptr inbounds {llvm_name}, ptr %this, i32 0, i32 {index}"));
        let field_hash = field_hash_value(ctx, &field_ptr, llvm_ty);
        let scaled = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{scaled} = mul i64 {acc}, {HASH_PRIME}"));
        let combined = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{combined} = xor i64 {scaled}, {field_hash}"));
        acc = combined;
    }
    ctx.derived_instr(format!("ret i64 {acc}"));
    ctx.end_derived_method();
    Ok(())
}

fn field_hash_value(ctx: &mut CodegenContext, field_ptr: &str, llvm_ty: &str) -> String {
    if llvm_ty.starts_with("%struct.") {
        let nested = llvm_ty.trim_start_matches("%struct.");
        let reg = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{reg} = call i64 @tml_{nested}_hash(ptr {field_ptr})"));
        return reg;
    }
    let val = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{val} = load {llvm_ty}, ptr {field_ptr}"));
    let reg = ctx.derived_fresh_reg();
    match llvm_ty {
        "ptr" => ctx.derived_instr(format!("{reg} = call i64 @str_hash(ptr {val})")),
        "double" => ctx.derived_instr(format!("{reg} = bitcast double {val} to i64")),
        "float" => {
            let widened = ctx.derived_fresh_reg();
            ctx.derived_instr(format!("{widened} = fpext float {val} to double"));
            ctx.derived_instr(format!("{reg} = bitcast double {widened} to i64"));
        }
        "i64" => return val,
        _ => ctx.derived_instr(format!("{reg} = zext {llvm_ty} {val} to i64")),
    }
    reg
}

pub(super) fn derive_enum_hash(ctx: &mut CodegenContext, owner: &str, llvm_name: &str, decl: &EnumDecl) -> Result<(), CodegenError> {
    let _ = decl;
    ctx.begin_derived_method(owner, "hash", &[("ptr", "this")], "i64", SemanticType::I64);
    let tag_ptr = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag_ptr} = getelementptr inbounds {llvm_name}, ptr %this, i32 0, i32 0"));
    let tag = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag} = load i32, ptr {tag_ptr}"));
    let reg = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{reg} = zext i32 {tag} to i64"));
    ctx.derived_instr(format!("ret i64 {reg}"));
    ctx.end_derived_method();
    Ok(())
}
