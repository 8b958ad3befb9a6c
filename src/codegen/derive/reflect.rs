//! `Reflect` derive expansion (§4.7, §9 Open Question): a `TypeInfo`
//! constant plus `type_info()`/`runtime_type_info()` accessors. Size and
//! alignment fields are left `0` — recovering them exactly would mean
//! threading the full layout computation through every derive, which this
//! engine does not attempt (documented in `DESIGN.md`).

use crate::ast::EnumDecl;
use crate::codegen::error::CodegenError;
use crate::codegen::symbols::StructField;
use crate::semantic_types::SemanticType;

use super::super::CodegenContext;

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn emit_type_info_global(ctx: &mut CodegenContext, owner: &str) -> String {
    let name_global = ctx.intern_string_literal(owner);
    let name_len = owner.len() + 1;
    let global = format!("@.typeinfo.{owner}");
    let id = fnv1a(owner);
    ctx.buffers.prelude.line(format!(
        "{global} = private unnamed_addr constant {{ i64, ptr, i64, i64 }} {{ i64 {id}, ptr getelementptr inbounds ([{name_len} x i8], ptr {name_global}, i64 0, i64 0), i64 0, i64 0 }}"
    ));
    global
}

pub(super) fn derive_struct_reflect(ctx: &mut CodegenContext, owner: &str, fields: &[StructField]) -> Result<(), CodegenError> {
    let _ = fields;
    let global = emit_type_info_global(ctx, owner);

    ctx.begin_derived_method(owner, "type_info", &[], "ptr", SemanticType::Pointer(Box::new(SemanticType::Unit)));
    ctx.derived_instr(format!("ret ptr {global}"));
    ctx.end_derived_method();

    ctx.begin_derived_method(owner, "runtime_type_info", &[("ptr", "this")], "ptr", SemanticType::Pointer(Box::new(SemanticType::Unit)));
    ctx.derived_instr(format!("ret ptr {global}"));
    ctx.end_derived_method();
    Ok(())
}

pub(super) fn derive_enum_reflect(ctx: &mut CodegenContext, owner: &str, decl: &EnumDecl) -> Result<(), CodegenError> {
    let global = emit_type_info_global(ctx, owner);

    ctx.begin_derived_method(owner, "type_info", &[], "ptr", SemanticType::Pointer(Box::new(SemanticType::Unit)));
    ctx.derived_instr(format!("ret ptr {global}"));
    ctx.end_derived_method();

    ctx.begin_derived_method(owner, "runtime_type_info", &[("ptr", "this")], "ptr", SemanticType::Pointer(Box::new(SemanticType::Unit)));
    ctx.derived_instr(format!("ret ptr {global}"));
    ctx.end_derived_method();

    ctx.begin_derived_method(owner, "variant_tag", &[("ptr", "this")], "i32", SemanticType::I32);
    let tag_ptr = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag_ptr} = getelementptr inbounds %struct.{owner}, ptr %this, i32 0, i32 0"));
    let tag = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag} = load i32, ptr {tag_ptr}"));
    ctx.derived_instr(format!("ret i32 {tag}"));
    ctx.end_derived_method();

    ctx.begin_derived_method(owner, "variant_name", &[("ptr", "this")], "ptr", SemanticType::Str);
    let tag_ptr = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag_ptr} = getelementptr inbounds %struct.{owner}, ptr %this, i32 0, i32 0"));
    let tag = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag} = load i32, ptr {tag_ptr}"));
    let end_label = ctx.derived_fresh_label("variant_name_end");
    let mut incoming = Vec::with_capacity(decl.variants.len());
    for (tag_value, variant) in decl.variants.iter().enumerate() {
        let body = ctx.derived_fresh_label("variant_name_case");
        let check_next = ctx.derived_fresh_label("variant_name_check");
        let cmp = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{cmp} = icmp eq i32 {tag}, {tag_value}"));
        ctx.derived_instr(format!("br i1 {cmp}, label %{body}, label %{check_next}"));
        ctx.buffers.prelude.line(format!("{body}:"));
        let name_global = ctx.intern_string_literal(&variant.name);
        let name_len = variant.name.len() + 1;
        let reg = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{reg} = getelementptr inbounds [{name_len} x i8], ptr {name_global}, i64 0, i64 0"));
        ctx.derived_instr(format!("br label %{end_label}"));
        incoming.push((reg, body));
        ctx.buffers.prelude.line(format!("{check_next}:"));
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
