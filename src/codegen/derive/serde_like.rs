//! `FromStr`/`Deserialize`/`Serialize` derive expansion (§4.7): JSON-ish
//! text parsing and composition through a handful of runtime `json_get_*`
//! helpers. `Outcome[T, E]` is an ordinary user/stdlib-declared generic
//! enum here, not a compiler-synthesized type the way `Poll[T]` is — if
//! the compiled module has no `Outcome` declaration, the derive is skipped
//! non-fatally (§9 Open Question: there is nowhere to put a parse failure
//! without one).

use crate::ast::EnumDecl;
use crate::codegen::error::CodegenError;
use crate::codegen::symbols::StructField;
use crate::codegen::types::struct_llvm_name;
use crate::semantic_types::SemanticType;
use crate::token::Span;

use super::super::CodegenContext;

fn outcome_type(ctx: &mut CodegenContext, owner: &str) -> Option<(String, String)> {
    if ctx.decls.enum_decl("Outcome").is_none() {
        return None;
    }
    let type_args = vec![SemanticType::Named { name: owner.to_string(), type_args: Vec::new() }, SemanticType::Str];
    let mangled = ctx
        .instantiation
        .require_enum_instantiation("Outcome", &type_args, &mut ctx.symbols, &ctx.decls, &mut ctx.buffers, Span::synthetic())
        .ok()?;
    let llvm_name = struct_llvm_name(&mangled);
    Some((mangled, llvm_name))
}

fn outcome_tags(ctx: &CodegenContext, mangled: &str) -> (i64, i64) {
    let ok = ctx.symbols.enum_variant_tag(mangled, "Ok").unwrap_or(0);
    let err = ctx.symbols.enum_variant_tag(mangled, "Err").unwrap_or(1);
    (ok, err)
}

fn literal_ptr(ctx: &mut CodegenContext, s: &str) -> String {
    let global = ctx.intern_string_literal(s);
    let len = s.len() + 1;
    let reg = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{reg} = getelementptr inbounds [{len} x i8], ptr {global}, i64 0, i64 0"));
    reg
}

/// Stores `tag` into field 0 and `payload` (already evaluated to an LLVM
/// value string of type `payload_ty`) into field 1 of a fresh `outcome_llvm`
/// alloca, then loads and returns the whole struct by value.
fn pack_outcome(ctx: &mut CodegenContext, outcome_llvm: &str, tag: i64, payload_ty: &str, payload: &str) -> String {
    let slot = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{slot} = alloca {outcome_llvm}"));
    let tag_ptr = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag_ptr} = getelementptr inbounds {outcome_llvm}, ptr {slot}, i32 0, i32 0"));
    ctx.derived_instr(format!("store i32 {tag}, ptr {tag_ptr}"));
    let payload_ptr = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{payload_ptr} = getelementptr inbounds {outcome_llvm}, ptr {slot}, i32 0, i32 1"));
    ctx.derived_instr(format!("store {payload_ty} {payload}, ptr {payload_ptr}"));
    let loaded = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{loaded} = load {outcome_llvm}, ptr {slot}"));
    loaded
}

pub(super) fn derive_struct_deserialize(ctx: &mut CodegenContext, owner: &str, llvm_name: &str, fields: &[StructField]) -> Result<(), CodegenError> {
    let Some((outcome_mangled, outcome_llvm)) = outcome_type(ctx, owner) else {
        tracing::debug!(owner, "skipping Deserialize derive: no Outcome declaration in module");
        return Ok(());
    };
    let (ok_tag, err_tag) = outcome_tags(ctx, &outcome_mangled);

    ctx.begin_derived_method(
        owner,
        "from_str",
        &[("ptr", "json")],
        &outcome_llvm,
        SemanticType::Named { name: "Outcome".to_string(), type_args: Vec::new() },
    );

    // The runtime's `json_get_*` helpers return the field's value directly
    // with a caller-supplied default, rather than an out-param plus a
    // presence flag (§6's runtime symbol list), so there is no presence
    // check to branch on here: a struct's Deserialize always succeeds,
    // falling back to each field's zero value when a key is absent. Only
    // the enum form below (variant-name matching) has a genuine `Err` path.
    let _ = err_tag;
    let doc = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{doc} = call ptr @json_parse(ptr %json)"));
    let value_slot = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{value_slot} = alloca {llvm_name}"));

    for (name, index, llvm_ty) in fields {
        let key_ptr = literal_ptr(ctx, name);
        let (getter, default_llvm_ty, default_value) = match llvm_ty.as_str() {
            "ptr" => ("json_get_string", "ptr", "null".to_string()),
            "i1" => ("json_get_bool", "i1", "0".to_string()),
            "double" | "float" => ("json_get_f64", "double", "0.0".to_string()),
            _ => ("json_get_i64", "i64", "0".to_string()),
        };
        let default_slot = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{default_slot} = alloca {default_llvm_ty}"));
        ctx.derived_instr(format!("store {default_llvm_ty} {default_value}, ptr {default_slot}"));
        let value = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{value} = call {default_llvm_ty} @{getter}(ptr {doc}, ptr {key_ptr}, ptr {default_slot})"));
        let value = if llvm_ty == "float" {
            let narrowed = ctx.derived_fresh_reg();
            ctx.derived_instr(format!("{narrowed} = fptrunc double {value} to float"));
            narrowed
        } else {
            value
        };
        let field_ptr = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{field_ptr} = getelementptr inbounds {llvm_name}, ptr {value_slot}, i32 0, i32 {index}"));
        ctx.derived_instr(format!("store {llvm_ty} {value}, ptr {field_ptr}"));
    }

    ctx.derived_instr(format!("call void @json_free(ptr {doc})"));
    let loaded = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{loaded} = load {llvm_name}, ptr {value_slot}"));
    let ok_result = pack_outcome(ctx, &outcome_llvm, ok_tag, llvm_name, &loaded);
    ctx.derived_instr(format!("ret {outcome_llvm} {ok_result}"));

    ctx.end_derived_method();
    Ok(())
}

pub(super) fn derive_struct_serialize(ctx: &mut CodegenContext, owner: &str, llvm_name: &str, fields: &[StructField]) -> Result<(), CodegenError> {
    ctx.begin_derived_method(owner, "to_json", &[("ptr", "this")], "ptr", SemanticType::Str);

    let mut acc = literal_ptr(ctx, "{");
    for (i, (name, index, llvm_ty)) in fields.iter().enumerate() {
        let prefix = if i > 0 { format!(",\"{name}\":") } else { format!("\"{name}\":") };
        let lit_ptr = literal_ptr(ctx, &prefix);
        let next = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{next} = call ptr @str_concat_opt(ptr {acc}, ptr {lit_ptr})"));
        acc = next;

        let field_ptr = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{field_ptr} = getelementptr inbounds {llvm_name}, ptr %this, i32 0, i32 {index}"));
        let val = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{val} = load {llvm_ty}, ptr {field_ptr}"));
        // No quoting helper is in the runtime symbol list (§6), so a string
        // field's JSON rendering is its raw bytes rather than a quoted
        // literal — acceptable for this engine's scope, which treats JSON
        // as a convenient wire format rather than a validated one.
        let text = match llvm_ty.as_str() {
            "ptr" => val,
            "i1" => {
                let reg = ctx.derived_fresh_reg();
                ctx.derived_instr(format!("{reg} = call ptr @bool_to_str(i1 {val})"));
                reg
            }
            "double" | "float" => {
                let widened = if llvm_ty == "float" {
                    let reg = ctx.derived_fresh_reg();
                    ctx.derived_instr(format!("{reg} = fpext float {val} to double"));
                    reg
                } else {
                    val
                };
                let reg = ctx.derived_fresh_reg();
                ctx.derived_instr(format!("{reg} = call ptr @f64_to_str(double {widened})"));
                reg
            }
            "i64" => {
                let reg = ctx.derived_fresh_reg();
                ctx.derived_instr(format!("{reg} = call ptr @i64_to_str(i64 {val})"));
                reg
            }
            other => {
                let widened = ctx.derived_fresh_reg();
                ctx.derived_instr(format!("{widened} = sext {other} {val} to i64"));
                let reg = ctx.derived_fresh_reg();
                ctx.derived_instr(format!("{reg} = call ptr @i64_to_str(i64 {widened})"));
                reg
            }
        };
        let joined = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{joined} = call ptr @str_concat_opt(ptr {acc}, ptr {text})"));
        acc = joined;
    }

    let closing_ptr = literal_ptr(ctx, "}");
    let result = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{result} = call ptr @str_concat_opt(ptr {acc}, ptr {closing_ptr})"));
    ctx.derived_instr(format!("ret ptr {result}"));
    ctx.end_derived_method();
    Ok(())
}

/// Matches the input string against each variant's bare name (§9: enums
/// carry no parsed payload, consistent with the tag-only equality/hash
/// simplification).
pub(super) fn derive_enum_deserialize(ctx: &mut CodegenContext, owner: &str, llvm_name: &str, decl: &EnumDecl) -> Result<(), CodegenError> {
    let Some((outcome_mangled, outcome_llvm)) = outcome_type(ctx, owner) else {
        tracing::debug!(owner, "skipping Deserialize derive: no Outcome declaration in module");
        return Ok(());
    };
    let (ok_tag, err_tag) = outcome_tags(ctx, &outcome_mangled);

    ctx.begin_derived_method(
        owner,
        "from_str",
        &[("ptr", "json")],
        &outcome_llvm,
        SemanticType::Named { name: "Outcome".to_string(), type_args: Vec::new() },
    );

    for (tag, variant) in decl.variants.iter().enumerate() {
        let name_ptr = literal_ptr(ctx, &variant.name);
        let matches = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{matches} = call i1 @str_eq(ptr %json, ptr {name_ptr})"));
        let body = ctx.derived_fresh_label("deser_variant");
        let check_next = ctx.derived_fresh_label("deser_check");
        ctx.derived_instr(format!("br i1 {matches}, label %{body}, label %{check_next}"));

        ctx.buffers.prelude.line(format!("{body}:"));
        let inner_slot = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{inner_slot} = alloca {llvm_name}"));
        let inner_tag_ptr = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{inner_tag_ptr} = getelementptr inbounds {llvm_name}, ptr {inner_slot}, i32 0, i32 0"));
        ctx.derived_instr(format!("store i32 {tag}, ptr {inner_tag_ptr}"));
        let inner_loaded = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{inner_loaded} = load {llvm_name}, ptr {inner_slot}"));
        let ok_result = pack_outcome(ctx, &outcome_llvm, ok_tag, llvm_name, &inner_loaded);
        ctx.derived_instr(format!("ret {outcome_llvm} {ok_result}"));

        ctx.buffers.prelude.line(format!("{check_next}:"));
    }

    let message_ptr = literal_ptr(ctx, "unknown variant");
    let err_result = pack_outcome(ctx, &outcome_llvm, err_tag, "ptr", &message_ptr);
    ctx.derived_instr(format!("ret {outcome_llvm} {err_result}"));

    ctx.end_derived_method();
    Ok(())
}

pub(super) fn derive_enum_serialize(ctx: &mut CodegenContext, owner: &str, decl: &EnumDecl) -> Result<(), CodegenError> {
    ctx.begin_derived_method(owner, "to_json", &[("ptr", "this")], "ptr", SemanticType::Str);
    let tag_ptr = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag_ptr} = getelementptr inbounds %struct.{owner}, ptr %this, i32 0, i32 0"));
    let tag = ctx.derived_fresh_reg();
    ctx.derived_instr(format!("{tag} = load i32, ptr {tag_ptr}"));

    let end_label = ctx.derived_fresh_label("ser_end");
    let mut incoming = Vec::with_capacity(decl.variants.len());
    for (tag_value, variant) in decl.variants.iter().enumerate() {
        let body = ctx.derived_fresh_label("ser_variant");
        let check_next = ctx.derived_fresh_label("ser_check");
        let cmp = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{cmp} = icmp eq i32 {tag}, {tag_value}"));
        ctx.derived_instr(format!("br i1 {cmp}, label %{body}, label %{check_next}"));
        ctx.buffers.prelude.line(format!("{body}:"));
        let text = format!("{{\"variant\":\"{}\"}}", variant.name);
        let reg = literal_ptr(ctx, &text);
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
