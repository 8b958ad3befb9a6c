//! `Default` derive expansion (§4.7): a static `default() -> Self`
//! constructor, zero-valued field by field.

use crate::ast::EnumDecl;
use crate::codegen::error::CodegenError;
use crate::codegen::symbols::StructField;
use crate::semantic_types::SemanticType;

use super::super::CodegenContext;

fn default_value_for(ctx: &mut CodegenContext, llvm_ty: &str) -> String {
    match llvm_ty {
        "ptr" => "null".to_string(),
        "double" | "float" => "0.0".to_string(),
        "i1" => "0".to_string(),
        ty if ty.starts_with("%struct.") => {
            let nested = ty.trim_start_matches("%struct.");
            let reg = ctx.derived_fresh_reg();
            ctx.derived_instr(format!("{reg} = call {ty} @tml_{nested}_default()"));
            reg
        }
        _ => "0".to_string(),
    }
}

pub(super) fn derive_struct_default(ctx: &mut CodegenContext, owner: &str, llvm_name: &str, fields: &[StructField]) -> Result<(), CodegenError> {
    ctx.begin_derived_method(owner, "default", &[], llvm_name, SemanticType::Named { name: owner.to_string(), type_args: Vec::new() });

    if fields.is_empty() {
        ctx.derived_instr(format!("ret {llvm_name} zeroinitializer"));
        ctx.end_derived_method();
        return Ok(());
    }

    let mut acc = "undef".to_string();
    for (_, index, llvm_ty) in fields {
        let value = default_value_for(ctx, llvm_ty);
        let reg = ctx.derived_fresh_reg();
        ctx.derived_instr(format!("{reg} = insertvalue {llvm_name} {acc}, {llvm_ty} {value}, {index}"));
        acc = reg;
    }
    ctx.derived_instr(format!("ret {llvm_name} {acc}"));
    ctx.end_derived_method();
    Ok(())
}

/// Returns a zero-tagged value; the first declared variant occupies tag 0
/// (§4.5's sequential tag assignment), so `zeroinitializer` is always a
/// valid default regardless of whether that variant carries a payload.
pub(super) fn derive_enum_default(ctx: &mut CodegenContext, owner: &str, llvm_name: &str, decl: &EnumDecl) -> Result<(), CodegenError> {
    let _ = decl;
    ctx.begin_derived_method(owner, "default", &[], llvm_name, SemanticType::Named { name: owner.to_string(), type_args: Vec::new() });
    ctx.derived_instr(format!("ret {llvm_name} zeroinitializer"));
    ctx.end_derived_method();
    Ok(())
}
