//! Semantic type → LLVM type string lowering, and size/align calculation
//! for enum payloads (§4.2).
//!
//! Named struct/enum types are the one case this module cannot resolve on
//! its own: lowering a not-yet-instantiated generic struct/enum must first
//! trigger its instantiation (§4.2's "if not yet instantiated, trigger
//! instantiation first"), which needs the instantiation registry. That
//! orchestration lives in [`crate::codegen::CodegenContext::lower_type`];
//! this module only lowers the primitive/structural cases and computes
//! size/alignment over already-resolved LLVM type strings.

use crate::semantic_types::SemanticType;

use super::symbols::SymbolTables;

/// Distinguishes `Unit`'s two lowerings (§4.2): `{}` in struct/data
/// position, `void` only as a function's return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePosition {
    Data,
    Return,
}

/// Lowers every [`SemanticType`] variant that does not require
/// instantiation-registry access. Returns `None` for `Named` and
/// unsubstituted `Generic`/`Poll` types — the caller resolves those.
pub fn lower_primitive(ty: &SemanticType, position: TypePosition) -> Option<String> {
    Some(match ty {
        SemanticType::Unit => match position {
            TypePosition::Data => "{}".to_string(),
            TypePosition::Return => "void".to_string(),
        },
        SemanticType::Bool => "i1".to_string(),
        SemanticType::I8 | SemanticType::U8 => "i8".to_string(),
        SemanticType::I16 | SemanticType::U16 => "i16".to_string(),
        SemanticType::I32 | SemanticType::U32 => "i32".to_string(),
        SemanticType::I64 | SemanticType::U64 => "i64".to_string(),
        SemanticType::I128 | SemanticType::U128 => "i128".to_string(),
        SemanticType::F32 => "float".to_string(),
        SemanticType::F64 => "double".to_string(),
        SemanticType::Str | SemanticType::Pointer(_) | SemanticType::Reference { .. } => "ptr".to_string(),
        SemanticType::Tuple(elems) => {
            let parts: Option<Vec<String>> = elems.iter().map(|e| lower_primitive(e, TypePosition::Data)).collect();
            format!("{{ {} }}", parts?.join(", "))
        }
        SemanticType::Named { .. } | SemanticType::Generic(_) | SemanticType::Poll(_) => return None,
    })
}

/// Formats a mangled instantiation name as the LLVM struct type it defines.
pub fn struct_llvm_name(mangled: &str) -> String {
    format!("%struct.{mangled}")
}

/// Size in bytes of an already-lowered LLVM type string, per §4.2's fixed
/// table: 1 for `i8/i1`, 2 for `i16`, 4 for `i32/float`, 8 for
/// `i64/double/ptr`, 16 for `i128`, recursive for anonymous tuples and
/// named structs (looked up via `symbols`). Unknown forms (e.g. `void`,
/// `{}`) size to 0.
pub fn size_of_llvm_type(llvm_ty: &str, symbols: &SymbolTables) -> u64 {
    match llvm_ty {
        "i1" | "i8" => 1,
        "i16" => 2,
        "i32" | "float" => 4,
        "i64" | "double" | "ptr" => 8,
        "i128" => 16,
        _ if llvm_ty.starts_with("%struct.") => {
            let mangled = &llvm_ty["%struct.".len()..];
            symbols
                .struct_info(mangled)
                .map(|info| info.fields.iter().map(|(_, _, t)| size_of_llvm_type(t, symbols)).sum())
                .unwrap_or(0)
        }
        _ if llvm_ty.starts_with('{') => {
            anonymous_struct_fields(llvm_ty).iter().map(|t| size_of_llvm_type(t, symbols)).sum()
        }
        _ => 0,
    }
}

/// Alignment in bytes, using the same fixed table but taking the maximum
/// over aggregate members rather than summing.
pub fn align_of_llvm_type(llvm_ty: &str, symbols: &SymbolTables) -> u64 {
    match llvm_ty {
        "i1" | "i8" => 1,
        "i16" => 2,
        "i32" | "float" => 4,
        "i64" | "double" | "ptr" => 8,
        "i128" => 16,
        _ if llvm_ty.starts_with("%struct.") => {
            let mangled = &llvm_ty["%struct.".len()..];
            symbols
                .struct_info(mangled)
                .map(|info| info.fields.iter().map(|(_, _, t)| align_of_llvm_type(t, symbols)).max().unwrap_or(1))
                .unwrap_or(1)
        }
        _ if llvm_ty.starts_with('{') => {
            anonymous_struct_fields(llvm_ty).iter().map(|t| align_of_llvm_type(t, symbols)).max().unwrap_or(1)
        }
        _ => 1,
    }
}

/// Splits `"{ t1, t2 }"` into its top-level element type strings, respecting
/// nested braces so a tuple-of-tuples doesn't split on the inner comma.
fn anonymous_struct_fields(llvm_ty: &str) -> Vec<String> {
    let inner = llvm_ty.trim().trim_start_matches('{').trim_end_matches('}').trim();
    if inner.is_empty() {
        return Vec::new();
    }
    let mut fields = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        fields.push(current.trim().to_string());
    }
    fields
}

/// Number of `i64` words needed for an enum payload area holding up to
/// `max_variant_bytes`, rounded up so the area is 8-byte aligned (§4.2,
/// §4.8).
pub fn enum_payload_words(max_variant_bytes: u64) -> u64 {
    max_variant_bytes.div_ceil(8).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_primitive_unit_position_matters() {
        assert_eq!(lower_primitive(&SemanticType::Unit, TypePosition::Data), Some("{}".to_string()));
        assert_eq!(lower_primitive(&SemanticType::Unit, TypePosition::Return), Some("void".to_string()));
    }

    #[test]
    fn test_lower_primitive_ptr_like() {
        assert_eq!(lower_primitive(&SemanticType::Str, TypePosition::Data), Some("ptr".to_string()));
        assert_eq!(lower_primitive(&SemanticType::Pointer(Box::new(SemanticType::I32)), TypePosition::Data), Some("ptr".to_string()));
    }

    #[test]
    fn test_lower_primitive_named_returns_none() {
        assert_eq!(lower_primitive(&SemanticType::Named { name: "P".to_string(), type_args: Vec::new() }, TypePosition::Data), None);
    }

    #[test]
    fn test_lower_tuple() {
        let ty = SemanticType::Tuple(vec![SemanticType::I32, SemanticType::Bool]);
        assert_eq!(lower_primitive(&ty, TypePosition::Data), Some("{ i32, i1 }".to_string()));
    }

    #[test]
    fn test_size_of_fixed_table() {
        let symbols = SymbolTables::new();
        assert_eq!(size_of_llvm_type("i1", &symbols), 1);
        assert_eq!(size_of_llvm_type("i16", &symbols), 2);
        assert_eq!(size_of_llvm_type("i32", &symbols), 4);
        assert_eq!(size_of_llvm_type("double", &symbols), 8);
        assert_eq!(size_of_llvm_type("i128", &symbols), 16);
    }

    #[test]
    fn test_size_of_anonymous_tuple() {
        let symbols = SymbolTables::new();
        assert_eq!(size_of_llvm_type("{ i32, i64 }", &symbols), 12);
    }

    #[test]
    fn test_size_of_named_struct_via_symbol_table() {
        let mut symbols = SymbolTables::new();
        symbols.register_struct("P", "%struct.P".to_string(), vec![
            ("x".to_string(), 0, "i32".to_string()),
            ("y".to_string(), 1, "i64".to_string()),
        ]);
        assert_eq!(size_of_llvm_type("%struct.P", &symbols), 12);
        assert_eq!(align_of_llvm_type("%struct.P", &symbols), 8);
    }

    #[test]
    fn test_enum_payload_words_rounds_up_to_8_byte_alignment() {
        assert_eq!(enum_payload_words(4), 1);
        assert_eq!(enum_payload_words(8), 1);
        assert_eq!(enum_payload_words(9), 2);
        assert_eq!(enum_payload_words(0), 0);
    }
}
