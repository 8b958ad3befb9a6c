//! Deterministic name mangling (§4.1, §6).
//!
//! Mangling is a total function of its inputs: the same base name and type
//! arguments always produce the same byte-identical mangled name, across
//! runs and machines (§8's determinism property). The only failure mode is
//! an unsupported [`SemanticType`] variant reaching mangling unsubstituted
//! (a bare [`SemanticType::Generic`]), which signals a type-checker bug,
//! not a user error — mirrored here as [`CodegenError::internal`].

use crate::codegen::error::CodegenError;
use crate::semantic_types::SemanticType;
use crate::token::Span;

/// Mangles a single semantic type per §6's scheme: primitive names
/// literal, pointers prefixed `P_`, references prefixed `R_`/`MR_`, nested
/// generics recursively mangled, tuples `T_len_elem1_elem2_...`.
pub fn mangle_type(ty: &SemanticType, span: Span) -> Result<String, CodegenError> {
    Ok(match ty {
        SemanticType::Unit => "Unit".to_string(),
        SemanticType::Bool => "Bool".to_string(),
        SemanticType::I8 => "I8".to_string(),
        SemanticType::I16 => "I16".to_string(),
        SemanticType::I32 => "I32".to_string(),
        SemanticType::I64 => "I64".to_string(),
        SemanticType::I128 => "I128".to_string(),
        SemanticType::U8 => "U8".to_string(),
        SemanticType::U16 => "U16".to_string(),
        SemanticType::U32 => "U32".to_string(),
        SemanticType::U64 => "U64".to_string(),
        SemanticType::U128 => "U128".to_string(),
        SemanticType::F32 => "F32".to_string(),
        SemanticType::F64 => "F64".to_string(),
        SemanticType::Str => "Str".to_string(),
        SemanticType::Pointer(inner) => format!("P_{}", mangle_type(inner, span)?),
        SemanticType::Reference { inner, mutable: true } => format!("MR_{}", mangle_type(inner, span)?),
        SemanticType::Reference { inner, mutable: false } => format!("R_{}", mangle_type(inner, span)?),
        SemanticType::Named { name, type_args } if type_args.is_empty() => name.clone(),
        SemanticType::Named { name, type_args } => mangle_name(name, type_args, span)?,
        SemanticType::Tuple(elems) => {
            let mangled_elems =
                elems.iter().map(|e| mangle_type(e, span)).collect::<Result<Vec<_>, _>>()?;
            format!("T_{}_{}", elems.len(), mangled_elems.join("_"))
        }
        SemanticType::Poll(inner) => format!("Poll__{}", mangle_type(inner, span)?),
        SemanticType::Generic(name) => {
            return Err(CodegenError::internal(
                format!("unsubstituted generic parameter '{name}' reached the name mangler"),
                span,
            ));
        }
    })
}

/// Mangles a base name with an ordered list of type arguments:
/// `base "__" t1 "__" t2 ...`.
pub fn mangle_name(base: &str, type_args: &[SemanticType], span: Span) -> Result<String, CodegenError> {
    let mut out = base.to_string();
    for ty in type_args {
        out.push_str("__");
        out.push_str(&mangle_type(ty, span)?);
    }
    Ok(out)
}

/// Mangles a derived-method symbol: `@tml_[suite_prefix_]<TypeName>_<method>` (§4.7).
pub fn mangle_derived_method(owner_mangled: &str, method: &str, suite_prefix: Option<&str>) -> String {
    match suite_prefix {
        Some(prefix) => format!("@tml_{prefix}{owner_mangled}_{method}"),
        None => format!("@tml_{owner_mangled}_{method}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::synthetic()
    }

    #[test]
    fn test_mangle_primitive() {
        assert_eq!(mangle_type(&SemanticType::I32, span()).unwrap(), "I32");
    }

    #[test]
    fn test_mangle_pointer_and_reference() {
        assert_eq!(mangle_type(&SemanticType::Pointer(Box::new(SemanticType::I32)), span()).unwrap(), "P_I32");
        assert_eq!(
            mangle_type(&SemanticType::Reference { inner: Box::new(SemanticType::Str), mutable: false }, span())
                .unwrap(),
            "R_Str"
        );
        assert_eq!(
            mangle_type(&SemanticType::Reference { inner: Box::new(SemanticType::Str), mutable: true }, span())
                .unwrap(),
            "MR_Str"
        );
    }

    #[test]
    fn test_mangle_tuple() {
        let ty = SemanticType::Tuple(vec![SemanticType::I32, SemanticType::Bool]);
        assert_eq!(mangle_type(&ty, span()).unwrap(), "T_2_I32_Bool");
    }

    #[test]
    fn test_mangle_name_generic_function() {
        let mangled = mangle_name("id", &[SemanticType::I32], span()).unwrap();
        assert_eq!(mangled, "id__I32");
    }

    #[test]
    fn test_mangle_name_is_deterministic() {
        let a = mangle_name("Maybe", &[SemanticType::Bool], span()).unwrap();
        let b = mangle_name("Maybe", &[SemanticType::Bool], span()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mangle_nested_generic() {
        let inner = SemanticType::Named { name: "Maybe".to_string(), type_args: vec![SemanticType::I32] };
        let mangled = mangle_name("Box", &[inner], span()).unwrap();
        assert_eq!(mangled, "Box__Maybe__I32");
    }

    #[test]
    fn test_mangle_unsubstituted_generic_is_internal_error() {
        let err = mangle_type(&SemanticType::Generic("T".to_string()), span()).unwrap_err();
        assert_eq!(err.kind, crate::codegen::error::CodegenErrorKind::Internal);
    }

    #[test]
    fn test_mangle_derived_method_with_and_without_suite_prefix() {
        assert_eq!(mangle_derived_method("P", "eq", None), "@tml_P_eq");
        assert_eq!(mangle_derived_method("P", "eq", Some("s3_")), "@tml_s3_P_eq");
    }
}
