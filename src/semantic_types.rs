//! Semantic types handed down by the type checker.
//!
//! The checker is an external collaborator (see crate docs); this module
//! only defines the shape of its output as consumed by the codegen core —
//! the type lowerer ([`crate::codegen::types`]), the name mangler
//! ([`crate::codegen::mangle`]), and every component that needs to ask "what
//! LLVM type does this value have".

use std::collections::HashMap;
use std::fmt;

/// A fully resolved type, as produced by the type checker.
///
/// Unlike the surface-syntax type references in [`crate::ast::types`],
/// every [`SemanticType`] is concrete with respect to its own generic
/// parameters: `Generic` only appears inside an unsubstituted generic
/// declaration body, never in a value actually flowing through codegen
/// after [`TypeEnv::substitute`] has run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Unit,
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    F32,
    F64,
    Str,
    /// A raw pointer to `inner`.
    Pointer(Box<SemanticType>),
    /// A borrowed reference to `inner`; `mutable` distinguishes `&T`/`&mut T`
    /// for mangling (`R_`/`MR_`) even though both lower to `ptr`.
    Reference { inner: Box<SemanticType>, mutable: bool },
    /// A named struct or enum, with any generic arguments already resolved
    /// to concrete types. `type_args` is empty for non-generic declarations.
    Named { name: String, type_args: Vec<SemanticType> },
    /// An anonymous tuple or struct-literal-without-a-name type.
    Tuple(Vec<SemanticType>),
    /// An unsubstituted generic parameter, identified by name. Only valid
    /// inside a pending generic declaration; [`TypeEnv::substitute`] removes
    /// every occurrence before codegen touches the body.
    Generic(String),
    /// The `Poll[T]` wrapper an async function's declared return type is
    /// rewritten into (§4.8). Not a surface-syntax type; constructed by the
    /// declaration emitter, never by the checker.
    Poll(Box<SemanticType>),
}

impl SemanticType {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            SemanticType::I8
                | SemanticType::I16
                | SemanticType::I32
                | SemanticType::I64
                | SemanticType::I128
                | SemanticType::U8
                | SemanticType::U16
                | SemanticType::U32
                | SemanticType::U64
                | SemanticType::U128
        )
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            SemanticType::I8 | SemanticType::I16 | SemanticType::I32 | SemanticType::I64 | SemanticType::I128
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, SemanticType::F32 | SemanticType::F64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// True for any type whose LLVM lowering is `ptr` (§4.2): strings,
    /// pointers, references, and struct/enum instances.
    pub fn is_ptr_like(&self) -> bool {
        matches!(
            self,
            SemanticType::Str
                | SemanticType::Pointer(_)
                | SemanticType::Reference { .. }
                | SemanticType::Named { .. }
        )
    }

    pub fn poll(inner: SemanticType) -> SemanticType {
        SemanticType::Poll(Box::new(inner))
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Unit => write!(f, "Unit"),
            SemanticType::Bool => write!(f, "Bool"),
            SemanticType::I8 => write!(f, "I8"),
            SemanticType::I16 => write!(f, "I16"),
            SemanticType::I32 => write!(f, "I32"),
            SemanticType::I64 => write!(f, "I64"),
            SemanticType::I128 => write!(f, "I128"),
            SemanticType::U8 => write!(f, "U8"),
            SemanticType::U16 => write!(f, "U16"),
            SemanticType::U32 => write!(f, "U32"),
            SemanticType::U64 => write!(f, "U64"),
            SemanticType::U128 => write!(f, "U128"),
            SemanticType::F32 => write!(f, "F32"),
            SemanticType::F64 => write!(f, "F64"),
            SemanticType::Str => write!(f, "Str"),
            SemanticType::Pointer(inner) => write!(f, "*{inner}"),
            SemanticType::Reference { inner, mutable: true } => write!(f, "&mut {inner}"),
            SemanticType::Reference { inner, mutable: false } => write!(f, "&{inner}"),
            SemanticType::Named { name, type_args } if type_args.is_empty() => write!(f, "{name}"),
            SemanticType::Named { name, type_args } => {
                write!(f, "{name}[")?;
                for (i, a) in type_args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, "]")
            }
            SemanticType::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            SemanticType::Generic(name) => write!(f, "{name}"),
            SemanticType::Poll(inner) => write!(f, "Poll[{inner}]"),
        }
    }
}

/// Resolves generic parameter references through a substitution map.
///
/// One `TypeEnv` is built per instantiation request (§4.4 step 4: "Build a
/// substitution map `param_name -> concrete_semantic_type`") and handed to
/// every resolver that walks the pending generic declaration's body.
#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    substitutions: HashMap<String, SemanticType>,
}

impl TypeEnv {
    pub fn new(params: &[String], args: &[SemanticType]) -> Self {
        let substitutions = params.iter().cloned().zip(args.iter().cloned()).collect();
        TypeEnv { substitutions }
    }

    pub fn empty() -> Self {
        TypeEnv::default()
    }

    /// Recursively replaces every `Generic(name)` occurrence in `ty` with
    /// its bound concrete type. A `Generic` with no binding is left as-is —
    /// that only happens for a declaration's own (still-unsubstituted)
    /// parameters while nested generics are being resolved one layer at a
    /// time during a pending instantiation.
    pub fn substitute(&self, ty: &SemanticType) -> SemanticType {
        match ty {
            SemanticType::Generic(name) => {
                self.substitutions.get(name).cloned().unwrap_or_else(|| ty.clone())
            }
            SemanticType::Pointer(inner) => SemanticType::Pointer(Box::new(self.substitute(inner))),
            SemanticType::Reference { inner, mutable } => {
                SemanticType::Reference { inner: Box::new(self.substitute(inner)), mutable: *mutable }
            }
            SemanticType::Named { name, type_args } => SemanticType::Named {
                name: name.clone(),
                type_args: type_args.iter().map(|t| self.substitute(t)).collect(),
            },
            SemanticType::Tuple(elems) => SemanticType::Tuple(elems.iter().map(|t| self.substitute(t)).collect()),
            SemanticType::Poll(inner) => SemanticType::Poll(Box::new(self.substitute(inner))),
            primitive => primitive.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_generic_leaf() {
        let env = TypeEnv::new(&["T".to_string()], &[SemanticType::I32]);
        assert_eq!(env.substitute(&SemanticType::Generic("T".to_string())), SemanticType::I32);
    }

    #[test]
    fn test_substitute_nested_named() {
        let env = TypeEnv::new(&["T".to_string()], &[SemanticType::Bool]);
        let ty = SemanticType::Named {
            name: "Maybe".to_string(),
            type_args: vec![SemanticType::Generic("T".to_string())],
        };
        let resolved = env.substitute(&ty);
        assert_eq!(
            resolved,
            SemanticType::Named { name: "Maybe".to_string(), type_args: vec![SemanticType::Bool] }
        );
    }

    #[test]
    fn test_unbound_generic_is_left_alone() {
        let env = TypeEnv::empty();
        let ty = SemanticType::Generic("U".to_string());
        assert_eq!(env.substitute(&ty), ty);
    }

    #[test]
    fn test_display_named_with_args() {
        let ty = SemanticType::Named { name: "Maybe".to_string(), type_args: vec![SemanticType::I32] };
        assert_eq!(ty.to_string(), "Maybe[I32]");
    }

    #[test]
    fn test_is_ptr_like() {
        assert!(SemanticType::Str.is_ptr_like());
        assert!(!SemanticType::I32.is_ptr_like());
    }
}
