//! Top-level declaration nodes: struct, enum, function, impl, behavior.

use crate::semantic_types::SemanticType;
use crate::token::Span;

use super::attributes::{Attribute, Visibility};
use super::stmt::Stmt;

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: SemanticType,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: SemanticType,
    pub span: Span,
}

/// An enum variant. `payload` lists the types of a tuple-like payload in
/// declaration order; an empty list means a unit (data-less) variant.
#[derive(Debug, Clone)]
pub struct Variant {
    pub name: String,
    pub payload: Vec<SemanticType>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: String,
    pub visibility: Visibility,
    pub generic_params: Vec<String>,
    pub fields: Vec<Field>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

impl StructDecl {
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub visibility: Visibility,
    pub generic_params: Vec<String>,
    pub variants: Vec<Variant>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

impl EnumDecl {
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// "Simple" enums (§4.8) have no variant carrying a payload and lower
    /// to `{ i32 }`; otherwise the enum is "data" and carries a padded
    /// payload array alongside the tag.
    pub fn is_simple(&self) -> bool {
        self.variants.iter().all(|v| v.payload.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub visibility: Visibility,
    pub is_async: bool,
    pub generic_params: Vec<String>,
    pub params: Vec<Param>,
    pub return_type: SemanticType,
    pub return_type_span: Span,
    pub body: Vec<Stmt>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

impl FunctionDecl {
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    pub fn is_main(&self) -> bool {
        self.name == "main"
    }

    pub fn for_testing(name: &str, params: Vec<Param>, return_type: SemanticType, body: Vec<Stmt>) -> Self {
        FunctionDecl {
            name: name.to_string(),
            visibility: Visibility::Private,
            is_async: false,
            generic_params: Vec::new(),
            params,
            return_type,
            return_type_span: Span::synthetic(),
            body,
            attributes: Vec::new(),
            span: Span::synthetic(),
        }
    }
}

/// An instance method takes `ptr %this` as an implicit first parameter
/// (§4.8); a static method does not. Distinguished by whether `self_name`
/// is present among `function.params` by convention of the upstream
/// checker — the declaration emitter treats the first parameter named
/// `this` as the receiver.
#[derive(Debug, Clone)]
pub struct ImplDecl {
    pub type_name: String,
    pub type_generic_params: Vec<String>,
    pub methods: Vec<FunctionDecl>,
    pub span: Span,
}

/// A behavior (trait-like) declaration. Method bodies, if present, are
/// default implementations; the declaration emitter never emits a
/// behavior's own methods directly; it only consults `method_signatures`
/// when resolving a call through a generic bound. Full behavior-object
/// dispatch is outside the engine's scope (§1 non-goals: general compiler
/// framework) — this node exists so the tree shape matches the checker's
/// output even though the engine does little with it besides registering
/// names.
#[derive(Debug, Clone)]
pub struct BehaviorDecl {
    pub name: String,
    pub method_signatures: Vec<FunctionDecl>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Struct(StructDecl),
    Enum(EnumDecl),
    Function(FunctionDecl),
    Impl(ImplDecl),
    Behavior(BehaviorDecl),
}
