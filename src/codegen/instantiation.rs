//! The instantiation registry (§4.4): on-demand, cycle-safe monomorphization
//! of generic structs, enums, and functions.
//!
//! `require_struct_instantiation`/`require_enum_instantiation` resolve and
//! emit immediately (the struct/enum's own field types never need anything
//! beyond the declaration index and the symbol tables). Function bodies
//! need the expression/statement emitters, which live above this module in
//! the dependency order (§2), so `require_func_instantiation` only
//! registers the signature and queues the body for
//! [`crate::codegen::CodegenContext`] to drain.

use std::collections::{HashMap, HashSet};

use crate::ast::{Decl, EnumDecl, FunctionDecl, Module, StructDecl};
use crate::codegen::buffers::OutputBuffers;
use crate::codegen::error::CodegenError;
use crate::codegen::mangle::{mangle_name, mangle_type};
use crate::codegen::symbols::{FunctionSignature, SymbolTables};
use crate::codegen::types::{self, TypePosition};
use crate::semantic_types::{SemanticType, TypeEnv};
use crate::token::Span;

/// A flat index of every struct/enum/function declaration in the module,
/// built once so instantiation requests can look declarations up by base
/// name without re-walking the tree.
#[derive(Debug, Default)]
pub struct DeclIndex {
    structs: HashMap<String, StructDecl>,
    enums: HashMap<String, EnumDecl>,
    functions: HashMap<String, FunctionDecl>,
}

impl DeclIndex {
    pub fn from_module(module: &Module) -> Self {
        let mut index = DeclIndex::default();
        for decl in &module.decls {
            match decl {
                Decl::Struct(s) => {
                    index.structs.insert(s.name.clone(), s.clone());
                }
                Decl::Enum(e) => {
                    index.enums.insert(e.name.clone(), e.clone());
                }
                Decl::Function(f) => {
                    index.functions.insert(f.name.clone(), f.clone());
                }
                Decl::Impl(_) | Decl::Behavior(_) => {}
            }
        }
        index
    }

    pub fn struct_decl(&self, name: &str) -> Option<&StructDecl> {
        self.structs.get(name)
    }

    pub fn enum_decl(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.get(name)
    }

    pub fn function_decl(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.get(name)
    }
}

/// A function instantiation whose signature is registered but whose body
/// has not yet been emitted.
#[derive(Debug, Clone)]
pub struct PendingFunction {
    pub mangled_name: String,
    pub decl: FunctionDecl,
    pub type_env: TypeEnv,
}

/// Per-module instantiation state: which mangled names have already been
/// emitted, and which function bodies are still queued.
#[derive(Debug, Default)]
pub struct InstantiationRegistry {
    instantiated_structs: HashSet<String>,
    instantiated_enums: HashSet<String>,
    instantiated_funcs: HashSet<String>,
    pending_functions: Vec<PendingFunction>,
}

impl InstantiationRegistry {
    pub fn new() -> Self {
        InstantiationRegistry::default()
    }

    /// Drains the worklist of function bodies still awaiting emission.
    pub fn take_pending_functions(&mut self) -> Vec<PendingFunction> {
        std::mem::take(&mut self.pending_functions)
    }

    pub fn has_pending_functions(&self) -> bool {
        !self.pending_functions.is_empty()
    }

    /// Resolves any [`SemanticType`] to its LLVM type string, triggering
    /// struct/enum instantiation on first reference (§4.2's "if not yet
    /// instantiated, trigger instantiation first").
    pub fn lower_concrete(
        &mut self,
        ty: &SemanticType,
        symbols: &mut SymbolTables,
        decls: &DeclIndex,
        buffers: &mut OutputBuffers,
        span: Span,
    ) -> Result<String, CodegenError> {
        if let Some(llvm) = types::lower_primitive(ty, TypePosition::Data) {
            return Ok(llvm);
        }
        match ty {
            SemanticType::Named { name, type_args } => {
                if decls.struct_decl(name).is_some() {
                    let mangled = self.require_struct_instantiation(name, type_args, symbols, decls, buffers, span)?;
                    Ok(types::struct_llvm_name(&mangled))
                } else if decls.enum_decl(name).is_some() {
                    let mangled = self.require_enum_instantiation(name, type_args, symbols, decls, buffers, span)?;
                    Ok(types::struct_llvm_name(&mangled))
                } else {
                    // A runtime-provided opaque type (File, Path, Ordering, ...): §4.8.
                    Ok("ptr".to_string())
                }
            }
            SemanticType::Poll(inner) => {
                let mangled = self.require_poll_instantiation(inner, symbols, decls, buffers, span)?;
                Ok(types::struct_llvm_name(&mangled))
            }
            SemanticType::Generic(name) => {
                Err(CodegenError::internal(format!("unsubstituted generic parameter '{name}' reached type lowering"), span))
            }
            _ => unreachable!("lower_primitive handles every remaining SemanticType variant"),
        }
    }

    /// §4.4 steps 1-7 for a struct base name and concrete type arguments.
    pub fn require_struct_instantiation(
        &mut self,
        base: &str,
        type_args: &[SemanticType],
        symbols: &mut SymbolTables,
        decls: &DeclIndex,
        buffers: &mut OutputBuffers,
        span: Span,
    ) -> Result<String, CodegenError> {
        let mangled = mangle_name(base, type_args, span)?;
        if self.instantiated_structs.contains(&mangled) {
            return Ok(mangled);
        }
        // Install the cache entry before recursing so a cycle through
        // indirection resolves to the name without re-entering this branch.
        self.instantiated_structs.insert(mangled.clone());

        let decl = decls
            .struct_decl(base)
            .ok_or_else(|| CodegenError::internal(format!("unknown struct base name '{base}' requested for instantiation"), span))?;
        let env = TypeEnv::new(&decl.generic_params, type_args);

        let llvm_name = types::struct_llvm_name(&mangled);
        let mut fields = Vec::with_capacity(decl.fields.len());
        for (index, field) in decl.fields.iter().enumerate() {
            let concrete = env.substitute(&field.ty);
            let llvm_ty = self.lower_concrete(&concrete, symbols, decls, buffers, span)?;
            fields.push((field.name.clone(), index, llvm_ty));
        }

        symbols.register_struct(&mangled, llvm_name.clone(), fields.clone());

        let field_types = fields.iter().map(|(_, _, t)| t.as_str()).collect::<Vec<_>>().join(", ");
        buffers.prelude.line(format!("{llvm_name} = type {{ {field_types} }}"));

        Ok(mangled)
    }

    /// §4.4 steps 1-7 for an enum base name and concrete type arguments,
    /// plus §4.8's simple-vs-data representation rule.
    pub fn require_enum_instantiation(
        &mut self,
        base: &str,
        type_args: &[SemanticType],
        symbols: &mut SymbolTables,
        decls: &DeclIndex,
        buffers: &mut OutputBuffers,
        span: Span,
    ) -> Result<String, CodegenError> {
        let mangled = mangle_name(base, type_args, span)?;
        if self.instantiated_enums.contains(&mangled) {
            return Ok(mangled);
        }
        self.instantiated_enums.insert(mangled.clone());

        let decl = decls
            .enum_decl(base)
            .ok_or_else(|| CodegenError::internal(format!("unknown enum base name '{base}' requested for instantiation"), span))?;
        let env = TypeEnv::new(&decl.generic_params, type_args);
        let is_simple = decl.is_simple();
        let llvm_name = types::struct_llvm_name(&mangled);

        let mut max_variant_bytes = 0u64;
        for variant in &decl.variants {
            let mut variant_bytes = 0u64;
            for payload_ty in &variant.payload {
                let concrete = env.substitute(payload_ty);
                let llvm_ty = self.lower_concrete(&concrete, symbols, decls, buffers, span)?;
                variant_bytes += types::size_of_llvm_type(&llvm_ty, symbols);
            }
            max_variant_bytes = max_variant_bytes.max(variant_bytes);
        }

        for (tag, variant) in decl.variants.iter().enumerate() {
            symbols.register_enum_variant(&mangled, &variant.name, tag as i64);
        }
        symbols.register_enum(&mangled, llvm_name.clone(), is_simple);

        if is_simple {
            buffers.prelude.line(format!("{llvm_name} = type {{ i32 }}"));
        } else {
            let words = types::enum_payload_words(max_variant_bytes);
            buffers.prelude.line(format!("{llvm_name} = type {{ i32, [{words} x i64] }}"));
        }

        Ok(mangled)
    }

    /// The `Poll[T]` tagged union an `async` function's return type wraps
    /// into (§4.8): `Ready` carries the payload (tag 0), `Pending` carries
    /// none (tag 1). There is no user-written declaration for it, so it is
    /// synthesized here rather than looked up in [`DeclIndex`].
    pub fn require_poll_instantiation(
        &mut self,
        inner: &SemanticType,
        symbols: &mut SymbolTables,
        decls: &DeclIndex,
        buffers: &mut OutputBuffers,
        span: Span,
    ) -> Result<String, CodegenError> {
        let mangled = mangle_type(&SemanticType::Poll(Box::new(inner.clone())), span)?;
        if self.instantiated_enums.contains(&mangled) {
            return Ok(mangled);
        }
        self.instantiated_enums.insert(mangled.clone());

        let inner_llvm = self.lower_concrete(inner, symbols, decls, buffers, span)?;
        let ready_bytes = types::size_of_llvm_type(&inner_llvm, symbols);

        symbols.register_enum_variant(&mangled, "Ready", 0);
        symbols.register_enum_variant(&mangled, "Pending", 1);
        let llvm_name = types::struct_llvm_name(&mangled);
        symbols.register_enum(&mangled, llvm_name.clone(), false);

        let words = types::enum_payload_words(ready_bytes);
        buffers.prelude.line(format!("{llvm_name} = type {{ i32, [{words} x i64] }}"));

        Ok(mangled)
    }

    /// §4.4 for a function base name: registers the signature immediately
    /// (so forward references within the module resolve) and queues the
    /// body for later emission by the declaration emitter.
    pub fn require_func_instantiation(
        &mut self,
        base: &str,
        type_args: &[SemanticType],
        symbols: &mut SymbolTables,
        decls: &DeclIndex,
        buffers: &mut OutputBuffers,
        span: Span,
    ) -> Result<String, CodegenError> {
        let mangled = mangle_name(base, type_args, span)?;
        let llvm_symbol = format!("@tml_{mangled}");
        if self.instantiated_funcs.contains(&mangled) {
            return Ok(llvm_symbol);
        }
        self.instantiated_funcs.insert(mangled.clone());

        let decl = decls
            .function_decl(base)
            .ok_or_else(|| CodegenError::internal(format!("unknown function base name '{base}' requested for instantiation"), span))?;
        let env = TypeEnv::new(&decl.generic_params, type_args);

        let mut param_llvm = Vec::with_capacity(decl.params.len());
        let mut param_types = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            let concrete = env.substitute(&param.ty);
            let llvm_ty = self.lower_concrete(&concrete, symbols, decls, buffers, span)?;
            param_llvm.push(llvm_ty);
            param_types.push(concrete);
        }
        let return_concrete = env.substitute(&decl.return_type);
        let return_llvm = if decl.is_async {
            self.lower_concrete(&SemanticType::Poll(Box::new(return_concrete.clone())), symbols, decls, buffers, span)?
        } else {
            types::lower_primitive(&return_concrete, TypePosition::Return)
                .ok_or(())
                .or_else(|_| self.lower_concrete(&return_concrete, symbols, decls, buffers, span))?
        };

        let llvm_fn_type = format!("{return_llvm} ({})", param_llvm.join(", "));
        symbols.register_function(
            &[mangled.clone()],
            FunctionSignature {
                llvm_symbol: llvm_symbol.clone(),
                llvm_fn_type,
                return_type: return_concrete,
                param_types,
                is_generic: false,
            },
        );

        self.pending_functions.push(PendingFunction { mangled_name: mangled, decl: decl.clone(), type_env: env });

        Ok(llvm_symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Field, Param, Variant, Visibility};

    fn span() -> Span {
        Span::synthetic()
    }

    fn pair_struct() -> StructDecl {
        StructDecl {
            name: "Pair".to_string(),
            visibility: Visibility::Public,
            generic_params: vec!["T".to_string()],
            fields: vec![
                Field { name: "a".to_string(), ty: SemanticType::Generic("T".to_string()), span: span() },
                Field { name: "b".to_string(), ty: SemanticType::Generic("T".to_string()), span: span() },
            ],
            attributes: Vec::new(),
            span: span(),
        }
    }

    #[test]
    fn test_require_struct_instantiation_emits_once_and_is_idempotent() {
        let decls = DeclIndex { structs: HashMap::from([("Pair".to_string(), pair_struct())]), ..DeclIndex::default() };
        let mut symbols = SymbolTables::new();
        let mut buffers = OutputBuffers::new();
        let mut registry = InstantiationRegistry::new();

        let first = registry
            .require_struct_instantiation("Pair", &[SemanticType::I32], &mut symbols, &decls, &mut buffers, span())
            .unwrap();
        let second = registry
            .require_struct_instantiation("Pair", &[SemanticType::I32], &mut symbols, &decls, &mut buffers, span())
            .unwrap();

        assert_eq!(first, "Pair__I32");
        assert_eq!(second, "Pair__I32");
        assert_eq!(buffers.prelude.as_str().matches("%struct.Pair__I32").count(), 1);
        assert!(symbols.is_struct_defined("Pair__I32"));
        assert_eq!(symbols.struct_field("Pair__I32", "a").unwrap().2, "i32");
    }

    #[test]
    fn test_require_enum_instantiation_simple_vs_data() {
        let simple = EnumDecl {
            name: "Dir".to_string(),
            visibility: Visibility::Public,
            generic_params: Vec::new(),
            variants: vec![
                Variant { name: "North".to_string(), payload: Vec::new(), span: span() },
                Variant { name: "South".to_string(), payload: Vec::new(), span: span() },
            ],
            attributes: Vec::new(),
            span: span(),
        };
        let data = EnumDecl {
            name: "Maybe".to_string(),
            visibility: Visibility::Public,
            generic_params: vec!["T".to_string()],
            variants: vec![
                Variant { name: "Just".to_string(), payload: vec![SemanticType::Generic("T".to_string())], span: span() },
                Variant { name: "Nothing".to_string(), payload: Vec::new(), span: span() },
            ],
            attributes: Vec::new(),
            span: span(),
        };
        let decls = DeclIndex {
            enums: HashMap::from([("Dir".to_string(), simple), ("Maybe".to_string(), data)]),
            ..DeclIndex::default()
        };
        let mut symbols = SymbolTables::new();
        let mut buffers = OutputBuffers::new();
        let mut registry = InstantiationRegistry::new();

        let dir = registry.require_enum_instantiation("Dir", &[], &mut symbols, &decls, &mut buffers, span()).unwrap();
        assert!(symbols.enum_info(&dir).unwrap().is_simple);
        assert_eq!(symbols.enum_variant_tag(&dir, "South"), Some(1));

        let maybe = registry
            .require_enum_instantiation("Maybe", &[SemanticType::I64], &mut symbols, &decls, &mut buffers, span())
            .unwrap();
        assert!(!symbols.enum_info(&maybe).unwrap().is_simple);
        assert!(buffers.prelude.as_str().contains("%struct.Maybe__I64 = type { i32, [1 x i64] }"));
    }

    #[test]
    fn test_require_func_instantiation_registers_signature_and_queues_body() {
        let decl = FunctionDecl {
            name: "id".to_string(),
            visibility: Visibility::Public,
            is_async: false,
            generic_params: vec!["T".to_string()],
            params: vec![Param { name: "x".to_string(), ty: SemanticType::Generic("T".to_string()), span: span() }],
            return_type: SemanticType::Generic("T".to_string()),
            return_type_span: span(),
            body: Vec::new(),
            attributes: Vec::new(),
            span: span(),
        };
        let decls = DeclIndex { functions: HashMap::from([("id".to_string(), decl)]), ..DeclIndex::default() };
        let mut symbols = SymbolTables::new();
        let mut buffers = OutputBuffers::new();
        let mut registry = InstantiationRegistry::new();

        let symbol = registry
            .require_func_instantiation("id", &[SemanticType::I32], &mut symbols, &decls, &mut buffers, span())
            .unwrap();
        assert_eq!(symbol, "@tml_id__I32");
        assert_eq!(symbols.function("id__I32").unwrap().llvm_fn_type, "i32 (i32)");
        assert_eq!(registry.take_pending_functions().len(), 1);

        // Re-request: idempotent, no new pending body.
        registry.instantiated_funcs.insert("id__I32".to_string());
        let again = registry
            .require_func_instantiation("id", &[SemanticType::I32], &mut symbols, &decls, &mut buffers, span())
            .unwrap();
        assert_eq!(again, "@tml_id__I32");
        assert!(registry.take_pending_functions().is_empty());
    }

    #[test]
    fn test_nested_struct_instantiation_is_triggered_during_field_resolution() {
        let inner = StructDecl {
            name: "Inner".to_string(),
            visibility: Visibility::Public,
            generic_params: vec!["T".to_string()],
            fields: vec![Field { name: "v".to_string(), ty: SemanticType::Generic("T".to_string()), span: span() }],
            attributes: Vec::new(),
            span: span(),
        };
        let outer = StructDecl {
            name: "Outer".to_string(),
            visibility: Visibility::Public,
            generic_params: Vec::new(),
            fields: vec![Field {
                name: "inner".to_string(),
                ty: SemanticType::Named { name: "Inner".to_string(), type_args: vec![SemanticType::Bool] },
                span: span(),
            }],
            attributes: Vec::new(),
            span: span(),
        };
        let decls = DeclIndex {
            structs: HashMap::from([("Inner".to_string(), inner), ("Outer".to_string(), outer)]),
            ..DeclIndex::default()
        };
        let mut symbols = SymbolTables::new();
        let mut buffers = OutputBuffers::new();
        let mut registry = InstantiationRegistry::new();

        registry.require_struct_instantiation("Outer", &[], &mut symbols, &decls, &mut buffers, span()).unwrap();
        assert!(symbols.is_struct_defined("Inner__Bool"));
        assert!(buffers.prelude.as_str().contains("%struct.Inner__Bool = type { i1 }"));
    }
}
