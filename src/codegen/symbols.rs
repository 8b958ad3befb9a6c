//! The five symbol tables (§4.5): struct fields, enum variants, function
//! signatures, and local variable info, plus the struct/enum LLVM-name
//! table the type lowerer consults.

use std::collections::HashMap;

use crate::semantic_types::SemanticType;

/// One struct field: `(field_name, index, llvm_type)`.
pub type StructField = (String, usize, String);

#[derive(Debug, Clone)]
pub struct StructInfo {
    pub llvm_name: String,
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone)]
pub struct EnumInfo {
    pub llvm_name: String,
    pub is_simple: bool,
}

/// A function's signature record, registered under every lookup key the
/// declaration emitter and call-lowering path use (§4.5's "multi-key
/// registration").
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub llvm_symbol: String,
    pub llvm_fn_type: String,
    pub return_type: SemanticType,
    pub param_types: Vec<SemanticType>,
    pub is_generic: bool,
}

/// Optional string-temporary lifetime metadata attached to a local; see
/// [`crate::codegen::lifetime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifetimeInfo {
    pub owns_heap_string: bool,
}

#[derive(Debug, Clone)]
pub struct LocalInfo {
    pub llvm_register: String,
    pub llvm_type: String,
    pub semantic_type: SemanticType,
    pub lifetime: Option<LifetimeInfo>,
}

/// The engine's symbol tables. One `SymbolTables` value lives for the
/// lifetime of a [`crate::codegen::CodegenContext`]; `locals` is cleared
/// (and its scope stack reset) at every function boundary.
#[derive(Debug, Default)]
pub struct SymbolTables {
    struct_types: HashMap<String, StructInfo>,
    enum_types: HashMap<String, EnumInfo>,
    enum_variants: HashMap<String, i64>,
    functions: HashMap<String, FunctionSignature>,
    locals: Vec<HashMap<String, LocalInfo>>,
}

impl SymbolTables {
    pub fn new() -> Self {
        SymbolTables::default()
    }

    // -- struct_types / struct_fields --

    pub fn register_struct(&mut self, mangled_name: &str, llvm_name: String, fields: Vec<StructField>) {
        self.struct_types.insert(mangled_name.to_string(), StructInfo { llvm_name, fields });
    }

    pub fn struct_info(&self, mangled_name: &str) -> Option<&StructInfo> {
        self.struct_types.get(mangled_name)
    }

    pub fn is_struct_defined(&self, mangled_name: &str) -> bool {
        self.struct_types.contains_key(mangled_name)
    }

    pub fn struct_field(&self, mangled_name: &str, field_name: &str) -> Option<&StructField> {
        self.struct_types.get(mangled_name)?.fields.iter().find(|(name, ..)| name == field_name)
    }

    // -- enum_types / enum_variants --

    pub fn register_enum(&mut self, mangled_name: &str, llvm_name: String, is_simple: bool) {
        self.enum_types.insert(mangled_name.to_string(), EnumInfo { llvm_name, is_simple });
    }

    pub fn enum_info(&self, mangled_name: &str) -> Option<&EnumInfo> {
        self.enum_types.get(mangled_name)
    }

    pub fn is_enum_defined(&self, mangled_name: &str) -> bool {
        self.enum_types.contains_key(mangled_name)
    }

    pub fn register_enum_variant(&mut self, mangled_enum_name: &str, variant: &str, tag: i64) {
        self.enum_variants.insert(format!("{mangled_enum_name}::{variant}"), tag);
    }

    pub fn enum_variant_tag(&self, mangled_enum_name: &str, variant: &str) -> Option<i64> {
        self.enum_variants.get(&format!("{mangled_enum_name}::{variant}")).copied()
    }

    // -- functions (multi-key) --

    /// Registers `sig` under every key in `keys` — the short name,
    /// module-qualified name, submodule-qualified name, and fully
    /// qualified path all point at the same record (§4.5).
    pub fn register_function(&mut self, keys: &[String], sig: FunctionSignature) {
        for key in keys {
            self.functions.insert(key.clone(), sig.clone());
        }
    }

    pub fn function(&self, key: &str) -> Option<&FunctionSignature> {
        self.functions.get(key)
    }

    pub fn is_function_defined(&self, key: &str) -> bool {
        self.functions.contains_key(key)
    }

    // -- locals (current function only) --

    pub fn clear_locals(&mut self) {
        self.locals.clear();
        self.locals.push(HashMap::new());
    }

    pub fn enter_scope(&mut self) {
        self.locals.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) -> Option<HashMap<String, LocalInfo>> {
        self.locals.pop()
    }

    pub fn define_local(&mut self, name: &str, info: LocalInfo) {
        if let Some(scope) = self.locals.last_mut() {
            scope.insert(name.to_string(), info);
        }
    }

    pub fn lookup_local(&self, name: &str) -> Option<&LocalInfo> {
        self.locals.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn current_scope_locals(&self) -> impl Iterator<Item = (&String, &LocalInfo)> {
        self.locals.last().into_iter().flat_map(|scope| scope.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup_struct() {
        let mut tables = SymbolTables::new();
        tables.register_struct("P", "%struct.P".to_string(), vec![("x".to_string(), 0, "i32".to_string())]);
        assert!(tables.is_struct_defined("P"));
        assert_eq!(tables.struct_field("P", "x"), Some(&("x".to_string(), 0, "i32".to_string())));
        assert_eq!(tables.struct_field("P", "y"), None);
    }

    #[test]
    fn test_enum_variant_round_trip() {
        let mut tables = SymbolTables::new();
        tables.register_enum("Maybe__I32", "%struct.Maybe__I32".to_string(), false);
        tables.register_enum_variant("Maybe__I32", "Just", 0);
        tables.register_enum_variant("Maybe__I32", "Nothing", 1);
        assert_eq!(tables.enum_variant_tag("Maybe__I32", "Just"), Some(0));
        assert_eq!(tables.enum_variant_tag("Maybe__I32", "Missing"), None);
    }

    #[test]
    fn test_function_multi_key_registration() {
        let mut tables = SymbolTables::new();
        let sig = FunctionSignature {
            llvm_symbol: "@tml_entry_helper".to_string(),
            llvm_fn_type: "void ()".to_string(),
            return_type: SemanticType::Unit,
            param_types: Vec::new(),
            is_generic: false,
        };
        tables.register_function(&["helper".to_string(), "entry::helper".to_string()], sig);
        assert_eq!(tables.function("helper").unwrap().llvm_symbol, "@tml_entry_helper");
        assert_eq!(tables.function("entry::helper").unwrap().llvm_symbol, "@tml_entry_helper");
    }

    #[test]
    fn test_locals_scope_shadowing_and_exit() {
        let mut tables = SymbolTables::new();
        tables.clear_locals();
        tables.define_local(
            "x",
            LocalInfo { llvm_register: "%0".to_string(), llvm_type: "i32".to_string(), semantic_type: SemanticType::I32, lifetime: None },
        );
        tables.enter_scope();
        tables.define_local(
            "x",
            LocalInfo { llvm_register: "%1".to_string(), llvm_type: "i32".to_string(), semantic_type: SemanticType::I32, lifetime: None },
        );
        assert_eq!(tables.lookup_local("x").unwrap().llvm_register, "%1");
        tables.exit_scope();
        assert_eq!(tables.lookup_local("x").unwrap().llvm_register, "%0");
    }
}
