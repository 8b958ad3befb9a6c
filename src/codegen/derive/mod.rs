//! The derive-macro engine (§4.7): scans `@derive(...)` decorators on
//! struct/enum declarations and emits the named methods to the prelude
//! stream, each under the symbol `@tml_[suite_prefix_]<TypeName>_<method>`
//! (§4.7's naming convention). Generic declarations are skipped here — a
//! generic type's derives are expanded once per concrete instantiation
//! instead (§4.7's closing rule), alongside its struct/enum body, in
//! [`crate::codegen::instantiation`].

mod default;
mod eq_hash;
mod reflect;
mod serde_like;
mod text;

use crate::ast::{DeriveKind, EnumDecl};
use crate::codegen::error::CodegenError;
use crate::codegen::symbols::StructField;
use crate::token::Span;

use super::CodegenContext;

impl CodegenContext {
    pub(super) fn expand_struct_derives(
        &mut self,
        owner: &str,
        llvm_name: &str,
        fields: &[StructField],
        derives: &[DeriveKind],
        span: Span,
    ) -> Result<(), CodegenError> {
        tracing::debug!(owner, derives = ?derives, "expanding struct derives");
        for derive in derives {
            match derive {
                DeriveKind::PartialEq | DeriveKind::Eq => eq_hash::derive_struct_eq(self, owner, llvm_name, fields)?,
                DeriveKind::Hash => eq_hash::derive_struct_hash(self, owner, llvm_name, fields)?,
                DeriveKind::Debug => text::derive_struct_text(self, owner, llvm_name, fields, "debug_string", true)?,
                DeriveKind::Display => text::derive_struct_text(self, owner, llvm_name, fields, "to_string", false)?,
                DeriveKind::Default => default::derive_struct_default(self, owner, llvm_name, fields)?,
                DeriveKind::FromStr | DeriveKind::Deserialize => serde_like::derive_struct_deserialize(self, owner, llvm_name, fields)?,
                DeriveKind::Serialize => serde_like::derive_struct_serialize(self, owner, llvm_name, fields)?,
                DeriveKind::Reflect => reflect::derive_struct_reflect(self, owner, fields)?,
            }
        }
        Ok(())
    }

    pub(super) fn expand_enum_derives(
        &mut self,
        owner: &str,
        llvm_name: &str,
        decl: &EnumDecl,
        derives: &[DeriveKind],
        span: Span,
    ) -> Result<(), CodegenError> {
        let _ = span;
        tracing::debug!(owner, derives = ?derives, "expanding enum derives");
        for derive in derives {
            match derive {
                DeriveKind::PartialEq | DeriveKind::Eq => eq_hash::derive_enum_eq(self, owner, llvm_name, decl)?,
                DeriveKind::Hash => eq_hash::derive_enum_hash(self, owner, llvm_name, decl)?,
                DeriveKind::Debug => text::derive_enum_text(self, owner, decl, "debug_string", true)?,
                DeriveKind::Display => text::derive_enum_text(self, owner, decl, "to_string", false)?,
                DeriveKind::Default => default::derive_enum_default(self, owner, llvm_name, decl)?,
                DeriveKind::FromStr | DeriveKind::Deserialize => serde_like::derive_enum_deserialize(self, owner, llvm_name, decl)?,
                DeriveKind::Serialize => serde_like::derive_enum_serialize(self, owner, decl)?,
                DeriveKind::Reflect => reflect::derive_enum_reflect(self, owner, decl)?,
            }
        }
        Ok(())
    }

    /// Registers a derived method's signature under `Owner::method` so
    /// `MethodCall` lowering finds it the same way it finds an ordinary
    /// `impl` method, and emits the `define` line's opening (caller fills
    /// in the body and the closing brace).
    pub(crate) fn begin_derived_method(
        &mut self,
        owner: &str,
        method: &str,
        params: &[(&str, &str)],
        return_llvm: &str,
        return_type: crate::semantic_types::SemanticType,
    ) -> String {
        let suite_prefix = self.options.suite_prefix();
        let symbol = crate::codegen::mangle::mangle_derived_method(owner, method, suite_prefix.as_deref());
        self.fresh.reset_for_function();

        let param_types = params.iter().map(|_| crate::semantic_types::SemanticType::Unit).collect();
        self.symbols.register_function(
            &[format!("{owner}::{method}")],
            crate::codegen::symbols::FunctionSignature {
                llvm_symbol: symbol.clone(),
                llvm_fn_type: format!("{return_llvm} ({})", params.iter().map(|(t, _)| *t).collect::<Vec<_>>().join(", ")),
                return_type,
                param_types,
                is_generic: false,
            },
        );

        let linkage = if self.options.force_internal_linkage { "internal " } else { "" };
        let param_list = params.iter().map(|(ty, name)| format!("{ty} %{name}")).collect::<Vec<_>>().join(", ");
        self.buffers.prelude.line(format!("define {linkage}{return_llvm} {symbol}({param_list}) #0 {{"));
        self.buffers.prelude.line("entry:");
        symbol
    }

    pub(crate) fn end_derived_method(&mut self) {
        self.buffers.prelude.line("}");
        self.buffers.prelude.blank();
    }

    /// Derived method bodies write straight to the prelude stream, so they
    /// share `buffers.body`'s instruction helper via a tiny indirection:
    /// push through `buffers.prelude` under the same `instr`/`line` API.
    pub(crate) fn derived_instr(&mut self, s: impl AsRef<str>) {
        self.buffers.prelude.instr(s);
    }

    pub(crate) fn derived_fresh_reg(&mut self) -> String {
        self.fresh.fresh_reg()
    }

    pub(crate) fn derived_fresh_label(&mut self, prefix: &str) -> String {
        self.fresh.fresh_label(prefix)
    }
}
