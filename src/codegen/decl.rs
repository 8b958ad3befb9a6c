//! Declaration emission (§4.8): struct/enum type definitions, function
//! signatures and bodies, and impl-method emission. Contributes `impl
//! CodegenContext` blocks, mirroring how the teacher splits one type's
//! methods across `builtins.rs`/`stmt.rs`/`expr.rs` rather than giving each
//! concern its own struct.

use crate::ast::{FunctionDecl, ImplDecl, Param, StructDecl, Visibility};
use crate::codegen::error::CodegenError;
use crate::codegen::instantiation::PendingFunction;
use crate::codegen::types::TypePosition;
use crate::semantic_types::SemanticType;
use crate::token::Span;

use super::CodegenContext;

/// Struct/enum names the runtime already declares the layout of; the
/// engine registers their field metadata (for GEP indexing) but must not
/// emit a competing `%struct.Name = type {...}` definition (§4.8).
const RUNTIME_PROVIDED_TYPES: &[&str] = &["File", "Path", "Ordering"];

impl CodegenContext {
    fn function_keys(&self, name: &str) -> Vec<String> {
        let mut keys = vec![name.to_string()];
        if !self.module_path.is_empty() {
            keys.push(format!("{}::{name}", self.module_path.join("::")));
            if let Some(last) = self.module_path.last() {
                keys.push(format!("{last}::{name}"));
            }
        }
        keys
    }

    // -- struct / enum declarations --

    pub(super) fn emit_struct_decl(&mut self, decl: &StructDecl) -> Result<(), CodegenError> {
        let mut fields = Vec::with_capacity(decl.fields.len());
        for (index, field) in decl.fields.iter().enumerate() {
            let llvm_ty = self.lower_type(&field.ty, field.span)?;
            fields.push((field.name.clone(), index, llvm_ty));
        }

        let llvm_name = format!("%struct.{}", decl.name);
        self.symbols.register_struct(&decl.name, llvm_name.clone(), fields.clone());

        if !RUNTIME_PROVIDED_TYPES.contains(&decl.name.as_str()) {
            let field_types = fields.iter().map(|(_, _, t)| t.as_str()).collect::<Vec<_>>().join(", ");
            self.buffers.prelude.line(format!("{llvm_name} = type {{ {field_types} }}"));
        }

        let derives = crate::ast::derives(&decl.attributes);
        if !derives.is_empty() {
            self.expand_struct_derives(&decl.name, &llvm_name, &fields, &derives, decl.span)?;
        }
        Ok(())
    }

    pub(super) fn emit_enum_decl(&mut self, decl: &crate::ast::EnumDecl) -> Result<(), CodegenError> {
        use crate::codegen::types;

        let is_simple = decl.is_simple();
        let llvm_name = format!("%struct.{}", decl.name);

        let mut max_variant_bytes = 0u64;
        let mut variant_payload_llvm = Vec::with_capacity(decl.variants.len());
        for variant in &decl.variants {
            let mut variant_bytes = 0u64;
            let mut payload_llvm = Vec::with_capacity(variant.payload.len());
            for ty in &variant.payload {
                let llvm_ty = self.lower_type(ty, variant.span)?;
                variant_bytes += types::size_of_llvm_type(&llvm_ty, &self.symbols);
                payload_llvm.push(llvm_ty);
            }
            max_variant_bytes = max_variant_bytes.max(variant_bytes);
            variant_payload_llvm.push(payload_llvm);
        }

        for (tag, variant) in decl.variants.iter().enumerate() {
            self.symbols.register_enum_variant(&decl.name, &variant.name, tag as i64);
        }
        self.symbols.register_enum(&decl.name, llvm_name.clone(), is_simple);

        if is_simple {
            self.buffers.prelude.line(format!("{llvm_name} = type {{ i32 }}"));
        } else {
            let words = types::enum_payload_words(max_variant_bytes);
            self.buffers.prelude.line(format!("{llvm_name} = type {{ i32, [{words} x i64] }}"));
        }

        let derives = crate::ast::derives(&decl.attributes);
        if !derives.is_empty() {
            self.expand_enum_derives(&decl.name, &llvm_name, decl, &derives, decl.span)?;
        }
        Ok(())
    }

    // -- function declarations --

    fn extern_calling_convention(abi: &str) -> &'static str {
        match abi {
            "stdcall" => "x86_stdcallcc ",
            "fastcall" => "x86_fastcallcc ",
            "thiscall" => "x86_thiscallcc ",
            _ => "",
        }
    }

    fn params_llvm_list(&mut self, params: &[Param]) -> Result<Vec<String>, CodegenError> {
        params.iter().map(|p| self.lower_type(&p.ty, p.span)).collect()
    }

    /// Pass-1 registration: extern declarations are emitted immediately
    /// (they have no body to defer); ordinary functions get their
    /// signature recorded so forward references resolve in pass 2.
    pub(super) fn register_function_signature(&mut self, decl: &FunctionDecl) -> Result<(), CodegenError> {
        if let Some(abi) = crate::ast::extern_abi(&decl.attributes) {
            let abi = abi.to_string();
            return self.emit_extern_declaration(decl, &abi);
        }

        let param_llvm = self.params_llvm_list(&decl.params)?;
        let param_types: Vec<SemanticType> = decl.params.iter().map(|p| p.ty.clone()).collect();
        let return_llvm = if decl.is_async {
            self.lower_type(&SemanticType::Poll(Box::new(decl.return_type.clone())), decl.return_type_span)?
        } else {
            self.return_type_llvm(decl)?
        };
        let llvm_symbol = format!("@tml_{}", decl.name);
        let llvm_fn_type = format!("{return_llvm} ({})", param_llvm.join(", "));

        let keys = self.function_keys(&decl.name);
        self.symbols.register_function(
            &keys,
            crate::codegen::symbols::FunctionSignature {
                llvm_symbol,
                llvm_fn_type,
                return_type: decl.return_type.clone(),
                param_types,
                is_generic: false,
            },
        );
        Ok(())
    }

    fn return_type_llvm(&mut self, decl: &FunctionDecl) -> Result<String, CodegenError> {
        match crate::codegen::types::lower_primitive(&decl.return_type, TypePosition::Return) {
            Some(llvm) => Ok(llvm),
            None => self.lower_type(&decl.return_type, decl.return_type_span),
        }
    }

    fn emit_extern_declaration(&mut self, decl: &FunctionDecl, abi: &str) -> Result<(), CodegenError> {
        let param_llvm = self.params_llvm_list(&decl.params)?;
        let return_llvm = self.return_type_llvm(decl)?;
        let cc = Self::extern_calling_convention(abi);
        let llvm_symbol = format!("@tml_{}", decl.name);

        self.buffers.prelude.line(format!("declare {cc}{return_llvm} {llvm_symbol}({})", param_llvm.join(", ")));

        let keys = self.function_keys(&decl.name);
        self.symbols.register_function(
            &keys,
            crate::codegen::symbols::FunctionSignature {
                llvm_symbol,
                llvm_fn_type: format!("{return_llvm} ({})", param_llvm.join(", ")),
                return_type: decl.return_type.clone(),
                param_types: decl.params.iter().map(|p| p.ty.clone()).collect(),
                is_generic: false,
            },
        );

        let link_libs = crate::ast::link_libs(&decl.attributes);
        if link_libs.is_empty() {
            self.unlinked_externs.push((decl.name.clone(), decl.span));
        } else {
            self.function.accumulated_link_libs.extend(link_libs.into_iter().map(String::from));
        }
        Ok(())
    }

    fn linkage_for(&self, decl: &FunctionDecl) -> &'static str {
        if decl.is_main() {
            return "";
        }
        if crate::ast::is_should_panic(&decl.attributes) {
            return "";
        }
        if self.options.force_internal_linkage {
            return "internal ";
        }
        match decl.visibility {
            Visibility::Public => "",
            Visibility::Private => "internal ",
        }
    }

    /// `dllexport` for public functions when the driver asked for it (§4.8:
    /// "pub gets external and on Windows dllexport, unless the driver
    /// forced internal for test-suite mode").
    fn dll_storage_for(&self, decl: &FunctionDecl) -> &'static str {
        if !self.options.dll_export || self.options.force_internal_linkage {
            return "";
        }
        if matches!(decl.visibility, Visibility::Public) {
            "dllexport "
        } else {
            ""
        }
    }

    /// Pass-2 emission for a non-generic function. Generic templates never
    /// reach this path directly — their instantiations do, through
    /// [`Self::emit_instantiated_function_body`].
    pub(super) fn emit_function_body(&mut self, decl: &FunctionDecl) -> Result<(), CodegenError> {
        if crate::ast::extern_abi(&decl.attributes).is_some() {
            return Ok(());
        }
        let llvm_symbol = format!("@tml_{}", decl.name);
        let linkage = self.linkage_for(decl);
        let dll_storage = self.dll_storage_for(decl);
        let param_llvm = self.params_llvm_list(&decl.params)?;
        let return_llvm = if decl.is_async {
            self.lower_type(&SemanticType::Poll(Box::new(decl.return_type.clone())), decl.return_type_span)?
        } else {
            self.return_type_llvm(decl)?
        };

        self.emit_function_common(&llvm_symbol, linkage, dll_storage, &decl.params, &param_llvm, &return_llvm, decl)
    }

    /// Emits the body of a monomorphized instantiation (§4.4 step 6, "emit
    /// the function body (main stream)"). `item.type_env` has already
    /// substituted every generic parameter in `item.decl`'s signature; the
    /// body is emitted against those concrete types.
    pub(super) fn emit_instantiated_function_body(&mut self, item: &PendingFunction) -> Result<(), CodegenError> {
        let llvm_symbol = format!("@tml_{}", item.mangled_name);
        let sig = self
            .symbols
            .function(&item.mangled_name)
            .cloned()
            .ok_or_else(|| CodegenError::internal_no_span(format!("instantiation '{}' has no registered signature", item.mangled_name)))?;

        let mut param_llvm = Vec::with_capacity(sig.param_types.len());
        for (ty, p) in sig.param_types.iter().zip(&item.decl.params) {
            param_llvm.push(self.lower_type(ty, p.span)?);
        }
        let return_llvm = if item.decl.is_async {
            self.lower_type(&SemanticType::Poll(Box::new(sig.return_type.clone())), item.decl.span)?
        } else {
            match crate::codegen::types::lower_primitive(&sig.return_type, TypePosition::Return) {
                Some(llvm) => llvm,
                None => self.lower_type(&sig.return_type, item.decl.span)?,
            }
        };
        let linkage = self.linkage_for(&item.decl);
        let dll_storage = self.dll_storage_for(&item.decl);

        let concrete_params: Vec<Param> = item
            .decl
            .params
            .iter()
            .map(|p| Param { name: p.name.clone(), ty: item.type_env.substitute(&p.ty), span: p.span })
            .collect();

        self.emit_function_common(&llvm_symbol, linkage, dll_storage, &concrete_params, &param_llvm, &return_llvm, &item.decl)
    }

    /// Shared prologue/body/epilogue emission used by both plain and
    /// monomorphized functions.
    fn emit_function_common(
        &mut self,
        llvm_symbol: &str,
        linkage: &str,
        dll_storage: &str,
        params: &[Param],
        param_llvm: &[String],
        return_llvm: &str,
        decl: &FunctionDecl,
    ) -> Result<(), CodegenError> {
        self.fresh.reset_for_function();
        self.symbols.clear_locals();
        self.function.pending_string_frees.clear();
        self.function.loop_controls.clear();
        self.function.block_terminated = false;
        self.function.poll_wrapper =
            if decl.is_async { Some(crate::codegen::mangle::mangle_type(&SemanticType::Poll(Box::new(decl.return_type.clone())), decl.span)?) } else { None };

        let param_list = params
            .iter()
            .zip(param_llvm)
            .map(|(p, ty)| format!("{ty} %{}", p.name))
            .collect::<Vec<_>>()
            .join(", ");

        let subprogram_id = self.emit_debug_subprogram(decl, llvm_symbol);
        let dbg_suffix = subprogram_id.map(|id| format!(" !dbg !{id}")).unwrap_or_default();
        self.buffers.body.line(format!("define {linkage}{dll_storage}{return_llvm} {llvm_symbol}({param_list}) #0{dbg_suffix} {{"));
        self.buffers.body.line("entry:");

        if self.options.coverage_enabled {
            self.buffers.body.instr(format!("call void @tml_cover_func(ptr {llvm_symbol})"));
        }

        for (index, (param, llvm_ty)) in params.iter().zip(param_llvm).enumerate() {
            let reg = self.fresh.fresh_reg();
            self.buffers.body.instr(format!("{reg} = alloca {llvm_ty}"));
            self.buffers.body.instr(format!("store {llvm_ty} %{}, ptr {reg}", param.name));
            self.symbols.define_local(
                &param.name,
                crate::codegen::symbols::LocalInfo { llvm_register: reg.clone(), llvm_type: llvm_ty.clone(), semantic_type: param.ty.clone(), lifetime: None },
            );
            if let Some(sp_id) = subprogram_id {
                if self.options.debug_level >= 2 {
                    self.emit_debug_param_declare(sp_id, param, &reg, index, decl.span);
                }
            }
        }

        self.gen_block(&decl.body)?;

        if !self.function.block_terminated {
            self.emit_implicit_return(return_llvm)?;
        }
        self.buffers.body.line("}");
        self.buffers.body.blank();
        Ok(())
    }

    /// Emits a `DISubprogram` metadata node for `decl` (§4.8: "the function
    /// gets a DISubprogram metadata node"), returning its id so the caller
    /// can attach `!dbg` to the `define` line and to parameter declares.
    /// Returns `None` when debug info is off.
    fn emit_debug_subprogram(&mut self, decl: &FunctionDecl, llvm_symbol: &str) -> Option<u32> {
        if !self.options.emit_debug_info {
            return None;
        }
        let file_id = self.debug_file_id?;
        let cu_id = self.debug_cu_id?;
        let sp_id = self.fresh.fresh_debug_id();
        self.buffers.footer.line(format!(
            "!{sp_id} = distinct !DISubprogram(name: \"{}\", linkageName: \"{}\", scope: !{file_id}, file: !{file_id}, line: {}, unit: !{cu_id}, spFlags: DISPFlagDefinition)",
            decl.name,
            llvm_symbol.trim_start_matches('@'),
            decl.span.line,
        ));
        Some(sp_id)
    }

    /// `llvm.dbg.declare` + `DILocalVariable`/`DILocation` for one
    /// parameter (§4.8: "each parameter gets llvm.dbg.declare at debug
    /// level >= 2").
    fn emit_debug_param_declare(&mut self, sp_id: u32, param: &Param, reg: &str, index: usize, span: Span) {
        let file_id = self.debug_file_id.unwrap_or(sp_id);
        let type_id = self.ensure_debug_basic_type();
        let var_id = self.fresh.fresh_debug_id();
        let loc_id = self.fresh.fresh_debug_id();
        self.buffers.footer.line(format!(
            "!{var_id} = !DILocalVariable(name: \"{}\", arg: {}, scope: !{sp_id}, file: !{file_id}, line: {}, type: !{type_id})",
            param.name,
            index + 1,
            span.line,
        ));
        self.buffers.footer.line(format!("!{loc_id} = !DILocation(line: {}, scope: !{sp_id})", span.line));
        self.buffers.body.instr(format!("call void @llvm.dbg.declare(metadata ptr {reg}, metadata !{var_id}, metadata !DIExpression()), !dbg !{loc_id}"));
    }

    fn emit_implicit_return(&mut self, return_llvm: &str) -> Result<(), CodegenError> {
        match return_llvm {
            "void" => self.buffers.body.instr("ret void"),
            "i1" | "i8" | "i16" | "i32" | "i64" | "i128" => self.buffers.body.instr(format!("ret {return_llvm} 0")),
            "float" | "double" => self.buffers.body.instr(format!("ret {return_llvm} 0.0")),
            other => self.buffers.body.instr(format!("ret {other} zeroinitializer")),
        }
        Ok(())
    }

    // -- impl blocks --

    pub(super) fn emit_impl_decl(&mut self, impl_decl: &ImplDecl) -> Result<(), CodegenError> {
        if !impl_decl.type_generic_params.is_empty() {
            // Generic impl methods are instantiated per receiver type, at the
            // call site that names a concrete receiver; nothing to do here.
            return Ok(());
        }
        for method in &impl_decl.methods {
            if method.is_generic() {
                continue;
            }
            let is_instance = method.params.first().map(|p| p.name == "this").unwrap_or(false);
            let llvm_symbol = format!("@tml_{}_{}", impl_decl.type_name, method.name);
            let linkage = self.linkage_for(method);
            let dll_storage = self.dll_storage_for(method);
            let param_llvm = self.params_llvm_list(&method.params)?;
            let return_llvm = self.return_type_llvm(method)?;

            let _ = is_instance; // receiver is just params[0] == "this" by convention (§4.8).
            self.symbols.register_function(
                &[format!("{}::{}", impl_decl.type_name, method.name)],
                crate::codegen::symbols::FunctionSignature {
                    llvm_symbol: llvm_symbol.clone(),
                    llvm_fn_type: format!("{return_llvm} ({})", param_llvm.join(", ")),
                    return_type: method.return_type.clone(),
                    param_types: method.params.iter().map(|p| p.ty.clone()).collect(),
                    is_generic: false,
                },
            );
            self.emit_function_common(&llvm_symbol, linkage, dll_storage, &method.params, &param_llvm, &return_llvm, method)?;
        }
        Ok(())
    }
}

