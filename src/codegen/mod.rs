//! LLVM IR code generation for the tml programming language.
//!
//! This module provides the [`CodegenContext`] struct, which transforms a
//! type-checked tml [`Module`] into a textual LLVM IR module. Unlike an
//! in-process LLVM binding, every instruction is emitted as IR text into
//! one of a handful of append-only streams ([`buffers::OutputBuffers`]) and
//! concatenated once at the end of compilation — there is no LLVM context,
//! builder, or verifier here; that work happens downstream in the
//! assembler/linker stage this engine hands its output to.
//!
//! # Architecture
//!
//! Compilation is two-pass within a single [`CodegenContext`]:
//!
//! 1. **Declare** — non-generic struct/enum type definitions and function
//!    signatures are registered so intra-module forward references resolve;
//!    generic declarations are indexed but not yet emitted.
//! 2. **Emit** — function bodies are generated, triggering on-demand
//!    monomorphization ([`instantiation`]) for every generic reference
//!    encountered along the way, which in turn may queue further bodies.
//!    The queue ([`instantiation::InstantiationRegistry::take_pending_functions`])
//!    is drained until empty.
//!
//! # Module Structure
//!
//! - [`error`] — the two-way fatal error taxonomy
//! - [`options`] — driver-facing configuration
//! - [`mangle`] — deterministic name mangling
//! - [`types`] — semantic type → LLVM type string lowering
//! - [`fresh`] — SSA register/label/debug-ID allocation
//! - [`symbols`] — the five symbol tables
//! - [`buffers`] — the prelude/body text streams
//! - [`instantiation`] — the monomorphization registry
//! - [`intrinsics`] — the built-in call dispatcher
//! - [`derive`] — the derive-macro engine
//! - `decl`, `expr`, `stmt`, `lifetime` — declaration/expression/statement
//!   emission and string-temporary lifetime tracking, each contributing
//!   `impl CodegenContext` blocks rather than owning their own type

pub mod buffers;
mod decl;
pub mod derive;
pub mod error;
mod expr;
pub mod fresh;
pub mod instantiation;
pub mod intrinsics;
mod lifetime;
pub mod mangle;
pub mod options;
mod stmt;
pub mod symbols;
pub mod types;

pub use error::{CodegenError, CodegenErrorKind};
pub use options::Options;

use crate::ast::{Decl, Module};
use crate::diagnostics::DiagnosticBag;
use crate::semantic_types::SemanticType;
use crate::token::Span;

use buffers::OutputBuffers;
use fresh::FreshState;
use instantiation::{DeclIndex, InstantiationRegistry};
use symbols::SymbolTables;

/// Break/continue targets for the innermost loop (§4.9's loop lowering).
#[derive(Debug, Clone)]
pub(crate) struct LoopControl {
    pub continue_label: String,
    pub break_label: String,
}

/// Per-function emission state, reset at every function boundary (§4.3,
/// §4.9's string-temporary tracking, §4.10's terminator discipline).
#[derive(Debug, Default)]
pub(crate) struct FunctionState {
    /// `Some(mangled Poll[T] name)` when the current function is `async`
    /// (§4.8's Poll-wrapping rule).
    pub poll_wrapper: Option<String>,
    /// SSA registers holding heap strings not yet freed or transferred to a
    /// binding (§4.9's string-temporary lifetime tracking).
    pub pending_string_frees: Vec<String>,
    /// Disables `pending_string_frees` draining inside library-impl bodies
    /// (derive-generated methods store temporaries into longer-lived
    /// containers and must not have them freed out from under them).
    pub suppress_lifetime_tracking: bool,
    pub loop_controls: Vec<LoopControl>,
    /// Set once the current basic block has a terminator, so later
    /// statements in the same block are not emitted (§4.10).
    pub block_terminated: bool,
    pub accumulated_link_libs: Vec<String>,
}

/// The engine's single mutable instance: one per module compiled, owning
/// every counter, table, and buffer (§5's shared-resource policy — all
/// state lives here and is mutated only through `CodegenContext` methods).
pub struct CodegenContext {
    pub(crate) options: Options,
    pub(crate) symbols: SymbolTables,
    pub(crate) fresh: FreshState,
    pub(crate) instantiation: InstantiationRegistry,
    pub(crate) decls: DeclIndex,
    pub(crate) buffers: OutputBuffers,
    pub(crate) diagnostics: DiagnosticBag,
    pub(crate) function: FunctionState,
    /// `@extern(abi)` symbols seen with no matching `@link(lib)` — surfaced
    /// as linker-relevant warnings (§7) rather than failing emission.
    pub(crate) unlinked_externs: Vec<(String, Span)>,
    /// Normal path components of the module currently being compiled, used
    /// to build the multi-key function registration (§4.5).
    pub(crate) module_path: Vec<String>,
    /// Metadata node IDs for the module's `DIFile`/`DICompileUnit`, minted
    /// once by [`Self::emit_debug_compile_unit`] when `emit_debug_info` is
    /// set; `None` means debug info is off.
    pub(crate) debug_file_id: Option<u32>,
    pub(crate) debug_cu_id: Option<u32>,
    /// Placeholder `DIBasicType` shared by every `DILocalVariable` (§9:
    /// the engine does not carry a full DWARF type-metadata system, so
    /// every parameter is described by the same generic scalar type node).
    pub(crate) debug_basic_type_id: Option<u32>,
}

impl CodegenContext {
    pub fn new(options: Options) -> Self {
        CodegenContext {
            options,
            symbols: SymbolTables::new(),
            fresh: FreshState::new(),
            instantiation: InstantiationRegistry::new(),
            decls: DeclIndex::default(),
            buffers: OutputBuffers::new(),
            diagnostics: DiagnosticBag::new(),
            function: FunctionState::default(),
            unlinked_externs: Vec::new(),
            module_path: Vec::new(),
            debug_file_id: None,
            debug_cu_id: None,
            debug_basic_type_id: None,
        }
    }

    pub fn diagnostics(&self) -> &DiagnosticBag {
        &self.diagnostics
    }

    /// Libraries the driver must pass to the linker, accumulated from every
    /// `@link(lib)` attribute encountered during emission.
    pub fn link_libraries(&self) -> &[String] {
        &self.function.accumulated_link_libs
    }

    /// Compiles `module` to a complete textual LLVM IR module (§6's output
    /// contract): header, runtime declarations, then user declarations and
    /// bodies in two passes.
    #[tracing::instrument(skip(self, module), fields(module_path = %module.path_components.join("::")))]
    pub fn compile(&mut self, module: &Module, source_file_name: &str) -> Result<String, CodegenError> {
        tracing::info!("starting module compilation");
        self.decls = DeclIndex::from_module(module);
        self.module_path = module.path_components.clone();

        self.emit_module_header(source_file_name);
        self.emit_runtime_declarations();
        if self.options.emit_debug_info {
            self.emit_debug_compile_unit(source_file_name);
        }

        // Pass 1: declare non-generic structs/enums/functions so forward
        // references within the module resolve.
        for decl in &module.decls {
            match decl {
                Decl::Struct(s) if !s.is_generic() => self.emit_struct_decl(s)?,
                Decl::Enum(e) if !e.is_generic() => self.emit_enum_decl(e)?,
                Decl::Function(f) if !f.is_generic() => self.register_function_signature(f)?,
                Decl::Struct(_) | Decl::Enum(_) | Decl::Function(_) => {
                    // Generic: queued on first instantiation request, not here.
                }
                Decl::Impl(_) | Decl::Behavior(_) => {}
            }
        }

        // Pass 2: emit bodies, then drain whatever monomorphization those
        // bodies triggered, until the queue is empty.
        for decl in &module.decls {
            match decl {
                Decl::Function(f) if !f.is_generic() => {
                    tracing::debug!(function = %f.name, "emitting function body");
                    self.emit_function_body(f)?;
                }
                Decl::Impl(impl_decl) => self.emit_impl_decl(impl_decl)?,
                _ => {}
            }
        }
        self.drain_pending_instantiations()?;
        self.buffers.footer.line("attributes #0 = { nounwind mustprogress willreturn }");

        for (symbol, span) in self.unlinked_externs.clone() {
            self.diagnostics.push(crate::diagnostics::Diagnostic::warning(
                "CG-LINK",
                format!("extern symbol '{symbol}' has no matching @link"),
                Some(span),
            ).with_hint("the linker will report a definitive error if it is unresolved"));
        }

        tracing::info!(
            instantiations_pending = self.instantiation.has_pending_functions(),
            "module compilation complete"
        );

        let buffers = std::mem::take(&mut self.buffers);
        Ok(buffers.finish())
    }

    /// Drains [`InstantiationRegistry`]'s function worklist, re-checking
    /// after every batch since emitting one generic body can queue more
    /// (§4.4 step 7's "recursively trigger").
    fn drain_pending_instantiations(&mut self) -> Result<(), CodegenError> {
        loop {
            let pending = self.instantiation.take_pending_functions();
            if pending.is_empty() {
                return Ok(());
            }
            for item in pending {
                tracing::debug!(mangled = %item.mangled_name, "emitting monomorphized function body");
                self.emit_instantiated_function_body(&item)?;
            }
        }
    }

    fn emit_module_header(&mut self, source_file_name: &str) {
        self.buffers.prelude.line(format!("; ModuleID = '{source_file_name}'"));
        self.buffers.prelude.line(format!("source_filename = \"{source_file_name}\""));
        self.buffers.prelude.line("target datalayout = \"e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-i128:128-f80:128-n8:16:32:64-S128\"");
        self.buffers.prelude.line("target triple = \"x86_64-unknown-linux-gnu\"");
        self.buffers.prelude.blank();
    }

    /// Declares every C-ABI runtime symbol the emitted IR may call (§6's
    /// "not defined by the engine" contract with `tmlc-runtime`).
    fn emit_runtime_declarations(&mut self) {
        let decls = [
            "declare i32 @printf(ptr, ...)",
            "declare ptr @malloc(i64)",
            "declare void @free(ptr)",
            "declare i32 @strcmp(ptr, ptr)",
            "declare void @tml_panic(ptr)",
            "declare void @tml_cover_func(ptr)",
            "declare void @tml_str_free(ptr)",
            "declare ptr @str_concat_opt(ptr, ptr)",
            "declare i1 @str_eq(ptr, ptr)",
            "declare i64 @str_hash(ptr)",
            "declare ptr @i64_to_str(i64)",
            "declare ptr @f64_to_str(double)",
            "declare ptr @bool_to_str(i1)",
            "declare void @print_bool(i1)",
            "declare void @print_i32(i32)",
            "declare void @print_i64(i64)",
            "declare void @print_f64(double)",
            "declare void @print(ptr)",
            "declare void @println(ptr)",
            "declare i64 @time_ms()",
            "declare i64 @time_us()",
            "declare i64 @time_ns()",
            "declare void @sleep_ms(i64)",
            "declare void @sleep_us(i64)",
            "declare ptr @instant_now()",
            "declare i64 @instant_elapsed(ptr)",
            "declare void @instant_free(ptr)",
            "declare i64 @duration_from_millis(i64)",
            "declare i64 @duration_from_secs(i64)",
            "declare i64 @duration_as_millis(i64)",
            "declare i64 @duration_as_secs(i64)",
            "declare ptr @json_parse(ptr)",
            "declare void @json_free(ptr)",
            "declare ptr @json_get_string(ptr, ptr, ptr)",
            "declare i1 @json_get_bool(ptr, ptr, ptr)",
            "declare i64 @json_get_i64(ptr, ptr, ptr)",
            "declare double @json_get_f64(ptr, ptr, ptr)",
            "declare i32 @atomic_i32_add(ptr, i32)",
            "declare i64 @atomic_i64_add(ptr, i64)",
            "declare i64 @str_len(ptr)",
            "declare i32 @str_cmp(ptr, ptr)",
            "declare ptr @str_concat(ptr, ptr)",
            "declare ptr @str_slice(ptr, i64, i64)",
            "declare ptr @str_substring(ptr, i64, i64)",
            "declare i1 @str_contains(ptr, ptr)",
            "declare i1 @str_starts_with(ptr, ptr)",
            "declare i1 @str_ends_with(ptr, ptr)",
            "declare ptr @str_to_upper(ptr)",
            "declare ptr @str_to_lower(ptr)",
            "declare ptr @str_trim(ptr)",
            "declare i32 @str_char_at(ptr, i64)",
            "declare i1 @char_is_alpha(i32)",
            "declare i1 @char_is_digit(i32)",
            "declare i1 @char_is_alphanumeric(i32)",
            "declare i1 @char_is_whitespace(i32)",
            "declare i1 @char_is_upper(i32)",
            "declare i1 @char_is_lower(i32)",
            "declare i1 @char_is_punctuation(i32)",
            "declare i32 @char_to_upper(i32)",
            "declare i32 @char_to_lower(i32)",
            "declare i32 @char_to_digit(i32)",
            "declare ptr @strbuilder_new()",
            "declare void @strbuilder_append(ptr, ptr)",
            "declare i64 @strbuilder_len(ptr)",
            "declare ptr @strbuilder_finish(ptr)",
            "declare double @llvm.sqrt.f64(double)",
            "declare double @llvm.sin.f64(double)",
            "declare double @llvm.cos.f64(double)",
            "declare double @llvm.pow.f64(double, double)",
            "declare double @llvm.fma.f64(double, double, double)",
            "declare double @llvm.fabs.f64(double)",
            "declare i64 @llvm.ctlz.i64(i64, i1)",
            "declare i64 @llvm.ctpop.i64(i64)",
            "declare i64 @llvm.bswap.i64(i64)",
            "declare void @llvm.assume(i1)",
            "declare i1 @llvm.expect.i1(i1, i1)",
            "declare void @llvm.dbg.declare(metadata, metadata, metadata)",
        ];
        for decl in decls {
            self.buffers.prelude.line(decl);
        }
        self.buffers.prelude.blank();
    }

    /// Mints the module's `DIFile`/`DICompileUnit` pair and the
    /// `!llvm.dbg.cu` named metadata referencing it (§6 output contract
    /// point 5), once per module, before any function is emitted.
    fn emit_debug_compile_unit(&mut self, source_file_name: &str) {
        let file_id = self.fresh.fresh_debug_id();
        let cu_id = self.fresh.fresh_debug_id();
        self.buffers.footer.line(format!("!{file_id} = !DIFile(filename: \"{source_file_name}\", directory: \".\")"));
        self.buffers.footer.line(format!(
            "!{cu_id} = distinct !DICompileUnit(language: DW_LANG_C99, file: !{file_id}, producer: \"tmlc\", isOptimized: false, runtimeVersion: 0, emissionKind: FullDebug)"
        ));
        self.buffers.footer.line(format!("!llvm.dbg.cu = !{{!{cu_id}}}"));
        self.debug_file_id = Some(file_id);
        self.debug_cu_id = Some(cu_id);
    }

    /// The single generic scalar type node every `DILocalVariable` points
    /// at (§9: no per-type DWARF descriptors), created on first use.
    pub(crate) fn ensure_debug_basic_type(&mut self) -> u32 {
        if let Some(id) = self.debug_basic_type_id {
            return id;
        }
        let id = self.fresh.fresh_debug_id();
        self.buffers.footer.line(format!("!{id} = !DIBasicType(name: \"int\", size: 64, encoding: DW_ATE_unsigned)"));
        self.debug_basic_type_id = Some(id);
        id
    }

    /// Resolves `ty` to an LLVM type string, triggering instantiation on
    /// first reference (thin forwarding wrapper so callers outside
    /// `instantiation` don't need to thread three extra arguments through).
    pub(crate) fn lower_type(&mut self, ty: &SemanticType, span: Span) -> Result<String, CodegenError> {
        self.instantiation.lower_concrete(ty, &mut self.symbols, &self.decls, &mut self.buffers, span)
    }
}
