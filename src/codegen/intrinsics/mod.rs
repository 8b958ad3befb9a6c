//! The intrinsic dispatcher (§4.6): a lookup-before-emit layer interposed
//! on every call expression. A recognized callee short-circuits straight to
//! a hand-tuned instruction sequence and returns the SSA register holding
//! the result; an unrecognized one returns `None` so [`super::expr`]'s
//! ordinary call-lowering path runs instead. This is the engine's only form
//! of plug-in extensibility (§4.6's closing rule).

mod atomics;
mod math;
mod memory;
mod strings;
mod wrappers;

use crate::ast::Expr;
use crate::codegen::error::CodegenError;
use crate::codegen::expr::Value;
use crate::semantic_types::SemanticType;
use crate::token::Span;

use super::CodegenContext;

impl CodegenContext {
    pub(crate) fn dispatch_intrinsic(
        &mut self,
        callee: &str,
        type_args: &[SemanticType],
        args: &[Expr],
        span: Span,
    ) -> Result<Option<Value>, CodegenError> {
        if let Some(v) = wrappers::dispatch(self, callee, args, span)? {
            return Ok(Some(v));
        }
        if let Some(v) = math::dispatch(self, callee, args, span)? {
            return Ok(Some(v));
        }
        if let Some(v) = memory::dispatch(self, callee, type_args, args, span)? {
            return Ok(Some(v));
        }
        if let Some(v) = atomics::dispatch(self, callee, args, span)? {
            return Ok(Some(v));
        }
        if let Some(v) = strings::dispatch(self, callee, args, span)? {
            return Ok(Some(v));
        }
        self.dispatch_assert_panic(callee, args, span)
    }

    /// `assert`/`assert_eq`/`assert_ne`/`panic` (§4.6): branch over a
    /// `tml_panic` call followed by `unreachable`.
    fn dispatch_assert_panic(&mut self, callee: &str, args: &[Expr], span: Span) -> Result<Option<Value>, CodegenError> {
        match callee {
            "panic" => {
                let (msg, _) = self.gen_expr(&args[0])?;
                self.buffers.body.instr(format!("call void @tml_panic(ptr {msg})"));
                self.buffers.body.instr("unreachable");
                self.function.block_terminated = true;
                Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
            }
            "assert" => {
                let (cond, _) = self.gen_expr(&args[0])?;
                self.emit_assert_branch(&cond, "assertion failed", span)?;
                Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
            }
            "assert_eq" | "assert_ne" => {
                let (lhs, lty) = self.gen_expr(&args[0])?;
                let (rhs, _) = self.gen_expr(&args[1])?;
                let cond = self.fresh.fresh_reg();
                if lty.is_ptr_like() {
                    let eq = self.fresh.fresh_reg();
                    self.buffers.body.instr(format!("{eq} = call i1 @str_eq(ptr {lhs}, ptr {rhs})"));
                    let predicate = if callee == "assert_eq" { "eq" } else { "ne" };
                    self.buffers.body.instr(format!("{cond} = icmp {predicate} i1 {eq}, 1"));
                } else {
                    let llvm_ty = self.lower_type(&lty, span)?;
                    let predicate = if lty.is_float() {
                        if callee == "assert_eq" { "oeq" } else { "one" }
                    } else if callee == "assert_eq" {
                        "eq"
                    } else {
                        "ne"
                    };
                    let instr = if lty.is_float() { "fcmp" } else { "icmp" };
                    self.buffers.body.instr(format!("{cond} = {instr} {predicate} {llvm_ty} {lhs}, {rhs}"));
                }
                let message = if callee == "assert_eq" { "assertion failed: left != right" } else { "assertion failed: left == right" };
                self.emit_assert_branch(&cond, message, span)?;
                Ok(Some(("zeroinitializer".to_string(), SemanticType::Unit)))
            }
            _ => Ok(None),
        }
    }

    fn emit_assert_branch(&mut self, cond: &str, message: &str, _span: Span) -> Result<(), CodegenError> {
        let fail_label = self.fresh.fresh_label("assert_fail");
        let ok_label = self.fresh.fresh_label("assert_ok");
        self.buffers.body.instr(format!("br i1 {cond}, label %{ok_label}, label %{fail_label}"));
        self.buffers.body.line(format!("{fail_label}:"));
        let (msg_reg, _) = self.gen_string_literal(message)?;
        self.buffers.body.instr(format!("call void @tml_panic(ptr {msg_reg})"));
        self.buffers.body.instr("unreachable");
        self.buffers.body.line(format!("{ok_label}:"));
        Ok(())
    }

    /// `block_on(e)` (§4.6): every producer is modeled as always-`Ready`, so
    /// this extracts the `Ready` payload directly; a non-`Poll` argument
    /// passes through unchanged.
    pub(crate) fn dispatch_block_on(&mut self, inner: &Expr, span: Span) -> Result<Value, CodegenError> {
        let (val, ty) = self.gen_expr(inner)?;
        let SemanticType::Poll(payload_ty) = ty else {
            return Ok((val, ty));
        };
        let mangled = crate::codegen::mangle::mangle_type(&SemanticType::Poll(payload_ty.clone()), span)?;
        let payload_ptr = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{payload_ptr} = getelementptr inbounds %struct.{mangled}, ptr {val}, i32 0, i32 1"));
        let payload_llvm = self.lower_type(&payload_ty, span)?;
        let cast_ptr = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{cast_ptr} = bitcast ptr {payload_ptr} to ptr"));
        let reg = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{reg} = load {payload_llvm}, ptr {cast_ptr}"));
        Ok((reg, *payload_ty))
    }
}
