//! Expression emission (§4.9): `gen_expr` dispatches over every
//! [`ExprKind`], returning the SSA register (or literal constant text)
//! holding the expression's value together with its semantic type.

use crate::ast::{BinOp, Expr, ExprKind, Pattern, UnOp};
use crate::codegen::error::CodegenError;
use crate::codegen::types::TypePosition;
use crate::semantic_types::SemanticType;
use crate::token::Span;

use super::CodegenContext;

/// The value an expression lowers to: either an SSA register (`%7`) or a
/// literal constant usable inline (`5`, `true` as `1`, a global address).
pub(crate) type Value = (String, SemanticType);

impl CodegenContext {
    pub(super) fn gen_expr(&mut self, expr: &Expr) -> Result<Value, CodegenError> {
        match &expr.kind {
            ExprKind::UnitLiteral => Ok(("zeroinitializer".to_string(), SemanticType::Unit)),
            ExprKind::BoolLiteral(b) => Ok((if *b { "1" } else { "0" }.to_string(), SemanticType::Bool)),
            ExprKind::IntLiteral(v) => Ok((v.to_string(), expr.ty.clone())),
            ExprKind::FloatLiteral(v) => Ok((format!("{v:?}"), expr.ty.clone())),
            ExprKind::StringLiteral(s) => self.gen_string_literal(s),
            ExprKind::Identifier(name) => self.gen_identifier(name, expr.span),
            ExprKind::BinaryOp { op, lhs, rhs } => self.gen_binary_op(*op, lhs, rhs, expr.span),
            ExprKind::UnaryOp { op, operand } => self.gen_unary_op(*op, operand, expr.span),
            ExprKind::Call { callee, type_args, args } => self.gen_call(callee, type_args, args, expr.span),
            ExprKind::MethodCall { receiver, method, type_args, args } => {
                self.gen_method_call(receiver, method, type_args, args, expr.span)
            }
            ExprKind::FieldAccess { base, field } => self.gen_field_access(base, field, expr.span),
            ExprKind::StructLiteral { name, type_args, fields } => {
                self.gen_struct_literal(name, type_args, fields, expr.span)
            }
            ExprKind::ArrayLiteral(elems) => self.gen_array_literal(elems, &expr.ty, expr.span),
            ExprKind::TupleLiteral(elems) => self.gen_tuple_literal(elems, expr.span),
            ExprKind::Index { base, index } => self.gen_index(base, index, expr.span),
            ExprKind::If { condition, then_branch, else_branch } => {
                self.gen_if_expr(condition, then_branch, else_branch.as_deref(), &expr.ty, expr.span)
            }
            ExprKind::Block(stmts) => self.gen_block_expr(stmts, &expr.ty),
            ExprKind::When { scrutinee, arms } => self.gen_when(scrutinee, arms, &expr.ty, expr.span),
            ExprKind::Closure { params, captures, body, return_type } => {
                self.gen_closure(params, captures, body, return_type, expr.span)
            }
            ExprKind::Cast { expr: inner, target } => self.gen_cast(inner, target, expr.span),
            ExprKind::Interpolated(parts) => self.gen_interpolated(parts, expr.span),
            ExprKind::Try(inner) => self.gen_try(inner, expr.span),
            ExprKind::Await(inner) => self.gen_await(inner, expr.span),
        }
    }

    pub(super) fn gen_string_literal(&mut self, s: &str) -> Result<Value, CodegenError> {
        let global = self.intern_string_literal(s);
        let len = s.len() + 1;
        let reg = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{reg} = getelementptr inbounds [{len} x i8], ptr {global}, i64 0, i64 0"));
        Ok((reg, SemanticType::Str))
    }

    /// Interns `s` as a `private constant` array in the prelude and returns
    /// its global name (§4.9's "string literals are interned into the
    /// prelude").
    pub(super) fn intern_string_literal(&mut self, s: &str) -> String {
        let id = self.fresh.fresh_debug_id();
        let name = format!("@.str.{id}");
        let mut escaped = String::new();
        for byte in s.bytes() {
            match byte {
                b'"' => escaped.push_str("\\22"),
                b'\\' => escaped.push_str("\\5C"),
                0x20..=0x7e => escaped.push(byte as char),
                _ => escaped.push_str(&format!("\\{byte:02X}")),
            }
        }
        let len = s.len() + 1;
        self.buffers.prelude.line(format!("{name} = private unnamed_addr constant [{len} x i8] c\"{escaped}\\00\""));
        name
    }

    fn gen_identifier(&mut self, name: &str, span: Span) -> Result<Value, CodegenError> {
        let local = self
            .symbols
            .lookup_local(name)
            .cloned()
            .ok_or_else(|| CodegenError::internal(format!("identifier '{name}' has no local binding"), span))?;
        let reg = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{reg} = load {}, ptr {}", local.llvm_type, local.llvm_register));
        Ok((reg, local.semantic_type))
    }

    fn gen_binary_op(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, span: Span) -> Result<Value, CodegenError> {
        let (lval, lty) = self.gen_expr(lhs)?;
        let (rval, _rty) = self.gen_expr(rhs)?;

        if matches!(op, BinOp::Add) && matches!(lty, SemanticType::Str) {
            let reg = self.fresh.fresh_reg();
            self.buffers.body.instr(format!("{reg} = call ptr @str_concat_opt(ptr {lval}, ptr {rval})"));
            self.track_string_temp(&reg);
            return Ok((reg, SemanticType::Str));
        }

        if matches!(op, BinOp::And | BinOp::Or) {
            let instr = if op == BinOp::And { "and" } else { "or" };
            let reg = self.fresh.fresh_reg();
            self.buffers.body.instr(format!("{reg} = {instr} i1 {lval}, {rval}"));
            return Ok((reg, SemanticType::Bool));
        }

        let llvm_ty = self.lower_type(&lty, span)?;
        let is_float = lty.is_float();
        let is_signed = lty.is_signed();

        let reg = self.fresh.fresh_reg();
        if let Some(predicate) = comparison_predicate(op, is_float, is_signed) {
            let instr = if is_float { "fcmp" } else { "icmp" };
            self.buffers.body.instr(format!("{reg} = {instr} {predicate} {llvm_ty} {lval}, {rval}"));
            return Ok((reg, SemanticType::Bool));
        }

        let mnemonic = arithmetic_mnemonic(op, is_float, is_signed)
            .ok_or_else(|| CodegenError::unsupported(format!("binary operator {op:?} has no lowering for this operand type"), span))?;
        self.buffers.body.instr(format!("{reg} = {mnemonic} {llvm_ty} {lval}, {rval}"));
        Ok((reg, lty))
    }

    fn gen_unary_op(&mut self, op: UnOp, operand: &Expr, span: Span) -> Result<Value, CodegenError> {
        let (val, ty) = self.gen_expr(operand)?;
        let llvm_ty = self.lower_type(&ty, span)?;
        let reg = self.fresh.fresh_reg();
        match op {
            UnOp::Neg if ty.is_float() => self.buffers.body.instr(format!("{reg} = fneg {llvm_ty} {val}")),
            UnOp::Neg => self.buffers.body.instr(format!("{reg} = sub {llvm_ty} 0, {val}")),
            UnOp::Not if llvm_ty == "i1" => self.buffers.body.instr(format!("{reg} = xor i1 {val}, 1")),
            UnOp::Not => self.buffers.body.instr(format!("{reg} = xor {llvm_ty} {val}, -1")),
        }
        Ok((reg, ty))
    }

    fn gen_call(&mut self, callee: &str, type_args: &[SemanticType], args: &[Expr], span: Span) -> Result<Value, CodegenError> {
        if let Some(result) = self.dispatch_intrinsic(callee, type_args, args, span)? {
            return Ok(result);
        }

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.gen_expr(arg)?);
        }

        let (llvm_symbol, llvm_fn_type, return_type) = if type_args.is_empty() {
            let sig = self
                .symbols
                .function(callee)
                .cloned()
                .ok_or_else(|| CodegenError::internal(format!("call to undeclared function '{callee}'"), span))?;
            (sig.llvm_symbol, sig.llvm_fn_type, sig.return_type)
        } else {
            let llvm_symbol = self.instantiation.require_func_instantiation(
                callee,
                type_args,
                &mut self.symbols,
                &self.decls,
                &mut self.buffers,
                span,
            )?;
            let mangled = llvm_symbol.trim_start_matches("@tml_").to_string();
            let sig = self
                .symbols
                .function(&mangled)
                .cloned()
                .ok_or_else(|| CodegenError::internal(format!("instantiation '{mangled}' missing its own signature"), span))?;
            (llvm_symbol, sig.llvm_fn_type, sig.return_type)
        };

        self.emit_call(&llvm_symbol, &llvm_fn_type, &arg_values, &return_type)
    }

    fn gen_method_call(
        &mut self,
        receiver: &Expr,
        method: &str,
        type_args: &[SemanticType],
        args: &[Expr],
        span: Span,
    ) -> Result<Value, CodegenError> {
        let owner_name = match &receiver.ty {
            SemanticType::Named { name, .. } => Some(name.clone()),
            _ => None,
        };

        if let Some(owner) = &owner_name {
            if let Some(result) = self.dispatch_derived_method(owner, method, receiver, args, span)? {
                return Ok(result);
            }
        }

        let (recv_val, _) = self.gen_expr(receiver)?;
        let mut arg_values = vec![(recv_val, receiver.ty.clone())];
        for arg in args {
            arg_values.push(self.gen_expr(arg)?);
        }

        let owner = owner_name.ok_or_else(|| CodegenError::unsupported(format!("method '{method}' called on a non-struct/enum receiver"), span))?;
        let impl_key = format!("{owner}::{method}");
        let sig = self
            .symbols
            .function(&impl_key)
            .cloned()
            .or_else(|| {
                let symbol = format!("@tml_{owner}_{method}");
                self.symbols.function(&symbol).cloned()
            })
            .ok_or_else(|| CodegenError::internal(format!("no method '{method}' registered on '{owner}'"), span))?;
        let _ = type_args;
        self.emit_call(&sig.llvm_symbol, &sig.llvm_fn_type, &arg_values, &sig.return_type)
    }

    /// Routes a method call to a derive-generated method (§4.7) when one is
    /// registered for `owner::method`, passing the receiver's address rather
    /// than a by-value load — every derived method takes `ptr %this` (and
    /// `ptr %other` for `eq`), never a loaded aggregate. Hand-written `impl`
    /// methods fall through (`Ok(None)`) to the ordinary resolution path in
    /// [`Self::gen_method_call`].
    fn dispatch_derived_method(
        &mut self,
        owner: &str,
        method: &str,
        receiver: &Expr,
        args: &[Expr],
        span: Span,
    ) -> Result<Option<Value>, CodegenError> {
        const DERIVED_METHODS: &[&str] =
            &["eq", "hash", "debug_string", "to_string", "to_json", "runtime_type_info", "variant_tag", "variant_name"];
        if !DERIVED_METHODS.contains(&method) {
            return Ok(None);
        }
        let impl_key = format!("{owner}::{method}");
        let Some(sig) = self.symbols.function(&impl_key).cloned() else {
            return Ok(None);
        };

        let (recv_addr, recv_ty) = self.gen_struct_address(receiver, span)?;
        let mut arg_values = vec![(recv_addr, recv_ty)];
        for arg in args {
            let value = match &arg.ty {
                SemanticType::Named { .. } => self.gen_struct_address(arg, span)?,
                _ => self.gen_expr(arg)?,
            };
            arg_values.push(value);
        }

        Ok(Some(self.emit_call(&sig.llvm_symbol, &sig.llvm_fn_type, &arg_values, &sig.return_type)?))
    }

    fn emit_call(&mut self, llvm_symbol: &str, llvm_fn_type: &str, args: &[Value], return_type: &SemanticType) -> Result<Value, CodegenError> {
        let arg_list = args
            .iter()
            .map(|(val, ty)| {
                let llvm_ty = crate::codegen::types::lower_primitive(ty, TypePosition::Data).unwrap_or_else(|| "ptr".to_string());
                format!("{llvm_ty} {val}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        let return_llvm = llvm_fn_type.split(" (").next().unwrap_or("void").to_string();

        if return_llvm == "void" {
            self.buffers.body.instr(format!("call void {llvm_symbol}({arg_list})"));
            return Ok(("zeroinitializer".to_string(), SemanticType::Unit));
        }

        let reg = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{reg} = call {return_llvm} {llvm_symbol}({arg_list})"));
        Ok((reg, return_type.clone()))
    }

    fn gen_field_access(&mut self, base: &Expr, field: &str, span: Span) -> Result<Value, CodegenError> {
        let (base_ptr, owner_name) = self.gen_struct_address(base, span)?;
        let mangled = match &owner_name {
            SemanticType::Named { name, type_args } if type_args.is_empty() => name.clone(),
            SemanticType::Named { name, type_args } => crate::codegen::mangle::mangle_name(name, type_args, span)?,
            other => return Err(CodegenError::internal(format!("field access on non-struct type {other}"), span)),
        };
        let (_, index, llvm_ty) = self
            .symbols
            .struct_field(&mangled, field)
            .cloned()
            .ok_or_else(|| CodegenError::internal(format!("unknown field '{field}' on '{mangled}'"), span))?;

        let ptr_reg = self.fresh.fresh_reg();
        self.buffers.body.instr(format!(
            "{ptr_reg} = getelementptr inbounds %struct.{mangled}, ptr {base_ptr}, i32 0, i32 {index}"
        ));
        let value_reg = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{value_reg} = load {llvm_ty}, ptr {ptr_reg}"));
        Ok((value_reg, field_semantic_type(&self.symbols, &mangled, field)))
    }

    /// Evaluates `expr` to a `ptr` to its storage (for field-access and
    /// struct-literal lowering). Identifiers reuse their existing alloca;
    /// anything else is materialized into a scratch alloca first.
    fn gen_struct_address(&mut self, expr: &Expr, span: Span) -> Result<(String, SemanticType), CodegenError> {
        if let ExprKind::Identifier(name) = &expr.kind {
            let local = self
                .symbols
                .lookup_local(name)
                .cloned()
                .ok_or_else(|| CodegenError::internal(format!("identifier '{name}' has no local binding"), span))?;
            return Ok((local.llvm_register, local.semantic_type));
        }
        let (val, ty) = self.gen_expr(expr)?;
        let llvm_ty = self.lower_type(&ty, span)?;
        let slot = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{slot} = alloca {llvm_ty}"));
        self.buffers.body.instr(format!("store {llvm_ty} {val}, ptr {slot}"));
        Ok((slot, ty))
    }

    fn gen_struct_literal(
        &mut self,
        name: &str,
        type_args: &[SemanticType],
        fields: &[(String, Expr)],
        span: Span,
    ) -> Result<Value, CodegenError> {
        let mangled = if type_args.is_empty() {
            self.instantiation.require_struct_instantiation(name, &[], &mut self.symbols, &self.decls, &mut self.buffers, span)?
        } else {
            self.instantiation.require_struct_instantiation(name, type_args, &mut self.symbols, &self.decls, &mut self.buffers, span)?
        };
        let llvm_ty = format!("%struct.{mangled}");
        let slot = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{slot} = alloca {llvm_ty}"));

        for (field_name, field_expr) in fields {
            let (val, _) = self.gen_expr(field_expr)?;
            let (_, index, field_llvm_ty) = self
                .symbols
                .struct_field(&mangled, field_name)
                .cloned()
                .ok_or_else(|| CodegenError::internal(format!("unknown field '{field_name}' on '{mangled}'"), span))?;
            let ptr_reg = self.fresh.fresh_reg();
            self.buffers.body.instr(format!("{ptr_reg} = getelementptr inbounds {llvm_ty}, ptr {slot}, i32 0, i32 {index}"));
            self.buffers.body.instr(format!("store {field_llvm_ty} {val}, ptr {ptr_reg}"));
        }

        let value_reg = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{value_reg} = load {llvm_ty}, ptr {slot}"));
        Ok((value_reg, SemanticType::Named { name: name.to_string(), type_args: type_args.to_vec() }))
    }

    fn gen_array_literal(&mut self, elems: &[Expr], ty: &SemanticType, span: Span) -> Result<Value, CodegenError> {
        let elem_ty = match ty {
            SemanticType::Pointer(inner) | SemanticType::Reference { inner, .. } => (**inner).clone(),
            other => other.clone(),
        };
        let elem_llvm = self.lower_type(&elem_ty, span)?;
        let array_ty = format!("[{} x {elem_llvm}]", elems.len());
        let slot = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{slot} = alloca {array_ty}"));
        for (i, elem) in elems.iter().enumerate() {
            let (val, _) = self.gen_expr(elem)?;
            let ptr_reg = self.fresh.fresh_reg();
            self.buffers.body.instr(format!("{ptr_reg} = getelementptr inbounds {array_ty}, ptr {slot}, i64 0, i64 {i}"));
            self.buffers.body.instr(format!("store {elem_llvm} {val}, ptr {ptr_reg}"));
        }
        Ok((slot, SemanticType::Pointer(Box::new(elem_ty))))
    }

    fn gen_tuple_literal(&mut self, elems: &[Expr], span: Span) -> Result<Value, CodegenError> {
        let mut values = Vec::with_capacity(elems.len());
        let mut types = Vec::with_capacity(elems.len());
        for elem in elems {
            let (val, ty) = self.gen_expr(elem)?;
            let llvm_ty = self.lower_type(&ty, span)?;
            values.push((val, llvm_ty));
            types.push(ty);
        }
        let tuple_ty = format!("{{ {} }}", values.iter().map(|(_, t)| t.as_str()).collect::<Vec<_>>().join(", "));
        let mut agg = "undef".to_string();
        for (i, (val, llvm_ty)) in values.iter().enumerate() {
            let reg = self.fresh.fresh_reg();
            self.buffers.body.instr(format!("{reg} = insertvalue {tuple_ty} {agg}, {llvm_ty} {val}, {i}"));
            agg = reg;
        }
        Ok((agg, SemanticType::Tuple(types)))
    }

    fn gen_index(&mut self, base: &Expr, index: &Expr, span: Span) -> Result<Value, CodegenError> {
        let (base_val, base_ty) = self.gen_expr(base)?;
        let (index_val, _) = self.gen_expr(index)?;
        let elem_ty = match &base_ty {
            SemanticType::Pointer(inner) | SemanticType::Reference { inner, .. } => (**inner).clone(),
            other => return Err(CodegenError::internal(format!("index base has non-indexable type {other}"), span)),
        };
        let elem_llvm = self.lower_type(&elem_ty, span)?;
        let ptr_reg = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{ptr_reg} = getelementptr inbounds {elem_llvm}, ptr {base_val}, i64 {index_val}"));
        let value_reg = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{value_reg} = load {elem_llvm}, ptr {ptr_reg}"));
        Ok((value_reg, elem_ty))
    }

    fn gen_if_expr(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: Option<&Expr>,
        result_ty: &SemanticType,
        span: Span,
    ) -> Result<Value, CodegenError> {
        let (cond_val, _) = self.gen_expr(condition)?;
        let then_label = self.fresh.fresh_label("if_then");
        let else_label = self.fresh.fresh_label("if_else");
        let merge_label = self.fresh.fresh_label("if_end");

        self.buffers.body.instr(format!("br i1 {cond_val}, label %{then_label}, label %{else_label}"));

        self.buffers.body.line(format!("{then_label}:"));
        let (then_val, then_ty) = self.gen_expr(then_branch)?;
        self.buffers.body.instr(format!("br label %{merge_label}"));
        let then_end_label = then_label.clone();

        self.buffers.body.line(format!("{else_label}:"));
        let (else_val, _) = match else_branch {
            Some(e) => self.gen_expr(e)?,
            None => ("zeroinitializer".to_string(), SemanticType::Unit),
        };
        self.buffers.body.instr(format!("br label %{merge_label}"));
        let else_end_label = else_label.clone();

        self.buffers.body.line(format!("{merge_label}:"));
        if matches!(result_ty, SemanticType::Unit) {
            return Ok(("zeroinitializer".to_string(), SemanticType::Unit));
        }
        let llvm_ty = self.lower_type(&then_ty, span)?;
        let reg = self.fresh.fresh_reg();
        self.buffers
            .body
            .instr(format!("{reg} = phi {llvm_ty} [ {then_val}, %{then_end_label} ], [ {else_val}, %{else_end_label} ]"));
        Ok((reg, then_ty))
    }

    fn gen_block_expr(&mut self, stmts: &[crate::ast::Stmt], ty: &SemanticType) -> Result<Value, CodegenError> {
        if stmts.is_empty() {
            return Ok(("zeroinitializer".to_string(), ty.clone()));
        }
        for stmt in &stmts[..stmts.len() - 1] {
            self.gen_stmt(stmt)?;
        }
        match &stmts.last().unwrap().kind {
            crate::ast::StmtKind::Expr(e) => self.gen_expr(e),
            _ => {
                self.gen_stmt(stmts.last().unwrap())?;
                Ok(("zeroinitializer".to_string(), ty.clone()))
            }
        }
    }

    fn gen_when(&mut self, scrutinee: &Expr, arms: &[crate::ast::WhenArm], result_ty: &SemanticType, span: Span) -> Result<Value, CodegenError> {
        let (scrutinee_val, scrutinee_ty) = match &scrutinee.ty {
            SemanticType::Named { .. } => self.gen_struct_address(scrutinee, span)?,
            _ => self.gen_expr(scrutinee)?,
        };
        let end_label = self.fresh.fresh_label("when_end");
        let llvm_result_ty = if matches!(result_ty, SemanticType::Unit) { None } else { Some(self.lower_type(result_ty, span)?) };

        let mut incoming = Vec::new();
        let first_label = self.fresh.fresh_label("when_arm");
        self.buffers.body.line(format!("{first_label}:"));
        let mut arm_label = first_label;
        for arm in arms {
            let fallthrough_label = self.fresh.fresh_label("when_arm");

            let mut live_label = self.gen_pattern_test(&arm.pattern, &scrutinee_val, &scrutinee_ty, &arm_label, &fallthrough_label, span)?;
            if let Some(guard) = &arm.guard {
                let (guard_val, _) = self.gen_expr(guard)?;
                let guard_pass = self.fresh.fresh_label("when_guard_ok");
                self.buffers.body.instr(format!("br i1 {guard_val}, label %{guard_pass}, label %{fallthrough_label}"));
                self.buffers.body.line(format!("{guard_pass}:"));
                live_label = guard_pass;
            }

            let (arm_val, _) = self.gen_expr(&arm.body)?;
            self.buffers.body.instr(format!("br label %{end_label}"));
            incoming.push((arm_val, live_label));

            self.buffers.body.line(format!("{fallthrough_label}:"));
            arm_label = fallthrough_label;
        }
        self.buffers.body.instr("unreachable".to_string());

        self.buffers.body.line(format!("{end_label}:"));
        match llvm_result_ty {
            None => Ok(("zeroinitializer".to_string(), SemanticType::Unit)),
            Some(llvm_ty) => {
                let reg = self.fresh.fresh_reg();
                let phi_list = incoming.iter().map(|(v, l)| format!("[ {v}, %{l} ]")).collect::<Vec<_>>().join(", ");
                self.buffers.body.instr(format!("{reg} = phi {llvm_ty} {phi_list}"));
                Ok((reg, result_ty.clone()))
            }
        }
    }

    /// Emits the test for one `when` pattern, branching to `fail_label` on
    /// mismatch and falling through (binding any payload locals) on match.
    /// `current_label` is the block already live when this test starts;
    /// returns the label of the block live once the test has passed, which
    /// is `current_label` unchanged for patterns that never branch.
    fn gen_pattern_test(
        &mut self,
        pattern: &Pattern,
        scrutinee_val: &str,
        scrutinee_ty: &SemanticType,
        current_label: &str,
        fail_label: &str,
        span: Span,
    ) -> Result<String, CodegenError> {
        match pattern {
            Pattern::Wildcard | Pattern::Binding(_) => {
                if let Pattern::Binding(name) = pattern {
                    let llvm_ty = self.lower_type(scrutinee_ty, span)?;
                    let slot = self.fresh.fresh_reg();
                    self.buffers.body.instr(format!("{slot} = alloca {llvm_ty}"));
                    self.buffers.body.instr(format!("store {llvm_ty} {scrutinee_val}, ptr {slot}"));
                    self.symbols.define_local(
                        name,
                        crate::codegen::symbols::LocalInfo { llvm_register: slot, llvm_type: llvm_ty, semantic_type: scrutinee_ty.clone(), lifetime: None },
                    );
                }
                Ok(current_label.to_string())
            }
            Pattern::Literal(lit) => {
                let (lit_val, _) = self.gen_expr(lit)?;
                let llvm_ty = self.lower_type(scrutinee_ty, span)?;
                let cmp = self.fresh.fresh_reg();
                let instr = if scrutinee_ty.is_float() { "fcmp oeq" } else { "icmp eq" };
                self.buffers.body.instr(format!("{cmp} = {instr} {llvm_ty} {scrutinee_val}, {lit_val}"));
                let pass = self.fresh.fresh_label("pat_ok");
                self.buffers.body.instr(format!("br i1 {cmp}, label %{pass}, label %{fail_label}"));
                self.buffers.body.line(format!("{pass}:"));
                Ok(pass)
            }
            Pattern::Variant { enum_name, variant, bindings } => {
                let mangled = match scrutinee_ty {
                    SemanticType::Named { name, type_args } if type_args.is_empty() => name.clone(),
                    SemanticType::Named { name, type_args } => crate::codegen::mangle::mangle_name(name, type_args, span)?,
                    _ => enum_name.clone(),
                };
                let tag = self
                    .symbols
                    .enum_variant_tag(&mangled, variant)
                    .ok_or_else(|| CodegenError::internal(format!("unknown variant '{variant}' on '{mangled}'"), span))?;
                let tag_ptr = self.fresh.fresh_reg();
                self.buffers.body.instr(format!("{tag_ptr} = getelementptr inbounds %struct.{mangled}, ptr {scrutinee_val}, i32 0, i32 0"));
                let tag_val = self.fresh.fresh_reg();
                self.buffers.body.instr(format!("{tag_val} = load i32, ptr {tag_ptr}"));
                let cmp = self.fresh.fresh_reg();
                self.buffers.body.instr(format!("{cmp} = icmp eq i32 {tag_val}, {tag}"));
                let pass = self.fresh.fresh_label("pat_ok");
                self.buffers.body.instr(format!("br i1 {cmp}, label %{pass}, label %{fail_label}"));
                self.buffers.body.line(format!("{pass}:"));

                if !bindings.is_empty() {
                    let payload_ptr = self.fresh.fresh_reg();
                    self.buffers.body.instr(format!("{payload_ptr} = getelementptr inbounds %struct.{mangled}, ptr {scrutinee_val}, i32 0, i32 1"));
                    for binding in bindings {
                        let reg = self.fresh.fresh_reg();
                        self.buffers.body.instr(format!("{reg} = bitcast ptr {payload_ptr} to ptr"));
                        self.symbols.define_local(
                            binding,
                            crate::codegen::symbols::LocalInfo { llvm_register: reg, llvm_type: "ptr".to_string(), semantic_type: SemanticType::Str, lifetime: None },
                        );
                    }
                }
                Ok(pass)
            }
            Pattern::Or(patterns) => {
                let combined_pass = self.fresh.fresh_label("pat_or_ok");
                for (i, p) in patterns.iter().enumerate() {
                    let next_try = if i + 1 < patterns.len() { self.fresh.fresh_label("pat_or_next") } else { fail_label.to_string() };
                    self.gen_pattern_test(p, scrutinee_val, scrutinee_ty, current_label, &next_try, span)?;
                    self.buffers.body.instr(format!("br label %{combined_pass}"));
                    if i + 1 < patterns.len() {
                        self.buffers.body.line(format!("{next_try}:"));
                    }
                }
                self.buffers.body.line(format!("{combined_pass}:"));
                Ok(combined_pass)
            }
        }
    }

    fn gen_closure(
        &mut self,
        params: &[crate::ast::ClosureParam],
        captures: &[String],
        body: &Expr,
        return_type: &SemanticType,
        span: Span,
    ) -> Result<Value, CodegenError> {
        // Capture analysis groups free variables into a heap environment
        // struct; the closure itself lowers to a `{ ptr, ptr }` fat pointer
        // of (function, environment) at the use site (§4.9).
        let env_fields: Vec<_> = captures
            .iter()
            .filter_map(|name| self.symbols.lookup_local(name).cloned())
            .collect();
        let env_ty = format!("{{ {} }}", env_fields.iter().map(|l| l.llvm_type.as_str()).collect::<Vec<_>>().join(", "));

        let env_size_reg = self.fresh.fresh_reg();
        self.buffers.body.instr(format!(
            "{env_size_reg} = getelementptr {env_ty}, ptr null, i32 1"
        ));
        let env_size_int = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{env_size_int} = ptrtoint ptr {env_size_reg} to i64"));
        let env_ptr = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{env_ptr} = call ptr @malloc(i64 {env_size_int})"));

        for (i, (name, local)) in captures.iter().zip(&env_fields).enumerate() {
            let field_ptr = self.fresh.fresh_reg();
            self.buffers.body.instr(format!("{field_ptr} = getelementptr inbounds {env_ty}, ptr {env_ptr}, i32 0, i32 {i}"));
            let value_reg = self.fresh.fresh_reg();
            self.buffers.body.instr(format!("{value_reg} = load {}, ptr {}", local.llvm_type, local.llvm_register));
            self.buffers.body.instr(format!("store {} {value_reg}, ptr {field_ptr}", local.llvm_type));
            let _ = name;
        }

        let fn_name = format!("@tml_closure_{}", self.fresh.fresh_debug_id());
        let param_llvm: Vec<String> = params.iter().map(|p| self.lower_type(&p.ty, span)).collect::<Result<_, _>>()?;
        let ret_llvm = match crate::codegen::types::lower_primitive(return_type, TypePosition::Return) {
            Some(llvm) => llvm,
            None => self.lower_type(return_type, span)?,
        };
        let param_list = std::iter::once("ptr %env".to_string())
            .chain(params.iter().zip(&param_llvm).map(|(p, ty)| format!("{ty} %{}", p.name)))
            .collect::<Vec<_>>()
            .join(", ");

        let saved_body = std::mem::take(&mut self.buffers.body);
        self.buffers.body.line(format!("define internal {ret_llvm} {fn_name}({param_list}) #0 {{"));
        self.buffers.body.line("entry:");
        for (i, (name, local)) in captures.iter().zip(&env_fields).enumerate() {
            let field_ptr = self.fresh.fresh_reg();
            self.buffers.body.instr(format!("{field_ptr} = getelementptr inbounds {env_ty}, ptr %env, i32 0, i32 {i}"));
            self.symbols.define_local(name, crate::codegen::symbols::LocalInfo { llvm_register: field_ptr, llvm_type: local.llvm_type.clone(), semantic_type: local.semantic_type.clone(), lifetime: None });
        }
        for p in params {
            let llvm_ty = self.lower_type(&p.ty, span)?;
            let slot = self.fresh.fresh_reg();
            self.buffers.body.instr(format!("{slot} = alloca {llvm_ty}"));
            self.buffers.body.instr(format!("store {llvm_ty} %{}, ptr {slot}", p.name));
            self.symbols.define_local(&p.name, crate::codegen::symbols::LocalInfo { llvm_register: slot, llvm_type: llvm_ty, semantic_type: p.ty.clone(), lifetime: None });
        }
        let (body_val, _) = self.gen_expr(body)?;
        if ret_llvm == "void" {
            self.buffers.body.instr("ret void");
        } else {
            self.buffers.body.instr(format!("ret {ret_llvm} {body_val}"));
        }
        self.buffers.body.line("}");
        self.buffers.body.blank();
        let closure_body = std::mem::replace(&mut self.buffers.body, saved_body);
        self.buffers.prelude.line(closure_body.as_str().to_string());

        let fat_ptr_ty = "{ ptr, ptr }";
        let agg0 = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{agg0} = insertvalue {fat_ptr_ty} undef, ptr {fn_name}, 0"));
        let agg1 = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{agg1} = insertvalue {fat_ptr_ty} {agg0}, ptr {env_ptr}, 1"));
        Ok((agg1, SemanticType::Pointer(Box::new(SemanticType::Unit))))
    }

    fn gen_cast(&mut self, inner: &Expr, target: &SemanticType, span: Span) -> Result<Value, CodegenError> {
        let (val, from_ty) = self.gen_expr(inner)?;
        let from_llvm = self.lower_type(&from_ty, span)?;
        let to_llvm = self.lower_type(target, span)?;
        if from_llvm == to_llvm {
            return Ok((val, target.clone()));
        }
        let mnemonic = cast_mnemonic(&from_ty, target, &from_llvm, &to_llvm)
            .ok_or_else(|| CodegenError::unsupported(format!("no cast lowering from {from_ty} to {target}"), span))?;
        let reg = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{reg} = {mnemonic} {from_llvm} {val} to {to_llvm}"));
        Ok((reg, target.clone()))
    }

    fn gen_interpolated(&mut self, parts: &[crate::ast::InterpolationPart], span: Span) -> Result<Value, CodegenError> {
        let buf = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{buf} = call ptr @strbuilder_new()"));
        for part in parts {
            match part {
                crate::ast::InterpolationPart::Literal(s) => {
                    let (lit_val, _) = self.gen_string_literal(s)?;
                    self.buffers.body.instr(format!("call void @strbuilder_append(ptr {buf}, ptr {lit_val})"));
                }
                crate::ast::InterpolationPart::Expr(e) => {
                    let (val, ty) = self.gen_expr(e)?;
                    let as_str = self.coerce_to_str(val, &ty, span)?;
                    self.buffers.body.instr(format!("call void @strbuilder_append(ptr {buf}, ptr {as_str})"));
                }
            }
        }
        let result = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{result} = call ptr @strbuilder_finish(ptr {buf})"));
        self.track_string_temp(&result);
        Ok((result, SemanticType::Str))
    }

    fn coerce_to_str(&mut self, val: String, ty: &SemanticType, span: Span) -> Result<String, CodegenError> {
        if matches!(ty, SemanticType::Str) {
            return Ok(val);
        }
        let reg = self.fresh.fresh_reg();
        let runtime_fn = match ty {
            SemanticType::Bool => "bool_to_str",
            t if t.is_float() => "f64_to_str",
            t if t.is_integer() => "i64_to_str",
            _ => return Err(CodegenError::unsupported(format!("cannot interpolate a value of type {ty}"), span)),
        };
        let llvm_ty = self.lower_type(ty, span)?;
        self.buffers.body.instr(format!("{reg} = call ptr @{runtime_fn}({llvm_ty} {val})"));
        self.track_string_temp(&reg);
        Ok(reg)
    }

    fn gen_try(&mut self, inner: &Expr, span: Span) -> Result<Value, CodegenError> {
        let (val, ty) = self.gen_expr(inner)?;
        let mangled = match &ty {
            SemanticType::Named { name, type_args } => crate::codegen::mangle::mangle_name(name, type_args, span)?,
            other => return Err(CodegenError::internal(format!("'!' applied to non-Outcome type {other}"), span)),
        };
        let tag_ptr = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{tag_ptr} = getelementptr inbounds %struct.{mangled}, ptr {val}, i32 0, i32 0"));
        let tag = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{tag} = load i32, ptr {tag_ptr}"));
        let err_tag = self.symbols.enum_variant_tag(&mangled, "Err").unwrap_or(1);
        let is_err = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{is_err} = icmp eq i32 {tag}, {err_tag}"));
        let err_label = self.fresh.fresh_label("try_err");
        let ok_label = self.fresh.fresh_label("try_ok");
        self.buffers.body.instr(format!("br i1 {is_err}, label %{err_label}, label %{ok_label}"));
        self.buffers.body.line(format!("{err_label}:"));
        let ret_ty_str = self.lower_type(&ty, span)?;
        self.buffers.body.instr(format!("ret {} {val}", ret_ty_str));
        self.buffers.body.line(format!("{ok_label}:"));
        let payload_ptr = self.fresh.fresh_reg();
        self.buffers.body.instr(format!("{payload_ptr} = getelementptr inbounds %struct.{mangled}, ptr {val}, i32 0, i32 1"));
        Ok((payload_ptr, SemanticType::Str))
    }

    fn gen_await(&mut self, inner: &Expr, span: Span) -> Result<Value, CodegenError> {
        // Current execution model: every producer is assumed always `Ready`
        // (§4.9, §9) — this degenerates to `block_on`.
        self.dispatch_block_on(inner, span)
    }
}

fn field_semantic_type(symbols: &crate::codegen::symbols::SymbolTables, mangled: &str, field: &str) -> SemanticType {
    symbols
        .struct_field(mangled, field)
        .map(|(_, _, llvm_ty)| llvm_type_guess(llvm_ty))
        .unwrap_or(SemanticType::Unit)
}

/// Best-effort reconstruction of a semantic type from an LLVM type string
/// when only the symbol table's lowered form is on hand (field accesses
/// don't carry the original [`SemanticType`] the way a local's `LocalInfo`
/// does). Good enough for downstream lowering decisions (float vs int vs
/// pointer); loses the exact named-type identity for aggregates.
fn llvm_type_guess(llvm_ty: &str) -> SemanticType {
    match llvm_ty {
        "i1" => SemanticType::Bool,
        "i8" => SemanticType::I8,
        "i16" => SemanticType::I16,
        "i32" => SemanticType::I32,
        "i64" => SemanticType::I64,
        "i128" => SemanticType::I128,
        "float" => SemanticType::F32,
        "double" => SemanticType::F64,
        "ptr" => SemanticType::Str,
        _ => SemanticType::Unit,
    }
}

pub(crate) fn comparison_predicate(op: BinOp, is_float: bool, is_signed: bool) -> Option<&'static str> {
    Some(match (op, is_float) {
        (BinOp::Eq, false) => "eq",
        (BinOp::Ne, false) => "ne",
        (BinOp::Lt, false) => if is_signed { "slt" } else { "ult" },
        (BinOp::Le, false) => if is_signed { "sle" } else { "ule" },
        (BinOp::Gt, false) => if is_signed { "sgt" } else { "ugt" },
        (BinOp::Ge, false) => if is_signed { "sge" } else { "uge" },
        (BinOp::Eq, true) => "oeq",
        (BinOp::Ne, true) => "one",
        (BinOp::Lt, true) => "olt",
        (BinOp::Le, true) => "ole",
        (BinOp::Gt, true) => "ogt",
        (BinOp::Ge, true) => "oge",
        _ => return None,
    })
}

pub(crate) fn arithmetic_mnemonic(op: BinOp, is_float: bool, is_signed: bool) -> Option<&'static str> {
    Some(match (op, is_float) {
        (BinOp::Add, false) => "add",
        (BinOp::Sub, false) => "sub",
        (BinOp::Mul, false) => "mul",
        (BinOp::Div, false) => if is_signed { "sdiv" } else { "udiv" },
        (BinOp::Mod, false) => if is_signed { "srem" } else { "urem" },
        (BinOp::Add, true) => "fadd",
        (BinOp::Sub, true) => "fsub",
        (BinOp::Mul, true) => "fmul",
        (BinOp::Div, true) => "fdiv",
        (BinOp::Mod, true) => "frem",
        (BinOp::BitAnd, false) => "and",
        (BinOp::BitOr, false) => "or",
        (BinOp::BitXor, false) => "xor",
        (BinOp::Shl, false) => "shl",
        (BinOp::Shr, false) => if is_signed { "ashr" } else { "lshr" },
        _ => return None,
    })
}

fn cast_mnemonic(from: &SemanticType, to: &SemanticType, from_llvm: &str, to_llvm: &str) -> Option<&'static str> {
    let from_bits = bit_width(from_llvm);
    let to_bits = bit_width(to_llvm);
    match (from.is_integer(), to.is_integer(), from.is_float(), to.is_float()) {
        (true, true, _, _) => match from_bits.cmp(&to_bits) {
            std::cmp::Ordering::Greater => Some("trunc"),
            std::cmp::Ordering::Less => Some(if from.is_signed() { "sext" } else { "zext" }),
            std::cmp::Ordering::Equal => None,
        },
        (_, _, true, true) => match from_bits.cmp(&to_bits) {
            std::cmp::Ordering::Greater => Some("fptrunc"),
            std::cmp::Ordering::Less => Some("fpext"),
            std::cmp::Ordering::Equal => None,
        },
        (true, _, _, true) => Some(if from.is_signed() { "sitofp" } else { "uitofp" }),
        (_, true, true, _) => Some(if to.is_signed() { "fptosi" } else { "fptoui" }),
        _ if from_llvm == "ptr" && to_bits > 0 => Some("ptrtoint"),
        _ if to_llvm == "ptr" && from_bits > 0 => Some("inttoptr"),
        _ => None,
    }
}

fn bit_width(llvm_ty: &str) -> u32 {
    match llvm_ty {
        "i1" => 1,
        "i8" => 8,
        "i16" => 16,
        "i32" | "float" => 32,
        "i64" | "double" => 64,
        "i128" => 128,
        _ => 0,
    }
}
