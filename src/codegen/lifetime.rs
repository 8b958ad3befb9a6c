//! String-temporary lifetime tracking (§4.9).
//!
//! Every runtime call that returns a freshly heap-allocated `Str` (string
//! concatenation, interpolation, `to_string`-family derive methods, the
//! numeric/bool `*_to_str` conversions) registers its result register here.
//! A `let` binding that consumes such a value takes ownership of it —
//! removing it from the pending list, since the local now owns the
//! lifetime. Anything still pending at a statement or scope boundary is
//! freed via `tml_str_free`, mirroring the teacher's statement-boundary
//! cleanup pass but generalized from "drop locals" to "drop unclaimed
//! temporaries".

impl super::CodegenContext {
    /// Registers `reg` as a heap string temporary with no owner yet.
    pub(super) fn track_string_temp(&mut self, reg: &str) {
        if self.function.suppress_lifetime_tracking {
            return;
        }
        self.function.pending_string_frees.push(reg.to_string());
    }

    /// Removes `reg` from the pending-free list: a `let` binding (or other
    /// longer-lived container) has taken ownership of it.
    pub(super) fn take_ownership(&mut self, reg: &str) {
        self.function.pending_string_frees.retain(|r| r != reg);
    }

    /// Frees every still-pending string temporary at the current statement
    /// or scope boundary.
    pub(super) fn drain_pending_string_frees(&mut self) {
        if self.function.suppress_lifetime_tracking {
            return;
        }
        let pending = std::mem::take(&mut self.function.pending_string_frees);
        for reg in pending {
            self.buffers.body.instr(format!("call void @tml_str_free(ptr {reg})"));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::options::Options;
    use crate::codegen::CodegenContext;

    #[test]
    fn test_take_ownership_removes_from_pending_list() {
        let mut ctx = CodegenContext::new(Options::default());
        ctx.track_string_temp("%3");
        ctx.track_string_temp("%4");
        ctx.take_ownership("%3");
        assert_eq!(ctx.function.pending_string_frees, vec!["%4".to_string()]);
    }

    #[test]
    fn test_drain_emits_free_and_clears_list() {
        let mut ctx = CodegenContext::new(Options::default());
        ctx.track_string_temp("%1");
        ctx.drain_pending_string_frees();
        assert!(ctx.buffers.body.as_str().contains("call void @tml_str_free(ptr %1)"));
        assert!(ctx.function.pending_string_frees.is_empty());
    }

    #[test]
    fn test_suppressed_tracking_skips_both_track_and_drain() {
        let mut ctx = CodegenContext::new(Options::default());
        ctx.function.suppress_lifetime_tracking = true;
        ctx.track_string_temp("%1");
        assert!(ctx.function.pending_string_frees.is_empty());
        ctx.function.pending_string_frees.push("%1".to_string());
        ctx.drain_pending_string_frees();
        assert!(ctx.buffers.body.is_empty());
    }
}
