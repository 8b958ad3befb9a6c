//! Fresh SSA register, block label, and debug-ID allocation (§4.3).

/// Three monotonically increasing counters. `reg`/`label` reset at function
/// entry (see [`FreshState::reset_for_function`]); `debug_id` does not,
/// since debug metadata is module-scoped.
#[derive(Debug, Default)]
pub struct FreshState {
    reg: u32,
    label: u32,
    debug_id: u32,
}

impl FreshState {
    pub fn new() -> Self {
        FreshState::default()
    }

    /// Returns `%N` with `N` incrementing.
    pub fn fresh_reg(&mut self) -> String {
        let n = self.reg;
        self.reg += 1;
        format!("%{n}")
    }

    /// Returns `prefix_N` with `N` incrementing.
    pub fn fresh_label(&mut self, prefix: &str) -> String {
        let n = self.label;
        self.label += 1;
        format!("{prefix}_{n}")
    }

    /// Returns a module-scoped integer, never reset.
    pub fn fresh_debug_id(&mut self) -> u32 {
        let n = self.debug_id;
        self.debug_id += 1;
        n
    }

    /// Resets the register and label counters at function entry. Debug IDs
    /// are untouched.
    pub fn reset_for_function(&mut self) {
        self.reg = 0;
        self.label = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_reg_increments() {
        let mut fresh = FreshState::new();
        assert_eq!(fresh.fresh_reg(), "%0");
        assert_eq!(fresh.fresh_reg(), "%1");
    }

    #[test]
    fn test_fresh_label_keyed_by_prefix_but_shares_counter() {
        let mut fresh = FreshState::new();
        assert_eq!(fresh.fresh_label("then"), "then_0");
        assert_eq!(fresh.fresh_label("else"), "else_1");
    }

    #[test]
    fn test_reset_for_function_clears_reg_and_label_not_debug_id() {
        let mut fresh = FreshState::new();
        fresh.fresh_reg();
        fresh.fresh_label("l");
        fresh.fresh_debug_id();
        fresh.reset_for_function();
        assert_eq!(fresh.fresh_reg(), "%0");
        assert_eq!(fresh.fresh_label("l"), "l_0");
        assert_eq!(fresh.fresh_debug_id(), 1);
    }
}
