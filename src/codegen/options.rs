//! Driver-facing configuration (§6).

use serde::{Deserialize, Serialize};

/// Constructed once per [`crate::codegen::CodegenContext`]; every field
/// corresponds to a row in §6's options table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    /// Attach DI scopes and location metadata.
    pub emit_debug_info: bool,
    /// 0 = off; 1 = functions and statements; 2 = plus parameters; 3 = plus
    /// every local.
    pub debug_level: u8,
    /// Inject `tml_cover_func` at function entry.
    pub coverage_enabled: bool,
    /// Annotate public functions with `dllexport`.
    pub dll_export: bool,
    /// Test-suite mode: every function internal; suite prefix enabled.
    pub force_internal_linkage: bool,
    /// When `Some` and `force_internal_linkage` is set, used as the `sN_`
    /// prefix for derived-method names and test-local types.
    pub suite_test_index: Option<u32>,
}

impl Options {
    pub fn suite_prefix(&self) -> Option<String> {
        if self.force_internal_linkage {
            self.suite_test_index.map(|n| format!("s{n}_"))
        } else {
            None
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            emit_debug_info: false,
            debug_level: 0,
            coverage_enabled: false,
            dll_export: false,
            force_internal_linkage: false,
            suite_test_index: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_inert() {
        let options = Options::default();
        assert_eq!(options.suite_prefix(), None);
        assert!(!options.emit_debug_info);
    }

    #[test]
    fn test_suite_prefix_requires_both_fields() {
        let mut options = Options { force_internal_linkage: true, suite_test_index: Some(3), ..Options::default() };
        assert_eq!(options.suite_prefix(), Some("s3_".to_string()));

        options.force_internal_linkage = false;
        assert_eq!(options.suite_prefix(), None);
    }

    #[test]
    fn test_options_round_trip_json() {
        let options = Options::default();
        let json = serde_json::to_string(&options).unwrap();
        let back: Options = serde_json::from_str(&json).unwrap();
        assert_eq!(back.debug_level, options.debug_level);
    }
}
