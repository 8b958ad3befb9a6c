//! Character classification and case-conversion built-ins (`char_is_*`, `char_to_*`).
//!
//! Characters cross the ABI as `u32` Unicode scalar values (the engine's
//! lowering for a `Char` primitive is `i32`; the runtime treats it as
//! unsigned for classification purposes).

fn to_char(c: u32) -> Option<char> {
    char::from_u32(c)
}

macro_rules! define_char_predicate {
    ($($fn_name:ident => $method:ident),* $(,)?) => {
        $(
            #[unsafe(no_mangle)]
            pub extern "C" fn $fn_name(c: u32) -> bool {
                to_char(c).is_some_and(|c| c.$method())
            }
        )*
    };
}

define_char_predicate!(
    char_is_alpha => is_alphabetic,
    char_is_digit => is_ascii_digit,
    char_is_alphanumeric => is_alphanumeric,
    char_is_whitespace => is_whitespace,
    char_is_upper => is_uppercase,
    char_is_lower => is_lowercase,
    char_is_punctuation => is_ascii_punctuation,
);

/// # Returns
/// The uppercase mapping of `c`, or `c` unchanged if it has none / is invalid.
#[unsafe(no_mangle)]
pub extern "C" fn char_to_upper(c: u32) -> u32 {
    to_char(c)
        .and_then(|c| c.to_uppercase().next())
        .map(|c| c as u32)
        .unwrap_or(c)
}

/// # Returns
/// The lowercase mapping of `c`, or `c` unchanged if it has none / is invalid.
#[unsafe(no_mangle)]
pub extern "C" fn char_to_lower(c: u32) -> u32 {
    to_char(c)
        .and_then(|c| c.to_lowercase().next())
        .map(|c| c as u32)
        .unwrap_or(c)
}

/// Converts an ASCII digit character to its numeric value, or `-1` if `c`
/// is not a decimal digit.
#[unsafe(no_mangle)]
pub extern "C" fn char_to_digit(c: u32) -> i32 {
    to_char(c)
        .and_then(|c| c.to_digit(10))
        .map(|d| d as i32)
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(char_is_alpha('a' as u32));
        assert!(char_is_digit('9' as u32));
        assert!(char_is_whitespace(' ' as u32));
        assert!(!char_is_alpha('9' as u32));
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(char_to_upper('a' as u32), 'A' as u32);
        assert_eq!(char_to_lower('A' as u32), 'a' as u32);
        assert_eq!(char_to_upper('5' as u32), '5' as u32);
    }

    #[test]
    fn test_to_digit() {
        assert_eq!(char_to_digit('7' as u32), 7);
        assert_eq!(char_to_digit('x' as u32), -1);
    }

    #[test]
    fn test_invalid_scalar_is_inert() {
        assert!(!char_is_alpha(0xFFFF_FFFF));
    }
}
