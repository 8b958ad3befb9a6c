//! String primitives backing the `Str` built-ins and `+` lowering.
//!
//! Strings crossing the C ABI are null-terminated UTF-8 buffers. Functions
//! that return a freshly allocated string return a pointer obtained from
//! `CString::into_raw`; the codegen core tracks such pointers as string
//! temporaries and frees them via [`tml_str_free`] once their owning
//! statement or binding goes out of scope.

use crate::{cstr_from_nullable_ptr, cstr_to_lossy_str};
use std::cmp::Ordering;
use std::ffi::CString;
use std::os::raw::c_char;

fn alloc_cstring(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c) => c.into_raw(),
        // Embedded NUL: truncate at the first NUL byte rather than fail,
        // since no caller in the emitted IR is prepared to handle an error.
        Err(e) => {
            let bytes = e.into_vec();
            let nul_at = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            CString::new(&bytes[..nul_at]).unwrap().into_raw()
        }
    }
}

/// # Safety
/// `s` must be a valid null-terminated C string, or null.
unsafe fn borrow_str<'a>(s: *const c_char) -> &'a str {
    // SAFETY: forwarded from the caller's contract.
    match unsafe { cstr_from_nullable_ptr(s) } {
        Some(c) => match c.to_str() {
            Ok(s) => s,
            Err(_) => "",
        },
        None => "",
    }
}

/// Returns the byte length of a string.
///
/// # Safety
/// `s` must be a valid null-terminated C string, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_len(s: *const c_char) -> i64 {
    // SAFETY: forwarded.
    unsafe { borrow_str(s) }.len() as i64
}

/// Byte-for-byte string equality, used by the derive(PartialEq) path for
/// string fields and by the `assert_eq` intrinsic on pointer operands.
///
/// # Safety
/// `a` and `b` must be valid null-terminated C strings, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_eq(a: *const c_char, b: *const c_char) -> bool {
    if a == b {
        return true;
    }
    // SAFETY: forwarded.
    let (a, b) = unsafe { (cstr_from_nullable_ptr(a), cstr_from_nullable_ptr(b)) };
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        (None, None) => true,
        _ => false,
    }
}

/// Lexicographic three-way comparison used by `FromStr`'s runtime `strcmp`
/// dispatch over enum variant names.
///
/// # Safety
/// `a` and `b` must be valid null-terminated C strings, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_cmp(a: *const c_char, b: *const c_char) -> i32 {
    if a == b {
        return 0;
    }
    // SAFETY: forwarded.
    let (a, b) = unsafe { (cstr_from_nullable_ptr(a), cstr_from_nullable_ptr(b)) };
    match (a, b) {
        (None, None) => 0,
        (None, Some(_)) => -1,
        (Some(_), None) => 1,
        (Some(a), Some(b)) => match a.cmp(b) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        },
    }
}

/// FNV-1a hash over a string's bytes, used by the `Hash` derive and by the
/// `type_id[T]` intrinsic over a type's mangled name.
///
/// # Safety
/// `s` must be a valid null-terminated C string, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_hash(s: *const c_char) -> i64 {
    // SAFETY: forwarded.
    fnv1a(unsafe { borrow_str(s) }.as_bytes()) as i64
}

pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Concatenates two strings, allocating a fresh buffer.
///
/// Used to lower `Str + Str`. Unlike [`str_concat_opt`], neither operand
/// may be absent; this is the strict two-operand form.
///
/// # Safety
/// `a` and `b` must be valid null-terminated C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_concat(a: *const c_char, b: *const c_char) -> *mut c_char {
    // SAFETY: forwarded.
    let (a, b) = unsafe { (borrow_str(a), borrow_str(b)) };
    alloc_cstring(format!("{a}{b}"))
}

/// Concatenates a string accumulator with an optional next piece, returning
/// a fresh buffer. A null `next` is treated as the empty string; this is
/// the primitive the derive engine's Debug/Display/Serialize bodies chain
/// together one field at a time.
///
/// # Safety
/// `acc` must be a valid null-terminated C string; `next` may be null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_concat_opt(acc: *const c_char, next: *const c_char) -> *mut c_char {
    // SAFETY: forwarded.
    let acc = unsafe { borrow_str(acc) };
    // SAFETY: forwarded.
    let next = unsafe { borrow_str(next) };
    alloc_cstring(format!("{acc}{next}"))
}

/// Returns a new string containing the half-open byte range `[start, end)`.
/// Out-of-range or inverted bounds clamp to the empty string rather than
/// panicking, since the compiled language's bounds checks run before this
/// is reached.
///
/// # Safety
/// `s` must be a valid null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_slice(s: *const c_char, start: i64, end: i64) -> *mut c_char {
    // SAFETY: forwarded.
    let s = unsafe { borrow_str(s) };
    let len = s.len() as i64;
    let start = start.clamp(0, len) as usize;
    let end = end.clamp(start as i64, len) as usize;
    alloc_cstring(s[start..end].to_string())
}

/// Alias for [`str_slice`] kept for call sites that spell the built-in
/// `substring(s, start, end)`.
///
/// # Safety
/// `s` must be a valid null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_substring(s: *const c_char, start: i64, end: i64) -> *mut c_char {
    // SAFETY: forwarded.
    unsafe { str_slice(s, start, end) }
}

/// Reports whether `haystack` contains `needle` as a substring.
///
/// # Safety
/// Both arguments must be valid null-terminated C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_contains(haystack: *const c_char, needle: *const c_char) -> bool {
    // SAFETY: forwarded.
    unsafe { borrow_str(haystack) }.contains(unsafe { borrow_str(needle) })
}

/// # Safety
/// Both arguments must be valid null-terminated C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_starts_with(s: *const c_char, prefix: *const c_char) -> bool {
    // SAFETY: forwarded.
    unsafe { borrow_str(s) }.starts_with(unsafe { borrow_str(prefix) })
}

/// # Safety
/// Both arguments must be valid null-terminated C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_ends_with(s: *const c_char, suffix: *const c_char) -> bool {
    // SAFETY: forwarded.
    unsafe { borrow_str(s) }.ends_with(unsafe { borrow_str(suffix) })
}

/// # Safety
/// `s` must be a valid null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_to_upper(s: *const c_char) -> *mut c_char {
    // SAFETY: forwarded.
    alloc_cstring(unsafe { borrow_str(s) }.to_uppercase())
}

/// # Safety
/// `s` must be a valid null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_to_lower(s: *const c_char) -> *mut c_char {
    // SAFETY: forwarded.
    alloc_cstring(unsafe { borrow_str(s) }.to_lowercase())
}

/// # Safety
/// `s` must be a valid null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_trim(s: *const c_char) -> *mut c_char {
    // SAFETY: forwarded.
    alloc_cstring(unsafe { borrow_str(s) }.trim().to_string())
}

/// Returns the Unicode scalar at the given UTF-8 byte-adjusted character
/// index, or `'\0'` when out of range.
///
/// # Safety
/// `s` must be a valid null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_char_at(s: *const c_char, index: i64) -> u32 {
    // SAFETY: forwarded.
    let s = unsafe { borrow_str(s) };
    if index < 0 {
        return 0;
    }
    s.chars().nth(index as usize).map(|c| c as u32).unwrap_or(0)
}

/// Validates and frees a heap string temporary produced by interpolation,
/// concatenation, or an `@allocates` call. Accepts non-heap pointers
/// (including null) as a no-op, matching the codegen core's lifetime
/// tracking contract: every register in the pending-free list is passed
/// here unconditionally at statement boundaries.
///
/// # Safety
/// If non-null, `s` must have been produced by one of this module's
/// allocating functions (i.e. via `CString::into_raw`) and not already freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tml_str_free(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    // SAFETY: forwarded from the caller's contract.
    drop(unsafe { CString::from_raw(s) });
}

/// Parses a signed 64-bit integer from a string, used by generated `Str`
/// number-conversion built-ins.
///
/// # Safety
/// `s` must be a valid null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_to_i64(s: *const c_char, out_ok: *mut bool) -> i64 {
    // SAFETY: forwarded.
    let s = unsafe { borrow_str(s) };
    match s.trim().parse::<i64>() {
        Ok(v) => {
            if !out_ok.is_null() {
                // SAFETY: caller-provided valid out pointer.
                unsafe { *out_ok = true };
            }
            v
        }
        Err(_) => {
            if !out_ok.is_null() {
                // SAFETY: caller-provided valid out pointer.
                unsafe { *out_ok = false };
            }
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn cs(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    #[test]
    fn test_len_and_eq() {
        let a = cs("hello");
        assert_eq!(unsafe { str_len(a.as_ptr()) }, 5);
        let b = cs("hello");
        assert!(unsafe { str_eq(a.as_ptr(), b.as_ptr()) });
    }

    #[test]
    fn test_concat_opt_roundtrip() {
        let acc = cs("a=");
        let next = cs("1");
        let ptr = unsafe { str_concat_opt(acc.as_ptr(), next.as_ptr()) };
        let got = unsafe { borrow_str(ptr) }.to_string();
        assert_eq!(got, "a=1");
        unsafe { tml_str_free(ptr) };
    }

    #[test]
    fn test_concat_opt_null_next() {
        let acc = cs("only");
        let ptr = unsafe { str_concat_opt(acc.as_ptr(), std::ptr::null()) };
        assert_eq!(unsafe { borrow_str(ptr) }, "only");
        unsafe { tml_str_free(ptr) };
    }

    #[test]
    fn test_slice_clamps() {
        let s = cs("hello");
        let ptr = unsafe { str_slice(s.as_ptr(), -5, 2) };
        assert_eq!(unsafe { borrow_str(ptr) }, "he");
        unsafe { tml_str_free(ptr) };

        let ptr = unsafe { str_slice(s.as_ptr(), 10, 20) };
        assert_eq!(unsafe { borrow_str(ptr) }, "");
        unsafe { tml_str_free(ptr) };
    }

    #[test]
    fn test_contains_prefix_suffix() {
        let s = cs("hello world");
        assert!(unsafe { str_contains(s.as_ptr(), cs("lo wo").as_ptr()) });
        assert!(unsafe { str_starts_with(s.as_ptr(), cs("hello").as_ptr()) });
        assert!(unsafe { str_ends_with(s.as_ptr(), cs("world").as_ptr()) });
    }

    #[test]
    fn test_free_null_is_noop() {
        unsafe { tml_str_free(std::ptr::null_mut()) };
    }

    #[test]
    fn test_fnv1a_stable() {
        assert_eq!(fnv1a(b"abc"), fnv1a(b"abc"));
        assert_ne!(fnv1a(b"abc"), fnv1a(b"abd"));
    }
}
