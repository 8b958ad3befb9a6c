//! `StringBuilder` runtime support.
//!
//! Backs the source language's `StringBuilder` type with a boxed `String`
//! behind an opaque pointer, handed to emitted IR as a `ptr`. Every
//! `strbuilder_*` call takes and returns that pointer; `strbuilder_finish`
//! consumes it and returns an owned `Str` (tracked as a string temporary by
//! the codegen core, exactly like `str_concat_opt`'s result).

use std::ffi::CString;
use std::os::raw::c_char;

/// Allocates an empty builder and returns an opaque handle to it.
#[unsafe(no_mangle)]
pub extern "C" fn strbuilder_new() -> *mut String {
    Box::into_raw(Box::new(String::new()))
}

/// Appends a string slice to the builder.
///
/// # Safety
/// `builder` must be a live handle from [`strbuilder_new`]; `s` must be a
/// valid null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn strbuilder_append(builder: *mut String, s: *const c_char) {
    if builder.is_null() || s.is_null() {
        return;
    }
    // SAFETY: forwarded from the caller's contract.
    let builder = unsafe { &mut *builder };
    // SAFETY: forwarded from the caller's contract.
    let s = unsafe { std::ffi::CStr::from_ptr(s) };
    builder.push_str(&s.to_string_lossy());
}

/// Returns the builder's current length in bytes.
///
/// # Safety
/// `builder` must be a live handle from [`strbuilder_new`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn strbuilder_len(builder: *const String) -> i64 {
    if builder.is_null() {
        return 0;
    }
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*builder }.len() as i64
}

/// Consumes the builder, freeing its handle, and returns an owned `Str`.
///
/// # Safety
/// `builder` must be a live handle from [`strbuilder_new`] that has not
/// already been finished or freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn strbuilder_finish(builder: *mut String) -> *mut c_char {
    if builder.is_null() {
        return CString::new("").unwrap().into_raw();
    }
    // SAFETY: forwarded from the caller's contract; `builder` is not used again.
    let owned = *unsafe { Box::from_raw(builder) };
    CString::new(owned).unwrap_or_default().into_raw()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_finish() {
        let b = strbuilder_new();
        let a = CString::new("ab").unwrap();
        let c = CString::new("cd").unwrap();
        unsafe { strbuilder_append(b, a.as_ptr()) };
        unsafe { strbuilder_append(b, c.as_ptr()) };
        assert_eq!(unsafe { strbuilder_len(b) }, 4);
        let out = unsafe { strbuilder_finish(b) };
        let s = unsafe { std::ffi::CStr::from_ptr(out) }.to_str().unwrap().to_string();
        assert_eq!(s, "abcd");
        unsafe { drop(CString::from_raw(out)) };
    }
}
