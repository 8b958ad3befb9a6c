//! Minimal JSON parsing backing `@derive(Deserialize)` bodies.
//!
//! The derive engine emits calls to `json_parse` followed by a sequence of
//! `json_get_*` lookups keyed by field name; this module implements just
//! enough of JSON to support that access pattern (objects, strings, bools,
//! numbers) via `serde_json::Value`, which is already in this workspace's
//! dependency graph for diagnostic JSON rendering.

use serde_json::Value;
use std::ffi::CString;
use std::os::raw::c_char;

/// Parses a JSON document, returning an opaque handle on success or null on
/// a parse error.
///
/// # Safety
/// `s` must be a valid null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn json_parse(s: *const c_char) -> *mut Value {
    if s.is_null() {
        return std::ptr::null_mut();
    }
    // SAFETY: forwarded from the caller's contract.
    let s = unsafe { std::ffi::CStr::from_ptr(s) };
    let Ok(s) = s.to_str() else {
        return std::ptr::null_mut();
    };
    match serde_json::from_str::<Value>(s) {
        Ok(v) => Box::into_raw(Box::new(v)),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Frees a handle returned by [`json_parse`].
///
/// # Safety
/// `value` must be a live handle from [`json_parse`] not already freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn json_free(value: *mut Value) {
    if !value.is_null() {
        // SAFETY: forwarded from the caller's contract.
        drop(unsafe { Box::from_raw(value) });
    }
}

/// # Safety
/// `field` must be a valid null-terminated C string; `value` may be null.
unsafe fn field_name<'a>(field: *const c_char) -> Option<&'a str> {
    if field.is_null() {
        return None;
    }
    // SAFETY: forwarded from the caller's contract.
    unsafe { std::ffi::CStr::from_ptr(field) }.to_str().ok()
}

/// Looks up a string field, returning an owned `Str` and setting `*out_ok`.
/// On a missing field, wrong type, or null handle, returns the empty
/// string and sets `*out_ok` to false.
///
/// # Safety
/// `value` must be null or a live handle from [`json_parse`]; `field` must
/// be a valid null-terminated C string; `out_ok` must point to valid `bool`
/// storage.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn json_get_string(
    value: *const Value,
    field: *const c_char,
    out_ok: *mut bool,
) -> *mut c_char {
    // SAFETY: forwarded from the caller's contract.
    let found = unsafe { lookup(value, field) }
        .and_then(|v| v.as_str())
        .map(str::to_string);
    // SAFETY: caller-provided valid out pointer.
    unsafe { *out_ok = found.is_some() };
    CString::new(found.unwrap_or_default()).unwrap_or_default().into_raw()
}

/// # Safety
/// See [`json_get_string`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn json_get_bool(
    value: *const Value,
    field: *const c_char,
    out_ok: *mut bool,
) -> bool {
    // SAFETY: forwarded from the caller's contract.
    let found = unsafe { lookup(value, field) }.and_then(|v| v.as_bool());
    // SAFETY: caller-provided valid out pointer.
    unsafe { *out_ok = found.is_some() };
    found.unwrap_or(false)
}

/// # Safety
/// See [`json_get_string`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn json_get_i64(
    value: *const Value,
    field: *const c_char,
    out_ok: *mut bool,
) -> i64 {
    // SAFETY: forwarded from the caller's contract.
    let found = unsafe { lookup(value, field) }.and_then(|v| v.as_i64());
    // SAFETY: caller-provided valid out pointer.
    unsafe { *out_ok = found.is_some() };
    found.unwrap_or(0)
}

/// # Safety
/// See [`json_get_string`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn json_get_f64(
    value: *const Value,
    field: *const c_char,
    out_ok: *mut bool,
) -> f64 {
    // SAFETY: forwarded from the caller's contract.
    let found = unsafe { lookup(value, field) }.and_then(|v| v.as_f64());
    // SAFETY: caller-provided valid out pointer.
    unsafe { *out_ok = found.is_some() };
    found.unwrap_or(0.0)
}

/// # Safety
/// `value` must be null or a live handle from [`json_parse`]; `field` must
/// be a valid null-terminated C string.
unsafe fn lookup<'a>(value: *const Value, field: *const c_char) -> Option<&'a Value> {
    if value.is_null() {
        return None;
    }
    // SAFETY: forwarded from the caller's contract.
    let value = unsafe { &*value };
    // SAFETY: forwarded from the caller's contract.
    let name = unsafe { field_name(field) }?;
    value.as_object()?.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_parse_and_fields() {
        let doc = CString::new(r#"{"x": 1, "name": "a", "ok": true, "pi": 3.5}"#).unwrap();
        let handle = unsafe { json_parse(doc.as_ptr()) };
        assert!(!handle.is_null());

        let mut ok = false;
        let x = unsafe { json_get_i64(handle, CString::new("x").unwrap().as_ptr(), &mut ok) };
        assert!(ok);
        assert_eq!(x, 1);

        let name_field = CString::new("name").unwrap();
        let mut ok2 = false;
        let name_ptr = unsafe { json_get_string(handle, name_field.as_ptr(), &mut ok2) };
        assert!(ok2);
        let name = unsafe { std::ffi::CStr::from_ptr(name_ptr) }.to_str().unwrap();
        assert_eq!(name, "a");
        unsafe { crate::tml_str_free(name_ptr) };

        unsafe { json_free(handle) };
    }

    #[test]
    fn test_missing_field_reports_not_ok() {
        let doc = CString::new("{}").unwrap();
        let handle = unsafe { json_parse(doc.as_ptr()) };
        let mut ok = true;
        let v = unsafe { json_get_i64(handle, CString::new("missing").unwrap().as_ptr(), &mut ok) };
        assert!(!ok);
        assert_eq!(v, 0);
        unsafe { json_free(handle) };
    }

    #[test]
    fn test_malformed_json_returns_null() {
        let doc = CString::new("{not json").unwrap();
        assert!(unsafe { json_parse(doc.as_ptr()) }.is_null());
    }
}
