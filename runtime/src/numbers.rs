//! Number-to-string conversion built-ins.

use std::ffi::CString;
use std::os::raw::c_char;

fn alloc(s: String) -> *mut c_char {
    CString::new(s).expect("formatted numbers never contain NUL").into_raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn i64_to_string(value: i64) -> *mut c_char {
    alloc(value.to_string())
}

#[unsafe(no_mangle)]
pub extern "C" fn i32_to_string(value: i32) -> *mut c_char {
    alloc(value.to_string())
}

#[unsafe(no_mangle)]
pub extern "C" fn f64_to_str(value: f64) -> *mut c_char {
    alloc(format_f64(value))
}

#[unsafe(no_mangle)]
pub extern "C" fn bool_to_str(value: bool) -> *mut c_char {
    alloc(if value { "true" } else { "false" }.to_string())
}

/// Mirrors the source language's float rendering: integral values print
/// with one decimal digit (`1.0`, not `1`), matching the Debug/Display
/// derive's expectation that every numeric field round-trips through
/// `to_string`/`from_str`.
fn format_f64(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    fn read(ptr: *mut c_char) -> String {
        let s = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
        unsafe { drop(CString::from_raw(ptr)) };
        s
    }

    #[test]
    fn test_i64_to_string() {
        assert_eq!(read(i64_to_string(-42)), "-42");
    }

    #[test]
    fn test_f64_integral_renders_with_decimal() {
        assert_eq!(read(f64_to_str(3.0)), "3.0");
        assert_eq!(read(f64_to_str(3.5)), "3.5");
    }

    #[test]
    fn test_f64_special_values() {
        assert_eq!(read(f64_to_str(f64::NAN)), "NaN");
        assert_eq!(read(f64_to_str(f64::INFINITY)), "inf");
    }

    #[test]
    fn test_bool_to_str() {
        assert_eq!(read(bool_to_str(true)), "true");
        assert_eq!(read(bool_to_str(false)), "false");
    }
}
