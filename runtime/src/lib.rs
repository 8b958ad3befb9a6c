//! tml runtime library.
//!
//! Provides the C-ABI runtime functions that code emitted by `tmlc` calls
//! into: string/char primitives, number formatting, time, atomics, JSON
//! parsing for `Deserialize`, and panic/print. This library is compiled as
//! a static library (`staticlib`) and linked with the object code emitted
//! by the codegen core to produce a final executable, and as an `rlib` so
//! its behavior can be unit tested directly.
//!
//! # ABI
//!
//! Every exported function uses the C calling convention (`extern "C"`) so
//! that LLVM-generated `call` instructions can resolve them by name. Names
//! match the runtime symbol list in the codegen core's specification
//! verbatim; the engine never mangles a call to one of these.

mod atomics;
mod chars;
mod control;
mod json;
mod numbers;
mod strbuilder;
mod strings;
mod time;

pub use atomics::*;
pub use chars::*;
pub use control::*;
pub use json::*;
pub use numbers::*;
pub use strbuilder::*;
pub use strings::*;
pub use time::*;

/// Converts a nullable C string pointer to `Option<&CStr>`.
///
/// # Safety
///
/// If `ptr` is non-null, it must point to a valid null-terminated C string.
unsafe fn cstr_from_nullable_ptr<'a>(ptr: *const std::os::raw::c_char) -> Option<&'a std::ffi::CStr> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: forwarded from the caller's contract.
    Some(unsafe { std::ffi::CStr::from_ptr(ptr) })
}

fn cstr_to_lossy_str(c_str: &std::ffi::CStr) -> String {
    c_str.to_string_lossy().into_owned()
}
