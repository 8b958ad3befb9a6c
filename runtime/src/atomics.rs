//! Typed atomic helpers.
//!
//! The plain `atomic_add`/`atomic_cas`/... intrinsics are inlined by the
//! codegen core directly as `atomicrmw`/`cmpxchg` over the pointee's LLVM
//! type (see the intrinsic dispatcher's "Atomics / fences" category); these
//! `atomic_*_i32`/`atomic_*_i64` variants exist for call sites that want a
//! named, type-erased-at-the-ABI entry point instead (e.g. reflection-driven
//! generic code that cannot select an `atomicrmw` width at codegen time).
//! All operations use `SeqCst` ordering, matching the engine's default.

use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};

#[unsafe(no_mangle)]
pub unsafe extern "C" fn atomic_load_i32(ptr: *const AtomicI32) -> i32 {
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*ptr }.load(Ordering::SeqCst)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn atomic_store_i32(ptr: *const AtomicI32, value: i32) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*ptr }.store(value, Ordering::SeqCst)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn atomic_add_i32(ptr: *const AtomicI32, value: i32) -> i32 {
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*ptr }.fetch_add(value, Ordering::SeqCst)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn atomic_sub_i32(ptr: *const AtomicI32, value: i32) -> i32 {
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*ptr }.fetch_sub(value, Ordering::SeqCst)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn atomic_exchange_i32(ptr: *const AtomicI32, value: i32) -> i32 {
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*ptr }.swap(value, Ordering::SeqCst)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn atomic_cas_i32(ptr: *const AtomicI32, expected: i32, new: i32) -> bool {
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*ptr }
        .compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn atomic_load_i64(ptr: *const AtomicI64) -> i64 {
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*ptr }.load(Ordering::SeqCst)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn atomic_store_i64(ptr: *const AtomicI64, value: i64) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*ptr }.store(value, Ordering::SeqCst)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn atomic_add_i64(ptr: *const AtomicI64, value: i64) -> i64 {
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*ptr }.fetch_add(value, Ordering::SeqCst)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn atomic_sub_i64(ptr: *const AtomicI64, value: i64) -> i64 {
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*ptr }.fetch_sub(value, Ordering::SeqCst)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn atomic_exchange_i64(ptr: *const AtomicI64, value: i64) -> i64 {
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*ptr }.swap(value, Ordering::SeqCst)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn atomic_cas_i64(ptr: *const AtomicI64, expected: i64, new: i64) -> bool {
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*ptr }
        .compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i32_roundtrip() {
        let a = AtomicI32::new(0);
        unsafe { atomic_store_i32(&a, 5) };
        assert_eq!(unsafe { atomic_load_i32(&a) }, 5);
        assert_eq!(unsafe { atomic_add_i32(&a, 3) }, 5);
        assert_eq!(unsafe { atomic_load_i32(&a) }, 8);
    }

    #[test]
    fn test_i64_cas() {
        let a = AtomicI64::new(10);
        assert!(unsafe { atomic_cas_i64(&a, 10, 20) });
        assert!(!unsafe { atomic_cas_i64(&a, 10, 30) });
        assert_eq!(unsafe { atomic_load_i64(&a) }, 20);
    }
}
