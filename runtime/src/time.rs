//! Time and sleep built-ins, plus the `Instant`/`Duration` opaque types.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

fn since_epoch() -> Duration {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

#[unsafe(no_mangle)]
pub extern "C" fn time_ms() -> i64 {
    since_epoch().as_millis() as i64
}

#[unsafe(no_mangle)]
pub extern "C" fn time_us() -> i64 {
    since_epoch().as_micros() as i64
}

#[unsafe(no_mangle)]
pub extern "C" fn time_ns() -> i64 {
    since_epoch().as_nanos() as i64
}

#[unsafe(no_mangle)]
pub extern "C" fn sleep_ms(ms: i64) {
    if ms > 0 {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn sleep_us(us: i64) {
    if us > 0 {
        std::thread::sleep(Duration::from_micros(us as u64));
    }
}

/// Returns an opaque handle to a monotonic timestamp taken now.
///
/// The handle is a heap-boxed `Instant` passed back to the emitted IR as a
/// `ptr`; `instant_elapsed` consumes it.
#[unsafe(no_mangle)]
pub extern "C" fn instant_now() -> *mut Instant {
    Box::into_raw(Box::new(Instant::now()))
}

/// Returns nanoseconds elapsed since `instant` without consuming the handle.
///
/// # Safety
/// `instant` must be a live handle from [`instant_now`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn instant_elapsed(instant: *const Instant) -> i64 {
    if instant.is_null() {
        return 0;
    }
    // SAFETY: forwarded from the caller's contract.
    unsafe { &*instant }.elapsed().as_nanos() as i64
}

/// Frees an `Instant` handle.
///
/// # Safety
/// `instant` must be a live handle from [`instant_now`] not already freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn instant_free(instant: *mut Instant) {
    if !instant.is_null() {
        // SAFETY: forwarded from the caller's contract.
        drop(unsafe { Box::from_raw(instant) });
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn duration_from_millis(ms: i64) -> i64 {
    ms.saturating_mul(1_000_000)
}

#[unsafe(no_mangle)]
pub extern "C" fn duration_from_secs(secs: i64) -> i64 {
    secs.saturating_mul(1_000_000_000)
}

#[unsafe(no_mangle)]
pub extern "C" fn duration_as_millis(nanos: i64) -> i64 {
    nanos / 1_000_000
}

#[unsafe(no_mangle)]
pub extern "C" fn duration_as_secs(nanos: i64) -> i64 {
    nanos / 1_000_000_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_ms_is_plausible() {
        assert!(time_ms() > 1_600_000_000_000);
    }

    #[test]
    fn test_instant_roundtrip() {
        let h = instant_now();
        let elapsed = unsafe { instant_elapsed(h) };
        assert!(elapsed >= 0);
        unsafe { instant_free(h) };
    }

    #[test]
    fn test_duration_conversions() {
        assert_eq!(duration_from_millis(5), 5_000_000);
        assert_eq!(duration_as_secs(3_000_000_000), 3);
    }
}
