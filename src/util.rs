//! Shared utility functions

use anyhow::{anyhow, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run `f`, turning a panic into an error so one misbehaving handler, task
/// body or render pass cannot take the loop down with it.
pub fn guarded<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Safely truncate a string to at most `max_bytes` while respecting UTF-8 boundaries.
pub fn truncate_utf8_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[test]
    fn test_guarded_passes_results_through() {
        assert_eq!(guarded(|| Ok(7)).unwrap(), 7);
        let err = guarded::<()>(|| bail!("nope")).unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn test_guarded_converts_panics() {
        let err = guarded::<()>(|| panic!("boom")).unwrap_err();
        assert!(err.to_string().contains("boom"));

        let owned = guarded::<()>(|| panic!("{} {}", "formatted", 42)).unwrap_err();
        assert!(owned.to_string().contains("formatted 42"));
    }

    #[test]
    fn test_truncate_at_utf8_boundary() {
        assert_eq!(truncate_utf8_safe("hello world", 5), "hello");
        let s = "日本語";
        assert_eq!(truncate_utf8_safe(s, 4), "日");
    }
}
