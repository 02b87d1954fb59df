//! Panic-to-error boundary around caller-supplied entry code.
//!
//! The entry factory and the `set_value` / `set_frequency` hooks belong to
//! the caller. Engines invoke them only through [`call_entry_hook`], before
//! any list or bucket relinking, so a panic there surfaces as
//! [`CacheError::CallerPanic`] and leaves the structure untouched. Entry
//! state written by an earlier hook in the same call is not rolled back.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::CacheError;

/// Runs `f`, converting a panic into [`CacheError::CallerPanic`].
pub(crate) fn call_entry_hook<R>(
    operation: &'static str,
    f: impl FnOnce() -> R,
) -> Result<R, CacheError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::warn!(operation, %message, "entry hook panicked; call rejected");
        CacheError::CallerPanic { operation, message }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_normal_results() {
        assert_eq!(call_entry_hook("construct", || 41 + 1), Ok(42));
    }

    #[test]
    fn converts_str_panic() {
        let err = call_entry_hook("construct", || -> u8 { panic!("bad entry") }).unwrap_err();
        assert_eq!(
            err,
            CacheError::CallerPanic {
                operation: "construct",
                message: "bad entry".to_string(),
            }
        );
    }

    #[test]
    fn converts_formatted_panic() {
        let key = "k1";
        let err = call_entry_hook("set_value", || panic!("rejected {key}")).unwrap_err();
        assert_eq!(
            err,
            CacheError::CallerPanic {
                operation: "set_value",
                message: "rejected k1".to_string(),
            }
        );
    }

    #[test]
    fn converts_opaque_payload() {
        let err = call_entry_hook("set_frequency", || std::panic::panic_any(7u32)).unwrap_err();
        assert!(matches!(
            err,
            CacheError::CallerPanic { operation: "set_frequency", ref message }
                if message == "non-string panic payload"
        ));
    }
}
