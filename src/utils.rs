//! Small shared helpers

use std::sync::{Mutex, MutexGuard};

/// Locks the mutex, taking the data back out of a poisoned lock.
///
/// Internal utility function. The session state stays consistent across a
/// panic because each field is written in a single assignment.
#[inline(always)]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Name of the response field holding a token for `purpose`
#[inline(always)]
pub(crate) fn token_field(purpose: &str) -> String {
    format!("{purpose}token")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn lock_recovers_from_poison() {
        let shared = Arc::new(Mutex::new(1));
        let cloned = Arc::clone(&shared);
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(shared.is_poisoned());
        assert_eq!(*lock(&shared), 1);
    }

    #[test]
    fn token_field_appends_suffix() {
        assert_eq!(token_field("csrf"), "csrftoken");
        assert_eq!(token_field("login"), "logintoken");
    }
}
