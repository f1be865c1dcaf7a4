//! Usage: Poison-tolerant locking for `std::sync::Mutex` state.
//!
//! A panic while holding one of our state mutexes must not wedge every
//! later caller behind a `PoisonError`. The guarded data stays valid for
//! our use cases (plain state transitions, no partially-applied
//! multi-step writes), so recovering the inner guard is safe.

use std::sync::{Mutex, MutexGuard};

pub(crate) trait MutexExt<T> {
    fn lock_or_recover(&self) -> MutexGuard<'_, T>;
}

impl<T> MutexExt<T> for Mutex<T> {
    fn lock_or_recover(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("互斥锁中毒，已恢复内部状态继续使用");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn lock_or_recover_returns_guard_after_poison() {
        let lock = Mutex::new(7u32);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = lock.lock().unwrap();
            panic!("poison it");
        }));
        assert!(result.is_err());
        assert!(lock.is_poisoned());

        let mut guard = lock.lock_or_recover();
        *guard += 1;
        assert_eq!(*guard, 8);
    }
}
