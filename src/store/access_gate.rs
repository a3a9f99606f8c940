//! AccessGate - the single lock serializing device operations.
//!
//! Acquisition blocks until the gate is free or the caller's
//! [`CancellationToken`] fires. The returned guard releases the gate when
//! dropped, so every exit path (including `?`) unlocks.

use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::common::{Error, Result};

/// A non-reentrant mutex with interruptible acquisition.
///
/// There is no owner tracking: acquiring the gate twice from the same
/// thread deadlocks until the token is cancelled.
pub struct AccessGate<T> {
    inner: Mutex<T>,
    /// How long each timed wait lasts before the token is re-checked.
    poll_interval: Duration,
}

impl<T> AccessGate<T> {
    pub fn new(value: T, poll_interval: Duration) -> Self {
        Self {
            inner: Mutex::new(value),
            poll_interval,
        }
    }

    /// Block until the gate is acquired or `cancel` fires.
    ///
    /// A token that is already cancelled interrupts immediately, even when
    /// the gate is free.
    ///
    /// # Errors
    /// Returns `Error::Interrupted` if the token was cancelled before the
    /// gate was taken. The guarded value is never touched in that case.
    pub fn acquire(&self, cancel: &CancellationToken) -> Result<MutexGuard<'_, T>> {
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Interrupted);
            }
            if let Some(guard) = self.inner.try_lock_for(self.poll_interval) {
                return Ok(guard);
            }
        }
    }

    /// Block until the gate is acquired, ignoring cancellation.
    pub fn acquire_uninterruptible(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Check whether someone currently holds the gate.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;

    fn gate() -> Arc<AccessGate<u32>> {
        Arc::new(AccessGate::new(0, Duration::from_millis(1)))
    }

    #[test]
    fn test_acquire_free_gate() {
        let gate = gate();
        let token = CancellationToken::new();

        {
            let mut guard = gate.acquire(&token).unwrap();
            *guard += 1;
            assert!(gate.is_locked());
        }

        assert!(!gate.is_locked());
        assert_eq!(*gate.acquire(&token).unwrap(), 1);
    }

    #[test]
    fn test_cancelled_token_interrupts_free_gate() {
        let gate = gate();
        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(gate.acquire(&token).unwrap_err(), Error::Interrupted);
        assert!(!gate.is_locked());
    }

    #[test]
    fn test_cancel_interrupts_blocked_waiter() {
        let gate = gate();
        let token = CancellationToken::new();
        let held = gate.acquire_uninterruptible();

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let gate = Arc::clone(&gate);
            let token = token.clone();
            thread::spawn(move || {
                tx.send(()).unwrap();
                gate.acquire(&token).map(|_| ())
            })
        };

        rx.recv().unwrap();
        thread::sleep(Duration::from_millis(20));
        token.cancel();

        assert_eq!(waiter.join().unwrap(), Err(Error::Interrupted));
        drop(held);
    }

    #[test]
    fn test_waiter_proceeds_after_release() {
        let gate = gate();
        let held = gate.acquire_uninterruptible();

        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let token = CancellationToken::new();
                let mut guard = gate.acquire(&token).unwrap();
                *guard += 10;
            })
        };

        thread::sleep(Duration::from_millis(20));
        drop(held);
        waiter.join().unwrap();

        assert_eq!(*gate.acquire_uninterruptible(), 10);
    }

    #[test]
    fn test_serializes_increments() {
        let gate = gate();
        let mut handles = vec![];

        for _ in 0..8 {
            let gate = Arc::clone(&gate);
            handles.push(thread::spawn(move || {
                let token = CancellationToken::new();
                for _ in 0..100 {
                    *gate.acquire(&token).unwrap() += 1;
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*gate.acquire_uninterruptible(), 800);
    }
}
