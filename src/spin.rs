//! Reader/writer coordination without OS blocking primitives.
//!
//! The producer pushes at high rates; parking it behind a kernel mutex on
//! every sample would dominate the hot path. All waiting here is a busy loop
//! with capped exponential backoff: a handful of spin hints first, then
//! sleeps doubling up to a fixed ceiling. Holders are expected to release
//! promptly (no unbounded work under the lock), so there is no cancellation
//! or timeout mechanism.
//!
//! Re-entrant exclusive acquisition deadlocks. That is a documented caller
//! contract, not detected at runtime.

use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

/// Writer-held flag in the state word; the low bits count active readers.
const WRITER: u32 = 1 << 31;

/// Spin iterations before the backoff starts sleeping.
const SPIN_LIMIT: u32 = 64;

/// Backoff sleep ceiling.
const MAX_SLEEP_MICROS: u64 = 1000;

/// Capped exponential backoff: spin hints first, then doubling sleeps.
struct Backoff {
    round: u32,
}

impl Backoff {
    fn new() -> Self {
        Self { round: 0 }
    }

    fn wait(&mut self) {
        if self.round < SPIN_LIMIT {
            std::hint::spin_loop();
        } else {
            let exp = (self.round - SPIN_LIMIT).min(10);
            let micros = (1u64 << exp).min(MAX_SLEEP_MICROS);
            thread::sleep(Duration::from_micros(micros));
        }
        self.round += 1;
    }
}

/// A shared/exclusive spin lock over a single atomic word.
///
/// One writer or any number of readers hold the lock at a time. There is no
/// writer-priority queueing: an exclusive acquire simply waits for a clear
/// state word.
#[derive(Debug, Default)]
pub struct SpinRwLock {
    state: AtomicU32,
}

impl SpinRwLock {
    /// New, unlocked.
    pub fn new() -> Self {
        Self {
            state: AtomicU32::new(0),
        }
    }

    /// Acquire exclusively, spinning until no writer and no readers hold.
    pub fn lock_exclusive(&self) -> ExclusiveGuard<'_> {
        let mut backoff = Backoff::new();
        while self
            .state
            .compare_exchange_weak(0, WRITER, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            backoff.wait();
        }
        ExclusiveGuard { lock: self }
    }

    /// Acquire shared, spinning while a writer holds.
    pub fn lock_shared(&self) -> SharedGuard<'_> {
        let mut backoff = Backoff::new();
        loop {
            let state = self.state.load(Ordering::Relaxed);
            if state & WRITER == 0
                && self
                    .state
                    .compare_exchange_weak(state, state + 1, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
            {
                return SharedGuard { lock: self };
            }
            backoff.wait();
        }
    }

    /// Raw acquire for external scoped critical sections. The caller must
    /// pair every call with `raw_unlock` on the same thread of control.
    pub fn raw_lock(&self, exclusive: bool) {
        if exclusive {
            std::mem::forget(self.lock_exclusive());
        } else {
            std::mem::forget(self.lock_shared());
        }
    }

    /// Raw release; the mode is inferred from the state word. Calling this
    /// without a matching `raw_lock` corrupts the lock state.
    pub fn raw_unlock(&self) {
        let state = self.state.load(Ordering::Relaxed);
        if state & WRITER != 0 {
            self.state.store(0, Ordering::Release);
        } else {
            self.state.fetch_sub(1, Ordering::Release);
        }
    }

    fn unlock_exclusive(&self) {
        self.state.store(0, Ordering::Release);
    }

    fn unlock_shared(&self) {
        self.state.fetch_sub(1, Ordering::Release);
    }
}

/// RAII guard for an exclusive hold.
pub struct ExclusiveGuard<'a> {
    lock: &'a SpinRwLock,
}

impl Drop for ExclusiveGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock_exclusive();
    }
}

/// RAII guard for a shared hold.
pub struct SharedGuard<'a> {
    lock: &'a SpinRwLock,
}

impl Drop for SharedGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock_shared();
    }
}
