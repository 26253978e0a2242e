//! The sample-storage engine: ring storage, turning-point detection, and
//! incremental window statistics behind one reader/writer spin lock.
//!
//! `SampleBuffer` is the surface collaborators consume: a producer thread
//! pushes samples while render/scan threads query sliding windows. Writer
//! operations (`push`, `load`, `clear`) hold the main lock exclusively;
//! queries hold it shared, so every reader sees a consistent snapshot of
//! counters, samples, and caches as of acquisition. Because the scan and
//! average caches mutate on reads, they sit behind a second, exclusive-only
//! lock nested inside the shared hold; two concurrent readers serialise on
//! the cache, not on the store.
//!
//! All public range parameters are relative indices unless the name says
//! `absolute`; the caches and the spike ring work in absolute indices
//! internally and conversion happens here, at the API boundary.

use std::cell::UnsafeCell;

use crate::average_cache::AverageCache;
use crate::error::Result;
use crate::range::{IndexRange, ValueRange};
use crate::ring::RingStore;
use crate::scan_cache::RangeScanCache;
use crate::spike::{DetectorConfig, TurningPointDetector};
use crate::spin::SpinRwLock;

/// Fixed-capacity sample buffer with incremental sliding-window statistics.
pub struct SampleBuffer {
    /// Writer-vs-readers lock over the store and detector.
    lock: SpinRwLock,
    /// Serialises cache mutation among readers; always acquired inside
    /// `lock`, never the other way around.
    cache_lock: SpinRwLock,
    store: UnsafeCell<RingStore>,
    detector: UnsafeCell<TurningPointDetector>,
    scan_cache: UnsafeCell<RangeScanCache>,
    average_cache: UnsafeCell<AverageCache>,
}

// SAFETY: the cells are only dereferenced under the locking protocol above —
// `store` and `detector` mutably under an exclusive hold of `lock` and
// immutably under a shared hold; the caches mutably under `cache_lock` while
// `lock` is at least shared. `clear` takes both exclusively.
unsafe impl Sync for SampleBuffer {}

impl SampleBuffer {
    /// Create an empty buffer holding up to `capacity` samples, with default
    /// turning-point detection tuning.
    ///
    /// Fails with `InvalidCapacity` for a zero capacity and with
    /// `AllocationFailure` when the storage cannot be reserved.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(capacity, DetectorConfig::default())
    }

    /// Create an empty buffer with explicit detector tuning.
    pub fn with_config(capacity: usize, config: DetectorConfig) -> Result<Self> {
        Ok(Self {
            lock: SpinRwLock::new(),
            cache_lock: SpinRwLock::new(),
            store: UnsafeCell::new(RingStore::new(capacity)?),
            detector: UnsafeCell::new(TurningPointDetector::new(capacity, config)),
            scan_cache: UnsafeCell::new(RangeScanCache::new()),
            average_cache: UnsafeCell::new(AverageCache::new()),
        })
    }

    /// Append one sample, evicting the oldest when full. Never fails.
    ///
    /// With `detect_spikes` set the sample is also fed to the turning-point
    /// detector; pass `false` for raw ingest where spike tracking is not
    /// wanted.
    pub fn push(&self, value: f32, detect_spikes: bool) {
        let _guard = self.lock.lock_exclusive();
        // SAFETY: exclusive hold of `lock`.
        let store = unsafe { &mut *self.store.get() };
        if detect_spikes {
            let detector = unsafe { &mut *self.detector.get() };
            detector.observe(store.next_absolute(), value);
        }
        store.push(value);
    }

    /// Bulk append; only the trailing `capacity()` samples are retained if
    /// `samples` is longer.
    ///
    /// Without spike detection the samples are copied in bulk through the
    /// segment mapper instead of pushed one by one.
    pub fn load(&self, samples: &[f32], detect_spikes: bool) {
        let _guard = self.lock.lock_exclusive();
        // SAFETY: exclusive hold of `lock`.
        let store = unsafe { &mut *self.store.get() };
        if detect_spikes {
            let detector = unsafe { &mut *self.detector.get() };
            for &value in samples {
                detector.observe(store.next_absolute(), value);
                store.push(value);
            }
        } else {
            store.load(samples);
        }
    }

    /// Drop all live samples and reset both statistic caches and the
    /// detector. `reset_history` additionally zeroes the overwritten
    /// counter, restarting the absolute index space.
    pub fn clear(&self, reset_history: bool) {
        let _guard = self.lock.lock_exclusive();
        let _cache_guard = self.cache_lock.lock_exclusive();
        // SAFETY: exclusive hold of both locks.
        unsafe {
            (*self.store.get()).clear(reset_history);
            (*self.detector.get()).clear();
            (*self.scan_cache.get()).clear();
            (*self.average_cache.get()).clear();
        }
        log::debug!("buffer cleared (reset_history: {})", reset_history);
    }

    /// Bounds-checked read at a relative index; errors at
    /// `index >= capacity()`.
    pub fn item(&self, index: usize) -> Result<f32> {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        unsafe { &*self.store.get() }.item(index)
    }

    /// Clamping read at an absolute index: out-of-window indices return the
    /// nearest boundary sample, 0 when empty. The clamp is deliberate — a
    /// renderer probing at window edges wants the boundary sample, not an
    /// error.
    pub fn item_by_absolute(&self, index: u64) -> f32 {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        unsafe { &*self.store.get() }.item_by_absolute(index)
    }

    /// Number of samples currently retained.
    pub fn count(&self) -> usize {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        unsafe { &*self.store.get() }.count()
    }

    /// Fixed capacity.
    pub fn capacity(&self) -> usize {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        unsafe { &*self.store.get() }.capacity()
    }

    /// Whether the live count has reached capacity.
    pub fn is_full(&self) -> bool {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        unsafe { &*self.store.get() }.is_full()
    }

    /// Number of samples evicted since the last full reset.
    pub fn count_overwritten(&self) -> u64 {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        unsafe { &*self.store.get() }.count_overwritten()
    }

    /// Relative range of the live samples; empty when no samples are held.
    pub fn range(&self) -> IndexRange {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        unsafe { &*self.store.get() }.range()
    }

    /// Relative range of the full capacity.
    pub fn range_max(&self) -> IndexRange {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        unsafe { &*self.store.get() }.range_max()
    }

    /// Absolute range of the live samples.
    pub fn range_absolute(&self) -> IndexRange {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        unsafe { &*self.store.get() }.range_absolute()
    }

    /// Translate a relative range to absolute indices.
    pub fn range_to_absolute(&self, range: IndexRange) -> IndexRange {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        unsafe { &*self.store.get() }.range_to_absolute(range)
    }

    /// Translate an absolute range to relative indices, clamped into the
    /// live window.
    pub fn range_to_relative(&self, range: IndexRange) -> IndexRange {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        unsafe { &*self.store.get() }.range_to_relative(range)
    }

    /// Min/max over `window` (relative) sampled at `step`, including any
    /// turning point inside the window so spikes survive subsampling.
    /// Returns `(0, 0)` when the buffer or the window is empty.
    ///
    /// Optimised for a window sliding rightward between calls; a left jump
    /// rescans fully.
    pub fn get_value_range(&self, window: IndexRange, step: u64) -> ValueRange {
        let _guard = self.lock.lock_shared();
        let _cache_guard = self.cache_lock.lock_exclusive();
        // SAFETY: shared hold of `lock` for the store and detector,
        // exclusive hold of `cache_lock` for the cache.
        let store = unsafe { &*self.store.get() };
        let detector = unsafe { &*self.detector.get() };
        let cache = unsafe { &mut *self.scan_cache.get() };
        cache.value_range(store, detector, window, step)
    }

    /// Arithmetic mean over `window` (relative) sampled at `step`.
    /// Returns 0 when the buffer or the window is empty.
    pub fn get_average(&self, window: IndexRange, step: u64) -> f32 {
        let _guard = self.lock.lock_shared();
        let _cache_guard = self.cache_lock.lock_exclusive();
        // SAFETY: shared hold of `lock` for the store, exclusive hold of
        // `cache_lock` for the cache.
        let store = unsafe { &*self.store.get() };
        let cache = unsafe { &mut *self.average_cache.get() };
        cache.average(store, window, step)
    }

    /// Write the absolute indices of turning points inside `window`
    /// (relative) into `out` in ascending order, truncating at its length.
    /// Returns the count written.
    pub fn get_spikes(&self, window: IndexRange, out: &mut [u64]) -> usize {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        let store = unsafe { &*self.store.get() };
        let detector = unsafe { &*self.detector.get() };
        let window = store.range_to_absolute(store.range().intersect(window));
        detector.collect(window, out)
    }

    /// Turning points inside `window` (relative) as a vector of absolute
    /// indices, ascending.
    pub fn spikes(&self, window: IndexRange) -> Vec<u64> {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        let store = unsafe { &*self.store.get() };
        let detector = unsafe { &*self.detector.get() };
        let window = store.range_to_absolute(store.range().intersect(window));
        detector.spikes_in(window)
    }

    /// Capacity of the spike ring; the maximum number of indices one
    /// `get_spikes` call can yield.
    pub fn spike_capacity(&self) -> usize {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        unsafe { &*self.detector.get() }.spike_capacity()
    }

    /// Recalibrate the detector's minimum reference magnitude. Renderers
    /// typically feed this from the last observed value range.
    pub fn set_spike_noise_floor(&self, value: f32) {
        let _guard = self.lock.lock_exclusive();
        // SAFETY: exclusive hold of `lock`.
        unsafe { &mut *self.detector.get() }.set_noise_floor(value);
    }

    /// Open an external critical section, e.g. to make a whole frame's reads
    /// atomic against the producer. Every call must be paired with
    /// `unlock()`. Use a shared hold (`exclusive = false`) for read batches:
    /// every operation on this type re-acquires the lock internally, so
    /// reads compose with an external shared hold but deadlock under an
    /// exclusive one, just as writer operations do. This is a caller
    /// contract, not detected at runtime.
    pub fn lock(&self, exclusive: bool) {
        self.lock.raw_lock(exclusive);
    }

    /// Close the critical section opened by `lock`.
    pub fn unlock(&self) {
        self.lock.raw_unlock();
    }

    /// Copy into a new buffer. The source is held shared for the duration,
    /// so the copy sees one consistent snapshot but does not stall readers.
    /// Statistic caches start cold in the clone; detector state and recorded
    /// turning points carry over.
    pub fn try_clone(&self) -> Result<Self> {
        let _guard = self.lock.lock_shared();
        // SAFETY: shared hold of `lock`.
        let store = unsafe { &*self.store.get() };
        let detector = unsafe { &*self.detector.get() };
        Ok(Self {
            lock: SpinRwLock::new(),
            cache_lock: SpinRwLock::new(),
            store: UnsafeCell::new(store.try_clone()?),
            detector: UnsafeCell::new(detector.clone()),
            scan_cache: UnsafeCell::new(RangeScanCache::new()),
            average_cache: UnsafeCell::new(AverageCache::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BufferError;

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(matches!(
            SampleBuffer::new(0),
            Err(BufferError::InvalidCapacity)
        ));
    }

    #[test]
    fn test_push_query_roundtrip() {
        let buf = SampleBuffer::new(8).unwrap();
        for v in [3.0, 1.0, 4.0, 1.5] {
            buf.push(v, true);
        }
        assert_eq!(buf.count(), 4);
        assert!(!buf.is_full());

        let range = buf.get_value_range(buf.range(), 1);
        assert!((range.min() - 1.0).abs() < 0.001);
        assert!((range.max() - 4.0).abs() < 0.001);

        let average = buf.get_average(buf.range(), 1);
        assert!((average - 2.375).abs() < 0.001);
    }

    #[test]
    fn test_worked_example_capacity_five() {
        let buf = SampleBuffer::new(5).unwrap();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0] {
            buf.push(v, true);
        }
        assert_eq!(buf.count(), 5);
        assert_eq!(buf.count_overwritten(), 2);
        assert!((buf.item(0).unwrap() - 3.0).abs() < 0.001);

        let range = buf.get_value_range(IndexRange::new(0, 4), 1);
        assert!((range.min() - 3.0).abs() < 0.001);
        assert!((range.max() - 7.0).abs() < 0.001);
        assert!((buf.get_average(IndexRange::new(0, 4), 1) - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_empty_buffer_defaults() {
        let buf = SampleBuffer::new(4).unwrap();
        let range = buf.get_value_range(IndexRange::new(0, 3), 1);
        assert!((range.min() - 0.0).abs() < 0.001);
        assert!((range.max() - 0.0).abs() < 0.001);
        assert!((buf.get_average(IndexRange::new(0, 3), 1) - 0.0).abs() < 0.001);
        assert!(buf.range().is_empty());
        assert_eq!(buf.get_spikes(IndexRange::new(0, 3), &mut [0; 4]), 0);
    }

    #[test]
    fn test_clear_resets_everything() {
        let buf = SampleBuffer::new(4).unwrap();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            buf.push(v, true);
        }
        buf.clear(true);
        assert_eq!(buf.count(), 0);
        assert_eq!(buf.count_overwritten(), 0);
        let range = buf.get_value_range(buf.range_max(), 1);
        assert!((range.max() - 0.0).abs() < 0.001);
        assert!((buf.get_average(buf.range_max(), 1) - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_load_without_detection_keeps_tail() {
        let buf = SampleBuffer::new(3).unwrap();
        buf.load(&[1.0, 2.0, 3.0, 4.0, 5.0], false);
        assert_eq!(buf.count(), 3);
        assert_eq!(buf.count_overwritten(), 2);
        assert!((buf.item(0).unwrap() - 3.0).abs() < 0.001);
        assert!(buf.spikes(buf.range_max()).is_empty());
    }

    #[test]
    fn test_load_with_detection_finds_spikes() {
        let buf = SampleBuffer::new(64).unwrap();
        let mut samples = vec![10.0; 40];
        samples[20] = 25.0;
        buf.load(&samples, true);
        let spikes = buf.spikes(buf.range());
        assert!(spikes.contains(&20));
    }

    #[test]
    fn test_external_lock_scoped_reads() {
        let buf = SampleBuffer::new(4).unwrap();
        buf.push(1.0, true);
        buf.push(2.0, true);

        buf.lock(false);
        let count = buf.count();
        let first = buf.item(0).unwrap();
        buf.unlock();

        assert_eq!(count, 2);
        assert!((first - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_try_clone_snapshot() {
        let buf = SampleBuffer::new(4).unwrap();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            buf.push(v, true);
        }
        let clone = buf.try_clone().unwrap();
        buf.push(99.0, true);

        assert_eq!(clone.count(), 4);
        assert_eq!(clone.count_overwritten(), 1);
        assert!((clone.item(0).unwrap() - 2.0).abs() < 0.001);
        // The clone did not observe the later push.
        let range = clone.get_value_range(clone.range(), 1);
        assert!((range.max() - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_item_bounds_error() {
        let buf = SampleBuffer::new(4).unwrap();
        assert!(matches!(
            buf.item(4),
            Err(BufferError::IndexOutOfRange { index: 4, capacity: 4 })
        ));
    }
}
