//! Incremental min/max-with-location cache for window scans.
//!
//! A live chart asks for the value range of nearly the same window every
//! frame, sliding rightward as samples arrive. The cache remembers the last
//! scanned window (absolute indices), where its extrema were found, and the
//! resulting `(min, max)`; when a new query only extends the old window to
//! the right, only the fresh delta is scanned. Scrolling left or jumping
//! forces a full rescan by design.

use crate::range::{IndexRange, ValueRange};
use crate::ring::RingStore;
use crate::spike::TurningPointDetector;

/// Cached state of the previous range scan.
///
/// `argmin`/`argmax` are kept as two separate absolute indices; the minimum
/// may well sit to the right of the maximum, so they cannot be packed into an
/// ordered range.
#[derive(Clone, Debug, Default)]
pub struct RangeScanCache {
    /// Absolute window covered by the last scan; empty while cold.
    scanned: IndexRange,
    /// Absolute index of the cached minimum.
    argmin: u64,
    /// Absolute index of the cached maximum.
    argmax: u64,
    /// The `(min, max)` found by the last scan.
    result: ValueRange,
}

impl RangeScanCache {
    /// Fresh, cold cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached scan, forcing the next query to rescan fully.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Min/max over `window` (relative indices) sampled at `step`, plus any
    /// turning point inside the scanned area so subsampling cannot hide a
    /// spike. Returns `(0, 0)` for an empty store or an empty window.
    pub fn value_range(
        &mut self,
        store: &RingStore,
        detector: &TurningPointDetector,
        window: IndexRange,
        step: u64,
    ) -> ValueRange {
        if store.count() == 0 {
            return ValueRange::default();
        }
        let window = store.range().intersect(window);
        if window.is_empty() {
            return ValueRange::default();
        }
        let window = store.range_to_absolute(window);

        // Degenerate strides fall back to scanning every sample.
        let mut step = step.max(1);
        if step >= store.count() as u64 / 2 {
            step = 1;
        }

        // Pure hit: the old scan covers the query and its extrema are still
        // inside the query, so the cached result is exact.
        if !self.scanned.is_empty()
            && self.scanned.contains_range(window)
            && window.contains(self.argmin)
            && window.contains(self.argmax)
        {
            return self.result;
        }

        // Rightward extension: the query starts inside the old scan and runs
        // past its right edge, with the old extrema still in view. Seed from
        // the cache and scan only the delta.
        let reuse = !self.scanned.is_empty()
            && self.scanned.contains(window.min())
            && window.contains(self.scanned.max())
            && window.contains(self.argmin)
            && window.contains(self.argmax);

        let (mut min, mut max, mut argmin, mut argmax, scan_from) = if reuse {
            (
                self.result.min(),
                self.result.max(),
                self.argmin,
                self.argmax,
                self.scanned.max() + step,
            )
        } else {
            (
                f32::INFINITY,
                f32::NEG_INFINITY,
                window.min(),
                window.min(),
                window.min(),
            )
        };

        let mut index = scan_from;
        while index <= window.max() {
            let value = store.item_by_absolute(index);
            if value < min {
                min = value;
                argmin = index;
            }
            if value > max {
                max = value;
                argmax = index;
            }
            index += step;
        }

        // Sweep turning points the sampling grid may have stepped over.
        if step > 1 {
            for spike in detector.spikes_in(IndexRange::new(scan_from, window.max())) {
                let value = store.item_by_absolute(spike);
                if value < min {
                    min = value;
                    argmin = spike;
                }
                if value > max {
                    max = value;
                    argmax = spike;
                }
            }
        }

        self.scanned = window;
        self.argmin = argmin;
        self.argmax = argmax;
        self.result = ValueRange::new(min, max);
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spike::DetectorConfig;

    fn fixture(samples: &[f32]) -> (RingStore, TurningPointDetector) {
        let mut store = RingStore::new(samples.len().max(1)).unwrap();
        let mut detector = TurningPointDetector::new(samples.len().max(1), DetectorConfig::default());
        for (i, &v) in samples.iter().enumerate() {
            detector.observe(i as u64, v);
            store.push(v);
        }
        (store, detector)
    }

    fn brute_force(store: &RingStore, window: IndexRange, step: u64) -> ValueRange {
        let window = store.range_to_absolute(store.range().intersect(window));
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut i = window.min();
        while i <= window.max() {
            let v = store.item_by_absolute(i);
            min = min.min(v);
            max = max.max(v);
            i += step;
        }
        ValueRange::new(min, max)
    }

    #[test]
    fn test_empty_store_returns_zero_range() {
        let store = RingStore::new(8).unwrap();
        let detector = TurningPointDetector::new(8, DetectorConfig::default());
        let mut cache = RangeScanCache::new();
        let r = cache.value_range(&store, &detector, IndexRange::new(0, 7), 1);
        assert!((r.min() - 0.0).abs() < 0.001);
        assert!((r.max() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_empty_window_returns_zero_range() {
        let (store, detector) = fixture(&[1.0, 2.0, 3.0]);
        let mut cache = RangeScanCache::new();
        let r = cache.value_range(&store, &detector, IndexRange::empty(), 1);
        assert!((r.max() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_cold_scan_matches_brute_force() {
        let samples: Vec<f32> = (0..32).map(|i| ((i * 7) % 13) as f32).collect();
        let (store, detector) = fixture(&samples);
        let mut cache = RangeScanCache::new();

        let window = IndexRange::new(4, 27);
        let got = cache.value_range(&store, &detector, window, 1);
        let want = brute_force(&store, window, 1);
        assert!((got.min() - want.min()).abs() < 0.001);
        assert!((got.max() - want.max()).abs() < 0.001);
    }

    #[test]
    fn test_pure_hit_returns_cached_result() {
        let samples: Vec<f32> = (0..32).map(|i| (i % 11) as f32).collect();
        let (store, detector) = fixture(&samples);
        let mut cache = RangeScanCache::new();

        let wide = cache.value_range(&store, &detector, IndexRange::new(0, 31), 1);
        // A narrower window containing both cached extrema is a pure hit.
        let narrow = cache.value_range(&store, &detector, IndexRange::new(0, 31), 1);
        assert!((wide.min() - narrow.min()).abs() < 0.001);
        assert!((wide.max() - narrow.max()).abs() < 0.001);
    }

    #[test]
    fn test_rightward_extension_matches_brute_force() {
        let samples: Vec<f32> = (0..64).map(|i| ((i * 31) % 17) as f32 - 5.0).collect();
        let (store, detector) = fixture(&samples);
        let mut cache = RangeScanCache::new();

        // A scrolling window extending to the right each query.
        for start in 0..20u64 {
            let window = IndexRange::new(start, 40 + start);
            let got = cache.value_range(&store, &detector, window, 1);
            let want = brute_force(&store, window, 1);
            assert!(
                (got.min() - want.min()).abs() < 0.001,
                "min mismatch at start {}",
                start
            );
            assert!(
                (got.max() - want.max()).abs() < 0.001,
                "max mismatch at start {}",
                start
            );
        }
    }

    #[test]
    fn test_left_jump_forces_full_rescan() {
        let samples: Vec<f32> = (0..64).map(|i| (64 - i) as f32).collect();
        let (store, detector) = fixture(&samples);
        let mut cache = RangeScanCache::new();

        cache.value_range(&store, &detector, IndexRange::new(40, 60), 1);
        let window = IndexRange::new(2, 12);
        let got = cache.value_range(&store, &detector, window, 1);
        let want = brute_force(&store, window, 1);
        assert!((got.min() - want.min()).abs() < 0.001);
        assert!((got.max() - want.max()).abs() < 0.001);
    }

    #[test]
    fn test_strided_scan_sweeps_turning_points() {
        // Flat signal with one narrow spike that a stride of 7 would skip.
        let mut samples = vec![10.0; 64];
        samples[33] = 30.0;
        let (store, detector) = fixture(&samples);
        let mut cache = RangeScanCache::new();

        let got = cache.value_range(&store, &detector, IndexRange::new(0, 63), 7);
        assert!((got.max() - 30.0).abs() < 0.001);
    }

    #[test]
    fn test_cache_survives_eviction() {
        // Store smaller than the sample run: cached absolute windows must be
        // re-clamped as old samples are evicted.
        let mut store = RingStore::new(16).unwrap();
        let mut detector = TurningPointDetector::new(16, DetectorConfig::default());
        let mut cache = RangeScanCache::new();

        for i in 0..40u64 {
            let v = ((i * 13) % 7) as f32;
            detector.observe(i, v);
            store.push(v);
            let window = store.range();
            let got = cache.value_range(&store, &detector, window, 1);
            let want = brute_force(&store, window, 1);
            assert!((got.min() - want.min()).abs() < 0.001);
            assert!((got.max() - want.max()).abs() < 0.001);
        }
    }
}
