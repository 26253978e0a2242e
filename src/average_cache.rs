//! Incremental running-sum cache for window averages.
//!
//! Same overlap-extension idea as the range-scan cache: when a query window
//! slides rightward over the previous one, the cached running sum is updated
//! by subtracting the samples that left on the left edge and adding the ones
//! that entered on the right, instead of rescanning the whole window. The
//! average samples the same stride grid as the range scan but does not sweep
//! turning points; a mean does not need exact extrema.
//!
//! Accumulation is plain `f32`. Long-running sessions should force a full
//! rescan now and then (query a different window once) to bound drift; this
//! is a caller responsibility, not enforced here.

use crate::range::IndexRange;
use crate::ring::RingStore;

/// Cached state of the previous average computation.
#[derive(Clone, Debug, Default)]
pub struct AverageCache {
    /// Absolute window of the last query; empty while cold.
    window: IndexRange,
    /// Absolute index of the first sampled grid point. Edge updates walk
    /// this grid, so it travels with the subtract set instead of being
    /// re-derived from the window edge.
    anchor: u64,
    /// Stride of the cached grid; a query with a different stride rescans.
    step: u64,
    /// Number of grid points summed.
    sampled: u64,
    /// The cached mean.
    average: f32,
}

impl AverageCache {
    /// Fresh, cold cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached sum, forcing the next query to rescan fully.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Arithmetic mean over `window` (relative indices) sampled at `step`.
    /// Returns 0 for an empty store or an empty window.
    pub fn average(&mut self, store: &RingStore, window: IndexRange, step: u64) -> f32 {
        if store.count() == 0 {
            return 0.0;
        }
        let window = store.range().intersect(window);
        if window.is_empty() {
            return 0.0;
        }
        let window = store.range_to_absolute(window);

        let mut step = step.max(1);
        if step >= store.count() as u64 / 2 {
            step = 1;
        }

        if window == self.window && step == self.step {
            return self.average;
        }

        if self.reusable(store, window, step) {
            return self.slide(store, window, step);
        }
        self.rescan(store, window, step)
    }

    /// Whether the cached grid can be slid onto the new window: same stride,
    /// window moved right (or extended) while still overlapping, every cached
    /// grid point still live, and the edge sets cheaper than a rescan.
    fn reusable(&self, store: &RingStore, window: IndexRange, step: u64) -> bool {
        if self.window.is_empty() || step != self.step || self.sampled == 0 {
            return false;
        }
        // The running sum is only reversible while every cached grid point is
        // still live. Once the anchor has been evicted the subtract walk
        // would read clamped boundary values instead of the evicted ones.
        if self.anchor < store.range_absolute().min() {
            return false;
        }
        if window.min() < self.window.min()
            || window.min() > self.window.max()
            || window.max() < self.window.max()
        {
            return false;
        }

        let leaving = if window.min() > self.anchor {
            (window.min() - self.anchor).div_ceil(step)
        } else {
            0
        };
        if leaving >= self.sampled {
            return false;
        }
        let last = self.anchor + (self.sampled - 1) * step;
        let entering = if window.max() > last {
            (window.max() - last) / step
        } else {
            0
        };
        leaving + entering <= window.count_by_step(step)
    }

    /// Incremental update: subtract the grid points left of the new window,
    /// add the ones past the old right edge.
    fn slide(&mut self, store: &RingStore, window: IndexRange, step: u64) -> f32 {
        let mut sum = self.average * self.sampled as f32;
        let mut sampled = self.sampled;

        let mut index = self.anchor;
        while index < window.min() {
            sum -= store.item_by_absolute(index);
            sampled -= 1;
            index += step;
        }
        let anchor = index;

        let last = self.anchor + (self.sampled - 1) * step;
        let mut index = last + step;
        while index <= window.max() {
            sum += store.item_by_absolute(index);
            sampled += 1;
            index += step;
        }

        self.window = window;
        self.anchor = anchor;
        self.step = step;
        self.sampled = sampled;
        self.average = sum / sampled as f32;
        self.average
    }

    /// Full strided sum over the window.
    fn rescan(&mut self, store: &RingStore, window: IndexRange, step: u64) -> f32 {
        let mut sum = 0.0;
        let mut sampled = 0u64;
        let mut index = window.min();
        while index <= window.max() {
            sum += store.item_by_absolute(index);
            sampled += 1;
            index += step;
        }

        self.window = window;
        self.anchor = window.min();
        self.step = step;
        self.sampled = sampled;
        self.average = sum / sampled as f32;
        self.average
    }
}
