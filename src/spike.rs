//! Incremental turning-point detection.
//!
//! A renderer subsampling a wide window at a stride greater than 1 would
//! silently skip narrow spikes. The detector classifies every pushed sample
//! with an O(1) local-curvature test against the recent trend and records the
//! absolute indices of turning points in a small secondary ring, so scans can
//! sweep them explicitly no matter the stride. This is a cheap heuristic
//! tuned for sparse outliers in otherwise smooth signals, not spectral
//! analysis.

use serde::Deserialize;

use crate::range::IndexRange;

/// Default classification threshold: |second difference / reference| above
/// this flags a turning point.
pub const DEFAULT_SPIKE_THRESHOLD: f32 = 0.05;

/// Default decay of the exponential trend average (weight of the old value).
pub const DEFAULT_TREND_DECAY: f32 = 0.9;

/// Spike ring capacity defaults to `capacity / DEFAULT_RING_DIVISOR`.
const DEFAULT_RING_DIVISOR: usize = 16;

/// Minimum spike ring capacity when derived from the main capacity.
const MIN_RING_CAPACITY: usize = 4;

/// Tuning for the turning-point detector.
///
/// The threshold and decay defaults come from the source design; they are
/// deliberately configurable rather than hard invariants.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Classification threshold on |second_difference / reference|.
    pub threshold: f32,
    /// Weight of the previous trend average per non-spike sample.
    pub trend_decay: f32,
    /// Minimum reference magnitude, guarding the division against a
    /// near-zero trend.
    pub noise_floor: f32,
    /// Spike ring capacity; 0 derives it from the main buffer capacity.
    pub spike_capacity: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SPIKE_THRESHOLD,
            trend_decay: DEFAULT_TREND_DECAY,
            noise_floor: 0.0,
            spike_capacity: 0,
        }
    }
}

/// Capacity-bounded FIFO of absolute indices, evicting oldest on overflow.
#[derive(Clone, Debug)]
struct IndexRing {
    data: Vec<u64>,
    write_cursor: usize,
    live_count: usize,
}

impl IndexRing {
    fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity.max(1)],
            write_cursor: 0,
            live_count: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn push(&mut self, index: u64) {
        self.data[self.write_cursor] = index;
        self.write_cursor = (self.write_cursor + 1) % self.data.len();
        if self.live_count < self.data.len() {
            self.live_count += 1;
        }
    }

    fn clear(&mut self) {
        self.write_cursor = 0;
        self.live_count = 0;
    }

    /// Iterate the live entries oldest first.
    fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        let start = if self.live_count < self.data.len() {
            0
        } else {
            self.write_cursor
        };
        (0..self.live_count).map(move |i| self.data[(start + i) % self.data.len()])
    }
}

/// Incremental classifier fed by every detected push.
#[derive(Clone, Debug)]
pub struct TurningPointDetector {
    threshold: f32,
    decay: f32,
    noise_floor: f32,
    recent_average: f32,
    /// The two most recent samples, oldest first.
    prev: [f32; 2],
    seen: u64,
    ring: IndexRing,
}

impl TurningPointDetector {
    /// Create a detector for a buffer of the given capacity.
    pub fn new(buffer_capacity: usize, config: DetectorConfig) -> Self {
        let ring_capacity = if config.spike_capacity > 0 {
            config.spike_capacity
        } else {
            (buffer_capacity / DEFAULT_RING_DIVISOR).max(MIN_RING_CAPACITY)
        };
        Self {
            threshold: config.threshold,
            decay: config.trend_decay,
            noise_floor: config.noise_floor,
            recent_average: 0.0,
            prev: [0.0; 2],
            seen: 0,
            ring: IndexRing::new(ring_capacity),
        }
    }

    /// Capacity of the spike ring; also the maximum number of indices a
    /// single `collect` call can yield.
    pub fn spike_capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Recalibrate the minimum reference magnitude. Callers typically feed
    /// this from the last observed value range as the signal's typical
    /// magnitude changes.
    pub fn set_noise_floor(&mut self, value: f32) {
        self.noise_floor = value.abs();
    }

    /// Observe the sample just written at `absolute_index`.
    ///
    /// Once three samples exist the middle one is classified: a second
    /// difference large relative to the trend flags it as a turning point and
    /// appends `absolute_index - 1` to the spike ring; otherwise the sample
    /// is folded into the trend average.
    pub fn observe(&mut self, absolute_index: u64, value: f32) {
        if self.seen == 0 {
            // The first sample seeds the trend.
            self.recent_average = value;
        }

        let mut spike = false;
        if self.seen >= 2 {
            let [a, b] = self.prev;
            let c = value;
            let second_difference = (c - b) - (b - a);
            let reference = self.recent_average.abs().max(self.noise_floor);
            if reference != 0.0 && (second_difference / reference).abs() > self.threshold {
                spike = true;
                self.ring.push(absolute_index - 1);
            }
        }
        if !spike && self.seen > 0 {
            self.recent_average =
                self.decay * self.recent_average + (1.0 - self.decay) * value;
        }

        self.prev[0] = self.prev[1];
        self.prev[1] = value;
        self.seen += 1;
    }

    /// Write the turning-point indices inside `window` (absolute) into `out`
    /// in ascending order, truncating at its length. Returns the count
    /// written.
    pub fn collect(&self, window: IndexRange, out: &mut [u64]) -> usize {
        let mut written = 0;
        for index in self.ring.iter() {
            if written == out.len() {
                break;
            }
            if window.contains(index) {
                out[written] = index;
                written += 1;
            }
        }
        written
    }

    /// Turning-point indices inside `window` (absolute), ascending.
    pub fn spikes_in(&self, window: IndexRange) -> Vec<u64> {
        self.ring
            .iter()
            .filter(|index| window.contains(*index))
            .collect()
    }

    /// Forget all history and recorded turning points. The noise floor is a
    /// caller calibration and survives.
    pub fn clear(&mut self) {
        self.recent_average = 0.0;
        self.prev = [0.0; 2];
        self.seen = 0;
        self.ring.clear();
    }
}
