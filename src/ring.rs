//! Fixed-capacity wraparound sample storage.
//!
//! `RingStore` owns a contiguous array that is allocated once at construction
//! and never reallocated. A write cursor wraps modulo capacity; the number of
//! live samples saturates at capacity while the count of overwritten
//! (evicted) samples grows forever. The two counters together define the
//! absolute indexing scheme used throughout the crate:
//! `absolute = overwritten + relative`.

use crate::error::{BufferError, Result};
use crate::range::IndexRange;
use crate::segment::{split_range, Segment};

/// Raw ring storage with absolute/relative index translation.
#[derive(Clone, Debug)]
pub struct RingStore {
    data: Vec<f32>,
    write_cursor: usize,
    live_count: usize,
    overwritten: u64,
}

impl RingStore {
    /// Create a store holding up to `capacity` samples.
    ///
    /// Fails with `InvalidCapacity` for a zero capacity and with
    /// `AllocationFailure` when the backing storage cannot be reserved.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(BufferError::InvalidCapacity);
        }
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| BufferError::AllocationFailure { capacity })?;
        data.resize(capacity, 0.0);
        Ok(Self {
            data,
            write_cursor: 0,
            live_count: 0,
            overwritten: 0,
        })
    }

    /// Fixed capacity of the store.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of samples currently retained.
    pub fn count(&self) -> usize {
        self.live_count
    }

    /// Whether the live count has reached capacity.
    pub fn is_full(&self) -> bool {
        self.live_count == self.data.len()
    }

    /// Number of samples evicted since the last full reset.
    pub fn count_overwritten(&self) -> u64 {
        self.overwritten
    }

    /// Absolute index the next pushed sample will receive.
    pub fn next_absolute(&self) -> u64 {
        self.overwritten + self.live_count as u64
    }

    /// Physical index of relative position 0 (the oldest live sample).
    fn start(&self) -> usize {
        if self.live_count < self.data.len() {
            0
        } else {
            self.write_cursor
        }
    }

    /// Append one sample, evicting the oldest if the store is full.
    pub fn push(&mut self, value: f32) {
        self.data[self.write_cursor] = value;
        self.write_cursor = (self.write_cursor + 1) % self.data.len();
        if self.live_count < self.data.len() {
            self.live_count += 1;
        } else {
            self.overwritten += 1;
        }
    }

    /// Bounds-checked read at a relative index.
    ///
    /// The check is against `capacity`, not the live count: slots between
    /// `count()` and `capacity()` read the zero-initialised backing store.
    pub fn item(&self, index: usize) -> Result<f32> {
        if index >= self.data.len() {
            return Err(BufferError::IndexOutOfRange {
                index,
                capacity: self.data.len(),
            });
        }
        Ok(self.value_at(index))
    }

    /// Clamping read at an absolute index: out-of-window indices return the
    /// nearest boundary sample. Returns 0 when the store is empty.
    pub fn item_by_absolute(&self, index: u64) -> f32 {
        let live = self.range_absolute();
        if live.is_empty() {
            return 0.0;
        }
        let relative = (live.clamp(index) - self.overwritten) as usize;
        self.value_at(relative)
    }

    /// Unchecked-by-construction read; `index` must be below capacity.
    pub(crate) fn value_at(&self, index: usize) -> f32 {
        debug_assert!(index < self.data.len());
        self.data[(self.start() + index) % self.data.len()]
    }

    /// Relative range of the live samples: `[0, count - 1]`, empty when the
    /// store holds nothing.
    pub fn range(&self) -> IndexRange {
        if self.live_count == 0 {
            IndexRange::empty()
        } else {
            IndexRange::new(0, self.live_count as u64 - 1)
        }
    }

    /// Relative range of the full capacity: `[0, capacity - 1]`.
    pub fn range_max(&self) -> IndexRange {
        IndexRange::new(0, self.data.len() as u64 - 1)
    }

    /// Absolute range of the live samples, empty when the store holds nothing.
    pub fn range_absolute(&self) -> IndexRange {
        if self.live_count == 0 {
            IndexRange::empty()
        } else {
            IndexRange::new(self.overwritten, self.overwritten + self.live_count as u64 - 1)
        }
    }

    /// Translate a relative range to absolute indices.
    pub fn range_to_absolute(&self, range: IndexRange) -> IndexRange {
        range.offset_up(self.overwritten)
    }

    /// Translate an absolute range to relative indices, clamped into the live
    /// window. Indices below the overwritten watermark clamp to 0.
    pub fn range_to_relative(&self, range: IndexRange) -> IndexRange {
        if self.live_count == 0 {
            return IndexRange::empty();
        }
        self.range().intersect(range.offset_down(self.overwritten))
    }

    /// Bulk append. If `samples` exceeds the capacity only the trailing
    /// `capacity` samples are retained, with counters updated exactly as if
    /// every sample had been pushed sequentially.
    pub fn load(&mut self, samples: &[f32]) {
        let n = samples.len();
        if n == 0 {
            return;
        }
        let capacity = self.data.len();
        let take = n.min(capacity);
        let src = &samples[n - take..];

        // Leading samples that would have been pushed and immediately
        // evicted only advance the cursor.
        let skipped = n - take;
        self.write_cursor = (self.write_cursor + skipped % capacity) % capacity;

        let [a, b] = split_range(
            IndexRange::new(0, take as u64 - 1),
            self.write_cursor,
            capacity,
        );
        self.data[a.offset..a.offset + a.len].copy_from_slice(&src[..a.len]);
        self.data[b.offset..b.offset + b.len].copy_from_slice(&src[a.len..]);
        self.write_cursor = (self.write_cursor + take) % capacity;

        let evicted = (self.live_count + n).saturating_sub(capacity) as u64;
        self.overwritten += evicted;
        self.live_count = (self.live_count + n).min(capacity);

        log::debug!(
            "bulk load of {} samples ({} evicted, live {})",
            n,
            evicted,
            self.live_count
        );
    }

    /// Drop all live samples. `reset_overwritten` additionally zeroes the
    /// eviction counter, restarting the absolute index space.
    pub fn clear(&mut self, reset_overwritten: bool) {
        if reset_overwritten {
            self.overwritten = 0;
        } else {
            self.overwritten += self.live_count as u64;
        }
        self.live_count = 0;
        self.write_cursor = 0;
    }

    /// Resolve a relative range (clamped to the live window) to the physical
    /// segments holding it, oldest samples first.
    pub fn segments(&self, range: IndexRange) -> [Segment; 2] {
        let range = self.range().intersect(range);
        split_range(range, self.start(), self.data.len())
    }

    /// Borrow the physical slice behind a segment returned by `segments`.
    pub fn segment_slice(&self, segment: Segment) -> &[f32] {
        &self.data[segment.offset..segment.offset + segment.len]
    }

    /// Copy into a fresh store of the same capacity, streaming the live
    /// samples through the segment mapper so the clone starts linearised.
    pub fn try_clone(&self) -> Result<Self> {
        let mut clone = Self::new(self.data.len())?;
        let [a, b] = self.segments(self.range());
        clone.data[..a.len].copy_from_slice(self.segment_slice(a));
        clone.data[a.len..a.len + b.len].copy_from_slice(self.segment_slice(b));
        clone.live_count = self.live_count;
        clone.overwritten = self.overwritten;
        clone.write_cursor = self.live_count % self.data.len();
        Ok(clone)
    }
}
