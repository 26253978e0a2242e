//! Closed-interval arithmetic over sample indices and sample values.
//!
//! `IndexRange` expresses query windows over unsigned sample indices and has
//! an explicit empty state so that degenerate windows flow through the API as
//! "no data" instead of panicking. `ValueRange` expresses the min/max of a
//! scanned window and carries the mapping helpers a renderer needs to project
//! values into pixel space.

use serde::Serialize;

/// A closed interval `[min, max]` of sample indices, or the empty range.
///
/// Indices are `u64` so the same type covers both relative positions (within
/// the live window) and absolute positions (counted from the first sample
/// ever pushed). Constructing with `min > max` yields the empty range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexRange {
    min: u64,
    max: u64,
    empty: bool,
}

impl IndexRange {
    /// Create a range covering `[min, max]`. `min > max` produces the empty range.
    pub fn new(min: u64, max: u64) -> Self {
        if min > max {
            Self::empty()
        } else {
            Self { min, max, empty: false }
        }
    }

    /// The empty range.
    pub fn empty() -> Self {
        Self { min: 1, max: 0, empty: true }
    }

    /// Whether this range contains no indices.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Lower bound. Returns 0 for the empty range.
    pub fn min(&self) -> u64 {
        if self.empty { 0 } else { self.min }
    }

    /// Upper bound. Returns 0 for the empty range.
    pub fn max(&self) -> u64 {
        if self.empty { 0 } else { self.max }
    }

    /// `max - min`; 0 for the empty range.
    pub fn length(&self) -> u64 {
        if self.empty { 0 } else { self.max - self.min }
    }

    /// Number of indices covered: `length + 1`, or 0 when empty.
    pub fn count(&self) -> u64 {
        if self.empty { 0 } else { self.length() + 1 }
    }

    /// Number of indices sampled when stepping through the range with the
    /// given stride, starting at `min`. A stride of 0 counts as 1.
    pub fn count_by_step(&self, step: u64) -> u64 {
        if self.empty {
            return 0;
        }
        let step = step.max(1);
        self.length() / step + 1
    }

    /// Whether `index` lies inside the range.
    pub fn contains(&self, index: u64) -> bool {
        !self.empty && self.min <= index && index <= self.max
    }

    /// Whether `other` lies entirely inside this range.
    /// The empty range is contained in every range.
    pub fn contains_range(&self, other: IndexRange) -> bool {
        if other.empty {
            return true;
        }
        self.contains(other.min) && self.contains(other.max)
    }

    /// Intersection of two ranges; empty if they do not overlap.
    pub fn intersect(&self, other: IndexRange) -> IndexRange {
        if self.empty || other.empty {
            return IndexRange::empty();
        }
        IndexRange::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Clamp `index` into the range. Returns 0 for the empty range.
    pub fn clamp(&self, index: u64) -> u64 {
        if self.empty {
            return 0;
        }
        index.clamp(self.min, self.max)
    }

    /// Shift both bounds up by `offset` (relative → absolute translation).
    pub fn offset_up(&self, offset: u64) -> IndexRange {
        if self.empty {
            return *self;
        }
        IndexRange::new(self.min + offset, self.max + offset)
    }

    /// Shift both bounds down by `offset`, saturating at zero
    /// (absolute → relative translation; never negative).
    pub fn offset_down(&self, offset: u64) -> IndexRange {
        if self.empty {
            return *self;
        }
        IndexRange::new(self.min.saturating_sub(offset), self.max.saturating_sub(offset))
    }
}

impl Default for IndexRange {
    fn default() -> Self {
        Self::empty()
    }
}

/// A closed interval `[min, max]` of sample values.
///
/// Swapped bounds are normalised on construction; there is no empty state —
/// an empty scan reports `(0, 0)` by convention at the call site.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ValueRange {
    min: f32,
    max: f32,
}

impl ValueRange {
    /// Create a range covering `[min, max]`, swapping the bounds if reversed.
    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Lower bound.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> f32 {
        self.max
    }

    /// `max - min`.
    pub fn length(&self) -> f32 {
        self.max - self.min
    }

    /// Midpoint of the range.
    pub fn center(&self) -> f32 {
        (self.min + self.max) / 2.0
    }

    /// Whether `value` lies inside the range.
    pub fn contains(&self, value: f32) -> bool {
        self.min <= value && value <= self.max
    }

    /// Whether `other` lies entirely inside this range.
    pub fn contains_range(&self, other: ValueRange) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    /// Clamp `value` into the range.
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Map `value` into `[0, target_width]`, clamping out-of-range inputs.
    /// A zero-length range maps everything to 0.
    pub fn map(&self, value: f32, target_width: f32) -> f32 {
        if self.length() == 0.0 {
            return 0.0;
        }
        let value = self.clamp(value);
        target_width * (value - self.min) / self.length()
    }

    /// Map `value` into `[0, target_width]` with the axis flipped, as needed
    /// for y-axis projection where pixel rows grow downward.
    pub fn map_reverse(&self, value: f32, target_width: f32) -> f32 {
        target_width - self.map(value, target_width)
    }

    /// Scale the range about `cursor` by `factor`. Non-positive factors
    /// collapse the range onto the cursor.
    pub fn scale(&self, factor: f32, cursor: f32) -> ValueRange {
        let factor = factor.max(0.0);
        let left = (cursor - self.min) * factor;
        let right = (self.max - cursor) * factor;
        ValueRange::new(cursor - left, cursor + right)
    }

    /// Scale the range about its midpoint.
    pub fn scale_centered(&self, factor: f32) -> ValueRange {
        self.scale(factor, self.center())
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self { min: 0.0, max: 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_range_basic() {
        let r = IndexRange::new(3, 7);
        assert!(!r.is_empty());
        assert_eq!(r.min(), 3);
        assert_eq!(r.max(), 7);
        assert_eq!(r.length(), 4);
        assert_eq!(r.count(), 5);
    }

    #[test]
    fn test_index_range_empty() {
        let r = IndexRange::new(5, 2);
        assert!(r.is_empty());
        assert_eq!(r.count(), 0);
        assert!(!r.contains(3));

        let e = IndexRange::empty();
        assert!(e.is_empty());
        assert_eq!(e.intersect(IndexRange::new(0, 10)), IndexRange::empty());
    }

    #[test]
    fn test_index_range_containment() {
        let r = IndexRange::new(2, 8);
        assert!(r.contains(2));
        assert!(r.contains(8));
        assert!(!r.contains(9));
        assert!(r.contains_range(IndexRange::new(3, 5)));
        assert!(!r.contains_range(IndexRange::new(3, 9)));
        // The empty range is contained in everything.
        assert!(r.contains_range(IndexRange::empty()));
    }

    #[test]
    fn test_index_range_intersect() {
        let a = IndexRange::new(2, 8);
        let b = IndexRange::new(5, 12);
        assert_eq!(a.intersect(b), IndexRange::new(5, 8));
        assert!(a.intersect(IndexRange::new(9, 12)).is_empty());
    }

    #[test]
    fn test_index_range_offsets() {
        let r = IndexRange::new(2, 5);
        assert_eq!(r.offset_up(10), IndexRange::new(12, 15));
        // Saturates instead of wrapping below zero.
        assert_eq!(r.offset_down(4), IndexRange::new(0, 1));
        assert!(IndexRange::empty().offset_up(3).is_empty());
    }

    #[test]
    fn test_index_range_count_by_step() {
        let r = IndexRange::new(0, 9);
        assert_eq!(r.count_by_step(1), 10);
        assert_eq!(r.count_by_step(3), 4); // 0, 3, 6, 9
        assert_eq!(r.count_by_step(4), 3); // 0, 4, 8
        assert_eq!(r.count_by_step(0), 10);
        assert_eq!(IndexRange::empty().count_by_step(2), 0);
    }

    #[test]
    fn test_value_range_normalises_swapped_bounds() {
        let r = ValueRange::new(5.0, -1.0);
        assert!((r.min() + 1.0).abs() < 0.001);
        assert!((r.max() - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_value_range_map() {
        let r = ValueRange::new(0.0, 10.0);
        assert!((r.map(5.0, 100.0) - 50.0).abs() < 0.001);
        assert!((r.map(-5.0, 100.0) - 0.0).abs() < 0.001);
        assert!((r.map(15.0, 100.0) - 100.0).abs() < 0.001);
        assert!((r.map_reverse(0.0, 100.0) - 100.0).abs() < 0.001);

        let flat = ValueRange::new(3.0, 3.0);
        assert!((flat.map(3.0, 100.0) - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_value_range_scale() {
        let r = ValueRange::new(0.0, 10.0);
        let scaled = r.scale_centered(2.0);
        assert!((scaled.min() + 5.0).abs() < 0.001);
        assert!((scaled.max() - 15.0).abs() < 0.001);

        let about_zero = r.scale(0.5, 0.0);
        assert!((about_zero.min() - 0.0).abs() < 0.001);
        assert!((about_zero.max() - 5.0).abs() < 0.001);
    }
}
