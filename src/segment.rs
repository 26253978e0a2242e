//! Mapping of logical sample ranges onto physical storage segments.
//!
//! A wrapped ring holds a logically contiguous run of samples in at most two
//! physically contiguous pieces of its backing array. Bulk operations (load,
//! copy-construction, streaming a window out to a renderer) resolve a
//! relative index range to those pieces once and then work on plain slices,
//! instead of bounds-checking item by item.

use crate::range::IndexRange;

/// A physically contiguous run of samples: `len` slots starting at `offset`
/// in the backing array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Segment {
    pub offset: usize,
    pub len: usize,
}

impl Segment {
    /// A zero-length segment.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this segment covers no slots.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Resolve the relative range `range` to at most two physical segments.
///
/// `start` is the physical index of relative position 0 (the oldest live
/// sample) and `capacity` the length of the backing array. The caller is
/// expected to have clamped `range` into the live window; indices past
/// `capacity` would alias already-resolved slots.
///
/// An empty `range` yields two empty segments.
pub fn split_range(range: IndexRange, start: usize, capacity: usize) -> [Segment; 2] {
    if range.is_empty() || capacity == 0 {
        return [Segment::empty(), Segment::empty()];
    }

    let count = range.count() as usize;
    let phys_lo = (start + range.min() as usize) % capacity;

    let first_len = count.min(capacity - phys_lo);
    let first = Segment { offset: phys_lo, len: first_len };
    let second = Segment { offset: 0, len: count - first_len };

    [first, second]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrapped_range_is_one_segment() {
        let [a, b] = split_range(IndexRange::new(2, 5), 0, 10);
        assert_eq!(a, Segment { offset: 2, len: 4 });
        assert!(b.is_empty());
    }

    #[test]
    fn test_wrapped_range_is_two_segments() {
        // start = 7, capacity = 10: relative 0..=5 maps to physical 7,8,9,0,1,2.
        let [a, b] = split_range(IndexRange::new(0, 5), 7, 10);
        assert_eq!(a, Segment { offset: 7, len: 3 });
        assert_eq!(b, Segment { offset: 0, len: 3 });
    }

    #[test]
    fn test_range_starting_past_the_wrap_point() {
        // Relative 4..=6 from start 7 lands entirely in the wrapped half.
        let [a, b] = split_range(IndexRange::new(4, 6), 7, 10);
        assert_eq!(a, Segment { offset: 1, len: 3 });
        assert!(b.is_empty());
    }

    #[test]
    fn test_empty_range_yields_empty_segments() {
        let [a, b] = split_range(IndexRange::empty(), 3, 10);
        assert!(a.is_empty());
        assert!(b.is_empty());
    }

    #[test]
    fn test_full_capacity_range() {
        let [a, b] = split_range(IndexRange::new(0, 9), 4, 10);
        assert_eq!(a, Segment { offset: 4, len: 6 });
        assert_eq!(b, Segment { offset: 0, len: 4 });
        assert_eq!(a.len + b.len, 10);
    }
}
