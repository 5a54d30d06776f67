//! Sorted list of inclusive index ranges
//!
//! Backs the row and column projections of a selection. Ranges are kept
//! sorted, disjoint and non-adjacent, so equality is structural equality.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeList {
    ranges: Vec<(usize, usize)>,
}

impl RangeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    pub fn ranges(&self) -> &[(usize, usize)] {
        &self.ranges
    }

    /// Number of indexes covered
    pub fn count(&self) -> usize {
        self.ranges.iter().map(|(lo, hi)| hi - lo + 1).sum()
    }

    pub fn indexes(&self) -> Vec<usize> {
        self.ranges.iter().flat_map(|&(lo, hi)| lo..=hi).collect()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.ranges
            .iter()
            .any(|&(lo, hi)| lo <= index && index <= hi)
    }

    /// Add `from..=to` (either order)
    pub fn add(&mut self, from: usize, to: usize) {
        let (lo, hi) = ordered(from, to);
        self.ranges.push((lo, hi));
        self.normalize();
    }

    /// Remove `from..=to` (either order)
    pub fn remove(&mut self, from: usize, to: usize) {
        let (lo, hi) = ordered(from, to);
        let mut kept = Vec::with_capacity(self.ranges.len() + 1);
        for &(a, b) in &self.ranges {
            if b < lo || a > hi {
                kept.push((a, b));
                continue;
            }
            if a < lo {
                kept.push((a, lo - 1));
            }
            if b > hi {
                kept.push((hi + 1, b));
            }
        }
        self.ranges = kept;
    }

    /// Flip one index. Returns true if it is now included.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.contains(index) {
            self.remove(index, index);
            false
        } else {
            self.add(index, index);
            true
        }
    }

    /// Indexes inserted at `index`: ranges at or after it shift, a range
    /// strictly containing it grows
    pub fn adjust_inserted(&mut self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        for range in &mut self.ranges {
            *range = adjust_span_inserted(range.0, range.1, index, count);
        }
    }

    pub fn adjust_deleted(&mut self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        self.ranges = self
            .ranges
            .iter()
            .filter_map(|&(lo, hi)| adjust_span_deleted(lo, hi, index, count))
            .collect();
        self.normalize();
    }

    /// A block of `count` indexes moved from `old_index` to `new_index`
    /// (position after removal). Membership travels with the block.
    pub fn adjust_moved(&mut self, old_index: usize, new_index: usize, count: usize) {
        if count == 0 || old_index == new_index {
            return;
        }
        let block_end = old_index + count - 1;
        let moved: Vec<(usize, usize)> = self
            .ranges
            .iter()
            .filter(|&&(lo, hi)| hi >= old_index && lo <= block_end)
            .map(|&(lo, hi)| (lo.max(old_index) - old_index, hi.min(block_end) - old_index))
            .collect();

        self.remove(old_index, block_end);
        self.adjust_deleted(old_index, count);
        self.open_gap(new_index, count);
        for (lo, hi) in moved {
            self.ranges.push((lo + new_index, hi + new_index));
        }
        self.normalize();
    }

    /// Shift everything at or after `index` without growing any range
    fn open_gap(&mut self, index: usize, count: usize) {
        let mut shifted = Vec::with_capacity(self.ranges.len() + 1);
        for &(lo, hi) in &self.ranges {
            if hi < index {
                shifted.push((lo, hi));
            } else if lo >= index {
                shifted.push((lo + count, hi + count));
            } else {
                shifted.push((lo, index - 1));
                shifted.push((index + count, hi + count));
            }
        }
        self.ranges = shifted;
    }

    fn normalize(&mut self) {
        self.ranges.sort_unstable();
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(self.ranges.len());
        for &(lo, hi) in &self.ranges {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }
        self.ranges = merged;
    }
}

impl fmt::Display for RangeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .ranges
            .iter()
            .map(|(lo, hi)| {
                if lo == hi {
                    lo.to_string()
                } else {
                    format!("{}-{}", lo, hi)
                }
            })
            .collect();
        write!(f, "[{}]", parts.join(","))
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Inclusive span after `count` indexes are inserted at `index`
pub(crate) fn adjust_span_inserted(lo: usize, hi: usize, index: usize, count: usize) -> (usize, usize) {
    if index <= lo {
        (lo + count, hi + count)
    } else if index <= hi {
        (lo, hi + count)
    } else {
        (lo, hi)
    }
}

/// Inclusive span after `index..index + count` is deleted, or `None` when
/// the deletion consumed all of it
pub(crate) fn adjust_span_deleted(lo: usize, hi: usize, index: usize, count: usize) -> Option<(usize, usize)> {
    if count == 0 || index > hi {
        return Some((lo, hi));
    }
    let delete_end = index + count - 1;
    if delete_end < lo {
        return Some((lo - count, hi - count));
    }
    let overlap = hi.min(delete_end) - lo.max(index) + 1;
    let remaining = (hi - lo + 1) - overlap;
    if remaining == 0 {
        return None;
    }
    let new_lo = lo.min(index);
    Some((new_lo, new_lo + remaining - 1))
}
