//! Inclusive selection rectangles over (active column, row) space

use std::fmt;

use crate::ui::range_list::{adjust_span_deleted, adjust_span_inserted};

/// Axis-aligned rectangle whose corners are both part of the selection.
///
/// Stored normalized: `left <= right` and `top <= bottom`. A single cell
/// has `left == right` and `top == bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionRect {
    left: usize,
    top: usize,
    right: usize,
    bottom: usize,
}

impl SelectionRect {
    pub fn cell(x: usize, y: usize) -> Self {
        Self::from_corners(x, y, x, y)
    }

    pub fn from_corners(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self {
            left: x0.min(x1),
            top: y0.min(y1),
            right: x0.max(x1),
            bottom: y0.max(y1),
        }
    }

    /// Origin plus a (possibly negative) extent to the opposite corner. A
    /// corner that would land before index 0 is pulled back to 0.
    pub fn from_origin_extent(origin_x: usize, origin_y: usize, extent_x: isize, extent_y: isize) -> Self {
        let corner_x = origin_x.saturating_add_signed(extent_x);
        let corner_y = origin_y.saturating_add_signed(extent_y);
        Self::from_corners(origin_x, origin_y, corner_x, corner_y)
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn right(&self) -> usize {
        self.right
    }

    pub fn bottom(&self) -> usize {
        self.bottom
    }

    pub fn width(&self) -> usize {
        self.right - self.left + 1
    }

    pub fn height(&self) -> usize {
        self.bottom - self.top + 1
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn is_single_cell(&self) -> bool {
        self.left == self.right && self.top == self.bottom
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.left <= x && x <= self.right && self.top <= y && y <= self.bottom
    }

    pub fn contains_row(&self, y: usize) -> bool {
        self.top <= y && y <= self.bottom
    }

    pub fn contains_column(&self, x: usize) -> bool {
        self.left <= x && x <= self.right
    }

    pub fn adjust_rows_inserted(&mut self, index: usize, count: usize) {
        (self.top, self.bottom) = adjust_span_inserted(self.top, self.bottom, index, count);
    }

    /// Returns false when the deletion removed every row of the rectangle
    pub fn adjust_rows_deleted(&mut self, index: usize, count: usize) -> bool {
        match adjust_span_deleted(self.top, self.bottom, index, count) {
            Some((top, bottom)) => {
                (self.top, self.bottom) = (top, bottom);
                true
            }
            None => false,
        }
    }

    /// Returns false when the move left nothing of the rectangle behind
    pub fn adjust_rows_moved(&mut self, old_index: usize, new_index: usize, count: usize) -> bool {
        match adjust_span_moved(self.top, self.bottom, old_index, new_index, count) {
            Some((top, bottom)) => {
                (self.top, self.bottom) = (top, bottom);
                true
            }
            None => false,
        }
    }

    pub fn adjust_columns_inserted(&mut self, index: usize, count: usize) {
        (self.left, self.right) = adjust_span_inserted(self.left, self.right, index, count);
    }

    pub fn adjust_columns_deleted(&mut self, index: usize, count: usize) -> bool {
        match adjust_span_deleted(self.left, self.right, index, count) {
            Some((left, right)) => {
                (self.left, self.right) = (left, right);
                true
            }
            None => false,
        }
    }

    pub fn adjust_columns_moved(&mut self, old_index: usize, new_index: usize, count: usize) -> bool {
        match adjust_span_moved(self.left, self.right, old_index, new_index, count) {
            Some((left, right)) => {
                (self.left, self.right) = (left, right);
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for SelectionRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// A span inside the moved block travels with it; anything else sees the
/// move as a delete at the old position then an insert at the new one
fn adjust_span_moved(
    lo: usize,
    hi: usize,
    old_index: usize,
    new_index: usize,
    count: usize,
) -> Option<(usize, usize)> {
    if count == 0 || old_index == new_index {
        return Some((lo, hi));
    }
    if lo >= old_index && hi < old_index + count {
        return Some((lo - old_index + new_index, hi - old_index + new_index));
    }
    let (lo, hi) = adjust_span_deleted(lo, hi, old_index, count)?;
    Some(adjust_span_inserted(lo, hi, new_index, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_extent_normalizes() {
        let rect = SelectionRect::from_origin_extent(5, 5, -2, -10);
        assert_eq!((rect.left(), rect.top(), rect.right(), rect.bottom()), (3, 0, 5, 5));
        assert_eq!(rect.width(), 3);
        assert_eq!(rect.height(), 6);
    }

    #[test]
    fn test_inclusive_corners() {
        let rect = SelectionRect::from_corners(1, 1, 2, 3);
        assert!(rect.contains(2, 3));
        assert!(!rect.contains(3, 3));
        assert_eq!(rect.area(), 6);
        assert!(SelectionRect::cell(4, 4).is_single_cell());
    }

    #[test]
    fn test_rows_deleted_inside_rectangle() {
        let mut rect = SelectionRect::from_corners(0, 5, 2, 9);
        assert!(rect.adjust_rows_deleted(3, 4));
        assert_eq!((rect.top(), rect.bottom()), (3, 5));

        let mut gone = SelectionRect::cell(0, 4);
        assert!(!gone.adjust_rows_deleted(3, 4));
    }

    #[test]
    fn test_rows_moved_with_block() {
        let mut rect = SelectionRect::from_corners(0, 2, 0, 3);
        assert!(rect.adjust_rows_moved(2, 6, 2));
        assert_eq!((rect.top(), rect.bottom()), (6, 7));

        // Straddling rectangle loses the moved rows and grows where they land
        let mut straddle = SelectionRect::from_corners(0, 0, 0, 3);
        assert!(straddle.adjust_rows_moved(2, 1, 4));
        assert_eq!((straddle.top(), straddle.bottom()), (0, 5));
    }
}
