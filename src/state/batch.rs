//! Nested begin/end change batching
//!
//! Every event class (schema, data, selection) owns one counter. Work done
//! while the counter is above zero only marks the batch dirty; the outermost
//! `end` reports whether consolidation should run.

use anyhow::{bail, Result};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeClass {
    Schema,
    Data,
    Selection,
}

impl ChangeClass {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Data => "data",
            Self::Selection => "selection",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeBatch {
    class: ChangeClass,
    depth: usize,
    pending: bool,
}

impl ChangeBatch {
    pub fn new(class: ChangeClass) -> Self {
        Self {
            class,
            depth: 0,
            pending: false,
        }
    }

    pub fn begin(&mut self) {
        self.depth += 1;
        trace!(target: "batch", "{} begin (depth {})", self.class.name(), self.depth);
    }

    /// Close one level. Returns true when this closed the outermost level
    /// and something changed inside it; the pending flag is reset.
    pub fn end(&mut self) -> Result<bool> {
        if self.depth == 0 {
            bail!(
                "{} change batch ended more times than it was begun",
                self.class.name()
            );
        }
        self.depth -= 1;
        trace!(target: "batch", "{} end (depth {})", self.class.name(), self.depth);
        if self.depth == 0 && self.pending {
            self.pending = false;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn mark_changed(&mut self) {
        self.pending = true;
    }

    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_outermost_end_consolidates() {
        let mut batch = ChangeBatch::new(ChangeClass::Data);
        batch.begin();
        batch.begin();
        batch.mark_changed();
        assert!(!batch.end().unwrap());
        assert!(batch.is_active());
        assert!(batch.end().unwrap());
        assert!(!batch.is_pending());
    }

    #[test]
    fn test_clean_batch_does_not_consolidate() {
        let mut batch = ChangeBatch::new(ChangeClass::Schema);
        batch.begin();
        assert!(!batch.end().unwrap());
    }

    #[test]
    fn test_underflow_is_an_error() {
        let mut batch = ChangeBatch::new(ChangeClass::Selection);
        let err = batch.end().unwrap_err();
        assert!(err.to_string().contains("selection"));
        assert_eq!(batch.depth(), 0);
    }
}
