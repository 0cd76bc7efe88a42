//! Start / head / end cursors over an attached [`SampleStore`].
//!
//! Every setter accepts any integer and resolves it to a position that keeps
//! `0 <= start <= head <= end <= len - 1` and `end - start <= max_range`.

use serde::{Deserialize, Serialize};

use crate::store::SampleStore;

/// Default ceiling on the number of samples the window may span.
pub const DEFAULT_MAX_RANGE: usize = 40_000;

/// Snapshot of the three cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorPosition {
    pub start: usize,
    pub head: usize,
    pub end: usize,
}

impl CursorPosition {
    pub fn width(&self) -> usize {
        self.end - self.start
    }

    /// Offset of the head inside the visible window.
    pub fn head_offset(&self) -> usize {
        self.head - self.start
    }
}

/// The visible sub-range of the store plus the head position inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSlice {
    pub samples: SampleStore,
    pub head_offset: usize,
}

/// Cursor window bound to exactly one non-empty store.
///
/// Construction goes through [`CursorWindow::attach`], so a window without a
/// store cannot exist.
#[derive(Debug, Clone)]
pub struct CursorWindow {
    store: SampleStore,
    max_range: usize,
    start: usize,
    head: usize,
    end: usize,
}

impl CursorWindow {
    /// Attaches to `store` with `start = head = 0` and the widest window
    /// allowed. Returns `None` for an empty store, which has no valid cursor.
    pub fn attach(store: SampleStore, max_range: usize) -> Option<Self> {
        if store.is_empty() {
            return None;
        }

        let max_range = max_range.max(1);
        let end = (store.len() - 1).min(max_range - 1);
        Some(Self {
            store,
            max_range,
            start: 0,
            head: 0,
            end,
        })
    }

    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    /// Detaches and hands the store back.
    pub fn into_store(self) -> SampleStore {
        self.store
    }

    pub fn max_range(&self) -> usize {
        self.max_range
    }

    pub fn position(&self) -> CursorPosition {
        CursorPosition {
            start: self.start,
            head: self.head,
            end: self.end,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn width(&self) -> usize {
        self.end - self.start
    }

    fn last_index(&self) -> i64 {
        self.store.len() as i64 - 1
    }

    fn clamp_to_store(&self, value: i64) -> i64 {
        value.clamp(0, self.last_index())
    }

    /// Moves the start cursor. A start past the end drags the end along, a
    /// start past the head pushes the head just after it, and a start that
    /// would widen the window past `max_range` stops at the limit.
    pub fn set_start(&mut self, value: i64) {
        let max_range = self.max_range as i64;
        let mut start = self.clamp_to_store(value);
        let mut end = self.end as i64;
        let mut head = self.head as i64;

        if start > end {
            end = (start + max_range).min(self.last_index());
        }
        if end - start > max_range {
            start = end - max_range;
        }
        if start > head {
            head = (start + 1).min(end);
        }

        self.commit(start, head, end);
    }

    /// Moves the end cursor; mirror image of [`set_start`](Self::set_start).
    pub fn set_end(&mut self, value: i64) {
        let max_range = self.max_range as i64;
        let mut end = self.clamp_to_store(value);
        let mut start = self.start as i64;
        let mut head = self.head as i64;

        if end < start {
            start = (end - max_range).max(0);
        }
        if end - start > max_range {
            end = start + max_range;
        }
        if end < head {
            head = (end - 1).max(start);
        }

        self.commit(start, head, end);
    }

    /// Moves the head. When the head leaves the window, the window pages
    /// towards it by whole widths (the old end becomes the new start) until
    /// the head is inside again. The last page is pulled back against the
    /// store bounds, so the width never changes.
    ///
    /// Returns `true` when start and end moved, so callers know the visible
    /// slice has to be rebuilt.
    pub fn set_head(&mut self, value: i64) -> bool {
        let head = self.clamp_to_store(value);
        let width = self.width() as i64;
        let page = width.max(1);
        let (mut start, mut end) = (self.start as i64, self.end as i64);
        let mut shifted = false;

        if head > end {
            let pages = (head - end + page - 1) / page;
            end = (end + pages * page).min(self.last_index());
            start = end - width;
            shifted = true;
        } else if head < start {
            let pages = (start - head + page - 1) / page;
            start = (start - pages * page).max(0);
            end = start + width;
            shifted = true;
        }

        if shifted {
            tracing::debug!(head, start, end, "window followed head");
        }
        self.commit(start, head, end);
        shifted
    }

    /// Drags the whole window by `delta` samples, keeping its width and the
    /// head's place inside it. Stops at the store bounds.
    pub fn shift_by(&mut self, delta: i64) -> bool {
        let delta = delta.clamp(
            -(self.start as i64),
            self.last_index() - self.end as i64,
        );
        if delta == 0 {
            return false;
        }

        self.commit(
            self.start as i64 + delta,
            self.head as i64 + delta,
            self.end as i64 + delta,
        );
        true
    }

    /// Widens the window to `max_range` centred on the head, as far as the
    /// store allows. Returns whether the window changed.
    pub fn maximize_around_head(&mut self) -> bool {
        let max_range = self.max_range as i64;
        let last = self.last_index();
        let head = self.head as i64;

        let mut start = (head - max_range / 2).max(0);
        let end = (start + max_range).min(last);
        start = (end - max_range).max(0);

        let before = self.position();
        self.commit(start, head, end);
        before != self.position()
    }

    /// The visible samples `[start, end]` and the head offset inside them.
    pub fn slice(&self) -> WindowSlice {
        WindowSlice {
            samples: self.store.slice(self.start as i64, self.end as i64 + 1),
            head_offset: self.head - self.start,
        }
    }

    fn commit(&mut self, start: i64, head: i64, end: i64) {
        let last = self.last_index();
        let end = end.clamp(0, last);
        let start = start.clamp(0, end).max(end - self.max_range as i64);
        let head = head.clamp(start, end);

        self.start = start as usize;
        self.head = head as usize;
        self.end = end as usize;

        debug_assert!(self.start <= self.head && self.head <= self.end);
        debug_assert!(self.end < self.store.len());
        debug_assert!(self.end - self.start <= self.max_range);
    }
}
