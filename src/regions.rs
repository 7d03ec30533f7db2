use std::ops::Range;

use crate::rows::RowGroup;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRegion {
    pub rows: Range<usize>,
}

impl TableRegion {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn slice<'a>(&self, rows: &'a [RowGroup]) -> &'a [RowGroup] {
        &rows[self.rows.clone()]
    }
}

/// Splits rows into regions wherever the gap between consecutive row keys
/// exceeds `max_gap`. Regions with fewer than two rows are dropped.
#[must_use]
pub fn segment_regions(rows: &[RowGroup], max_gap: f32) -> Vec<TableRegion> {
    let mut regions = Vec::new();
    let mut start = 0;

    let mut close = |start: usize, end: usize| {
        if end - start >= 2 {
            regions.push(TableRegion { rows: start..end });
        }
    };

    for index in 1..rows.len() {
        if rows[index].key - rows[index - 1].key > max_gap {
            close(start, index);
            start = index;
        }
    }
    close(start, rows.len());

    regions
}
