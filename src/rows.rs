use std::collections::BTreeMap;

use crate::model::TextFragment;

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn quantize(value: f32, quantum: f32) -> i64 {
    (value / quantum + 0.5).floor() as i64
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn bucket_position(bucket: i64, quantum: f32) -> f32 {
    bucket as f32 * quantum
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowGroup {
    pub key: f32,
    pub fragments: Vec<TextFragment>,
}

impl RowGroup {
    #[must_use]
    pub fn sorted_by_x(&self) -> Vec<&TextFragment> {
        let mut sorted = self.fragments.iter().collect::<Vec<_>>();
        sorted.sort_by(|left, right| left.x.total_cmp(&right.x));
        sorted
    }

    #[must_use]
    pub fn joined_text(&self) -> String {
        self.sorted_by_x()
            .into_iter()
            .map(|fragment| fragment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Buckets fragments by rounded `y`, returned in ascending key order.
#[must_use]
pub fn cluster_rows(fragments: &[TextFragment], row_threshold: f32) -> Vec<RowGroup> {
    let mut buckets: BTreeMap<i64, Vec<TextFragment>> = BTreeMap::new();
    for fragment in fragments {
        buckets
            .entry(quantize(fragment.y, row_threshold))
            .or_default()
            .push(fragment.clone());
    }

    buckets
        .into_iter()
        .map(|(bucket, fragments)| RowGroup {
            key: bucket_position(bucket, row_threshold),
            fragments,
        })
        .collect()
}

#[must_use]
pub fn is_separator_line(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.chars().all(|ch| ch == '-')
}

/// Drops separator lines; must run before [`cluster_rows`].
#[must_use]
pub fn filter_separator_fragments(fragments: &[TextFragment]) -> Vec<TextFragment> {
    fragments
        .iter()
        .filter(|fragment| !is_separator_line(&fragment.text))
        .cloned()
        .collect()
}
