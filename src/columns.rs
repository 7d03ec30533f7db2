use std::collections::BTreeMap;

use crate::model::TextFragment;
use crate::options::DetectionConfig;
use crate::rows::{bucket_position, quantize};

/// Page-wide column anchors: rounded x positions that recur more than
/// `min_column_occurrences` times, ascending.
#[must_use]
pub fn detect_columns(fragments: &[TextFragment], config: &DetectionConfig) -> Vec<f32> {
    let mut histogram: BTreeMap<i64, usize> = BTreeMap::new();
    for fragment in fragments {
        *histogram
            .entry(quantize(fragment.x, config.column_threshold))
            .or_insert(0) += 1;
    }

    histogram
        .into_iter()
        .filter(|(_, count)| *count > config.min_column_occurrences)
        .map(|(bucket, _)| bucket_position(bucket, config.column_threshold))
        .collect()
}

/// Index of the anchor owning `x`.
///
/// Anchor `i` owns `x` when `x` is within `tolerance` of it, or lies after it
/// and before the next anchor. The last anchor has no upper bound. `None`
/// means the fragment is dropped from its row.
#[must_use]
pub fn find_nearest_column(x: f32, anchors: &[f32], tolerance: f32) -> Option<usize> {
    anchors.iter().enumerate().position(|(index, &anchor)| {
        let next = anchors.get(index + 1).copied().unwrap_or(f32::INFINITY);
        (x - anchor).abs() <= tolerance || (x > anchor && x < next)
    })
}

#[cfg(test)]
mod tests {
    use super::{detect_columns, find_nearest_column};
    use crate::model::TextFragment;
    use crate::options::DetectionConfig;

    #[test]
    fn nearest_column_examples() {
        let anchors = [10.0, 50.0, 90.0];
        assert_eq!(find_nearest_column(12.0, &anchors, 5.0), Some(0));
        assert_eq!(find_nearest_column(30.0, &anchors, 5.0), Some(0));
        assert_eq!(find_nearest_column(95.0, &anchors, 5.0), Some(2));
        assert_eq!(find_nearest_column(200.0, &anchors, 5.0), Some(2));
        assert_eq!(find_nearest_column(5.0, &anchors, 5.0), Some(0));
    }

    #[test]
    fn left_of_first_anchor_is_unassigned() {
        assert_eq!(find_nearest_column(2.0, &[10.0, 50.0], 5.0), None);
        assert_eq!(find_nearest_column(10.0, &[], 5.0), None);
    }

    #[test]
    fn keeps_positions_seen_more_than_twice() {
        let fragments = [
            (10.0, "a"),
            (11.0, "b"),
            (9.0, "c"),
            (60.0, "d"),
            (61.0, "e"),
            (200.0, "f"),
            (59.0, "g"),
            (58.0, "h"),
        ]
        .into_iter()
        .enumerate()
        .map(|(row, (x, text))| {
            #[allow(clippy::cast_precision_loss)]
            let y = row as f32 * 10.0;
            TextFragment::new(text, x, y)
        })
        .collect::<Vec<_>>();

        let anchors = detect_columns(&fragments, &DetectionConfig::default());
        assert_eq!(anchors, vec![10.0, 60.0]);
    }

    #[test]
    fn exactly_two_occurrences_is_not_a_column() {
        let fragments = vec![
            TextFragment::new("a", 10.0, 0.0),
            TextFragment::new("b", 10.0, 10.0),
        ];
        assert!(detect_columns(&fragments, &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn occurrence_threshold_is_tunable() {
        let fragments = vec![
            TextFragment::new("a", 10.0, 0.0),
            TextFragment::new("b", 10.0, 10.0),
        ];
        let config = DetectionConfig {
            min_column_occurrences: 1,
            ..DetectionConfig::default()
        };
        assert_eq!(detect_columns(&fragments, &config), vec![10.0]);
    }
}
