use proptest::prelude::*;

use segexport::errors::ExportError;
use segexport::plan::plan_intervals;
use segexport::types::{Interval, FULL_RANGE_INDEX};

#[test]
fn test_three_markers_plan() {
    let intervals = plan_intervals(&[10, 40, 90]).unwrap();
    assert_eq!(
        intervals,
        vec![
            Interval::bounded(10, 39, 1),
            Interval::bounded(40, 89, 2),
            Interval::full_range(10, 89),
        ]
    );
}

#[test]
fn test_two_markers_give_one_slice_and_full_range() {
    let intervals = plan_intervals(&[0, 1]).unwrap();
    assert_eq!(intervals, vec![Interval::bounded(0, 0, 1), Interval::full_range(0, 0)]);
}

#[test]
fn test_single_marker_is_rejected() {
    assert!(matches!(
        plan_intervals(&[5]),
        Err(ExportError::InsufficientMarkers { found: 1 })
    ));
}

#[test]
fn test_display_names_full_range() {
    assert_eq!(Interval::full_range(10, 89).to_string(), "FULL interval (frames 10-89)");
    assert_eq!(Interval::bounded(40, 89, 2).to_string(), "interval 2 (frames 40-89)");
}

// Strictly ascending marker lists of length 2..=40.
fn markers_strategy() -> impl Strategy<Value = Vec<i64>> {
    (0i64..10_000, proptest::collection::vec(1i64..500, 1..40)).prop_map(|(first, gaps)| {
        let mut markers = vec![first];
        for gap in gaps {
            let next = markers[markers.len() - 1] + gap;
            markers.push(next);
        }
        markers
    })
}

proptest! {
    #[test]
    fn test_n_markers_give_n_intervals_full_range_last(markers in markers_strategy()) {
        let intervals = plan_intervals(&markers).unwrap();
        prop_assert_eq!(intervals.len(), markers.len());

        let (full, bounded) = intervals.split_last().unwrap();
        prop_assert_eq!(full.index, FULL_RANGE_INDEX);
        prop_assert!(bounded.iter().all(|i| !i.is_full_range()));
        prop_assert_eq!((full.start, full.end), (markers[0], markers[markers.len() - 1] - 1));
    }

    #[test]
    fn test_bounded_intervals_tile_without_seams(markers in markers_strategy()) {
        let intervals = plan_intervals(&markers).unwrap();
        let bounded = &intervals[..intervals.len() - 1];

        for (i, interval) in bounded.iter().enumerate() {
            prop_assert_eq!(interval.index, i as i32 + 1);
            prop_assert_eq!(interval.start, markers[i]);
            prop_assert_eq!(interval.end, markers[i + 1] - 1);
            prop_assert!(interval.start <= interval.end);
            // The next marker's frame belongs to the next slice only.
            prop_assert!(interval.end < markers[i + 1]);
        }
        for pair in bounded.windows(2) {
            prop_assert!(pair[0].end < pair[1].start);
        }
        let covered: i64 = bounded.iter().map(Interval::frame_count).sum();
        prop_assert_eq!(covered, intervals[intervals.len() - 1].frame_count());
    }
}
