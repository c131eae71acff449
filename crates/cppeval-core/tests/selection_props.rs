use cppeval_core::types::RunMetadata;
use cppeval_core::{select_range, AnalysisResult, DefectRecord, RangeError};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_selection_stays_in_bounds(
        len in 0..50usize,
        start in 0..60usize,
        end in proptest::option::of(0..60usize),
    ) {
        match select_range(len, start, end) {
            Ok(range) => {
                prop_assert!(range.start < range.end);
                prop_assert!(range.end <= len);
                prop_assert_eq!(range.start, start);
                prop_assert_eq!(range.end, end.unwrap_or(len));
            }
            Err(RangeError::Empty) => prop_assert_eq!(len, 0),
            Err(RangeError::InvalidStart { .. }) => prop_assert!(start >= len),
            Err(RangeError::InvalidEnd { end: bad, .. }) => {
                prop_assert!(bad <= start || bad > len);
            }
        }
    }

    #[test]
    fn prop_metadata_counts_partition_results(
        outcomes in proptest::collection::vec(any::<bool>(), 0..40),
        extra in 0..5usize,
    ) {
        let results: Vec<AnalysisResult> = outcomes
            .iter()
            .enumerate()
            .map(|(i, ok)| {
                let defect = DefectRecord::new(i + 2, "a.c", 1, "style", "x", "s");
                if *ok {
                    AnalysisResult::success(defect, "", None)
                } else {
                    AnalysisResult::error(defect, "failed")
                }
            })
            .collect();
        let completed = results.len() + extra;
        let meta = RunMetadata::from_results(&results, completed, completed + 3);

        prop_assert_eq!(meta.success_count + meta.error_count, results.len());
        prop_assert_eq!(meta.success_count, outcomes.iter().filter(|ok| **ok).count());
        prop_assert_eq!(meta.completed_defects, completed);
    }
}
