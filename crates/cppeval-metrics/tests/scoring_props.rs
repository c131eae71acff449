use cppeval_metrics::{agreement, score};
use proptest::prelude::*;

const LABELS: [&str; 4] = ["bug", "style", "performance", "unknown"];

fn pairs() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    proptest::collection::vec((0..LABELS.len(), 0..LABELS.len()), 1..60).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(t, p)| (LABELS[t].to_string(), LABELS[p].to_string()))
            .unzip()
    })
}

proptest! {
    #[test]
    fn prop_confusion_sums_match_counts((y_true, y_pred) in pairs()) {
        let metrics = score(&y_true, &y_pred).unwrap();
        let rows = metrics.confusion.row_sums();
        let cols = metrics.confusion.column_sums();

        for (i, label) in metrics.labels.iter().enumerate() {
            prop_assert_eq!(rows[i], metrics.per_class[i].support);
            prop_assert_eq!(rows[i], y_true.iter().filter(|t| *t == label).count());
            prop_assert_eq!(cols[i], y_pred.iter().filter(|p| *p == label).count());
        }
        prop_assert_eq!(rows.iter().sum::<usize>(), y_true.len());
    }

    #[test]
    fn prop_scores_are_bounded((y_true, y_pred) in pairs()) {
        let metrics = score(&y_true, &y_pred).unwrap();
        prop_assert!((0.0..=1.0).contains(&metrics.accuracy));
        prop_assert!((0.0..=1.0).contains(&metrics.similarity_rate()));
        for class in &metrics.per_class {
            prop_assert!((0.0..=1.0).contains(&class.f1));
        }
        for w in metrics.labels.windows(2) {
            prop_assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn prop_identical_sequences_score_one((y_true, _) in pairs()) {
        let metrics = score(&y_true, &y_true).unwrap();
        prop_assert!((metrics.accuracy - 1.0).abs() < 1e-9);
        prop_assert!((metrics.similarity_rate() - 1.0).abs() < 1e-9);
        prop_assert!((metrics.macro_avg.f1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_agreement_matches_accuracy((y_true, y_pred) in pairs()) {
        let metrics = score(&y_true, &y_pred).unwrap();
        let a = agreement(&y_true, &y_true, &y_pred).unwrap();
        prop_assert!((a.rate - metrics.accuracy).abs() < 1e-9);
        prop_assert_eq!(a.groups.values().map(|g| g.total).sum::<usize>(), y_true.len());
    }
}

#[test]
fn test_length_mismatch_rejected() {
    let y_true = vec!["bug".to_string()];
    assert!(score(&y_true, &[]).is_err());
}
