use driftline::{
    GameStateUpdate, InputFlags, PredictionConfig, PredictionReconciler, Sequence,
};
use proptest::prelude::*;

fn ack_state(ack: i64) -> GameStateUpdate {
    GameStateUpdate {
        last_processed_input: Sequence::new(ack),
        ..GameStateUpdate::default()
    }
}

#[test]
fn record_one_to_five_reconcile_at_three() {
    let mut reconciler: PredictionReconciler<InputFlags> = PredictionReconciler::new();
    for seq in 1..=5i64 {
        reconciler.record_input(Sequence::new(seq), InputFlags::default());
    }

    let state = ack_state(3);
    let mut corrections = 0;
    reconciler.reconcile(&state, |s| {
        corrections += 1;
        assert_eq!(s.last_processed_input, Sequence::new(3));
    });

    assert_eq!(corrections, 1);
    let remaining: Vec<_> = reconciler
        .history()
        .iter()
        .map(|r| r.sequence.as_i64())
        .collect();
    assert_eq!(remaining, vec![4, 5]);
}

#[test]
fn history_of_three_keeps_two_three_four() {
    let config = PredictionConfig {
        history_limit: 3,
        ..PredictionConfig::default()
    };
    let mut reconciler: PredictionReconciler<u32> =
        PredictionReconciler::with_config(config).unwrap();
    for seq in 1..=4i64 {
        reconciler.record_input(Sequence::new(seq), seq as u32);
    }

    let remaining: Vec<_> = reconciler
        .history()
        .iter()
        .map(|r| r.sequence.as_i64())
        .collect();
    assert_eq!(remaining, vec![2, 3, 4]);
}

#[test]
fn disabled_reconciliation_preserves_history() {
    let mut reconciler: PredictionReconciler<u32> =
        PredictionReconciler::with_config(PredictionConfig::record_only()).unwrap();
    for seq in 1..=4i64 {
        reconciler.record_input(Sequence::new(seq), 0);
    }

    let mut corrections = 0;
    reconciler.reconcile(&ack_state(4), |_| corrections += 1);
    assert_eq!(corrections, 0);
    assert_eq!(reconciler.len(), 4);
}

#[test]
fn null_watermark_is_nothing_to_reconcile() {
    let mut reconciler: PredictionReconciler<u32> = PredictionReconciler::new();
    reconciler.record_input(Sequence::new(1), 0);

    let mut corrections = 0;
    reconciler.reconcile(&GameStateUpdate::default(), |_| corrections += 1);
    assert_eq!(corrections, 0);
    assert_eq!(reconciler.len(), 1);
}

#[test]
fn clear_after_activity_leaves_empty_history() {
    let mut reconciler: PredictionReconciler<u32> = PredictionReconciler::new();
    for seq in 1..=10i64 {
        reconciler.record_input(Sequence::new(seq), 0);
    }
    reconciler.reconcile(&ack_state(4), |_| {});
    reconciler.clear();
    assert!(reconciler.history().is_empty());
    assert!(reconciler.last_acknowledged().is_null());
}

proptest! {
    /// For any record/reconcile interleaving, history length never exceeds the
    /// configured limit and retained entries are the most recently recorded
    /// ones, in insertion order.
    #[test]
    fn history_stays_bounded_and_ordered(
        limit in 1usize..32,
        record_count in 0usize..200,
        acks in proptest::collection::vec(0i64..200, 0..8),
    ) {
        let config = PredictionConfig {
            history_limit: limit,
            ..PredictionConfig::default()
        };
        let mut reconciler: PredictionReconciler<u32> =
            PredictionReconciler::with_config(config).unwrap();

        let mut ack_iter = acks.iter();
        for seq in 0..record_count as i64 {
            reconciler.record_input(Sequence::new(seq), seq as u32);
            prop_assert!(reconciler.len() <= limit);

            // interleave an occasional reconcile
            if seq % 50 == 49 {
                if let Some(&ack) = ack_iter.next() {
                    reconciler.reconcile(&ack_state(ack), |_| {});
                }
            }
        }

        // retained entries are a strictly increasing suffix of what was recorded
        let history = reconciler.history();
        prop_assert!(history.len() <= limit);
        for window in history.windows(2) {
            prop_assert!(window[0].sequence < window[1].sequence);
        }
        if let Some(last) = history.last() {
            prop_assert_eq!(last.sequence.as_i64(), record_count as i64 - 1);
        }
    }

    /// Reconciling at watermark N removes exactly the entries with
    /// sequence <= N and always invokes the correction exactly once.
    #[test]
    fn reconcile_partitions_history_at_watermark(
        record_count in 1usize..100,
        ack in 0i64..120,
    ) {
        let mut reconciler: PredictionReconciler<u32> = PredictionReconciler::new();
        for seq in 0..record_count as i64 {
            reconciler.record_input(Sequence::new(seq), 0);
        }

        let mut corrections = 0;
        reconciler.reconcile(&ack_state(ack), |_| corrections += 1);

        prop_assert_eq!(corrections, 1);
        for record in reconciler.history() {
            prop_assert!(record.sequence.as_i64() > ack);
        }
    }
}
