//! Property tests: every review splits the snapshot into two disjoint halves.

use proptest::prelude::*;
use roster_console::SelectionSession;
use std::collections::HashSet;

fn roster_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[A-Z][a-z]{2,8}", 0..24).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn review_partitions_the_snapshot(
        snapshot in roster_names(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..32),
    ) {
        let mut session = SelectionSession::start(snapshot.clone());
        if !snapshot.is_empty() {
            for pick in &picks {
                session.add_candidate(pick.get(&snapshot).as_str()).unwrap();
            }
        }
        let partition = session.begin_review().unwrap();

        let selected: HashSet<&String> = partition.selected.iter().collect();
        let complement: HashSet<&String> = partition.complement.iter().collect();
        let all: HashSet<&String> = snapshot.iter().collect();

        prop_assert_eq!(selected.len(), partition.selected.len());
        prop_assert!(selected.is_disjoint(&complement));
        prop_assert_eq!(selected.union(&complement).copied().collect::<HashSet<_>>(), all);

        // Complement keeps snapshot order.
        let expected: Vec<&String> = snapshot.iter().filter(|n| !selected.contains(n)).collect();
        prop_assert_eq!(partition.complement.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn removal_then_review_still_partitions(
        snapshot in roster_names(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..16),
        drop_at in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!snapshot.is_empty());
        let mut session = SelectionSession::start(snapshot.clone());
        for pick in &picks {
            session.add_candidate(pick.get(&snapshot).as_str()).unwrap();
        }
        session.begin_review().unwrap();
        let index = drop_at.index(session.selected().len());
        let removed = session.remove_by_index(index).unwrap();

        let partition = session.begin_review().unwrap();
        prop_assert!(partition.complement.contains(&removed));
        prop_assert_eq!(partition.selected.len() + partition.complement.len(), snapshot.len());
    }
}
