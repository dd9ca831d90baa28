//! Integration tests for attendance control: selection, adjustment and atomicity.

use roster_console::{
    apply_adjustment, AdjustmentReport, ConsoleError, ControlDesk, Direction, Player,
    PlayerStatus, Roster, SelectionSession, SelectionState, SqliteStore,
};
use rusqlite::Connection;
use std::cell::Cell;
use std::time::{Duration, Instant};

const OPERATOR: i64 = 1001;

/// Roster with the given counts; everyone ends up Normal so they are eligible.
fn roster(players: &[(&str, u32)]) -> SqliteStore {
    let store = SqliteStore::in_memory().unwrap();
    seed(&store, players);
    store
}

fn seed(store: &SqliteStore, players: &[(&str, u32)]) {
    for (name, count) in players {
        store.create_player(name).unwrap();
        for _ in 0..*count {
            store
                .apply_partitioned_update(&[], &[name.to_string()])
                .unwrap();
        }
        if store.find_player(name).unwrap().unwrap().status != PlayerStatus::Normal {
            store.toggle_status(name).unwrap();
        }
    }
}

fn player(store: &SqliteStore, name: &str) -> Player {
    store.find_player(name).unwrap().unwrap()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn scenario_selects_b_and_increments_the_rest() {
    let store = roster(&[("Alpha", 0), ("Bravo", 3), ("Charlie", 5)]);
    let mut desk = ControlDesk::new();
    let handle = desk.start_session(&store, OPERATOR).unwrap();

    desk.submit_name(handle, "Bravo").unwrap();
    let partition = desk.request_review(handle).unwrap();
    assert_eq!(partition.selected, names(&["Bravo"]));
    assert_eq!(partition.complement, names(&["Alpha", "Charlie"]));

    let report = desk.confirm_and_apply(&store, handle).unwrap();
    assert_eq!(
        report,
        AdjustmentReport {
            incremented: 2,
            decremented: 1
        }
    );
    assert!(desk.is_empty());

    let a = player(&store, "Alpha");
    assert_eq!((a.count, a.direction), (1, Direction::Increment));
    let b = player(&store, "Bravo");
    assert_eq!((b.count, b.direction), (2, Direction::Decrement));
    let c = player(&store, "Charlie");
    assert_eq!((c.count, c.status), (6, PlayerStatus::Escalated));
}

#[test]
fn empty_selection_increments_everyone() {
    let store = roster(&[("Alpha", 0), ("Bravo", 1)]);
    let mut desk = ControlDesk::new();
    let handle = desk.start_session(&store, OPERATOR).unwrap();

    let partition = desk.request_review(handle).unwrap();
    assert!(partition.selected.is_empty());
    desk.confirm_and_apply(&store, handle).unwrap();

    assert_eq!(player(&store, "Alpha").count, 1);
    assert_eq!(player(&store, "Bravo").count, 2);
}

#[test]
fn ghost_is_not_eligible_and_leaves_selection_alone() {
    let store = roster(&[("Alpha", 0)]);
    let mut desk = ControlDesk::new();
    let handle = desk.start_session(&store, OPERATOR).unwrap();
    desk.submit_name(handle, "Alpha").unwrap();

    let err = desk.submit_name(handle, "Ghost").unwrap_err();
    assert!(matches!(err, ConsoleError::NotEligible(ref n) if n == "Ghost"));
    assert_eq!(desk.session(handle).unwrap().selected(), names(&["Alpha"]));
}

#[test]
fn players_on_leave_are_not_in_the_snapshot() {
    let store = roster(&[("Alpha", 0), ("Bravo", 0)]);
    store.toggle_status("Bravo").unwrap();
    let mut desk = ControlDesk::new();
    let handle = desk.start_session(&store, OPERATOR).unwrap();

    assert_eq!(desk.session(handle).unwrap().snapshot(), names(&["Alpha"]));
    assert!(matches!(
        desk.submit_name(handle, "Bravo"),
        Err(ConsoleError::NotEligible(_))
    ));
}

#[test]
fn adding_twice_keeps_one_entry() {
    let mut session = SelectionSession::start(["Alpha", "Bravo"]);
    session.add_candidate("Alpha").unwrap();
    session.add_candidate(" Alpha ").unwrap();
    assert_eq!(session.selected(), names(&["Alpha"]));
}

#[test]
fn removal_returns_to_collecting_and_next_review_recomputes() {
    let mut session = SelectionSession::start(["Alpha", "Bravo", "Charlie"]);
    session.add_candidate("Alpha").unwrap();
    session.add_candidate("Bravo").unwrap();
    let first = session.begin_review().unwrap();
    assert_eq!(first.complement, names(&["Charlie"]));

    assert_eq!(session.remove_by_index(0).unwrap(), "Alpha");
    assert_eq!(session.state(), &SelectionState::CollectingNames);
    assert!(session.partition().is_err());
    assert!(matches!(
        session.finalize(),
        Err(ConsoleError::InvalidSessionState { .. })
    ));

    let second = session.begin_review().unwrap();
    assert_eq!(second.selected, names(&["Bravo"]));
    assert_eq!(second.complement, names(&["Alpha", "Charlie"]));
}

#[test]
fn remove_out_of_range_keeps_review() {
    let mut session = SelectionSession::start(["Alpha"]);
    session.add_candidate("Alpha").unwrap();
    session.begin_review().unwrap();

    let err = session.remove_by_index(1).unwrap_err();
    assert!(matches!(err, ConsoleError::IndexOutOfRange { index: 1, len: 1 }));
    assert!(matches!(session.state(), SelectionState::Reviewing { .. }));
    assert_eq!(session.selected(), names(&["Alpha"]));
}

#[test]
fn operations_outside_their_state_are_rejected() {
    let mut session = SelectionSession::start(["Alpha"]);
    assert!(matches!(
        session.remove_by_index(0),
        Err(ConsoleError::InvalidSessionState { .. })
    ));
    session.begin_review().unwrap();
    assert!(matches!(
        session.add_candidate("Alpha"),
        Err(ConsoleError::InvalidSessionState { .. })
    ));
    let partition = session.finalize().unwrap();
    assert_eq!(partition.complement, names(&["Alpha"]));
    assert!(session.cancel().is_err());
}

#[test]
fn cancel_drops_everything_without_touching_roster() {
    let store = roster(&[("Alpha", 2)]);
    let mut desk = ControlDesk::new();
    let handle = desk.start_session(&store, OPERATOR).unwrap();
    desk.submit_name(handle, "Alpha").unwrap();

    desk.cancel_session(handle).unwrap();
    assert!(matches!(
        desk.submit_name(handle, "Alpha"),
        Err(ConsoleError::SessionNotFound(_))
    ));
    assert_eq!(player(&store, "Alpha").count, 2);
}

#[test]
fn roster_changes_after_snapshot_do_not_leak_into_partition() {
    let store = roster(&[("Alpha", 0), ("Bravo", 0)]);
    let mut desk = ControlDesk::new();
    let handle = desk.start_session(&store, OPERATOR).unwrap();

    store.create_player("Latecomer").unwrap();
    assert!(store.delete_player("Bravo").unwrap());

    let partition = desk.request_review(handle).unwrap();
    assert_eq!(partition.complement, names(&["Alpha", "Bravo"]));

    let report = desk.confirm_and_apply(&store, handle).unwrap();
    // Bravo is gone: its update hits no row.
    assert_eq!(report.incremented, 1);
    assert_eq!(player(&store, "Latecomer").count, 0);
}

#[test]
fn clamp_at_zero_marks_direction() {
    let store = roster(&[("Alpha", 0), ("Bravo", 1)]);
    apply_adjustment(&store, &names(&["Alpha", "Bravo"]), &[]).unwrap();

    let a = player(&store, "Alpha");
    assert_eq!((a.count, a.direction), (0, Direction::Clamped));
    let b = player(&store, "Bravo");
    assert_eq!((b.count, b.direction), (0, Direction::Decrement));
}

#[test]
fn escalation_threshold_is_strictly_greater_than_three() {
    let store = roster(&[("Alpha", 2), ("Bravo", 3)]);
    apply_adjustment(&store, &[], &names(&["Alpha", "Bravo"])).unwrap();

    let a = player(&store, "Alpha");
    assert_eq!((a.count, a.status), (3, PlayerStatus::Normal));
    let b = player(&store, "Bravo");
    assert_eq!((b.count, b.status), (4, PlayerStatus::Escalated));
}

#[test]
fn decrement_does_not_de_escalate() {
    let store = roster(&[("Alpha", 3)]);
    apply_adjustment(&store, &[], &names(&["Alpha"])).unwrap();
    apply_adjustment(&store, &names(&["Alpha"]), &[]).unwrap();

    let a = player(&store, "Alpha");
    assert_eq!((a.count, a.status), (3, PlayerStatus::Escalated));
}

#[test]
fn duplicates_and_overlap_are_collapsed() {
    let store = roster(&[("Alpha", 1), ("Bravo", 1)]);
    let report = apply_adjustment(
        &store,
        &names(&["Alpha", "Alpha"]),
        &names(&["Bravo", "Bravo", "Alpha"]),
    )
    .unwrap();

    assert_eq!(
        report,
        AdjustmentReport {
            incremented: 1,
            decremented: 1
        }
    );
    assert_eq!(player(&store, "Alpha").count, 0);
    assert_eq!(player(&store, "Bravo").count, 2);
}

#[test]
fn failed_update_leaves_both_partitions_untouched() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(include_str!("../migrations/001_roster.sql"))
        .unwrap();
    conn.execute_batch(
        "CREATE TRIGGER refuse_poison BEFORE UPDATE ON players
         WHEN OLD.name = 'Poison'
         BEGIN SELECT RAISE(ABORT, 'poisoned row'); END;",
    )
    .unwrap();
    let store = SqliteStore::from_connection(conn).unwrap();
    seed(&store, &[("Alpha", 0), ("Charlie", 2)]);
    store.create_player("Poison").unwrap();

    // The complement update succeeds first, then the selected update aborts.
    let err = apply_adjustment(&store, &names(&["Poison"]), &names(&["Alpha", "Charlie"]))
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Persistence(_)));
    assert!(err.is_retryable());

    assert_eq!(player(&store, "Alpha").count, 0);
    assert_eq!(player(&store, "Alpha").direction, Direction::Neutral);
    assert_eq!(player(&store, "Charlie").count, 2);
    assert_eq!(player(&store, "Poison").count, 0);
}

/// Delegates to SQLite but refuses the batch update a set number of times.
struct FlakyRoster {
    inner: SqliteStore,
    failures_left: Cell<u32>,
}

impl Roster for FlakyRoster {
    fn list_eligible_player_names(&self) -> roster_console::Result<Vec<String>> {
        self.inner.list_eligible_player_names()
    }

    fn find_player(&self, name: &str) -> roster_console::Result<Option<Player>> {
        self.inner.find_player(name)
    }

    fn apply_partitioned_update(
        &self,
        selected: &[String],
        complement: &[String],
    ) -> roster_console::Result<AdjustmentReport> {
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(ConsoleError::Persistence(rusqlite::Error::InvalidQuery));
        }
        self.inner.apply_partitioned_update(selected, complement)
    }

    fn create_player(&self, name: &str) -> roster_console::Result<Player> {
        self.inner.create_player(name)
    }

    fn rename_player(&self, old_name: &str, new_name: &str) -> roster_console::Result<()> {
        self.inner.rename_player(old_name, new_name)
    }

    fn delete_player(&self, name: &str) -> roster_console::Result<bool> {
        self.inner.delete_player(name)
    }

    fn list_players(
        &self,
        status: Option<PlayerStatus>,
    ) -> roster_console::Result<Vec<Player>> {
        self.inner.list_players(status)
    }

    fn toggle_status(&self, name: &str) -> roster_console::Result<Player> {
        self.inner.toggle_status(name)
    }
}

#[test]
fn persistence_failure_keeps_session_for_retry() {
    let flaky = FlakyRoster {
        inner: roster(&[("Alpha", 1), ("Bravo", 1)]),
        failures_left: Cell::new(1),
    };
    let mut desk = ControlDesk::new();
    let handle = desk.start_session(&flaky, OPERATOR).unwrap();
    desk.submit_name(handle, "Alpha").unwrap();
    desk.request_review(handle).unwrap();

    let err = desk.confirm_and_apply(&flaky, handle).unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(
        desk.session(handle).unwrap().state(),
        SelectionState::Reviewing { .. }
    ));
    assert_eq!(player(&flaky.inner, "Alpha").count, 1);

    desk.confirm_and_apply(&flaky, handle).unwrap();
    assert_eq!(player(&flaky.inner, "Alpha").count, 0);
    assert_eq!(player(&flaky.inner, "Bravo").count, 2);
}

#[test]
fn idle_sessions_are_reaped() {
    let store = roster(&[("Alpha", 0)]);
    let mut desk = ControlDesk::new();
    let stale = desk.start_session(&store, OPERATOR).unwrap();
    let timeout = Duration::from_secs(60);

    assert_eq!(desk.reap_idle(Instant::now(), timeout), 0);
    assert_eq!(desk.reap_idle(Instant::now() + timeout, timeout), 1);
    assert!(matches!(
        desk.session(stale),
        Err(ConsoleError::SessionNotFound(_))
    ));
    assert_eq!(player(&store, "Alpha").count, 0);
}

#[test]
fn stored_update_matches_player_rules() {
    for start in 0..=5u32 {
        let store = roster(&[("Up", start), ("Down", start)]);
        apply_adjustment(&store, &names(&["Down"]), &names(&["Up"])).unwrap();

        let mut up = Player::new("Up");
        up.count = start;
        up.record_increment();
        let mut down = Player::new("Down");
        down.count = start;
        down.record_decrement();

        for (expected, stored) in [(up, player(&store, "Up")), (down, player(&store, "Down"))] {
            assert_eq!(
                (stored.count, stored.status, stored.direction),
                (expected.count, expected.status, expected.direction),
                "{} starting at {}",
                expected.name,
                start
            );
        }
    }
}
