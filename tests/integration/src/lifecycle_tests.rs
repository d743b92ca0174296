//! End-to-end lifecycle of synced pairs through the daemon
//!
//! Events are delivered by hand, standing in for the file watcher. Time is a
//! manual clock, so cooldowns pass without sleeping.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use pairsync_core::{
    Clock, ConflictNotifier, CopyDirection, Daemon, DaemonEvent, ManualClock, Resolution,
    SyncOutcome,
};
use pairsync_merge::has_conflict_markers;
use pairsync_test_utils::{PairFixture, RecordingNotifier};
use pretty_assertions::assert_eq;

struct Running {
    daemon: Daemon,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<ManualClock>,
}

impl Running {
    fn start(fixture: &PairFixture) -> Self {
        Self::start_at(fixture, SystemTime::now())
    }

    fn start_at(fixture: &PairFixture, now: SystemTime) -> Self {
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::new(now));
        let daemon = Daemon::start(
            fixture.layout().clone(),
            notifier.clone() as Arc<dyn ConflictNotifier>,
            clock.clone() as Arc<dyn Clock>,
        )
        .unwrap();
        Self {
            daemon,
            notifier,
            clock,
        }
    }

    /// Deliver an event after the cooldown of any earlier event has passed.
    fn event(&mut self, path: &pairsync_fs::NormalizedPath) -> DaemonEvent {
        self.clock.advance(Duration::from_secs(2));
        self.daemon.handle_event(path)
    }
}

fn synced(outcome: SyncOutcome) -> DaemonEvent {
    DaemonEvent::Synced(outcome)
}

#[test]
fn edit_merge_conflict_resolve_cycle() {
    let fixture = PairFixture::new();
    let pair = fixture.pair("notes", "notes.md");
    fixture.write(&pair.source, "L1\nL2\nL3\n");
    fixture.write_config(&[pair.clone()], None);

    let mut running = Running::start(&fixture);
    fixture.assert_content(&pair.target, "L1\nL2\nL3\n");

    // The watcher re-delivers the daemon's own work; the cooldown swallows it.
    assert_eq!(
        running.daemon.handle_event(&pair.source),
        synced(SyncOutcome::CoolingDown)
    );

    // A plain edit on one side.
    fixture.write(&pair.source, "L1x\nL2\nL3\n");
    assert_eq!(
        running.event(&pair.source),
        synced(SyncOutcome::Copied(CopyDirection::ToPartner))
    );
    fixture.assert_content(&pair.target, "L1x\nL2\nL3\n");

    // Edits on both sides in different places.
    fixture.write(&pair.source, "L0\nL1x\nL2\nL3\n");
    fixture.write(&pair.target, "L1x\nL2\nL3y\n");
    assert_eq!(running.event(&pair.target), synced(SyncOutcome::Merged));
    fixture.assert_content(&pair.source, "L0\nL1x\nL2\nL3y\n");
    fixture.assert_content(&pair.target, "L0\nL1x\nL2\nL3y\n");

    // Edits on both sides to the same line.
    fixture.write(&pair.source, "L0\nL1x\nL2\nmine\n");
    fixture.write(&pair.target, "L0\nL1x\nL2\ntheirs\n");
    assert_eq!(
        running.event(&pair.source),
        synced(SyncOutcome::Conflicted { count: 1 })
    );
    assert!(has_conflict_markers(&fixture.read(&pair.source)));
    assert_eq!(running.notifier.count(), 1);
    assert_eq!(
        running.event(&pair.target),
        synced(SyncOutcome::AwaitingResolution)
    );

    // The user fixes both files the same way.
    fixture.write(&pair.source, "L0\nL1x\nL2\nagreed\n");
    fixture.write(&pair.target, "L0\nL1x\nL2\nagreed\n");
    assert_eq!(
        running.event(&pair.source),
        synced(SyncOutcome::ConflictResolved(Resolution::Identical))
    );
    let coordinator = running.daemon.coordinator();
    assert!(coordinator.ledger().get_all().unwrap().is_empty());
    assert_eq!(
        coordinator.snapshots().load(&pair.key()).unwrap().as_deref(),
        Some("L0\nL1x\nL2\nagreed\n")
    );

    // Regular syncing resumes.
    fixture.write(&pair.target, "L0\nL1x\nL2\nagreed\nmore\n");
    assert_eq!(
        running.event(&pair.target),
        synced(SyncOutcome::Copied(CopyDirection::ToPartner))
    );
    fixture.assert_content(&pair.source, "L0\nL1x\nL2\nagreed\nmore\n");
}

#[test]
fn conflict_resolved_while_stopped_is_settled_at_startup() {
    let fixture = PairFixture::new();
    let pair = fixture.pair("notes", "notes.md");
    fixture.write(&pair.source, "A\n");
    fixture.write_config(&[pair.clone()], None);

    let stopped_at = {
        let mut running = Running::start(&fixture);
        fixture.write(&pair.source, "B\n");
        fixture.write(&pair.target, "C\n");
        assert_eq!(
            running.event(&pair.source),
            synced(SyncOutcome::Conflicted { count: 1 })
        );
        running.clock.now()
    };

    fixture.write(&pair.source, "B and C\n");
    let running = Running::start_at(&fixture, stopped_at + Duration::from_secs(60));

    fixture.assert_content(&pair.target, "B and C\n");
    assert!(
        running
            .daemon
            .coordinator()
            .ledger()
            .get(&pair.key())
            .unwrap()
            .is_none()
    );
}

#[test]
fn configuration_is_picked_up_once_fixed() {
    let fixture = PairFixture::new();
    let pair = fixture.pair("notes", "notes.md");
    fixture.write(&pair.source, "hello\n");
    fixture.write(fixture.layout().config_file(), "{ this is not json");

    let mut running = Running::start(&fixture);
    assert!(running.daemon.coordinator().pairs().is_empty());
    assert_eq!(
        running.event(&pair.source),
        synced(SyncOutcome::Untracked)
    );

    fixture.write_config(&[pair.clone()], None);
    let config = fixture.layout().config_file().clone();
    assert_eq!(running.event(&config), DaemonEvent::Reloaded { pairs: 1 });

    fixture.assert_content(&pair.target, "hello\n");
    assert!(running.daemon.watched_paths().contains(&pair.source));
}

#[test]
fn paths_are_matched_from_either_side() {
    let fixture = PairFixture::new();
    let first = fixture.pair("first", "first.md");
    let second = fixture.pair("second", "second.md");
    fixture.write(&first.source, "1\n");
    fixture.write(&second.target, "2\n");
    fixture.write_config(&[first.clone(), second.clone()], None);

    let mut running = Running::start(&fixture);
    fixture.assert_content(&first.target, "1\n");
    fixture.assert_content(&second.source, "2\n");

    fixture.write(&second.source, "2b\n");
    assert_eq!(
        running.event(&second.source),
        synced(SyncOutcome::Copied(CopyDirection::ToPartner))
    );
    fixture.assert_content(&second.target, "2b\n");
    fixture.assert_content(&first.target, "1\n");
}
