//! Failure isolation, lock recovery and the startup backstop

use std::sync::Arc;
use std::time::Duration;

use pairsync_core::{
    Clock, ConflictNotifier, CopyDirection, Daemon, DaemonEvent, LockAttempt, LockRecord,
    LogNotifier, ManualClock, SyncOutcome,
};
use pairsync_fs::NormalizedPath;
use pairsync_test_utils::PairFixture;
use pretty_assertions::assert_eq;

fn start(fixture: &PairFixture, clock: &Arc<ManualClock>) -> Daemon {
    Daemon::start(
        fixture.layout().clone(),
        Arc::new(LogNotifier) as Arc<dyn ConflictNotifier>,
        clock.clone() as Arc<dyn Clock>,
    )
    .unwrap()
}

/// Leave a lock file behind as a crashed process would.
fn abandon_lock(daemon: &Daemon, path: &NormalizedPath, age: Duration, now: std::time::SystemTime) {
    let record = LockRecord {
        path: path.as_str().to_string(),
        pid: 4_000_000,
        acquired_at: (now - age).into(),
        cooldown_until: None,
    };
    let lock_path = daemon.coordinator().locks().lock_path(path);
    std::fs::write(lock_path.to_native(), serde_json::to_vec(&record).unwrap()).unwrap();
}

#[test]
fn one_broken_pair_does_not_stop_the_others() {
    let fixture = PairFixture::new();
    let broken = fixture.pair("broken", "broken.md");
    let healthy = fixture.pair("healthy", "healthy.md");
    fixture.write(&broken.source, "text\n");
    std::fs::create_dir_all(broken.target.to_native()).unwrap();
    fixture.write(&healthy.source, "fine\n");
    fixture.write_config(&[broken.clone(), healthy.clone()], None);

    let clock = Arc::new(ManualClock::starting_now());
    let daemon = start(&fixture, &clock);

    fixture.assert_content(&healthy.target, "fine\n");
    clock.advance(Duration::from_secs(2));
    let reports = daemon.coordinator().initial_sync();
    assert!(reports[0].result.is_err());
    assert!(reports[1].result.is_ok());
}

#[test]
fn vanished_file_leaves_the_partner_alone() {
    let fixture = PairFixture::new();
    let pair = fixture.pair("notes", "notes.md");
    fixture.write(&pair.source, "keep me\n");
    fixture.write_config(&[pair.clone()], None);
    let clock = Arc::new(ManualClock::starting_now());
    let mut daemon = start(&fixture, &clock);

    fixture.remove(&pair.source);
    clock.advance(Duration::from_secs(2));

    assert_eq!(
        daemon.handle_event(&pair.source),
        DaemonEvent::Synced(SyncOutcome::SourceMissing)
    );
    fixture.assert_content(&pair.target, "keep me\n");
}

#[test]
fn live_lock_drops_events_until_released() {
    let fixture = PairFixture::new();
    let pair = fixture.pair("notes", "notes.md");
    fixture.write(&pair.source, "v1\n");
    fixture.write_config(&[pair.clone()], Some(serde_json::json!({ "cooldown_ms": 0 })));
    let clock = Arc::new(ManualClock::starting_now());
    let mut daemon = start(&fixture, &clock);

    abandon_lock(&daemon, &pair.source, Duration::from_secs(10), clock.now());
    fixture.write(&pair.source, "v2\n");

    assert_eq!(
        daemon.handle_event(&pair.source),
        DaemonEvent::Synced(SyncOutcome::Locked { owner_pid: 4_000_000 })
    );
    fixture.assert_content(&pair.target, "v1\n");

    // Past the staleness limit the lock is reclaimed.
    clock.advance(Duration::from_secs(300));
    assert_eq!(
        daemon.handle_event(&pair.source),
        DaemonEvent::Synced(SyncOutcome::Copied(CopyDirection::ToPartner))
    );
    fixture.assert_content(&pair.target, "v2\n");
}

#[test]
fn startup_sweeps_abandoned_locks_and_catches_up() {
    let fixture = PairFixture::new();
    let pair = fixture.pair("notes", "notes.md");
    fixture.write(&pair.source, "v1\n");
    fixture.write_config(&[pair.clone()], Some(serde_json::json!({ "cooldown_ms": 0 })));
    let clock = Arc::new(ManualClock::starting_now());
    let daemon = start(&fixture, &clock);

    // A crash while syncing an edit: the event is lost with the process.
    abandon_lock(&daemon, &pair.source, Duration::from_secs(3600), clock.now());
    fixture.write(&pair.source, "v2\n");
    drop(daemon);

    let daemon = start(&fixture, &clock);

    fixture.assert_content(&pair.target, "v2\n");
    let lock_path = daemon.coordinator().locks().lock_path(&pair.source);
    assert!(!lock_path.exists());
}

#[test]
fn dropped_event_is_recovered_by_the_next_startup() {
    let fixture = PairFixture::new();
    let pair = fixture.pair("notes", "notes.md");
    fixture.write(&pair.source, "v1\n");
    fixture.write_config(&[pair.clone()], Some(serde_json::json!({ "cooldown_ms": 0 })));
    let clock = Arc::new(ManualClock::starting_now());
    let mut daemon = start(&fixture, &clock);

    let attempt = daemon.coordinator().locks().try_acquire(&pair.source).unwrap();
    let LockAttempt::Acquired(guard) = attempt else {
        panic!("lock should be free");
    };
    fixture.write(&pair.source, "v2\n");
    assert!(matches!(
        daemon.handle_event(&pair.source),
        DaemonEvent::Synced(SyncOutcome::Locked { .. })
    ));
    drop(guard);
    fixture.assert_content(&pair.target, "v1\n");

    let reports = daemon.reload();

    assert_eq!(
        *reports[0].result.as_ref().unwrap(),
        SyncOutcome::Copied(CopyDirection::ToPartner)
    );
    fixture.assert_content(&pair.target, "v2\n");
}

#[test]
fn binary_pairs_follow_the_newer_file() {
    let fixture = PairFixture::new();
    let pair = fixture.pair("image", "image.png");
    fixture.write_bytes(&pair.target, &[0x89, b'P', b'N', b'G', 0, 1]);
    fixture.age(&pair.target, 120);
    fixture.write_bytes(&pair.source, &[0x89, b'P', b'N', b'G', 0, 2]);
    fixture.write_config(&[pair.clone()], None);
    let clock = Arc::new(ManualClock::starting_now());

    let daemon = start(&fixture, &clock);

    assert_eq!(
        pairsync_fs::io::read_bytes(&pair.target).unwrap(),
        vec![0x89, b'P', b'N', b'G', 0, 2]
    );
    assert!(
        !daemon
            .coordinator()
            .snapshots()
            .contains(&pair.key())
            .unwrap()
    );
}
