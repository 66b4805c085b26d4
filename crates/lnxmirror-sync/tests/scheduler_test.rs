//! Integration test: MirrorScheduler → Reconciler → real filesystem
//!
//! Runs the scheduler on paused tokio time so several periods pass
//! instantly, and changes the source between ticks.

mod common;

use std::sync::{Arc, Mutex};

use common::{snapshot, write_file, Fixture};
use lnxmirror_core::domain::OperationKind;
use lnxmirror_sync::MirrorScheduler;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn test_scheduler_picks_up_changes_between_ticks() {
    let fx = Fixture::new();
    write_file(&fx.src("first.txt"), b"1", 1_700_000_000);

    let token = CancellationToken::new();
    let scheduler = MirrorScheduler::from_secs(5, token.clone()).unwrap();
    let per_tick = Arc::new(Mutex::new(Vec::new()));

    let recorder = per_tick.clone();
    let ticks = scheduler
        .run(|tick| {
            match tick {
                2 => write_file(&fx.src("second.txt"), b"2", 1_700_000_000),
                3 => std::fs::remove_file(fx.src("first.txt")).unwrap(),
                _ => {}
            }
            let report = fx.mirror();
            recorder.lock().unwrap().push(report.mutations());
            if tick == 4 {
                token.cancel();
            }
        })
        .await;

    assert_eq!(ticks, 4);
    // copy first, copy second, delete first, nothing.
    assert_eq!(*per_tick.lock().unwrap(), vec![1, 1, 1, 0]);
    assert_eq!(
        fx.sink.kinds(),
        vec![OperationKind::Copy, OperationKind::Copy, OperationKind::Delete]
    );
    assert_eq!(snapshot(fx.source.path()), snapshot(fx.replica.path()));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_is_honored_at_next_tick_boundary() {
    let fx = Fixture::new();
    for i in 0..5 {
        write_file(&fx.src(&format!("f{i}.txt")), b"x", 1_700_000_000);
    }

    let token = CancellationToken::new();
    let scheduler = MirrorScheduler::from_secs(1, token.clone()).unwrap();

    let ticks = scheduler
        .run(|_| {
            // Cancelling mid-pass still lets this pass finish.
            token.cancel();
            fx.mirror();
        })
        .await;

    assert_eq!(ticks, 1);
    assert_eq!(fx.sink.count(OperationKind::Copy), 5);
}
