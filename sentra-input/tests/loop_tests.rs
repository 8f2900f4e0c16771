mod common;

use common::{rig, rig_with, QueueSource, RecordingEmitter};
use sentra_input::InputLoop;
use sentra_types::{EasingKind, MovementCommand};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn pattern() -> Vec<MovementCommand> {
    vec![
        MovementCommand::new(0, 12, 40.0, EasingKind::EaseOutQuad),
        MovementCommand::new(-3, 10, 40.0, EasingKind::EaseOutQuad),
        MovementCommand::new(4, 9, 40.0, EasingKind::Linear),
    ]
}

#[tokio::test(start_paused = true)]
async fn held_trigger_drains_the_source() {
    let rig = rig();
    let source = QueueSource::new(pattern());
    let input = InputLoop::new(rig.injector.clone(), source.clone())
        .with_poll_interval(Duration::from_millis(5));

    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { input.run(cancel).await }
    });

    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel.cancel();
    let stats = handle.await.unwrap();

    assert_eq!(stats.commands, 3);
    assert_eq!(stats.completed, 3);
    assert_eq!(source.remaining(), 0);
    assert_eq!(rig.emitter.total(), (1, 31));
}

#[tokio::test(start_paused = true)]
async fn released_trigger_pulls_nothing_and_resets_once() {
    let rig = rig();
    let source = QueueSource::new(pattern());
    let input = InputLoop::new(rig.injector.clone(), source.clone());

    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { input.run(cancel).await }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    rig.keys.release();
    tokio::time::sleep(Duration::from_millis(500)).await;
    let pulled = 3 - source.remaining();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(3 - source.remaining(), pulled);
    assert_eq!(source.resets.load(Ordering::SeqCst), 1);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn driver_failures_do_not_stop_the_loop() {
    let rig = rig_with(RecordingEmitter::offline());
    let source = QueueSource::new(pattern());
    let input = InputLoop::new(rig.injector.clone(), source.clone());

    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { input.run(cancel).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    let stats = handle.await.unwrap();
    assert_eq!(stats.commands, 3);
    assert_eq!(stats.failed, 3);
    assert!(rig.emitter.moves().is_empty());
}
