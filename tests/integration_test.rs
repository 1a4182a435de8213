//! Integration tests for the PreviewController facade
//!
//! These tests drive the public API the way a host application would:
//! - Full prepare → play → export session against a scripted backend
//! - Error propagation from the backend to the caller
//! - Subscription lifecycle across controller disposal

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use preview_audio_player::testing::ScriptedBackend;
use preview_audio_player::{
    BackendError, BackendErrorCodes, ErrorCode, Operation, Platform, PlaybackEvent,
    PrepareRequest, PreviewController,
};

fn controller_with(backend: ScriptedBackend) -> (PreviewController, Arc<ScriptedBackend>) {
    let events = backend.events();
    let backend = Arc::new(backend);
    (PreviewController::new(backend.clone(), events), backend)
}

/// prepare → play → export against a backend configured to export to
/// /tmp/out.wav
#[tokio::test]
async fn test_prepare_play_export_session() {
    let (controller, backend) =
        controller_with(ScriptedBackend::new(Platform::Ios).with_export_path("/tmp/out.wav"));

    controller
        .prepare(PrepareRequest::new("a.wav", "b.wav", "c.wav", 0.0))
        .await
        .expect("prepare should succeed");
    controller.play().await.expect("play should succeed");
    let exported = controller.export().await.expect("export should succeed");

    assert_eq!(exported, PathBuf::from("/tmp/out.wav"));
    assert_eq!(
        backend.operations(),
        vec![Operation::Prepare, Operation::Play, Operation::Export]
    );

    let prepare_args = &backend.calls()[0].args;
    assert_eq!(prepare_args["original_vocal_path"], "a.wav");
    assert_eq!(prepare_args["processed_vocal_path"], "b.wav");
    assert_eq!(prepare_args["background_path"], "c.wav");
    assert_eq!(prepare_args["recording_start_time"], 0.0);
}

/// Same session on Android, where the native method names differ
#[tokio::test]
async fn test_android_session_uses_same_facade() {
    let (controller, _backend) =
        controller_with(ScriptedBackend::new(Platform::Android).with_export_path("/tmp/out.wav"));

    assert_eq!(controller.platform(), Platform::Android);
    controller
        .prepare(PrepareRequest::new("a.wav", "b.wav", "c.wav", 0.0))
        .await
        .unwrap();
    controller.pause().await.unwrap();
    controller.unpause().await.unwrap();
    assert_eq!(
        controller.export().await.unwrap(),
        PathBuf::from("/tmp/out.wav")
    );
}

/// A failing engine surfaces the exact error it produced
#[tokio::test]
async fn test_prepare_failure_is_reported() {
    let err = BackendError::new(BackendErrorCodes::IO, "background track missing");
    let (controller, _backend) =
        controller_with(ScriptedBackend::new(Platform::Ios).failing_with(err.clone()));

    let result = controller
        .prepare(PrepareRequest::new("a.wav", "b.wav", "missing.wav", 0.0))
        .await;
    let reported = result.unwrap_err();
    assert_eq!(reported, err);
    assert_eq!(reported.code(), BackendErrorCodes::IO);
}

/// Dropping a pending result does not prevent the operation from running
#[test]
fn test_fire_and_forget_operations() {
    let (controller, backend) = controller_with(ScriptedBackend::new(Platform::Ios));

    let _ = controller.set_volume(0.2, 0.9);
    let _ = controller.seek_to_time(12.0);

    assert_eq!(
        backend.operations(),
        vec![Operation::SetVolume, Operation::SeekToTime]
    );
}

/// Subscriptions stop delivering after dispose
#[test]
fn test_dispose_stops_callbacks() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build test runtime");
    let (controller, backend) = controller_with(ScriptedBackend::new(Platform::Ios));
    let (tx, rx) = mpsc::channel();

    controller.set_audio_playback_progress_update_subscription(Some(Box::new(move |time| {
        let _ = tx.send(time);
    })));
    backend.emit(PlaybackEvent::ProgressUpdate { current_time: 0.5 });
    assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 0.5);

    runtime
        .block_on(controller.dispose())
        .expect("release should succeed");
    backend.emit(PlaybackEvent::ProgressUpdate { current_time: 1.0 });

    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}
