//! End-to-end tests of the controller over the simulated engine
//!
//! Playback positions are driven by a manual clock so preview windows and
//! auto-stop can be checked deterministically.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use preview_audio_player::backend::{ManualTimeSource, SimulatedBackend};
use preview_audio_player::config::SimulationConfig;
use preview_audio_player::{
    BackendErrorCodes, ErrorCode, Platform, PlaybackEventEmitter, PlayerConfig, PrepareRequest,
    PreviewController,
};

fn simulation_config() -> SimulationConfig {
    SimulationConfig {
        default_track_duration_secs: 20.0,
        default_preview_duration_secs: 5.0,
        probe_wav_headers: false,
        progress_updates_per_second: 100,
        export_dir: PathBuf::from("/exports"),
        ..SimulationConfig::default()
    }
}

fn simulated_controller(platform: Platform) -> (PreviewController, Arc<ManualTimeSource>) {
    let clock = Arc::new(ManualTimeSource::new());
    let events = PlaybackEventEmitter::new(512);
    let backend = SimulatedBackend::with_time_source(
        platform,
        simulation_config(),
        events.clone(),
        clock.clone(),
    );
    (PreviewController::new(Arc::new(backend), events), clock)
}

fn request() -> PrepareRequest {
    PrepareRequest::new("original.wav", "processed.wav", "background.wav", 2.0)
}

#[tokio::test]
async fn test_preview_window_plays_and_finishes() {
    let (controller, clock) = simulated_controller(Platform::Ios);
    let (progress_tx, progress_rx) = mpsc::channel();
    let (finished_tx, finished_rx) = mpsc::channel();

    controller.set_audio_playback_progress_update_subscription(Some(Box::new(move |time| {
        let _ = progress_tx.send(time);
    })));
    controller.set_audio_playback_finished_subscription(Some(Box::new(move |finished| {
        let _ = finished_tx.send(finished);
    })));

    controller.prepare(request()).await.unwrap();
    controller.set_preview_at(4.0, 3.0).await.unwrap();
    assert_eq!(controller.preview_start_time().await, Ok(4.0));
    assert_eq!(controller.preview_duration().await, Ok(3.0));

    controller.play_preview().await.unwrap();
    let first = progress_rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!((4.0..7.0).contains(&first), "progress {} outside window", first);

    clock.advance(Duration::from_secs(4));
    assert!(finished_rx.recv_timeout(Duration::from_secs(2)).unwrap());

    // Auto-stop leaves the session stopped at the beginning.
    assert_eq!(controller.current_time().await, Ok(0.0));
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_transport_and_state_rules() {
    let (controller, clock) = simulated_controller(Platform::Ios);

    let err = controller.play().await.unwrap_err();
    assert_eq!(err.code(), BackendErrorCodes::NOT_PREPARED);

    controller.prepare(request()).await.unwrap();
    assert_eq!(controller.playback_duration().await, Ok(20.0));

    controller.play_at(10.0).await.unwrap();
    clock.advance(Duration::from_millis(1500));
    controller.pause().await.unwrap();
    assert_eq!(controller.current_time().await, Ok(11.5));

    let err = controller.play().await.unwrap_err();
    assert_eq!(err.code(), BackendErrorCodes::INVALID_STATE);

    controller.seek_by_time_offset(-5.0).await.unwrap();
    assert_eq!(controller.current_time().await, Ok(6.5));
    controller.seek_to_time(100.0).await.unwrap();
    assert_eq!(controller.current_time().await, Ok(20.0));

    controller.unpause().await.unwrap();
    controller.stop().await.unwrap();
    assert_eq!(controller.current_time().await, Ok(0.0));
}

#[tokio::test]
async fn test_track_selection_and_export() {
    let (controller, _clock) = simulated_controller(Platform::Ios);
    controller.prepare(request()).await.unwrap();

    assert_eq!(
        controller.selected_vocal_track_path().await,
        Ok(PathBuf::from("processed.wav"))
    );
    controller.switch_to_original_vocal_track().await.unwrap();
    assert_eq!(
        controller.selected_vocal_track_path().await,
        Ok(PathBuf::from("original.wav"))
    );

    let full = controller.export().await.unwrap();
    assert!(full.starts_with("/exports"));
    assert_eq!(full.extension().and_then(|ext| ext.to_str()), Some("aac"));

    let chosen = controller
        .export_preview_to_file("/tmp/preview.aac")
        .await
        .unwrap();
    assert_eq!(chosen, PathBuf::from("/tmp/preview.aac"));
}

#[tokio::test]
async fn test_android_capability_gaps() {
    let (controller, _clock) = simulated_controller(Platform::Android);
    controller.prepare(request()).await.unwrap();

    for err in [
        controller.seek_by_time_offset(1.0).await.unwrap_err(),
        controller.export_preview().await.unwrap_err(),
        controller.selected_vocal_track_path().await.map(|_| ()).unwrap_err(),
    ] {
        assert_eq!(err.code(), BackendErrorCodes::NOT_SUPPORTED);
    }

    assert!(controller.export().await.is_ok());
}

#[tokio::test]
async fn test_controller_from_default_config() {
    let config = PlayerConfig {
        platform: Some(Platform::Android),
        ..PlayerConfig::default()
    };
    let controller = PreviewController::from_config(&config);
    assert_eq!(controller.platform(), Platform::Android);

    controller.prepare(request()).await.unwrap();
    assert_eq!(
        controller.playback_duration().await,
        Ok(config.simulation.default_track_duration_secs)
    );
}

/// Huge or negative finite arguments are clamped and the engine keeps
/// answering afterwards
#[tokio::test]
async fn test_extreme_times_keep_engine_alive() {
    let (controller, _clock) = simulated_controller(Platform::Ios);
    controller.prepare(request()).await.unwrap();

    // Paused, so the ticker cannot auto-stop at the track end mid-test.
    controller.play().await.unwrap();
    controller.pause().await.unwrap();
    controller.seek_by_time_offset(f64::MAX).await.unwrap();
    assert_eq!(controller.current_time().await, Ok(20.0));
    controller.seek_by_time_offset(-1e300).await.unwrap();
    assert_eq!(controller.current_time().await, Ok(0.0));
    controller.stop().await.unwrap();

    controller.set_preview_at(1e300, 1e300).await.unwrap();
    assert_eq!(controller.preview_start_time().await, Ok(20.0));
    let exported = controller.export_preview().await.unwrap();
    assert!(exported.starts_with("/exports"));

    controller.play_preview().await.unwrap();
    controller.set_preview_start_time(-1e300).await.unwrap();
    assert_eq!(controller.preview_start_time().await, Ok(0.0));

    // The worker is still running.
    assert_eq!(controller.playback_duration().await, Ok(20.0));
    controller.dispose().await.unwrap();
}
