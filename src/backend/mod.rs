//! Backend abstractions for the preview controller.
//!
//! A backend owns the actual audio session. The controller only forwards
//! calls to it and hands over a [`Completion`] for each one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::completion::Completion;
use crate::config::PlayerConfig;
use crate::error::BackendError;
use crate::events::PlaybackEventEmitter;

mod platform;
mod session;
mod simulated;

pub use platform::{Operation, Platform};
pub use session::{ExportPlan, SimulatedSession};
pub use simulated::SimulatedBackend;

/// Tracks and options for a new preview session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareRequest {
    pub original_vocal_path: PathBuf,
    pub processed_vocal_path: PathBuf,
    pub background_path: PathBuf,
    /// Position in the background track (seconds) at which recording started.
    pub recording_start_time: f64,
    /// Whether the engine should mix with other audio playing on the device.
    pub mix_audio_locally: bool,
}

impl PrepareRequest {
    pub fn new(
        original_vocal_path: impl Into<PathBuf>,
        processed_vocal_path: impl Into<PathBuf>,
        background_path: impl Into<PathBuf>,
        recording_start_time: f64,
    ) -> Self {
        Self {
            original_vocal_path: original_vocal_path.into(),
            processed_vocal_path: processed_vocal_path.into(),
            background_path: background_path.into(),
            recording_start_time,
            mix_audio_locally: true,
        }
    }

    pub fn with_mix_audio_locally(mut self, mix_audio_locally: bool) -> Self {
        self.mix_audio_locally = mix_audio_locally;
        self
    }

    pub fn vocal_path(&self, track: VocalTrack) -> &Path {
        match track {
            VocalTrack::Original => &self.original_vocal_path,
            VocalTrack::Processed => &self.processed_vocal_path,
        }
    }
}

/// Sub-range of the prepared audio used by preview playback and export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewWindow {
    pub start: f64,
    pub duration: f64,
}

/// Normalized gains, expected in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackVolumes {
    pub vocal: f32,
    pub background: f32,
}

impl Default for TrackVolumes {
    fn default() -> Self {
        Self {
            vocal: 1.0,
            background: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VocalTrack {
    Original,
    Processed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportRange {
    Full,
    Preview,
}

/// Playback states of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Unprepared,
    Stopped,
    Playing,
    Paused,
}

/// Trait implemented by platform preview engines.
///
/// Every method must resolve its completion exactly once; a completion that
/// is dropped unresolved reaches the caller as `COMPLETION_DROPPED`.
/// Operations a platform lacks keep their default implementation, which
/// fails with `NOT_SUPPORTED`.
pub trait PreviewBackend: Send + Sync {
    fn platform(&self) -> Platform;

    fn prepare(&self, request: PrepareRequest, done: Completion<()>);
    fn play(&self, done: Completion<()>);
    fn play_at(&self, start_time: f64, done: Completion<()>);
    fn pause(&self, done: Completion<()>);
    fn unpause(&self, done: Completion<()>);
    fn stop(&self, done: Completion<()>);
    fn play_preview(&self, done: Completion<()>);

    fn set_preview_start_time(&self, start_time: f64, done: Completion<()>);
    fn set_preview_window(&self, window: PreviewWindow, done: Completion<()>);
    fn preview_start_time(&self, done: Completion<f64>);
    fn preview_duration(&self, done: Completion<f64>);

    fn current_time(&self, done: Completion<f64>);
    fn seek_to_time(&self, time: f64, done: Completion<()>);
    fn playback_duration(&self, done: Completion<f64>);

    fn set_volume(&self, volumes: TrackVolumes, done: Completion<()>);

    fn switch_vocal_track(&self, track: VocalTrack, done: Completion<()>);

    fn export(&self, done: Completion<PathBuf>);

    fn seek_by_time_offset(&self, offset: f64, done: Completion<()>) {
        let _ = offset;
        done.fail(BackendError::not_supported(
            Operation::SeekByTimeOffset.label(),
        ));
    }

    fn selected_vocal_track_path(&self, done: Completion<PathBuf>) {
        done.fail(BackendError::not_supported(
            Operation::SelectedVocalTrackPath.label(),
        ));
    }

    fn export_to_file(&self, output_path: PathBuf, done: Completion<PathBuf>) {
        let _ = output_path;
        done.fail(BackendError::not_supported(Operation::ExportToFile.label()));
    }

    fn export_preview(&self, done: Completion<PathBuf>) {
        done.fail(BackendError::not_supported(Operation::ExportPreview.label()));
    }

    fn export_preview_to_file(&self, output_path: PathBuf, done: Completion<PathBuf>) {
        let _ = output_path;
        done.fail(BackendError::not_supported(
            Operation::ExportPreviewToFile.label(),
        ));
    }

    /// Release engine resources. Engines without an explicit release step
    /// keep this default.
    fn release(&self, done: Completion<()>) {
        done.done();
    }
}

/// Backend plus the event source it publishes playback events on.
#[derive(Clone)]
pub struct BackendHandle {
    pub backend: Arc<dyn PreviewBackend>,
    pub events: PlaybackEventEmitter,
}

/// Single injection point resolving the backend for `platform`.
///
/// Native engines live outside this crate; the in-crate engine for every
/// platform is the [`SimulatedBackend`], which emulates that platform's
/// capability set.
pub fn create_backend(platform: Platform, config: &PlayerConfig) -> BackendHandle {
    let events = PlaybackEventEmitter::new(config.events.channel_capacity);
    let backend = SimulatedBackend::new(platform, config.simulation.clone(), events.clone());
    log::info!(
        "[Backend] Created simulated {} backend",
        platform.native_module_name()
    );
    BackendHandle {
        backend: Arc::new(backend),
        events,
    }
}

/// Trait representing a monotonic time source used for playback positions.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default time source backed by `Instant::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic time source that only moves when told to.
pub struct ManualTimeSource {
    start: Instant,
    offset_ms: AtomicU64,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        self.start + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}
