//! PreviewController: the platform-independent preview facade.
//!
//! Each operation forwards to the injected backend right away and returns a
//! [`Pending`] result. The controller validates nothing and never touches
//! backend errors. Besides the pair of event subscriptions it only keeps the
//! app-level mix flag it stamps onto prepare requests.

use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::{
    create_backend, BackendHandle, Operation, Platform, PrepareRequest, PreviewBackend,
    PreviewWindow, TrackVolumes, VocalTrack,
};
use crate::completion::{self, Completion, Pending};
use crate::config::PlayerConfig;
use crate::events::PlaybackEventEmitter;
use crate::managers::SubscriptionManager;

#[path = "core_subscriptions.rs"]
mod core_subscriptions;

/// Facade over a preview backend and its event source.
pub struct PreviewController {
    platform: Platform,
    backend: Arc<dyn PreviewBackend>,
    /// App-level mixing choice applied to every prepared session.
    mix_audio_locally: Option<bool>,
    pub(crate) subscriptions: SubscriptionManager,
}

impl PreviewController {
    /// Wrap an existing backend and the event source it publishes on.
    pub fn new(backend: Arc<dyn PreviewBackend>, events: PlaybackEventEmitter) -> Self {
        Self {
            platform: backend.platform(),
            backend,
            mix_audio_locally: None,
            subscriptions: SubscriptionManager::new(events),
        }
    }

    /// Wrap a factory-made backend, applying the app-level settings from
    /// `config`.
    pub fn from_handle(handle: BackendHandle, config: &PlayerConfig) -> Self {
        Self::new(handle.backend, handle.events).with_mix_audio_locally(config.mix_audio_locally)
    }

    /// Create a controller for `platform` through the backend factory.
    pub fn for_platform(platform: Platform, config: &PlayerConfig) -> Self {
        Self::from_handle(create_backend(platform, config), config)
    }

    /// Create a controller for the configured (or compile-target) platform.
    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::for_platform(config.resolved_platform(), config)
    }

    /// Override the mix flag of every request passed to [`Self::prepare`].
    pub fn with_mix_audio_locally(mut self, mix_audio_locally: bool) -> Self {
        self.mix_audio_locally = Some(mix_audio_locally);
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn dispatch<T>(
        &self,
        operation: Operation,
        call: impl FnOnce(&dyn PreviewBackend, Completion<T>),
    ) -> Pending<T> {
        let (done, pending) = completion::channel(operation.label());
        log::debug!(
            "[PreviewController] {} -> {}.{}",
            operation.label(),
            self.platform.native_module_name(),
            operation.native_name(self.platform)
        );
        call(self.backend.as_ref(), done);
        pending
    }

    // ========================================================================
    // SESSION SETUP
    // ========================================================================

    /// Prepare a new session from the given tracks, replacing any previous
    /// one. A configured mix flag replaces the request's own.
    pub fn prepare(&self, mut request: PrepareRequest) -> Pending<()> {
        if let Some(mix_audio_locally) = self.mix_audio_locally {
            request.mix_audio_locally = mix_audio_locally;
        }
        self.dispatch(Operation::Prepare, |backend, done| {
            backend.prepare(request, done)
        })
    }

    // ========================================================================
    // PLAYBACK CONTROL
    // ========================================================================

    pub fn play(&self) -> Pending<()> {
        self.dispatch(Operation::Play, |backend, done| backend.play(done))
    }

    /// Start playback at `start_time` seconds.
    pub fn play_at(&self, start_time: f64) -> Pending<()> {
        self.dispatch(Operation::PlayAt, |backend, done| {
            backend.play_at(start_time, done)
        })
    }

    pub fn pause(&self) -> Pending<()> {
        self.dispatch(Operation::Pause, |backend, done| backend.pause(done))
    }

    pub fn unpause(&self) -> Pending<()> {
        self.dispatch(Operation::Unpause, |backend, done| backend.unpause(done))
    }

    pub fn stop(&self) -> Pending<()> {
        self.dispatch(Operation::Stop, |backend, done| backend.stop(done))
    }

    // ========================================================================
    // PREVIEW WINDOW
    // ========================================================================

    pub fn set_preview_start_time(&self, start_time: f64) -> Pending<()> {
        self.dispatch(Operation::SetPreviewStartTime, |backend, done| {
            backend.set_preview_start_time(start_time, done)
        })
    }

    /// Set preview start and duration in one backend call.
    pub fn set_preview_at(&self, start_time: f64, duration: f64) -> Pending<()> {
        let window = PreviewWindow {
            start: start_time,
            duration,
        };
        self.dispatch(Operation::SetPreviewAt, |backend, done| {
            backend.set_preview_window(window, done)
        })
    }

    pub fn preview_start_time(&self) -> Pending<f64> {
        self.dispatch(Operation::PreviewStartTime, |backend, done| {
            backend.preview_start_time(done)
        })
    }

    pub fn preview_duration(&self) -> Pending<f64> {
        self.dispatch(Operation::PreviewDuration, |backend, done| {
            backend.preview_duration(done)
        })
    }

    /// Play the preview window of the prepared audio.
    pub fn play_preview(&self) -> Pending<()> {
        self.dispatch(Operation::PlayPreview, |backend, done| {
            backend.play_preview(done)
        })
    }

    // ========================================================================
    // TRANSPORT
    // ========================================================================

    pub fn current_time(&self) -> Pending<f64> {
        self.dispatch(Operation::CurrentTime, |backend, done| {
            backend.current_time(done)
        })
    }

    pub fn seek_to_time(&self, time: f64) -> Pending<()> {
        self.dispatch(Operation::SeekToTime, |backend, done| {
            backend.seek_to_time(time, done)
        })
    }

    /// Move the playback position by `offset` seconds (may be negative).
    pub fn seek_by_time_offset(&self, offset: f64) -> Pending<()> {
        self.dispatch(Operation::SeekByTimeOffset, |backend, done| {
            backend.seek_by_time_offset(offset, done)
        })
    }

    pub fn playback_duration(&self) -> Pending<f64> {
        self.dispatch(Operation::PlaybackDuration, |backend, done| {
            backend.playback_duration(done)
        })
    }

    // ========================================================================
    // MIXING AND TRACKS
    // ========================================================================

    /// Set vocal and background gains. Values are expected in `[0, 1]`;
    /// anything else is up to the backend.
    pub fn set_volume(&self, vocal: f32, background: f32) -> Pending<()> {
        let volumes = TrackVolumes { vocal, background };
        self.dispatch(Operation::SetVolume, |backend, done| {
            backend.set_volume(volumes, done)
        })
    }

    pub fn switch_to_original_vocal_track(&self) -> Pending<()> {
        self.dispatch(Operation::SwitchToOriginalVocalTrack, |backend, done| {
            backend.switch_vocal_track(VocalTrack::Original, done)
        })
    }

    pub fn switch_to_processed_vocal_track(&self) -> Pending<()> {
        self.dispatch(Operation::SwitchToProcessedVocalTrack, |backend, done| {
            backend.switch_vocal_track(VocalTrack::Processed, done)
        })
    }

    pub fn selected_vocal_track_path(&self) -> Pending<PathBuf> {
        self.dispatch(Operation::SelectedVocalTrackPath, |backend, done| {
            backend.selected_vocal_track_path(done)
        })
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    /// Render the full session; resolves to the output file location.
    pub fn export(&self) -> Pending<PathBuf> {
        self.dispatch(Operation::Export, |backend, done| backend.export(done))
    }

    pub fn export_to_file(&self, output_path: impl Into<PathBuf>) -> Pending<PathBuf> {
        let output_path = output_path.into();
        self.dispatch(Operation::ExportToFile, |backend, done| {
            backend.export_to_file(output_path, done)
        })
    }

    /// Render only the preview window.
    pub fn export_preview(&self) -> Pending<PathBuf> {
        self.dispatch(Operation::ExportPreview, |backend, done| {
            backend.export_preview(done)
        })
    }

    pub fn export_preview_to_file(&self, output_path: impl Into<PathBuf>) -> Pending<PathBuf> {
        let output_path = output_path.into();
        self.dispatch(Operation::ExportPreviewToFile, |backend, done| {
            backend.export_preview_to_file(output_path, done)
        })
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Release subscriptions and backend resources.
    pub fn dispose(self) -> Pending<()> {
        self.unsubscribe_from_listening();
        self.dispatch(Operation::Release, |backend, done| backend.release(done))
    }
}
