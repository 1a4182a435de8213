//! Session state of the simulated preview engine.
//!
//! Tracks what a real engine would: the prepared tracks, the playback state
//! machine, the transport position, the preview window, volumes and the
//! selected vocal track. Positions are kept in milliseconds and converted to
//! seconds at the boundary.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::config::SimulationConfig;
use crate::error::BackendError;
use crate::events::PlaybackEvent;
use crate::time_units::{millis_to_secs, secs_to_millis};

use super::{
    ExportRange, PlaybackState, PrepareRequest, PreviewWindow, TimeSource, TrackVolumes,
    VocalTrack,
};

/// Everything a renderer needs to produce an export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPlan {
    pub vocal_path: PathBuf,
    pub background_path: PathBuf,
    pub volumes: TrackVolumes,
    pub range: ExportRange,
    pub start_time: f64,
    pub duration: f64,
    pub recording_start_time: f64,
    pub mix_audio_locally: bool,
    pub output_path: PathBuf,
}

pub struct SimulatedSession {
    config: SimulationConfig,
    clock: Arc<dyn TimeSource>,
    tracks: Option<PrepareRequest>,
    state: PlaybackState,
    duration_ms: i64,
    /// Position at `anchor`, or the frozen position when not playing.
    position_ms: i64,
    anchor: Option<Instant>,
    preview_start_ms: i64,
    preview_duration_ms: i64,
    preview_mode: bool,
    volumes: TrackVolumes,
    vocal_track: VocalTrack,
    last_export_stamp: u128,
}

impl SimulatedSession {
    pub fn new(config: SimulationConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            config,
            clock,
            tracks: None,
            state: PlaybackState::Unprepared,
            duration_ms: 0,
            position_ms: 0,
            anchor: None,
            preview_start_ms: 0,
            preview_duration_ms: 0,
            preview_mode: false,
            volumes: TrackVolumes::default(),
            vocal_track: VocalTrack::Processed,
            last_export_stamp: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn volumes(&self) -> TrackVolumes {
        self.volumes
    }

    pub fn vocal_track(&self) -> VocalTrack {
        self.vocal_track
    }

    pub fn is_preview_mode(&self) -> bool {
        self.preview_mode
    }

    // ========================================================================
    // SESSION SETUP
    // ========================================================================

    /// Load a new session, replacing any previous one.
    pub fn prepare(&mut self, request: PrepareRequest) -> Result<(), BackendError> {
        for path in [
            &request.original_vocal_path,
            &request.processed_vocal_path,
            &request.background_path,
        ] {
            if path.as_os_str().is_empty() {
                return Err(BackendError::invalid_argument("track path must not be empty"));
            }
            if self.config.require_existing_tracks {
                std::fs::metadata(path).map_err(|err| {
                    log::warn!(
                        "[SimulatedSession] Track {} unavailable: {}",
                        path.display(),
                        err
                    );
                    BackendError::from(err)
                })?;
            }
        }
        if !request.recording_start_time.is_finite() || request.recording_start_time < 0.0 {
            return Err(BackendError::invalid_argument(format!(
                "recording start time must be a non-negative number (got {})",
                request.recording_start_time
            )));
        }

        let duration_ms = self
            .probe_duration_ms(&request.background_path)
            .unwrap_or_else(|| secs_to_millis(self.config.default_track_duration_secs).max(0));

        self.duration_ms = duration_ms;
        self.position_ms = 0;
        self.anchor = None;
        self.preview_start_ms = 0;
        self.preview_duration_ms =
            secs_to_millis(self.config.default_preview_duration_secs).clamp(0, duration_ms);
        self.preview_mode = false;
        self.vocal_track = VocalTrack::Processed;
        self.state = PlaybackState::Stopped;
        self.tracks = Some(request);

        log::info!(
            "[SimulatedSession] Prepared session, duration={}ms",
            self.duration_ms
        );
        Ok(())
    }

    fn probe_duration_ms(&self, path: &Path) -> Option<i64> {
        if !self.config.probe_wav_headers {
            return None;
        }
        match hound::WavReader::open(path) {
            Ok(reader) => {
                let spec = reader.spec();
                if spec.sample_rate == 0 {
                    return None;
                }
                Some(reader.duration() as i64 * 1000 / spec.sample_rate as i64)
            }
            Err(err) => {
                log::debug!(
                    "[SimulatedSession] Could not probe {}: {}",
                    path.display(),
                    err
                );
                None
            }
        }
    }

    /// Drop the session and return to Unprepared.
    pub fn release(&mut self) {
        self.tracks = None;
        self.state = PlaybackState::Unprepared;
        self.anchor = None;
        self.position_ms = 0;
        self.duration_ms = 0;
        self.preview_mode = false;
    }

    // ========================================================================
    // PLAYBACK CONTROL
    // ========================================================================

    pub fn play(&mut self) -> Result<(), BackendError> {
        self.require_state("play", &[PlaybackState::Stopped])?;
        if self.position_ms >= self.duration_ms {
            self.position_ms = 0;
        }
        self.preview_mode = false;
        self.start_clock();
        Ok(())
    }

    pub fn play_at(&mut self, start_time: f64) -> Result<(), BackendError> {
        self.require_state("play_at", &[PlaybackState::Stopped, PlaybackState::Paused])?;
        let start_ms = self.checked_time_ms(start_time)?;
        self.position_ms = start_ms.clamp(0, self.duration_ms);
        self.preview_mode = false;
        self.start_clock();
        Ok(())
    }

    /// Pausing anything but a playing session does nothing.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.position_ms = self.position_ms_now();
            self.anchor = None;
            self.state = PlaybackState::Paused;
        }
    }

    pub fn unpause(&mut self) -> Result<(), BackendError> {
        self.require_state("unpause", &[PlaybackState::Paused])?;
        self.start_clock();
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.state == PlaybackState::Unprepared {
            return;
        }
        self.state = PlaybackState::Stopped;
        self.anchor = None;
        self.position_ms = 0;
        self.preview_mode = false;
    }

    pub fn play_preview(&mut self) -> Result<(), BackendError> {
        if self.state == PlaybackState::Unprepared {
            return Err(BackendError::not_prepared("play_preview"));
        }
        self.position_ms = self.preview_start_ms;
        self.preview_mode = true;
        self.start_clock();
        Ok(())
    }

    fn start_clock(&mut self) {
        self.anchor = Some(self.clock.now());
        self.state = PlaybackState::Playing;
    }

    fn require_state(
        &self,
        operation: &str,
        allowed: &[PlaybackState],
    ) -> Result<(), BackendError> {
        if self.state == PlaybackState::Unprepared {
            return Err(BackendError::not_prepared(operation));
        }
        if !allowed.contains(&self.state) {
            return Err(BackendError::invalid_state(operation, self.state));
        }
        Ok(())
    }

    fn checked_time_ms(&self, time: f64) -> Result<i64, BackendError> {
        if !time.is_finite() {
            return Err(BackendError::invalid_argument(format!(
                "time must be finite (got {})",
                time
            )));
        }
        Ok(secs_to_millis(time))
    }

    // ========================================================================
    // PREVIEW WINDOW
    // ========================================================================

    /// Preview bounds are kept within `[0, duration]`.
    pub fn set_preview_start_time(&mut self, start_time: f64) {
        if start_time.is_finite() {
            self.preview_start_ms = secs_to_millis(start_time).clamp(0, self.duration_ms);
        }
    }

    pub fn set_preview_window(&mut self, window: PreviewWindow) {
        if window.start.is_finite() && window.duration.is_finite() {
            self.preview_start_ms = secs_to_millis(window.start).clamp(0, self.duration_ms);
            self.preview_duration_ms = secs_to_millis(window.duration).clamp(0, self.duration_ms);
        }
    }

    pub fn preview_start_time(&self) -> f64 {
        millis_to_secs(self.preview_start_ms)
    }

    pub fn preview_duration(&self) -> f64 {
        millis_to_secs(self.preview_duration_ms)
    }

    fn preview_end_ms(&self) -> i64 {
        self.preview_start_ms
            .saturating_add(self.preview_duration_ms)
            .min(self.duration_ms)
    }

    // ========================================================================
    // TRANSPORT
    // ========================================================================

    fn position_ms_now(&self) -> i64 {
        let position = match self.anchor {
            Some(anchor) => {
                let elapsed = self.clock.now().saturating_duration_since(anchor);
                let elapsed_ms = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
                self.position_ms.saturating_add(elapsed_ms)
            }
            None => self.position_ms,
        };
        position.min(self.duration_ms)
    }

    pub fn current_time(&self) -> f64 {
        millis_to_secs(self.position_ms_now())
    }

    pub fn playback_duration(&self) -> f64 {
        millis_to_secs(self.duration_ms)
    }

    pub fn seek_to_time(&mut self, time: f64) {
        if time.is_finite() {
            self.move_to(secs_to_millis(time));
        }
    }

    pub fn seek_by_time_offset(&mut self, offset: f64) {
        if offset.is_finite() {
            let target = self.position_ms_now().saturating_add(secs_to_millis(offset));
            self.move_to(target);
        }
    }

    fn move_to(&mut self, target_ms: i64) {
        if self.state == PlaybackState::Unprepared {
            return;
        }
        self.position_ms = target_ms.clamp(0, self.duration_ms);
        if self.anchor.is_some() {
            self.anchor = Some(self.clock.now());
        }
    }

    // ========================================================================
    // MIXING AND TRACKS
    // ========================================================================

    /// Store volumes, clamped to `[0, 1]`.
    pub fn set_volume(&mut self, volumes: TrackVolumes) {
        fn clamp_gain(gain: f32) -> f32 {
            if gain.is_nan() {
                0.0
            } else {
                gain.clamp(0.0, 1.0)
            }
        }
        self.volumes = TrackVolumes {
            vocal: clamp_gain(volumes.vocal),
            background: clamp_gain(volumes.background),
        };
    }

    pub fn switch_vocal_track(&mut self, track: VocalTrack) {
        self.vocal_track = track;
    }

    pub fn selected_vocal_track_path(&self) -> Result<PathBuf, BackendError> {
        self.tracks
            .as_ref()
            .map(|tracks| tracks.vocal_path(self.vocal_track).to_path_buf())
            .ok_or_else(|| BackendError::not_prepared("selected_vocal_track_path"))
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    /// Describe the export of `range` with the current mix settings.
    pub fn plan_export(
        &mut self,
        range: ExportRange,
        output_path: Option<PathBuf>,
    ) -> Result<ExportPlan, BackendError> {
        let Some(tracks) = self.tracks.clone() else {
            return Err(BackendError::not_prepared("creating preview file"));
        };
        let (start_ms, end_ms) = match range {
            ExportRange::Full => (0, self.duration_ms),
            ExportRange::Preview => (self.preview_start_ms.min(self.duration_ms), self.preview_end_ms()),
        };
        let output_path = match output_path {
            Some(path) => path,
            None => self.next_export_path(),
        };

        Ok(ExportPlan {
            vocal_path: tracks.vocal_path(self.vocal_track).to_path_buf(),
            background_path: tracks.background_path.clone(),
            volumes: self.volumes,
            range,
            start_time: millis_to_secs(start_ms),
            duration: millis_to_secs((end_ms - start_ms).max(0)),
            recording_start_time: tracks.recording_start_time,
            mix_audio_locally: tracks.mix_audio_locally,
            output_path,
        })
    }

    fn next_export_path(&mut self) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or(0);
        // Keep names unique when exports land within the same millisecond.
        let stamp = now.max(self.last_export_stamp + 1);
        self.last_export_stamp = stamp;
        self.config.export_dir.join(format!(
            "{}{}.{}",
            self.config.export_file_prefix, stamp, self.config.export_extension
        ))
    }

    // ========================================================================
    // PROGRESS
    // ========================================================================

    /// Advance the engine by one progress tick.
    ///
    /// While playing, reports the current position and stops playback once
    /// the preview window (in preview mode) or the track has been played out.
    pub fn tick(&mut self) -> Vec<PlaybackEvent> {
        if self.state != PlaybackState::Playing {
            return Vec::new();
        }

        let position_ms = self.position_ms_now();
        let mut events = vec![PlaybackEvent::ProgressUpdate {
            current_time: millis_to_secs(position_ms),
        }];

        let end_ms = if self.preview_mode {
            self.preview_end_ms()
        } else {
            self.duration_ms
        };
        if position_ms >= end_ms {
            self.stop();
            events.push(PlaybackEvent::Finished { finished: true });
        }
        events
    }
}
