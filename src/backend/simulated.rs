//! Simulated preview engine.
//!
//! Runs a [`SimulatedSession`] on a dedicated worker thread with its own
//! Tokio runtime. Operations are queued to the worker and their completions
//! resolved from there, while a ticker publishes progress and finished events
//! on the backend's event source. No audio samples are read or written.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Builder;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::completion::Completion;
use crate::config::SimulationConfig;
use crate::error::{log_backend_error, BackendError};
use crate::events::PlaybackEventEmitter;

use super::{
    ExportRange, Operation, Platform, PrepareRequest, PreviewBackend, PreviewWindow,
    SimulatedSession, SystemTimeSource, TimeSource, TrackVolumes, VocalTrack,
};

type Job = Box<dyn FnOnce(&mut SimulatedSession) + Send>;

/// Backend emulating a platform engine's capability set and timing.
pub struct SimulatedBackend {
    platform: Platform,
    jobs: mpsc::UnboundedSender<Job>,
    events: PlaybackEventEmitter,
}

impl SimulatedBackend {
    pub fn new(platform: Platform, config: SimulationConfig, events: PlaybackEventEmitter) -> Self {
        Self::with_time_source(platform, config, events, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(
        platform: Platform,
        config: SimulationConfig,
        events: PlaybackEventEmitter,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let updates_per_second = config.progress_updates_per_second.max(1);
        let tick = Duration::from_secs_f64(1.0 / updates_per_second as f64);
        let session = SimulatedSession::new(config, clock);
        let (jobs, job_rx) = mpsc::unbounded_channel();

        Self::spawn_worker(session, job_rx, events.clone(), tick);

        Self {
            platform,
            jobs,
            events,
        }
    }

    /// Event source this backend publishes on.
    pub fn events(&self) -> PlaybackEventEmitter {
        self.events.clone()
    }

    fn spawn_worker(
        mut session: SimulatedSession,
        mut job_rx: mpsc::UnboundedReceiver<Job>,
        events: PlaybackEventEmitter,
        tick: Duration,
    ) {
        let spawned = std::thread::Builder::new()
            .name("preview-simulated-backend".to_string())
            .spawn(move || {
                let rt = match Builder::new_current_thread().enable_all().build() {
                    Ok(rt) => rt,
                    Err(err) => {
                        log::error!("[SimulatedBackend] Failed to create runtime: {}", err);
                        return;
                    }
                };

                rt.block_on(async move {
                    let mut ticker = tokio::time::interval(tick);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                    loop {
                        tokio::select! {
                            job = job_rx.recv() => match job {
                                Some(job) => job(&mut session),
                                None => break,
                            },
                            _ = ticker.tick() => {
                                for event in session.tick() {
                                    events.emit(event);
                                }
                            }
                        }
                    }
                    log::debug!("[SimulatedBackend] Worker stopped");
                });
            });

        // Without a worker every queued job is dropped, so callers observe
        // COMPLETION_DROPPED rather than hanging.
        if let Err(err) = spawned {
            log::error!("[SimulatedBackend] Failed to spawn worker: {}", err);
        }
    }

    /// Queue `work` for the worker and resolve `done` with its result.
    fn submit<T, F>(&self, operation: Operation, done: Completion<T>, work: F)
    where
        T: Send + 'static,
        F: FnOnce(&mut SimulatedSession) -> Result<T, BackendError> + Send + 'static,
    {
        let supported = self.platform.supports(operation);
        let job: Job = Box::new(move |session| {
            let result = if supported {
                work(session)
            } else {
                Err(BackendError::not_supported(operation.label()))
            };
            if let Err(err) = &result {
                log_backend_error(err, operation.label());
            }
            done.complete(result);
        });

        if self.jobs.send(job).is_err() {
            log::warn!(
                "[SimulatedBackend] Worker unavailable, dropping {}",
                operation.label()
            );
        }
    }

    fn submit_export(
        &self,
        operation: Operation,
        range: ExportRange,
        output_path: Option<PathBuf>,
        done: Completion<PathBuf>,
    ) {
        self.submit(operation, done, move |session| {
            let plan = session.plan_export(range, output_path)?;
            log::info!(
                "[SimulatedBackend] Export planned: {}",
                serde_json::to_string(&plan).unwrap_or_default()
            );
            Ok(plan.output_path)
        });
    }
}

impl PreviewBackend for SimulatedBackend {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn prepare(&self, request: PrepareRequest, done: Completion<()>) {
        self.submit(Operation::Prepare, done, move |session| session.prepare(request));
    }

    fn play(&self, done: Completion<()>) {
        self.submit(Operation::Play, done, |session| session.play());
    }

    fn play_at(&self, start_time: f64, done: Completion<()>) {
        self.submit(Operation::PlayAt, done, move |session| {
            session.play_at(start_time)
        });
    }

    fn pause(&self, done: Completion<()>) {
        self.submit(Operation::Pause, done, |session| {
            session.pause();
            Ok(())
        });
    }

    fn unpause(&self, done: Completion<()>) {
        self.submit(Operation::Unpause, done, |session| session.unpause());
    }

    fn stop(&self, done: Completion<()>) {
        self.submit(Operation::Stop, done, |session| {
            session.stop();
            Ok(())
        });
    }

    fn play_preview(&self, done: Completion<()>) {
        self.submit(Operation::PlayPreview, done, |session| session.play_preview());
    }

    fn set_preview_start_time(&self, start_time: f64, done: Completion<()>) {
        self.submit(Operation::SetPreviewStartTime, done, move |session| {
            session.set_preview_start_time(start_time);
            Ok(())
        });
    }

    fn set_preview_window(&self, window: PreviewWindow, done: Completion<()>) {
        self.submit(Operation::SetPreviewAt, done, move |session| {
            session.set_preview_window(window);
            Ok(())
        });
    }

    fn preview_start_time(&self, done: Completion<f64>) {
        self.submit(Operation::PreviewStartTime, done, |session| {
            Ok(session.preview_start_time())
        });
    }

    fn preview_duration(&self, done: Completion<f64>) {
        self.submit(Operation::PreviewDuration, done, |session| {
            Ok(session.preview_duration())
        });
    }

    fn current_time(&self, done: Completion<f64>) {
        self.submit(Operation::CurrentTime, done, |session| {
            Ok(session.current_time())
        });
    }

    fn seek_to_time(&self, time: f64, done: Completion<()>) {
        self.submit(Operation::SeekToTime, done, move |session| {
            session.seek_to_time(time);
            Ok(())
        });
    }

    fn seek_by_time_offset(&self, offset: f64, done: Completion<()>) {
        self.submit(Operation::SeekByTimeOffset, done, move |session| {
            session.seek_by_time_offset(offset);
            Ok(())
        });
    }

    fn playback_duration(&self, done: Completion<f64>) {
        self.submit(Operation::PlaybackDuration, done, |session| {
            Ok(session.playback_duration())
        });
    }

    fn set_volume(&self, volumes: TrackVolumes, done: Completion<()>) {
        self.submit(Operation::SetVolume, done, move |session| {
            session.set_volume(volumes);
            Ok(())
        });
    }

    fn switch_vocal_track(&self, track: VocalTrack, done: Completion<()>) {
        let operation = match track {
            VocalTrack::Original => Operation::SwitchToOriginalVocalTrack,
            VocalTrack::Processed => Operation::SwitchToProcessedVocalTrack,
        };
        self.submit(operation, done, move |session| {
            session.switch_vocal_track(track);
            Ok(())
        });
    }

    fn selected_vocal_track_path(&self, done: Completion<PathBuf>) {
        self.submit(Operation::SelectedVocalTrackPath, done, |session| {
            session.selected_vocal_track_path()
        });
    }

    fn export(&self, done: Completion<PathBuf>) {
        self.submit_export(Operation::Export, ExportRange::Full, None, done);
    }

    fn export_to_file(&self, output_path: PathBuf, done: Completion<PathBuf>) {
        self.submit_export(
            Operation::ExportToFile,
            ExportRange::Full,
            Some(output_path),
            done,
        );
    }

    fn export_preview(&self, done: Completion<PathBuf>) {
        self.submit_export(Operation::ExportPreview, ExportRange::Preview, None, done);
    }

    fn export_preview_to_file(&self, output_path: PathBuf, done: Completion<PathBuf>) {
        self.submit_export(
            Operation::ExportPreviewToFile,
            ExportRange::Preview,
            Some(output_path),
            done,
        );
    }

    fn release(&self, done: Completion<()>) {
        self.submit(Operation::Release, done, |session| {
            session.release();
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ManualTimeSource;
    use crate::completion;
    use crate::error::{BackendErrorCodes, ErrorCode};
    use crate::events::PlaybackEvent;

    fn config() -> SimulationConfig {
        SimulationConfig {
            default_track_duration_secs: 5.0,
            default_preview_duration_secs: 2.0,
            probe_wav_headers: false,
            progress_updates_per_second: 100,
            export_dir: PathBuf::from("/exports"),
            ..SimulationConfig::default()
        }
    }

    async fn call<T>(
        backend: &SimulatedBackend,
        operation: Operation,
        f: impl FnOnce(&SimulatedBackend, Completion<T>),
    ) -> Result<T, BackendError> {
        let (done, pending) = completion::channel(operation.label());
        f(backend, done);
        pending.await
    }

    async fn prepare(backend: &SimulatedBackend) {
        call(backend, Operation::Prepare, |b, done| {
            b.prepare(PrepareRequest::new("o.wav", "p.wav", "bg.wav", 0.0), done)
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_operations_run_on_worker() {
        let backend = SimulatedBackend::new(Platform::Ios, config(), PlaybackEventEmitter::default());
        prepare(&backend).await;

        let duration = call(&backend, Operation::PlaybackDuration, |b, done| {
            b.playback_duration(done)
        })
        .await
        .unwrap();
        assert_eq!(duration, 5.0);

        let path = call(&backend, Operation::Export, |b, done| b.export(done))
            .await
            .unwrap();
        assert!(path.starts_with("/exports"));
    }

    #[tokio::test]
    async fn test_android_rejects_unsupported_operations() {
        let backend =
            SimulatedBackend::new(Platform::Android, config(), PlaybackEventEmitter::default());
        prepare(&backend).await;

        let err = call(&backend, Operation::SeekByTimeOffset, |b, done| {
            b.seek_by_time_offset(1.0, done)
        })
        .await
        .unwrap_err();
        assert_eq!(err.code(), BackendErrorCodes::NOT_SUPPORTED);

        let err = call(&backend, Operation::ExportToFile, |b, done| {
            b.export_to_file(PathBuf::from("/tmp/x.aac"), done)
        })
        .await
        .unwrap_err();
        assert_eq!(err.code(), BackendErrorCodes::NOT_SUPPORTED);

        // Supported operations still work.
        call(&backend, Operation::Play, |b, done| b.play(done))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_preview_playback_emits_finished() {
        let clock = Arc::new(ManualTimeSource::new());
        let events = PlaybackEventEmitter::new(256);
        let mut rx = events.subscribe();
        let backend =
            SimulatedBackend::with_time_source(Platform::Ios, config(), events, clock.clone());
        prepare(&backend).await;

        call(&backend, Operation::PlayPreview, |b, done| b.play_preview(done))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(3));

        let finished = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Ok(PlaybackEvent::Finished { finished }) = rx.recv().await {
                    return finished;
                }
            }
        })
        .await
        .unwrap();
        assert!(finished);

        let err = call(&backend, Operation::Unpause, |b, done| b.unpause(done))
            .await
            .unwrap_err();
        assert_eq!(err.code(), BackendErrorCodes::INVALID_STATE);
    }
}
