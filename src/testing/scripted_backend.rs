//! Scripted preview backend for controller tests.
//!
//! Records every call it receives together with its arguments and resolves
//! completions from a fixed script instead of running an audio session.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::{json, Value};

use crate::backend::{
    Operation, Platform, PrepareRequest, PreviewBackend, PreviewWindow, TrackVolumes, VocalTrack,
};
use crate::completion::Completion;
use crate::error::BackendError;
use crate::events::{PlaybackEvent, PlaybackEventEmitter};

/// One call observed by a [`ScriptedBackend`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedCall {
    pub operation: Operation,
    pub args: Value,
}

/// Backend that answers from a script and keeps a call log.
pub struct ScriptedBackend {
    platform: Platform,
    events: PlaybackEventEmitter,
    calls: Mutex<Vec<RecordedCall>>,
    failure: Option<BackendError>,
    drop_completions: bool,
    time_value: f64,
    export_path: PathBuf,
    vocal_path: PathBuf,
}

impl ScriptedBackend {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            events: PlaybackEventEmitter::default(),
            calls: Mutex::new(Vec::new()),
            failure: None,
            drop_completions: false,
            time_value: 0.0,
            export_path: PathBuf::from("/tmp/out.wav"),
            vocal_path: PathBuf::from("/tmp/vocal.wav"),
        }
    }

    /// Fail every operation with `err`.
    pub fn failing_with(mut self, err: BackendError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Drop every completion without resolving it.
    pub fn dropping_completions(mut self) -> Self {
        self.drop_completions = true;
        self
    }

    /// Value returned by the time and duration getters.
    pub fn with_time_value(mut self, value: f64) -> Self {
        self.time_value = value;
        self
    }

    /// Location returned by the export operations that choose their own file.
    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = path.into();
        self
    }

    pub fn with_vocal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.vocal_path = path.into();
        self
    }

    pub fn events(&self) -> PlaybackEventEmitter {
        self.events.clone()
    }

    /// Publish `event` as the native engine would.
    pub fn emit(&self, event: PlaybackEvent) -> usize {
        self.events.emit(event)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock_calls().clone()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.lock_calls().iter().map(|call| call.operation).collect()
    }

    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn lock_calls(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn answer<T>(&self, operation: Operation, args: Value, done: Completion<T>, value: T) {
        self.lock_calls().push(RecordedCall { operation, args });

        if self.drop_completions {
            drop(done);
            return;
        }
        if !self.platform.supports(operation) {
            done.fail(BackendError::not_supported(operation.label()));
            return;
        }
        match &self.failure {
            Some(err) => done.fail(err.clone()),
            None => done.succeed(value),
        }
    }
}

impl PreviewBackend for ScriptedBackend {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn prepare(&self, request: PrepareRequest, done: Completion<()>) {
        let args = serde_json::to_value(&request).unwrap_or(Value::Null);
        self.answer(Operation::Prepare, args, done, ());
    }

    fn play(&self, done: Completion<()>) {
        self.answer(Operation::Play, Value::Null, done, ());
    }

    fn play_at(&self, start_time: f64, done: Completion<()>) {
        self.answer(Operation::PlayAt, json!({ "start_time": start_time }), done, ());
    }

    fn pause(&self, done: Completion<()>) {
        self.answer(Operation::Pause, Value::Null, done, ());
    }

    fn unpause(&self, done: Completion<()>) {
        self.answer(Operation::Unpause, Value::Null, done, ());
    }

    fn stop(&self, done: Completion<()>) {
        self.answer(Operation::Stop, Value::Null, done, ());
    }

    fn play_preview(&self, done: Completion<()>) {
        self.answer(Operation::PlayPreview, Value::Null, done, ());
    }

    fn set_preview_start_time(&self, start_time: f64, done: Completion<()>) {
        self.answer(
            Operation::SetPreviewStartTime,
            json!({ "start_time": start_time }),
            done,
            (),
        );
    }

    fn set_preview_window(&self, window: PreviewWindow, done: Completion<()>) {
        self.answer(
            Operation::SetPreviewAt,
            json!({ "start_time": window.start, "duration": window.duration }),
            done,
            (),
        );
    }

    fn preview_start_time(&self, done: Completion<f64>) {
        self.answer(Operation::PreviewStartTime, Value::Null, done, self.time_value);
    }

    fn preview_duration(&self, done: Completion<f64>) {
        self.answer(Operation::PreviewDuration, Value::Null, done, self.time_value);
    }

    fn current_time(&self, done: Completion<f64>) {
        self.answer(Operation::CurrentTime, Value::Null, done, self.time_value);
    }

    fn seek_to_time(&self, time: f64, done: Completion<()>) {
        self.answer(Operation::SeekToTime, json!({ "time": time }), done, ());
    }

    fn playback_duration(&self, done: Completion<f64>) {
        self.answer(Operation::PlaybackDuration, Value::Null, done, self.time_value);
    }

    fn set_volume(&self, volumes: TrackVolumes, done: Completion<()>) {
        self.answer(
            Operation::SetVolume,
            json!({ "vocal": volumes.vocal, "background": volumes.background }),
            done,
            (),
        );
    }

    fn switch_vocal_track(&self, track: VocalTrack, done: Completion<()>) {
        let operation = match track {
            VocalTrack::Original => Operation::SwitchToOriginalVocalTrack,
            VocalTrack::Processed => Operation::SwitchToProcessedVocalTrack,
        };
        self.answer(operation, Value::Null, done, ());
    }

    fn export(&self, done: Completion<PathBuf>) {
        self.answer(Operation::Export, Value::Null, done, self.export_path.clone());
    }

    fn seek_by_time_offset(&self, offset: f64, done: Completion<()>) {
        self.answer(
            Operation::SeekByTimeOffset,
            json!({ "offset": offset }),
            done,
            (),
        );
    }

    fn selected_vocal_track_path(&self, done: Completion<PathBuf>) {
        self.answer(
            Operation::SelectedVocalTrackPath,
            Value::Null,
            done,
            self.vocal_path.clone(),
        );
    }

    fn export_to_file(&self, output_path: PathBuf, done: Completion<PathBuf>) {
        let args = json!({ "output_path": output_path });
        self.answer(Operation::ExportToFile, args, done, output_path);
    }

    fn export_preview(&self, done: Completion<PathBuf>) {
        self.answer(
            Operation::ExportPreview,
            Value::Null,
            done,
            self.export_path.clone(),
        );
    }

    fn export_preview_to_file(&self, output_path: PathBuf, done: Completion<PathBuf>) {
        let args = json!({ "output_path": output_path });
        self.answer(Operation::ExportPreviewToFile, args, done, output_path);
    }

    fn release(&self, done: Completion<()>) {
        self.answer(Operation::Release, Value::Null, done, ());
    }
}
