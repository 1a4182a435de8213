//! Platform variants and the operation table shared by all backends.
//!
//! The two native engines expose the same capability set under slightly
//! different module and method names, and one of them lacks a handful of
//! operations. This table is the only place that knows about it.

use serde::{Deserialize, Serialize};

/// Native platform a backend belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Platform matching the compile target. Apple targets use the iOS
    /// engine, everything else the Android one.
    pub fn current() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(any(target_os = "ios", target_os = "macos"))] {
                Platform::Ios
            } else {
                Platform::Android
            }
        }
    }

    /// Name of the native module implementing this platform's engine.
    pub fn native_module_name(self) -> &'static str {
        match self {
            Platform::Ios => "PAPPreviewController",
            Platform::Android => "PreviewAudioPlayerManager",
        }
    }

    pub fn supports(self, operation: Operation) -> bool {
        match self {
            Platform::Ios => true,
            Platform::Android => !matches!(
                operation,
                Operation::SeekByTimeOffset
                    | Operation::SelectedVocalTrackPath
                    | Operation::ExportToFile
                    | Operation::ExportPreview
                    | Operation::ExportPreviewToFile
            ),
        }
    }

    pub fn supported_operations(self) -> impl Iterator<Item = Operation> {
        Operation::ALL
            .iter()
            .copied()
            .filter(move |op| self.supports(*op))
    }
}

/// Every operation of the preview capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Prepare,
    Play,
    PlayAt,
    Pause,
    Unpause,
    Stop,
    PlayPreview,
    SetPreviewStartTime,
    SetPreviewAt,
    PreviewStartTime,
    PreviewDuration,
    CurrentTime,
    SeekToTime,
    SeekByTimeOffset,
    PlaybackDuration,
    SetVolume,
    SwitchToOriginalVocalTrack,
    SwitchToProcessedVocalTrack,
    SelectedVocalTrackPath,
    Export,
    ExportToFile,
    ExportPreview,
    ExportPreviewToFile,
    Release,
}

impl Operation {
    pub const ALL: [Operation; 24] = [
        Operation::Prepare,
        Operation::Play,
        Operation::PlayAt,
        Operation::Pause,
        Operation::Unpause,
        Operation::Stop,
        Operation::PlayPreview,
        Operation::SetPreviewStartTime,
        Operation::SetPreviewAt,
        Operation::PreviewStartTime,
        Operation::PreviewDuration,
        Operation::CurrentTime,
        Operation::SeekToTime,
        Operation::SeekByTimeOffset,
        Operation::PlaybackDuration,
        Operation::SetVolume,
        Operation::SwitchToOriginalVocalTrack,
        Operation::SwitchToProcessedVocalTrack,
        Operation::SelectedVocalTrackPath,
        Operation::Export,
        Operation::ExportToFile,
        Operation::ExportPreview,
        Operation::ExportPreviewToFile,
        Operation::Release,
    ];

    /// Rust-side name, used in completion and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Operation::Prepare => "prepare",
            Operation::Play => "play",
            Operation::PlayAt => "play_at",
            Operation::Pause => "pause",
            Operation::Unpause => "unpause",
            Operation::Stop => "stop",
            Operation::PlayPreview => "play_preview",
            Operation::SetPreviewStartTime => "set_preview_start_time",
            Operation::SetPreviewAt => "set_preview_at",
            Operation::PreviewStartTime => "preview_start_time",
            Operation::PreviewDuration => "preview_duration",
            Operation::CurrentTime => "current_time",
            Operation::SeekToTime => "seek_to_time",
            Operation::SeekByTimeOffset => "seek_by_time_offset",
            Operation::PlaybackDuration => "playback_duration",
            Operation::SetVolume => "set_volume",
            Operation::SwitchToOriginalVocalTrack => "switch_to_original_vocal_track",
            Operation::SwitchToProcessedVocalTrack => "switch_to_processed_vocal_track",
            Operation::SelectedVocalTrackPath => "selected_vocal_track_path",
            Operation::Export => "export",
            Operation::ExportToFile => "export_to_file",
            Operation::ExportPreview => "export_preview",
            Operation::ExportPreviewToFile => "export_preview_to_file",
            Operation::Release => "release",
        }
    }

    /// Method name the native module exposes for this operation.
    pub fn native_name(self, platform: Platform) -> &'static str {
        match (self, platform) {
            (Operation::Unpause, Platform::Android) => "unPause",
            (Operation::Unpause, Platform::Ios) => "unpause",
            (Operation::Prepare, _) => "prepare",
            (Operation::Play, _) => "play",
            (Operation::PlayAt, _) => "playAt",
            (Operation::Pause, _) => "pause",
            (Operation::Stop, _) => "stop",
            (Operation::PlayPreview, _) => "playPreview",
            (Operation::SetPreviewStartTime, _) => "setPreviewStartTime",
            (Operation::SetPreviewAt, _) => "setPreviewAt",
            (Operation::PreviewStartTime, _) => "getPreviewStartTime",
            (Operation::PreviewDuration, _) => "getPreviewDuration",
            (Operation::CurrentTime, _) => "getCurrentTime",
            (Operation::SeekToTime, _) => "seekToTime",
            (Operation::SeekByTimeOffset, _) => "seekByTimeOffset",
            (Operation::PlaybackDuration, _) => "getPlaybackDuration",
            (Operation::SetVolume, _) => "setVolume",
            (Operation::SwitchToOriginalVocalTrack, _) => "switchToOriginalVocalTrack",
            (Operation::SwitchToProcessedVocalTrack, _) => "switchToProcessedVocalTrack",
            (Operation::SelectedVocalTrackPath, _) => "getSelectedVocalTrackPath",
            (Operation::Export, _) => "export",
            (Operation::ExportToFile, _) => "exportToFileAtURL",
            (Operation::ExportPreview, _) => "exportPreview",
            (Operation::ExportPreviewToFile, _) => "exportPreviewToFileAtURL",
            (Operation::Release, _) => "release",
        }
    }
}
