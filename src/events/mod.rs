//! Playback events published by backends.
//!
//! Backends emit two named event kinds: periodic progress updates carrying
//! the current playback time, and a notification when playback reaches its
//! end. The emitter is a broadcast channel so the controller, CLI tooling and
//! tests can listen independently.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

mod subscription;

pub use subscription::EventSubscription;

/// Native name of the progress event.
pub const PROGRESS_UPDATE_EVENT: &str = "previewAudioPlayerPlaybackProgressUpdate";

/// Native name of the playback finished event.
pub const PLAYBACK_FINISHED_EVENT: &str = "previewAudioPlayerPlaybackFinished";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PlaybackEvent {
    #[serde(rename = "previewAudioPlayerPlaybackProgressUpdate")]
    ProgressUpdate {
        /// Seconds from the start of the prepared audio
        #[serde(rename = "currentTime")]
        current_time: f64,
    },
    #[serde(rename = "previewAudioPlayerPlaybackFinished")]
    Finished { finished: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ProgressUpdate,
    Finished,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::ProgressUpdate => PROGRESS_UPDATE_EVENT,
            EventKind::Finished => PLAYBACK_FINISHED_EVENT,
        }
    }
}

impl PlaybackEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PlaybackEvent::ProgressUpdate { .. } => EventKind::ProgressUpdate,
            PlaybackEvent::Finished { .. } => EventKind::Finished,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Decode an event delivered by a native engine as name plus JSON
    /// payload.
    ///
    /// A finished event without a `finished` field (some engines send a
    /// null payload) counts as finished. Unknown names and progress payloads
    /// without a numeric `currentTime` yield `None`.
    pub fn from_native(name: &str, payload: &serde_json::Value) -> Option<Self> {
        match name {
            PROGRESS_UPDATE_EVENT => payload
                .get("currentTime")
                .and_then(serde_json::Value::as_f64)
                .map(|current_time| PlaybackEvent::ProgressUpdate { current_time }),
            PLAYBACK_FINISHED_EVENT => {
                let finished = payload
                    .get("finished")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(true);
                Some(PlaybackEvent::Finished { finished })
            }
            _ => None,
        }
    }
}

/// Cloneable handle to a backend's event source.
#[derive(Clone)]
pub struct PlaybackEventEmitter {
    tx: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackEventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event. Returns the number of listeners it reached.
    pub fn emit(&self, event: PlaybackEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Publish a natively encoded event. Returns false if it could not be
    /// decoded.
    pub fn emit_native(&self, name: &str, payload: &serde_json::Value) -> bool {
        match PlaybackEvent::from_native(name, payload) {
            Some(event) => {
                self.emit(event);
                true
            }
            None => {
                log::warn!("[Events] Ignoring unrecognized native event {}", name);
                false
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.tx.subscribe()
    }

    /// Events as an async stream. Events missed by a lagging consumer are
    /// skipped.
    pub fn stream(&self) -> impl Stream<Item = PlaybackEvent> + Unpin + Send + 'static {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|received| received.ok())
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for PlaybackEventEmitter {
    fn default() -> Self {
        Self::new(128)
    }
}
