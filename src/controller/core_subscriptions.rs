use futures::Stream;

use super::PreviewController;
use crate::events::{PlaybackEvent, PlaybackEventEmitter};
use crate::managers::{FinishedCallback, ProgressCallback};

impl PreviewController {
    // ========================================================================
    // EVENT SUBSCRIPTIONS
    // ========================================================================

    /// Register the progress handler, replacing any previous one.
    /// `None` only removes the existing subscription.
    pub fn set_audio_playback_progress_update_subscription(
        &self,
        callback: Option<ProgressCallback>,
    ) {
        log::debug!(
            "[PreviewController] progress subscription {}",
            if callback.is_some() { "set" } else { "cleared" }
        );
        self.subscriptions.set_progress(callback);
    }

    /// Register the finished handler, replacing any previous one.
    pub fn set_audio_playback_finished_subscription(&self, callback: Option<FinishedCallback>) {
        log::debug!(
            "[PreviewController] finished subscription {}",
            if callback.is_some() { "set" } else { "cleared" }
        );
        self.subscriptions.set_finished(callback);
    }

    /// Remove both subscriptions. Calling it with nothing registered is fine.
    pub fn unsubscribe_from_listening(&self) {
        self.subscriptions.unsubscribe_all();
    }

    pub fn has_progress_subscription(&self) -> bool {
        self.subscriptions.has_progress_subscription()
    }

    pub fn has_finished_subscription(&self) -> bool {
        self.subscriptions.has_finished_subscription()
    }

    /// Raw event source the backend publishes on.
    pub fn events(&self) -> &PlaybackEventEmitter {
        self.subscriptions.emitter()
    }

    /// Stream of every playback event published after this call.
    ///
    /// Independent of the single-slot callbacks; any number of streams may
    /// be open at once.
    pub fn playback_events(&self) -> impl Stream<Item = PlaybackEvent> + Unpin + Send + 'static {
        self.subscriptions.emitter().stream()
    }
}
