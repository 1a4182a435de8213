// SubscriptionManager: single-slot playback event subscriptions
//
// Holds at most one progress and one finished subscription. Registering a
// new handler releases the previous one of the same kind first.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::events::{EventKind, EventSubscription, PlaybackEvent, PlaybackEventEmitter};

/// Receives the current playback time in seconds.
pub type ProgressCallback = Box<dyn Fn(f64) + Send + 'static>;

/// Receives the finished flag when playback reaches its end.
pub type FinishedCallback = Box<dyn Fn(bool) + Send + 'static>;

/// Manages the controller's event subscriptions
///
/// # Slots
/// - Progress: periodic current-time updates while playing
/// - Finished: notification when playback reaches its end
///
/// Passing `None` for a slot removes whatever is registered there and
/// leaves it empty.
pub struct SubscriptionManager {
    emitter: PlaybackEventEmitter,
    progress: Mutex<Option<EventSubscription>>,
    finished: Mutex<Option<EventSubscription>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SubscriptionManager {
    pub fn new(emitter: PlaybackEventEmitter) -> Self {
        Self {
            emitter,
            progress: Mutex::new(None),
            finished: Mutex::new(None),
        }
    }

    pub fn emitter(&self) -> &PlaybackEventEmitter {
        &self.emitter
    }

    /// Replace the progress subscription.
    pub fn set_progress(&self, callback: Option<ProgressCallback>) {
        let mut slot = lock(&self.progress);
        if let Some(previous) = slot.take() {
            previous.remove();
        }
        let Some(callback) = callback else {
            return;
        };

        *slot = Some(EventSubscription::spawn(
            &self.emitter,
            EventKind::ProgressUpdate,
            move |event| {
                if let PlaybackEvent::ProgressUpdate { current_time } = event {
                    callback(current_time);
                }
            },
        ));
    }

    /// Replace the finished subscription.
    pub fn set_finished(&self, callback: Option<FinishedCallback>) {
        let mut slot = lock(&self.finished);
        if let Some(previous) = slot.take() {
            previous.remove();
        }
        let Some(callback) = callback else {
            return;
        };

        *slot = Some(EventSubscription::spawn(
            &self.emitter,
            EventKind::Finished,
            move |event| {
                if let PlaybackEvent::Finished { finished } = event {
                    callback(finished);
                }
            },
        ));
    }

    /// Release both subscriptions. Safe to call any number of times.
    pub fn unsubscribe_all(&self) {
        if let Some(progress) = lock(&self.progress).take() {
            progress.remove();
        }
        if let Some(finished) = lock(&self.finished).take() {
            finished.remove();
        }
    }

    pub fn has_progress_subscription(&self) -> bool {
        lock(&self.progress).is_some()
    }

    pub fn has_finished_subscription(&self) -> bool {
        lock(&self.finished).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_slots_start_empty() {
        let manager = SubscriptionManager::new(PlaybackEventEmitter::default());
        assert!(!manager.has_progress_subscription());
        assert!(!manager.has_finished_subscription());
    }

    #[test]
    fn test_none_clears_slot() {
        let manager = SubscriptionManager::new(PlaybackEventEmitter::default());
        manager.set_progress(Some(Box::new(|_| {})));
        assert!(manager.has_progress_subscription());

        manager.set_progress(None);
        assert!(!manager.has_progress_subscription());

        // Clearing an empty slot is a no-op.
        manager.set_progress(None);
        assert!(!manager.has_progress_subscription());
    }

    #[test]
    fn test_finished_callback_receives_flag() {
        let manager = SubscriptionManager::new(PlaybackEventEmitter::new(8));
        let (tx, rx) = mpsc::channel();
        manager.set_finished(Some(Box::new(move |finished| {
            let _ = tx.send(finished);
        })));

        manager
            .emitter()
            .emit(PlaybackEvent::Finished { finished: true });
        assert!(rx.recv_timeout(Duration::from_secs(2)).unwrap());
    }

    #[test]
    fn test_unsubscribe_all_is_idempotent() {
        let manager = SubscriptionManager::new(PlaybackEventEmitter::default());
        manager.unsubscribe_all();
        manager.set_progress(Some(Box::new(|_| {})));
        manager.set_finished(Some(Box::new(|_| {})));
        manager.unsubscribe_all();
        manager.unsubscribe_all();
        assert!(!manager.has_progress_subscription());
        assert!(!manager.has_finished_subscription());
    }
}
