use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::Builder;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;

use super::{EventKind, PlaybackEvent, PlaybackEventEmitter};

/// Registration of a handler with an event source.
///
/// Events of the subscribed kind are delivered on a dedicated thread with
/// its own current-thread runtime, so the caller needs no runtime of its own.
/// Once removed (or dropped) the handler is never invoked again.
pub struct EventSubscription {
    kind: EventKind,
    active: Arc<AtomicBool>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl EventSubscription {
    pub fn spawn<F>(emitter: &PlaybackEventEmitter, kind: EventKind, handler: F) -> Self
    where
        F: Fn(PlaybackEvent) + Send + 'static,
    {
        // Subscribe before returning so events emitted right after
        // registration are not missed.
        let mut rx = emitter.subscribe();
        let active = Arc::new(AtomicBool::new(true));
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let flag = Arc::clone(&active);

        let spawned = std::thread::Builder::new()
            .name(format!("preview-events-{:?}", kind))
            .spawn(move || {
                let rt = match Builder::new_current_thread().enable_all().build() {
                    Ok(rt) => rt,
                    Err(err) => {
                        log::error!("[Events] Failed to create runtime for {:?}: {}", kind, err);
                        return;
                    }
                };

                rt.block_on(async move {
                    loop {
                        tokio::select! {
                            biased;
                            _ = &mut cancel_rx => break,
                            received = rx.recv() => match received {
                                Ok(event) => {
                                    if event.kind() == kind && flag.load(Ordering::SeqCst) {
                                        handler(event);
                                    }
                                }
                                Err(RecvError::Lagged(skipped)) => {
                                    log::warn!(
                                        "[Events] {:?} subscriber lagged, skipped {} events",
                                        kind,
                                        skipped
                                    );
                                }
                                Err(RecvError::Closed) => break,
                            },
                        }
                    }
                });
            });

        if let Err(err) = spawned {
            log::error!("[Events] Failed to spawn {:?} listener: {}", kind, err);
            active.store(false, Ordering::SeqCst);
        }

        Self {
            kind,
            active,
            cancel_tx: Some(cancel_tx),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop delivery and release the listener.
    pub fn remove(mut self) {
        self.deactivate();
    }

    fn deactivate(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_delivers_only_subscribed_kind() {
        let emitter = PlaybackEventEmitter::new(16);
        let (tx, rx) = mpsc::channel();
        let _subscription = EventSubscription::spawn(&emitter, EventKind::Finished, move |event| {
            let _ = tx.send(event);
        });

        emitter.emit(PlaybackEvent::ProgressUpdate { current_time: 1.0 });
        emitter.emit(PlaybackEvent::Finished { finished: true });

        let received = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(received, PlaybackEvent::Finished { finished: true });
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_removed_subscription_stops_delivery() {
        let emitter = PlaybackEventEmitter::new(16);
        let (tx, rx) = mpsc::channel();
        let subscription =
            EventSubscription::spawn(&emitter, EventKind::ProgressUpdate, move |event| {
                let _ = tx.send(event);
            });
        assert!(subscription.is_active());

        subscription.remove();
        emitter.emit(PlaybackEvent::ProgressUpdate { current_time: 3.0 });

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
}
