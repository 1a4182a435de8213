//! One-shot completion channel between backends and callers.
//!
//! Every controller operation hands the backend a [`Completion`] and gives the
//! caller the matching [`Pending`] future. A completion is consumed when it is
//! resolved, so a result is delivered at most once; the caller can only
//! observe it by polling the future after the operation call has returned.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::BackendError;

/// Create a linked completion/pending pair for `operation`.
pub fn channel<T>(operation: &'static str) -> (Completion<T>, Pending<T>) {
    let (tx, rx) = oneshot::channel();
    (Completion { tx, operation }, Pending { rx, operation })
}

/// Backend side of an operation result.
#[must_use = "a completion must be resolved or the caller receives COMPLETION_DROPPED"]
pub struct Completion<T> {
    tx: oneshot::Sender<Result<T, BackendError>>,
    operation: &'static str,
}

impl<T> Completion<T> {
    /// Name of the operation this completion belongs to.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Resolve with `result`. A caller that dropped its [`Pending`] simply
    /// never sees it.
    pub fn complete(self, result: Result<T, BackendError>) {
        let _ = self.tx.send(result);
    }

    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    pub fn fail(self, err: BackendError) {
        self.complete(Err(err));
    }

    /// True when the caller has already dropped the pending result.
    #[cfg(test)]
    pub(crate) fn is_discarded(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Completion<()> {
    pub fn done(self) {
        self.succeed(());
    }
}

/// Caller side of an operation result.
///
/// Resolves to whatever the backend completed with. If the backend drops its
/// [`Completion`] unresolved, resolves to a `COMPLETION_DROPPED` error.
/// Dropping a `Pending` discards the result without affecting the operation.
#[must_use = "dropping a Pending discards the operation result"]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T, BackendError>>,
    operation: &'static str,
}

impl<T> Pending<T> {
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, BackendError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let operation = this.operation;
        Pin::new(&mut this.rx).poll(cx).map(|received| match received {
            Ok(result) => result,
            Err(_) => Err(BackendError::completion_dropped(operation)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BackendErrorCodes, ErrorCode};

    #[tokio::test]
    async fn test_success_is_delivered() {
        let (completion, pending) = channel::<f64>("current_time");
        completion.succeed(1.25);
        assert_eq!(pending.await, Ok(1.25));
    }

    #[tokio::test]
    async fn test_error_is_delivered_unchanged() {
        let (completion, pending) = channel::<()>("play");
        let err = BackendError::new(77, "native failure");
        completion.fail(err.clone());
        assert_eq!(pending.await, Err(err));
    }

    #[tokio::test]
    async fn test_dropped_completion_reports_operation() {
        let (completion, pending) = channel::<()>("unpause");
        drop(completion);
        let err = pending.await.unwrap_err();
        assert_eq!(err.code(), BackendErrorCodes::COMPLETION_DROPPED);
        assert!(err.message().contains("unpause"));
    }

    #[test]
    fn test_discarded_pending_does_not_break_completion() {
        let (completion, pending) = channel::<()>("switch_to_original_vocal_track");
        drop(pending);
        assert!(completion.is_discarded());
        completion.done();
    }

    #[tokio::test]
    async fn test_completion_from_another_thread() {
        let (completion, pending) = channel::<String>("export");
        std::thread::spawn(move || completion.succeed("/tmp/out.wav".to_string()));
        assert_eq!(pending.await.unwrap(), "/tmp/out.wav");
    }
}
