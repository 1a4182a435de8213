// Preview Audio Player - Rust preview engine facade
// Platform-independent controller for vocal/background preview playback

// Module declarations
pub mod backend;
pub mod completion;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod managers;
pub mod testing;
pub mod time_units;

// Re-exports for convenience
pub use backend::{
    create_backend, BackendHandle, Operation, Platform, PrepareRequest, PreviewBackend,
    PreviewWindow, TrackVolumes, VocalTrack,
};
pub use completion::{Completion, Pending};
pub use config::PlayerConfig;
pub use controller::PreviewController;
pub use error::{BackendError, BackendErrorCodes, ErrorCode};
pub use events::{PlaybackEvent, PlaybackEventEmitter};
pub use managers::{FinishedCallback, ProgressCallback};

use once_cell::sync::OnceCell;

static LOGGING: OnceCell<()> = OnceCell::new();

/// Initialize logging once per process. Later calls are no-ops.
///
/// `log` records from this crate are forwarded into the tracing subscriber.
pub fn init_logging() {
    LOGGING.get_or_init(install_subscriber);
}

/// Android: route events to logcat.
#[cfg(target_os = "android")]
fn install_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    match tracing_android::layer("PreviewAudioPlayer") {
        Ok(layer) => {
            if let Err(err) = tracing_subscriber::registry().with(layer).try_init() {
                eprintln!("[PreviewAudioPlayer] logging already initialized: {}", err);
            }
        }
        Err(err) => eprintln!("[PreviewAudioPlayer] logcat unavailable: {}", err),
    }
}

#[cfg(not(target_os = "android"))]
fn install_subscriber() {
    let result = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(err) = result {
        eprintln!("[PreviewAudioPlayer] logging already initialized: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }

    #[test]
    fn test_controller_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PreviewController>();
        assert_send_sync::<PlaybackEventEmitter>();
    }
}
