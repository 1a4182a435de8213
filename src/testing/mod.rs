//! Test harness utilities.
//!
//! Compiled into every build so integration tests and downstream hosts can
//! drive a [`PreviewController`](crate::PreviewController) without an audio
//! engine.

pub mod scripted_backend;

pub use scripted_backend::{RecordedCall, ScriptedBackend};
