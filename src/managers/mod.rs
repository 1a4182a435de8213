// Managers Module
//
// Focused managers owned by the PreviewController.
//
// - SubscriptionManager: single-slot progress/finished event subscriptions

pub mod subscription_manager;

pub use subscription_manager::{FinishedCallback, ProgressCallback, SubscriptionManager};
