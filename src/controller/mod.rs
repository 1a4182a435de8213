// Controller Module
//
// The public preview facade. Operations are forwarded unchanged to the
// backend selected at construction time.

mod core;

pub use self::core::PreviewController;
