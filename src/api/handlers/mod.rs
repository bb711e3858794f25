//! API request handlers.

/// Upload-and-ask handler.
pub mod ask;
/// Liveness and session status.
pub mod health;
/// The single HTML page.
pub mod page;
