// src/reload/mod.rs

//! Browser live reload over a local WebSocket.

pub mod message;
pub mod server;

pub use message::ReloadMessage;
pub use server::ReloadNotifier;

/// What a successful stage run means for connected browsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadScope {
    /// Reload the whole page.
    Full,
    /// Swap stylesheets in place without losing page state.
    StyleOnly,
}
