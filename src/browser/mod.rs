//! Browser automation boundary over the Chrome DevTools Protocol.
//!
//! The harness drives an already-running Chrome (started with
//! `--remote-debugging-port`) through a single browser-level WebSocket.
//! [`CdpClient`] owns the connection and download behavior; [`PageSession`]
//! drives one tab with bounded, polling waits.

mod client;
mod error;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::BrowserError;
pub use session::PageSession;
