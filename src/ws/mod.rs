//! WebSocket layer: session events and configuration.
//!
//! The transport lives in [`native`] (`tokio-tungstenite`, feature
//! `ws-native`). This module defines the types shared with consumers, so a
//! host with its own socket can still feed [`crate::chart::LiveChart`].

#[cfg(feature = "ws-native")]
pub mod native;

use serde::Deserialize;

use crate::error::WsError;

// ─── WsEvent ─────────────────────────────────────────────────────────────────

/// Events emitted by a session, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    /// Handshake completed.
    Open,
    /// One text frame, unparsed.
    Message(String),
    /// Transport failure. Always followed by `Closed`.
    Error(WsError),
    /// Session over. Emitted at most once.
    Closed { code: Option<u16>, reason: String },
}

// ─── ReadyState ──────────────────────────────────────────────────────────────

/// Socket lifecycle, stored as a `u16` so it can sit in an atomic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl From<u16> for ReadyState {
    fn from(value: u16) -> Self {
        match value {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

// ─── WsConfig ────────────────────────────────────────────────────────────────

/// Configuration for a socket session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WsConfig {
    pub url: String,
    pub connect_timeout_ms: u64,
    pub event_channel_capacity: usize,
}

impl WsConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::DEFAULT_WS_URL.to_string(),
            connect_timeout_ms: 30_000,
            event_channel_capacity: 256,
        }
    }
}
