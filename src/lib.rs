//! # tickline
//!
//! Streaming price-tick chart core: ingest a live trade stream, keep a
//! bounded rolling window, compute stable scales and drive the animations
//! of a real-time line chart.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core** — Samples, ticks, the rolling window and ingestion throttle (no I/O)
//! 2. **Geometry** — Scales, axis ticks and path generation
//! 3. **Animation** — Price convergence, segment reveal, echo, frame bookkeeping
//! 4. **Chart** — `LiveChart`, the synchronous facade a host drives with its own clocks
//! 5. **WebSocket + Client** — `tokio-tungstenite` session and the `LiveChartClient` driver
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use tickline::prelude::*;
//!
//! let mut client = LiveChartClient::connect_default().await?;
//! while let Some(event) = client.next().await {
//!     if let ChartEvent::SampleAccepted(sample) = event {
//!         let chart = client.chart();
//!         let scales = chart.read().await.scales();
//!         println!("{} -> {:?}", sample.price, scales.map(|s| s.bounds));
//!     }
//! }
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared value types: samples, points, direction, price parsing, formatting.
pub mod shared;

/// Ticks, the rolling window, the ingestion throttle and session stats.
pub mod domain;

/// Unified error types.
pub mod error;

/// Chart configuration and reference constants.
pub mod config;

/// Stream URL constants.
pub mod network;

// ── Layer 2: Geometry ────────────────────────────────────────────────────────

/// Time/price scales and axis ticks.
pub mod scale;

/// Line, area, segment and echo paths.
pub mod path;

// ── Layer 3: Animation ───────────────────────────────────────────────────────

/// Animators and the frame scheduler.
pub mod animation;

// ── Layer 4: Chart ───────────────────────────────────────────────────────────

/// `LiveChart` — the synchronous chart core.
pub mod chart;

// ── Layer 5: WebSocket + Client ──────────────────────────────────────────────

/// WebSocket session: events and configuration.
pub mod ws;

/// `LiveChartClient` — async driver over a live session.
#[cfg(feature = "ws-native")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared types
    pub use crate::shared::{parse_price, Direction, Point, Sample};

    // Domain
    pub use crate::domain::buffer::SampleBuffer;
    pub use crate::domain::stats::SessionStats;
    pub use crate::domain::throttle::{IngestionThrottle, ThrottleStats};
    pub use crate::domain::tick::Tick;

    // Config
    pub use crate::config::{AnimatorKind, ChartConfig, Viewport};

    // Geometry
    pub use crate::path::{Curve, Path, PathCommand, PathGenerator};
    pub use crate::scale::axis::{PriceTick, TimeTick};
    pub use crate::scale::{compute_scales, LinearScale, PriceBounds, ScaleParams, ScaleState};

    // Animation
    pub use crate::animation::{
        Animator, EchoAnimator, EchoState, FrameScheduler, FrameTarget, PriceAnimator,
        PricePhase, PriceSettled, SegmentAnimator, Spring, Tween,
    };

    // Chart
    pub use crate::chart::{ChartPaths, ChartSnapshot, ConnectionState, LiveChart};

    // Errors
    pub use crate::error::{ChartError, ConfigError, ParseError, WsError};

    // Network
    pub use crate::network::{trade_stream_url, DEFAULT_SYMBOL, DEFAULT_WS_URL};

    // WebSocket + client
    pub use crate::ws::{ReadyState, WsConfig, WsEvent};
    #[cfg(feature = "ws-native")]
    pub use crate::ws::native::WsSession;
    #[cfg(feature = "ws-native")]
    pub use crate::client::{ChartEvent, LiveChartClient};
}
