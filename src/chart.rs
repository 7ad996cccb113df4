//! `LiveChart`, the single-threaded core wiring ingestion, scales and
//! animations together.
//!
//! The host drives it with three independent clocks: the acceptance timer
//! ([`LiveChart::on_acceptance_tick`]), the echo timer
//! ([`LiveChart::on_echo_interval`]) and the frame callback
//! ([`LiveChart::on_frame`]). They may interleave arbitrarily; every frame
//! reads the window fresh.
//!
//! ```rust,ignore
//! let mut chart = LiveChart::new(ChartConfig::default())?;
//! chart.on_price_settled(|settled| println!("{} {}", settled.price, settled.direction));
//! chart.on_open();
//! chart.on_message(r#"{"p":"45000.10","T":1700000000000}"#, now_ms);
//! chart.on_acceptance_tick(now_ms);
//! chart.on_frame(now_ms);
//! let scales = chart.scales();
//! ```

use serde::Serialize;

use crate::animation::price::TargetOutcome;
use crate::animation::{
    EchoAnimator, EchoState, FrameScheduler, FrameTarget, PriceAnimator, PriceSettled,
    SegmentAnimator,
};
use crate::config::{ChartConfig, Viewport};
use crate::domain::buffer::SampleBuffer;
use crate::domain::stats::SessionStats;
use crate::domain::throttle::{IngestionThrottle, ThrottleStats};
use crate::domain::tick::Tick;
use crate::error::{ConfigError, WsError};
use crate::path::{Curve, Path, PathGenerator};
use crate::scale::{compute_scales, PriceBounds, ScaleParams, ScaleState};
use crate::shared::{Direction, Point, Sample};

/// Callback fired once per completed price convergence.
pub type SettleCallback = Box<dyn FnMut(PriceSettled) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Idle,
    Open,
    Closed,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPaths {
    /// History drawn statically (excludes the newest sample while revealing).
    pub line: Path,
    pub area: Path,
    /// The newest segment while its reveal is in flight.
    pub segment: Option<Path>,
    pub echo: Path,
    pub head: Option<Point>,
    pub marker_y: Option<f64>,
}

/// Serializable read-only view of the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSnapshot {
    pub samples: Vec<Sample>,
    pub current_price: Option<f64>,
    pub displayed_price: Option<f64>,
    pub bounds: Option<PriceBounds>,
    pub segment_progress: f64,
    pub echo_progress: f64,
    pub direction: Direction,
    pub stats: SessionStats,
    pub connection: ConnectionState,
}

pub struct LiveChart {
    config: ChartConfig,
    scale_params: ScaleParams,
    buffer: SampleBuffer,
    throttle: IngestionThrottle,
    stats: SessionStats,
    price: PriceAnimator,
    segment: SegmentAnimator,
    echo: EchoAnimator,
    frames: FrameScheduler,
    paths: PathGenerator,
    settle_callbacks: Vec<SettleCallback>,
    connection: ConnectionState,
    sessions: u64,
    parse_errors: u64,
    last_error: Option<WsError>,
    torn_down: bool,
}

impl std::fmt::Debug for LiveChart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveChart")
            .field("samples", &self.buffer.len())
            .field("connection", &self.connection)
            .field("displayed", &self.price.displayed())
            .field("callbacks", &self.settle_callbacks.len())
            .finish()
    }
}

impl LiveChart {
    pub fn new(config: ChartConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            scale_params: ScaleParams::from(&config),
            buffer: SampleBuffer::new(config.capacity),
            throttle: IngestionThrottle::new(),
            stats: SessionStats::new(),
            price: PriceAnimator::new(&config),
            segment: SegmentAnimator::new(config.segment_reveal_ms),
            echo: EchoAnimator::new(config.echo_size, config.echo_draw_ms),
            frames: FrameScheduler::new(),
            paths: PathGenerator::default(),
            settle_callbacks: Vec::new(),
            connection: ConnectionState::Idle,
            sessions: 0,
            parse_errors: 0,
            last_error: None,
            torn_down: false,
            config,
        })
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.paths = PathGenerator::new(curve);
        self
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    // ─── Inbound: session ────────────────────────────────────────────────

    /// A session opened. A reconnect starts a fresh window.
    pub fn on_open(&mut self) {
        if self.sessions > 0 {
            self.reset_session();
        }
        self.sessions += 1;
        self.connection = ConnectionState::Open;
        self.last_error = None;
        tracing::info!("Chart session {} open", self.sessions);
    }

    /// One raw text frame. Malformed frames are dropped and counted.
    pub fn on_message(&mut self, raw: &str, now_ms: f64) -> Option<Sample> {
        match Tick::parse(raw) {
            Ok(tick) => self.on_tick(tick, now_ms),
            Err(e) => {
                self.parse_errors += 1;
                tracing::debug!("Dropping malformed frame: {}", e);
                None
            }
        }
    }

    /// One parsed tick. Returns the sample if it was accepted right away
    /// (only the first tick of a session is).
    pub fn on_tick(&mut self, tick: Tick, now_ms: f64) -> Option<Sample> {
        if self.torn_down {
            return None;
        }
        let accepted = self.throttle.record(tick)?;
        self.accept(accepted, now_ms);
        Some(accepted)
    }

    /// Socket-level failure. State is kept as it was.
    pub fn on_error(&mut self, error: &WsError) {
        tracing::warn!("Chart stream error: {}", error);
        self.last_error = Some(error.clone());
    }

    pub fn on_close(&mut self, code: Option<u16>, reason: &str) {
        tracing::info!("Chart session closed: code={:?} reason={}", code, reason);
        self.connection = ConnectionState::Closed;
    }

    // ─── Inbound: clocks ─────────────────────────────────────────────────

    /// Fixed-period acceptance check.
    pub fn on_acceptance_tick(&mut self, now_ms: f64) -> Option<Sample> {
        if self.torn_down {
            return None;
        }
        let accepted = self.throttle.on_period()?;
        self.accept(accepted, now_ms);
        Some(accepted)
    }

    /// Echo timer: always reseed from the window tail.
    pub fn on_echo_interval(&mut self, now_ms: f64) {
        if self.torn_down {
            return;
        }
        let tail = self.buffer.tail(self.echo.size());
        if self.echo.reseed(tail, now_ms) {
            self.frames.request(FrameTarget::Echo);
        }
    }

    /// Host frame callback: advance every animator that asked for a frame.
    ///
    /// Returns the settle event if the displayed price converged this frame.
    pub fn on_frame(&mut self, now_ms: f64) -> Option<PriceSettled> {
        if self.torn_down {
            return None;
        }
        let mut settled = None;
        for target in self.frames.take_due() {
            match target {
                FrameTarget::Price => {
                    settled = self.price.advance(now_ms);
                    if self.price.is_animating() {
                        self.frames.request(FrameTarget::Price);
                    }
                }
                FrameTarget::Segment => {
                    if self.segment.advance(now_ms) {
                        self.frames.request(FrameTarget::Segment);
                    }
                }
                FrameTarget::Echo => {
                    if self.echo.advance(now_ms) {
                        self.frames.request(FrameTarget::Echo);
                    }
                }
            }
        }
        if let Some(event) = settled {
            for cb in self.settle_callbacks.iter_mut() {
                cb(event);
            }
        }
        settled
    }

    /// Whether any animator is waiting for a frame.
    pub fn wants_frame(&self) -> bool {
        self.frames.has_pending()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), ConfigError> {
        viewport.validate()?;
        self.config.viewport = viewport;
        Ok(())
    }

    /// Cancel every pending frame and stop all animations. Further input
    /// is ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let cancelled = self.frames.cancel_all();
        self.price.cancel();
        self.segment.cancel();
        self.echo.cancel();
        self.torn_down = true;
        tracing::debug!("Chart torn down, {} frame request(s) cancelled", cancelled);
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // ─── Outbound ────────────────────────────────────────────────────────

    /// Rolling window, oldest-first.
    pub fn samples(&self) -> Vec<Sample> {
        self.buffer.to_vec()
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Latest accepted price, before animation.
    pub fn current_price(&self) -> Option<f64> {
        self.buffer.last().map(|s| s.price)
    }

    /// Eased price; defined from the first accepted sample on.
    pub fn displayed_price(&self) -> Option<f64> {
        self.price.displayed()
    }

    /// `None` until two samples exist.
    pub fn scales(&self) -> Option<ScaleState> {
        compute_scales(
            &self.buffer,
            self.price.displayed(),
            &self.config.viewport,
            &self.scale_params,
        )
    }

    pub fn segment_progress(&self) -> f64 {
        self.segment.progress()
    }

    pub fn segment_endpoints(&self) -> Option<(Sample, Sample)> {
        self.segment.endpoints()
    }

    pub fn is_revealing(&self) -> bool {
        self.segment.is_animating()
    }

    pub fn segment_reveals(&self) -> u64 {
        self.segment.reveals_started()
    }

    pub fn echo_state(&self) -> EchoState {
        self.echo.state()
    }

    /// Register a settle callback. It fires once per convergence.
    pub fn on_price_settled<F>(&mut self, callback: F)
    where
        F: FnMut(PriceSettled) + Send + Sync + 'static,
    {
        self.settle_callbacks.push(Box::new(callback));
    }

    /// Direction of the most recent settle.
    pub fn direction(&self) -> Direction {
        self.price.direction()
    }

    pub fn session_stats(&self) -> SessionStats {
        self.stats
    }

    pub fn throttle_stats(&self) -> ThrottleStats {
        self.throttle.stats()
    }

    pub fn parse_errors(&self) -> u64 {
        self.parse_errors
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn last_error(&self) -> Option<&WsError> {
        self.last_error.as_ref()
    }

    /// Renderable paths for the current state; `None` until two samples exist.
    pub fn paths(&self) -> Option<ChartPaths> {
        let scales = self.scales()?;
        let samples = self.buffer.to_vec();
        // The newest two samples are the segment's endpoints while it reveals.
        let revealing = self.segment.is_animating() && samples.len() >= 2;
        let segment = revealing
            .then(|| self.paths.segment(&samples, self.segment.progress(), &scales));
        // The area and head follow the tip of the curve as drawn so far.
        let tip = segment.as_ref().and_then(Path::end_point);

        let head = self.paths.head(&samples, tip, &scales);
        let still = if revealing {
            &samples[..samples.len() - 1]
        } else {
            &samples[..]
        };

        Some(ChartPaths {
            line: self.paths.static_line(&samples, &scales, revealing),
            area: self.paths.area(still, &scales, tip),
            segment,
            echo: self.paths.echo(&self.echo.state(), &scales),
            head,
            marker_y: self
                .price
                .displayed()
                .map(|p| self.paths.marker_y(p, &scales)),
        })
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot {
            samples: self.samples(),
            current_price: self.current_price(),
            displayed_price: self.displayed_price(),
            bounds: self.scales().map(|s| s.bounds),
            segment_progress: self.segment.progress(),
            echo_progress: self.echo.progress(),
            direction: self.direction(),
            stats: self.stats,
            connection: self.connection,
        }
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn accept(&mut self, sample: Sample, now_ms: f64) {
        self.buffer.push(sample);
        self.stats.update(sample);

        if let Some((previous, latest)) = self.buffer.last_two() {
            self.segment.start(previous, latest, now_ms);
            self.frames.request(FrameTarget::Segment);
        }

        match self
            .price
            .set_target(sample.price, self.config.zoom_precision, now_ms)
        {
            TargetOutcome::Started { .. } => {
                self.frames.request(FrameTarget::Price);
            }
            TargetOutcome::Baseline | TargetOutcome::Unchanged => {}
        }
    }

    /// Fresh window for a new session; callbacks are kept.
    fn reset_session(&mut self) {
        self.frames.cancel_all();
        self.buffer.clear();
        self.throttle.reset();
        self.stats.reset();
        self.price.reset();
        self.segment.reset();
        self.echo.reset();
        tracing::info!("Session reset: rolling window cleared");
    }
}
