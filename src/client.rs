//! `LiveChartClient`: drives a [`LiveChart`] from a live trade stream.
//!
//! One driver task owns the socket session and the three clocks
//! (acceptance, echo, frame). The chart is shared behind
//! `Arc<RwLock<_>>` and written only by the driver; renderers take read
//! locks. Notable changes are also pushed through the client's `Stream`,
//! which ends after the final `Closed`.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use pin_project_lite::pin_project;
use tokio::sync::mpsc::{self, OwnedPermit};
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::animation::PriceSettled;
use crate::chart::{ChartPaths, ChartSnapshot, LiveChart};
use crate::config::ChartConfig;
use crate::error::{ChartError, WsError};
use crate::shared::Sample;
use crate::ws::native::{reserve_slot, try_emit, WsSession};
use crate::ws::{WsConfig, WsEvent};

/// Slots held back for `Error` and the final `Closed`.
const TERMINAL_SLOTS: usize = 2;
const SHUTDOWN_WAIT: Duration = Duration::from_secs(5);
/// How long to wait for the session's own `Closed` after asking it to close.
const CLOSE_DRAIN: Duration = Duration::from_millis(500);

/// Events pushed to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    Connected,
    SampleAccepted(Sample),
    PriceSettled(PriceSettled),
    Error(WsError),
    Closed { code: Option<u16>, reason: String },
}

pin_project! {
    /// Async chart client.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use futures_util::StreamExt;
    /// use tickline::prelude::*;
    ///
    /// let mut client = LiveChartClient::connect_default().await?;
    /// while let Some(event) = client.next().await {
    ///     if let ChartEvent::PriceSettled(settled) = event {
    ///         println!("{} {}", settled.price, settled.direction);
    ///     }
    /// }
    /// ```
    pub struct LiveChartClient {
        chart: Arc<RwLock<LiveChart>>,
        shutdown_tx: Option<oneshot::Sender<()>>,
        task_handle: Option<JoinHandle<()>>,
        #[pin]
        event_rx: mpsc::Receiver<ChartEvent>,
    }

    impl PinnedDrop for LiveChartClient {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            if let Some(handle) = this.task_handle.take() {
                handle.abort();
            }
        }
    }
}

impl LiveChartClient {
    /// Connect to the default trade stream with default settings.
    pub async fn connect_default() -> Result<Self, ChartError> {
        Self::connect(ChartConfig::default(), WsConfig::default()).await
    }

    /// Validate `config`, open the session and start the driver.
    ///
    /// The client's event channel has the same capacity as the session's.
    pub async fn connect(config: ChartConfig, ws: WsConfig) -> Result<Self, ChartError> {
        let clocks = Clocks::from(&config);
        let chart = Arc::new(RwLock::new(LiveChart::new(config)?));
        let capacity = ws.event_channel_capacity.max(1) + TERMINAL_SLOTS;
        let session = WsSession::connect(ws)?;

        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let driver = Driver {
            session,
            chart: Arc::clone(&chart),
            error_slot: reserve_slot(&event_tx),
            closed_slot: reserve_slot(&event_tx),
            event_tx,
            clocks,
        };
        let handle = tokio::spawn(driver.run(shutdown_rx));

        Ok(Self {
            chart,
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(handle),
            event_rx,
        })
    }

    /// Shared chart state. Hold read locks briefly; the driver writes every
    /// frame.
    pub fn chart(&self) -> Arc<RwLock<LiveChart>> {
        Arc::clone(&self.chart)
    }

    pub async fn snapshot(&self) -> ChartSnapshot {
        self.chart.read().await.snapshot()
    }

    pub async fn paths(&self) -> Option<ChartPaths> {
        self.chart.read().await.paths()
    }

    /// Whether the driver is still running.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the clocks, cancel frame requests and close the session.
    ///
    /// Later calls are no-ops.
    pub async fn shutdown(&mut self) -> Result<(), ChartError> {
        let Some(tx) = self.shutdown_tx.take() else {
            return Ok(());
        };
        // The driver may already have stopped on its own.
        let _ = tx.send(());

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(SHUTDOWN_WAIT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(ChartError::Other(format!("Driver task failed: {}", e))),
                Err(_) => tracing::warn!("Chart driver did not stop within {:?}", SHUTDOWN_WAIT),
            }
        }
        // Whatever the driver left behind, no more frames run.
        self.chart.write().await.teardown();
        Ok(())
    }
}

impl Stream for LiveChartClient {
    type Item = ChartEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        this.event_rx.poll_recv(cx)
    }
}

// ─── Driver task ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Clocks {
    acceptance: Duration,
    echo: Duration,
    frame: Duration,
}

impl From<&ChartConfig> for Clocks {
    fn from(config: &ChartConfig) -> Self {
        Self {
            acceptance: Duration::from_millis(config.acceptance_period_ms),
            echo: Duration::from_millis(config.echo_interval_ms),
            frame: Duration::from_millis(config.frame_interval_ms),
        }
    }
}

struct Driver {
    session: WsSession,
    chart: Arc<RwLock<LiveChart>>,
    event_tx: mpsc::Sender<ChartEvent>,
    error_slot: Option<OwnedPermit<ChartEvent>>,
    closed_slot: Option<OwnedPermit<ChartEvent>>,
    clocks: Clocks,
}

impl Driver {
    fn emit(&self, event: ChartEvent) {
        try_emit(&self.event_tx, event);
    }

    fn send_reserved(&self, slot: Option<OwnedPermit<ChartEvent>>, event: ChartEvent) {
        match slot {
            Some(permit) => {
                permit.send(event);
            }
            None => self.emit(event),
        }
    }

    async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) {
        let origin = Instant::now();
        let now_ms = || origin.elapsed().as_secs_f64() * 1000.0;

        let mut acceptance = interval_at(origin + self.clocks.acceptance, self.clocks.acceptance);
        let mut echo = interval_at(origin + self.clocks.echo, self.clocks.echo);
        let mut frame = interval_at(origin + self.clocks.frame, self.clocks.frame);
        for clock in [&mut acceptance, &mut echo, &mut frame] {
            clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        let mut closed = None;
        loop {
            tokio::select! {
                // ── a) Socket event ──────────────────────────────────────
                event = self.session.next_event() => {
                    let Some(event) = event else { break };
                    closed = self.handle_ws_event(event, now_ms()).await;
                    if closed.is_some() {
                        break;
                    }
                }

                // ── b) Acceptance period ─────────────────────────────────
                _ = acceptance.tick() => {
                    let accepted = self.chart.write().await.on_acceptance_tick(now_ms());
                    if let Some(sample) = accepted {
                        self.emit(ChartEvent::SampleAccepted(sample));
                    }
                }

                // ── c) Echo reseed ───────────────────────────────────────
                _ = echo.tick() => {
                    self.chart.write().await.on_echo_interval(now_ms());
                }

                // ── d) Frame clock ───────────────────────────────────────
                _ = frame.tick() => {
                    let settled = self.chart.write().await.on_frame(now_ms());
                    if let Some(settled) = settled {
                        self.emit(ChartEvent::PriceSettled(settled));
                    }
                }

                // ── e) Shutdown (or client dropped) ──────────────────────
                _ = &mut shutdown_rx => {
                    tracing::info!("Chart client shutting down");
                    break;
                }
            }
        }

        self.chart.write().await.teardown();
        if let Err(e) = self.session.close().await {
            tracing::warn!("Session close failed: {}", e);
        }
        let (code, reason) = match closed {
            Some(closed) => closed,
            None => self.drain_until_closed().await,
        };
        let slot = self.closed_slot.take();
        self.send_reserved(slot, ChartEvent::Closed { code, reason });
    }

    /// Apply one socket event. Returns the close code and reason once the
    /// session is over; the caller emits the final `Closed`.
    async fn handle_ws_event(
        &mut self,
        event: WsEvent,
        now_ms: f64,
    ) -> Option<(Option<u16>, String)> {
        match event {
            WsEvent::Open => {
                self.chart.write().await.on_open();
                self.emit(ChartEvent::Connected);
            }
            WsEvent::Message(text) => {
                let accepted = self.chart.write().await.on_message(&text, now_ms);
                if let Some(sample) = accepted {
                    self.emit(ChartEvent::SampleAccepted(sample));
                }
            }
            WsEvent::Error(error) => {
                self.chart.write().await.on_error(&error);
                let slot = self.error_slot.take();
                self.send_reserved(slot, ChartEvent::Error(error));
            }
            WsEvent::Closed { code, reason } => {
                self.chart.write().await.on_close(code, &reason);
                return Some((code, reason));
            }
        }
        None
    }

    /// Wait for the session's final `Closed`, skipping anything queued before it.
    async fn drain_until_closed(&mut self) -> (Option<u16>, String) {
        let deadline = Instant::now() + CLOSE_DRAIN;
        while let Ok(Some(event)) =
            tokio::time::timeout_at(deadline, self.session.next_event()).await
        {
            if let WsEvent::Closed { code, reason } = event {
                self.chart.write().await.on_close(code, &reason);
                return (code, reason);
            }
        }
        tracing::debug!("No close event within {:?}", CLOSE_DRAIN);
        let reason = "Client close";
        self.chart.write().await.on_close(Some(1000), reason);
        (Some(1000), reason.to_string())
    }
}
