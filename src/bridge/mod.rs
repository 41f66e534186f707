// SPDX-License-Identifier: GPL-3.0-only

//! Request/reply loop serving depth maps
//!
//! Each request runs one cycle:
//!
//! ```text
//! AwaitingRequest ──► Capturing ──► Retrieving ──► Replying ──┐
//!        ▲                │                                    │
//!        │                └── grab failed (no reply) ──────────┤
//!        └──────────────────────── cycle delay ◄───────────────┘
//! ```
//!
//! The loop ends in `Shutdown` when the shutdown signal fires or when the
//! channel or the reply encoder fails. The camera is closed on every exit.

pub mod channel;
pub mod reply;
pub mod shutdown;

use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace, warn};

use crate::backends::depth::{CameraSession, DepthBuffer, DepthCamera, resolve_init_parameters};
use crate::config::{BridgeConfig, GrabFailurePolicy, RetrieveFailurePolicy};
use crate::constants::REQUEST_LOG_LIMIT;
use crate::errors::{BridgeResult, CameraError};

use channel::{Request, RequestChannel, ZmqReplyChannel};
use reply::{ErrorDocument, ReplyDocument};
use shutdown::ShutdownSignal;

/// Phase of the bridge loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    AwaitingRequest,
    Capturing,
    Retrieving,
    Replying,
    Shutdown,
}

/// How a single request was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Fresh depth data was sent
    Replied,
    /// Retrieval failed and the previous buffer contents were sent
    RepliedStale,
    /// Grab failed and no reply was sent
    ReplyDropped,
    /// An error document was sent
    ErrorReplied,
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeSummary {
    pub requests: u64,
    pub replies: u64,
    pub stale_replies: u64,
    pub dropped_requests: u64,
    pub error_replies: u64,
}

/// Per-cycle behaviour taken from the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    pub cycle_delay: Duration,
    pub on_grab_failure: GrabFailurePolicy,
    pub on_retrieve_failure: RetrieveFailurePolicy,
}

impl From<&BridgeConfig> for BridgeSettings {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            cycle_delay: config.cycle_delay(),
            on_grab_failure: config.on_grab_failure,
            on_retrieve_failure: config.on_retrieve_failure,
        }
    }
}

/// Loop state: the open camera, the reusable depth buffer and the socket
pub struct Bridge<C: DepthCamera, Ch: RequestChannel> {
    session: CameraSession<C>,
    channel: Ch,
    buffer: DepthBuffer,
    settings: BridgeSettings,
    state: BridgeState,
    summary: BridgeSummary,
}

impl<C: DepthCamera, Ch: RequestChannel> Bridge<C, Ch> {
    /// Take ownership of an opened session, a bound channel and the buffer replies are built from
    ///
    /// Every retrieval targets `buffer`'s resolution.
    pub fn new(
        session: CameraSession<C>,
        channel: Ch,
        buffer: DepthBuffer,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            session,
            channel,
            buffer,
            settings,
            state: BridgeState::AwaitingRequest,
            summary: BridgeSummary::default(),
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn summary(&self) -> BridgeSummary {
        self.summary
    }

    pub fn buffer(&self) -> &DepthBuffer {
        &self.buffer
    }

    pub fn channel(&self) -> &Ch {
        &self.channel
    }

    pub fn camera(&self) -> &C {
        &self.session
    }

    /// Serve requests until shutdown or an unrecoverable error
    ///
    /// The camera is closed before this returns, whatever the outcome.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> BridgeResult<BridgeSummary> {
        let result = self.run_cycles(&mut shutdown).await;

        self.enter(BridgeState::Shutdown);
        self.session.close();

        let summary = self.summary;
        match result {
            Ok(()) => {
                info!(
                    requests = summary.requests,
                    replies = summary.replies,
                    stale = summary.stale_replies,
                    dropped = summary.dropped_requests,
                    errors = summary.error_replies,
                    "Bridge stopped"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(stage = e.stage(), error = %e, "Shutting down");
                Err(e)
            }
        }
    }

    async fn run_cycles(&mut self, shutdown: &mut ShutdownSignal) -> BridgeResult<()> {
        loop {
            self.enter(BridgeState::AwaitingRequest);
            let request = tokio::select! {
                biased;
                _ = shutdown.triggered() => return Ok(()),
                request = self.channel.recv() => request?,
            };

            self.serve(&request).await?;

            if shutdown.is_triggered() {
                return Ok(());
            }
            if !self.settings.cycle_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = shutdown.triggered() => return Ok(()),
                    _ = tokio::time::sleep(self.settings.cycle_delay) => {}
                }
            }
        }
    }

    /// Run one cycle for a request that has already been received
    pub async fn serve(&mut self, request: &Request) -> BridgeResult<CycleOutcome> {
        self.summary.requests += 1;
        info!(
            payload = %request.preview(REQUEST_LOG_LIMIT),
            bytes = request.payload.len(),
            "Received request"
        );

        self.enter(BridgeState::Capturing);
        if let Err(code) = self.session.grab() {
            warn!(%code, "Failed to grab depth frame");
            return match self.settings.on_grab_failure {
                GrabFailurePolicy::Drop => {
                    self.summary.dropped_requests += 1;
                    Ok(CycleOutcome::ReplyDropped)
                }
                GrabFailurePolicy::ErrorReply => {
                    self.send_error(ErrorDocument::new("grab", code)).await
                }
            };
        }
        debug!("Grab succeeded");

        self.enter(BridgeState::Retrieving);
        let resolution = self.buffer.resolution();
        let stale = match self.session.retrieve_depth(&mut self.buffer, resolution) {
            Ok(()) => {
                debug!(%resolution, "Depth measure retrieved");
                false
            }
            Err(cause) => {
                warn!(error = %cause, "Failed to retrieve depth measure");
                match self.settings.on_retrieve_failure {
                    RetrieveFailurePolicy::SendStale => true,
                    RetrieveFailurePolicy::ErrorReply => {
                        return self.send_error(ErrorDocument::new("retrieve", cause)).await;
                    }
                }
            }
        };

        self.enter(BridgeState::Replying);
        let started = Instant::now();
        let reply = ReplyDocument::new(&self.buffer).to_bytes()?;
        let bytes = reply.len();
        self.channel.send(reply).await?;
        self.summary.replies += 1;
        info!(
            bytes,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            stale,
            "Depth reply sent"
        );

        if stale {
            self.summary.stale_replies += 1;
            Ok(CycleOutcome::RepliedStale)
        } else {
            Ok(CycleOutcome::Replied)
        }
    }

    async fn send_error(&mut self, document: ErrorDocument) -> BridgeResult<CycleOutcome> {
        self.enter(BridgeState::Replying);
        self.channel.send(document.to_bytes()?).await?;
        self.summary.error_replies += 1;
        info!(stage = %document.error.stage, code = %document.error.code, "Error reply sent");
        Ok(CycleOutcome::ErrorReplied)
    }

    fn enter(&mut self, state: BridgeState) {
        trace!(from = ?self.state, to = ?state, "Bridge state");
        self.state = state;
    }
}

/// Open `camera`, bind the reply socket and serve until shutdown
///
/// `source` is the optional positional token selecting input or resolution.
pub async fn serve<C: DepthCamera>(
    camera: C,
    config: &BridgeConfig,
    source: Option<&str>,
    shutdown: ShutdownSignal,
) -> BridgeResult<BridgeSummary> {
    config.validate()?;

    info!("Initializing depth camera...");
    let params = resolve_init_parameters(config.init_parameters(), source);
    let session = CameraSession::open(camera, &params).map_err(CameraError::Open)?;

    let camera_info = session.camera_information();
    let buffer = DepthBuffer::new(config.output_resolution);
    info!(
        model = %camera_info.model,
        serial = camera_info.serial_number,
        native = %camera_info.native_resolution,
        input = camera_info.input_kind,
        output = %config.output_resolution,
        "Depth camera ready"
    );

    info!("Setting up message server...");
    let channel = ZmqReplyChannel::bind(&config.endpoint).await?;

    Bridge::new(session, channel, buffer, BridgeSettings::from(config))
        .run(shutdown)
        .await
}
