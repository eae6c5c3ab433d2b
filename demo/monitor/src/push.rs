//! Push channel to the backend's `/api/ws` event stream.
//!
//! ## Message Types
//!
//! - `connected`: greeting from the backend, logged only
//! - `risk`: partial risk update (PV, CVA, DVA, FVA)
//! - `exposure`: partial current-exposure update (EE, EPE, PFE)
//!
//! Any other `type`, or a frame that is not valid JSON, is logged and
//! skipped; the connection stays open.
//!
//! ## Lifecycle
//!
//! ```text
//! Connecting --handshake--> Connected --close--> Disconnected --delay--> Connecting
//!      |                        |
//!      +------transport error---+--> Error
//! ```
//!
//! A close always schedules the next attempt after the reconnect delay, with
//! no retry limit. Whether an error also reconnects is controlled by
//! [`PushChannel::reconnect_on_error`].

use crate::error::{MonitorError, Result};
use crate::model::{ExposurePatch, RiskPatch, RiskPush};
use crate::render::ConnectionStatus;
use crate::sync::{Inbound, SyncHandle};
use async_trait::async_trait;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Push channel lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ChannelState {
    /// Indicator status for this state; `Connecting` has none
    pub fn status(&self) -> Option<ConnectionStatus> {
        match self {
            Self::Connecting => None,
            Self::Connected => Some(ConnectionStatus::Connected),
            Self::Disconnected => Some(ConnectionStatus::Disconnected),
            Self::Error => Some(ConnectionStatus::Error),
        }
    }
}

/// Decoded push frame
#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    Connected { message: Option<String> },
    Risk(RiskPatch),
    Exposure(ExposurePatch),
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Decode one text frame
pub fn decode_frame(text: &str) -> Result<PushMessage> {
    let raw: RawFrame =
        serde_json::from_str(text).map_err(|e| MonitorError::decode(format!("push frame: {}", e)))?;

    match raw.kind.as_deref() {
        Some("connected") => Ok(PushMessage::Connected {
            message: raw.message,
        }),
        Some("risk") => {
            decode_data::<RiskPush>(raw.data, "risk").map(|push| PushMessage::Risk(push.into()))
        }
        Some("exposure") => decode_data(raw.data, "exposure").map(PushMessage::Exposure),
        Some(other) => Err(MonitorError::unrecognized(format!("type '{}'", other))),
        None => Err(MonitorError::unrecognized("frame without type")),
    }
}

fn decode_data<T: DeserializeOwned>(data: Option<serde_json::Value>, kind: &str) -> Result<T> {
    let data = data.ok_or_else(|| MonitorError::decode(format!("{} frame without data", kind)))?;
    serde_json::from_value(data).map_err(|e| MonitorError::decode(format!("{} frame: {}", kind, e)))
}

/// What the transport reports while a connection is open
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Text(String),
    Closed,
    Failed(String),
}

/// Events of one open connection; the stream ending counts as a close
pub type TransportStream = BoxStream<'static, TransportEvent>;

/// Opens push connections
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn connect(&self, url: &str) -> Result<TransportStream>;
}

/// WebSocket transport backed by tokio-tungstenite
#[derive(Debug, Default, Clone, Copy)]
pub struct TungsteniteTransport;

#[async_trait]
impl PushTransport for TungsteniteTransport {
    async fn connect(&self, url: &str) -> Result<TransportStream> {
        let (socket, _response) = connect_async(url)
            .await
            .map_err(|e| MonitorError::connection(format!("{}: {}", url, e)))?;

        let events = socket.filter_map(|item| {
            future::ready(match item {
                Ok(Message::Text(text)) => Some(TransportEvent::Text(text)),
                Ok(Message::Close(_)) => Some(TransportEvent::Closed),
                Ok(_) => None,
                Err(e) => Some(TransportEvent::Failed(e.to_string())),
            })
        });
        Ok(events.boxed())
    }
}

/// Delay before the next connection attempt.
///
/// `attempt` counts reconnects since the channel started, from 1.
pub trait ReconnectStrategy: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

/// Same delay before every attempt.
///
/// Capped exponential backoff is the usual production choice; this keeps the
/// dashboard's fixed three second retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    pub const DEFAULT: Duration = Duration::from_millis(3_000);
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl ReconnectStrategy for FixedDelay {
    fn delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

enum Outcome {
    Closed,
    Failed,
}

/// Owner of the single push connection
pub struct PushChannel {
    url: String,
    transport: Arc<dyn PushTransport>,
    strategy: Box<dyn ReconnectStrategy>,
    reconnect_on_error: bool,
    sync: SyncHandle,
    state: watch::Sender<ChannelState>,
}

impl PushChannel {
    pub fn new(url: impl Into<String>, transport: Arc<dyn PushTransport>, sync: SyncHandle) -> Self {
        let (state, _) = watch::channel(ChannelState::Disconnected);
        Self {
            url: url.into(),
            transport,
            strategy: Box::new(FixedDelay::default()),
            reconnect_on_error: true,
            sync,
            state,
        }
    }

    pub fn with_strategy(mut self, strategy: impl ReconnectStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// When set (the default), a transport error is followed by
    /// `Disconnected` and a scheduled reconnect, as if the transport had
    /// closed. When cleared, the channel stops in `Error`.
    pub fn reconnect_on_error(mut self, enabled: bool) -> Self {
        self.reconnect_on_error = enabled;
        self
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.state.subscribe()
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Connect, and keep reconnecting, until stalled by an error with
    /// `reconnect_on_error` cleared
    pub async fn run(self) {
        let mut attempt = 0u32;
        loop {
            match self.connect_once().await {
                Outcome::Closed => {}
                Outcome::Failed if self.reconnect_on_error => {
                    self.set_state(ChannelState::Disconnected);
                }
                Outcome::Failed => {
                    warn!(url = %self.url, "Push channel stalled after error, not reconnecting");
                    return;
                }
            }

            attempt = attempt.saturating_add(1);
            let delay = self.strategy.delay(attempt);
            info!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling push reconnect");
            tokio::time::sleep(delay).await;
        }
    }

    async fn connect_once(&self) -> Outcome {
        self.set_state(ChannelState::Connecting);

        let mut stream = match self.transport.connect(&self.url).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(url = %self.url, error = %e, "Push channel handshake failed");
                self.set_state(ChannelState::Error);
                return Outcome::Failed;
            }
        };

        self.set_state(ChannelState::Connected);
        info!(url = %self.url, "Push channel connected");

        let outcome = loop {
            match stream.next().await {
                Some(TransportEvent::Text(text)) => self.dispatch(&text),
                Some(TransportEvent::Closed) | None => {
                    info!(url = %self.url, "Push channel closed");
                    self.set_state(ChannelState::Disconnected);
                    break Outcome::Closed;
                }
                Some(TransportEvent::Failed(reason)) => {
                    let err = MonitorError::connection(reason);
                    warn!(url = %self.url, error = %err, "Push channel transport error");
                    self.set_state(ChannelState::Error);
                    break Outcome::Failed;
                }
            }
        };

        // Tear the connection down before any new attempt is made
        drop(stream);
        outcome
    }

    fn dispatch(&self, text: &str) {
        match decode_frame(text) {
            Ok(PushMessage::Connected { message }) => {
                info!(greeting = message.as_deref().unwrap_or_default(), "Push channel greeting");
            }
            Ok(message) => {
                debug!(?message, "Push message received");
                self.sync.send(Inbound::Pushed(message));
            }
            Err(e) => warn!(error = %e, "Ignoring push frame"),
        }
    }

    fn set_state(&self, state: ChannelState) {
        self.state.send_replace(state);
        self.sync.send(Inbound::Channel(state));
    }
}
