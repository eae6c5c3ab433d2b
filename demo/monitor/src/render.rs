//! Render boundary: events produced by the core for the view layer.

use crate::chart::ChartUpdate;
use crate::model::{Patch, Snapshot};
use crate::navigator::View;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

/// Connection indicator state shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Error,
}

impl ConnectionStatus {
    /// Indicator text
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
            Self::Error => "Connection Error",
        }
    }
}

/// A dataset change applied by the snapshot store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "update", rename_all = "lowercase")]
pub enum DatasetUpdate {
    /// Wholesale replacement
    Replaced { snapshot: Snapshot },
    /// Field-level merge; `snapshot` is the value after merging
    Merged { snapshot: Snapshot, patch: Patch },
}

impl DatasetUpdate {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            Self::Replaced { snapshot } | Self::Merged { snapshot, .. } => snapshot,
        }
    }
}

/// Events consumed by the view layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RenderEvent {
    Dataset(DatasetUpdate),
    Status(ConnectionStatus),
    Chart(ChartUpdate),
    ActiveView { previous: View, active: View },
}

/// Sending half of the render boundary.
///
/// Delivery is synchronous and ordered; a dropped view layer only
/// produces a debug log.
#[derive(Debug, Clone)]
pub struct RenderBoundary {
    tx: mpsc::UnboundedSender<RenderEvent>,
}

impl RenderBoundary {
    /// Create a boundary and the receiver the view layer reads from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RenderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: RenderEvent) {
        if self.tx.send(event).is_err() {
            debug!("Render boundary closed, dropping event");
        }
    }
}
