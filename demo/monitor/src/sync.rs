//! Synchronisation controller.
//!
//! Poll results, push events, channel state changes and navigation requests
//! all arrive as [`Inbound`] messages on one channel. The controller is their
//! only consumer and applies them strictly in arrival order, so whichever
//! write arrives last is the one displayed.

use crate::api_client::SnapshotSource;
use crate::chart::ChartSeriesModel;
use crate::model::{DatasetKind, Patch, RiskPatch, Snapshot};
use crate::navigator::{View, ViewNavigator};
use crate::poll::spawn_fetch;
use crate::push::{ChannelState, PushMessage};
use crate::render::{RenderBoundary, RenderEvent};
use crate::store::SnapshotStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Messages delivered to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Full snapshot from a pull fetch
    Pulled(Snapshot),
    /// Decoded push event
    Pushed(PushMessage),
    /// Push channel state transition
    Channel(ChannelState),
    /// User navigation
    Navigate(View),
}

/// Cloneable sender into the controller
#[derive(Debug, Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl SyncHandle {
    /// A handle plus the receiving end a controller would own
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Inbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Request activation of `view`
    pub fn navigate(&self, view: View) {
        self.send(Inbound::Navigate(view));
    }

    pub fn send(&self, inbound: Inbound) {
        if self.tx.send(inbound).is_err() {
            debug!("Sync controller stopped, dropping inbound message");
        }
    }
}

pub struct SyncController {
    source: Arc<dyn SnapshotSource>,
    store: SnapshotStore,
    chart: ChartSeriesModel,
    navigator: ViewNavigator,
    render: RenderBoundary,
    handle: SyncHandle,
    inbound: mpsc::UnboundedReceiver<Inbound>,
}

impl SyncController {
    pub fn new(source: Arc<dyn SnapshotSource>, chart: ChartSeriesModel, render: RenderBoundary) -> Self {
        let (handle, inbound) = SyncHandle::channel();
        Self {
            source,
            store: SnapshotStore::new(render.clone()),
            chart,
            navigator: ViewNavigator::new(),
            render,
            handle,
            inbound,
        }
    }

    /// Handle for producers (poller, push channel, navigation input)
    pub fn handle(&self) -> SyncHandle {
        self.handle.clone()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn chart(&self) -> &ChartSeriesModel {
        &self.chart
    }

    pub fn active_view(&self) -> View {
        self.navigator.active()
    }

    /// Issue a one-off fetch whose result comes back through the inbound channel
    pub fn fetch(&self, kind: DatasetKind) {
        spawn_fetch(Arc::clone(&self.source), kind, self.handle());
    }

    /// Wait for the next inbound message and apply it.
    ///
    /// Returns `false` once every sender is gone, which cannot happen while
    /// the controller holds its own handle.
    pub async fn step(&mut self) -> bool {
        match self.inbound.recv().await {
            Some(inbound) => {
                self.apply(inbound);
                true
            }
            None => false,
        }
    }

    /// Apply messages until the process stops
    pub async fn run(mut self) {
        info!("Sync controller running");
        while self.step().await {}
    }

    /// Apply one message synchronously
    pub fn apply(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Pulled(snapshot) => self.apply_snapshot(snapshot),
            Inbound::Pushed(message) => self.apply_push(message),
            Inbound::Channel(state) => {
                if let Some(status) = state.status() {
                    self.render.emit(RenderEvent::Status(status));
                }
            }
            Inbound::Navigate(view) => {
                let navigation = self.navigator.activate(view);
                debug!(previous = ?navigation.previous, active = ?navigation.active, "View activated");
                self.render.emit(RenderEvent::ActiveView {
                    previous: navigation.previous,
                    active: navigation.active,
                });
                if navigation.fetch_exposure {
                    self.fetch(DatasetKind::Exposure);
                }
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let chart_update = match &snapshot {
            Snapshot::Exposure(series) => self.chart.apply(series),
            _ => None,
        };
        self.store.replace(snapshot);
        if let Some(update) = chart_update {
            self.render.emit(RenderEvent::Chart(update));
        }
    }

    fn apply_push(&mut self, message: PushMessage) {
        let patch: RiskPatch = match message {
            PushMessage::Connected { .. } => return,
            PushMessage::Risk(patch) => patch,
            PushMessage::Exposure(patch) => patch.into(),
        };
        if patch.is_empty() {
            warn!("Push event carried no known fields, ignoring");
            return;
        }
        self.store.merge_fields(Patch::Risk(patch));
    }
}
