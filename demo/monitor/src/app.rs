//! Monitor application wiring.

use crate::api_client::SnapshotSource;
use crate::chart::ChartSeriesModel;
use crate::config::MonitorConfig;
use crate::model::DatasetKind;
use crate::poll::PollScheduler;
use crate::push::{FixedDelay, PushChannel, PushTransport};
use crate::render::{RenderBoundary, RenderEvent};
use crate::sync::{SyncController, SyncHandle};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Composes the controller, poller and push channel for one backend
pub struct MonitorApp {
    config: MonitorConfig,
    source: Arc<dyn SnapshotSource>,
    transport: Arc<dyn PushTransport>,
    controller: SyncController,
}

impl MonitorApp {
    /// Create the application and the render event receiver for the view layer
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn SnapshotSource>,
        transport: Arc<dyn PushTransport>,
    ) -> (Self, mpsc::UnboundedReceiver<RenderEvent>) {
        let (render, render_rx) = RenderBoundary::channel();
        let controller = SyncController::new(Arc::clone(&source), ChartSeriesModel::new(), render);
        let app = Self {
            config,
            source,
            transport,
            controller,
        };
        (app, render_rx)
    }

    /// Handle for navigation input
    pub fn handle(&self) -> SyncHandle {
        self.controller.handle()
    }

    /// Start the exposure fetch, poll schedule and push channel together,
    /// then apply inbound updates until the task is dropped
    pub async fn run(self) {
        let Self {
            config,
            source,
            transport,
            controller,
        } = self;

        info!(
            api = %config.api_base(),
            push = %config.push_url(),
            poll_interval_ms = config.poll_interval_ms,
            reconnect_delay_ms = config.reconnect_delay_ms,
            reconnect_on_error = config.reconnect_on_error,
            "Starting risk monitor"
        );

        controller.fetch(DatasetKind::Exposure);

        let poller = PollScheduler::new(source, config.poll_interval(), controller.handle()).spawn();
        let push = PushChannel::new(config.push_url(), transport, controller.handle())
            .with_strategy(FixedDelay(config.reconnect_delay()))
            .reconnect_on_error(config.reconnect_on_error)
            .spawn();

        controller.run().await;

        poller.abort();
        push.abort();
    }
}
