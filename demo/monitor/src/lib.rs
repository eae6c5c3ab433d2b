//! # Demo Monitor
//!
//! Live risk monitor for the FrictionalBank dashboard API.
//!
//! Keeps one consistent view of portfolio valuation, XVA figures and the
//! forward exposure profile, fed from two independent sources:
//!
//! - **Poll**: `GET /api/portfolio` and `GET /api/risk` every 30 seconds
//! - **Push**: `WS /api/ws` events carrying partial risk and exposure updates
//!
//! `GET /api/exposure` is fetched at startup and whenever the exposure view
//! is opened.
//!
//! ## Modules
//!
//! - [`format`]: display formatting
//! - [`store`]: latest snapshot per dataset
//! - [`chart`]: in-place exposure chart model
//! - [`poll`]: fixed-interval poller
//! - [`push`]: push channel with reconnection
//! - [`sync`]: controller merging both sources
//! - [`navigator`]: active view tracking
//! - [`view`]: dashboard view model fed by render events

pub mod api_client;
pub mod app;
pub mod chart;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod navigator;
pub mod poll;
pub mod push;
pub mod render;
pub mod store;
pub mod sync;
pub mod view;

pub use error::{MonitorError, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::api_client::{ApiClient, SnapshotSource};
    pub use crate::app::MonitorApp;
    pub use crate::config::MonitorConfig;
    pub use crate::navigator::View;
    pub use crate::push::{PushChannel, TungsteniteTransport};
    pub use crate::render::{ConnectionStatus, RenderEvent};
    pub use crate::sync::{SyncController, SyncHandle};
    pub use crate::view::DashboardView;
}
