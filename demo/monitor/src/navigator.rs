//! Active view tracking.

use serde::Serialize;
use std::str::FromStr;

/// Dashboard views; exactly one is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Portfolio summary and risk overview
    #[default]
    Dashboard,
    /// Trade list with PV and greeks
    Portfolio,
    /// CVA, DVA, FVA and current exposure figures
    Risk,
    /// Forward exposure profile chart
    Exposure,
}

impl View {
    pub const ALL: [View; 4] = [Self::Dashboard, Self::Portfolio, Self::Risk, Self::Exposure];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Portfolio => "Portfolio",
            Self::Risk => "Risk",
            Self::Exposure => "Exposure",
        }
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dashboard" => Ok(Self::Dashboard),
            "portfolio" => Ok(Self::Portfolio),
            "risk" => Ok(Self::Risk),
            "exposure" => Ok(Self::Exposure),
            other => Err(format!("unknown view '{}'", other)),
        }
    }
}

/// Result of a view activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub previous: View,
    pub active: View,
    /// Set whenever the exposure view is activated; push events never carry
    /// the full time series, so it is refetched on every visit
    pub fetch_exposure: bool,
}

#[derive(Debug, Default)]
pub struct ViewNavigator {
    active: View,
}

impl ViewNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> View {
        self.active
    }

    /// Deactivate the current view and activate `view`
    pub fn activate(&mut self, view: View) -> Navigation {
        let previous = std::mem::replace(&mut self.active, view);
        Navigation {
            previous,
            active: view,
            fetch_exposure: view == View::Exposure,
        }
    }
}
