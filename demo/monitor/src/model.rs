//! Dataset types mirrored from the dashboard API.
//!
//! Field names follow the backend's JSON so the pull responses and push
//! payloads decode without renaming.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};

/// Dataset kinds held by the snapshot store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Portfolio,
    Risk,
    Exposure,
}

impl DatasetKind {
    /// Pull endpoint path below the API base
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Portfolio => "portfolio",
            Self::Risk => "risk",
            Self::Exposure => "exposure",
        }
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Trade row as returned by `GET /api/portfolio`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub instrument: String,
    pub notional: f64,
    pub pv: f64,
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
}

/// Portfolio valuation snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub total_pv: f64,
    pub trade_count: u64,
    /// Backend order, never re-sorted
    pub trades: Vec<Trade>,
}

/// Counterparty risk snapshot.
///
/// `total_xva` is supplied by the backend and never recomputed from the
/// components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    /// Carried by the backend's risk endpoint and `risk` push events
    #[serde(default)]
    pub total_pv: Option<f64>,
    pub cva: f64,
    pub dva: f64,
    pub fva: f64,
    pub total_xva: f64,
    /// Current Expected Exposure
    pub ee: f64,
    /// Current Expected Positive Exposure
    pub epe: f64,
    /// Current Potential Future Exposure (95%)
    pub pfe: f64,
}

impl RiskSnapshot {
    /// Overwrite only the fields present in `patch`
    pub fn apply(&mut self, patch: &RiskPatch) {
        if let Some(total_pv) = patch.total_pv {
            self.total_pv = Some(total_pv);
        }
        let fields = [
            (&mut self.cva, patch.cva),
            (&mut self.dva, patch.dva),
            (&mut self.fva, patch.fva),
            (&mut self.total_xva, patch.total_xva),
            (&mut self.ee, patch.ee),
            (&mut self.epe, patch.epe),
            (&mut self.pfe, patch.pfe),
        ];
        for (slot, value) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// Partial risk update; absent fields leave the snapshot untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cva: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dva: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fva: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_xva: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epe: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pfe: Option<f64>,
}

impl RiskPatch {
    /// Names of the fields this patch carries
    pub fn fields(&self) -> Vec<&'static str> {
        [
            ("total_pv", self.total_pv),
            ("cva", self.cva),
            ("dva", self.dva),
            ("fva", self.fva),
            ("total_xva", self.total_xva),
            ("ee", self.ee),
            ("epe", self.epe),
            ("pfe", self.pfe),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|_| name))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

/// Valuation figures carried by a pushed `risk` event; any other key is ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskPush {
    #[serde(default)]
    pub total_pv: Option<f64>,
    #[serde(default)]
    pub cva: Option<f64>,
    #[serde(default)]
    pub dva: Option<f64>,
    #[serde(default)]
    pub fva: Option<f64>,
}

impl From<RiskPush> for RiskPatch {
    fn from(push: RiskPush) -> Self {
        Self {
            total_pv: push.total_pv,
            cva: push.cva,
            dva: push.dva,
            fva: push.fva,
            ..Self::default()
        }
    }
}

/// Current exposure scalars pushed by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposurePatch {
    #[serde(default)]
    pub ee: Option<f64>,
    #[serde(default)]
    pub epe: Option<f64>,
    #[serde(default)]
    pub pfe: Option<f64>,
}

impl From<ExposurePatch> for RiskPatch {
    fn from(patch: ExposurePatch) -> Self {
        Self {
            ee: patch.ee,
            epe: patch.epe,
            pfe: patch.pfe,
            ..Self::default()
        }
    }
}

/// One point on the forward exposure profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    /// Offset from valuation date in years
    pub time: f64,
    pub pfe: f64,
    pub ee: f64,
    pub epe: f64,
    pub ene: f64,
}

/// Forward exposure profile, replaced wholesale on every update
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExposureTimeSeries {
    points: Vec<TimePoint>,
}

impl ExposureTimeSeries {
    /// Build a series, rejecting negative or non-increasing time offsets
    pub fn new(points: Vec<TimePoint>) -> Result<Self> {
        let mut previous: Option<f64> = None;
        for point in &points {
            if !(point.time >= 0.0) {
                return Err(MonitorError::decode(format!(
                    "exposure time offset {} is negative",
                    point.time
                )));
            }
            if let Some(prev) = previous {
                if point.time <= prev {
                    return Err(MonitorError::decode(format!(
                        "exposure time offsets not strictly increasing: {} after {}",
                        point.time, prev
                    )));
                }
            }
            previous = Some(point.time);
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Body of `GET /api/exposure`; summary fields beside the series are ignored
#[derive(Debug, Deserialize)]
pub struct ExposureResponse {
    pub time_series: Vec<TimePoint>,
}

impl TryFrom<ExposureResponse> for ExposureTimeSeries {
    type Error = MonitorError;

    fn try_from(response: ExposureResponse) -> Result<Self> {
        Self::new(response.time_series)
    }
}

/// A full dataset value, as produced by a pull fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Snapshot {
    Portfolio(PortfolioSnapshot),
    Risk(RiskSnapshot),
    Exposure(ExposureTimeSeries),
}

impl Snapshot {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Self::Portfolio(_) => DatasetKind::Portfolio,
            Self::Risk(_) => DatasetKind::Risk,
            Self::Exposure(_) => DatasetKind::Exposure,
        }
    }
}

/// A partial dataset value, as produced by a push event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Patch {
    Risk(RiskPatch),
}

impl Patch {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Self::Risk(_) => DatasetKind::Risk,
        }
    }

    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            Self::Risk(patch) => patch.fields(),
        }
    }
}
