//! Dashboard view model.
//!
//! Folds [`RenderEvent`]s into the values a dashboard would paint. A merge
//! only touches the fields its patch carried; everything else keeps its last
//! displayed value.

use crate::chart::ChartUpdate;
use crate::format::{format_fixed, format_number, DisplayValue};
use crate::model::{Patch, PortfolioSnapshot, RiskPatch, RiskSnapshot, Snapshot, Trade};
use crate::navigator::View;
use crate::render::{ConnectionStatus, DatasetUpdate, RenderEvent};
use serde::Serialize;
use std::collections::BTreeMap;

/// Named scalar fields on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    TotalPv,
    TradeCount,
    Cva,
    Dva,
    Fva,
    TotalXva,
    Ee,
    Epe,
    Pfe,
}

/// Formatted trade table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRowDisplay {
    pub id: String,
    pub instrument: String,
    pub notional: String,
    pub pv: DisplayValue,
    pub delta: String,
    pub gamma: String,
    pub vega: String,
}

impl From<&Trade> for TradeRowDisplay {
    fn from(trade: &Trade) -> Self {
        Self {
            id: trade.id.clone(),
            instrument: trade.instrument.clone(),
            notional: format_number(trade.notional, 0),
            pv: DisplayValue::currency(trade.pv),
            delta: format_fixed(trade.delta, 4),
            gamma: format_fixed(trade.gamma, 4),
            vega: format_fixed(trade.vega, 4),
        }
    }
}

#[derive(Debug, Default)]
pub struct DashboardView {
    fields: BTreeMap<Field, DisplayValue>,
    trades: Vec<TradeRowDisplay>,
    status: Option<ConnectionStatus>,
    active: View,
    chart: Option<ChartUpdate>,
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event, returning the scalar fields it repainted
    pub fn apply(&mut self, event: &RenderEvent) -> Vec<Field> {
        match event {
            RenderEvent::Dataset(DatasetUpdate::Replaced { snapshot }) => match snapshot {
                Snapshot::Portfolio(portfolio) => self.show_portfolio(portfolio),
                Snapshot::Risk(risk) => self.show_risk(risk),
                Snapshot::Exposure(_) => Vec::new(),
            },
            RenderEvent::Dataset(DatasetUpdate::Merged { patch, .. }) => match patch {
                Patch::Risk(patch) => self.show_risk_patch(patch),
            },
            RenderEvent::Status(status) => {
                self.status = Some(*status);
                Vec::new()
            }
            RenderEvent::Chart(update) => {
                self.chart = Some(update.clone());
                Vec::new()
            }
            RenderEvent::ActiveView { active, .. } => {
                self.active = *active;
                Vec::new()
            }
        }
    }

    pub fn field(&self, field: Field) -> Option<&DisplayValue> {
        self.fields.get(&field)
    }

    pub fn fields(&self) -> &BTreeMap<Field, DisplayValue> {
        &self.fields
    }

    pub fn trades(&self) -> &[TradeRowDisplay] {
        &self.trades
    }

    pub fn status(&self) -> Option<ConnectionStatus> {
        self.status
    }

    /// Indicator text; empty before the first connection attempt settles
    pub fn status_text(&self) -> &'static str {
        self.status.map(|s| s.label()).unwrap_or("")
    }

    pub fn active_view(&self) -> View {
        self.active
    }

    pub fn chart(&self) -> Option<&ChartUpdate> {
        self.chart.as_ref()
    }

    fn show_portfolio(&mut self, portfolio: &PortfolioSnapshot) -> Vec<Field> {
        self.fields
            .insert(Field::TotalPv, DisplayValue::currency(portfolio.total_pv));
        self.fields
            .insert(Field::TradeCount, DisplayValue::plain(portfolio.trade_count.to_string()));
        self.trades = portfolio.trades.iter().map(TradeRowDisplay::from).collect();
        vec![Field::TotalPv, Field::TradeCount]
    }

    fn show_risk(&mut self, risk: &RiskSnapshot) -> Vec<Field> {
        let toned = [
            (Field::Cva, risk.cva),
            (Field::Dva, risk.dva),
            (Field::Fva, risk.fva),
            (Field::TotalXva, risk.total_xva),
        ];
        let plain = [(Field::Ee, risk.ee), (Field::Epe, risk.epe), (Field::Pfe, risk.pfe)];
        let present = |(field, value): (Field, f64)| (field, Some(value));
        self.show(toned.map(present), plain.map(present))
    }

    fn show_risk_patch(&mut self, patch: &RiskPatch) -> Vec<Field> {
        let toned = [
            (Field::TotalPv, patch.total_pv),
            (Field::Cva, patch.cva),
            (Field::Dva, patch.dva),
            (Field::Fva, patch.fva),
            (Field::TotalXva, patch.total_xva),
        ];
        let plain = [(Field::Ee, patch.ee), (Field::Epe, patch.epe), (Field::Pfe, patch.pfe)];
        self.show(toned, plain)
    }

    fn show(
        &mut self,
        toned: impl IntoIterator<Item = (Field, Option<f64>)>,
        plain: impl IntoIterator<Item = (Field, Option<f64>)>,
    ) -> Vec<Field> {
        let mut touched = Vec::new();
        for (field, value) in toned {
            if let Some(value) = value {
                self.fields.insert(field, DisplayValue::currency(value));
                touched.push(field);
            }
        }
        for (field, value) in plain {
            if let Some(value) = value {
                self.fields.insert(field, DisplayValue::plain_currency(value));
                touched.push(field);
            }
        }
        touched
    }
}
