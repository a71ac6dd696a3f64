//! Value objects produced by the snapshot producer and served to the
//! dashboard.
//!
//! Everything here is immutable once built. Field names serialize in
//! `camelCase` because the charting UI consumes them directly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::PlantId;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Static description of one plant in the fleet catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Plant {
    /// Catalog identifier.
    pub id: PlantId,
    /// Display name.
    pub name: String,
    /// Human-readable site location.
    pub location: String,
    /// Nameplate capacity in MWp.
    pub capacity_mwp: f64,
    /// Peak half-hourly production at 100% performance ratio.
    pub base_production: f64,
    /// Revenue at base production, in thousands of USD.
    pub base_revenue: f64,
    /// Next scheduled panel cleaning.
    pub next_cleaning: NaiveDate,
    /// Date of the most recent cleaning.
    pub last_cleaned: NaiveDate,
}

/// A historical cleaning event and its financial outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CleaningEvent {
    /// Day the cleaning took place.
    pub date: NaiveDate,
    /// Net money saved (negative when the cleaning cost more than it recovered).
    pub money_saved: f64,
    /// Soiling percentage measured on the cleaning date.
    pub soiling_on_date: f64,
    /// Share of soiling removed, in percent.
    pub cleaning_effectiveness: f64,
    /// Whether the cleaning paid for itself.
    pub is_positive: bool,
}

// ---------------------------------------------------------------------------
// Live views
// ---------------------------------------------------------------------------

/// Live state of a single plant at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlantView {
    /// Catalog identifier.
    pub id: PlantId,
    /// Display name.
    pub name: String,
    /// Human-readable site location.
    pub location: String,
    /// Nameplate capacity in MWp.
    pub capacity_mwp: f64,
    /// Average performance ratio in percent, within `[0, 100]`.
    pub avg_pr: f64,
    /// Current production in kWh.
    pub production: u32,
    /// Current revenue in thousands of USD.
    pub revenue: u32,
    /// Soiling loss in percent, within `[0, 35]`.
    pub soiling: f64,
    /// Next scheduled cleaning.
    pub next_cleaning: NaiveDate,
    /// `"N Days left"` or `"Due"`.
    pub days_left: String,
}

/// Company-wide KPIs aggregated over the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct FleetKpis {
    /// Total production across plants, in kWh.
    pub total_production: f64,
    /// Total revenue across plants, in millions of USD.
    pub total_revenue: f64,
    /// Number of plants in the catalog.
    pub active_plants: u32,
    /// Average system efficiency in percent, within `[0, 100]`.
    pub avg_system_efficiency: f64,
    /// Earliest upcoming cleaning across the fleet.
    pub next_cleaning: Option<NaiveDate>,
    /// Most recent cleaning across the fleet.
    pub last_cleaned: Option<NaiveDate>,
}

/// Fleet-wide view for dashboard subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FleetView {
    /// Every plant in catalog order.
    pub plants: Vec<PlantView>,
    /// Aggregated KPIs computed from `plants`.
    pub kpis: FleetKpis,
}

/// KPIs shown on a single plant's overview page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlantKpis {
    /// Average performance ratio in percent.
    #[serde(rename = "avgPR")]
    pub avg_pr: f64,
    /// Cumulative production in kWh.
    pub total_production: f64,
    /// Cumulative revenue in millions of USD.
    pub total_revenue: f64,
    /// Average soiling loss in percent.
    pub avg_soiling: f64,
    /// Next scheduled cleaning.
    pub next_cleaning: NaiveDate,
    /// Date the soiling estimate was last re-based.
    pub latest_soiling_update: NaiveDate,
    /// Actual instantaneous power in MW.
    pub actual_power: u32,
    /// Expected instantaneous power in MW.
    pub expected_power: u32,
}

/// One half-hour sample of the actual-vs-expected power chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PowerSample {
    /// Wall-clock label, e.g. `"9:30"`.
    pub time: String,
    /// Measured power.
    pub actual: u32,
    /// Modelled power.
    pub expected: u32,
}

/// Everything a plant-scoped subscriber receives for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlantDetail {
    /// Live plant view.
    pub plant: PlantView,
    /// Plant KPIs.
    pub kpis: PlantKpis,
    /// Intraday power chart.
    pub power_chart: Vec<PowerSample>,
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// One day of the performance-ratio trend chart (four inverter lines).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PerformanceRatioPoint {
    /// Day-of-period label.
    pub date: String,
    /// First line, percent.
    pub line1: f64,
    /// Second line, percent.
    pub line2: f64,
    /// Third line, percent.
    pub line3: f64,
    /// Fourth line, percent.
    pub line4: f64,
}

/// One point of the yearly soiling trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SoilingPoint {
    /// `month/day` label.
    pub date: String,
    /// Soiling loss in percent.
    pub soiling: f64,
    /// Soiling on the highlighted date, `None` elsewhere.
    pub selected: Option<f64>,
    /// Production efficiency in percent.
    pub production: f64,
}

/// Summary figures printed next to the soiling chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SoilingStats {
    /// Current soiling estimate in percent.
    pub today_soiling: f64,
    /// Highlighted date.
    pub selected_date: NaiveDate,
    /// Cost of cleaning on the highlighted date, USD.
    pub selected_date_cost: u32,
    /// Cost of cleaning on the optimized date, USD.
    pub optimized_cleaning_cost: u32,
    /// `month/day` label of the last cleaning marker.
    pub cleaning_date_marker: String,
}

/// Soiling trend plus its summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SoilingChart {
    /// Trend points in date order.
    pub chart_data: Vec<SoilingPoint>,
    /// Summary figures.
    pub stats: SoilingStats,
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

/// A plant's overview page in one response: the streamed detail plus the
/// trend charts and cleaning history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlantOverview {
    /// Plant view, KPIs, and power chart.
    #[serde(flatten)]
    pub detail: PlantDetail,
    /// 15-day performance-ratio trend.
    pub pr_chart: Vec<PerformanceRatioPoint>,
    /// Soiling trend and summary.
    pub soiling_chart: SoilingChart,
    /// Historical cleaning events.
    pub cleaning_events: Vec<CleaningEvent>,
    /// Tick the overview was computed at.
    pub tick: u64,
}
