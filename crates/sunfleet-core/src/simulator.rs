//! Snapshot producer: synthetic telemetry for the fleet.
//!
//! Every value is a deterministic function of the tick plus fresh random
//! jitter drawn on each call. Calling twice with the same tick yields
//! numerically different but structurally identical results, which is
//! what noisy live telemetry looks like. Nothing is cached.
//!
//! The [`SnapshotSource`] trait is the seam the broadcaster depends on;
//! [`FleetSimulator`] is the production implementation and additionally
//! serves the chart series used by the REST endpoints.

use std::f64::consts::PI;

use chrono::{NaiveDate, Utc};
use rand::Rng;
use sunfleet_types::{
    CleaningEvent, FleetKpis, FleetView, PerformanceRatioPoint, Plant, PlantDetail, PlantId,
    PlantKpis, PlantView, PowerSample, SoilingChart, SoilingPoint, SoilingStats,
};

use crate::catalog::PlantCatalog;

/// Soiling never exceeds this percentage.
const MAX_SOILING: f64 = 35.0;

/// Modelled power per clock hour, index = hour of day.
const EXPECTED_POWER: [u32; 24] = [
    0, 0, 0, 0, 0, 0, 12, 35, 58, 78, 92, 102, 108, 106, 98, 85, 68, 48, 25, 8, 0, 0, 0, 0,
];

/// Baseline of the 15-day performance-ratio trend.
const PR_TREND_BASE: [f64; 15] = [
    86.0, 85.5, 84.8, 85.2, 84.5, 83.8, 84.2, 85.1, 84.7, 83.9, 84.5, 85.3, 84.8, 85.0, 84.6,
];

const SOILING_TREND_DATES: [&str; 23] = [
    "1/15", "2/1", "2/15", "3/1", "3/15", "4/1", "4/15", "5/1", "5/15", "6/1", "6/15", "7/1",
    "7/15", "8/1", "8/15", "9/1", "9/15", "10/1", "10/15", "10/21", "11/1", "11/15", "12/1",
];

const SOILING_CLEANING_DATES: [&str; 4] = ["3/1", "5/15", "8/1", "10/21"];

const SOILING_MARKER: &str = "10/21";

/// Source of per-tick snapshots consumed by the broadcaster.
///
/// Implementations must be cheap enough to call once per broadcast cycle
/// for the fleet and once per distinct subscribed plant.
pub trait SnapshotSource: Send + Sync {
    /// Fleet-wide view at `tick`.
    fn fleet_snapshot(&self, tick: u64) -> FleetView;

    /// View of a single plant at `tick`, or `None` if the plant is not in
    /// the catalog.
    fn entity_snapshot(&self, tick: u64, plant: PlantId) -> Option<PlantDetail>;
}

/// Catalog-driven telemetry simulator.
#[derive(Debug, Clone)]
pub struct FleetSimulator {
    catalog: PlantCatalog,
    ticks_per_day: u64,
    today: Option<NaiveDate>,
}

impl FleetSimulator {
    /// Create a simulator over `catalog`. `ticks_per_day` below 1 is
    /// treated as 1.
    pub fn new(catalog: PlantCatalog, ticks_per_day: u64) -> Self {
        Self {
            catalog,
            ticks_per_day: ticks_per_day.max(1),
            today: None,
        }
    }

    /// Pin the calendar date used for "days left" labels.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// The underlying catalog.
    pub const fn catalog(&self) -> &PlantCatalog {
        &self.catalog
    }

    /// Configured number of ticks per simulated day.
    pub const fn ticks_per_day(&self) -> u64 {
        self.ticks_per_day
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Live view of every plant.
    pub fn plants(&self, tick: u64) -> Vec<PlantView> {
        let mut rng = rand::rng();
        let today = self.today();
        self.catalog
            .plants()
            .iter()
            .map(|p| self.plant_view(&mut rng, p, tick, today))
            .collect()
    }

    /// Live view of one plant.
    pub fn plant(&self, tick: u64, id: PlantId) -> Option<PlantView> {
        let plant = self.catalog.get(id)?;
        let mut rng = rand::rng();
        Some(self.plant_view(&mut rng, plant, tick, self.today()))
    }

    /// Company-wide KPIs computed from a fresh set of plant views.
    pub fn fleet_kpis(&self, tick: u64) -> FleetKpis {
        let plants = self.plants(tick);
        let mut rng = rand::rng();
        self.aggregate_kpis(&mut rng, &plants)
    }

    /// KPIs for one plant.
    pub fn plant_kpis(&self, tick: u64, id: PlantId) -> Option<PlantKpis> {
        let plant = self.catalog.get(id)?;
        let mut rng = rand::rng();
        Some(self.kpis_for(&mut rng, plant, tick))
    }

    /// Intraday actual-vs-expected power, 05:00 to 19:30 in 30-minute steps.
    pub fn power_chart(&self) -> Vec<PowerSample> {
        let mut rng = rand::rng();
        power_chart(&mut rng)
    }

    /// 15-day performance-ratio trend with four lines.
    ///
    /// Unlike the other charts this one carries no noise: each line is a
    /// fixed offset from the base trend plus a drift that cycles with the
    /// tick.
    pub fn performance_ratio_chart(&self, tick: u64) -> Vec<PerformanceRatioPoint> {
        performance_ratio_chart(tick)
    }

    /// Yearly soiling trend plus summary stats.
    pub fn soiling_chart(&self, tick: u64) -> SoilingChart {
        let mut rng = rand::rng();
        SoilingChart {
            chart_data: soiling_trend(&mut rng),
            stats: soiling_stats(&mut rng, tick),
        }
    }

    /// Cleaning history with live-looking jitter on the savings.
    pub fn cleaning_events(&self) -> Vec<CleaningEvent> {
        let mut rng = rand::rng();
        self.catalog
            .cleaning_history()
            .iter()
            .map(|event| {
                let money_saved = if event.is_positive {
                    event.money_saved + jitter(&mut rng, 50.0, 0.5)
                } else {
                    -(event.money_saved.abs() + jitter(&mut rng, 20.0, 0.3))
                };
                CleaningEvent {
                    money_saved: round1(money_saved),
                    ..event.clone()
                }
            })
            .collect()
    }

    fn soiling(&self, rng: &mut impl Rng, tick: u64) -> f64 {
        let days = to_f64(tick.checked_div(self.ticks_per_day).unwrap_or(0));
        let soiling = 0.8f64.mul_add(days, 1.5) + jitter(rng, 0.5, 0.5);
        round1(soiling.min(MAX_SOILING))
    }

    fn hour_of_day(&self, tick: u64) -> f64 {
        let within_day = tick.checked_rem(self.ticks_per_day).unwrap_or(0);
        to_f64(within_day) * 24.0 / to_f64(self.ticks_per_day)
    }

    fn plant_view(
        &self,
        rng: &mut impl Rng,
        plant: &Plant,
        tick: u64,
        today: NaiveDate,
    ) -> PlantView {
        let soiling = self.soiling(rng, tick);
        let avg_pr = performance_ratio(rng, soiling);
        let day = day_factor(self.hour_of_day(tick));

        let production =
            (plant.base_production * day * (avg_pr / 100.0) * jitter(rng, 1.0, 0.05)).round();
        let revenue = if plant.base_production > 0.0 {
            (plant.base_revenue * (production / plant.base_production) * jitter(rng, 1.0, 0.03))
                .round()
        } else {
            0.0
        };

        PlantView {
            id: plant.id,
            name: plant.name.clone(),
            location: plant.location.clone(),
            capacity_mwp: plant.capacity_mwp,
            avg_pr,
            production: to_u32(production),
            revenue: to_u32(revenue),
            soiling,
            next_cleaning: plant.next_cleaning,
            days_left: days_left_label(plant.next_cleaning, today),
        }
    }

    fn aggregate_kpis(&self, rng: &mut impl Rng, plants: &[PlantView]) -> FleetKpis {
        let production: u64 = plants.iter().map(|p| u64::from(p.production)).sum();
        let revenue: u64 = plants.iter().map(|p| u64::from(p.revenue)).sum();

        FleetKpis {
            total_production: round1(to_f64(production) * jitter(rng, 47.0, 0.02)),
            total_revenue: round1(to_f64(revenue) / 1000.0 * jitter(rng, 1.2, 0.05)),
            active_plants: u32::try_from(self.catalog.len()).unwrap_or(u32::MAX),
            avg_system_efficiency: round1((88.0 + jitter(rng, 4.0, 0.3)).clamp(0.0, 100.0)),
            next_cleaning: self.catalog.earliest_next_cleaning(),
            last_cleaned: self.catalog.latest_cleaning(),
        }
    }

    fn kpis_for(&self, rng: &mut impl Rng, plant: &Plant, tick: u64) -> PlantKpis {
        let avg_soiling = self.soiling(rng, tick);
        let avg_pr = performance_ratio(rng, avg_soiling);
        PlantKpis {
            avg_pr,
            total_production: round1(
                plant
                    .base_production
                    .mul_add(425.0, jitter(rng, 1000.0, 0.1)),
            ),
            total_revenue: round1(plant.base_revenue / 100.0 * jitter(rng, 1.2, 0.05)),
            avg_soiling,
            next_cleaning: plant.next_cleaning,
            latest_soiling_update: plant.last_cleaned,
            actual_power: to_u32((98.0 + jitter(rng, 10.0, 0.3)).round()),
            expected_power: to_u32((106.0 + jitter(rng, 5.0, 0.2)).round()),
        }
    }
}

impl SnapshotSource for FleetSimulator {
    fn fleet_snapshot(&self, tick: u64) -> FleetView {
        let plants = self.plants(tick);
        let mut rng = rand::rng();
        let kpis = self.aggregate_kpis(&mut rng, &plants);
        FleetView { plants, kpis }
    }

    fn entity_snapshot(&self, tick: u64, id: PlantId) -> Option<PlantDetail> {
        let plant = self.catalog.get(id)?;
        let mut rng = rand::rng();
        Some(PlantDetail {
            plant: self.plant_view(&mut rng, plant, tick, self.today()),
            kpis: self.kpis_for(&mut rng, plant, tick),
            power_chart: power_chart(&mut rng),
        })
    }
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

/// `base` plus or minus up to `base * pct`, uniformly.
fn jitter(rng: &mut impl Rng, base: f64, pct: f64) -> f64 {
    let spread = (base * pct).abs();
    if spread > 0.0 {
        base + rng.random_range(-spread..=spread)
    } else {
        base
    }
}

fn performance_ratio(rng: &mut impl Rng, soiling: f64) -> f64 {
    let pr = soiling.mul_add(-0.3, 92.0) + jitter(rng, 2.0, 0.5);
    round1(pr.clamp(0.0, 100.0))
}

/// Sun elevation proxy: a half sine between 06:00 and 18:00.
fn day_factor(hour: f64) -> f64 {
    if (6.0..=18.0).contains(&hour) {
        ((hour - 6.0) / 12.0 * PI).sin().max(0.0)
    } else {
        0.0
    }
}

/// `"N Days left"` while the date is in the future, `"Due"` otherwise.
pub fn days_left_label(target: NaiveDate, today: NaiveDate) -> String {
    let days = target.signed_duration_since(today).num_days();
    if days > 0 {
        format!("{days} Days left")
    } else {
        "Due".to_owned()
    }
}

fn power_chart(rng: &mut impl Rng) -> Vec<PowerSample> {
    let mut samples = Vec::with_capacity(30);
    for hour in 5_usize..=19 {
        let expected = EXPECTED_POWER.get(hour).copied().unwrap_or(0);
        for minute in [0_u32, 30] {
            let weather = rng.random_range(0.85..1.05);
            let soiling = rng.random_range(0.92..0.97);
            let actual = (f64::from(expected) * weather * soiling).round();
            samples.push(PowerSample {
                time: format!("{hour}:{minute:02}"),
                actual: to_u32(actual),
                expected,
            });
        }
    }
    samples
}

fn performance_ratio_chart(tick: u64) -> Vec<PerformanceRatioPoint> {
    PR_TREND_BASE
        .iter()
        .zip(1_u64..)
        .map(|(&base, day)| {
            let drift = to_f64(tick.wrapping_add(day) % 10) / 10.0;
            let line = |offset: f64| round1(base + offset + drift);
            PerformanceRatioPoint {
                date: day.to_string(),
                line1: line(0.0),
                line2: line(-2.0),
                line3: line(1.0),
                line4: line(-1.0),
            }
        })
        .collect()
}

fn soiling_trend(rng: &mut impl Rng) -> Vec<SoilingPoint> {
    let mut soiling = 2.0_f64;
    SOILING_TREND_DATES
        .iter()
        .map(|&date| {
            if SOILING_CLEANING_DATES.contains(&date) {
                soiling = 2.0 + rng.random_range(0.0..1.0);
            } else {
                soiling += 0.8 + rng.random_range(0.0..0.6);
            }
            let soiling_pct = round1(soiling);
            SoilingPoint {
                date: date.to_owned(),
                soiling: soiling_pct,
                selected: (date == SOILING_MARKER).then_some(soiling_pct),
                production: round1(soiling.mul_add(-0.4, 100.0)),
            }
        })
        .collect()
}

fn soiling_stats(rng: &mut impl Rng, tick: u64) -> SoilingStats {
    SoilingStats {
        today_soiling: round1(to_f64(tick % 100).mul_add(0.05, 2.3)),
        selected_date: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap_or_default(),
        selected_date_cost: to_u32((7904.0 + jitter(rng, 500.0, 0.3)).round()),
        optimized_cleaning_cost: to_u32((5881.0 + jitter(rng, 300.0, 0.2)).round()),
        cleaning_date_marker: SOILING_MARKER.to_owned(),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[allow(clippy::cast_precision_loss)]
const fn to_f64(value: u64) -> f64 {
    value as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u32(value: f64) -> u32 {
    if value.is_finite() {
        value.clamp(0.0, f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn simulator() -> FleetSimulator {
        FleetSimulator::new(PlantCatalog::builtin(), 48)
            .with_today(NaiveDate::from_ymd_opt(2025, 10, 15).unwrap())
    }

    fn assert_percent(value: f64) {
        assert!((0.0..=100.0).contains(&value), "{value} outside [0, 100]");
    }

    #[test]
    fn fleet_snapshot_covers_catalog() {
        let sim = simulator();
        let view = sim.fleet_snapshot(0);
        assert_eq!(view.plants.len(), 10);
        assert_eq!(view.kpis.active_plants, 10);
        assert_percent(view.kpis.avg_system_efficiency);
    }

    #[test]
    fn entity_snapshot_unknown_plant_is_none() {
        let sim = simulator();
        assert!(sim.entity_snapshot(5, PlantId(99)).is_none());
        assert!(sim.plant_kpis(5, PlantId(99)).is_none());
        assert!(sim.plant(5, PlantId(99)).is_none());
    }

    #[test]
    fn repeated_entity_snapshots_keep_shape_and_ranges() {
        let sim = simulator();
        for _ in 0..50 {
            let detail = sim.entity_snapshot(5, PlantId(1)).unwrap();
            assert_eq!(detail.plant.id, PlantId(1));
            assert_percent(detail.plant.avg_pr);
            assert_percent(detail.plant.soiling);
            assert_percent(detail.kpis.avg_pr);
            assert!(detail.plant.soiling <= MAX_SOILING);
            assert_eq!(detail.power_chart.len(), 30);
        }
    }

    #[test]
    fn soiling_is_capped_after_many_days() {
        let sim = simulator();
        let detail = sim.entity_snapshot(48 * 365, PlantId(2)).unwrap();
        assert!(detail.plant.soiling <= MAX_SOILING);
        assert_percent(detail.plant.avg_pr);
    }

    #[test]
    fn no_production_at_night() {
        let sim = simulator();
        // Tick 0 is midnight, tick 46 is 23:00.
        for tick in [0, 2, 46] {
            for plant in sim.plants(tick) {
                assert_eq!(plant.production, 0, "tick {tick}");
                assert_eq!(plant.revenue, 0, "tick {tick}");
            }
        }
    }

    #[test]
    fn production_peaks_around_noon() {
        let sim = simulator();
        let noon: u32 = sim.plants(24).iter().map(|p| p.production).sum();
        assert!(noon > 0);
    }

    #[test]
    fn day_factor_shape() {
        assert!(day_factor(5.5).abs() < f64::EPSILON);
        assert!(day_factor(6.0).abs() < 1e-9);
        assert!((day_factor(12.0) - 1.0).abs() < 1e-9);
        assert!(day_factor(19.0).abs() < f64::EPSILON);
    }

    #[test]
    fn jitter_stays_within_band() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let v = jitter(&mut rng, 10.0, 0.1);
            assert!((9.0..=11.0).contains(&v));
        }
        assert!((jitter(&mut rng, 0.0, 2.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn days_left_labels() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 15).unwrap();
        let later = NaiveDate::from_ymd_opt(2025, 10, 21).unwrap();
        assert_eq!(days_left_label(later, today), "6 Days left");
        assert_eq!(days_left_label(today, today), "Due");
        assert_eq!(days_left_label(today, later), "Due");
    }

    #[test]
    fn power_chart_covers_daylight_half_hours() {
        let sim = simulator();
        let chart = sim.power_chart();
        assert_eq!(chart.len(), 30);
        assert_eq!(chart.first().unwrap().time, "5:00");
        assert_eq!(chart.last().unwrap().time, "19:30");
        for sample in &chart {
            // At most 105% weather times 97% soiling of expected.
            assert!(f64::from(sample.actual) <= f64::from(sample.expected) * 1.02 + 1.0);
        }
    }

    #[test]
    fn performance_ratio_chart_has_fifteen_days() {
        let sim = simulator();
        let chart = sim.performance_ratio_chart(3);
        assert_eq!(chart.len(), 15);
        assert_eq!(chart.first().unwrap().date, "1");
        for point in &chart {
            assert_percent(point.line1);
            assert_percent(point.line4);
        }
    }

    #[test]
    fn performance_ratio_chart_is_deterministic_per_tick() {
        let sim = simulator();
        let chart = sim.performance_ratio_chart(0);
        assert_eq!(chart, sim.performance_ratio_chart(0));

        // Day 1 at tick 0: base 86.0 plus a 0.1 drift.
        let first = chart.first().unwrap();
        assert!((first.line1 - 86.1).abs() < 1e-9);
        assert!((first.line2 - 84.1).abs() < 1e-9);
        assert!((first.line3 - 87.1).abs() < 1e-9);
        assert!((first.line4 - 85.1).abs() < 1e-9);

        // The drift cycles every ten ticks.
        assert_eq!(sim.performance_ratio_chart(10), chart);
        assert_ne!(sim.performance_ratio_chart(1), chart);
    }

    #[test]
    fn soiling_chart_resets_on_cleaning_dates() {
        let sim = simulator();
        let chart = sim.soiling_chart(10);
        assert_eq!(chart.chart_data.len(), 23);
        for point in &chart.chart_data {
            if SOILING_CLEANING_DATES.contains(&point.date.as_str()) {
                assert!((2.0..=3.0).contains(&point.soiling), "{point:?}");
            }
        }
        let selected: Vec<_> = chart
            .chart_data
            .iter()
            .filter(|p| p.selected.is_some())
            .collect();
        assert_eq!(selected.len(), 1);
        assert!((chart.stats.today_soiling - 2.8).abs() < 1e-9);
    }

    #[test]
    fn cleaning_events_keep_sign() {
        let sim = simulator();
        for event in sim.cleaning_events() {
            assert_eq!(event.is_positive, event.money_saved >= 0.0);
        }
    }
}
