//! Shared type definitions for the sunfleet telemetry simulator.
//!
//! This crate holds the value objects that cross crate boundaries: the
//! plant catalog entries, the live views produced each tick, and the
//! chart series served to the dashboard. Types flow downstream to
//! `TypeScript` via `ts-rs` so the charting UI stays in sync.
//!
//! # Modules
//!
//! - [`ids`] -- Plant and subscriber identifiers
//! - [`enums`] -- Subscription scope, envelope kind, broadcaster phase
//! - [`structs`] -- Catalog, live views, KPIs, and chart points

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{BroadcastPhase, EnvelopeKind, Scope};
pub use ids::{PlantId, SubscriberId};
pub use structs::{
    CleaningEvent, FleetKpis, FleetView, PerformanceRatioPoint, Plant, PlantDetail, PlantKpis,
    PlantOverview, PlantView, PowerSample, SoilingChart, SoilingPoint, SoilingStats,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::PlantId::export_all();
        let _ = crate::ids::SubscriberId::export_all();

        let _ = crate::enums::Scope::export_all();
        let _ = crate::enums::EnvelopeKind::export_all();
        let _ = crate::enums::BroadcastPhase::export_all();

        let _ = crate::structs::Plant::export_all();
        let _ = crate::structs::CleaningEvent::export_all();
        let _ = crate::structs::PlantView::export_all();
        let _ = crate::structs::FleetKpis::export_all();
        let _ = crate::structs::FleetView::export_all();
        let _ = crate::structs::PlantKpis::export_all();
        let _ = crate::structs::PowerSample::export_all();
        let _ = crate::structs::PlantDetail::export_all();
        let _ = crate::structs::PerformanceRatioPoint::export_all();
        let _ = crate::structs::SoilingPoint::export_all();
        let _ = crate::structs::SoilingStats::export_all();
        let _ = crate::structs::SoilingChart::export_all();
        let _ = crate::structs::PlantOverview::export_all();
    }
}
