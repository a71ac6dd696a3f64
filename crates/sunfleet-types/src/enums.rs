//! Enumeration types shared between the core and the HTTP layer.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::PlantId;

/// What a streaming subscriber wants to receive.
///
/// Fixed when the stream is opened and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "plant_id", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Scope {
    /// Fleet-wide dashboard stream: every plant plus company KPIs.
    AllPlants,
    /// Stream scoped to a single plant.
    Plant(PlantId),
}

/// The `type` discriminator of a stream envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum EnvelopeKind {
    /// First message on a freshly opened stream, built from the current tick.
    Initial,
    /// Periodic message produced by a broadcast cycle.
    Update,
}

/// Whether a broadcast cycle is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BroadcastPhase {
    /// No cycle in progress.
    Idle,
    /// A cycle is visiting subscribers.
    Broadcasting,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_serialization() {
        let all = serde_json::to_value(Scope::AllPlants).ok();
        assert_eq!(all, Some(serde_json::json!({ "kind": "all_plants" })));

        let one = serde_json::to_value(Scope::Plant(PlantId(4))).ok();
        assert_eq!(
            one,
            Some(serde_json::json!({ "kind": "plant", "plant_id": 4 }))
        );
    }

    #[test]
    fn envelope_kind_is_lowercase() {
        let initial = serde_json::to_value(EnvelopeKind::Initial).ok();
        assert_eq!(initial, Some(serde_json::json!("initial")));
        let update = serde_json::to_value(EnvelopeKind::Update).ok();
        assert_eq!(update, Some(serde_json::json!("update")));
    }
}
