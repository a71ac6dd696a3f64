//! Wire envelope written to streaming subscribers.
//!
//! One JSON object per message:
//!
//! ```text
//! { "type": "initial" | "update",
//!   "data": { "plants": [...], "kpis": {...}, "tick": 12 } }    // fleet scope
//! { "type": "initial" | "update",
//!   "data": { "entity": {...}, "tick": 12 } }                   // plant scope
//! ```
//!
//! `entity` is omitted when the plant is not in the catalog. Envelopes
//! borrow the snapshot they describe; one snapshot is encoded once and the
//! resulting [`Frame`] is shared by every subscriber of that scope.

use serde::Serialize;
use sunfleet_types::{EnvelopeKind, FleetKpis, FleetView, PlantDetail, PlantView};

use crate::registry::Frame;

/// A typed stream message.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<'a> {
    /// `initial` for the first message of a stream, `update` afterwards.
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    /// Scope-dependent payload.
    pub data: StreamData<'a>,
}

/// Payload of an [`Envelope`].
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StreamData<'a> {
    /// Fleet-wide payload.
    Fleet {
        /// Every plant.
        plants: &'a [PlantView],
        /// Company KPIs.
        kpis: &'a FleetKpis,
        /// Tick the snapshot was computed for.
        tick: u64,
    },
    /// Single-plant payload.
    Plant {
        /// The plant detail, absent for unknown plants.
        #[serde(skip_serializing_if = "Option::is_none")]
        entity: Option<&'a PlantDetail>,
        /// Tick the snapshot was computed for.
        tick: u64,
    },
}

impl<'a> Envelope<'a> {
    /// Envelope for a fleet-scoped stream.
    pub fn fleet(kind: EnvelopeKind, tick: u64, view: &'a FleetView) -> Self {
        Self {
            kind,
            data: StreamData::Fleet {
                plants: view.plants.as_slice(),
                kpis: &view.kpis,
                tick,
            },
        }
    }

    /// Envelope for a plant-scoped stream.
    pub const fn plant(kind: EnvelopeKind, tick: u64, entity: Option<&'a PlantDetail>) -> Self {
        Self {
            kind,
            data: StreamData::Plant { entity, tick },
        }
    }

    /// The tick carried by this envelope.
    pub const fn tick(&self) -> u64 {
        match self.data {
            StreamData::Fleet { tick, .. } | StreamData::Plant { tick, .. } => tick,
        }
    }

    /// Serialize to a shareable JSON frame.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`].
    pub fn encode(&self) -> Result<Frame, serde_json::Error> {
        serde_json::to_string(self).map(Frame::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use sunfleet_types::PlantId;

    use super::*;
    use crate::catalog::PlantCatalog;
    use crate::simulator::{FleetSimulator, SnapshotSource};

    fn simulator() -> FleetSimulator {
        FleetSimulator::new(PlantCatalog::builtin(), 48)
            .with_today(NaiveDate::from_ymd_opt(2025, 10, 15).unwrap())
    }

    #[test]
    fn fleet_envelope_shape() {
        let view = simulator().fleet_snapshot(4);
        let frame = Envelope::fleet(EnvelopeKind::Update, 4, &view).encode().unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(json["type"], "update");
        assert_eq!(json["data"]["tick"], 4);
        assert_eq!(json["data"]["plants"].as_array().unwrap().len(), 10);
        assert!(json["data"]["kpis"]["avgSystemEfficiency"].is_number());
        assert!(json["data"].get("entity").is_none());
    }

    #[test]
    fn plant_envelope_shape() {
        let detail = simulator().entity_snapshot(2, PlantId(7)).unwrap();
        let envelope = Envelope::plant(EnvelopeKind::Initial, 2, Some(&detail));
        assert_eq!(envelope.tick(), 2);
        let json: serde_json::Value = serde_json::from_str(&envelope.encode().unwrap()).unwrap();

        assert_eq!(json["type"], "initial");
        assert_eq!(json["data"]["tick"], 2);
        assert_eq!(json["data"]["entity"]["plant"]["id"], 7);
        assert!(json["data"]["entity"]["powerChart"].is_array());
    }

    #[test]
    fn unknown_plant_omits_entity() {
        let frame = Envelope::plant(EnvelopeKind::Initial, 0, None).encode().unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "initial", "data": { "tick": 0 } }));
    }
}
