//! The fleet catalog: which plants exist and their static parameters.
//!
//! The built-in catalog mirrors the demo fleet (ten US sites). A config
//! file can replace the plant list; the cleaning history is always the
//! built-in one.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use sunfleet_types::{CleaningEvent, Plant, PlantId};

/// Errors raised when a catalog fails validation.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The plant list is empty.
    #[error("catalog must contain at least one plant")]
    Empty,

    /// Two plants share the same id.
    #[error("duplicate plant id {id} in catalog")]
    DuplicatePlant {
        /// The repeated id.
        id: PlantId,
    },
}

/// Validated, immutable plant catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantCatalog {
    plants: Vec<Plant>,
    cleaning_history: Vec<CleaningEvent>,
}

impl PlantCatalog {
    /// Build a catalog from a plant list.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Empty`] for an empty list and
    /// [`CatalogError::DuplicatePlant`] when ids repeat.
    pub fn new(plants: Vec<Plant>) -> Result<Self, CatalogError> {
        if plants.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = BTreeSet::new();
        for plant in &plants {
            if !seen.insert(plant.id) {
                return Err(CatalogError::DuplicatePlant { id: plant.id });
            }
        }
        Ok(Self {
            plants,
            cleaning_history: builtin_cleaning_history(),
        })
    }

    /// The demo fleet.
    pub fn builtin() -> Self {
        Self {
            plants: builtin_plants(),
            cleaning_history: builtin_cleaning_history(),
        }
    }

    /// All plants in catalog order.
    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    /// Look up a plant by id.
    pub fn get(&self, id: PlantId) -> Option<&Plant> {
        self.plants.iter().find(|p| p.id == id)
    }

    /// Number of plants.
    pub fn len(&self) -> usize {
        self.plants.len()
    }

    /// Whether the catalog has no plants (never true for a validated catalog).
    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    /// Historical cleaning events, most recent first.
    pub fn cleaning_history(&self) -> &[CleaningEvent] {
        &self.cleaning_history
    }

    /// Earliest upcoming cleaning across the fleet.
    pub fn earliest_next_cleaning(&self) -> Option<NaiveDate> {
        self.plants.iter().map(|p| p.next_cleaning).min()
    }

    /// Most recent cleaning across the fleet.
    pub fn latest_cleaning(&self) -> Option<NaiveDate> {
        self.plants.iter().map(|p| p.last_cleaned).max()
    }
}

impl Default for PlantCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn plant(
    id: u32,
    name: &str,
    location: &str,
    capacity_mwp: f64,
    base_production: f64,
    base_revenue: f64,
    next_cleaning: NaiveDate,
    last_cleaned: NaiveDate,
) -> Plant {
    Plant {
        id: PlantId(id),
        name: name.to_owned(),
        location: location.to_owned(),
        capacity_mwp,
        base_production,
        base_revenue,
        next_cleaning,
        last_cleaned,
    }
}

fn builtin_plants() -> Vec<Plant> {
    vec![
        plant(
            1,
            "Sunfield Alpha",
            "Arizona, USA",
            75.2,
            45.0,
            120.0,
            ymd(2025, 10, 21),
            ymd(2025, 10, 13),
        ),
        plant(
            2,
            "Desert Sun Beta",
            "Nevada, USA",
            62.8,
            38.0,
            95.0,
            ymd(2025, 10, 23),
            ymd(2025, 10, 10),
        ),
        plant(
            3,
            "Solar Peak Gamma",
            "California, USA",
            89.4,
            52.0,
            145.0,
            ymd(2025, 10, 19),
            ymd(2025, 10, 8),
        ),
        plant(
            4,
            "Helios Delta",
            "Texas, USA",
            54.1,
            32.0,
            88.0,
            ymd(2025, 10, 25),
            ymd(2025, 10, 15),
        ),
        plant(
            5,
            "Radiant Epsilon",
            "New Mexico, USA",
            71.6,
            42.0,
            112.0,
            ymd(2025, 10, 22),
            ymd(2025, 10, 12),
        ),
        plant(
            6,
            "Solstice Zeta",
            "Utah, USA",
            48.3,
            28.0,
            75.0,
            ymd(2025, 10, 28),
            ymd(2025, 10, 18),
        ),
        plant(
            7,
            "Aurora Eta",
            "Colorado, USA",
            66.9,
            39.0,
            105.0,
            ymd(2025, 10, 20),
            ymd(2025, 10, 9),
        ),
        plant(
            8,
            "Phoenix Theta",
            "Florida, USA",
            82.5,
            48.0,
            130.0,
            ymd(2025, 10, 24),
            ymd(2025, 10, 14),
        ),
        plant(
            9,
            "Lumina Iota",
            "Georgia, USA",
            57.2,
            34.0,
            92.0,
            ymd(2025, 10, 26),
            ymd(2025, 10, 16),
        ),
        plant(
            10,
            "Zenith Kappa",
            "North Carolina, USA",
            73.8,
            44.0,
            118.0,
            ymd(2025, 10, 27),
            ymd(2025, 10, 17),
        ),
    ]
}

fn builtin_cleaning_history() -> Vec<CleaningEvent> {
    let event = |date: NaiveDate, money_saved: f64, soiling_on_date: f64, effectiveness: f64| {
        CleaningEvent {
            date,
            money_saved,
            soiling_on_date,
            cleaning_effectiveness: effectiveness,
            is_positive: money_saved >= 0.0,
        }
    };
    vec![
        event(ymd(2025, 10, 15), 1_512.8, 22.6, 99.0),
        event(ymd(2025, 10, 8), 1_245.3, 18.4, 97.0),
        event(ymd(2025, 10, 1), -234.5, 8.2, 95.0),
        event(ymd(2025, 9, 24), 987.6, 15.8, 98.0),
        event(ymd(2025, 9, 17), 1_876.2, 24.1, 99.0),
        event(ymd(2025, 9, 10), -156.8, 6.5, 94.0),
        event(ymd(2025, 9, 3), 2_134.7, 28.3, 99.0),
    ]
}
