//! In-memory record store: vehicles indexed by a caller-chosen key.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Fuel kinds, ordered by their ordinal for ranged comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Kerosene,
    Electricity,
    Diesel,
    Antimatter,
    Nuclear,
}

impl FuelType {
    /// All fuel kinds in ordinal order.
    pub const ALL: [Self; 5] = [
        Self::Kerosene,
        Self::Electricity,
        Self::Diesel,
        Self::Antimatter,
        Self::Nuclear,
    ];

    /// One-based ordinal used for ordered comparisons and terse input.
    #[must_use]
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Kerosene => 1,
            Self::Electricity => 2,
            Self::Diesel => 3,
            Self::Antimatter => 4,
            Self::Nuclear => 5,
        }
    }

    /// Parses a fuel type from its name (case-insensitive) or its ordinal.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if let Ok(ordinal) = trimmed.parse::<u8>() {
            return Self::ALL.iter().copied().find(|fuel| fuel.ordinal() == ordinal);
        }
        let lowered = trimmed.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|fuel| fuel.name() == lowered)
    }

    /// Canonical lower-case name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Kerosene => "kerosene",
            Self::Electricity => "electricity",
            Self::Diesel => "diesel",
            Self::Antimatter => "antimatter",
            Self::Nuclear => "nuclear",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// One vehicle record.
///
/// The `id` is server-generated at insert time and never changes; the store
/// key is held outside the record and never changes either. Update replaces
/// every other field in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub name: String,
    pub x: i64,
    pub y: i64,
    pub engine_power: u32,
    pub distance_travelled: u64,
    pub fuel_type: FuelType,
}

impl fmt::Display for Vehicle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "\"{}\" (id {}): coordinates ({}, {}), engine power {}, \
             distance travelled {}, fuel type {}",
            self.name,
            self.id,
            self.x,
            self.y,
            self.engine_power,
            self.distance_travelled,
            self.fuel_type
        )
    }
}

/// Mapping from key to vehicle, iterated in ascending key order.
///
/// Keys and ids are independent identifier spaces: both are unique across
/// the store, and a numeric coincidence between a key and an id carries no
/// meaning.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleRegistry {
    vehicles: BTreeMap<u64, Vehicle>,
}

impl VehicleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: u64) -> Option<&Vehicle> {
        self.vehicles.get(&key)
    }

    pub fn put(&mut self, key: u64, vehicle: Vehicle) {
        self.vehicles.insert(key, vehicle);
    }

    pub fn remove(&mut self, key: u64) -> Option<Vehicle> {
        self.vehicles.remove(&key)
    }

    pub fn clear(&mut self) {
        self.vehicles.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    #[must_use]
    pub fn contains_key(&self, key: u64) -> bool {
        self.vehicles.contains_key(&key)
    }

    /// Records in ascending key order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (u64, &Vehicle)> {
        self.vehicles.iter().map(|(key, vehicle)| (*key, vehicle))
    }

    /// Key of the record carrying the given id, if any.
    #[must_use]
    pub fn key_for_id(&self, id: u64) -> Option<u64> {
        self.vehicles
            .iter()
            .find(|(_, vehicle)| vehicle.id == id)
            .map(|(key, _)| *key)
    }

    /// True when some record carries the given id.
    #[must_use]
    pub fn id_exists(&self, id: u64) -> bool {
        self.vehicles.values().any(|vehicle| vehicle.id == id)
    }

    /// Removes every record matching the predicate and returns the count.
    ///
    /// Matching keys are snapshotted before any removal so mutation cannot
    /// skip or duplicate elements mid-iteration.
    pub fn remove_where<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(u64, &Vehicle) -> bool,
    {
        let matching: Vec<u64> = self
            .vehicles
            .iter()
            .filter(|(key, vehicle)| predicate(**key, vehicle))
            .map(|(key, _)| *key)
            .collect();
        for key in &matching {
            self.vehicles.remove(key);
        }
        matching.len()
    }
}
