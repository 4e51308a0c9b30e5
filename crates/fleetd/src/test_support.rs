//! Shared fixtures for the daemon test modules.

use crate::registry::{FuelType, Vehicle};

/// A valid record with a caller-supplied id and distance.
pub(crate) fn sample_vehicle(id: u64, distance: u64) -> Vehicle {
    Vehicle {
        id,
        name: "hauler".to_owned(),
        x: 3,
        y: -7,
        engine_power: 120,
        distance_travelled: distance,
        fuel_type: FuelType::Diesel,
    }
}

/// Body fields in the order `insert`/`update` expect them.
pub(crate) fn sample_body() -> Vec<String> {
    vec![
        "hauler".to_owned(),
        "3".to_owned(),
        "-7".to_owned(),
        "120".to_owned(),
        "400".to_owned(),
        "diesel".to_owned(),
    ]
}
