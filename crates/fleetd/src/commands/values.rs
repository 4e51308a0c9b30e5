//! Field-level validation for record bodies and predicate arguments.

use crate::registry::{FuelType, Vehicle};

/// Number of changeable fields in a record body, in order: name, coordinate
/// x, coordinate y, engine power, distance travelled, fuel type.
pub(crate) const BODY_FIELD_COUNT: usize = 6;

/// Validated record body, not yet carrying an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VehicleBody {
    pub name: String,
    pub x: i64,
    pub y: i64,
    pub engine_power: u32,
    pub distance_travelled: u64,
    pub fuel_type: FuelType,
}

impl VehicleBody {
    /// Combines the body with a server-generated or preserved id.
    pub(crate) fn into_vehicle(self, id: u64) -> Vehicle {
        Vehicle {
            id,
            name: self.name,
            x: self.x,
            y: self.y,
            engine_power: self.engine_power,
            distance_travelled: self.distance_travelled,
            fuel_type: self.fuel_type,
        }
    }
}

/// Validates the supplied body fields, collecting every failure.
///
/// # Errors
///
/// Returns one message per failed field, or a single count-mismatch message
/// when the field count is wrong.
pub(crate) fn parse_body(fields: &[String]) -> Result<VehicleBody, Vec<String>> {
    if fields.len() != BODY_FIELD_COUNT {
        return Err(vec![format!(
            "Wrong number of body fields: {}, expected {BODY_FIELD_COUNT}",
            fields.len()
        )]);
    }

    let mut errors = Vec::new();

    let name = fields[0].trim();
    if name.is_empty() {
        errors.push("Name cannot be empty".to_owned());
    }
    let x = match fields[1].trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push("Coordinate x must be an integer".to_owned());
            None
        }
    };
    let y = match fields[2].trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push("Coordinate y must be an integer".to_owned());
            None
        }
    };
    let engine_power = match parse_engine_power(&fields[3]) {
        Ok(power) => Some(power),
        Err(message) => {
            errors.push(message);
            None
        }
    };
    let distance_travelled = match parse_distance(&fields[4]) {
        Ok(distance) => Some(distance),
        Err(message) => {
            errors.push(message);
            None
        }
    };
    let fuel_type = match parse_fuel(&fields[5]) {
        Ok(fuel) => Some(fuel),
        Err(message) => {
            errors.push(message);
            None
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    // Every option holds a value once no error was recorded.
    match (x, y, engine_power, distance_travelled, fuel_type) {
        (Some(x), Some(y), Some(engine_power), Some(distance_travelled), Some(fuel_type)) => {
            Ok(VehicleBody {
                name: name.to_owned(),
                x,
                y,
                engine_power,
                distance_travelled,
                fuel_type,
            })
        }
        _ => Err(vec!["internal error: body validation out of sync".to_owned()]),
    }
}

/// Engine power is a strictly positive integer.
pub(crate) fn parse_engine_power(text: &str) -> Result<u32, String> {
    match text.trim().parse::<u32>() {
        Ok(power) if power > 0 => Ok(power),
        _ => Err("Engine power must be a positive number".to_owned()),
    }
}

/// Distance travelled is a non-negative integer.
pub(crate) fn parse_distance(text: &str) -> Result<u64, String> {
    text.trim()
        .parse::<u64>()
        .map_err(|_| "Distance travelled must be a non-negative number".to_owned())
}

/// Fuel type by name or one-based ordinal.
pub(crate) fn parse_fuel(text: &str) -> Result<FuelType, String> {
    FuelType::parse(text).ok_or_else(|| {
        format!(
            "Unknown fuel type '{}', expected one of kerosene, electricity, diesel, \
             antimatter, nuclear (or ordinal 1-5)",
            text.trim()
        )
    })
}
