//! Handler functions behind the command table.
//!
//! Every handler validates before it mutates. The two-phase commands
//! (`insert`, `update`) treat an absent body as "first leg": argument
//! validation runs in full, but the registry is left untouched and the
//! request processor turns the successful outcome into a data request.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info};

use fleet_protocol::{Request, RequestBody};

use crate::idents::{self, IdentError};
use crate::persistence;

use super::values::{parse_body, parse_distance, parse_engine_power, parse_fuel};
use super::{COMMAND_TARGET, CommandContext, CommandOutcome};

pub(super) fn insert(context: &mut CommandContext, request: &Request) -> CommandOutcome {
    let key = match idents::validate_key(&request.arguments[0]) {
        Ok(key) => key,
        Err(reason) => return CommandOutcome::fail(vec![reason.to_string()]),
    };
    if idents::key_exists(&context.registry, key) {
        return CommandOutcome::fail(vec![IdentError::DuplicateKey.to_string()]);
    }

    let RequestBody::Supplied(fields) = &request.body else {
        // First leg: the key checks passed, now the body has to arrive.
        return CommandOutcome::ok(Vec::new());
    };
    let body = match parse_body(fields) {
        Ok(body) => body,
        Err(errors) => return CommandOutcome::fail(errors),
    };

    let id = idents::generate_id(&context.registry);
    context.registry.put(key, body.into_vehicle(id));
    if context.last_init.is_none() {
        context.last_init = Some(OffsetDateTime::now_utc());
    }
    CommandOutcome::ok(vec!["Element was successfully added".to_owned()])
}

pub(super) fn update(context: &mut CommandContext, request: &Request) -> CommandOutcome {
    let id = match idents::validate_id(&request.arguments[0], &context.registry) {
        Ok(id) => id,
        Err(reason) => return CommandOutcome::fail(vec![reason.to_string()]),
    };
    let key = match idents::key_for_id(&context.registry, id) {
        Ok(key) => key,
        Err(reason) => {
            // Existence was just validated, so this is an internal
            // inconsistency; it fails the request but nothing else.
            error!(target: COMMAND_TARGET, id, "id lookup inconsistency");
            return CommandOutcome::fail(vec![reason.to_string()]);
        }
    };

    let RequestBody::Supplied(fields) = &request.body else {
        return CommandOutcome::ok(Vec::new());
    };
    let body = match parse_body(fields) {
        Ok(body) => body,
        Err(errors) => return CommandOutcome::fail(errors),
    };

    context.registry.put(key, body.into_vehicle(id));
    CommandOutcome::ok(vec!["Element was successfully updated".to_owned()])
}

pub(super) fn remove_key(context: &mut CommandContext, request: &Request) -> CommandOutcome {
    let key = match idents::validate_key(&request.arguments[0]) {
        Ok(key) => key,
        Err(reason) => return CommandOutcome::fail(vec![reason.to_string()]),
    };
    if context.registry.remove(key).is_none() {
        return CommandOutcome::fail(vec![IdentError::KeyNotFound.to_string()]);
    }
    CommandOutcome::ok(vec![format!(
        "Element with key = {key} was successfully removed"
    )])
}

pub(super) fn remove_greater_key(
    context: &mut CommandContext,
    request: &Request,
) -> CommandOutcome {
    let threshold = match idents::validate_key(&request.arguments[0]) {
        Ok(key) => key,
        Err(reason) => return CommandOutcome::fail(vec![reason.to_string()]),
    };
    let removed = context.registry.remove_where(|key, _| key > threshold);
    if removed == 0 {
        CommandOutcome::ok(vec!["No matching keys to remove element".to_owned()])
    } else {
        CommandOutcome::ok(vec![format!("{removed} elements were successfully removed")])
    }
}

pub(super) fn remove_greater(context: &mut CommandContext, request: &Request) -> CommandOutcome {
    remove_by_distance(context, &request.arguments[0], DistanceBound::Greater)
}

pub(super) fn remove_lower(context: &mut CommandContext, request: &Request) -> CommandOutcome {
    remove_by_distance(context, &request.arguments[0], DistanceBound::Lower)
}

#[derive(Clone, Copy)]
enum DistanceBound {
    Greater,
    Lower,
}

impl DistanceBound {
    fn symbol(self) -> char {
        match self {
            Self::Greater => '>',
            Self::Lower => '<',
        }
    }

    fn matches(self, distance: u64, threshold: u64) -> bool {
        match self {
            Self::Greater => distance > threshold,
            Self::Lower => distance < threshold,
        }
    }
}

fn remove_by_distance(
    context: &mut CommandContext,
    argument: &str,
    bound: DistanceBound,
) -> CommandOutcome {
    let threshold = match parse_distance(argument) {
        Ok(distance) => distance,
        Err(message) => return CommandOutcome::fail(vec![message]),
    };
    let removed = context
        .registry
        .remove_where(|_, vehicle| bound.matches(vehicle.distance_travelled, threshold));
    let symbol = bound.symbol();
    if removed == 0 {
        CommandOutcome::ok(vec![format!(
            "No elements found to remove with distance travelled {symbol} {threshold}"
        )])
    } else {
        CommandOutcome::ok(vec![format!(
            "{removed} elements were successfully removed with distance travelled \
             {symbol} {threshold}"
        )])
    }
}

pub(super) fn remove_all_by_engine_power(
    context: &mut CommandContext,
    request: &Request,
) -> CommandOutcome {
    let power = match parse_engine_power(&request.arguments[0]) {
        Ok(power) => power,
        Err(message) => return CommandOutcome::fail(vec![message]),
    };
    let removed = context
        .registry
        .remove_where(|_, vehicle| vehicle.engine_power == power);
    if removed == 0 {
        CommandOutcome::ok(vec![format!(
            "No elements found to remove with engine power = {power}"
        )])
    } else {
        CommandOutcome::ok(vec![format!(
            "{removed} elements were successfully removed with engine power = {power}"
        )])
    }
}

pub(super) fn count_by_fuel_type(
    context: &mut CommandContext,
    request: &Request,
) -> CommandOutcome {
    let fuel = match parse_fuel(&request.arguments[0]) {
        Ok(fuel) => fuel,
        Err(message) => return CommandOutcome::fail(vec![message]),
    };
    let count = context
        .registry
        .iter_sorted()
        .filter(|(_, vehicle)| vehicle.fuel_type == fuel)
        .count();
    CommandOutcome::ok(vec![format!(
        "{count} elements with fuel type = {} ({fuel})",
        fuel.ordinal()
    )])
}

pub(super) fn filter_less_than_fuel_type(
    context: &mut CommandContext,
    request: &Request,
) -> CommandOutcome {
    let fuel = match parse_fuel(&request.arguments[0]) {
        Ok(fuel) => fuel,
        Err(message) => return CommandOutcome::fail(vec![message]),
    };
    let lines: Vec<String> = context
        .registry
        .iter_sorted()
        .filter(|(_, vehicle)| vehicle.fuel_type.ordinal() <= fuel.ordinal())
        .map(|(key, vehicle)| render_record(key, vehicle))
        .collect();
    if lines.is_empty() {
        return CommandOutcome::ok(vec![format!(
            "No elements found with fuel type value less than {} ({fuel})",
            fuel.ordinal()
        )]);
    }
    CommandOutcome::ok(lines)
}

pub(super) fn show(context: &mut CommandContext, _request: &Request) -> CommandOutcome {
    if context.registry.is_empty() {
        return CommandOutcome::ok(vec!["Collection is empty".to_owned()]);
    }
    let lines = context
        .registry
        .iter_sorted()
        .map(|(key, vehicle)| render_record(key, vehicle))
        .collect();
    CommandOutcome::ok(lines)
}

pub(super) fn info(context: &mut CommandContext, _request: &Request) -> CommandOutcome {
    CommandOutcome::ok(vec![
        "Type of collection: key-ordered map of vehicle records".to_owned(),
        format!(
            "Initialization date: {}",
            render_time(context.last_init, "no initializations in this session yet")
        ),
        format!(
            "Last save time: {}",
            render_time(context.last_save, "no saves in this session yet")
        ),
        format!("Number of elements: {}", context.registry.len()),
    ])
}

pub(super) fn clear(context: &mut CommandContext, _request: &Request) -> CommandOutcome {
    if context.registry.is_empty() {
        return CommandOutcome::ok(vec!["Collection is already empty".to_owned()]);
    }
    context.registry.clear();
    CommandOutcome::ok(vec!["Collection successfully cleared".to_owned()])
}

pub(super) fn save(context: &mut CommandContext, _request: &Request) -> CommandOutcome {
    if let Err(reason) = persistence::save_snapshot(&context.snapshot_path, &context.registry) {
        error!(target: COMMAND_TARGET, %reason, "snapshot save failed");
        return CommandOutcome::fail(vec![format!("Failed to save collection: {reason}")]);
    }
    context.last_save = Some(OffsetDateTime::now_utc());
    info!(
        target: COMMAND_TARGET,
        elements = context.registry.len(),
        "collection saved"
    );
    CommandOutcome::ok(vec!["Collection successfully saved".to_owned()])
}

fn render_record(key: u64, vehicle: &crate::registry::Vehicle) -> String {
    format!("key {key}: {vehicle}")
}

fn render_time(timestamp: Option<OffsetDateTime>, fallback: &str) -> String {
    timestamp
        .and_then(|value| value.format(&Rfc3339).ok())
        .unwrap_or_else(|| fallback.to_owned())
}
