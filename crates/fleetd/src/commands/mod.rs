//! Command dispatch over the vehicle registry.
//!
//! Commands are routed through a static table built once at startup: name to
//! declared arity, body requirement, and handler function. Dispatch rejects
//! unknown names and arity mismatches before a handler runs, and handlers
//! perform all of their own validation before the first mutation, so a
//! failing command always leaves the registry untouched.

mod handlers;
mod values;

use std::collections::HashMap;
use std::path::PathBuf;

use time::OffsetDateTime;

use fleet_protocol::Request;

use crate::registry::VehicleRegistry;

/// Tracing target for command execution.
pub(crate) const COMMAND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::commands");

/// Mutable state a command handler operates on.
#[derive(Debug)]
pub struct CommandContext {
    pub registry: VehicleRegistry,
    pub snapshot_path: PathBuf,
    pub last_init: Option<OffsetDateTime>,
    pub last_save: Option<OffsetDateTime>,
}

impl CommandContext {
    /// Wraps a freshly loaded registry. The initialisation timestamp is set
    /// only when the snapshot actually held records.
    #[must_use]
    pub fn new(registry: VehicleRegistry, snapshot_path: PathBuf) -> Self {
        let last_init = (!registry.is_empty()).then(OffsetDateTime::now_utc);
        Self {
            registry,
            snapshot_path,
            last_init,
            last_save: None,
        }
    }
}

/// Structured result of one command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub output: Vec<String>,
    pub errors: Vec<String>,
}

impl CommandOutcome {
    /// Successful outcome with the given narrative lines.
    #[must_use]
    pub fn ok(output: Vec<String>) -> Self {
        Self {
            success: true,
            output,
            errors: Vec::new(),
        }
    }

    /// Failed outcome with the given rejection lines.
    #[must_use]
    pub fn fail(errors: Vec<String>) -> Self {
        Self {
            success: false,
            output: Vec::new(),
            errors,
        }
    }
}

type Handler = fn(&mut CommandContext, &Request) -> CommandOutcome;

/// One dispatchable command.
struct CommandSpec {
    arity: usize,
    needs_body: bool,
    handler: Handler,
}

/// Static name-to-handler table.
pub struct CommandTable {
    specs: HashMap<&'static str, CommandSpec>,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTable {
    /// Builds the full command set.
    #[must_use]
    pub fn new() -> Self {
        let mut specs = HashMap::new();
        let mut add = |name: &'static str, arity: usize, needs_body: bool, handler: Handler| {
            specs.insert(
                name,
                CommandSpec {
                    arity,
                    needs_body,
                    handler,
                },
            );
        };

        add("insert", 1, true, handlers::insert);
        add("update", 1, true, handlers::update);
        add("remove_key", 1, false, handlers::remove_key);
        add("remove_greater_key", 1, false, handlers::remove_greater_key);
        add("remove_greater", 1, false, handlers::remove_greater);
        add("remove_lower", 1, false, handlers::remove_lower);
        add(
            "remove_all_by_engine_power",
            1,
            false,
            handlers::remove_all_by_engine_power,
        );
        add("count_by_fuel_type", 1, false, handlers::count_by_fuel_type);
        add(
            "filter_less_than_fuel_type",
            1,
            false,
            handlers::filter_less_than_fuel_type,
        );
        add("show", 0, false, handlers::show);
        add("info", 0, false, handlers::info);
        add("clear", 0, false, handlers::clear);
        add("save", 0, false, handlers::save);

        Self { specs }
    }

    /// True when the named command needs a record body to complete.
    #[must_use]
    pub fn needs_body(&self, name: &str) -> bool {
        self.specs.get(name).is_some_and(|spec| spec.needs_body)
    }

    /// Routes one request: unknown name, then arity, then the handler.
    pub fn dispatch(&self, context: &mut CommandContext, request: &Request) -> CommandOutcome {
        let Some(spec) = self.specs.get(request.command.as_str()) else {
            return CommandOutcome::fail(vec![format!(
                "Unknown command '{}'",
                request.command
            )]);
        };
        if request.arguments.len() != spec.arity {
            return CommandOutcome::fail(vec![format!(
                "Wrong amount of arguments: {}, expected {}",
                request.arguments.len(),
                spec.arity
            )]);
        }
        (spec.handler)(context, request)
    }
}
