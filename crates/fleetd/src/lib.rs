//! Fleet daemon: a keyed registry of vehicle records served over TCP.
//!
//! The daemon holds the registry in memory and mutates it exclusively from a
//! single-threaded, non-blocking connection reactor. Clients speak the
//! length-prefixed frame protocol from [`fleet_protocol`]; each decoded
//! request funnels through the command dispatcher, so every store mutation
//! passes one logical sequence point. An operator console thread can inject
//! a `save` command, but it is routed through the same dispatch path and
//! never touches the registry directly.

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod idents;
pub mod persistence;
pub mod reactor;
pub mod registry;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use commands::{CommandContext, CommandOutcome, CommandTable};
pub use config::ServerConfig;
pub use dispatch::RequestProcessor;
pub use reactor::{Reactor, ReactorError, ReactorHandle};
pub use registry::{FuelType, Vehicle, VehicleRegistry};
