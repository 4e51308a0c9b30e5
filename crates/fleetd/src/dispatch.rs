//! Turns decoded requests into wire responses.
//!
//! The processor wraps the command table and applies the two-phase rule: a
//! body-requiring command whose argument checks passed but whose body is
//! absent answers with a data request instead of a final response. Nothing
//! is mutated on that first leg; the handler bails out before touching the
//! registry once it sees the body is missing.

use tracing::debug;

use fleet_protocol::{Request, Response};

use crate::commands::{CommandContext, CommandOutcome, CommandTable};

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Stateless request-to-response mapping over a command table.
pub struct RequestProcessor {
    table: CommandTable,
}

impl Default for RequestProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: CommandTable::new(),
        }
    }

    /// Dispatches one request and shapes the outcome into a response.
    pub fn process(&self, context: &mut CommandContext, request: &Request) -> Response {
        let outcome = self.table.dispatch(context, request);
        debug!(
            target: DISPATCH_TARGET,
            command = %request.command,
            success = outcome.success,
            "request dispatched"
        );
        self.shape(request, outcome)
    }

    fn shape(&self, request: &Request, outcome: CommandOutcome) -> Response {
        if !outcome.success {
            return Response::failure(outcome.errors);
        }
        if self.table.needs_body(&request.command) && request.body.is_absent() {
            return Response::needs_more_data(outcome.output);
        }
        Response::success(outcome.output)
    }
}
