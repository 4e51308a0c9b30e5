//! Response envelope sent from the daemon to the client.

use serde::{Deserialize, Serialize};

/// Result of one dispatched request.
///
/// Every response carries both line lists so the client can render either a
/// successful narrative or a rejection reason; the protocol never silently
/// drops a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Human-readable output lines.
    pub output: Vec<String>,
    /// Human-readable error lines.
    pub errors: Vec<String>,
    /// Whether the command succeeded.
    pub success: bool,
    /// Whether the interaction is complete.
    pub kind: ResponseKind,
}

/// Completion state of an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// The interaction is complete.
    Final,
    /// The server needs the record body before it can complete the command;
    /// the client must re-send the request with a supplied body.
    NeedsMoreData,
}

impl Response {
    /// Builds a successful final response.
    #[must_use]
    pub fn success(output: Vec<String>) -> Self {
        Self {
            output,
            errors: Vec::new(),
            success: true,
            kind: ResponseKind::Final,
        }
    }

    /// Builds a failed final response.
    #[must_use]
    pub fn failure(errors: Vec<String>) -> Self {
        Self {
            output: Vec::new(),
            errors,
            success: false,
            kind: ResponseKind::Final,
        }
    }

    /// Builds the first-leg answer of a two-phase command.
    #[must_use]
    pub fn needs_more_data(output: Vec<String>) -> Self {
        Self {
            output,
            errors: Vec::new(),
            success: true,
            kind: ResponseKind::NeedsMoreData,
        }
    }

    /// True when no further round trip is expected.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.kind == ResponseKind::Final
    }
}
