//! Request envelope sent from the client to the daemon.

use serde::{Deserialize, Serialize};

/// One client command addressed to the daemon.
///
/// `arguments` are the tokens entered on the command line after the command
/// name. `body` carries the record fields for commands that need a full
/// record payload; its three-state encoding distinguishes "no body supplied
/// yet" from "an empty body was supplied" so the two-phase flow never has to
/// guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Command name, e.g. `insert` or `remove_key`.
    pub command: String,
    /// Ordered command-line arguments.
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Record body for two-phase commands.
    #[serde(default)]
    pub body: RequestBody,
    /// Which leg of the interaction this request is.
    #[serde(default)]
    pub phase: InteractionPhase,
}

/// Record payload state for a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "fields", rename_all = "snake_case")]
pub enum RequestBody {
    /// No body has been supplied; the server may ask for one.
    #[default]
    Absent,
    /// Body fields were supplied, possibly empty. An empty supplied body is
    /// dispatched as a final request and fails field validation; it never
    /// re-triggers the second phase.
    Supplied(Vec<String>),
}

impl RequestBody {
    /// True when no body has been supplied.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Interaction leg marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionPhase {
    /// First round trip of a command.
    #[default]
    Initial,
    /// Second round trip, re-sending the original arguments plus the body.
    Continuation,
}

impl Request {
    /// Builds a first-phase request without a body.
    pub fn new(command: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            command: command.into(),
            arguments,
            body: RequestBody::Absent,
            phase: InteractionPhase::Initial,
        }
    }

    /// Builds a request carrying an inline body, completing in one round
    /// trip (scripted input).
    pub fn with_body(
        command: impl Into<String>,
        arguments: Vec<String>,
        fields: Vec<String>,
    ) -> Self {
        Self {
            command: command.into(),
            arguments,
            body: RequestBody::Supplied(fields),
            phase: InteractionPhase::Initial,
        }
    }

    /// Derives the second-leg request for a `NeedsMoreData` response: the
    /// same command and arguments, plus the gathered body fields.
    #[must_use]
    pub fn into_continuation(mut self, fields: Vec<String>) -> Self {
        self.body = RequestBody::Supplied(fields);
        self.phase = InteractionPhase::Continuation;
        self
    }
}
