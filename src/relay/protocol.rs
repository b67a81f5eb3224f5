//! Wire Protocol
//!
//! Endpoints, headers and JSON bodies exchanged between the hops.
//!
//! Gateway hops (gatekeeper, trusted host, proxy manager) accept
//! [`ProcessRequest`] on `/process`; database nodes accept [`QueryRequest`] on
//! `/read` and `/write`. Every hop answers `/health` with [`HealthResponse`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// --- API Endpoints ---

pub const ENDPOINT_HEALTH: &str = "/health";
/// Gateway hop entry point.
pub const ENDPOINT_PROCESS: &str = "/process";
/// Database node read entry point.
pub const ENDPOINT_READ: &str = "/read";
/// Database node write entry point. On the primary this fans out to every replica.
pub const ENDPOINT_WRITE: &str = "/write";

// --- Headers ---

pub const HEADER_USERNAME: &str = "username";
pub const HEADER_PASSWORD: &str = "password";
/// Correlates the log lines of one client request across hops.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

// --- Outcome messages ---

pub const MSG_EXECUTED: &str = "Query executed successfully";
pub const MSG_FAILED: &str = "Query failed";
pub const MSG_EXECUTION_FAILED: &str = "Query execution failed";
pub const MSG_FORWARDING_FAILED: &str = "Query forwarding failed";
pub const MSG_NO_MESSAGE: &str = "No message provided";

/// Routing policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Primary node, write endpoint.
    Direct,
    /// Uniformly random replica, read endpoint.
    Random,
    /// Lowest-latency replica, read endpoint.
    Customized,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Direct, Mode::Random, Mode::Customized];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Direct => "DIRECT",
            Mode::Random => "RANDOM",
            Mode::Customized => "CUSTOMIZED",
        }
    }

    /// `"DIRECT, RANDOM, CUSTOMIZED"`, for error messages.
    pub fn allowed() -> String {
        Mode::ALL
            .iter()
            .map(Mode::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid mode '{}'. Allowed modes are: {}",
            self.0,
            Mode::allowed()
        )
    }
}

impl std::error::Error for UnknownMode {}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DIRECT" => Ok(Mode::Direct),
            "RANDOM" => Ok(Mode::Random),
            "CUSTOMIZED" => Ok(Mode::Customized),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

// --- Data Transfer Objects ---

/// Body of `/process` on every gateway hop.
///
/// Both fields are optional on the wire so that each hop can report a missing
/// field itself instead of failing inside the JSON extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl ProcessRequest {
    pub fn new(query: impl Into<String>, mode: Mode) -> Self {
        Self {
            query: Some(query.into()),
            mode: Some(mode.to_string()),
        }
    }
}

/// Body of `/read` and `/write` on database nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
        }
    }
}

pub type Row = Map<String, Value>;

/// Body of a `/read` reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReadResponse {
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one write on one node, or the uniform failure envelope a hop
/// returns when it could not get a result from downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutcome {
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, alias = "affected_rows")]
    pub affected_rows: u64,
}

fn default_message() -> String {
    MSG_NO_MESSAGE.to_string()
}

impl QueryOutcome {
    pub fn executed(affected_rows: u64) -> Self {
        Self {
            message: MSG_EXECUTED.to_string(),
            error: None,
            affected_rows,
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        Self::failure(MSG_FAILED, Value::String(error.to_string()))
    }

    /// Downstream answered with a non-success status.
    pub fn execution_failed(error: impl Into<Value>) -> Self {
        Self::failure(MSG_EXECUTION_FAILED, error.into())
    }

    /// Downstream could not be reached, or its reply could not be decoded.
    pub fn forwarding_failed(error: impl Into<Value>) -> Self {
        Self::failure(MSG_FORWARDING_FAILED, error.into())
    }

    fn failure(message: &str, error: Value) -> Self {
        Self {
            message: message.to_string(),
            error: Some(error),
            affected_rows: 0,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            error: None,
        }
    }

    pub fn unhealthy(error: impl fmt::Display) -> Self {
        Self {
            status: "unhealthy".to_string(),
            error: Some(error.to_string()),
        }
    }
}

/// Body of every request-level error reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}
