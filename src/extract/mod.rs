//! Turning a free-form AI reply into parsed JSON.
//!
//! raw reply → [`locate_json`] → [`normalize_fractions`] → [`parse_candidate`]

mod fractions;
mod locator;
mod validator;

pub use fractions::normalize_fractions;
pub use locator::locate_json;
pub use validator::parse_candidate;

use crate::error::ImportError;
use crate::events::{DiagnosticSink, LogSink};
use serde_json::Value;

/// Extract the JSON document embedded in an AI reply, logging through `log`.
pub fn extract_json(reply: &str) -> Result<Value, ImportError> {
    extract_json_with(reply, &LogSink)
}

/// Extract the JSON document embedded in an AI reply.
pub fn extract_json_with(reply: &str, sink: &dyn DiagnosticSink) -> Result<Value, ImportError> {
    let candidate = locate_json(reply)?;
    let normalized = normalize_fractions(candidate);
    parse_candidate(&normalized, sink)
}
