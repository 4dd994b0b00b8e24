use crate::error::ImportError;
use crate::events::{DiagnosticSink, ImportEvent};
use serde_json::Value;

/// Parse a normalized candidate as JSON.
///
/// On failure the parser message and the offending text are reported to
/// `sink`; the returned error keeps the parser error as its source.
pub fn parse_candidate(candidate: &str, sink: &dyn DiagnosticSink) -> Result<Value, ImportError> {
    serde_json::from_str(candidate).map_err(|err| {
        sink.emit(ImportEvent::JsonDecodeFailed {
            message: err.to_string(),
            candidate: candidate.to_string(),
        });
        ImportError::JsonDecode(err)
    })
}
