//! Archive record header.
//!
//! Records are forwarded verbatim; only the header is ever decoded, and
//! only to label progress output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The envelope header carried by every archive record.
///
/// Missing fields decode as empty, so a record without a header still
/// parses. Only `gatewayTimestamp` is type checked; the other fields are
/// kept as raw JSON for debug output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordHeader {
    /// Time the record reached the relay gateway.
    #[serde(default)]
    pub gateway_timestamp: String,
    /// Anonymised uploader identifier.
    #[serde(default, rename = "uploaderID", skip_serializing_if = "Option::is_none")]
    pub uploader_id: Option<Value>,
    /// Name of the uploading software.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_name: Option<Value>,
    /// Version of the uploading software.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_version: Option<Value>,
}

/// A single archive record, reduced to its header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// The record header.
    #[serde(default)]
    pub header: RecordHeader,
}

impl Record {
    /// Decodes the header of one JSON line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not a JSON object or a header field
    /// has the wrong type.
    pub fn from_line(line: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(line)
    }

    /// Returns the gateway timestamp, empty if the record had none.
    #[must_use]
    pub fn gateway_timestamp(&self) -> &str {
        &self.header.gateway_timestamp
    }
}
