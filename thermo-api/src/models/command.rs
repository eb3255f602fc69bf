use alloc::string::String;

use serde::{Deserialize, Serialize};

/// Status reported for a command that was carried out.
pub const STATUS_OK: &str = "Ok";

/// Status reported for a command name the device does not recognise.
pub const STATUS_UNKNOWN_COMMAND: &str = "Unknown command";

/// Command inserted for a device by the management service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Command identifier assigned by the service
    pub id: i64,
    /// Command name, e.g. `led/on`
    pub command: String,
    /// Free-form command arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
    /// Outcome set by the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Acknowledgement the device sends back for a handled command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandUpdate {
    pub id: i64,
    pub command: String,
    pub status: String,
}
