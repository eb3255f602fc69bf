use alloc::string::String;

use serde::{Deserialize, Serialize};

/// Registration record announced by a device when its session is established.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    /// Device identity
    pub id: String,
    /// Human readable device name
    pub name: String,
    /// Device type label
    #[serde(rename = "type")]
    pub device_type: String,
}
