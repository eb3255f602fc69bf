use std::fmt;

use sha2::{Digest, Sha256};

const HASH_LEN: usize = 8;

/// Stable device identifier: the configured base id plus a short digest of the refresh token.
///
/// The token itself never appears in the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    pub fn new(base_id: &str, token: &str) -> Self {
        let digest = format!("{:x}", Sha256::digest(token.as_bytes()));

        Self(format!("{base_id}-{}", &digest[..HASH_LEN]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
