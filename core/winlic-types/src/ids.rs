//! Identifier types used throughout the license service.
//!
//! Device identifiers are generated by the client on first launch and are
//! treated as opaque strings. The only rules enforced here are the ones that
//! keep them usable as store keys and URL path segments.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length (in bytes) of a device or activity identifier.
pub const MAX_ID_LEN: usize = 1500;

/// Stable client-generated identifier of one installed device.
///
/// The string is kept exactly as sent. It must not be blank, must not
/// contain `/` and is at most [`MAX_ID_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Parses a device ID from a string.
    pub fn parse(s: &str) -> crate::Result<Self> {
        validate(s).map(|id| Self(id.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Shared validation for client-supplied identifiers.
pub(crate) fn validate(id: &str) -> crate::Result<&str> {
    if id.trim().is_empty() {
        return Err(Error::InvalidId("identifier must not be blank".to_string()));
    }
    if id.len() > MAX_ID_LEN {
        return Err(Error::InvalidId(format!(
            "identifier longer than {MAX_ID_LEN} bytes"
        )));
    }
    if id.contains('/') {
        return Err(Error::InvalidId("identifier contains '/'".to_string()));
    }
    Ok(id)
}
