//! Activity events submitted by devices.
//!
//! Clients batch their local activity log (screen visits, actions) and push it
//! to the server. Each entry carries a client-generated id, so resubmitting a
//! batch overwrites instead of duplicating. Fields the server does not model
//! are kept verbatim in [`ActivityEvent::extra`].

use crate::ids::validate;
use crate::{DeviceId, Error, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Unique identifier for an activity event, chosen by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActivityId(String);

impl ActivityId {
    /// Parses an activity ID from a string.
    pub fn parse(s: &str) -> crate::Result<Self> {
        validate(s).map(|id| Self(id.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ActivityId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ActivityId> for String {
    fn from(id: ActivityId) -> Self {
        id.0
    }
}

/// One entry of a device's activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    /// Client-generated event id (upsert key).
    pub id: ActivityId,
    /// The device that produced the event.
    pub device_id: DeviceId,
    /// What the user did, e.g. `"customer_created"`.
    #[serde(default)]
    pub action_name: String,
    /// Screen the action happened on.
    #[serde(default)]
    pub page: String,
    /// Optional free-form context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// When the event happened on the device.
    pub timestamp: Timestamp,
    /// Any other fields the client sent, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const KNOWN_FIELDS: [&str; 6] = ["id", "deviceId", "actionName", "page", "context", "timestamp"];

impl ActivityEvent {
    /// Creates an event with no extra fields.
    #[must_use]
    pub fn new(
        id: ActivityId,
        device_id: DeviceId,
        action_name: impl Into<String>,
        page: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            device_id,
            action_name: action_name.into(),
            page: page.into(),
            context: None,
            timestamp,
            extra: Map::new(),
        }
    }

    /// Builds an event from one raw entry of a client-submitted batch.
    ///
    /// Returns `None` for entries that cannot be stored: anything that is not
    /// a JSON object, or an object without a usable `id`. The event is always
    /// attributed to `device_id`, whatever the entry itself claims. A missing
    /// or unreadable timestamp falls back to `received_at`; timestamps may be
    /// RFC 3339 strings or epoch milliseconds.
    #[must_use]
    pub fn from_submission(
        device_id: &DeviceId,
        raw: Value,
        received_at: Timestamp,
    ) -> Option<Self> {
        let Value::Object(mut fields) = raw else {
            return None;
        };

        let id = match fields.get("id") {
            Some(Value::String(s)) => ActivityId::parse(s).ok()?,
            Some(Value::Number(n)) => ActivityId::parse(&n.to_string()).ok()?,
            _ => return None,
        };

        let timestamp = match fields.get("timestamp") {
            Some(Value::String(s)) => Timestamp::parse(s).ok(),
            Some(Value::Number(n)) => n.as_i64().and_then(|ms| Timestamp::from_millis(ms).ok()),
            _ => None,
        }
        .unwrap_or(received_at);

        let text = |fields: &Map<String, Value>, key: &str| -> Option<String> {
            match fields.get(key) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            }
        };

        let action_name = text(&fields, "actionName").unwrap_or_default();
        let page = text(&fields, "page").unwrap_or_default();
        let context = text(&fields, "context");

        for key in KNOWN_FIELDS {
            fields.remove(key);
        }

        Some(Self {
            id,
            device_id: device_id.clone(),
            action_name,
            page,
            context,
            timestamp,
            extra: fields,
        })
    }
}
