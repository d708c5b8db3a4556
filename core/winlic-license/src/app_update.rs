//! Published client releases.
//!
//! Operators record a release (the APK itself is hosted elsewhere) and
//! devices poll for the one with the highest build number.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use winlic_types::Timestamp;

/// A published release as devices see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUpdate {
    pub version: String,
    pub build_number: u32,
    pub apk_url: String,
    pub file_size: u64,
    pub release_notes: Option<String>,
    pub force_update: bool,
    pub skip_allowed: bool,
    pub created_at: Timestamp,
}

/// A stored release with its row id, as listed to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRecord {
    pub id: i64,
    #[serde(flatten)]
    pub update: AppUpdate,
}

/// Raw body of a publish call.
///
/// `buildNumber` and `fileSize` may arrive as numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUpdateRequest {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub build_number: Option<Value>,
    #[serde(default)]
    pub apk_url: Option<String>,
    #[serde(default)]
    pub file_size: Option<Value>,
    #[serde(default)]
    pub release_notes: Option<String>,
    #[serde(default)]
    pub force_update: Option<bool>,
    #[serde(default)]
    pub skip_allowed: Option<bool>,
}

const REQUIRED: &str = "version, buildNumber, apkUrl, and fileSize are required";

fn text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Reads a positive whole number from a JSON number or numeric string.
fn positive(field: &str, value: Option<&Value>) -> LicenseResult<u64> {
    let number = match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.trim().parse::<u64>().map_err(|_| {
            LicenseError::Validation(format!("{field} must be a positive whole number"))
        })?),
        Some(_) => {
            return Err(LicenseError::Validation(format!(
                "{field} must be a positive whole number"
            )));
        }
    };
    match number {
        Some(0) | None => Err(LicenseError::Validation(REQUIRED.to_string())),
        Some(n) => Ok(n),
    }
}

impl AppUpdate {
    /// Validates a publish request. `skipAllowed` defaults to the opposite
    /// of `forceUpdate`.
    pub fn from_request(request: AppUpdateRequest, created_at: Timestamp) -> LicenseResult<Self> {
        let version = text(request.version);
        let apk_url = text(request.apk_url);
        let (Some(version), Some(apk_url)) = (version, apk_url) else {
            return Err(LicenseError::Validation(REQUIRED.to_string()));
        };
        let build_number = positive("buildNumber", request.build_number.as_ref())?;
        let build_number = u32::try_from(build_number)
            .map_err(|_| LicenseError::Validation("buildNumber is too large".to_string()))?;
        let file_size = positive("fileSize", request.file_size.as_ref())?;

        let force_update = request.force_update.unwrap_or(false);
        Ok(Self {
            version: version.trim().to_string(),
            build_number,
            apk_url: apk_url.trim().to_string(),
            file_size,
            release_notes: text(request.release_notes),
            force_update,
            skip_allowed: request.skip_allowed.unwrap_or(!force_update),
            created_at,
        })
    }
}
