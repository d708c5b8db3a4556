mod common;

use common::{active_device, days_from_now, now};
use pretty_assertions::assert_eq;
use winlic_license::{Device, DeviceControls, DeviceInfo, DeviceStatus, GraceStatus};
use winlic_types::DeviceId;

#[test]
fn registered_device_defaults() {
    let device = Device::registered(
        DeviceId::parse("dev-9").unwrap(),
        None,
        Some(DeviceInfo {
            model: Some("Pixel 7".into()),
            ..DeviceInfo::default()
        }),
        now(),
    );
    assert_eq!(device.status, DeviceStatus::Active);
    assert_eq!(device.registered_at, now());
    assert_eq!(device.last_active_at, now());
    assert_eq!(device.license_expiry, None);
    assert!(!device.force_check);
    assert_eq!(device.lock_reason, None);
    assert_eq!(device.controls, DeviceControls::default());
    assert!(!device.is_locked());
}

#[test]
fn status_parse_accepts_known_values() {
    for status in DeviceStatus::ALL {
        assert_eq!(status.as_str().parse::<DeviceStatus>().unwrap(), status);
    }
}

#[test]
fn status_parse_rejects_unknown_values() {
    assert!("unregistered".parse::<DeviceStatus>().is_err());
    assert!("Active".parse::<DeviceStatus>().is_err());
    assert!("".parse::<DeviceStatus>().is_err());
}

#[test]
fn toggle_is_a_flip() {
    assert_eq!(DeviceStatus::Active.toggled(), DeviceStatus::Locked);
    assert_eq!(DeviceStatus::Locked.toggled(), DeviceStatus::Active);
    assert_eq!(DeviceStatus::Expired.toggled(), DeviceStatus::Locked);
    assert_eq!(DeviceStatus::Active.toggled().toggled(), DeviceStatus::Active);
}

#[test]
fn controls_default_all_allowed() {
    let controls = DeviceControls::default();
    assert!(controls.can_create_customer && controls.can_share && controls.can_print);
}

#[test]
fn controls_partial_json_fills_defaults() {
    let controls: DeviceControls =
        serde_json::from_str(r#"{"canExportData":false,"canPrint":false}"#).unwrap();
    assert!(!controls.can_export_data);
    assert!(!controls.can_print);
    assert!(controls.can_delete_window);
}

#[test]
fn device_serializes_camel_case_with_nulls() {
    let json = serde_json::to_value(active_device("dev-1")).unwrap();
    assert_eq!(json["deviceId"], "dev-1");
    assert_eq!(json["status"], "active");
    assert_eq!(json["appVersion"], "1.4.0");
    assert!(json["licenseExpiry"].is_null());
    assert!(json["lockReason"].is_null());
    assert_eq!(json["forceCheck"], false);
    assert_eq!(json["controls"]["canCreateWindow"], true);
}

#[test]
fn device_json_round_trip() {
    let mut device = active_device("dev-2");
    device.license_expiry = Some(days_from_now(20));
    device.device_info = Some(DeviceInfo {
        model: Some("SM-A515F".into()),
        manufacturer: Some("samsung".into()),
        os_version: Some("13".into()),
    });
    let json = serde_json::to_string(&device).unwrap();
    let parsed: Device = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, device);
}

#[test]
fn summary_flattens_device_and_adds_grace() {
    let mut device = active_device("dev-3");
    device.last_active_at = days_from_now(-6);
    let summary = device.summary(now());
    assert_eq!(summary.grace_status, GraceStatus::GracePeriod);
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["deviceId"], "dev-3");
    assert_eq!(json["graceStatus"], "grace_period");
}
