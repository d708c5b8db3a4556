use winlic_license::LicenseError;

#[test]
fn error_display_validation() {
    let err = LicenseError::Validation("deviceId is required".into());
    let msg = format!("{err}");
    assert!(msg.contains("validation"));
    assert!(msg.contains("deviceId is required"));
}

#[test]
fn error_display_not_found() {
    let err = LicenseError::NotFound("abc".into());
    assert!(format!("{err}").contains("not found"));
}

#[test]
fn error_display_unauthorized() {
    assert_eq!(format!("{}", LicenseError::Unauthorized), "unauthorized");
}

#[test]
fn error_display_conflict() {
    let err = LicenseError::Conflict {
        expected: "active".into(),
        actual: "locked".into(),
    };
    let msg = format!("{err}");
    assert!(msg.contains("expected active"));
    assert!(msg.contains("found locked"));
}

#[test]
fn error_display_store() {
    let err = LicenseError::Store("database is locked".into());
    assert!(format!("{err}").contains("store"));
}

#[test]
fn error_from_invalid_id_is_validation() {
    let id_err = winlic_types::DeviceId::parse("").unwrap_err();
    let err: LicenseError = id_err.into();
    assert!(matches!(err, LicenseError::Validation(_)));
}
