use chrono::Duration;
use proptest::prelude::*;
use winlic_types::Timestamp;

#[test]
fn parse_rfc3339() {
    let ts = Timestamp::parse("2025-03-01T10:15:30Z").unwrap();
    assert_eq!(ts.to_rfc3339(), "2025-03-01T10:15:30.000Z");
}

#[test]
fn parse_with_offset_normalizes_to_utc() {
    let ts = Timestamp::parse("2025-03-01T12:15:30+02:00").unwrap();
    assert_eq!(ts.to_rfc3339(), "2025-03-01T10:15:30.000Z");
}

#[test]
fn parse_rejects_garbage() {
    assert!(Timestamp::parse("yesterday").is_err());
    assert!(Timestamp::parse("").is_err());
}

#[test]
fn now_has_millisecond_precision() {
    let ts = Timestamp::now();
    let back = Timestamp::from_millis(ts.as_millis()).unwrap();
    assert_eq!(ts, back);
}

#[test]
fn age_at_is_positive_for_past() {
    let now = Timestamp::parse("2025-03-10T00:00:00Z").unwrap();
    let then = Timestamp::parse("2025-03-03T00:00:00Z").unwrap();
    assert_eq!(then.age_at(now), Duration::days(7));
    assert_eq!(now.age_at(then), Duration::days(-7));
}

#[test]
fn offset_moves_forward_and_back() {
    let base = Timestamp::parse("2025-01-01T00:00:00Z").unwrap();
    assert_eq!(base.offset(Duration::hours(24)).to_rfc3339(), "2025-01-02T00:00:00.000Z");
    assert!(base.offset(Duration::seconds(-1)).is_before(&base));
}

#[test]
fn serde_uses_rfc3339_strings() {
    let ts = Timestamp::parse("2024-12-31T23:59:59.250Z").unwrap();
    let json = serde_json::to_string(&ts).unwrap();
    assert_eq!(json, r#""2024-12-31T23:59:59.250Z""#);
    let parsed: Timestamp = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, ts);
}

#[test]
fn serde_rejects_numbers() {
    assert!(serde_json::from_str::<Timestamp>("1700000000000").is_err());
}

proptest! {
    #[test]
    fn millis_round_trip(millis in 0i64..4_102_444_800_000) {
        let ts = Timestamp::from_millis(millis).unwrap();
        prop_assert_eq!(ts.as_millis(), millis);
        prop_assert_eq!(Timestamp::parse(&ts.to_rfc3339()).unwrap(), ts);
    }
}
