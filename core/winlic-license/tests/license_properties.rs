//! Property-based tests for the license decision.

mod common;

use chrono::Duration;
use common::{device_with, now};
use proptest::prelude::*;
use winlic_license::{evaluate, DeviceStatus, LicenseState};

fn offset_strategy() -> impl Strategy<Value = Option<i64>> {
    prop::option::of(-10_000_000i64..10_000_000)
}

proptest! {
    /// Locked dominates: whatever the expiry, a locked device is invalid and locked.
    #[test]
    fn locked_is_never_valid(offset in offset_strategy()) {
        let expiry = offset.map(|s| now().offset(Duration::seconds(s)));
        let check = device_with(DeviceStatus::Locked, expiry).check(now());
        prop_assert!(!check.is_valid);
        prop_assert_eq!(check.status, LicenseState::Locked);
    }

    /// Active devices with no expiry or a future expiry are valid.
    #[test]
    fn active_with_future_expiry_is_valid(secs in prop::option::of(0i64..10_000_000)) {
        let expiry = secs.map(|s| now().offset(Duration::seconds(s)));
        let check = device_with(DeviceStatus::Active, expiry).check(now());
        prop_assert!(check.is_valid);
        prop_assert_eq!(check.status, LicenseState::Active);
    }

    /// Active devices with a past expiry are expired.
    #[test]
    fn active_with_past_expiry_is_expired(secs in 1i64..10_000_000) {
        let expiry = now().offset(Duration::seconds(-secs));
        let check = device_with(DeviceStatus::Active, Some(expiry)).check(now());
        prop_assert!(!check.is_valid);
        prop_assert_eq!(check.status, LicenseState::Expired);
    }

    /// Valid implies active, for every status and expiry.
    #[test]
    fn valid_iff_active(
        status in prop::sample::select(DeviceStatus::ALL.to_vec()),
        offset in offset_strategy(),
    ) {
        let expiry = offset.map(|s| now().offset(Duration::seconds(s)));
        let check = evaluate(Some(&device_with(status, expiry)), now());
        prop_assert_eq!(check.is_valid, check.status == LicenseState::Active);
    }
}
