//! Property-based tests for date normalization.

use chrono::NaiveDate;
use proptest::prelude::*;

use super::date::{
    DISPLAY_FORMAT, DateError, format_storage, parse_storage, to_display, to_storage,
    validate_display,
};

fn calendar_date() -> impl Strategy<Value = NaiveDate> {
    (1000i32..=9999, 1u32..=12, 1u32..=31)
        .prop_filter_map("not a calendar date", |(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Display to storage and back is the identity for real dates.
    #[test]
    fn prop_display_round_trip(date in calendar_date()) {
        let display = date.format(DISPLAY_FORMAT).to_string();
        prop_assert!(validate_display(&display).is_ok());
        let storage = to_storage(&display).unwrap();
        prop_assert_eq!(to_display(&storage).unwrap(), display);
    }

    /// A time suffix on the storage side never changes the displayed day.
    #[test]
    fn prop_time_suffix_is_ignored(date in calendar_date(), hour in 0u32..24) {
        let storage = format!("{}T{hour:02}:00:00.000Z", format_storage(date));
        prop_assert_eq!(parse_storage(&storage).unwrap(), date);
        prop_assert_eq!(
            to_display(&storage).unwrap(),
            date.format(DISPLAY_FORMAT).to_string()
        );
    }

    /// Anything that is not `DD/MM/YYYY` is rejected by shape.
    #[test]
    fn prop_bad_shapes_rejected(raw in "[0-9]{1}/[0-9]{1,2}/[0-9]{2,4}|[0-9]{4}-[0-9]{2}-[0-9]{2}|[a-z ]{0,10}") {
        prop_assert_eq!(
            validate_display(&raw),
            Err(DateError::InvalidDisplayFormat(raw.clone()))
        );
    }
}
