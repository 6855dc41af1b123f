//! Property-based tests for entry field updates.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::entry::{AMOUNT_SCALE, EntryField, FieldUpdate, LedgerEntry, LocalId, derive_total};

/// Non-negative amounts with up to two decimal places.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn amount_field() -> impl Strategy<Value = EntryField> {
    prop_oneof![
        Just(EntryField::Credit),
        Just(EntryField::Debit),
        Just(EntryField::Price),
    ]
}

fn edit() -> impl Strategy<Value = (EntryField, String)> {
    prop_oneof![
        (amount_field(), amount().prop_map(|a| a.to_string())),
        (amount_field(), amount().prop_map(|a| format!("-{a}"))),
        (amount_field(), "[a-z]{0,4}"),
        (Just(EntryField::Description), "[ -~]{0,12}"),
        (Just(EntryField::Date), "[0-3][0-9]/[01][0-9]/20[0-9]{2}"),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// After any sequence of edits, total == (debit - credit) * price.
    #[test]
    fn prop_total_stays_derived(edits in prop::collection::vec(edit(), 0..20)) {
        let mut entry = LedgerEntry::pending(LocalId(1), "01/01/2024");
        for (field, raw) in &edits {
            entry.update_field(*field, raw);
            prop_assert_eq!(
                Some(entry.total()),
                derive_total(entry.debit(), entry.credit(), entry.price())
            );
        }
    }

    /// Amounts never go negative, whatever the input.
    #[test]
    fn prop_amounts_never_negative(edits in prop::collection::vec(edit(), 0..20)) {
        let mut entry = LedgerEntry::pending(LocalId(1), "01/01/2024");
        for (field, raw) in &edits {
            entry.update_field(*field, raw);
        }
        prop_assert!(entry.credit() >= Decimal::ZERO);
        prop_assert!(entry.debit() >= Decimal::ZERO);
        prop_assert!(entry.price() >= Decimal::ZERO);
    }

    /// A negative input is reported as clamped and stored as zero.
    #[test]
    fn prop_negative_input_clamps(field in amount_field(), value in amount()) {
        prop_assume!(!value.is_zero());
        let mut entry = LedgerEntry::pending(LocalId(1), "01/01/2024");
        let result = entry.update_field(field, &format!("-{value}"));
        prop_assert_eq!(result, FieldUpdate::Clamped { requested: -value });
        prop_assert_eq!(entry.total(), Decimal::ZERO);
    }

    /// Stored amounts never carry more places than the storage columns.
    #[test]
    fn prop_amounts_keep_storage_scale(
        field in amount_field(),
        mantissa in 0i64..10_000_000_000i64,
        scale in 0u32..12,
    ) {
        let value = Decimal::new(mantissa, scale);
        let mut entry = LedgerEntry::pending(LocalId(1), "01/01/2024");
        entry.update_field(EntryField::Price, "1");
        prop_assert!(entry.update_field(field, &value.to_string()).changed());
        prop_assert!(entry.credit().scale() <= AMOUNT_SCALE);
        prop_assert!(entry.debit().scale() <= AMOUNT_SCALE);
        prop_assert!(entry.price().scale() <= AMOUNT_SCALE);
    }
}
