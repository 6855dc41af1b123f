//! Running balance calculations.
//!
//! The cumulative column is a prefix sum of entry totals in list order. It is
//! recomputed from scratch on every change; ledgers are UI-sized. Sums
//! saturate at the decimal bounds instead of overflowing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::LedgerEntry;

/// Running balance information for one row of a ledger.
///
/// - `previous_balance`: cumulative total before this row
/// - `current_balance`: cumulative total including this row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Zero-based row position.
    pub position: usize,
    /// Balance before this row.
    pub previous_balance: Decimal,
    /// Balance after this row.
    pub current_balance: Decimal,
}

impl RunningBalance {
    /// Creates the running balance for the first row.
    #[must_use]
    pub fn first_entry(total: Decimal) -> Self {
        Self {
            position: 0,
            previous_balance: Decimal::ZERO,
            current_balance: total,
        }
    }

    /// Creates the running balance for the row after `previous`.
    ///
    /// - current_balance[N] = previous_balance[N] + total[N]
    /// - previous_balance[N] = current_balance[N-1]
    #[must_use]
    pub fn next_entry(previous: &Self, total: Decimal) -> Self {
        Self {
            position: previous.position + 1,
            previous_balance: previous.current_balance,
            current_balance: previous.current_balance.saturating_add(total),
        }
    }
}

/// Prefix sums of `totals`, one per input value.
pub fn cumulative_totals(totals: impl IntoIterator<Item = Decimal>) -> Vec<Decimal> {
    totals
        .into_iter()
        .scan(Decimal::ZERO, |acc, total| {
            *acc = acc.saturating_add(total);
            Some(*acc)
        })
        .collect()
}

/// Cumulative total for every entry, in list order.
#[must_use]
pub fn compute_cumulative(entries: &[LedgerEntry]) -> Vec<Decimal> {
    cumulative_totals(entries.iter().map(LedgerEntry::total))
}

/// The last cumulative value, or zero for an empty ledger.
#[must_use]
pub fn grand_total(entries: &[LedgerEntry]) -> Decimal {
    entries
        .iter()
        .map(LedgerEntry::total)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Statement-style balances: previous and current balance for every entry.
#[must_use]
pub fn running_balances(entries: &[LedgerEntry]) -> Vec<RunningBalance> {
    let mut balances: Vec<RunningBalance> = Vec::with_capacity(entries.len());
    for entry in entries {
        let next = match balances.last() {
            Some(previous) => RunningBalance::next_entry(previous, entry.total()),
            None => RunningBalance::first_entry(entry.total()),
        };
        balances.push(next);
    }
    balances
}
