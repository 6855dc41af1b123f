//! Ledger entries and the field-update rules that keep `total` derived.
//!
//! An entry is one line of a client's ledger: a date, a free-text
//! description, and the `credit`, `debit`, and `price` amounts. `total` is
//! never set directly; it is always `(debit - credit) * price`.

use std::fmt;
use std::str::FromStr;

use ledgerbook_shared::{ClientId, TransactionId};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tracing::debug;

use super::date::{self, DateError};
use super::gateway::{EntryUpdate, NewEntry, StoredEntry};

/// Decimal places kept for `credit`, `debit` and `price`.
pub const AMOUNT_SCALE: u32 = 4;

/// Exclusive bound on the magnitude of an amount or a total, `10^15`.
///
/// Matches the integer digits of the storage columns. Totals of at most
/// this size can be summed over any realistic ledger without overflow.
const AMOUNT_LIMIT: i64 = 1_000_000_000_000_000;

/// Identifier of an entry that only exists locally.
///
/// Issued by a monotonic per-ledger counter, so two rows created in the same
/// instant still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalId(pub u64);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local-{}", self.0)
    }
}

/// Identity of an entry: either waiting for its first save, or persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryId {
    /// Created locally, not yet acknowledged by the Persistence Gateway.
    Pending(LocalId),
    /// Stored by the Persistence Gateway under a server-assigned id.
    Persisted(TransactionId),
}

impl EntryId {
    /// Returns true if the entry has never been saved.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Returns true if the entry has a server-assigned id.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }

    /// Returns the server-assigned id, if any.
    #[must_use]
    pub const fn transaction_id(&self) -> Option<TransactionId> {
        match self {
            Self::Persisted(id) => Some(*id),
            Self::Pending(_) => None,
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(local) => write!(f, "{local}"),
            Self::Persisted(id) => write!(f, "{id}"),
        }
    }
}

/// The user-editable fields of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryField {
    /// Calendar date, `DD/MM/YYYY`.
    Date,
    /// Free text.
    Description,
    /// Credited quantity.
    Credit,
    /// Debited quantity.
    Debit,
    /// Unit price.
    Price,
}

impl EntryField {
    /// Returns true for the fields that feed into `total`.
    #[must_use]
    pub const fn is_amount(self) -> bool {
        matches!(self, Self::Credit | Self::Debit | Self::Price)
    }
}

/// A field name that does not match any editable field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown entry field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for EntryField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "description" => Ok(Self::Description),
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            "price" => Ok(Self::Price),
            _ => Err(UnknownField(s.to_string())),
        }
    }
}

/// Why a field update left the entry untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The date was not a valid `DD/MM/YYYY` calendar date.
    #[error(transparent)]
    InvalidDate(#[from] DateError),

    /// The amount, or the resulting total, is too large to store.
    #[error("Amount is out of range")]
    AmountOutOfRange,
}

/// Outcome of [`LedgerEntry::update_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// The value was stored as given.
    Applied,
    /// A negative amount was replaced by zero.
    Clamped {
        /// The amount the user actually typed.
        requested: Decimal,
    },
    /// Nothing changed.
    Rejected(RejectReason),
}

impl FieldUpdate {
    /// Returns true if the entry was modified.
    #[must_use]
    pub const fn changed(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

#[derive(Debug, Clone, Copy)]
enum Amount {
    Credit,
    Debit,
    Price,
}

/// One line of a client's ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    id: EntryId,
    date: String,
    description: String,
    credit: Decimal,
    debit: Decimal,
    price: Decimal,
    total: Decimal,
}

impl LedgerEntry {
    /// Creates a blank pending entry dated `date` (display encoding).
    #[must_use]
    pub fn pending(local_id: LocalId, date: impl Into<String>) -> Self {
        Self {
            id: EntryId::Pending(local_id),
            date: date.into(),
            description: String::new(),
            credit: Decimal::ZERO,
            debit: Decimal::ZERO,
            price: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }

    /// Builds a persisted entry from what the Persistence Gateway returned.
    ///
    /// The date is converted to display encoding and `total` is derived again
    /// from the stored amounts.
    pub fn from_stored(stored: &StoredEntry) -> Result<Self, DateError> {
        let total = derive_total(stored.debit, stored.credit, stored.price).unwrap_or(stored.total);
        Ok(Self {
            id: EntryId::Persisted(stored.id),
            date: date::to_display(&stored.date)?,
            description: stored.description.clone(),
            credit: stored.credit,
            debit: stored.debit,
            price: stored.price,
            total,
        })
    }

    /// Entry identity.
    #[must_use]
    pub const fn id(&self) -> EntryId {
        self.id
    }

    /// Date in display encoding.
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Credited quantity.
    #[must_use]
    pub const fn credit(&self) -> Decimal {
        self.credit
    }

    /// Debited quantity.
    #[must_use]
    pub const fn debit(&self) -> Decimal {
        self.debit
    }

    /// Unit price.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// Derived total, `(debit - credit) * price`.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Applies one raw edit from the Presentation Layer.
    ///
    /// Dates must be `DD/MM/YYYY` calendar dates, otherwise the entry stays as
    /// it was. Amounts are parsed leniently (see [`parse_amount`]), rounded to
    /// [`AMOUNT_SCALE`] places, and negative values are stored as zero.
    /// `total` is recomputed after every change.
    pub fn update_field(&mut self, field: EntryField, raw: &str) -> FieldUpdate {
        match field {
            EntryField::Date => {
                if let Err(err) = date::validate_display(raw) {
                    debug!(entry = %self.id, value = raw, "Ignoring invalid date");
                    return FieldUpdate::Rejected(err.into());
                }
                self.date = raw.to_string();
                FieldUpdate::Applied
            }
            EntryField::Description => {
                self.description = raw.to_string();
                FieldUpdate::Applied
            }
            EntryField::Credit => self.update_amount(Amount::Credit, parse_amount(raw)),
            EntryField::Debit => self.update_amount(Amount::Debit, parse_amount(raw)),
            EntryField::Price => self.update_amount(Amount::Price, parse_amount(raw)),
        }
    }

    fn update_amount(&mut self, field: Amount, requested: Option<Decimal>) -> FieldUpdate {
        let Some(requested) = requested else {
            debug!(entry = %self.id, ?field, "Ignoring amount that cannot be represented");
            return FieldUpdate::Rejected(RejectReason::AmountOutOfRange);
        };

        let clamped = requested < Decimal::ZERO;
        let value = if clamped || requested.is_zero() {
            Decimal::ZERO
        } else {
            match normalize_amount(requested) {
                Some(value) => value,
                None => {
                    debug!(entry = %self.id, ?field, %requested, "Ignoring amount out of range");
                    return FieldUpdate::Rejected(RejectReason::AmountOutOfRange);
                }
            }
        };

        let (credit, debit, price) = match field {
            Amount::Credit => (value, self.debit, self.price),
            Amount::Debit => (self.credit, value, self.price),
            Amount::Price => (self.credit, self.debit, value),
        };

        let Some(total) = derive_total(debit, credit, price) else {
            debug!(entry = %self.id, ?field, "Ignoring amount that overflows the total");
            return FieldUpdate::Rejected(RejectReason::AmountOutOfRange);
        };

        self.credit = credit;
        self.debit = debit;
        self.price = price;
        self.total = total;

        if clamped {
            debug!(entry = %self.id, ?field, %requested, "Clamped negative amount to zero");
            FieldUpdate::Clamped { requested }
        } else {
            FieldUpdate::Applied
        }
    }

    /// Builds the create payload for this entry.
    pub fn new_entry(&self, client_id: ClientId) -> Result<NewEntry, DateError> {
        Ok(NewEntry {
            client_id,
            date: date::to_storage(&self.date)?,
            description: self.description.clone(),
            credit: self.credit,
            debit: self.debit,
            price: self.price,
            total: self.total,
        })
    }

    /// Builds the update payload for this entry.
    pub fn entry_update(&self) -> Result<EntryUpdate, DateError> {
        Ok(EntryUpdate {
            date: date::to_storage(&self.date)?,
            description: self.description.clone(),
            credit: self.credit,
            debit: self.debit,
            price: self.price,
            total: self.total,
        })
    }
}

/// Computes `(debit - credit) * price`.
///
/// Returns `None` when the magnitude of the total reaches `10^15`.
#[must_use]
pub fn derive_total(debit: Decimal, credit: Decimal, price: Decimal) -> Option<Decimal> {
    let total = debit.checked_sub(credit)?.checked_mul(price)?;
    within_limit(total).then_some(total)
}

/// Rounds an amount to [`AMOUNT_SCALE`] places, half away from zero.
///
/// Returns `None` when the rounded magnitude reaches `10^15`.
#[must_use]
pub fn normalize_amount(value: Decimal) -> Option<Decimal> {
    let rounded = value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    within_limit(rounded).then_some(rounded)
}

fn within_limit(value: Decimal) -> bool {
    value.abs() < Decimal::from(AMOUNT_LIMIT)
}

/// Parses the leading decimal number of `raw`.
///
/// Leading whitespace is skipped and anything after the number is ignored, so
/// `"12.5kg"` reads as `12.5` and `"abc"` as `0`. An exponent such as `1e3` is
/// honored. Returns `None` for a number a `Decimal` cannot hold, such as
/// `"1e40"` or a 40-digit mantissa.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let bytes = raw.trim_start().as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos = 1;
            true
        }
        Some(b'+') => {
            pos = 1;
            false
        }
        _ => false,
    };

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_digits = &bytes[int_start..pos];

    let mut frac_digits: &[u8] = &[];
    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        frac_digits = &bytes[frac_start..frac_end];
        pos = frac_end;
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return Some(Decimal::ZERO);
    }

    let mut mantissa = String::with_capacity(int_digits.len() + frac_digits.len() + 2);
    if negative {
        mantissa.push('-');
    }
    if int_digits.is_empty() {
        mantissa.push('0');
    } else {
        mantissa.push_str(&String::from_utf8_lossy(int_digits));
    }
    if !frac_digits.is_empty() {
        mantissa.push('.');
        mantissa.push_str(&String::from_utf8_lossy(frac_digits));
    }

    match exponent_suffix(&bytes[pos..]) {
        Some(exponent) => {
            let exponent = std::str::from_utf8(exponent).ok()?;
            Decimal::from_scientific(&format!("{mantissa}e{exponent}")).ok()
        }
        None => Decimal::from_str(&mantissa).ok(),
    }
}

/// Returns the `[+-]digits` of an `e` suffix, or `None` when there is no
/// complete exponent.
fn exponent_suffix(bytes: &[u8]) -> Option<&[u8]> {
    let (first, rest) = bytes.split_first()?;
    if !matches!(first, b'e' | b'E') {
        return None;
    }
    let sign = usize::from(matches!(rest.first(), Some(b'-' | b'+')));
    let len = rest[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
    (len > 0).then(|| &rest[..sign + len])
}
