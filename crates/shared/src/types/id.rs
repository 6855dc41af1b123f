//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ClientId` where a `TransactionId` is expected.
//! Both wrap the `SERIAL` key assigned by the database, so a valid id is always positive.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            /// Returns the raw database key.
            #[must_use]
            pub const fn into_inner(self) -> i32 {
                self.0
            }

            /// Returns true if the id could have been assigned by the database.
            ///
            /// Ids decoded from the Persistence Gateway must pass this check.
            #[must_use]
            pub const fn is_assigned(self) -> bool {
                self.0 > 0
            }
        }

        impl From<i32> for $name {
            fn from(raw: i32) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

typed_id!(ClientId, "Unique identifier for a client.");
typed_id!(TransactionId, "Unique identifier for a persisted ledger transaction.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_id_round_trips_raw_value() {
        let id = ClientId(7);
        assert_eq!(id.into_inner(), 7);
        assert_eq!(ClientId::from(7), id);
    }

    #[test]
    fn test_typed_id_display() {
        assert_eq!(TransactionId(42).to_string(), "42");
    }

    #[test]
    fn test_typed_id_from_str() {
        assert_eq!(TransactionId::from_str(" 42 ").unwrap(), TransactionId(42));
        assert!(TransactionId::from_str("abc").is_err());
    }

    #[test]
    fn test_typed_id_is_assigned() {
        assert!(ClientId(1).is_assigned());
        assert!(!ClientId(0).is_assigned());
        assert!(!ClientId(-3).is_assigned());
    }

    #[test]
    fn test_typed_id_serializes_transparently() {
        assert_eq!(serde_json::to_string(&ClientId(5)).unwrap(), "5");
        let id: TransactionId = serde_json::from_str("12").unwrap();
        assert_eq!(id, TransactionId(12));
    }
}
