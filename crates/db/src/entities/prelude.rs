//! Entity re-exports.

pub use super::clients::Entity as Clients;
pub use super::transactions::Entity as Transactions;
