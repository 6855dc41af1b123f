//! `SeaORM` entities.

pub mod prelude;

pub mod clients;
pub mod transactions;
