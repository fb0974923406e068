//! Transactional repository layer for the order lifecycle engine.
//!
//! The engine consumes the [`OrderStore`] / [`OrderTx`] traits: one
//! transaction object carries every read and relative-adjustment write a
//! lifecycle operation needs, and either commits atomically or rolls back
//! on drop. Two implementations are provided: [`InMemoryStore`] for tests
//! and [`PostgresStore`] backed by sqlx.

mod error;
mod memory;
mod postgres;
mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{OrderDetails, OrderPage, OrderQuery, OrderStore, OrderTx, StatusUpdate};
