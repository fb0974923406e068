//! Human-readable order number formatting.
//!
//! Order numbers look like `ORD-20240315-007`: day-scoped, sequential, and
//! minted from an atomic per-day counter inside the creation transaction so
//! concurrent orders can never collide.

use chrono::NaiveDate;

/// Formats an order number from a calendar day and that day's sequence
/// value. Sequences are zero-padded to three digits and widen naturally
/// past 999.
pub fn format(date: NaiveDate, sequence: u32) -> String {
    format!("ORD-{}-{:03}", date.format("%Y%m%d"), sequence)
}
