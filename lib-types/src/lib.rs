//! Vote-lock ledger primitives.
//! Stable, protocol-neutral, behavior-free.
//!
//! Rule: No String identifiers in ledger state. Ever.

pub mod primitives;

pub use primitives::{Address, Amount, BlockHeight, BlockStamp, Bps, TokenId, Timestamp, MAX_BPS};
