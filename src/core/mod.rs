//! Core identifier types shared by every component.
//!
//! - [`Side`]: which ledger a line belongs to (bank statement or general ledger)
//! - [`LineId`], [`MatchId`]: server-assigned identifiers, keyed as strings
//! - [`LineRef`]: a `(side, id)` pair naming one rendered line
//!
//! ## Identifier Keys
//!
//! The server emits ids as JSON integers in some payloads and as strings in
//! others. Both forms parse to the same string key, so `10` and `"10"` always
//! refer to the same line:
//!
//! | Wire value | Key    |
//! |------------|--------|
//! | `10`       | `"10"` |
//! | `"10"`     | `"10"` |
//! | `" 10 "`   | `"10"` |
//!
//! [`Side`]: types::Side
//! [`LineId`]: types::LineId
//! [`MatchId`]: types::MatchId
//! [`LineRef`]: types::LineRef

pub mod types;
