//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! The recipe manager has a single driven dependency, PostgreSQL, reached
//! through the Diesel adapters in [`persistence`]. Adapters are thin
//! translators between domain types and rows; they contain no business
//! rules.

pub mod persistence;
