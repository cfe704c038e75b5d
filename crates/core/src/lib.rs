//! Nico Rewards Core - Shared types library.
//!
//! This crate provides common types used across all Nico Rewards components:
//! - `rewards` - The loyalty ledger service (accrual, tiers, redemption)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, the email type, and the rewards enums
//!   (tier levels, transaction types, redemption statuses, reward types)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
