//! Nico Rewards library.
//!
//! The loyalty ledger as a library: domain models, the ledger store
//! abstraction with its Postgres and in-memory implementations, the rewards
//! workflows, and the HTTP surface. The binary in `main.rs` is a thin shell
//! over this crate, which keeps the workflows testable against the
//! in-memory store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
