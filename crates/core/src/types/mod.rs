//! Core types for Nico Rewards.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod points;

pub use email::{Email, EmailError};
pub use id::*;
pub use points::*;
