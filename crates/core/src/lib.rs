//! Cat Collector Core - Shared types library.
//!
//! This crate provides the domain types used across all Cat Collector components:
//! - `web` - The cat tracking web application
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, usernames, and meals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
