//! Core types for Cat Collector.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod meal;
pub mod username;

pub use id::*;
pub use meal::{Meal, MealError};
pub use username::{Username, UsernameError};
