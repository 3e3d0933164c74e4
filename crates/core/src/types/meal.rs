//! Meal kinds recorded in a cat's feeding log.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known meal.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown meal: {0:?} (expected B, L, D or Breakfast, Lunch, Dinner)")]
pub struct MealError(pub String);

/// A meal in the feeding log.
///
/// Stored as a single-letter code (`B`, `L`, `D`) and displayed with its
/// full label.
///
/// ```
/// use cat_collector_core::Meal;
///
/// assert_eq!(Meal::parse("L").unwrap(), Meal::Lunch);
/// assert_eq!(Meal::parse("dinner").unwrap(), Meal::Dinner);
/// assert!(Meal::parse("X").is_err());
/// assert_eq!(Meal::default(), Meal::Breakfast);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Meal {
    #[default]
    #[serde(rename = "B")]
    Breakfast,
    #[serde(rename = "L")]
    Lunch,
    #[serde(rename = "D")]
    Dinner,
}

impl Meal {
    /// Every meal kind, in serving order.
    pub const ALL: [Self; 3] = [Self::Breakfast, Self::Lunch, Self::Dinner];

    /// Number of distinct meal kinds in a day.
    pub const PER_DAY: usize = Self::ALL.len();

    /// Single-letter storage code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Breakfast => "B",
            Self::Lunch => "L",
            Self::Dinner => "D",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
        }
    }

    /// Parse a meal from its storage code or its label (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `MealError` if the input names no meal.
    pub fn parse(s: &str) -> Result<Self, MealError> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|meal| {
                meal.code().eq_ignore_ascii_case(trimmed)
                    || meal.label().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| MealError(s.to_owned()))
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Meal {
    type Err = MealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
