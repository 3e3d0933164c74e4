//! Feeding log domain types.

use core::fmt;

use chrono::NaiveDate;

use cat_collector_core::{CatId, FeedingId, Meal};

use super::validation::ValidationErrors;

/// Date format used by feeding forms.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A meal given to a cat on a given day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feeding {
    pub id: FeedingId,
    pub cat_id: CatId,
    pub date: NaiveDate,
    pub meal: Meal,
}

impl fmt::Display for Feeding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.meal.label(), self.date)
    }
}

/// Validated fields for a new feeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewFeeding {
    pub date: NaiveDate,
    pub meal: Meal,
}

impl NewFeeding {
    /// Validate raw form input.
    ///
    /// A missing meal defaults to breakfast; an unknown one is an error.
    ///
    /// # Errors
    ///
    /// Returns every field failure found.
    pub fn parse(date: &str, meal: Option<&str>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let date = match NaiveDate::parse_from_str(date.trim(), DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) if date.trim().is_empty() => {
                errors.add("date", "This field is required.");
                None
            }
            Err(_) => {
                errors.add("date", "Enter a valid date (YYYY-MM-DD).");
                None
            }
        };

        let meal = match meal.map(str::trim).filter(|m| !m.is_empty()) {
            None => Meal::default(),
            Some(raw) => Meal::parse(raw).unwrap_or_else(|e| {
                errors.add("meal", e.to_string());
                Meal::default()
            }),
        };

        match date {
            Some(date) => errors.into_result(Self { date, meal }),
            None => Err(errors),
        }
    }
}

/// Whether a cat with `todays_feedings` feedings dated today counts as fed.
///
/// Only the count is checked: three breakfasts count as fed.
#[must_use]
pub const fn is_fed(todays_feedings: usize) -> bool {
    todays_feedings >= Meal::PER_DAY
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let feeding = NewFeeding::parse("2026-10-18", Some("L")).unwrap();
        assert_eq!(feeding.date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(feeding.meal, Meal::Lunch);
    }

    #[test]
    fn test_missing_meal_defaults_to_breakfast() {
        let feeding = NewFeeding::parse("2026-10-18", None).unwrap();
        assert_eq!(feeding.meal, Meal::Breakfast);
        let feeding = NewFeeding::parse("2026-10-18", Some("")).unwrap();
        assert_eq!(feeding.meal, Meal::Breakfast);
    }

    #[test]
    fn test_unknown_meal_is_rejected() {
        let errors = NewFeeding::parse("2026-10-18", Some("X")).unwrap_err();
        assert!(errors.has("meal"));
        assert!(!errors.has("date"));
    }

    #[test]
    fn test_date_is_required() {
        let errors = NewFeeding::parse("", Some("B")).unwrap_err();
        assert!(errors.has("date"));
        let errors = NewFeeding::parse("18/10/2026", Some("B")).unwrap_err();
        assert!(errors.has("date"));
    }

    #[test]
    fn test_is_fed_counts_only() {
        assert!(!is_fed(0));
        assert!(!is_fed(2));
        assert!(is_fed(3));
        assert!(is_fed(4));
    }

    #[test]
    fn test_display() {
        let feeding = Feeding {
            id: FeedingId::new(1),
            cat_id: CatId::new(1),
            date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            meal: Meal::Dinner,
        };
        assert_eq!(feeding.to_string(), "Dinner on 2026-01-02");
    }
}
