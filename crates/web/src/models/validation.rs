//! Form validation errors.

use core::fmt;

/// A validation failure for a single form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: &'static str,
    /// Human-readable message.
    pub message: String,
}

/// All validation failures collected while parsing a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Create an empty error set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a failure for `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Whether no failures were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The recorded failures, in the order they were found.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether `field` has at least one failure.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn messages(&self, field: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// `Ok(value)` if nothing was recorded, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors if any were recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&joined.join("; "))
    }
}

/// Validate a required text field, returning the trimmed value.
pub(crate) fn required_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "This field is required.");
    } else if trimmed.chars().count() > max_chars {
        errors.add(
            field,
            format!("Ensure this value has at most {max_chars} characters."),
        );
    }
    trimmed.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        let mut errors = ValidationErrors::new();
        assert_eq!(required_text(&mut errors, "name", "  Lolo ", 100), "Lolo");
        assert!(errors.is_empty());

        required_text(&mut errors, "breed", "   ", 100);
        required_text(&mut errors, "color", "chartreuse", 5);
        assert!(errors.has("breed"));
        assert!(errors.has("color"));
        assert!(!errors.has("name"));
        assert_eq!(errors.errors().len(), 2);
    }

    #[test]
    fn test_display_joins_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("age", "must be a whole number");
        errors.add("date", "is required");
        assert_eq!(errors.to_string(), "age: must be a whole number; date: is required");
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(3), Ok(3));
        let mut errors = ValidationErrors::new();
        errors.add("x", "bad");
        assert!(errors.into_result(3).is_err());
    }
}
