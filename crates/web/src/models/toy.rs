//! Toy domain types.

use core::fmt;

use cat_collector_core::ToyId;

use super::validation::{ValidationErrors, required_text};

/// Maximum length of a toy's name.
pub const NAME_MAX_CHARS: usize = 50;
/// Maximum length of a toy's color.
pub const COLOR_MAX_CHARS: usize = 20;

/// A toy that any number of cats may share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toy {
    pub id: ToyId,
    pub name: String,
    pub color: String,
}

impl Toy {
    /// Path of the toy's detail page.
    #[must_use]
    pub fn detail_path(&self) -> String {
        format!("/toys/{}", self.id)
    }
}

impl fmt::Display for Toy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Validated fields for creating or updating a toy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToy {
    pub name: String,
    pub color: String,
}

impl NewToy {
    /// Validate raw form input.
    ///
    /// # Errors
    ///
    /// Returns every field failure found.
    pub fn parse(name: &str, color: &str) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", name, NAME_MAX_CHARS);
        let color = required_text(&mut errors, "color", color, COLOR_MAX_CHARS);
        errors.into_result(Self { name, color })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let toy = NewToy::parse(" Mouse ", "grey").unwrap();
        assert_eq!(toy.name, "Mouse");
        assert_eq!(toy.color, "grey");

        let errors = NewToy::parse("", &"x".repeat(21)).unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("color"));
    }

    #[test]
    fn test_display_and_path() {
        let toy = Toy {
            id: ToyId::new(7),
            name: "Catnip Mouse".to_owned(),
            color: "grey".to_owned(),
        };
        assert_eq!(toy.to_string(), "Catnip Mouse");
        assert_eq!(toy.detail_path(), "/toys/7");
    }
}
