//! Cat domain types.

use core::fmt;

use cat_collector_core::{CatId, UserId};

use super::validation::{ValidationErrors, required_text};

/// Maximum length of a cat's name.
pub const NAME_MAX_CHARS: usize = 100;
/// Maximum length of a cat's breed.
pub const BREED_MAX_CHARS: usize = 100;
/// Maximum length of a cat's description.
pub const DESCRIPTION_MAX_CHARS: usize = 250;

/// A tracked cat (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cat {
    /// Unique cat ID.
    pub id: CatId,
    /// Name, fixed at creation.
    pub name: String,
    /// Breed.
    pub breed: String,
    /// Free-form description (at most 250 characters).
    pub description: String,
    /// Age in years.
    pub age: i32,
    /// User who owns this cat, if ownership scoping was on when it was created.
    pub owner: Option<UserId>,
}

impl Cat {
    /// Path of the cat's detail page.
    #[must_use]
    pub fn detail_path(&self) -> String {
        format!("/cats/{}", self.id)
    }

    /// Whether `scope` may see and modify this cat.
    #[must_use]
    pub fn is_visible_to(&self, scope: OwnerScope) -> bool {
        match scope {
            OwnerScope::All => true,
            OwnerScope::Owner(user_id) => self.owner == Some(user_id),
        }
    }
}

impl fmt::Display for Cat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Which cats a caller may see.
///
/// Passed explicitly into every cat query and command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    /// Ownership scoping is disabled: every cat is visible.
    All,
    /// Only cats owned by this user are visible.
    Owner(UserId),
}

impl OwnerScope {
    /// The owner to stamp on newly created cats.
    #[must_use]
    pub const fn owner(self) -> Option<UserId> {
        match self {
            Self::All => None,
            Self::Owner(user_id) => Some(user_id),
        }
    }
}

/// Validated fields for creating a cat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCat {
    pub name: String,
    pub breed: String,
    pub description: String,
    pub age: i32,
}

impl NewCat {
    /// Validate raw form input.
    ///
    /// # Errors
    ///
    /// Returns every field failure found.
    pub fn parse(
        name: &str,
        breed: &str,
        description: &str,
        age: &str,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", name, NAME_MAX_CHARS);
        let update = CatUpdate::collect(&mut errors, breed, description, age);
        errors.into_result(Self {
            name,
            breed: update.breed,
            description: update.description,
            age: update.age,
        })
    }
}

/// Validated fields for updating a cat.
///
/// The name is not part of an update: it is immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatUpdate {
    pub breed: String,
    pub description: String,
    pub age: i32,
}

impl CatUpdate {
    /// Validate raw form input.
    ///
    /// # Errors
    ///
    /// Returns every field failure found.
    pub fn parse(breed: &str, description: &str, age: &str) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let update = Self::collect(&mut errors, breed, description, age);
        errors.into_result(update)
    }

    fn collect(errors: &mut ValidationErrors, breed: &str, description: &str, age: &str) -> Self {
        let breed = required_text(errors, "breed", breed, BREED_MAX_CHARS);
        let description = description.trim().to_owned();
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.add(
                "description",
                format!("Ensure this value has at most {DESCRIPTION_MAX_CHARS} characters."),
            );
        }
        let age = parse_age(errors, age);
        Self {
            breed,
            description,
            age,
        }
    }
}

fn parse_age(errors: &mut ValidationErrors, value: &str) -> i32 {
    match value.trim().parse::<i32>() {
        Ok(age) if age >= 0 => age,
        Ok(_) => {
            errors.add("age", "Age cannot be negative.");
            0
        }
        Err(_) => {
            errors.add("age", "Enter a whole number.");
            0
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cat(owner: Option<UserId>) -> Cat {
        Cat {
            id: CatId::new(1),
            name: "Lolo".to_owned(),
            breed: "tabby".to_owned(),
            description: "furry little demon".to_owned(),
            age: 3,
            owner,
        }
    }

    #[test]
    fn test_new_cat_parse_valid() {
        let cat = NewCat::parse("Lolo", "tabby", "furry little demon", "3").unwrap();
        assert_eq!(cat.name, "Lolo");
        assert_eq!(cat.age, 3);
    }

    #[test]
    fn test_new_cat_zero_age_is_valid() {
        let cat = NewCat::parse("Chunky Monkey", "long hair", "sweet and cuddly", "0").unwrap();
        assert_eq!(cat.age, 0);
    }

    #[test]
    fn test_new_cat_collects_all_errors() {
        let errors = NewCat::parse("", "", &"x".repeat(251), "-1").unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("breed"));
        assert!(errors.has("description"));
        assert!(errors.has("age"));
    }

    #[test]
    fn test_description_limit_is_inclusive() {
        assert!(NewCat::parse("a", "b", &"x".repeat(250), "1").is_ok());
    }

    #[test]
    fn test_age_must_be_integer() {
        let errors = CatUpdate::parse("tabby", "", "three").unwrap_err();
        assert!(errors.has("age"));
        assert!(CatUpdate::parse("tabby", "", "2.5").is_err());
    }

    #[test]
    fn test_visibility() {
        let alice = UserId::new(1);
        let bob = UserId::new(2);
        assert!(cat(Some(alice)).is_visible_to(OwnerScope::Owner(alice)));
        assert!(!cat(Some(alice)).is_visible_to(OwnerScope::Owner(bob)));
        assert!(!cat(None).is_visible_to(OwnerScope::Owner(bob)));
        assert!(cat(None).is_visible_to(OwnerScope::All));
    }

    #[test]
    fn test_display_and_path() {
        let cat = cat(None);
        assert_eq!(cat.to_string(), "Lolo");
        assert_eq!(cat.detail_path(), "/cats/1");
    }
}
