//! Domain models for Cat Collector.
//!
//! These types represent validated domain objects separate from database row types.
//!
//! - [`Cat`] owns its [`Feeding`]s and [`Photo`]s (deleted with it)
//! - [`Toy`]s are shared between cats through an association table
//! - [`User`]s own cats when ownership scoping is enabled

pub mod cat;
pub mod feeding;
pub mod photo;
pub mod session;
pub mod toy;
pub mod user;
pub mod validation;

pub use cat::{Cat, CatUpdate, NewCat, OwnerScope};
pub use feeding::{Feeding, NewFeeding, is_fed};
pub use photo::Photo;
pub use session::{CurrentUser, keys as session_keys};
pub use toy::{NewToy, Toy};
pub use user::User;
pub use validation::{FieldError, ValidationErrors};
