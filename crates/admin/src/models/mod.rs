//! Admin domain models.

pub mod entity;
pub mod session;

pub use entity::Entity;
pub use session::{CurrentAdmin, keys as session_keys};
