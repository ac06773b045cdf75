//! Document store backend (SurrealDB).
//!
//! - `identifier`: `_id` coercion and property-name checks
//! - `crud`: the `DocumentCrud` facade

mod crud;
pub mod identifier;


pub use crud::DocumentCrud;
pub use identifier::{ID_FIELD, coerce_id};
