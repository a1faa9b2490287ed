//! Persistence for dashboard state.
//!
//! A small SQLite database holds a `user_preferences` key-value table.
//! [`ToggleStore`] keeps every widget and group toggle in one JSON record
//! under a single namespaced key of that table.

mod preferences;
mod schema;
mod toggles;
mod types;

pub use schema::Database;
pub use toggles::{ToggleState, ToggleStore, TOGGLES_KEY};
pub use types::DatabaseError;
