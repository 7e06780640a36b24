//! Creation persistence and read-only listing.

pub mod handlers;
pub mod store;

pub use store::{CreationStore, PgCreationStore};
