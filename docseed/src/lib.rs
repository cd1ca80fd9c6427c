//! docseed library - fixture loader
//!
//! Loads JSON fixtures, normalizes extended JSON wrappers and replaces the
//! contents of one collection per entity type.

pub mod fixture;
pub mod loader;
pub mod store;

pub use fixture::IdPolicy;
pub use loader::{EntitySummary, Loader, LoaderOptions, Phase, SeedSummary};
pub use store::{DocumentStore, SqliteStore};
