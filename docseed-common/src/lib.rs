//! # docseed Common Library
//!
//! Shared code for the docseed fixture loader including:
//! - Native document values and object identifiers
//! - Extended JSON normalization
//! - Fixture shape resolution
//! - Configuration loading
//! - Error types

pub mod config;
pub mod error;
pub mod extended_json;
pub mod object_id;
pub mod shape;
pub mod time;
pub mod value;

pub use error::{Error, Result};
pub use extended_json::normalize;
pub use object_id::ObjectId;
pub use shape::{ensure_array, Shape};
pub use value::{Document, Value};
