//! # Encore Common Library
//!
//! Shared code for the Encore services including:
//! - Database initialization, schema and models
//! - Configuration loading
//! - Season week arithmetic
//! - Username validation

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod validation;

pub use error::{Error, Result};
pub use validation::{validate_username, UsernameValidation};
