//! # Scolaris Common Library
//!
//! Shared code for the Scolaris academic records services:
//! - Persisted record models (Semestre, Filiere, Professeur, Element)
//! - Store schema initialization
//! - Bootstrap configuration loading
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
