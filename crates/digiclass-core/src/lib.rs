//! digiclass-core: Grading engine, attempt policy, and data model.
//!
//! This crate defines the assignment and submission types, the pure grading
//! function, the store traits the rest of the system plugs into, and the
//! submission service that enforces attempt limits around grading.

pub mod config;
pub mod error;
pub mod grading;
pub mod model;
pub mod parser;
pub mod service;
pub mod statistics;
pub mod traits;
