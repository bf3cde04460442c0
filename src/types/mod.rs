//! # types
//!
//! `types` is the module containing the database model and the error types of the crate

pub mod database;
pub mod errors;
pub mod message;
pub mod node;
pub mod signal;
