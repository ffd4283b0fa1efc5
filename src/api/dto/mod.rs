//! Data Transfer Objects for REST request serialization.
//!
//! Responses reuse the domain reports directly.

pub mod run_dto;

pub use run_dto::*;
