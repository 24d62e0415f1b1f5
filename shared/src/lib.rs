//! Shared types and logic for Tillbook
//!
//! This crate contains the domain models, the sales analytics pipeline,
//! and the costing math shared between the backend and the frontend
//! (via WASM).

pub mod analytics;
pub mod costing;
pub mod ingest;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
