//! Database models for the Tillbook backend
//!
//! Re-exports models from the shared crate and adds backend-specific models

pub use shared::models::*;
