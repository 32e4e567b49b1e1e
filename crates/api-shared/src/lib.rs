//! # API Shared
//!
//! Shared definitions for the Guidebook APIs.
//!
//! Contains:
//! - Wire request/response types with OpenAPI schemas (`models` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the `guidebook` CLI so both speak the same JSON shapes.

pub mod health;
pub mod models;

pub use health::HealthService;
pub use models::*;
