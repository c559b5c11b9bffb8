//! Core of the GrantThrive platform: grant and application status machines, the
//! per-organization feature-toggle engine, and the axum routers exposing them.

pub mod access;
pub mod clock;
pub mod config;
pub mod error;
pub mod money;
pub mod store;
pub mod telemetry;
pub mod workflows;
