//! Intake and review engine for community moderator applications.
//!
//! The [`applications`] module owns the lifecycle rules; configuration, telemetry, and the
//! service-level error type are shared with the HTTP service in `services/api`.

pub mod applications;
pub mod config;
pub mod error;
pub mod telemetry;
