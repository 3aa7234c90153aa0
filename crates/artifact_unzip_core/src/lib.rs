//! Shared artifact-unzip domain primitives.
//!
//! This crate owns the orchestrator event contract, user-parameter resolution,
//! destination key and notification construction, and the job error taxonomy.
//! It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod error;
pub mod notification;
pub mod params;
pub mod storage_keys;
