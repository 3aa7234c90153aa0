//! AWS-oriented adapters and handlers for the artifact-unzip pipeline stage.
//!
//! This crate owns runtime integration details (the Lambda handler, artifact
//! download, archive extraction, republication and job reporting) and exposes a
//! single runtime module boundary for the contract, parameter and storage key
//! primitives.

pub mod adapters;
pub mod archive;
pub mod fetch;
pub mod handlers;
pub mod multipart;
pub mod runtime;
pub mod settings;
pub mod telemetry;
