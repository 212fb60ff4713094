//! Infrastructure concerns: telemetry bootstrap and infra-level errors.

pub mod error;
pub mod telemetry;
