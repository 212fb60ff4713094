use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("telemetry error: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
