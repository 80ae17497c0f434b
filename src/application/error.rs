use thiserror::Error;

use crate::{
    application::render::RenderConfigError, config::LoadError, domain::error::DomainError,
    infra::error::InfraError,
};

/// Failures surfaced by the `richdoc` binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Render(#[from] RenderConfigError),
    #[error("document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("validation failed: {0}")]
    Validation(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Render(_) => 78,
            AppError::Infra(InfraError::Io(_)) => 74,
            AppError::Infra(InfraError::Telemetry(_)) => 70,
            AppError::Domain(_) | AppError::Json(_) | AppError::Validation(_) => 65,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Infra(InfraError::Io(err))
    }
}
