use thiserror::Error;

use super::format::DocumentFormat;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("document matches neither the block nor the node schema")]
    UnrecognizedFormat,
    #[error("expected a {expected} document, found {found}")]
    UnexpectedFormat {
        expected: DocumentFormat,
        found: DocumentFormat,
    },
}

impl DomainError {
    pub fn unexpected(expected: DocumentFormat, found: DocumentFormat) -> Self {
        Self::UnexpectedFormat { expected, found }
    }
}
