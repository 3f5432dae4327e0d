use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::{Category, ErrorResponse};
use crate::services::JudgeError;

/// Client faults in a match request. No judge call is made when one is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{}' is present but '{}' is missing", .category.requested_key(), .category.list_key())]
    MissingCandidates { category: Category },

    #[error("'{}' is present but '{}' is missing", .category.list_key(), .category.requested_key())]
    MissingRequested { category: Category },

    #[error("'{}' must not be empty", .category.requested_key())]
    EmptyRequested { category: Category },

    #[error("'{}' must contain at least one candidate", .category.list_key())]
    EmptyCandidates { category: Category },

    #[error("'{}' entry {index} is empty", .category.list_key())]
    BlankCandidate { category: Category, index: usize },

    #[error("unknown category field '{key}'")]
    UnknownCategory { key: String },

    #[error("request must contain at least one category pair (e.g. 'cell_type_requested' with 'cell_type_list')")]
    NoCategories,
}

impl ValidationError {
    /// Category the error refers to, if it concerns one of the known categories
    pub fn category(&self) -> Option<Category> {
        match self {
            ValidationError::MissingCandidates { category }
            | ValidationError::MissingRequested { category }
            | ValidationError::EmptyRequested { category }
            | ValidationError::EmptyCandidates { category }
            | ValidationError::BlankCandidate { category, .. } => Some(*category),
            ValidationError::UnknownCategory { .. } | ValidationError::NoCategories => None,
        }
    }
}

/// Request-level failure of the matching pipeline
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("judge could not evaluate any {category} chunk in round {round}: {source}")]
    JudgeExhausted {
        category: Category,
        round: usize,
        #[source]
        source: JudgeError,
    },
}

impl MatchError {
    pub fn category(&self) -> Option<Category> {
        match self {
            MatchError::Validation(e) => e.category(),
            MatchError::JudgeExhausted { category, .. } => Some(*category),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            MatchError::Validation(_) => "validation_failed",
            MatchError::JudgeExhausted { .. } => "judge_unavailable",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: self.status_code().as_u16(),
            category: self.category(),
        }
    }
}

impl ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::Validation(_) => StatusCode::BAD_REQUEST,
            MatchError::JudgeExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_error_response())
    }
}

/// Startup-time misconfiguration; the service refuses to start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("tournament chunk size must be at least {min}, got {size}")]
    ChunkSizeTooSmall { size: usize, min: usize },

    #[error("judge call attempts must be at least 1")]
    ZeroAttempts,

    #[error("tournament round limit must be at least 1")]
    ZeroRounds,

    #[error("no prompt template registered for category '{0}'")]
    MissingTemplate(Category),
}
