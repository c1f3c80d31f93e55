//! HTTP-facing error type.

use crate::orchestrator::SubmitError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tutor_shared::api::ErrorBody;
use tutor_shared::TaskError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Question must not be empty")]
    InvalidQuestion,

    #[error("{0}")]
    AnswerUnavailable(String),

    #[error("Task not found")]
    NotFound(String),

    #[error("Model {0} not available and could not be downloaded")]
    ModelUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidQuestion => StatusCode::BAD_REQUEST,
            ApiError::AnswerUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ModelUnavailable(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::InvalidQuestion => ApiError::InvalidQuestion,
            SubmitError::AnswerUnavailable(reason) => ApiError::AnswerUnavailable(reason),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound(id) => ApiError::NotFound(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_shared::TaskState;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ApiError::from(TaskError::NotFound("abc".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Task not found");
    }

    #[test]
    fn test_answer_unavailable_maps_to_500() {
        let err = ApiError::from(SubmitError::AnswerUnavailable("timeout".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "timeout");
    }

    #[test]
    fn test_invalid_transition_is_internal() {
        let err = ApiError::from(TaskError::InvalidTransition {
            id: "abc".to_string(),
            from: TaskState::Completed,
            to: TaskState::Failed,
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
