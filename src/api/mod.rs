use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};

use crate::domain::enrollment::EnrollmentError;
use crate::event_sourcing::store::EventStoreError;

pub mod enrollments;
pub mod students;

// ============================================================================
// HTTP API
// ============================================================================
//
// Commands are answered once the events are appended. Queries read the
// projection, so a freshly created enrollment may briefly read as null.
//
// ============================================================================

/// Mount enrollment and student routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(enrollments::configure)
        .configure(students::configure);
}

/// Command failure surfaced to the HTTP caller
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<EnrollmentError>() {
            return match err {
                e if e.is_validation() => StatusCode::BAD_REQUEST,
                EnrollmentError::NotFound(_) => StatusCode::NOT_FOUND,
                EnrollmentError::AlreadyExists(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }

        match self.0.downcast_ref::<EventStoreError>() {
            Some(EventStoreError::ConcurrencyConflict { .. }) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.0.to_string(),
        }))
    }
}
