use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application error taxonomy.
///
/// Every failure a handler can produce is one of these kinds, so callers
/// pattern-match on the variant instead of inspecting message text. The
/// [`IntoResponse`] impl is the single place error bodies are written, which
/// keeps the status code and `{"error": ...}` shape uniform across all
/// endpoints.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request (bad body, unparseable fields).
    BadRequest(String),
    /// Request parsed but failed validation rules.
    Unprocessable(String),
    /// No valid principal on a route that requires one.
    Unauthorized(String),
    /// Principal present but fails a role or ownership check.
    Forbidden(String),
    /// Referenced record does not exist.
    NotFound(String),
    /// State conflict, e.g. a duplicate course application.
    Conflict(String),
    /// Storage-layer failure. Fatal for the request, never retried here.
    Database(anyhow::Error),
    /// Anything unexpected from lower layers.
    Internal(anyhow::Error),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::Unprocessable(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Database(err.into())
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Internal(err.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(msg)
            | Self::Unprocessable(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg) => msg.clone(),
            // Internal details stay in the logs, not in the response body.
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Database(err) | Self::Internal(err) = &self {
            tracing::error!(error = %err, "request failed");
        }

        let body = Json(json!({
            "error": self.message()
        }));

        (self.status(), body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::database(err)
    }
}
