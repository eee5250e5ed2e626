use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use portal_app::{ApiError, AppError};

/// Error envelope for the JSON routes. Every failure leaves the router
/// as a `{message}` body with an optional `error` detail, the shape the
/// portal front ends already parse.
#[derive(Debug)]
pub struct HttpError(ApiError);

impl HttpError {
    /// Client fault caught before any cloud call is made.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(ApiError {
            status: StatusCode::BAD_REQUEST.as_u16(),
            message: message.into(),
            error: None,
        })
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.0.error = Some(detail.into());
        self
    }
}

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        Self(ApiError::from(err))
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}
