use portal_cloud::CloudError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Cloud(#[from] CloudError),
    #[error("{message}: {detail}")]
    Operation { message: String, detail: String },
    #[error("{0}")]
    InvalidInput(String),
}

impl AppError {
    /// Wraps an upstream failure with the message the route reports,
    /// keeping the underlying cause as the detail.
    pub fn operation(message: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Operation {
            message: message.into(),
            detail: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidInput(message) => Self {
                status: 400,
                message,
                error: None,
            },
            AppError::Operation { message, detail } => Self {
                status: 500,
                message,
                error: Some(detail),
            },
            AppError::Cloud(err) => Self {
                status: 500,
                message: err.to_string(),
                error: None,
            },
        }
    }
}
