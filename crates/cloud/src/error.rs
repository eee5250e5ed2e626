use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{service} failed with status {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("no cost data available")]
    NoCostData,
}

impl CloudError {
    pub(crate) fn status(
        service: &'static str,
        status: reqwest::StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self::Status {
            service,
            status: status.as_u16(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
