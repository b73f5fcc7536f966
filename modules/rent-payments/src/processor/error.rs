use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("API error (status {status_code}): {message}")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Webhook signature verification failed")]
    WebhookVerificationFailed,
}

impl ProcessorError {
    /// Check if the processor reported the object as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProcessorError::ApiError { status_code: 404, .. })
    }
}
