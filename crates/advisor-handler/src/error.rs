use thiserror::Error;

/// Failures surfaced to the caller as a status-coded response.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("Current alert data is required")]
    MissingCurrentAlert,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to generate recommendations: {0}")]
    Agent(#[from] advisor_core::Error),
}

impl HandlerError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnsupportedAction(_) | Self::MissingCurrentAlert | Self::InvalidRequest(_) => 400,
            Self::Agent(_) => 500,
        }
    }
}
