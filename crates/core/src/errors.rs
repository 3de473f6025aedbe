use thiserror::Error;

#[derive(Error, Debug)]
pub enum SewaError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Limit reached: {0}")]
    Capacity(String),

    #[error("Remote write failed: {0}")]
    RemoteWrite(eyre::Report),

    /// A multi-step write stopped after `completed` reached the remote store.
    #[error("Partially saved: {completed}; {pending} failed: {failed}")]
    PartialWrite {
        completed: String,
        pending: String,
        failed: eyre::Report,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl SewaError {
    /// Short, user-facing text. Remote failures are reported generically.
    pub fn user_message(&self) -> String {
        match self {
            SewaError::RemoteWrite(_) => {
                "Could not save the change. Please check the connection and try again.".to_string()
            }
            SewaError::PartialWrite {
                completed, pending, ..
            } => format!(
                "{}, but {} could not be saved. Please check the connection and try again.",
                completed, pending
            ),
            SewaError::Internal(_) => "Something went wrong.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type SewaResult<T> = Result<T, SewaError>;
