use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The agent targeted a user who has no active handoff.
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Dialog(#[from] confab_dialog::Error),

    #[error(transparent)]
    Viber(#[from] confab_viber::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
