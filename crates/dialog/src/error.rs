use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("incomplete {flow} payload: missing `{field}`")]
    MissingField {
        flow: &'static str,
        field: &'static str,
    },

    #[error("invalid {flow} payload: {reason}")]
    InvalidPayload {
        flow: &'static str,
        reason: String,
    },

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
}

pub type Result<T> = std::result::Result<T, Error>;
