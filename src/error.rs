/// Errors surfaced by the chatbot and its context services.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("unknown message role \"{0}\"")]
    UnknownRole(String),

    #[error("url \"{0}\" is outside the allowed domains")]
    DomainNotAllowed(String),

    #[error("external service error: {0}")]
    ExternalService(#[source] anyhow::Error),
}

impl Error {
    pub fn external(err: impl Into<anyhow::Error>) -> Self {
        Self::ExternalService(err.into())
    }

    pub fn missing_credential(service: &str, field: &str) -> Self {
        Self::Configuration(format!(
            "{service} requires the \"{field}\" credential field"
        ))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
