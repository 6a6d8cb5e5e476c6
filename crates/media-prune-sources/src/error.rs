use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {status} for {url}")]
    Status {
        service: &'static str,
        status: StatusCode,
        url: String,
    },

    #[error("Failed to parse {service} response: {message}")]
    Parse { service: &'static str, message: String },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Unknown service '{0}'")]
    UnknownSource(String),
}

impl SourceError {
    pub fn parse(service: &'static str, message: impl Into<String>) -> Self {
        SourceError::Parse {
            service,
            message: message.into(),
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            SourceError::Http { service, .. }
            | SourceError::Status { service, .. }
            | SourceError::Parse { service, .. }
            | SourceError::NotConfigured(service) => *service,
            SourceError::UnknownSource(_) => "unknown",
        }
    }
}
