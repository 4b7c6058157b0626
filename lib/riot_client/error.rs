use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiotClientError {
    #[error("base url `{0}` must contain the {{routing}} placeholder or be a plain url")]
    InvalidBaseUrl(String),
    #[error("`{0}` is not a valid path segment")]
    InvalidSegment(String),
    #[error("{title} does not support {operation}")]
    Unsupported {
        title: &'static str,
        operation: &'static str,
    },
    #[error(transparent)]
    RequestError(#[from] reqwest::Error),
}
