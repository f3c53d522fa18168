use thiserror::Error;

#[derive(Error, Debug)]
pub enum StitchError {
    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error("Stream creation failed with status {0}")]
    StreamCreationError(reqwest::StatusCode),

    #[error("Stream manifest not found in stream response")]
    MissingManifest,

    #[error("Media verification URL not found in stream response")]
    MissingVerificationUrl,

    #[error("Metadata URL not found in stream response")]
    MissingMetadataUrl,

    #[error("Invalid clickthrough url: {0}")]
    InvalidClickthrough(String),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

pub type StitchResult<T> = Result<T, StitchError>;
