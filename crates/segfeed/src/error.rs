use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegfeedError {
    /// Non-success status on a segment request, carrying the status text.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Error reported by the muxer while consuming a payload.
    #[error("Muxer internal error: {0}")]
    MuxerInternal(String),

    #[error("Feeder is already streaming")]
    AlreadyStreaming,

    #[error("Feeder has not constructed its muxer yet")]
    NotStarted,

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid video type: {0}")]
    InvalidVideoType(String),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    TomlError(#[from] toml::de::Error),
}

impl SegfeedError {
    pub fn is_muxer_internal(&self) -> bool {
        matches!(self, Self::MuxerInternal(_))
    }
}

pub type SegfeedResult<T> = Result<T, SegfeedError>;
