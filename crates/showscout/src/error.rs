use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShowScoutError {
    #[error("Search error: {0}")]
    SearchError(#[from] crate::search::SearchError),
    #[error("Filter error: {0}")]
    FilterError(#[from] crate::search::FilterError),
    #[error("Geometry error: {0}")]
    DecodeError(#[from] crate::geometry::DecodeError),
    #[error("Store error: {0}")]
    StoreError(#[from] showscout_store::StoreError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ShowScoutError>;
