use thiserror::Error;

pub type FunnelResult<T> = Result<T, FunnelError>;

#[derive(Error, Debug)]
pub enum FunnelError {
    #[error("Unknown market: {0}")]
    UnknownMarket(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Unknown funnel stage: {0}")]
    UnknownStage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for FunnelError {
    fn from(err: config::ConfigError) -> Self {
        FunnelError::Config(err.to_string())
    }
}
