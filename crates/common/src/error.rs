use thiserror::Error;

#[derive(Debug, Error)]
pub enum VeloError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("upstream server error: {0}")]
    UpstreamServer(String),

    #[error("internal error: {0}")]
    Unknown(String),
}

pub type VeloResult<T> = Result<T, VeloError>;
