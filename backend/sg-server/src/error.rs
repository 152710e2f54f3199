use sg_auth::AuthError;
use sg_bridge::DownstreamError;
use sg_config::ConfigError;
use sg_store::StoreError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Shadow store error: {0}")]
    Store(#[from] StoreError),

    #[error("Identity setup error: {0}")]
    Auth(#[from] AuthError),

    #[error("Downstream setup error: {0}")]
    Downstream(#[from] DownstreamError),

    #[error("Logger error: {message}")]
    Logger { message: String },

    #[error("Metrics exporter error: {message}")]
    Metrics { message: String },
}

pub type Result<T> = std::result::Result<T, ServerError>;
