// In crates/events/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the webhook client: {0}")]
    ClientBuildError(String),
    #[error("Webhook request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Webhook answered HTTP {status}")]
    HttpStatus { status: u16 },
}

pub type Result<T> = std::result::Result<T, Error>;
