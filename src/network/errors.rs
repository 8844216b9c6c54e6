use thiserror::Error;

use crate::network::signer::SignatureError;

// * Unified Error type for the Network Layer.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Signature generation failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("HTTP {0} Forbidden/Blocked")]
    Blocked(u16),

    #[error("Data fetch rejected: {0}")]
    DataFetch(String),

    #[error("Header value not sendable: {0}")]
    InvalidHeader(String),

    #[error("Query encoding failed: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
}
