use caver_core::types::TransactionError;
use thiserror::Error;

#[derive(Debug, Error)]
/// An error thrown when making a call to the provider
pub enum ProviderError {
    /// An internal error in the JSON RPC Client
    #[error(transparent)]
    JsonRpcClientError(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// Error in underlying lib `serde_json`
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// The transaction cannot be filled
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Custom error from unknown source
    #[error("custom error: {0}")]
    CustomError(String),
}
