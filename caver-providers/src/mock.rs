use crate::{JsonRpcClient, ProviderError};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{
    borrow::Borrow,
    collections::VecDeque,
    fmt::{self, Debug},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;

/// A JSON-RPC 2.0 error
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Error)]
pub struct JsonRpcError {
    /// The error code
    pub code: i64,
    /// The error message
    pub message: String,
    /// Additional data
    pub data: Option<Value>,
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(code: {}, message: {}, data: {:?})", self.code, self.message, self.data)
    }
}

/// Helper type that can be used to pass through the `params` value.
/// Zero sized params, `()`, are recorded as `Zst`.
#[derive(Debug, PartialEq)]
enum MockParams {
    Value(Value),
    Zst,
}

/// Helper response type for `MockProvider`, allowing custom JSON-RPC errors to be provided.
/// `Value` for successful responses, `Error` for JSON-RPC errors.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Successful response with a `serde_json::Value`.
    Value(Value),

    /// Error response with a `JsonRpcError`.
    Error(JsonRpcError),
}

#[derive(Clone, Debug)]
/// Mock transport used in test environments.
///
/// Responses are served in the order they were pushed, requests are asserted in the order they
/// were made.
pub struct MockProvider {
    requests: Arc<Mutex<VecDeque<(String, MockParams)>>>,
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn to_params<T: Serialize>(params: T) -> Result<MockParams, MockError> {
    Ok(if std::mem::size_of::<T>() == 0 {
        MockParams::Zst
    } else {
        MockParams::Value(serde_json::to_value(params)?)
    })
}

#[async_trait]
impl JsonRpcClient for MockProvider {
    type Error = MockError;

    /// Pushes the `(method, params)` to the back of the `requests` queue,
    /// pops the responses from the front of the `responses` queue
    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, MockError>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned,
    {
        let params = to_params(params)?;
        lock(&self.requests).push_back((method.to_owned(), params));
        let element = lock(&self.responses).pop_front().ok_or(MockError::EmptyResponses)?;
        match element {
            MockResponse::Value(value) => {
                let res: R = serde_json::from_value(value)?;
                Ok(res)
            }
            MockResponse::Error(error) => Err(MockError::JsonRpcError(error)),
        }
    }
}

impl MockProvider {
    /// Checks that the provided request was the oldest one not yet asserted
    pub fn assert_request<T: Serialize + Send + Sync>(
        &self,
        method: &str,
        data: T,
    ) -> Result<(), MockError> {
        let (actual_method, actual) =
            lock(&self.requests).pop_front().ok_or(MockError::EmptyRequests)?;
        let expected = to_params(data)?;
        if actual_method != method || actual != expected {
            return Err(MockError::RequestMismatch {
                expected: format!("{method} {expected:?}"),
                actual: format!("{actual_method} {actual:?}"),
            })
        }
        Ok(())
    }

    /// Instantiates a mock transport
    pub fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(VecDeque::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Pushes the data to the responses
    pub fn push<T: Serialize + Send + Sync, K: Borrow<T>>(&self, data: K) -> Result<(), MockError> {
        let value = serde_json::to_value(data.borrow())?;
        lock(&self.responses).push_back(MockResponse::Value(value));
        Ok(())
    }

    /// Pushes the data or error to the responses
    pub fn push_response(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }
}

#[derive(Error, Debug)]
/// Errors for the `MockProvider`
pub enum MockError {
    /// (De)Serialization error
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// Empty requests array
    #[error("empty requests array, please push some requests")]
    EmptyRequests,

    /// Empty responses array
    #[error("empty responses array, please push some responses")]
    EmptyResponses,

    /// The asserted request is not the one the client sent
    #[error("expected request {expected}, got {actual}")]
    RequestMismatch { expected: String, actual: String },

    /// Custom JsonRpcError
    #[error("JSON-RPC error: {0}")]
    JsonRpcError(JsonRpcError),
}

impl From<MockError> for ProviderError {
    fn from(src: MockError) -> Self {
        ProviderError::JsonRpcClientError(Box::new(src))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caver_core::types::U64;

    #[tokio::test]
    async fn pushes_request_and_response() {
        let mock = MockProvider::new();
        mock.push(U64::from(12)).unwrap();
        let chain_id: U64 = mock.request("klay_chainID", ()).await.unwrap();
        mock.assert_request("klay_chainID", ()).unwrap();
        assert_eq!(chain_id.as_u64(), 12);
    }

    #[tokio::test]
    async fn serves_responses_in_push_order() {
        let mock = MockProvider::new();
        mock.push(U64::from(1)).unwrap();
        mock.push(U64::from(2)).unwrap();
        let first: U64 = mock.request("klay_blockNumber", ()).await.unwrap();
        let second: U64 = mock.request("klay_blockNumber", ()).await.unwrap();
        assert_eq!((first.as_u64(), second.as_u64()), (1, 2));
    }

    #[tokio::test]
    async fn empty_responses() {
        let mock = MockProvider::new();
        // tries to get a response without pushing a response
        let err = mock.request::<_, ()>("klay_blockNumber", ()).await.unwrap_err();
        match err {
            MockError::EmptyResponses => {}
            _ => panic!("expected empty responses"),
        };
    }

    #[tokio::test]
    async fn pushes_error_response() {
        let mock = MockProvider::new();
        let error = JsonRpcError {
            code: 3,
            data: Some(serde_json::from_str(r#""0x556f1830...""#).unwrap()),
            message: "execution reverted".to_string(),
        };
        mock.push_response(MockResponse::Error(error.clone()));

        let result: Result<U64, MockError> = mock.request("klay_blockNumber", ()).await;
        match result {
            Err(MockError::JsonRpcError(e)) => assert_eq!(e, error),
            _ => panic!("Expected JsonRpcError"),
        }
    }

    #[tokio::test]
    async fn empty_requests() {
        let mock = MockProvider::new();
        // tries to assert a request without making one
        let err = mock.assert_request("klay_blockNumber", ()).unwrap_err();
        match err {
            MockError::EmptyRequests => {}
            _ => panic!("expected empty request"),
        };
    }

    #[tokio::test]
    async fn mismatched_request() {
        let mock = MockProvider::new();
        mock.push(U64::from(1)).unwrap();
        let _: U64 = mock.request("klay_getTransactionCount", ("0x01", "latest")).await.unwrap();
        assert!(matches!(
            mock.assert_request("klay_getTransactionCount", ("0x01", "pending")),
            Err(MockError::RequestMismatch { .. })
        ));
    }
}
