use displaydoc::Display;
use thiserror::Error;

/// Maximum number of NFTs the service returns per page.
pub const MAX_NFT_PAGE_SIZE: u32 = 100;

/// Maximum number of contract addresses accepted by owner-scoped NFT queries.
pub const MAX_NFT_CONTRACT_ADDRESSES: usize = 20;

/// Represents errors that can occur when talking to the Alchemy API.
/// Validation variants are returned before any request leaves the client.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// Page size {0} is out of range, expected 1..=100
    InvalidPageSize(u32),
    /// Too many contract addresses: {0} given, at most 20 are allowed
    TooManyContractAddresses(usize),
    /// Invalid transaction receipts params: {0}
    InvalidReceiptsParams(String),
    /// Asset transfers request must name at least one category
    EmptyCategoryList,
    /// Token balances request must name at least one contract address
    EmptyContractList,
    /// Failed to send the RPC request: {0}
    RpcRequestError(String),
    /// RPC service returned error {code}: {message}
    RpcErrorResponse {
        /// JSON-RPC error code.
        code: i64,
        /// Error message, as returned by the service.
        message: String,
    },
    /// Rate limited by the RPC service: {0}
    RateLimited(String),
    /// Failed to send the HTTP request: {0}
    HttpRequestError(String),
    /// HTTP request to {path} failed with status {status}: {body}
    HttpStatusError {
        /// Endpoint path that was requested.
        path: String,
        /// Returned HTTP status code.
        status: u16,
        /// Response body, as returned by the service.
        body: String,
    },
    /// Failed to deserialize the response: {0}
    ResponseDeserializationError(String),
    /// Response violates the documented contract: {0}
    InconsistentResponse(String),
    /// Invalid URL: {0}
    InvalidUrl(String),
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

impl Error {
    /// Tells whether the error is worth retrying without changing the request.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::HttpStatusError { status, .. } => *status == 429 || *status >= 500,
            Error::RateLimited(_) => true,
            // Transport failures only. Error responses of the service never land here.
            Error::RpcRequestError(msg) | Error::HttpRequestError(msg) => {
                msg.contains("error sending request")
            }
            _ => false,
        }
    }
}

/// Checks a requested NFT page size against the service limit.
pub(crate) fn validate_page_size(page_size: Option<u32>) -> Result<(), Error> {
    match page_size {
        Some(size) if size == 0 || size > MAX_NFT_PAGE_SIZE => Err(Error::InvalidPageSize(size)),
        _ => Ok(()),
    }
}
