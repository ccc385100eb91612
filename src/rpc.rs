use alloy::primitives::{Address, B256, Bytes, U64};
use alloy::providers::Provider;
use alloy::rpc::json_rpc::{RpcError, RpcRecv};
use futures::Stream;
use serde_json::{Value, json};

use crate::balance::{Erc20Tokens, TokenBalancesQuery, TokenBalancesResponseErc20, TokenMetadataResponse};
use crate::client::AlchemyClient;
use crate::error::Error;
use crate::pagination::pages;
use crate::retry::retry;
use crate::transaction::{
    CancelPrivateTransactionRequest, SendPrivateTransactionOptions, SendPrivateTransactionRequest,
    TransactionReceiptsParams, TransactionReceiptsResponse,
};
use crate::transfers::{
    AssetTransfersParams, AssetTransfersResponse, AssetTransfersWithMetadataParams,
    AssetTransfersWithMetadataResponse, RawAssetTransfersResult,
    RawAssetTransfersWithMetadataResult,
};

/// Error code used by the service for rate limited requests.
const RATE_LIMITED: i64 = 429;

pub(crate) fn map_rpc_error<E: std::fmt::Display>(e: RpcError<E>) -> Error {
    match e {
        RpcError::ErrorResp(err) if err.code == RATE_LIMITED => {
            Error::RateLimited(err.message.to_string())
        }
        RpcError::ErrorResp(err) => Error::RpcErrorResponse {
            code: err.code,
            message: err.message.to_string(),
        },
        RpcError::SerError(err) => Error::RpcRequestError(format!("Serialization error: {err}")),
        RpcError::DeserError { err, text } => {
            log::debug!("Deserialization error: {err}, response text: {text}");
            Error::ResponseDeserializationError(err.to_string())
        }
        _ => Error::RpcRequestError(e.to_string()),
    }
}

impl AlchemyClient {
    /// Makes a JSON-RPC call, retrying transient transport failures.
    pub(crate) async fn rpc_call<R: RpcRecv>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<R, Error> {
        log::debug!("RPC Call - Method: {method}, Params: {params}");
        let provider = &self.provider;
        let params = &params;
        retry(&self.retry, method, move || async move {
            let result: Result<R, _> = provider.client().request(method, params.clone()).await;
            result
                .inspect(|_| log::debug!("RPC Response received for {method}"))
                .map_err(map_rpc_error)
        })
        .await
    }

    /// Gets token balances of `address`.
    ///
    /// The query type selects the token set and the response shape, see
    /// [`TokenBalancesQuery`].
    pub async fn get_token_balances<Q: TokenBalancesQuery>(
        &self,
        address: Address,
        query: &Q,
    ) -> Result<Q::Response, Error> {
        query.validate()?;
        self.rpc_call("alchemy_getTokenBalances", query.rpc_params(address))
            .await
    }

    /// Streams every page of the ERC-20 balance sweep of `address`.
    pub fn token_balances_pages(
        &self,
        address: Address,
    ) -> impl Stream<Item = Result<TokenBalancesResponseErc20, Error>> {
        pages(None, move |page_key| async move {
            let query = Erc20Tokens { page_key };
            self.get_token_balances(address, &query).await
        })
    }

    /// Gets name, symbol, decimals and logo of an ERC-20 contract.
    pub async fn get_token_metadata(&self, contract: Address) -> Result<TokenMetadataResponse, Error> {
        self.rpc_call("alchemy_getTokenMetadata", json!([contract]))
            .await
    }

    /// Gets historical transfers matching `params`.
    pub async fn get_asset_transfers(
        &self,
        params: &AssetTransfersParams,
    ) -> Result<AssetTransfersResponse, Error> {
        params.validate()?;
        let response: AssetTransfersResponse<RawAssetTransfersResult> = self
            .rpc_call("alchemy_getAssetTransfers", json!([params]))
            .await?;
        response.try_convert()
    }

    /// Gets historical transfers matching `params`, each with its block timestamp.
    pub async fn get_asset_transfers_with_metadata(
        &self,
        params: &AssetTransfersWithMetadataParams,
    ) -> Result<AssetTransfersWithMetadataResponse, Error> {
        params.params.validate()?;
        let response: AssetTransfersResponse<RawAssetTransfersWithMetadataResult> = self
            .rpc_call("alchemy_getAssetTransfers", json!([params]))
            .await?;
        response.try_convert()
    }

    /// Streams every page of transfers matching `params`, starting at its page key.
    pub fn asset_transfers_pages(
        &self,
        params: AssetTransfersParams,
    ) -> impl Stream<Item = Result<AssetTransfersResponse, Error>> {
        let first_key = params.page_key.clone();
        pages(first_key, move |page_key| {
            let params = params.clone().with_page_key(page_key);
            async move { self.get_asset_transfers(&params).await }
        })
    }

    /// Gets the receipts of every transaction in a block.
    pub async fn get_transaction_receipts(
        &self,
        params: impl Into<TransactionReceiptsParams>,
    ) -> Result<TransactionReceiptsResponse, Error> {
        let params = params.into();
        let response: Option<TransactionReceiptsResponse> = self
            .rpc_call("alchemy_getTransactionReceipts", json!([params]))
            .await?;
        Ok(response.unwrap_or(TransactionReceiptsResponse { receipts: None }))
    }

    /// Sends a signed transaction to block builders only, keeping it out of the public mempool.
    /// Returns the transaction hash.
    pub async fn send_private_transaction(
        &self,
        signed_tx: Bytes,
        max_block_number: Option<u64>,
        options: Option<SendPrivateTransactionOptions>,
    ) -> Result<B256, Error> {
        let request = SendPrivateTransactionRequest {
            tx: signed_tx,
            max_block_number: max_block_number.map(U64::from),
            preferences: options,
        };
        self.rpc_call("eth_sendPrivateTransaction", json!([request]))
            .await
    }

    /// Stops a private transaction from being submitted to builders.
    /// Returns whether the transaction was cancelled.
    pub async fn cancel_private_transaction(&self, tx_hash: B256) -> Result<bool, Error> {
        let request = CancelPrivateTransactionRequest { tx_hash };
        self.rpc_call("eth_cancelPrivateTransaction", json!([request]))
            .await
    }

    /// Gets the latest block number.
    pub async fn get_block_number(&self) -> Result<u64, Error> {
        let provider = &self.provider;
        retry(&self.retry, "eth_blockNumber", move || async move {
            provider.get_block_number().await.map_err(map_rpc_error)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use alloy::rpc::json_rpc::ErrorPayload;
    use alloy::transports::TransportErrorKind;

    use super::*;

    fn error_response(code: i64, message: &'static str) -> RpcError<TransportErrorKind> {
        RpcError::ErrorResp(ErrorPayload {
            code,
            message: message.into(),
            data: None,
        })
    }

    #[test]
    fn test_rate_limit_detected_by_code() {
        let err = map_rpc_error(error_response(429, "Too Many Requests"));
        assert!(matches!(err, Error::RateLimited(ref msg) if msg == "Too Many Requests"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_error_response_mentioning_429_is_not_retried() {
        let err = map_rpc_error(error_response(-32000, "insufficient funds: balance 429"));
        assert!(matches!(err, Error::RpcErrorResponse { code: -32000, .. }));
        assert!(!err.is_transient());
    }
}
