use alloy::primitives::{Address, B256, U64};
use jsonrpsee::core::{RpcResult, SubscriptionResult};
use jsonrpsee::proc_macros::rpc;
use serde_json::Value;

/// Mock implementation of the Alchemy enhanced JSON-RPC methods.
#[rpc(server, namespace = "alchemy")]
pub trait AlchemyRpc {
    #[method(name = "getTokenBalances")]
    async fn get_token_balances(
        &self,
        address: Address,
        tokens: Value,
        options: Option<Value>,
    ) -> RpcResult<Value>;

    #[method(name = "getTokenMetadata")]
    async fn get_token_metadata(&self, contract: Address) -> RpcResult<Value>;

    #[method(name = "getAssetTransfers")]
    async fn get_asset_transfers(&self, params: Value) -> RpcResult<Value>;

    #[method(name = "getTransactionReceipts")]
    async fn get_transaction_receipts(&self, params: Value) -> RpcResult<Value>;
}

/// Mock implementation of the `eth_*` methods used by the SDK.
#[rpc(server, namespace = "eth")]
pub trait EthRpc {
    #[method(name = "blockNumber")]
    async fn block_number(&self) -> RpcResult<U64>;

    #[method(name = "sendPrivateTransaction")]
    async fn send_private_transaction(&self, request: Value) -> RpcResult<B256>;

    #[method(name = "cancelPrivateTransaction")]
    async fn cancel_private_transaction(&self, request: Value) -> RpcResult<bool>;

    #[subscription(name = "subscribe" => "subscription", unsubscribe = "unsubscribe", item = Value)]
    async fn subscribe(&self, kind: String, params: Option<Value>) -> SubscriptionResult;
}
