use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use alchemy_sdk::events::AlchemyPendingTransactionsEventFilter;
use alchemy_sdk::{AlchemySettings, RetryConfig};
use alloy::primitives::{Address, B256, Bytes, U64, U256, keccak256};
use jsonrpsee::core::traits::IdProvider;
use jsonrpsee::core::{RpcResult, SubscriptionResult, async_trait};
use jsonrpsee::server::{RpcModule, Server, ServerHandle};
use jsonrpsee::{PendingSubscriptionSink, SubscriptionMessage};
use jsonrpsee::types::{ErrorObjectOwned, SubscriptionId};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use url::Url;
use warp::Filter;
use warp::http::StatusCode;

use crate::api::{AlchemyRpcServer, EthRpcServer};
use crate::fixtures::{self, NftFixture};

/// API key accepted by the mock.
pub const MOCK_API_KEY: &str = "mock-key";

const INVALID_PARAMS: i32 = -32602;

fn invalid_params(message: impl Into<String>) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(INVALID_PARAMS, message.into(), None::<()>)
}

fn parse_hex(hex: &str) -> Result<u64, ErrorObjectOwned> {
    u64::from_str_radix(hex.trim_start_matches("0x"), 16)
        .map_err(|e| invalid_params(format!("invalid quantity {hex}: {e}")))
}

/// Block number of a block parameter. Tags other than `earliest` resolve to the latest block.
fn parse_block(value: Option<&Value>, default: u64) -> Result<u64, ErrorObjectOwned> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.as_str() {
        Some("earliest") => Ok(0),
        Some(hex) if hex.starts_with("0x") => parse_hex(hex),
        _ => Ok(fixtures::LATEST_BLOCK),
    }
}

/// Failure injection and request accounting, shared by both servers.
#[derive(Default)]
pub struct MockController {
    fail_rest: AtomicU32,
    fail_rpc: AtomicU32,
    rest_requests: AtomicU64,
    rpc_requests: AtomicU64,
}

impl MockController {
    /// Makes the next `count` NFT API requests fail with HTTP 429.
    pub fn fail_next_rest_requests(&self, count: u32) {
        self.fail_rest.store(count, Ordering::SeqCst);
    }

    /// Makes the next `count` JSON-RPC requests fail with a rate limit error.
    pub fn fail_next_rpc_requests(&self, count: u32) {
        self.fail_rpc.store(count, Ordering::SeqCst);
    }

    /// Number of NFT API requests received so far.
    pub fn rest_requests(&self) -> u64 {
        self.rest_requests.load(Ordering::SeqCst)
    }

    /// Number of JSON-RPC requests received so far, subscriptions excluded.
    pub fn rpc_requests(&self) -> u64 {
        self.rpc_requests.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn on_rpc(&self) -> RpcResult<()> {
        self.rpc_requests.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_rpc) {
            return Err(ErrorObjectOwned::owned(
                429,
                "Too Many Requests",
                None::<()>,
            ));
        }
        Ok(())
    }

    fn on_rest(&self) -> bool {
        self.rest_requests.fetch_add(1, Ordering::SeqCst);
        Self::take_failure(&self.fail_rest)
    }
}

#[derive(Default)]
struct MockData {
    refresh_calls: HashMap<Address, u64>,
    private_transactions: HashMap<B256, Bytes>,
}

/// Mock state for both the JSON-RPC and REST servers.
#[derive(Clone)]
pub struct AlchemyMock {
    nfts: Arc<Vec<NftFixture>>,
    data: Arc<RwLock<MockData>>,
    controller: Arc<MockController>,
}

impl Default for AlchemyMock {
    fn default() -> Self {
        Self {
            nfts: Arc::new(fixtures::nfts()),
            data: Arc::default(),
            controller: Arc::default(),
        }
    }
}

impl AlchemyMock {
    fn get_nfts(&self, query: &[(String, String)]) -> Result<Value, (StatusCode, String)> {
        let param = |key: &str| query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        let params = |key: &str| -> Vec<&str> {
            query
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .collect()
        };
        let bad_request = |message: String| (StatusCode::BAD_REQUEST, message);

        let owner = param("owner")
            .ok_or_else(|| bad_request("owner is required".to_string()))
            .and_then(|o| Address::from_str(o).map_err(|e| bad_request(e.to_string())))?;
        let contracts = params("contractAddresses[]")
            .into_iter()
            .map(Address::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| bad_request(e.to_string()))?;
        if contracts.len() > 20 {
            return Err(bad_request("at most 20 contract addresses".to_string()));
        }
        let exclude_spam = params("excludeFilters[]").contains(&"SPAM");
        let page_size: usize = param("pageSize")
            .map(str::parse::<usize>)
            .transpose()
            .map_err(|e| bad_request(format!("invalid pageSize: {e}")))?
            .unwrap_or(100);
        if page_size == 0 || page_size > 100 {
            return Err(bad_request(format!("pageSize {page_size} out of range")));
        }
        let offset: usize = param("pageKey")
            .map(str::parse::<usize>)
            .transpose()
            .map_err(|e| bad_request(format!("invalid pageKey: {e}")))?
            .unwrap_or(0);
        let with_metadata = param("withMetadata") != Some("false");

        let owned: Vec<&NftFixture> = self
            .nfts
            .iter()
            .filter(|nft| nft.owner == owner)
            .filter(|nft| contracts.is_empty() || contracts.contains(&nft.contract))
            .filter(|nft| !(exclude_spam && nft.spam))
            .collect();
        let end = (offset + page_size).min(owned.len());
        let page: Vec<Value> = owned
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .map(|nft| nft.to_json(with_metadata, true))
            .collect();

        let mut response = json!({ "ownedNfts": page, "totalCount": owned.len() });
        if end < owned.len() {
            response["pageKey"] = json!(end.to_string());
        }
        Ok(response)
    }

    fn get_nfts_for_collection(&self, query: &[(String, String)]) -> Result<Value, (StatusCode, String)> {
        let param = |key: &str| query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        let bad_request = |message: String| (StatusCode::BAD_REQUEST, message);

        let contract = param("contractAddress")
            .ok_or_else(|| bad_request("contractAddress is required".to_string()))
            .and_then(|c| Address::from_str(c).map_err(|e| bad_request(e.to_string())))?;
        let start = param("startToken")
            .map(U256::from_str)
            .transpose()
            .map_err(|e| bad_request(format!("invalid startToken: {e}")))?
            .unwrap_or_default();
        let limit: usize = param("limit")
            .map(str::parse::<usize>)
            .transpose()
            .map_err(|e| bad_request(format!("invalid limit: {e}")))?
            .unwrap_or(100);
        let with_metadata = param("withMetadata") != Some("false");

        let mut tokens: Vec<&NftFixture> = self
            .nfts
            .iter()
            .filter(|nft| nft.contract == contract && nft.token_id >= start)
            .collect();
        tokens.sort_by_key(|nft| nft.token_id);

        let page: Vec<Value> = tokens
            .iter()
            .take(limit)
            .map(|nft| nft.to_json(with_metadata, false))
            .collect();
        let mut response = json!({ "nfts": page });
        if let Some(next) = tokens.get(limit) {
            response["nextToken"] = json!(format!("0x{:064x}", next.token_id));
        }
        Ok(response)
    }

    fn get_nft_metadata(&self, query: &[(String, String)]) -> Result<Value, (StatusCode, String)> {
        let param = |key: &str| query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        let bad_request = |message: String| (StatusCode::BAD_REQUEST, message);

        let contract = param("contractAddress")
            .and_then(|c| Address::from_str(c).ok())
            .ok_or_else(|| bad_request("contractAddress is required".to_string()))?;
        let token_id = param("tokenId")
            .and_then(|t| U256::from_str(t).ok())
            .ok_or_else(|| bad_request("tokenId is required".to_string()))?;

        match self
            .nfts
            .iter()
            .find(|nft| nft.contract == contract && nft.token_id == token_id)
        {
            Some(nft) => Ok(nft.to_json(true, false)),
            None => Ok(json!({
                "contract": { "address": contract },
                "id": { "tokenId": format!("0x{token_id:064x}") },
                "error": "Token does not exist"
            })),
        }
    }

    async fn reingest_contract(&self, query: &[(String, String)]) -> Result<Value, (StatusCode, String)> {
        let contract = query
            .iter()
            .find(|(k, _)| k == "contractAddress")
            .and_then(|(_, c)| Address::from_str(c).ok())
            .ok_or_else(|| (StatusCode::BAD_REQUEST, "contractAddress is required".to_string()))?;

        let call = {
            let mut data = self.data.write().await;
            let calls = data.refresh_calls.entry(contract).or_default();
            *calls += 1;
            *calls - 1
        };
        let (state, progress) = fixtures::refresh_state(contract, call);
        Ok(json!({
            "contractAddress": contract,
            "reingestionState": state,
            "progress": progress
        }))
    }

    async fn handle_rest(&self, method: &str, query: Vec<(String, String)>) -> (StatusCode, Value) {
        if self.controller.on_rest() {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": { "message": "Too Many Requests" } }),
            );
        }
        log::debug!("Mock REST {method} {query:?}");

        let contract = || {
            query
                .iter()
                .find(|(k, _)| k == "contractAddress")
                .and_then(|(_, c)| Address::from_str(c).ok())
                .ok_or_else(|| (StatusCode::BAD_REQUEST, "contractAddress is required".to_string()))
        };
        let result = match method {
            "getNFTs" => self.get_nfts(&query),
            "getNFTsForCollection" => self.get_nfts_for_collection(&query),
            "getNFTMetadata" => self.get_nft_metadata(&query),
            "getContractMetadata" => contract().and_then(|c| {
                fixtures::contract_metadata(c)
                    .ok_or_else(|| (StatusCode::NOT_FOUND, format!("contract {c} not found")))
            }),
            "getFloorPrice" => contract().map(fixtures::floor_price),
            "reingestContract" => self.reingest_contract(&query).await,
            other => Err((StatusCode::NOT_FOUND, format!("unknown method {other}"))),
        };
        match result {
            Ok(body) => (StatusCode::OK, body),
            Err((status, message)) => (status, json!({ "error": { "message": message } })),
        }
    }

    fn transfers(&self, params: &Value) -> RpcResult<Value> {
        let categories: Vec<&str> = params["category"]
            .as_array()
            .map(|c| c.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        if categories.is_empty() {
            return Err(invalid_params("category is required"));
        }
        let address = |key: &str| -> RpcResult<Option<Address>> {
            params
                .get(key)
                .and_then(Value::as_str)
                .map(|a| Address::from_str(a).map_err(|e| invalid_params(e.to_string())))
                .transpose()
        };
        let from_address = address("fromAddress")?;
        let to_address = address("toAddress")?;
        let from_block = parse_block(params.get("fromBlock"), 0)?;
        let to_block = parse_block(params.get("toBlock"), fixtures::LATEST_BLOCK)?;
        let max_count = match params.get("maxCount").and_then(Value::as_str) {
            Some(hex) => parse_hex(hex)?,
            None => 1000,
        };
        let max_count = usize::try_from(max_count).unwrap_or(usize::MAX);
        let offset: usize = params
            .get("pageKey")
            .and_then(Value::as_str)
            .map(str::parse::<usize>)
            .transpose()
            .map_err(|e| invalid_params(format!("invalid pageKey: {e}")))?
            .unwrap_or(0);
        let with_metadata = params.get("withMetadata").and_then(Value::as_bool) == Some(true);
        let descending = params.get("order").and_then(Value::as_str) == Some("desc");

        let matches_address = |transfer: &Value, key: &str, filter: Option<Address>| {
            filter.is_none_or(|a| transfer[key].as_str().and_then(|s| Address::from_str(s).ok()) == Some(a))
        };
        let mut matching: Vec<Value> = fixtures::transfers()
            .into_iter()
            .filter(|t| {
                t["category"]
                    .as_str()
                    .is_some_and(|c| categories.contains(&c))
            })
            .filter(|t| matches_address(t, "from", from_address))
            .filter(|t| matches_address(t, "to", to_address))
            .filter(|t| {
                let block = parse_block(Some(&t["blockNum"]), 0).unwrap_or_default();
                (from_block..=to_block).contains(&block)
            })
            .collect();
        if descending {
            matching.reverse();
        }

        let end = offset.saturating_add(max_count).min(matching.len());
        let page: Vec<Value> = matching
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .cloned()
            .map(|mut transfer| {
                if !with_metadata {
                    if let Some(object) = transfer.as_object_mut() {
                        object.remove("metadata");
                    }
                }
                transfer
            })
            .collect();

        let mut response = json!({ "transfers": page });
        if end < matching.len() {
            response["pageKey"] = json!(end.to_string());
        }
        Ok(response)
    }
}

#[async_trait]
impl AlchemyRpcServer for AlchemyMock {
    async fn get_token_balances(
        &self,
        address: Address,
        tokens: Value,
        options: Option<Value>,
    ) -> RpcResult<Value> {
        self.controller.on_rpc()?;
        let held: Vec<Address> = if address == fixtures::TOKEN_HOLDER {
            (0..fixtures::ERC20_TOKEN_COUNT).map(fixtures::erc20_token).collect()
        } else {
            vec![]
        };

        let mut response = json!({ "address": address });
        match tokens {
            Value::String(kind) if kind == "DEFAULT_TOKENS" => {
                let mut defaults: Vec<Value> =
                    held.iter().take(2).map(|c| fixtures::token_balance(*c)).collect();
                defaults.push(fixtures::token_balance(fixtures::BROKEN_TOKEN));
                response["tokenBalances"] = json!(defaults);
            }
            Value::String(kind) if kind == "erc20" => {
                let offset: usize = options
                    .as_ref()
                    .and_then(|o| o.get("pageKey"))
                    .and_then(Value::as_str)
                    .map(str::parse::<usize>)
                    .transpose()
                    .map_err(|e| invalid_params(format!("invalid pageKey: {e}")))?
                    .unwrap_or(0);
                let end = (offset + fixtures::ERC20_PAGE_SIZE).min(held.len());
                let page: Vec<Value> = held
                    .get(offset..end)
                    .unwrap_or_default()
                    .iter()
                    .map(|c| fixtures::token_balance(*c))
                    .collect();
                response["tokenBalances"] = json!(page);
                if end < held.len() {
                    response["pageKey"] = json!(end.to_string());
                }
            }
            Value::Array(contracts) => {
                let contracts: Vec<Address> = serde_json::from_value(Value::Array(contracts))
                    .map_err(|e| invalid_params(e.to_string()))?;
                if contracts.is_empty() {
                    return Err(invalid_params("contract list must not be empty"));
                }
                let balances: Vec<Value> = contracts
                    .iter()
                    .map(|c| {
                        if held.contains(c) {
                            fixtures::token_balance(*c)
                        } else {
                            json!({ "contractAddress": c, "tokenBalance": null, "error": "contract not held" })
                        }
                    })
                    .collect();
                response["tokenBalances"] = json!(balances);
            }
            other => return Err(invalid_params(format!("invalid token spec {other}"))),
        }
        Ok(response)
    }

    async fn get_token_metadata(&self, contract: Address) -> RpcResult<Value> {
        self.controller.on_rpc()?;
        Ok(fixtures::token_metadata(contract))
    }

    async fn get_asset_transfers(&self, params: Value) -> RpcResult<Value> {
        self.controller.on_rpc()?;
        self.transfers(&params)
    }

    async fn get_transaction_receipts(&self, params: Value) -> RpcResult<Value> {
        self.controller.on_rpc()?;
        let block = match (params.get("blockNumber"), params.get("blockHash")) {
            (Some(number), None) => parse_block(Some(number), fixtures::LATEST_BLOCK)?,
            (None, Some(hash)) => {
                let hash: B256 = serde_json::from_value(hash.clone())
                    .map_err(|e| invalid_params(e.to_string()))?;
                (0..=fixtures::LATEST_BLOCK + 10)
                    .find(|n| fixtures::block_hash(*n) == hash)
                    .unwrap_or(u64::MAX)
            }
            _ => return Err(invalid_params("exactly one of blockNumber or blockHash")),
        };
        Ok(json!({ "receipts": fixtures::receipts(block) }))
    }
}

#[async_trait]
impl EthRpcServer for AlchemyMock {
    async fn block_number(&self) -> RpcResult<U64> {
        self.controller.on_rpc()?;
        Ok(U64::from(fixtures::LATEST_BLOCK))
    }

    async fn send_private_transaction(&self, request: Value) -> RpcResult<B256> {
        self.controller.on_rpc()?;
        let tx: Bytes = serde_json::from_value(request["tx"].clone())
            .map_err(|e| invalid_params(format!("invalid tx: {e}")))?;
        if tx.is_empty() {
            return Err(invalid_params("empty transaction"));
        }
        let hash = keccak256(&tx);
        self.data.write().await.private_transactions.insert(hash, tx);
        Ok(hash)
    }

    async fn cancel_private_transaction(&self, request: Value) -> RpcResult<bool> {
        self.controller.on_rpc()?;
        let hash: B256 = serde_json::from_value(request["txHash"].clone())
            .map_err(|e| invalid_params(format!("invalid txHash: {e}")))?;
        Ok(self
            .data
            .write()
            .await
            .private_transactions
            .remove(&hash)
            .is_some())
    }

    async fn subscribe(
        &self,
        pending: PendingSubscriptionSink,
        kind: String,
        params: Option<Value>,
    ) -> SubscriptionResult {
        if kind != "alchemy_pendingTransactions" {
            pending
                .reject(invalid_params(format!("unsupported subscription {kind}")))
                .await;
            return Ok(());
        }

        let mut options = params.unwrap_or_else(|| json!({}));
        options["method"] = json!(kind);
        let filter: AlchemyPendingTransactionsEventFilter = match serde_json::from_value(options) {
            Ok(filter) => filter,
            Err(e) => {
                pending.reject(invalid_params(e.to_string())).await;
                return Ok(());
            }
        };

        let sink = pending.accept().await?;
        log::debug!("Mock subscription {:?} with {filter:?}", sink.subscription_id());
        // Give the client time to register the subscription id.
        tokio::time::sleep(Duration::from_millis(50)).await;

        for tx in fixtures::pending_transactions() {
            if !filter.matches(tx.from, Some(tx.to)) {
                continue;
            }
            let item = if filter.hashes_only == Some(true) {
                json!(tx.hash)
            } else {
                tx.to_json()
            };
            sink.send(SubscriptionMessage::from_json(&item)?).await?;
        }
        sink.closed().await;
        Ok(())
    }
}

/// Subscription ids in the hex form Ethereum clients expect.
#[derive(Debug, Default)]
struct HexIdProvider(AtomicU64);

impl IdProvider for HexIdProvider {
    fn next_id(&self) -> SubscriptionId<'static> {
        let id = self.0.fetch_add(1, Ordering::Relaxed) + 1;
        SubscriptionId::Str(format!("0x{id:032x}").into())
    }
}

/// In-process mock of the Alchemy API.
///
/// JSON-RPC (HTTP and WebSocket) is served by `jsonrpsee`, the NFT API by `warp`.
/// Both listen on ephemeral local ports and stop when the server is dropped.
pub struct AlchemyMockServer {
    state: AlchemyMock,
    rpc_addr: SocketAddr,
    rest_addr: SocketAddr,
    rpc_handle: ServerHandle,
    rest_task: JoinHandle<()>,
}

impl AlchemyMockServer {
    /// Starts both servers.
    pub async fn start() -> anyhow::Result<Self> {
        let state = AlchemyMock::default();

        let mut module = RpcModule::new(());
        module.merge(AlchemyRpcServer::into_rpc(state.clone()))?;
        module.merge(EthRpcServer::into_rpc(state.clone()))?;

        let server = Server::builder()
            .set_id_provider(HexIdProvider::default())
            .build(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await?;
        let rpc_addr = server.local_addr()?;
        let rpc_handle = server.start(module);
        log::info!("Alchemy mock JSON-RPC server listening on {rpc_addr}");

        let rest_state = state.clone();
        let routes = warp::get()
            .and(warp::path!("nft" / "v2" / String / String))
            .and(warp::query::<Vec<(String, String)>>())
            .then(move |_api_key: String, method: String, query: Vec<(String, String)>| {
                let state = rest_state.clone();
                async move {
                    let (status, body) = state.handle_rest(&method, query).await;
                    warp::reply::with_status(warp::reply::json(&body), status)
                }
            });
        let (rest_addr, rest_server) =
            warp::serve(routes).try_bind_ephemeral(SocketAddr::from(([127, 0, 0, 1], 0)))?;
        let rest_task = tokio::spawn(rest_server);
        log::info!("Alchemy mock NFT API listening on {rest_addr}");

        Ok(Self {
            state,
            rpc_addr,
            rest_addr,
            rpc_handle,
            rest_task,
        })
    }

    pub fn controller(&self) -> &MockController {
        &self.state.controller
    }

    pub fn rpc_url(&self) -> anyhow::Result<Url> {
        Ok(Url::parse(&format!("http://{}", self.rpc_addr))?)
    }

    pub fn ws_url(&self) -> anyhow::Result<Url> {
        Ok(Url::parse(&format!("ws://{}", self.rpc_addr))?)
    }

    pub fn nft_url(&self) -> anyhow::Result<Url> {
        Ok(Url::parse(&format!(
            "http://{}/nft/v2/{MOCK_API_KEY}",
            self.rest_addr
        ))?)
    }

    /// Client settings pointing at this server, with fast retries.
    pub fn settings(&self) -> anyhow::Result<AlchemySettings> {
        Ok(AlchemySettings::builder()
            .api_key(MOCK_API_KEY)
            .url(self.rpc_url()?)
            .nft_url(self.nft_url()?)
            .retry(RetryConfig {
                max_retries: 3,
                retry_delay_ms: 10,
            })
            .build())
    }
}

impl Drop for AlchemyMockServer {
    fn drop(&mut self) {
        self.rest_task.abort();
        let _ = self.rpc_handle.stop();
    }
}
