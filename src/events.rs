use alloy::consensus::Transaction as _;
use alloy::network::TransactionResponse;
use alloy::primitives::{Address, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::Transaction;
use alloy::transports::http::reqwest::Url;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::pin::Pin;

/// Subscription type accepted by `eth_subscribe` for pending transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlchemySubscription {
    #[default]
    #[serde(rename = "alchemy_pendingTransactions")]
    PendingTransactions,
}

/// One address or a list of addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressFilter {
    One(Address),
    Many(Vec<Address>),
}

impl AddressFilter {
    /// Flattens the filter into a list.
    pub fn addresses(&self) -> Vec<Address> {
        match self {
            AddressFilter::One(address) => vec![*address],
            AddressFilter::Many(addresses) => addresses.clone(),
        }
    }
}

impl From<Address> for AddressFilter {
    fn from(address: Address) -> Self {
        AddressFilter::One(address)
    }
}

impl From<Vec<Address>> for AddressFilter {
    fn from(addresses: Vec<Address>) -> Self {
        AddressFilter::Many(addresses)
    }
}

/// Filter of the `alchemy_pendingTransactions` subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlchemyPendingTransactionsEventFilter {
    pub method: AlchemySubscription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address: Option<AddressFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_address: Option<AddressFilter>,
    /// Ask for transaction hashes instead of full transactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes_only: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    from_address: Option<&'a AddressFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_address: Option<&'a AddressFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hashes_only: Option<bool>,
}

impl AlchemyPendingTransactionsEventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_address(mut self, filter: impl Into<AddressFilter>) -> Self {
        self.from_address = Some(filter.into());
        self
    }

    pub fn to_address(mut self, filter: impl Into<AddressFilter>) -> Self {
        self.to_address = Some(filter.into());
        self
    }

    pub fn hashes_only(mut self, hashes_only: bool) -> Self {
        self.hashes_only = Some(hashes_only);
        self
    }

    /// Returns whether a transaction between `from` and `to` passes the filter.
    ///
    /// An empty filter matches everything. With both sides set, either side matching is enough.
    pub fn matches(&self, from: Address, to: Option<Address>) -> bool {
        let from_list = self
            .from_address
            .as_ref()
            .map(AddressFilter::addresses)
            .unwrap_or_default();
        let to_list = self
            .to_address
            .as_ref()
            .map(AddressFilter::addresses)
            .unwrap_or_default();
        let from_matches = from_list.contains(&from);
        let to_matches = to.is_some_and(|to| to_list.contains(&to));

        match (from_list.is_empty(), to_list.is_empty()) {
            (true, true) => true,
            (false, true) => from_matches,
            (true, false) => to_matches,
            (false, false) => from_matches || to_matches,
        }
    }

    /// Positional `eth_subscribe` params.
    pub fn subscription_params(&self) -> Value {
        json!([
            self.method,
            SubscriptionOptions {
                from_address: self.from_address.as_ref(),
                to_address: self.to_address.as_ref(),
                hashes_only: self.hashes_only,
            }
        ])
    }
}

/// Item of the pending transaction stream.
/// The service sends bare hashes when `hashesOnly` is set and full transactions otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PendingTransaction {
    Hash(B256),
    Full(Box<Transaction>),
}

impl PendingTransaction {
    pub fn hash(&self) -> B256 {
        match self {
            PendingTransaction::Hash(hash) => *hash,
            PendingTransaction::Full(tx) => tx.tx_hash(),
        }
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            PendingTransaction::Hash(_) => None,
            PendingTransaction::Full(tx) => Some(tx),
        }
    }

    /// Sender and recipient, known only for full transactions.
    pub fn endpoints(&self) -> Option<(Address, Option<Address>)> {
        self.transaction()
            .map(|tx| (TransactionResponse::from(tx), tx.to()))
    }
}

/// Client for streaming subscriptions over a WebSocket connection.
pub struct EventsClient {
    provider: DynProvider,
}

impl EventsClient {
    /// Connects to the given websocket `Url`.
    pub async fn new(url: Url) -> anyhow::Result<Self> {
        log::debug!("Connecting to websocket provider: {url}");

        let provider = ProviderBuilder::new()
            .connect_ws(WsConnect::new(url.clone()))
            .await?
            .erased();

        log::info!("Connected to websocket provider: {url}");
        Ok(Self { provider })
    }

    /// Subscribes to pending transactions that pass `filter`.
    pub async fn pending_transactions<'a>(
        &'a self,
        filter: &AlchemyPendingTransactionsEventFilter,
    ) -> anyhow::Result<Pin<Box<dyn Stream<Item = anyhow::Result<PendingTransaction>> + Send + 'a>>>
    {
        let params = filter.subscription_params();
        log::debug!("Subscribing with params: {params}");
        let subscription = self.provider.subscribe::<_, Value>(params).await?;
        Ok(Box::pin(subscription.into_stream().map(|item| {
            serde_json::from_value::<PendingTransaction>(item)
                .map_err(|e| anyhow::anyhow!("Unexpected pending transaction item: {e}"))
        })))
    }
}
