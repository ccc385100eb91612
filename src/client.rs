use std::sync::Arc;

use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::http::reqwest::{Client, Url};
use bon::bon;

use crate::error::Error;
use crate::events::EventsClient;
use crate::retry::RetryConfig;
use crate::settings::AlchemySettings;

/// A client for the Alchemy JSON-RPC and NFT APIs.
///
/// Clones are cheap and share the same provider and HTTP connection pool.
#[derive(Clone)]
pub struct AlchemyClient {
    /// Provider used for JSON-RPC calls.
    pub(crate) provider: DynProvider,
    /// HTTP client used for the NFT REST endpoints.
    pub(crate) http: Client,
    pub(crate) settings: Arc<AlchemySettings>,
    pub(crate) rpc_url: Url,
    pub(crate) nft_url: Url,
    pub(crate) retry: RetryConfig,
}

#[bon]
impl AlchemyClient {
    /// Creates a new builder for `AlchemyClient`.
    /// Without settings the client talks to Ethereum mainnet with the demo key.
    #[builder(finish_fn = build)]
    pub fn builder(
        #[builder(default)] settings: AlchemySettings,
        // Shared HTTP client for the NFT API, e.g. one with a proxy.
        http_client: Option<Client>,
    ) -> Result<Self, Error> {
        let rpc_url = settings.rpc_url()?;
        let nft_url = settings.nft_base_url()?;
        let provider = ProviderBuilder::new()
            .connect_http(rpc_url.clone())
            .erased();

        log::debug!("Created client for {} (NFT API at {nft_url})", settings.network);

        Ok(Self {
            provider,
            http: http_client.unwrap_or_default(),
            retry: settings.retry.clone(),
            settings: Arc::new(settings),
            rpc_url,
            nft_url,
        })
    }

    /// Creates a client from settings.
    pub fn new(settings: AlchemySettings) -> Result<Self, Error> {
        Self::builder().settings(settings).build()
    }

    /// Creates a client for the given API key on Ethereum mainnet.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, Error> {
        Self::new(AlchemySettings::builder().api_key(api_key).build())
    }

    pub fn settings(&self) -> &AlchemySettings {
        &self.settings
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    pub fn nft_url(&self) -> &Url {
        &self.nft_url
    }

    /// Gets the underlying provider, for standard `eth_*` calls.
    pub fn get_rpc_client(&self) -> DynProvider {
        self.provider.clone()
    }

    /// Creates a new WebSocket client for subscriptions on the configured network.
    pub async fn events_client(&self) -> anyhow::Result<EventsClient> {
        EventsClient::new(self.settings.ws_url()?).await
    }

    /// Creates a new WebSocket client for subscriptions with a custom WebSocket URL.
    pub async fn events_client_with_url(&self, ws_url: Url) -> anyhow::Result<EventsClient> {
        EventsClient::new(ws_url).await
    }
}
