use alloy::transports::http::reqwest::Url;
use bon::Builder;
use std::fmt;

use crate::error::Error;
use crate::retry::RetryConfig;

/// API key accepted by the service for low-volume anonymous access.
pub const DEFAULT_API_KEY: &str = "demo";

/// Networks served by Alchemy.
/// The network selects the host name of both the JSON-RPC and the NFT endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Network {
    #[default]
    EthMainnet,
    EthSepolia,
    EthHolesky,
    OptMainnet,
    OptSepolia,
    ArbMainnet,
    ArbSepolia,
    MaticMainnet,
    MaticAmoy,
    BaseMainnet,
    BaseSepolia,
}

impl Network {
    /// Returns the host prefix used by the service for this network.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::EthMainnet => "eth-mainnet",
            Network::EthSepolia => "eth-sepolia",
            Network::EthHolesky => "eth-holesky",
            Network::OptMainnet => "opt-mainnet",
            Network::OptSepolia => "opt-sepolia",
            Network::ArbMainnet => "arb-mainnet",
            Network::ArbSepolia => "arb-sepolia",
            Network::MaticMainnet => "polygon-mainnet",
            Network::MaticAmoy => "polygon-amoy",
            Network::BaseMainnet => "base-mainnet",
            Network::BaseSepolia => "base-sepolia",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Network::EthMainnet,
            Network::EthSepolia,
            Network::EthHolesky,
            Network::OptMainnet,
            Network::OptSepolia,
            Network::ArbMainnet,
            Network::ArbSepolia,
            Network::MaticMainnet,
            Network::MaticAmoy,
            Network::BaseMainnet,
            Network::BaseSepolia,
        ]
        .into_iter()
        .find(|network| network.as_str() == s)
        .ok_or_else(|| Error::InvalidUrl(format!("unknown network `{s}`")))
    }
}

/// Settings used to build an [`AlchemyClient`](crate::AlchemyClient).
/// Defaults point at Ethereum mainnet with the public demo key.
#[derive(Debug, Clone, Builder)]
pub struct AlchemySettings {
    /// API key, embedded in the request path.
    #[builder(default = DEFAULT_API_KEY.to_string(), into)]
    pub api_key: String,
    /// Network to talk to.
    #[builder(default)]
    pub network: Network,
    /// Overrides the JSON-RPC endpoint derived from the network and key.
    pub url: Option<Url>,
    /// Overrides the NFT API base endpoint derived from the network and key.
    pub nft_url: Option<Url>,
    /// Retry behavior for transient transport failures.
    #[builder(default)]
    pub retry: RetryConfig,
}

impl Default for AlchemySettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AlchemySettings {
    /// Returns the JSON-RPC endpoint, e.g. `https://eth-mainnet.g.alchemy.com/v2/demo`.
    pub fn rpc_url(&self) -> Result<Url, Error> {
        match &self.url {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(&format!(
                "https://{}.g.alchemy.com/v2/{}",
                self.network, self.api_key
            ))?),
        }
    }

    /// Returns the NFT API base endpoint, e.g. `https://eth-mainnet.g.alchemy.com/nft/v2/demo`.
    pub fn nft_base_url(&self) -> Result<Url, Error> {
        match &self.nft_url {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(&format!(
                "https://{}.g.alchemy.com/nft/v2/{}",
                self.network, self.api_key
            ))?),
        }
    }

    /// Returns the WebSocket endpoint matching the JSON-RPC endpoint.
    pub fn ws_url(&self) -> Result<Url, Error> {
        let mut url = self.rpc_url()?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => other,
        }
        .to_string();
        url.set_scheme(&scheme)
            .map_err(|_| Error::InvalidUrl(format!("cannot use scheme `{scheme}` for {url}")))?;
        Ok(url)
    }
}
