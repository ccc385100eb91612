//! # Alchemy SDK
//!
//! Typed access to the [Alchemy](https://www.alchemy.com/) blockchain data API from Rust.
//!
//! The crate has two halves:
//! - request and response types for the enhanced APIs (token balances, asset transfers,
//!   NFTs, floor prices, contract refresh, block receipts and pending transaction
//!   subscriptions), which can be used on their own with any transport;
//! - [`AlchemyClient`], which carries them over JSON-RPC and the NFT REST API, built on `alloy`.
//!
//! Where the service returns differently shaped responses depending on a request flag, the
//! flag is part of the request type and the response type follows from it. For example,
//! [`GetBaseNftsForOwnerOptions`](nft::GetBaseNftsForOwnerOptions) always yields NFTs without
//! metadata, while [`GetNftsForOwnerOptions`](nft::GetNftsForOwnerOptions) always yields them
//! with metadata.
//!
//! ```no_run
//! use alchemy_sdk::nft::GetBaseNftsForOwnerOptions;
//! use alchemy_sdk::{AlchemyClient, AlchemySettings, Network, address};
//!
//! # async fn run() -> Result<(), alchemy_sdk::Error> {
//! let settings = AlchemySettings::builder()
//!     .api_key("demo")
//!     .network(Network::EthMainnet)
//!     .build();
//! let client = AlchemyClient::new(settings)?;
//! let owner = address!("0xd8da6bf26964af9d7eed9e03e53415d37aa96045");
//! let page = client
//!     .get_nfts_for_owner(owner, &GetBaseNftsForOwnerOptions::default())
//!     .await?;
//! println!("{} NFTs on the first page", page.owned_nfts.len());
//! # Ok(())
//! # }
//! ```
//!
//! Paginated responses implement [`Paginated`](pagination::Paginated). The `*_pages` methods
//! of the client stream every page until the service stops returning a page key.

/// Re-export commonly used types from `alloy`.
pub use alloy::eips::BlockNumberOrTag;
pub use alloy::primitives::{Address, B256, Bytes, U256, address};
pub use alloy::transports::http::reqwest::Url;

pub use client::AlchemyClient;
pub use error::Error;
pub use retry::RetryConfig;
pub use settings::{AlchemySettings, Network};

/// Token balance and token metadata types.
pub mod balance;

/// Main client interface.
pub mod client;

/// Crate error type and request limits.
pub mod error;

/// Pending transaction subscriptions over WebSocket.
pub mod events;

/// Floor price and contract refresh types.
pub mod marketplace;

/// NFT ownership and collection types.
pub mod nft;

/// NFT REST API methods of the client.
pub mod nft_api;

/// Page-key pagination.
pub mod pagination;

/// Retry of transient transport failures.
pub mod retry;

/// JSON-RPC methods of the client.
pub mod rpc;

/// Client settings and supported networks.
pub mod settings;

/// Block receipts and private transaction types.
pub mod transaction;

/// Asset transfer history types.
pub mod transfers;

/// Helpers for units and wire encodings.
pub mod utils;
