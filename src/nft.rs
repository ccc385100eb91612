//! NFT ownership and collection queries.
//!
//! Queries vary along two axes, both fixed at the type level:
//! - scope: NFTs held by an owner ([`NftsForOwnerQuery`]) or minted by a
//!   contract ([`NftsForContractQuery`]);
//! - metadata: full [`Nft`]s or identity-only [`BaseNft`]s, selected by the
//!   literal `omitMetadata` flag of the options type.
//!
//! The options type passed to the client therefore decides the response type.

use alloy::primitives::Address;
use bon::Builder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, MAX_NFT_CONTRACT_ADDRESSES, MAX_NFT_PAGE_SIZE, validate_page_size};
use crate::pagination::Paginated;
use crate::utils::{Flag, string_or_number, token_id_to_decimal};

/// Token standard of an NFT contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NftTokenType {
    #[serde(rename = "ERC721")]
    Erc721,
    #[serde(rename = "ERC1155")]
    Erc1155,
    #[default]
    #[serde(rename = "UNKNOWN", other)]
    Unknown,
}

/// Classifications that can be excluded from NFT queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NftExcludeFilters {
    #[serde(rename = "SPAM")]
    Spam,
}

impl NftExcludeFilters {
    pub fn as_str(&self) -> &'static str {
        match self {
            NftExcludeFilters::Spam => "SPAM",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseNftContract {
    pub address: Address,
}

/// NFT identity, without any off-chain metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseNft {
    pub contract: BaseNftContract,
    /// Token id as a base-10 string.
    pub token_id: String,
    pub token_type: NftTokenType,
}

/// Location of the token URI, both as stored on chain and through a gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUri {
    pub raw: String,
    pub gateway: String,
}

/// A media asset referenced by NFT metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub raw: String,
    pub gateway: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// NFT with its (best-effort) metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nft {
    #[serde(flatten)]
    pub base: BaseNft,
    pub title: String,
    pub description: String,
    /// When the service last refreshed the metadata, ISO-8601.
    pub time_last_updated: String,
    /// Why metadata could not be fetched, if it could not.
    pub metadata_error: Option<String>,
    pub raw_metadata: Option<Value>,
    pub token_uri: Option<TokenUri>,
    pub media: Vec<Media>,
}

/// NFT with metadata, together with the quantity held by the queried owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedNft {
    #[serde(flatten)]
    pub nft: Nft,
    pub balance: u64,
}

/// NFT identity together with the quantity held by the queried owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedBaseNft {
    #[serde(flatten)]
    pub nft: BaseNft,
    pub balance: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedNftsResponse {
    pub owned_nfts: Vec<OwnedNft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedBaseNftsResponse {
    pub owned_nfts: Vec<OwnedBaseNft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

/// NFTs of a contract. Ownership is not attributed at contract scope, so there is no balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftContractNftsResponse {
    pub nfts: Vec<Nft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftContractBaseNftsResponse {
    pub nfts: Vec<BaseNft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

macro_rules! impl_paginated {
    ($($ty:ty),*) => {
        $(impl Paginated for $ty {
            fn page_key(&self) -> Option<&str> {
                self.page_key.as_deref()
            }
        })*
    };
}

impl_paginated!(
    OwnedNftsResponse,
    OwnedBaseNftsResponse,
    NftContractNftsResponse,
    NftContractBaseNftsResponse
);

/// Collection-level metadata returned by `getContractMetadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftContract {
    pub address: Address,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub total_supply: Option<String>,
    pub token_type: NftTokenType,
}

/// Wire shapes of the NFT REST API, converted into the public types above.
#[doc(hidden)]
pub mod raw {
    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TokenMetadata {
        #[serde(default)]
        pub token_type: NftTokenType,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NftId {
        pub token_id: String,
        pub token_metadata: Option<TokenMetadata>,
    }

    #[derive(Debug, Deserialize)]
    pub struct BaseNft {
        pub contract: BaseNftContract,
        pub id: NftId,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Nft {
        pub contract: BaseNftContract,
        pub id: NftId,
        #[serde(default)]
        pub title: Option<String>,
        /// Either a string or a list of strings, depending on the collection.
        #[serde(default)]
        pub description: Option<Value>,
        #[serde(default)]
        pub token_uri: Option<TokenUri>,
        #[serde(default)]
        pub media: Option<Vec<Media>>,
        #[serde(default)]
        pub metadata: Option<Value>,
        #[serde(default)]
        pub time_last_updated: Option<String>,
        #[serde(default)]
        pub error: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Owned<T> {
        #[serde(flatten)]
        pub nft: T,
        #[serde(with = "string_or_number")]
        pub balance: u64,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OwnedNftsResponse<T> {
        pub owned_nfts: Vec<Owned<T>>,
        pub page_key: Option<String>,
        pub total_count: Option<u64>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ContractNftsResponse<T> {
        pub nfts: Vec<T>,
        pub next_token: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ContractMetadata {
        pub name: Option<String>,
        pub symbol: Option<String>,
        pub total_supply: Option<String>,
        #[serde(default)]
        pub token_type: NftTokenType,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ContractMetadataResponse {
        pub address: Address,
        pub contract_metadata: ContractMetadata,
    }
}

impl From<raw::BaseNft> for BaseNft {
    fn from(raw: raw::BaseNft) -> Self {
        BaseNft {
            contract: raw.contract,
            token_id: token_id_to_decimal(&raw.id.token_id),
            token_type: raw.id.token_metadata.map(|m| m.token_type).unwrap_or_default(),
        }
    }
}

fn description_text(description: Option<Value>) -> String {
    match description {
        Some(Value::String(s)) => s,
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

impl From<raw::Nft> for Nft {
    fn from(raw: raw::Nft) -> Self {
        let base = BaseNft::from(raw::BaseNft {
            contract: raw.contract,
            id: raw.id,
        });
        Nft {
            base,
            title: raw.title.unwrap_or_default(),
            description: description_text(raw.description),
            time_last_updated: raw.time_last_updated.unwrap_or_default(),
            metadata_error: raw.error,
            raw_metadata: raw.metadata,
            token_uri: raw.token_uri,
            media: raw.media.unwrap_or_default(),
        }
    }
}

impl From<raw::OwnedNftsResponse<raw::Nft>> for OwnedNftsResponse {
    fn from(raw: raw::OwnedNftsResponse<raw::Nft>) -> Self {
        OwnedNftsResponse {
            owned_nfts: raw
                .owned_nfts
                .into_iter()
                .map(|owned| OwnedNft {
                    nft: owned.nft.into(),
                    balance: owned.balance,
                })
                .collect(),
            page_key: raw.page_key,
            total_count: raw.total_count,
        }
    }
}

impl From<raw::OwnedNftsResponse<raw::BaseNft>> for OwnedBaseNftsResponse {
    fn from(raw: raw::OwnedNftsResponse<raw::BaseNft>) -> Self {
        OwnedBaseNftsResponse {
            owned_nfts: raw
                .owned_nfts
                .into_iter()
                .map(|owned| OwnedBaseNft {
                    nft: owned.nft.into(),
                    balance: owned.balance,
                })
                .collect(),
            page_key: raw.page_key,
            total_count: raw.total_count,
        }
    }
}

impl From<raw::ContractNftsResponse<raw::Nft>> for NftContractNftsResponse {
    fn from(raw: raw::ContractNftsResponse<raw::Nft>) -> Self {
        NftContractNftsResponse {
            nfts: raw.nfts.into_iter().map(Nft::from).collect(),
            page_key: raw.next_token,
        }
    }
}

impl From<raw::ContractNftsResponse<raw::BaseNft>> for NftContractBaseNftsResponse {
    fn from(raw: raw::ContractNftsResponse<raw::BaseNft>) -> Self {
        NftContractBaseNftsResponse {
            nfts: raw.nfts.into_iter().map(BaseNft::from).collect(),
            page_key: raw.next_token,
        }
    }
}

impl From<raw::ContractMetadataResponse> for NftContract {
    fn from(raw: raw::ContractMetadataResponse) -> Self {
        NftContract {
            address: raw.address,
            name: raw.contract_metadata.name,
            symbol: raw.contract_metadata.symbol,
            total_supply: raw.contract_metadata.total_supply,
            token_type: raw.contract_metadata.token_type,
        }
    }
}

/// Query string pairs of a REST request.
pub type QueryPairs = Vec<(&'static str, String)>;

/// An owner-scoped NFT query. The options type decides the response type.
pub trait NftsForOwnerQuery: Clone + Send + Sync {
    #[doc(hidden)]
    type Raw: DeserializeOwned;
    type Response: From<Self::Raw> + Paginated + Send;

    /// Checks the request limits before anything is sent.
    fn validate(&self) -> Result<(), Error>;

    /// Builds the `getNFTs` query string for the given owner.
    fn query_pairs(&self, owner: Address) -> QueryPairs;

    fn page_key(&self) -> Option<&str>;

    fn set_page_key(&mut self, page_key: Option<String>);
}

/// A contract-scoped NFT query. The options type decides the response type.
pub trait NftsForContractQuery: Clone + Send + Sync {
    #[doc(hidden)]
    type Raw: DeserializeOwned;
    type Response: From<Self::Raw> + Paginated + Send;

    /// Checks the request limits before anything is sent.
    fn validate(&self) -> Result<(), Error>;

    /// Builds the `getNFTsForCollection` query string for the given contract.
    fn query_pairs(&self, contract: Address) -> QueryPairs;

    fn page_key(&self) -> Option<&str>;

    fn set_page_key(&mut self, page_key: Option<String>);
}

/// Options of an owner-scoped query returning NFTs with metadata.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNftsForOwnerOptions {
    /// Only return NFTs of these contracts, at most 20.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contract_addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_filters: Vec<NftExcludeFilters>,
    /// NFTs per page, at most 100.
    #[builder(default = MAX_NFT_PAGE_SIZE)]
    pub page_size: u32,
    #[builder(skip)]
    #[serde(default)]
    pub omit_metadata: Flag<false>,
    /// Per-item budget for fetching metadata. Unset waits indefinitely, `0` only uses the cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri_timeout_in_ms: Option<u64>,
}

/// Options of an owner-scoped query returning NFT identities only.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBaseNftsForOwnerOptions {
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contract_addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_filters: Vec<NftExcludeFilters>,
    #[builder(default = MAX_NFT_PAGE_SIZE)]
    pub page_size: u32,
    #[builder(skip)]
    pub omit_metadata: Flag<true>,
}

/// Options of a contract-scoped query returning NFTs with metadata.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNftsForContractOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
    #[builder(default = MAX_NFT_PAGE_SIZE)]
    pub page_size: u32,
    #[builder(skip)]
    #[serde(default)]
    pub omit_metadata: Flag<false>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri_timeout_in_ms: Option<u64>,
}

/// Options of a contract-scoped query returning NFT identities only.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBaseNftsForContractOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
    #[builder(default = MAX_NFT_PAGE_SIZE)]
    pub page_size: u32,
    #[builder(skip)]
    pub omit_metadata: Flag<true>,
}

macro_rules! impl_default_from_builder {
    ($($ty:ty),*) => {
        $(impl Default for $ty {
            fn default() -> Self {
                Self::builder().build()
            }
        })*
    };
}

impl_default_from_builder!(
    GetNftsForOwnerOptions,
    GetBaseNftsForOwnerOptions,
    GetNftsForContractOptions,
    GetBaseNftsForContractOptions
);

fn validate_contract_addresses(addresses: &[Address]) -> Result<(), Error> {
    if addresses.len() > MAX_NFT_CONTRACT_ADDRESSES {
        return Err(Error::TooManyContractAddresses(addresses.len()));
    }
    Ok(())
}

fn owner_pairs(
    owner: Address,
    contract_addresses: &[Address],
    page_key: Option<&str>,
    exclude_filters: &[NftExcludeFilters],
    page_size: u32,
    with_metadata: bool,
) -> QueryPairs {
    let mut pairs = vec![("owner", owner.to_string())];
    pairs.extend(
        contract_addresses
            .iter()
            .map(|address| ("contractAddresses[]", address.to_string())),
    );
    if let Some(page_key) = page_key {
        pairs.push(("pageKey", page_key.to_string()));
    }
    pairs.extend(
        exclude_filters
            .iter()
            .map(|filter| ("excludeFilters[]", filter.as_str().to_string())),
    );
    pairs.push(("pageSize", page_size.to_string()));
    pairs.push(("withMetadata", with_metadata.to_string()));
    pairs
}

fn contract_pairs(
    contract: Address,
    page_key: Option<&str>,
    page_size: u32,
    with_metadata: bool,
) -> QueryPairs {
    let mut pairs = vec![("contractAddress", contract.to_string())];
    if let Some(page_key) = page_key {
        pairs.push(("startToken", page_key.to_string()));
    }
    pairs.push(("limit", page_size.to_string()));
    pairs.push(("withMetadata", with_metadata.to_string()));
    pairs
}

impl NftsForOwnerQuery for GetNftsForOwnerOptions {
    type Raw = raw::OwnedNftsResponse<raw::Nft>;
    type Response = OwnedNftsResponse;

    fn validate(&self) -> Result<(), Error> {
        validate_contract_addresses(&self.contract_addresses)?;
        validate_page_size(Some(self.page_size))
    }

    fn query_pairs(&self, owner: Address) -> QueryPairs {
        let mut pairs = owner_pairs(
            owner,
            &self.contract_addresses,
            self.page_key.as_deref(),
            &self.exclude_filters,
            self.page_size,
            !self.omit_metadata.value(),
        );
        if let Some(timeout) = self.token_uri_timeout_in_ms {
            pairs.push(("tokenUriTimeoutInMs", timeout.to_string()));
        }
        pairs
    }

    fn page_key(&self) -> Option<&str> {
        self.page_key.as_deref()
    }

    fn set_page_key(&mut self, page_key: Option<String>) {
        self.page_key = page_key;
    }
}

impl NftsForOwnerQuery for GetBaseNftsForOwnerOptions {
    type Raw = raw::OwnedNftsResponse<raw::BaseNft>;
    type Response = OwnedBaseNftsResponse;

    fn validate(&self) -> Result<(), Error> {
        validate_contract_addresses(&self.contract_addresses)?;
        validate_page_size(Some(self.page_size))
    }

    fn query_pairs(&self, owner: Address) -> QueryPairs {
        owner_pairs(
            owner,
            &self.contract_addresses,
            self.page_key.as_deref(),
            &self.exclude_filters,
            self.page_size,
            !self.omit_metadata.value(),
        )
    }

    fn page_key(&self) -> Option<&str> {
        self.page_key.as_deref()
    }

    fn set_page_key(&mut self, page_key: Option<String>) {
        self.page_key = page_key;
    }
}

impl NftsForContractQuery for GetNftsForContractOptions {
    type Raw = raw::ContractNftsResponse<raw::Nft>;
    type Response = NftContractNftsResponse;

    fn validate(&self) -> Result<(), Error> {
        validate_page_size(Some(self.page_size))
    }

    fn query_pairs(&self, contract: Address) -> QueryPairs {
        let mut pairs = contract_pairs(
            contract,
            self.page_key.as_deref(),
            self.page_size,
            !self.omit_metadata.value(),
        );
        if let Some(timeout) = self.token_uri_timeout_in_ms {
            pairs.push(("tokenUriTimeoutInMs", timeout.to_string()));
        }
        pairs
    }

    fn page_key(&self) -> Option<&str> {
        self.page_key.as_deref()
    }

    fn set_page_key(&mut self, page_key: Option<String>) {
        self.page_key = page_key;
    }
}

impl NftsForContractQuery for GetBaseNftsForContractOptions {
    type Raw = raw::ContractNftsResponse<raw::BaseNft>;
    type Response = NftContractBaseNftsResponse;

    fn validate(&self) -> Result<(), Error> {
        validate_page_size(Some(self.page_size))
    }

    fn query_pairs(&self, contract: Address) -> QueryPairs {
        contract_pairs(
            contract,
            self.page_key.as_deref(),
            self.page_size,
            !self.omit_metadata.value(),
        )
    }

    fn page_key(&self) -> Option<&str> {
        self.page_key.as_deref()
    }

    fn set_page_key(&mut self, page_key: Option<String>) {
        self.page_key = page_key;
    }
}
