use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, B256};
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::pagination::Paginated;
use crate::utils::{Flag, hex_quantity, token_id_to_decimal};

/// Default number of transfers returned per page.
pub const DEFAULT_MAX_COUNT: u64 = 1000;

/// Categories of transfers reported by `alchemy_getAssetTransfers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetTransfersCategory {
    /// Top-level native currency transfers.
    External,
    /// Native currency transfers made by contract calls.
    Internal,
    Erc20,
    Erc721,
    Erc1155,
    /// Transfers of NFTs that predate the ERC721 standard, e.g. CryptoPunks.
    #[serde(rename = "specialnft")]
    SpecialNft,
}

impl AssetTransfersCategory {
    /// Tells whether transfers of this category move a token contract's assets.
    pub fn is_token(&self) -> bool {
        !matches!(
            self,
            AssetTransfersCategory::External | AssetTransfersCategory::Internal
        )
    }
}

/// Ordering of the returned transfers by block number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetTransfersOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

/// Parameters of `alchemy_getAssetTransfers`.
///
/// Defaults are resolved by the builder: the block range covers `0x0..=latest`,
/// results are ascending, zero-value transfers are excluded and at most 1000
/// transfers are returned per page.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersParams {
    #[builder(default = BlockNumberOrTag::Number(0))]
    pub from_block: BlockNumberOrTag,
    #[builder(default = BlockNumberOrTag::Latest)]
    pub to_block: BlockNumberOrTag,
    #[builder(default)]
    pub order: AssetTransfersOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_address: Option<Address>,
    /// Only report transfers of these token contracts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_addresses: Option<Vec<Address>>,
    #[builder(default = true)]
    pub exclude_zero_value: bool,
    /// Categories to report; must not be empty.
    pub category: Vec<AssetTransfersCategory>,
    #[builder(default = DEFAULT_MAX_COUNT)]
    #[serde(with = "hex_quantity")]
    pub max_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

impl AssetTransfersParams {
    /// Checks the request before it is sent.
    pub fn validate(&self) -> Result<(), Error> {
        if self.category.is_empty() {
            return Err(Error::EmptyCategoryList);
        }
        Ok(())
    }

    /// Returns the same request positioned at the given page.
    pub fn with_page_key(mut self, page_key: Option<String>) -> Self {
        self.page_key = page_key;
        self
    }
}

/// Parameters of `alchemy_getAssetTransfers` that request block metadata.
/// The literal `withMetadata: true` is what makes the response carry `metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersWithMetadataParams {
    #[serde(flatten)]
    pub params: AssetTransfersParams,
    pub with_metadata: Flag<true>,
}

impl From<AssetTransfersParams> for AssetTransfersWithMetadataParams {
    fn from(params: AssetTransfersParams) -> Self {
        Self {
            params,
            with_metadata: Flag,
        }
    }
}

/// Amount moved for a single ERC1155 token id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc1155Metadata {
    pub token_id: String,
    pub value: String,
}

/// Raw on-chain amounts of a transfer, as reported by the contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContract {
    /// Raw transferred amount as a hex string.
    pub value: Option<String>,
    pub address: Option<Address>,
    /// Token decimals as a hex string, `None` when unknown.
    pub decimal: Option<String>,
}

/// A single transfer returned by `alchemy_getAssetTransfers`.
///
/// Deserializing checks the category-dependent fields, see
/// [`check_consistency`](Self::check_consistency). Token ids are base-10 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawAssetTransfersResult")]
pub struct AssetTransfersResult {
    pub unique_id: String,
    pub category: AssetTransfersCategory,
    /// Block number as a hex string.
    pub block_num: String,
    pub from: Address,
    pub to: Option<Address>,
    /// Decimal-adjusted amount. `None` for ERC721 transfers or unknown decimals.
    pub value: Option<f64>,
    pub erc721_token_id: Option<String>,
    pub erc1155_metadata: Option<Vec<Erc1155Metadata>>,
    pub token_id: Option<String>,
    /// Symbol of the moved asset, e.g. `ETH` or `USDC`.
    pub asset: Option<String>,
    pub hash: B256,
    pub raw_contract: RawContract,
}

/// Wire shape of a transfer, before its category rules are checked.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawAssetTransfersResult {
    unique_id: String,
    category: AssetTransfersCategory,
    block_num: String,
    from: Address,
    to: Option<Address>,
    value: Option<f64>,
    erc721_token_id: Option<String>,
    erc1155_metadata: Option<Vec<Erc1155Metadata>>,
    token_id: Option<String>,
    asset: Option<String>,
    hash: B256,
    raw_contract: RawContract,
}

impl TryFrom<RawAssetTransfersResult> for AssetTransfersResult {
    type Error = Error;

    fn try_from(raw: RawAssetTransfersResult) -> Result<Self, Self::Error> {
        let decimal = |id: String| token_id_to_decimal(&id);
        let result = AssetTransfersResult {
            unique_id: raw.unique_id,
            category: raw.category,
            block_num: raw.block_num,
            from: raw.from,
            to: raw.to,
            value: raw.value,
            erc721_token_id: raw.erc721_token_id.map(decimal),
            erc1155_metadata: raw.erc1155_metadata.map(|tokens| {
                tokens
                    .into_iter()
                    .map(|t| Erc1155Metadata {
                        token_id: token_id_to_decimal(&t.token_id),
                        value: t.value,
                    })
                    .collect()
            }),
            token_id: raw.token_id.map(decimal),
            asset: raw.asset,
            hash: raw.hash,
            raw_contract: raw.raw_contract,
        };
        result.check_consistency()?;
        Ok(result)
    }
}

/// Category-specific view of a transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferToken<'a> {
    /// External or internal native currency transfer.
    Native { value: Option<f64> },
    Erc20 {
        contract: Option<Address>,
        value: Option<f64>,
    },
    Erc721 {
        contract: Option<Address>,
        token_id: &'a str,
    },
    Erc1155 {
        contract: Option<Address>,
        tokens: &'a [Erc1155Metadata],
    },
    SpecialNft {
        contract: Option<Address>,
        token_id: Option<&'a str>,
    },
}

impl AssetTransfersResult {
    /// Verifies the category-dependent fields.
    ///
    /// `erc721TokenId` is set iff the category is ERC721, `erc1155Metadata` iff it
    /// is ERC1155, ERC721 transfers carry no value, and native transfers carry
    /// no token fields.
    pub fn check_consistency(&self) -> Result<(), Error> {
        let fail = |what: &str| {
            Err(Error::InconsistentResponse(format!(
                "transfer {} ({:?}): {what}",
                self.unique_id, self.category
            )))
        };
        let is_erc721 = self.category == AssetTransfersCategory::Erc721;
        let is_erc1155 = self.category == AssetTransfersCategory::Erc1155;

        if self.erc721_token_id.is_some() != is_erc721 {
            return fail("erc721TokenId must be set exactly for erc721 transfers");
        }
        if self.erc1155_metadata.is_some() != is_erc1155 {
            return fail("erc1155Metadata must be set exactly for erc1155 transfers");
        }
        if is_erc721 && self.value.is_some() {
            return fail("erc721 transfers carry no value");
        }
        if !self.category.is_token()
            && (self.token_id.is_some() || self.raw_contract.decimal.is_some())
        {
            return fail("native transfers carry no token fields");
        }
        Ok(())
    }

    /// Returns the category-specific part of the transfer.
    pub fn token(&self) -> TransferToken<'_> {
        let contract = self.raw_contract.address;
        match self.category {
            AssetTransfersCategory::External | AssetTransfersCategory::Internal => {
                TransferToken::Native { value: self.value }
            }
            AssetTransfersCategory::Erc20 => TransferToken::Erc20 {
                contract,
                value: self.value,
            },
            AssetTransfersCategory::Erc721 => TransferToken::Erc721 {
                contract,
                token_id: self.erc721_token_id.as_deref().unwrap_or_default(),
            },
            AssetTransfersCategory::Erc1155 => TransferToken::Erc1155 {
                contract,
                tokens: self.erc1155_metadata.as_deref().unwrap_or_default(),
            },
            AssetTransfersCategory::SpecialNft => TransferToken::SpecialNft {
                contract,
                token_id: self.token_id.as_deref(),
            },
        }
    }
}

/// Block metadata attached to transfers when `withMetadata` is requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersMetadata {
    /// ISO-8601 timestamp of the block containing the transfer.
    pub block_timestamp: String,
}

/// A transfer returned by a `withMetadata: true` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetTransfersWithMetadataResult {
    #[serde(flatten)]
    pub transfer: AssetTransfersResult,
    pub metadata: AssetTransfersMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawAssetTransfersWithMetadataResult {
    #[serde(flatten)]
    transfer: RawAssetTransfersResult,
    metadata: AssetTransfersMetadata,
}

impl TryFrom<RawAssetTransfersWithMetadataResult> for AssetTransfersWithMetadataResult {
    type Error = Error;

    fn try_from(raw: RawAssetTransfersWithMetadataResult) -> Result<Self, Self::Error> {
        Ok(AssetTransfersWithMetadataResult {
            transfer: raw.transfer.try_into()?,
            metadata: raw.metadata,
        })
    }
}

/// Response of `alchemy_getAssetTransfers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersResponse<T = AssetTransfersResult> {
    pub transfers: Vec<T>,
    /// Continuation key, absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

/// Response of `alchemy_getAssetTransfers` with block metadata.
pub type AssetTransfersWithMetadataResponse = AssetTransfersResponse<AssetTransfersWithMetadataResult>;

impl<T> Paginated for AssetTransfersResponse<T> {
    fn page_key(&self) -> Option<&str> {
        self.page_key.as_deref()
    }
}

impl<R> AssetTransfersResponse<R> {
    /// Converts every wire transfer of the page, failing on the first inconsistent one.
    pub(crate) fn try_convert<T>(self) -> Result<AssetTransfersResponse<T>, Error>
    where
        T: TryFrom<R, Error = Error>,
    {
        Ok(AssetTransfersResponse {
            transfers: self
                .transfers
                .into_iter()
                .map(T::try_from)
                .collect::<Result<_, _>>()?,
            page_key: self.page_key,
        })
    }
}
