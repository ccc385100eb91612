use alloy::primitives::Address;
use alloy::transports::http::reqwest::Url;
use futures::Stream;
use serde::de::DeserializeOwned;

use crate::client::AlchemyClient;
use crate::error::Error;
use crate::marketplace::{GetFloorPriceResponse, RawRefreshContractResult, RefreshContractResult};
use crate::nft::{Nft, NftContract, NftTokenType, NftsForContractQuery, NftsForOwnerQuery, raw};
use crate::pagination::pages;
use crate::retry::retry;

impl AlchemyClient {
    fn nft_endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, Error> {
        let mut url = self.nft_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(format!("{} cannot be a base", self.nft_url)))?
            .pop_if_empty()
            .push(path);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Makes a GET request to the NFT API, retrying transient failures.
    pub(crate) async fn rest_get<R: DeserializeOwned>(
        &self,
        path: &'static str,
        query: &[(&str, String)],
    ) -> Result<R, Error> {
        let url = self.nft_endpoint(path, query)?;
        log::debug!("REST Call - Path: {path}, Query: {query:?}");

        let http = &self.http;
        let url = &url;
        let body = retry(&self.retry, path, move || async move {
            let response = http
                .get(url.clone())
                .send()
                .await
                .map_err(|e| Error::HttpRequestError(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| Error::HttpRequestError(e.to_string()))?;
            if !status.is_success() {
                return Err(Error::HttpStatusError {
                    path: path.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(body)
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| {
            log::debug!("Deserialization error: {e}, response text: {body}");
            Error::ResponseDeserializationError(e.to_string())
        })
    }

    /// Gets the NFTs held by `owner`.
    ///
    /// The options type decides whether metadata is fetched and what the
    /// response holds, see [`NftsForOwnerQuery`].
    pub async fn get_nfts_for_owner<Q: NftsForOwnerQuery>(
        &self,
        owner: Address,
        options: &Q,
    ) -> Result<Q::Response, Error> {
        options.validate()?;
        let raw: Q::Raw = self.rest_get("getNFTs", &options.query_pairs(owner)).await?;
        Ok(raw.into())
    }

    /// Streams every page of NFTs held by `owner`, starting at the page key of `options`.
    pub fn nfts_for_owner_pages<Q: NftsForOwnerQuery>(
        &self,
        owner: Address,
        options: Q,
    ) -> impl Stream<Item = Result<Q::Response, Error>> {
        let first_key = options.page_key().map(str::to_string);
        pages(first_key, move |page_key| {
            let mut options = options.clone();
            options.set_page_key(page_key);
            async move { self.get_nfts_for_owner(owner, &options).await }
        })
    }

    /// Gets the NFTs minted by `contract`.
    pub async fn get_nfts_for_contract<Q: NftsForContractQuery>(
        &self,
        contract: Address,
        options: &Q,
    ) -> Result<Q::Response, Error> {
        options.validate()?;
        let raw: Q::Raw = self
            .rest_get("getNFTsForCollection", &options.query_pairs(contract))
            .await?;
        Ok(raw.into())
    }

    /// Streams every page of NFTs minted by `contract`.
    pub fn nfts_for_contract_pages<Q: NftsForContractQuery>(
        &self,
        contract: Address,
        options: Q,
    ) -> impl Stream<Item = Result<Q::Response, Error>> {
        let first_key = options.page_key().map(str::to_string);
        pages(first_key, move |page_key| {
            let mut options = options.clone();
            options.set_page_key(page_key);
            async move { self.get_nfts_for_contract(contract, &options).await }
        })
    }

    /// Gets a single NFT with its metadata.
    ///
    /// `token_type` speeds up the lookup when known. A `token_uri_timeout_in_ms`
    /// of `0` only serves cached metadata.
    pub async fn get_nft_metadata(
        &self,
        contract: Address,
        token_id: &str,
        token_type: Option<NftTokenType>,
        token_uri_timeout_in_ms: Option<u64>,
    ) -> Result<Nft, Error> {
        let mut query = vec![
            ("contractAddress", contract.to_string()),
            ("tokenId", token_id.to_string()),
        ];
        if let Some(token_type) = token_type.filter(|t| *t != NftTokenType::Unknown) {
            let token_type = match token_type {
                NftTokenType::Erc1155 => "ERC1155",
                _ => "ERC721",
            };
            query.push(("tokenType", token_type.to_string()));
        }
        if let Some(timeout) = token_uri_timeout_in_ms {
            query.push(("tokenUriTimeoutInMs", timeout.to_string()));
        }
        let raw: raw::Nft = self.rest_get("getNFTMetadata", &query).await?;
        Ok(raw.into())
    }

    /// Gets collection-level metadata of an NFT contract.
    pub async fn get_contract_metadata(&self, contract: Address) -> Result<NftContract, Error> {
        let raw: raw::ContractMetadataResponse = self
            .rest_get(
                "getContractMetadata",
                &[("contractAddress", contract.to_string())],
            )
            .await?;
        Ok(raw.into())
    }

    /// Gets the floor price of a collection on every supported marketplace.
    pub async fn get_floor_price(&self, contract: Address) -> Result<GetFloorPriceResponse, Error> {
        self.rest_get("getFloorPrice", &[("contractAddress", contract.to_string())])
            .await
    }

    /// Asks the service to refresh the cached metadata of every NFT in a contract.
    ///
    /// Calling it again reports the progress of the refresh.
    pub async fn refresh_contract(&self, contract: Address) -> Result<RefreshContractResult, Error> {
        let raw: RawRefreshContractResult = self
            .rest_get("reingestContract", &[("contractAddress", contract.to_string())])
            .await?;
        let result = RefreshContractResult::try_from(raw)?;
        log::debug!(
            "Refresh of {} is {:?}",
            result.contract_address(),
            result.refresh_state()
        );
        Ok(result)
    }
}
