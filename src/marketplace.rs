use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Floor price quote of a single marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPriceMarketplace {
    pub floor_price: f64,
    pub price_currency: String,
    pub collection_url: String,
    /// ISO-8601 timestamp of when the quote was fetched.
    pub retrieved_at: String,
}

/// A marketplace that could not be queried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPriceError {
    pub error: String,
    pub retrieved_at: String,
}

/// Outcome of a floor price lookup on one marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FloorPrice {
    Quote(FloorPriceMarketplace),
    Error(FloorPriceError),
}

impl FloorPrice {
    pub fn quote(&self) -> Option<&FloorPriceMarketplace> {
        match self {
            FloorPrice::Quote(quote) => Some(quote),
            FloorPrice::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FloorPrice::Quote(_) => None,
            FloorPrice::Error(e) => Some(&e.error),
        }
    }
}

/// Marketplaces covered by `getFloorPrice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marketplace {
    OpenSea,
    LooksRare,
}

impl Marketplace {
    pub const ALL: [Marketplace; 2] = [Marketplace::OpenSea, Marketplace::LooksRare];
}

/// Response of `getFloorPrice`. Every marketplace is always present, as a quote or as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFloorPriceResponse {
    pub open_sea: FloorPrice,
    pub looks_rare: FloorPrice,
}

impl GetFloorPriceResponse {
    pub fn get(&self, marketplace: Marketplace) -> &FloorPrice {
        match marketplace {
            Marketplace::OpenSea => &self.open_sea,
            Marketplace::LooksRare => &self.looks_rare,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Marketplace, &FloorPrice)> {
        Marketplace::ALL.into_iter().map(|m| (m, self.get(m)))
    }

    /// Lowest quote across marketplaces that answered.
    pub fn lowest(&self) -> Option<(Marketplace, &FloorPriceMarketplace)> {
        self.iter()
            .filter_map(|(m, price)| price.quote().map(|q| (m, q)))
            .min_by(|(_, a), (_, b)| a.floor_price.total_cmp(&b.floor_price))
    }
}

/// State of a contract metadata refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    /// The contract is unknown to the service.
    DoesNotExist,
    /// A refresh was already queued before this request.
    AlreadyQueued,
    InProgress,
    Finished,
    /// The refresh was queued by this request.
    Queued,
    /// The refresh could not be queued.
    QueueFailed,
}

impl RefreshState {
    /// States that can be reported by the call that requests the refresh.
    pub fn is_initial_observation(&self) -> bool {
        matches!(
            self,
            RefreshState::DoesNotExist
                | RefreshState::Queued
                | RefreshState::AlreadyQueued
                | RefreshState::QueueFailed
        )
    }

    /// States that carry a progress value.
    pub fn has_progress(&self) -> bool {
        matches!(self, RefreshState::InProgress | RefreshState::Finished)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RefreshState::DoesNotExist | RefreshState::Finished)
    }

    /// Returns whether an observer may see `next` after `self`.
    ///
    /// Refreshes only move forward: queued, then in progress, then finished.
    /// A queued refresh is reported as already queued to later requests.
    pub fn can_transition_to(&self, next: RefreshState) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (RefreshState::Queued, RefreshState::AlreadyQueued)
                | (
                    RefreshState::Queued | RefreshState::AlreadyQueued,
                    RefreshState::InProgress | RefreshState::Finished
                )
                | (RefreshState::InProgress, RefreshState::Finished)
        )
    }
}

/// Result of `reingestContract`.
///
/// Progress is present exactly in the states that carry it, as a decimal string.
/// Deserialization goes through the same check as the client, so a value of this
/// type always holds that invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRefreshContractResult")]
pub struct RefreshContractResult {
    contract_address: Address,
    refresh_state: RefreshState,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<String>,
}

impl RefreshContractResult {
    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.refresh_state
    }

    /// Completion percentage as a decimal string, set only while in progress or finished.
    pub fn progress(&self) -> Option<&str> {
        self.progress.as_deref()
    }

    /// Progress as a number, if any.
    pub fn progress_value(&self) -> Option<u64> {
        self.progress.as_deref().and_then(|p| p.parse().ok())
    }
}

/// Wire shape of a refresh result. The service names the state `reingestionState`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawRefreshContractResult {
    contract_address: Address,
    #[serde(alias = "reingestionState")]
    refresh_state: RefreshState,
    #[serde(default)]
    progress: Option<String>,
}

impl TryFrom<RawRefreshContractResult> for RefreshContractResult {
    type Error = Error;

    fn try_from(raw: RawRefreshContractResult) -> Result<Self, Self::Error> {
        let state = raw.refresh_state;
        let progress = match (state.has_progress(), raw.progress) {
            (true, Some(p)) if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) => Some(p),
            (true, Some(p)) => {
                return Err(Error::InconsistentResponse(format!(
                    "refresh of {} reports non-numeric progress {p:?}",
                    raw.contract_address
                )));
            }
            (true, None) => {
                return Err(Error::InconsistentResponse(format!(
                    "refresh of {} is {state:?} without progress",
                    raw.contract_address
                )));
            }
            (false, Some(p)) => {
                log::warn!(
                    "Dropping progress {p:?} reported for refresh of {} in state {state:?}",
                    raw.contract_address
                );
                None
            }
            (false, None) => None,
        };
        Ok(RefreshContractResult {
            contract_address: raw.contract_address,
            refresh_state: state,
            progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(state: &str, progress: Option<&str>) -> RawRefreshContractResult {
        serde_json::from_value(json!({
            "contractAddress": "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d",
            "reingestionState": state,
            "progress": progress,
        }))
        .unwrap()
    }

    #[test]
    fn test_floor_price_mixes_quotes_and_errors() {
        let response: GetFloorPriceResponse = serde_json::from_value(json!({
            "openSea": {
                "floorPrice": 68.5,
                "priceCurrency": "ETH",
                "collectionUrl": "https://opensea.io/collection/boredapeyachtclub",
                "retrievedAt": "2023-06-01T00:00:00.000Z"
            },
            "looksRare": {
                "error": "unable to fetch floor price",
                "retrievedAt": "2023-06-01T00:00:00.000Z"
            }
        }))
        .unwrap();

        assert_eq!(
            response.get(Marketplace::OpenSea).quote().map(|q| q.floor_price),
            Some(68.5)
        );
        assert_eq!(
            response.get(Marketplace::LooksRare).error(),
            Some("unable to fetch floor price")
        );
        assert_eq!(response.iter().count(), 2);
        assert_eq!(response.lowest().map(|(m, _)| m), Some(Marketplace::OpenSea));
    }

    #[test]
    fn test_floor_price_requires_every_marketplace() {
        let missing = json!({
            "openSea": { "error": "x", "retrievedAt": "2023-06-01T00:00:00.000Z" }
        });
        assert!(serde_json::from_value::<GetFloorPriceResponse>(missing).is_err());
    }

    #[test]
    fn test_refresh_state_wire_names() {
        assert_eq!(
            serde_json::to_value(RefreshState::DoesNotExist).unwrap(),
            json!("does_not_exist")
        );
        let state: RefreshState = serde_json::from_value(json!("queue_failed")).unwrap();
        assert_eq!(state, RefreshState::QueueFailed);
    }

    #[test]
    fn test_refresh_state_transitions() {
        use RefreshState::*;
        assert!(Queued.can_transition_to(InProgress));
        assert!(Queued.can_transition_to(AlreadyQueued));
        assert!(!AlreadyQueued.can_transition_to(Queued));
        assert!(AlreadyQueued.can_transition_to(Finished));
        assert!(InProgress.can_transition_to(Finished));
        assert!(InProgress.can_transition_to(InProgress));
        assert!(!Finished.can_transition_to(InProgress));
        assert!(!InProgress.can_transition_to(Queued));
        assert!(!QueueFailed.can_transition_to(InProgress));

        assert!(Queued.is_initial_observation());
        assert!(!InProgress.is_initial_observation());
        assert!(Finished.is_terminal() && DoesNotExist.is_terminal());
    }

    #[test]
    fn test_progress_kept_for_active_states() {
        let result = RefreshContractResult::try_from(raw("in_progress", Some("42"))).unwrap();
        assert_eq!(result.refresh_state(), RefreshState::InProgress);
        assert_eq!(result.progress_value(), Some(42));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["refreshState"], "in_progress");
        assert!(value.get("reingestionState").is_none());

        let back: RefreshContractResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_progress_dropped_for_inactive_states() {
        let result = RefreshContractResult::try_from(raw("queued", Some("0"))).unwrap();
        assert_eq!(result.progress(), None);
    }

    #[test]
    fn test_progress_required_for_active_states() {
        assert!(matches!(
            RefreshContractResult::try_from(raw("finished", None)),
            Err(Error::InconsistentResponse(_))
        ));
        assert!(matches!(
            RefreshContractResult::try_from(raw("in_progress", Some("half"))),
            Err(Error::InconsistentResponse(_))
        ));
    }

    #[test]
    fn test_deserialize_checks_progress() {
        let address = "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d";

        let queued: RefreshContractResult = serde_json::from_value(json!({
            "contractAddress": address,
            "refreshState": "queued",
            "progress": "50",
        }))
        .unwrap();
        assert_eq!(queued.refresh_state(), RefreshState::Queued);
        assert_eq!(queued.progress(), None);

        let finished = serde_json::from_value::<RefreshContractResult>(json!({
            "contractAddress": address,
            "refreshState": "finished",
            "progress": "half",
        }));
        assert!(finished.is_err());

        let missing = serde_json::from_value::<RefreshContractResult>(json!({
            "contractAddress": address,
            "refreshState": "in_progress",
        }));
        assert!(missing.is_err());
    }
}
