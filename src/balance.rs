use alloy::primitives::{Address, U256};
use alloy::rpc::json_rpc::RpcRecv;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Error;
use crate::pagination::Paginated;
use crate::utils::format_units;

/// Token set selector accepted by `alchemy_getTokenBalances`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenBalanceType {
    /// The fixed list of popular tokens maintained by the service.
    #[serde(rename = "DEFAULT_TOKENS")]
    DefaultTokens,
    /// Every ERC-20 token the address ever held, paginated.
    #[serde(rename = "erc20")]
    Erc20,
}

/// Balance of a token that was fetched successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalanceSuccess {
    pub contract_address: Address,
    pub token_balance: U256,
}

/// Balance of a token that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalanceFailure {
    pub contract_address: Address,
    pub error: String,
}

/// A single token balance entry.
/// Per-token failures are expected and sit next to successes in the same response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTokenBalance", into = "RawTokenBalance")]
pub enum TokenBalance {
    Success(TokenBalanceSuccess),
    Failure(TokenBalanceFailure),
}

/// Wire shape of a token balance: exactly one of `tokenBalance` and `error` is non-null.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenBalance {
    contract_address: Address,
    token_balance: Option<U256>,
    error: Option<String>,
}

impl TryFrom<RawTokenBalance> for TokenBalance {
    type Error = String;

    fn try_from(raw: RawTokenBalance) -> Result<Self, Self::Error> {
        match (raw.token_balance, raw.error) {
            (Some(token_balance), None) => Ok(TokenBalance::Success(TokenBalanceSuccess {
                contract_address: raw.contract_address,
                token_balance,
            })),
            (None, Some(error)) => Ok(TokenBalance::Failure(TokenBalanceFailure {
                contract_address: raw.contract_address,
                error,
            })),
            (Some(_), Some(_)) => Err(format!(
                "token balance for {} has both a balance and an error",
                raw.contract_address
            )),
            (None, None) => Err(format!(
                "token balance for {} has neither a balance nor an error",
                raw.contract_address
            )),
        }
    }
}

impl From<TokenBalance> for RawTokenBalance {
    fn from(balance: TokenBalance) -> Self {
        match balance {
            TokenBalance::Success(s) => RawTokenBalance {
                contract_address: s.contract_address,
                token_balance: Some(s.token_balance),
                error: None,
            },
            TokenBalance::Failure(f) => RawTokenBalance {
                contract_address: f.contract_address,
                token_balance: None,
                error: Some(f.error),
            },
        }
    }
}

impl TokenBalance {
    /// Returns the token contract address, regardless of outcome.
    pub fn contract_address(&self) -> Address {
        match self {
            TokenBalance::Success(s) => s.contract_address,
            TokenBalance::Failure(f) => f.contract_address,
        }
    }

    /// Returns the raw balance if it was fetched.
    pub fn balance(&self) -> Option<U256> {
        match self {
            TokenBalance::Success(s) => Some(s.token_balance),
            TokenBalance::Failure(_) => None,
        }
    }

    /// Returns the error message if the balance could not be fetched.
    pub fn error(&self) -> Option<&str> {
        match self {
            TokenBalance::Success(_) => None,
            TokenBalance::Failure(f) => Some(&f.error),
        }
    }

    /// Returns the balance scaled by the token decimals, e.g. from `alchemy_getTokenMetadata`.
    pub fn formatted(&self, decimals: u8) -> Option<BigDecimal> {
        self.balance().map(|b| format_units(b, decimals))
    }
}

/// Response of `alchemy_getTokenBalances` for non-paginated token sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalancesResponse {
    /// The address whose balances were queried.
    pub address: Address,
    pub token_balances: Vec<TokenBalance>,
}

/// Response of `alchemy_getTokenBalances` for the ERC-20 sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalancesResponseErc20 {
    #[serde(flatten)]
    pub response: TokenBalancesResponse,
    /// Continuation key, absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

impl Paginated for TokenBalancesResponseErc20 {
    fn page_key(&self) -> Option<&str> {
        self.page_key.as_deref()
    }
}

/// A token balance request. The request type decides the response type.
pub trait TokenBalancesQuery {
    type Response: RpcRecv;

    /// Checks the request before it is sent.
    fn validate(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Builds the positional JSON-RPC params for the given owner.
    fn rpc_params(&self, address: Address) -> Value;
}

/// Balances of the default token set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTokens;

impl TokenBalancesQuery for DefaultTokens {
    type Response = TokenBalancesResponse;

    fn rpc_params(&self, address: Address) -> Value {
        json!([address, TokenBalanceType::DefaultTokens])
    }
}

/// Balances of every ERC-20 token held by the address, one page at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc20Tokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

impl Erc20Tokens {
    /// Starts the sweep from the first page.
    pub fn first_page() -> Self {
        Self::default()
    }

    /// Continues the sweep from a page key returned by a previous response.
    pub fn after(page_key: impl Into<String>) -> Self {
        Self {
            page_key: Some(page_key.into()),
        }
    }
}

impl TokenBalancesQuery for Erc20Tokens {
    type Response = TokenBalancesResponseErc20;

    fn rpc_params(&self, address: Address) -> Value {
        match &self.page_key {
            Some(page_key) => json!([address, TokenBalanceType::Erc20, { "pageKey": page_key }]),
            None => json!([address, TokenBalanceType::Erc20]),
        }
    }
}

/// Balances of an explicit list of token contracts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractTokens(pub Vec<Address>);

impl TokenBalancesQuery for ContractTokens {
    type Response = TokenBalancesResponse;

    fn validate(&self) -> Result<(), Error> {
        if self.0.is_empty() {
            return Err(Error::EmptyContractList);
        }
        Ok(())
    }

    fn rpc_params(&self, address: Address) -> Value {
        json!([address, self.0])
    }
}

/// Response of `alchemy_getTokenMetadata`.
/// Every field is best-effort and may be missing for non-standard contracts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadataResponse {
    pub decimals: Option<u8>,
    pub logo: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const USDC: Address = address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");

    #[test]
    fn test_success_and_failure_in_same_response() {
        let json = r#"{
            "address": "0x00000000219ab540356cbb839cbe05303d7705fa",
            "tokenBalances": [
                {
                    "contractAddress": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                    "tokenBalance": "0x00000000000000000000000000000000000000000000000000000000000f4240",
                    "error": null
                },
                {
                    "contractAddress": "0xdac17f958d2ee523a2206206994597c13d831ec7",
                    "tokenBalance": null,
                    "error": "execution reverted"
                }
            ]
        }"#;
        let response: TokenBalancesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.token_balances.len(), 2);

        let first = &response.token_balances[0];
        assert_eq!(first.contract_address(), USDC);
        assert_eq!(first.balance(), Some(U256::from(1_000_000u64)));
        assert_eq!(first.error(), None);
        assert_eq!(first.formatted(6), Some(BigDecimal::from(1)));

        let second = &response.token_balances[1];
        assert_eq!(second.balance(), None);
        assert_eq!(second.error(), Some("execution reverted"));
    }

    #[test]
    fn test_balance_and_error_are_exclusive() {
        let both = r#"{"contractAddress":"0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48","tokenBalance":"0x1","error":"boom"}"#;
        assert!(serde_json::from_str::<TokenBalance>(both).is_err());

        let neither = r#"{"contractAddress":"0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48","tokenBalance":null,"error":null}"#;
        assert!(serde_json::from_str::<TokenBalance>(neither).is_err());
    }

    #[test]
    fn test_failure_serializes_with_null_balance() {
        let failure = TokenBalance::Failure(TokenBalanceFailure {
            contract_address: USDC,
            error: "timeout".to_string(),
        });
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["tokenBalance"], Value::Null);
        assert_eq!(value["error"], "timeout");
    }

    #[test]
    fn test_rpc_params() {
        let owner = address!("0x00000000219ab540356cbb839cbe05303d7705fa");
        assert_eq!(
            DefaultTokens.rpc_params(owner),
            json!([owner, "DEFAULT_TOKENS"])
        );
        assert_eq!(
            Erc20Tokens::after("abc").rpc_params(owner),
            json!([owner, "erc20", { "pageKey": "abc" }])
        );
        assert!(matches!(
            ContractTokens(vec![]).validate(),
            Err(Error::EmptyContractList)
        ));
    }

    #[test]
    fn test_erc20_response_page_key() {
        let json = r#"{"address":"0x00000000219ab540356cbb839cbe05303d7705fa","tokenBalances":[],"pageKey":"next"}"#;
        let response: TokenBalancesResponseErc20 = serde_json::from_str(json).unwrap();
        assert_eq!(response.page_key(), Some("next"));
        assert!(!response.is_last_page());
    }
}
