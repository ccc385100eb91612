use std::collections::HashSet;
use std::str::FromStr;

use alchemy_sdk::Error;
use alchemy_sdk::U256;
use alchemy_sdk::balance::{ContractTokens, DefaultTokens, Erc20Tokens, TokenBalance};
use bigdecimal::BigDecimal;
use alchemy_sdk::pagination::Paginated;
use alchemy_sdk_test_utils::fixtures::{
    BROKEN_TOKEN, ERC20_PAGE_SIZE, ERC20_TOKEN_COUNT, TOKEN_HOLDER, USDC, erc20_token,
};
use alchemy_sdk_test_utils::{init_logger, start_mock};
use futures::TryStreamExt;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_default_tokens_mix_successes_and_failures() -> anyhow::Result<()> {
    init_logger(false);
    let (_server, client) = start_mock().await?;

    let response = client.get_token_balances(TOKEN_HOLDER, &DefaultTokens).await?;
    assert_eq!(response.address, TOKEN_HOLDER);
    assert_eq!(response.token_balances.len(), 3);

    let failures: Vec<&TokenBalance> = response
        .token_balances
        .iter()
        .filter(|b| b.error().is_some())
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].contract_address(), BROKEN_TOKEN);
    assert_eq!(failures[0].balance(), None);

    let first = &response.token_balances[0];
    assert_eq!(first.contract_address(), erc20_token(0));
    assert_eq!(first.balance(), Some(U256::from(0x1000)));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_erc20_sweep_pages() -> anyhow::Result<()> {
    init_logger(false);
    let (_server, client) = start_mock().await?;

    let first = client
        .get_token_balances(TOKEN_HOLDER, &Erc20Tokens::first_page())
        .await?;
    assert_eq!(first.response.token_balances.len(), ERC20_PAGE_SIZE);
    let key = first.page_key().map(str::to_string);
    assert!(key.is_some());

    let pages: Vec<_> = client.token_balances_pages(TOKEN_HOLDER).try_collect().await?;
    assert_eq!(pages.len(), 3);
    assert!(pages.last().is_some_and(|p| p.is_last_page()));
    assert!(pages.iter().all(|p| p.response.address == TOKEN_HOLDER));

    let contracts: Vec<_> = pages
        .iter()
        .flat_map(|p| p.response.token_balances.iter().map(|b| b.contract_address()))
        .collect();
    assert_eq!(contracts.len() as u64, ERC20_TOKEN_COUNT);
    let unique: HashSet<_> = contracts.iter().collect();
    assert_eq!(unique.len(), contracts.len());

    let resumed = client
        .get_token_balances(TOKEN_HOLDER, &Erc20Tokens::after(key.unwrap_or_default()))
        .await?;
    assert_eq!(resumed.response.token_balances, pages[1].response.token_balances);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_contract_tokens() -> anyhow::Result<()> {
    init_logger(false);
    let (server, client) = start_mock().await?;

    let query = ContractTokens(vec![erc20_token(7), USDC]);
    let response = client.get_token_balances(TOKEN_HOLDER, &query).await?;
    assert_eq!(response.token_balances.len(), 2);
    assert_eq!(response.token_balances[0].balance(), Some(U256::from(0x1007)));
    assert_eq!(response.token_balances[1].error(), Some("contract not held"));

    let requests = server.controller().rpc_requests();
    let err = client
        .get_token_balances(TOKEN_HOLDER, &ContractTokens(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyContractList));
    assert_eq!(server.controller().rpc_requests(), requests);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_token_metadata_and_formatting() -> anyhow::Result<()> {
    init_logger(false);
    let (_server, client) = start_mock().await?;

    let metadata = client.get_token_metadata(USDC).await?;
    assert_eq!(metadata.decimals, Some(6));
    assert_eq!(metadata.symbol.as_deref(), Some("USDC"));
    assert!(metadata.logo.is_none());

    let response = client
        .get_token_balances(TOKEN_HOLDER, &ContractTokens(vec![erc20_token(0)]))
        .await?;
    let formatted = response.token_balances[0].formatted(2);
    assert_eq!(formatted, Some(BigDecimal::from_str("40.96")?));
    Ok(())
}
