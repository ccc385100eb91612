use alchemy_sdk::balance::DefaultTokens;
use alchemy_sdk::nft::GetBaseNftsForOwnerOptions;
use alchemy_sdk::{AlchemyClient, Error, RetryConfig};
use alchemy_sdk_test_utils::fixtures::{COLLECTION, NFT_OWNER, TOKEN_HOLDER};
use alchemy_sdk_test_utils::{AlchemyMockServer, init_logger, start_mock};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_rest_retry_on_rate_limit() -> anyhow::Result<()> {
    init_logger(true);
    let (server, client) = start_mock().await?;

    server.controller().fail_next_rest_requests(2);
    let floor = client.get_floor_price(COLLECTION).await?;
    assert!(floor.lowest().is_some());
    assert_eq!(server.controller().rest_requests(), 3);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_rpc_retry_on_rate_limit() -> anyhow::Result<()> {
    init_logger(true);
    let (server, client) = start_mock().await?;

    server.controller().fail_next_rpc_requests(3);
    let balances = client.get_token_balances(TOKEN_HOLDER, &DefaultTokens).await?;
    assert_eq!(balances.token_balances.len(), 3);
    assert_eq!(server.controller().rpc_requests(), 4);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_retry_budget_exhausted() -> anyhow::Result<()> {
    init_logger(true);
    let (server, client) = start_mock().await?;

    server.controller().fail_next_rest_requests(10);
    let err = client
        .get_nfts_for_owner(NFT_OWNER, &GetBaseNftsForOwnerOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatusError { status: 429, .. }));
    assert!(err.is_transient());
    // One request plus three retries.
    assert_eq!(server.controller().rest_requests(), 4);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_disabled_retry() -> anyhow::Result<()> {
    init_logger(true);
    let server = AlchemyMockServer::start().await?;
    let mut settings = server.settings()?;
    settings.retry = RetryConfig::disabled();
    let client = AlchemyClient::new(settings)?;

    server.controller().fail_next_rpc_requests(1);
    let err = client.get_block_number().await.unwrap_err();
    assert!(matches!(err, Error::RateLimited(_)));
    assert_eq!(server.controller().rpc_requests(), 1);

    assert!(client.get_block_number().await.is_ok());
    Ok(())
}
