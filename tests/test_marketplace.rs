use alchemy_sdk::marketplace::{Marketplace, RefreshState};
use alchemy_sdk_test_utils::fixtures::{COLLECTION, SPAM_COLLECTION, UNKNOWN_CONTRACT};
use alchemy_sdk_test_utils::{init_logger, start_mock};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_floor_price() -> anyhow::Result<()> {
    init_logger(false);
    let (_server, client) = start_mock().await?;

    let response = client.get_floor_price(COLLECTION).await?;
    let open_sea = response
        .get(Marketplace::OpenSea)
        .quote()
        .ok_or_else(|| anyhow::anyhow!("expected an OpenSea quote"))?;
    assert_eq!(open_sea.floor_price, 42.5);
    assert_eq!(open_sea.price_currency, "ETH");
    assert_eq!(
        response.get(Marketplace::LooksRare).error(),
        Some("unable to fetch floor price")
    );
    assert_eq!(response.lowest().map(|(m, _)| m), Some(Marketplace::OpenSea));

    let unknown = client.get_floor_price(UNKNOWN_CONTRACT).await?;
    assert_eq!(unknown.iter().count(), 2);
    assert!(unknown.iter().all(|(_, price)| price.error().is_some()));
    assert!(unknown.lowest().is_none());
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_refresh_contract_progress() -> anyhow::Result<()> {
    init_logger(true);
    let (_server, client) = start_mock().await?;

    let first = client.refresh_contract(SPAM_COLLECTION).await?;
    assert_eq!(first.contract_address(), SPAM_COLLECTION);
    assert_eq!(first.refresh_state(), RefreshState::Queued);
    assert!(first.refresh_state().is_initial_observation());
    assert!(first.progress().is_none());

    let mut previous = first.refresh_state();
    let mut progress = vec![];
    for _ in 0..3 {
        let result = client.refresh_contract(SPAM_COLLECTION).await?;
        assert!(previous.can_transition_to(result.refresh_state()));
        assert_eq!(result.refresh_state().has_progress(), result.progress().is_some());
        previous = result.refresh_state();
        progress.push(result.progress_value());
    }
    assert_eq!(previous, RefreshState::Finished);
    assert_eq!(progress, vec![None, Some(50), Some(100)]);

    let unknown = client.refresh_contract(UNKNOWN_CONTRACT).await?;
    assert_eq!(unknown.refresh_state(), RefreshState::DoesNotExist);
    assert!(unknown.refresh_state().is_terminal());
    Ok(())
}
