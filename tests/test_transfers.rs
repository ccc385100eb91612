use alchemy_sdk::transfers::{
    AssetTransfersCategory, AssetTransfersOrder, AssetTransfersParams, TransferToken,
};
use alchemy_sdk::{BlockNumberOrTag, Error};
use alchemy_sdk_test_utils::fixtures::{COLLECTION, COUNTERPARTY, FULL_BLOCK, USDC, WALLET};
use alchemy_sdk_test_utils::{init_logger, start_mock};
use futures::TryStreamExt;
use serial_test::serial;

fn all_categories() -> Vec<AssetTransfersCategory> {
    vec![
        AssetTransfersCategory::External,
        AssetTransfersCategory::Internal,
        AssetTransfersCategory::Erc20,
        AssetTransfersCategory::Erc721,
        AssetTransfersCategory::Erc1155,
    ]
}

#[tokio::test]
#[serial]
async fn test_transfers_by_category() -> anyhow::Result<()> {
    init_logger(false);
    let (_server, client) = start_mock().await?;

    let params = AssetTransfersParams::builder().category(all_categories()).build();
    let response = client.get_asset_transfers(&params).await?;
    assert_eq!(response.transfers.len(), 5);
    assert!(response.page_key.is_none());

    let params = AssetTransfersParams::builder()
        .category(vec![AssetTransfersCategory::Erc20, AssetTransfersCategory::Erc721])
        .build();
    let response = client.get_asset_transfers(&params).await?;
    assert_eq!(response.transfers.len(), 2);
    match response.transfers[0].token() {
        TransferToken::Erc20 { contract, value } => {
            assert_eq!(contract, Some(USDC));
            assert_eq!(value, Some(100.0));
        }
        other => panic!("expected an erc20 transfer, got {other:?}"),
    }
    match response.transfers[1].token() {
        TransferToken::Erc721 { contract, token_id } => {
            assert_eq!(contract, Some(COLLECTION));
            assert_eq!(token_id, "7");
        }
        other => panic!("expected an erc721 transfer, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_transfers_by_address_and_block_range() -> anyhow::Result<()> {
    init_logger(false);
    let (_server, client) = start_mock().await?;

    let params = AssetTransfersParams::builder()
        .category(all_categories())
        .from_address(WALLET)
        .build();
    let outgoing = client.get_asset_transfers(&params).await?;
    assert_eq!(outgoing.transfers.len(), 2);
    assert!(outgoing.transfers.iter().all(|t| t.from == WALLET));

    let params = AssetTransfersParams::builder()
        .category(all_categories())
        .to_address(WALLET)
        .from_block(BlockNumberOrTag::Number(FULL_BLOCK + 2))
        .to_block(BlockNumberOrTag::Number(FULL_BLOCK + 3))
        .build();
    let incoming = client.get_asset_transfers(&params).await?;
    assert_eq!(incoming.transfers.len(), 1);
    assert_eq!(incoming.transfers[0].category, AssetTransfersCategory::Erc1155);
    assert_eq!(incoming.transfers[0].from, COUNTERPARTY);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_transfers_with_metadata() -> anyhow::Result<()> {
    init_logger(false);
    let (_server, client) = start_mock().await?;

    let params = AssetTransfersParams::builder()
        .category(all_categories())
        .order(AssetTransfersOrder::Descending)
        .build();
    let response = client
        .get_asset_transfers_with_metadata(&params.into())
        .await?;
    assert_eq!(response.transfers.len(), 5);
    let first = &response.transfers[0];
    assert_eq!(first.transfer.category, AssetTransfersCategory::Internal);
    assert_eq!(first.metadata.block_timestamp, "2023-06-01T00:04:00.000Z");
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_transfers_pages() -> anyhow::Result<()> {
    init_logger(false);
    let (_server, client) = start_mock().await?;

    let params = AssetTransfersParams::builder()
        .category(all_categories())
        .max_count(2)
        .build();
    let pages: Vec<_> = client.asset_transfers_pages(params).try_collect().await?;
    let sizes: Vec<usize> = pages.iter().map(|p| p.transfers.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);

    let blocks: Vec<&str> = pages
        .iter()
        .flat_map(|p| p.transfers.iter().map(|t| t.block_num.as_str()))
        .collect();
    assert_eq!(blocks, vec!["0x64", "0x65", "0x66", "0x67", "0x68"]);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_empty_category_list_is_rejected_locally() -> anyhow::Result<()> {
    init_logger(false);
    let (server, client) = start_mock().await?;

    let params = AssetTransfersParams::builder().category(vec![]).build();
    let err = client.get_asset_transfers(&params).await.unwrap_err();
    assert!(matches!(err, Error::EmptyCategoryList));

    let err = client
        .get_asset_transfers_with_metadata(&params.into())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyCategoryList));

    assert_eq!(server.controller().rpc_requests(), 0);
    Ok(())
}
