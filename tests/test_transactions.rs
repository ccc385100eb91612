use alchemy_sdk::transaction::{SendPrivateTransactionOptions, TransactionReceiptsParams};
use alchemy_sdk::{B256, BlockNumberOrTag, Bytes, Error};
use alloy::network::ReceiptResponse;
use alloy::primitives::keccak256;
use alchemy_sdk_test_utils::fixtures::{EMPTY_BLOCK, FULL_BLOCK, LATEST_BLOCK, block_hash};
use alchemy_sdk_test_utils::{init_logger, start_mock};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_transaction_receipts() -> anyhow::Result<()> {
    init_logger(false);
    let (_server, client) = start_mock().await?;

    let full = client.get_transaction_receipts(FULL_BLOCK).await?;
    let receipts = full.receipts.as_deref().unwrap_or_default();
    assert_eq!(receipts.len(), 2);
    assert!(receipts.iter().all(|r| r.block_number == Some(FULL_BLOCK)));
    assert!(receipts.iter().all(|r| r.status()));

    let by_hash = client.get_transaction_receipts(block_hash(FULL_BLOCK)).await?;
    assert_eq!(by_hash, full);

    // An empty block and an unknown block are different answers.
    let empty = client.get_transaction_receipts(EMPTY_BLOCK).await?;
    assert_eq!(empty.receipts, Some(vec![]));
    assert!(!empty.is_unknown_block());

    let unknown = client.get_transaction_receipts(B256::repeat_byte(0xab)).await?;
    assert!(unknown.is_unknown_block());

    let latest = client
        .get_transaction_receipts(BlockNumberOrTag::Latest)
        .await?;
    assert!(latest.is_unknown_block());
    Ok(())
}

#[test]
fn test_receipts_params_need_exactly_one_selector() {
    let both = TransactionReceiptsParams::new(Some(FULL_BLOCK.into()), Some(block_hash(FULL_BLOCK)));
    assert!(matches!(both, Err(Error::InvalidReceiptsParams(_))));
    let neither = TransactionReceiptsParams::new(None, None);
    assert!(matches!(neither, Err(Error::InvalidReceiptsParams(_))));
}

#[tokio::test]
#[serial]
async fn test_block_number() -> anyhow::Result<()> {
    init_logger(false);
    let (_server, client) = start_mock().await?;

    assert_eq!(client.get_block_number().await?, LATEST_BLOCK);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_private_transactions() -> anyhow::Result<()> {
    init_logger(false);
    let (_server, client) = start_mock().await?;

    let signed = Bytes::from_static(&[0x02, 0xf8, 0x6c, 0x01]);
    let hash = client
        .send_private_transaction(
            signed.clone(),
            Some(LATEST_BLOCK + 10),
            Some(SendPrivateTransactionOptions { fast: true }),
        )
        .await?;
    assert_eq!(hash, keccak256(&signed));

    assert!(client.cancel_private_transaction(hash).await?);
    // Already cancelled.
    assert!(!client.cancel_private_transaction(hash).await?);

    let err = client
        .send_private_transaction(Bytes::new(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RpcErrorResponse { code: -32602, .. }));
    assert!(!err.is_transient());
    Ok(())
}
