use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{B256, Bytes, U64};
use alloy::rpc::types::TransactionReceipt;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Block selector of `alchemy_getTransactionReceipts`: exactly one of number or hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionReceiptsParams {
    BlockNumber(BlockNumberOrTag),
    BlockHash(B256),
}

impl TransactionReceiptsParams {
    /// Builds the selector from optional parts, rejecting both and neither.
    pub fn new(
        block_number: Option<BlockNumberOrTag>,
        block_hash: Option<B256>,
    ) -> Result<Self, Error> {
        match (block_number, block_hash) {
            (Some(number), None) => Ok(Self::BlockNumber(number)),
            (None, Some(hash)) => Ok(Self::BlockHash(hash)),
            (Some(_), Some(_)) => Err(Error::InvalidReceiptsParams(
                "blockNumber and blockHash are mutually exclusive".to_string(),
            )),
            (None, None) => Err(Error::InvalidReceiptsParams(
                "one of blockNumber or blockHash is required".to_string(),
            )),
        }
    }
}

impl From<BlockNumberOrTag> for TransactionReceiptsParams {
    fn from(number: BlockNumberOrTag) -> Self {
        Self::BlockNumber(number)
    }
}

impl From<u64> for TransactionReceiptsParams {
    fn from(number: u64) -> Self {
        Self::BlockNumber(BlockNumberOrTag::Number(number))
    }
}

impl From<B256> for TransactionReceiptsParams {
    fn from(hash: B256) -> Self {
        Self::BlockHash(hash)
    }
}

/// Receipts of every transaction in a block.
///
/// `None` means the block is unknown, `Some(vec![])` means the block has no transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceiptsResponse {
    pub receipts: Option<Vec<TransactionReceipt>>,
}

impl TransactionReceiptsResponse {
    pub fn is_unknown_block(&self) -> bool {
        self.receipts.is_none()
    }
}

/// Preferences of `eth_sendPrivateTransaction`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPrivateTransactionOptions {
    /// Send to all builders at once rather than to Flashbots only.
    pub fast: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendPrivateTransactionRequest {
    pub tx: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_block_number: Option<U64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<SendPrivateTransactionOptions>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CancelPrivateTransactionRequest {
    pub tx_hash: B256,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_need_exactly_one_key() {
        assert!(matches!(
            TransactionReceiptsParams::new(None, None),
            Err(Error::InvalidReceiptsParams(_))
        ));
        assert!(matches!(
            TransactionReceiptsParams::new(Some(BlockNumberOrTag::Latest), Some(B256::ZERO)),
            Err(Error::InvalidReceiptsParams(_))
        ));
        assert_eq!(
            TransactionReceiptsParams::new(None, Some(B256::ZERO)).unwrap(),
            TransactionReceiptsParams::BlockHash(B256::ZERO)
        );
    }

    #[test]
    fn test_params_wire_shape() {
        assert_eq!(
            serde_json::to_value(TransactionReceiptsParams::from(17_000_000u64)).unwrap(),
            json!({ "blockNumber": "0x1036640" })
        );
        assert_eq!(
            serde_json::to_value(TransactionReceiptsParams::from(B256::ZERO)).unwrap(),
            json!({ "blockHash": B256::ZERO })
        );
    }

    #[test]
    fn test_null_and_empty_receipts_differ() {
        let unknown: TransactionReceiptsResponse =
            serde_json::from_value(json!({ "receipts": null })).unwrap();
        assert!(unknown.is_unknown_block());

        let empty: TransactionReceiptsResponse =
            serde_json::from_value(json!({ "receipts": [] })).unwrap();
        assert_eq!(empty.receipts, Some(vec![]));
    }

    #[test]
    fn test_private_transaction_request_shape() {
        let request = SendPrivateTransactionRequest {
            tx: Bytes::from_static(&[0xde, 0xad]),
            max_block_number: Some(U64::from(100)),
            preferences: Some(SendPrivateTransactionOptions { fast: true }),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "tx": "0xdead", "maxBlockNumber": "0x64", "preferences": { "fast": true } })
        );

        let cancel = CancelPrivateTransactionRequest { tx_hash: B256::ZERO };
        assert_eq!(
            serde_json::to_value(&cancel).unwrap(),
            json!({ "txHash": B256::ZERO })
        );
    }
}
