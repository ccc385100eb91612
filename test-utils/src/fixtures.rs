//! Synthetic data served by the mock server.

use alchemy_sdk::marketplace::RefreshState;
use alloy::primitives::{Address, B256, U256, address, keccak256};
use serde_json::{Value, json};

/// Owner of [`OWNED_NFT_COUNT`] NFTs of [`COLLECTION`].
pub const NFT_OWNER: Address = address!("0x00000000000000000000000000000000000a11ce");
/// Owner of two [`COLLECTION`] NFTs and three spam NFTs.
pub const SPAM_VICTIM: Address = address!("0x00000000000000000000000000000000000b0b00");
pub const COLLECTION: Address = address!("0x00000000000000000000000000000000c011ec71");
pub const SPAM_COLLECTION: Address = address!("0x000000000000000000000000000000005ba55ba5");
/// Contract unknown to the mock.
pub const UNKNOWN_CONTRACT: Address = address!("0x000000000000000000000000000000000000dead");
pub const OWNED_NFT_COUNT: u64 = 250;

/// Holder of [`ERC20_TOKEN_COUNT`] ERC-20 tokens.
pub const TOKEN_HOLDER: Address = address!("0x0000000000000000000000000000000000700000");
pub const ERC20_TOKEN_COUNT: u64 = 250;
/// ERC-20 balances returned per page.
pub const ERC20_PAGE_SIZE: usize = 100;
/// Token whose balance lookup always fails.
pub const BROKEN_TOKEN: Address = address!("0x000000000000000000000000000000000000beef");

/// Wallet with one transfer of every category.
pub const WALLET: Address = address!("0x0000000000000000000000000000000000000a0a");
pub const COUNTERPARTY: Address = address!("0x0000000000000000000000000000000000000b0b");
pub const USDC: Address = address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");

/// Block with two transactions.
pub const FULL_BLOCK: u64 = 100;
/// Block without transactions.
pub const EMPTY_BLOCK: u64 = 101;
pub const LATEST_BLOCK: u64 = 120;

pub fn block_hash(number: u64) -> B256 {
    keccak256(number.to_be_bytes())
}

/// Address of the `index`-th ERC-20 token held by [`TOKEN_HOLDER`].
pub fn erc20_token(index: u64) -> Address {
    Address::from_word(B256::from(U256::from(0x1000 + index)))
}

#[derive(Debug, Clone)]
pub struct NftFixture {
    pub contract: Address,
    pub token_id: U256,
    pub token_type: &'static str,
    pub owner: Address,
    pub balance: u64,
    pub spam: bool,
}

impl NftFixture {
    /// Wire form of the NFT. Owned NFTs carry a balance, metadata is optional.
    pub fn to_json(&self, with_metadata: bool, owned: bool) -> Value {
        let mut nft = json!({
            "contract": { "address": self.contract },
            "id": {
                "tokenId": format!("0x{:064x}", self.token_id),
                "tokenMetadata": { "tokenType": self.token_type }
            }
        });
        if owned {
            nft["balance"] = json!(self.balance.to_string());
        }
        if with_metadata {
            let name = format!("Mock #{}", self.token_id);
            nft["title"] = json!(name);
            nft["description"] = json!(["A", "mock", "NFT"]);
            nft["tokenUri"] = json!({
                "raw": format!("ipfs://mock/{}", self.token_id),
                "gateway": format!("https://ipfs.io/ipfs/mock/{}", self.token_id)
            });
            nft["media"] = json!([{
                "raw": format!("ipfs://mock-image/{}", self.token_id),
                "gateway": format!("https://ipfs.io/ipfs/mock-image/{}", self.token_id)
            }]);
            nft["metadata"] = json!({ "name": name });
            nft["timeLastUpdated"] = json!("2023-06-01T00:00:00.000Z");
        }
        nft
    }
}

pub fn nfts() -> Vec<NftFixture> {
    let owned = (0..OWNED_NFT_COUNT).map(|id| NftFixture {
        contract: COLLECTION,
        token_id: U256::from(id),
        token_type: "ERC721",
        owner: NFT_OWNER,
        balance: 1,
        spam: false,
    });
    let victim = (1000..1002).map(|id| NftFixture {
        contract: COLLECTION,
        token_id: U256::from(id),
        token_type: "ERC721",
        owner: SPAM_VICTIM,
        balance: 1,
        spam: false,
    });
    let spam = (0..3).map(|id| NftFixture {
        contract: SPAM_COLLECTION,
        token_id: U256::from(id),
        token_type: "ERC1155",
        owner: SPAM_VICTIM,
        balance: 5,
        spam: true,
    });
    owned.chain(victim).chain(spam).collect()
}

pub fn contract_metadata(contract: Address) -> Option<Value> {
    let (name, symbol, total_supply, token_type) = match contract {
        COLLECTION => ("Mock Apes", "MAPE", "252", "ERC721"),
        SPAM_COLLECTION => ("Free Claim", "SPAM", "3", "ERC1155"),
        _ => return None,
    };
    Some(json!({
        "address": contract,
        "contractMetadata": {
            "name": name,
            "symbol": symbol,
            "totalSupply": total_supply,
            "tokenType": token_type
        }
    }))
}

pub fn floor_price(contract: Address) -> Value {
    let retrieved_at = "2023-06-01T00:00:00.000Z";
    if contract == COLLECTION {
        json!({
            "openSea": {
                "floorPrice": 42.5,
                "priceCurrency": "ETH",
                "collectionUrl": "https://opensea.io/collection/mock-apes",
                "retrievedAt": retrieved_at
            },
            "looksRare": {
                "error": "unable to fetch floor price",
                "retrievedAt": retrieved_at
            }
        })
    } else {
        json!({
            "openSea": { "error": "collection not found", "retrievedAt": retrieved_at },
            "looksRare": { "error": "collection not found", "retrievedAt": retrieved_at }
        })
    }
}

/// Refresh state reported by the `call`-th refresh request for `contract`.
pub fn refresh_state(contract: Address, call: u64) -> (RefreshState, Option<&'static str>) {
    if contract_metadata(contract).is_none() {
        return (RefreshState::DoesNotExist, None);
    }
    match call {
        0 => (RefreshState::Queued, None),
        1 => (RefreshState::AlreadyQueued, None),
        2 => (RefreshState::InProgress, Some("50")),
        _ => (RefreshState::Finished, Some("100")),
    }
}

pub fn token_balance(contract: Address) -> Value {
    if contract == BROKEN_TOKEN {
        return json!({ "contractAddress": contract, "tokenBalance": null, "error": "execution reverted" });
    }
    let balance = U256::from_be_slice(&contract[12..]);
    json!({
        "contractAddress": contract,
        "tokenBalance": format!("0x{balance:064x}"),
        "error": null
    })
}

pub fn token_metadata(contract: Address) -> Value {
    if contract == USDC {
        json!({ "decimals": 6, "logo": null, "name": "USD Coin", "symbol": "USDC" })
    } else {
        json!({ "decimals": 18, "logo": null, "name": "Mock Token", "symbol": "MOCK" })
    }
}

fn transfer_hash(index: u64) -> B256 {
    keccak256(format!("transfer-{index}"))
}

/// One transfer of each category, all involving [`WALLET`], in block order.
pub fn transfers() -> Vec<Value> {
    let nft_id = format!("0x{:064x}", 7);
    let mut transfers = vec![
        json!({
            "category": "external",
            "from": WALLET,
            "to": COUNTERPARTY,
            "value": 1.5,
            "asset": "ETH",
            "rawContract": { "value": "0x14d1120d7b160000", "address": null, "decimal": null }
        }),
        json!({
            "category": "erc20",
            "from": COUNTERPARTY,
            "to": WALLET,
            "value": 100.0,
            "asset": "USDC",
            "rawContract": { "value": "0x5f5e100", "address": USDC, "decimal": "0x6" }
        }),
        json!({
            "category": "erc721",
            "from": WALLET,
            "to": COUNTERPARTY,
            "value": null,
            "erc721TokenId": nft_id,
            "tokenId": nft_id,
            "asset": "MAPE",
            "rawContract": { "value": null, "address": COLLECTION, "decimal": null }
        }),
        json!({
            "category": "erc1155",
            "from": COUNTERPARTY,
            "to": WALLET,
            "value": null,
            "erc1155Metadata": [{ "tokenId": "0x1", "value": "0x5" }],
            "asset": null,
            "rawContract": { "value": null, "address": SPAM_COLLECTION, "decimal": null }
        }),
        json!({
            "category": "internal",
            "from": COUNTERPARTY,
            "to": WALLET,
            "value": 0.5,
            "asset": "ETH",
            "rawContract": { "value": "0x6f05b59d3b20000", "address": null, "decimal": null }
        }),
    ];
    for (index, transfer) in transfers.iter_mut().enumerate() {
        let index = index as u64;
        let hash = transfer_hash(index);
        let block = FULL_BLOCK + index;
        transfer["hash"] = json!(hash);
        transfer["uniqueId"] = json!(format!("{hash}:log:{index}"));
        transfer["blockNum"] = json!(format!("0x{block:x}"));
        transfer["metadata"] = json!({ "blockTimestamp": format!("2023-06-01T00:0{index}:00.000Z") });
    }
    transfers
}

/// Receipts of a block: `None` for unknown blocks.
pub fn receipts(block: u64) -> Option<Vec<Value>> {
    match block {
        FULL_BLOCK => Some((0..2).map(|index| receipt(block, index)).collect()),
        EMPTY_BLOCK => Some(vec![]),
        _ => None,
    }
}

fn receipt(block: u64, index: u64) -> Value {
    json!({
        "transactionHash": keccak256(format!("receipt-{block}-{index}")),
        "transactionIndex": format!("0x{index:x}"),
        "blockHash": block_hash(block),
        "blockNumber": format!("0x{block:x}"),
        "from": WALLET,
        "to": COUNTERPARTY,
        "cumulativeGasUsed": format!("0x{:x}", 21000 * (index + 1)),
        "gasUsed": "0x5208",
        "contractAddress": null,
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "status": "0x1",
        "effectiveGasPrice": "0x3b9aca00",
        "type": "0x2"
    })
}

/// A pending transaction announced to subscribers.
#[derive(Debug, Clone)]
pub struct PendingFixture {
    pub hash: B256,
    pub from: Address,
    pub to: Address,
    pub nonce: u64,
}

impl PendingFixture {
    pub fn to_json(&self) -> Value {
        json!({
            "hash": self.hash,
            "nonce": format!("0x{:x}", self.nonce),
            "blockHash": null,
            "blockNumber": null,
            "transactionIndex": null,
            "from": self.from,
            "to": self.to,
            "value": "0x1",
            "gas": "0x5208",
            "maxFeePerGas": "0x3b9aca00",
            "maxPriorityFeePerGas": "0x3b9aca00",
            "input": "0x",
            "accessList": [],
            "chainId": "0x1",
            "type": "0x2",
            "v": "0x0",
            "yParity": "0x0",
            "r": "0x1",
            "s": "0x1"
        })
    }
}

/// Pending transactions: wallet to counterparty, counterparty to wallet, and one unrelated.
pub fn pending_transactions() -> Vec<PendingFixture> {
    let stranger = address!("0x0000000000000000000000000000000000005555");
    [
        (WALLET, COUNTERPARTY),
        (COUNTERPARTY, WALLET),
        (stranger, USDC),
    ]
    .into_iter()
    .enumerate()
    .map(|(nonce, (from, to))| PendingFixture {
        hash: keccak256(format!("pending-{nonce}")),
        from,
        to,
        nonce: nonce as u64,
    })
    .collect()
}
