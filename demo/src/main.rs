use alchemy_sdk::balance::{DefaultTokens, TokenBalance};
use alchemy_sdk::nft::GetBaseNftsForOwnerOptions;
use alchemy_sdk::transfers::{AssetTransfersCategory, AssetTransfersOrder, AssetTransfersParams};
use alchemy_sdk::{Address, AlchemyClient, AlchemySettings, Network};
use clap::Parser;
use futures::StreamExt;
use log::info;

/// Prints a short portfolio summary of an address.
#[derive(Parser, Debug)]
struct Args {
    /// Address to inspect.
    #[arg(default_value = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045")]
    address: Address,
    /// Network name, e.g. `eth-mainnet` or `polygon-mainnet`.
    #[arg(long, default_value = "eth-mainnet")]
    network: Network,
    /// Alchemy API key.
    #[arg(long, env = "ALCHEMY_API_KEY", default_value = "demo")]
    api_key: String,
    /// Maximum number of NFT pages to walk.
    #[arg(long, default_value_t = 2)]
    nft_pages: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings = AlchemySettings::builder()
        .api_key(args.api_key)
        .network(args.network)
        .build();
    let client = AlchemyClient::new(settings)?;
    info!("Latest block on {}: {}", args.network, client.get_block_number().await?);

    info!("Fetching token balances of {}...", args.address);
    let balances = client.get_token_balances(args.address, &DefaultTokens).await?;
    for balance in &balances.token_balances {
        match balance {
            TokenBalance::Success(success) if !success.token_balance.is_zero() => {
                let metadata = client.get_token_metadata(success.contract_address).await?;
                let amount = balance.formatted(metadata.decimals.unwrap_or(18));
                info!(
                    "  {}: {}",
                    metadata.symbol.as_deref().unwrap_or("???"),
                    amount.map(|a| a.to_string()).unwrap_or_default()
                );
            }
            TokenBalance::Failure(failure) => {
                info!("  {} failed: {}", failure.contract_address, failure.error);
            }
            _ => {}
        }
    }

    info!("Fetching the latest outgoing transfers...");
    let params = AssetTransfersParams::builder()
        .from_address(args.address)
        .category(vec![
            AssetTransfersCategory::External,
            AssetTransfersCategory::Erc20,
        ])
        .order(AssetTransfersOrder::Descending)
        .max_count(10)
        .build();
    let transfers = client.get_asset_transfers(&params).await?;
    for transfer in &transfers.transfers {
        info!(
            "  block {} {:?} {} {}",
            transfer.block_num,
            transfer.category,
            transfer.value.unwrap_or_default(),
            transfer.asset.as_deref().unwrap_or("")
        );
    }

    info!("Walking NFT pages...");
    let mut pages = std::pin::pin!(
        client
            .nfts_for_owner_pages(args.address, GetBaseNftsForOwnerOptions::default())
            .take(args.nft_pages)
    );
    while let Some(page) = pages.next().await {
        let page = page?;
        info!(
            "  {} NFTs on this page, {} in total",
            page.owned_nfts.len(),
            page.total_count.unwrap_or_default()
        );
    }

    Ok(())
}
