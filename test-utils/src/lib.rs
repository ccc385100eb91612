//! Test helpers for `alchemy-sdk`: logger setup and an in-process mock of the Alchemy API.

use alchemy_sdk::AlchemyClient;

pub mod api;
pub mod fixtures;
pub mod server;

pub use server::{AlchemyMockServer, MOCK_API_KEY, MockController};

/// Initializes `env_logger` once per test binary.
/// With `verbose`, debug logs of the SDK and the mock are shown.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose {
        "info,alchemy_sdk=debug,alchemy_sdk_test_utils=debug"
    } else {
        "info"
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .is_test(true)
        .try_init();
}

/// Starts a mock server and a client connected to it.
pub async fn start_mock() -> anyhow::Result<(AlchemyMockServer, AlchemyClient)> {
    let server = AlchemyMockServer::start().await?;
    let client = AlchemyClient::new(server.settings()?)?;
    Ok((server, client))
}
