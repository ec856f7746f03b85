//! Looks up airports matching a keyword
//!
//! Credentials come from `AMADEUS_CLIENT_ID` and `AMADEUS_CLIENT_SECRET`.
//!
//! ```sh
//! cargo run --example fetch_token -- LON
//! ```

use amadeus::{Amadeus, LogLevel, Options};
use anyhow::Context;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let keyword = std::env::args().nth(1).unwrap_or_else(|| "LON".to_string());

    let amadeus = Amadeus::new(Options::new().log_level(LogLevel::Warn))
        .context("Failed to configure the Amadeus client")?;

    let token = amadeus
        .client()
        .access_token()
        .bearer_token()
        .await
        .context("Failed to fetch an access token")?;
    tracing::info!("Fetched access token ({} chars)", token.len());

    let response = amadeus
        .client()
        .get(
            "/v1/reference-data/locations",
            json!({ "keyword": keyword, "subType": "AIRPORT" }),
        )
        .await
        .context("Location search failed")?;

    let locations = response.data().and_then(|data| data.as_array());
    for location in locations.into_iter().flatten() {
        println!(
            "{} {}",
            location["iataCode"].as_str().unwrap_or("???"),
            location["name"].as_str().unwrap_or_default()
        );
    }

    Ok(())
}
