//! Demo: fetch data through `try_await!` and branch on the failure kind.
//!
//! Run with: cargo run --example fetch_data
//! Set `RUST_LOG=debug` for more output.

use thiserror::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use try_await::{try_await, AnyOf2, Caught, Failure, Result};

#[derive(Error, Debug)]
#[error("{0}")]
pub struct NetworkError(String);

#[derive(Error, Debug)]
#[error("{0}")]
pub struct DatabaseError(String);

// Simulated source: fails with a different kind depending on the key.
async fn fetch_data(key: &str) -> Result<String> {
    match key {
        "users" => Err(Failure::wrap(DatabaseError(
            "Failed to fetch data due to network issue".into(),
        ))),
        "feed" => Err(Failure::wrap(NetworkError("connection reset".into()))),
        "quota" => Err(Failure::msg("rate limit exceeded")),
        _ => Ok(format!("payload for {key}")),
    }
}

async fn show(key: &str) -> Result<()> {
    match try_await!(fetch_data(key), [DatabaseError, NetworkError]).await? {
        Caught::Failed(AnyOf2::First(e)) => {
            error!(key, reason = e.message(), "database error occurred");
        }
        Caught::Failed(AnyOf2::Second(e)) => {
            error!(key, reason = e.message(), "network error occurred");
        }
        Caught::Value(data) => info!(key, %data, "data fetched successfully"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    for key in ["settings", "users", "feed"] {
        show(key).await?;
    }

    // "quota" fails with a kind `show` did not list, so it escapes through `?`.
    match show("quota").await {
        Ok(()) => info!("quota lookup succeeded"),
        Err(unexpected) => {
            warn!(reason = unexpected.message(), "unexpected failure propagated");
            debug!("{unexpected}");
        }
    }

    // Without a list, everything is converted.
    let caught = try_await(fetch_data("quota")).await;
    if let (Some(e), _) = caught.into_pair() {
        info!(reason = e.message(), "caught without a selector");
    }

    Ok(())
}
