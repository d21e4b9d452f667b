// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! terraced: the terrace workspace operator.

use kube::Client;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), kube::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let client = Client::try_default().await?;
    tracing::info!("starting workspace controller");
    terrace_operator::controller::run(client).await;
    Ok(())
}
