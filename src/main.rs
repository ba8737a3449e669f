use anyhow::Context;
use clap::Parser;
use eddn_relay::retention::{MongoStore, RetentionStore};
use eddn_relay::transport::AppState;
use eddn_relay::{ingestor, logging, transport, Cli, Relay};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::install(cli.log_level);

    if let Err(err) = run(cli).await {
        tracing::error!(error = ?err, "fatal error");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store: Option<Arc<dyn RetentionStore>> = if cli.use_store {
        let client = mongodb::Client::with_uri_str(&cli.store_uri)
            .await
            .context("connecting to retention store")?;
        let store = MongoStore::new(&client, &cli.store_database, cli.cache_ttl());
        store.initialize().await.context("initializing retention store indexes")?;
        Some(Arc::new(store))
    } else {
        None
    };

    let relay = Arc::new(Relay::new());
    let cancel = CancellationToken::new();

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received shutdown signal");
            signal_cancel.cancel();
        }
    });

    let ingestor_handle = {
        let relay = relay.clone();
        let store = store.clone();
        let cancel = cancel.clone();
        tokio::spawn(ingestor::run(
            cli.upstream_url.clone(),
            cli.upstream_timeout(),
            relay,
            store,
            cancel,
        ))
    };

    let addr = format!("{}:{}", cli.relay_host, cli.relay_port)
        .parse()
        .context("parsing relay bind address")?;
    let state = Arc::new(AppState { relay, store });

    transport::serve(addr, state, cancel.clone()).await?;

    cancel.cancel();
    ingestor_handle.await.context("ingestor task panicked")??;

    Ok(())
}
