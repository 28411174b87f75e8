use anyhow::{Context, Result};
use promo_sender::{
    client::MessageClient,
    config::Config,
    dispatch::Dispatcher,
    ledger::RecipientLedger,
    templates::{MediaLibrary, TemplateCatalog},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("promo_sender=info".parse()?),
        )
        .init();

    info!("🚀 Starting bulk promotional messaging");

    let config = Config::from_env();
    if let Err(e) = config.ensure_valid() {
        error!("❌ {}", e);
        return Err(e.into());
    }

    let mut ledger = RecipientLedger::open(&config.pending_file, &config.sent_file)
        .context("Failed to load recipient ledger")?;
    let catalog = TemplateCatalog::load(&config.templates_file)
        .context("Failed to load template catalog")?;

    if ledger.pending().is_empty() || catalog.is_empty() {
        warn!("❌ Cannot proceed without numbers and templates. Exiting.");
        return Ok(());
    }

    let client = MessageClient::new(
        config.credentials(),
        &config.base_url,
        config.request_timeout(),
    )
    .context("Failed to build HTTP client")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Interrupt received, stopping after the current step");
            let _ = shutdown_tx.send(true);
        }
    });

    let media = MediaLibrary::new(&config.media_base_url, config.media_image_count);
    let report = Dispatcher::new(
        &client,
        &mut ledger,
        &catalog,
        media,
        config.pacing(),
        shutdown_rx,
        StdRng::from_entropy(),
    )
    .run()
    .await
    .context("Sending loop aborted")?;

    for (number, reason) in report.failed() {
        warn!("Not sent to {}: {}", number, reason);
    }

    if report.interrupted {
        info!("Script interrupted by user. Exiting gracefully.");
    } else {
        info!("✓ All recipients processed: {}", report.summary());
    }

    Ok(())
}
