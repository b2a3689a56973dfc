use color_eyre::{eyre::eyre, Result};
use padmapper::bridge::{CollectorHandle, Forwarder};
use padmapper::config::BridgeConfig;
use padmapper::VirtualXboxController;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => BridgeConfig::default_path()?,
    };
    info!("Loading config from {}", config_path.display());
    let config = BridgeConfig::load_or_default(&config_path).await?;

    // The pad has to exist before gilrs enumerates, so it can be skipped
    let mut controller = VirtualXboxController::new(config.device_settings());
    controller
        .create()
        .map_err(|e| eyre!("Failed to create virtual controller: {}", e))?;

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, shutting down"),
            Err(e) => error!("Unable to listen for Ctrl-C: {}", e),
        }
        ctrl_c_cancel.cancel();
    });

    let (event_sender, event_receiver) = mpsc::channel(1000);

    let collector = CollectorHandle::spawn(
        Some(config.collector_settings()),
        event_sender,
        cancel.clone(),
    )
    .await
    .map_err(|e| eyre!("Failed to spawn collector: {}", e))?;

    Forwarder::new(controller, config.forwarder_settings())
        .run(event_receiver, cancel.clone())
        .await;

    cancel.cancel();
    collector.join().await;

    info!("Bridge stopped");
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
