use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use sensorpanel::config::PanelConfig;
use sensorpanel::mqtt::rumqtt::RumqttTransport;
use sensorpanel::runtime::{PageCommand, PageKind, PageRuntime};
use sensorpanel::ui::{ChannelPresenter, PanelUi};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "sensorpanel", about = "MQTT sensor publisher and dashboard")]
struct Cli {
    /// Which page to open
    #[arg(value_enum)]
    page: PageKind,

    /// Config file, defaults to <config dir>/sensorpanel/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Broker host, overrides the config file
    #[arg(long)]
    host: Option<String>,

    /// Broker WebSocket port, overrides the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;
    let cli = Cli::parse();

    let config = PanelConfig::load(cli.config.as_deref())
        .await?
        .with_endpoint(cli.host, cli.port);
    info!("Using broker {}", config.broker.ws_url());

    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::channel(32);
    let presenter = Arc::new(ChannelPresenter::new(ui_tx));

    let runtime = PageRuntime::new(
        cli.page,
        RumqttTransport::default(),
        config.broker.clone(),
        presenter,
        command_rx,
    );
    let runtime_handle = tokio::spawn(runtime.run());

    info!("Starting UI for {}", cli.page);
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_title(cli.page.to_string())
        .with_inner_size([900.0, 640.0]);

    let targets = config.publisher.targets.clone();
    let shutdown_tx = command_tx.clone();
    let page = cli.page;
    eframe::run_native(
        &page.to_string(),
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(PanelUi::new(
                cc, page, &targets, ui_rx, command_tx,
            )))
        }),
    )
    .map_err(|e| eyre!("Failed to run UI: {}", e))?;

    if shutdown_tx.send(PageCommand::Shutdown).await.is_err() {
        warn!("Page runtime already stopped");
    }
    runtime_handle
        .await
        .map_err(|e| eyre!("Page runtime panicked: {}", e))?;

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
