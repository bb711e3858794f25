use anyhow::{Context, Result};
use clap::Parser;
use docqa::{
    api::routes::create_router,
    utils::{logging, toml_config::DocQaConfig},
    AppState, Pipeline,
};
use std::path::PathBuf;

/// Single-document question answering server
#[derive(Parser, Debug)]
#[command(name = "docqa-server", version, about)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "docqa.toml", env = "DOCQA_CONFIG")]
    config: PathBuf,

    /// Override the listen address
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        DocQaConfig::load(&cli.config)
            .with_context(|| format!("Failed to load {}", cli.config.display()))?
    } else {
        let config = DocQaConfig::default();
        config.validate()?;
        config
    };

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    logging::init(&config.server).context("Failed to initialise logging")?;
    if !cli.config.exists() {
        tracing::info!(path = %cli.config.display(), "No config file found, using defaults");
    }

    config.validate_env()?;

    let pipeline = Pipeline::from_config(&config)?;
    tracing::info!(
        provider = pipeline.store().provider_name(),
        index = %config.vector_store.index_name,
        "Ensuring vector index exists"
    );
    pipeline.store().ensure_index().await?;

    tokio::fs::create_dir_all(&config.server.upload_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload dir {}",
                config.server.upload_dir.display()
            )
        })?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, pipeline);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
