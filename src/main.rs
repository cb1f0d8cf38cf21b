use anyhow::Context;
use devbook::{
    api::routes::build_app,
    cli::{Cli, Commands},
    utils::toml_config::DevbookConfig,
    AppState, TokenService, TursoClient,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &DevbookConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level))
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.server.log_format == "json" {
        builder.json().with_target(false).try_init()
    } else {
        builder.with_target(false).try_init()
    };

    if let Err(e) = installed {
        eprintln!("failed to install tracing subscriber: {}", e);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}

async fn serve(config: DevbookConfig) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;

    let secret = config.secret_key()?;
    let tokens = TokenService::new(&secret);
    let store = TursoClient::from_config(&config.database)
        .await
        .context("failed to open database")?;

    let addr = config.bind_address();
    let app = build_app(AppState::new(config, Arc::new(store), tokens));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "devbook-api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn show_config(config: &DevbookConfig, validate: bool) -> anyhow::Result<()> {
    // Only the variable name is printed, never the secret itself
    println!("{}", toml::to_string_pretty(config)?);

    if validate {
        config.validate().context("configuration is invalid")?;
        println!("Configuration is valid.");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let (mut config, loaded) = DevbookConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let overridden = config.apply_env_overrides();

    init_tracing(&config, cli.verbose);
    for notice in loaded.iter().chain(overridden.iter()) {
        notice.log();
    }

    match cli.command() {
        Commands::Serve => serve(config).await,
        Commands::Config { validate } => show_config(&config, validate),
    }
}
