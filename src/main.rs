use std::io::{self, BufRead};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shardkeep::cli::{Cli, Commands};
use shardkeep::commands::{export_shares, restore_shares};
use shardkeep::custodian::HttpCustodianClient;
use shardkeep::settings::Settings;
use shardkeep::startup::{self, StartupPath};
use shardkeep::state::RootKeyState;

/// Read shares securely from stdin (hidden input when TTY available)
/// User should input shares one per line, followed by an empty line to finish
fn read_shares() -> Result<Vec<String>> {
    let mut shares = Vec::new();

    if atty::is(atty::Stream::Stdin) {
        eprintln!("Enter shardkeep shares (one per line, empty line to finish):");

        loop {
            let share = rpassword::read_password().context("Failed to read share from stdin")?;
            if share.trim().is_empty() {
                break;
            }
            shares.push(share.trim().to_string());
        }
    } else {
        let stdin = io::stdin();
        let handle = stdin.lock();

        for line in handle.lines() {
            let line = line.context("Failed to read line from stdin")?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            shares.push(trimmed.to_string());
        }
    }

    if shares.is_empty() {
        anyhow::bail!("No shares provided");
    }

    Ok(shares)
}

/// Resolves on Ctrl-C; never resolves if the signal handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn http_client(settings: &Settings) -> Result<HttpCustodianClient> {
    let tls = settings.load_tls()?;
    HttpCustodianClient::new(&tls, settings.custody.call_timeout)
        .context("Failed to build custodian HTTP client")
}

async fn serve(settings: Settings) -> Result<()> {
    settings.ensure_data_dir()?;
    let client = http_client(&settings)?;
    let state = RootKeyState::new();

    let path = startup::run(
        settings.custody.clone(),
        client,
        settings.marker(),
        state.clone(),
        shutdown_signal(),
    )
    .await
    .inspect_err(|e| {
        if e.is_fatal() {
            tracing::error!(error = %e, "Fatal custody error; refusing to continue");
        }
    })?;

    match path {
        StartupPath::Interrupted => {
            tracing::info!("Shutdown requested before the root key was ready");
            return Ok(());
        }
        StartupPath::Bootstrapped => tracing::info!("Root key bootstrapped"),
        StartupPath::Recovered => tracing::info!("Root key recovered"),
    }

    tracing::info!(key_installed = state.is_set(), "Holding root key until shutdown");
    shutdown_signal().await;
    tracing::info!("Shutting down");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shardkeep=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = cli.custody.into_settings()?;

    match cli.command {
        Commands::Serve => serve(settings).await?,
        Commands::Export => {
            let client = http_client(&settings)?;
            for mnemonic in export_shares(&client, &settings.custody).await? {
                println!("{mnemonic}");
            }
        }
        Commands::Restore => {
            let shares = read_shares()?;
            let client = http_client(&settings)?;
            let restored = restore_shares(&client, &settings.custody, &shares).await?;
            eprintln!("Restored {restored} shares");
        }
    }

    Ok(())
}
