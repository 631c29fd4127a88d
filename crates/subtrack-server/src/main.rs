//! subtrack server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `SUBTRACK_*` environment variables, opens the SQLite store and serves the
//! JSON API over HTTP until SIGINT or SIGTERM.

use std::{
  future::IntoFuture as _,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use subtrack_core::store::SubscriptionStore as _;
use subtrack_server::ServerConfig;
use subtrack_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, signal, sync::watch};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Subscription ledger server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SUBTRACK").try_parsing(true))
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  store.ping().await.context("store did not answer ping")?;
  tracing::info!(path = ?store_path, "store ready");

  let app = subtrack_server::router(Arc::new(store), &server_cfg);
  let address = server_cfg.address();

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("Listening on http://{address}");

  let (stop_tx, mut stop_rx) = watch::channel(false);
  let server = axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      shutdown_signal().await;
      let _ = stop_tx.send(true);
    })
    .into_future();

  let grace = server_cfg.shutdown_grace();
  let drain_deadline = async move {
    if stop_rx.wait_for(|stopping| *stopping).await.is_err() {
      std::future::pending::<()>().await;
    }
    tokio::time::sleep(grace).await;
  };

  tokio::select! {
    result = server => result.context("server error")?,
    () = drain_deadline => {
      tracing::warn!(?grace, "in-flight requests outlived the shutdown grace period");
    }
  }

  tracing::info!("Shutdown complete");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for Ctrl+C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    () = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
    () = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
