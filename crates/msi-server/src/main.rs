//! msi-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `MSI_*` environment variables, loads the reference sheet, opens the SQLite
//! store (demo mode without one) and serves the JSON API.
//!
//! # Users
//!
//! ```text
//! msi-server --hash-password            # print an argon2 hash for a password on stdin
//! msi-server --add-user ada@msi.org     # insert a user, password read from stdin
//! msi-server --add-user a@msi.org --admin
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use msi_api::{AppState, auth::hash_password};
use msi_core::{store::EnrollmentStore, user::UserAccount};
use msi_server::{ServerConfig, app, expand_tilde, open_store};
use msi_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::{debug, info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "MSI training enrollment portal")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Create or replace a user in the configured store and exit.
  #[arg(long, value_name = "EMAIL")]
  add_user: Option<String>,

  /// With `--add-user`, make the user an admin.
  #[arg(long, requires = "add_user")]
  admin: bool,
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

  if cli.hash_password {
    let password = read_password()?;
    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("MSI"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if let Some(email) = cli.add_user {
    return add_user(&server_cfg, email, cli.admin).await;
  }

  let reference = msi_csv::load_reference(&expand_tilde(&server_cfg.reference_path))
    .with_context(|| {
      format!("failed to load reference data from {:?}", server_cfg.reference_path)
    })?;
  info!(rows = reference.table().len(), "loaded reference data");
  for conflict in reference.hierarchy_conflicts() {
    if conflict.is_warning() {
      warn!(?conflict, "reference hierarchy conflict");
    } else {
      debug!(?conflict, "reference hierarchy conflict");
    }
  }

  let store = open_store(server_cfg.store_path.as_deref()).await;
  let state = AppState::new(store, reference, server_cfg.api_config());
  info!(mode = ?state.mode(), "starting");

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app(state)).await.context("server error")?;

  Ok(())
}

/// Insert or replace a user. Requires a configured store.
async fn add_user(cfg: &ServerConfig, email: String, is_admin: bool) -> anyhow::Result<()> {
  let path = cfg
    .store_path
    .as_deref()
    .map(expand_tilde)
    .context("store_path must be configured to add users")?;
  let store = SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))?;

  let password = read_password()?;
  let password_hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
  store
    .put_user(UserAccount { email: email.clone(), password_hash, is_admin })
    .await
    .context("failed to save user")?;

  info!(%email, admin = is_admin, "user saved");
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
