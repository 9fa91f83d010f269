//! # firelink-cli
//!
//! Command-line front end for the firelink engine. Each invocation runs one
//! operation through the blocking API and prints the response body.
//!
//! ```bash
//! export FIRELINK_TOKEN=$(gcloud auth print-access-token)
//! firelink -p my-project get users/alice --mask name,email
//! firelink -p my-project list users --page-size 20 --order-by name
//! firelink -p my-project create users/bob --data '{"fields":{"name":{"stringValue":"Bob"}}}'
//! firelink -p my-project index create users age:desc name
//! ```
//!
//! Engine settings are read from `--config`, or from
//! `<config dir>/firelink/config.json` when that file exists.

pub mod commands;
pub mod error;

use std::fs;
use std::path::{Path, PathBuf};

use firelink_firestore::{AppToken, AsyncClient, AsyncResult, Firestore, FirestoreConfig};
use firelink_http::ReqwestExecutor;

pub use commands::Cli;
pub use error::CliError;

/// `<config dir>/firelink/config.json`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("firelink").join("config.json"))
}

fn read_config(path: &Path) -> Result<FirestoreConfig, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.display().to_string(),
        source,
    })?;
    Ok(FirestoreConfig::from_json_str(&text)?)
}

/// Resolve the engine config: an explicit file must exist, the default one
/// is optional. `--service-url` wins over both.
pub fn load_config(
    explicit: Option<&Path>,
    fallback: Option<PathBuf>,
    service_url: Option<&str>,
) -> Result<FirestoreConfig, CliError> {
    let mut config = match (explicit, fallback) {
        (Some(path), _) => read_config(path)?,
        (None, Some(path)) if path.is_file() => read_config(&path)?,
        _ => FirestoreConfig::default(),
    };
    if let Some(url) = service_url {
        config = config.with_service_url(url);
    }
    Ok(config)
}

/// Run the parsed command and return its result.
pub fn run(cli: &Cli) -> Result<AsyncResult, CliError> {
    let token = cli.token.clone().ok_or(CliError::MissingToken)?;
    let descriptor = cli.descriptor()?;
    let config = load_config(
        cli.config.as_deref(),
        default_config_path(),
        cli.service_url.as_deref(),
    )?;

    let mut engine = Firestore::with_config(config)?;
    engine.set_app(AppToken::new(0, token, cli.project.as_str()));
    let client = AsyncClient::new(ReqwestExecutor::with_default_timeout()?);

    tracing::info!(kind = %descriptor.kind(), "running");
    let result = engine.execute_blocking(&client, &descriptor);
    match result.error() {
        Some(error) => Err(CliError::Request(error.clone())),
        None => Ok(result),
    }
}

/// Pretty-print JSON payloads, pass anything else through.
pub fn render(result: &AsyncResult) -> String {
    match result.json() {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
        Err(_) => result.payload().to_string(),
    }
}
