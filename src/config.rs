//! Configuration resolution
//!
//! Each value resolves through the same priority order: command-line
//! argument (clap also folds in the matching environment variable) → TOML
//! config file → compiled default. The Google OAuth client registration has
//! no default; drive routes report how to configure it when absent.

use crate::source::oauth::OauthConfig;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser, Default)]
#[command(name = "heirloom", version, about = "Family photo face tagging")]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, env = "HEIRLOOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Media root directory (database, scratch and permanent crops)
    #[arg(long, env = "HEIRLOOM_MEDIA_ROOT")]
    pub media_root: Option<PathBuf>,

    /// HTTP listen port
    #[arg(long, env = "HEIRLOOM_PORT")]
    pub port: Option<u16>,

    /// Path to the SCRFD face detection model (det_10g.onnx)
    #[arg(long, env = "HEIRLOOM_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Google OAuth client id
    #[arg(long, env = "HEIRLOOM_GOOGLE_CLIENT_ID")]
    pub google_client_id: Option<String>,

    /// Google OAuth client secret
    #[arg(long, env = "HEIRLOOM_GOOGLE_CLIENT_SECRET")]
    pub google_client_secret: Option<String>,
}

/// On-disk config file shape. Every field is optional; missing values fall
/// back to the compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub media_root: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub listen_port: Option<u16>,
    pub model_path: Option<PathBuf>,
    pub drive_folder_name: Option<String>,
    pub session_ttl_minutes: Option<i64>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub redirect_uri: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub media_root: PathBuf,
    pub database_path: PathBuf,
    pub listen_port: u16,
    pub model_path: PathBuf,
    /// Name of the well-known drive folder photos are organized into.
    pub drive_folder_name: String,
    pub session_ttl_minutes: i64,
    /// None until the Google client is configured.
    pub oauth: Option<OauthConfig>,
}

const DEFAULT_PORT: u16 = 8700;
const DEFAULT_DRIVE_FOLDER: &str = "Family Photos";
const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

impl Config {
    pub fn resolve(cli: &Cli) -> Result<Config> {
        let toml = load_toml_config(cli.config.as_deref())?;

        let media_root = cli
            .media_root
            .clone()
            .or(toml.media_root.clone())
            .unwrap_or_else(default_media_root);

        let database_path = toml
            .database_path
            .clone()
            .unwrap_or_else(|| media_root.join("heirloom.db"));

        let model_path = cli
            .model_path
            .clone()
            .or(toml.model_path.clone())
            .unwrap_or_else(|| media_root.join("models").join("det_10g.onnx"));

        let listen_port = cli.port.or(toml.listen_port).unwrap_or(DEFAULT_PORT);

        let client_id = cli.google_client_id.clone().or(toml.google_client_id.clone());
        let client_secret = cli
            .google_client_secret
            .clone()
            .or(toml.google_client_secret.clone());
        let oauth = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(OauthConfig {
                client_id,
                client_secret,
                redirect_uri: toml.redirect_uri.clone().unwrap_or_else(|| {
                    format!("http://127.0.0.1:{listen_port}/auth/callback")
                }),
            }),
            _ => None,
        };

        Ok(Config {
            media_root,
            database_path,
            listen_port,
            model_path,
            drive_folder_name: toml
                .drive_folder_name
                .unwrap_or_else(|| DEFAULT_DRIVE_FOLDER.to_string()),
            session_ttl_minutes: toml
                .session_ttl_minutes
                .unwrap_or(DEFAULT_SESSION_TTL_MINUTES),
            oauth,
        })
    }
}

/// Read the TOML config. An explicitly passed path must exist; the default
/// platform path is optional.
fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(TomlConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Platform config file location, e.g. `~/.config/heirloom/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("heirloom").join("config.toml"))
}

/// Platform data location, e.g. `~/.local/share/heirloom`.
fn default_media_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("heirloom"))
        .unwrap_or_else(|| PathBuf::from("./heirloom_data"))
}
