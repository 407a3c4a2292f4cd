use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "vidshare", about = "Video sharing platform backend")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin; CORS stays off when unset.
    pub cors_origin: Option<String>,
    /// Base URL under which locally stored media is reachable.
    pub public_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
    pub temp_path: Option<PathBuf>,
    pub max_upload_mb: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_secret: String,
    pub refresh_token_days: i64,
    pub secure_cookies: bool,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaProvider {
    #[default]
    Local,
    Cloudinary,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MediaConfig {
    pub provider: MediaProvider,
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub upload_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origin: None,
            public_url: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            temp_path: None,
            max_upload_mb: 512,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: "dev-access-secret-change-me".to_string(),
            access_token_minutes: 60 * 24,
            refresh_token_secret: "dev-refresh-secret-change-me".to_string(),
            refresh_token_days: 10,
            secure_cookies: true,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            provider: MediaProvider::Local,
            cloud_name: None,
            api_key: None,
            api_secret: None,
            upload_timeout_secs: 300,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env();

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("vidshare.db"));
        }
        if config.storage.path.is_none() {
            config.storage.path = Some(data_dir.join("media"));
        }
        if config.storage.temp_path.is_none() {
            config.storage.temp_path = Some(data_dir.join("tmp"));
        }
        if config.server.public_url.is_none() {
            config.server.public_url = Some(format!(
                "http://{}:{}",
                config.server.host, config.server.port
            ));
        }

        Ok(config)
    }

    /// Secrets may come from the environment instead of the config file.
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("VIDSHARE_ACCESS_TOKEN_SECRET") {
            self.auth.access_token_secret = v;
        }
        if let Ok(v) = std::env::var("VIDSHARE_REFRESH_TOKEN_SECRET") {
            self.auth.refresh_token_secret = v;
        }
        if let Ok(v) = std::env::var("CLOUDINARY_CLOUD_NAME") {
            self.media.cloud_name = Some(v);
        }
        if let Ok(v) = std::env::var("CLOUDINARY_API_KEY") {
            self.media.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("CLOUDINARY_API_SECRET") {
            self.media.api_secret = Some(v);
        }
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".vidshare")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("vidshare.db"))
    }

    pub fn media_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("media"))
    }

    pub fn temp_path(&self) -> PathBuf {
        self.storage
            .temp_path
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn public_url(&self) -> String {
        self.server
            .public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.server.host, self.server.port))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.storage.max_upload_mb * 1024 * 1024
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.media.upload_timeout_secs)
    }
}
