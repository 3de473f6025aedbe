//! # API Configuration Module
//!
//! Loads server configuration from environment variables, with defaults where
//! a value is optional.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: Host address to bind to (default: "0.0.0.0")
//! - `API_PORT`: Port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string. Unset means local-only mode.
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: Request timeout (default: 30)
//! - `CACHE_DIR`: Directory holding the durable local cache (default: ".sewa")
//! - `EARLY_BIRD_CUTOFF`: `HH:MM` before which attendance earns the early reward (default: "10:00")
//! - `VOLUNTEERS_PATH`: JSON volunteer directory; the built-in list is used when unset
//! - `ROSTER_SEED_PATH`: JSON roster used by the clean sync; the built-in seed is used when unset
//! - `SUPER_ADMIN_ID`: Volunteer id granted Super Admin rights on top of the directory's

use std::env;
use std::fs;
use std::path::PathBuf;

use eyre::{Result, WrapErr};
use sewa_core::models::{Sewadar, VolunteerDirectory};
use sewa_core::roster;
use sewa_core::rules::RewardPolicy;
use tracing::Level;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// `None` runs the engine without a remote store.
    pub database_url: Option<String>,

    pub log_level: Level,

    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    pub cache_dir: PathBuf,

    pub reward_policy: RewardPolicy,

    pub volunteers_path: Option<PathBuf>,

    pub roster_seed_path: Option<PathBuf>,

    pub super_admin_id: Option<String>,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `API_PORT` is not a valid port or
    /// `EARLY_BIRD_CUTOFF` is not `HH:MM`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Network settings
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("API_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        // Logging settings
        let log_level = match lookup("LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        let cors_origins = lookup("API_CORS_ORIGINS")
            .map(|origins| origins.split(',').map(|s| s.trim().to_string()).collect());

        let request_timeout = lookup("API_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .unwrap_or(30);

        let cache_dir = lookup("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".sewa"));

        let reward_policy = match lookup("EARLY_BIRD_CUTOFF") {
            Some(cutoff) => {
                RewardPolicy::parse_cutoff(&cutoff).wrap_err("Invalid EARLY_BIRD_CUTOFF value")?
            }
            None => RewardPolicy::default(),
        };

        let volunteers_path = lookup("VOLUNTEERS_PATH").map(PathBuf::from);
        let roster_seed_path = lookup("ROSTER_SEED_PATH").map(PathBuf::from);
        let super_admin_id = lookup("SUPER_ADMIN_ID").filter(|id| !id.trim().is_empty());

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            request_timeout,
            cache_dir,
            reward_policy,
            volunteers_path,
            roster_seed_path,
            super_admin_id,
        })
    }

    /// Returns the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The volunteer directory, with `SUPER_ADMIN_ID` applied.
    pub fn load_directory(&self) -> Result<VolunteerDirectory> {
        let mut directory = match &self.volunteers_path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
                VolunteerDirectory::from_json(&raw)
                    .wrap_err_with(|| format!("Invalid volunteer directory {}", path.display()))?
            }
            None => VolunteerDirectory::builtin(),
        };

        if let Some(id) = &self.super_admin_id {
            directory.super_admin_id = Some(id.clone());
        }
        Ok(directory)
    }

    /// The roster the clean sync writes, placeholder rows included.
    pub fn load_roster_seed(&self) -> Result<Vec<Sewadar>> {
        match &self.roster_seed_path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
                roster::from_json(&raw)
                    .wrap_err_with(|| format!("Invalid roster seed {}", path.display()))
            }
            None => Ok(roster::seed_roster()),
        }
    }
}
