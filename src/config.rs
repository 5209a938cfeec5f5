//! Configuration for dayplan

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Name of the local document collection
pub const COLLECTION_NAME: &str = "work_context";

/// Configuration for the planning assistant
#[derive(Clone)]
pub struct Config {
    /// Base directory for the embedded store
    pub data_dir: PathBuf,

    /// Name of the local collection (vector table)
    pub collection_name: String,

    /// Relational store connection string; unset means embedded mode
    pub database_url: Option<String>,

    /// How long the startup liveness check may wait for a connection
    pub database_connect_timeout_secs: u64,

    /// API key for the generative model
    pub gemini_api_key: Option<String>,

    /// Generative model name
    pub model_name: String,

    /// Timeout for a single generation request
    pub request_timeout_secs: u64,

    /// Number of context documents retrieved per plan
    pub context_results: usize,

    /// Token budget for the retrieved context block (0 = unbounded)
    pub context_token_budget: usize,

    /// Sampling temperature for plan generation
    pub temperature: f32,

    /// HTTP server port
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dayplan");

        Self {
            data_dir,
            collection_name: COLLECTION_NAME.to_string(),
            database_url: None,
            database_connect_timeout_secs: 10,
            gemini_api_key: None,
            model_name: "gemini-2.5-flash".to_string(),
            request_timeout_secs: 60,
            context_results: 10,
            context_token_budget: 8000,
            temperature: 0.5,
            server_port: 8000,
        }
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &self.data_dir)
            .field("collection_name", &self.collection_name)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field(
                "database_connect_timeout_secs",
                &self.database_connect_timeout_secs,
            )
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("context_results", &self.context_results)
            .field("context_token_budget", &self.context_token_budget)
            .field("temperature", &self.temperature)
            .field("server_port", &self.server_port)
            .finish()
    }
}

impl Config {
    /// Create a new config with a custom data directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get("DAYPLAN_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config.database_url = get("DATABASE_URL");
        config.gemini_api_key = get("GEMINI_API_KEY");
        if let Some(model) = get("GEMINI_MODEL") {
            config.model_name = model;
        }
        if let Some(v) = get("DAYPLAN_DB_CONNECT_TIMEOUT_SECS") {
            config.database_connect_timeout_secs = parse_var("DAYPLAN_DB_CONNECT_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("GEMINI_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_var("GEMINI_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("DAYPLAN_CONTEXT_TOKEN_BUDGET") {
            config.context_token_budget = parse_var("DAYPLAN_CONTEXT_TOKEN_BUDGET", &v)?;
        }
        if let Some(v) = get("DAYPLAN_PORT") {
            config.server_port = parse_var("DAYPLAN_PORT", &v)?;
        }

        Ok(config)
    }

    /// Get the path to the SQLite document catalog
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("catalog.db")
    }

    /// Get the path to the vector database
    pub fn vector_db_path(&self) -> PathBuf {
        self.data_dir.join("vectors")
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.vector_db_path())?;
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::config(format!("{} has invalid value {:?}: {}", key, value, e)))
}
