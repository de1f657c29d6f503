use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub uploads_dir: String,
    pub templates_dir: String,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub api_rps: u32,
    pub public_rps: u32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://careers.db".to_string()),
            jwt_secret: get_env("JWT_SECRET")?,
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
            templates_dir: env::var("TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty()),
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|v| !v.is_empty()),
            api_rps: get_env_parse("API_RPS").unwrap_or(50),
            public_rps: get_env_parse("PUBLIC_RPS").unwrap_or(20),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("missing environment variable {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("configuration already initialized".to_string()))?;
    Ok(())
}

/// Idempotent variant used by tests where several cases share one process.
/// Uses a fixed config so tests never depend on the environment.
pub fn init_config_for_tests() {
    let _ = CONFIG.set(Config {
        server_address: "127.0.0.1:0".to_string(),
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        uploads_dir: std::env::temp_dir()
            .join("careers-backend-test-uploads")
            .to_string_lossy()
            .into_owned(),
        templates_dir: "templates".to_string(),
        openai_api_key: None,
        gemini_api_key: None,
        api_rps: 1000,
        public_rps: 1000,
    });
}

pub fn get_config() -> &'static Config {
    CONFIG.get().expect("configuration not initialized")
}
