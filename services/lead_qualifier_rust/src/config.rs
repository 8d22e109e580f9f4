use anyhow::{bail, Context, Result};
use pro_qualifier_core::DEFAULT_TOP_K;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub redis_url: String,
    pub registry_path: String,
    pub default_top_k: usize,
    pub heartbeat_interval_secs: u64,
    pub instance_id: String,
    pub build_version: Option<String>,
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: '{}'", name, raw)),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_top_k = parse_var("MATCH_TOP_K", DEFAULT_TOP_K)?;
        if default_top_k == 0 {
            bail!("MATCH_TOP_K must be positive");
        }

        Ok(Self {
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            registry_path: env::var("REGISTRY_PATH")
                .unwrap_or_else(|_| "data/athletes_sample.csv".to_string()),
            default_top_k,
            heartbeat_interval_secs: parse_var("HEARTBEAT_INTERVAL_SECS", 10)?,
            instance_id: env::var("HOSTNAME").unwrap_or_else(|_| "lead-qualifier-rust-1".to_string()),
            build_version: env::var("BUILD_VERSION").ok(),
        })
    }
}
