use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

// Gatekeeper configuration sourced from environment variables, with an
// optional YAML override file pointed at by GATEKEEPER_CONFIG.
#[derive(Debug, Clone)]
pub struct GatekeeperConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub max_page_limit: u32,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub enabled: bool,
    pub bind_addr: SocketAddr,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatekeeperConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    pg_url: Option<String>,
    max_page_limit: Option<u32>,
    bootstrap_enabled: Option<bool>,
    bootstrap_bind: Option<String>,
    bootstrap_token: Option<String>,
}

fn env_var(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_storage(value: &str) -> Result<StorageBackend> {
    match value {
        "memory" => Ok(StorageBackend::Memory),
        "postgres" => Ok(StorageBackend::Postgres),
        other => bail!("unknown storage backend: {other} (expected memory|postgres)"),
    }
}

impl GatekeeperConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_var("GATEKEEPER_BIND", "0.0.0.0:8088")
            .parse()
            .with_context(|| "parse GATEKEEPER_BIND")?;
        let metrics_bind = env_var("GATEKEEPER_METRICS_BIND", "0.0.0.0:9099")
            .parse()
            .with_context(|| "parse GATEKEEPER_METRICS_BIND")?;
        let storage = parse_storage(&env_var("GATEKEEPER_STORAGE", "memory"))?;

        let postgres = std::env::var("GATEKEEPER_PG_URL")
            .ok()
            .map(|url| -> Result<PostgresConfig> {
                Ok(PostgresConfig {
                    url,
                    max_connections: env_var("GATEKEEPER_PG_MAX_CONNECTIONS", "10")
                        .parse()
                        .with_context(|| "parse GATEKEEPER_PG_MAX_CONNECTIONS")?,
                    connect_timeout_ms: env_var("GATEKEEPER_PG_CONNECT_TIMEOUT_MS", "5000")
                        .parse()
                        .with_context(|| "parse GATEKEEPER_PG_CONNECT_TIMEOUT_MS")?,
                    acquire_timeout_ms: env_var("GATEKEEPER_PG_ACQUIRE_TIMEOUT_MS", "5000")
                        .parse()
                        .with_context(|| "parse GATEKEEPER_PG_ACQUIRE_TIMEOUT_MS")?,
                })
            })
            .transpose()?;

        let max_page_limit = env_var("GATEKEEPER_MAX_PAGE_LIMIT", "100")
            .parse()
            .with_context(|| "parse GATEKEEPER_MAX_PAGE_LIMIT")?;

        let bootstrap = BootstrapConfig {
            enabled: env_var("GATEKEEPER_BOOTSTRAP_ENABLED", "false")
                .parse()
                .with_context(|| "parse GATEKEEPER_BOOTSTRAP_ENABLED")?,
            bind_addr: env_var("GATEKEEPER_BOOTSTRAP_BIND", "127.0.0.1:8089")
                .parse()
                .with_context(|| "parse GATEKEEPER_BOOTSTRAP_BIND")?,
            token: std::env::var("GATEKEEPER_BOOTSTRAP_TOKEN").ok(),
        };

        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            max_page_limit,
            bootstrap,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("GATEKEEPER_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read GATEKEEPER_CONFIG: {path}"))?;
            let override_cfg: GatekeeperConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse gatekeeper config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.storage {
                config.storage = parse_storage(&value)?;
            }
            if let Some(url) = override_cfg.pg_url {
                let base = config.postgres.take().unwrap_or(PostgresConfig {
                    url: String::new(),
                    max_connections: 10,
                    connect_timeout_ms: 5000,
                    acquire_timeout_ms: 5000,
                });
                config.postgres = Some(PostgresConfig { url, ..base });
            }
            if let Some(value) = override_cfg.max_page_limit {
                config.max_page_limit = value;
            }
            if let Some(value) = override_cfg.bootstrap_enabled {
                config.bootstrap.enabled = value;
            }
            if let Some(value) = override_cfg.bootstrap_bind {
                config.bootstrap.bind_addr =
                    value.parse().with_context(|| "parse bootstrap_bind")?;
            }
            if let Some(value) = override_cfg.bootstrap_token {
                config.bootstrap.token = Some(value);
            }
        }
        Ok(config)
    }
}
