mod config;
mod handler;
mod reload;

use crate::config::Config;
use crate::handler::{handle_match, LeadMatchRequest};
use crate::reload::{reload_channel, run_reload_worker};
use anyhow::{Context, Result};
use chrono::Utc;
use dotenv::dotenv;
use futures_util::StreamExt;
use pro_qualifier_core::{Registry, RegistryHandle};
use redis::aio::{ConnectionManager, PubSub};
use redis::AsyncCommands;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const SERVICE_NAME: &str = "lead_qualifier_rust";

// Lead matching RPC channels
const LEAD_MATCH_REQUEST_CH: &str = "lead:match:request";
const LEAD_MATCH_RESPONSE_PREFIX: &str = "lead:match:response:";
const REGISTRY_RELOAD_CH: &str = "lead:registry:reload";

// Heartbeat constants
const HEARTBEAT_KEY_PREFIX: &str = "health:hb";
const HEARTBEAT_CHANNEL: &str = "health:heartbeats";
const HEARTBEAT_TTL_SECS: u64 = 35;

#[derive(Debug, Serialize)]
struct Heartbeat {
    service: String,
    instance_id: String,
    status: String,
    started_at: String,
    timestamp: String,
    checks: HashMap<String, bool>,
    metrics: HashMap<String, f64>,
    version: Option<String>,
    hostname: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting Rust Lead Qualifier Service...");

    let config = Config::from_env()?;

    // Registry snapshot. A missing file starts empty (every lead gets the
    // empty-registry verdict until a reload); a malformed file is fatal.
    let registry = match RegistryHandle::load(&config.registry_path) {
        Ok(handle) => handle,
        Err(e) if e.is_schema_error() => {
            return Err(e).with_context(|| format!("Failed to load registry {}", config.registry_path));
        }
        Err(e) => {
            warn!(
                "Registry {} unavailable ({}); starting with an empty registry",
                config.registry_path, e
            );
            RegistryHandle::new(Registry::empty())
        }
    };
    let registry = Arc::new(registry);
    info!("Registry ready: {:?}", registry.snapshot().league_counts());

    // Redis
    let client = redis::Client::open(config.redis_url.clone())?;
    let publisher = client
        .get_connection_manager()
        .await
        .context("Failed to connect to Redis")?;

    // Separate pubsub connection (redis-rs requires a dedicated connection)
    let pubsub_con = client.get_async_connection().await?;
    let mut pubsub = pubsub_con.into_pubsub();
    pubsub.subscribe(LEAD_MATCH_REQUEST_CH).await?;
    pubsub.subscribe(REGISTRY_RELOAD_CH).await?;
    info!(
        "Subscribed to channels: {}, {}",
        LEAD_MATCH_REQUEST_CH, REGISTRY_RELOAD_CH
    );

    // Spawn heartbeat task
    let heartbeat_con = publisher.clone();
    let heartbeat_registry = registry.clone();
    let heartbeat_config = config.clone();
    let started_at = Utc::now().to_rfc3339();
    tokio::spawn(async move {
        if let Err(e) =
            heartbeat_loop(heartbeat_con, heartbeat_registry, heartbeat_config, started_at).await
        {
            error!("Heartbeat loop exited: {}", e);
        }
    });

    // Single reload task; reloads always read the configured registry path
    let (reload_tx, reload_rx) = reload_channel();
    tokio::spawn(run_reload_worker(
        registry.clone(),
        PathBuf::from(&config.registry_path),
        reload_rx,
    ));

    request_listener(pubsub, publisher, registry, reload_tx, config).await
}

async fn request_listener(
    mut pubsub: PubSub,
    publisher: ConnectionManager,
    registry: Arc<RegistryHandle>,
    reload_tx: mpsc::Sender<()>,
    config: Config,
) -> Result<()> {
    info!(
        "Listening for requests on {} and {}",
        LEAD_MATCH_REQUEST_CH, REGISTRY_RELOAD_CH
    );

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let channel: String = msg.get_channel_name().to_string();
        let payload: Vec<u8> = match msg.get_payload() {
            Ok(p) => p,
            Err(e) => {
                warn!("Request listener: failed to read payload: {}", e);
                continue;
            }
        };

        if channel == LEAD_MATCH_REQUEST_CH {
            let publisher = publisher.clone();
            let registry = registry.clone();
            let default_top_k = config.default_top_k;
            tokio::spawn(async move {
                handle_lead_match_request(publisher, registry, default_top_k, payload).await;
            });
        } else if channel == REGISTRY_RELOAD_CH {
            // Payload is ignored; a reload is already queued when the channel is full
            match reload_tx.try_send(()) {
                Ok(()) => debug!("Registry reload queued"),
                Err(TrySendError::Full(())) => debug!("Registry reload already pending"),
                Err(TrySendError::Closed(())) => error!("Registry reload worker stopped"),
            }
        } else {
            warn!("Unknown channel: {}", channel);
        }
    }

    Ok(())
}

/// Handle lead match RPC request
async fn handle_lead_match_request(
    mut publisher: ConnectionManager,
    registry: Arc<RegistryHandle>,
    default_top_k: usize,
    payload: Vec<u8>,
) {
    let req: LeadMatchRequest = match serde_json::from_slice(&payload) {
        Ok(r) => r,
        Err(e) => {
            let preview = String::from_utf8_lossy(&payload);
            warn!(
                "Lead match request: invalid JSON ({}). payload='{}'",
                e,
                preview.chars().take(200).collect::<String>()
            );
            return;
        }
    };

    debug!(
        "Lead match request {}: '{}' (dob: {:?}, league_hint: {:?})",
        req.request_id, req.name, req.dob, req.league_hint
    );

    // Matching is CPU-bound; run it off the async workers against the
    // snapshot current at request time.
    let snapshot = registry.snapshot();
    let response = match tokio::task::spawn_blocking(move || {
        handle_match(&snapshot, &req, default_top_k)
    })
    .await
    {
        Ok(r) => r,
        Err(e) => {
            error!("Lead match request: matching task failed: {}", e);
            return;
        }
    };

    let response_channel = format!("{}{}", LEAD_MATCH_RESPONSE_PREFIX, response.request_id);
    let response_json = match serde_json::to_string(&response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Lead match request: JSON serialization error: {}", e);
            return;
        }
    };

    if let Err(e) = publisher
        .publish::<&str, &str, i64>(&response_channel, &response_json)
        .await
    {
        warn!("Lead match request: Redis publish error: {}", e);
    } else {
        debug!(
            "Lead match response: probable_pro={}, confidence={}, matches={} -> {}",
            response.is_probable_pro,
            response.confidence,
            response.matches.len(),
            response_channel
        );
    }
}

/// Heartbeat loop - publishes periodic health status to Redis
async fn heartbeat_loop(
    mut con: ConnectionManager,
    registry: Arc<RegistryHandle>,
    config: Config,
    started_at: String,
) -> Result<()> {
    let hostname = hostname::get().ok().and_then(|h| h.into_string().ok());

    info!("Heartbeat loop started for {}", config.instance_id);

    loop {
        let snapshot = registry.snapshot();

        let mut checks = HashMap::new();
        checks.insert("redis_ok".to_string(), true);
        checks.insert("registry_loaded".to_string(), !snapshot.is_empty());

        let mut metrics = HashMap::new();
        metrics.insert("registry_size".to_string(), snapshot.len() as f64);
        metrics.insert(
            "registry_age_secs".to_string(),
            (Utc::now() - snapshot.loaded_at()).num_seconds() as f64,
        );

        let heartbeat = Heartbeat {
            service: SERVICE_NAME.to_string(),
            instance_id: config.instance_id.clone(),
            status: if snapshot.is_empty() { "degraded" } else { "healthy" }.to_string(),
            started_at: started_at.clone(),
            timestamp: Utc::now().to_rfc3339(),
            checks,
            metrics,
            version: config.build_version.clone(),
            hostname: hostname.clone(),
        };

        let payload = serde_json::to_string(&heartbeat)?;
        let key = format!("{}:{}:{}", HEARTBEAT_KEY_PREFIX, SERVICE_NAME, config.instance_id);

        // SETEX for liveness
        let _: () = con.set_ex(&key, &payload, HEARTBEAT_TTL_SECS).await?;

        // Publish for real-time observability
        let _: () = con.publish(HEARTBEAT_CHANNEL, &payload).await?;

        debug!("Heartbeat published: {}", key);

        tokio::time::sleep(Duration::from_secs(config.heartbeat_interval_secs)).await;
    }
}
