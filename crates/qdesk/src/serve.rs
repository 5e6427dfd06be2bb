// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `qdesk serve` and `qdesk seed` command implementations.
//!
//! Both open the SQLite store and apply the configured catalog; `serve`
//! then wires the engine to the event bus and runs the gateway until a
//! shutdown signal arrives.

use std::sync::Arc;

use qdesk_bus::EventBus;
use qdesk_config::QdeskConfig;
use qdesk_core::{QdeskError, SystemClock};
use qdesk_engine::{Engine, EngineSettings};
use qdesk_gateway::{GatewayState, ServerConfig};
use qdesk_storage::SqliteTicketStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::shutdown;

/// Runs the `qdesk serve` command.
pub async fn run_serve(config: QdeskConfig) -> Result<(), QdeskError> {
    init_tracing(&config.site.log_level);
    info!(site = %config.site.name, "qdesk starting");

    let store = open_store(&config).await?;
    let displays = config.display_profiles()?;
    let bus = Arc::new(EventBus::new(config.bus.channel_capacity).with_displays(displays.clone()));
    let clock = Arc::new(SystemClock::from_offset_minutes(config.desk.utc_offset_minutes)?);
    let engine = Engine::new(
        store.clone(),
        bus.clone(),
        clock,
        EngineSettings::from_config(&config.desk),
        displays,
    );

    let cancel = shutdown::install_signal_handler();
    let served = if config.gateway.enabled {
        let server = ServerConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
            bearer_token: config.gateway.bearer_token.clone(),
        };
        qdesk_gateway::start_server(&server, GatewayState::new(engine, bus), cancel).await
    } else {
        info!("gateway disabled, idling until shutdown");
        cancel.cancelled().await;
        Ok(())
    };

    let closed = store.close().await;
    info!("qdesk stopped");
    served.and(closed)
}

/// Runs the `qdesk seed` command.
pub async fn run_seed(config: QdeskConfig) -> Result<(), QdeskError> {
    init_tracing(&config.site.log_level);
    let store = open_store(&config).await?;
    store.close().await?;
    println!(
        "seeded {} services, {} rooms into {}",
        config.services.len(),
        config.rooms.len(),
        config.storage.database_path
    );
    Ok(())
}

/// Opens the store, runs migrations and applies the configured catalog.
async fn open_store(config: &QdeskConfig) -> Result<Arc<SqliteTicketStore>, QdeskError> {
    let catalog = config.catalog()?;
    let store = SqliteTicketStore::new(config.storage.clone());
    store.initialize().await?;
    store.seed_catalog(&catalog).await?;
    info!(
        path = %config.storage.database_path,
        services = catalog.services.len(),
        rooms = catalog.rooms.len(),
        "store ready"
    );
    Ok(Arc::new(store))
}

/// `qdesk={level},warn`, unless `RUST_LOG` is set.
fn log_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("qdesk={log_level},warn")))
}

fn init_tracing(log_level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter(log_level))
        .with_target(true)
        .with_thread_names(false);
    // A second command in the same process keeps the first subscriber.
    let _ = subscriber.try_init();
}
