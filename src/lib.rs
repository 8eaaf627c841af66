//! EDO core: multi-role document routing with PDF stamp composition and
//! an external signature (fiska) integration.
//!
//! Documents move Новый → На рассмотрении → {На исполнении | Согласован |
//! Отказан}, and На исполнении completes to Выполнено once every signing
//! principal has signed, all under a role-scoped access policy. The
//! [`service::EdoService`] facade is the single entry point: it resolves
//! principals, gates every action, runs workflow transitions and the
//! stamp engine, and persists aggregates under an optimistic revision
//! check.

pub mod access;
pub mod config;
pub mod db;
pub mod files;
pub mod gateway;
pub mod models;
pub mod service;
pub mod stamping;
pub mod workflow;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// built-in default filter. Call once at startup.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
