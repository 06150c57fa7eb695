//! Prometheus metrics infrastructure for the native SFC suite.
//!
//! Centralized metric definitions, organized by subsystem: the precompile
//! handlers (`sfc`) and the state cache tiers (`state`).

pub mod sfc;
pub mod state;

use once_cell::sync::Lazy;
use prometheus::Registry;

/// Global Prometheus registry for all SFC-suite metrics.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();

    sfc::register_metrics(&registry);
    state::register_metrics(&registry);

    registry
});

/// Initialize all metrics. Call once at startup.
pub fn init() {
    Lazy::force(&REGISTRY);
    tracing::info!("SFC metrics initialized");
}
