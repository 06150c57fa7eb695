//! State cache metrics.

use once_cell::sync::Lazy;
use prometheus::{Counter, Registry};

pub static STATE_SLOT_READS: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "u2u_state_slot_reads_total",
        "Storage slot reads through the request cache",
    )
    .expect("metric can be created")
});

pub static STATE_SLOT_WRITES: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "u2u_state_slot_writes_total",
        "Storage slot writes through the request cache",
    )
    .expect("metric can be created")
});

pub static STATE_FLUSHES: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "u2u_state_flushes_total",
        "Request cache flushes to the host store",
    )
    .expect("metric can be created")
});

pub static STATE_EPOCH_CACHE_HITS: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "u2u_state_epoch_cache_hits_total",
        "Reads served by the epoch-scoped cache during sealing",
    )
    .expect("metric can be created")
});

/// Register all state metrics with the given registry.
pub fn register_metrics(registry: &Registry) {
    registry.register(Box::new(STATE_SLOT_READS.clone())).ok();
    registry.register(Box::new(STATE_SLOT_WRITES.clone())).ok();
    registry.register(Box::new(STATE_FLUSHES.clone())).ok();
    registry
        .register(Box::new(STATE_EPOCH_CACHE_HITS.clone()))
        .ok();
}
