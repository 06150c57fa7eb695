//! SFC precompile handler metrics.

use once_cell::sync::Lazy;
use prometheus::{Counter, CounterVec, Gauge, HistogramVec, Registry};

// Dispatch
pub static SFC_CALLS: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        prometheus::opts!("u2u_sfc_calls_total", "Total precompile calls"),
        &["contract", "method"],
    )
    .expect("metric can be created")
});

pub static SFC_REVERTS: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        prometheus::opts!("u2u_sfc_reverts_total", "Total reverted precompile calls"),
        &["contract"],
    )
    .expect("metric can be created")
});

pub static SFC_UNKNOWN_SELECTORS: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "u2u_sfc_unknown_selectors_total",
        "Calls whose 4-byte selector matched no handler",
    )
    .expect("metric can be created")
});

// Staking
pub static SFC_VALIDATORS_CREATED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "u2u_sfc_validators_created_total",
        "Total validators created",
    )
    .expect("metric can be created")
});

pub static SFC_VALIDATORS_DEACTIVATED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "u2u_sfc_validators_deactivated_total",
        "Total validator deactivations",
    )
    .expect("metric can be created")
});

pub static SFC_TOTAL_STAKE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("u2u_sfc_total_stake_wei", "Total stake (in wei)").expect("metric can be created")
});

pub static SFC_TOTAL_ACTIVE_STAKE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "u2u_sfc_total_active_stake_wei",
        "Total stake behind active validators (in wei)",
    )
    .expect("metric can be created")
});

// Epoch sealing
pub static SFC_EPOCHS_SEALED: Lazy<Counter> = Lazy::new(|| {
    Counter::new("u2u_sfc_epochs_sealed_total", "Total epochs sealed")
        .expect("metric can be created")
});

pub static SFC_SEAL_VALIDATORS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        prometheus::histogram_opts!(
            "u2u_sfc_seal_validator_count",
            "Validator-set size at each seal",
            vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]
        ),
        &[],
    )
    .expect("metric can be created")
});

pub static SFC_MIN_GAS_PRICE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "u2u_sfc_min_gas_price_wei",
        "Minimum gas price after the last sealed epoch",
    )
    .expect("metric can be created")
});

/// Register all SFC metrics with the given registry.
pub fn register_metrics(registry: &Registry) {
    registry.register(Box::new(SFC_CALLS.clone())).ok();
    registry.register(Box::new(SFC_REVERTS.clone())).ok();
    registry
        .register(Box::new(SFC_UNKNOWN_SELECTORS.clone()))
        .ok();
    registry
        .register(Box::new(SFC_VALIDATORS_CREATED.clone()))
        .ok();
    registry
        .register(Box::new(SFC_VALIDATORS_DEACTIVATED.clone()))
        .ok();
    registry.register(Box::new(SFC_TOTAL_STAKE.clone())).ok();
    registry
        .register(Box::new(SFC_TOTAL_ACTIVE_STAKE.clone()))
        .ok();
    registry.register(Box::new(SFC_EPOCHS_SEALED.clone())).ok();
    registry
        .register(Box::new(SFC_SEAL_VALIDATORS.clone()))
        .ok();
    registry.register(Box::new(SFC_MIN_GAS_PRICE.clone())).ok();
}
