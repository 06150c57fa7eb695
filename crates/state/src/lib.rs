//! Host state abstraction and the per-call cache tiers used by the native
//! SFC precompiles.
//!
//! Handlers never touch the host key-value store directly: every read and
//! write goes through an [`Overlay`], which journals mutations so nested
//! peer-precompile calls can unwind, and flushes dirty entries to the host
//! in deterministic order only when the outermost call succeeds. An
//! [`EpochCache`] sits beside it during epoch sealing.

mod epoch_cache;
mod error;
mod kv;
mod overlay;

pub use epoch_cache::EpochCache;
pub use error::{Result, StateError};
pub use kv::{InMemoryKv, StateKv};
pub use overlay::{LogRecord, Overlay, Snapshot};
