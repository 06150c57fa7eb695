//! Call routing and the per-call execution context.
//!
//! [`SfcSuite`] is the long-lived object the node embeds: it owns the chain-
//! scoped caches (slot hashes, constants, the epoch cache) and binds them to
//! a host store. Each incoming call gets a fresh [`Vm`] wrapping a journaled
//! overlay; peer-precompile calls re-enter [`Vm::call`] with a journal
//! snapshot so an inner revert never disturbs the outer frame. Calls to
//! addresses that are not precompiles behave like calls to externally-owned
//! accounts: the value moves and the call succeeds with empty return data.

use crate::constants::ConstantsCache;
use crate::error::{decode_revert_reason, HandlerResult, SfcError};
use crate::{
    CONSTANT_MANAGER_ADDRESS, EVM_WRITER_ADDRESS, NODE_DRIVER_ADDRESS, NODE_DRIVER_AUTH_ADDRESS,
    SFC_ADDRESS,
};
use alloy_primitives::{Address, Bytes, U256};
use parking_lot::Mutex;
use revm::precompile::{PrecompileError, PrecompileOutput, PrecompileResult};
use u2u_layout::SlotCache;
use u2u_metrics::sfc as metrics;
use u2u_state::{EpochCache, LogRecord, Overlay, StateKv};

/// Nested peer calls never go deeper than SFC → DriverAuth → Driver →
/// EVMWriter; anything beyond is a routing bug.
const MAX_CALL_DEPTH: usize = 8;

/// Block environment a call executes under.
#[derive(Debug, Clone, Copy)]
pub struct BlockEnv {
    /// Block number.
    pub number: u64,
    /// Block timestamp, Unix seconds.
    pub timestamp: u64,
}

/// Caller and attached value of the current call frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CallCtx {
    pub caller: Address,
    pub value: U256,
}

/// Outcome of a top-level call: the precompile result plus the logs that
/// survived (empty unless the call committed).
#[derive(Debug)]
pub struct CallResult {
    /// Raw precompile result.
    pub result: PrecompileResult,
    /// Committed logs, in emission order.
    pub logs: Vec<LogRecord>,
}

impl CallResult {
    /// Whether the call committed.
    pub fn is_success(&self) -> bool {
        matches!(&self.result, Ok(output) if !output.reverted)
    }

    /// Whether the call reverted (with or without data).
    pub fn is_revert(&self) -> bool {
        matches!(&self.result, Ok(output) if output.reverted)
    }

    /// Return data of a committed call, or the revert payload.
    pub fn output(&self) -> &[u8] {
        match &self.result {
            Ok(output) => output.bytes.as_ref(),
            Err(_) => &[],
        }
    }

    /// Decoded `Error(string)` reason of a revert, if any.
    pub fn revert_reason(&self) -> Option<String> {
        if !self.is_revert() {
            return None;
        }
        decode_revert_reason(self.output())
    }

    /// Gas debited by the call.
    pub fn gas_used(&self) -> u64 {
        match &self.result {
            Ok(output) => output.gas_used,
            Err(_) => 0,
        }
    }
}

/// Chain-scoped caches. One per chain, shared across calls; never shared
/// between independent chains in one process.
pub(crate) struct ChainCtx {
    pub slots: SlotCache,
    pub constants: ConstantsCache,
    pub epoch_cache: Mutex<EpochCache>,
}

/// The native precompile suite bound to a host store.
pub struct SfcSuite<K: StateKv> {
    host: K,
    chain: ChainCtx,
}

impl<K: StateKv> SfcSuite<K> {
    /// Bind the suite to a host store with fresh caches.
    pub fn new(host: K) -> Self {
        Self {
            host,
            chain: ChainCtx {
                slots: SlotCache::default(),
                constants: ConstantsCache::new(),
                epoch_cache: Mutex::new(EpochCache::new()),
            },
        }
    }

    /// The bound host store.
    pub fn host(&self) -> &K {
        &self.host
    }

    /// Whether `address` is handled natively by this suite.
    pub fn is_precompile(address: Address) -> bool {
        address == SFC_ADDRESS
            || address == CONSTANT_MANAGER_ADDRESS
            || address == NODE_DRIVER_ADDRESS
            || address == NODE_DRIVER_AUTH_ADDRESS
            || address == EVM_WRITER_ADDRESS
    }

    /// Execute one call against the suite.
    ///
    /// On success the request cache is flushed to the host and the emitted
    /// logs are returned; on revert the cache is discarded and no log
    /// survives.
    pub fn execute(
        &self,
        to: Address,
        caller: Address,
        value: U256,
        input: &[u8],
        gas_limit: u64,
        block: BlockEnv,
    ) -> CallResult {
        self.chain.constants.on_dispatch_entry();

        let mut vm = Vm {
            state: Overlay::new(&self.host),
            chain: &self.chain,
            block,
            depth: 0,
        };
        let result = vm.call(to, CallCtx { caller, value }, input, gas_limit);
        let committed = matches!(&result, Ok(output) if !output.reverted);

        if committed {
            match vm.state.finish() {
                Ok(logs) => {
                    u2u_metrics::state::STATE_FLUSHES.inc();
                    CallResult { result, logs }
                }
                Err(err) => CallResult {
                    result: Err(PrecompileError::Fatal(format!("state flush failed: {err}"))),
                    logs: Vec::new(),
                },
            }
        } else {
            // Values memoized from the discarded overlay must not leak into
            // the next sealing attempt.
            self.chain.epoch_cache.lock().reset();
            metrics::SFC_REVERTS
                .with_label_values(&[contract_label(to)])
                .inc();
            CallResult {
                result,
                logs: Vec::new(),
            }
        }
    }
}

fn contract_label(address: Address) -> &'static str {
    if address == SFC_ADDRESS {
        "sfc"
    } else if address == CONSTANT_MANAGER_ADDRESS {
        "constant_manager"
    } else if address == NODE_DRIVER_ADDRESS {
        "node_driver"
    } else if address == NODE_DRIVER_AUTH_ADDRESS {
        "node_driver_auth"
    } else if address == EVM_WRITER_ADDRESS {
        "evm_writer"
    } else {
        "external"
    }
}

/// Per-call execution context handed to every handler.
pub(crate) struct Vm<'a> {
    pub state: Overlay<'a>,
    pub chain: &'a ChainCtx,
    pub block: BlockEnv,
    depth: usize,
}

impl Vm<'_> {
    /// Block timestamp as a 256-bit word.
    pub fn now(&self) -> U256 {
        U256::from(self.block.timestamp)
    }

    /// Run a call frame: move the attached value, route to the owning
    /// precompile, and unwind the journal if the frame fails.
    pub fn call(
        &mut self,
        to: Address,
        ctx: CallCtx,
        input: &[u8],
        gas_limit: u64,
    ) -> PrecompileResult {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(PrecompileError::Fatal("precompile call depth exceeded".into()));
        }

        let snapshot = self.state.snapshot();

        if !ctx.value.is_zero() && self.state.transfer(ctx.caller, to, ctx.value).is_err() {
            self.state.revert_to(snapshot);
            return Ok(PrecompileOutput {
                gas_used: 0,
                gas_refunded: 0,
                bytes: Bytes::new(),
                reverted: true,
            });
        }

        self.depth += 1;
        let result = self.route(to, ctx, input, gas_limit);
        self.depth -= 1;

        match &result {
            Ok(output) if !output.reverted => {}
            _ => self.state.revert_to(snapshot),
        }
        result
    }

    fn route(
        &mut self,
        to: Address,
        ctx: CallCtx,
        input: &[u8],
        gas_limit: u64,
    ) -> PrecompileResult {
        if to == SFC_ADDRESS {
            crate::sfc::dispatch(self, ctx, input, gas_limit)
        } else if to == CONSTANT_MANAGER_ADDRESS {
            crate::constants::dispatch(self, ctx, input, gas_limit)
        } else if to == NODE_DRIVER_ADDRESS {
            crate::driver::dispatch(self, ctx, input, gas_limit)
        } else if to == NODE_DRIVER_AUTH_ADDRESS {
            crate::driver_auth::dispatch(self, ctx, input, gas_limit)
        } else if to == EVM_WRITER_ADDRESS {
            crate::evm_writer::dispatch(self, ctx, input, gas_limit)
        } else {
            // Plain account: the transfer already happened, nothing runs.
            Ok(PrecompileOutput {
                gas_used: 0,
                gas_refunded: 0,
                bytes: Bytes::new(),
                reverted: false,
            })
        }
    }

    /// Peer call from inside a handler. A peer revert is re-raised with its
    /// payload so the parent either propagates or maps it.
    pub fn call_sub(
        &mut self,
        to: Address,
        caller: Address,
        value: U256,
        input: Vec<u8>,
    ) -> HandlerResult {
        match self.call(
            to,
            CallCtx { caller, value },
            &input,
            crate::gas::SUB_CALL_STIPEND,
        ) {
            Ok(output) if !output.reverted => Ok(output.bytes.to_vec()),
            Ok(output) if output.bytes.is_empty() => Err(SfcError::EmptyRevert),
            Ok(output) => Err(SfcError::RawRevert(output.bytes.to_vec())),
            Err(PrecompileError::OutOfGas) => Err(SfcError::OutOfGas),
            Err(err) => Err(SfcError::revert(err.to_string())),
        }
    }
}
