//! Native precompile suite for the Special Fee Contract and its
//! administration contracts.
//!
//! The node intercepts calls to four reserved addresses — SFC,
//! ConstantManager, NodeDriver, NodeDriverAuth (plus the EVMWriter raw state
//! mutator) — and runs the staking, delegation, reward and epoch-sealing
//! logic natively, while preserving the storage slot layout, event encoding
//! and revert semantics of the Solidity contracts the bytecode used to
//! implement. External contracts and off-chain indexers observe no
//! difference.
//!
//! Entry point is [`SfcSuite::execute`]; everything else hangs off the
//! per-call [`vm::Vm`] context.

#![deny(unsafe_code)]

pub mod abi;
pub mod constants;
mod delegation;
mod driver;
mod driver_auth;
pub mod error;
mod evm_writer;
pub mod gas;
pub mod genesis;
pub mod rewards;
mod sealing;
mod sfc;
mod store;
mod validator;
pub mod vm;

pub use error::SfcError;
pub use vm::{BlockEnv, CallResult, SfcSuite};

use alloy_primitives::{address, Address, U256};

/// SFC precompile address.
pub const SFC_ADDRESS: Address = address!("fc00face00000000000000000000000000000000");

/// NodeDriverAuth precompile address.
pub const NODE_DRIVER_AUTH_ADDRESS: Address = address!("d100ae0000000000000000000000000000000000");

/// NodeDriver precompile address.
pub const NODE_DRIVER_ADDRESS: Address = address!("d100a01e00000000000000000000000000000000");

/// ConstantManager precompile address.
pub const CONSTANT_MANAGER_ADDRESS: Address = address!("6ca548f6df5b540e72262e935b6fe3e72cdd68c9");

/// EVMWriter precompile address (host-assigned; pinned here).
pub const EVM_WRITER_ADDRESS: Address = address!("d100ec0000000000000000000000000000000000");

/// The node itself calls block-boundary entry points from the zero address.
pub const NODE_ADDRESS: Address = Address::ZERO;

/// Fixed-point denominator for all ratio values: 10^18.
pub const DECIMAL_UNIT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Validator status: active.
pub const OK_STATUS: U256 = U256::ZERO;

/// Validator status bit: withdrawn (self-stake or ratio rule violated).
pub const WITHDRAWN_BIT: U256 = U256::from_limbs([1, 0, 0, 0]);

/// Validator status bit: offline penalty applied.
pub const OFFLINE_BIT: U256 = U256::from_limbs([1 << 3, 0, 0, 0]);

/// Validator status bit: double-sign proof accepted. Marks a cheater.
pub const DOUBLESIGN_BIT: U256 = U256::from_limbs([1 << 7, 0, 0, 0]);
