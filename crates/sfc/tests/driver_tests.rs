//! Integration tests for the NodeDriver / NodeDriverAuth / EVMWriter
//! dispatch wrappers and the ConstantManager setters.

mod common;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use common::{addr, eth, logs_of, Net};
use u2u_sfc::abi::{IConstantManager, INodeDriver, INodeDriverAuth};
use u2u_sfc::{
    CONSTANT_MANAGER_ADDRESS, NODE_DRIVER_ADDRESS, NODE_DRIVER_AUTH_ADDRESS,
};
use u2u_state::StateKv;

/// The owner-side administration path reaches the EVMWriter and mutates raw
/// account state: DriverAuth → NodeDriver → EVMWriter.
#[test]
fn admin_balance_and_nonce_mutations_flow_through_the_chain() {
    let net = Net::new();
    let victim = addr(0x55);

    // incNonce through the auth contract.
    let result = net.exec(
        NODE_DRIVER_AUTH_ADDRESS,
        net.owner(),
        U256::ZERO,
        INodeDriverAuth::incNonceCall {
            acc: victim,
            diff: U256::from(3),
        }
        .abi_encode(),
    );
    assert!(result.is_success(), "{:?}", result.revert_reason());
    assert_eq!(net.host.nonce(victim).unwrap(), 3);

    // Non-owner is rejected at the gate.
    let result = net.exec(
        NODE_DRIVER_AUTH_ADDRESS,
        addr(0x66),
        U256::ZERO,
        INodeDriverAuth::incNonceCall {
            acc: victim,
            diff: U256::from(1),
        }
        .abi_encode(),
    );
    assert_eq!(
        result.revert_reason().as_deref(),
        Some("Ownable: caller is not the owner")
    );

    // The writer itself refuses everyone but the driver.
    let result = net.exec(
        u2u_sfc::EVM_WRITER_ADDRESS,
        net.owner(),
        U256::ZERO,
        u2u_sfc::abi::IEVMWriter::setBalanceCall {
            acc: victim,
            value: eth(1),
        }
        .abi_encode(),
    );
    assert_eq!(
        result.revert_reason().as_deref(),
        Some("caller is not the NodeDriver contract")
    );
}

/// Network-rule updates surface as NodeDriver events for the node to pick
/// up.
#[test]
fn network_rules_and_epoch_advance_emit_driver_events() {
    let net = Net::new();

    let diff = Bytes::from(br#"{"Blocks":{"MaxBlockGas":20500000}}"#.to_vec());
    let result = net.exec(
        NODE_DRIVER_AUTH_ADDRESS,
        net.owner(),
        U256::ZERO,
        INodeDriverAuth::updateNetworkRulesCall { diff: diff.clone() }.abi_encode(),
    );
    assert!(result.is_success());
    let events = logs_of::<INodeDriver::UpdateNetworkRules>(&result.logs);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].diff, diff);
    assert_eq!(result.logs[0].address, NODE_DRIVER_ADDRESS);

    let result = net.exec(
        NODE_DRIVER_AUTH_ADDRESS,
        net.owner(),
        U256::ZERO,
        INodeDriverAuth::advanceEpochsCall {
            num: U256::from(4),
        }
        .abi_encode(),
    );
    assert!(result.is_success());
    let events = logs_of::<INodeDriver::AdvanceEpochs>(&result.logs);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].num, U256::from(4));

    let result = net.exec(
        NODE_DRIVER_AUTH_ADDRESS,
        net.owner(),
        U256::ZERO,
        INodeDriverAuth::updateNetworkVersionCall {
            version: U256::from(1_070_000u64),
        }
        .abi_encode(),
    );
    assert!(result.is_success());
    let events = logs_of::<INodeDriver::UpdateNetworkVersion>(&result.logs);
    assert_eq!(events[0].version, U256::from(1_070_000u64));
}

/// The driver's backend-only surface rejects arbitrary callers.
#[test]
fn driver_backend_surface_is_gated() {
    let net = Net::new();

    let result = net.exec(
        NODE_DRIVER_ADDRESS,
        addr(0x66),
        U256::ZERO,
        INodeDriver::setBalanceCall {
            acc: addr(0x55),
            value: eth(1),
        }
        .abi_encode(),
    );
    assert_eq!(
        result.revert_reason().as_deref(),
        Some("caller is not the backend")
    );

    // The writer refuses the zero address even on the legitimate path:
    // burning goes through the SFC, never through the writer.
    let result = net.exec(
        NODE_DRIVER_ADDRESS,
        NODE_DRIVER_AUTH_ADDRESS,
        U256::ZERO,
        INodeDriver::setBalanceCall {
            acc: Address::ZERO,
            value: eth(1),
        }
        .abi_encode(),
    );
    assert_eq!(result.revert_reason().as_deref(), Some("not callable"));
}

/// Code copy and swap through the writer.
#[test]
fn copy_and_swap_code() {
    let net = Net::new();
    let a = addr(0x41);
    let b = addr(0x42);
    net.host.set_code(a, Bytes::from(vec![0x60, 0x01])).unwrap();
    net.host.set_code(b, Bytes::from(vec![0x60, 0x02])).unwrap();

    let result = net.exec(
        NODE_DRIVER_AUTH_ADDRESS,
        net.owner(),
        U256::ZERO,
        INodeDriverAuth::upgradeCodeCall { acc: a, from: b }.abi_encode(),
    );
    assert!(result.is_success(), "{:?}", result.revert_reason());
    assert_eq!(net.host.code(a).unwrap(), net.host.code(b).unwrap());

    // upgradeCode refuses codeless accounts.
    let result = net.exec(
        NODE_DRIVER_AUTH_ADDRESS,
        net.owner(),
        U256::ZERO,
        INodeDriverAuth::upgradeCodeCall {
            acc: addr(0x43),
            from: b,
        }
        .abi_encode(),
    );
    assert_eq!(result.revert_reason().as_deref(), Some("copy isn't allowed"));

    // Swap through the driver as the backend.
    let result = net.exec(
        NODE_DRIVER_ADDRESS,
        NODE_DRIVER_AUTH_ADDRESS,
        U256::ZERO,
        INodeDriver::swapCodeCall { acc: a, with: b }.abi_encode(),
    );
    assert!(result.is_success());
}

/// ConstantManager setters enforce the documented bounds and dirty the
/// constants cache observed by the SFC.
#[test]
fn constant_manager_bounds_and_cache_invalidation() {
    let mut net = Net::new();
    let cm = CONSTANT_MANAGER_ADDRESS;

    let read = |net: &Net, input: Vec<u8>| -> U256 {
        let result = net.exec(cm, addr(0xee), U256::ZERO, input);
        assert!(result.is_success());
        U256::abi_decode(result.output()).unwrap()
    };

    // Bounds: withdrawalPeriodEpochs ∈ [2, 100].
    for (value, reason) in [(1u64, "too small value"), (101, "too big value")] {
        let result = net.exec(
            cm,
            net.owner(),
            U256::ZERO,
            IConstantManager::updateWithdrawalPeriodEpochsCall {
                v: U256::from(value),
            }
            .abi_encode(),
        );
        assert_eq!(result.revert_reason().as_deref(), Some(reason));
    }

    // Non-owner cannot touch tunables.
    let result = net.exec(
        cm,
        addr(0x66),
        U256::ZERO,
        IConstantManager::updateWithdrawalPeriodEpochsCall { v: U256::from(5) }.abi_encode(),
    );
    assert_eq!(
        result.revert_reason().as_deref(),
        Some("Ownable: caller is not the owner")
    );

    // In-bounds write lands and is served back.
    let result = net.exec(
        cm,
        net.owner(),
        U256::ZERO,
        IConstantManager::updateWithdrawalPeriodEpochsCall { v: U256::from(5) }.abi_encode(),
    );
    assert!(result.is_success());
    assert_eq!(
        read(&net, IConstantManager::withdrawalPeriodEpochsCall {}.abi_encode()),
        U256::from(5)
    );

    // The SFC observes the new value on its next dispatch entry: raise
    // minSelfStake beyond the default and watch createValidator flip from
    // accepting 100k to demanding more.
    let result = net.exec(
        cm,
        net.owner(),
        U256::ZERO,
        IConstantManager::updateMinSelfStakeCall {
            v: eth(200_000),
        }
        .abi_encode(),
    );
    assert!(result.is_success());

    let auth = addr(0x0a);
    net.fund(auth, eth(100_000));
    net.sfc_reverts(
        auth,
        eth(100_000),
        u2u_sfc::abi::ISFC::createValidatorCall {
            pubkey: vec![0xaa; 33].into(),
        }
        .abi_encode(),
        "insufficient self-stake",
    );
    net.create_validator(auth, eth(200_000));
}

/// Double initialization is rejected everywhere.
#[test]
fn initialize_is_once_only() {
    let net = Net::new();

    let result = net.exec(
        NODE_DRIVER_ADDRESS,
        net.owner(),
        U256::ZERO,
        INodeDriver::initializeCall {
            backend: NODE_DRIVER_AUTH_ADDRESS,
            evmWriterAddress: u2u_sfc::EVM_WRITER_ADDRESS,
        }
        .abi_encode(),
    );
    assert_eq!(result.revert_reason().as_deref(), Some("already initialized"));

    let result = net.exec(
        CONSTANT_MANAGER_ADDRESS,
        net.owner(),
        U256::ZERO,
        IConstantManager::initializeCall { owner: net.owner() }.abi_encode(),
    );
    assert_eq!(result.revert_reason().as_deref(), Some("already initialized"));
}

/// Unknown selectors revert with no data; empty input hits the fallback.
#[test]
fn unknown_selectors_revert_empty() {
    let net = Net::new();

    let result = net.exec(
        NODE_DRIVER_ADDRESS,
        addr(0x66),
        U256::ZERO,
        vec![0xde, 0xad, 0xbe, 0xef],
    );
    assert!(result.is_revert());
    assert!(result.output().is_empty());
    assert_eq!(result.gas_used(), 0);

    let result = net.exec(u2u_sfc::SFC_ADDRESS, addr(0x66), U256::ZERO, Vec::new());
    assert!(result.is_revert());
    assert!(result.output().is_empty());
}
