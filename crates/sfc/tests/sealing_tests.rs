//! Integration tests for the epoch-sealing engine: boundary commits, reward
//! accrual and claiming, the offline penalty, the gas-price control loop,
//! seal determinism and revert atomicity.

mod common;

use alloy_primitives::U256;
use alloy_sol_types::{SolCall, SolValue};
use common::{addr, eth, logs_of, Net};
use u2u_sfc::abi::{INodeDriver, ISFC};
use u2u_sfc::{NODE_ADDRESS, NODE_DRIVER_ADDRESS, SFC_ADDRESS};

/// Scenario: sealEpochValidators then sealEpoch advances the sealed epoch by
/// exactly one and finalizes the snapshot.
#[test]
fn seal_epoch_advances_the_boundary() {
    let mut net = Net::new();
    let auth = addr(0x0a);
    let id = net.create_validator(auth, eth(100_000));

    assert_eq!(net.current_sealed_epoch(), U256::ZERO);
    let gas_price_before = net.sfc_u256(ISFC::minGasPriceCall {}.abi_encode());

    net.advance(600);
    net.seal_epoch(&[id]);

    assert_eq!(net.current_sealed_epoch(), U256::from(1));

    let out = net.sfc_ok(
        addr(0xee),
        U256::ZERO,
        ISFC::getEpochSnapshotCall {
            epoch: U256::from(1),
        }
        .abi_encode(),
    );
    let snapshot = ISFC::getEpochSnapshotCall::abi_decode_returns(out.output()).unwrap();
    assert_eq!(snapshot.endTime, U256::from(net.time));
    assert_eq!(
        snapshot.baseRewardPerSecond,
        U256::from(2_600_000_000_000_000_000u128)
    );
    assert_eq!(snapshot.totalStake, eth(100_000));

    let ids_out = net.sfc_ok(
        addr(0xee),
        U256::ZERO,
        ISFC::getEpochValidatorIDsCall {
            epoch: U256::from(1),
        }
        .abi_encode(),
    );
    let ids = Vec::<U256>::abi_decode(ids_out.output()).unwrap();
    assert_eq!(ids, vec![U256::from(id)]);

    // The floor moves at most ±5% per epoch.
    let gas_price_after = net.sfc_u256(ISFC::minGasPriceCall {}.abi_encode());
    let lower = gas_price_before * U256::from(95) / U256::from(100);
    let upper = gas_price_before * U256::from(105) / U256::from(100);
    assert!(gas_price_after >= lower && gas_price_after <= upper);

    // Only the driver chain may seal.
    let direct = net.exec(
        SFC_ADDRESS,
        addr(0x66),
        U256::ZERO,
        ISFC::sealEpochValidatorsCall {
            nextValidatorIDs: vec![U256::from(id)],
        }
        .abi_encode(),
    );
    assert_eq!(
        direct.revert_reason().as_deref(),
        Some("caller is not the NodeDriverAuth contract")
    );
}

/// currentSealedEpoch is monotonic, +1 per seal.
#[test]
fn sealed_epoch_is_monotonic() {
    let mut net = Net::new();
    let id = net.create_validator(addr(0x0a), eth(100_000));

    for round in 1..=5u64 {
        net.advance(600);
        net.seal_epoch(&[id]);
        assert_eq!(net.current_sealed_epoch(), U256::from(round));
    }
}

/// Rewards accrue through the per-token accumulator and can be claimed.
#[test]
fn rewards_accrue_and_claim_pays_out() {
    let mut net = Net::new();
    let auth = addr(0x0a);
    let delegator = addr(0x0b);
    let id = net.create_validator(auth, eth(100_000));
    net.delegate(delegator, id, eth(50_000));

    net.advance(3_600);
    net.seal_epoch(&[id]);

    let pending = net.sfc_u256(
        ISFC::pendingRewardsCall {
            delegator,
            toValidatorID: U256::from(id),
        }
        .abi_encode(),
    );
    assert!(!pending.is_zero(), "delegator accrued rewards");

    let supply_before = net.sfc_u256(ISFC::totalSupplyCall {}.abi_encode());
    let balance_before = net.balance(delegator);
    let result = net.sfc_ok(
        delegator,
        U256::ZERO,
        ISFC::claimRewardsCall {
            toValidatorID: U256::from(id),
        }
        .abi_encode(),
    );

    let claimed = logs_of::<ISFC::ClaimedRewards>(&result.logs);
    assert_eq!(claimed.len(), 1);
    let total =
        claimed[0].lockupExtraReward + claimed[0].lockupBaseReward + claimed[0].unlockedReward;
    assert_eq!(total, pending);
    assert_eq!(net.balance(delegator) - balance_before, total);

    // Claiming mints: the supply grows by the payout.
    let supply_after = net.sfc_u256(ISFC::totalSupplyCall {}.abi_encode());
    assert_eq!(supply_after - supply_before, total);

    // The stash is spent.
    net.sfc_reverts(
        delegator,
        U256::ZERO,
        ISFC::claimRewardsCall {
            toValidatorID: U256::from(id),
        }
        .abi_encode(),
        "zero rewards",
    );
}

/// restakeRewards compounds the payout back into the delegation.
#[test]
fn restake_rewards_compounds() {
    let mut net = Net::new();
    let auth = addr(0x0a);
    let delegator = addr(0x0b);
    let id = net.create_validator(auth, eth(100_000));
    net.delegate(delegator, id, eth(50_000));

    net.advance(3_600);
    net.seal_epoch(&[id]);

    let stake_before = net.stake_of(delegator, id);
    let result = net.sfc_ok(
        delegator,
        U256::ZERO,
        ISFC::restakeRewardsCall {
            toValidatorID: U256::from(id),
        }
        .abi_encode(),
    );
    let restaked = logs_of::<ISFC::RestakedRewards>(&result.logs);
    assert_eq!(restaked.len(), 1);
    let total =
        restaked[0].lockupExtraReward + restaked[0].lockupBaseReward + restaked[0].unlockedReward;
    assert!(!total.is_zero());
    assert_eq!(net.stake_of(delegator, id), stake_before + total);

    net.assert_invariants(&[(auth, id), (delegator, id)]);
}

/// Scenario: a validator reported past both offline thresholds is
/// deactivated with the offline bit and leaves the active total.
#[test]
fn offline_validator_is_penalized_at_seal() {
    let mut net = Net::new();
    let auth_a = addr(0x0a);
    let auth_b = addr(0x0b);
    let id_a = net.create_validator(auth_a, eth(100_000));
    let id_b = net.create_validator(auth_b, eth(200_000));

    let active_before = net.total_active_stake();
    assert_eq!(active_before, eth(300_000));

    net.advance(600);
    let ids: Vec<U256> = vec![U256::from(id_a), U256::from(id_b)];
    let first = net.exec(
        NODE_DRIVER_ADDRESS,
        NODE_ADDRESS,
        U256::ZERO,
        INodeDriver::sealEpochValidatorsCall {
            nextValidatorIDs: ids.clone(),
        }
        .abi_encode(),
    );
    assert!(first.is_success());

    // Validator A: offlineBlocks over the threshold (1000), offlineTime at
    // the threshold (432000). Validator B: clean.
    let dur = U256::from(600);
    let second = net.exec(
        NODE_DRIVER_ADDRESS,
        NODE_ADDRESS,
        U256::ZERO,
        INodeDriver::sealEpochV1Call {
            offlineTime: vec![U256::from(432_000u64), U256::ZERO],
            offlineBlocks: vec![U256::from(1_001u64), U256::ZERO],
            uptimes: vec![dur, dur],
            originatedTxsFee: vec![U256::ZERO, U256::ZERO],
            usedGas: U256::from(21_000u64),
        }
        .abi_encode(),
    );
    assert!(second.is_success(), "{:?}", second.revert_reason());

    // OFFLINE_BIT = 1 << 3.
    let status = net.validator_status(id_a);
    assert_eq!(status & U256::from(8), U256::from(8));
    assert!(net.validator_status(id_b).is_zero());

    assert_eq!(net.total_active_stake(), eth(200_000));

    // The snapshot records the reported counters.
    let offline_blocks = net.sfc_u256(
        ISFC::getEpochOfflineBlocksCall {
            epoch: U256::from(1),
            validatorID: U256::from(id_a),
        }
        .abi_encode(),
    );
    assert_eq!(offline_blocks, U256::from(1_001u64));
}

/// Two identical seals on identical prior state produce byte-identical
/// storage and identical logs.
#[test]
fn sealing_is_deterministic() {
    let run = || {
        let mut net = Net::new();
        let id_a = net.create_validator(addr(0x0a), eth(100_000));
        let id_b = net.create_validator(addr(0x0b), eth(250_000));
        net.delegate(addr(0x0c), id_a, eth(40_000));
        net.advance(3_600);
        let (first, second) = net.seal_epoch_with(&[id_a, id_b], |_, ids| {
            (
                vec![U256::from(3_600u64); ids.len()],
                vec![eth(1), eth(2)],
            )
        });
        let mut logs = first.logs;
        logs.extend(second.logs);
        (net.host.storage_of(SFC_ADDRESS), logs)
    };

    let (storage_a, logs_a) = run();
    let (storage_b, logs_b) = run();
    assert_eq!(storage_a, storage_b, "storage must be byte-identical");
    assert_eq!(logs_a, logs_b, "log streams must be identical");
}

/// A reverting treasury transfer aborts the whole seal with no observable
/// side effect — storage, balances and logs included.
#[test]
fn treasury_revert_rolls_back_the_entire_seal() {
    let mut net = Net::new();
    let auth = addr(0x0a);
    let id = net.create_validator(auth, eth(100_000));

    // Epoch fees must be nonzero for a treasury cut to exist.
    let fees = vec![eth(10)];

    // Pointing the treasury at the SFC itself makes the value transfer hit
    // the SFC fallback, which reverts.
    net.sfc_ok(
        net.owner(),
        U256::ZERO,
        ISFC::updateTreasuryAddressCall {
            treasury: SFC_ADDRESS,
        }
        .abi_encode(),
    );

    net.advance(600);
    let ids = vec![U256::from(id)];
    let first = net.exec(
        NODE_DRIVER_ADDRESS,
        NODE_ADDRESS,
        U256::ZERO,
        INodeDriver::sealEpochValidatorsCall {
            nextValidatorIDs: ids.clone(),
        }
        .abi_encode(),
    );
    assert!(first.is_success());

    let storage_before = net.host.storage_of(SFC_ADDRESS);
    let sealed_before = net.current_sealed_epoch();

    let second = net.exec(
        NODE_DRIVER_ADDRESS,
        NODE_ADDRESS,
        U256::ZERO,
        INodeDriver::sealEpochV1Call {
            offlineTime: vec![U256::ZERO],
            offlineBlocks: vec![U256::ZERO],
            uptimes: vec![U256::from(600u64)],
            originatedTxsFee: fees,
            usedGas: U256::from(21_000u64),
        }
        .abi_encode(),
    );
    assert!(second.is_revert(), "seal must revert with the treasury");
    assert!(second.logs.is_empty(), "no log survives the revert");

    assert_eq!(net.current_sealed_epoch(), sealed_before);
    assert_eq!(
        net.host.storage_of(SFC_ADDRESS),
        storage_before,
        "no storage write survives the revert"
    );

    // With a working treasury the same seal commits and pays the cut.
    let treasury = addr(0x77);
    net.sfc_ok(
        net.owner(),
        U256::ZERO,
        ISFC::updateTreasuryAddressCall { treasury }.abi_encode(),
    );
    let retry = net.exec(
        NODE_DRIVER_ADDRESS,
        NODE_ADDRESS,
        U256::ZERO,
        INodeDriver::sealEpochV1Call {
            offlineTime: vec![U256::ZERO],
            offlineBlocks: vec![U256::ZERO],
            uptimes: vec![U256::from(600u64)],
            originatedTxsFee: vec![eth(10)],
            usedGas: U256::from(21_000u64),
        }
        .abi_encode(),
    );
    assert!(retry.is_success(), "{:?}", retry.revert_reason());
    // treasuryFeeShare is 10% of the 10-token epoch fee.
    assert_eq!(net.balance(treasury), eth(1));
}

/// The gas-price floor never leaves [1 Gwei, 10^6 Gwei] and never moves by
/// more than 5% per epoch, under sustained extreme load in both directions.
#[test]
fn min_gas_price_stays_clamped_across_epochs() {
    let mut net = Net::new();
    let id = net.create_validator(addr(0x0a), eth(100_000));
    let gwei = U256::from(1_000_000_000u64);

    // Idle epochs: the floor would fall 5% per epoch but never below 1 Gwei.
    for _ in 0..3 {
        net.advance(600);
        net.seal_epoch(&[id]);
        let price = net.sfc_u256(ISFC::minGasPriceCall {}.abi_encode());
        assert!(price >= gwei);
    }

    // Overloaded epochs: capped at +5% per epoch.
    let mut last = net.sfc_u256(ISFC::minGasPriceCall {}.abi_encode());
    for _ in 0..5 {
        net.advance(600);
        let ids: Vec<U256> = vec![U256::from(id)];
        let first = net.exec(
            NODE_DRIVER_ADDRESS,
            NODE_ADDRESS,
            U256::ZERO,
            INodeDriver::sealEpochValidatorsCall {
                nextValidatorIDs: ids,
            }
            .abi_encode(),
        );
        assert!(first.is_success());
        let second = net.exec(
            NODE_DRIVER_ADDRESS,
            NODE_ADDRESS,
            U256::ZERO,
            INodeDriver::sealEpochV1Call {
                offlineTime: vec![U256::ZERO],
                offlineBlocks: vec![U256::ZERO],
                uptimes: vec![U256::from(600u64)],
                originatedTxsFee: vec![U256::ZERO],
                usedGas: U256::from(u64::MAX),
            }
            .abi_encode(),
        );
        assert!(second.is_success());

        let price = net.sfc_u256(ISFC::minGasPriceCall {}.abi_encode());
        assert!(price <= last * U256::from(105) / U256::from(100));
        assert!(price >= last);
        assert!(price <= gwei * U256::from(1_000_000u64));
        last = price;
    }
}

/// Validators with zero uptime earn nothing; the honest validator takes the
/// whole base reward pool share.
#[test]
fn zero_uptime_earns_zero() {
    let mut net = Net::new();
    let auth_a = addr(0x0a);
    let auth_b = addr(0x0b);
    let id_a = net.create_validator(auth_a, eth(100_000));
    let id_b = net.create_validator(auth_b, eth(100_000));

    net.advance(3_600);
    net.seal_epoch_with(&[id_a, id_b], |_, _| {
        (
            vec![U256::from(3_600u64), U256::ZERO],
            vec![U256::ZERO, U256::ZERO],
        )
    });

    let pending_a = net.sfc_u256(
        ISFC::pendingRewardsCall {
            delegator: auth_a,
            toValidatorID: U256::from(id_a),
        }
        .abi_encode(),
    );
    let pending_b = net.sfc_u256(
        ISFC::pendingRewardsCall {
            delegator: auth_b,
            toValidatorID: U256::from(id_b),
        }
        .abi_encode(),
    );
    assert!(!pending_a.is_zero());
    assert!(pending_b.is_zero());
}

/// Genesis delegations injected by the node are indistinguishable from
/// organic ones.
#[test]
fn genesis_validator_and_delegation_through_the_driver() {
    let mut net = Net::new();
    let auth = addr(0x31);
    let delegator = addr(0x32);

    let result = net.exec(
        NODE_DRIVER_ADDRESS,
        NODE_ADDRESS,
        U256::ZERO,
        INodeDriver::setGenesisValidatorCall {
            auth,
            validatorID: U256::from(1),
            pubkey: vec![0xdd; 33].into(),
            status: U256::ZERO,
            createdEpoch: U256::ZERO,
            createdTime: U256::from(common::GENESIS_TIME),
            deactivatedEpoch: U256::ZERO,
            deactivatedTime: U256::ZERO,
        }
        .abi_encode(),
    );
    assert!(result.is_success(), "{:?}", result.revert_reason());

    let result = net.exec(
        NODE_DRIVER_ADDRESS,
        NODE_ADDRESS,
        U256::ZERO,
        INodeDriver::setGenesisDelegationCall {
            delegator,
            toValidatorID: U256::from(1),
            stake: eth(500_000),
            lockedStake: U256::ZERO,
            lockupFromEpoch: U256::ZERO,
            lockupEndTime: U256::ZERO,
            lockupDuration: U256::ZERO,
            earlyUnlockPenalty: U256::ZERO,
            rewards: U256::ZERO,
        }
        .abi_encode(),
    );
    assert!(result.is_success(), "{:?}", result.revert_reason());

    assert_eq!(net.stake_of(delegator, 1), eth(500_000));
    assert_eq!(net.total_stake(), eth(500_000));
    // Genesis stake is minted, not transferred in.
    assert_eq!(
        net.sfc_u256(ISFC::totalSupplyCall {}.abi_encode()),
        eth(1_000_000_000) + eth(500_000)
    );

    // Only the node may use the genesis callbacks.
    let direct = net.exec(
        NODE_DRIVER_ADDRESS,
        addr(0x99),
        U256::ZERO,
        INodeDriver::deactivateValidatorCall {
            validatorID: U256::from(1),
            status: U256::from(8),
        }
        .abi_encode(),
    );
    assert_eq!(direct.revert_reason().as_deref(), Some("not callable"));
}
