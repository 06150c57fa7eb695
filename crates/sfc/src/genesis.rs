//! Genesis wiring for the precompile suite.
//!
//! Runs the four `initialize` calls in dependency order and programs the
//! ConstantManager with the network's launch tunables, all through the
//! public ABI so genesis state is bit-identical to what the deployed
//! contracts would have produced.

use crate::abi::{IConstantManager, INodeDriver, INodeDriverAuth, ISFC};
use crate::vm::{BlockEnv, SfcSuite};
use crate::{
    CONSTANT_MANAGER_ADDRESS, DECIMAL_UNIT, EVM_WRITER_ADDRESS, NODE_DRIVER_ADDRESS,
    NODE_DRIVER_AUTH_ADDRESS, SFC_ADDRESS,
};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use u2u_state::StateKv;

/// Launch values for the fifteen tunables. Defaults sit inside every
/// setter's bounds.
#[derive(Debug, Clone)]
pub struct GenesisConstants {
    pub min_self_stake: U256,
    pub max_delegated_ratio: U256,
    pub validator_commission: U256,
    pub burnt_fee_share: U256,
    pub treasury_fee_share: U256,
    pub unlocked_reward_ratio: U256,
    pub min_lockup_duration: U256,
    pub max_lockup_duration: U256,
    pub withdrawal_period_epochs: U256,
    pub withdrawal_period_time: U256,
    pub base_reward_per_second: U256,
    pub offline_penalty_threshold_blocks_num: U256,
    pub offline_penalty_threshold_time: U256,
    pub target_gas_power_per_second: U256,
    pub gas_price_balancing_counterweight: U256,
}

impl Default for GenesisConstants {
    fn default() -> Self {
        let unit = DECIMAL_UNIT;
        Self {
            min_self_stake: U256::from(100_000u64) * unit,
            max_delegated_ratio: U256::from(16) * unit,
            validator_commission: unit * U256::from(15) / U256::from(100),
            burnt_fee_share: unit * U256::from(20) / U256::from(100),
            treasury_fee_share: unit * U256::from(10) / U256::from(100),
            unlocked_reward_ratio: unit * U256::from(30) / U256::from(100),
            min_lockup_duration: U256::from(86_400u64 * 14),
            max_lockup_duration: U256::from(86_400u64 * 365),
            withdrawal_period_epochs: U256::from(3),
            withdrawal_period_time: U256::from(604_800u64),
            base_reward_per_second: U256::from(2_600_000_000_000_000_000u128),
            offline_penalty_threshold_blocks_num: U256::from(1_000),
            offline_penalty_threshold_time: U256::from(432_000u64),
            target_gas_power_per_second: U256::from(2_000_000u64),
            gas_price_balancing_counterweight: U256::from(3_600u64),
        }
    }
}

/// Genesis parameters for the suite.
#[derive(Debug, Clone)]
pub struct GenesisConfig {
    /// Owner of the SFC, ConstantManager and NodeDriverAuth.
    pub owner: Address,
    /// Initial total token supply.
    pub total_supply: U256,
    /// Epoch number the chain starts sealed at (usually zero).
    pub sealed_epoch: U256,
    /// Launch tunables.
    pub constants: GenesisConstants,
}

impl GenesisConfig {
    pub fn new(owner: Address, total_supply: U256) -> Self {
        Self {
            owner,
            total_supply,
            sealed_epoch: U256::ZERO,
            constants: GenesisConstants::default(),
        }
    }
}

/// Wire the suite at genesis. Fails with the revert reason of the first
/// call that does not commit.
pub fn deploy<K: StateKv>(
    suite: &SfcSuite<K>,
    config: &GenesisConfig,
    block: BlockEnv,
) -> Result<(), String> {
    let call = |to: Address, input: Vec<u8>| -> Result<(), String> {
        let result = suite.execute(to, config.owner, U256::ZERO, &input, 10_000_000, block);
        if result.is_success() {
            Ok(())
        } else {
            Err(result
                .revert_reason()
                .unwrap_or_else(|| "genesis call failed".to_string()))
        }
    };

    call(
        NODE_DRIVER_ADDRESS,
        INodeDriver::initializeCall {
            backend: NODE_DRIVER_AUTH_ADDRESS,
            evmWriterAddress: EVM_WRITER_ADDRESS,
        }
        .abi_encode(),
    )?;
    call(
        NODE_DRIVER_AUTH_ADDRESS,
        INodeDriverAuth::initializeCall {
            sfc: SFC_ADDRESS,
            driver: NODE_DRIVER_ADDRESS,
            owner: config.owner,
        }
        .abi_encode(),
    )?;
    call(
        CONSTANT_MANAGER_ADDRESS,
        IConstantManager::initializeCall {
            owner: config.owner,
        }
        .abi_encode(),
    )?;

    let c = &config.constants;
    let setters: [Vec<u8>; 15] = [
        IConstantManager::updateMinSelfStakeCall { v: c.min_self_stake }.abi_encode(),
        IConstantManager::updateMaxDelegatedRatioCall {
            v: c.max_delegated_ratio,
        }
        .abi_encode(),
        IConstantManager::updateValidatorCommissionCall {
            v: c.validator_commission,
        }
        .abi_encode(),
        IConstantManager::updateBurntFeeShareCall {
            v: c.burnt_fee_share,
        }
        .abi_encode(),
        IConstantManager::updateTreasuryFeeShareCall {
            v: c.treasury_fee_share,
        }
        .abi_encode(),
        IConstantManager::updateUnlockedRewardRatioCall {
            v: c.unlocked_reward_ratio,
        }
        .abi_encode(),
        IConstantManager::updateMinLockupDurationCall {
            v: c.min_lockup_duration,
        }
        .abi_encode(),
        IConstantManager::updateMaxLockupDurationCall {
            v: c.max_lockup_duration,
        }
        .abi_encode(),
        IConstantManager::updateWithdrawalPeriodEpochsCall {
            v: c.withdrawal_period_epochs,
        }
        .abi_encode(),
        IConstantManager::updateWithdrawalPeriodTimeCall {
            v: c.withdrawal_period_time,
        }
        .abi_encode(),
        IConstantManager::updateBaseRewardPerSecondCall {
            v: c.base_reward_per_second,
        }
        .abi_encode(),
        IConstantManager::updateOfflinePenaltyThresholdBlocksNumCall {
            v: c.offline_penalty_threshold_blocks_num,
        }
        .abi_encode(),
        IConstantManager::updateOfflinePenaltyThresholdTimeCall {
            v: c.offline_penalty_threshold_time,
        }
        .abi_encode(),
        IConstantManager::updateTargetGasPowerPerSecondCall {
            v: c.target_gas_power_per_second,
        }
        .abi_encode(),
        IConstantManager::updateGasPriceBalancingCounterweightCall {
            v: c.gas_price_balancing_counterweight,
        }
        .abi_encode(),
    ];
    for setter in setters {
        call(CONSTANT_MANAGER_ADDRESS, setter)?;
    }

    call(
        SFC_ADDRESS,
        ISFC::initializeCall {
            sealedEpoch: config.sealed_epoch,
            totalSupply: config.total_supply,
            nodeDriver: NODE_DRIVER_AUTH_ADDRESS,
            lib: Address::ZERO,
            consts: CONSTANT_MANAGER_ADDRESS,
            owner: config.owner,
        }
        .abi_encode(),
    )?;

    tracing::info!(owner = %config.owner, "genesis wiring deployed");
    Ok(())
}
