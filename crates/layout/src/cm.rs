//! ConstantManager contract storage layout.
//!
//! Same gap pattern as the SFC: `Initializable` in slot 0, `owner` at 0x33,
//! the fifteen tunables from 0x66 in declaration order.

pub mod slot {
    use alloy_primitives::U256;

    /// slot 0: initialized flag
    pub const INITIALIZED: U256 = U256::from_limbs([0, 0, 0, 0]);
    /// slot 0x33: owner
    pub const OWNER: U256 = U256::from_limbs([0x33, 0, 0, 0]);
    /// slot 0x66: minSelfStake
    pub const MIN_SELF_STAKE: U256 = U256::from_limbs([0x66, 0, 0, 0]);
    /// slot 0x67: maxDelegatedRatio
    pub const MAX_DELEGATED_RATIO: U256 = U256::from_limbs([0x67, 0, 0, 0]);
    /// slot 0x68: validatorCommission
    pub const VALIDATOR_COMMISSION: U256 = U256::from_limbs([0x68, 0, 0, 0]);
    /// slot 0x69: burntFeeShare
    pub const BURNT_FEE_SHARE: U256 = U256::from_limbs([0x69, 0, 0, 0]);
    /// slot 0x6a: treasuryFeeShare
    pub const TREASURY_FEE_SHARE: U256 = U256::from_limbs([0x6a, 0, 0, 0]);
    /// slot 0x6b: unlockedRewardRatio
    pub const UNLOCKED_REWARD_RATIO: U256 = U256::from_limbs([0x6b, 0, 0, 0]);
    /// slot 0x6c: minLockupDuration
    pub const MIN_LOCKUP_DURATION: U256 = U256::from_limbs([0x6c, 0, 0, 0]);
    /// slot 0x6d: maxLockupDuration
    pub const MAX_LOCKUP_DURATION: U256 = U256::from_limbs([0x6d, 0, 0, 0]);
    /// slot 0x6e: withdrawalPeriodEpochs
    pub const WITHDRAWAL_PERIOD_EPOCHS: U256 = U256::from_limbs([0x6e, 0, 0, 0]);
    /// slot 0x6f: withdrawalPeriodTime
    pub const WITHDRAWAL_PERIOD_TIME: U256 = U256::from_limbs([0x6f, 0, 0, 0]);
    /// slot 0x70: baseRewardPerSecond
    pub const BASE_REWARD_PER_SECOND: U256 = U256::from_limbs([0x70, 0, 0, 0]);
    /// slot 0x71: offlinePenaltyThresholdBlocksNum
    pub const OFFLINE_PENALTY_THRESHOLD_BLOCKS: U256 = U256::from_limbs([0x71, 0, 0, 0]);
    /// slot 0x72: offlinePenaltyThresholdTime
    pub const OFFLINE_PENALTY_THRESHOLD_TIME: U256 = U256::from_limbs([0x72, 0, 0, 0]);
    /// slot 0x73: targetGasPowerPerSecond
    pub const TARGET_GAS_POWER_PER_SECOND: U256 = U256::from_limbs([0x73, 0, 0, 0]);
    /// slot 0x74: gasPriceBalancingCounterweight
    pub const GAS_PRICE_BALANCING_COUNTERWEIGHT: U256 = U256::from_limbs([0x74, 0, 0, 0]);
}

#[cfg(test)]
mod tests {
    use super::slot;
    use alloy_primitives::U256;

    #[test]
    fn tunables_are_contiguous_from_0x66() {
        assert_eq!(slot::MIN_SELF_STAKE, U256::from(0x66));
        assert_eq!(
            slot::GAS_PRICE_BALANCING_COUNTERWEIGHT,
            U256::from(0x66 + 14)
        );
    }
}
