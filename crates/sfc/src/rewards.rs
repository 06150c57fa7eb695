//! Pure reward and gas-price computations.
//!
//! Everything here is arithmetic over non-negative 256-bit words; inputs are
//! bounded (stakes below total supply, uptimes below epoch duration) so the
//! intermediate products cannot overflow for realistic chains. Division
//! floors, as in the contract.

use crate::DECIMAL_UNIT;
use alloy_primitives::U256;

/// Hard floor for the minimum gas price: 1 Gwei.
pub const MIN_GAS_PRICE_FLOOR: U256 = U256::from_limbs([1_000_000_000, 0, 0, 0]);

/// Hard ceiling for the minimum gas price: 10^6 Gwei.
pub const MIN_GAS_PRICE_CEILING: U256 = U256::from_limbs([1_000_000_000_000_000, 0, 0, 0]);

/// A reward split into its lockup-extra, lockup-base and unlocked parts.
/// Laid out in three consecutive storage slots wherever it is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rewards {
    pub lockup_extra: U256,
    pub lockup_base: U256,
    pub unlocked: U256,
}

impl Rewards {
    /// Sum of the three components.
    pub fn total(&self) -> U256 {
        self.lockup_extra + self.lockup_base + self.unlocked
    }

    /// Component-wise sum.
    pub fn add(self, other: Self) -> Self {
        Self {
            lockup_extra: self.lockup_extra + other.lockup_extra,
            lockup_base: self.lockup_base + other.lockup_base,
            unlocked: self.unlocked + other.unlocked,
        }
    }

    /// Whether every component is zero.
    pub fn is_zero(&self) -> bool {
        self.lockup_extra.is_zero() && self.lockup_base.is_zero() && self.unlocked.is_zero()
    }
}

/// Base reward weight of a validator for one epoch:
/// `(receivedStake·uptime/epochDuration)·uptime/epochDuration`.
pub fn base_reward_weight(received_stake: U256, uptime: U256, epoch_duration: U256) -> U256 {
    if epoch_duration.is_zero() {
        return U256::ZERO;
    }
    received_stake * uptime / epoch_duration * uptime / epoch_duration
}

/// Tx reward weight: `originatedTxsFee·uptime/epochDuration`.
pub fn tx_reward_weight(originated_txs_fee: U256, uptime: U256, epoch_duration: U256) -> U256 {
    if epoch_duration.is_zero() {
        return U256::ZERO;
    }
    originated_txs_fee * uptime / epoch_duration
}

/// Raw base reward share: the epoch's total base reward pool
/// (`epochDuration·baseRewardPerSecond`) times this validator's weight share.
pub fn raw_base_reward(
    epoch_duration: U256,
    base_reward_per_second: U256,
    weight: U256,
    total_weight: U256,
) -> U256 {
    if total_weight.is_zero() {
        return U256::ZERO;
    }
    let total_reward = epoch_duration * base_reward_per_second;
    total_reward * weight / total_weight
}

/// Raw tx reward share: the validator's share of the epoch fee, minus the
/// burnt and treasury cuts.
pub fn raw_tx_reward(
    epoch_fee: U256,
    tx_weight: U256,
    total_tx_weight: U256,
    burnt_fee_share: U256,
    treasury_fee_share: U256,
) -> U256 {
    if total_tx_weight.is_zero() {
        return U256::ZERO;
    }
    let tx_reward = epoch_fee * tx_weight / total_tx_weight;
    // The burnt and treasury shares of the fee never reach validators.
    tx_reward * (DECIMAL_UNIT - burnt_fee_share - treasury_fee_share) / DECIMAL_UNIT
}

/// Validator commission cut of a raw reward.
pub fn commission_of(raw_reward: U256, validator_commission: U256) -> U256 {
    raw_reward * validator_commission / DECIMAL_UNIT
}

/// Scale a full reward by lockup duration.
///
/// Locked rewards split into a base part (the unlocked ratio of the full
/// reward) plus an extra part growing linearly with the lockup duration up
/// to `maxLockupDuration`; unlocked rewards keep only the base ratio.
pub fn scale_lockup_reward(
    full_reward: U256,
    lockup_duration: U256,
    max_lockup_duration: U256,
    unlocked_reward_ratio: U256,
) -> Rewards {
    let mut reward = Rewards::default();
    if full_reward.is_zero() {
        return reward;
    }
    if !lockup_duration.is_zero() && !max_lockup_duration.is_zero() {
        let max_extra_ratio = DECIMAL_UNIT - unlocked_reward_ratio;
        let extra_ratio = max_extra_ratio * lockup_duration / max_lockup_duration;
        let total_scaled = full_reward * (unlocked_reward_ratio + extra_ratio) / DECIMAL_UNIT;
        reward.lockup_base = full_reward * unlocked_reward_ratio / DECIMAL_UNIT;
        reward.lockup_extra = total_scaled - reward.lockup_base;
    } else {
        reward.unlocked = full_reward * unlocked_reward_ratio / DECIMAL_UNIT;
    }
    reward
}

/// Reward-per-token accumulator increment for delegators.
pub fn reward_per_token_delta(delegators_reward: U256, received_stake: U256) -> U256 {
    if received_stake.is_zero() {
        return U256::ZERO;
    }
    delegators_reward * DECIMAL_UNIT / received_stake
}

/// Slashing penalty on a withdrawal of `amount` from a cheater, given the
/// validator's refund ratio. Zero for honest validators or full refunds;
/// capped at the amount.
pub fn slashing_penalty(amount: U256, is_cheater: bool, refund_ratio: U256) -> U256 {
    if !is_cheater || refund_ratio >= DECIMAL_UNIT {
        return U256::ZERO;
    }
    let penalty = amount * (DECIMAL_UNIT - refund_ratio) / DECIMAL_UNIT;
    penalty.min(amount)
}

/// One step of the minimum-gas-price control loop.
///
/// The epoch's gas consumption is compared against the target
/// (`epochDuration·targetGasPowerPerSecond + 1`), the resulting ratio is
/// smoothed against the balancing counterweight, clamped to ±5% per epoch,
/// and applied to the current floor within [1 Gwei, 10^6 Gwei].
pub fn next_min_gas_price(
    current: U256,
    epoch_duration: U256,
    epoch_gas: U256,
    target_gas_power_per_second: U256,
    counterweight: U256,
) -> U256 {
    let target_epoch_gas = epoch_duration * target_gas_power_per_second + U256::from(1);
    let mut ratio = epoch_gas * DECIMAL_UNIT / target_epoch_gas;

    // Smooth towards 1.0 with the counterweight.
    ratio = (epoch_duration * ratio + counterweight * DECIMAL_UNIT) / (epoch_duration + counterweight);

    // Max 5% change per epoch.
    let lower = DECIMAL_UNIT * U256::from(95) / U256::from(100);
    let upper = DECIMAL_UNIT * U256::from(105) / U256::from(100);
    ratio = ratio.clamp(lower, upper);

    (current * ratio / DECIMAL_UNIT).clamp(MIN_GAS_PRICE_FLOOR, MIN_GAS_PRICE_CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth(n: u64) -> U256 {
        U256::from(n) * DECIMAL_UNIT
    }

    #[test]
    fn base_weight_is_quadratic_in_uptime() {
        let stake = eth(100_000);
        let duration = U256::from(600);
        let full = base_reward_weight(stake, duration, duration);
        let half = base_reward_weight(stake, duration / U256::from(2), duration);
        assert_eq!(full, stake);
        assert_eq!(half, stake / U256::from(4));
        assert_eq!(base_reward_weight(stake, U256::ZERO, duration), U256::ZERO);
    }

    #[test]
    fn raw_rewards_split_by_weight_share() {
        let duration = U256::from(600);
        let brps = eth(2);
        // Two validators, weights 1:3.
        let total = U256::from(4);
        let a = raw_base_reward(duration, brps, U256::from(1), total);
        let b = raw_base_reward(duration, brps, U256::from(3), total);
        assert_eq!(a + b, duration * brps);
        assert_eq!(b, a * U256::from(3));

        assert_eq!(
            raw_base_reward(duration, brps, U256::from(1), U256::ZERO),
            U256::ZERO
        );
    }

    #[test]
    fn tx_reward_excludes_burnt_and_treasury_cuts() {
        let fee = eth(10);
        // 20% burnt, 10% treasury → 70% reaches the validator.
        let burnt = DECIMAL_UNIT / U256::from(5);
        let treasury = DECIMAL_UNIT / U256::from(10);
        let reward = raw_tx_reward(fee, U256::from(1), U256::from(1), burnt, treasury);
        assert_eq!(reward, eth(7));
    }

    #[test]
    fn lockup_scaling_matches_the_contract_formula() {
        let full = eth(100);
        let max_duration = U256::from(126_144_000u64);
        let ratio = DECIMAL_UNIT * U256::from(30) / U256::from(100); // 30%

        // No lockup: only the unlocked share survives.
        let unlocked = scale_lockup_reward(full, U256::ZERO, max_duration, ratio);
        assert_eq!(unlocked.unlocked, eth(30));
        assert_eq!(unlocked.lockup_base, U256::ZERO);
        assert_eq!(unlocked.lockup_extra, U256::ZERO);

        // Max lockup: the whole reward survives, split base/extra.
        let locked = scale_lockup_reward(full, max_duration, max_duration, ratio);
        assert_eq!(locked.lockup_base, eth(30));
        assert_eq!(locked.lockup_extra, eth(70));
        assert_eq!(locked.unlocked, U256::ZERO);
        assert_eq!(locked.total(), full);

        // Half lockup: extra scales linearly.
        let half = scale_lockup_reward(full, max_duration / U256::from(2), max_duration, ratio);
        assert_eq!(half.lockup_base, eth(30));
        assert_eq!(half.lockup_extra, eth(35));
    }

    #[test]
    fn slashing_penalty_follows_refund_ratio() {
        let amount = eth(20);
        assert_eq!(slashing_penalty(amount, false, U256::ZERO), U256::ZERO);
        assert_eq!(slashing_penalty(amount, true, DECIMAL_UNIT), U256::ZERO);
        // No refund: the whole amount is forfeited.
        assert_eq!(slashing_penalty(amount, true, U256::ZERO), amount);
        // 70% refund: 30% forfeited.
        let ratio = DECIMAL_UNIT * U256::from(70) / U256::from(100);
        assert_eq!(slashing_penalty(amount, true, ratio), eth(6));
    }

    #[test]
    fn min_gas_price_is_clamped_to_five_percent_per_epoch() {
        let current = U256::from(50_000_000_000u64); // 50 Gwei
        let duration = U256::from(600);
        let target = U256::from(2_000_000u64);
        let counterweight = U256::from(3600);

        // Massive overload cannot push the price more than +5%.
        let up = next_min_gas_price(
            current,
            duration,
            U256::from(u64::MAX),
            target,
            counterweight,
        );
        assert_eq!(up, current * U256::from(105) / U256::from(100));

        // Idle epoch cannot pull it more than -5%.
        let down = next_min_gas_price(current, duration, U256::ZERO, target, counterweight);
        assert_eq!(down, current * U256::from(95) / U256::from(100));
    }

    #[test]
    fn min_gas_price_respects_floor_and_ceiling() {
        let duration = U256::from(600);
        let target = U256::from(2_000_000u64);
        let counterweight = U256::from(3600);

        let at_floor = next_min_gas_price(
            MIN_GAS_PRICE_FLOOR,
            duration,
            U256::ZERO,
            target,
            counterweight,
        );
        assert_eq!(at_floor, MIN_GAS_PRICE_FLOOR);

        let at_ceiling = next_min_gas_price(
            MIN_GAS_PRICE_CEILING,
            duration,
            U256::from(u64::MAX),
            target,
            counterweight,
        );
        assert_eq!(at_ceiling, MIN_GAS_PRICE_CEILING);
    }

    #[test]
    fn balanced_epoch_keeps_the_price_nearly_still() {
        let current = U256::from(10_000_000_000u64);
        let duration = U256::from(600);
        let target = U256::from(2_000_000u64);
        // Exactly on-target consumption.
        let gas = duration * target;
        let next = next_min_gas_price(current, duration, gas, target, U256::from(3600));
        // Within one part in 10^9 of the current price.
        let diff = next.abs_diff(current);
        assert!(diff <= current / U256::from(1_000_000_000u64));
    }
}
