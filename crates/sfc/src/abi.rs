//! Solidity ABI surface of the precompile suite.
//!
//! The `sol!` declarations below are the single source of truth for
//! selectors, argument tuples, return tuples and event encodings. Dispatch
//! matches on `SolCall::SELECTOR`; events are emitted through
//! `SolEvent::encode_log_data` so topic positions stay bit-exact with the
//! original contracts.

use crate::error::SfcError;
use alloy_sol_types::{sol, SolCall};

/// Decode a call's argument tuple. A malformed tuple reverts with no data,
/// like the dispatcher of the bytecode contract.
pub(crate) fn decode_call<C: SolCall>(input: &[u8]) -> Result<C, SfcError> {
    C::abi_decode(input).map_err(|_| SfcError::EmptyRevert)
}

sol! {
    /// Special Fee Contract: staking, delegation, rewards, epoch sealing.
    interface ISFC {
        event CreatedValidator(uint256 indexed validatorID, address indexed auth, uint256 createdEpoch, uint256 createdTime);
        event Delegated(address indexed delegator, uint256 indexed toValidatorID, uint256 amount);
        event Undelegated(address indexed delegator, uint256 indexed toValidatorID, uint256 indexed wrID, uint256 amount);
        event Withdrawn(address indexed delegator, uint256 indexed toValidatorID, uint256 indexed wrID, uint256 amount);
        event LockedUpStake(address indexed delegator, uint256 indexed validatorID, uint256 duration, uint256 amount);
        event UnlockedStake(address indexed delegator, uint256 indexed validatorID, uint256 amount, uint256 penalty);
        event ClaimedRewards(address indexed delegator, uint256 indexed toValidatorID, uint256 lockupExtraReward, uint256 lockupBaseReward, uint256 unlockedReward);
        event RestakedRewards(address indexed delegator, uint256 indexed toValidatorID, uint256 lockupExtraReward, uint256 lockupBaseReward, uint256 unlockedReward);
        event InflatedU2U(address indexed receiver, uint256 amount, string justification);
        event BurntU2U(uint256 amount);
        event DeactivatedValidator(uint256 indexed validatorID, uint256 deactivatedEpoch, uint256 deactivatedTime);
        event ChangedValidatorStatus(uint256 indexed validatorID, uint256 status);
        event UpdatedSlashingRefundRatio(uint256 indexed validatorID, uint256 refundRatio);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function initialize(uint256 sealedEpoch, uint256 totalSupply, address nodeDriver, address lib, address consts, address owner) external;

        // Ownable
        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function renounceOwnership() external;

        // Global views
        function version() external pure returns (bytes3);
        function currentSealedEpoch() external view returns (uint256);
        function currentEpoch() external view returns (uint256);
        function lastValidatorID() external view returns (uint256);
        function totalStake() external view returns (uint256);
        function totalActiveStake() external view returns (uint256);
        function totalSlashedStake() external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function minGasPrice() external view returns (uint256);
        function treasuryAddress() external view returns (address);
        function stakeTokenizerAddress() external view returns (address);
        function voteBookAddress() external view returns (address);
        function constsAddress() external view returns (address);

        // Validator views
        function getValidator(uint256 validatorID) external view returns (uint256 status, uint256 deactivatedTime, uint256 deactivatedEpoch, uint256 receivedStake, uint256 createdEpoch, uint256 createdTime, address auth);
        function getValidatorID(address auth) external view returns (uint256);
        function getValidatorPubkey(uint256 validatorID) external view returns (bytes memory);
        function getSelfStake(uint256 validatorID) external view returns (uint256);
        function isSlashed(uint256 validatorID) external view returns (bool);
        function slashingRefundRatio(uint256 validatorID) external view returns (uint256);
        function getSlashingPenalty(uint256 amount, bool isCheater, uint256 refundRatio) external pure returns (uint256);

        // Delegation views
        function getStake(address delegator, uint256 toValidatorID) external view returns (uint256);
        function getLockupInfo(address delegator, uint256 toValidatorID) external view returns (uint256 lockedStake, uint256 fromEpoch, uint256 endTime, uint256 duration);
        function getLockedStake(address delegator, uint256 toValidatorID) external view returns (uint256);
        function getUnlockedStake(address delegator, uint256 toValidatorID) external view returns (uint256);
        function isLockedUp(address delegator, uint256 toValidatorID) external view returns (bool);
        function getWithdrawalRequest(address delegator, uint256 toValidatorID, uint256 wrID) external view returns (uint256 epoch, uint256 time, uint256 amount);
        function getStashedLockupRewards(address delegator, uint256 toValidatorID) external view returns (uint256 lockupExtraReward, uint256 lockupBaseReward, uint256 unlockedReward);
        function stashedRewardsUntilEpoch(address delegator, uint256 toValidatorID) external view returns (uint256);
        function pendingRewards(address delegator, uint256 toValidatorID) external view returns (uint256);

        // Epoch snapshot views
        function getEpochSnapshot(uint256 epoch) external view returns (uint256 endTime, uint256 epochFee, uint256 totalBaseRewardWeight, uint256 totalTxRewardWeight, uint256 baseRewardPerSecond, uint256 totalStake, uint256 totalSupply);
        function getEpochValidatorIDs(uint256 epoch) external view returns (uint256[] memory);
        function getEpochReceivedStake(uint256 epoch, uint256 validatorID) external view returns (uint256);
        function getEpochAccumulatedRewardPerToken(uint256 epoch, uint256 validatorID) external view returns (uint256);
        function getEpochAccumulatedUptime(uint256 epoch, uint256 validatorID) external view returns (uint256);
        function getEpochAccumulatedOriginatedTxsFee(uint256 epoch, uint256 validatorID) external view returns (uint256);
        function getEpochOfflineTime(uint256 epoch, uint256 validatorID) external view returns (uint256);
        function getEpochOfflineBlocks(uint256 epoch, uint256 validatorID) external view returns (uint256);

        // Staking
        function createValidator(bytes calldata pubkey) external payable;
        function delegate(uint256 toValidatorID) external payable;
        function undelegate(uint256 toValidatorID, uint256 wrID, uint256 amount) external;
        function withdraw(uint256 toValidatorID, uint256 wrID) external;
        function lockStake(uint256 toValidatorID, uint256 lockupDuration, uint256 amount) external;
        function relockStake(uint256 toValidatorID, uint256 lockupDuration, uint256 amount) external;
        function unlockStake(uint256 toValidatorID, uint256 amount) external returns (uint256);
        function claimRewards(uint256 toValidatorID) external;
        function restakeRewards(uint256 toValidatorID) external;
        function stashRewards(address delegator, uint256 toValidatorID) external;

        // Owner administration
        function mintU2U(address receiver, uint256 amount, string calldata justification) external;
        function updateSlashingRefundRatio(uint256 validatorID, uint256 refundRatio) external;
        function updateTreasuryAddress(address treasury) external;
        function updateStakeTokenizerAddress(address tokenizer) external;
        function updateVoteBookAddress(address voteBook) external;
        function updateLibAddress(address lib) external;
        function updateConstsAddress(address consts) external;

        // Driver callbacks
        function setGenesisValidator(address auth, uint256 validatorID, bytes calldata pubkey, uint256 status, uint256 createdEpoch, uint256 createdTime, uint256 deactivatedEpoch, uint256 deactivatedTime) external;
        function setGenesisDelegation(address delegator, uint256 toValidatorID, uint256 stake, uint256 lockedStake, uint256 lockupFromEpoch, uint256 lockupEndTime, uint256 lockupDuration, uint256 earlyUnlockPenalty, uint256 rewards) external;
        function deactivateValidator(uint256 validatorID, uint256 status) external;
        function sealEpoch(uint256[] calldata offlineTime, uint256[] calldata offlineBlocks, uint256[] calldata uptimes, uint256[] calldata originatedTxsFee, uint256 epochGas) external;
        function sealEpochValidators(uint256[] calldata nextValidatorIDs) external;
    }

    /// Network economy tunables behind typed accessors.
    interface IConstantManager {
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function initialize(address owner) external;

        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function renounceOwnership() external;

        function minSelfStake() external view returns (uint256);
        function maxDelegatedRatio() external view returns (uint256);
        function validatorCommission() external view returns (uint256);
        function burntFeeShare() external view returns (uint256);
        function treasuryFeeShare() external view returns (uint256);
        function unlockedRewardRatio() external view returns (uint256);
        function minLockupDuration() external view returns (uint256);
        function maxLockupDuration() external view returns (uint256);
        function withdrawalPeriodEpochs() external view returns (uint256);
        function withdrawalPeriodTime() external view returns (uint256);
        function baseRewardPerSecond() external view returns (uint256);
        function offlinePenaltyThresholdBlocksNum() external view returns (uint256);
        function offlinePenaltyThresholdTime() external view returns (uint256);
        function targetGasPowerPerSecond() external view returns (uint256);
        function gasPriceBalancingCounterweight() external view returns (uint256);

        function updateMinSelfStake(uint256 v) external;
        function updateMaxDelegatedRatio(uint256 v) external;
        function updateValidatorCommission(uint256 v) external;
        function updateBurntFeeShare(uint256 v) external;
        function updateTreasuryFeeShare(uint256 v) external;
        function updateUnlockedRewardRatio(uint256 v) external;
        function updateMinLockupDuration(uint256 v) external;
        function updateMaxLockupDuration(uint256 v) external;
        function updateWithdrawalPeriodEpochs(uint256 v) external;
        function updateWithdrawalPeriodTime(uint256 v) external;
        function updateBaseRewardPerSecond(uint256 v) external;
        function updateOfflinePenaltyThresholdBlocksNum(uint256 v) external;
        function updateOfflinePenaltyThresholdTime(uint256 v) external;
        function updateTargetGasPowerPerSecond(uint256 v) external;
        function updateGasPriceBalancingCounterweight(uint256 v) external;
    }

    /// Privileged callback surface invoked by the node at block boundaries.
    interface INodeDriver {
        event UpdatedBackend(address indexed backend);
        event UpdateValidatorWeight(uint256 indexed validatorID, uint256 weight);
        event UpdateValidatorPubkey(uint256 indexed validatorID, bytes pubkey);
        event UpdateNetworkRules(bytes diff);
        event UpdateNetworkVersion(uint256 version);
        event AdvanceEpochs(uint256 num);

        function initialize(address backend, address evmWriterAddress) external;
        function setBackend(address backend) external;

        // Backend (NodeDriverAuth) administration
        function setBalance(address acc, uint256 value) external;
        function copyCode(address acc, address from) external;
        function swapCode(address acc, address with) external;
        function setStorage(address acc, uint256 key, uint256 value) external;
        function incNonce(address acc, uint256 diff) external;
        function updateNetworkRules(bytes calldata diff) external;
        function updateNetworkVersion(uint256 version) external;
        function advanceEpochs(uint256 num) external;
        function updateValidatorWeight(uint256 validatorID, uint256 value) external;
        function updateValidatorPubkey(uint256 validatorID, bytes calldata pubkey) external;

        // Node callbacks (caller == address(0))
        function setGenesisValidator(address auth, uint256 validatorID, bytes calldata pubkey, uint256 status, uint256 createdEpoch, uint256 createdTime, uint256 deactivatedEpoch, uint256 deactivatedTime) external;
        function setGenesisDelegation(address delegator, uint256 toValidatorID, uint256 stake, uint256 lockedStake, uint256 lockupFromEpoch, uint256 lockupEndTime, uint256 lockupDuration, uint256 earlyUnlockPenalty, uint256 rewards) external;
        function deactivateValidator(uint256 validatorID, uint256 status) external;
        function sealEpochValidators(uint256[] calldata nextValidatorIDs) external;
        function sealEpoch(uint256[] calldata offlineTime, uint256[] calldata offlineBlocks, uint256[] calldata uptimes, uint256[] calldata originatedTxsFee) external;
        function sealEpochV1(uint256[] calldata offlineTime, uint256[] calldata offlineBlocks, uint256[] calldata uptimes, uint256[] calldata originatedTxsFee, uint256 usedGas) external;
    }

    /// Access-control gate between owner, SFC and the raw driver.
    interface INodeDriverAuth {
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function initialize(address sfc, address driver, address owner) external;

        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function renounceOwnership() external;

        // SFC-originated mutations
        function incBalance(address acc, uint256 diff) external;
        function updateMinGasPrice(uint256 minGasPrice) external;
        function updateValidatorWeight(uint256 validatorID, uint256 value) external;
        function updateValidatorPubkey(uint256 validatorID, bytes calldata pubkey) external;

        // Owner administration
        function migrateTo(address newDriverAuth) external;
        function execute(address executable) external;
        function mutExecute(address executable, address newOwner, bytes32 selfCodeHash, bytes32 driverCodeHash) external;
        function copyCode(address acc, address from) external;
        function upgradeCode(address acc, address from) external;
        function incNonce(address acc, uint256 diff) external;
        function updateNetworkRules(bytes calldata diff) external;
        function updateNetworkVersion(uint256 version) external;
        function advanceEpochs(uint256 num) external;

        // Driver callbacks, forwarded to the SFC
        function setGenesisValidator(address auth, uint256 validatorID, bytes calldata pubkey, uint256 status, uint256 createdEpoch, uint256 createdTime, uint256 deactivatedEpoch, uint256 deactivatedTime) external;
        function setGenesisDelegation(address delegator, uint256 toValidatorID, uint256 stake, uint256 lockedStake, uint256 lockupFromEpoch, uint256 lockupEndTime, uint256 lockupDuration, uint256 earlyUnlockPenalty, uint256 rewards) external;
        function deactivateValidator(uint256 validatorID, uint256 status) external;
        function sealEpochValidators(uint256[] calldata nextValidatorIDs) external;
        function sealEpoch(uint256[] calldata offlineTime, uint256[] calldata offlineBlocks, uint256[] calldata uptimes, uint256[] calldata originatedTxsFee, uint256 usedGas) external;
    }

    /// External stake tokenizer consulted before withdrawals when wired.
    interface IStakeTokenizer {
        function allowedToWithdrawStake(address sender, uint256 validatorID) external view returns (bool);
    }

    /// External governance vote book notified on stake movements when wired.
    interface IVoteBook {
        function recountVotes(address delegator, address validatorAuth) external;
    }

    /// Raw state-mutation authority used by the driver.
    interface IEVMWriter {
        function setBalance(address acc, uint256 value) external;
        function copyCode(address acc, address from) external;
        function swapCode(address acc, address with) external;
        function setStorage(address acc, uint256 key, uint256 value) external;
        function incNonce(address acc, uint256 diff) external;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;
    use alloy_sol_types::{SolCall, SolEvent};

    fn selector_of(signature: &str) -> [u8; 4] {
        let hash = keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    #[test]
    fn call_selectors_follow_keccak_of_signature() {
        assert_eq!(ISFC::delegateCall::SELECTOR, selector_of("delegate(uint256)"));
        assert_eq!(
            ISFC::undelegateCall::SELECTOR,
            selector_of("undelegate(uint256,uint256,uint256)")
        );
        assert_eq!(
            ISFC::createValidatorCall::SELECTOR,
            selector_of("createValidator(bytes)")
        );
        assert_eq!(
            ISFC::sealEpochCall::SELECTOR,
            selector_of("sealEpoch(uint256[],uint256[],uint256[],uint256[],uint256)")
        );
        assert_eq!(
            IConstantManager::updateMinSelfStakeCall::SELECTOR,
            selector_of("updateMinSelfStake(uint256)")
        );
        assert_eq!(
            IEVMWriter::setStorageCall::SELECTOR,
            selector_of("setStorage(address,uint256,uint256)")
        );
    }

    #[test]
    fn event_topics_follow_keccak_of_signature() {
        assert_eq!(
            ISFC::CreatedValidator::SIGNATURE_HASH,
            keccak256("CreatedValidator(uint256,address,uint256,uint256)")
        );
        assert_eq!(
            ISFC::Undelegated::SIGNATURE_HASH,
            keccak256("Undelegated(address,uint256,uint256,uint256)")
        );
        assert_eq!(
            INodeDriver::UpdateValidatorWeight::SIGNATURE_HASH,
            keccak256("UpdateValidatorWeight(uint256,uint256)")
        );
    }

    #[test]
    fn indexed_parameters_become_topics() {
        use alloy_primitives::{Address, U256};

        let event = ISFC::Delegated {
            delegator: Address::repeat_byte(0xbb),
            toValidatorID: U256::from(1),
            amount: U256::from(10),
        };
        let data = event.encode_log_data();
        // topic0 = signature hash, topic1 = delegator, topic2 = validator id.
        assert_eq!(data.topics().len(), 3);
        assert_eq!(data.topics()[0], ISFC::Delegated::SIGNATURE_HASH);
        assert_eq!(data.topics()[2].0, U256::from(1).to_be_bytes::<32>());
    }
}
