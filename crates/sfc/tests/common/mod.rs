//! Shared harness for the precompile integration tests: an in-memory host
//! wired at genesis, time/epoch advancement, and invariant sweeps.

// Each test binary uses its own slice of the harness.
#![allow(dead_code)]

use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use u2u_sfc::abi::{INodeDriver, ISFC};
use u2u_sfc::genesis::{deploy, GenesisConfig};
use u2u_sfc::vm::{BlockEnv, CallResult};
use u2u_sfc::{SfcSuite, NODE_ADDRESS, NODE_DRIVER_ADDRESS, SFC_ADDRESS};
use u2u_state::{InMemoryKv, LogRecord, StateKv};

pub const GENESIS_TIME: u64 = 1_700_000_000;

pub fn eth(n: u64) -> U256 {
    U256::from(n) * U256::from(10).pow(U256::from(18))
}

pub fn addr(seed: u8) -> Address {
    Address::with_last_byte(seed)
}

pub struct Net {
    pub host: InMemoryKv,
    pub suite: SfcSuite<InMemoryKv>,
    pub time: u64,
    pub block: u64,
}

impl Net {
    /// Fresh chain: genesis-wired suite, owner 0x01.
    pub fn new() -> Self {
        let host = InMemoryKv::new();
        let suite = SfcSuite::new(host.clone());
        let net = Self {
            host,
            suite,
            time: GENESIS_TIME,
            block: 1,
        };
        deploy(
            &net.suite,
            &GenesisConfig::new(net.owner(), eth(1_000_000_000)),
            net.env(),
        )
        .expect("genesis deploys");
        net
    }

    pub fn owner(&self) -> Address {
        addr(0x01)
    }

    pub fn env(&self) -> BlockEnv {
        BlockEnv {
            number: self.block,
            timestamp: self.time,
        }
    }

    pub fn advance(&mut self, seconds: u64) {
        self.time += seconds;
        self.block += seconds; // one block per second is close enough here
    }

    pub fn fund(&self, account: Address, amount: U256) {
        let current = self.host.balance(account).unwrap();
        self.host.set_balance(account, current + amount).unwrap();
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.host.balance(account).unwrap()
    }

    pub fn exec(&self, to: Address, caller: Address, value: U256, input: Vec<u8>) -> CallResult {
        self.suite
            .execute(to, caller, value, &input, 100_000_000, self.env())
    }

    /// Call the SFC, asserting success.
    pub fn sfc_ok(&self, caller: Address, value: U256, input: Vec<u8>) -> CallResult {
        let result = self.exec(SFC_ADDRESS, caller, value, input);
        assert!(
            result.is_success(),
            "SFC call reverted: {:?}",
            result.revert_reason()
        );
        result
    }

    /// Call the SFC, asserting a revert with the given reason.
    pub fn sfc_reverts(&self, caller: Address, value: U256, input: Vec<u8>, reason: &str) {
        let result = self.exec(SFC_ADDRESS, caller, value, input);
        assert!(result.is_revert(), "expected a revert");
        assert_eq!(result.revert_reason().as_deref(), Some(reason));
    }

    /// Call a view and decode a single uint256.
    pub fn sfc_u256(&self, input: Vec<u8>) -> U256 {
        let result = self.sfc_ok(addr(0xee), U256::ZERO, input);
        U256::abi_decode(result.output()).expect("uint256 return")
    }

    pub fn current_sealed_epoch(&self) -> U256 {
        self.sfc_u256(ISFC::currentSealedEpochCall {}.abi_encode())
    }

    pub fn total_stake(&self) -> U256 {
        self.sfc_u256(ISFC::totalStakeCall {}.abi_encode())
    }

    pub fn total_active_stake(&self) -> U256 {
        self.sfc_u256(ISFC::totalActiveStakeCall {}.abi_encode())
    }

    pub fn stake_of(&self, delegator: Address, to: u64) -> U256 {
        self.sfc_u256(
            ISFC::getStakeCall {
                delegator,
                toValidatorID: U256::from(to),
            }
            .abi_encode(),
        )
    }

    pub fn validator_status(&self, id: u64) -> U256 {
        let out = self.sfc_ok(
            addr(0xee),
            U256::ZERO,
            ISFC::getValidatorCall {
                validatorID: U256::from(id),
            }
            .abi_encode(),
        );
        let ret = ISFC::getValidatorCall::abi_decode_returns(out.output()).expect("tuple return");
        ret.status
    }

    pub fn validator_received_stake(&self, id: u64) -> U256 {
        let out = self.sfc_ok(
            addr(0xee),
            U256::ZERO,
            ISFC::getValidatorCall {
                validatorID: U256::from(id),
            }
            .abi_encode(),
        );
        ISFC::getValidatorCall::abi_decode_returns(out.output())
            .expect("tuple return")
            .receivedStake
    }

    /// Register a validator with the given self-stake, returning its id.
    pub fn create_validator(&mut self, auth: Address, self_stake: U256) -> u64 {
        self.fund(auth, self_stake);
        let mut pubkey = vec![0xc0; 33];
        pubkey[32] = auth.as_slice()[19];
        self.sfc_ok(
            auth,
            self_stake,
            ISFC::createValidatorCall {
                pubkey: pubkey.into(),
            }
            .abi_encode(),
        );
        self.sfc_u256(ISFC::lastValidatorIDCall {}.abi_encode())
            .to::<u64>()
    }

    pub fn delegate(&mut self, delegator: Address, to: u64, amount: U256) {
        self.fund(delegator, amount);
        self.sfc_ok(
            delegator,
            amount,
            ISFC::delegateCall {
                toValidatorID: U256::from(to),
            }
            .abi_encode(),
        );
    }

    /// Drive a full epoch boundary through the NodeDriver, crediting every
    /// validator in `ids` with full uptime since the last seal.
    pub fn seal_epoch(&mut self, ids: &[u64]) -> (CallResult, CallResult) {
        self.seal_epoch_with(ids, |net, _| {
            let dur = net.elapsed_epoch_duration();
            (vec![dur; ids.len()], vec![U256::ZERO; ids.len()])
        })
    }

    /// Like `seal_epoch`, with caller-provided (uptimes, originatedTxsFee).
    pub fn seal_epoch_with(
        &mut self,
        ids: &[u64],
        inputs: impl FnOnce(&Self, &[U256]) -> (Vec<U256>, Vec<U256>),
    ) -> (CallResult, CallResult) {
        let ids_u256: Vec<U256> = ids.iter().map(|id| U256::from(*id)).collect();
        let first = self.exec(
            NODE_DRIVER_ADDRESS,
            NODE_ADDRESS,
            U256::ZERO,
            INodeDriver::sealEpochValidatorsCall {
                nextValidatorIDs: ids_u256.clone(),
            }
            .abi_encode(),
        );
        assert!(
            first.is_success(),
            "sealEpochValidators reverted: {:?}",
            first.revert_reason()
        );
        let (uptimes, fees) = inputs(self, &ids_u256);
        let second = self.exec(
            NODE_DRIVER_ADDRESS,
            NODE_ADDRESS,
            U256::ZERO,
            INodeDriver::sealEpochV1Call {
                offlineTime: vec![U256::ZERO; ids.len()],
                offlineBlocks: vec![U256::ZERO; ids.len()],
                uptimes,
                originatedTxsFee: fees,
                usedGas: U256::from(21_000u64),
            }
            .abi_encode(),
        );
        assert!(
            second.is_success(),
            "sealEpoch reverted: {:?}",
            second.revert_reason()
        );
        (first, second)
    }

    /// Seconds since the last sealed snapshot's end time.
    pub fn elapsed_epoch_duration(&self) -> U256 {
        let sealed = self.current_sealed_epoch();
        let out = self.sfc_ok(
            addr(0xee),
            U256::ZERO,
            ISFC::getEpochSnapshotCall { epoch: sealed }.abi_encode(),
        );
        let snapshot = ISFC::getEpochSnapshotCall::abi_decode_returns(out.output())
            .expect("snapshot return");
        U256::from(self.time) - snapshot.endTime
    }

    /// Quantified invariants from the data model, checked against the host
    /// store after every interesting handler. `delegations` lists every
    /// (delegator, validator) pair the test has touched.
    pub fn assert_invariants(&self, delegations: &[(Address, u64)]) {
        let last = self
            .sfc_u256(ISFC::lastValidatorIDCall {}.abi_encode())
            .to::<u64>();

        let mut expected_total = U256::ZERO;
        let mut expected_active = U256::ZERO;
        for id in 1..=last {
            let received = self.validator_received_stake(id);
            expected_total += received;
            if self.validator_status(id).is_zero() {
                expected_active += received;
            }

            let per_validator: U256 = delegations
                .iter()
                .filter(|(_, v)| *v == id)
                .map(|(d, v)| self.stake_of(*d, *v))
                .fold(U256::ZERO, |acc, s| acc + s);
            assert_eq!(
                per_validator, received,
                "delegations of validator {id} must sum to its receivedStake"
            );
        }
        assert_eq!(self.total_stake(), expected_total, "totalStake invariant");
        assert_eq!(
            self.total_active_stake(),
            expected_active,
            "totalActiveStake invariant"
        );
    }
}

/// Decode every log of event `E` out of the call results.
pub fn logs_of<E: SolEvent>(logs: &[LogRecord]) -> Vec<E> {
    logs.iter()
        .filter(|log| log.data.topics().first() == Some(&E::SIGNATURE_HASH))
        .map(|log| E::decode_log_data(&log.data).expect("event decodes"))
        .collect()
}
