//! Typed storage accessors over the request cache.
//!
//! Thin wrappers translating domain reads and writes into exact slot
//! coordinates from `u2u-layout`. Writes to the `currentSealedEpoch` sentinel
//! slot invalidate the epoch cache; sealing-path reads and writes go through
//! the `seal_read`/`seal_write` pair so the epoch cache stays coherent with
//! the overlay.

use crate::error::SfcError;
use crate::rewards::Rewards;
use crate::vm::Vm;
use crate::SFC_ADDRESS;
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use u2u_layout::codec::{
    address_to_word, read_dyn_bytes, stored_word_count, word_to_address, word_to_bool,
    write_dyn_bytes,
};
use u2u_layout::sfc as layout;
use u2u_metrics::state as state_metrics;

impl Vm<'_> {
    // ------------------------------------------------------------------
    // Raw words
    // ------------------------------------------------------------------

    pub fn sload(&mut self, contract: Address, slot: U256) -> Result<U256, SfcError> {
        state_metrics::STATE_SLOT_READS.inc();
        Ok(self.state.storage(contract, slot)?)
    }

    pub fn sstore(&mut self, contract: Address, slot: U256, value: U256) {
        state_metrics::STATE_SLOT_WRITES.inc();
        if contract == SFC_ADDRESS && slot == layout::slot::CURRENT_SEALED_EPOCH {
            self.chain.epoch_cache.lock().on_sentinel_change(value);
        }
        self.state.set_storage(contract, slot, value);
    }

    pub fn read_address(&mut self, contract: Address, slot: U256) -> Result<Address, SfcError> {
        Ok(word_to_address(self.sload(contract, slot)?))
    }

    pub fn write_address(&mut self, contract: Address, slot: U256, value: Address) {
        self.sstore(contract, slot, address_to_word(value));
    }

    pub fn read_bool(&mut self, contract: Address, slot: U256) -> Result<bool, SfcError> {
        Ok(word_to_bool(self.sload(contract, slot)?))
    }

    /// Emit an event log from `contract`.
    pub fn emit(&mut self, contract: Address, event: &impl SolEvent) {
        self.state.emit_log(contract, event.encode_log_data());
    }

    // ------------------------------------------------------------------
    // Epoch-cache-aware reads and writes (sealing path only)
    // ------------------------------------------------------------------

    /// Read an SFC slot through the epoch cache bound to `epoch`.
    pub fn seal_read(&mut self, epoch: U256, slot: U256) -> Result<U256, SfcError> {
        if let Some(value) = self.chain.epoch_cache.lock().get(epoch, SFC_ADDRESS, slot) {
            state_metrics::STATE_EPOCH_CACHE_HITS.inc();
            return Ok(value);
        }
        let value = self.sload(SFC_ADDRESS, slot)?;
        self.chain
            .epoch_cache
            .lock()
            .put(epoch, SFC_ADDRESS, slot, value);
        Ok(value)
    }

    /// Write an SFC slot, keeping the epoch cache write-through.
    pub fn seal_write(&mut self, epoch: U256, slot: U256, value: U256) {
        self.sstore(SFC_ADDRESS, slot, value);
        self.chain
            .epoch_cache
            .lock()
            .put(epoch, SFC_ADDRESS, slot, value);
    }

    // ------------------------------------------------------------------
    // Ownable (shared slot layout across SFC, ConstantManager, DriverAuth)
    // ------------------------------------------------------------------

    pub fn contract_owner(&mut self, contract: Address, slot: U256) -> Result<Address, SfcError> {
        self.read_address(contract, slot)
    }

    pub fn require_owner(
        &mut self,
        contract: Address,
        slot: U256,
        caller: Address,
    ) -> Result<(), SfcError> {
        if self.contract_owner(contract, slot)? != caller {
            return Err(SfcError::revert("Ownable: caller is not the owner"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // SFC global scalars
    // ------------------------------------------------------------------

    pub fn sfc_initialized(&mut self) -> Result<bool, SfcError> {
        self.read_bool(SFC_ADDRESS, layout::slot::INITIALIZED)
    }

    pub fn set_sfc_initialized(&mut self) {
        self.sstore(SFC_ADDRESS, layout::slot::INITIALIZED, U256::from(1));
    }

    pub fn current_sealed_epoch(&mut self) -> Result<U256, SfcError> {
        self.sload(SFC_ADDRESS, layout::slot::CURRENT_SEALED_EPOCH)
    }

    pub fn set_current_sealed_epoch(&mut self, epoch: U256) {
        self.sstore(SFC_ADDRESS, layout::slot::CURRENT_SEALED_EPOCH, epoch);
    }

    /// The epoch currently being built: `currentSealedEpoch + 1`.
    pub fn current_epoch(&mut self) -> Result<U256, SfcError> {
        Ok(self.current_sealed_epoch()? + U256::from(1))
    }

    pub fn last_validator_id(&mut self) -> Result<U256, SfcError> {
        self.sload(SFC_ADDRESS, layout::slot::LAST_VALIDATOR_ID)
    }

    pub fn set_last_validator_id(&mut self, id: U256) {
        self.sstore(SFC_ADDRESS, layout::slot::LAST_VALIDATOR_ID, id);
    }

    pub fn total_stake(&mut self) -> Result<U256, SfcError> {
        self.sload(SFC_ADDRESS, layout::slot::TOTAL_STAKE)
    }

    pub fn set_total_stake(&mut self, value: U256) {
        self.sstore(SFC_ADDRESS, layout::slot::TOTAL_STAKE, value);
    }

    pub fn total_active_stake(&mut self) -> Result<U256, SfcError> {
        self.sload(SFC_ADDRESS, layout::slot::TOTAL_ACTIVE_STAKE)
    }

    pub fn set_total_active_stake(&mut self, value: U256) {
        self.sstore(SFC_ADDRESS, layout::slot::TOTAL_ACTIVE_STAKE, value);
    }

    pub fn total_slashed_stake(&mut self) -> Result<U256, SfcError> {
        self.sload(SFC_ADDRESS, layout::slot::TOTAL_SLASHED_STAKE)
    }

    pub fn set_total_slashed_stake(&mut self, value: U256) {
        self.sstore(SFC_ADDRESS, layout::slot::TOTAL_SLASHED_STAKE, value);
    }

    pub fn total_supply(&mut self) -> Result<U256, SfcError> {
        self.sload(SFC_ADDRESS, layout::slot::TOTAL_SUPPLY)
    }

    pub fn set_total_supply(&mut self, value: U256) {
        self.sstore(SFC_ADDRESS, layout::slot::TOTAL_SUPPLY, value);
    }

    pub fn min_gas_price(&mut self) -> Result<U256, SfcError> {
        self.sload(SFC_ADDRESS, layout::slot::MIN_GAS_PRICE)
    }

    pub fn set_min_gas_price(&mut self, value: U256) {
        self.sstore(SFC_ADDRESS, layout::slot::MIN_GAS_PRICE, value);
    }

    pub fn node_driver_auth(&mut self) -> Result<Address, SfcError> {
        self.read_address(SFC_ADDRESS, layout::slot::NODE_DRIVER_AUTH)
    }

    pub fn treasury_address(&mut self) -> Result<Address, SfcError> {
        self.read_address(SFC_ADDRESS, layout::slot::TREASURY)
    }

    pub fn stake_tokenizer_address(&mut self) -> Result<Address, SfcError> {
        self.read_address(SFC_ADDRESS, layout::slot::STAKE_TOKENIZER)
    }

    pub fn vote_book_address(&mut self) -> Result<Address, SfcError> {
        self.read_address(SFC_ADDRESS, layout::slot::VOTE_BOOK)
    }

    pub fn consts_manager_address(&mut self) -> Result<Address, SfcError> {
        self.read_address(SFC_ADDRESS, layout::slot::CONSTS_MANAGER)
    }

    // ------------------------------------------------------------------
    // Validators
    // ------------------------------------------------------------------

    pub fn validator_field(&mut self, id: U256, offset: u64) -> Result<U256, SfcError> {
        let slot = layout::validator_field(&self.chain.slots, id, offset);
        self.sload(SFC_ADDRESS, slot)
    }

    pub fn set_validator_field(&mut self, id: U256, offset: u64, value: U256) {
        let slot = layout::validator_field(&self.chain.slots, id, offset);
        self.sstore(SFC_ADDRESS, slot, value);
    }

    pub fn validator_status(&mut self, id: U256) -> Result<U256, SfcError> {
        self.validator_field(id, layout::validator::STATUS)
    }

    pub fn validator_received_stake(&mut self, id: U256) -> Result<U256, SfcError> {
        self.validator_field(id, layout::validator::RECEIVED_STAKE)
    }

    pub fn validator_auth(&mut self, id: U256) -> Result<Address, SfcError> {
        Ok(word_to_address(
            self.validator_field(id, layout::validator::AUTH)?,
        ))
    }

    /// A validator exists iff its creation time is nonzero.
    pub fn validator_exists(&mut self, id: U256) -> Result<bool, SfcError> {
        Ok(!self
            .validator_field(id, layout::validator::CREATED_TIME)?
            .is_zero())
    }

    pub fn validator_id_of(&mut self, auth: Address) -> Result<U256, SfcError> {
        let slot = layout::validator_id_slot(&self.chain.slots, auth);
        self.sload(SFC_ADDRESS, slot)
    }

    pub fn set_validator_id_of(&mut self, auth: Address, id: U256) {
        let slot = layout::validator_id_slot(&self.chain.slots, auth);
        self.sstore(SFC_ADDRESS, slot, id);
    }

    pub fn validator_pubkey(&mut self, id: U256) -> Result<Vec<u8>, SfcError> {
        let base = layout::validator_pubkey_slot(&self.chain.slots, id);
        self.sfc_dyn_bytes(base)
    }

    pub fn set_validator_pubkey(&mut self, id: U256, pubkey: &[u8]) -> Result<(), SfcError> {
        let base = layout::validator_pubkey_slot(&self.chain.slots, id);
        self.set_sfc_dyn_bytes(base, pubkey)
    }

    pub fn slashing_refund_ratio(&mut self, id: U256) -> Result<U256, SfcError> {
        let slot = layout::slashing_refund_slot(&self.chain.slots, id);
        self.sload(SFC_ADDRESS, slot)
    }

    pub fn set_slashing_refund_ratio(&mut self, id: U256, ratio: U256) {
        let slot = layout::slashing_refund_slot(&self.chain.slots, id);
        self.sstore(SFC_ADDRESS, slot, ratio);
    }

    // ------------------------------------------------------------------
    // Delegations
    // ------------------------------------------------------------------

    pub fn stake_of(&mut self, delegator: Address, to: U256) -> Result<U256, SfcError> {
        let slot = layout::stake_slot(&self.chain.slots, delegator, to);
        self.sload(SFC_ADDRESS, slot)
    }

    pub fn set_stake_of(&mut self, delegator: Address, to: U256, value: U256) {
        let slot = layout::stake_slot(&self.chain.slots, delegator, to);
        self.sstore(SFC_ADDRESS, slot, value);
    }

    pub fn lockup_field(
        &mut self,
        delegator: Address,
        to: U256,
        offset: u64,
    ) -> Result<U256, SfcError> {
        let slot = layout::lockup_field(&self.chain.slots, delegator, to, offset);
        self.sload(SFC_ADDRESS, slot)
    }

    pub fn set_lockup_field(&mut self, delegator: Address, to: U256, offset: u64, value: U256) {
        let slot = layout::lockup_field(&self.chain.slots, delegator, to, offset);
        self.sstore(SFC_ADDRESS, slot, value);
    }

    pub fn locked_stake(&mut self, delegator: Address, to: U256) -> Result<U256, SfcError> {
        self.lockup_field(delegator, to, layout::lockup::LOCKED_STAKE)
    }

    pub fn rewards_stash(&mut self, delegator: Address, to: U256) -> Result<Rewards, SfcError> {
        Ok(Rewards {
            lockup_extra: self.rewards_stash_field(delegator, to, layout::rewards::LOCKUP_EXTRA)?,
            lockup_base: self.rewards_stash_field(delegator, to, layout::rewards::LOCKUP_BASE)?,
            unlocked: self.rewards_stash_field(delegator, to, layout::rewards::UNLOCKED)?,
        })
    }

    pub fn set_rewards_stash(&mut self, delegator: Address, to: U256, rewards: Rewards) {
        let extra =
            layout::rewards_stash_field(&self.chain.slots, delegator, to, layout::rewards::LOCKUP_EXTRA);
        let base =
            layout::rewards_stash_field(&self.chain.slots, delegator, to, layout::rewards::LOCKUP_BASE);
        let unlocked =
            layout::rewards_stash_field(&self.chain.slots, delegator, to, layout::rewards::UNLOCKED);
        self.sstore(SFC_ADDRESS, extra, rewards.lockup_extra);
        self.sstore(SFC_ADDRESS, base, rewards.lockup_base);
        self.sstore(SFC_ADDRESS, unlocked, rewards.unlocked);
    }

    fn rewards_stash_field(
        &mut self,
        delegator: Address,
        to: U256,
        offset: u64,
    ) -> Result<U256, SfcError> {
        let slot = layout::rewards_stash_field(&self.chain.slots, delegator, to, offset);
        self.sload(SFC_ADDRESS, slot)
    }

    pub fn stashed_lockup_rewards(
        &mut self,
        delegator: Address,
        to: U256,
    ) -> Result<Rewards, SfcError> {
        Ok(Rewards {
            lockup_extra: self.stashed_lockup_field(delegator, to, layout::rewards::LOCKUP_EXTRA)?,
            lockup_base: self.stashed_lockup_field(delegator, to, layout::rewards::LOCKUP_BASE)?,
            unlocked: self.stashed_lockup_field(delegator, to, layout::rewards::UNLOCKED)?,
        })
    }

    pub fn set_stashed_lockup_rewards(&mut self, delegator: Address, to: U256, rewards: Rewards) {
        let extra =
            layout::stashed_lockup_field(&self.chain.slots, delegator, to, layout::rewards::LOCKUP_EXTRA);
        let base =
            layout::stashed_lockup_field(&self.chain.slots, delegator, to, layout::rewards::LOCKUP_BASE);
        let unlocked =
            layout::stashed_lockup_field(&self.chain.slots, delegator, to, layout::rewards::UNLOCKED);
        self.sstore(SFC_ADDRESS, extra, rewards.lockup_extra);
        self.sstore(SFC_ADDRESS, base, rewards.lockup_base);
        self.sstore(SFC_ADDRESS, unlocked, rewards.unlocked);
    }

    fn stashed_lockup_field(
        &mut self,
        delegator: Address,
        to: U256,
        offset: u64,
    ) -> Result<U256, SfcError> {
        let slot = layout::stashed_lockup_field(&self.chain.slots, delegator, to, offset);
        self.sload(SFC_ADDRESS, slot)
    }

    pub fn stashed_until(&mut self, delegator: Address, to: U256) -> Result<U256, SfcError> {
        let slot = layout::stashed_until_slot(&self.chain.slots, delegator, to);
        self.sload(SFC_ADDRESS, slot)
    }

    pub fn set_stashed_until(&mut self, delegator: Address, to: U256, epoch: U256) {
        let slot = layout::stashed_until_slot(&self.chain.slots, delegator, to);
        self.sstore(SFC_ADDRESS, slot, epoch);
    }

    pub fn withdrawal_field(
        &mut self,
        delegator: Address,
        to: U256,
        wr_id: U256,
        offset: u64,
    ) -> Result<U256, SfcError> {
        let slot = layout::withdrawal_field(&self.chain.slots, delegator, to, wr_id, offset);
        self.sload(SFC_ADDRESS, slot)
    }

    pub fn set_withdrawal_field(
        &mut self,
        delegator: Address,
        to: U256,
        wr_id: U256,
        offset: u64,
        value: U256,
    ) {
        let slot = layout::withdrawal_field(&self.chain.slots, delegator, to, wr_id, offset);
        self.sstore(SFC_ADDRESS, slot, value);
    }

    // ------------------------------------------------------------------
    // Epoch snapshots
    // ------------------------------------------------------------------

    pub fn snapshot_field(&mut self, epoch: U256, offset: u64) -> Result<U256, SfcError> {
        let slot = layout::snapshot_field(&self.chain.slots, epoch, offset);
        self.sload(SFC_ADDRESS, slot)
    }

    pub fn set_snapshot_field(&mut self, epoch: U256, offset: u64, value: U256) {
        let slot = layout::snapshot_field(&self.chain.slots, epoch, offset);
        self.sstore(SFC_ADDRESS, slot, value);
    }

    pub fn snapshot_map(&mut self, epoch: U256, offset: u64, id: U256) -> Result<U256, SfcError> {
        let slot = layout::snapshot_mapping(&self.chain.slots, epoch, offset, id);
        self.sload(SFC_ADDRESS, slot)
    }

    pub fn set_snapshot_map(&mut self, epoch: U256, offset: u64, id: U256, value: U256) {
        let slot = layout::snapshot_mapping(&self.chain.slots, epoch, offset, id);
        self.sstore(SFC_ADDRESS, slot, value);
    }

    pub fn snapshot_validator_ids(&mut self, epoch: U256) -> Result<Vec<U256>, SfcError> {
        let len_slot = layout::snapshot_validator_ids_len(&self.chain.slots, epoch);
        let len = self.sload(SFC_ADDRESS, len_slot)?.saturating_to::<u64>();
        let mut ids = Vec::with_capacity(len as usize);
        for i in 0..len {
            let slot = layout::snapshot_validator_ids_elem(&self.chain.slots, epoch, i);
            ids.push(self.sload(SFC_ADDRESS, slot)?);
        }
        Ok(ids)
    }

    pub fn set_snapshot_validator_ids(&mut self, epoch: U256, ids: &[U256]) -> Result<(), SfcError> {
        let len_slot = layout::snapshot_validator_ids_len(&self.chain.slots, epoch);
        let old_len = self.sload(SFC_ADDRESS, len_slot)?.saturating_to::<u64>();
        self.sstore(SFC_ADDRESS, len_slot, U256::from(ids.len() as u64));
        for (i, id) in ids.iter().enumerate() {
            let slot = layout::snapshot_validator_ids_elem(&self.chain.slots, epoch, i as u64);
            self.sstore(SFC_ADDRESS, slot, *id);
        }
        // Clear the tail if the array shrank, like the compiler's codegen.
        for i in (ids.len() as u64)..old_len {
            let slot = layout::snapshot_validator_ids_elem(&self.chain.slots, epoch, i);
            self.sstore(SFC_ADDRESS, slot, U256::ZERO);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dynamic bytes on SFC storage
    // ------------------------------------------------------------------

    fn sfc_dyn_bytes(&mut self, base: U256) -> Result<Vec<u8>, SfcError> {
        let mut failure = None;
        let out = read_dyn_bytes(
            |slot| match self.state.storage(SFC_ADDRESS, slot) {
                Ok(value) => value,
                Err(err) => {
                    failure.get_or_insert(err);
                    U256::ZERO
                }
            },
            base,
        );
        match failure {
            Some(err) => Err(err.into()),
            None => Ok(out),
        }
    }

    fn set_sfc_dyn_bytes(&mut self, base: U256, data: &[u8]) -> Result<(), SfcError> {
        let mut failure = None;
        let old_words = stored_word_count(
            |slot| match self.state.storage(SFC_ADDRESS, slot) {
                Ok(value) => value,
                Err(err) => {
                    failure.get_or_insert(err);
                    U256::ZERO
                }
            },
            base,
        );
        if let Some(err) = failure {
            return Err(err.into());
        }
        write_dyn_bytes(
            |slot, value| self.sstore(SFC_ADDRESS, slot, value),
            base,
            data,
            old_words,
        );
        Ok(())
    }
}
