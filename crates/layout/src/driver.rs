//! NodeDriver and NodeDriverAuth storage layouts.
//!
//! NodeDriver inherits only `Initializable` (fields start at 0x33);
//! NodeDriverAuth is `Initializable, Ownable` (fields start at 0x66).

/// NodeDriver slots.
pub mod node_driver {
    use alloy_primitives::U256;

    /// slot 0: initialized flag
    pub const INITIALIZED: U256 = U256::from_limbs([0, 0, 0, 0]);
    /// slot 0x33: backend (NodeDriverAuth address)
    pub const BACKEND: U256 = U256::from_limbs([0x33, 0, 0, 0]);
    /// slot 0x34: evmWriter (EVMWriter address)
    pub const EVM_WRITER: U256 = U256::from_limbs([0x34, 0, 0, 0]);
}

/// NodeDriverAuth slots.
pub mod driver_auth {
    use alloy_primitives::U256;

    /// slot 0: initialized flag
    pub const INITIALIZED: U256 = U256::from_limbs([0, 0, 0, 0]);
    /// slot 0x33: owner
    pub const OWNER: U256 = U256::from_limbs([0x33, 0, 0, 0]);
    /// slot 0x66: sfc (SFC address)
    pub const SFC: U256 = U256::from_limbs([0x66, 0, 0, 0]);
    /// slot 0x67: driver (NodeDriver address)
    pub const DRIVER: U256 = U256::from_limbs([0x67, 0, 0, 0]);
}
