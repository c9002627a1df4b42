//! CPAMM Constants
//!
//! Fee parameters and pool status bits.

/// Fee constants
pub mod fees {
    /// Every fee and tax rate is expressed over this denominator (100%)
    pub use routekit_core::constants::FEE_RATE_DENOMINATOR;

    /// Standard pool trade fee (0.3%)
    pub use routekit_core::constants::DEFAULT_TRADE_FEE_RATE;
}

/// Pool status bits. A set bit disables the operation.
pub mod status {
    pub const DEPOSIT_DISABLED: u8 = 1;
    pub const WITHDRAW_DISABLED: u8 = 1 << 1;
    pub const SWAP_DISABLED: u8 = 1 << 2;
}
