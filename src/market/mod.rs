//! Market domain logic
//!
//! Pure, synchronous computations over market snapshots:
//! - lifecycle classification (active / pending / resolved / refunded)
//! - payout estimation under the contract's dynamic fee
//! - realized winnings and claim eligibility after resolution

pub mod lifecycle;
pub mod payout;

pub use lifecycle::*;
pub use payout::*;
