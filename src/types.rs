//! Core types used throughout Pitwall
//!
//! Contract reads arrive as positional tuples; they are mapped into the
//! named records here immediately, with amounts kept in micro-USDC.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units::MicroUsdc;

/// One of the two outcomes a bet can back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    OptionA,
    OptionB,
}

impl Side {
    /// The opposing side
    pub fn opposite(&self) -> Side {
        match self {
            Side::OptionA => Side::OptionB,
            Side::OptionB => Side::OptionA,
        }
    }

    /// Contract encoding: buyShares takes `bool _optionA`
    pub fn is_option_a(&self) -> bool {
        matches!(self, Side::OptionA)
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" | "OPTIONA" => Some(Side::OptionA),
            "B" | "OPTIONB" => Some(Side::OptionB),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::OptionA => write!(f, "A"),
            Side::OptionB => write!(f, "B"),
        }
    }
}

/// Resolution outcome as reported by the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Unresolved,
    OptionAWon,
    OptionBWon,
}

impl Outcome {
    /// Decode the contract's uint8 outcome field
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Outcome::Unresolved),
            1 => Some(Outcome::OptionAWon),
            2 => Some(Outcome::OptionBWon),
            _ => None,
        }
    }

    /// The winning side, if resolution has happened
    pub fn winning_side(&self) -> Option<Side> {
        match self {
            Outcome::Unresolved => None,
            Outcome::OptionAWon => Some(Side::OptionA),
            Outcome::OptionBWon => Some(Side::OptionB),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Unresolved => write!(f, "UNRESOLVED"),
            Outcome::OptionAWon => write!(f, "OPTION_A_WON"),
            Outcome::OptionBWon => write!(f, "OPTION_B_WON"),
        }
    }
}

/// Lifecycle state derived from a market snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStatus {
    Active,
    PendingResolution,
    Resolved,
    Refunded,
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketStatus::Active => write!(f, "ACTIVE"),
            MarketStatus::PendingResolution => write!(f, "PENDING_RESOLUTION"),
            MarketStatus::Resolved => write!(f, "RESOLVED"),
            MarketStatus::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// Claim lifecycle as observed by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimState {
    NotEligible,
    Eligible,
    Claimed,
}

impl fmt::Display for ClaimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimState::NotEligible => write!(f, "NOT_ELIGIBLE"),
            ClaimState::Eligible => write!(f, "ELIGIBLE"),
            ClaimState::Claimed => write!(f, "CLAIMED"),
        }
    }
}

/// Read-only market snapshot, replaced wholesale on each refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Market id on the contract
    pub id: u64,
    /// Question/title
    pub question: String,
    /// Label for option A
    pub option_a: String,
    /// Label for option B
    pub option_b: String,
    /// Image URL from contract (may be empty)
    pub image_url: String,
    /// End timestamp (Unix seconds); no new bets at or after this instant
    pub end_time: i64,
    /// Resolution outcome
    pub outcome: Outcome,
    /// Total staked on option A in micro-USDC
    pub total_option_a_shares: MicroUsdc,
    /// Total staked on option B in micro-USDC
    pub total_option_b_shares: MicroUsdc,
    /// True once an outcome has been finalized
    pub resolved: bool,
    /// True if the market was cancelled and stakes returned.
    /// Takes precedence over every other field in display logic.
    pub is_refunded: bool,
}

impl Market {
    /// Display label for a side
    pub fn label_for(&self, side: Side) -> &str {
        match side {
            Side::OptionA => &self.option_a,
            Side::OptionB => &self.option_b,
        }
    }

    /// Pool total for a side in micro-USDC
    pub fn shares_for(&self, side: Side) -> MicroUsdc {
        match side {
            Side::OptionA => self.total_option_a_shares,
            Side::OptionB => self.total_option_b_shares,
        }
    }

    /// Combined volume across both pools
    pub fn total_volume(&self) -> MicroUsdc {
        self.total_option_a_shares + self.total_option_b_shares
    }
}

/// Per-user, per-market position
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UserPosition {
    /// User's stake on option A in micro-USDC
    pub option_a_shares: MicroUsdc,
    /// User's stake on option B in micro-USDC
    pub option_b_shares: MicroUsdc,
    /// True once winnings have been withdrawn
    pub has_claimed: bool,
}

impl UserPosition {
    /// Stake on a side in micro-USDC
    pub fn shares_for(&self, side: Side) -> MicroUsdc {
        match side {
            Side::OptionA => self.option_a_shares,
            Side::OptionB => self.option_b_shares,
        }
    }

    /// Whether the user participated at all (for messaging, never for amounts)
    pub fn has_any_shares(&self) -> bool {
        self.option_a_shares > 0 || self.option_b_shares > 0
    }

    /// Original stake across both sides
    pub fn total_stake(&self) -> MicroUsdc {
        self.option_a_shares + self.option_b_shares
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_raw_roundtrip() {
        assert_eq!(Outcome::from_raw(0), Some(Outcome::Unresolved));
        assert_eq!(Outcome::from_raw(1), Some(Outcome::OptionAWon));
        assert_eq!(Outcome::from_raw(2), Some(Outcome::OptionBWon));
        assert_eq!(Outcome::from_raw(3), None);
    }

    #[test]
    fn winning_side_follows_outcome() {
        assert_eq!(Outcome::Unresolved.winning_side(), None);
        assert_eq!(Outcome::OptionAWon.winning_side(), Some(Side::OptionA));
        assert_eq!(Outcome::OptionBWon.winning_side(), Some(Side::OptionB));
    }

    #[test]
    fn side_parsing_accepts_short_and_long_forms() {
        assert_eq!(Side::from_str("a"), Some(Side::OptionA));
        assert_eq!(Side::from_str("OptionB"), Some(Side::OptionB));
        assert_eq!(Side::from_str("yes"), None);
    }
}
