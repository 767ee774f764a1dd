//! Payout estimation and realized winnings
//!
//! Winners split the losing pool pro rata to their winning-side stake.
//! The contract deducts its dynamic fee when shares are bought, so the
//! pre-trade estimate subtracts the fee quote while the claim-time
//! computation does not. All arithmetic stays in integer micro-USDC;
//! the pro-rata division widens to u128 and truncates, matching the
//! contract's integer division.
//!
//! Estimates are race-tolerant previews: concurrent bets landing in the
//! same block can shift the pools before the transaction executes, and the
//! contract's own accounting is the final arbiter.

use crate::types::{ClaimState, Market, Side, UserPosition};
use crate::units::MicroUsdc;

/// `(share / pool) * counter_pool` without leaving integer space.
/// Zero on an empty pool or counter pool; no division by zero.
fn pro_rata(share: MicroUsdc, pool: MicroUsdc, counter_pool: MicroUsdc) -> MicroUsdc {
    if pool == 0 || counter_pool == 0 {
        return 0;
    }
    ((share as u128 * counter_pool as u128) / pool as u128) as MicroUsdc
}

/// Pre-trade preview of total winnings for a proposed bet.
///
/// The fee quote comes from the contract's `calculateDynamicFee` and must be
/// fresh for this `(bet_amount, side)` pair; a quote that has not loaded yet
/// is passed as zero and the estimate recomputed once it arrives. A fee
/// exceeding the bet clamps the net stake to zero rather than going
/// negative, so the result is always `>= 0`.
pub fn estimate_potential_winnings(
    bet_amount: MicroUsdc,
    own_side_total: MicroUsdc,
    opposite_side_total: MicroUsdc,
    fee: MicroUsdc,
) -> MicroUsdc {
    let actual_bet = bet_amount.saturating_sub(fee);
    if opposite_side_total == 0 {
        // nothing to win from; the user only recovers their net stake
        return actual_bet;
    }
    let new_own_total = own_side_total + actual_bet;
    actual_bet + pro_rata(actual_bet, new_own_total, opposite_side_total)
}

/// Preview for a bet on a given side of a market snapshot
pub fn estimate_for_market(
    market: &Market,
    side: Side,
    bet_amount: MicroUsdc,
    fee: MicroUsdc,
) -> MicroUsdc {
    estimate_potential_winnings(
        bet_amount,
        market.shares_for(side),
        market.shares_for(side.opposite()),
        fee,
    )
}

/// Realized winnings for a resolved market: the user's winning-side shares
/// plus their pro-rata cut of the losing pool. Fees were already taken at
/// bet time and are not re-applied.
///
/// Returns `None` while the outcome is `Unresolved`; zero when the user
/// holds no winning-side shares (did not participate, or lost). Must not be
/// used for refunded markets, which return stakes instead — see
/// [`settlement_payout`].
pub fn realized_winnings(market: &Market, position: &UserPosition) -> Option<MicroUsdc> {
    let winning_side = market.outcome.winning_side()?;
    let user_winning_shares = position.shares_for(winning_side);
    if user_winning_shares == 0 {
        return Some(0);
    }
    let total_winning = market.shares_for(winning_side);
    let total_losing = market.shares_for(winning_side.opposite());
    Some(user_winning_shares + pro_rata(user_winning_shares, total_winning, total_losing))
}

/// What a refunded market returns: the full original stake on both sides,
/// fee-free and proportion-free.
pub fn refund_payout(position: &UserPosition) -> MicroUsdc {
    position.total_stake()
}

/// Amount the user walks away with once the market is terminal.
/// Refund takes precedence over the proportional formula.
pub fn settlement_payout(market: &Market, position: &UserPosition) -> Option<MicroUsdc> {
    if market.is_refunded {
        return Some(refund_payout(position));
    }
    realized_winnings(market, position)
}

/// Claim eligibility: `NotEligible -> Eligible -> Claimed`.
/// The claim action is only permitted from `Eligible`.
pub fn claim_state(market: &Market, position: &UserPosition) -> ClaimState {
    if position.has_claimed {
        return ClaimState::Claimed;
    }
    let has_winning_shares = market
        .outcome
        .winning_side()
        .map(|side| position.shares_for(side) > 0)
        .unwrap_or(false);
    if has_winning_shares {
        ClaimState::Eligible
    } else {
        ClaimState::NotEligible
    }
}
