//! Purchase and claim flows
//!
//! Orchestrates the read-preview-transact sequence around the pure payout
//! logic. Everything is validated client-side before a transaction is
//! built, so ineligible claims and malformed bets never cost gas. The
//! contract is reached through the [`MarketGateway`] trait so the flows run
//! against an in-memory fake in tests, without a wallet or RPC endpoint.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use ethers::types::Address;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::market::{classify, claim_state, estimate_for_market, settlement_payout};
use crate::types::{ClaimState, Market, MarketStatus, Side, UserPosition};
use crate::units::{format_usdc, to_decimal, MicroUsdc};

/// Failures surfaced by the purchase and claim flows
#[derive(Debug, Error)]
pub enum FlowError {
    /// User-correctable input problem, rejected before any network call
    #[error("bet amount must be greater than zero")]
    NonPositiveAmount,
    #[error("market {0} is not open for betting (status {1})")]
    MarketNotOpen(u64, MarketStatus),
    #[error("market {0} is not resolved yet")]
    NotResolved(u64),
    /// Refunded markets return stakes automatically; there is nothing to claim
    #[error("market {0} was refunded; stakes are returned automatically")]
    Refunded(u64),
    #[error("no winning shares to claim")]
    NothingToClaim,
    #[error("winnings were already claimed")]
    AlreadyClaimed,
    #[error(transparent)]
    Chain(#[from] anyhow::Error),
}

/// Next step of the purchase flow after the allowance check.
/// An insufficient allowance is a branch of the flow, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuyStep {
    NeedsApproval,
    ReadyToConfirm,
}

pub fn next_buy_step(allowance: MicroUsdc, required: MicroUsdc) -> BuyStep {
    if allowance < required {
        BuyStep::NeedsApproval
    } else {
        BuyStep::ReadyToConfirm
    }
}

/// Figures shown on the confirmation screen before a bet is submitted
#[derive(Debug, Clone)]
pub struct BetPreview {
    pub market_id: u64,
    pub side: Side,
    /// Nominal bet in micro-USDC
    pub bet_amount: MicroUsdc,
    /// Contract's dynamic fee quote (zero while a quote is still loading)
    pub platform_fee: MicroUsdc,
    /// Net amount credited as shares
    pub actual_bet: MicroUsdc,
    /// Estimated total payout if the chosen side wins
    pub potential_winnings: MicroUsdc,
}

impl BetPreview {
    /// Fee as a percentage of the nominal bet
    pub fn fee_percentage(&self) -> Decimal {
        if self.bet_amount == 0 {
            return Decimal::ZERO;
        }
        to_decimal(self.platform_fee) / to_decimal(self.bet_amount) * Decimal::from(100)
    }
}

/// Build a bet preview against a market snapshot.
///
/// A fee quote that has not arrived yet is treated as zero; the preview is
/// recomputed once the quote lands, which can show a one-step correction.
/// Quotes are only valid for the `(amount, side)` they were requested for,
/// so callers must re-prepare whenever either changes.
pub fn prepare_bet(
    market: &Market,
    side: Side,
    bet_amount: MicroUsdc,
    fee_quote: Option<MicroUsdc>,
    now: i64,
) -> Result<BetPreview, FlowError> {
    if bet_amount == 0 {
        return Err(FlowError::NonPositiveAmount);
    }
    let status = classify(market, now);
    if status != MarketStatus::Active {
        return Err(FlowError::MarketNotOpen(market.id, status));
    }
    let platform_fee = fee_quote.unwrap_or(0);
    Ok(BetPreview {
        market_id: market.id,
        side,
        bet_amount,
        platform_fee,
        actual_bet: bet_amount.saturating_sub(platform_fee),
        potential_winnings: estimate_for_market(market, side, bet_amount, platform_fee),
    })
}

/// Contract operations the flows depend on
#[async_trait]
pub trait MarketGateway: Send + Sync {
    async fn market(&self, market_id: u64) -> Result<Market>;
    async fn position(&self, market_id: u64, user: Address) -> Result<UserPosition>;
    async fn fee_quote(
        &self,
        bet_amount: MicroUsdc,
        own_side_total: MicroUsdc,
        opposite_side_total: MicroUsdc,
    ) -> Result<MicroUsdc>;
    async fn allowance(&self, owner: Address) -> Result<MicroUsdc>;
    async fn approve(&self, amount: MicroUsdc) -> Result<()>;
    async fn buy_shares(&self, market_id: u64, side: Side, amount: MicroUsdc) -> Result<()>;
    async fn claim_winnings(&self, market_id: u64) -> Result<()>;
}

/// Run the full purchase flow: validate, quote the fee fresh for this
/// `(amount, side)` pair, preview, approve if the allowance is short, buy.
///
/// Returns the preview that was in effect when the transaction was
/// submitted. The estimate is race-tolerant: concurrent bets in the same
/// block window may shift the final on-chain numbers slightly.
pub async fn place_bet<G: MarketGateway + ?Sized>(
    gateway: &G,
    account: Address,
    market_id: u64,
    side: Side,
    bet_amount: MicroUsdc,
) -> Result<BetPreview, FlowError> {
    if bet_amount == 0 {
        return Err(FlowError::NonPositiveAmount);
    }

    let market = gateway.market(market_id).await?;
    let fee = gateway
        .fee_quote(
            bet_amount,
            market.shares_for(side),
            market.shares_for(side.opposite()),
        )
        .await?;
    let preview = prepare_bet(&market, side, bet_amount, Some(fee), Utc::now().timestamp())?;

    let allowance = gateway.allowance(account).await?;
    if next_buy_step(allowance, bet_amount) == BuyStep::NeedsApproval {
        gateway.approve(bet_amount).await?;
    }

    gateway.buy_shares(market_id, side, bet_amount).await?;

    tracing::info!(
        market_id,
        side = %side,
        bet = %format_usdc(preview.bet_amount),
        fee = %format_usdc(preview.platform_fee),
        potential = %format_usdc(preview.potential_winnings),
        "Bet placed"
    );
    Ok(preview)
}

/// Run the claim flow for a resolved market.
///
/// Ineligible and already-claimed positions are rejected before a
/// transaction is built. Returns the realized winnings that were claimed.
pub async fn claim<G: MarketGateway + ?Sized>(
    gateway: &G,
    account: Address,
    market_id: u64,
) -> Result<MicroUsdc, FlowError> {
    let market = gateway.market(market_id).await?;
    if market.is_refunded {
        return Err(FlowError::Refunded(market_id));
    }

    let position = gateway.position(market_id, account).await?;
    match claim_state(&market, &position) {
        ClaimState::Claimed => return Err(FlowError::AlreadyClaimed),
        ClaimState::NotEligible => return Err(FlowError::NothingToClaim),
        ClaimState::Eligible => {}
    }

    let winnings =
        settlement_payout(&market, &position).ok_or(FlowError::NotResolved(market_id))?;

    gateway
        .claim_winnings(market_id)
        .await
        .map_err(map_claim_error)?;

    tracing::info!(
        market_id,
        winnings = %format_usdc(winnings),
        "Winnings claimed"
    );
    Ok(winnings)
}

/// The contract reverts with an "Already claimed" message when a second
/// claim races the first; that case gets a dedicated error for messaging.
fn map_claim_error(err: anyhow::Error) -> FlowError {
    if format!("{err:#}").to_lowercase().contains("already claimed") {
        FlowError::AlreadyClaimed
    } else {
        FlowError::Chain(err)
    }
}
