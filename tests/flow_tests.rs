//! Purchase and claim flow tests against an in-memory gateway

use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use ethers::types::Address;

use pitwall::flow::{self, FlowError, MarketGateway};
use pitwall::types::{Market, Outcome, Side, UserPosition};
use pitwall::units::MicroUsdc;

struct FakeGateway {
    market: Market,
    position: UserPosition,
    fee: MicroUsdc,
    allowance: MicroUsdc,
    /// Revert message returned by claimWinnings, if any
    claim_revert: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    fn new(market: Market) -> Self {
        Self {
            market,
            position: UserPosition::default(),
            fee: 0,
            allowance: MicroUsdc::MAX,
            claim_revert: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketGateway for FakeGateway {
    async fn market(&self, _market_id: u64) -> Result<Market> {
        self.record("market");
        Ok(self.market.clone())
    }

    async fn position(&self, _market_id: u64, _user: Address) -> Result<UserPosition> {
        self.record("position");
        Ok(self.position)
    }

    async fn fee_quote(
        &self,
        bet_amount: MicroUsdc,
        own_side_total: MicroUsdc,
        opposite_side_total: MicroUsdc,
    ) -> Result<MicroUsdc> {
        self.record(format!(
            "fee_quote:{bet_amount}:{own_side_total}:{opposite_side_total}"
        ));
        Ok(self.fee)
    }

    async fn allowance(&self, _owner: Address) -> Result<MicroUsdc> {
        self.record("allowance");
        Ok(self.allowance)
    }

    async fn approve(&self, amount: MicroUsdc) -> Result<()> {
        self.record(format!("approve:{amount}"));
        Ok(())
    }

    async fn buy_shares(&self, market_id: u64, side: Side, amount: MicroUsdc) -> Result<()> {
        self.record(format!("buy_shares:{market_id}:{side}:{amount}"));
        Ok(())
    }

    async fn claim_winnings(&self, market_id: u64) -> Result<()> {
        if let Some(revert) = &self.claim_revert {
            bail!("execution reverted: {revert}");
        }
        self.record(format!("claim_winnings:{market_id}"));
        Ok(())
    }
}

fn open_market() -> Market {
    Market {
        id: 5,
        question: "Will there be a safety car at Silverstone?".to_string(),
        option_a: "Yes".to_string(),
        option_b: "No".to_string(),
        image_url: String::new(),
        end_time: Utc::now().timestamp() + 3_600,
        outcome: Outcome::Unresolved,
        total_option_a_shares: 90_000_000,
        total_option_b_shares: 200_000_000,
        resolved: false,
        is_refunded: false,
    }
}

fn resolved_market() -> Market {
    Market {
        end_time: Utc::now().timestamp() - 3_600,
        outcome: Outcome::OptionAWon,
        total_option_a_shares: 100_000_000,
        total_option_b_shares: 50_000_000,
        resolved: true,
        ..open_market()
    }
}

fn account() -> Address {
    Address::repeat_byte(0x42)
}

#[tokio::test]
async fn place_bet_skips_approval_when_allowance_suffices() {
    let mut gateway = FakeGateway::new(open_market());
    gateway.fee = 1_000_000;

    let preview = flow::place_bet(&gateway, account(), 5, Side::OptionA, 10_000_000)
        .await
        .unwrap();

    // $10 bet, $1 fee, own 90, opp 200 -> 9 + (9/99)*200 = 27.181818
    assert_eq!(preview.platform_fee, 1_000_000);
    assert_eq!(preview.actual_bet, 9_000_000);
    assert_eq!(preview.potential_winnings, 27_181_818);

    let calls = gateway.calls();
    assert!(!calls.iter().any(|c| c.starts_with("approve")));
    assert!(calls.contains(&"buy_shares:5:A:10000000".to_string()));
    // the quote was requested for this (amount, side) pair
    assert!(calls.contains(&"fee_quote:10000000:90000000:200000000".to_string()));
}

#[tokio::test]
async fn place_bet_approves_first_when_allowance_short() {
    let mut gateway = FakeGateway::new(open_market());
    gateway.allowance = 5_000_000;

    flow::place_bet(&gateway, account(), 5, Side::OptionB, 10_000_000)
        .await
        .unwrap();

    let calls = gateway.calls();
    let approve_idx = calls.iter().position(|c| c == "approve:10000000").unwrap();
    let buy_idx = calls
        .iter()
        .position(|c| c == "buy_shares:5:B:10000000")
        .unwrap();
    assert!(approve_idx < buy_idx);
}

#[tokio::test]
async fn zero_bet_rejected_before_any_read() {
    let gateway = FakeGateway::new(open_market());

    let result = flow::place_bet(&gateway, account(), 5, Side::OptionA, 0).await;

    assert!(matches!(result, Err(FlowError::NonPositiveAmount)));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn ended_market_rejects_bet_without_transacting() {
    let mut market = open_market();
    market.end_time = Utc::now().timestamp() - 60;
    let gateway = FakeGateway::new(market);

    let result = flow::place_bet(&gateway, account(), 5, Side::OptionA, 10_000_000).await;

    assert!(matches!(result, Err(FlowError::MarketNotOpen(5, _))));
    assert!(!gateway.calls().iter().any(|c| c.starts_with("buy_shares")));
}

#[tokio::test]
async fn claim_pays_share_of_losing_pool() {
    let mut gateway = FakeGateway::new(resolved_market());
    gateway.position = UserPosition {
        option_a_shares: 10_000_000,
        option_b_shares: 0,
        has_claimed: false,
    };

    let winnings = flow::claim(&gateway, account(), 5).await.unwrap();

    // 10 + (10/100)*50 = 15
    assert_eq!(winnings, 15_000_000);
    assert!(gateway.calls().contains(&"claim_winnings:5".to_string()));
}

#[tokio::test]
async fn losing_position_cannot_claim() {
    let mut gateway = FakeGateway::new(resolved_market());
    gateway.position = UserPosition {
        option_a_shares: 0,
        option_b_shares: 20_000_000,
        has_claimed: false,
    };

    let result = flow::claim(&gateway, account(), 5).await;

    assert!(matches!(result, Err(FlowError::NothingToClaim)));
    assert!(!gateway
        .calls()
        .iter()
        .any(|c| c.starts_with("claim_winnings")));
}

#[tokio::test]
async fn second_claim_rejected_client_side() {
    let mut gateway = FakeGateway::new(resolved_market());
    gateway.position = UserPosition {
        option_a_shares: 10_000_000,
        option_b_shares: 0,
        has_claimed: true,
    };

    let result = flow::claim(&gateway, account(), 5).await;

    assert!(matches!(result, Err(FlowError::AlreadyClaimed)));
    assert!(!gateway
        .calls()
        .iter()
        .any(|c| c.starts_with("claim_winnings")));
}

#[tokio::test]
async fn refunded_market_has_nothing_to_claim() {
    let mut market = resolved_market();
    market.is_refunded = true;
    let mut gateway = FakeGateway::new(market);
    gateway.position = UserPosition {
        option_a_shares: 10_000_000,
        option_b_shares: 0,
        has_claimed: false,
    };

    let result = flow::claim(&gateway, account(), 5).await;

    assert!(matches!(result, Err(FlowError::Refunded(5))));
}

#[tokio::test]
async fn already_claimed_revert_maps_to_dedicated_error() {
    let mut gateway = FakeGateway::new(resolved_market());
    gateway.position = UserPosition {
        option_a_shares: 10_000_000,
        option_b_shares: 0,
        has_claimed: false, // stale read: the chain already saw a claim
    };
    gateway.claim_revert = Some("Already claimed".to_string());

    let result = flow::claim(&gateway, account(), 5).await;

    assert!(matches!(result, Err(FlowError::AlreadyClaimed)));
}
