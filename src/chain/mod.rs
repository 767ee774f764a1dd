//! Prediction market contract client
//!
//! Wraps the on-chain F1 prediction market and its USDC collateral token:
//! - read calls for market info, share balances, refund/claim status, the
//!   dynamic fee quote, and market listings
//! - signed transactions for approvals, share purchases, and claims
//!
//! The contract is the source of truth for all accounting; this client only
//! reads state and submits transactions. Positional tuples coming back from
//! reads are mapped straight into the named records in [`crate::types`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::contract::abigen;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use std::sync::Arc;

use crate::config::ChainSettings;
use crate::flow::MarketGateway;
use crate::types::{Market, Outcome, Side, UserPosition};
use crate::units::{self, format_usdc, MicroUsdc};

abigen!(
    PredictionMarketContract,
    r#"[
        function getMarketInfo(uint256 _marketId) view returns (string question, string optionA, string optionB, string imageUrl, uint256 endTime, uint8 outcome, uint256 totalOptionAShares, uint256 totalOptionBShares, bool resolved)
        function getSharesBalance(uint256 _marketId, address _user) view returns (uint256 optionAShares, uint256 optionBShares)
        function isMarketRefunded(uint256 _marketId) view returns (bool)
        function hasUserClaimed(uint256 _marketId, address _user) view returns (bool)
        function calculateDynamicFee(uint256 _totalAmount, uint256 _currentOwnSide, uint256 _currentOppositeSide) view returns (uint256)
        function getActiveMarkets() view returns (uint256[])
        function getMarketsByVolume(uint256 _limit) view returns (uint256[])
        function buyShares(uint256 _marketId, bool _optionA, uint256 _amount)
        function claimWinnings(uint256 _marketId)
    ]"#
);

abigen!(
    CollateralTokenContract,
    r#"[
        function allowance(address owner, address spender) view returns (uint256)
        function approve(address spender, uint256 amount) returns (bool)
        function balanceOf(address account) view returns (uint256)
    ]"#
);

/// Chain connection configuration
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Chain ID (8453 for Base)
    pub chain_id: u64,
    /// Prediction market contract address
    pub market_address: Address,
    /// USDC token address
    pub token_address: Address,
    /// Private key for signing; read-only mode when absent
    pub private_key: Option<String>,
}

impl ChainConfig {
    /// Build from settings plus the PRIVATE_KEY environment variable
    pub fn from_settings(settings: &ChainSettings) -> Result<Self> {
        let market_address = settings
            .market_address
            .parse()
            .with_context(|| format!("Invalid market address '{}'", settings.market_address))?;
        let token_address = settings
            .token_address
            .parse()
            .with_context(|| format!("Invalid token address '{}'", settings.token_address))?;
        Ok(Self {
            rpc_url: settings.rpc_url.clone(),
            chain_id: settings.chain_id,
            market_address,
            token_address,
            private_key: std::env::var("PRIVATE_KEY").ok(),
        })
    }
}

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Client for the prediction market and collateral token contracts
pub struct MarketClient {
    market: PredictionMarketContract<Provider<Http>>,
    token: CollateralTokenContract<Provider<Http>>,
    market_address: Address,
    token_address: Address,
    signer: Option<Arc<SignerClient>>,
    account: Option<Address>,
}

impl MarketClient {
    pub fn new(config: &ChainConfig) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.clone())
            .with_context(|| format!("Invalid RPC URL '{}'", config.rpc_url))?;
        let provider = Arc::new(provider);

        let signer = match &config.private_key {
            Some(key) => {
                let wallet: LocalWallet = key.parse().context("Invalid PRIVATE_KEY")?;
                let wallet = wallet.with_chain_id(config.chain_id);
                Some(Arc::new(SignerMiddleware::new(
                    provider.as_ref().clone(),
                    wallet,
                )))
            }
            None => None,
        };
        let account = signer.as_ref().map(|s| s.signer().address());

        Ok(Self {
            market: PredictionMarketContract::new(config.market_address, provider.clone()),
            token: CollateralTokenContract::new(config.token_address, provider),
            market_address: config.market_address,
            token_address: config.token_address,
            signer,
            account,
        })
    }

    /// The active wallet address, if a signing key was configured
    pub fn account(&self) -> Option<Address> {
        self.account
    }

    fn signer(&self) -> Result<Arc<SignerClient>> {
        self.signer
            .clone()
            .context("PRIVATE_KEY is required for transactions")
    }

    /// Fetch a market snapshot. Market info and refund status are
    /// independent reads and are issued in parallel.
    pub async fn get_market(&self, market_id: u64) -> Result<Market> {
        let info_call = self.market.get_market_info(U256::from(market_id));
        let refund_call = self.market.is_market_refunded(U256::from(market_id));
        let (info, is_refunded) = tokio::try_join!(
            async {
                info_call
                    .call()
                    .await
                    .with_context(|| format!("getMarketInfo({market_id}) failed"))
            },
            async {
                refund_call
                    .call()
                    .await
                    .with_context(|| format!("isMarketRefunded({market_id}) failed"))
            },
        )?;

        let (question, option_a, option_b, image_url, end_time, outcome, total_a, total_b, resolved) =
            info;
        let end_time = i64::try_from(units::try_from_u256(end_time)?)
            .context("Market end time out of range")?;

        Ok(Market {
            id: market_id,
            question,
            option_a,
            option_b,
            image_url,
            end_time,
            outcome: Outcome::from_raw(outcome)
                .with_context(|| format!("Unknown outcome value {outcome} for market {market_id}"))?,
            total_option_a_shares: units::try_from_u256(total_a)?,
            total_option_b_shares: units::try_from_u256(total_b)?,
            resolved,
            is_refunded,
        })
    }

    /// Fetch a user's position. Share balances and claim status are
    /// independent reads and are issued in parallel.
    pub async fn get_position(&self, market_id: u64, user: Address) -> Result<UserPosition> {
        let shares_call = self.market.get_shares_balance(U256::from(market_id), user);
        let claimed_call = self.market.has_user_claimed(U256::from(market_id), user);
        let ((option_a, option_b), has_claimed) = tokio::try_join!(
            async {
                shares_call
                    .call()
                    .await
                    .with_context(|| format!("getSharesBalance({market_id}) failed"))
            },
            async {
                claimed_call
                    .call()
                    .await
                    .with_context(|| format!("hasUserClaimed({market_id}) failed"))
            },
        )?;

        Ok(UserPosition {
            option_a_shares: units::try_from_u256(option_a)?,
            option_b_shares: units::try_from_u256(option_b)?,
            has_claimed,
        })
    }

    /// Quote the contract's dynamic fee for a proposed bet
    pub async fn dynamic_fee(
        &self,
        total_amount: MicroUsdc,
        own_side_total: MicroUsdc,
        opposite_side_total: MicroUsdc,
    ) -> Result<MicroUsdc> {
        let fee = self
            .market
            .calculate_dynamic_fee(
                U256::from(total_amount),
                U256::from(own_side_total),
                U256::from(opposite_side_total),
            )
            .call()
            .await
            .context("calculateDynamicFee failed")?;
        units::try_from_u256(fee)
    }

    /// Ids of markets still accepting bets
    pub async fn active_markets(&self) -> Result<Vec<u64>> {
        let ids = self
            .market
            .get_active_markets()
            .call()
            .await
            .context("getActiveMarkets failed")?;
        ids.into_iter().map(units::try_from_u256).collect()
    }

    /// Ids of the highest-volume markets, contract-ordered
    pub async fn markets_by_volume(&self, limit: usize) -> Result<Vec<u64>> {
        let ids = self
            .market
            .get_markets_by_volume(U256::from(limit))
            .call()
            .await
            .context("getMarketsByVolume failed")?;
        ids.into_iter().map(units::try_from_u256).collect()
    }

    /// Current token allowance granted to the market contract
    pub async fn allowance(&self, owner: Address) -> Result<MicroUsdc> {
        let raw = self
            .token
            .allowance(owner, self.market_address)
            .call()
            .await
            .context("allowance call failed")?;
        // allowances can be set to effectively-infinite values
        Ok(units::try_from_u256(raw).unwrap_or(MicroUsdc::MAX))
    }

    /// USDC balance of a wallet
    pub async fn balance_of(&self, owner: Address) -> Result<MicroUsdc> {
        let raw = self
            .token
            .balance_of(owner)
            .call()
            .await
            .context("balanceOf call failed")?;
        units::try_from_u256(raw)
    }

    /// Approve the market contract to spend USDC
    pub async fn approve(&self, amount: MicroUsdc) -> Result<()> {
        let signer = self.signer()?;
        let token = CollateralTokenContract::new(self.token_address, signer);

        tracing::info!(
            spender = %format!("{:#x}", self.market_address),
            amount = %format_usdc(amount),
            "Submitting approve transaction"
        );

        let call = token.approve(self.market_address, U256::from(amount));
        let pending = call
            .send()
            .await
            .context("Failed to submit approve transaction")?;
        let tx_hash = pending.tx_hash();
        let receipt = pending
            .await
            .context("Approve transaction dropped before confirmation")?;

        tracing::info!(
            tx_hash = %format!("{:#x}", tx_hash),
            block = ?receipt.and_then(|r| r.block_number),
            "Approve transaction confirmed"
        );
        Ok(())
    }

    /// Buy shares on one side of a market
    pub async fn buy_shares(&self, market_id: u64, side: Side, amount: MicroUsdc) -> Result<()> {
        let signer = self.signer()?;
        let market = PredictionMarketContract::new(self.market_address, signer);

        tracing::info!(
            market_id,
            side = %side,
            amount = %format_usdc(amount),
            "Submitting buyShares transaction"
        );

        let call = market.buy_shares(U256::from(market_id), side.is_option_a(), U256::from(amount));
        let pending = call
            .send()
            .await
            .context("Failed to submit buyShares transaction")?;
        let tx_hash = pending.tx_hash();
        let receipt = pending
            .await
            .context("buyShares transaction dropped before confirmation")?;

        tracing::info!(
            market_id,
            tx_hash = %format!("{:#x}", tx_hash),
            block = ?receipt.and_then(|r| r.block_number),
            "Bet confirmed"
        );
        Ok(())
    }

    /// Claim winnings for a resolved market
    pub async fn claim_winnings(&self, market_id: u64) -> Result<()> {
        let signer = self.signer()?;
        let market = PredictionMarketContract::new(self.market_address, signer);

        tracing::info!(market_id, "Submitting claimWinnings transaction");

        let call = market.claim_winnings(U256::from(market_id));
        let pending = call
            .send()
            .await
            .context("Failed to submit claimWinnings transaction")?;
        let tx_hash = pending.tx_hash();
        let receipt = pending
            .await
            .context("claimWinnings transaction dropped before confirmation")?;

        tracing::info!(
            market_id,
            tx_hash = %format!("{:#x}", tx_hash),
            block = ?receipt.and_then(|r| r.block_number),
            "Claim confirmed"
        );
        Ok(())
    }
}

#[async_trait]
impl MarketGateway for MarketClient {
    async fn market(&self, market_id: u64) -> Result<Market> {
        self.get_market(market_id).await
    }

    async fn position(&self, market_id: u64, user: Address) -> Result<UserPosition> {
        self.get_position(market_id, user).await
    }

    async fn fee_quote(
        &self,
        bet_amount: MicroUsdc,
        own_side_total: MicroUsdc,
        opposite_side_total: MicroUsdc,
    ) -> Result<MicroUsdc> {
        self.dynamic_fee(bet_amount, own_side_total, opposite_side_total)
            .await
    }

    async fn allowance(&self, owner: Address) -> Result<MicroUsdc> {
        MarketClient::allowance(self, owner).await
    }

    async fn approve(&self, amount: MicroUsdc) -> Result<()> {
        MarketClient::approve(self, amount).await
    }

    async fn buy_shares(&self, market_id: u64, side: Side, amount: MicroUsdc) -> Result<()> {
        MarketClient::buy_shares(self, market_id, side, amount).await
    }

    async fn claim_winnings(&self, market_id: u64) -> Result<()> {
        MarketClient::claim_winnings(self, market_id).await
    }
}
