//! Pitwall CLI
//!
//! Usage:
//!   pitwall [watch]                poll active markets and log their state
//!   pitwall markets                list the highest-volume markets
//!   pitwall bet <id> <A|B> <amt>   buy shares on one side of a market
//!   pitwall claim <id>             claim winnings for a resolved market

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pitwall::chain::{ChainConfig, MarketClient};
use pitwall::config::AppConfig;
use pitwall::flow;
use pitwall::market::{claim_state, classify_now, settlement_payout};
use pitwall::types::Side;
use pitwall::units::{format_usdc, parse_usdc};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    info!(config = %config.digest(), "Starting pitwall");

    let chain = ChainConfig::from_settings(&config.chain)?;
    let client = MarketClient::new(&chain)?;
    if let Some(account) = client.account() {
        info!(account = %format!("{account:#x}"), "Wallet connected");
    } else {
        info!("No PRIVATE_KEY configured, running read-only");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("watch") => watch(&client, &config).await,
        Some("markets") => list_by_volume(&client, &config).await,
        Some("bet") => {
            config.validate_signing_env()?;
            bet(&client, &args[1..]).await
        }
        Some("claim") => {
            config.validate_signing_env()?;
            claim(&client, &args[1..]).await
        }
        Some(other) => bail!("Unknown command '{other}' (expected watch | markets | bet | claim)"),
    }
}

/// Poll active markets until interrupted
async fn watch(client: &MarketClient, config: &AppConfig) -> Result<()> {
    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(config.client.refresh_secs));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = refresh_once(client).await {
                    warn!(error = %format!("{e:#}"), "Refresh failed, will retry");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}

async fn refresh_once(client: &MarketClient) -> Result<()> {
    let ids = client.active_markets().await?;
    info!(count = ids.len(), "Active markets");

    for id in ids {
        let market = client.get_market(id).await?;
        let status = classify_now(&market);
        let end = Utc
            .timestamp_opt(market.end_time, 0)
            .single()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| market.end_time.to_string());
        info!(
            market_id = id,
            status = %status,
            question = %market.question,
            pool_a = %format_usdc(market.total_option_a_shares),
            pool_b = %format_usdc(market.total_option_b_shares),
            ends = %end,
            "Market"
        );

        if let Some(account) = client.account() {
            let position = client.get_position(id, account).await?;
            if position.has_any_shares() {
                info!(
                    market_id = id,
                    stake_a = %format_usdc(position.option_a_shares),
                    stake_b = %format_usdc(position.option_b_shares),
                    claim = %claim_state(&market, &position),
                    payout = ?settlement_payout(&market, &position).map(format_usdc),
                    "Position"
                );
            }
        }
    }
    Ok(())
}

/// List the highest-volume markets
async fn list_by_volume(client: &MarketClient, config: &AppConfig) -> Result<()> {
    let ids = client.markets_by_volume(config.client.volume_limit).await?;
    for (rank, id) in ids.iter().enumerate() {
        let market = client.get_market(*id).await?;
        info!(
            rank = rank + 1,
            market_id = id,
            volume = %format_usdc(market.total_volume()),
            status = %classify_now(&market),
            question = %market.question,
            "Market by volume"
        );
    }
    Ok(())
}

/// pitwall bet <id> <A|B> <amount>
async fn bet(client: &MarketClient, args: &[String]) -> Result<()> {
    let [id, side, amount] = args else {
        bail!("Usage: pitwall bet <market-id> <A|B> <amount>");
    };
    let market_id: u64 = id.parse().with_context(|| format!("Invalid market id '{id}'"))?;
    let side = Side::from_str(side.as_str())
        .with_context(|| format!("Invalid side '{side}' (use A or B)"))?;
    let amount = parse_usdc(amount)?;
    let account = client.account().context("PRIVATE_KEY is required to bet")?;

    let preview = flow::place_bet(client, account, market_id, side, amount).await?;
    info!(
        market_id,
        side = %preview.side,
        fee = %format_usdc(preview.platform_fee),
        fee_pct = %format!("{:.1}%", preview.fee_percentage()),
        actual_bet = %format_usdc(preview.actual_bet),
        potential = %format_usdc(preview.potential_winnings),
        "Bet submitted"
    );
    Ok(())
}

/// pitwall claim <id>
async fn claim(client: &MarketClient, args: &[String]) -> Result<()> {
    let [id] = args else {
        bail!("Usage: pitwall claim <market-id>");
    };
    let market_id: u64 = id.parse().with_context(|| format!("Invalid market id '{id}'"))?;
    let account = client.account().context("PRIVATE_KEY is required to claim")?;

    let winnings = flow::claim(client, account, market_id).await?;
    info!(market_id, winnings = %format_usdc(winnings), "Claimed");
    Ok(())
}
