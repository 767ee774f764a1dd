//! Market lifecycle classification
//!
//! A market's display state is a pure function of
//! `(end_time, resolved, is_refunded)` at observation time. Classification
//! is an ordered rule list, first match wins, so new lifecycle states can
//! be inserted without disturbing precedence. Refund is a terminal override
//! from the contract admin path: once stakes are returned, outcome shares
//! are meaningless and every other reading is suppressed.

use chrono::Utc;

use crate::types::{Market, MarketStatus};

type Rule = fn(&Market, i64) -> Option<MarketStatus>;

/// Evaluated in order; refund overrides resolution overrides time.
const RULES: &[Rule] = &[refunded, still_open, awaiting_resolution, resolved];

fn refunded(market: &Market, _now: i64) -> Option<MarketStatus> {
    market.is_refunded.then_some(MarketStatus::Refunded)
}

fn still_open(market: &Market, now: i64) -> Option<MarketStatus> {
    // strict less-than: a market exactly at end_time has ended
    (now < market.end_time).then_some(MarketStatus::Active)
}

fn awaiting_resolution(market: &Market, _now: i64) -> Option<MarketStatus> {
    (!market.resolved).then_some(MarketStatus::PendingResolution)
}

fn resolved(_market: &Market, _now: i64) -> Option<MarketStatus> {
    Some(MarketStatus::Resolved)
}

/// Classify a market snapshot at the given Unix timestamp (seconds)
pub fn classify(market: &Market, now: i64) -> MarketStatus {
    RULES
        .iter()
        .find_map(|rule| rule(market, now))
        .unwrap_or(MarketStatus::Resolved)
}

/// Classify against the current wall clock
pub fn classify_now(market: &Market) -> MarketStatus {
    classify(market, Utc::now().timestamp())
}
