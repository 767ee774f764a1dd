//! Pitwall Library
//!
//! Client for an F1-themed binary prediction market on Base

pub mod chain;
pub mod config;
pub mod flow;
pub mod market;
pub mod types;
pub mod units;
