//! Error handling for the application

use alloy_primitives::U256;
use thiserror::Error;

/// Pricing and valuation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("Invalid reserve: input reserve must be non-zero")]
    InvalidReserve,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid fee {numerator}/{denominator}: must lie in (0, 1]")]
    InvalidFee { numerator: u64, denominator: u64 },

    #[error("Invalid safety multiplier {numerator}/{denominator}")]
    InvalidMultiplier { numerator: u64, denominator: u64 },

    #[error("Insufficient liquidity: requested {requested}, reserve holds {available}")]
    InsufficientLiquidity { requested: U256, available: U256 },

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),
}
