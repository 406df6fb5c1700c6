// src/pool.rs
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::math;
use crate::shared::errors::PricingError;
use crate::shared::types::{Amount, WAD};

/// Names accepted by `FeeSchedule::from_str`
pub const FEE_SCHEDULE_NAMES: &str =
    "exchange-v1 (alias v1), pair-v2 (alias v2), none, or a literal N/D such as 9975/10000";

/// Share of a swap's input that counts toward the price, `numerator / denominator`.
///
/// The named pool families keep their identity even where their ratios agree,
/// so reports can tell which pricing a plan was run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeeSchedule {
    /// Exchange-v1 pools (`getTokenToEthInputPrice`), 997/1000
    ExchangeV1,
    /// Pair-v2 pools (`getAmountOut`), 997/1000
    PairV2,
    NoFee,
    Custom { numerator: u64, denominator: u64 },
}

impl FeeSchedule {
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, PricingError> {
        let fee = FeeSchedule::Custom { numerator, denominator };
        fee.validate()?;
        Ok(fee)
    }

    pub fn numerator(&self) -> u64 {
        match self {
            FeeSchedule::ExchangeV1 | FeeSchedule::PairV2 => 997,
            FeeSchedule::NoFee => 1,
            FeeSchedule::Custom { numerator, .. } => *numerator,
        }
    }

    pub fn denominator(&self) -> u64 {
        match self {
            FeeSchedule::ExchangeV1 | FeeSchedule::PairV2 => 1000,
            FeeSchedule::NoFee => 1,
            FeeSchedule::Custom { denominator, .. } => *denominator,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeeSchedule::ExchangeV1 => "exchange-v1",
            FeeSchedule::PairV2 => "pair-v2",
            FeeSchedule::NoFee => "none",
            FeeSchedule::Custom { .. } => "custom",
        }
    }

    pub fn validate(&self) -> Result<(), PricingError> {
        let (numerator, denominator) = (self.numerator(), self.denominator());
        if denominator == 0 || numerator == 0 || numerator > denominator {
            return Err(PricingError::InvalidFee { numerator, denominator });
        }
        Ok(())
    }

    /// Fee charged on input, in basis points (rounded down)
    pub fn fee_bps(&self) -> u64 {
        let denominator = self.denominator() as u128;
        if denominator == 0 {
            return 0;
        }
        let charged = denominator.saturating_sub(self.numerator() as u128);
        // charged <= denominator, so this is at most 10_000
        (charged * 10_000 / denominator) as u64
    }
}

impl fmt::Display for FeeSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeSchedule::Custom { numerator, denominator } => write!(f, "{}/{}", numerator, denominator),
            named => write!(f, "{} ({}/{})", named.label(), named.numerator(), named.denominator()),
        }
    }
}

impl FromStr for FeeSchedule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exchange-v1" | "exchange_v1" | "v1" => Ok(FeeSchedule::ExchangeV1),
            "pair-v2" | "pair_v2" | "v2" => Ok(FeeSchedule::PairV2),
            "none" => Ok(FeeSchedule::NoFee),
            other => {
                let (n, d) = other.split_once('/').ok_or_else(|| {
                    anyhow::anyhow!("Unknown fee schedule: {} (expected {})", s, FEE_SCHEDULE_NAMES)
                })?;
                Ok(FeeSchedule::new(n.trim().parse()?, d.trim().parse()?)?)
            }
        }
    }
}

/// Snapshot of a constant-product pool's two reserves, oriented for a trade
/// of `asset_in` into the pool against `asset_out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReserveState {
    pub asset_in: Amount,
    pub asset_out: Amount,
}

impl ReserveState {
    pub fn new(asset_in: Amount, asset_out: Amount) -> Self {
        Self { asset_in, asset_out }
    }

    /// Same pool seen from the other side of the trade
    pub fn inverted(&self) -> Self {
        Self {
            asset_in: self.asset_out,
            asset_out: self.asset_in,
        }
    }

    /// Spot price of one `asset_in` unit in `asset_out`, 1e18 fixed point
    pub fn spot_price_wad(&self) -> Result<Amount, PricingError> {
        math::spot_quote(WAD, self.asset_in, self.asset_out)
    }

    /// Constant-product invariant `k = x * y`
    pub fn invariant(&self) -> Option<U256> {
        self.asset_in.checked_mul(self.asset_out)
    }

    pub fn quote(&self, amount_in: Amount, fee: FeeSchedule) -> Result<Amount, PricingError> {
        math::quote_output_for_input(
            amount_in,
            self.asset_in,
            self.asset_out,
            fee.numerator(),
            fee.denominator(),
        )
    }

    /// Swap `amount_in` through the pool, returning the output and the
    /// reserves the pool holds afterwards.
    pub fn after_swap(
        &self,
        amount_in: Amount,
        fee: FeeSchedule,
    ) -> Result<(Amount, ReserveState), PricingError> {
        let amount_out = self.quote(amount_in, fee)?;
        let asset_in = self
            .asset_in
            .checked_add(amount_in)
            .ok_or(PricingError::Overflow("reserve after swap"))?;
        Ok((
            amount_out,
            ReserveState {
                asset_in,
                asset_out: self.asset_out - amount_out,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::ether;

    #[test]
    fn test_named_fee_schedules_stay_distinct() {
        assert_ne!(FeeSchedule::ExchangeV1, FeeSchedule::PairV2);
        assert_ne!(FeeSchedule::ExchangeV1, FeeSchedule::new(997, 1000).unwrap());
        assert_eq!(FeeSchedule::ExchangeV1.numerator(), FeeSchedule::PairV2.numerator());
        assert_eq!(FeeSchedule::ExchangeV1.to_string(), "exchange-v1 (997/1000)");
        assert_eq!(FeeSchedule::PairV2.to_string(), "pair-v2 (997/1000)");
        assert_eq!(FeeSchedule::new(9975, 10000).unwrap().to_string(), "9975/10000");
    }

    #[test]
    fn test_fee_schedule_parsing() {
        assert_eq!("exchange-v1".parse::<FeeSchedule>().unwrap(), FeeSchedule::ExchangeV1);
        assert_eq!("PAIR-V2".parse::<FeeSchedule>().unwrap(), FeeSchedule::PairV2);
        assert_eq!("none".parse::<FeeSchedule>().unwrap(), FeeSchedule::NoFee);
        assert_eq!(
            "9975/10000".parse::<FeeSchedule>().unwrap(),
            FeeSchedule::Custom { numerator: 9975, denominator: 10000 }
        );
        let err = "uniswap".parse::<FeeSchedule>().unwrap_err();
        assert!(err.to_string().contains("pair-v2"));
        assert!("3/2".parse::<FeeSchedule>().is_err());
    }

    #[test]
    fn test_fee_bps() {
        assert_eq!(FeeSchedule::ExchangeV1.fee_bps(), 30);
        assert_eq!(FeeSchedule::PairV2.fee_bps(), 30);
        assert_eq!(FeeSchedule::NoFee.fee_bps(), 0);

        let tiny = "1/18446744073709551615".parse::<FeeSchedule>().unwrap();
        assert_eq!(tiny.fee_bps(), 9_999);
        assert_eq!(FeeSchedule::Custom { numerator: 5, denominator: 0 }.fee_bps(), 0);
    }

    #[test]
    fn test_after_swap_moves_reserves() {
        let pool = ReserveState::new(ether(10), ether(10));
        let (out, after) = pool.after_swap(ether(1000), FeeSchedule::ExchangeV1).unwrap();

        assert_eq!(out, U256::from(9_900_695_134_061_569_016u64));
        assert_eq!(after.asset_in, ether(1010));
        assert_eq!(after.asset_out, ether(10) - out);
        // the fee stays in the pool, so k grows
        assert!(after.invariant().unwrap() > pool.invariant().unwrap());
    }

    #[test]
    fn test_spot_price_and_inversion() {
        let pool = ReserveState::new(ether(100), ether(10));
        assert_eq!(pool.spot_price_wad().unwrap(), WAD / U256::from(10u64));
        assert_eq!(pool.inverted().spot_price_wad().unwrap(), ether(10));
        assert_eq!(pool.inverted().inverted(), pool);
    }

    #[test]
    fn test_quote_rejects_empty_pool() {
        let pool = ReserveState::new(U256::ZERO, ether(10));
        assert_eq!(pool.quote(ether(1), FeeSchedule::NoFee), Err(PricingError::InvalidReserve));
    }
}
