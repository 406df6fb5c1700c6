//! Collateral policies of lending pools that price collateral off a
//! constant-product pool's reserves

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::math;
use crate::pool::{FeeSchedule, ReserveState};
use crate::shared::errors::PricingError;
use crate::shared::types::{Amount, WAD};

/// How a lending pool turns an oracle pool's reserves into a collateral value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValuationScheme {
    /// Per-unit price rounded to 1e18 first, then multiplied by the amount
    UnitPrice,
    /// Whole amount quoted at the reserve ratio
    SpotQuote,
    /// What the amount would actually fetch when sold through the pool
    SwapOutput { fee: FeeSchedule },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyMultiplier {
    pub numerator: u64,
    pub denominator: u64,
}

impl fmt::Display for SafetyMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralPolicy {
    pub valuation: ValuationScheme,
    pub multiplier: SafetyMultiplier,
}

impl CollateralPolicy {
    /// Lending pool backed by an exchange-v1 pool: 2x the rounded unit price
    pub const EXCHANGE_V1: Self = Self {
        valuation: ValuationScheme::UnitPrice,
        multiplier: SafetyMultiplier { numerator: 2, denominator: 1 },
    };

    /// Lending pool backed by a pair-v2 pool: 3x the reserve-ratio quote
    pub const PAIR_V2: Self = Self {
        valuation: ValuationScheme::SpotQuote,
        multiplier: SafetyMultiplier { numerator: 3, denominator: 1 },
    };

    pub fn new(valuation: ValuationScheme, numerator: u64, denominator: u64) -> Result<Self, PricingError> {
        if denominator == 0 {
            return Err(PricingError::InvalidMultiplier { numerator, denominator });
        }
        if let ValuationScheme::SwapOutput { fee } = valuation {
            fee.validate()?;
        }
        Ok(Self {
            valuation,
            multiplier: SafetyMultiplier { numerator, denominator },
        })
    }

    /// Collateral required to borrow `borrow_amount`, given the oracle pool's
    /// reserves oriented borrowed-asset in, collateral-asset out.
    pub fn deposit_required(&self, borrow_amount: Amount, reserves: &ReserveState) -> Result<Amount, PricingError> {
        let SafetyMultiplier { numerator, denominator } = self.multiplier;
        if denominator == 0 {
            return Err(PricingError::InvalidMultiplier { numerator, denominator });
        }

        match self.valuation {
            ValuationScheme::SpotQuote => {
                math::required_collateral(borrow_amount, reserves, numerator, denominator)
            }
            ValuationScheme::UnitPrice => {
                let price = reserves.spot_price_wad()?;
                math::mul_div_ratio(borrow_amount, price, numerator, WAD, denominator, "collateral")
            }
            ValuationScheme::SwapOutput { fee } => {
                let proceeds = reserves.quote(borrow_amount, fee)?;
                math::mul_div(proceeds, U256::from(numerator), U256::from(denominator), "collateral")
            }
        }
    }

    /// Largest borrow in `[0, cap]` whose deposit fits within `budget`.
    ///
    /// A deposit too large to represent never fits.
    pub fn max_borrowable(
        &self,
        budget: Amount,
        reserves: &ReserveState,
        cap: Amount,
    ) -> Result<Amount, PricingError> {
        let fits = |borrow: Amount| match self.deposit_required(borrow, reserves) {
            Ok(deposit) => Ok(deposit <= budget),
            Err(PricingError::Overflow(_)) => Ok(false),
            Err(e) => Err(e),
        };

        if fits(cap)? {
            return Ok(cap);
        }
        // deposit(lo) <= budget < deposit(hi)
        let (mut lo, mut hi) = (U256::ZERO, cap);
        let one = U256::from(1u64);
        while hi - lo > one {
            let mid = lo + (hi - lo) / U256::from(2u64);
            if fits(mid)? {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }
}

impl fmt::Display for CollateralPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.valuation {
            ValuationScheme::UnitPrice => write!(f, "unit-price x{}", self.multiplier),
            ValuationScheme::SpotQuote => write!(f, "spot-quote x{}", self.multiplier),
            ValuationScheme::SwapOutput { fee } => write!(f, "swap-output({}) x{}", fee, self.multiplier),
        }
    }
}

/// Names accepted by `CollateralPolicy::from_str`
pub const POLICY_NAMES: &str = "exchange-v1 (alias v1) or pair-v2 (alias v2)";

impl FromStr for CollateralPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exchange-v1" | "exchange_v1" | "v1" => Ok(CollateralPolicy::EXCHANGE_V1),
            "pair-v2" | "pair_v2" | "v2" => Ok(CollateralPolicy::PAIR_V2),
            _ => Err(anyhow::anyhow!("Unknown collateral policy: {} (expected {})", s, POLICY_NAMES)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::ether;

    fn exchange_pool() -> ReserveState {
        ReserveState::new(ether(10), ether(10))
    }

    fn pair_pool() -> ReserveState {
        ReserveState::new(ether(100), ether(10))
    }

    #[test]
    fn test_exchange_v1_initial_deposits() {
        let policy = CollateralPolicy::EXCHANGE_V1;
        assert_eq!(policy.deposit_required(ether(1), &exchange_pool()).unwrap(), ether(2));
        assert_eq!(policy.deposit_required(ether(100_000), &exchange_pool()).unwrap(), ether(200_000));
    }

    #[test]
    fn test_pair_v2_initial_deposits() {
        let policy = CollateralPolicy::PAIR_V2;
        assert_eq!(
            policy.deposit_required(ether(1), &pair_pool()).unwrap(),
            U256::from(300_000_000_000_000_000u64)
        );
        assert_eq!(policy.deposit_required(ether(1_000_000), &pair_pool()).unwrap(), ether(300_000));
    }

    #[test]
    fn test_unit_price_rounds_price_first() {
        let (_, dumped) = exchange_pool().after_swap(ether(1000), FeeSchedule::ExchangeV1).unwrap();
        assert_eq!(dumped.spot_price_wad().unwrap(), U256::from(98_321_649_443_991u64));

        let unit = CollateralPolicy::EXCHANGE_V1.deposit_required(ether(100_000), &dumped).unwrap();
        assert_eq!(unit, U256::from(19_664_329_888_798_200_000u128));

        let spot = CollateralPolicy::new(ValuationScheme::SpotQuote, 2, 1).unwrap();
        let spot = spot.deposit_required(ether(100_000), &dumped).unwrap();
        assert!(spot >= unit);
    }

    #[test]
    fn test_swap_output_valuation() {
        let policy = CollateralPolicy::new(ValuationScheme::SwapOutput { fee: FeeSchedule::PairV2 }, 2, 1).unwrap();
        let deposit = policy.deposit_required(ether(1), &exchange_pool()).unwrap();
        assert_eq!(deposit, U256::from(2 * 906_610_893_880_149_131u64));
    }

    #[test]
    fn test_invalid_policies() {
        assert!(CollateralPolicy::new(ValuationScheme::SpotQuote, 2, 0).is_err());
        let bad_fee = ValuationScheme::SwapOutput { fee: FeeSchedule::Custom { numerator: 0, denominator: 1000 } };
        assert!(CollateralPolicy::new(bad_fee, 2, 1).is_err());
        assert_eq!(
            CollateralPolicy::EXCHANGE_V1.deposit_required(ether(1), &ReserveState::new(U256::ZERO, ether(1))),
            Err(PricingError::InvalidReserve)
        );
    }

    #[test]
    fn test_max_borrowable() {
        let policy = CollateralPolicy::EXCHANGE_V1;
        // 2 eth per token at 10/10 reserves
        let max = policy.max_borrowable(ether(25), &exchange_pool(), ether(100_000)).unwrap();
        assert_eq!(max, ether(25) / U256::from(2u64));
        assert!(policy.deposit_required(max, &exchange_pool()).unwrap() <= ether(25));
        assert!(policy.deposit_required(max + U256::from(1u64), &exchange_pool()).unwrap() > ether(25));

        let all = policy.max_borrowable(ether(300_000), &exchange_pool(), ether(100_000)).unwrap();
        assert_eq!(all, ether(100_000));

        assert_eq!(policy.max_borrowable(U256::ZERO, &exchange_pool(), ether(1)).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_max_borrowable_searches_past_unrepresentable_deposits() {
        let policy = CollateralPolicy::PAIR_V2;
        let dust = ReserveState::new(U256::from(1u64), U256::from(1u64));
        assert!(matches!(
            policy.deposit_required(U256::MAX, &dust),
            Err(PricingError::Overflow(_))
        ));

        let max = policy.max_borrowable(U256::from(300u64), &dust, U256::MAX).unwrap();
        assert_eq!(max, U256::from(100u64));
    }

    #[test]
    fn test_unit_price_wide_borrow() {
        // price 1e18 on a 10/10 pool; borrow * price alone exceeds 256 bits
        let borrow = U256::from(1u64) << 200usize;
        let deposit = CollateralPolicy::EXCHANGE_V1.deposit_required(borrow, &exchange_pool()).unwrap();
        assert_eq!(deposit, borrow * U256::from(2u64));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("exchange-v1".parse::<CollateralPolicy>().unwrap(), CollateralPolicy::EXCHANGE_V1);
        assert_eq!("pair-v2".parse::<CollateralPolicy>().unwrap(), CollateralPolicy::PAIR_V2);
        assert_eq!("v1".parse::<CollateralPolicy>().unwrap(), CollateralPolicy::EXCHANGE_V1);
        assert!("v3".parse::<CollateralPolicy>().is_err());
        // "none" names a fee schedule, not a lending pool
        let err = "none".parse::<CollateralPolicy>().unwrap_err();
        assert!(err.to_string().contains(POLICY_NAMES));
        assert_eq!(CollateralPolicy::PAIR_V2.to_string(), "spot-quote x3/1");
    }
}
