//! Oracle-manipulation simulator.
//!
//! Replays the dump / re-price / borrow sequence against reserve snapshots
//! only. Nothing here touches a ledger: each step is a calculator call on
//! the reserves produced by the previous one.

use alloy_primitives::U256;
use serde::Serialize;
use tracing::{debug, info};

use crate::lending::CollateralPolicy;
use crate::math;
use crate::pool::{FeeSchedule, ReserveState};
use crate::shared::errors::PricingError;
use crate::shared::types::{format_ether, Amount};

/// Inputs of one manipulation run.
///
/// `reserves` is oriented borrowed-asset in, collateral-asset out, which is
/// both the direction of the dump and of the lending pool's valuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManipulationPlan {
    pub name: String,
    pub reserves: ReserveState,
    pub fee: FeeSchedule,
    pub policy: CollateralPolicy,
    /// Borrowed-asset amount sold into the oracle pool
    pub dump_amount: Amount,
    /// Amount the attacker wants to borrow from the lending pool
    pub borrow_amount: Amount,
    /// Collateral held before the dump
    pub collateral_budget: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManipulationOutcome {
    pub reserves_before: ReserveState,
    pub reserves_after: ReserveState,
    pub swap_proceeds: Amount,
    pub price_impact_bps: u64,
    pub deposit_before: Amount,
    pub deposit_after: Amount,
    pub collateral_available: Amount,
    pub max_borrowable_after: Amount,
    pub drains_pool: bool,
}

impl ManipulationOutcome {
    /// How many times cheaper the borrow became; `None` once the
    /// requirement has collapsed to zero.
    pub fn reduction_factor(&self) -> Option<U256> {
        if self.deposit_after.is_zero() {
            return None;
        }
        Some(self.deposit_before / self.deposit_after)
    }
}

pub fn simulate(plan: &ManipulationPlan) -> Result<ManipulationOutcome, PricingError> {
    info!("Simulating scenario '{}' ({} / fee {})", plan.name, plan.policy, plan.fee);
    debug!(
        "Reserves before: {} in / {} out",
        format_ether(plan.reserves.asset_in),
        format_ether(plan.reserves.asset_out)
    );

    let deposit_before = plan.policy.deposit_required(plan.borrow_amount, &plan.reserves)?;

    let (swap_proceeds, reserves_after) = plan.reserves.after_swap(plan.dump_amount, plan.fee)?;
    let price_impact_bps = math::price_impact_bps(&plan.reserves, &reserves_after)?;
    debug!(
        "Dumped {} for {}; reserves after: {} in / {} out",
        format_ether(plan.dump_amount),
        format_ether(swap_proceeds),
        format_ether(reserves_after.asset_in),
        format_ether(reserves_after.asset_out)
    );

    let deposit_after = plan.policy.deposit_required(plan.borrow_amount, &reserves_after)?;
    let collateral_available = plan
        .collateral_budget
        .checked_add(swap_proceeds)
        .ok_or(PricingError::Overflow("collateral available"))?;
    let max_borrowable_after =
        plan.policy
            .max_borrowable(collateral_available, &reserves_after, plan.borrow_amount)?;
    let drains_pool = deposit_after <= collateral_available;

    info!(
        "Deposit for {}: {} before, {} after (available {})",
        format_ether(plan.borrow_amount),
        format_ether(deposit_before),
        format_ether(deposit_after),
        format_ether(collateral_available)
    );

    Ok(ManipulationOutcome {
        reserves_before: plan.reserves,
        reserves_after,
        swap_proceeds,
        price_impact_bps,
        deposit_before,
        deposit_after,
        collateral_available,
        max_borrowable_after,
        drains_pool,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::ether;

    fn exchange_v1_plan() -> ManipulationPlan {
        ManipulationPlan {
            name: "exchange-v1".to_string(),
            reserves: ReserveState::new(ether(10), ether(10)),
            fee: FeeSchedule::ExchangeV1,
            policy: CollateralPolicy::EXCHANGE_V1,
            dump_amount: ether(1_000),
            borrow_amount: ether(100_000),
            collateral_budget: ether(25),
        }
    }

    fn pair_v2_plan() -> ManipulationPlan {
        ManipulationPlan {
            name: "pair-v2".to_string(),
            reserves: ReserveState::new(ether(100), ether(10)),
            fee: FeeSchedule::PairV2,
            policy: CollateralPolicy::PAIR_V2,
            dump_amount: ether(10_000),
            borrow_amount: ether(1_000_000),
            collateral_budget: ether(20),
        }
    }

    #[test]
    fn test_exchange_v1_dump_drains_pool() {
        let outcome = simulate(&exchange_v1_plan()).unwrap();

        assert_eq!(outcome.deposit_before, ether(200_000));
        assert_eq!(outcome.swap_proceeds, U256::from(9_900_695_134_061_569_016u64));
        assert_eq!(outcome.deposit_after, U256::from(19_664_329_888_798_200_000u128));
        assert!(outcome.drains_pool);
        assert_eq!(outcome.max_borrowable_after, ether(100_000));
        // orders of magnitude cheaper
        assert!(outcome.reduction_factor().unwrap() >= U256::from(10_000u64));
    }

    #[test]
    fn test_pair_v2_dump_drains_pool() {
        let outcome = simulate(&pair_v2_plan()).unwrap();

        assert_eq!(outcome.deposit_before, ether(300_000));
        assert_eq!(outcome.deposit_after, U256::from(29_496_494_833_197_321_980u128));
        assert_eq!(outcome.collateral_available, ether(20) + outcome.swap_proceeds);
        assert!(outcome.drains_pool);
        assert_eq!(outcome.reserves_after.asset_in, ether(10_100));
        assert_eq!(outcome.price_impact_bps, 10_000);
    }

    #[test]
    fn test_small_dump_leaves_pool_safe() {
        let plan = ManipulationPlan {
            dump_amount: ether(1),
            ..exchange_v1_plan()
        };
        let outcome = simulate(&plan).unwrap();

        assert!(!outcome.drains_pool);
        assert!(outcome.max_borrowable_after < plan.borrow_amount);
        assert!(outcome.deposit_after < outcome.deposit_before);
        // 10/10 pool, 1 token in with the 0.3% fee: spot moves to ~0.8266
        assert_eq!(outcome.price_impact_bps, 1_734);
    }

    #[test]
    fn test_zero_dump_changes_nothing() {
        let plan = ManipulationPlan {
            dump_amount: U256::ZERO,
            ..pair_v2_plan()
        };
        let outcome = simulate(&plan).unwrap();

        assert_eq!(outcome.reserves_after, outcome.reserves_before);
        assert_eq!(outcome.deposit_after, outcome.deposit_before);
        assert_eq!(outcome.reduction_factor(), Some(U256::from(1u64)));
        assert_eq!(outcome.price_impact_bps, 0);
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        let plan = ManipulationPlan {
            reserves: ReserveState::new(U256::ZERO, ether(10)),
            ..pair_v2_plan()
        };
        assert_eq!(simulate(&plan), Err(PricingError::InvalidReserve));
    }
}
