// src/report.rs
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::scenario::{ManipulationOutcome, ManipulationPlan};
use crate::shared::types::{format_ether, Amount};

#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub policy: String,
    pub fee: String,
    pub fee_bps: u64,

    pub reserves_before: ReserveDetails,
    pub reserves_after: ReserveDetails,

    pub dump: AmountDetails,
    pub swap_proceeds: AmountDetails,
    pub price_impact_bps: u64,

    pub borrow: AmountDetails,
    pub deposit_before: AmountDetails,
    pub deposit_after: AmountDetails,
    pub collateral_available: AmountDetails,
    pub max_borrowable_after: AmountDetails,
    /// `None` when the requirement fell to zero
    pub reduction_factor: Option<String>,
    pub drains_pool: bool,

    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReserveDetails {
    pub token: AmountDetails,
    pub collateral: AmountDetails,
}

#[derive(Debug, Serialize)]
pub struct AmountDetails {
    pub wei: String,
    pub ether: String,
}

impl From<Amount> for AmountDetails {
    fn from(amount: Amount) -> Self {
        Self {
            wei: amount.to_string(),
            ether: format_ether(amount),
        }
    }
}

impl ScenarioReport {
    pub fn new(plan: &ManipulationPlan, outcome: &ManipulationOutcome) -> Self {
        Self {
            scenario: plan.name.clone(),
            policy: plan.policy.to_string(),
            fee: plan.fee.to_string(),
            fee_bps: plan.fee.fee_bps(),
            reserves_before: ReserveDetails {
                token: outcome.reserves_before.asset_in.into(),
                collateral: outcome.reserves_before.asset_out.into(),
            },
            reserves_after: ReserveDetails {
                token: outcome.reserves_after.asset_in.into(),
                collateral: outcome.reserves_after.asset_out.into(),
            },
            dump: plan.dump_amount.into(),
            swap_proceeds: outcome.swap_proceeds.into(),
            price_impact_bps: outcome.price_impact_bps,
            borrow: plan.borrow_amount.into(),
            deposit_before: outcome.deposit_before.into(),
            deposit_after: outcome.deposit_after.into(),
            collateral_available: outcome.collateral_available.into(),
            max_borrowable_after: outcome.max_borrowable_after.into(),
            reduction_factor: outcome.reduction_factor().map(|f| f.to_string()),
            drains_pool: outcome.drains_pool,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "Scenario {} ({}, fee {} = {} bps)",
                self.scenario, self.policy, self.fee, self.fee_bps
            ),
            format!(
                "  reserves  {} / {} -> {} / {}",
                self.reserves_before.token.ether,
                self.reserves_before.collateral.ether,
                self.reserves_after.token.ether,
                self.reserves_after.collateral.ether
            ),
            format!(
                "  dump      {} for {} (impact {} bps)",
                self.dump.ether, self.swap_proceeds.ether, self.price_impact_bps
            ),
            format!(
                "  deposit   {} -> {} for borrowing {}",
                self.deposit_before.ether, self.deposit_after.ether, self.borrow.ether
            ),
        ];
        if let Some(factor) = &self.reduction_factor {
            lines.push(format!("  cheaper   {}x", factor));
        }
        lines.push(format!(
            "  available {} -> {}",
            self.collateral_available.ether,
            if self.drains_pool {
                "pool drained".to_string()
            } else {
                format!("max borrow {}", self.max_borrowable_after.ether)
            }
        ));
        lines
    }
}
