use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::lending::CollateralPolicy;
use crate::pool::{FeeSchedule, ReserveState};
use crate::scenario::ManipulationPlan;
use crate::shared::errors::AppError;
use crate::shared::types::parse_amount;

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingCfg {
    pub filter: Option<String>,
}

/// One `[[scenario]]` table. Amounts are textual (`"10 ether"`, `"0x..."`).
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioCfg {
    pub name: String,
    /// Oracle pool reserve of the borrowed asset
    pub token_reserve: String,
    /// Oracle pool reserve of the collateral asset
    pub collateral_reserve: String,
    pub fee: String,
    pub policy: String,
    pub dump_amount: String,
    pub borrow_amount: String,
    pub collateral_budget: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub logging: Option<LoggingCfg>,
    #[serde(default, rename = "scenario")]
    pub scenarios: Vec<ScenarioCfg>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {}", path.as_ref().display()))?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parse Config.toml")?;
        Ok(cfg)
    }

    pub fn log_filter(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.filter.as_deref())
    }

    pub fn scenario(&self, name: &str) -> Result<&ScenarioCfg, AppError> {
        self.scenarios
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| AppError::ScenarioNotFound(name.to_string()))
    }

    pub fn plans(&self) -> Result<Vec<ManipulationPlan>> {
        self.scenarios
            .iter()
            .map(|s| ManipulationPlan::try_from(s.clone()))
            .collect()
    }
}

impl TryFrom<ScenarioCfg> for ManipulationPlan {
    type Error = anyhow::Error;

    fn try_from(cfg: ScenarioCfg) -> Result<Self> {
        let field = |label: &str, value: &str| {
            parse_amount(value)
                .map_err(|e| AppError::ConfigError(format!("scenario '{}' {}: {}", cfg.name, label, e)))
        };

        let reserves = ReserveState::new(
            field("token_reserve", &cfg.token_reserve)?,
            field("collateral_reserve", &cfg.collateral_reserve)?,
        );
        let dump_amount = field("dump_amount", &cfg.dump_amount)?;
        let borrow_amount = field("borrow_amount", &cfg.borrow_amount)?;
        let collateral_budget = field("collateral_budget", &cfg.collateral_budget)?;
        let fee: FeeSchedule = cfg
            .fee
            .parse()
            .with_context(|| format!("scenario '{}' fee", cfg.name))?;
        let policy: CollateralPolicy = cfg
            .policy
            .parse()
            .with_context(|| format!("scenario '{}' policy", cfg.name))?;

        Ok(ManipulationPlan {
            name: cfg.name,
            reserves,
            fee,
            policy,
            dump_amount,
            borrow_amount,
            collateral_budget,
        })
    }
}
