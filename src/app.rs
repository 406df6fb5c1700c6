// src/app.rs
use anyhow::{Context, Result};
use tracing::{info, warn};

use reserve_oracle::config::Config;
use reserve_oracle::lending::CollateralPolicy;
use reserve_oracle::math;
use reserve_oracle::pool::{FeeSchedule, ReserveState};
use reserve_oracle::report::ScenarioReport;
use reserve_oracle::scenario::{self, ManipulationPlan};
use reserve_oracle::shared::types::{format_ether, parse_amount, Amount};

fn amount(label: &str, value: &str) -> Result<Amount> {
    parse_amount(value).with_context(|| format!("--{}", label))
}

pub fn quote(amount_in: &str, reserve_in: &str, reserve_out: &str, fee: &str) -> Result<()> {
    let amount_in = amount("amount-in", amount_in)?;
    let reserves = ReserveState::new(amount("reserve-in", reserve_in)?, amount("reserve-out", reserve_out)?);
    let fee: FeeSchedule = fee.parse()?;

    let (out, after) = reserves.after_swap(amount_in, fee)?;
    let impact = math::price_impact_bps(&reserves, &after)?;
    info!("Quoted {} in -> {} out (fee {}, impact {} bps)", format_ether(amount_in), format_ether(out), fee, impact);

    println!("{}", out);
    Ok(())
}

pub fn quote_input(amount_out: &str, reserve_in: &str, reserve_out: &str, fee: &str) -> Result<()> {
    let amount_out = amount("amount-out", amount_out)?;
    let reserve_in = amount("reserve-in", reserve_in)?;
    let reserve_out = amount("reserve-out", reserve_out)?;
    let fee: FeeSchedule = fee.parse()?;

    let needed = math::quote_input_for_output(amount_out, reserve_in, reserve_out, fee.numerator(), fee.denominator())?;
    info!("Buying {} out needs {} in (fee {})", format_ether(amount_out), format_ether(needed), fee);

    println!("{}", needed);
    Ok(())
}

pub fn collateral(borrow: &str, token_reserve: &str, collateral_reserve: &str, policy: &str) -> Result<()> {
    let borrow = amount("borrow", borrow)?;
    let reserves = ReserveState::new(
        amount("token-reserve", token_reserve)?,
        amount("collateral-reserve", collateral_reserve)?,
    );
    let policy: CollateralPolicy = policy.parse()?;

    let deposit = policy.deposit_required(borrow, &reserves)?;
    info!("Borrowing {} requires {} collateral ({})", format_ether(borrow), format_ether(deposit), policy);

    println!("{}", deposit);
    Ok(())
}

pub fn simulate(config: &Config, only: Option<&str>, json: bool) -> Result<()> {
    let plans: Vec<ManipulationPlan> = match only {
        Some(name) => vec![ManipulationPlan::try_from(config.scenario(name)?.clone())?],
        None => config.plans()?,
    };
    if plans.is_empty() {
        warn!("No scenarios configured");
        return Ok(());
    }

    for plan in &plans {
        let outcome = scenario::simulate(plan).with_context(|| format!("scenario '{}'", plan.name))?;
        let report = ScenarioReport::new(plan, &outcome);

        if json {
            println!("{}", report.to_json_pretty()?);
        } else {
            for line in report.summary_lines() {
                println!("{}", line);
            }
        }

        if outcome.drains_pool {
            info!("✅ Scenario '{}' drains the lending pool", plan.name);
        } else {
            warn!("❌ Scenario '{}' cannot cover the manipulated deposit", plan.name);
        }
    }
    Ok(())
}
