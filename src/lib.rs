//! Reserve Oracle - constant-product pricing and lending-pool collateral valuation
//! Prices are read from pool reserve snapshots supplied by the caller

pub mod math;
pub mod pool;
pub mod lending;
pub mod scenario;
pub mod report;
pub mod config;
pub mod shared;

// Re-export main types for convenience
pub use math::{quote_input_for_output, quote_output_for_input, required_collateral, spot_quote};
pub use pool::{FeeSchedule, ReserveState};
pub use lending::{CollateralPolicy, ValuationScheme};
pub use scenario::{simulate, ManipulationOutcome, ManipulationPlan};
pub use shared::errors::PricingError;
