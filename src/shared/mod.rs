//! Shared components - amount types, unit conversions and errors

pub mod types;
pub mod errors;
