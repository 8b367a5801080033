pub mod error;
pub mod records;
pub mod types;
pub mod units;

#[cfg(feature = "pricing")]
pub mod pricing;

#[cfg(feature = "forecast")]
pub mod forecast;

pub use error::ShopcalcError;
pub use types::*;

/// Standard result type for all shopcalc operations
pub type ShopcalcResult<T> = Result<T, ShopcalcError>;
