pub mod forecast;
pub mod pricing;
pub mod units;
