//! Optional YAML business profile. Every field is a default that an
//! input document or an explicit flag can override.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::error::Error;
use std::{fs, path::Path};
use tracing::debug;

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct BusinessProfile {
    pub business_name: Option<String>,
    pub wholesale_price_per_ounce: Option<Decimal>,
    pub target_profit_per_month: Option<Decimal>,
    pub operating_expenses: Option<Decimal>,
    pub markup_percentages: Option<Vec<u32>>,
    pub commission_rate: Option<Decimal>,
    /// Retail price per gram the forecast sells at
    pub retail_price_per_gram: Option<Decimal>,
    pub growth_rate: Option<Decimal>,
    pub forecast_months: Option<u32>,
}

impl BusinessProfile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read profile '{}': {}", path.display(), e))?;
        let profile: Self = serde_yaml::from_str(&s)
            .map_err(|e| format!("Failed to parse profile '{}': {}", path.display(), e))?;
        debug!(
            path = %path.display(),
            business = profile.business_name.as_deref().unwrap_or("-"),
            "Loaded business profile"
        );
        Ok(profile)
    }

    /// An empty profile when no path was given.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_partial_profile() {
        let yaml = "business_name: Corner Roastery\nwholesale_price_per_ounce: \"12.5\"\nmarkup_percentages: [50, 100]\n";
        let profile: BusinessProfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(profile.wholesale_price_per_ounce, Some(dec!(12.5)));
        assert_eq!(profile.markup_percentages, Some(vec![50, 100]));
        assert!(profile.operating_expenses.is_none());
    }

    #[test]
    fn test_missing_profile_is_an_error() {
        assert!(BusinessProfile::load("/nonexistent/shopcalc-profile.yaml").is_err());
        assert!(BusinessProfile::load_optional(None).is_ok());
    }
}
