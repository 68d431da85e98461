use std::time::Duration;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

const DEFAULT_BASE_CURRENCY: &str = "USD";
const DEFAULT_CACHE_TTL_SECS: u64 = 300; // 5 minutes
const DEFAULT_PLACEHOLDER_NIGHTLY_RATE: f64 = 150.0;
const DEFAULT_MEAL_RATE: f64 = 45.0;
const DEFAULT_SERVICE_FEE_RATE: f64 = 0.05; // 5%
const DEFAULT_SERVICE_FEE_MINIMUM: f64 = 50.0;
const DEFAULT_MAX_TRIP_DAYS: i64 = 366;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 7200; // 2 hours

/// Rates and limits used by the standard cost engine and the calculator.
/// Monetary values are in the base currency.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub base_currency: String,
    pub cache_ttl: Duration,
    /// Reject unknown currency codes instead of treating them as the base currency.
    pub strict_currencies: bool,
    /// Nightly rate used for trip days without a selected accommodation.
    pub placeholder_nightly_rate: f64,
    /// Daily meal budget per adult; children are charged half.
    pub meal_rate: f64,
    pub service_fee_rate: f64,
    pub service_fee_minimum: f64,
    pub max_trip_days: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            strict_currencies: false,
            placeholder_nightly_rate: DEFAULT_PLACEHOLDER_NIGHTLY_RATE,
            meal_rate: DEFAULT_MEAL_RATE,
            service_fee_rate: DEFAULT_SERVICE_FEE_RATE,
            service_fee_minimum: DEFAULT_SERVICE_FEE_MINIMUM,
            max_trip_days: DEFAULT_MAX_TRIP_DAYS,
        }
    }
}

impl PricingConfig {
    /// Create the pricing config from environment variables or use defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            base_currency: std::env::var("PRICING_BASE_CURRENCY")
                .map(|code| code.trim().to_uppercase())
                .unwrap_or(defaults.base_currency),
            cache_ttl: env_parse("PRICING_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            strict_currencies: env_parse("PRICING_STRICT_CURRENCIES")
                .unwrap_or(defaults.strict_currencies),
            placeholder_nightly_rate: env_parse("PRICING_PLACEHOLDER_NIGHTLY_RATE")
                .unwrap_or(defaults.placeholder_nightly_rate),
            meal_rate: env_parse("PRICING_MEAL_RATE").unwrap_or(defaults.meal_rate),
            service_fee_rate: env_parse("PRICING_SERVICE_FEE_RATE")
                .unwrap_or(defaults.service_fee_rate),
            service_fee_minimum: env_parse("PRICING_SERVICE_FEE_MINIMUM")
                .unwrap_or(defaults.service_fee_minimum),
            max_trip_days: env_parse("PRICING_MAX_TRIP_DAYS").unwrap_or(defaults.max_trip_days),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub sweep_interval: Duration,
    pub session_idle_ttl: Duration,
    pub pricing: PricingConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| HOST.to_string()),
            port: env_parse("PORT").unwrap_or(PORT),
            sweep_interval: Duration::from_secs(
                env_parse("CACHE_SWEEP_INTERVAL_SECS").unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
            ),
            session_idle_ttl: Duration::from_secs(
                env_parse("SESSION_IDLE_TTL_SECS").unwrap_or(DEFAULT_SESSION_IDLE_TTL_SECS),
            ),
            pricing: PricingConfig::from_env(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_defaults() {
        let config = PricingConfig::default();
        assert_eq!(config.base_currency, "USD");
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(!config.strict_currencies);
        assert_eq!(config.service_fee_minimum, 50.0);
    }
}
