use serde::{Deserialize, Serialize};

/// An amount tagged with a currency code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(0.0, currency)
    }
}

/// One row of the static currency table.
///
/// `rate` is the value of one unit of the base currency expressed in this
/// currency, so the base currency itself always has a rate of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyOption {
    pub code: String,
    pub symbol: String,
    pub name: String,
    pub rate: f64,
    /// Minor units shown and rounded to (0 for JPY and KRW).
    pub decimals: u32,
}

impl CurrencyOption {
    pub fn new(code: &str, symbol: &str, name: &str, rate: f64, decimals: u32) -> Self {
        Self {
            code: code.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            rate,
            decimals,
        }
    }
}

/// Round to the given number of decimal places.
pub fn round_to(amount: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (amount * factor).round() / factor
}
