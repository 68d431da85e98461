//! Currency Service
//!
//! Static conversion table used by every pricing calculation. Rates are
//! expressed as the value of one unit of the base currency, so conversions
//! always go through the base: `amount / rate[from] * rate[to]`.
//!
//! Unknown codes are treated as the base currency (rate 1) unless the table
//! was built in strict mode, in which case they are rejected.

use crate::error::{CostError, PricingError};
use crate::models::money::{round_to, CurrencyOption, Money};

const FALLBACK_BASE: &str = "USD";
const FALLBACK_DECIMALS: u32 = 2;

/// Rates relative to USD.
pub fn default_options() -> Vec<CurrencyOption> {
    vec![
        CurrencyOption::new("USD", "$", "US Dollar", 1.0, 2),
        CurrencyOption::new("EUR", "€", "Euro", 0.85, 2),
        CurrencyOption::new("GBP", "£", "British Pound", 0.73, 2),
        CurrencyOption::new("JPY", "¥", "Japanese Yen", 110.0, 0),
        CurrencyOption::new("CAD", "C$", "Canadian Dollar", 1.25, 2),
        CurrencyOption::new("AUD", "A$", "Australian Dollar", 1.35, 2),
        CurrencyOption::new("CHF", "CHF ", "Swiss Franc", 0.92, 2),
        CurrencyOption::new("CNY", "¥", "Chinese Yuan", 6.45, 2),
        CurrencyOption::new("MXN", "MX$", "Mexican Peso", 20.0, 2),
        CurrencyOption::new("KRW", "₩", "South Korean Won", 1180.0, 0),
    ]
}

#[derive(Debug, Clone)]
pub struct CurrencyTable {
    base: String,
    options: Vec<CurrencyOption>,
    strict: bool,
}

impl CurrencyTable {
    pub fn new(base_currency: &str, strict: bool) -> Self {
        Self::with_options(base_currency, default_options(), strict)
    }

    /// Build a table from arbitrary options, rebasing the rates so that
    /// `base_currency` ends up with a rate of exactly 1.
    pub fn with_options(base_currency: &str, options: Vec<CurrencyOption>, strict: bool) -> Self {
        let requested = base_currency.trim().to_uppercase();
        let base_rate = options
            .iter()
            .find(|option| option.code == requested)
            .map(|option| option.rate);

        let (base, base_rate) = match base_rate {
            Some(rate) if rate > 0.0 => (requested, rate),
            _ => {
                log::warn!(
                    "Base currency {} is not in the currency table, falling back to {}",
                    requested,
                    FALLBACK_BASE
                );
                let rate = options
                    .iter()
                    .find(|option| option.code == FALLBACK_BASE)
                    .map(|option| option.rate)
                    .unwrap_or(1.0);
                (FALLBACK_BASE.to_string(), rate)
            }
        };

        let options = options
            .into_iter()
            .map(|mut option| {
                option.rate /= base_rate;
                option
            })
            .collect();

        Self {
            base,
            options,
            strict,
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base
    }

    pub fn options(&self) -> &[CurrencyOption] {
        &self.options
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn find(&self, code: &str) -> Option<&CurrencyOption> {
        let code = code.trim();
        self.options
            .iter()
            .find(|option| option.code.eq_ignore_ascii_case(code))
    }

    /// Normalised (upper-case) code. Blank codes are always rejected, unknown
    /// ones only in strict mode.
    pub fn validate(&self, code: &str) -> Result<String, PricingError> {
        let normalized = code.trim().to_uppercase();
        self.rate(&normalized)
            .map(|_| normalized)
            .map_err(|_| PricingError::UnsupportedCurrency(code.to_string()))
    }

    fn rate(&self, code: &str) -> Result<f64, CostError> {
        if code.trim().is_empty() {
            return Err(CostError::UnsupportedCurrency(code.to_string()));
        }
        match self.find(code) {
            Some(option) => Ok(option.rate),
            None if self.strict => Err(CostError::UnsupportedCurrency(code.to_string())),
            None => {
                log::debug!("Unknown currency {}, using a 1:1 rate against {}", code, self.base);
                Ok(1.0)
            }
        }
    }

    pub fn decimals(&self, code: &str) -> u32 {
        self.find(code)
            .map(|option| option.decimals)
            .unwrap_or(FALLBACK_DECIMALS)
    }

    pub fn round(&self, amount: f64, code: &str) -> f64 {
        round_to(amount, self.decimals(code))
    }

    /// Convert `amount` into `target`, rounded to the target's minor units.
    /// Same-currency conversions return the amount untouched.
    pub fn convert(&self, amount: &Money, target: &str) -> Result<Money, PricingError> {
        let convert = || -> Result<Money, CostError> {
            let base = self.to_base(amount)?;
            self.from_base(base, target)
        };

        if target.trim().is_empty() {
            return Err(PricingError::UnsupportedCurrency(target.to_string()));
        }
        if amount.currency.trim().eq_ignore_ascii_case(target.trim()) {
            return Ok(amount.clone());
        }

        convert().map_err(|err| match err {
            CostError::UnsupportedCurrency(code) => PricingError::UnsupportedCurrency(code),
            other => PricingError::CalculationFailed(other),
        })
    }

    /// Unrounded value of `amount` in the base currency.
    pub fn to_base(&self, amount: &Money) -> Result<f64, CostError> {
        Ok(amount.amount / self.rate(&amount.currency)?)
    }

    /// Convert a base-currency amount into `target`, always rounding.
    pub fn from_base(&self, amount: f64, target: &str) -> Result<Money, CostError> {
        let code = target.trim().to_uppercase();
        let converted = amount * self.rate(&code)?;
        Ok(Money::new(self.round(converted, &code), code))
    }

    /// Display string such as `€100.00`, `¥118` or `-$150.00`.
    pub fn format(&self, money: &Money) -> String {
        let decimals = self.decimals(&money.currency) as usize;
        let sign = if money.amount < 0.0 { "-" } else { "" };
        match self.find(&money.currency) {
            Some(option) => format!(
                "{}{}{:.*}",
                sign,
                option.symbol,
                decimals,
                money.amount.abs()
            ),
            None => format!("{}{:.*} {}", sign, decimals, money.amount.abs(), money.currency),
        }
    }

    /// Like [`format`](Self::format) but always shows the sign, for deltas.
    pub fn format_signed(&self, money: &Money) -> String {
        if money.amount > 0.0 {
            format!("+{}", self.format(money))
        } else {
            self.format(money)
        }
    }
}

impl Default for CurrencyTable {
    fn default() -> Self {
        Self::new(FALLBACK_BASE, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_currency_is_untouched() {
        let table = CurrencyTable::default();
        let amount = Money::new(10.005, "EUR");
        assert_eq!(table.convert(&amount, "EUR").unwrap(), amount);
    }

    #[test]
    fn test_convert_through_base() {
        let table = CurrencyTable::default();
        let converted = table.convert(&Money::new(100.0, "EUR"), "USD").unwrap();
        assert_eq!(converted, Money::new(117.65, "USD"));

        let converted = table.convert(&Money::new(100.0, "EUR"), "GBP").unwrap();
        // 100 / 0.85 * 0.73
        assert_eq!(converted.amount, 85.88);
    }

    #[test]
    fn test_zero_decimal_currency() {
        let table = CurrencyTable::default();
        let converted = table.convert(&Money::new(100.0, "EUR"), "JPY").unwrap();
        assert_eq!(converted.amount, 12941.0);
        assert_eq!(converted.currency, "JPY");
    }

    #[test]
    fn test_unknown_currency_is_permissive_by_default() {
        let table = CurrencyTable::default();
        let converted = table.convert(&Money::new(42.0, "XYZ"), "USD").unwrap();
        assert_eq!(converted.amount, 42.0);
    }

    #[test]
    fn test_blank_currency_is_rejected_even_when_permissive() {
        let table = CurrencyTable::default();
        assert!(matches!(table.validate(""), Err(PricingError::UnsupportedCurrency(_))));
        assert!(matches!(table.validate("   "), Err(PricingError::UnsupportedCurrency(_))));
        assert!(table.convert(&Money::new(10.0, ""), "USD").is_err());
        assert!(table.convert(&Money::new(10.0, "USD"), " ").is_err());
    }

    #[test]
    fn test_unknown_currency_in_strict_mode() {
        let table = CurrencyTable::new("USD", true);
        let result = table.convert(&Money::new(42.0, "XYZ"), "USD");
        assert!(matches!(result, Err(PricingError::UnsupportedCurrency(code)) if code == "XYZ"));
        assert!(table.validate("xyz").is_err());
        assert_eq!(table.validate("eur").unwrap(), "EUR");
    }

    #[test]
    fn test_round_trip_within_one_minor_unit() {
        let table = CurrencyTable::default();
        let eur_rate = table.find("EUR").unwrap().rate;

        for option in table.options() {
            let original = Money::new(table.round(1234.56, &option.code), option.code.clone());
            let there = table.convert(&original, "EUR").unwrap();
            let back = table.convert(&there, &option.code).unwrap();

            // EUR is rounded to cents on the way out, so allow one EUR cent
            // expressed in the original currency, plus that currency's own minor unit.
            let minor_unit = 10f64.powi(-(option.decimals as i32));
            let tolerance = 0.01 / eur_rate * option.rate + minor_unit;
            assert!(
                (back.amount - original.amount).abs() <= tolerance,
                "{} round trip drifted: {} -> {} -> {}",
                option.code,
                original.amount,
                there.amount,
                back.amount
            );
        }
    }

    #[test]
    fn test_rebased_table() {
        let table = CurrencyTable::new("EUR", false);
        assert_eq!(table.base_currency(), "EUR");
        assert_eq!(table.find("EUR").unwrap().rate, 1.0);
        let converted = table.convert(&Money::new(85.0, "EUR"), "USD").unwrap();
        assert_eq!(converted.amount, 100.0);
    }

    #[test]
    fn test_unknown_base_falls_back_to_usd() {
        let table = CurrencyTable::new("ZZZ", false);
        assert_eq!(table.base_currency(), "USD");
    }

    #[test]
    fn test_format() {
        let table = CurrencyTable::default();
        assert_eq!(table.format(&Money::new(100.0, "EUR")), "€100.00");
        assert_eq!(table.format(&Money::new(118.0, "JPY")), "¥118");
        assert_eq!(table.format(&Money::new(-150.0, "USD")), "-$150.00");
        assert_eq!(table.format_signed(&Money::new(20.0, "USD")), "+$20.00");
        assert_eq!(table.format(&Money::new(5.0, "XYZ")), "5.00 XYZ");
    }
}
