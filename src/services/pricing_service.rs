//! Pricing Service
//!
//! Real-time pricing for a planning session. A [`PricingCalculator`] lays the
//! selection out day by day, asks the cost engine for base-currency subtotals
//! and converts every figure once into the display currency.
//!
//! Results are cached per calculator for a fixed time-to-live, keyed by the
//! content of the selection, the trip context and the display currency. The
//! cache is owned by the calculator, which is owned by one planning session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;

use crate::config::PricingConfig;
use crate::error::{CostError, PricingError, Result};
use crate::models::money::Money;
use crate::models::pricing::{
    CategoryAmounts, CategoryBreakdown, DayPricing, PriceCategory, PricingUpdate,
};
use crate::models::selection::{SelectedItems, TripContext};
use crate::services::cost_engine::{ItineraryCostEngine, ItineraryPlan};
use crate::services::currency_service::CurrencyTable;

/// Deterministic key built from sorted item fingerprints, trip dates,
/// traveler counts and the display currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(selected: &SelectedItems, trip: &TripContext, currency: &str) -> Self {
        Self(format!(
            "{}|{}..{}|{}/{}/{}|{}",
            selected.fingerprints().join(","),
            trip.start_date,
            trip.end_date,
            trip.adults,
            trip.children,
            trip.infants,
            currency
        ))
    }
}

struct CacheEntry {
    update: PricingUpdate,
    created_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct PricingCalculator {
    currencies: Arc<CurrencyTable>,
    engine: Arc<dyn ItineraryCostEngine>,
    ttl: Duration,
    max_trip_days: i64,
    cache: HashMap<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl PricingCalculator {
    pub fn new(
        currencies: Arc<CurrencyTable>,
        engine: Arc<dyn ItineraryCostEngine>,
        config: &PricingConfig,
    ) -> Self {
        Self {
            currencies,
            engine,
            ttl: config.cache_ttl,
            max_trip_days: config.max_trip_days,
            cache: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Price the selection in `target_currency`, serving an unexpired cached
    /// result for identical input.
    pub fn calculate_pricing(
        &mut self,
        selected: &SelectedItems,
        trip: &TripContext,
        target_currency: &str,
    ) -> Result<PricingUpdate> {
        let currency = self.currencies.validate(target_currency)?;
        let key = CacheKey::new(selected, trip, &currency);

        if let Some(entry) = self.cache.get(&key) {
            if entry.created_at.elapsed() < self.ttl {
                self.hits += 1;
                log::debug!("Pricing cache hit ({} entries)", self.cache.len());
                return Ok(entry.update.clone());
            }
            log::debug!("Pricing cache entry expired, recalculating");
            self.cache.remove(&key);
        }
        self.misses += 1;

        let update = self.compute(selected, trip, &currency).map_err(|err| {
            log::warn!("Pricing calculation failed: {}", err);
            PricingError::CalculationFailed(err)
        })?;

        self.cache.insert(
            key,
            CacheEntry {
                update: update.clone(),
                created_at: Instant::now(),
            },
        );

        Ok(update)
    }

    fn compute(
        &self,
        selected: &SelectedItems,
        trip: &TripContext,
        currency: &str,
    ) -> std::result::Result<PricingUpdate, CostError> {
        let plan = ItineraryPlan::build(selected, trip, self.max_trip_days)?;
        let costs = self.engine.calculate(&plan)?;

        if costs.days.len() != plan.days.len() {
            return Err(CostError::Engine(format!(
                "expected {} priced days, got {}",
                plan.days.len(),
                costs.days.len()
            )));
        }

        let decimals = self.currencies.decimals(currency);
        let totals = costs.totals();

        // Convert once per figure, in minor units so both breakdown sums stay exact
        let mut trip_units = [0i64; 5];
        let mut day_units = vec![[0i64; 5]; costs.days.len()];
        for (c, category) in PriceCategory::ALL.iter().enumerate() {
            let converted = self.currencies.from_base(totals.get(*category), currency)?;
            trip_units[c] = to_units(converted.amount, decimals)?;

            for (d, day) in costs.days.iter().enumerate() {
                let converted = self.currencies.from_base(day.amounts.get(*category), currency)?;
                day_units[d][c] = to_units(converted.amount, decimals)?;
            }

            let mut column: Vec<i64> = day_units.iter().map(|day| day[c]).collect();
            reconcile(trip_units[c], &mut column)?;
            for (day, units) in day_units.iter_mut().zip(column) {
                day[c] = units;
            }
        }

        let by_day = costs
            .days
            .iter()
            .zip(&day_units)
            .map(|(day, units)| {
                let amounts = from_units(units, decimals);
                Ok(DayPricing {
                    date: day.date,
                    total: Money::new(from_unit(sum_units(units)?, decimals), currency),
                    breakdown: CategoryBreakdown::from_amounts(&amounts, currency),
                })
            })
            .collect::<std::result::Result<Vec<DayPricing>, CostError>>()?;

        let total = from_unit(sum_units(&trip_units)?, decimals);
        let per_person = self
            .currencies
            .round(total / trip.paying_travelers().max(1) as f64, currency);

        Ok(PricingUpdate {
            total: Money::new(total, currency),
            breakdown: CategoryBreakdown::from_amounts(&from_units(&trip_units, decimals), currency),
            by_day,
            confidence: plan.confidence(),
            per_person: Money::new(per_person, currency),
            timestamp: Utc::now(),
        })
    }

    /// Drop every entry older than the time-to-live.
    pub fn purge_expired(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.cache.len();
        self.cache.retain(|_, entry| entry.created_at.elapsed() < ttl);
        before - self.cache.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
        }
    }
}

/// Largest minor-unit count an `f64` still represents exactly (2^53).
const MAX_UNITS: f64 = 9_007_199_254_740_992.0;

fn to_units(amount: f64, decimals: u32) -> std::result::Result<i64, CostError> {
    let units = (amount * 10f64.powi(decimals as i32)).round();
    if !units.is_finite() || units.abs() > MAX_UNITS {
        return Err(CostError::AmountOutOfRange(amount));
    }
    Ok(units as i64)
}

fn sum_units(units: &[i64]) -> std::result::Result<i64, CostError> {
    units
        .iter()
        .try_fold(0i64, |acc, part| acc.checked_add(*part))
        .ok_or_else(|| CostError::Engine("minor-unit total overflowed".to_string()))
}

fn from_unit(units: i64, decimals: u32) -> f64 {
    units as f64 / 10f64.powi(decimals as i32)
}

fn from_units(units: &[i64; 5], decimals: u32) -> CategoryAmounts {
    let mut amounts = CategoryAmounts::default();
    for (c, category) in PriceCategory::ALL.iter().enumerate() {
        *amounts.get_mut(*category) = from_unit(units[c], decimals);
    }
    amounts
}

/// Spread the rounding residual between `target` and the sum of `parts` one
/// minor unit at a time, largest parts first, never driving a part below zero.
fn reconcile(target: i64, parts: &mut [i64]) -> std::result::Result<(), CostError> {
    let mut residual = target
        .checked_sub(sum_units(parts)?)
        .ok_or_else(|| CostError::Engine("rounding residual overflowed".to_string()))?;
    if residual == 0 || parts.is_empty() {
        return Ok(());
    }

    let mut order: Vec<usize> = (0..parts.len()).collect();
    order.sort_by(|a, b| parts[*b].cmp(&parts[*a]).then(a.cmp(b)));

    while residual != 0 {
        let mut adjusted = false;
        for &i in &order {
            if residual > 0 {
                parts[i] += 1;
                residual -= 1;
                adjusted = true;
            } else if residual < 0 && parts[i] > 0 {
                parts[i] -= 1;
                residual += 1;
                adjusted = true;
            }
            if residual == 0 {
                break;
            }
        }
        if !adjusted {
            break;
        }
    }
    Ok(())
}
