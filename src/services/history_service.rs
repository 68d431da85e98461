//! Pricing history for a planning session.
//!
//! The first update of a session becomes the baseline (`original`) and is
//! never overwritten. Later updates replace `current`, and every change of the
//! total appends one delta record. Only deltas and running totals are kept,
//! not a full snapshot per change.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::models::history::{
    CategoryChange, ChangeRecord, PriceComparison, PricingHistory,
};
use crate::models::money::{round_to, Money};
use crate::models::pricing::{CategoryBreakdown, DayPricing, PriceCategory, PricingUpdate};
use crate::models::selection::SelectionChange;
use crate::services::currency_service::CurrencyTable;

pub struct PricingHistoryTracker {
    currencies: Arc<CurrencyTable>,
    history: Option<PricingHistory>,
}

impl PricingHistoryTracker {
    pub fn new(currencies: Arc<CurrencyTable>) -> Self {
        Self {
            currencies,
            history: None,
        }
    }

    pub fn history(&self) -> Option<&PricingHistory> {
        self.history.as_ref()
    }

    pub fn record_update(&mut self, update: PricingUpdate, change: &SelectionChange) -> PricingHistory {
        let history = match self.history.take() {
            None => PricingHistory {
                original: update.clone(),
                current: update,
                changes: Vec::new(),
            },
            Some(mut history) => {
                let previous = self.total_in(&history.current.total, update.currency());
                let difference = self
                    .currencies
                    .round(update.total.amount - previous.amount, update.currency());

                if difference != 0.0 {
                    let price_difference = Money::new(difference, update.currency());
                    let timestamp = match history.changes.last() {
                        Some(last) if last.timestamp > Utc::now() => last.timestamp,
                        _ => Utc::now(),
                    };
                    history.changes.push(ChangeRecord {
                        timestamp,
                        change_type: change.change_type,
                        component: change.component,
                        component_name: change.component_name.clone(),
                        description: ChangeRecord::describe(
                            change.change_type,
                            change.component,
                            &change.component_name,
                            &self.currencies.format_signed(&price_difference),
                        ),
                        price_difference,
                        new_total: update.total.clone(),
                    });
                }

                history.current = update;
                history
            }
        };

        self.history = Some(history.clone());
        history
    }

    /// Forget everything; the next update becomes a new baseline.
    pub fn reset_history(&mut self) {
        self.history = None;
    }

    fn total_in(&self, total: &Money, currency: &str) -> Money {
        self.currencies.convert(total, currency).unwrap_or_else(|err| {
            log::warn!("Could not convert previous total for comparison: {}", err);
            total.clone()
        })
    }
}

/// Compare two updates category by category. Both are expected to be in the
/// same currency; see [`convert_update`].
pub fn create_price_comparison(original: &PricingUpdate, current: &PricingUpdate) -> PriceComparison {
    let currency = current.currency();

    let category_changes = PriceCategory::ALL
        .iter()
        .map(|category| {
            let before = original.breakdown.get(*category);
            let after = current.breakdown.get(*category);
            CategoryChange {
                category: *category,
                original: before.clone(),
                current: after.clone(),
                difference: Money::new(round_to(after.amount - before.amount, 2), currency),
                percentage_change: percentage_change(before.amount, after.amount),
            }
        })
        .collect();

    PriceComparison {
        total_difference: Money::new(
            round_to(current.total.amount - original.total.amount, 2),
            currency,
        ),
        percentage_change: percentage_change(original.total.amount, current.total.amount),
        category_changes,
    }
}

fn percentage_change(original: f64, current: f64) -> f64 {
    if original == 0.0 {
        return 0.0;
    }
    (current - original) / original * 100.0
}

/// Re-express an update in another currency, e.g. to compare a baseline
/// recorded in EUR with a current total shown in USD.
pub fn convert_update(
    currencies: &CurrencyTable,
    update: &PricingUpdate,
    currency: &str,
) -> Result<PricingUpdate> {
    if update.currency().eq_ignore_ascii_case(currency) {
        return Ok(update.clone());
    }

    let convert_breakdown = |breakdown: &CategoryBreakdown| -> Result<CategoryBreakdown> {
        Ok(CategoryBreakdown {
            accommodations: currencies.convert(&breakdown.accommodations, currency)?,
            activities: currencies.convert(&breakdown.activities, currency)?,
            transportation: currencies.convert(&breakdown.transportation, currency)?,
            meals: currencies.convert(&breakdown.meals, currency)?,
            miscellaneous: currencies.convert(&breakdown.miscellaneous, currency)?,
        })
    };

    let by_day = update
        .by_day
        .iter()
        .map(|day| {
            Ok(DayPricing {
                date: day.date,
                total: currencies.convert(&day.total, currency)?,
                breakdown: convert_breakdown(&day.breakdown)?,
            })
        })
        .collect::<Result<Vec<DayPricing>>>()?;

    Ok(PricingUpdate {
        total: currencies.convert(&update.total, currency)?,
        breakdown: convert_breakdown(&update.breakdown)?,
        by_day,
        confidence: update.confidence,
        per_person: currencies.convert(&update.per_person, currency)?,
        timestamp: update.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::history::{ChangeType, ComponentKind};
    use crate::models::pricing::CategoryAmounts;
    use chrono::NaiveDate;

    fn update(total: f64, currency: &str) -> PricingUpdate {
        let amounts = CategoryAmounts {
            accommodations: total * 0.6,
            activities: total * 0.4,
            ..Default::default()
        };
        PricingUpdate {
            total: Money::new(total, currency),
            breakdown: CategoryBreakdown::from_amounts(&amounts, currency),
            by_day: vec![DayPricing {
                date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                total: Money::new(total, currency),
                breakdown: CategoryBreakdown::from_amounts(&amounts, currency),
            }],
            confidence: 1.0,
            per_person: Money::new(total, currency),
            timestamp: Utc::now(),
        }
    }

    fn removed_activity() -> SelectionChange {
        SelectionChange {
            change_type: ChangeType::Remove,
            component: ComponentKind::Activity,
            component_name: "Kayak tour".to_string(),
        }
    }

    fn tracker() -> PricingHistoryTracker {
        PricingHistoryTracker::new(Arc::new(CurrencyTable::default()))
    }

    #[test]
    fn test_first_update_is_baseline() {
        let mut tracker = tracker();
        let history = tracker.record_update(update(1000.0, "USD"), &removed_activity());

        assert_eq!(history.original, history.current);
        assert!(history.changes.is_empty());
    }

    #[test]
    fn test_removing_an_activity_records_negative_delta() {
        let mut tracker = tracker();
        tracker.record_update(update(1000.0, "USD"), &removed_activity());
        let history = tracker.record_update(update(850.0, "USD"), &removed_activity());

        assert_eq!(history.changes.len(), 1);
        let change = &history.changes[0];
        assert_eq!(change.price_difference.amount, -150.0);
        assert_eq!(change.new_total.amount, 850.0);
        assert_eq!(change.change_type, ChangeType::Remove);
        assert_eq!(change.description, "Removed activity 'Kayak tour' (-$150.00)");
        assert_eq!(history.original.total.amount, 1000.0);
        assert_eq!(history.current.total.amount, 850.0);
    }

    #[test]
    fn test_unchanged_total_updates_current_without_record() {
        let mut tracker = tracker();
        tracker.record_update(update(1000.0, "USD"), &removed_activity());
        let newer = update(1000.0, "USD");
        let history = tracker.record_update(newer.clone(), &removed_activity());

        assert!(history.changes.is_empty());
        assert_eq!(history.current, newer);
    }

    #[test]
    fn test_original_survives_many_updates() {
        let mut tracker = tracker();
        let first = update(1000.0, "USD");
        tracker.record_update(first.clone(), &removed_activity());
        for total in [900.0, 950.0, 1200.0, 400.0, 400.0, 1000.0] {
            tracker.record_update(update(total, "USD"), &removed_activity());
        }

        let history = tracker.history().unwrap();
        assert_eq!(history.original, first);
        assert_eq!(history.changes.len(), 5);
        assert_eq!(history.current.total.amount, 1000.0);
        assert!(history
            .changes
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp));
    }

    #[test]
    fn test_currency_switch_compares_in_new_currency() {
        let mut tracker = tracker();
        tracker.record_update(update(100.0, "USD"), &removed_activity());
        // 100 USD is 85 EUR, so only 15 EUR is a real change
        let history = tracker.record_update(update(100.0, "EUR"), &removed_activity());

        assert_eq!(history.changes.len(), 1);
        assert_eq!(history.changes[0].price_difference, Money::new(15.0, "EUR"));
    }

    #[test]
    fn test_reset_starts_new_baseline() {
        let mut tracker = tracker();
        tracker.record_update(update(1000.0, "USD"), &removed_activity());
        tracker.record_update(update(850.0, "USD"), &removed_activity());
        tracker.reset_history();
        assert!(tracker.history().is_none());

        let history = tracker.record_update(update(700.0, "USD"), &removed_activity());
        assert_eq!(history.original.total.amount, 700.0);
        assert!(history.changes.is_empty());
    }

    #[test]
    fn test_price_comparison() {
        let comparison = create_price_comparison(&update(1000.0, "USD"), &update(850.0, "USD"));
        assert_eq!(comparison.total_difference.amount, -150.0);
        assert!((comparison.percentage_change + 15.0).abs() < 1e-9);
        assert_eq!(comparison.category_changes.len(), 5);

        let activities = comparison
            .category_changes
            .iter()
            .find(|change| change.category == PriceCategory::Activities)
            .unwrap();
        assert_eq!(activities.difference.amount, -60.0);
    }

    #[test]
    fn test_price_comparison_from_zero() {
        let comparison = create_price_comparison(&update(0.0, "USD"), &update(300.0, "USD"));
        assert_eq!(comparison.percentage_change, 0.0);
        assert_eq!(comparison.total_difference.amount, 300.0);
    }

    #[test]
    fn test_convert_update() {
        let table = CurrencyTable::default();
        let converted = convert_update(&table, &update(100.0, "USD"), "EUR").unwrap();
        assert_eq!(converted.total, Money::new(85.0, "EUR"));
        assert_eq!(converted.by_day[0].total.currency, "EUR");
    }
}
