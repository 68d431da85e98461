use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceCategory {
    Accommodations,
    Activities,
    Transportation,
    Meals,
    Miscellaneous,
}

impl PriceCategory {
    pub const ALL: [PriceCategory; 5] = [
        PriceCategory::Accommodations,
        PriceCategory::Activities,
        PriceCategory::Transportation,
        PriceCategory::Meals,
        PriceCategory::Miscellaneous,
    ];
}

/// Unconverted per-category subtotals, always in the base currency.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryAmounts {
    pub accommodations: f64,
    pub activities: f64,
    pub transportation: f64,
    pub meals: f64,
    pub miscellaneous: f64,
}

impl CategoryAmounts {
    pub fn get(&self, category: PriceCategory) -> f64 {
        match category {
            PriceCategory::Accommodations => self.accommodations,
            PriceCategory::Activities => self.activities,
            PriceCategory::Transportation => self.transportation,
            PriceCategory::Meals => self.meals,
            PriceCategory::Miscellaneous => self.miscellaneous,
        }
    }

    pub fn get_mut(&mut self, category: PriceCategory) -> &mut f64 {
        match category {
            PriceCategory::Accommodations => &mut self.accommodations,
            PriceCategory::Activities => &mut self.activities,
            PriceCategory::Transportation => &mut self.transportation,
            PriceCategory::Meals => &mut self.meals,
            PriceCategory::Miscellaneous => &mut self.miscellaneous,
        }
    }

    pub fn sum(&self) -> f64 {
        PriceCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// Everything except the service fee, which is derived from this subtotal.
    pub fn subtotal(&self) -> f64 {
        self.sum() - self.miscellaneous
    }

    pub fn add(&mut self, other: &CategoryAmounts) {
        for category in PriceCategory::ALL {
            *self.get_mut(category) += other.get(category);
        }
    }
}

/// Converted per-category amounts shown to the traveler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub accommodations: Money,
    pub activities: Money,
    pub transportation: Money,
    pub meals: Money,
    pub miscellaneous: Money,
}

impl CategoryBreakdown {
    pub fn get(&self, category: PriceCategory) -> &Money {
        match category {
            PriceCategory::Accommodations => &self.accommodations,
            PriceCategory::Activities => &self.activities,
            PriceCategory::Transportation => &self.transportation,
            PriceCategory::Meals => &self.meals,
            PriceCategory::Miscellaneous => &self.miscellaneous,
        }
    }

    pub fn from_amounts(amounts: &CategoryAmounts, currency: &str) -> Self {
        Self {
            accommodations: Money::new(amounts.accommodations, currency),
            activities: Money::new(amounts.activities, currency),
            transportation: Money::new(amounts.transportation, currency),
            meals: Money::new(amounts.meals, currency),
            miscellaneous: Money::new(amounts.miscellaneous, currency),
        }
    }

    pub fn sum(&self) -> f64 {
        PriceCategory::ALL.iter().map(|c| self.get(*c).amount).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPricing {
    pub date: NaiveDate,
    pub total: Money,
    pub breakdown: CategoryBreakdown,
}

/// One fully computed snapshot of the trip cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingUpdate {
    pub total: Money,
    pub breakdown: CategoryBreakdown,
    pub by_day: Vec<DayPricing>,
    /// Share of the estimate backed by real selections rather than placeholders.
    pub confidence: f64,
    /// Total divided by paying travelers.
    pub per_person: Money,
    pub timestamp: DateTime<Utc>,
}

impl PricingUpdate {
    pub fn currency(&self) -> &str {
        &self.total.currency
    }
}

/// Output of an itinerary cost engine: base-currency subtotals for each trip day.
#[derive(Debug, Clone, PartialEq)]
pub struct CostBreakdown {
    pub days: Vec<DayCost>,
}

impl CostBreakdown {
    pub fn totals(&self) -> CategoryAmounts {
        let mut totals = CategoryAmounts::default();
        for day in &self.days {
            totals.add(&day.amounts);
        }
        totals
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCost {
    pub date: NaiveDate,
    pub amounts: CategoryAmounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_amounts_sum_and_subtotal() {
        let amounts = CategoryAmounts {
            accommodations: 300.0,
            activities: 120.0,
            transportation: 40.0,
            meals: 90.0,
            miscellaneous: 50.0,
        };
        assert_eq!(amounts.sum(), 600.0);
        assert_eq!(amounts.subtotal(), 550.0);
    }

    #[test]
    fn test_cost_breakdown_totals() {
        let day = |d: u32, activities: f64| DayCost {
            date: NaiveDate::from_ymd_opt(2025, 6, d).unwrap(),
            amounts: CategoryAmounts {
                activities,
                ..Default::default()
            },
        };
        let breakdown = CostBreakdown {
            days: vec![day(1, 10.0), day(2, 32.5)],
        };
        assert_eq!(breakdown.totals().activities, 42.5);
    }
}
