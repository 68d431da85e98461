use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::Money;
use super::pricing::{PriceCategory, PricingUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Add,
    Remove,
    Modify,
}

impl ChangeType {
    fn verb(&self) -> &'static str {
        match self {
            ChangeType::Add => "Added",
            ChangeType::Remove => "Removed",
            ChangeType::Modify => "Changed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Accommodation,
    Activity,
    Transportation,
    /// Dates, traveler counts or display currency.
    Trip,
}

impl ComponentKind {
    fn label(&self) -> &'static str {
        match self {
            ComponentKind::Accommodation => "accommodation",
            ComponentKind::Activity => "activity",
            ComponentKind::Transportation => "transportation",
            ComponentKind::Trip => "trip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub timestamp: DateTime<Utc>,
    pub change_type: ChangeType,
    pub component: ComponentKind,
    pub component_name: String,
    /// Signed; positive means the trip got more expensive.
    pub price_difference: Money,
    pub new_total: Money,
    pub description: String,
}

impl ChangeRecord {
    pub fn describe(
        change_type: ChangeType,
        component: ComponentKind,
        component_name: &str,
        formatted_difference: &str,
    ) -> String {
        match component {
            ComponentKind::Trip => format!("{} ({})", component_name, formatted_difference),
            _ => format!(
                "{} {} '{}' ({})",
                change_type.verb(),
                component.label(),
                component_name,
                formatted_difference
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingHistory {
    pub original: PricingUpdate,
    pub current: PricingUpdate,
    pub changes: Vec<ChangeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryChange {
    pub category: PriceCategory,
    pub original: Money,
    pub current: Money,
    pub difference: Money,
    pub percentage_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComparison {
    pub total_difference: Money,
    pub percentage_change: f64,
    pub category_changes: Vec<CategoryChange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_description() {
        assert_eq!(
            ChangeRecord::describe(ChangeType::Remove, ComponentKind::Activity, "Kayak tour", "-$150.00"),
            "Removed activity 'Kayak tour' (-$150.00)"
        );
        assert_eq!(
            ChangeRecord::describe(ChangeType::Modify, ComponentKind::Trip, "Trip details", "+$20.00"),
            "Trip details (+$20.00)"
        );
    }
}
