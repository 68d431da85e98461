//! Itinerary Cost Engine
//!
//! Turns a day-by-day itinerary plan into per-category subtotals in the base
//! currency. The pricing calculator only orchestrates planning, caching and
//! conversion around an [`ItineraryCostEngine`], so tests can swap in a fake.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::PricingConfig;
use crate::error::CostError;
use crate::models::money::Money;
use crate::models::pricing::{CategoryAmounts, CostBreakdown, DayCost};
use crate::models::selection::{
    AccommodationSelection, ActivitySelection, SelectedItems, TransportationSelection, TripContext,
};
use crate::services::currency_service::CurrencyTable;

const CHILD_MEAL_FACTOR: f64 = 0.5;
const MINUTES_PER_DAY: i64 = 24 * 60;

pub trait ItineraryCostEngine: Send + Sync {
    fn calculate(&self, plan: &ItineraryPlan) -> Result<CostBreakdown, CostError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DayLodging {
    /// Nothing booked for the night; priced at the placeholder rate.
    Placeholder,
    Stays(Vec<AccommodationSelection>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDay {
    pub date: NaiveDate,
    pub lodging: DayLodging,
    pub activities: Vec<ActivitySelection>,
    pub transportation: Vec<TransportationSelection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryPlan {
    pub trip: TripContext,
    pub days: Vec<PlannedDay>,
}

impl ItineraryPlan {
    /// Validate the selection against the trip and lay it out day by day.
    pub fn build(
        selected: &SelectedItems,
        trip: &TripContext,
        max_trip_days: i64,
    ) -> Result<Self, CostError> {
        validate_trip(trip, max_trip_days)?;
        validate_items(selected, trip)?;

        let days = trip
            .days()
            .map(|date| {
                let stays: Vec<AccommodationSelection> = selected
                    .accommodations
                    .iter()
                    .filter(|stay| stay.covers(date, trip))
                    .cloned()
                    .collect();
                let lodging = if stays.is_empty() {
                    DayLodging::Placeholder
                } else {
                    DayLodging::Stays(stays)
                };

                PlannedDay {
                    date,
                    lodging,
                    activities: selected
                        .activities
                        .iter()
                        .filter(|activity| activity.date.unwrap_or(trip.start_date) == date)
                        .cloned()
                        .collect(),
                    transportation: selected
                        .transportation
                        .iter()
                        .filter(|leg| leg.date.unwrap_or(trip.start_date) == date)
                        .cloned()
                        .collect(),
                }
            })
            .collect();

        Ok(Self {
            trip: trip.clone(),
            days,
        })
    }

    /// 0.5 with nothing booked, rising to 1.0 when every night has a real stay.
    pub fn confidence(&self) -> f64 {
        if self.days.is_empty() {
            return 0.0;
        }
        let booked = self
            .days
            .iter()
            .filter(|day| matches!(day.lodging, DayLodging::Stays(_)))
            .count();
        (0.5 + 0.5 * booked as f64 / self.days.len() as f64).clamp(0.0, 1.0)
    }
}

fn validate_trip(trip: &TripContext, max_trip_days: i64) -> Result<(), CostError> {
    if trip.end_date < trip.start_date {
        return Err(CostError::InvalidDateRange {
            start: trip.start_date,
            end: trip.end_date,
        });
    }
    if trip.adults < 1 {
        return Err(CostError::NoAdults);
    }
    if trip.adults.checked_add(trip.children).is_none() {
        return Err(CostError::TooManyTravelers {
            adults: trip.adults,
            children: trip.children,
        });
    }
    let days = trip.day_count();
    if days > max_trip_days {
        return Err(CostError::TripTooLong {
            days,
            max: max_trip_days,
        });
    }
    Ok(())
}

fn validate_items(selected: &SelectedItems, trip: &TripContext) -> Result<(), CostError> {
    check_unique("accommodation", selected.accommodations.iter().map(|a| &a.id))?;
    check_unique("activity", selected.activities.iter().map(|a| &a.id))?;
    check_unique("transportation", selected.transportation.iter().map(|t| &t.id))?;

    for stay in &selected.accommodations {
        check_price("accommodation", &stay.id, &stay.price_per_night)?;
        if let (Some(check_in), Some(check_out)) = (stay.check_in, stay.check_out) {
            if check_out <= check_in {
                return Err(CostError::InvalidDateRange {
                    start: check_in,
                    end: check_out,
                });
            }
        }
        if !trip.days().any(|day| stay.covers(day, trip)) {
            return Err(CostError::OutsideTrip {
                component: "accommodation",
                id: stay.id.clone(),
                date: stay.check_in.unwrap_or(trip.start_date),
            });
        }
    }

    for activity in &selected.activities {
        check_price("activity", &activity.id, &activity.price_per_person)?;
        check_date("activity", &activity.id, activity.date, trip)?;
        check_duration(activity, trip)?;
    }

    for leg in &selected.transportation {
        check_price("transportation", &leg.id, &leg.cost)?;
        check_date("transportation", &leg.id, leg.date, trip)?;
    }

    Ok(())
}

fn check_unique<'a>(
    component: &'static str,
    ids: impl Iterator<Item = &'a String>,
) -> Result<(), CostError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CostError::DuplicateId {
                component,
                id: id.clone(),
            });
        }
    }
    Ok(())
}

fn check_price(component: &'static str, id: &str, price: &Money) -> Result<(), CostError> {
    if !price.amount.is_finite() || price.amount < 0.0 {
        return Err(CostError::InvalidPrice {
            component,
            id: id.to_string(),
            amount: price.amount,
        });
    }
    Ok(())
}

fn check_date(
    component: &'static str,
    id: &str,
    date: Option<NaiveDate>,
    trip: &TripContext,
) -> Result<(), CostError> {
    match date {
        Some(date) if !trip.contains(date) => Err(CostError::OutsideTrip {
            component,
            id: id.to_string(),
            date,
        }),
        _ => Ok(()),
    }
}

fn check_duration(activity: &ActivitySelection, trip: &TripContext) -> Result<(), CostError> {
    let Some(minutes) = activity.duration_minutes else {
        return Ok(());
    };
    if i64::from(minutes) > trip.day_count() * MINUTES_PER_DAY {
        return Err(CostError::InvalidDuration {
            id: activity.id.clone(),
            minutes,
        });
    }
    Ok(())
}

/// Default engine: nightly stays, per-person activities, transport legs,
/// a daily meal allowance and a service fee spread across the days.
pub struct StandardCostEngine {
    currencies: Arc<CurrencyTable>,
    config: PricingConfig,
}

impl StandardCostEngine {
    pub fn new(currencies: Arc<CurrencyTable>, config: PricingConfig) -> Self {
        Self { currencies, config }
    }

    /// Service fee (configured share of the subtotal, never below the minimum)
    pub fn calculate_service_fee(&self, subtotal: f64) -> f64 {
        (subtotal * self.config.service_fee_rate).max(self.config.service_fee_minimum)
    }

    fn price_day(&self, day: &PlannedDay, trip: &TripContext) -> Result<CategoryAmounts, CostError> {
        let paying = trip.paying_travelers() as f64;

        let accommodations = match &day.lodging {
            DayLodging::Placeholder => self.config.placeholder_nightly_rate,
            DayLodging::Stays(stays) => stays
                .iter()
                .map(|stay| self.currencies.to_base(&stay.price_per_night))
                .sum::<Result<f64, CostError>>()?,
        };

        let activities = day
            .activities
            .iter()
            .map(|activity| {
                self.currencies
                    .to_base(&activity.price_per_person)
                    .map(|price| price * paying)
            })
            .sum::<Result<f64, CostError>>()?;

        let transportation = day
            .transportation
            .iter()
            .map(|leg| {
                self.currencies
                    .to_base(&leg.cost)
                    .map(|cost| if leg.per_person { cost * paying } else { cost })
            })
            .sum::<Result<f64, CostError>>()?;

        let meals = self.config.meal_rate * trip.adults as f64
            + self.config.meal_rate * CHILD_MEAL_FACTOR * trip.children as f64;

        Ok(CategoryAmounts {
            accommodations,
            activities,
            transportation,
            meals,
            miscellaneous: 0.0,
        })
    }
}

impl ItineraryCostEngine for StandardCostEngine {
    fn calculate(&self, plan: &ItineraryPlan) -> Result<CostBreakdown, CostError> {
        if plan.days.is_empty() {
            return Err(CostError::Engine("itinerary has no days".to_string()));
        }

        let mut days = plan
            .days
            .iter()
            .map(|day| {
                Ok(DayCost {
                    date: day.date,
                    amounts: self.price_day(day, &plan.trip)?,
                })
            })
            .collect::<Result<Vec<DayCost>, CostError>>()?;

        let subtotal: f64 = days.iter().map(|day| day.amounts.subtotal()).sum();
        let fee = self.calculate_service_fee(subtotal);
        let day_count = days.len() as f64;

        for day in &mut days {
            day.amounts.miscellaneous = if subtotal > 0.0 {
                fee * day.amounts.subtotal() / subtotal
            } else {
                fee / day_count
            };
        }

        Ok(CostBreakdown { days })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn trip(start: u32, end: u32) -> TripContext {
        TripContext {
            start_date: date(start),
            end_date: date(end),
            adults: 2,
            children: 1,
            infants: 0,
        }
    }

    fn engine() -> StandardCostEngine {
        StandardCostEngine::new(Arc::new(CurrencyTable::default()), PricingConfig::default())
    }

    fn activity(id: &str, price: f64, day: Option<u32>) -> ActivitySelection {
        ActivitySelection {
            id: id.to_string(),
            name: format!("Activity {}", id),
            price_per_person: Money::new(price, "USD"),
            date: day.map(date),
            start_time: None,
            duration_minutes: None,
        }
    }

    fn stay(id: &str, price: f64, check_in: u32, check_out: u32) -> AccommodationSelection {
        AccommodationSelection {
            id: id.to_string(),
            name: format!("Stay {}", id),
            price_per_night: Money::new(price, "USD"),
            check_in: Some(date(check_in)),
            check_out: Some(date(check_out)),
        }
    }

    #[test]
    fn test_service_fee_calculation() {
        let engine = engine();
        // Test 5% calculation
        assert_eq!(engine.calculate_service_fee(2000.0), 100.0);
        // Test minimum fee
        assert_eq!(engine.calculate_service_fee(100.0), 50.0);
        assert_eq!(engine.calculate_service_fee(0.0), 50.0);
    }

    #[test]
    fn test_plan_assigns_items_to_days() {
        let selected = SelectedItems {
            accommodations: vec![stay("h1", 200.0, 2, 4)],
            activities: vec![activity("a1", 50.0, Some(3)), activity("a2", 20.0, None)],
            transportation: vec![],
        };
        let plan = ItineraryPlan::build(&selected, &trip(1, 3), 366).unwrap();

        assert_eq!(plan.days.len(), 3);
        assert_eq!(plan.days[0].lodging, DayLodging::Placeholder);
        assert!(matches!(plan.days[1].lodging, DayLodging::Stays(_)));
        assert_eq!(plan.days[0].activities[0].id, "a2");
        assert_eq!(plan.days[2].activities[0].id, "a1");
        // Two of three nights booked
        assert!((plan.confidence() - (0.5 + 0.5 * 2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_plan_rejects_malformed_input() {
        let mut backwards = trip(1, 3);
        backwards.end_date = date(1);
        backwards.start_date = date(3);
        assert!(matches!(
            ItineraryPlan::build(&SelectedItems::default(), &backwards, 366),
            Err(CostError::InvalidDateRange { .. })
        ));

        let mut no_adults = trip(1, 3);
        no_adults.adults = 0;
        assert_eq!(
            ItineraryPlan::build(&SelectedItems::default(), &no_adults, 366),
            Err(CostError::NoAdults)
        );

        assert!(matches!(
            ItineraryPlan::build(&SelectedItems::default(), &trip(1, 20), 7),
            Err(CostError::TripTooLong { days: 20, max: 7 })
        ));

        let outside = SelectedItems {
            activities: vec![activity("a1", 50.0, Some(9))],
            ..Default::default()
        };
        assert!(matches!(
            ItineraryPlan::build(&outside, &trip(1, 3), 366),
            Err(CostError::OutsideTrip { component: "activity", .. })
        ));

        let duplicate = SelectedItems {
            activities: vec![activity("a1", 50.0, None), activity("a1", 10.0, None)],
            ..Default::default()
        };
        assert!(matches!(
            ItineraryPlan::build(&duplicate, &trip(1, 3), 366),
            Err(CostError::DuplicateId { .. })
        ));

        let negative = SelectedItems {
            activities: vec![activity("a1", -5.0, None)],
            ..Default::default()
        };
        assert!(matches!(
            ItineraryPlan::build(&negative, &trip(1, 3), 366),
            Err(CostError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_plan_rejects_traveler_count_overflow() {
        let mut crowd = trip(1, 2);
        crowd.adults = u32::MAX;
        crowd.children = 1;
        assert_eq!(
            ItineraryPlan::build(&SelectedItems::default(), &crowd, 366),
            Err(CostError::TooManyTravelers {
                adults: u32::MAX,
                children: 1
            })
        );

        crowd.children = 0;
        assert!(ItineraryPlan::build(&SelectedItems::default(), &crowd, 366).is_ok());
    }

    #[test]
    fn test_plan_rejects_activity_longer_than_trip() {
        let mut marathon = activity("a1", 10.0, Some(1));
        marathon.duration_minutes = Some(u32::MAX);
        let selected = SelectedItems {
            activities: vec![marathon.clone()],
            ..Default::default()
        };
        assert!(matches!(
            ItineraryPlan::build(&selected, &trip(1, 2), 366),
            Err(CostError::InvalidDuration { minutes: u32::MAX, .. })
        ));

        // Two full days is the longest a two-day trip can hold
        marathon.duration_minutes = Some(2 * 24 * 60);
        let selected = SelectedItems {
            activities: vec![marathon],
            ..Default::default()
        };
        assert!(ItineraryPlan::build(&selected, &trip(1, 2), 366).is_ok());
    }

    #[test]
    fn test_standard_engine_prices_each_category() {
        let selected = SelectedItems {
            accommodations: vec![stay("h1", 200.0, 1, 3)],
            activities: vec![activity("a1", 50.0, Some(2))],
            transportation: vec![TransportationSelection {
                id: "t1".to_string(),
                name: "Airport shuttle".to_string(),
                cost: Money::new(30.0, "USD"),
                date: Some(date(1)),
                per_person: true,
            }],
        };
        let plan = ItineraryPlan::build(&selected, &trip(1, 2), 366).unwrap();
        let breakdown = engine().calculate(&plan).unwrap();
        let totals = breakdown.totals();

        assert_eq!(totals.accommodations, 400.0);
        // 3 paying travelers
        assert_eq!(totals.activities, 150.0);
        assert_eq!(totals.transportation, 90.0);
        // (2 adults + half a child) * 45 * 2 days
        assert_eq!(totals.meals, 225.0);
        // 5% of 865 is below the minimum fee
        assert!((totals.miscellaneous - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_service_fee_spread_follows_day_subtotals() {
        let selected = SelectedItems {
            activities: vec![activity("a1", 1000.0, Some(1))],
            ..Default::default()
        };
        let plan = ItineraryPlan::build(&selected, &trip(1, 2), 366).unwrap();
        let breakdown = engine().calculate(&plan).unwrap();

        let fee: f64 = breakdown.days.iter().map(|d| d.amounts.miscellaneous).sum();
        let subtotal: f64 = breakdown.days.iter().map(|d| d.amounts.subtotal()).sum();
        assert!((fee - subtotal * 0.05).abs() < 1e-9);
        assert!(breakdown.days[0].amounts.miscellaneous > breakdown.days[1].amounts.miscellaneous);
    }
}
