use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::history::{ChangeType, ComponentKind};
use super::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationSelection {
    pub id: String,
    pub name: String,
    pub price_per_night: Money,
    /// First night covered; defaults to the trip start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in: Option<NaiveDate>,
    /// Exclusive; defaults to the day after the trip ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_out: Option<NaiveDate>,
}

impl AccommodationSelection {
    pub fn covers(&self, day: NaiveDate, trip: &TripContext) -> bool {
        let check_in = self.check_in.unwrap_or(trip.start_date);
        let after_last = match self.check_out {
            Some(date) => date,
            None => match trip.end_date.succ_opt() {
                Some(date) => date,
                None => return day >= check_in,
            },
        };
        day >= check_in && day < after_last
    }

    fn fingerprint(&self) -> String {
        format!(
            "accommodation:{}:{}:{}:{:?}:{:?}",
            self.id,
            self.price_per_night.amount,
            self.price_per_night.currency,
            self.check_in,
            self.check_out
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySelection {
    pub id: String,
    pub name: String,
    pub price_per_person: Money,
    /// Day the activity is scheduled on; undated activities land on the first day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

impl ActivitySelection {
    fn fingerprint(&self) -> String {
        format!(
            "activity:{}:{}:{}:{:?}",
            self.id, self.price_per_person.amount, self.price_per_person.currency, self.date
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportationSelection {
    pub id: String,
    pub name: String,
    pub cost: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// When set, `cost` is charged once per paying traveler.
    #[serde(default)]
    pub per_person: bool,
}

impl TransportationSelection {
    fn fingerprint(&self) -> String {
        format!(
            "transportation:{}:{}:{}:{:?}:{}",
            self.id, self.cost.amount, self.cost.currency, self.date, self.per_person
        )
    }
}

/// The trip-in-progress selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectedItems {
    #[serde(default)]
    pub accommodations: Vec<AccommodationSelection>,
    #[serde(default)]
    pub activities: Vec<ActivitySelection>,
    #[serde(default)]
    pub transportation: Vec<TransportationSelection>,
}

impl SelectedItems {
    pub fn is_empty(&self) -> bool {
        self.accommodations.is_empty() && self.activities.is_empty() && self.transportation.is_empty()
    }

    /// Order-independent description of everything that affects the price.
    pub fn fingerprints(&self) -> Vec<String> {
        let mut prints: Vec<String> = self
            .accommodations
            .iter()
            .map(AccommodationSelection::fingerprint)
            .chain(self.activities.iter().map(ActivitySelection::fingerprint))
            .chain(self.transportation.iter().map(TransportationSelection::fingerprint))
            .collect();
        prints.sort();
        prints
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripContext {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

impl TripContext {
    /// Number of calendar days in the trip, both ends included.
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |day| *day <= self.end_date)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start_date && day <= self.end_date
    }

    /// Travelers who pay for activities and per-person transport. Infants ride free.
    pub fn paying_travelers(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }
}

/// What changed between two consecutive selections, used to label history entries.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange {
    pub change_type: ChangeType,
    pub component: ComponentKind,
    pub component_name: String,
}

impl SelectionChange {
    /// With no previous selection, or when no item differs, the change is
    /// attributed to the trip itself (dates, travelers or display currency).
    pub fn between(previous: Option<&SelectedItems>, selected: &SelectedItems) -> Self {
        let Some(prev_items) = previous else {
            return Self::trip_details();
        };

        let mut changes = Vec::new();
        diff_collection(
            &prev_items.accommodations,
            &selected.accommodations,
            ComponentKind::Accommodation,
            |item| (&item.id, &item.name),
            &mut changes,
        );
        diff_collection(
            &prev_items.activities,
            &selected.activities,
            ComponentKind::Activity,
            |item| (&item.id, &item.name),
            &mut changes,
        );
        diff_collection(
            &prev_items.transportation,
            &selected.transportation,
            ComponentKind::Transportation,
            |item| (&item.id, &item.name),
            &mut changes,
        );

        let mut iter = changes.into_iter();
        match iter.next() {
            Some(mut first) => {
                let more = iter.count();
                if more > 0 {
                    first.component_name = format!("{} (+{} more)", first.component_name, more);
                }
                first
            }
            None => Self::trip_details(),
        }
    }

    fn trip_details() -> Self {
        Self {
            change_type: ChangeType::Modify,
            component: ComponentKind::Trip,
            component_name: "Trip details".to_string(),
        }
    }
}

fn diff_collection<T, F>(
    previous: &[T],
    current: &[T],
    component: ComponentKind,
    key: F,
    out: &mut Vec<SelectionChange>,
) where
    T: PartialEq,
    F: Fn(&T) -> (&String, &String),
{
    for item in current {
        let (id, name) = key(item);
        match previous.iter().find(|prev| key(prev).0 == id) {
            None => out.push(SelectionChange {
                change_type: ChangeType::Add,
                component,
                component_name: name.clone(),
            }),
            Some(prev) if prev != item => out.push(SelectionChange {
                change_type: ChangeType::Modify,
                component,
                component_name: name.clone(),
            }),
            Some(_) => {}
        }
    }
    for item in previous {
        let (id, name) = key(item);
        if !current.iter().any(|cur| key(cur).0 == id) {
            out.push(SelectionChange {
                change_type: ChangeType::Remove,
                component,
                component_name: name.clone(),
            });
        }
    }
}
