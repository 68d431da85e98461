use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledActivity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
}

impl ScheduledActivity {
    pub fn start_minute(&self) -> u32 {
        self.start_time.hour() * 60 + self.start_time.minute()
    }

    /// Exclusive end; may run past midnight (> 1440). Saturates on absurd durations.
    pub fn end_minute(&self) -> u32 {
        self.start_minute().saturating_add(self.duration_minutes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictType {
    Overlap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
    pub start_minute: u32,
    pub end_minute: u32,
}

impl TimeWindow {
    pub fn from_minutes(start_minute: u32, end_minute: u32) -> Self {
        Self {
            start: format_minute(start_minute),
            end: format_minute(end_minute),
            start_minute,
            end_minute,
        }
    }
}

fn format_minute(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeConflict {
    pub conflict_type: ConflictType,
    pub date: NaiveDate,
    /// The two activity ids, lexicographically ordered.
    pub activity_ids: (String, String),
    pub window: TimeWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_labels() {
        let window = TimeWindow::from_minutes(540, 630);
        assert_eq!(window.start, "09:00");
        assert_eq!(window.end, "10:30");
        assert_eq!(TimeWindow::from_minutes(1380, 1500).end, "25:00");
    }
}
