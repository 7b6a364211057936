use crate::range::month_abbrev;
use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

/// Destinations longer than this many characters are truncated in
/// [`Trip::when()`]
const MAX_DESTINATION_LEN: usize = 14;

/// Destinations must be at least this many characters long, not counting
/// surrounding whitespace
pub(crate) const MIN_DESTINATION_LEN: usize = 4;

pub(crate) fn is_long_enough_destination(destination: &str) -> bool {
    destination.trim().chars().count() >= MIN_DESTINATION_LEN
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct Trip {
    pub(crate) id: Uuid,
    pub(crate) destination: String,
    pub(crate) starts_at: Date,
    pub(crate) ends_at: Date,
    pub(crate) is_confirmed: bool,
}

impl Trip {
    /// One-line summary of where & when, e.g. "Lisbon from 05 Mar to 10 Mar"
    pub(crate) fn when(&self) -> String {
        let destination = if self.destination.chars().count() > MAX_DESTINATION_LEN {
            let mut s = self
                .destination
                .chars()
                .take(MAX_DESTINATION_LEN)
                .collect::<String>();
            s.push_str("...");
            s
        } else {
            self.destination.clone()
        };
        format!(
            "{destination} from {:02} {} to {:02} {}",
            self.starts_at.day(),
            month_abbrev(self.starts_at.month()),
            self.ends_at.day(),
            month_abbrev(self.ends_at.month()),
        )
    }

    pub(crate) fn contains(&self, date: Date) -> bool {
        (self.starts_at..=self.ends_at).contains(&date)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct Activity {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) occurs_at: PrimitiveDateTime,
}

/// The activities scheduled on one day of a trip
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct DayActivities {
    pub(crate) date: Date,
    pub(crate) activities: Vec<Activity>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct Link {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) url: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct Participant {
    pub(crate) id: Uuid,
    pub(crate) name: Option<String>,
    pub(crate) email: String,
    pub(crate) is_confirmed: bool,
}

impl Participant {
    pub(crate) fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Pending guest")
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct NewTrip {
    pub(crate) destination: String,
    pub(crate) starts_at: Date,
    pub(crate) ends_at: Date,
    pub(crate) emails_to_invite: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct TripUpdate {
    pub(crate) destination: String,
    pub(crate) starts_at: Date,
    pub(crate) ends_at: Date,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct NewActivity {
    pub(crate) title: String,
    pub(crate) occurs_at: PrimitiveDateTime,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct NewLink {
    pub(crate) title: String,
    pub(crate) url: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Confirmation {
    pub(crate) name: String,
    pub(crate) email: String,
}

/// A day's activities prepared for listing
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ActivitySection {
    pub(crate) day_number: u8,
    pub(crate) day_name: String,
    pub(crate) items: Vec<ActivityItem>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ActivityItem {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) hour: String,
    pub(crate) is_before: bool,
}

impl ActivitySection {
    pub(crate) fn new(day: &DayActivities, now: PrimitiveDateTime) -> ActivitySection {
        ActivitySection {
            day_number: day.date.day(),
            day_name: day.date.weekday().to_string(),
            items: day
                .activities
                .iter()
                .map(|a| ActivityItem {
                    id: a.id,
                    title: a.title.clone(),
                    hour: format!("{:02}:{:02}h", a.occurs_at.hour(), a.occurs_at.minute()),
                    is_before: a.occurs_at < now,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn trip(destination: &str) -> Trip {
        Trip {
            id: Uuid::nil(),
            destination: destination.into(),
            starts_at: date!(2024 - 03 - 05),
            ends_at: date!(2024 - 04 - 10),
            is_confirmed: false,
        }
    }

    #[test]
    fn test_when() {
        assert_eq!(trip("Lisbon").when(), "Lisbon from 05 Mar to 10 Apr");
    }

    #[test]
    fn test_when_exact_length() {
        assert_eq!(
            trip("Rio de Janeiro").when(),
            "Rio de Janeiro from 05 Mar to 10 Apr"
        );
    }

    #[test]
    fn test_when_truncates_destination() {
        assert_eq!(
            trip("Florianópolis, Brazil").when(),
            "Florianópolis,... from 05 Mar to 10 Apr"
        );
    }

    #[test]
    fn test_contains() {
        let t = trip("Lisbon");
        assert!(t.contains(date!(2024 - 03 - 05)));
        assert!(t.contains(date!(2024 - 04 - 10)));
        assert!(!t.contains(date!(2024 - 03 - 04)));
        assert!(!t.contains(date!(2024 - 04 - 11)));
    }

    #[test]
    fn test_activity_section() {
        let day = DayActivities {
            date: date!(2024 - 03 - 05),
            activities: vec![
                Activity {
                    id: Uuid::nil(),
                    title: "Breakfast".into(),
                    occurs_at: datetime!(2024 - 03 - 05 08:00),
                },
                Activity {
                    id: Uuid::max(),
                    title: "Museum".into(),
                    occurs_at: datetime!(2024 - 03 - 05 15:30),
                },
            ],
        };
        let section = ActivitySection::new(&day, datetime!(2024 - 03 - 05 12:00));
        assert_eq!(section.day_number, 5);
        assert_eq!(section.day_name, "Tuesday");
        assert_eq!(
            section.items,
            [
                ActivityItem {
                    id: Uuid::nil(),
                    title: "Breakfast".into(),
                    hour: "08:00h".into(),
                    is_before: true,
                },
                ActivityItem {
                    id: Uuid::max(),
                    title: "Museum".into(),
                    hour: "15:30h".into(),
                    is_before: false,
                },
            ]
        );
    }
}
