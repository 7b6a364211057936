use crate::theme::SELECTION_COLOR;
use ratatui::style::Color;
use std::collections::BTreeMap;
use std::fmt;
use std::iter::successors;
use time::{Date, Month};

static MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A single calendar day, as picked on the calendar.  Its `Display`
/// implementation produces the canonical `YYYY-MM-DD` form.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct DatePoint(Date);

impl DatePoint {
    pub(crate) fn new(date: Date) -> DatePoint {
        DatePoint(date)
    }

    pub(crate) fn date(self) -> Date {
        self.0
    }

    /// Unix timestamp of midnight UTC at the start of the day
    pub(crate) fn timestamp(self) -> i64 {
        self.0.midnight().assume_utc().unix_timestamp()
    }

    /// Short human-readable form, e.g. "05 Mar"
    pub(crate) fn short_display(self) -> String {
        format!("{:02} {}", self.0.day(), month_abbrev(self.0.month()))
    }
}

impl From<Date> for DatePoint {
    fn from(date: Date) -> DatePoint {
        DatePoint(date)
    }
}

impl fmt::Display for DatePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

pub(crate) fn month_abbrev(month: Month) -> &'static str {
    MONTH_ABBREVS[usize::from(u8::from(month) - 1)]
}

/// The dates selected so far on a calendar.  Every pick moves the selection
/// through `Empty → Single → Range → Single → …`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) enum DateRange {
    #[default]
    Empty,
    Single(DatePoint),
    // Invariant: start <= end
    Range(DatePoint, DatePoint),
}

impl DateRange {
    /// Build a complete range from two endpoints given in either order
    pub(crate) fn between(a: DatePoint, b: DatePoint) -> DateRange {
        if b < a {
            DateRange::Range(b, a)
        } else {
            DateRange::Range(a, b)
        }
    }

    pub(crate) fn starts_at(&self) -> Option<DatePoint> {
        match *self {
            DateRange::Empty => None,
            DateRange::Single(start) | DateRange::Range(start, _) => Some(start),
        }
    }

    pub(crate) fn ends_at(&self) -> Option<DatePoint> {
        match *self {
            DateRange::Range(_, end) => Some(end),
            _ => None,
        }
    }

    /// Both endpoints, if the selection is complete
    pub(crate) fn endpoints(&self) -> Option<(DatePoint, DatePoint)> {
        match *self {
            DateRange::Range(start, end) => Some((start, end)),
            _ => None,
        }
    }

    /// Return the selection that results from the user picking `picked`.
    ///
    /// A pick on an empty selection starts it.  A pick on a single date
    /// completes the range, swapping the endpoints if `picked` comes first;
    /// picking the same date again yields a one-day range.  A pick on a
    /// complete range discards it and starts over.
    pub(crate) fn pick(self, picked: DatePoint) -> DateRange {
        match self {
            DateRange::Empty | DateRange::Range(..) => DateRange::Single(picked),
            DateRange::Single(start) if picked < start => DateRange::Range(picked, start),
            DateRange::Single(start) => DateRange::Range(start, picked),
        }
    }

    /// One highlight per day covered by the selection, from its start to its
    /// end inclusive
    pub(crate) fn marked_dates(&self) -> BTreeMap<DatePoint, Highlight> {
        let Some(start) = self.starts_at() else {
            return BTreeMap::new();
        };
        let end = self.ends_at().unwrap_or(start);
        successors(Some(start.0), |d| d.next_day())
            .take_while(|&d| d <= end.0)
            .map(|d| (DatePoint(d), Highlight::new(d == start.0, d == end.0)))
            .collect()
    }

    pub(crate) fn display_text(&self) -> String {
        match *self {
            DateRange::Empty => String::new(),
            DateRange::Single(start) => start.short_display(),
            DateRange::Range(start, end) => {
                format!("{} – {}", start.short_display(), end.short_display())
            }
        }
    }
}

/// How a date covered by a selection should be drawn
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct Highlight {
    pub(crate) selected: bool,
    pub(crate) starting_day: bool,
    pub(crate) ending_day: bool,
    pub(crate) color: Color,
}

impl Highlight {
    fn new(starting_day: bool, ending_day: bool) -> Highlight {
        Highlight {
            selected: true,
            starting_day,
            ending_day,
            color: SELECTION_COLOR,
        }
    }

    pub(crate) fn is_edge(&self) -> bool {
        self.starting_day || self.ending_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn pt(date: Date) -> DatePoint {
        DatePoint::new(date)
    }

    #[test]
    fn test_pick_from_empty() {
        let r = DateRange::Empty.pick(pt(date!(2024 - 03 - 10)));
        assert_eq!(r, DateRange::Single(pt(date!(2024 - 03 - 10))));
        assert_eq!(r.starts_at(), Some(pt(date!(2024 - 03 - 10))));
        assert_eq!(r.ends_at(), None);
    }

    #[test]
    fn test_pick_after_single() {
        let r = DateRange::Single(pt(date!(2024 - 03 - 10))).pick(pt(date!(2024 - 03 - 12)));
        assert_eq!(
            r,
            DateRange::Range(pt(date!(2024 - 03 - 10)), pt(date!(2024 - 03 - 12)))
        );
    }

    #[test]
    fn test_pick_before_single_swaps() {
        let r = DateRange::Single(pt(date!(2024 - 03 - 10))).pick(pt(date!(2024 - 03 - 05)));
        assert_eq!(
            r,
            DateRange::Range(pt(date!(2024 - 03 - 05)), pt(date!(2024 - 03 - 10)))
        );
    }

    #[test]
    fn test_pick_same_day_gives_one_day_range() {
        let r = DateRange::Single(pt(date!(2024 - 03 - 10))).pick(pt(date!(2024 - 03 - 10)));
        assert_eq!(
            r,
            DateRange::Range(pt(date!(2024 - 03 - 10)), pt(date!(2024 - 03 - 10)))
        );
    }

    #[test]
    fn test_pick_on_range_restarts() {
        let range = DateRange::Range(pt(date!(2024 - 03 - 05)), pt(date!(2024 - 03 - 10)));
        for picked in [
            date!(2024 - 03 - 01),
            date!(2024 - 03 - 05),
            date!(2024 - 03 - 07),
            date!(2024 - 03 - 10),
            date!(2024 - 04 - 01),
        ] {
            assert_eq!(range.pick(pt(picked)), DateRange::Single(pt(picked)));
        }
    }

    #[test]
    fn test_pick_keeps_endpoints_ordered() {
        let days = successors(Some(date!(2023 - 12 - 28)), |d| d.next_day())
            .take(9)
            .map(pt)
            .collect::<Vec<_>>();
        let mut seen_ranges = 0;
        for &a in &days {
            for &b in &days {
                for &c in &days {
                    let mut r = DateRange::Empty;
                    for d in [a, b, c] {
                        r = r.pick(d);
                        if let Some((start, end)) = r.endpoints() {
                            assert!(start <= end, "{start} > {end} after picking {a}, {b}, {c}");
                            seen_ranges += 1;
                        }
                    }
                }
            }
        }
        assert_eq!(seen_ranges, days.len().pow(3));
    }

    #[test]
    fn test_pick_scenario() {
        let r = DateRange::Empty
            .pick(pt(date!(2024 - 03 - 10)))
            .pick(pt(date!(2024 - 03 - 05)));
        assert_eq!(r.starts_at(), Some(pt(date!(2024 - 03 - 05))));
        assert_eq!(r.ends_at(), Some(pt(date!(2024 - 03 - 10))));
        let r = r.pick(pt(date!(2024 - 03 - 20)));
        assert_eq!(r.starts_at(), Some(pt(date!(2024 - 03 - 20))));
        assert_eq!(r.ends_at(), None);
        let r = r.pick(pt(date!(2024 - 03 - 22)));
        assert_eq!(
            r,
            DateRange::Range(pt(date!(2024 - 03 - 20)), pt(date!(2024 - 03 - 22)))
        );
    }

    #[test]
    fn test_between() {
        assert_eq!(
            DateRange::between(pt(date!(2024 - 05 - 02)), pt(date!(2024 - 05 - 01))),
            DateRange::Range(pt(date!(2024 - 05 - 01)), pt(date!(2024 - 05 - 02)))
        );
    }

    #[test]
    fn test_marked_dates_empty() {
        assert!(DateRange::Empty.marked_dates().is_empty());
    }

    #[test]
    fn test_marked_dates_single() {
        let marked = DateRange::Single(pt(date!(2024 - 02 - 29))).marked_dates();
        assert_eq!(marked.len(), 1);
        let hl = marked[&pt(date!(2024 - 02 - 29))];
        assert!(hl.selected);
        assert!(hl.starting_day);
        assert!(hl.ending_day);
    }

    #[test]
    fn test_marked_dates_one_day_range() {
        let d = pt(date!(2024 - 03 - 10));
        let marked = DateRange::Range(d, d).marked_dates();
        assert_eq!(marked.len(), 1);
        assert!(marked[&d].starting_day && marked[&d].ending_day);
    }

    #[test]
    fn test_marked_dates_across_months() {
        let marked =
            DateRange::Range(pt(date!(2024 - 01 - 30)), pt(date!(2024 - 02 - 02))).marked_dates();
        let keys = marked.keys().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(
            keys,
            ["2024-01-30", "2024-01-31", "2024-02-01", "2024-02-02"]
        );
        let first = marked[&pt(date!(2024 - 01 - 30))];
        assert!(first.starting_day && !first.ending_day);
        let interior = marked[&pt(date!(2024 - 01 - 31))];
        assert!(interior.selected && !interior.is_edge());
        let last = marked[&pt(date!(2024 - 02 - 02))];
        assert!(!last.starting_day && last.ending_day);
        assert!(marked.values().all(|hl| hl.color == SELECTION_COLOR));
    }

    #[test]
    fn test_display_text() {
        assert_eq!(DateRange::Empty.display_text(), "");
        assert_eq!(
            DateRange::Single(pt(date!(2024 - 03 - 05))).display_text(),
            "05 Mar"
        );
        let r = DateRange::Range(pt(date!(2024 - 12 - 30)), pt(date!(2025 - 01 - 02)));
        assert_eq!(r.display_text(), "30 Dec – 02 Jan");
        assert_eq!(r.display_text(), r.display_text());
    }

    #[test]
    fn test_date_point_fields() {
        let d = pt(date!(2024 - 03 - 05));
        assert_eq!(d.to_string(), "2024-03-05");
        assert_eq!(d.timestamp(), 1_709_596_800);
        assert_eq!(pt(date!(1970 - 01 - 01)).timestamp(), 0);
    }
}
