use super::util::{weeks_after, weeks_around, weeks_before, Week};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use thiserror::Error;
use time::Date;

/// The span of weeks currently shown by the calendar.  The weeks are only
/// computed once the calendar is first drawn and its height is known.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct WeekWindow {
    start_date: Date,
    // Invariant: If Some, the deque is nonempty
    weeks: Option<VecDeque<Week>>,
}

impl WeekWindow {
    pub(crate) fn new(start_date: Date) -> Self {
        WeekWindow {
            start_date,
            weeks: None,
        }
    }

    pub(super) fn ensure_weeks(&mut self, week_qty: NonZeroUsize) -> &VecDeque<Week> {
        if let Some(weeks) = self.weeks.as_mut() {
            match weeks.len().cmp(&week_qty.get()) {
                Ordering::Less => {
                    if let Some(mut extension) = NonZeroUsize::new(week_qty.get() - weeks.len())
                        .zip(weeks.back().copied())
                        .and_then(|(missing, back)| weeks_after(back, missing))
                    {
                        weeks.append(&mut extension);
                    }
                    if let Some(prextension) = NonZeroUsize::new(week_qty.get() - weeks.len())
                        .zip(weeks.front().copied())
                        .and_then(|(missing, front)| weeks_before(front, missing))
                    {
                        // The terminal was heightened while at the end of
                        // time, so "scroll" the calendar down by prepending
                        // weeks from before the window.
                        for w in prextension.into_iter().rev() {
                            weeks.push_front(w);
                        }
                    }
                }
                Ordering::Greater => weeks.truncate(week_qty.get()),
                Ordering::Equal => (),
            }
        }
        self.weeks
            .get_or_insert_with(|| weeks_around(self.start_date, week_qty))
    }

    /// Number of weeks on screen, if the calendar has been drawn
    pub(crate) fn week_count(&self) -> Option<usize> {
        self.weeks.as_ref().map(VecDeque::len)
    }

    /// Test whether `date` is currently on screen
    pub(crate) fn shows(&self, date: Date) -> bool {
        self.weeks
            .as_ref()
            .is_some_and(|weeks| weeks.iter().any(|w| w.contains(date)))
    }

    fn bounds(&self) -> Option<(Date, Date)> {
        let weeks = self.weeks.as_ref()?;
        Some((weeks.front()?.first(), weeks.back()?.last()))
    }

    /// Recenter the window on `date`
    pub(crate) fn jump_to_date(&mut self, date: Date) {
        self.start_date = date;
        if let Some(weeks) = self.weeks.as_mut() {
            if let Some(qty) = NonZeroUsize::new(weeks.len()) {
                *weeks = weeks_around(date, qty);
            }
        }
    }

    /// Scroll the window as little as possible so that `date` is on screen.
    /// Dates more than a page away cause the window to be recentered
    /// instead.
    pub(crate) fn reveal(&mut self, date: Date) {
        let Some((first, last)) = self.bounds() else {
            self.start_date = date;
            return;
        };
        let page_days = self
            .weeks
            .as_ref()
            .map_or(0, |weeks| i64::try_from(weeks.len()).unwrap_or(i64::MAX))
            .saturating_mul(7);
        if date < first {
            if (first - date).whole_days() > page_days {
                self.jump_to_date(date);
            } else {
                while !self.shows(date) && self.one_week_backwards().is_ok() {}
            }
        } else if date > last {
            if (date - last).whole_days() > page_days {
                self.jump_to_date(date);
            } else {
                while !self.shows(date) && self.one_week_forwards().is_ok() {}
            }
        }
    }

    pub(crate) fn one_week_forwards(&mut self) -> Result<(), OutOfTimeError> {
        let Some(weeks) = self.weeks.as_mut() else {
            return Ok(());
        };
        match weeks.back().and_then(Week::after) {
            Some(w) => {
                weeks.push_back(w);
                weeks.pop_front();
                Ok(())
            }
            None => Err(OutOfTimeError),
        }
    }

    pub(crate) fn one_week_backwards(&mut self) -> Result<(), OutOfTimeError> {
        let Some(weeks) = self.weeks.as_mut() else {
            return Ok(());
        };
        match weeks.front().and_then(Week::before) {
            Some(w) => {
                weeks.push_front(w);
                weeks.pop_back();
                Ok(())
            }
            None => Err(OutOfTimeError),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub(crate) struct OutOfTimeError;

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn window(date: Date, qty: usize) -> WeekWindow {
        let mut window = WeekWindow::new(date);
        window.ensure_weeks(NonZeroUsize::new(qty).unwrap());
        window
    }

    #[test]
    fn test_lazy_weeks() {
        let mut w = WeekWindow::new(date!(2025 - 01 - 22));
        assert!(!w.shows(date!(2025 - 01 - 22)));
        w.reveal(date!(2025 - 06 - 01));
        let weeks = w.ensure_weeks(NonZeroUsize::new(3).unwrap());
        assert_eq!(weeks.len(), 3);
        assert!(weeks[1].contains(date!(2025 - 06 - 01)));
    }

    #[test]
    fn test_shows() {
        let w = window(date!(2025 - 01 - 22), 3);
        assert!(w.shows(date!(2025 - 01 - 12)));
        assert!(w.shows(date!(2025 - 02 - 01)));
        assert!(!w.shows(date!(2025 - 01 - 11)));
        assert!(!w.shows(date!(2025 - 02 - 02)));
    }

    #[test]
    fn test_reveal_scrolls_minimally() {
        let mut w = window(date!(2025 - 01 - 22), 3);
        w.reveal(date!(2025 - 02 - 10));
        assert_eq!(w.bounds(), Some((date!(2025 - 01 - 26), date!(2025 - 02 - 15))));
        w.reveal(date!(2025 - 01 - 20));
        assert_eq!(w.bounds(), Some((date!(2025 - 01 - 19), date!(2025 - 02 - 08))));
        w.reveal(date!(2025 - 01 - 30));
        assert_eq!(w.bounds(), Some((date!(2025 - 01 - 19), date!(2025 - 02 - 08))));
    }

    #[test]
    fn test_reveal_far_away_recenters() {
        let mut w = window(date!(2025 - 01 - 22), 3);
        w.reveal(date!(2026 - 07 - 15));
        assert_eq!(w.bounds(), Some((date!(2026 - 07 - 05), date!(2026 - 07 - 25))));
    }

    #[test]
    fn test_resize() {
        let mut w = window(date!(2025 - 01 - 22), 3);
        assert_eq!(w.ensure_weeks(NonZeroUsize::new(5).unwrap()).len(), 5);
        assert_eq!(w.bounds(), Some((date!(2025 - 01 - 12), date!(2025 - 02 - 15))));
        assert_eq!(w.ensure_weeks(NonZeroUsize::new(2).unwrap()).len(), 2);
        assert_eq!(w.bounds(), Some((date!(2025 - 01 - 12), date!(2025 - 01 - 25))));
    }

    #[test]
    fn test_end_of_time() {
        let mut w = window(Date::MAX, 3);
        assert!(w.shows(Date::MAX));
        assert_eq!(w.one_week_forwards(), Err(OutOfTimeError));
        assert_eq!(w.one_week_backwards(), Ok(()));
    }
}
