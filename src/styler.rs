use crate::calendar::DateStyler;
use crate::range::{DatePoint, DateRange, Highlight};
use crate::theme::{BASE_STYLE, RANGE_EDGE_STYLE, RANGE_INTERIOR_STYLE, UNAVAILABLE_STYLE};
use ratatui::style::Style;
use std::collections::BTreeMap;
use time::Date;

/// Styles the days of a calendar according to the current selection.  Days
/// before `min_date` are drawn as unavailable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SelectionStyler {
    marked: BTreeMap<DatePoint, Highlight>,
    min_date: Date,
}

impl SelectionStyler {
    pub(crate) fn new(range: &DateRange, min_date: Date) -> SelectionStyler {
        SelectionStyler {
            marked: range.marked_dates(),
            min_date,
        }
    }

    pub(crate) fn update(&mut self, range: &DateRange) {
        self.marked = range.marked_dates();
    }
}

impl DateStyler for SelectionStyler {
    fn date_style(&self, date: Date) -> Style {
        match self.marked.get(&DatePoint::new(date)) {
            Some(hl) if hl.selected && hl.is_edge() => RANGE_EDGE_STYLE.bg(hl.color),
            Some(hl) if hl.selected => RANGE_INTERIOR_STYLE.fg(hl.color),
            _ if date < self.min_date => UNAVAILABLE_STYLE,
            _ => BASE_STYLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_date_style() {
        let range = DateRange::between(
            DatePoint::new(date!(2024 - 03 - 05)),
            DatePoint::new(date!(2024 - 03 - 07)),
        );
        let styler = SelectionStyler::new(&range, date!(2024 - 03 - 01));
        assert_eq!(styler.date_style(date!(2024 - 02 - 29)), UNAVAILABLE_STYLE);
        assert_eq!(styler.date_style(date!(2024 - 03 - 04)), BASE_STYLE);
        assert_eq!(styler.date_style(date!(2024 - 03 - 05)), RANGE_EDGE_STYLE);
        assert_eq!(styler.date_style(date!(2024 - 03 - 06)), RANGE_INTERIOR_STYLE);
        assert_eq!(styler.date_style(date!(2024 - 03 - 07)), RANGE_EDGE_STYLE);
        assert_eq!(styler.date_style(date!(2024 - 03 - 08)), BASE_STYLE);
    }

    #[test]
    fn test_update() {
        let mut styler = SelectionStyler::new(&DateRange::Empty, date!(2024 - 03 - 01));
        assert_eq!(styler.date_style(date!(2024 - 03 - 05)), BASE_STYLE);
        styler.update(&DateRange::Single(DatePoint::new(date!(2024 - 03 - 05))));
        assert_eq!(styler.date_style(date!(2024 - 03 - 05)), RANGE_EDGE_STYLE);
    }
}
