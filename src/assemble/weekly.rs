use chrono::{Datelike, Duration, NaiveDate};

use crate::calendar::CalendarTables;
use crate::model::{Season, WeekEntry};

/// How the two Ordinary Time stretches of a year are numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OrdinaryTimeNumbering {
    /// The stretch after Pentecost carries on from the one before Lent.
    #[default]
    Continuous,
    /// Each stretch starts again at week 1.
    Reset,
}

pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// "Week of Jan 5-11", or "Week of Jan 26-Feb 1" across a month boundary.
pub fn week_label(start: NaiveDate, end: NaiveDate) -> String {
    if start.month() == end.month() {
        format!("Week of {} {}-{}", start.format("%b"), start.day(), end.day())
    } else {
        format!(
            "Week of {} {}-{} {}",
            start.format("%b"),
            start.day(),
            end.format("%b"),
            end.day()
        )
    }
}

/// Monday-to-Sunday weeks covering every date of the target year. A week takes
/// the season of its first in-year date; weeks number from 1 in each season
/// occurrence, except Ordinary Time under `Continuous`.
pub fn build_weekly_index(tables: &CalendarTables, numbering: OrdinaryTimeNumbering) -> Vec<WeekEntry> {
    let year = tables.year;
    let (Some(first), Some(last)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return Vec::new();
    };

    let mut weeks = Vec::new();
    let mut week_start = first - Duration::days(first.weekday().num_days_from_monday() as i64);
    let mut prev_span: Option<usize> = None;
    let mut counter = 0;
    let mut ordinary_count = 0;

    while week_start <= last {
        let week_end = week_start + Duration::days(6);
        let anchor = week_start.max(first);
        let span = tables.season_span_index(anchor);
        let season = tables.season_of(anchor);

        if span.is_some() && span == prev_span {
            counter += 1;
        } else if season == Season::OrdinaryTime && numbering == OrdinaryTimeNumbering::Continuous {
            counter = ordinary_count + 1;
        } else {
            counter = 1;
        }
        if season == Season::OrdinaryTime {
            ordinary_count = counter;
        }
        prev_span = span;

        weeks.push(WeekEntry {
            week_start,
            week_end,
            season,
            season_week: counter,
            week_label: week_label(week_start, week_end),
            liturgical_label: format!("{} Week of {}", ordinal(counter), season.as_str()),
            iso_week: week_start.iso_week().week(),
        });
        week_start += Duration::days(7);
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarOverrides;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn weeks(numbering: OrdinaryTimeNumbering) -> Vec<WeekEntry> {
        let tables = CalendarTables::for_year(2026, CalendarOverrides::default()).unwrap();
        build_weekly_index(&tables, numbering)
    }

    #[test]
    fn ordinals() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(22), "22nd");
        assert_eq!(ordinal(33), "33rd");
    }

    #[test]
    fn labels() {
        assert_eq!(week_label(d(2026, 1, 5), d(2026, 1, 11)), "Week of Jan 5-11");
        assert_eq!(week_label(d(2026, 1, 26), d(2026, 2, 1)), "Week of Jan 26-Feb 1");
    }

    #[test]
    fn weeks_partition_the_year() {
        let w = weeks(OrdinaryTimeNumbering::Continuous);
        assert!((52..=54).contains(&w.len()));
        assert_eq!(w[0].week_start, d(2025, 12, 29));
        assert!(w.last().unwrap().week_end >= d(2026, 12, 31));
        for pair in w.windows(2) {
            assert_eq!(pair[0].week_end + Duration::days(1), pair[1].week_start);
        }
        assert_eq!(w[0].season, Season::Christmas);
        assert_eq!(w[0].liturgical_label, "1st Week of Christmas");
        assert_eq!(w[1].season_week, 2);
    }

    #[test]
    fn lent_weeks_number_from_one() {
        let w = weeks(OrdinaryTimeNumbering::Continuous);
        let lent: Vec<&WeekEntry> = w.iter().filter(|e| e.season == Season::Lent).collect();
        assert_eq!(lent[0].week_start, d(2026, 2, 23));
        assert_eq!(lent[0].season_week, 1);
        assert_eq!(lent[1].liturgical_label, "2nd Week of Lent");
    }

    #[test]
    fn ordinary_time_numbering_modes() {
        let before_lent = d(2026, 2, 16);
        let after_pentecost = d(2026, 5, 25);

        let cont = weeks(OrdinaryTimeNumbering::Continuous);
        let first_ot = cont.iter().find(|e| e.week_start == before_lent).unwrap();
        let resumed = cont.iter().find(|e| e.week_start == after_pentecost).unwrap();
        assert_eq!(resumed.season, Season::OrdinaryTime);
        assert_eq!(resumed.season_week, first_ot.season_week + 1);

        let reset = weeks(OrdinaryTimeNumbering::Reset);
        let resumed = reset.iter().find(|e| e.week_start == after_pentecost).unwrap();
        assert_eq!(resumed.season_week, 1);
    }

    #[test]
    fn iso_week_of_start() {
        let w = weeks(OrdinaryTimeNumbering::Continuous);
        assert_eq!(w[0].iso_week, 1);
        assert_eq!(w[1].iso_week, 2);
    }
}
