use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Deserialize;
use tracing::info;

use crate::model::Season;

/// Easter Sunday per year, precomputed.
const EASTER_DATES: &[(i32, u32, u32)] = &[
    (2024, 3, 31),
    (2025, 4, 20),
    (2026, 4, 5),
    (2027, 3, 28),
    (2028, 4, 16),
    (2029, 4, 1),
    (2030, 4, 21),
    (2031, 4, 13),
    (2032, 3, 28),
    (2033, 4, 17),
    (2034, 4, 9),
    (2035, 3, 25),
];

#[derive(Debug, Clone)]
pub struct Holiday {
    pub name: String,
    pub federal: bool,
}

/// One contiguous stretch of a season inside the target year.
#[derive(Debug, Clone)]
pub struct SeasonSpan {
    pub season: Season,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Date-keyed lookup tables for one target year.
#[derive(Debug, Clone)]
pub struct CalendarTables {
    pub year: i32,
    pub easter: NaiveDate,
    pub holy_days: BTreeMap<NaiveDate, String>,
    pub us_holidays: BTreeMap<NaiveDate, Holiday>,
    pub seasons: Vec<SeasonSpan>,
}

/// Optional JSON file overriding the built-in tables.
#[derive(Debug, Default, Deserialize)]
pub struct CalendarOverrides {
    pub easter: Option<NaiveDate>,
    pub christmas_season_end: Option<NaiveDate>,
    pub holy_days: Option<BTreeMap<NaiveDate, String>>,
    pub us_holidays: Option<Vec<HolidayOverride>>,
}

#[derive(Debug, Deserialize)]
pub struct HolidayOverride {
    pub date: NaiveDate,
    pub name: String,
    #[serde(default = "default_federal")]
    pub federal: bool,
}

fn default_federal() -> bool {
    true
}

impl CalendarOverrides {
    pub fn load(path: &Path) -> Result<CalendarOverrides> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read calendar file: {}", path.display()))?;
        let overrides: CalendarOverrides = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid calendar file: {}", path.display()))?;
        info!("Loaded calendar overrides from {}", path.display());
        Ok(overrides)
    }
}

impl CalendarTables {
    pub fn for_year(year: i32, overrides: CalendarOverrides) -> Result<CalendarTables> {
        let easter = match overrides.easter.or_else(|| easter_date(year)) {
            Some(e) if e.year() == year => e,
            Some(e) => bail!("Easter date {} is not in target year {}", e, year),
            None => bail!(
                "No precomputed Easter date for {}; supply one with --calendar",
                year
            ),
        };

        let christmas_end = match overrides.christmas_season_end {
            Some(d) => d,
            None => ymd(year, 1, 5)?,
        };

        let holy_days = match overrides.holy_days {
            Some(days) => days,
            None => default_holy_days(year, easter)?,
        };

        let us_holidays = match overrides.us_holidays {
            Some(list) => list
                .into_iter()
                .map(|h| {
                    (
                        h.date,
                        Holiday {
                            name: h.name,
                            federal: h.federal,
                        },
                    )
                })
                .collect(),
            None => federal_holidays(year)?,
        };

        let seasons = season_spans(year, easter, christmas_end)?;

        Ok(CalendarTables {
            year,
            easter,
            holy_days,
            us_holidays,
            seasons,
        })
    }

    pub fn is_holy_day(&self, date: NaiveDate) -> bool {
        self.holy_days.contains_key(&date)
    }

    pub fn holiday(&self, date: NaiveDate) -> Option<&Holiday> {
        self.us_holidays.get(&date)
    }

    /// Index into `seasons` of the span containing `date`.
    pub fn season_span_index(&self, date: NaiveDate) -> Option<usize> {
        self.seasons
            .iter()
            .position(|s| s.start <= date && date <= s.end)
    }

    pub fn season_of(&self, date: NaiveDate) -> Season {
        self.season_span_index(date)
            .map(|i| self.seasons[i].season)
            .unwrap_or(Season::OrdinaryTime)
    }
}

pub fn easter_date(year: i32) -> Option<NaiveDate> {
    EASTER_DATES
        .iter()
        .find(|(y, _, _)| *y == year)
        .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(*y, *m, *d))
}

/// First Sunday of Advent: the Sunday falling between Nov 27 and Dec 3.
pub fn advent_start(year: i32) -> Result<NaiveDate> {
    let dec3 = ymd(year, 12, 3)?;
    Ok(dec3 - Duration::days(dec3.weekday().num_days_from_sunday() as i64))
}

fn season_spans(year: i32, easter: NaiveDate, christmas_end: NaiveDate) -> Result<Vec<SeasonSpan>> {
    let ash_wednesday = easter - Duration::days(46);
    let pentecost = easter + Duration::days(49);
    let advent = advent_start(year)?;
    let christmas = ymd(year, 12, 25)?;
    let one = Duration::days(1);

    let span = |season, start, end| SeasonSpan { season, start, end };
    Ok(vec![
        span(Season::Christmas, ymd(year, 1, 1)?, christmas_end),
        span(Season::OrdinaryTime, christmas_end + one, ash_wednesday - one),
        span(Season::Lent, ash_wednesday, easter - one),
        span(Season::Easter, easter, pentecost),
        span(Season::OrdinaryTime, pentecost + one, advent - one),
        span(Season::Advent, advent, christmas - one),
        span(Season::Christmas, christmas, ymd(year, 12, 31)?),
    ])
}

fn default_holy_days(year: i32, easter: NaiveDate) -> Result<BTreeMap<NaiveDate, String>> {
    let mut days = BTreeMap::new();
    days.insert(ymd(year, 1, 1)?, "Mary, Mother of God".to_string());
    days.insert(easter + Duration::days(39), "Ascension of the Lord".to_string());
    days.insert(ymd(year, 8, 15)?, "Assumption of the Blessed Virgin Mary".to_string());
    days.insert(ymd(year, 11, 1)?, "All Saints".to_string());
    days.insert(ymd(year, 12, 8)?, "Immaculate Conception".to_string());
    days.insert(ymd(year, 12, 25)?, "Christmas".to_string());
    Ok(days)
}

fn federal_holidays(year: i32) -> Result<BTreeMap<NaiveDate, Holiday>> {
    let rules: Vec<(&str, NaiveDate)> = vec![
        ("New Year's Day", ymd(year, 1, 1)?),
        ("Martin Luther King Jr. Day", nth_weekday(year, 1, Weekday::Mon, 3)?),
        ("Washington's Birthday", nth_weekday(year, 2, Weekday::Mon, 3)?),
        ("Memorial Day", last_weekday(year, 5, Weekday::Mon)?),
        ("Juneteenth", ymd(year, 6, 19)?),
        ("Independence Day", ymd(year, 7, 4)?),
        ("Labor Day", nth_weekday(year, 9, Weekday::Mon, 1)?),
        ("Columbus Day", nth_weekday(year, 10, Weekday::Mon, 2)?),
        ("Veterans Day", ymd(year, 11, 11)?),
        ("Thanksgiving Day", nth_weekday(year, 11, Weekday::Thu, 4)?),
        ("Christmas Day", ymd(year, 12, 25)?),
    ];
    Ok(rules
        .into_iter()
        .map(|(name, date)| {
            (
                date,
                Holiday {
                    name: name.to_string(),
                    federal: true,
                },
            )
        })
        .collect())
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("Invalid date {}-{:02}-{:02}", year, month, day))
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Result<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
        .with_context(|| format!("No {}th {:?} in {}-{:02}", n, weekday, year, month))
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Result<NaiveDate> {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let mut date = ymd(ny, nm, 1)? - Duration::days(1);
    while date.weekday() != weekday {
        date -= Duration::days(1);
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn tables() -> CalendarTables {
        CalendarTables::for_year(2026, CalendarOverrides::default()).unwrap()
    }

    #[test]
    fn federal_holidays_2026() {
        let t = tables();
        let name = |date| t.holiday(date).map(|h| h.name.as_str());
        assert_eq!(name(d(1, 19)), Some("Martin Luther King Jr. Day"));
        assert_eq!(name(d(2, 16)), Some("Washington's Birthday"));
        assert_eq!(name(d(5, 25)), Some("Memorial Day"));
        assert_eq!(name(d(9, 7)), Some("Labor Day"));
        assert_eq!(name(d(10, 12)), Some("Columbus Day"));
        assert_eq!(name(d(11, 26)), Some("Thanksgiving Day"));
        assert_eq!(t.us_holidays.len(), 11);
    }

    #[test]
    fn holy_days_2026() {
        let t = tables();
        assert!(t.is_holy_day(d(1, 1)));
        assert!(t.is_holy_day(d(5, 14)));
        assert!(t.is_holy_day(d(12, 8)));
        assert!(!t.is_holy_day(d(1, 6)));
    }

    #[test]
    fn season_boundaries_2026() {
        let t = tables();
        assert_eq!(t.season_of(d(1, 5)), Season::Christmas);
        assert_eq!(t.season_of(d(1, 6)), Season::OrdinaryTime);
        assert_eq!(t.season_of(d(2, 17)), Season::OrdinaryTime);
        assert_eq!(t.season_of(d(2, 18)), Season::Lent);
        assert_eq!(t.season_of(d(4, 4)), Season::Lent);
        assert_eq!(t.season_of(d(4, 5)), Season::Easter);
        assert_eq!(t.season_of(d(5, 24)), Season::Easter);
        assert_eq!(t.season_of(d(5, 25)), Season::OrdinaryTime);
        assert_eq!(t.season_of(d(11, 29)), Season::Advent);
        assert_eq!(t.season_of(d(12, 25)), Season::Christmas);
    }

    #[test]
    fn seasons_cover_year_contiguously() {
        let t = tables();
        assert_eq!(t.seasons.first().unwrap().start, d(1, 1));
        assert_eq!(t.seasons.last().unwrap().end, d(12, 31));
        for pair in t.seasons.windows(2) {
            assert_eq!(pair[0].end + Duration::days(1), pair[1].start);
        }
    }

    #[test]
    fn advent_start_dates() {
        assert_eq!(advent_start(2025).unwrap(), NaiveDate::from_ymd_opt(2025, 11, 30).unwrap());
        assert_eq!(advent_start(2026).unwrap(), d(11, 29));
    }

    #[test]
    fn unknown_year_needs_override() {
        assert!(CalendarTables::for_year(2050, CalendarOverrides::default()).is_err());
        let overrides = CalendarOverrides {
            easter: NaiveDate::from_ymd_opt(2050, 4, 10),
            ..Default::default()
        };
        assert!(CalendarTables::for_year(2050, overrides).is_ok());
    }

    #[test]
    fn overrides_parse_from_json() {
        let json = r#"{
            "holy_days": {"2026-01-01": "Mary, Mother of God"},
            "us_holidays": [{"date": "2026-07-03", "name": "Independence Day (observed)"}]
        }"#;
        let overrides: CalendarOverrides = serde_json::from_str(json).unwrap();
        let t = CalendarTables::for_year(2026, overrides).unwrap();
        assert_eq!(t.holy_days.len(), 1);
        let h = t.holiday(d(7, 3)).unwrap();
        assert!(h.federal);
        assert!(t.holiday(d(7, 4)).is_none());
    }
}
