pub mod calendar_simple;
pub mod holidays;
pub mod weekly;

use std::collections::{BTreeMap, HashSet};

use chrono::Datelike;
use tracing::info;

use crate::calendar::CalendarTables;
use crate::model::{year_dates, CitationRecord, DayRecord, HolidayRecord, MajorFeast, WeekEntry};
use crate::parser::citations::citation_fragments;
use crate::parser::days::ParseWarning;
use calendar_simple::{simple_calendar, SimpleDay};
use weekly::{build_weekly_index, OrdinaryTimeNumbering};

/// Shape of the citations table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CitationMode {
    /// One row per date, readings joined.
    #[default]
    PerDate,
    /// One row per extracted reference.
    PerOccurrence,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions {
    pub ordinary_time: OrdinaryTimeNumbering,
    pub citations: CitationMode,
}

/// Everything the build writes, plus the warnings gathered on the way.
#[derive(Debug, Default)]
pub struct Dataset {
    pub days: Vec<DayRecord>,
    pub simple: Vec<SimpleDay>,
    pub weekly: Vec<WeekEntry>,
    pub citations: Vec<CitationRecord>,
    pub holidays: Vec<HolidayRecord>,
    pub major_feasts: Vec<MajorFeast>,
    pub warnings: Vec<ParseWarning>,
}

/// Merge day passes in priority order: the first record seen for a date wins.
pub fn merge_passes(passes: Vec<Vec<DayRecord>>) -> Vec<DayRecord> {
    let mut by_date = BTreeMap::new();
    for record in passes.into_iter().flatten() {
        by_date.entry(record.date).or_insert(record);
    }
    by_date.into_values().collect()
}

/// Give every date of the year at least one citation row, sorted by date.
pub fn citation_coverage(records: Vec<CitationRecord>, year: i32, mode: CitationMode) -> Vec<CitationRecord> {
    let mut by_date: BTreeMap<_, Vec<CitationRecord>> = BTreeMap::new();
    for record in records {
        let rows = by_date.entry(record.date).or_default();
        match mode {
            CitationMode::PerDate if rows.is_empty() => rows.push(record),
            CitationMode::PerDate => {}
            CitationMode::PerOccurrence => {
                let fragments = citation_fragments(&record.source_line);
                if fragments.is_empty() {
                    rows.push(record);
                    continue;
                }
                for fragment in fragments {
                    if !rows.iter().any(|r| r.citation_short == fragment) {
                        rows.push(CitationRecord {
                            date: record.date,
                            citation_short: fragment,
                            source_line: record.source_line.clone(),
                        });
                    }
                }
            }
        }
    }

    let mut missing = 0;
    for date in year_dates(year) {
        by_date.entry(date).or_insert_with(|| {
            missing += 1;
            vec![CitationRecord {
                date,
                citation_short: String::new(),
                source_line: String::new(),
            }]
        });
    }
    if missing > 0 {
        info!("{} dates have no readings; placeholders inserted", missing);
    }

    by_date
        .into_values()
        .flatten()
        .filter(|r| r.date.year() == year)
        .collect()
}

/// Sort by date and drop repeated (date, name) pairs.
pub fn dedup_major_feasts(mut feasts: Vec<MajorFeast>) -> Vec<MajorFeast> {
    let mut seen = HashSet::new();
    feasts.retain(|f| seen.insert((f.date, f.name.clone())));
    feasts.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
    feasts
}

pub fn assemble(
    passes: Vec<Vec<DayRecord>>,
    warnings: Vec<ParseWarning>,
    citations: Vec<CitationRecord>,
    major_feasts: Vec<MajorFeast>,
    tables: &CalendarTables,
    opts: AssembleOptions,
) -> Dataset {
    let days = merge_passes(passes);
    let simple = simple_calendar(&days);
    let weekly = build_weekly_index(tables, opts.ordinary_time);
    let holidays = holidays::holiday_table(&days, tables);
    let citations = citation_coverage(citations, tables.year, opts.citations);
    let major_feasts = dedup_major_feasts(major_feasts);

    info!(
        "Assembled {} days, {} weeks, {} citation rows, {} holidays, {} major feasts",
        days.len(),
        weekly.len(),
        citations.len(),
        holidays.len(),
        major_feasts.len()
    );

    Dataset {
        days,
        simple,
        weekly,
        citations,
        holidays,
        major_feasts,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarOverrides;
    use crate::model::{FeastCategory, Origin};
    use crate::parser::{day_pass, pages_from_text, Strategy};
    use chrono::NaiveDate;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn tables() -> CalendarTables {
        CalendarTables::for_year(2026, CalendarOverrides::default()).unwrap()
    }

    fn days(text: &str) -> Vec<DayRecord> {
        day_pass(&pages_from_text(text, 1), &tables(), Strategy::Lines).records
    }

    fn cite(date: NaiveDate, line: &str) -> CitationRecord {
        CitationRecord {
            date,
            citation_short: crate::parser::citations::shorten_citation(line),
            source_line: line.to_string(),
        }
    }

    #[test]
    fn first_pass_wins_and_sorted() {
        let primary = days("January 2026\n2 Fri Saints Basil and Gregory White\n3 Sat Holy Name White");
        let fallback = days("January 2026\n1 Thu Mary, Mother of God White\n2 Fri Other name Green");
        let merged = merge_passes(vec![primary, fallback]);
        let dates: Vec<NaiveDate> = merged.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(1, 1), d(1, 2), d(1, 3)]);
        assert_eq!(merged[1].feast_name, "Saints Basil and Gregory");
        assert_eq!(merged[0].origin, Origin::Parsed);
    }

    #[test]
    fn citations_cover_every_date() {
        let rows = citation_coverage(vec![cite(d(1, 2), "1 Jn 2:22-28/Jn 1:19-28 (205)")], 2026, CitationMode::PerDate);
        assert_eq!(rows.len(), 365);
        assert_eq!(rows[0].date, d(1, 1));
        assert_eq!(rows[0].citation_short, "");
        assert_eq!(rows[1].citation_short, "1 Jn 2:22-28 / Jn 1:19-28");
    }

    #[test]
    fn per_date_keeps_first() {
        let rows = citation_coverage(
            vec![cite(d(1, 2), "Mt 5:1-10"), cite(d(1, 2), "Lk 1:1-4")],
            2026,
            CitationMode::PerDate,
        );
        let jan2: Vec<&CitationRecord> = rows.iter().filter(|r| r.date == d(1, 2)).collect();
        assert_eq!(jan2.len(), 1);
        assert_eq!(jan2[0].citation_short, "Mt 5:1-10");
    }

    #[test]
    fn per_occurrence_splits_references() {
        let rows = citation_coverage(
            vec![cite(d(1, 2), "1 Jn 2:22-28/Jn 1:19-28 (205)")],
            2026,
            CitationMode::PerOccurrence,
        );
        assert_eq!(rows.len(), 366);
        let jan2: Vec<&str> = rows
            .iter()
            .filter(|r| r.date == d(1, 2))
            .map(|r| r.citation_short.as_str())
            .collect();
        assert_eq!(jan2, vec!["1 Jn 2:22-28", "Jn 1:19-28"]);
    }

    #[test]
    fn simple_projection() {
        let simple = simple_calendar(&days("January 2026\n1 Thu Mary, Mother of God Solemnity White"));
        assert_eq!(simple[0].day_of_month, 1);
        assert_eq!(simple[0].weekday, "Thu");
        assert_eq!(simple[0].color.to_string(), "White");
    }

    #[test]
    fn holidays_from_day_records() {
        let t = tables();
        let records = days("January 2026\n1 Thu Mary, Mother of God White\n2 Fri Weekday White\n\x0c19 Mon Weekday Green");
        let hol = holidays::holiday_table(&records, &t);
        let names: Vec<&str> = hol.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["New Year's Day", "Martin Luther King Jr. Day"]);
        assert!(hol.iter().all(|h| h.is_federal));
    }

    #[test]
    fn major_feasts_sorted_and_unique() {
        let f = |m, day, name: &str| MajorFeast {
            date: d(m, day),
            name: name.to_string(),
            category: FeastCategory::Saints,
        };
        let out = dedup_major_feasts(vec![f(3, 19, "Saint Joseph"), f(1, 28, "Saint Thomas"), f(3, 19, "Saint Joseph")]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date, d(1, 28));
    }
}
