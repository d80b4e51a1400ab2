use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::model::{
    days_in_year, is_first_friday, is_first_saturday, weekday_column, FeastCategory, FeastRank,
    LiturgicalColor, Season,
};
use crate::parser::days::ParseWarning;
use crate::tables::{
    CitationRow, DayRow, FeastRow, HolidayRow, SimpleRow, Table, TableSet, WeekRow,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub table: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub year: i32,
    pub row_counts: BTreeMap<String, usize>,
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }
}

const DAY_ROWS: RangeInclusive<usize> = 365..=372;
const WEEK_ROWS: RangeInclusive<usize> = 52..=54;
const HOLIDAY_ROWS: RangeInclusive<usize> = 8..=20;
const FEAST_ROWS: RangeInclusive<usize> = 10..=60;

/// Listing cap for per-date findings.
const MAX_LISTED: usize = 10;

struct Findings {
    table: &'static str,
    out: Vec<Finding>,
}

impl Findings {
    fn new(table: &'static str) -> Findings {
        Findings { table, out: Vec::new() }
    }

    fn warn(&mut self, message: String) {
        self.push(Severity::Warning, message);
    }

    fn info(&mut self, message: String) {
        self.push(Severity::Info, message);
    }

    fn push(&mut self, severity: Severity, message: String) {
        self.out.push(Finding {
            table: self.table.to_string(),
            severity,
            message,
        });
    }

    fn row_count(&mut self, count: usize, expected: &RangeInclusive<usize>) {
        if !expected.contains(&count) {
            self.warn(format!(
                "{} rows, expected {}-{}",
                count,
                expected.start(),
                expected.end()
            ));
        }
    }

    /// One finding per offending date, up to `MAX_LISTED`, then a summary.
    fn per_date(&mut self, what: &str, dates: &[NaiveDate]) {
        for date in dates.iter().take(MAX_LISTED) {
            self.warn(format!("{}: {}", what, date));
        }
        if dates.len() > MAX_LISTED {
            self.warn(format!("{}: {} more dates", what, dates.len() - MAX_LISTED));
        }
    }
}

fn is_color_field(value: &str) -> bool {
    !value.is_empty()
        && value.split('/').all(|part| {
            LiturgicalColor::parse(part).is_some_and(|c| c.as_str() == part)
        })
}

fn coverage(f: &mut Findings, dates: impl Iterator<Item = NaiveDate>, year: i32) {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let mut outside = Vec::new();
    for date in dates {
        if date.year() != year {
            outside.push(date);
        }
        if !seen.insert(date) {
            duplicates.push(date);
        }
    }
    let expected = days_in_year(year) as usize;
    let covered = seen.iter().filter(|d| d.year() == year).count();
    if covered != expected {
        f.warn(format!("covers {} of {} dates in {}", covered, expected, year));
        let missing: Vec<NaiveDate> = crate::model::year_dates(year)
            .into_iter()
            .filter(|d| !seen.contains(d))
            .collect();
        f.per_date("missing date", &missing);
    }
    f.per_date("duplicate date", &duplicates);
    f.per_date("date outside target year", &outside);
}

fn check_days(rows: &[DayRow], year: i32) -> Vec<Finding> {
    let mut f = Findings::new(DayRow::FILE);
    f.row_count(rows.len(), &DAY_ROWS);
    coverage(&mut f, rows.iter().map(|r| r.date), year);

    let mut bad_weekday = Vec::new();
    let mut bad_first = Vec::new();
    let mut no_color = Vec::new();
    for r in rows {
        if weekday_column(r.date) != r.weekday_col {
            bad_weekday.push(r.date);
        }
        if is_first_friday(r.date) != r.is_first_friday || is_first_saturday(r.date) != r.is_first_saturday {
            bad_first.push(r.date);
        }
        if FeastRank::from_label(&r.feast_rank).is_none() {
            f.warn(format!("{}: unknown rank {:?}", r.date, r.feast_rank));
        }
        if r.liturgical_color.is_empty() {
            no_color.push(r.date);
        } else if !is_color_field(&r.liturgical_color) {
            f.warn(format!("{}: unknown color {:?}", r.date, r.liturgical_color));
        }
    }
    f.per_date("weekday column disagrees with date", &bad_weekday);
    f.per_date("first Friday/Saturday flag wrong", &bad_first);
    f.per_date("no liturgical color", &no_color);
    f.out
}

fn check_simple(rows: &[SimpleRow], year: i32) -> Vec<Finding> {
    let mut f = Findings::new(SimpleRow::FILE);
    f.row_count(rows.len(), &DAY_ROWS);
    coverage(&mut f, rows.iter().map(|r| r.date), year);
    for r in rows {
        if r.date.format("%a").to_string() != r.day_of_week || r.date.day() != r.day_of_month {
            f.warn(format!("{}: day fields {} {} disagree with date", r.date, r.day_of_month, r.day_of_week));
        }
        if !r.liturgical_color.is_empty() && !is_color_field(&r.liturgical_color) {
            f.warn(format!("{}: unknown color {:?}", r.date, r.liturgical_color));
        }
    }
    f.out
}

fn check_weekly(rows: &[WeekRow]) -> Vec<Finding> {
    let mut f = Findings::new(WeekRow::FILE);
    f.row_count(rows.len(), &WEEK_ROWS);
    for pair in rows.windows(2) {
        if pair[0].week_end + Duration::days(1) != pair[1].week_start {
            f.warn(format!(
                "week ending {} is not followed by the next day ({})",
                pair[0].week_end, pair[1].week_start
            ));
        }
    }
    for r in rows {
        if r.week_end - r.week_start != Duration::days(6) {
            f.warn(format!("week {} spans {} to {}", r.week_label, r.week_start, r.week_end));
        }
        if Season::from_label(&r.season).is_none() {
            f.warn(format!("week {}: unknown season {:?}", r.week_start, r.season));
        }
    }
    f.out
}

fn check_citations(rows: &[CitationRow], year: i32) -> Vec<Finding> {
    let mut f = Findings::new(CitationRow::FILE);

    // Per-occurrence tables repeat dates on purpose; count distinct dates.
    let dates: HashSet<NaiveDate> = rows.iter().map(|r| r.date).collect();
    f.row_count(dates.len(), &DAY_ROWS);
    let expected = days_in_year(year) as usize;
    let covered = dates.iter().filter(|d| d.year() == year).count();
    if covered != expected {
        f.warn(format!("covers {} of {} dates in {}", covered, expected, year));
    }

    let empty = rows.iter().filter(|r| r.bible_citation_short.is_empty()).count();
    if empty > 0 {
        f.info(format!("{} rows have no citation", empty));
    }

    let shouting: Vec<NaiveDate> = rows
        .iter()
        .filter(|r| {
            let s = &r.bible_citation_short;
            s.chars().filter(|c| c.is_alphabetic()).count() > 1 && *s == s.to_uppercase()
        })
        .map(|r| r.date)
        .collect();
    if !shouting.is_empty() {
        f.info(format!(
            "{} citations are all upper case (first {})",
            shouting.len(),
            shouting[0]
        ));
    }
    f.out
}

fn check_holidays(rows: &[HolidayRow]) -> Vec<Finding> {
    let mut f = Findings::new(HolidayRow::FILE);
    f.row_count(rows.len(), &HOLIDAY_ROWS);
    let mut seen = HashSet::new();
    for r in rows {
        if !seen.insert(r.date) {
            f.warn(format!("duplicate holiday date {}", r.date));
        }
        if r.holiday_name.trim().is_empty() {
            f.warn(format!("{}: empty holiday name", r.date));
        }
    }
    f.out
}

fn check_major_feasts(rows: &[FeastRow]) -> Vec<Finding> {
    let mut f = Findings::new(FeastRow::FILE);
    f.row_count(rows.len(), &FEAST_ROWS);
    let mut seen = HashSet::new();
    for r in rows {
        if !seen.insert((&r.feast_date, &r.feast_name)) {
            f.warn(format!("duplicate feast {} {}", r.feast_date, r.feast_name));
        }
        if FeastCategory::from_label(&r.category).is_none() {
            f.warn(format!("{} {}: unknown category {:?}", r.feast_date, r.feast_name, r.category));
        }
    }
    f.out
}

fn check_warnings(warnings: &[ParseWarning]) -> Vec<Finding> {
    let mut f = Findings::new("parser");
    for w in warnings {
        f.warn(format!("page {}: {} ({:?})", w.page, w.message, w.line));
    }
    f.out
}

/// Run every check. Never fails: problems come back as findings.
pub fn validate(tables: &TableSet, warnings: &[ParseWarning], year: i32) -> Report {
    let mut findings = Vec::new();
    findings.extend(check_days(&tables.days, year));
    findings.extend(check_simple(&tables.simple, year));
    findings.extend(check_weekly(&tables.weekly));
    findings.extend(check_citations(&tables.citations, year));
    findings.extend(check_holidays(&tables.holidays));
    findings.extend(check_major_feasts(&tables.major_feasts));
    findings.extend(check_warnings(warnings));

    let row_counts = BTreeMap::from([
        (DayRow::FILE.to_string(), tables.days.len()),
        (SimpleRow::FILE.to_string(), tables.simple.len()),
        (WeekRow::FILE.to_string(), tables.weekly.len()),
        (CitationRow::FILE.to_string(), tables.citations.len()),
        (HolidayRow::FILE.to_string(), tables.holidays.len()),
        (FeastRow::FILE.to_string(), tables.major_feasts.len()),
    ]);

    Report {
        year,
        row_counts,
        findings,
    }
}

pub fn render_markdown(report: &Report) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# QC report {}\n", report.year);
    let _ = writeln!(md, "| Table | Rows |\n|---|---|");
    for (table, rows) in &report.row_counts {
        let _ = writeln!(md, "| {} | {} |", table, rows);
    }

    let _ = writeln!(
        md,
        "\n## Findings ({} warnings, {} total)\n",
        report.warning_count(),
        report.findings.len()
    );
    if report.findings.is_empty() {
        md.push_str("No findings.\n");
    }
    for finding in &report.findings {
        let tag = match finding.severity {
            Severity::Warning => "WARN",
            Severity::Info => "info",
        };
        let _ = writeln!(md, "- **{}** `{}`: {}", tag, finding.table, finding.message);
    }
    md
}

/// Write `qc_report.md` and `qc_report.json` into `dir`.
pub fn write_report(dir: &Path, report: &Report) -> Result<()> {
    let md_path = dir.join("qc_report.md");
    std::fs::write(&md_path, render_markdown(report))
        .with_context(|| format!("Failed to write {}", md_path.display()))?;

    let json_path = dir.join("qc_report.json");
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&json_path, json).with_context(|| format!("Failed to write {}", json_path.display()))?;

    info!(
        "QC report: {} findings ({} warnings) -> {}",
        report.findings.len(),
        report.warning_count(),
        md_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{assemble, AssembleOptions};
    use crate::calendar::{CalendarOverrides, CalendarTables};
    use crate::model::year_dates;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn day_row(date: NaiveDate) -> DayRow {
        DayRow {
            date,
            feast_primary_name: "Weekday".into(),
            feast_rank: String::new(),
            liturgical_color: "Green".into(),
            is_holy_day_of_obligation: false,
            us_holiday_name: String::new(),
            is_first_friday: is_first_friday(date),
            is_first_saturday: is_first_saturday(date),
            week_row: 1,
            weekday_col: weekday_column(date),
            display_date_number: date.day(),
            belongs_to_month: true,
            source_page: 13,
        }
    }

    fn full_year() -> Vec<DayRow> {
        year_dates(2026).into_iter().map(day_row).collect()
    }

    fn messages(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.message.as_str()).collect()
    }

    #[test]
    fn clean_day_table_has_no_findings() {
        assert!(check_days(&full_year(), 2026).is_empty());
    }

    #[test]
    fn gap_and_duplicate_reported() {
        let mut rows = full_year();
        rows.retain(|r| r.date != d(3, 16));
        rows.push(day_row(d(1, 1)));
        let f = check_days(&rows, 2026);
        let msgs = messages(&f);
        assert!(msgs.contains(&"covers 364 of 365 dates in 2026"));
        assert!(msgs.contains(&"missing date: 2026-03-16"));
        assert!(msgs.contains(&"duplicate date: 2026-01-01"));
    }

    #[test]
    fn weekday_and_flags_recomputed() {
        let mut rows = full_year();
        rows[0].weekday_col = 1;
        rows[1].is_first_friday = false;
        let msgs_owned = check_days(&rows, 2026);
        let msgs = messages(&msgs_owned);
        assert!(msgs.contains(&"weekday column disagrees with date: 2026-01-01"));
        assert!(msgs.contains(&"first Friday/Saturday flag wrong: 2026-01-02"));
    }

    #[test]
    fn enum_membership() {
        let mut rows = full_year();
        rows[0].liturgical_color = "Violet/White".into();
        rows[1].liturgical_color = "Violet/Gold".into();
        rows[2].feast_rank = "Vigil".into();
        rows[3].feast_rank = "Optional Memorial".into();
        let f = check_days(&rows, 2026);
        assert_eq!(f.len(), 2);
        assert!(f[0].message.contains("Vigil") || f[1].message.contains("Vigil"));
        assert!(f.iter().any(|x| x.message.contains("Violet/Gold")));
    }

    #[test]
    fn weekly_gap_reported() {
        let tables = CalendarTables::for_year(2026, CalendarOverrides::default()).unwrap();
        let dataset = assemble(vec![], vec![], vec![], vec![], &tables, AssembleOptions::default());
        let mut set = TableSet::from(&dataset);
        assert!(check_weekly(&set.weekly).is_empty());
        set.weekly.remove(10);
        let f = check_weekly(&set.weekly);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].severity, Severity::Warning);
    }

    #[test]
    fn upper_case_citations_flagged() {
        let rows: Vec<CitationRow> = year_dates(2026)
            .into_iter()
            .map(|date| CitationRow {
                date,
                bible_citation_short: if date == d(1, 1) { "NM 6:22-27".into() } else { "Mt 5:1".into() },
                source_line: String::new(),
            })
            .collect();
        let f = check_citations(&rows, 2026);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].severity, Severity::Info);
        assert!(f[0].message.contains("2026-01-01"));
    }

    #[test]
    fn repeated_dates_count_once() {
        let rows: Vec<CitationRow> = year_dates(2026)
            .into_iter()
            .flat_map(|date| {
                ["Mt 5:1", "Lk 1:1-4"].map(|c| CitationRow {
                    date,
                    bible_citation_short: c.into(),
                    source_line: String::new(),
                })
            })
            .collect();
        assert_eq!(rows.len(), 730);
        assert!(check_citations(&rows, 2026).is_empty());
    }

    #[test]
    fn report_renders_and_writes() {
        let tables = CalendarTables::for_year(2026, CalendarOverrides::default()).unwrap();
        let dataset = assemble(vec![], vec![], vec![], vec![], &tables, AssembleOptions::default());
        let set = TableSet::from(&dataset);
        let warning = ParseWarning {
            page: 14,
            line: "1 Sun Weekday Green".into(),
            message: "day 1 follows a later day without a month header; assumed 2026-02".into(),
        };
        let report = validate(&set, &[warning], 2026);
        assert!(report.warning_count() > 0);
        assert_eq!(report.row_counts["weekly_index.csv"], 53);

        let md = render_markdown(&report);
        assert!(md.starts_with("# QC report 2026"));
        assert!(md.contains("`parser`: page 14"));

        let dir = tempfile::tempdir().unwrap();
        write_report(dir.path(), &report).unwrap();
        let json = std::fs::read_to_string(dir.path().join("qc_report.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["year"], 2026);
        assert!(dir.path().join("qc_report.md").exists());
    }
}
