use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::info;

use crate::assemble::calendar_simple::SimpleDay;
use crate::assemble::Dataset;
use crate::model::{CitationRecord, DayRecord, HolidayRecord, MajorFeast, WeekEntry};

/// A CSV table: file name and header row.
pub trait Table: Serialize + DeserializeOwned {
    const FILE: &'static str;
    const HEADERS: &'static [&'static str];
}

// ── 0/1 flags ──

mod flag {
    use super::*;

    pub fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(d)?;
        match raw.trim().to_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("not a 0/1 flag: {:?}", other))),
        }
    }
}

// ── Rows ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRow {
    pub date: NaiveDate,
    pub feast_primary_name: String,
    pub feast_rank: String,
    pub liturgical_color: String,
    #[serde(with = "flag")]
    pub is_holy_day_of_obligation: bool,
    pub us_holiday_name: String,
    #[serde(with = "flag")]
    pub is_first_friday: bool,
    #[serde(with = "flag")]
    pub is_first_saturday: bool,
    pub week_row: u32,
    pub weekday_col: u32,
    pub display_date_number: u32,
    #[serde(with = "flag")]
    pub belongs_to_month: bool,
    pub source_page: usize,
}

impl Table for DayRow {
    const FILE: &'static str = "day_data.csv";
    const HEADERS: &'static [&'static str] = &[
        "date",
        "feast_primary_name",
        "feast_rank",
        "liturgical_color",
        "is_holy_day_of_obligation",
        "us_holiday_name",
        "is_first_friday",
        "is_first_saturday",
        "week_row",
        "weekday_col",
        "display_date_number",
        "belongs_to_month",
        "source_page",
    ];
}

impl From<&DayRecord> for DayRow {
    fn from(r: &DayRecord) -> DayRow {
        DayRow {
            date: r.date,
            feast_primary_name: r.feast_name.clone(),
            feast_rank: r.rank.as_str().to_string(),
            liturgical_color: r.color.to_string(),
            is_holy_day_of_obligation: r.is_holy_day,
            us_holiday_name: r.us_holiday.clone().unwrap_or_default(),
            is_first_friday: r.is_first_friday,
            is_first_saturday: r.is_first_saturday,
            week_row: r.week_row,
            weekday_col: r.weekday_col,
            display_date_number: r.date.day(),
            belongs_to_month: r.belongs_to_month,
            source_page: r.source_page,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimpleRow {
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub day_of_week: String,
    pub liturgical_color: String,
}

impl Table for SimpleRow {
    const FILE: &'static str = "liturgical_calendar_simple.csv";
    const HEADERS: &'static [&'static str] = &["Date", "DayOfMonth", "DayOfWeek", "LiturgicalColor"];
}

impl From<&SimpleDay> for SimpleRow {
    fn from(s: &SimpleDay) -> SimpleRow {
        SimpleRow {
            date: s.date,
            day_of_month: s.day_of_month,
            day_of_week: s.weekday.clone(),
            liturgical_color: s.color.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WeekRow {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub week_label: String,
    pub liturgical_week_label: String,
    pub season: String,
    pub season_week: u32,
    pub month_for_mini_cal: String,
    pub week_number_in_year: u32,
}

impl Table for WeekRow {
    const FILE: &'static str = "weekly_index.csv";
    const HEADERS: &'static [&'static str] = &[
        "WeekStart",
        "WeekEnd",
        "WeekLabel",
        "LiturgicalWeekLabel",
        "Season",
        "SeasonWeek",
        "MonthForMiniCal",
        "WeekNumberInYear",
    ];
}

impl From<&WeekEntry> for WeekRow {
    fn from(w: &WeekEntry) -> WeekRow {
        WeekRow {
            week_start: w.week_start,
            week_end: w.week_end,
            week_label: w.week_label.clone(),
            liturgical_week_label: w.liturgical_label.clone(),
            season: w.season.as_str().to_string(),
            season_week: w.season_week,
            month_for_mini_cal: w.week_start.format("%Y-%m").to_string(),
            week_number_in_year: w.iso_week,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CitationRow {
    pub date: NaiveDate,
    pub bible_citation_short: String,
    pub source_line: String,
}

impl Table for CitationRow {
    const FILE: &'static str = "daily_bible_citations.csv";
    const HEADERS: &'static [&'static str] = &["Date", "BibleCitationShort", "SourceLine"];
}

impl From<&CitationRecord> for CitationRow {
    fn from(c: &CitationRecord) -> CitationRow {
        CitationRow {
            date: c.date,
            bible_citation_short: c.citation_short.clone(),
            source_line: c.source_line.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HolidayRow {
    pub date: NaiveDate,
    pub holiday_name: String,
    #[serde(with = "flag")]
    pub is_federal_holiday: bool,
}

impl Table for HolidayRow {
    const FILE: &'static str = "us_holidays.csv";
    const HEADERS: &'static [&'static str] = &["Date", "HolidayName", "IsFederalHoliday"];
}

impl From<&HolidayRecord> for HolidayRow {
    fn from(h: &HolidayRecord) -> HolidayRow {
        HolidayRow {
            date: h.date,
            holiday_name: h.name.clone(),
            is_federal_holiday: h.is_federal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeastRow {
    /// "Jan 4"
    pub feast_date: String,
    pub feast_name: String,
    pub category: String,
}

impl Table for FeastRow {
    const FILE: &'static str = "major_feasts.csv";
    const HEADERS: &'static [&'static str] = &["FeastDate", "FeastName", "Category"];
}

impl From<&MajorFeast> for FeastRow {
    fn from(f: &MajorFeast) -> FeastRow {
        FeastRow {
            feast_date: f.date.format("%b %-d").to_string(),
            feast_name: f.name.clone(),
            category: f.category.as_str().to_string(),
        }
    }
}

// ── Table sets ──

/// All six output tables as rows.
#[derive(Debug, Default)]
pub struct TableSet {
    pub days: Vec<DayRow>,
    pub simple: Vec<SimpleRow>,
    pub weekly: Vec<WeekRow>,
    pub citations: Vec<CitationRow>,
    pub holidays: Vec<HolidayRow>,
    pub major_feasts: Vec<FeastRow>,
}

impl From<&Dataset> for TableSet {
    fn from(d: &Dataset) -> TableSet {
        TableSet {
            days: d.days.iter().map(DayRow::from).collect(),
            simple: d.simple.iter().map(SimpleRow::from).collect(),
            weekly: d.weekly.iter().map(WeekRow::from).collect(),
            citations: d.citations.iter().map(CitationRow::from).collect(),
            holidays: d.holidays.iter().map(HolidayRow::from).collect(),
            major_feasts: d.major_feasts.iter().map(FeastRow::from).collect(),
        }
    }
}

impl TableSet {
    pub fn write_all(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        write_table(dir, &self.days)?;
        write_table(dir, &self.simple)?;
        write_table(dir, &self.weekly)?;
        write_table(dir, &self.citations)?;
        write_table(dir, &self.holidays)?;
        write_table(dir, &self.major_feasts)?;
        Ok(())
    }

    pub fn read_all(dir: &Path) -> Result<TableSet> {
        Ok(TableSet {
            days: read_table(dir)?,
            simple: read_table(dir)?,
            weekly: read_table(dir)?,
            citations: read_table(dir)?,
            holidays: read_table(dir)?,
            major_feasts: read_table(dir)?,
        })
    }
}

/// Write `rows` to `dir/T::FILE`. The header row is written even for an empty table.
pub fn write_table<T: Table>(dir: &Path, rows: &[T]) -> Result<()> {
    let path = dir.join(T::FILE);
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    wtr.write_record(T::HEADERS)?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }
    wtr.flush()?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn read_table<T: Table>(dir: &Path) -> Result<Vec<T>> {
    let path = dir.join(T::FILE);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader.headers()?.clone();
    if headers.iter().ne(T::HEADERS.iter().copied()) {
        bail!(
            "{} has columns {:?}, expected {:?}",
            path.display(),
            headers.iter().collect::<Vec<_>>(),
            T::HEADERS
        );
    }

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: T = result.with_context(|| format!("Failed to parse row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}
