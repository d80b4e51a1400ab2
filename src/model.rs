use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};

/// The five canonical liturgical colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiturgicalColor {
    Green,
    White,
    Violet,
    Red,
    Rose,
}

/// Every color word the calendar text may carry. Gold and black are accepted
/// in input but have no canonical color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorToken {
    Canonical(LiturgicalColor),
    Gold,
    Black,
}

const COLOR_TOKENS: &[(&str, ColorToken)] = &[
    ("green", ColorToken::Canonical(LiturgicalColor::Green)),
    ("white", ColorToken::Canonical(LiturgicalColor::White)),
    ("violet", ColorToken::Canonical(LiturgicalColor::Violet)),
    ("red", ColorToken::Canonical(LiturgicalColor::Red)),
    ("rose", ColorToken::Canonical(LiturgicalColor::Rose)),
    ("gold", ColorToken::Gold),
    ("black", ColorToken::Black),
];

impl ColorToken {
    pub fn parse(word: &str) -> Option<ColorToken> {
        let lower = word.trim().to_lowercase();
        COLOR_TOKENS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, token)| *token)
    }
}

impl LiturgicalColor {
    pub fn as_str(self) -> &'static str {
        match self {
            LiturgicalColor::Green => "Green",
            LiturgicalColor::White => "White",
            LiturgicalColor::Violet => "Violet",
            LiturgicalColor::Red => "Red",
            LiturgicalColor::Rose => "Rose",
        }
    }

    pub fn parse(word: &str) -> Option<LiturgicalColor> {
        match ColorToken::parse(word)? {
            ColorToken::Canonical(c) => Some(c),
            ColorToken::Gold | ColorToken::Black => None,
        }
    }
}

/// One or two canonical colors, rendered joined by "/" ("Violet/White").
/// Empty when the color could not be determined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorSpec(Vec<LiturgicalColor>);

impl ColorSpec {
    /// Parse a color phrase such as "violet/white", "Violet or Rose" or "Gold".
    /// Non-canonical tokens are dropped, duplicates collapse, at most two remain.
    pub fn parse(text: &str) -> ColorSpec {
        let mut colors = Vec::new();
        for word in text
            .split(|c: char| c == '/' || c == ',' || c.is_whitespace())
            .filter(|w| !w.is_empty() && !w.eq_ignore_ascii_case("or"))
        {
            if let Some(c) = LiturgicalColor::parse(word) {
                if !colors.contains(&c) && colors.len() < 2 {
                    colors.push(c);
                }
            }
        }
        ColorSpec(colors)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ColorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|c| c.as_str()).collect();
        f.write_str(&names.join("/"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeastRank {
    Solemnity,
    Feast,
    Memorial,
    OptionalMemorial,
    Weekday,
    Sunday,
    #[default]
    None,
}

/// Keyword table for rank annotations, checked in order. "Optional Memorial"
/// precedes "Memorial". Weekday and Sunday only count when they are the whole
/// line, since both words are common inside feast names.
const RANK_KEYWORDS: &[(&str, FeastRank, bool)] = &[
    ("optional memorial", FeastRank::OptionalMemorial, false),
    ("solemnity", FeastRank::Solemnity, false),
    ("feast", FeastRank::Feast, false),
    ("memorial", FeastRank::Memorial, false),
    ("weekday", FeastRank::Weekday, true),
    ("sunday", FeastRank::Sunday, true),
];

impl FeastRank {
    pub fn as_str(self) -> &'static str {
        match self {
            FeastRank::Solemnity => "Solemnity",
            FeastRank::Feast => "Feast",
            FeastRank::Memorial => "Memorial",
            FeastRank::OptionalMemorial => "Optional Memorial",
            FeastRank::Weekday => "Weekday",
            FeastRank::Sunday => "Sunday",
            FeastRank::None => "",
        }
    }

    /// Find the first rank keyword in `text`, matching whole words.
    pub fn find_in(text: &str) -> Option<FeastRank> {
        let lower = text.trim().to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let joined = format!(" {} ", words.join(" "));

        RANK_KEYWORDS.iter().find_map(|(kw, rank, whole_line)| {
            let hit = if *whole_line {
                words.join(" ") == *kw
            } else {
                joined.contains(&format!(" {} ", kw))
            };
            hit.then_some(*rank)
        })
    }

    /// Accepts the rendered form produced by `as_str`.
    pub fn from_label(label: &str) -> Option<FeastRank> {
        [
            FeastRank::Solemnity,
            FeastRank::Feast,
            FeastRank::Memorial,
            FeastRank::OptionalMemorial,
            FeastRank::Weekday,
            FeastRank::Sunday,
            FeastRank::None,
        ]
        .into_iter()
        .find(|r| r.as_str() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    Advent,
    Christmas,
    OrdinaryTime,
    Lent,
    Easter,
}

impl Season {
    pub fn as_str(self) -> &'static str {
        match self {
            Season::Advent => "Advent",
            Season::Christmas => "Christmas",
            Season::OrdinaryTime => "Ordinary Time",
            Season::Lent => "Lent",
            Season::Easter => "Easter",
        }
    }

    pub fn from_label(label: &str) -> Option<Season> {
        [
            Season::Advent,
            Season::Christmas,
            Season::OrdinaryTime,
            Season::Lent,
            Season::Easter,
        ]
        .into_iter()
        .find(|s| s.as_str() == label)
    }
}

/// How a day record came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Parsed,
    GapFill,
}

#[derive(Debug, Clone)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub feast_name: String,
    pub rank: FeastRank,
    pub color: ColorSpec,
    pub is_holy_day: bool,
    pub us_holiday: Option<String>,
    pub is_first_friday: bool,
    pub is_first_saturday: bool,
    pub week_row: u32,
    pub weekday_col: u32,
    pub belongs_to_month: bool,
    pub source_page: usize,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationRecord {
    pub date: NaiveDate,
    pub citation_short: String,
    pub source_line: String,
}

#[derive(Debug, Clone)]
pub struct WeekEntry {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub season: Season,
    pub season_week: u32,
    /// "Week of Jan 26-Feb 1"
    pub week_label: String,
    /// "2nd Week of Lent"
    pub liturgical_label: String,
    pub iso_week: u32,
}

#[derive(Debug, Clone)]
pub struct HolidayRecord {
    pub date: NaiveDate,
    pub name: String,
    pub is_federal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeastCategory {
    Solemnities,
    Marian,
    Saints,
    Other,
}

impl FeastCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FeastCategory::Solemnities => "Solemnities",
            FeastCategory::Marian => "Marian",
            FeastCategory::Saints => "Saints",
            FeastCategory::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<FeastCategory> {
        [
            FeastCategory::Solemnities,
            FeastCategory::Marian,
            FeastCategory::Saints,
            FeastCategory::Other,
        ]
        .into_iter()
        .find(|c| c.as_str() == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MajorFeast {
    pub date: NaiveDate,
    pub name: String,
    pub category: FeastCategory,
}

// ── Date arithmetic shared by the builder, assembler and validator ──

/// Sunday=1 through Saturday=7.
pub fn weekday_column(date: NaiveDate) -> u32 {
    (date.weekday().num_days_from_monday() + 1) % 7 + 1
}

/// Row of `date` in a Sunday-first month grid, counted from 1.
pub fn week_row_in_month(date: NaiveDate) -> u32 {
    let first_col = date.with_day(1).map(weekday_column).unwrap_or(1);
    (date.day() + first_col - 2) / 7 + 1
}

pub fn is_first_friday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri && date.day() <= 7
}

pub fn is_first_saturday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sat && date.day() <= 7
}

pub fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Every date of `year` in ascending order.
pub fn year_dates(year: i32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.year() == year)
        .collect()
}
