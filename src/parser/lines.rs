use std::sync::LazyLock;

use chrono::Weekday;
use regex::Regex;

use crate::model::{ColorSpec, FeastRank};

const MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

const COLOR_WORDS: &str = "green|white|violet|red|rose|gold|black";

/// Headers other than a leading "MONTH YEAR" only count this close to the top
/// of a page.
const HEADER_WINDOW: usize = 5;

static MONTH_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^((?:[^\d\s]+\s+){{0,3}})({})(?:,?\s+(\d{{4}}))?$",
        MONTHS.join("|")
    ))
    .unwrap()
});
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-=_]{3,}$").unwrap());
static NOTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:notes?|footnotes?)[:\s]*$").unwrap());
static DAY_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(\d{{1,2}})\s+(?:(sun|mon|tue|wed|thu|fri|sat)\.?\s+)?(.+?)\s+((?:{c})(?:(?:\s*/\s*|\s+or\s+)(?:{c}))?)$",
        c = COLOR_WORDS
    ))
    .unwrap()
});
static DAY_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{1,2})\s+(sun|mon|tue|wed|thu|fri|sat)\b").unwrap());
static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[1-3]\s?)?[A-Za-z]+\.?\s*\d{1,3}:\d{1,3}").unwrap());
static LECTIONARY_NO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\d+\)").unwrap());
static BOOK_CHAPTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[1-3]\s?)?[A-Z][a-z]+\.?\s+\d{1,3}\b").unwrap());

/// A day line: number, optional weekday, feast text, trailing color phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct DayEntry {
    pub day: u32,
    pub weekday: Option<Weekday>,
    pub text: String,
    pub color: ColorSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    MonthHeader { month: u32, year: Option<i32> },
    DayEntry(DayEntry),
    RankAnnotation(FeastRank),
    SeparatorOrFootnote,
    CitationLine,
    Continuation,
    Unclassified,
}

/// Where a line sits on its page. Rank annotations depend on the line above.
pub struct LineContext<'a> {
    pub index: usize,
    pub lines: &'a [String],
}

/// Classify one normalized line. First match wins, in the order
/// MonthHeader, SeparatorOrFootnote, DayEntry, RankAnnotation, CitationLine,
/// Continuation.
pub fn classify(line: &str, ctx: &LineContext) -> LineKind {
    if let Some(header) = month_header_parts(line) {
        if header_allowed(&header, ctx) {
            return LineKind::MonthHeader {
                month: header.month,
                year: header.year,
            };
        }
    }

    if SEPARATOR_RE.is_match(line) || NOTES_RE.is_match(line) {
        return LineKind::SeparatorOrFootnote;
    }

    if let Some(entry) = day_entry(line) {
        return LineKind::DayEntry(entry);
    }

    let follows_day_entry = ctx.index > 0
        && ctx
            .lines
            .get(ctx.index - 1)
            .is_some_and(|prev| DAY_ENTRY_RE.is_match(prev));
    if follows_day_entry {
        if let Some(rank) = FeastRank::find_in(line).filter(|r| *r != FeastRank::None) {
            return LineKind::RankAnnotation(rank);
        }
    }

    if is_citation(line) {
        return LineKind::CitationLine;
    }

    if LECTIONARY_NO_RE.is_match(line) || BOOK_CHAPTER_RE.is_match(line) {
        return LineKind::Continuation;
    }

    LineKind::Unclassified
}

/// Classify every line of a page.
pub fn classify_page(lines: &[String]) -> Vec<LineKind> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| classify(line, &LineContext { index, lines }))
        .collect()
}

struct HeaderParts {
    month: u32,
    year: Option<i32>,
    prefixed: bool,
}

fn month_header_parts(line: &str) -> Option<HeaderParts> {
    let caps = MONTH_HEADER_RE.captures(line)?;
    Some(HeaderParts {
        month: month_number(&caps[2])?,
        year: caps.get(3).and_then(|y| y.as_str().parse().ok()),
        prefixed: !caps[1].is_empty(),
    })
}

/// "MONTH YEAR" counts anywhere. A bare month needs the top of the page; a
/// prefixed one also needs no day line above it, so "Ember Day in September"
/// inside the grid stays text.
fn header_allowed(header: &HeaderParts, ctx: &LineContext) -> bool {
    if !header.prefixed && header.year.is_some() {
        return true;
    }
    if ctx.index >= HEADER_WINDOW {
        return false;
    }
    !header.prefixed
        || !ctx.lines[..ctx.index]
            .iter()
            .any(|l| l.starts_with(|c: char| c.is_ascii_digit()))
}

pub fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .map(|i| i as u32 + 1)
}

pub fn day_entry(line: &str) -> Option<DayEntry> {
    let caps = DAY_ENTRY_RE.captures(line)?;
    Some(DayEntry {
        day: caps[1].parse().ok()?,
        weekday: caps.get(2).and_then(|w| parse_weekday(w.as_str())),
        text: caps[3].trim().to_string(),
        color: ColorSpec::parse(&caps[4]),
    })
}

/// Holds at least one book + chapter:verse reference.
pub fn is_citation(line: &str) -> bool {
    CITATION_RE.is_match(line)
}

/// "12 Fri" at line start: opens a new date in the readings layout.
pub fn day_marker(line: &str) -> Option<(u32, Option<Weekday>)> {
    let caps = DAY_MARKER_RE.captures(line)?;
    Some((caps[1].parse().ok()?, parse_weekday(&caps[2])))
}

fn parse_weekday(abbr: &str) -> Option<Weekday> {
    match abbr.to_lowercase().as_str() {
        "sun" => Some(Weekday::Sun),
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        _ => None,
    }
}
