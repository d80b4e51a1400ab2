use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use super::lines::{classify_page, DayEntry, LineKind};
use super::Page;
use crate::calendar::CalendarTables;
use crate::model::{
    is_first_friday, is_first_saturday, week_row_in_month, weekday_column, ColorSpec, DayRecord,
    FeastRank, Origin,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    NoMonth,
    InMonth,
    SkippingPage,
}

/// Irregularity noticed while building; surfaced by the validator, never fatal.
#[derive(Debug, Clone)]
pub struct ParseWarning {
    pub page: usize,
    pub line: String,
    pub message: String,
}

/// Cross-line, cross-page state of one builder pass.
#[derive(Debug)]
pub struct ParserState {
    pub mode: Mode,
    pub year: i32,
    pub month: u32,
    /// Last day number seen since the last month header or reset.
    pub prev_day: Option<u32>,
    /// Most recent successfully built record, for gap fill.
    pub last: Option<DayRecord>,
}

impl ParserState {
    pub fn new(year: i32) -> ParserState {
        ParserState {
            mode: Mode::NoMonth,
            year,
            month: 1,
            prev_day: None,
            last: None,
        }
    }

    fn reset_carry_forward(&mut self) {
        self.prev_day = None;
        self.last = None;
    }

    fn advance_month(&mut self) {
        if self.month == 12 {
            self.month = 1;
            self.year += 1;
        } else {
            self.month += 1;
        }
    }
}

/// Output of one pass: records in document order, possibly overlapping.
#[derive(Debug, Default)]
pub struct DayPass {
    pub records: Vec<DayRecord>,
    pub warnings: Vec<ParseWarning>,
}

pub struct DayBuilder<'a> {
    tables: &'a CalendarTables,
    state: ParserState,
    out: DayPass,
}

impl<'a> DayBuilder<'a> {
    pub fn new(tables: &'a CalendarTables) -> DayBuilder<'a> {
        DayBuilder {
            tables,
            state: ParserState::new(tables.year),
            out: DayPass::default(),
        }
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Feed one page. Pages must arrive in document order.
    pub fn feed_page(&mut self, page: &Page) {
        if self.state.mode == Mode::SkippingPage {
            self.state.mode = Mode::InMonth;
        }

        let kinds = classify_page(&page.lines);
        for (i, kind) in kinds.iter().enumerate() {
            if self.state.mode == Mode::SkippingPage {
                break;
            }
            match kind {
                LineKind::MonthHeader { month, year } => {
                    match year {
                        Some(y) => self.state.year = *y,
                        // "December" followed by a bare "January" crosses the year.
                        None if self.state.mode != Mode::NoMonth && *month < self.state.month => {
                            self.state.year += 1
                        }
                        None => {}
                    }
                    let skipped = (*month + 12 - self.state.month) % 12;
                    if year.is_none() && self.state.mode != Mode::NoMonth && skipped > 1 {
                        self.warn(
                            page,
                            &page.lines[i],
                            format!(
                                "month header jumps from {:02} to {:02} without a year",
                                self.state.month, month
                            ),
                        );
                    }
                    self.state.month = *month;
                    self.state.prev_day = None;
                    self.state.mode = Mode::InMonth;
                }
                LineKind::SeparatorOrFootnote if self.state.mode == Mode::InMonth => {
                    debug!("Page {}: separator at line {}, skipping rest of page", page.number, i + 1);
                    self.state.mode = Mode::SkippingPage;
                    self.state.reset_carry_forward();
                }
                LineKind::DayEntry(entry) if self.state.mode == Mode::InMonth => {
                    let rank = match kinds.get(i + 1) {
                        Some(LineKind::RankAnnotation(r)) => *r,
                        _ => FeastRank::None,
                    };
                    self.day_entry(page, &page.lines[i], entry, rank);
                }
                _ => {}
            }
        }
    }

    pub fn finish(self) -> DayPass {
        self.out
    }

    fn day_entry(&mut self, page: &Page, line: &str, entry: &DayEntry, rank: FeastRank) {
        // Rollover heuristic: a smaller day number without an intervening header
        // means the text moved into the next month.
        if self.state.prev_day.is_some_and(|prev| entry.day < prev) {
            self.state.advance_month();
            self.warn(
                page,
                line,
                format!(
                    "day {} follows a later day without a month header; assumed {}-{:02}",
                    entry.day, self.state.year, self.state.month
                ),
            );
        }
        self.state.prev_day = Some(entry.day);

        let Some(date) = NaiveDate::from_ymd_opt(self.state.year, self.state.month, entry.day) else {
            debug!(
                "Page {}: day {} invalid for {}-{:02}, line discarded",
                page.number, entry.day, self.state.year, self.state.month
            );
            return;
        };

        if let Some(weekday) = entry.weekday {
            if weekday != date.weekday() {
                self.warn(
                    page,
                    line,
                    format!("weekday {:?} does not match {} ({:?})", weekday, date, date.weekday()),
                );
            }
        }

        let record = self.make_record(
            date,
            entry.text.clone(),
            rank,
            entry.color.clone(),
            page.number,
            Origin::Parsed,
        );

        if let Some(prev) = self.state.last.take() {
            let gap = (date - prev.date).num_days();
            for offset in 1..gap {
                let missing = prev.date + Duration::days(offset);
                let filler = self.make_record(
                    missing,
                    prev.feast_name.clone(),
                    prev.rank,
                    prev.color.clone(),
                    page.number,
                    Origin::GapFill,
                );
                self.emit(filler);
            }
        }

        self.state.last = Some(record.clone());
        self.emit(record);
    }

    fn make_record(
        &self,
        date: NaiveDate,
        feast_name: String,
        rank: FeastRank,
        color: ColorSpec,
        source_page: usize,
        origin: Origin,
    ) -> DayRecord {
        DayRecord {
            date,
            feast_name,
            rank,
            color,
            is_holy_day: self.tables.is_holy_day(date),
            us_holiday: self.tables.holiday(date).map(|h| h.name.clone()),
            is_first_friday: is_first_friday(date),
            is_first_saturday: is_first_saturday(date),
            week_row: week_row_in_month(date),
            weekday_col: weekday_column(date),
            belongs_to_month: true,
            source_page,
            origin,
        }
    }

    fn emit(&mut self, record: DayRecord) {
        if record.date.year() == self.tables.year {
            self.out.records.push(record);
        } else {
            debug!("{} is outside {}, not emitted", record.date, self.tables.year);
        }
    }

    fn warn(&mut self, page: &Page, line: &str, message: String) {
        self.out.warnings.push(ParseWarning {
            page: page.number,
            line: line.to_string(),
            message,
        });
    }
}

/// Run the builder over `pages` in order.
pub fn build_days(pages: &[Page], tables: &CalendarTables) -> DayPass {
    let mut builder = DayBuilder::new(tables);
    for page in pages {
        builder.feed_page(page);
    }
    builder.finish()
}
