use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::debug;

use super::lines::{classify_page, day_marker, LineKind};
use super::Page;
use crate::model::CitationRecord;

static FRAGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[1-3]\s?)?[A-Z][a-z]+\.?\s?\d{1,3}(?::\d{1,3}[a-z]?(?:\s?[-,]\s?\d{1,3}(?::\d{1,3})?[a-z]?)*)?")
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationState {
    AwaitingFirstMonth,
    Active,
}

/// Collects the readings printed under each "day + weekday" marker.
pub struct CitationExtractor {
    target_year: i32,
    state: CitationState,
    year: i32,
    month: u32,
    current: Option<NaiveDate>,
    buffer: Vec<String>,
    /// Dec 31 was seen; stop once its page is done.
    finishing: bool,
    done: bool,
    out: Vec<CitationRecord>,
}

impl CitationExtractor {
    pub fn new(target_year: i32) -> CitationExtractor {
        CitationExtractor {
            target_year,
            state: CitationState::AwaitingFirstMonth,
            year: target_year,
            month: 1,
            current: None,
            buffer: Vec::new(),
            finishing: false,
            done: false,
            out: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn feed_page(&mut self, page: &Page) {
        if self.done {
            return;
        }

        let kinds = classify_page(&page.lines);
        for (line, kind) in page.lines.iter().zip(&kinds) {
            if self.state == CitationState::AwaitingFirstMonth {
                if let LineKind::MonthHeader { month, year } = kind {
                    self.set_month(*month, *year);
                    self.state = CitationState::Active;
                }
                continue;
            }

            if is_noise(line) {
                continue;
            }

            if let LineKind::MonthHeader { month, year } = kind {
                if self.finishing {
                    self.done = true;
                    break;
                }
                self.set_month(*month, *year);
                continue;
            }

            if let Some((day, _)) = day_marker(line) {
                self.flush();
                if self.finishing {
                    self.done = true;
                    break;
                }
                self.current = NaiveDate::from_ymd_opt(self.year, self.month, day);
                match self.current {
                    Some(date) if self.is_terminal(date) => self.finishing = true,
                    Some(_) => {}
                    None => debug!(
                        "Page {}: day {} invalid for {}-{:02}",
                        page.number, day, self.year, self.month
                    ),
                }
                continue;
            }

            match kind {
                LineKind::CitationLine if self.current.is_some() => self.buffer.push(line.clone()),
                LineKind::Continuation if !self.buffer.is_empty() => self.buffer.push(line.clone()),
                _ => {}
            }
        }

        if self.finishing {
            self.done = true;
        }
    }

    pub fn finish(mut self) -> Vec<CitationRecord> {
        self.flush();
        self.out
    }

    fn set_month(&mut self, month: u32, year: Option<i32>) {
        match year {
            Some(y) => self.year = y,
            None if self.state == CitationState::Active && month < self.month => self.year += 1,
            None => {}
        }
        self.month = month;
    }

    fn is_terminal(&self, date: NaiveDate) -> bool {
        date.year() == self.target_year && date.month() == 12 && date.day() == 31
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let buffer = std::mem::take(&mut self.buffer);
        let Some(date) = self.current else {
            return;
        };
        if date.year() != self.target_year {
            return;
        }
        self.out.push(CitationRecord {
            date,
            citation_short: shorten_citation(&buffer.join(" ")),
            source_line: buffer.join("; "),
        });
    }
}

/// Lines the readings layout uses for psalter notes, rules and asides.
fn is_noise(line: &str) -> bool {
    line.starts_with('-')
        || line.starts_with("_____")
        || line.starts_with('(')
        || line.to_lowercase().starts_with("pss prop")
        || line.chars().all(|c| c == '-')
}

/// Condense a block of readings into "Book ch:vv / Book ch:vv".
/// Text with no recognizable reference comes back trimmed.
pub fn shorten_citation(text: &str) -> String {
    let fragments = citation_fragments(text);
    if fragments.is_empty() {
        text.trim().to_string()
    } else {
        fragments.join(" / ")
    }
}

pub fn citation_fragments(text: &str) -> Vec<String> {
    FRAGMENT_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Run the extractor over `pages` in order, stopping after Dec 31.
pub fn extract_citations(pages: &[Page], target_year: i32) -> Vec<CitationRecord> {
    let mut extractor = CitationExtractor::new(target_year);
    for page in pages {
        if extractor.is_done() {
            debug!("Citation scan finished before page {}", page.number);
            break;
        }
        extractor.feed_page(page);
    }
    extractor.finish()
}
