use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use super::lines::month_number;
use super::Page;
use crate::model::{FeastCategory, MajorFeast};

static CATEGORY_HEADERS: LazyLock<Vec<(Regex, FeastCategory)>> = LazyLock::new(|| {
    [
        (
            r"(?i)^(?:holy days? of obligation|(?:principal )?solemnities(?: of the lord)?|solemnities and feasts of the lord)$",
            FeastCategory::Solemnities,
        ),
        (
            r"(?i)^(?:marian (?:feasts|solemnities|celebrations)|feasts of (?:the blessed virgin )?mary|feasts of our lady)$",
            FeastCategory::Marian,
        ),
        (r"(?i)^(?:(?:major )?saints|feasts of (?:the )?saints|saints'? days)$", FeastCategory::Saints),
        (r"(?i)^other (?:feasts|celebrations|observances)$", FeastCategory::Other),
    ]
    .into_iter()
    .map(|(re, cat)| (Regex::new(re).unwrap(), cat))
    .collect()
});

static NAMED_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})\b(?:,?\s+\d{4})?\s*[-:]?\s*(.*)$",
    )
    .unwrap()
});
static NUMERIC_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})\b\s*[-:]?\s*(.*)$").unwrap());
static SECTION_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:[-=_]{3,}|notes?:?|footnotes?:?)$").unwrap());
static PAGE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// No header seen yet; categories come from keywords.
    Unheaded,
    Category(FeastCategory),
    /// A separator closed the last section; lines wait for the next header.
    Closed,
}

pub fn category_header(line: &str) -> Option<FeastCategory> {
    CATEGORY_HEADERS
        .iter()
        .find(|(re, _)| re.is_match(line))
        .map(|(_, cat)| *cat)
}

/// Category for a feast listed outside any header.
pub fn classify_feast(name: &str) -> FeastCategory {
    let lower = name.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '.')
        .filter(|w| !w.is_empty())
        .collect();
    let has = |w: &str| words.contains(&w);

    if lower.contains("our lady") || has("mary") || has("marian") || lower.contains("blessed virgin") {
        FeastCategory::Marian
    } else if has("solemnity") || has("lord") {
        FeastCategory::Solemnities
    } else if has("saint") || has("saints") || has("st.") || has("sts.") {
        FeastCategory::Saints
    } else {
        FeastCategory::Other
    }
}

/// A "Jan 4 Name", "January 4, 2026 - Name" or "1/4 Name" line.
fn date_line(line: &str, year: i32) -> Option<(Option<NaiveDate>, String)> {
    let (month, day, rest) = if let Some(caps) = NAMED_DATE_RE.captures(line) {
        (month_prefix(&caps[1])?, caps[2].parse().ok()?, caps[3].to_string())
    } else if let Some(caps) = NUMERIC_DATE_RE.captures(line) {
        (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].to_string())
    } else {
        return None;
    };
    Some((NaiveDate::from_ymd_opt(year, month, day), rest.trim().to_string()))
}

fn month_prefix(abbr: &str) -> Option<u32> {
    let lower = abbr.to_lowercase();
    [
        "january", "february", "march", "april", "may", "june",
        "july", "august", "september", "october", "november", "december",
    ]
    .iter()
    .find(|m| m.starts_with(&lower))
    .and_then(|m| month_number(m))
}

struct Pending {
    date: NaiveDate,
    name: String,
    header: Option<FeastCategory>,
}

/// Parse the major-feasts region: category headers partition the date + name
/// lines that follow; undated lines continue the current feast's name.
pub fn parse_major_feasts(pages: &[Page], year: i32) -> Vec<MajorFeast> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut section = Section::Unheaded;
    let mut pending: Option<Pending> = None;

    let mut push = |p: Pending, out: &mut Vec<MajorFeast>| {
        if p.name.is_empty() {
            return;
        }
        let category = p.header.unwrap_or_else(|| classify_feast(&p.name));
        if seen.insert((p.date, p.name.clone())) {
            out.push(MajorFeast { date: p.date, name: p.name, category });
        }
    };

    for page in pages {
        // Names do not wrap across pages.
        if let Some(p) = pending.take() {
            push(p, &mut out);
        }

        for line in &page.lines {
            if let Some(cat) = category_header(line) {
                if let Some(p) = pending.take() {
                    push(p, &mut out);
                }
                section = Section::Category(cat);
                continue;
            }

            if SECTION_END_RE.is_match(line) {
                if let Some(p) = pending.take() {
                    push(p, &mut out);
                }
                if section != Section::Unheaded {
                    section = Section::Closed;
                }
                continue;
            }

            if section == Section::Closed {
                continue;
            }

            if let Some((date, name)) = date_line(line, year) {
                if let Some(p) = pending.take() {
                    push(p, &mut out);
                }
                let Some(date) = date else {
                    debug!("Page {}: invalid feast date in {:?}", page.number, line);
                    continue;
                };
                let header = match section {
                    Section::Category(cat) => Some(cat),
                    _ => None,
                };
                pending = Some(Pending { date, name, header });
                continue;
            }

            if PAGE_NUMBER_RE.is_match(line) {
                continue;
            }
            if let Some(p) = pending.as_mut() {
                if !p.name.is_empty() {
                    p.name.push(' ');
                }
                p.name.push_str(line);
            }
        }
    }

    if let Some(p) = pending.take() {
        push(p, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::pages_from_text;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn run(text: &str) -> Vec<MajorFeast> {
        parse_major_feasts(&pages_from_text(text, 1), 2026)
    }

    #[test]
    fn headers_partition_lines() {
        let feasts = run(
            "Solemnities\nJan 1 Mary, the Holy Mother of God\nDec 25 The Nativity of the Lord\nSaints\nMar 19 Saint Joseph\nJun 29 Saints Peter and Paul",
        );
        assert_eq!(feasts.len(), 4);
        assert_eq!(feasts[0].date, d(1, 1));
        // Header wins over keywords.
        assert_eq!(feasts[0].category, FeastCategory::Solemnities);
        assert_eq!(feasts[2].category, FeastCategory::Saints);
        assert_eq!(feasts[3].name, "Saints Peter and Paul");
    }

    #[test]
    fn continuation_appends_to_name() {
        let feasts = run("Marian Feasts\nAugust 15 The Assumption of the\nBlessed Virgin Mary\nDec 8 The Immaculate Conception");
        assert_eq!(feasts.len(), 2);
        assert_eq!(feasts[0].name, "The Assumption of the Blessed Virgin Mary");
        assert_eq!(feasts[0].date, d(8, 15));
        assert_eq!(feasts[1].category, FeastCategory::Marian);
    }

    #[test]
    fn name_on_following_line() {
        let feasts = run("Saints\n1/26\nSaints Timothy and Titus");
        assert_eq!(feasts.len(), 1);
        assert_eq!(feasts[0].date, d(1, 26));
        assert_eq!(feasts[0].name, "Saints Timothy and Titus");
    }

    #[test]
    fn keyword_category_before_any_header() {
        let feasts = run("Jan 4 The Epiphany of the Lord\nFeb 11 Our Lady of Lourdes\nJan 28 Saint Thomas Aquinas\nNov 2 All Souls");
        let cats: Vec<FeastCategory> = feasts.iter().map(|f| f.category).collect();
        assert_eq!(
            cats,
            vec![
                FeastCategory::Solemnities,
                FeastCategory::Marian,
                FeastCategory::Saints,
                FeastCategory::Other
            ]
        );
    }

    #[test]
    fn separator_ends_section() {
        let feasts = run("Saints\nMar 17 Saint Patrick\n---\nApr 1 Not a feast\nOther Celebrations\nNov 2 All Souls");
        assert_eq!(feasts.len(), 2);
        assert_eq!(feasts[1].name, "All Souls");
        assert_eq!(feasts[1].category, FeastCategory::Other);
    }

    #[test]
    fn duplicates_dropped_and_bad_dates_skipped() {
        let feasts = run("Saints\nMar 19 Saint Joseph\nFeb 30 Nobody\nMar 19 Saint Joseph");
        assert_eq!(feasts.len(), 1);
    }

    #[test]
    fn year_header_is_not_a_date() {
        assert!(date_line("January 2026", 2026).is_none());
        assert_eq!(date_line("Jan. 6, 2026 - Epiphany", 2026), Some((Some(d(1, 6)), "Epiphany".to_string())));
    }
}
