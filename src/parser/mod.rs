pub mod citations;
pub mod columns;
pub mod days;
pub mod feasts;
pub mod lines;
pub mod normalize;

use crate::calendar::CalendarTables;
use crate::source::PageBlock;
use days::DayPass;

/// One page of extracted text, already normalized into non-empty lines.
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based page number in the source document.
    pub number: usize,
    pub lines: Vec<String>,
    pub blocks: Option<Vec<PageBlock>>,
}

impl Page {
    pub fn from_text(number: usize, raw: &str) -> Page {
        Page {
            number,
            lines: normalize::page_lines(raw),
            blocks: None,
        }
    }
}

/// Split form-feed paged text into pages numbered from `first_number`.
pub fn pages_from_text(text: &str, first_number: usize) -> Vec<Page> {
    text.split('\x0c')
        .enumerate()
        .map(|(i, raw)| Page::from_text(first_number + i, raw))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Read the plain page text line by line.
    Lines,
    /// Rebuild lines from positioned blocks, pairing the entry column with the color column.
    Columns,
}

/// Day-grid pass: grid text → classified lines → day records.
pub fn day_pass(pages: &[Page], tables: &CalendarTables, strategy: Strategy) -> DayPass {
    match strategy {
        Strategy::Lines => days::build_days(pages, tables),
        Strategy::Columns => {
            let rebuilt: Vec<Page> = pages.iter().map(columns::rebuild_page).collect();
            days::build_days(&rebuilt, tables)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_feed_pages() {
        let pages = pages_from_text("JANUARY 2026\n1 Thu\x0c\x0c  2 Fri  ", 13);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].number, 13);
        assert_eq!(pages[0].lines, vec!["JANUARY 2026", "1 Thu"]);
        assert!(pages[1].lines.is_empty());
        assert_eq!(pages[2].number, 15);
        assert_eq!(pages[2].lines, vec!["2 Fri"]);
    }
}
