use std::sync::LazyLock;

use regex::Regex;

use super::lines::{day_entry, is_citation};
use super::normalize::page_lines;
use super::Page;
use crate::model::{ColorSpec, FeastRank};
use crate::source::PageBlock;

static LEADING_DAY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,2}\b").unwrap());

struct ColorBlock {
    y0: f64,
    y1: f64,
    color: ColorSpec,
}

/// Rebuild a page's lines from its positioned blocks.
///
/// The grid prints the entry (day, feast, readings) in a left column and the
/// color in a right column. Blocks are split at the mean block-center x; each
/// left block opening with a day number gets the color of the right-hand block
/// at its height appended to its entry line, so the ordinary line classifier
/// can read it. Pages without blocks come back unchanged.
pub fn rebuild_page(page: &Page) -> Page {
    let Some(blocks) = page.blocks.as_ref().filter(|b| !b.is_empty()) else {
        return page.clone();
    };

    let mut sorted: Vec<&PageBlock> = blocks.iter().filter(|b| !b.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));
    if sorted.is_empty() {
        return page.clone();
    }

    let split_x = sorted.iter().map(|b| b.center_x()).sum::<f64>() / sorted.len() as f64;

    let colors: Vec<ColorBlock> = sorted
        .iter()
        .filter(|b| b.center_x() > split_x)
        .filter_map(|b| {
            let color = ColorSpec::parse(&b.text);
            (!color.is_empty()).then_some(ColorBlock { y0: b.y0, y1: b.y1, color })
        })
        .collect();

    let mut lines = Vec::new();
    for block in sorted {
        let block_lines = page_lines(&block.text);
        if block_lines.is_empty() {
            continue;
        }

        if block.center_x() > split_x {
            // Color blocks are consumed by the entries they belong to.
            if ColorSpec::parse(&block.text).is_empty() {
                lines.extend(block_lines);
            }
            continue;
        }

        let opens_day = LEADING_DAY_RE.is_match(&block_lines[0]);
        let has_color = day_entry(&block_lines[0]).is_some();
        match associate_color(block.center_y(), &colors) {
            Some(color) if opens_day && !has_color => {
                lines.extend(join_entry(&block_lines, color));
            }
            _ => lines.extend(block_lines),
        }
    }

    Page {
        number: page.number,
        lines,
        blocks: None,
    }
}

/// Fold wrapped feast lines into one entry line ending in the color. A bare
/// rank label or a readings line ends the entry and is kept after it.
fn join_entry(block_lines: &[String], color: &ColorSpec) -> Vec<String> {
    let end = block_lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, l)| is_rank_label(l) || is_citation(l))
        .map(|(i, _)| i)
        .unwrap_or(block_lines.len());

    let mut out = Vec::with_capacity(block_lines.len() - end + 1);
    out.push(format!("{} {}", block_lines[..end].join(" "), color));
    out.extend(block_lines[end..].iter().cloned());
    out
}

fn is_rank_label(line: &str) -> bool {
    FeastRank::from_label(line).is_some_and(|r| r != FeastRank::None)
}

/// Color block containing `y`, else the nearest one.
fn associate_color(y: f64, colors: &[ColorBlock]) -> Option<&ColorSpec> {
    if let Some(hit) = colors.iter().find(|c| c.y0 <= y && y <= c.y1) {
        return Some(&hit.color);
    }
    colors
        .iter()
        .min_by(|a, b| distance(y, a).total_cmp(&distance(y, b)))
        .map(|c| &c.color)
}

fn distance(y: f64, c: &ColorBlock) -> f64 {
    (c.y0 - y).abs().min((c.y1 - y).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{CalendarOverrides, CalendarTables};
    use crate::model::FeastRank;
    use crate::parser::{day_pass, Strategy};

    fn block(x0: f64, y0: f64, x1: f64, y1: f64, text: &str) -> PageBlock {
        PageBlock { x0, y0, x1, y1, text: text.to_string() }
    }

    fn grid_page() -> Page {
        Page {
            number: 14,
            lines: Vec::new(),
            blocks: Some(vec![
                block(40.0, 20.0, 300.0, 40.0, "JANUARY 2026"),
                block(40.0, 60.0, 300.0, 110.0, "1 Thu Mary, the Holy\nMother of God\nSolemnity\nNm 6:22-27/Gal 4:4-7/Lk 2:16-21 (18)"),
                block(420.0, 60.0, 480.0, 75.0, "White"),
                block(40.0, 120.0, 300.0, 160.0, "2 Fri Saints Basil and Gregory\nMemorial"),
                block(420.0, 150.0, 480.0, 165.0, "White"),
                block(40.0, 170.0, 300.0, 200.0, "3 Sat Weekday"),
                block(420.0, 172.0, 480.0, 190.0, "Violet or white"),
            ]),
        }
    }

    #[test]
    fn rebuilds_entry_lines() {
        let page = rebuild_page(&grid_page());
        assert_eq!(page.number, 14);
        assert_eq!(
            page.lines,
            vec![
                "JANUARY 2026",
                "1 Thu Mary, the Holy Mother of God White",
                "Solemnity",
                "Nm 6:22-27/Gal 4:4-7/Lk 2:16-21 (18)",
                "2 Fri Saints Basil and Gregory White",
                "Memorial",
                "3 Sat Weekday Violet/White",
            ]
        );
    }

    #[test]
    fn nearest_color_when_not_contained() {
        let colors = vec![
            ColorBlock { y0: 10.0, y1: 20.0, color: ColorSpec::parse("red") },
            ColorBlock { y0: 100.0, y1: 110.0, color: ColorSpec::parse("green") },
        ];
        assert_eq!(associate_color(15.0, &colors).unwrap().to_string(), "Red");
        assert_eq!(associate_color(90.0, &colors).unwrap().to_string(), "Green");
        assert!(associate_color(5.0, &[]).is_none());
    }

    #[test]
    fn page_without_blocks_unchanged() {
        let page = Page::from_text(3, "JANUARY 2026\n1 Thu Mary White");
        assert_eq!(rebuild_page(&page).lines, page.lines);
    }

    #[test]
    fn column_pass_builds_records() {
        let tables = CalendarTables::for_year(2026, CalendarOverrides::default()).unwrap();
        let pass = day_pass(&[grid_page()], &tables, Strategy::Columns);
        assert_eq!(pass.records.len(), 3);
        assert_eq!(pass.records[0].rank, FeastRank::Solemnity);
        assert_eq!(pass.records[0].feast_name, "Mary, the Holy Mother of God");
        assert_eq!(pass.records[1].rank, FeastRank::Memorial);
        assert_eq!(pass.records[2].color.to_string(), "Violet/White");
        assert_eq!(pass.records[2].source_page, 14);
    }
}
