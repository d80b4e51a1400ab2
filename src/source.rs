use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use lopdf::Document;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};

use crate::parser::normalize::page_lines;
use crate::parser::Page;

/// A positioned text block on a page, in page units with y growing downward.
#[derive(Debug, Clone, Deserialize)]
pub struct PageBlock {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub text: String,
}

impl PageBlock {
    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }
}

/// Anything that can hand out page text by 1-based page number.
pub trait PageSource {
    fn page_count(&self) -> usize;

    fn page_text(&self, number: usize) -> Result<String>;

    /// Positioned blocks, when the source has layout information.
    fn page_blocks(&self, _number: usize) -> Option<Vec<PageBlock>> {
        None
    }
}

// ── PDF ──

pub struct PdfSource {
    doc: Document,
    page_numbers: Vec<u32>,
}

impl PdfSource {
    pub fn load(path: &Path) -> Result<PdfSource> {
        let doc = Document::load(path).with_context(|| format!("Failed to load PDF {}", path.display()))?;
        let page_numbers = doc.get_pages().into_keys().collect();
        Ok(PdfSource { doc, page_numbers })
    }
}

impl PageSource for PdfSource {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, number: usize) -> Result<String> {
        let Some(&page) = self.page_numbers.get(number.wrapping_sub(1)) else {
            bail!("page {} out of range (1-{})", number, self.page_numbers.len());
        };
        self.doc
            .extract_text(&[page])
            .with_context(|| format!("Failed to extract text from page {}", number))
    }
}

// ── Form-feed paged text ──

pub struct TextSource {
    pages: Vec<String>,
}

impl TextSource {
    pub fn load(path: &Path) -> Result<TextSource> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(TextSource::from_text(&text))
    }

    pub fn from_text(text: &str) -> TextSource {
        TextSource {
            pages: text.split('\x0c').map(String::from).collect(),
        }
    }
}

impl PageSource for TextSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, number: usize) -> Result<String> {
        match self.pages.get(number.wrapping_sub(1)) {
            Some(text) => Ok(text.clone()),
            None => bail!("page {} out of range (1-{})", number, self.pages.len()),
        }
    }
}

// ── JSON layout dump ──

#[derive(Debug, Deserialize)]
struct LayoutDump {
    pages: Vec<LayoutPage>,
}

#[derive(Debug, Deserialize)]
struct LayoutPage {
    #[serde(default)]
    text: String,
    #[serde(default)]
    blocks: Option<Vec<PageBlock>>,
}

/// `{"pages": [{"text": "...", "blocks": [{"x0":..,"y0":..,"x1":..,"y1":..,"text":".."}]}]}`
pub struct JsonSource {
    pages: Vec<LayoutPage>,
}

impl JsonSource {
    pub fn load(path: &Path) -> Result<JsonSource> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        JsonSource::from_json(&raw).with_context(|| format!("Invalid layout JSON in {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<JsonSource> {
        let dump: LayoutDump = serde_json::from_str(raw)?;
        Ok(JsonSource { pages: dump.pages })
    }
}

impl PageSource for JsonSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, number: usize) -> Result<String> {
        let Some(page) = self.pages.get(number.wrapping_sub(1)) else {
            bail!("page {} out of range (1-{})", number, self.pages.len());
        };
        if page.text.trim().is_empty() {
            if let Some(blocks) = &page.blocks {
                let joined: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
                return Ok(joined.join("\n"));
            }
        }
        Ok(page.text.clone())
    }

    fn page_blocks(&self, number: usize) -> Option<Vec<PageBlock>> {
        self.pages.get(number.wrapping_sub(1))?.blocks.clone()
    }
}

/// Open `path` by extension: `.pdf` through lopdf, `.json` as a layout dump,
/// anything else as form-feed paged text.
pub fn open(path: &Path) -> Result<Box<dyn PageSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let source: Box<dyn PageSource> = match ext.as_str() {
        "pdf" => Box::new(PdfSource::load(path)?),
        "json" => Box::new(JsonSource::load(path)?),
        _ => Box::new(TextSource::load(path)?),
    };
    info!("Opened {} ({} pages)", path.display(), source.page_count());
    Ok(source)
}

// ── Page ranges ──

/// 1-based inclusive page range: "13-", "13-40" or "7".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl PageRange {
    pub const ALL: PageRange = PageRange { start: 1, end: None };

    /// Page numbers of this range that exist in a document of `count` pages.
    pub fn numbers(&self, count: usize) -> std::ops::RangeInclusive<usize> {
        let end = self.end.map_or(count, |e| e.min(count));
        self.start..=end
    }
}

impl FromStr for PageRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<PageRange> {
        let s = s.trim();
        let parse = |part: &str| -> Result<usize> {
            let n: usize = part
                .trim()
                .parse()
                .with_context(|| format!("invalid page number {:?} in range {:?}", part, s))?;
            if n == 0 {
                bail!("page numbers start at 1 (range {:?})", s);
            }
            Ok(n)
        };

        let range = match s.split_once('-') {
            Some((start, "")) => PageRange { start: parse(start)?, end: None },
            Some((start, end)) => PageRange { start: parse(start)?, end: Some(parse(end)?) },
            None => {
                let n = parse(s)?;
                PageRange { start: n, end: Some(n) }
            }
        };
        if range.end.is_some_and(|end| end < range.start) {
            bail!("page range {:?} ends before it starts", s);
        }
        Ok(range)
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) if end == self.start => write!(f, "{}", self.start),
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-", self.start),
        }
    }
}

/// Extract and normalize the pages of `range`. A page whose text cannot be
/// extracted is logged and kept as an empty page so numbering stays intact.
pub fn load_pages(source: &dyn PageSource, range: PageRange) -> Vec<Page> {
    let numbers: Vec<usize> = range.numbers(source.page_count()).collect();

    let pb = ProgressBar::new(numbers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let raw: Vec<(usize, String, Option<Vec<PageBlock>>)> = numbers
        .iter()
        .map(|&number| {
            let text = source.page_text(number).unwrap_or_else(|e| {
                warn!("Page {}: {:#}", number, e);
                String::new()
            });
            pb.inc(1);
            (number, text, source.page_blocks(number))
        })
        .collect();
    pb.finish_and_clear();

    raw.into_par_iter()
        .map(|(number, text, blocks)| to_page(number, &text, blocks))
        .collect()
}

fn to_page(number: usize, text: &str, blocks: Option<Vec<PageBlock>>) -> Page {
    let lines = page_lines(text);
    if lines.is_empty() && blocks.is_none() {
        warn!("Page {}: no text, skipped", number);
    }
    Page { number, lines, blocks }
}
