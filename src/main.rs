mod assemble;
mod calendar;
mod model;
mod parser;
mod source;
mod tables;
mod validate;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use assemble::weekly::OrdinaryTimeNumbering;
use assemble::{AssembleOptions, CitationMode};
use calendar::{CalendarOverrides, CalendarTables};
use parser::Strategy;
use source::PageRange;
use tables::TableSet;

#[derive(Parser)]
#[command(name = "feast_calendar", about = "Liturgical calendar PDF to CSV tables")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the calendar document and write all tables plus a QC report
    Build(BuildArgs),
    /// Re-read written tables and run the QC checks again
    Validate {
        /// Directory holding the CSV tables
        #[arg(short, long, default_value = "data")]
        out: PathBuf,
        #[arg(short, long, default_value_t = 2026)]
        year: i32,
    },
    /// Print normalized page lines (debugging)
    Pages {
        input: PathBuf,
        /// Pages to print, e.g. "13-", "13-40", "7"
        #[arg(short, long, default_value = "1-")]
        pages: PageRange,
        /// Show the line classification next to each line
        #[arg(short, long)]
        classify: bool,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Calendar document (.pdf, .json layout dump, or form-feed paged text)
    input: PathBuf,
    #[arg(short, long, default_value = "data")]
    out: PathBuf,
    #[arg(short, long, default_value_t = 2026)]
    year: i32,
    /// Pages of the day-by-day grid
    #[arg(long, default_value = "13-")]
    day_pages: PageRange,
    /// Pages for a second, lower-priority day pass (column split when blocks exist)
    #[arg(long)]
    fallback_pages: Option<PageRange>,
    /// Pages holding the daily readings
    #[arg(long, default_value = "1-")]
    citation_pages: PageRange,
    /// Pages holding the major-feast listing
    #[arg(long, default_value = "1-12")]
    feast_pages: PageRange,
    /// JSON file overriding Easter, holy days or holidays
    #[arg(long)]
    calendar: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OrdinaryTimeNumbering::Continuous)]
    ordinary_time: OrdinaryTimeNumbering,
    #[arg(long, value_enum, default_value_t = CitationMode::PerDate)]
    citations: CitationMode,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build(args) => build(args),
        Commands::Validate { out, year } => revalidate(&out, year),
        Commands::Pages {
            input,
            pages,
            classify,
        } => print_pages(&input, pages, classify),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn build(args: BuildArgs) -> Result<()> {
    let overrides = match &args.calendar {
        Some(path) => CalendarOverrides::load(path)?,
        None => CalendarOverrides::default(),
    };
    let tables = CalendarTables::for_year(args.year, overrides)?;
    info!(
        "Calendar {}: Easter {}, {} holy days, {} US holidays",
        tables.year,
        tables.easter,
        tables.holy_days.len(),
        tables.us_holidays.len()
    );
    let doc = source::open(&args.input)?;

    // Phase 1: day grid
    let t_days = Instant::now();
    let pages = source::load_pages(doc.as_ref(), args.day_pages);
    let primary = parser::day_pass(&pages, &tables, Strategy::Lines);
    println!(
        "Day grid: {} records from {} pages ({} warnings) in {:.1}s",
        primary.records.len(),
        pages.len(),
        primary.warnings.len(),
        t_days.elapsed().as_secs_f64()
    );
    let mut passes = vec![primary.records];
    let mut warnings = primary.warnings;

    if let Some(range) = args.fallback_pages {
        let pages = source::load_pages(doc.as_ref(), range);
        let strategy = if pages.iter().any(|p| p.blocks.is_some()) {
            Strategy::Columns
        } else {
            Strategy::Lines
        };
        let fallback = parser::day_pass(&pages, &tables, strategy);
        println!(
            "Fallback ({:?}, pages {}): {} records",
            strategy,
            range,
            fallback.records.len()
        );
        passes.push(fallback.records);
        warnings.extend(fallback.warnings);
    }

    if passes.iter().all(|p| p.is_empty()) {
        bail!(
            "No day records parsed from {} (pages {}); nothing written",
            args.input.display(),
            args.day_pages
        );
    }

    // Phase 2: readings and major feasts
    let pages = source::load_pages(doc.as_ref(), args.citation_pages);
    let citations = parser::citations::extract_citations(&pages, args.year);
    println!("Citations: {} dates with readings", citations.len());

    let pages = source::load_pages(doc.as_ref(), args.feast_pages);
    let feasts = parser::feasts::parse_major_feasts(&pages, args.year);
    println!("Major feasts: {}", feasts.len());

    // Phase 3: assemble, write, check
    let opts = AssembleOptions {
        ordinary_time: args.ordinary_time,
        citations: args.citations,
    };
    let dataset = assemble::assemble(passes, warnings, citations, feasts, &tables, opts);
    let set = TableSet::from(&dataset);
    set.write_all(&args.out)?;

    let report = validate::validate(&set, &dataset.warnings, args.year);
    validate::write_report(&args.out, &report)?;

    print_counts(&set);
    println!(
        "QC: {} findings ({} warnings), see {}",
        report.findings.len(),
        report.warning_count(),
        args.out.join("qc_report.md").display()
    );
    Ok(())
}

fn revalidate(out: &Path, year: i32) -> Result<()> {
    let set = TableSet::read_all(out)?;
    let report = validate::validate(&set, &[], year);
    validate::write_report(out, &report)?;

    print_counts(&set);
    for finding in report.findings.iter().take(20) {
        println!("  [{}] {}", finding.table, finding.message);
    }
    if report.findings.len() > 20 {
        println!("  ... {} more in qc_report.md", report.findings.len() - 20);
    }
    println!("{} findings ({} warnings)", report.findings.len(), report.warning_count());
    Ok(())
}

fn print_pages(input: &Path, range: PageRange, classify: bool) -> Result<()> {
    let doc = source::open(input)?;
    let pages = source::load_pages(doc.as_ref(), range);
    info!("Printing {} pages", pages.len());

    for page in &pages {
        let blocks = page.blocks.as_ref().map_or(0, |b| b.len());
        println!("── page {} ({} lines, {} blocks) ──", page.number, page.lines.len(), blocks);
        if classify {
            let kinds = parser::lines::classify_page(&page.lines);
            for (line, kind) in page.lines.iter().zip(kinds) {
                println!("{:<60} {}", clip(line, 60), kind_label(&kind));
            }
        } else {
            for line in &page.lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn kind_label(kind: &parser::lines::LineKind) -> String {
    use parser::lines::LineKind;
    match kind {
        LineKind::MonthHeader { month, year } => match year {
            Some(y) => format!("MonthHeader({} {})", month, y),
            None => format!("MonthHeader({})", month),
        },
        LineKind::DayEntry(e) => format!("DayEntry({} [{}])", e.day, e.color),
        LineKind::RankAnnotation(r) => format!("Rank({})", r.as_str()),
        LineKind::SeparatorOrFootnote => "Separator".into(),
        LineKind::CitationLine => "Citation".into(),
        LineKind::Continuation => "Continuation".into(),
        LineKind::Unclassified => "-".into(),
    }
}

fn print_counts(set: &TableSet) {
    println!(
        "Tables: {} days, {} simple, {} weeks, {} citations, {} holidays, {} major feasts.",
        set.days.len(),
        set.simple.len(),
        set.weekly.len(),
        set.citations.len(),
        set.holidays.len(),
        set.major_feasts.len(),
    );
}

/// Cut `s` to `width` characters, marking a cut with a trailing `~`.
fn clip(s: &str, width: usize) -> String {
    if s.chars().nth(width).is_none() {
        return s.to_string();
    }
    let end = s.char_indices().nth(width.saturating_sub(1)).map_or(0, |(i, _)| i);
    format!("{}~", &s[..end])
}

fn format_duration(d: std::time::Duration) -> String {
    let total = d.as_secs();
    match (total / 3600, total % 3600 / 60, total % 60) {
        (0, 0, _) => format!("{:.1}s", d.as_secs_f64()),
        (0, m, s) => format!("{}m {:02}s", m, s),
        (h, m, s) => format!("{}h {:02}m {:02}s", h, m, s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["feast_calendar", "build", "calendar.pdf"]).unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.year, 2026);
        assert_eq!(args.out, PathBuf::from("data"));
        assert_eq!(args.day_pages, PageRange { start: 13, end: None });
        assert_eq!(args.feast_pages, PageRange { start: 1, end: Some(12) });
        assert!(args.fallback_pages.is_none());
        assert_eq!(args.ordinary_time, OrdinaryTimeNumbering::Continuous);
        assert_eq!(args.citations, CitationMode::PerDate);
    }

    #[test]
    fn cli_options() {
        let cli = Cli::try_parse_from([
            "feast_calendar",
            "build",
            "cal.txt",
            "--day-pages",
            "13-40",
            "--ordinary-time",
            "reset",
            "--citations",
            "per-occurrence",
        ])
        .unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.day_pages, PageRange { start: 13, end: Some(40) });
        assert_eq!(args.ordinary_time, OrdinaryTimeNumbering::Reset);
        assert_eq!(args.citations, CitationMode::PerOccurrence);

        assert!(Cli::try_parse_from(["feast_calendar", "build", "x.pdf", "--day-pages", "0-"]).is_err());
    }

    #[test]
    fn build_from_text_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let args = BuildArgs {
            input: PathBuf::from("tests/fixtures/january_2026.txt"),
            out: dir.path().to_path_buf(),
            year: 2026,
            day_pages: PageRange::ALL,
            fallback_pages: None,
            citation_pages: PageRange::ALL,
            feast_pages: PageRange::ALL,
            calendar: None,
            ordinary_time: OrdinaryTimeNumbering::Continuous,
            citations: CitationMode::PerDate,
        };
        build(args).unwrap();

        let set = TableSet::read_all(dir.path()).unwrap();
        assert_eq!(set.days.len(), 31);
        assert_eq!(set.citations.len(), 365);
        assert_eq!(set.weekly.len(), 53);
        assert!(dir.path().join("qc_report.md").exists());

        // The tables written by build pass through validate unchanged.
        revalidate(dir.path(), 2026).unwrap();
    }

    #[test]
    fn build_without_records_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.txt");
        std::fs::write(&input, "Nothing here\x0cStill nothing").unwrap();
        let args = BuildArgs {
            input,
            out: dir.path().join("out"),
            year: 2026,
            day_pages: PageRange::ALL,
            fallback_pages: None,
            citation_pages: PageRange::ALL,
            feast_pages: PageRange::ALL,
            calendar: None,
            ordinary_time: OrdinaryTimeNumbering::Continuous,
            citations: CitationMode::PerDate,
        };
        assert!(build(args).is_err());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn missing_input_fails() {
        assert!(print_pages(Path::new("does/not/exist.txt"), PageRange::ALL, false).is_err());
    }

    #[test]
    fn duration_format() {
        assert_eq!(format_duration(std::time::Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(125)), "2m 05s");
        assert_eq!(format_duration(std::time::Duration::from_secs(3725)), "1h 02m 05s");
    }

    #[test]
    fn clip_marks_cut() {
        assert_eq!(clip("JANUARY 2026", 20), "JANUARY 2026");
        assert_eq!(clip("Mary, Mother of God", 6), "Mary,~");
        assert_eq!(clip("Sólemnity", 3), "Só~");
    }
}
