//! CLI binary for edgequake-pdflayout.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints words, lines or paragraphs.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdflayout::{
    extract, inspect, write_atomic, ExtractionConfig, ExtractionOutput, ExtractionProgressCallback,
    GeometryPolicy, OcrMode, PageResult, PageSelection, ProgressCallback, TextSource,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar plus one log line per page. Pages may finish out of
/// order when several run concurrently.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_extraction_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page: &PageResult, total: usize) {
        let secs = self.elapsed_secs(page.page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            green("✓"),
            page.page_num,
            total,
            dim(&page_summary(page)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(page_num);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            let mut s: String = error.chars().take(79).collect();
            s.push('…');
            s
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages extracted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages extracted  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

/// One-line count summary for a finished page, e.g. `ocr   412 words  38 lines  6 paragraphs`.
fn page_summary(page: &PageResult) -> String {
    let source = match page.source {
        TextSource::Native => "text",
        TextSource::Ocr => "ocr",
        TextSource::Empty => "empty",
    };
    format!(
        "{source:<5} {:>5} words  {:>4} lines  {:>3} paragraphs",
        page.token_count,
        page.line_count,
        page.paragraphs.len()
    )
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Paragraphs as JSON records (stdout)
  pdflayout document.pdf

  # Plain text, one paragraph per block
  pdflayout --format text document.pdf

  # Raw words with boxes, pages 1-3
  pdflayout --granularity words --pages 1-3 document.pdf -o words.json

  # Scanned document in German
  pdflayout --ocr always --ocr-lang deu scan.pdf

  # Looser paragraph grouping
  pdflayout --paragraph-gap 2.0 document.pdf

  # Full result with per-page stats
  pdflayout --format full https://arxiv.org/pdf/1706.03762 -o attention.json

  # Inspect PDF metadata
  pdflayout --inspect-only document.pdf

THRESHOLDS:
  All thresholds scale with the median height measured on each page.
  --line-tolerance   0.25  rows are bucketed by floor(top / (0.25 × median))
  --merge-tolerance  0.30  words join a line if the gap ≤ 0.3 × median
  --paragraph-gap    1.50  lines join a paragraph if the gap ≤ 1.5 × median line height

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Overrides the log filter (e.g. edgequake_pdflayout=debug)
  PDFLAYOUT_*             Every flag has an env fallback, e.g. PDFLAYOUT_OCR=never

SETUP:
  Install libpdfium for your platform (https://github.com/bblanchon/pdfium-binaries)
  and tesseract (apt install tesseract-ocr / brew install tesseract) for OCR.
"#;

/// Reconstruct lines and paragraphs from PDF files and URLs.
#[derive(Parser, Debug)]
#[command(
    name = "pdflayout",
    version,
    about = "Reconstruct lines and paragraphs from PDF files and URLs",
    long_about = "Read positioned words from a PDF's text layer (or from tesseract OCR when a \
page has none) and group them into lines and paragraphs using thresholds that adapt to the \
text size on each page.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write output to this file instead of stdout.
    #[arg(short, long, env = "PDFLAYOUT_OUTPUT")]
    output: Option<PathBuf>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDFLAYOUT_PAGES", default_value = "all")]
    pages: String,

    /// Hierarchy level to emit.
    #[arg(long, env = "PDFLAYOUT_GRANULARITY", value_enum, default_value = "paragraphs")]
    granularity: GranularityArg,

    /// Output format: json records, plain text, or the full result.
    #[arg(long, env = "PDFLAYOUT_FORMAT", value_enum, default_value = "json")]
    format: FormatArg,

    /// When to use OCR.
    #[arg(long, env = "PDFLAYOUT_OCR", value_enum, default_value = "auto")]
    ocr: OcrArg,

    /// Tesseract language(s), e.g. eng or eng+fra.
    #[arg(long, env = "PDFLAYOUT_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Tesseract executable.
    #[arg(long, env = "PDFLAYOUT_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Per-page OCR timeout in seconds.
    #[arg(long, env = "PDFLAYOUT_OCR_TIMEOUT", default_value_t = 60)]
    ocr_timeout: u64,

    /// Longest edge of the page image rendered for OCR, in pixels.
    #[arg(long, env = "PDFLAYOUT_OCR_PIXELS", default_value_t = 2000)]
    ocr_pixels: u32,

    /// Row bucket height as a fraction of the median word height.
    #[arg(long, env = "PDFLAYOUT_LINE_TOLERANCE", default_value_t = 0.25)]
    line_tolerance: f64,

    /// Horizontal merge slack as a fraction of the median word height.
    #[arg(long, env = "PDFLAYOUT_MERGE_TOLERANCE", default_value_t = 0.3)]
    merge_tolerance: f64,

    /// Paragraph break gap as a multiple of the median line height.
    #[arg(long, env = "PDFLAYOUT_PARAGRAPH_GAP", default_value_t = 1.5)]
    paragraph_gap: f64,

    /// Drop words with inverted boxes instead of repairing them.
    #[arg(long, env = "PDFLAYOUT_DISCARD_MALFORMED")]
    discard_malformed: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFLAYOUT_PASSWORD")]
    password: Option<String>,

    /// Number of pages processed at once.
    #[arg(short, long, env = "PDFLAYOUT_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFLAYOUT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "PDFLAYOUT_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFLAYOUT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFLAYOUT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum GranularityArg {
    Words,
    Lines,
    Paragraphs,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Json,
    Text,
    Full,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OcrArg {
    Auto,
    Never,
    Always,
}

impl From<OcrArg> for OcrMode {
    fn from(v: OcrArg) -> Self {
        match v {
            OcrArg::Auto => OcrMode::Auto,
            OcrArg::Never => OcrMode::Never,
            OcrArg::Always => OcrMode::Always,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None)?;
        let meta = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.format == FormatArg::Text {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        } else {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let output = extract(&cli.input, &config)
        .await
        .context("Extraction failed")?;

    let rendered = render_output(&output, cli.granularity, cli.format)?;

    if let Some(ref path) = cli.output {
        save_rendered(path, &rendered).await?;
        if !cli.quiet {
            eprintln!(
                "{}  {}/{} pages  {} paragraphs  {}ms  →  {}",
                if output.stats.failed_pages == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                output.stats.processed_pages,
                output.pages.len(),
                output.stats.total_paragraphs,
                output.stats.total_duration_ms,
                bold(&path.display().to_string()),
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }

        if !cli.quiet && !show_progress {
            eprintln!(
                "Extracted {}/{} pages in {}ms: {} words, {} lines, {} paragraphs",
                output.stats.processed_pages,
                output.pages.len(),
                output.stats.total_duration_ms,
                output.stats.total_tokens,
                output.stats.total_lines,
                output.stats.total_paragraphs,
            );
            if output.stats.failed_pages > 0 {
                eprintln!("  {} pages failed", output.stats.failed_pages);
            }
        }
    }

    if !cli.quiet && output.stats.ocr_pages > 0 {
        eprintln!(
            "   {}",
            dim(&format!("{} pages read with OCR", output.stats.ocr_pages))
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let pages = parse_pages(&cli.pages)?;
    let geometry = if cli.discard_malformed {
        GeometryPolicy::Discard
    } else {
        GeometryPolicy::Repair
    };

    let mut builder = ExtractionConfig::builder()
        .pages(pages)
        .concurrency(cli.concurrency)
        .line_tolerance(cli.line_tolerance)
        .merge_tolerance(cli.merge_tolerance)
        .paragraph_gap(cli.paragraph_gap)
        .geometry(geometry)
        .ocr_mode(cli.ocr.into())
        .ocr_language(cli.ocr_lang.clone())
        .tesseract_path(cli.tesseract.clone())
        .ocr_timeout_secs(cli.ocr_timeout)
        .max_rendered_pixels(cli.ocr_pixels)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Render the chosen level of the hierarchy.
fn render_output(
    output: &ExtractionOutput,
    granularity: GranularityArg,
    format: FormatArg,
) -> Result<String> {
    match format {
        FormatArg::Full => {
            serde_json::to_string_pretty(output).context("Failed to serialise output")
        }
        FormatArg::Json => match granularity {
            GranularityArg::Words => to_json(&output.tokens().collect::<Vec<_>>()),
            GranularityArg::Lines => to_json(&output.lines().collect::<Vec<_>>()),
            GranularityArg::Paragraphs => to_json(&output.paragraphs),
        },
        FormatArg::Text => Ok(match granularity {
            GranularityArg::Words => join_text(output.tokens().map(|t| t.text.as_str()), "\n"),
            GranularityArg::Lines => join_text(output.lines().map(|l| l.text.as_str()), "\n"),
            GranularityArg::Paragraphs => output.plain_text(),
        }),
    }
}

/// Write rendered output to `-o`, atomically and creating parent directories.
async fn save_rendered(path: &Path, rendered: &str) -> Result<()> {
    write_atomic(path, rendered.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn to_json<T: Serialize + ?Sized>(records: &T) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialise output")
}

fn join_text<'a>(items: impl Iterator<Item = &'a str>, sep: &str) -> String {
    items.collect::<Vec<_>>().join(sep)
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pages_forms() {
        assert!(matches!(parse_pages("all").unwrap(), PageSelection::All));
        assert!(matches!(parse_pages(" 5 ").unwrap(), PageSelection::Single(5)));
        assert!(matches!(parse_pages("3-15").unwrap(), PageSelection::Range(3, 15)));
        match parse_pages("1,3,5").unwrap() {
            PageSelection::Set(v) => assert_eq!(v, vec![1, 3, 5]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_pages_rejects_bad_input() {
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("5-2").is_err());
        assert!(parse_pages("1,x").is_err());
        assert!(parse_pages("0,2").is_err());
    }

    #[test]
    fn page_line_reports_words_lines_and_paragraphs() {
        let page = PageResult {
            page_num: 3,
            source: TextSource::Ocr,
            width: 612.0,
            height: 792.0,
            token_count: 412,
            line_count: 38,
            paragraphs: Vec::new(),
            validation: Default::default(),
            duration_ms: 0,
            error: None,
        };
        let line = page_summary(&page);
        assert!(line.starts_with("ocr"));
        assert!(line.contains("412 words"));
        assert!(line.contains("38 lines"));
        assert!(line.contains("0 paragraphs"));
    }

    #[tokio::test]
    async fn output_file_is_written_whole_into_new_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/2024/doc.txt");
        save_rendered(&path, "First paragraph\n\nSecond").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "First paragraph\n\nSecond"
        );
        assert!(!dir.path().join("reports/2024/doc.txt.tmp").exists());

        save_rendered(&path, "short").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn cli_flags_reach_config() {
        let cli = Cli::parse_from([
            "pdflayout",
            "doc.pdf",
            "--ocr",
            "never",
            "--paragraph-gap",
            "2.5",
            "--discard-malformed",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.ocr_mode, OcrMode::Never);
        assert_eq!(config.layout.paragraph_gap, 2.5);
        assert_eq!(config.geometry, GeometryPolicy::Discard);
        assert_eq!(cli.granularity, GranularityArg::Paragraphs);
    }
}
