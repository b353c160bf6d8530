//! OCR fallback through the `tesseract` command-line engine.
//!
//! A rendered page is written to a temporary PNG and passed to
//! `tesseract <png> stdout -l <lang> --psm <n> tsv`. Word rows (level 5) of
//! the TSV become tokens in pixel space, which [`CoordinateNormalizer`] then
//! maps into page units using the real bitmap size.
//!
//! The process is killed if it outlives `OcrConfig::timeout_secs`.

use crate::config::OcrConfig;
use crate::error::{LayoutError, PageError};
use crate::layout::{BBox, CoordinateNormalizer, Token};
use crate::pipeline::render::RenderedPage;
use image::ImageFormat;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// TSV level for word rows.
const WORD_LEVEL: u32 = 5;

/// One word row from tesseract's TSV output, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub bbox: BBox,
    /// 0–100; rows with a negative confidence are never returned.
    pub confidence: f32,
}

/// Check that the configured tesseract binary can be started.
///
/// Returns the first line of `tesseract --version`.
pub async fn probe(config: &OcrConfig) -> Result<String, LayoutError> {
    let unavailable = |detail: String| LayoutError::OcrUnavailable {
        binary: config.tesseract_path.display().to_string(),
        detail,
    };

    let output = Command::new(&config.tesseract_path)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    if !output.status.success() {
        return Err(unavailable(format!("exited with {}", output.status)));
    }

    // Older releases print the version banner on stderr.
    let banner = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    Ok(String::from_utf8_lossy(&banner)
        .lines()
        .next()
        .unwrap_or("tesseract")
        .trim()
        .to_string())
}

/// OCR one rendered page and return tokens in page coordinates.
pub async fn ocr_page(rendered: RenderedPage, config: &OcrConfig) -> Result<Vec<Token>, PageError> {
    let page_num = rendered.index + 1;
    let failed = |detail: String| PageError::OcrFailed {
        page: page_num,
        detail,
    };

    let normalizer = CoordinateNormalizer::new(
        rendered.image.width(),
        rendered.image.height(),
        rendered.page_width,
        rendered.page_height,
    )
    .map_err(|e| failed(e.to_string()))?;

    let png = tempfile::Builder::new()
        .prefix("pdflayout-page-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| failed(format!("temp file: {}", e)))?;
    let png_path = png.path().to_path_buf();

    let image = rendered.image;
    tokio::task::spawn_blocking(move || image.save_with_format(&png_path, ImageFormat::Png))
        .await
        .map_err(|e| failed(format!("encode task panicked: {}", e)))?
        .map_err(|e| failed(format!("PNG encode: {}", e)))?;

    let tsv = run_tesseract(png.path(), config, page_num).await?;
    let words = parse_tsv(&tsv);
    debug!(
        "Page {}: tesseract returned {} words (scale {:.4}x{:.4})",
        page_num,
        words.len(),
        normalizer.scale_x(),
        normalizer.scale_y()
    );

    Ok(normalizer.normalize(words_to_tokens(words, rendered.index)))
}

/// Pixel-space tokens with ids `w{page}-{n}`.
pub fn words_to_tokens(words: Vec<OcrWord>, page: usize) -> Vec<Token> {
    words
        .into_iter()
        .enumerate()
        .map(|(n, w)| Token::new(format!("w{}-{}", page, n), w.text, w.bbox, page))
        .collect()
}

async fn run_tesseract(image: &Path, config: &OcrConfig, page_num: usize) -> Result<String, PageError> {
    let mut cmd = Command::new(&config.tesseract_path);
    cmd.arg(image)
        .arg("stdout")
        .arg("-l")
        .arg(&config.language)
        .arg("--psm")
        .arg(config.page_segmentation_mode.to_string())
        .arg("tsv")
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let timeout = Duration::from_secs(config.timeout_secs);
    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(PageError::OcrFailed {
                page: page_num,
                detail: format!("failed to run {}: {}", config.tesseract_path.display(), e),
            })
        }
        Err(_) => {
            warn!("Page {}: tesseract timed out after {}s", page_num, config.timeout_secs);
            return Err(PageError::OcrTimeout {
                page: page_num,
                secs: config.timeout_secs,
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PageError::OcrFailed {
            page: page_num,
            detail: format!("tesseract failed: {}", stderr.trim()),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse tesseract TSV into word rows.
///
/// Columns: `level page_num block_num par_num line_num word_num left top
/// width height conf text`. The header row, non-word levels, rows with a
/// negative confidence and rows with blank text are skipped. Malformed rows
/// are ignored rather than failing the page.
pub fn parse_tsv(tsv: &str) -> Vec<OcrWord> {
    tsv.lines()
        .filter_map(|row| {
            let cols: Vec<&str> = row.split('\t').collect();
            if cols.len() < 12 {
                return None;
            }
            let level: u32 = cols[0].trim().parse().ok()?;
            if level != WORD_LEVEL {
                return None;
            }
            let left: f64 = cols[6].trim().parse().ok()?;
            let top: f64 = cols[7].trim().parse().ok()?;
            let width: f64 = cols[8].trim().parse().ok()?;
            let height: f64 = cols[9].trim().parse().ok()?;
            let confidence: f32 = cols[10].trim().parse().ok()?;
            // Text may itself contain tabs in rare builds; keep the remainder.
            let text = cols[11..].join("\t");
            let text = text.trim();
            if confidence < 0.0 || text.is_empty() {
                return None;
            }
            Some(OcrWord {
                text: text.to_string(),
                bbox: BBox::from_origin_size(left, top, width, height),
                confidence,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t1700\t2200\t-1\t
2\t1\t1\t0\t0\t0\t100\t120\t800\t60\t-1\t
4\t1\t1\t1\t1\t0\t100\t120\t800\t60\t-1\t
5\t1\t1\t1\t1\t1\t100\t120\t180\t40\t96.5\tHello
5\t1\t1\t1\t1\t2\t300\t122\t200\t38\t91.0\tworld
5\t1\t1\t1\t1\t3\t520\t122\t10\t38\t95.0\t
5\t1\t1\t1\t1\t4\t540\t122\t10\t38\t-1\tghost
";

    #[test]
    fn parses_word_rows_only() {
        let words = parse_tsv(SAMPLE);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Hello");
        assert_eq!(words[0].bbox, BBox::new(100.0, 120.0, 280.0, 160.0));
        assert_eq!(words[1].text, "world");
        assert!((words[1].confidence - 91.0).abs() < f32::EPSILON);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let tsv = "5\t1\t1\t1\t1\t1\tx\t0\t10\t10\t90\tbad\n5\t1\t1\n";
        assert!(parse_tsv(tsv).is_empty());
        assert!(parse_tsv("").is_empty());
    }

    #[test]
    fn pixel_tokens_map_to_page_units() {
        // 1700x2200 px render of a US-letter page (612x792 pt).
        let norm = CoordinateNormalizer::new(1700, 2200, 612.0, 792.0).unwrap();
        let tokens = norm.normalize(words_to_tokens(parse_tsv(SAMPLE), 0));
        assert_eq!(tokens[0].id, "w0-0");
        let b = tokens[0].bbox;
        assert!((b.left - 36.0).abs() < 1e-9);
        assert!((b.top - 43.2).abs() < 1e-9);
        assert!((b.right - 100.8).abs() < 1e-9);
        assert!((b.bottom - 57.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let config = OcrConfig {
            tesseract_path: PathBuf::from("/nonexistent/tesseract-binary"),
            ..OcrConfig::default()
        };
        let err = probe(&config).await.unwrap_err();
        assert!(matches!(err, LayoutError::OcrUnavailable { .. }));
    }
}
