//! OCR through the `tesseract` command-line program.

use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use image::{DynamicImage, ImageFormat};

use super::{OcrBackend, RawToken};
use crate::error::{Error, Result};

/// TSV row level for individual words.
const WORD_LEVEL: i32 = 5;

/// OCR backend that shells out to the `tesseract` binary.
///
/// The image is streamed as PNG on stdin and word records are read back from
/// the TSV renderer on stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: String,
    language: String,
    page_segmentation_mode: u32,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractCli {
    /// English, automatic page segmentation (`--psm 3`).
    pub fn new() -> Self {
        Self {
            program: "tesseract".to_string(),
            language: "eng".to_string(),
            page_segmentation_mode: 3,
        }
    }

    /// Use a different executable path.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the recognition language(s), e.g. `"eng+deu"`.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the page segmentation mode.
    pub fn with_psm(mut self, psm: u32) -> Self {
        self.page_segmentation_mode = psm;
        self
    }

    /// Check whether the executable can be launched.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn run(&self, png: Vec<u8>) -> Result<String> {
        let mut child = Command::new(&self.program)
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string())
            .arg("tsv")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    Error::OcrUnavailable(format!("cannot launch '{}': {}", self.program, e))
                },
                _ => Error::Io(e),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Ocr("tesseract stdin was not captured".to_string()))?;
        let writer = std::thread::spawn(move || stdin.write_all(&png));

        let output = child.wait_with_output()?;
        let written = writer
            .join()
            .map_err(|_| Error::Ocr("stdin writer thread panicked".to_string()))?;

        // A failed run usually also breaks the pipe; report tesseract's own message first
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr(format!("tesseract failed: {}", stderr.trim())));
        }
        written?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrBackend for TesseractCli {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RawToken>> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        let tsv = self.run(png)?;
        parse_tsv(&tsv)
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}

/// Parse tesseract TSV output into word records.
///
/// The header row and non-word levels are skipped. Rows with fewer than 11
/// columns are malformed; a missing 12th column means an empty word.
pub fn parse_tsv(tsv: &str) -> Result<Vec<RawToken>> {
    let mut tokens = Vec::new();
    for (idx, row) in tsv.lines().enumerate() {
        if idx == 0 && row.starts_with("level") {
            continue;
        }
        if row.trim().is_empty() {
            continue;
        }
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 11 {
            return Err(Error::Ocr(format!(
                "TSV row {} has {} columns, expected 12",
                idx + 1,
                cols.len()
            )));
        }
        let level: i32 = parse_col(&cols, 0, idx)?;
        if level != WORD_LEVEL {
            continue;
        }
        tokens.push(RawToken {
            left: parse_col(&cols, 6, idx)?,
            top: parse_col(&cols, 7, idx)?,
            width: parse_col(&cols, 8, idx)?,
            height: parse_col(&cols, 9, idx)?,
            confidence: parse_col(&cols, 10, idx)?,
            text: cols.get(11).map(|s| s.to_string()).unwrap_or_default(),
        });
    }
    Ok(tokens)
}

fn parse_col<T: std::str::FromStr>(cols: &[&str], col: usize, row: usize) -> Result<T> {
    cols[col].trim().parse().map_err(|_| {
        Error::Ocr(format!(
            "TSV row {} column {}: cannot parse '{}'",
            row + 1,
            col + 1,
            cols[col]
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t
2\t1\t1\t0\t0\t0\t36\t92\t200\t30\t-1\t
5\t1\t1\t1\t1\t1\t36\t92\t90\t30\t96.06\tHello
5\t1\t1\t1\t1\t2\t140\t92\t96\t30\t95.5\tWorld
5\t1\t1\t1\t1\t3\t250\t92\t5\t30\t12\t
";

    #[test]
    fn test_parse_tsv_words_only() {
        let tokens = parse_tsv(SAMPLE).unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], RawToken::new("Hello", 36, 92, 90, 30, 96.06));
        assert_eq!(tokens[1].text, "World");
        assert_eq!(tokens[2].text, "");
    }

    #[test]
    fn test_parse_tsv_rejects_malformed_rows() {
        let err = parse_tsv("level\ttext\n5\t1\t1\n").unwrap_err();
        assert!(matches!(err, Error::Ocr(_)));
    }

    #[test]
    fn test_parse_tsv_rejects_bad_numbers() {
        let err = parse_tsv("5\t1\t1\t1\t1\t1\tleft\t0\t1\t1\t90\tx\n").unwrap_err();
        assert!(format!("{}", err).contains("column 7"));
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let backend = TesseractCli::new().with_program("/nonexistent/tesseract-binary");
        assert!(!backend.is_available());
        let image = DynamicImage::new_luma8(8, 8);
        let err = backend.recognize(&image).unwrap_err();
        assert!(err.is_ocr_unavailable());
    }
}
