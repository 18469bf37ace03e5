//! OCR through the `tesseract` command-line binary.

use super::{OcrEngine, OcrError, OcrRequest, OcrToken};
use async_trait::async_trait;
use image::{GrayImage, ImageFormat};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

const TSV_CONFIDENCE: usize = 10;
const TSV_TEXT: usize = 11;

/// Runs the tesseract CLI on a scratch PNG.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl TesseractEngine {
    /// Creates an engine using `binary` and the `language` traineddata.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    async fn run(&self, image: &GrayImage, request: &OcrRequest, tsv: bool) -> Result<String, OcrError> {
        let scratch = tempfile::Builder::new()
            .prefix("sheetflow-ocr-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(scratch.path(), ImageFormat::Png)?;

        let mut command = Command::new(&self.binary);
        command
            .arg(scratch.path())
            .arg("stdout")
            .arg("--psm")
            .arg(request.mode.psm().to_string())
            .arg("-l")
            .arg(&self.language)
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", request.whitelist));
        if tsv {
            command.arg("tsv");
        }

        debug!(binary = %self.binary.display(), tsv, "Running tesseract");
        let output = command.output().await.map_err(|e| OcrError::Unavailable {
            engine: self.name().to_string(),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(OcrError::Engine {
                engine: self.name().to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize_tokens(&self, image: &GrayImage, request: &OcrRequest) -> Result<Vec<OcrToken>, OcrError> {
        let stdout = self.run(image, request, true).await?;
        Ok(parse_tsv(&stdout))
    }

    async fn recognize_text(&self, image: &GrayImage, request: &OcrRequest) -> Result<String, OcrError> {
        self.run(image, request, false).await
    }
}

/// Parses tesseract TSV output into tokens.
///
/// The header row and rows with too few columns are skipped. Non-word rows
/// keep their `-1` confidence and empty text.
#[must_use]
pub fn parse_tsv(tsv: &str) -> Vec<OcrToken> {
    tsv.lines()
        .skip(1)
        .filter_map(|line| {
            let columns: Vec<&str> = line.split('\t').collect();
            let confidence = columns.get(TSV_CONFIDENCE)?.trim().parse::<f64>().ok()?;
            let text = columns.get(TSV_TEXT).copied().unwrap_or_default();
            Some(OcrToken::new(text.trim(), confidence))
        })
        .collect()
}
