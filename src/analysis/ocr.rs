//! OCR collaborator contract.
//!
//! The optical character recognition engine lives outside this crate; the
//! analyzer consumes it through [`OcrEngine`]. `StaticOcr` is the stub used
//! by demos and tests.

use crate::analysis::AnalysisError;
use crate::source::CaptureRef;
use serde::{Deserialize, Serialize};

/// A recognized token with its confidence and location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrToken {
    pub text: String,
    /// Recognition confidence in [0, 1]
    pub confidence: f64,
    /// Bounding box (x, y, width, height) in image pixels
    pub bbox: (u32, u32, u32, u32),
}

/// Full OCR output for one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrOutput {
    /// Concatenated recognized text
    pub text: String,
    /// Per-token details
    pub tokens: Vec<OcrToken>,
}

impl OcrOutput {
    /// Mean token confidence; 0.0 when no tokens were recognized.
    pub fn mean_confidence(&self) -> f64 {
        if self.tokens.is_empty() {
            return 0.0;
        }
        self.tokens.iter().map(|t| t.confidence).sum::<f64>() / self.tokens.len() as f64
    }
}

/// The external OCR engine boundary.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, capture: &CaptureRef) -> Result<OcrOutput, AnalysisError>;
}

/// An OCR stub that returns a fixed output for every capture.
pub struct StaticOcr {
    output: OcrOutput,
}

impl StaticOcr {
    pub fn new(output: OcrOutput) -> Self {
        Self { output }
    }

    /// Build a stub from plain text, one uniform-confidence token per word.
    pub fn from_text(text: &str, confidence: f64) -> Self {
        let tokens = text
            .split_whitespace()
            .enumerate()
            .map(|(i, word)| OcrToken {
                text: word.to_string(),
                confidence,
                bbox: (i as u32 * 40, 0, 36, 14),
            })
            .collect();
        Self {
            output: OcrOutput {
                text: text.to_string(),
                tokens,
            },
        }
    }
}

impl OcrEngine for StaticOcr {
    fn recognize(&self, _capture: &CaptureRef) -> Result<OcrOutput, AnalysisError> {
        Ok(self.output.clone())
    }
}

/// An OCR stub that always fails; exercises the failure-containment path.
pub struct FailingOcr;

impl OcrEngine for FailingOcr {
    fn recognize(&self, _capture: &CaptureRef) -> Result<OcrOutput, AnalysisError> {
        Err(AnalysisError::Ocr("engine unavailable".to_string()))
    }
}
