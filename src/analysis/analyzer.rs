//! Screen content analysis.
//!
//! The analyzer turns one captured image into a structured record: extracted
//! text, UI-element labels grouped by category, a primary application guess,
//! and the task matches from the classifier. Stateless per call.

use crate::analysis::ocr::{OcrEngine, OcrOutput};
use crate::analysis::AnalysisError;
use crate::classify::{classify, AppMatch, RuleSet, TaskMatch};
use crate::producer::types::AnalysisRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Structured result of analyzing one screenshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Raw text extracted by OCR
    pub text: String,
    /// Detected UI-element labels grouped by category
    pub ui_elements: BTreeMap<String, Vec<String>>,
    /// Best application guess, if any matched
    pub primary_application: Option<AppMatch>,
    /// All application matches, strongest first
    pub applications: Vec<AppMatch>,
    /// All task matches, strongest first
    pub tasks: Vec<TaskMatch>,
    /// Mean OCR token confidence in [0, 1]
    pub overall_confidence: f64,
    /// Timestamp of the originating screenshot
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    /// An empty, zero-confidence result for a failed analysis.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            text: String::new(),
            ui_elements: BTreeMap::new(),
            primary_application: None,
            applications: Vec::new(),
            tasks: Vec::new(),
            overall_confidence: 0.0,
            timestamp,
        }
    }
}

/// Wraps the external OCR engine and the classification rules.
pub struct ScreenAnalyzer {
    ocr: Arc<dyn OcrEngine>,
    rules: Arc<RuleSet>,
}

impl ScreenAnalyzer {
    pub fn new(ocr: Arc<dyn OcrEngine>, rules: Arc<RuleSet>) -> Self {
        Self { ocr, rules }
    }

    /// Analyze one accepted request.
    ///
    /// An OCR failure propagates as [`AnalysisError`]; the caller decides
    /// whether to substitute [`AnalysisResult::empty`] and continue.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let ocr_output = self.ocr.recognize(&request.capture)?;
        let ui_elements = detect_ui_elements(&ocr_output, &self.rules);

        // The capture layer's app hint participates in matching alongside
        // the recognized text.
        let text_for_match = match request.capture.app_hint {
            Some(ref hint) => format!("{} {}", ocr_output.text, hint),
            None => ocr_output.text.clone(),
        };
        let classification = classify(&text_for_match, &ui_elements, &self.rules);

        Ok(AnalysisResult {
            text: ocr_output.text.clone(),
            ui_elements,
            primary_application: classification.applications.first().cloned(),
            applications: classification.applications,
            tasks: classification.tasks,
            overall_confidence: ocr_output.mean_confidence(),
            timestamp: request.timestamp,
        })
    }
}

/// Group recognized tokens into UI-element categories by label matching.
fn detect_ui_elements(ocr: &OcrOutput, rules: &RuleSet) -> BTreeMap<String, Vec<String>> {
    let mut elements: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for token in &ocr.tokens {
        let lowered = token.text.to_lowercase();
        for rule in &rules.ui_elements {
            if rule.labels.iter().any(|l| l == &lowered) {
                let labels = elements.entry(rule.category.clone()).or_default();
                if !labels.contains(&lowered) {
                    labels.push(lowered.clone());
                }
            }
        }
    }

    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ocr::{FailingOcr, StaticOcr};
    use crate::source::CaptureRef;

    fn analyzer_for(text: &str, confidence: f64) -> ScreenAnalyzer {
        ScreenAnalyzer::new(
            Arc::new(StaticOcr::from_text(text, confidence)),
            Arc::new(RuleSet::default_rules()),
        )
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(CaptureRef::from_bytes(vec![0u8; 8]))
    }

    #[test]
    fn test_analyze_extracts_tasks_and_app() {
        let analyzer = analyzer_for("excel workbook sum formula cell", 0.85);
        let result = analyzer.analyze(&request()).unwrap();

        assert_eq!(result.primary_application.as_ref().unwrap().name, "excel");
        assert!(result.tasks.iter().any(|t| t.name == "calculation"));
        assert!((result.overall_confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_ui_elements_grouped_by_category() {
        let analyzer = analyzer_for("File Edit ok cancel username", 0.9);
        let result = analyzer.analyze(&request()).unwrap();

        assert_eq!(
            result.ui_elements.get("menus"),
            Some(&vec!["file".to_string(), "edit".to_string()])
        );
        assert_eq!(
            result.ui_elements.get("buttons"),
            Some(&vec!["ok".to_string(), "cancel".to_string()])
        );
        assert_eq!(
            result.ui_elements.get("fields"),
            Some(&vec!["username".to_string()])
        );
    }

    #[test]
    fn test_app_hint_contributes_to_match() {
        let analyzer = analyzer_for("nothing recognizable", 0.5);
        let req = AnalysisRequest::new(
            CaptureRef::from_bytes(vec![0u8; 8]).with_app_hint("excel"),
        );
        let result = analyzer.analyze(&req).unwrap();
        assert_eq!(result.primary_application.unwrap().name, "excel");
    }

    #[test]
    fn test_ocr_failure_propagates() {
        let analyzer = ScreenAnalyzer::new(
            Arc::new(FailingOcr),
            Arc::new(RuleSet::default_rules()),
        );
        assert!(analyzer.analyze(&request()).is_err());
    }

    #[test]
    fn test_empty_result_has_zero_confidence() {
        let result = AnalysisResult::empty(Utc::now());
        assert_eq!(result.overall_confidence, 0.0);
        assert!(result.tasks.is_empty());
    }
}
