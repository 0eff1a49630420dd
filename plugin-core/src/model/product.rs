use serde::{Deserialize, Serialize};

use super::report::ScoreReport;

/// Text sections pulled out of a product page.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ProductPage {
    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub composition: String,
}

/// A similar product, already formatted for display.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AnalogEntry {
    pub name: String,
    pub price: String,
    pub url: String,
    pub similarity: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub categories: Vec<String>,
    pub description: String,
    pub composition: String,
    pub analysis: ScoreReport,
    pub analogs: Vec<AnalogEntry>,
    pub message: String,
}

impl AnalysisResult {
    pub fn new(page: ProductPage, analysis: ScoreReport, analogs: Vec<AnalogEntry>) -> Self {
        let message = format!(
            "Analysis complete. Consistency score: {}/10",
            analysis.score
        );
        AnalysisResult {
            categories: page.categories,
            description: page.description,
            composition: page.composition,
            analysis,
            analogs,
            message,
        }
    }
}
