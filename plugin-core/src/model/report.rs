use serde::{Deserialize, Serialize};

/// Outcome of comparing a product description against its composition.
///
/// `score` is in `1..=10` for a real evaluation. `0` means no evaluation was
/// possible because one of the two texts was missing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ScoreReport {
    pub score: u8,
    pub reasoning: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl ScoreReport {
    pub const UNAVAILABLE_SCORE: u8 = 0;

    pub fn unavailable() -> Self {
        ScoreReport {
            score: Self::UNAVAILABLE_SCORE,
            reasoning: "could not extract description or composition".to_string(),
            details: Vec::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.score != Self::UNAVAILABLE_SCORE
    }
}
