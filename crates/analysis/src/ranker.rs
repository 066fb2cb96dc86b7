use std::cmp::Ordering;

use crate::envelope::Prediction;
use crate::error::AnalysisError;

/// Labels ranked by model confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Sorted descending; ties keep label order.
    pub predictions: Vec<Prediction>,
}

impl Ranking {
    pub fn top(&self) -> &Prediction {
        // `rank` rejects empty inputs, so there is always a first entry.
        &self.predictions[0]
    }
}

/// Pairs each probability with its label and sorts descending.
///
/// Confidences are passed through as raw model outputs.
pub fn rank(probabilities: &[f32], labels: &[String]) -> Result<Ranking, AnalysisError> {
    if probabilities.len() != labels.len() {
        return Err(AnalysisError::Shape(format!(
            "model produced {} class scores for {} labels",
            probabilities.len(),
            labels.len()
        )));
    }
    if labels.is_empty() {
        return Err(AnalysisError::Shape("no class labels configured".to_string()));
    }

    let mut predictions: Vec<Prediction> = labels
        .iter()
        .zip(probabilities)
        .map(|(label, &confidence)| Prediction {
            label: label.clone(),
            confidence,
        })
        .collect();

    // `sort_by` is stable, so equal scores stay in label order.
    predictions.sort_by(|a, b| descending(a.confidence, b.confidence));

    Ok(Ranking { predictions })
}

/// Descending order over scores with NaN after every finite value.
fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
