use ndarray::Array2;

use crate::error::AnalysisError;

/// Output alphabet of a CTC speech model.
///
/// Index 0 is the empty out-of-vocabulary token, characters follow in order,
/// and the blank symbol sits one past the last character.
#[derive(Debug, Clone, PartialEq)]
pub struct CtcVocabulary {
    symbols: Vec<String>,
}

impl CtcVocabulary {
    /// Builds `["", c0, c1, ...]` from a character set.
    pub fn from_charset(charset: &str) -> Self {
        let symbols = std::iter::once(String::new())
            .chain(charset.chars().map(|c| c.to_string()))
            .collect();
        Self { symbols }
    }

    pub fn blank_index(&self) -> usize {
        self.symbols.len()
    }

    /// Width of the model output: every symbol plus the blank.
    pub fn num_classes(&self) -> usize {
        self.symbols.len() + 1
    }

    /// Greedy best-path decode.
    ///
    /// Takes the argmax at every timestep, drops blanks and joins the rest in
    /// order. Consecutive repeats are kept as emitted.
    pub fn greedy_decode(&self, symbol_probs: &Array2<f32>) -> Result<String, AnalysisError> {
        if symbol_probs.ncols() != self.num_classes() {
            return Err(AnalysisError::Shape(format!(
                "decoder got {} symbols per step, vocabulary has {}",
                symbol_probs.ncols(),
                self.num_classes()
            )));
        }

        let mut text = String::new();
        for row in symbol_probs.rows() {
            let mut best = 0;
            for (idx, &p) in row.iter().enumerate() {
                if p > row[best] {
                    best = idx;
                }
            }
            if best == self.blank_index() {
                continue;
            }
            text.push_str(&self.symbols[best]);
        }
        Ok(text)
    }
}
