use std::path::Path;
use std::sync::Mutex;

use ndarray::{Array2, Array3, Array4};
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use super::{ImageModel, SpeechModel};
use crate::error::AnalysisError;

fn load_session(model_path: &str) -> anyhow::Result<Session> {
    let session = Session::builder()
        .map_err(|e| anyhow::anyhow!("Failed to create ORT session builder: {}", e))?
        .with_intra_threads(2)
        .map_err(|e| anyhow::anyhow!("Failed to set intra threads: {}", e))?
        .with_inter_threads(1)
        .map_err(|e| anyhow::anyhow!("Failed to set inter threads: {}", e))?
        .commit_from_file(model_path)
        .map_err(|e| anyhow::anyhow!("Failed to load model '{}': {}", model_path, e))?;

    debug!(
        model_path,
        inputs = ?session.inputs().iter().map(|i| i.name()).collect::<Vec<_>>(),
        "ONNX session ready"
    );
    Ok(session)
}

/// `model_epoch_80.onnx` -> `model_epoch_80.onnx`; falls back to the raw path.
fn model_identifier(model_path: &str) -> String {
    Path::new(model_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(model_path)
        .to_string()
}

/// Image classifier exported to ONNX with a single NHWC float input and a softmax output.
///
/// `Session::run()` requires `&mut self`, so the session sits behind a `Mutex`.
/// Weights are never touched after load.
pub struct OnnxImageModel {
    session: Mutex<Session>,
    name: String,
}

impl OnnxImageModel {
    pub fn load(model_path: &str) -> anyhow::Result<Self> {
        info!(model_path, "Loading image classifier");
        let session = load_session(model_path)?;
        Ok(Self {
            session: Mutex::new(session),
            name: model_identifier(model_path),
        })
    }
}

impl ImageModel for OnnxImageModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>, AnalysisError> {
        let input_val = Tensor::from_array(input).map_err(AnalysisError::inference)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| AnalysisError::Inference(format!("model lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![input_val])
            .map_err(AnalysisError::inference)?;

        let (_shape, probs) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(AnalysisError::inference)?;
        Ok(probs.to_vec())
    }
}

/// CTC speech model exported to ONNX: (1, frames, bins) in, (1, steps, symbols) softmax out.
pub struct OnnxSpeechModel {
    session: Mutex<Session>,
    name: String,
}

impl OnnxSpeechModel {
    pub fn load(model_path: &str) -> anyhow::Result<Self> {
        info!(model_path, "Loading speech model");
        let session = load_session(model_path)?;
        Ok(Self {
            session: Mutex::new(session),
            name: model_identifier(model_path),
        })
    }
}

impl SpeechModel for OnnxSpeechModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: Array3<f32>) -> Result<Array2<f32>, AnalysisError> {
        let input_val = Tensor::from_array(input).map_err(AnalysisError::inference)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| AnalysisError::Inference(format!("model lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![input_val])
            .map_err(AnalysisError::inference)?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(AnalysisError::inference)?;
        let dims = shape.as_ref();
        if dims.len() != 3 || dims[0] != 1 {
            return Err(AnalysisError::Shape(format!(
                "expected speech output [1, steps, symbols], got {dims:?}"
            )));
        }

        Array2::from_shape_vec((dims[1] as usize, dims[2] as usize), data.to_vec())
            .map_err(|e| AnalysisError::Shape(e.to_string()))
    }
}
