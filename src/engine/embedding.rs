//! TFLite embedding extractor.

use std::path::Path;

use tflitec::interpreter::{Interpreter, Options};
use tflitec::model::Model;
use tflitec::tensor::DataType;

use crate::engine::{knn, Embedder};
use crate::error::{Result, TeachableError};
use crate::vision::Frame;

/// Runs a headless image classifier and returns its output as an
/// L2-normalized embedding vector.
pub struct TfliteEmbedder {
    interpreter: Interpreter<'static>,
    input_width: u32,
    input_height: u32,
    quantized_input: bool,
}

impl TfliteEmbedder {
    pub fn new(model_path: &Path) -> Result<Self> {
        if !model_path.is_file() {
            return Err(TeachableError::ModelLoad(format!(
                "Model file {} not found",
                model_path.display()
            )));
        }
        log::info!("Loading embedding model from: {}", model_path.display());

        let path = model_path.to_str().ok_or_else(|| {
            TeachableError::ModelLoad(format!(
                "Model path {} is not valid UTF-8",
                model_path.display()
            ))
        })?;

        // Leak the model for a 'static interpreter; it lives for the whole run
        let model = Box::leak(Box::new(Model::new(path).map_err(|e| {
            TeachableError::ModelLoad(format!("Failed to load embedding model: {}", e))
        })?));

        // Small vision models tend to run best single threaded
        let mut options = Options::default();
        options.thread_count = 1;

        let interpreter = Interpreter::new(model, Some(options)).map_err(|e| {
            TeachableError::ModelLoad(format!("Failed to create interpreter: {}", e))
        })?;
        interpreter.allocate_tensors().map_err(|e| {
            TeachableError::ModelLoad(format!("Failed to allocate tensors: {}", e))
        })?;

        let input = interpreter
            .input(0)
            .map_err(|e| TeachableError::ModelLoad(format!("Failed to get input tensor: {}", e)))?;
        let dims = input.shape().dimensions().clone();
        if dims.len() != 4 || dims[0] != 1 || dims[3] != 3 {
            return Err(TeachableError::ModelLoad(format!(
                "Embedding model expects a 1xHxWx3 image input, got {:?}",
                dims
            )));
        }
        let quantized_input = input.data_type() == DataType::UInt8;

        log::info!(
            "Embedding model input: {}x{} ({})",
            dims[2],
            dims[1],
            if quantized_input { "uint8" } else { "float32" }
        );

        Ok(Self {
            interpreter,
            input_width: dims[2] as u32,
            input_height: dims[1] as u32,
            quantized_input,
        })
    }
}

impl Embedder for TfliteEmbedder {
    fn embed(&mut self, frame: &Frame) -> Result<Vec<f32>> {
        let frame = frame.resized(self.input_width, self.input_height)?;

        if self.quantized_input {
            self.interpreter.copy(frame.data(), 0).map_err(|e| {
                TeachableError::Processing(format!("Failed to set model input: {}", e))
            })?;
        } else {
            let scaled: Vec<f32> = frame.data().iter().map(|&b| b as f32 / 255.0).collect();
            self.interpreter.copy(&scaled, 0).map_err(|e| {
                TeachableError::Processing(format!("Failed to set model input: {}", e))
            })?;
        }

        self.interpreter
            .invoke()
            .map_err(|e| TeachableError::Processing(format!("Inference failed: {}", e)))?;

        let output = self
            .interpreter
            .output(0)
            .map_err(|e| TeachableError::Processing(format!("Failed to get output tensor: {}", e)))?;
        let embedding: Vec<f32> = match output.data_type() {
            DataType::UInt8 => output.data::<u8>().iter().map(|&v| v as f32).collect(),
            _ => output.data::<f32>().to_vec(),
        };

        Ok(knn::normalize(embedding))
    }
}
