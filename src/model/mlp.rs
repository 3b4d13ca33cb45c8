//! Feed-forward classifier stored as a burn record
//!
//! Architecture: Input(11) → [Linear → ReLU] × hidden_dims.len() → Linear(n_classes)

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Mutex;

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::activation::{relu, softmax};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::predictor::{Predictor, PredictorError, RawOutcome};
use crate::features::{FeatureRecord, FeatureRow};
use crate::{ModelConfig, RetentionError};

/// CPU backend used for inference
pub type InferenceBackend = burn::backend::NdArray<f32>;

/// Configuration for the MLP classifier
#[derive(Debug, Clone)]
pub struct MLPConfig {
    /// Input dimension (client features)
    pub input_dim: usize,
    /// Hidden layer dimensions (e.g., [64, 32] for two layers)
    pub hidden_dims: Vec<usize>,
    /// Number of output classes
    pub n_classes: usize,
}

impl Default for MLPConfig {
    fn default() -> Self {
        MLPConfig {
            input_dim: FeatureRecord::DIM,
            hidden_dims: vec![64, 32],
            n_classes: 2,
        }
    }
}

impl MLPConfig {
    pub fn from_model_config(config: &ModelConfig) -> Self {
        MLPConfig {
            input_dim: FeatureRecord::DIM,
            hidden_dims: config.hidden_dims.clone(),
            n_classes: config.n_classes,
        }
    }
}

/// A single hidden layer block: Linear → ReLU
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        relu(self.linear.forward(x))
    }
}

/// Multi-Layer Perceptron producing class logits
#[derive(Module, Debug)]
pub struct MLPModel<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    class_head: Linear<B>,
}

impl<B: Backend> MLPModel<B> {
    /// Create a new MLP model with freshly initialised weights
    pub fn new(device: &B::Device, config: &MLPConfig) -> Self {
        let mut hidden = Vec::with_capacity(config.hidden_dims.len());
        let mut in_dim = config.input_dim;
        for &out_dim in &config.hidden_dims {
            hidden.push(HiddenBlock::new(device, in_dim, out_dim));
            in_dim = out_dim;
        }

        MLPModel {
            hidden,
            class_head: LinearConfig::new(in_dim, config.n_classes).init(device),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `features` - Client features [batch, input_dim]
    ///
    /// # Returns
    /// Class logits [batch, n_classes]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self
            .hidden
            .iter()
            .fold(features, |x, block| block.forward(x));
        self.class_head.forward(x)
    }

    /// Save model to file
    pub fn save(&self, path: &Path) -> crate::Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), path.to_path_buf())
            .map_err(|e| RetentionError::Io(std::io::Error::other(e.to_string())))
    }

    /// Load model from file
    pub fn load(device: &B::Device, path: &Path, config: &MLPConfig) -> crate::Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(path.to_path_buf(), device)
            .map_err(|e| RetentionError::ModelFileCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        check_record_shapes(&record, config).map_err(|reason| RetentionError::ModelFileCorrupt {
            path: path.to_path_buf(),
            reason,
        })?;

        let model = Self::new(device, config);
        Ok(model.load_record(record))
    }
}

/// Compare a decoded record's layer shapes with the configured architecture
///
/// burn asserts on a layer-count mismatch inside `load_record`, so this has
/// to run first.
fn check_record_shapes<B: Backend>(
    record: &MLPModelRecord<B>,
    config: &MLPConfig,
) -> Result<(), String> {
    if record.hidden.len() != config.hidden_dims.len() {
        return Err(format!(
            "record has {} hidden layers, config expects {}",
            record.hidden.len(),
            config.hidden_dims.len()
        ));
    }

    let mut in_dim = config.input_dim;
    for (i, (block, &out_dim)) in record.hidden.iter().zip(&config.hidden_dims).enumerate() {
        let dims = block.linear.weight.val().dims();
        if dims != [in_dim, out_dim] {
            return Err(format!(
                "hidden layer {} has shape {:?}, config expects {:?}",
                i,
                dims,
                [in_dim, out_dim]
            ));
        }
        in_dim = out_dim;
    }

    let dims = record.class_head.weight.val().dims();
    if dims != [in_dim, config.n_classes] {
        return Err(format!(
            "class head has shape {:?}, config expects {:?}",
            dims,
            [in_dim, config.n_classes]
        ));
    }

    Ok(())
}

/// Thread-safe predictor around an [`MLPModel`]
///
/// Calls are serialized through a mutex.
pub struct MlpClassifier<B: Backend> {
    model: Mutex<MLPModel<B>>,
    device: B::Device,
    config: MLPConfig,
}

impl<B: Backend> MlpClassifier<B> {
    pub fn new(model: MLPModel<B>, device: B::Device, config: MLPConfig) -> Self {
        MlpClassifier {
            model: Mutex::new(model),
            device,
            config,
        }
    }

    /// Load the classifier from a burn record file
    pub fn load(device: B::Device, path: &Path, config: MLPConfig) -> crate::Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let model = MLPModel::load(&device, path, &config)?;
        Ok(Self::new(model, device, config))
    }

    /// Class probabilities for a batch, flattened row-major
    fn probabilities(&self, rows: &[FeatureRow]) -> Result<Vec<f32>, PredictorError> {
        let data: Vec<f32> = rows.iter().flat_map(|r| r.to_f32_vec()).collect();
        let model = self
            .model
            .lock()
            .map_err(|_| PredictorError::Backend("model lock poisoned".to_string()))?;

        // Shape mismatches between the record and the configured layers panic inside the backend
        let output = panic::catch_unwind(AssertUnwindSafe(|| {
            let input = Tensor::<B, 1>::from_floats(data.as_slice(), &self.device)
                .reshape([rows.len(), self.config.input_dim]);
            softmax(model.forward(input), 1).into_data()
        }))
        .map_err(|payload| PredictorError::Backend(panic_message(payload)))?;

        output
            .as_slice::<f32>()
            .map(|s| s.to_vec())
            .map_err(|e| PredictorError::Backend(format!("{:?}", e)))
    }
}

impl<B: Backend> Predictor for MlpClassifier<B>
where
    MlpClassifier<B>: Send + Sync,
{
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<RawOutcome>, PredictorError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(row) = rows.iter().find(|r| r.values().len() != self.config.input_dim) {
            return Err(PredictorError::FeatureCount {
                expected: self.config.input_dim,
                got: row.values().len(),
            });
        }

        let probs = self.probabilities(rows)?;
        let n_classes = self.config.n_classes;
        if n_classes == 0 || probs.len() != rows.len() * n_classes {
            return Err(PredictorError::Backend(format!(
                "expected {} outputs, got {}",
                rows.len() * n_classes,
                probs.len()
            )));
        }

        Ok(probs
            .chunks(n_classes)
            .map(|p| {
                let class = p
                    .iter()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |best, (i, &v)| {
                        if v > best.1 {
                            (i, v)
                        } else {
                            best
                        }
                    })
                    .0;
                RawOutcome::Int(class as i64)
            })
            .collect())
    }

    fn describe(&self) -> String {
        format!(
            "MLP classifier ({} → {:?} → {} classes)",
            self.config.input_dim, self.config.hidden_dims, self.config.n_classes
        )
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "backend panicked during forward pass".to_string()
    }
}
