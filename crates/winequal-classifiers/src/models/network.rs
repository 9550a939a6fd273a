//! Feed-forward network backend built on candle.
//!
//! The architecture is fixed: two ReLU hidden layers of width 64 and 32, then
//! an output layer with one unit per class and a softmax. Training runs a
//! fixed number of Adam epochs over the whole dataset with sparse categorical
//! cross-entropy; there is no validation split and no early stopping.
//!
//! `FeedForwardNet` works on dense class indices. `NetworkClassifier` is the
//! adapter that maps raw labels through a `LabelEncoder`. The encoder's class
//! list travels in the safetensors header under `classes`, so a reloaded
//! network decodes with the encoding it was trained with.
use std::collections::HashMap;

use candle_core::{DType, Device, Tensor, Var, D};
use candle_nn::{ops, Linear, Module, Optimizer, VarBuilder, VarMap};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::{BackendKind, NetworkConfig};
use crate::data_handling::LabelEncoder;
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::ClassifierModel;

pub const HIDDEN_WIDTHS: [usize; 2] = [64, 32];

const HIDDEN1: &str = "hidden1";
const HIDDEN2: &str = "hidden2";
const OUTPUT: &str = "output";
const CLASSES_KEY: &str = "classes";

fn candle_err(e: candle_core::Error) -> PipelineError {
    PipelineError::fit(BackendKind::Network, e)
}

/// Populate a `VarMap` with the given tensors.
fn create_var_map(var_map: &mut VarMap, tensor_data: HashMap<String, Tensor>) -> candle_core::Result<()> {
    let mut ws = var_map
        .data()
        .lock()
        .map_err(|_| candle_core::Error::Msg("VarMap lock poisoned".to_string()))?;
    for (name, tensor) in tensor_data {
        ws.insert(name, Var::from_tensor(&tensor)?);
    }
    Ok(())
}

pub struct FeedForwardNet {
    varmap: VarMap,
    hidden1: Linear,
    hidden2: Linear,
    output: Linear,
    input_dim: usize,
    n_classes: usize,
    device: Device,
}

impl FeedForwardNet {
    /// Create a freshly initialized network.
    pub fn new_untrained(input_dim: usize, n_classes: usize, device: Device) -> candle_core::Result<Self> {
        let varmap = VarMap::new();
        Self::build(varmap, input_dim, n_classes, device)
    }

    fn build(varmap: VarMap, input_dim: usize, n_classes: usize, device: Device) -> candle_core::Result<Self> {
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let hidden1 = candle_nn::linear(input_dim, HIDDEN_WIDTHS[0], vb.pp(HIDDEN1))?;
        let hidden2 = candle_nn::linear(HIDDEN_WIDTHS[0], HIDDEN_WIDTHS[1], vb.pp(HIDDEN2))?;
        let output = candle_nn::linear(HIDDEN_WIDTHS[1], n_classes, vb.pp(OUTPUT))?;
        Ok(Self {
            varmap,
            hidden1,
            hidden2,
            output,
            input_dim,
            n_classes,
            device,
        })
    }

    /// Restore a network from safetensors bytes. Layer sizes are read from
    /// the stored weight shapes.
    pub fn from_safetensors(bytes: &[u8], device: Device) -> candle_core::Result<Self> {
        let tensors = candle_core::safetensors::load_buffer(bytes, &device)?;
        let weight = |name: &str| {
            tensors
                .get(&format!("{}.weight", name))
                .ok_or_else(|| candle_core::Error::Msg(format!("missing tensor '{}.weight'", name)))
        };
        let (h1_out, input_dim) = weight(HIDDEN1)?.dims2()?;
        let (n_classes, out_in) = weight(OUTPUT)?.dims2()?;
        if h1_out != HIDDEN_WIDTHS[0] || out_in != HIDDEN_WIDTHS[1] {
            return Err(candle_core::Error::Msg(format!(
                "unexpected layer widths {}/{}, expected {:?}",
                h1_out, out_in, HIDDEN_WIDTHS
            )));
        }

        let mut varmap = VarMap::new();
        create_var_map(&mut varmap, tensors)?;
        log::debug!(
            "VarMap populated with {} entries",
            varmap.data().lock().map(|m| m.len()).unwrap_or(0)
        );
        Self::build(varmap, input_dim, n_classes, device)
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn logits(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let xs = self.hidden1.forward(xs)?.relu()?;
        let xs = self.hidden2.forward(&xs)?.relu()?;
        self.output.forward(&xs)
    }

    /// Class probabilities, one row per sample.
    pub fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        ops::softmax(&self.logits(xs)?, D::Minus1)
    }

    fn to_tensor(&self, x: &Array2<f64>) -> candle_core::Result<Tensor> {
        let data: Vec<f32> = x.iter().map(|&v| v as f32).collect();
        Tensor::from_vec(data, (x.nrows(), x.ncols()), &self.device)
    }

    /// Train on dense class indices. Returns the mean batch loss per epoch.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[u32], config: &NetworkConfig) -> candle_core::Result<Vec<f32>> {
        if x.ncols() != self.input_dim {
            return Err(candle_core::Error::Msg(format!(
                "expected {} input columns, got {}",
                self.input_dim,
                x.ncols()
            )));
        }
        let n = x.nrows();
        let batch_size = config.batch_size.max(1);
        let num_batches = n.div_ceil(batch_size).max(1);

        log::info!(
            "[network] training on {} samples ({} batches) for {} epochs",
            n,
            num_batches,
            config.epochs
        );

        let params = candle_nn::ParamsAdamW {
            lr: config.learning_rate,
            weight_decay: 0.0,
            ..Default::default()
        };
        let mut opt = candle_nn::AdamW::new(self.varmap.all_vars(), params)?;

        let features = self.to_tensor(x)?;
        let targets = Tensor::from_vec(y.to_vec(), n, &self.device)?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut order: Vec<u32> = (0..n as u32).collect();
        let mut epoch_losses = Vec::with_capacity(config.epochs);

        for epoch in 0..config.epochs {
            order.shuffle(&mut rng);
            let mut total_loss = 0f32;
            for batch in order.chunks(batch_size) {
                let idx = Tensor::new(batch, &self.device)?;
                let batch_x = features.index_select(&idx, 0)?;
                let batch_y = targets.index_select(&idx, 0)?;
                let loss = candle_nn::loss::cross_entropy(&self.logits(&batch_x)?, &batch_y)?;
                opt.backward_step(&loss)?;
                total_loss += loss.to_vec0::<f32>()?;
            }
            let avg_loss = total_loss / num_batches as f32;
            log::debug!("[network] epoch {}: avg. batch loss {:.4}", epoch, avg_loss);
            if !avg_loss.is_finite() {
                return Err(candle_core::Error::Msg(format!(
                    "loss diverged to {} in epoch {}",
                    avg_loss, epoch
                )));
            }
            epoch_losses.push(avg_loss);
        }

        if let Some(last) = epoch_losses.last() {
            log::info!("[network] final epoch loss {:.4}", last);
        }
        Ok(epoch_losses)
    }

    /// Most probable class index per row.
    pub fn predict(&self, x: &Array2<f64>) -> candle_core::Result<Vec<u32>> {
        let probs = self.forward(&self.to_tensor(x)?)?;
        probs.argmax(D::Minus1)?.to_vec1::<u32>()
    }

    /// Serialize all weights as safetensors, with optional header metadata.
    pub fn to_safetensors(&self, metadata: Option<HashMap<String, String>>) -> candle_core::Result<Vec<u8>> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|_| candle_core::Error::Msg("VarMap lock poisoned".to_string()))?;
        let tensors: Vec<(String, Tensor)> = data
            .iter()
            .map(|(name, var)| (name.clone(), var.as_tensor().clone()))
            .collect();
        safetensors::serialize(tensors, &metadata).map_err(|e| candle_core::Error::Msg(e.to_string()))
    }
}

/// Read the class list stored alongside the weights.
fn stored_classes(bytes: &[u8]) -> Result<Vec<String>> {
    let (_, header) = safetensors::SafeTensors::read_metadata(bytes)
        .map_err(|e| PipelineError::invalid_artifact(BackendKind::Network, e.to_string()))?;
    let raw = header
        .metadata()
        .as_ref()
        .and_then(|m| m.get(CLASSES_KEY))
        .ok_or_else(|| PipelineError::invalid_artifact(BackendKind::Network, "no class list in artifact header"))?;
    serde_json::from_str(raw)
        .map_err(|e| PipelineError::invalid_artifact(BackendKind::Network, format!("malformed class list: {}", e)))
}

/// Adapts `FeedForwardNet` to raw labels through a `LabelEncoder`.
pub struct NetworkClassifier {
    config: NetworkConfig,
    encoder: LabelEncoder,
    net: Option<FeedForwardNet>,
    device: Device,
}

impl NetworkClassifier {
    pub fn new(config: NetworkConfig, encoder: LabelEncoder) -> Self {
        NetworkClassifier {
            config,
            encoder,
            net: None,
            device: Device::Cpu,
        }
    }

    /// Restore from a safetensors payload. The label encoding comes from the
    /// stored class list, whose length must match the output width.
    pub fn from_bytes(config: NetworkConfig, bytes: &[u8]) -> Result<Self> {
        let device = Device::Cpu;
        let encoder = LabelEncoder::from_classes(stored_classes(bytes)?)
            .map_err(|e| PipelineError::invalid_artifact(BackendKind::Network, e))?;
        let net = FeedForwardNet::from_safetensors(bytes, device.clone())
            .map_err(|e| PipelineError::invalid_artifact(BackendKind::Network, e))?;
        if net.n_classes() != encoder.n_classes() {
            return Err(PipelineError::invalid_artifact(
                BackendKind::Network,
                format!(
                    "network has {} outputs but the stored class list has {} classes",
                    net.n_classes(),
                    encoder.n_classes()
                ),
            ));
        }
        Ok(NetworkClassifier {
            config,
            encoder,
            net: Some(net),
            device,
        })
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }
}

impl ClassifierModel for NetworkClassifier {
    fn kind(&self) -> BackendKind {
        BackendKind::Network
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[String]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(PipelineError::fit(
                BackendKind::Network,
                format!("{} rows but {} labels", x.nrows(), y.len()),
            ));
        }
        let encoded = self
            .encoder
            .transform(y)
            .map_err(|e| PipelineError::fit(BackendKind::Network, e))?;
        let mut net = FeedForwardNet::new_untrained(x.ncols(), self.encoder.n_classes(), self.device.clone())
            .map_err(candle_err)?;
        net.fit(x, &encoded, &self.config).map_err(candle_err)?;
        self.net = Some(net);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<String>> {
        let net = self
            .net
            .as_ref()
            .ok_or_else(|| PipelineError::predict(BackendKind::Network, "model has not been fitted"))?;
        let codes = net
            .predict(x)
            .map_err(|e| PipelineError::predict(BackendKind::Network, e))?;
        codes
            .into_iter()
            .map(|c| {
                self.encoder.decode(c).map(str::to_string).ok_or_else(|| {
                    PipelineError::predict(BackendKind::Network, format!("class index {} out of range", c))
                })
            })
            .collect()
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let net = self
            .net
            .as_ref()
            .ok_or_else(|| PipelineError::fit(BackendKind::Network, "model has not been fitted"))?;
        let classes = serde_json::to_string(self.encoder.classes())
            .map_err(|e| PipelineError::fit(BackendKind::Network, e))?;
        let metadata = HashMap::from([(CLASSES_KEY.to_string(), classes)]);
        net.to_safetensors(Some(metadata)).map_err(candle_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{accuracy, majority_baseline};

    fn toy() -> (Array2<f64>, Vec<String>) {
        let x = Array2::from_shape_vec(
            (10, 2),
            vec![
                0.0, 0.1, 0.2, 0.0, 0.1, 0.3, 0.3, 0.2, 0.0, 0.4, 0.2, 0.2, //
                3.0, 3.1, 3.2, 2.9, 2.8, 3.3, 3.1, 3.0,
            ],
        )
        .unwrap();
        let y = ["6", "6", "6", "6", "6", "6", "5", "5", "5", "5"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        (x, y)
    }

    fn quick() -> NetworkConfig {
        NetworkConfig {
            epochs: 200,
            batch_size: 4,
            learning_rate: 0.01,
            seed: 7,
        }
    }

    #[test]
    fn layer_widths_are_fixed() {
        let net = FeedForwardNet::new_untrained(5, 3, Device::Cpu).unwrap();
        let xs = Tensor::zeros((2, 5), DType::F32, &Device::Cpu).unwrap();
        let probs = net.forward(&xs).unwrap();
        assert_eq!(probs.dims(), &[2, 3]);
        let sums: Vec<f32> = probs.sum(1).unwrap().to_vec1().unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn trained_network_beats_majority_baseline() {
        let (x, y) = toy();
        let mut model = NetworkClassifier::new(quick(), LabelEncoder::fit(&y));
        model.fit(&x, &y).unwrap();
        let predicted = model.predict(&x).unwrap();
        assert!(accuracy(&predicted, &y) >= majority_baseline(&y));
    }

    #[test]
    fn safetensors_payload_round_trips() {
        let (x, y) = toy();
        let encoder = LabelEncoder::fit(&y);
        let mut model = NetworkClassifier::new(quick(), encoder.clone());
        model.fit(&x, &y).unwrap();

        let bytes = model.to_bytes().unwrap();
        let restored = NetworkClassifier::from_bytes(quick(), &bytes).unwrap();
        assert_eq!(restored.encoder(), &encoder);
        assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn reloaded_network_keeps_training_encoding() {
        let (x, y) = toy();
        let mut model = NetworkClassifier::new(quick(), LabelEncoder::fit(&y));
        model.fit(&x, &y).unwrap();
        let expected = model.predict(&x).unwrap();

        // reversed rows would give a first-seen encoding of ["5", "6"]
        let restored = NetworkClassifier::from_bytes(quick(), &model.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.encoder().classes(), ["6".to_string(), "5".to_string()]);
        let mut reversed = x.clone();
        reversed.invert_axis(ndarray::Axis(0));
        let mut predicted = restored.predict(&reversed).unwrap();
        predicted.reverse();
        assert_eq!(predicted, expected);
    }

    fn with_classes(classes: &str) -> HashMap<String, String> {
        HashMap::from([(CLASSES_KEY.to_string(), classes.to_string())])
    }

    #[test]
    fn class_count_mismatch_is_invalid_artifact() {
        let net = FeedForwardNet::new_untrained(2, 3, Device::Cpu).unwrap();
        let bytes = net.to_safetensors(Some(with_classes(r#"["5","6"]"#))).unwrap();
        let err = NetworkClassifier::from_bytes(quick(), &bytes).err().unwrap();
        assert!(matches!(err, PipelineError::InvalidArtifact { backend: BackendKind::Network, .. }));
    }

    #[test]
    fn missing_class_list_is_invalid_artifact() {
        let net = FeedForwardNet::new_untrained(2, 2, Device::Cpu).unwrap();
        for bytes in [
            net.to_safetensors(None).unwrap(),
            net.to_safetensors(Some(with_classes("not json"))).unwrap(),
            net.to_safetensors(Some(with_classes(r#"["5","5"]"#))).unwrap(),
        ] {
            let err = NetworkClassifier::from_bytes(quick(), &bytes).err().unwrap();
            assert!(matches!(err, PipelineError::InvalidArtifact { backend: BackendKind::Network, .. }));
        }
    }

    #[test]
    fn non_finite_loss_fails_the_fit() {
        let (mut x, y) = toy();
        x[[3, 1]] = f64::NAN;
        let mut model = NetworkClassifier::new(quick(), LabelEncoder::fit(&y));
        let err = model.fit(&x, &y).unwrap_err();
        assert!(matches!(err, PipelineError::Fit { backend: BackendKind::Network, .. }));
        assert!(model.to_bytes().is_err());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let net = FeedForwardNet::new_untrained(2, 2, Device::Cpu).unwrap();
        let bytes = net.to_safetensors(None).unwrap();
        assert!(FeedForwardNet::from_safetensors(&bytes[..bytes.len() / 2], Device::Cpu).is_err());
    }
}
