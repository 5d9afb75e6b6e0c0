//! Transformer encoder over encoded stroke sequences.

use burn::module::Module;
use burn::nn;
use burn::nn::transformer::{TransformerEncoder, TransformerEncoderConfig, TransformerEncoderInput};
use burn::prelude::Backend;
use burn::tensor::Tensor;
use burn::tensor::activation::softmax;
use rune_types::EncoderConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the stroke transformer.
///
/// # Example
///
/// ```
/// use rune_models::StrokeTransformerConfig;
///
/// let config = StrokeTransformerConfig::new(4, 100, 12);
/// assert_eq!(config.d_model, 96);
/// assert_eq!(config.n_heads, 3);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeTransformerConfig {
    /// Channels per step (4 for the current encoder, 3 for legacy).
    pub channels: usize,

    /// Sequence length the positional encoding covers.
    pub max_points: usize,

    /// Number of output classes.
    pub num_classes: usize,

    /// Embedding width.
    pub d_model: usize,

    /// Attention heads per layer.
    pub n_heads: usize,

    /// Encoder layers.
    pub depth: usize,

    /// Feed-forward width inside each layer.
    pub d_ff: usize,

    /// Dropout probability during training.
    pub dropout: f64,
}

impl Default for StrokeTransformerConfig {
    fn default() -> Self {
        Self::new(4, 100, 2)
    }
}

impl StrokeTransformerConfig {
    /// Creates a configuration with the standard hyperparameters.
    #[must_use]
    pub const fn new(channels: usize, max_points: usize, num_classes: usize) -> Self {
        Self {
            channels,
            max_points,
            num_classes,
            d_model: 96,
            n_heads: 3,
            depth: 2,
            d_ff: 256,
            dropout: 0.1,
        }
    }

    /// Creates a configuration matching an encoder's output shape.
    #[must_use]
    pub const fn for_encoder(encoder: &EncoderConfig, num_classes: usize) -> Self {
        Self::new(encoder.channels(), encoder.max_points, num_classes)
    }

    /// Sets the embedding width.
    #[must_use]
    pub const fn with_d_model(mut self, d_model: usize) -> Self {
        self.d_model = d_model;
        self
    }

    /// Sets the number of attention heads.
    #[must_use]
    pub const fn with_n_heads(mut self, n_heads: usize) -> Self {
        self.n_heads = n_heads;
        self
    }

    /// Sets the number of encoder layers.
    #[must_use]
    pub const fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Sets the feed-forward width.
    #[must_use]
    pub const fn with_d_ff(mut self, d_ff: usize) -> Self {
        self.d_ff = d_ff;
        self
    }

    /// Sets the dropout probability.
    #[must_use]
    pub const fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns `true` if all sizes are positive, `d_model` is even and splits
    /// evenly across heads, and dropout is in `[0, 1)`. The sinusoidal
    /// positional encoding needs an even `d_model`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.channels > 0
            && self.max_points > 0
            && self.num_classes > 0
            && self.d_model > 0
            && self.n_heads > 0
            && self.depth > 0
            && self.d_ff > 0
            && self.d_model % 2 == 0
            && self.d_model % self.n_heads == 0
            && (0.0..1.0).contains(&self.dropout)
    }

    /// Returns the expected input shape for a batch.
    #[must_use]
    pub const fn input_shape(&self, batch: usize) -> [usize; 3] {
        [batch, self.max_points, self.channels]
    }
}

/// Sequence classifier for encoded rune traces.
///
/// Architecture: Linear projection -> sinusoidal positional encoding ->
/// transformer encoder -> mean over steps -> Linear head.
///
/// # Example
///
/// ```ignore
/// use rune_models::{StrokeTransformer, StrokeTransformerConfig};
///
/// let config = StrokeTransformerConfig::new(4, 100, 5);
/// let model = StrokeTransformer::<MyBackend>::new(&config, &device);
///
/// let input = Tensor::zeros([8, 100, 4], &device);
/// let logits = model.forward(input);
/// assert_eq!(logits.dims(), [8, 5]);
/// ```
#[derive(Debug, Module)]
pub struct StrokeTransformer<B: Backend> {
    input_proj: nn::Linear<B>,
    posenc: nn::PositionalEncoding<B>,
    encoder: TransformerEncoder<B>,
    head: nn::Linear<B>,
}

impl<B: Backend> StrokeTransformer<B> {
    /// Creates a new transformer with freshly initialized weights.
    #[must_use]
    pub fn new(config: &StrokeTransformerConfig, device: &B::Device) -> Self {
        let input_proj = nn::LinearConfig::new(config.channels, config.d_model).init(device);
        let posenc = nn::PositionalEncodingConfig::new(config.d_model)
            .with_max_sequence_size(config.max_points)
            .init(device);
        let encoder = TransformerEncoderConfig::new(
            config.d_model,
            config.d_ff,
            config.n_heads,
            config.depth,
        )
        .with_dropout(config.dropout)
        .init(device);
        let head = nn::LinearConfig::new(config.d_model, config.num_classes).init(device);

        Self {
            input_proj,
            posenc,
            encoder,
            head,
        }
    }

    /// Runs the forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: Encoded traces of shape `[batch, max_points, channels]`
    ///
    /// # Returns
    ///
    /// Logits of shape `[batch, num_classes]`.
    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 2> {
        let x = self.input_proj.forward(input);
        let x = self.posenc.forward(x);
        let h = self.encoder.forward(TransformerEncoderInput::new(x));
        let pooled = h.mean_dim(1).squeeze::<2>(1);
        self.head.forward(pooled)
    }

    /// Runs the forward pass and returns class probabilities.
    pub fn probabilities(&self, input: Tensor<B, 3>) -> Tensor<B, 2> {
        softmax(self.forward(input), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn small_config() -> StrokeTransformerConfig {
        StrokeTransformerConfig::new(4, 16, 3)
            .with_d_model(12)
            .with_n_heads(3)
            .with_d_ff(24)
            .with_depth(1)
    }

    #[test]
    fn config_default() {
        let config = StrokeTransformerConfig::default();
        assert_eq!(config.channels, 4);
        assert_eq!(config.max_points, 100);
        assert_eq!(config.d_ff, 256);
        assert_eq!(config.depth, 2);
        assert!((config.dropout - 0.1).abs() < 1e-12);
        assert!(config.is_valid());
    }

    #[test]
    fn config_for_encoder() {
        let config = StrokeTransformerConfig::for_encoder(&EncoderConfig::legacy(64), 7);
        assert_eq!(config.channels, 3);
        assert_eq!(config.max_points, 64);
        assert_eq!(config.num_classes, 7);
        assert_eq!(config.input_shape(2), [2, 64, 3]);
    }

    #[test]
    fn config_validation() {
        assert!(small_config().is_valid());
        assert!(!small_config().with_n_heads(5).is_valid());
        assert!(!small_config().with_d_model(9).with_n_heads(3).is_valid());
        assert!(!small_config().with_depth(0).is_valid());
        assert!(!small_config().with_dropout(1.0).is_valid());
        assert!(!StrokeTransformerConfig::new(4, 100, 0).is_valid());
    }

    #[test]
    fn config_serialization() {
        let config = small_config();
        let json = serde_json::to_string(&config).unwrap_or_default();
        let parsed: std::result::Result<StrokeTransformerConfig, _> = serde_json::from_str(&json);
        assert_eq!(parsed.unwrap_or_default(), config);
    }

    #[test]
    fn forward_shape() {
        let device = <TestBackend as Backend>::Device::default();
        let model = StrokeTransformer::<TestBackend>::new(&small_config(), &device);

        let input = Tensor::<TestBackend, 3>::zeros([2, 16, 4], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 3]);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let device = <TestBackend as Backend>::Device::default();
        let model = StrokeTransformer::<TestBackend>::new(&small_config(), &device);

        let input = Tensor::<TestBackend, 3>::ones([3, 16, 4], &device);
        let probs = model.probabilities(input).sum_dim(1);
        let sums: Vec<f32> = probs.into_data().convert::<f32>().to_vec().unwrap();

        for s in sums {
            assert_relative_eq!(s, 1.0, epsilon = 1e-5);
        }
    }
}
