//! Loss and accuracy for label classification.

use burn::nn::loss::CrossEntropyLossConfig;
use burn::prelude::Backend;
use burn::tensor::{ElementConversion, Int, Tensor};

/// Computes mean cross-entropy between logits and target label indices.
///
/// # Arguments
///
/// - `logits`: Model output `[batch, num_classes]`
/// - `targets`: Label indices `[batch]`
/// - `smoothing`: Label smoothing factor in `[0, 1]`; `0.0` disables it
///
/// # Returns
///
/// Scalar loss tensor of shape `[1]`.
pub fn classification_loss<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
    smoothing: f32,
) -> Tensor<B, 1> {
    let smoothing = (smoothing > 0.0).then_some(smoothing);
    CrossEntropyLossConfig::new()
        .with_smoothing(smoothing)
        .init(&logits.device())
        .forward(logits, targets)
}

/// Counts rows whose arg-max matches the target.
pub fn correct_predictions<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let predicted = logits.argmax(1).squeeze::<1>(1);
    let correct: i64 = predicted.equal(targets).int().sum().into_scalar().elem();
    usize::try_from(correct).unwrap_or(0)
}

/// Returns the share of rows whose arg-max matches the target.
#[allow(clippy::cast_precision_loss)]
pub fn accuracy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> f32 {
    let [batch, _] = logits.dims();
    if batch == 0 {
        return 0.0;
    }
    correct_predictions(logits, targets) as f32 / batch as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn logits(values: Vec<f32>, shape: [usize; 2]) -> Tensor<TestBackend, 2> {
        Tensor::from_data(TensorData::new(values, shape), &Default::default())
    }

    fn targets(values: Vec<i64>) -> Tensor<TestBackend, 1, Int> {
        let n = values.len();
        Tensor::from_data(TensorData::new(values, [n]), &Default::default())
    }

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_scalar().elem()
    }

    #[test]
    fn uniform_logits_give_log_classes() {
        let loss = classification_loss(logits(vec![0.0; 6], [2, 3]), targets(vec![0, 2]), 0.0);
        assert_relative_eq!(scalar(loss), 3.0_f32.ln(), epsilon = 1e-5);

        // Smoothing does not change the loss of a uniform prediction.
        let loss = classification_loss(logits(vec![0.0; 6], [2, 3]), targets(vec![0, 2]), 0.1);
        assert_relative_eq!(scalar(loss), 3.0_f32.ln(), epsilon = 1e-5);
    }

    #[test]
    fn confident_correct_prediction_has_low_loss() {
        let l = logits(vec![20.0, 0.0, 0.0, 0.0, 20.0, 0.0], [2, 3]);
        let loss = scalar(classification_loss(l, targets(vec![0, 1]), 0.0));
        assert!(loss < 1e-3);
    }

    #[test]
    fn smoothing_penalizes_overconfidence() {
        let l = logits(vec![20.0, 0.0, 0.0], [1, 3]);
        let plain = scalar(classification_loss(l.clone(), targets(vec![0]), 0.0));
        let smoothed = scalar(classification_loss(l, targets(vec![0]), 0.1));
        assert!(smoothed > plain);
    }

    #[test]
    fn accuracy_counts_argmax_matches() {
        let l = logits(vec![0.9, 0.1, 0.2, 0.8, 0.6, 0.4, 0.3, 0.7], [4, 2]);
        let t = targets(vec![0, 1, 1, 1]);
        assert_eq!(correct_predictions(l.clone(), t.clone()), 3);
        assert_relative_eq!(accuracy(l, t), 0.75);
    }
}
