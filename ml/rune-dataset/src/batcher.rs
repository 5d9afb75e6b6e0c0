//! Stacking encoded samples into tensors.

use burn::prelude::Backend;
use burn::tensor::{Int, Tensor, TensorData};

use crate::dataset::{EncodedSample, RuneDataset};
use crate::error::{DatasetError, Result};

/// A mini-batch ready for the model.
#[derive(Debug, Clone)]
pub struct RuneBatch<B: Backend> {
    /// Encoded traces, `[batch, max_points, channels]`.
    pub traces: Tensor<B, 3>,

    /// Label indices, `[batch]`.
    pub targets: Tensor<B, 1, Int>,

    /// Source file names, in batch order.
    pub file_names: Vec<String>,
}

impl<B: Backend> RuneBatch<B> {
    /// Returns the number of samples in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.file_names.len()
    }

    /// Returns `true` if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file_names.is_empty()
    }
}

/// Builds [`RuneBatch`]es on a fixed device.
#[derive(Debug, Clone)]
pub struct RuneBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> RuneBatcher<B> {
    /// Creates a batcher for `device`.
    #[must_use]
    pub const fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Returns the target device.
    #[must_use]
    pub const fn device(&self) -> &B::Device {
        &self.device
    }

    /// Stacks samples into one batch.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Validation`] if `items` is empty or the
    /// samples do not share one shape.
    pub fn batch(&self, items: Vec<EncodedSample>) -> Result<RuneBatch<B>> {
        let Some(first) = items.first() else {
            return Err(DatasetError::validation("cannot batch zero samples"));
        };
        let [steps, channels] = first.sequence.shape();

        let mut traces = Vec::with_capacity(items.len() * steps * channels);
        let mut targets = Vec::with_capacity(items.len());
        let mut file_names = Vec::with_capacity(items.len());

        for item in items {
            if item.sequence.shape() != [steps, channels] {
                return Err(DatasetError::validation(format!(
                    "{}: shape {:?} does not match batch shape {:?}",
                    item.file_name,
                    item.sequence.shape(),
                    [steps, channels]
                )));
            }
            traces.extend_from_slice(item.sequence.as_slice());
            #[allow(clippy::cast_possible_wrap)]
            targets.push(item.label as i64);
            file_names.push(item.file_name);
        }

        let n = file_names.len();
        Ok(RuneBatch {
            traces: Tensor::from_data(TensorData::new(traces, [n, steps, channels]), &self.device),
            targets: Tensor::from_data(TensorData::new(targets, [n]), &self.device),
            file_names,
        })
    }

    /// Loads, encodes and stacks the samples at `indices`.
    ///
    /// # Errors
    ///
    /// Propagates load errors from [`RuneDataset::get`] and shape errors
    /// from [`batch`](Self::batch).
    pub fn load(&self, dataset: &RuneDataset, indices: &[usize]) -> Result<RuneBatch<B>> {
        self.batch(dataset.get_many(indices)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use rune_features::EncodedSequence;
    use rune_types::EncoderConfig;

    type TestBackend = NdArray<f32>;

    fn sample(config: &EncoderConfig, label: usize) -> EncodedSample {
        EncodedSample {
            sequence: EncodedSequence::zeros(config),
            label,
            file_name: format!("{label}.json"),
        }
    }

    #[test]
    fn batch_shapes() {
        let config = EncoderConfig::new(6);
        let batcher = RuneBatcher::<TestBackend>::new(Default::default());
        let batch = batcher
            .batch(vec![sample(&config, 2), sample(&config, 0), sample(&config, 1)])
            .unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.traces.dims(), [3, 6, 4]);
        assert_eq!(batch.targets.dims(), [3]);

        let targets: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(targets, vec![2, 0, 1]);
    }

    #[test]
    fn batch_rejects_empty() {
        let batcher = RuneBatcher::<TestBackend>::new(Default::default());
        assert!(batcher.batch(Vec::new()).is_err());
    }

    #[test]
    fn batch_rejects_mixed_shapes() {
        let batcher = RuneBatcher::<TestBackend>::new(Default::default());
        let items = vec![
            sample(&EncoderConfig::new(6), 0),
            sample(&EncoderConfig::legacy(6), 1),
        ];
        assert!(matches!(batcher.batch(items), Err(DatasetError::Validation(_))));
    }
}
